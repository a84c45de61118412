//! Keychain Operations
//!
//! Typed verbs over the store. Each operation validates its input, builds a
//! store request, executes it through [`SecureStore`] and interprets the raw
//! status. Only the [`Session`](crate::session::Session) drives them.

pub mod add;
pub mod delete;
pub mod search;
pub mod update;

use std::fmt;

use crate::attributes::ItemClass;
use crate::error::{ErrorKind, KeychainError, KeychainResult};
use crate::store::{SecureStore, StoreResult, StoreStatus};

pub use add::Add;
pub use delete::{Delete, DeleteOutcome};
pub use search::{Search, SearchResults};
pub use update::{ItemChanges, Update};

mod sealed {
    pub trait Sealed {}
}

/// The four store verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Add,
    Delete,
    Update,
    Search,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Delete => "delete",
            Self::Update => "update",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an operation is in its single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationState {
    #[default]
    Created,
    Validated,
    Executed,
    Succeeded,
    Failed(ErrorKind),
}

impl OperationState {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }
}

/// Run state of one operation. Only the crate advances it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lifecycle {
    state: OperationState,
}

impl Lifecycle {
    pub fn state(&self) -> OperationState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: OperationState) {
        self.state = next;
    }

    pub(crate) fn fail(&mut self, kind: ErrorKind) {
        self.state = OperationState::Failed(kind);
    }
}

/// A single keychain request.
///
/// Implemented by [`Add`], [`Delete`], [`Update`] and [`Search`] only.
pub trait Operation: sealed::Sealed + Send {
    /// Store-facing request built from the typed input
    type Request;
    /// Raw store answer on success
    type Response;
    /// What the caller receives
    type Output;

    const VERB: Verb;

    fn class(&self) -> ItemClass;

    fn lifecycle(&self) -> &Lifecycle;

    #[doc(hidden)]
    fn lifecycle_mut(&mut self) -> &mut Lifecycle;

    fn state(&self) -> OperationState {
        self.lifecycle().state()
    }

    /// Check the typed input; runs before any store call
    fn validate(&self) -> KeychainResult<()>;

    fn build_query(&self) -> KeychainResult<Self::Request>;

    fn execute(store: &dyn SecureStore, request: &Self::Request) -> StoreResult<Self::Response>;

    fn interpret(&self, result: StoreResult<Self::Response>) -> KeychainResult<Self::Output>;
}

/// Drive `op` through its lifecycle against `store`
pub(crate) fn perform<O: Operation>(
    op: &mut O,
    store: &dyn SecureStore,
) -> KeychainResult<O::Output> {
    let state = op.state();
    if state != OperationState::Created {
        return Err(KeychainError::contract(format!(
            "{} operation cannot run again (state {:?})",
            O::VERB,
            state
        )));
    }

    log::debug!("{} {}: started", O::VERB, op.class().as_str());
    let result = drive(op, store);

    match &result {
        Ok(_) => {
            op.lifecycle_mut().advance(OperationState::Succeeded);
            log::debug!("{} {}: succeeded", O::VERB, op.class().as_str());
        }
        Err(e) => {
            op.lifecycle_mut().fail(e.kind());
            log::debug!("{} {}: failed ({:?})", O::VERB, op.class().as_str(), e.kind());
        }
    }
    result
}

fn drive<O: Operation>(op: &mut O, store: &dyn SecureStore) -> KeychainResult<O::Output> {
    op.validate()?;
    op.lifecycle_mut().advance(OperationState::Validated);

    let request = op.build_query()?;
    let response = O::execute(store, &request);
    op.lifecycle_mut().advance(OperationState::Executed);

    op.interpret(response)
}

/// Fold a store failure into the public taxonomy
pub(crate) fn store_error(verb: Verb, status: StoreStatus) -> KeychainError {
    let err = KeychainError::from_status(status);
    if let KeychainError::Unknown(code) = err {
        log::warn!("{}: store returned unrecognised status {}", verb, code);
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{GenericPassword, ItemTemplate};
    use crate::store::MemoryStore;

    #[test]
    fn test_lifecycle_success() {
        let store = MemoryStore::new();
        let mut op = Add::new(GenericPassword::new("svc", "bob", "pw"));
        assert_eq!(op.state(), OperationState::Created);

        perform(&mut op, &store).unwrap();
        assert_eq!(op.state(), OperationState::Succeeded);
        assert!(op.state().is_finished());
    }

    #[test]
    fn test_validation_failure_skips_store() {
        let store = MemoryStore::new();
        let mut op = Delete::new(ItemTemplate::empty(ItemClass::Generic));

        let err = perform(&mut op, &store).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractViolation);
        assert_eq!(op.state(), OperationState::Failed(ErrorKind::ContractViolation));
        assert_eq!(store.call_count(), 0);
    }

    #[test]
    fn test_rerun_is_rejected() {
        let store = MemoryStore::new();
        let mut op = Add::new(GenericPassword::new("svc", "bob", "pw"));
        perform(&mut op, &store).unwrap();

        let err = perform(&mut op, &store).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractViolation);
        assert_eq!(op.state(), OperationState::Succeeded);
        assert_eq!(store.call_count(), 1);
    }

    #[test]
    fn test_store_failure_state() {
        let store = MemoryStore::new();
        store.fail_next(StoreStatus::AUTH_FAILED);
        let mut op = Add::new(GenericPassword::new("svc", "bob", "pw"));

        assert_eq!(perform(&mut op, &store), Err(KeychainError::AccessDenied));
        assert_eq!(op.state(), OperationState::Failed(ErrorKind::AccessDenied));
    }

    #[test]
    fn test_unknown_status_passes_code() {
        assert_eq!(
            store_error(Verb::Search, StoreStatus::from_code(-67_000)),
            KeychainError::Unknown(-67_000)
        );
    }
}
