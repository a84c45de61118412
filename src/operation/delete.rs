//! Delete matching credentials.

use crate::attributes::{Attributes, ItemClass};
use crate::error::{KeychainError, KeychainResult};
use crate::item::ItemTemplate;
use crate::store::{SecureStore, StoreResult, StoreStatus};

use super::{Lifecycle, Operation, Verb, sealed, store_error};

/// Result of a successful delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed(usize),
    /// Nothing matched and the caller accepted that as success
    NothingMatched,
}

impl DeleteOutcome {
    pub fn removed(&self) -> usize {
        match self {
            Self::Removed(n) => *n,
            Self::NothingMatched => 0,
        }
    }
}

/// Remove every item matching a scoped template
#[derive(Debug, Clone)]
pub struct Delete {
    template: ItemTemplate,
    missing_ok: bool,
    lifecycle: Lifecycle,
}

impl Delete {
    pub fn new(template: impl Into<ItemTemplate>) -> Self {
        Self {
            template: template.into(),
            missing_ok: false,
            lifecycle: Lifecycle::default(),
        }
    }

    /// Report [`DeleteOutcome::NothingMatched`] instead of `NotFound`
    pub fn treat_missing_as_success(mut self) -> Self {
        self.missing_ok = true;
        self
    }

    pub fn template(&self) -> &ItemTemplate {
        &self.template
    }
}

impl sealed::Sealed for Delete {}

impl Operation for Delete {
    type Request = Attributes;
    type Response = usize;
    type Output = DeleteOutcome;

    const VERB: Verb = Verb::Delete;

    fn class(&self) -> ItemClass {
        self.template.class()
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn validate(&self) -> KeychainResult<()> {
        if !self.template.is_scoped() {
            return Err(KeychainError::contract(format!(
                "delete of {} items needs at least one identity attribute",
                self.class()
            )));
        }
        Ok(())
    }

    fn build_query(&self) -> KeychainResult<Attributes> {
        Ok(self.template.query_attributes())
    }

    fn execute(store: &dyn SecureStore, request: &Attributes) -> StoreResult<usize> {
        store.delete(request)
    }

    fn interpret(&self, result: StoreResult<usize>) -> KeychainResult<DeleteOutcome> {
        match result {
            Ok(count) => Ok(DeleteOutcome::Removed(count)),
            Err(StoreStatus::ITEM_NOT_FOUND) if self.missing_ok => {
                Ok(DeleteOutcome::NothingMatched)
            }
            Err(status) => Err(store_error(Self::VERB, status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::item::{GenericPassword, InternetPassword};
    use crate::operation::perform;
    use crate::store::{MemoryStore, SecureStore};

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for account in ["bob", "alice"] {
            let item: crate::item::KeychainItem = GenericPassword::new("svc", account, "pw").into();
            let mut attrs = item.query_attributes();
            attrs.extend(item.secret_attributes().unwrap());
            store.add(&attrs).unwrap();
        }
        store
    }

    #[test]
    fn test_delete_by_full_key() {
        let store = seeded();
        let mut op = Delete::new(GenericPassword::matching("svc", "bob"));
        assert_eq!(perform(&mut op, &store), Ok(DeleteOutcome::Removed(1)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_by_partial_key_removes_all_matches() {
        let store = seeded();
        let mut op = Delete::new(GenericPassword::matching("svc", ""));
        assert_eq!(perform(&mut op, &store).unwrap().removed(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_unscoped_delete_rejected() {
        let op = Delete::new(InternetPassword::matching(""));
        assert_eq!(op.validate().unwrap_err().kind(), ErrorKind::ContractViolation);
    }

    #[test]
    fn test_missing_item_policy() {
        let store = MemoryStore::new();

        let mut strict = Delete::new(GenericPassword::matching("svc", "bob"));
        assert_eq!(perform(&mut strict, &store), Err(KeychainError::NotFound));

        let mut lenient =
            Delete::new(GenericPassword::matching("svc", "bob")).treat_missing_as_success();
        assert_eq!(perform(&mut lenient, &store), Ok(DeleteOutcome::NothingMatched));
    }

    #[test]
    fn test_policy_does_not_hide_other_failures() {
        let store = MemoryStore::new();
        store.fail_next(StoreStatus::INTERACTION_NOT_ALLOWED);
        let mut op = Delete::new(GenericPassword::matching("svc", "bob")).treat_missing_as_success();
        assert_eq!(perform(&mut op, &store), Err(KeychainError::StoreUnavailable));
    }
}
