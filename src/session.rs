//! Keychain Session
//!
//! Explicit handle that runs operations against one store.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::attributes::ItemClass;
use crate::error::{KeychainError, KeychainResult};
use crate::item::{ItemTemplate, KeychainItem};
use crate::operation::{
    self, Add, Delete, DeleteOutcome, ItemChanges, Operation, Search, SearchResults, Update,
};
use crate::store::SecureStore;

/// Runs keychain operations. Cheap to clone; clones share the store.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SecureStore>,
}

impl Session {
    pub fn new(store: impl SecureStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn from_shared(store: Arc<dyn SecureStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SecureStore> {
        &self.store
    }

    /// Run `op` on the calling thread. An operation runs at most once; a
    /// second attempt fails with `ContractViolation` without a store call.
    pub fn run<O: Operation>(&self, op: &mut O) -> KeychainResult<O::Output> {
        operation::perform(op, self.store.as_ref())
    }

    /// Run `op` on a background thread and hand the outcome to `on_complete`
    pub fn submit<O, F>(&self, op: O, on_complete: F) -> JoinHandle<()>
    where
        O: Operation + 'static,
        O::Output: Send + 'static,
        F: FnOnce(O, KeychainResult<O::Output>) + Send + 'static,
    {
        let session = self.clone();
        thread::spawn(move || {
            let mut op = op;
            let result = session.run(&mut op);
            on_complete(op, result);
        })
    }

    /// Run `op` on a background thread; joining yields the finished
    /// operation and its outcome
    pub fn spawn<O>(&self, op: O) -> JoinHandle<(O, KeychainResult<O::Output>)>
    where
        O: Operation + 'static,
        O::Output: Send + 'static,
    {
        let session = self.clone();
        thread::spawn(move || {
            let mut op = op;
            let result = session.run(&mut op);
            (op, result)
        })
    }

    pub fn add(&self, item: impl Into<KeychainItem>) -> KeychainResult<ItemTemplate> {
        self.run(&mut Add::new(item))
    }

    pub fn delete(&self, template: impl Into<ItemTemplate>) -> KeychainResult<DeleteOutcome> {
        self.run(&mut Delete::new(template))
    }

    pub fn update(
        &self,
        template: impl Into<ItemTemplate>,
        changes: ItemChanges,
    ) -> KeychainResult<usize> {
        self.run(&mut Update::new(template, changes))
    }

    /// First match for `template`, including its secret
    pub fn find(&self, template: impl Into<ItemTemplate>) -> KeychainResult<KeychainItem> {
        let results = self.run(&mut Search::new(template).with_secrets())?;
        results
            .into_iter()
            .next()
            .ok_or(KeychainError::NotFound)
    }

    pub fn search(&self, search: Search) -> KeychainResult<SearchResults> {
        let mut search = search;
        self.run(&mut search)
    }

    /// Every item of `class`, attributes only; empty when there are none
    pub fn list_all(&self, class: ItemClass) -> KeychainResult<SearchResults> {
        self.run(&mut Search::list_all(class).allow_empty())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::StoreKey;
    use crate::error::ErrorKind;
    use crate::item::{GenericPassword, InternetPassword, PasswordItem, Protocol};
    use crate::operation::OperationState;
    use crate::store::{MemoryStore, SqliteStore, StoreRecord, StoreStatus};
    use secrecy::ExposeSecret;
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn memory_session() -> (Session, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (Session::from_shared(store.clone()), store)
    }

    #[test]
    fn test_add_then_find() {
        let (session, _) = memory_session();
        session
            .add(GenericPassword::new("svc", "bob", "p@ss").with_comment("work"))
            .unwrap();

        let found = session.find(GenericPassword::matching("svc", "bob")).unwrap();
        assert_eq!(found.account(), "bob");
        assert_eq!(found.secret().unwrap().expose_secret(), b"p@ss");
        assert_eq!(found.common().comment.as_deref(), Some("work"));
    }

    #[test]
    fn test_duplicate_delete_search_scenario() {
        let (session, _) = memory_session();
        let item = GenericPassword::new("svc", "bob", "pw");

        session.add(item.clone()).unwrap();
        assert_eq!(session.add(item), Err(KeychainError::DuplicateItem));
        assert_eq!(
            session.delete(GenericPassword::matching("svc", "bob")),
            Ok(DeleteOutcome::Removed(1))
        );
        assert_eq!(
            session.find(GenericPassword::matching("svc", "bob")),
            Err(KeychainError::NotFound)
        );
    }

    #[test]
    fn test_internet_search_with_no_items() {
        let (session, _) = memory_session();

        let strict = Search::new(InternetPassword::matching("example.com"));
        assert_eq!(session.search(strict), Err(KeychainError::NotFound));

        let lenient = Search::new(InternetPassword::matching("example.com")).allow_empty();
        assert!(session.search(lenient).unwrap().is_empty());
    }

    #[test]
    fn test_list_all() {
        let (session, _) = memory_session();
        assert!(session.list_all(ItemClass::Generic).unwrap().is_empty());

        for account in ["a", "b", "c"] {
            session.add(GenericPassword::new("svc", account, "pw")).unwrap();
        }
        session
            .add(InternetPassword::new("example.com", "a", "pw"))
            .unwrap();

        assert_eq!(session.list_all(ItemClass::Generic).unwrap().len(), 3);
        assert_eq!(session.list_all(ItemClass::Internet).unwrap().len(), 1);
    }

    #[test]
    fn test_query_attributes_rebuild_identity() {
        let item = InternetPassword::new("example.com", "bob", "pw")
            .with_protocol(Protocol::Https)
            .with_port(8443)
            .with_path("/login");
        let record = StoreRecord::new(item.query_attributes(), None);

        let parsed = KeychainItem::from_record(&record).unwrap();
        assert_eq!(parsed, KeychainItem::from(item).to_template().into_item());
    }

    #[test]
    fn test_update_overlap_rejected_before_store() {
        let (session, store) = memory_session();
        let err = session
            .update(
                GenericPassword::matching("svc", "bob"),
                ItemChanges::new().account("carol"),
            )
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ContractViolation);
        assert_eq!(store.call_count(), 0);
    }

    #[test]
    fn test_store_errors_are_mapped() {
        let (session, store) = memory_session();
        store.fail_next(StoreStatus::USER_CANCELED);
        store.fail_next(StoreStatus::NOT_AVAILABLE);
        store.fail_next(StoreStatus::from_code(-99));

        let item = GenericPassword::new("svc", "bob", "pw");
        assert_eq!(session.add(item.clone()), Err(KeychainError::AccessDenied));
        assert_eq!(session.add(item.clone()), Err(KeychainError::StoreUnavailable));
        assert_eq!(session.add(item), Err(KeychainError::Unknown(-99)));
    }

    #[test]
    fn test_operation_runs_once() {
        let (session, store) = memory_session();
        let mut op = Add::new(GenericPassword::new("svc", "bob", "pw"));
        session.run(&mut op).unwrap();

        let err = session.run(&mut op).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractViolation);
        assert_eq!(store.call_count(), 1);
    }

    #[test]
    fn test_spawn() {
        let (session, _) = memory_session();
        let handle = session.spawn(Add::new(GenericPassword::new("svc", "bob", "pw")));

        let (op, result) = handle.join().unwrap();
        assert!(result.is_ok());
        assert_eq!(op.state(), OperationState::Succeeded);
    }

    #[test]
    fn test_submit_delivers_one_outcome() {
        let (session, _) = memory_session();
        let (tx, rx) = mpsc::channel();

        session
            .submit(
                Delete::new(GenericPassword::matching("svc", "bob")),
                move |op, result| {
                    tx.send((op.state(), result)).unwrap();
                },
            )
            .join()
            .unwrap();

        let (state, result) = rx.recv().unwrap();
        assert_eq!(result, Err(KeychainError::NotFound));
        assert_eq!(state, OperationState::Failed(ErrorKind::NotFound));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_shared_across_threads() {
        let (session, store) = memory_session();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let session = session.clone();
                std::thread::spawn(move || {
                    session.add(GenericPassword::new("svc", format!("user{}", i), "pw"))
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn test_sqlite_backed_session() {
        let dir = TempDir::new().unwrap();
        let config = crate::store::StoreConfig::with_path(dir.path().join("keychain.db"));
        let key = StoreKey::generate();

        let session = Session::new(SqliteStore::open(config.clone(), Some(key.clone())).unwrap());
        session
            .add(InternetPassword::new("example.com", "bob", "pw").with_protocol(Protocol::Https))
            .unwrap();
        assert_eq!(
            session.update(
                InternetPassword::matching("example.com"),
                ItemChanges::new().secret("rotated"),
            ),
            Ok(1)
        );
        drop(session);

        let session = Session::new(SqliteStore::open(config, Some(key)).unwrap());
        let found = session.find(InternetPassword::matching("example.com")).unwrap();
        assert_eq!(found.secret().unwrap().expose_secret(), b"rotated");
        assert!(matches!(found, KeychainItem::Internet(ref i) if i.protocol == Some(Protocol::Https)));
    }
}
