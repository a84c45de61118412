//! keychain-kit - Typed Keychain Access
//!
//! Typed add, delete, update and search of password credentials over a
//! secure store, with status codes folded into a small error taxonomy.
//!
//! ```no_run
//! use keychain_kit::{GenericPassword, MemoryStore, Session};
//!
//! let session = Session::new(MemoryStore::new());
//! session.add(GenericPassword::new("api.example", "bob", "s3cret"))?;
//! let _item = session.find(GenericPassword::matching("api.example", "bob"))?;
//! # Ok::<(), keychain_kit::KeychainError>(())
//! ```

pub mod attributes;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod item;
pub mod operation;
pub mod session;
pub mod store;

// Re-exports
pub use attributes::{AttrKey, AttrValue, Attributes, ItemClass};
pub use codec::{CodecError, DataType, ItemCodec, JsonCodec, codec_for};
pub use crypto::StoreKey;
pub use error::{ErrorKind, KeychainError, KeychainResult};
pub use item::{
    AuthScheme, GenericPassword, InternetPassword, ItemCommon, ItemTemplate, KeychainItem,
    PasswordItem, Protocol, SecretData,
};
pub use operation::{
    Add, Delete, DeleteOutcome, ItemChanges, Operation, OperationState, Search, SearchResults,
    Update, Verb,
};
pub use session::Session;
pub use store::{
    MatchLimit, MemoryStore, SecureStore, SqliteStore, StoreConfig, StoreQuery, StoreRecord,
    StoreStatus,
};
