//! Secure Store Boundary
//!
//! The dictionary/status-code interface a backing store exposes. Operations
//! talk to stores only through [`SecureStore`]; results come back as
//! attribute maps, counts, or a raw [`StoreStatus`].

pub mod memory;
pub mod sqlite;
pub mod status;

use crate::attributes::{AttrKey, Attributes, ItemClass, ValueKind};
use crate::item::SecretData;

pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, StoreConfig};
pub use status::{StoreResult, StoreStatus};

/// How many matches a lookup returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchLimit {
    /// First match only
    #[default]
    One,
    All,
}

/// Lookup request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    pub attributes: Attributes,
    pub match_limit: MatchLimit,
    /// Include the secret payload in each record
    pub return_data: bool,
}

/// One item as returned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRecord {
    pub attributes: Attributes,
    pub data: Option<SecretData>,
}

impl StoreRecord {
    pub fn new(attributes: Attributes, data: Option<SecretData>) -> Self {
        Self { attributes, data }
    }
}

/// A secure key/value credential store.
///
/// Every method reports "nothing matched" as
/// [`StoreStatus::ITEM_NOT_FOUND`] and a natural-key collision as
/// [`StoreStatus::DUPLICATE_ITEM`]. Implementations must tolerate calls from
/// several threads.
pub trait SecureStore: Send + Sync {
    /// Persist a new item. `attributes` carries the class, identity,
    /// metadata and the secret under [`AttrKey::ValueData`]. Returns the
    /// stored attributes without the secret.
    fn add(&self, attributes: &Attributes) -> StoreResult<Attributes>;

    /// Records matching every attribute in the query. When data was
    /// requested, a record whose secret could not be decoded is returned
    /// with `data: None`.
    fn copy_matching(&self, query: &StoreQuery) -> StoreResult<Vec<StoreRecord>>;

    /// Apply `changes` to every item matching `query`; returns the count
    fn update(&self, query: &Attributes, changes: &Attributes) -> StoreResult<usize>;

    /// Remove every item matching `query`; returns the count
    fn delete(&self, query: &Attributes) -> StoreResult<usize>;
}

/// Reject malformed add requests the way a native store would
pub(crate) fn check_add_request(attributes: &Attributes) -> StoreResult<ItemClass> {
    let class = attributes.class().map_err(|_| StoreStatus::PARAM)?;
    check_vocabulary(class, attributes)?;
    match attributes.get(AttrKey::ValueData) {
        Some(value) if value.kind() == ValueKind::Data => Ok(class),
        _ => Err(StoreStatus::PARAM),
    }
}

/// Queries may not carry secrets and must name a known class
pub(crate) fn check_query(query: &Attributes) -> StoreResult<ItemClass> {
    let class = query.class().map_err(|_| StoreStatus::PARAM)?;
    if query.contains(AttrKey::ValueData) {
        return Err(StoreStatus::PARAM);
    }
    check_vocabulary(class, query)?;
    Ok(class)
}

pub(crate) fn check_changes(class: ItemClass, changes: &Attributes) -> StoreResult<()> {
    if changes.is_empty() || changes.contains(AttrKey::Class) {
        return Err(StoreStatus::PARAM);
    }
    check_vocabulary(class, changes)
}

fn check_vocabulary(class: ItemClass, attributes: &Attributes) -> StoreResult<()> {
    let valid = attributes.iter().all(|(key, value)| {
        class.allows(key) && !key.is_store_managed() && value.kind() == key.kind()
    });
    if valid { Ok(()) } else { Err(StoreStatus::PARAM) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttrValue;

    #[test]
    fn test_add_request_needs_data() {
        let mut attrs = Attributes::for_class(ItemClass::Generic);
        attrs.insert(AttrKey::Service, "svc");
        assert_eq!(check_add_request(&attrs), Err(StoreStatus::PARAM));

        attrs.insert(AttrKey::ValueData, AttrValue::Data(SecretData::from("x")));
        assert_eq!(check_add_request(&attrs), Ok(ItemClass::Generic));
    }

    #[test]
    fn test_query_rejects_secret_and_foreign_keys() {
        let mut query = Attributes::for_class(ItemClass::Generic);
        query.insert(AttrKey::Server, "example.com");
        assert_eq!(check_query(&query), Err(StoreStatus::PARAM));

        let mut query = Attributes::for_class(ItemClass::Generic);
        query.insert(AttrKey::ValueData, AttrValue::Data(SecretData::from("x")));
        assert_eq!(check_query(&query), Err(StoreStatus::PARAM));
    }

    #[test]
    fn test_changes_reject_dates_and_class() {
        let mut changes = Attributes::new();
        changes.insert(AttrKey::CreationDate, AttrValue::Date(chrono::Utc::now()));
        assert!(check_changes(ItemClass::Generic, &changes).is_err());

        let changes = Attributes::for_class(ItemClass::Generic);
        assert!(check_changes(ItemClass::Generic, &changes).is_err());
    }
}
