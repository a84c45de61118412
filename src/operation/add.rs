//! Add a new credential.

use crate::attributes::{Attributes, ItemClass};
use crate::error::{KeychainError, KeychainResult};
use crate::item::{ItemTemplate, KeychainItem};
use crate::store::{SecureStore, StoreRecord, StoreResult};

use super::{Lifecycle, Operation, Verb, sealed, store_error};

/// Persist a concrete item. Succeeds with the stored identity; the secret
/// is never echoed back.
#[derive(Debug, Clone)]
pub struct Add {
    item: KeychainItem,
    lifecycle: Lifecycle,
}

impl Add {
    pub fn new(item: impl Into<KeychainItem>) -> Self {
        Self {
            item: item.into(),
            lifecycle: Lifecycle::default(),
        }
    }

    pub fn item(&self) -> &KeychainItem {
        &self.item
    }
}

impl sealed::Sealed for Add {}

impl Operation for Add {
    type Request = Attributes;
    type Response = Attributes;
    type Output = ItemTemplate;

    const VERB: Verb = Verb::Add;

    fn class(&self) -> ItemClass {
        self.item.class()
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn validate(&self) -> KeychainResult<()> {
        if !self.item.is_concrete() {
            return Err(KeychainError::invalid(format!(
                "{} to add has no secret payload",
                self.class()
            )));
        }
        if !self.item.has_natural_key() {
            return Err(KeychainError::invalid(format!(
                "{} to add is missing a required key attribute",
                self.class()
            )));
        }
        Ok(())
    }

    fn build_query(&self) -> KeychainResult<Attributes> {
        let mut attrs = self.item.query_attributes();
        attrs.extend(self.item.secret_attributes()?);
        Ok(attrs)
    }

    fn execute(store: &dyn SecureStore, request: &Attributes) -> StoreResult<Attributes> {
        store.add(request)
    }

    fn interpret(&self, result: StoreResult<Attributes>) -> KeychainResult<ItemTemplate> {
        let stored = result.map_err(|status| store_error(Self::VERB, status))?;
        let item = KeychainItem::from_record(&StoreRecord::new(stored, None))?;
        Ok(item.into())
    }
}
