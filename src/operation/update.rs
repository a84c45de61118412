//! Update matching credentials in place.

use crate::attributes::{AttrKey, AttrValue, Attributes, ItemClass};
use crate::error::{KeychainError, KeychainResult};
use crate::item::{AuthScheme, ItemTemplate, Protocol, SecretData};
use crate::store::{SecureStore, StoreResult};

use super::{Lifecycle, Operation, Verb, sealed, store_error};

/// New values to write onto matched items
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    attributes: Attributes,
}

impl ItemChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn secret(mut self, secret: impl Into<SecretData>) -> Self {
        self.attributes
            .insert(AttrKey::ValueData, AttrValue::Data(secret.into()));
        self
    }

    pub fn account(self, account: impl Into<String>) -> Self {
        self.text(AttrKey::Account, account)
    }

    pub fn label(self, label: impl Into<String>) -> Self {
        self.text(AttrKey::Label, label)
    }

    pub fn comment(self, comment: impl Into<String>) -> Self {
        self.text(AttrKey::Comment, comment)
    }

    pub fn synchronizable(mut self, synchronizable: bool) -> Self {
        self.attributes
            .insert(AttrKey::Synchronizable, AttrValue::Flag(synchronizable));
        self
    }

    pub fn service(self, service: impl Into<String>) -> Self {
        self.text(AttrKey::Service, service)
    }

    pub fn server(self, server: impl Into<String>) -> Self {
        self.text(AttrKey::Server, server)
    }

    pub fn port(mut self, port: u16) -> Self {
        self.attributes
            .insert(AttrKey::Port, AttrValue::Number(u32::from(port)));
        self
    }

    pub fn protocol(self, protocol: Protocol) -> Self {
        self.text(AttrKey::Protocol, protocol.as_str())
    }

    pub fn auth_scheme(self, scheme: AuthScheme) -> Self {
        self.text(AttrKey::AuthType, scheme.as_str())
    }

    pub fn security_domain(self, domain: impl Into<String>) -> Self {
        self.text(AttrKey::SecurityDomain, domain)
    }

    pub fn path(self, path: impl Into<String>) -> Self {
        self.text(AttrKey::Path, path)
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn text(mut self, key: AttrKey, value: impl Into<String>) -> Self {
        self.attributes.insert(key, AttrValue::Text(value.into()));
        self
    }
}

/// Matching and new-value attribute maps sent to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub query: Attributes,
    pub changes: Attributes,
}

/// Apply [`ItemChanges`] to every item matching a scoped template
#[derive(Debug, Clone)]
pub struct Update {
    template: ItemTemplate,
    changes: ItemChanges,
    lifecycle: Lifecycle,
}

impl Update {
    pub fn new(template: impl Into<ItemTemplate>, changes: ItemChanges) -> Self {
        Self {
            template: template.into(),
            changes,
            lifecycle: Lifecycle::default(),
        }
    }

    pub fn template(&self) -> &ItemTemplate {
        &self.template
    }

    pub fn changes(&self) -> &ItemChanges {
        &self.changes
    }
}

impl sealed::Sealed for Update {}

impl Operation for Update {
    type Request = UpdateRequest;
    type Response = usize;
    type Output = usize;

    const VERB: Verb = Verb::Update;

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
        let class = self.class();
        if !self.template.is_scoped() {
            return Err(KeychainError::contract(format!(
                "update of {} items needs at least one identity attribute",
                class
            )));
        }
        if self.changes.is_empty() {
            return Err(KeychainError::contract("update has no changes"));
        }

        let overlap = self
            .template
            .query_attributes()
            .overlapping_keys(self.changes.attributes());
        if !overlap.is_empty() {
            let keys: Vec<&str> = overlap.iter().map(|k| k.as_str()).collect();
            return Err(KeychainError::contract(format!(
                "update matches and changes the same attributes: {}",
                keys.join(", ")
            )));
        }

        for (key, value) in self.changes.attributes().iter() {
            if !class.allows(key) {
                return Err(KeychainError::invalid(format!(
                    "'{}' is not an attribute of {} items",
                    key, class
                )));
            }
            match value {
                AttrValue::Data(secret) if secret.is_empty() => {
                    return Err(KeychainError::invalid("new secret payload is empty"));
                }
                AttrValue::Text(text)
                    if text.is_empty() && class.required_keys().contains(&key) =>
                {
                    return Err(KeychainError::invalid(format!(
                        "'{}' is required for {} items and cannot be cleared",
                        key, class
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn build_query(&self) -> KeychainResult<UpdateRequest> {
        Ok(UpdateRequest {
            query: self.template.query_attributes(),
            changes: self.changes.attributes().clone(),
        })
    }

    fn execute(store: &dyn SecureStore, request: &UpdateRequest) -> StoreResult<usize> {
        store.update(&request.query, &request.changes)
    }

    fn interpret(&self, result: StoreResult<usize>) -> KeychainResult<usize> {
        result.map_err(|status| store_error(Self::VERB, status))
    }
}
