//! Keychain Item Model
//!
//! Value types for stored credentials. [`KeychainItem`] is the closed set of
//! supported variants; each variant implements the [`PasswordItem`]
//! capability that converts it to and from store attribute maps.

pub mod generic;
pub mod internet;
pub mod secret;
pub mod template;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attributes::{AttrKey, AttrValue, Attributes, ItemClass};
use crate::error::{KeychainError, KeychainResult};
use crate::store::StoreRecord;

pub use generic::GenericPassword;
pub use internet::{AuthScheme, InternetPassword, Protocol};
pub use secret::SecretData;
pub use template::ItemTemplate;

/// Attributes shared by every credential kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCommon {
    /// Account identifier; empty means unspecified
    #[serde(default)]
    pub account: String,
    pub label: Option<String>,
    pub comment: Option<String>,
    #[serde(default)]
    pub synchronizable: bool,
    /// Set by the store
    pub created_at: Option<DateTime<Utc>>,
    /// Set by the store
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretData>,
}

impl ItemCommon {
    pub(crate) fn with_account(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            ..Default::default()
        }
    }

    fn from_record(record: &StoreRecord) -> KeychainResult<Self> {
        let attrs = &record.attributes;
        Ok(Self {
            account: attrs.text(AttrKey::Account)?.unwrap_or_default().to_string(),
            label: attrs.text(AttrKey::Label)?.map(str::to_string),
            comment: attrs.text(AttrKey::Comment)?.map(str::to_string),
            synchronizable: attrs.flag(AttrKey::Synchronizable)?.unwrap_or(false),
            created_at: attrs.date(AttrKey::CreationDate)?,
            modified_at: attrs.date(AttrKey::ModificationDate)?,
            secret: record.data.clone(),
        })
    }
}

/// Capability shared by the concrete credential kinds
pub trait PasswordItem: Sized {
    const CLASS: ItemClass;

    fn common(&self) -> &ItemCommon;

    fn common_mut(&mut self) -> &mut ItemCommon;

    /// Write the variant-specific identity attributes that are set
    fn write_identity(&self, attrs: &mut Attributes);

    /// Whether every attribute required to add the item is present
    fn has_natural_key(&self) -> bool;

    /// Build the variant from a record's identity attributes
    fn from_identity(attrs: &Attributes, common: ItemCommon) -> KeychainResult<Self>;

    /// Non-empty identity attributes, always including the class
    fn query_attributes(&self) -> Attributes {
        let mut attrs = Attributes::for_class(Self::CLASS);
        attrs.insert_text(AttrKey::Account, &self.common().account);
        self.write_identity(&mut attrs);
        attrs
    }

    /// Secret payload and persisted metadata; fails on a template
    fn secret_attributes(&self) -> KeychainResult<Attributes> {
        let common = self.common();
        let secret = common
            .secret
            .as_ref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                KeychainError::invalid(format!("{} has no secret payload", Self::CLASS))
            })?;

        let mut attrs = Attributes::new();
        attrs.insert(AttrKey::ValueData, AttrValue::Data(secret.clone()));
        attrs.insert_opt_text(AttrKey::Label, common.label.as_deref());
        attrs.insert_opt_text(AttrKey::Comment, common.comment.as_deref());
        attrs.insert(AttrKey::Synchronizable, AttrValue::Flag(common.synchronizable));
        Ok(attrs)
    }

    fn from_record(record: &StoreRecord) -> KeychainResult<Self> {
        let class = record.attributes.class()?;
        if class != Self::CLASS {
            return Err(KeychainError::invalid(format!(
                "expected {}, record is {}",
                Self::CLASS,
                class
            )));
        }
        let common = ItemCommon::from_record(record)?;
        Self::from_identity(&record.attributes, common)
    }
}

/// A stored credential of any supported kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", content = "item", rename_all = "snake_case")]
pub enum KeychainItem {
    Generic(GenericPassword),
    Internet(InternetPassword),
}

impl KeychainItem {
    pub fn class(&self) -> ItemClass {
        match self {
            Self::Generic(_) => ItemClass::Generic,
            Self::Internet(_) => ItemClass::Internet,
        }
    }

    pub fn common(&self) -> &ItemCommon {
        match self {
            Self::Generic(item) => item.common(),
            Self::Internet(item) => item.common(),
        }
    }

    pub(crate) fn common_mut(&mut self) -> &mut ItemCommon {
        match self {
            Self::Generic(item) => item.common_mut(),
            Self::Internet(item) => item.common_mut(),
        }
    }

    pub fn account(&self) -> &str {
        &self.common().account
    }

    pub fn secret(&self) -> Option<&SecretData> {
        self.common().secret.as_ref()
    }

    /// Carries a non-empty secret payload
    pub fn is_concrete(&self) -> bool {
        self.secret().is_some_and(|s| !s.is_empty())
    }

    pub fn has_natural_key(&self) -> bool {
        match self {
            Self::Generic(item) => item.has_natural_key(),
            Self::Internet(item) => item.has_natural_key(),
        }
    }

    pub fn query_attributes(&self) -> Attributes {
        match self {
            Self::Generic(item) => item.query_attributes(),
            Self::Internet(item) => item.query_attributes(),
        }
    }

    pub fn secret_attributes(&self) -> KeychainResult<Attributes> {
        match self {
            Self::Generic(item) => item.secret_attributes(),
            Self::Internet(item) => item.secret_attributes(),
        }
    }

    /// Parse a store record; the class attribute alone picks the variant
    pub fn from_record(record: &StoreRecord) -> KeychainResult<Self> {
        match record.attributes.class()? {
            ItemClass::Generic => GenericPassword::from_record(record).map(Self::Generic),
            ItemClass::Internet => InternetPassword::from_record(record).map(Self::Internet),
        }
    }

    /// Identity-only copy of this item
    pub fn to_template(&self) -> ItemTemplate {
        ItemTemplate::from(self.clone())
    }
}

impl From<GenericPassword> for KeychainItem {
    fn from(item: GenericPassword) -> Self {
        Self::Generic(item)
    }
}

impl From<InternetPassword> for KeychainItem {
    fn from(item: InternetPassword) -> Self {
        Self::Internet(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(attrs: Attributes) -> StoreRecord {
        StoreRecord::new(attrs, None)
    }

    #[test]
    fn test_dispatch_on_class() {
        let generic = GenericPassword::new("svc", "bob", "p@ss");
        let parsed = KeychainItem::from_record(&record(generic.query_attributes())).unwrap();
        assert_eq!(parsed.class(), ItemClass::Generic);

        let inet = InternetPassword::new("example.com", "bob", "p@ss");
        let parsed = KeychainItem::from_record(&record(inet.query_attributes())).unwrap();
        assert_eq!(parsed.class(), ItemClass::Internet);
    }

    #[test]
    fn test_unknown_class_is_rejected() {
        let mut attrs = GenericPassword::new("svc", "bob", "p@ss").query_attributes();
        attrs.insert(AttrKey::Class, "cert");
        let err = KeychainItem::from_record(&record(attrs)).unwrap_err();
        assert!(matches!(err, KeychainError::InvalidItemData(_)));
    }

    #[test]
    fn test_missing_class_is_rejected() {
        let mut attrs = GenericPassword::new("svc", "bob", "p@ss").query_attributes();
        attrs.remove(AttrKey::Class);
        assert!(KeychainItem::from_record(&record(attrs)).is_err());
    }

    #[test]
    fn test_variant_rejects_other_class() {
        let attrs = InternetPassword::new("example.com", "bob", "x").query_attributes();
        let err = GenericPassword::from_record(&record(attrs)).unwrap_err();
        assert!(matches!(err, KeychainError::InvalidItemData(_)));
    }

    #[test]
    fn test_secret_attributes_require_payload() {
        let template = GenericPassword::matching("svc", "bob");
        assert!(template.secret_attributes().is_err());

        let empty = GenericPassword::new("svc", "bob", "");
        assert!(!KeychainItem::from(empty.clone()).is_concrete());
        assert!(empty.secret_attributes().is_err());

        let item = GenericPassword::new("svc", "bob", "p@ss").with_label("Bob");
        let attrs = item.secret_attributes().unwrap();
        assert!(attrs.contains(AttrKey::ValueData));
        assert_eq!(attrs.text(AttrKey::Label).unwrap(), Some("Bob"));
        assert!(!attrs.contains(AttrKey::Service));
    }

    #[test]
    fn test_identity_roundtrip_drops_secret() {
        let items: Vec<KeychainItem> = vec![
            GenericPassword::new("svc", "bob", "p@ss").into(),
            InternetPassword::new("example.com", "alice", "pw")
                .with_port(8443)
                .with_protocol(Protocol::Https)
                .with_auth_scheme(AuthScheme::HtmlForm)
                .with_security_domain("realm")
                .with_path("/login")
                .into(),
        ];

        for item in items {
            let parsed = KeychainItem::from_record(&record(item.query_attributes())).unwrap();
            assert_eq!(parsed.query_attributes(), item.query_attributes());
            assert!(parsed.secret().is_none());
        }
    }

    #[test]
    fn test_json_shape() {
        let item: KeychainItem = GenericPassword::new("svc", "bob", "p@ss").into();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["class"], "generic");
        assert_eq!(json["item"]["service"], "svc");
        assert_eq!(json["item"]["common"]["account"], "bob");
    }
}
