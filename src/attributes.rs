//! Attribute Vocabulary
//!
//! The fixed key/value vocabulary spoken at the secure store boundary.
//! Items are converted to and from [`Attributes`] maps; no other module
//! builds store dictionaries by hand.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{KeychainError, KeychainResult};
use crate::item::SecretData;

/// Item-class discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemClass {
    Generic,
    Internet,
}

impl ItemClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "genp",
            Self::Internet => "inet",
        }
    }

    /// Unknown codes are not mapped to a default class.
    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "genp" => Some(Self::Generic),
            "inet" => Some(Self::Internet),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Generic => "Generic Password",
            Self::Internet => "Internet Password",
        }
    }

    /// Attributes that make up the natural key within this class
    pub fn primary_key(&self) -> &'static [AttrKey] {
        match self {
            Self::Generic => &[AttrKey::Service, AttrKey::Account],
            Self::Internet => &[
                AttrKey::Server,
                AttrKey::Account,
                AttrKey::Port,
                AttrKey::Protocol,
                AttrKey::AuthType,
                AttrKey::SecurityDomain,
                AttrKey::Path,
            ],
        }
    }

    /// Natural-key attributes that may never be empty
    pub fn required_keys(&self) -> &'static [AttrKey] {
        match self {
            Self::Generic => &[AttrKey::Service, AttrKey::Account],
            Self::Internet => &[AttrKey::Server],
        }
    }

    /// Whether `key` belongs to this class's vocabulary
    pub fn allows(&self, key: AttrKey) -> bool {
        match key {
            AttrKey::Class
            | AttrKey::Account
            | AttrKey::Label
            | AttrKey::Comment
            | AttrKey::Synchronizable
            | AttrKey::CreationDate
            | AttrKey::ModificationDate
            | AttrKey::ValueData => true,
            AttrKey::Service => *self == Self::Generic,
            AttrKey::Server
            | AttrKey::Port
            | AttrKey::Protocol
            | AttrKey::AuthType
            | AttrKey::SecurityDomain
            | AttrKey::Path => *self == Self::Internet,
        }
    }
}

impl fmt::Display for ItemClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Attribute keys understood by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttrKey {
    Class,
    Account,
    Label,
    Comment,
    Synchronizable,
    CreationDate,
    ModificationDate,
    Service,
    Server,
    Port,
    Protocol,
    AuthType,
    SecurityDomain,
    Path,
    ValueData,
}

/// Shape of the value stored under a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Number,
    Flag,
    Date,
    Data,
}

impl AttrKey {
    pub const ALL: [AttrKey; 15] = [
        Self::Class,
        Self::Account,
        Self::Label,
        Self::Comment,
        Self::Synchronizable,
        Self::CreationDate,
        Self::ModificationDate,
        Self::Service,
        Self::Server,
        Self::Port,
        Self::Protocol,
        Self::AuthType,
        Self::SecurityDomain,
        Self::Path,
        Self::ValueData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Account => "acct",
            Self::Label => "labl",
            Self::Comment => "icmt",
            Self::Synchronizable => "sync",
            Self::CreationDate => "cdat",
            Self::ModificationDate => "mdat",
            Self::Service => "svce",
            Self::Server => "srvr",
            Self::Port => "port",
            Self::Protocol => "ptcl",
            Self::AuthType => "atyp",
            Self::SecurityDomain => "sdmn",
            Self::Path => "path",
            Self::ValueData => "v_Data",
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Synchronizable => ValueKind::Flag,
            Self::CreationDate | Self::ModificationDate => ValueKind::Date,
            Self::Port => ValueKind::Number,
            Self::ValueData => ValueKind::Data,
            _ => ValueKind::Text,
        }
    }

    /// Keys the store maintains itself and never accepts from callers
    pub fn is_store_managed(&self) -> bool {
        matches!(self, Self::CreationDate | Self::ModificationDate)
    }
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Text(String),
    Number(u32),
    Flag(bool),
    Date(DateTime<Utc>),
    Data(SecretData),
}

impl AttrValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Number(_) => ValueKind::Number,
            Self::Flag(_) => ValueKind::Flag,
            Self::Date(_) => ValueKind::Date,
            Self::Data(_) => ValueKind::Data,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Key/value dictionary exchanged with the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(BTreeMap<AttrKey, AttrValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_class(class: ItemClass) -> Self {
        let mut attrs = Self::new();
        attrs.insert(AttrKey::Class, class.as_str());
        attrs
    }

    pub fn insert(&mut self, key: AttrKey, value: impl Into<AttrValue>) -> Option<AttrValue> {
        self.0.insert(key, value.into())
    }

    /// Insert `value` only when it is a non-empty string
    pub fn insert_text(&mut self, key: AttrKey, value: &str) {
        if !value.is_empty() {
            self.0.insert(key, AttrValue::Text(value.to_string()));
        }
    }

    pub fn insert_opt_text(&mut self, key: AttrKey, value: Option<&str>) {
        if let Some(v) = value {
            self.insert_text(key, v);
        }
    }

    pub fn get(&self, key: AttrKey) -> Option<&AttrValue> {
        self.0.get(&key)
    }

    pub fn remove(&mut self, key: AttrKey) -> Option<AttrValue> {
        self.0.remove(&key)
    }

    pub fn contains(&self, key: AttrKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = AttrKey> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttrKey, &AttrValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    pub fn extend(&mut self, other: Attributes) {
        self.0.extend(other.0);
    }

    /// Keys present in both maps
    pub fn overlapping_keys(&self, other: &Attributes) -> Vec<AttrKey> {
        self.keys().filter(|k| other.contains(*k)).collect()
    }

    /// Whether every pair in `query` is present and equal here
    pub fn matches(&self, query: &Attributes) -> bool {
        query.iter().all(|(k, v)| self.get(k) == Some(v))
    }

    /// Item class recorded under [`AttrKey::Class`]
    pub fn class(&self) -> KeychainResult<ItemClass> {
        let code = self
            .text(AttrKey::Class)?
            .ok_or_else(|| KeychainError::invalid("missing item class"))?;
        ItemClass::from_code(code)
            .ok_or_else(|| KeychainError::invalid(format!("unknown item class '{}'", code)))
    }

    /// Natural-key values, or `None` when the class is absent or unknown
    pub fn primary_key(&self) -> Option<(ItemClass, Vec<Option<&AttrValue>>)> {
        let class = self.class().ok()?;
        let values = class.primary_key().iter().map(|k| self.get(*k)).collect();
        Some((class, values))
    }

    /// Whether both maps identify the same stored item
    pub fn same_primary_key(&self, other: &Attributes) -> bool {
        match (self.primary_key(), other.primary_key()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    pub fn text(&self, key: AttrKey) -> KeychainResult<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(AttrValue::Text(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(type_mismatch(key)),
        }
    }

    pub fn number(&self, key: AttrKey) -> KeychainResult<Option<u32>> {
        match self.get(key) {
            None => Ok(None),
            Some(AttrValue::Number(n)) => Ok(Some(*n)),
            Some(_) => Err(type_mismatch(key)),
        }
    }

    pub fn flag(&self, key: AttrKey) -> KeychainResult<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(AttrValue::Flag(b)) => Ok(Some(*b)),
            Some(_) => Err(type_mismatch(key)),
        }
    }

    pub fn date(&self, key: AttrKey) -> KeychainResult<Option<DateTime<Utc>>> {
        match self.get(key) {
            None => Ok(None),
            Some(AttrValue::Date(d)) => Ok(Some(*d)),
            Some(_) => Err(type_mismatch(key)),
        }
    }

    pub fn data(&self, key: AttrKey) -> KeychainResult<Option<&SecretData>> {
        match self.get(key) {
            None => Ok(None),
            Some(AttrValue::Data(d)) => Ok(Some(d)),
            Some(_) => Err(type_mismatch(key)),
        }
    }
}

impl FromIterator<(AttrKey, AttrValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (AttrKey, AttrValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn type_mismatch(key: AttrKey) -> KeychainError {
    KeychainError::invalid(format!("attribute '{}' has an unexpected type", key))
}
