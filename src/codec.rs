//! Item Codecs
//!
//! Converts items to and from an opaque byte form for callers that hand
//! credentials to other layers (caches, IPC, exports). The form is chosen by
//! a [`DataType`] tag.

use std::fmt;

use thiserror::Error;

use crate::error::KeychainError;
use crate::item::KeychainItem;

/// Codec errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown data type: {0}")]
    UnknownDataType(String),

    #[error("Invalid item: {0}")]
    InvalidItem(String),
}

pub type CodecResult<T> = Result<T, CodecError>;

impl From<CodecError> for KeychainError {
    fn from(e: CodecError) -> Self {
        KeychainError::invalid(e.to_string())
    }
}

/// Byte forms understood by [`codec_for`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Full item as JSON, secret encoded as base64
    Json,
    /// Identity and metadata only; secrets are dropped on both sides
    JsonIdentity,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::JsonIdentity => "json-identity",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "json" => Some(Self::Json),
            "json-identity" => Some(Self::JsonIdentity),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model conversion boundary
pub trait ItemCodec: Send + Sync {
    fn data_type(&self) -> DataType;

    fn encode(&self, item: &KeychainItem) -> CodecResult<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> CodecResult<KeychainItem>;
}

/// JSON codec built on `serde_json`
#[derive(Debug, Clone, Copy)]
pub struct JsonCodec {
    include_secret: bool,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self {
            include_secret: true,
        }
    }

    pub fn identity_only() -> Self {
        Self {
            include_secret: false,
        }
    }

    fn scrub(&self, item: &mut KeychainItem) {
        if !self.include_secret {
            item.common_mut().secret = None;
        }
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemCodec for JsonCodec {
    fn data_type(&self) -> DataType {
        if self.include_secret {
            DataType::Json
        } else {
            DataType::JsonIdentity
        }
    }

    fn encode(&self, item: &KeychainItem) -> CodecResult<Vec<u8>> {
        if self.include_secret {
            return Ok(serde_json::to_vec(item)?);
        }
        let mut item = item.clone();
        self.scrub(&mut item);
        Ok(serde_json::to_vec(&item)?)
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<KeychainItem> {
        let mut item: KeychainItem = serde_json::from_slice(bytes)?;
        if !item.has_natural_key() {
            return Err(CodecError::InvalidItem(format!(
                "{} item is missing its identity attributes",
                item.class()
            )));
        }
        self.scrub(&mut item);
        Ok(item)
    }
}

/// Codec for a data type
pub fn codec_for(data_type: DataType) -> Box<dyn ItemCodec> {
    match data_type {
        DataType::Json => Box::new(JsonCodec::new()),
        DataType::JsonIdentity => Box::new(JsonCodec::identity_only()),
    }
}

/// Codec for a textual data type tag
pub fn codec_for_tag(tag: &str) -> CodecResult<Box<dyn ItemCodec>> {
    DataType::from_tag(tag)
        .map(codec_for)
        .ok_or_else(|| CodecError::UnknownDataType(tag.to_string()))
}
