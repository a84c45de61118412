//! Error Taxonomy
//!
//! Semantic error kinds surfaced to callers. Native store status codes are
//! folded into these by [`KeychainError::from_status`]; nothing else in the
//! crate inspects raw codes.

use thiserror::Error;

use crate::store::StoreStatus;

/// Errors returned by every public keychain operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeychainError {
    #[error("No matching keychain item")]
    NotFound,

    #[error("Keychain item already exists")]
    DuplicateItem,

    #[error("Access to the keychain was denied")]
    AccessDenied,

    #[error("Invalid item data: {0}")]
    InvalidItemData(String),

    #[error("Keychain store unavailable")]
    StoreUnavailable,

    #[error("Unknown keychain status: {0}")]
    Unknown(i32),

    #[error("Contract violation: {0}")]
    ContractViolation(String),
}

/// Discriminant of [`KeychainError`], used where the payload is irrelevant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    DuplicateItem,
    AccessDenied,
    InvalidItemData,
    StoreUnavailable,
    Unknown,
    ContractViolation,
}

impl KeychainError {
    /// Map a native store status to its semantic error.
    ///
    /// A success status has no error meaning; it maps to `Unknown(0)` so a
    /// store that reports failure with a zero code is still visible.
    pub fn from_status(status: StoreStatus) -> Self {
        match status {
            StoreStatus::ITEM_NOT_FOUND => Self::NotFound,
            StoreStatus::DUPLICATE_ITEM => Self::DuplicateItem,
            StoreStatus::AUTH_FAILED
            | StoreStatus::USER_CANCELED
            | StoreStatus::MISSING_ENTITLEMENT => Self::AccessDenied,
            StoreStatus::INTERACTION_NOT_ALLOWED
            | StoreStatus::NOT_AVAILABLE
            | StoreStatus::READ_ONLY
            | StoreStatus::IO => Self::StoreUnavailable,
            StoreStatus::PARAM | StoreStatus::DECODE => {
                Self::InvalidItemData(format!("store rejected item ({})", status.description()))
            }
            other => Self::Unknown(other.code()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::DuplicateItem => ErrorKind::DuplicateItem,
            Self::AccessDenied => ErrorKind::AccessDenied,
            Self::InvalidItemData(_) => ErrorKind::InvalidItemData,
            Self::StoreUnavailable => ErrorKind::StoreUnavailable,
            Self::Unknown(_) => ErrorKind::Unknown,
            Self::ContractViolation(_) => ErrorKind::ContractViolation,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidItemData(msg.into())
    }

    pub(crate) fn contract(msg: impl Into<String>) -> Self {
        Self::ContractViolation(msg.into())
    }
}

impl From<StoreStatus> for KeychainError {
    fn from(status: StoreStatus) -> Self {
        Self::from_status(status)
    }
}

pub type KeychainResult<T> = Result<T, KeychainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_statuses() {
        assert_eq!(
            KeychainError::from_status(StoreStatus::ITEM_NOT_FOUND),
            KeychainError::NotFound
        );
        assert_eq!(
            KeychainError::from_status(StoreStatus::DUPLICATE_ITEM),
            KeychainError::DuplicateItem
        );
        assert_eq!(
            KeychainError::from_status(StoreStatus::USER_CANCELED),
            KeychainError::AccessDenied
        );
        assert_eq!(
            KeychainError::from_status(StoreStatus::INTERACTION_NOT_ALLOWED),
            KeychainError::StoreUnavailable
        );
        assert_eq!(
            KeychainError::from_status(StoreStatus::DECODE).kind(),
            ErrorKind::InvalidItemData
        );
    }

    #[test]
    fn test_unmapped_status_keeps_code() {
        let err = KeychainError::from_status(StoreStatus::from_code(-67_000));
        assert_eq!(err, KeychainError::Unknown(-67_000));
        assert_eq!(err.to_string(), "Unknown keychain status: -67000");
    }

    #[test]
    fn test_success_is_not_an_error_kind() {
        assert_eq!(
            KeychainError::from_status(StoreStatus::SUCCESS),
            KeychainError::Unknown(0)
        );
    }
}
