//! Native store status codes.

use std::fmt;

/// Raw outcome code returned by a secure store.
///
/// The values follow the platform keychain's status space so that a native
/// backend can pass its codes through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreStatus(i32);

impl StoreStatus {
    pub const SUCCESS: Self = Self(0);
    pub const IO: Self = Self(-36);
    pub const PARAM: Self = Self(-50);
    pub const USER_CANCELED: Self = Self(-128);
    pub const NOT_AVAILABLE: Self = Self(-25291);
    pub const READ_ONLY: Self = Self(-25292);
    pub const AUTH_FAILED: Self = Self(-25293);
    pub const DUPLICATE_ITEM: Self = Self(-25299);
    pub const ITEM_NOT_FOUND: Self = Self(-25300);
    pub const INTERACTION_NOT_ALLOWED: Self = Self(-25308);
    pub const DECODE: Self = Self(-26275);
    pub const MISSING_ENTITLEMENT: Self = Self(-34018);

    pub const fn from_code(code: i32) -> Self {
        Self(code)
    }

    pub const fn code(&self) -> i32 {
        self.0
    }

    pub fn description(&self) -> &'static str {
        match *self {
            Self::SUCCESS => "success",
            Self::IO => "I/O error",
            Self::PARAM => "invalid parameter",
            Self::USER_CANCELED => "user canceled",
            Self::NOT_AVAILABLE => "store not available",
            Self::READ_ONLY => "store is read-only",
            Self::AUTH_FAILED => "authentication failed",
            Self::DUPLICATE_ITEM => "duplicate item",
            Self::ITEM_NOT_FOUND => "item not found",
            Self::INTERACTION_NOT_ALLOWED => "interaction not allowed",
            Self::DECODE => "unable to decode data",
            Self::MISSING_ENTITLEMENT => "missing entitlement",
            _ => "unrecognized status",
        }
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.0)
    }
}

impl std::error::Error for StoreStatus {}

pub type StoreResult<T> = Result<T, StoreStatus>;
