//! SQLite Store
//!
//! A persistent [`SecureStore`] backed by a single SQLite file. Secret
//! payloads are sealed with a [`StoreKey`] before they reach the disk; the
//! remaining attributes are stored in plain columns so they can be queried.
//!
//! The store starts locked when opened without a key. While locked every
//! call fails with [`StoreStatus::INTERACTION_NOT_ALLOWED`], the same status
//! a platform keychain reports when it cannot prompt the user.

pub mod connection;
mod queries;
pub mod schema;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{Connection, ErrorCode};
use secrecy::ExposeSecret;
use uuid::Uuid;

use crate::attributes::{AttrKey, AttrValue, Attributes};
use crate::crypto::{StoreKey, open_bytes, seal_bytes};
use crate::item::SecretData;

pub use connection::StoreConfig;

use super::{
    SecureStore, StoreQuery, StoreRecord, StoreResult, StoreStatus, check_add_request,
    check_changes, check_query,
};
use queries::SealedRow;

const KEY_CHECK: &str = "key_check";

/// Map a SQLite failure onto the keychain status vocabulary
pub(crate) fn sqlite_status(err: rusqlite::Error) -> StoreStatus {
    let status = match &err {
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::IntegralValueOutOfRange(..)
        | rusqlite::Error::InvalidColumnType(..) => StoreStatus::DECODE,
        _ => match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => StoreStatus::DUPLICATE_ITEM,
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                StoreStatus::NOT_AVAILABLE
            }
            Some(ErrorCode::ReadOnly) => StoreStatus::READ_ONLY,
            Some(ErrorCode::PermissionDenied)
            | Some(ErrorCode::AuthorizationForStatementDenied) => StoreStatus::AUTH_FAILED,
            _ => StoreStatus::IO,
        },
    };
    log::warn!("SQLite error mapped to {}: {}", status, err);
    status
}

struct Inner {
    conn: Connection,
    key: Option<StoreKey>,
}

/// Encrypted, file-backed keychain
pub struct SqliteStore {
    config: StoreConfig,
    inner: Mutex<Inner>,
}

impl SqliteStore {
    /// Open (or create) the store. With a key, the store is unlocked
    /// immediately; a key that does not match the store's check value is
    /// rejected with [`StoreStatus::AUTH_FAILED`].
    pub fn open(config: StoreConfig, key: Option<StoreKey>) -> StoreResult<Self> {
        let conn = connection::open_connection(&config)?;
        log::debug!("Opened keychain store at {}", config.path.display());

        if let Some(key) = &key {
            install_or_verify_key(&conn, key)?;
        }

        Ok(Self {
            config,
            inner: Mutex::new(Inner { conn, key }),
        })
    }

    pub fn open_in_memory(key: StoreKey) -> StoreResult<Self> {
        Self::open(StoreConfig::in_memory(), Some(key))
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Forget the key; later calls fail until [`SqliteStore::unlock`]
    pub fn lock(&self) -> StoreResult<()> {
        let mut inner = self.guard()?;
        inner.key = None;
        log::info!("Keychain store locked");
        Ok(())
    }

    pub fn unlock(&self, key: StoreKey) -> StoreResult<()> {
        let mut inner = self.guard()?;
        install_or_verify_key(&inner.conn, &key)?;
        inner.key = Some(key);
        log::info!("Keychain store unlocked");
        Ok(())
    }

    pub fn is_locked(&self) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.key.is_none())
            .unwrap_or(true)
    }

    fn guard(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| StoreStatus::NOT_AVAILABLE)
    }

    /// Run `f` against the connection if the store is unlocked
    fn with_unlocked<T>(
        &self,
        f: impl FnOnce(&Connection, &StoreKey) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let inner = self.guard()?;
        match &inner.key {
            Some(key) => f(&inner.conn, key),
            None => Err(StoreStatus::INTERACTION_NOT_ALLOWED),
        }
    }
}

fn install_or_verify_key(conn: &Connection, key: &StoreKey) -> StoreResult<()> {
    match queries::get_metadata(conn, KEY_CHECK)? {
        Some(check) if key.verify(&check) => Ok(()),
        Some(_) => {
            log::warn!("Rejected store key: check value mismatch");
            Err(StoreStatus::AUTH_FAILED)
        }
        None => {
            let check = key.check_value().map_err(|e| {
                log::warn!("Failed to seal key check value: {}", e);
                StoreStatus::IO
            })?;
            queries::set_metadata(conn, KEY_CHECK, &check)
        }
    }
}

fn seal_secret(key: &StoreKey, secret: &SecretData) -> StoreResult<String> {
    seal_bytes(key.as_bytes(), secret.expose_secret()).map_err(|e| {
        log::warn!("Failed to seal secret: {}", e);
        StoreStatus::IO
    })
}

fn open_secret(key: &StoreKey, row: &SealedRow) -> StoreResult<SecretData> {
    let plain = open_bytes(key.as_bytes(), &row.sealed_secret).map_err(|e| {
        log::warn!("Failed to open stored secret: {}", e);
        StoreStatus::DECODE
    })?;
    Ok(SecretData::from(plain.as_slice()))
}

impl SecureStore for SqliteStore {
    fn add(&self, attributes: &Attributes) -> StoreResult<Attributes> {
        check_add_request(attributes)?;
        let Some(AttrValue::Data(secret)) = attributes.get(AttrKey::ValueData) else {
            return Err(StoreStatus::PARAM);
        };

        self.with_unlocked(|conn, key| {
            let sealed = seal_secret(key, secret)?;
            let id = Uuid::new_v4().to_string();
            queries::insert_item(conn, &id, attributes, &sealed, Utc::now())?;

            queries::get_item(conn, &id)?
                .map(|row| row.attributes)
                .ok_or(StoreStatus::IO)
        })
    }

    fn copy_matching(&self, query: &StoreQuery) -> StoreResult<Vec<StoreRecord>> {
        check_query(&query.attributes)?;

        self.with_unlocked(|conn, key| {
            let rows = queries::find_items(conn, &query.attributes, query.match_limit)?;
            if rows.is_empty() {
                return Err(StoreStatus::ITEM_NOT_FOUND);
            }

            // A row whose secret cannot be opened comes back without data.
            let records = rows
                .into_iter()
                .map(|row| {
                    let data = if query.return_data {
                        open_secret(key, &row).ok()
                    } else {
                        None
                    };
                    StoreRecord::new(row.attributes, data)
                })
                .collect();
            Ok(records)
        })
    }

    fn update(&self, query: &Attributes, changes: &Attributes) -> StoreResult<usize> {
        let class = check_query(query)?;
        check_changes(class, changes)?;

        self.with_unlocked(|conn, key| {
            let sealed = match changes.get(AttrKey::ValueData) {
                Some(AttrValue::Data(secret)) => Some(seal_secret(key, secret)?),
                _ => None,
            };

            match queries::update_items(conn, query, changes, sealed.as_deref(), Utc::now())? {
                0 => Err(StoreStatus::ITEM_NOT_FOUND),
                count => Ok(count),
            }
        })
    }

    fn delete(&self, query: &Attributes) -> StoreResult<usize> {
        check_query(query)?;

        self.with_unlocked(|conn, _| match queries::delete_items(conn, query)? {
            0 => Err(StoreStatus::ITEM_NOT_FOUND),
            count => Ok(count),
        })
    }
}
