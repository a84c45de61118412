//! Database Queries
//!
//! Translates attribute maps into parameterized SQL against the `items`
//! table and rows back into attribute maps.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};

use crate::attributes::{AttrKey, AttrValue, Attributes, ValueKind};
use crate::store::{MatchLimit, StoreResult, StoreStatus};

/// Columns selected for every item, in `COLUMN_KEYS` order
const ITEM_COLUMNS: &str = "class, account, label, comment, synchronizable, service, server, \
                            port, protocol, auth_type, security_domain, path, created_at, \
                            modified_at, secret";

const COLUMN_KEYS: [AttrKey; 14] = [
    AttrKey::Class,
    AttrKey::Account,
    AttrKey::Label,
    AttrKey::Comment,
    AttrKey::Synchronizable,
    AttrKey::Service,
    AttrKey::Server,
    AttrKey::Port,
    AttrKey::Protocol,
    AttrKey::AuthType,
    AttrKey::SecurityDomain,
    AttrKey::Path,
    AttrKey::CreationDate,
    AttrKey::ModificationDate,
];

/// A row as read from disk; the secret is still sealed
pub(super) struct SealedRow {
    pub attributes: Attributes,
    pub sealed_secret: String,
}

fn column(key: AttrKey) -> &'static str {
    match key {
        AttrKey::Class => "class",
        AttrKey::Account => "account",
        AttrKey::Label => "label",
        AttrKey::Comment => "comment",
        AttrKey::Synchronizable => "synchronizable",
        AttrKey::CreationDate => "created_at",
        AttrKey::ModificationDate => "modified_at",
        AttrKey::Service => "service",
        AttrKey::Server => "server",
        AttrKey::Port => "port",
        AttrKey::Protocol => "protocol",
        AttrKey::AuthType => "auth_type",
        AttrKey::SecurityDomain => "security_domain",
        AttrKey::Path => "path",
        AttrKey::ValueData => "secret",
    }
}

fn to_sql(value: &AttrValue) -> StoreResult<Value> {
    match value {
        AttrValue::Text(s) => Ok(Value::Text(s.clone())),
        AttrValue::Number(n) => Ok(Value::Integer(i64::from(*n))),
        AttrValue::Flag(b) => Ok(Value::Integer(i64::from(*b))),
        AttrValue::Date(d) => Ok(Value::Text(d.to_rfc3339())),
        // Secrets are sealed by the caller and never bound from an AttrValue.
        AttrValue::Data(_) => Err(StoreStatus::PARAM),
    }
}

/// Positional parameter list that hands out `?N` placeholders
#[derive(Default)]
struct Params(Vec<Value>);

impl Params {
    fn push(&mut self, value: Value) -> String {
        self.0.push(value);
        format!("?{}", self.0.len())
    }
}

fn where_clause(query: &Attributes, params: &mut Params) -> StoreResult<String> {
    let mut conditions = Vec::with_capacity(query.len());
    for (key, value) in query.iter() {
        let placeholder = params.push(to_sql(value)?);
        conditions.push(format!("{} = {}", column(key), placeholder));
    }
    Ok(conditions.join(" AND "))
}

/// Insert a new item; `sealed_secret` is already encrypted
pub(super) fn insert_item(
    conn: &Connection,
    id: &str,
    attributes: &Attributes,
    sealed_secret: &str,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    let mut params = Params::default();
    let mut columns = vec!["id", "secret", "created_at", "modified_at"];
    let mut placeholders = vec![
        params.push(Value::Text(id.to_string())),
        params.push(Value::Text(sealed_secret.to_string())),
        params.push(Value::Text(now.to_rfc3339())),
        params.push(Value::Text(now.to_rfc3339())),
    ];

    for (key, value) in attributes.iter() {
        if key == AttrKey::ValueData || key.is_store_managed() {
            continue;
        }
        columns.push(column(key));
        placeholders.push(params.push(to_sql(value)?));
    }

    let sql = format!(
        "INSERT INTO items ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    );
    conn.execute(&sql, params_from_iter(params.0.iter()))
        .map_err(super::sqlite_status)?;
    Ok(())
}

/// Fetch one item by row id
pub(super) fn get_item(conn: &Connection, id: &str) -> StoreResult<Option<SealedRow>> {
    let sql = format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS);
    conn.query_row(&sql, [id], row_to_sealed)
        .optional()
        .map_err(super::sqlite_status)
}

/// Items matching every attribute in `query`, oldest first
pub(super) fn find_items(
    conn: &Connection,
    query: &Attributes,
    limit: MatchLimit,
) -> StoreResult<Vec<SealedRow>> {
    let mut params = Params::default();
    let conditions = where_clause(query, &mut params)?;
    let limit_clause = match limit {
        MatchLimit::One => " LIMIT 1",
        MatchLimit::All => "",
    };
    let sql = format!(
        "SELECT {} FROM items WHERE {} ORDER BY created_at, rowid{}",
        ITEM_COLUMNS, conditions, limit_clause
    );

    let mut stmt = conn.prepare(&sql).map_err(super::sqlite_status)?;
    let rows = stmt
        .query_map(params_from_iter(params.0.iter()), row_to_sealed)
        .map_err(super::sqlite_status)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(super::sqlite_status)?;
    Ok(rows)
}

/// Apply attribute changes (and an already sealed secret) to matching items
pub(super) fn update_items(
    conn: &Connection,
    query: &Attributes,
    changes: &Attributes,
    sealed_secret: Option<&str>,
    now: DateTime<Utc>,
) -> StoreResult<usize> {
    let mut params = Params::default();
    let mut assignments = Vec::with_capacity(changes.len() + 2);

    for (key, value) in changes.iter() {
        if key == AttrKey::ValueData {
            continue;
        }
        let placeholder = params.push(to_sql(value)?);
        assignments.push(format!("{} = {}", column(key), placeholder));
    }
    if let Some(sealed) = sealed_secret {
        let placeholder = params.push(Value::Text(sealed.to_string()));
        assignments.push(format!("secret = {}", placeholder));
    }
    let placeholder = params.push(Value::Text(now.to_rfc3339()));
    assignments.push(format!("modified_at = {}", placeholder));

    let conditions = where_clause(query, &mut params)?;
    let sql = format!(
        "UPDATE items SET {} WHERE {}",
        assignments.join(", "),
        conditions
    );

    conn.execute(&sql, params_from_iter(params.0.iter()))
        .map_err(super::sqlite_status)
}

/// Delete matching items
pub(super) fn delete_items(conn: &Connection, query: &Attributes) -> StoreResult<usize> {
    let mut params = Params::default();
    let conditions = where_clause(query, &mut params)?;
    let sql = format!("DELETE FROM items WHERE {}", conditions);

    conn.execute(&sql, params_from_iter(params.0.iter()))
        .map_err(super::sqlite_status)
}

pub(super) fn get_metadata(conn: &Connection, key: &str) -> StoreResult<Option<String>> {
    conn.query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
        row.get(0)
    })
    .optional()
    .map_err(super::sqlite_status)
}

pub(super) fn set_metadata(conn: &Connection, key: &str, value: &str) -> StoreResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        [key, value],
    )
    .map_err(super::sqlite_status)?;
    Ok(())
}

fn row_to_sealed(row: &Row) -> rusqlite::Result<SealedRow> {
    let mut attributes = Attributes::new();

    for (idx, key) in COLUMN_KEYS.iter().enumerate() {
        let value = match key.kind() {
            ValueKind::Text => row.get::<_, Option<String>>(idx)?.map(AttrValue::Text),
            ValueKind::Number => row.get::<_, Option<u32>>(idx)?.map(AttrValue::Number),
            ValueKind::Flag => row.get::<_, Option<bool>>(idx)?.map(AttrValue::Flag),
            ValueKind::Date => row
                .get::<_, Option<String>>(idx)?
                .and_then(|s| parse_datetime(&s))
                .map(AttrValue::Date),
            ValueKind::Data => None,
        };
        if let Some(value) = value {
            attributes.insert(*key, value);
        }
    }

    Ok(SealedRow {
        attributes,
        sealed_secret: row.get(COLUMN_KEYS.len())?,
    })
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
