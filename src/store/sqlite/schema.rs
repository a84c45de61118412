//! Database Schema

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    let has_schema: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='metadata'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(false);

    if !has_schema {
        create_schema(conn)?;
    }

    Ok(())
}

fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Store configuration (schema version, key check value)
        CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- One row per keychain item; class-specific columns stay NULL
        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            class TEXT NOT NULL,
            account TEXT,
            label TEXT,
            comment TEXT,
            synchronizable INTEGER NOT NULL DEFAULT 0,
            service TEXT,
            server TEXT,
            port INTEGER,
            protocol TEXT,
            auth_type TEXT,
            security_domain TEXT,
            path TEXT,
            secret TEXT NOT NULL,
            created_at TEXT NOT NULL,
            modified_at TEXT NOT NULL
        );

        -- Natural key uniqueness per class
        CREATE UNIQUE INDEX IF NOT EXISTS idx_items_natural_key ON items(
            class,
            COALESCE(service, ''),
            COALESCE(account, ''),
            COALESCE(server, ''),
            COALESCE(port, -1),
            COALESCE(protocol, ''),
            COALESCE(auth_type, ''),
            COALESCE(security_domain, ''),
            COALESCE(path, '')
        );

        CREATE INDEX IF NOT EXISTS idx_items_class ON items(class);

        INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', '1');
        "#,
    )
}

/// Get current schema version
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT value FROM metadata WHERE key = 'schema_version'",
        [],
        |row| row.get::<_, String>(0),
    )
    .ok()
    .and_then(|v| v.parse().ok())
    .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"items".to_string()));
        assert!(tables.contains(&"metadata".to_string()));
    }

    #[test]
    fn test_schema_version() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn test_init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn test_natural_key_unique() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let insert = r#"INSERT INTO items (id, class, account, service, secret, created_at, modified_at)
                        VALUES (?1, 'genp', 'bob', 'svc', 'x', datetime('now'), datetime('now'))"#;
        conn.execute(insert, ["a"]).unwrap();
        let err = conn.execute(insert, ["b"]).unwrap_err();

        assert_eq!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::ConstraintViolation)
        );
    }
}
