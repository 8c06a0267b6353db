use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{Result, SpaceError};
use crate::models::{CacheKind, CacheRow};

const REQUIRED_COLUMNS: [&str; 3] = ["path", "cache", "version"];
const META_COLUMNS: [&str; 2] = ["key", "value"];
const META_TABLE: &str = "cache_meta";
const VERSION_KEY: &str = "version";

pub(super) fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {META_TABLE} (key TEXT PRIMARY KEY, value TEXT NOT NULL);"
    ))?;
    for kind in CacheKind::ALL {
        conn.execute_batch(&format!(
            r"
            CREATE TABLE IF NOT EXISTS {table} (
                path TEXT PRIMARY KEY,
                cache TEXT NOT NULL,
                version TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{table}_version ON {table}(version);
            ",
            table = kind.table()
        ))?;
    }
    Ok(())
}

/// Fails unless every row table exists with the row columns keyed by
/// `path`, and any version table present is keyed by `key`.
pub(super) fn ensure_schema(conn: &Connection) -> Result<()> {
    for kind in CacheKind::ALL {
        let table = kind.table();
        if !has_table(conn, table)? {
            return Err(SpaceError::Validation(format!(
                "cache table {table} is missing"
            )));
        }
        require_columns(conn, table, &REQUIRED_COLUMNS)?;
        require_unique_key(conn, table, "path")?;
    }
    if has_table(conn, META_TABLE)? {
        require_columns(conn, META_TABLE, &META_COLUMNS)?;
        require_unique_key(conn, META_TABLE, "key")?;
    }
    Ok(())
}

fn require_columns(conn: &Connection, table: &str, columns: &[&str]) -> Result<()> {
    for column in columns {
        if !has_column(conn, table, column)? {
            return Err(SpaceError::Validation(format!(
                "cache table {table} is missing column {column}"
            )));
        }
    }
    Ok(())
}

/// Upserts rely on `ON CONFLICT(column)`, which needs `column` alone to be
/// the primary key or covered by a unique index.
fn require_unique_key(conn: &Connection, table: &str, column: &str) -> Result<()> {
    if is_sole_primary_key(conn, table, column)? || has_unique_index(conn, table, column)? {
        return Ok(());
    }
    Err(SpaceError::Validation(format!(
        "cache table {table} is not keyed by {column}"
    )))
}

pub(super) fn read_version(conn: &Connection) -> Result<Option<String>> {
    if !has_table(conn, META_TABLE)? {
        return Ok(None);
    }
    let version = conn
        .query_row(
            &format!("SELECT value FROM {META_TABLE} WHERE key = ?1"),
            params![VERSION_KEY],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(version)
}

pub(super) fn write_version(conn: &Connection, version: &str) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {META_TABLE}(key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value"
        ),
        params![VERSION_KEY, version],
    )?;
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for row in rows {
        if row? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn is_sole_primary_key(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i64>(5)?)))?;
    let mut key_columns = Vec::new();
    for row in rows {
        let (name, pk) = row?;
        if pk > 0 {
            key_columns.push(name);
        }
    }
    Ok(key_columns.len() == 1 && key_columns[0] == column)
}

fn has_unique_index(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA index_list({table})"))?;
    let indexes = stmt
        .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i64>(2)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for (index, unique) in indexes {
        if unique == 0 {
            continue;
        }
        let mut info = conn.prepare(&format!("PRAGMA index_info({index})"))?;
        let columns = info
            .query_map([], |row| row.get::<_, Option<String>>(2))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if columns.len() == 1 && columns[0].as_deref() == Some(column) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn has_table(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1",
            params![table],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    Ok(exists)
}

pub(super) fn upsert_row(conn: &Connection, kind: CacheKind, row: &CacheRow) -> Result<()> {
    conn.execute(
        &format!(
            r"
            INSERT INTO {table}(path, cache, version)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(path) DO UPDATE SET
              cache = excluded.cache,
              version = excluded.version
            ",
            table = kind.table()
        ),
        params![row.path, row.cache, row.version],
    )?;
    Ok(())
}

pub(super) fn delete_row(conn: &Connection, kind: CacheKind, path: &str) -> Result<bool> {
    let affected = conn.execute(
        &format!("DELETE FROM {} WHERE path = ?1", kind.table()),
        params![path],
    )?;
    Ok(affected > 0)
}

pub(super) fn delete_stale(conn: &Connection, kind: CacheKind, version: &str) -> Result<usize> {
    let affected = conn.execute(
        &format!("DELETE FROM {} WHERE version <> ?1", kind.table()),
        params![version],
    )?;
    Ok(affected)
}

pub(super) fn select_rows(conn: &Connection, kind: CacheKind) -> Result<Vec<CacheRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT path, cache, version FROM {} ORDER BY path ASC",
        kind.table()
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(CacheRow {
            path: row.get(0)?,
            cache: row.get(1)?,
            version: row.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
