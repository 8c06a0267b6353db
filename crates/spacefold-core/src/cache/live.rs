use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rusqlite::{Connection, DatabaseName};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{CacheKind, CacheRow};

use super::schedule::FlushSchedule;
use super::{
    CachePersister, INITIAL_VERSION, discard_stale_temp, prepare_parent, replace_file, schema,
    temp_sibling,
};

/// Keeps the whole cache in a live in-memory SQLite database and exports the
/// database image to disk after each quiet period.
pub struct LiveDbPersister {
    conn: Connection,
    path: Option<PathBuf>,
    version: String,
    schedule: FlushSchedule,
}

impl std::fmt::Debug for LiveDbPersister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveDbPersister")
            .field("path", &self.path)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl LiveDbPersister {
    /// Restores the image at `path` if there is one. An unreadable image or a
    /// foreign schema is logged and replaced by empty tables.
    pub fn open(path: Option<&Path>, debounce: Duration) -> Result<Self> {
        let (conn, version) = match path.filter(|path| path.exists()) {
            Some(path) => match restore_image(path) {
                Ok(restored) => restored,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "cache image unreadable, starting empty");
                    (fresh_connection()?, None)
                }
            },
            None => (fresh_connection()?, None),
        };
        let version = version.unwrap_or_else(|| INITIAL_VERSION.to_string());
        info!(
            path = ?path.map(Path::display),
            version = %version,
            "opened live cache"
        );
        Ok(Self {
            conn,
            path: path.map(Path::to_path_buf),
            version,
            schedule: FlushSchedule::new(debounce),
        })
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn touch(&mut self) {
        self.schedule.arm(Instant::now());
    }

    fn export_image(&self, path: &Path) -> Result<()> {
        prepare_parent(path)?;
        let tmp = temp_sibling(path);
        discard_stale_temp(&tmp)?;
        self.conn.backup(DatabaseName::Main, &tmp, None)?;
        replace_file(&tmp, path)
    }
}

fn fresh_connection() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    schema::create_tables(&conn)?;
    Ok(conn)
}

fn restore_image(path: &Path) -> Result<(Connection, Option<String>)> {
    let mut conn = Connection::open_in_memory()?;
    conn.restore(
        DatabaseName::Main,
        path,
        None::<fn(rusqlite::backup::Progress)>,
    )?;
    schema::ensure_schema(&conn)?;
    schema::create_tables(&conn)?;
    let version = schema::read_version(&conn)?;
    Ok((conn, version))
}

impl CachePersister for LiveDbPersister {
    fn store(&mut self, path: &str, cache: &str, kind: CacheKind) -> Result<()> {
        let row = CacheRow {
            path: path.to_string(),
            cache: cache.to_string(),
            version: self.version.clone(),
        };
        schema::upsert_row(&self.conn, kind, &row)?;
        self.touch();
        Ok(())
    }

    fn remove(&mut self, path: &str, kind: CacheKind) -> Result<bool> {
        let removed = schema::delete_row(&self.conn, kind, path)?;
        if removed {
            self.touch();
        }
        Ok(removed)
    }

    fn clean_type(&mut self, kind: CacheKind) -> Result<usize> {
        let swept = schema::delete_stale(&self.conn, kind, &self.version)?;
        if swept > 0 {
            debug!(kind = %kind, swept, version = %self.version, "swept stale cache rows");
            self.touch();
        }
        Ok(swept)
    }

    fn load_all(&self, kind: CacheKind) -> Result<Vec<CacheRow>> {
        schema::select_rows(&self.conn, kind)
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn set_version(&mut self, version: &str) -> Result<()> {
        schema::write_version(&self.conn, version)?;
        self.version = version.to_string();
        self.touch();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(path) = self.path.as_deref() {
            self.export_image(path)?;
            debug!(path = %path.display(), "flushed live cache image");
        }
        self.schedule.clear();
        Ok(())
    }

    fn tick(&mut self, now: Instant) -> Result<bool> {
        if !self.schedule.due(now) {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }

    fn drain_on_shutdown(&mut self) -> Result<()> {
        if self.schedule.is_armed() {
            self.flush()?;
        }
        Ok(())
    }

    fn has_pending_flush(&self) -> bool {
        self.schedule.is_armed()
    }
}

impl Drop for LiveDbPersister {
    fn drop(&mut self) {
        if let Err(err) = self.drain_on_shutdown() {
            warn!(error = %err, "failed to drain live cache on shutdown");
        }
    }
}
