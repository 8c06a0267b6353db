use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{CacheKind, CacheRow};

use super::schedule::FlushSchedule;
use super::{
    CachePersister, INITIAL_VERSION, discard_stale_temp, prepare_parent, replace_file, schema,
    temp_sibling,
};

type Rows = BTreeMap<CacheKind, BTreeMap<String, CacheRow>>;

/// Plain in-memory copy of every row. A flush rewrites the whole file, so
/// writes are batched over a longer window than the live variant.
#[derive(Debug)]
pub struct RowMirrorPersister {
    rows: Rows,
    path: Option<PathBuf>,
    version: String,
    schedule: FlushSchedule,
}

impl RowMirrorPersister {
    /// Loads the file at `path` if there is one. Unreadable files are logged
    /// and treated as empty; they are overwritten by the next flush.
    pub fn open(path: Option<&Path>, debounce: Duration) -> Result<Self> {
        let (rows, version) = match path.filter(|path| path.exists()) {
            Some(path) => read_snapshot(path).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "cache file unreadable, starting empty");
                (Rows::new(), None)
            }),
            None => (Rows::new(), None),
        };
        let version = version.unwrap_or_else(|| INITIAL_VERSION.to_string());
        info!(
            path = ?path.map(Path::display),
            version = %version,
            rows = rows.values().map(BTreeMap::len).sum::<usize>(),
            "opened row mirror cache"
        );
        Ok(Self {
            rows,
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

    fn write_snapshot(&self, path: &Path) -> Result<()> {
        prepare_parent(path)?;
        let tmp = temp_sibling(path);
        discard_stale_temp(&tmp)?;
        {
            let mut conn = Connection::open(&tmp)?;
            schema::create_tables(&conn)?;
            let tx = conn.transaction()?;
            schema::write_version(&tx, &self.version)?;
            for (kind, rows) in &self.rows {
                for row in rows.values() {
                    schema::upsert_row(&tx, *kind, row)?;
                }
            }
            tx.commit()?;
        }
        replace_file(&tmp, path)
    }
}

fn read_snapshot(path: &Path) -> Result<(Rows, Option<String>)> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    schema::ensure_schema(&conn)?;
    let mut rows = Rows::new();
    for kind in CacheKind::ALL {
        let table = schema::select_rows(&conn, kind)?
            .into_iter()
            .map(|row| (row.path.clone(), row))
            .collect::<BTreeMap<_, _>>();
        if !table.is_empty() {
            rows.insert(kind, table);
        }
    }
    Ok((rows, schema::read_version(&conn)?))
}

impl CachePersister for RowMirrorPersister {
    fn store(&mut self, path: &str, cache: &str, kind: CacheKind) -> Result<()> {
        let row = CacheRow {
            path: path.to_string(),
            cache: cache.to_string(),
            version: self.version.clone(),
        };
        self.rows
            .entry(kind)
            .or_default()
            .insert(path.to_string(), row);
        self.touch();
        Ok(())
    }

    fn remove(&mut self, path: &str, kind: CacheKind) -> Result<bool> {
        let removed = self
            .rows
            .get_mut(&kind)
            .is_some_and(|rows| rows.remove(path).is_some());
        if removed {
            self.touch();
        }
        Ok(removed)
    }

    fn clean_type(&mut self, kind: CacheKind) -> Result<usize> {
        let Some(rows) = self.rows.get_mut(&kind) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|_, row| row.version == self.version);
        let swept = before - rows.len();
        if swept > 0 {
            debug!(kind = %kind, swept, version = %self.version, "swept stale cache rows");
            self.touch();
        }
        Ok(swept)
    }

    fn load_all(&self, kind: CacheKind) -> Result<Vec<CacheRow>> {
        Ok(self
            .rows
            .get(&kind)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn set_version(&mut self, version: &str) -> Result<()> {
        self.version = version.to_string();
        self.touch();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(path) = self.path.as_deref() {
            self.write_snapshot(path)?;
            debug!(path = %path.display(), "rewrote row mirror cache file");
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

impl Drop for RowMirrorPersister {
    fn drop(&mut self) {
        if let Err(err) = self.drain_on_shutdown() {
            warn!(error = %err, "failed to drain row mirror cache on shutdown");
        }
    }
}
