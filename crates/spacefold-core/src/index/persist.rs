use std::collections::BTreeMap;
use std::time::Instant;

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{info, warn};

use crate::cache::CachePersister;
use crate::error::{Result, SpaceError};
use crate::filter::ContextRow;
use crate::index_map::IndexMap;
use crate::models::{CacheKind, CacheRow, PathState, SpaceState};

use super::{IndexEvent, SpaceIndex};

/// What [`SpaceIndex::load_from_cache`] brought back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub paths: usize,
    pub spaces: usize,
    pub contexts: usize,
    /// Rows that no longer deserialize.
    pub skipped: usize,
}

impl SpaceIndex {
    /// Recomputes every membership from scratch, then re-stores the whole
    /// snapshot under a new epoch and sweeps rows left from older epochs.
    /// Returns the number of rows swept.
    pub fn rebuild(&mut self) -> Result<usize> {
        self.recompute_all();
        self.epoch = next_epoch(&self.epoch);

        let mut swept = 0;
        if let Some(cache) = self.cache.as_deref_mut() {
            cache.set_version(&self.epoch)?;
            for (path, state) in &self.paths {
                cache.store(path, &serde_json::to_string(state)?, CacheKind::Paths)?;
            }
            for (space, state) in &self.spaces {
                cache.store(space, &serde_json::to_string(state)?, CacheKind::Spaces)?;
            }
            for context in self.contexts.contexts() {
                if let Some(rows) = self.contexts.table(context) {
                    cache.store(context, &serde_json::to_string(rows)?, CacheKind::Contexts)?;
                }
            }
            for kind in CacheKind::ALL {
                swept += cache.clean_type(kind)?;
            }
        }
        info!(
            epoch = %self.epoch,
            paths = self.paths.len(),
            spaces = self.spaces.len(),
            swept,
            "rebuilt space index"
        );
        self.announce_all_spaces();
        Ok(swept)
    }

    /// Replaces the in-memory state with what the cache holds. Memberships
    /// are recomputed rather than trusted; paths whose cached space set was
    /// out of date are written back.
    pub fn load_from_cache(&mut self) -> Result<LoadSummary> {
        let Some(cache) = self.cache.as_deref() else {
            return Ok(LoadSummary::default());
        };
        let path_rows = cache.load_all(CacheKind::Paths)?;
        let space_rows = cache.load_all(CacheKind::Spaces)?;
        let context_rows = cache.load_all(CacheKind::Contexts)?;
        let version = cache.version().to_string();

        let mut summary = LoadSummary::default();
        self.paths.clear();
        self.spaces.clear();
        self.spaces_map = IndexMap::new();
        self.contexts = crate::filter::ContextTables::new();

        for (key, mut state) in decode_rows::<SpaceState>(space_rows, &mut summary.skipped) {
            state.path.clone_from(&key);
            self.spaces.insert(key, state);
            summary.spaces += 1;
        }
        for (key, mut state) in decode_rows::<PathState>(path_rows, &mut summary.skipped) {
            state.path.clone_from(&key);
            self.paths.insert(key, state);
            summary.paths += 1;
        }
        for (key, rows) in
            decode_rows::<BTreeMap<String, ContextRow>>(context_rows, &mut summary.skipped)
        {
            self.contexts.set_table(&key, rows);
            summary.contexts += 1;
        }
        self.epoch = version;

        for path in self.recompute_all() {
            self.persist_path(&path);
        }
        info!(
            epoch = %self.epoch,
            paths = summary.paths,
            spaces = summary.spaces,
            contexts = summary.contexts,
            skipped = summary.skipped,
            "loaded space index from cache"
        );
        self.announce_all_spaces();
        Ok(summary)
    }

    /// Gives the cache a chance to run a due flush. Failures are logged.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(cache) = self.cache.as_deref_mut() else {
            return false;
        };
        cache.tick(now).unwrap_or_else(|err| {
            warn!(error = %err, "scheduled cache flush failed");
            false
        })
    }

    pub fn flush(&mut self) -> Result<()> {
        match self.cache.as_deref_mut() {
            Some(cache) => cache.flush(),
            None => Ok(()),
        }
    }

    /// Writes out anything still pending before the index goes away.
    pub fn shutdown(&mut self) -> Result<()> {
        match self.cache.as_deref_mut() {
            Some(cache) => cache.drain_on_shutdown(),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn has_pending_flush(&self) -> bool {
        self.cache
            .as_deref()
            .is_some_and(|cache| cache.has_pending_flush())
    }

    /// Rebuilds the path -> space relation for every space. Returns the paths
    /// whose space set differs from what their state held before.
    fn recompute_all(&mut self) -> Vec<String> {
        let mut relation = IndexMap::new();
        for space in self.spaces.keys() {
            relation.set_inverse(space, self.compute_members(space));
        }
        self.spaces_map = relation;

        let mut changed = Vec::new();
        for (path, state) in &mut self.paths {
            let spaces = self.spaces_map.get(path);
            if state.spaces != spaces {
                state.spaces = spaces;
                changed.push(path.clone());
            }
        }
        changed
    }

    fn announce_all_spaces(&self) {
        for space in self.spaces.keys() {
            self.publish(IndexEvent::SpaceChanged {
                space: space.clone(),
            });
        }
    }

    pub(super) fn persist_path(&mut self, path: &str) {
        if let Some(state) = self.paths.get(path) {
            store_row(&mut self.cache, CacheKind::Paths, path, state);
        }
    }

    pub(super) fn persist_space(&mut self, space: &str) {
        if let Some(state) = self.spaces.get(space) {
            store_row(&mut self.cache, CacheKind::Spaces, space, state);
        }
    }

    /// Stores the table of `context`, or drops its row once the table is empty.
    pub(super) fn persist_context(&mut self, context: &str) {
        match self.contexts.table(context) {
            Some(rows) => store_row(&mut self.cache, CacheKind::Contexts, context, rows),
            None => self.forget(CacheKind::Contexts, context),
        }
    }

    pub(super) fn forget(&mut self, kind: CacheKind, key: &str) {
        let Some(cache) = self.cache.as_deref_mut() else {
            return;
        };
        if let Err(err) = cache.remove(key, kind) {
            warn!(kind = %kind, key, error = %err, "cache remove failed");
        }
    }
}

fn store_row<T: Serialize>(
    cache: &mut Option<Box<dyn CachePersister>>,
    kind: CacheKind,
    key: &str,
    value: &T,
) {
    let Some(cache) = cache.as_deref_mut() else {
        return;
    };
    let stored = serde_json::to_string(value)
        .map_err(SpaceError::from)
        .and_then(|json| cache.store(key, &json, kind));
    if let Err(err) = stored {
        warn!(kind = %kind, key, error = %err, "cache store failed");
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<CacheRow>, skipped: &mut usize) -> Vec<(String, T)> {
    let mut decoded = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_str::<T>(&row.cache) {
            Ok(value) => decoded.push((row.path, value)),
            Err(err) => {
                warn!(key = %row.path, error = %err, "skipping undecodable cache row");
                *skipped += 1;
            }
        }
    }
    decoded
}

/// Epoch tokens are millisecond timestamps, forced to increase even when the
/// clock does not.
fn next_epoch(current: &str) -> String {
    let now = Utc::now().timestamp_millis();
    let floor = current.parse::<i64>().map_or(0, |previous| previous.saturating_add(1));
    now.max(floor).to_string()
}
