//! Bidirectional index of paths and the spaces that contain them.
//!
//! The index is the single writer for membership. Every mutation updates
//! `paths`, `spaces` and the path -> space relation together, then publishes
//! events and queues cache writes. Queries read the in-memory state directly,
//! so a query issued after a mutation always observes it.

use std::collections::{BTreeMap, BTreeSet};

use crate::cache::CachePersister;
use crate::config::IndexConfig;
use crate::error::{Result, SpaceError};
use crate::filter::{ContextRow, ContextTables};
use crate::index_map::IndexMap;
use crate::models::{CacheKind, PathState, SpaceKind, SpaceState};
use crate::uri::{ROOT_PATH, is_descendant};

mod events;
mod membership;
mod persist;
mod sort;


pub use events::{IndexEvent, Subscriber, SubscriptionId};
pub use persist::LoadSummary;

use events::EventBus;
use membership::space_admits;

pub struct SpaceIndex {
    config: IndexConfig,
    paths: BTreeMap<String, PathState>,
    spaces: BTreeMap<String, SpaceState>,
    /// path -> ids of the spaces containing it.
    spaces_map: IndexMap,
    contexts: ContextTables,
    events: EventBus,
    cache: Option<Box<dyn CachePersister>>,
    epoch: String,
}

impl std::fmt::Debug for SpaceIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpaceIndex")
            .field("paths", &self.paths.len())
            .field("spaces", &self.spaces.len())
            .field("epoch", &self.epoch)
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for SpaceIndex {
    fn default() -> Self {
        Self::new(IndexConfig::default())
    }
}

impl SpaceIndex {
    #[must_use]
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            paths: BTreeMap::new(),
            spaces: BTreeMap::new(),
            spaces_map: IndexMap::new(),
            contexts: ContextTables::new(),
            events: EventBus::default(),
            cache: None,
            epoch: crate::cache::INITIAL_VERSION.to_string(),
        }
    }

    /// Index that writes behind to `cache`. Call [`SpaceIndex::load_from_cache`]
    /// to pick up what a previous run persisted.
    #[must_use]
    pub fn with_cache(config: IndexConfig, cache: Box<dyn CachePersister>) -> Self {
        let epoch = cache.version().to_string();
        Self {
            cache: Some(cache),
            epoch,
            ..Self::new(config)
        }
    }

    #[must_use]
    pub fn paths(&self) -> &BTreeMap<String, PathState> {
        &self.paths
    }

    #[must_use]
    pub fn spaces(&self) -> &BTreeMap<String, SpaceState> {
        &self.spaces
    }

    #[must_use]
    pub fn spaces_map(&self) -> &IndexMap {
        &self.spaces_map
    }

    #[must_use]
    pub fn contexts(&self) -> &ContextTables {
        &self.contexts
    }

    #[must_use]
    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    #[must_use]
    pub fn path_state(&self, path: &str) -> Option<&PathState> {
        self.paths.get(path)
    }

    #[must_use]
    pub fn space_state(&self, space: &str) -> Option<&SpaceState> {
        self.spaces.get(space)
    }

    #[must_use]
    pub fn spaces_for_path(&self, path: &str) -> BTreeSet<String> {
        self.spaces_map.get(path)
    }

    /// Members of `space` in path order.
    #[must_use]
    pub fn space_members(&self, space: &str) -> Vec<&PathState> {
        self.spaces_map
            .get_inverse(space)
            .into_iter()
            .flatten()
            .filter_map(|path| self.paths.get(path))
            .collect()
    }

    /// Members of `space` ordered by the space's own sort settings.
    pub fn sorted_members(&self, space: &str) -> Result<Vec<&PathState>> {
        let state = self
            .spaces
            .get(space)
            .ok_or_else(|| SpaceError::NotFound(space.to_string()))?;
        let mut members = self.space_members(space);
        sort::sort_members(&mut members, state.sort, &state.links);
        Ok(members)
    }

    /// Registers `subscriber` for events published from now on.
    pub fn subscribe(
        &mut self,
        subscriber: impl Fn(&IndexEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(Box::new(subscriber))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Records a discovered path, replacing any previous state for it.
    pub fn on_path_created(&mut self, state: PathState) {
        self.upsert_path(state);
    }

    pub fn on_path_changed(&mut self, state: PathState) -> Result<()> {
        if !self.paths.contains_key(&state.path) {
            return Err(SpaceError::NotFound(state.path));
        }
        self.upsert_path(state);
        Ok(())
    }

    /// Drops `path` and everything below it, along with links, context rows
    /// and folder spaces rooted there.
    pub fn on_path_deleted(&mut self, path: &str) -> Result<()> {
        reject_root(path)?;
        if !self.paths.contains_key(path) {
            return Err(SpaceError::NotFound(path.to_string()));
        }
        let doomed = self.subtree(path);
        let mut touched_spaces = BTreeSet::new();
        let mut touched_contexts = BTreeSet::new();
        for gone in &doomed {
            self.paths.remove(gone);
            touched_spaces.extend(self.spaces_map.get(gone));
            self.spaces_map.delete(gone);
            touched_contexts.extend(self.contexts.remove_path(gone));
            self.forget(CacheKind::Paths, gone);
        }

        let relinked = self
            .spaces
            .values_mut()
            .filter_map(|space| {
                let before = space.links.len();
                space.links.retain(|link| !doomed.contains(link));
                (space.links.len() != before).then(|| space.path.clone())
            })
            .collect::<Vec<_>>();
        for space in relinked {
            self.persist_space(&space);
            self.publish(IndexEvent::SpaceStateUpdated { space });
        }

        let orphaned = self
            .spaces
            .values()
            .filter(|space| space.kind == SpaceKind::Folder && doomed.contains(&space.path))
            .map(|space| space.path.clone())
            .collect::<Vec<_>>();
        for space in orphaned {
            touched_spaces.remove(&space);
            self.remove_space(&space)?;
        }

        for context in touched_contexts {
            self.persist_context(&context);
        }
        for space in touched_spaces {
            self.publish(IndexEvent::SpaceChanged { space });
        }
        Ok(())
    }

    /// Moves `old` and everything below it to `new`. Folder spaces rooted in
    /// the moved subtree follow it.
    pub fn on_path_renamed(&mut self, old: &str, new: &str) -> Result<()> {
        reject_root(old)?;
        reject_root(new)?;
        if old == new {
            return Ok(());
        }
        if !self.paths.contains_key(old) {
            return Err(SpaceError::NotFound(old.to_string()));
        }
        let moves = self
            .subtree(old)
            .into_iter()
            .filter_map(|from| {
                let to = format!("{new}{}", from.strip_prefix(old)?);
                Some((from, to))
            })
            .collect::<BTreeMap<_, _>>();
        for (from, to) in &moves {
            let folder_space = self
                .spaces
                .get(from)
                .is_some_and(|space| space.kind == SpaceKind::Folder);
            if self.paths.contains_key(to) || (folder_space && self.spaces.contains_key(to)) {
                return Err(SpaceError::Conflict(to.clone()));
            }
        }

        let mut touched_spaces = BTreeSet::new();
        let mut touched_contexts = BTreeSet::new();
        for (from, to) in &moves {
            let Some(mut state) = self.paths.remove(from) else {
                continue;
            };
            state.path.clone_from(to);
            self.paths.insert(to.clone(), state);
            touched_spaces.extend(self.spaces_map.get(from));
            self.spaces_map.rename(from, to);
            for context in self.contexts.rename_path(from, to) {
                touched_contexts.insert(context);
            }
            self.forget(CacheKind::Paths, from);
        }

        let relinked = self
            .spaces
            .values_mut()
            .filter_map(|space| {
                let mut changed = false;
                for link in &mut space.links {
                    if let Some(to) = moves.get(link.as_str()) {
                        link.clone_from(to);
                        changed = true;
                    }
                }
                changed.then(|| space.path.clone())
            })
            .collect::<Vec<_>>();
        for space in relinked {
            self.persist_space(&space);
            self.publish(IndexEvent::SpaceStateUpdated { space });
        }

        let folder_moves = moves
            .iter()
            .filter(|(from, _)| {
                self.spaces
                    .get(from.as_str())
                    .is_some_and(|space| space.kind == SpaceKind::Folder)
            })
            .map(|(from, to)| (from.clone(), to.clone()))
            .collect::<Vec<_>>();
        for (from, to) in folder_moves {
            touched_spaces.remove(&from);
            self.rename_space(&from, &to)?;
        }

        for context in touched_contexts {
            self.persist_context(&context);
        }
        for to in moves.values() {
            touched_spaces.extend(self.assign_path(to));
            touched_spaces.extend(self.spaces_map.get(to));
            self.persist_path(to);
            self.publish(IndexEvent::PathStateUpdated { path: to.clone() });
        }
        for space in touched_spaces {
            if self.spaces.contains_key(&space) {
                self.publish(IndexEvent::SpaceChanged { space });
            }
        }
        Ok(())
    }

    pub fn add_space(&mut self, state: SpaceState) -> Result<()> {
        if self.spaces.contains_key(&state.path) {
            return Err(SpaceError::Conflict(state.path));
        }
        self.put_space(state);
        Ok(())
    }

    /// Replaces the definition of an existing space and recomputes its members.
    pub fn update_space(&mut self, state: SpaceState) -> Result<()> {
        if !self.spaces.contains_key(&state.path) {
            return Err(SpaceError::NotFound(state.path));
        }
        self.put_space(state);
        Ok(())
    }

    pub fn remove_space(&mut self, space: &str) -> Result<SpaceState> {
        let removed = self
            .spaces
            .remove(space)
            .ok_or_else(|| SpaceError::NotFound(space.to_string()))?;
        let members = self
            .spaces_map
            .get_inverse(space)
            .cloned()
            .unwrap_or_default();
        self.spaces_map.delete_inverse(space);
        for path in members {
            self.sync_path_spaces(&path);
            self.persist_path(&path);
            self.publish(IndexEvent::PathStateUpdated { path });
        }
        if self.contexts.remove_context(space) {
            self.forget(CacheKind::Contexts, space);
        }
        self.forget(CacheKind::Spaces, space);
        self.publish(IndexEvent::SpaceDeleted {
            space: space.to_string(),
        });
        Ok(removed)
    }

    pub fn rename_space(&mut self, old: &str, new: &str) -> Result<()> {
        if old == new {
            return Ok(());
        }
        if self.spaces.contains_key(new) {
            return Err(SpaceError::Conflict(new.to_string()));
        }
        let mut state = self
            .spaces
            .remove(old)
            .ok_or_else(|| SpaceError::NotFound(old.to_string()))?;
        state.path = new.to_string();
        self.spaces.insert(new.to_string(), state);
        self.spaces_map.rename_inverse(old, new);
        if self.contexts.rename_context(old, new) {
            self.forget(CacheKind::Contexts, old);
            self.persist_context(new);
        }
        self.forget(CacheKind::Spaces, old);
        self.persist_space(new);
        self.publish(IndexEvent::SpaceDeleted {
            space: old.to_string(),
        });
        self.publish(IndexEvent::SpaceStateUpdated {
            space: new.to_string(),
        });

        let mut affected = self
            .spaces_map
            .get_inverse(new)
            .cloned()
            .unwrap_or_default();
        for path in &affected {
            self.sync_path_spaces(path);
        }
        affected.extend(self.recompute_space(new));
        for path in affected {
            self.persist_path(&path);
            self.publish(IndexEvent::PathStateUpdated { path });
        }
        self.publish(IndexEvent::SpaceChanged {
            space: new.to_string(),
        });
        Ok(())
    }

    /// Writes the context row of `path`; smart spaces are re-evaluated since
    /// their filters may read it.
    pub fn set_context_row(&mut self, context: &str, path: &str, row: ContextRow) {
        self.contexts.set_row(context, path, row);
        self.persist_context(context);
        self.refresh_smart_spaces();
    }

    pub fn remove_context_row(&mut self, context: &str, path: &str) -> bool {
        if !self.contexts.remove_row(context, path) {
            return false;
        }
        self.persist_context(context);
        self.refresh_smart_spaces();
        true
    }

    fn upsert_path(&mut self, mut state: PathState) {
        state.spaces.clear();
        let path = state.path.clone();
        self.paths.insert(path.clone(), state);
        let changed = self.assign_path(&path);
        self.persist_path(&path);
        self.publish(IndexEvent::PathStateUpdated { path });
        for space in changed {
            self.publish(IndexEvent::SpaceChanged { space });
        }
    }

    fn put_space(&mut self, state: SpaceState) {
        let space = state.path.clone();
        self.spaces.insert(space.clone(), state);
        self.persist_space(&space);
        self.publish(IndexEvent::SpaceStateUpdated {
            space: space.clone(),
        });
        self.refresh_space(&space);
    }

    fn refresh_space(&mut self, space: &str) {
        let changed = self.recompute_space(space);
        if changed.is_empty() {
            return;
        }
        for path in changed {
            self.persist_path(&path);
            self.publish(IndexEvent::PathStateUpdated { path });
        }
        self.publish(IndexEvent::SpaceChanged {
            space: space.to_string(),
        });
    }

    fn refresh_smart_spaces(&mut self) {
        let smart = self
            .spaces
            .values()
            .filter(|space| space.kind == SpaceKind::Smart)
            .map(|space| space.path.clone())
            .collect::<Vec<_>>();
        for space in smart {
            self.refresh_space(&space);
        }
    }

    /// Recomputes the spaces containing `path`. Returns the spaces whose
    /// member set changed.
    fn assign_path(&mut self, path: &str) -> BTreeSet<String> {
        let Some(state) = self.paths.get(path) else {
            return BTreeSet::new();
        };
        let admitted = self
            .spaces
            .values()
            .filter(|space| {
                space_admits(space, state, &self.contexts, self.config.include_hidden)
            })
            .map(|space| space.path.clone())
            .collect::<BTreeSet<_>>();
        let previous = self.spaces_map.get(path);
        let changed = previous
            .symmetric_difference(&admitted)
            .cloned()
            .collect::<BTreeSet<_>>();
        self.spaces_map.set(path, admitted);
        self.sync_path_spaces(path);
        changed
    }

    fn compute_members(&self, space: &str) -> BTreeSet<String> {
        let Some(state) = self.spaces.get(space) else {
            return BTreeSet::new();
        };
        self.paths
            .values()
            .filter(|path| space_admits(state, path, &self.contexts, self.config.include_hidden))
            .map(|path| path.path.clone())
            .collect()
    }

    /// Recomputes the members of `space`. Returns the paths that joined or left.
    fn recompute_space(&mut self, space: &str) -> BTreeSet<String> {
        let members = self.compute_members(space);
        let previous = self
            .spaces_map
            .get_inverse(space)
            .cloned()
            .unwrap_or_default();
        if previous == members {
            return BTreeSet::new();
        }
        let changed = previous
            .symmetric_difference(&members)
            .cloned()
            .collect::<BTreeSet<_>>();
        self.spaces_map.set_inverse(space, members);
        for path in &changed {
            self.sync_path_spaces(path);
        }
        changed
    }

    fn sync_path_spaces(&mut self, path: &str) {
        let spaces = self.spaces_map.get(path);
        if let Some(state) = self.paths.get_mut(path) {
            state.spaces = spaces;
        }
    }

    /// `root` and every indexed path below it.
    fn subtree(&self, root: &str) -> Vec<String> {
        self.paths
            .keys()
            .filter(|candidate| *candidate == root || is_descendant(candidate, root))
            .cloned()
            .collect()
    }

    fn publish(&self, event: IndexEvent) {
        self.events.publish(&event);
    }
}

/// The vault root anchors every other path and cannot be moved or dropped.
fn reject_root(path: &str) -> Result<()> {
    if path == ROOT_PATH {
        return Err(SpaceError::Validation(format!(
            "the vault root {ROOT_PATH} cannot be renamed or deleted"
        )));
    }
    Ok(())
}
