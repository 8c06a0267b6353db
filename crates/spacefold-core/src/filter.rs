//! Declarative membership predicates.
//!
//! Everything here is a pure function of its inputs: the index re-runs these
//! on every mutation, so evaluation never errors and never touches state.
//! Anything that cannot be resolved (unknown comparator, unknown field kind,
//! missing required value) matches nothing.

use std::collections::{BTreeMap, HashSet};

use crate::models::{FilterDef, FilterGroupDef, FilterValueType, JoinDefGroup, PathState};
use crate::uri::{ROOT_PATH, is_descendant, parent_path};

mod comparator;
mod context;
mod multi;
mod target;


pub use comparator::{Comparator, comparator, comparator_names};
pub use context::{ContextRow, ContextTables};
pub use multi::{parse_multi_string, serialize_multi_string};

use target::FilterTarget;

pub type Properties = BTreeMap<String, String>;

static NO_PROPERTIES: Properties = BTreeMap::new();

/// Inputs a predicate may read besides the path itself.
#[derive(Debug, Clone, Copy)]
pub struct FilterEnv<'a> {
    properties: &'a Properties,
    contexts: Option<&'a ContextTables>,
}

impl Default for FilterEnv<'_> {
    fn default() -> Self {
        Self {
            properties: &NO_PROPERTIES,
            contexts: None,
        }
    }
}

impl<'a> FilterEnv<'a> {
    #[must_use]
    pub fn new(properties: &'a Properties) -> Self {
        Self {
            properties,
            contexts: None,
        }
    }

    #[must_use]
    pub fn with_contexts(mut self, contexts: &'a ContextTables) -> Self {
        self.contexts = Some(contexts);
        self
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&'a str> {
        self.properties.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contexts(&self) -> Option<&'a ContextTables> {
        self.contexts
    }
}

#[must_use]
pub fn filter_matches(def: &FilterDef, path: &PathState, env: &FilterEnv<'_>) -> bool {
    let Some(comparator) = comparator(&def.func) else {
        return false;
    };
    let Some(target) = FilterTarget::resolve(def) else {
        return false;
    };
    let expected = match def.value_type {
        FilterValueType::Literal => def.value.as_str(),
        FilterValueType::Property => env.property(&def.value).unwrap_or_default(),
    };
    if comparator.needs_value && expected.trim().is_empty() {
        return false;
    }
    let Some(actual) = target.fetch(path, env) else {
        return false;
    };
    comparator.test(&actual, expected)
}

/// Narrows `paths` filter by filter; an empty stage ends the fold.
#[must_use]
pub fn filter_paths_for_all<'p>(
    paths: &[&'p PathState],
    filters: &[FilterDef],
    env: &FilterEnv<'_>,
) -> Vec<&'p PathState> {
    filters
        .iter()
        .fold(dedup_paths(paths), |candidates, def| {
            if candidates.is_empty() {
                return candidates;
            }
            candidates
                .into_iter()
                .filter(|path| filter_matches(def, path, env))
                .collect()
        })
}

/// Union of the per-filter matches. Each filter only sees paths no earlier
/// filter claimed, so every path appears once, attributed to its first match.
#[must_use]
pub fn filter_paths_for_any<'p>(
    paths: &[&'p PathState],
    filters: &[FilterDef],
    env: &FilterEnv<'_>,
) -> Vec<&'p PathState> {
    let mut matched = Vec::new();
    let mut remaining = dedup_paths(paths);
    for def in filters {
        if remaining.is_empty() {
            break;
        }
        let (hits, misses): (Vec<_>, Vec<_>) = remaining
            .into_iter()
            .partition(|path| filter_matches(def, path, env));
        matched.extend(hits);
        remaining = misses;
    }
    matched
}

fn dedup_paths<'p>(paths: &[&'p PathState]) -> Vec<&'p PathState> {
    let mut seen: HashSet<&'p str> = HashSet::with_capacity(paths.len());
    let mut unique = Vec::with_capacity(paths.len());
    for &path in paths {
        if seen.insert(path.path.as_str()) {
            unique.push(path);
        }
    }
    unique
}

#[must_use]
pub fn group_matches(group: &FilterGroupDef, path: &PathState, env: &FilterEnv<'_>) -> bool {
    if group.filters.is_empty() {
        return true;
    }
    if group.combinator.is_all() {
        group.filters.iter().all(|def| filter_matches(def, path, env))
    } else {
        group.filters.iter().any(|def| filter_matches(def, path, env))
    }
}

/// `all` combines groups with AND (zero groups pass), otherwise OR (zero
/// groups fail).
#[must_use]
pub fn path_by_def(
    groups: &[FilterGroupDef],
    path: &PathState,
    env: &FilterEnv<'_>,
    all: bool,
) -> bool {
    if all {
        groups.iter().all(|group| group_matches(group, path, env))
    } else {
        groups.iter().any(|group| group_matches(group, path, env))
    }
}

/// Batch form of [`path_by_def`] over many paths, preserving input order.
#[must_use]
pub fn paths_by_def<'p>(
    groups: &[FilterGroupDef],
    paths: &[&'p PathState],
    env: &FilterEnv<'_>,
    all: bool,
) -> Vec<&'p PathState> {
    let select = |group: &FilterGroupDef, candidates: &[&'p PathState]| {
        if group.filters.is_empty() {
            dedup_paths(candidates)
        } else if group.combinator.is_all() {
            filter_paths_for_all(candidates, &group.filters, env)
        } else {
            filter_paths_for_any(candidates, &group.filters, env)
        }
    };

    let mut hit: HashSet<&str> = HashSet::new();
    if all {
        let survivors = groups.iter().fold(dedup_paths(paths), |candidates, group| {
            if candidates.is_empty() {
                return candidates;
            }
            select(group, &candidates)
        });
        hit.extend(survivors.into_iter().map(|path| path.path.as_str()));
    } else {
        for group in groups {
            hit.extend(select(group, paths).into_iter().map(|path| path.path.as_str()));
        }
    }
    dedup_paths(paths)
        .into_iter()
        .filter(|path| hit.contains(path.path.as_str()))
        .collect()
}

/// True when `candidate` lies under the join's base path.
///
/// Non-recursive joins accept direct children only. The base path itself
/// counts only when `inclusive` is set.
#[must_use]
pub fn join_contains(join: &JoinDefGroup, candidate: &str, inclusive: bool) -> bool {
    let base = normalize_base(&join.path);
    if candidate == base {
        return inclusive;
    }
    if join.recursive {
        is_descendant(candidate, base)
    } else {
        parent_path(candidate).as_deref() == Some(base)
    }
}

fn normalize_base(raw: &str) -> &str {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() { ROOT_PATH } else { trimmed }
}

/// Any join whose containment holds and whose groups pass admits the path.
#[must_use]
pub fn path_by_joins(
    joins: &[JoinDefGroup],
    path: &PathState,
    env: &FilterEnv<'_>,
    inclusive: bool,
) -> bool {
    joins.iter().any(|join| {
        join_contains(join, &path.path, inclusive)
            && path_by_def(&join.groups, path, env, join.combinator.is_all())
    })
}
