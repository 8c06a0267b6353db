use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::filter::{FilterGroupDef, JoinDefGroup};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceKind {
    Folder,
    Tag,
    Smart,
    Vault,
    #[default]
    Default,
}

impl SpaceKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Tag => "tag",
            Self::Smart => "smart",
            Self::Vault => "vault",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Rank,
    Name,
    Path,
    Ctime,
    Mtime,
    Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceSort {
    #[serde(default)]
    pub field: SortField,
    #[serde(default = "default_true")]
    pub asc: bool,
    /// Folders before files.
    #[serde(default = "default_true")]
    pub group: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for SpaceSort {
    fn default() -> Self {
        Self {
            field: SortField::Rank,
            asc: true,
            group: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceState {
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: SpaceKind,
    #[serde(default)]
    pub contexts: BTreeSet<String>,
    #[serde(default)]
    pub filters: Vec<FilterGroupDef>,
    #[serde(default)]
    pub joins: Vec<JoinDefGroup>,
    #[serde(default)]
    pub sort: SpaceSort,
    /// Explicitly pinned members, in rank order.
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl SpaceState {
    #[must_use]
    pub fn new(path: impl Into<String>, kind: SpaceKind) -> Self {
        Self {
            path: path.into(),
            kind,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_filters(mut self, filters: Vec<FilterGroupDef>) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn with_joins(mut self, joins: Vec<JoinDefGroup>) -> Self {
        self.joins = joins;
        self
    }

    #[must_use]
    pub fn with_links(mut self, links: Vec<String>) -> Self {
        self.links = links;
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SpaceSort) -> Self {
        self.sort = sort;
        self
    }
}
