use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    #[default]
    File,
    Folder,
    Space,
    Tag,
}

impl PathKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
            Self::Space => "space",
            Self::Tag => "tag",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathLabel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Raw structural attributes reported by the filesystem adapter.
/// Times are epoch milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctime: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathMetadata {
    #[serde(default)]
    pub property: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub inlinks: Vec<String>,
    #[serde(default)]
    pub outlinks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileMetadata>,
}

/// Cached snapshot of one addressable path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathState {
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: PathKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub spaces: BTreeSet<String>,
    #[serde(default)]
    pub metadata: PathMetadata,
    #[serde(default)]
    pub label: PathLabel,
    #[serde(default)]
    pub hidden: bool,
}

impl PathState {
    #[must_use]
    pub fn new(path: impl Into<String>, kind: PathKind) -> Self {
        Self {
            path: path.into(),
            kind,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn file(path: impl Into<String>) -> Self {
        Self::new(path, PathKind::File)
    }

    #[must_use]
    pub fn folder(path: impl Into<String>) -> Self {
        Self::new(path, PathKind::Folder)
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.property.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_outlink(mut self, target: impl Into<String>) -> Self {
        self.metadata.outlinks.push(target.into());
        self
    }

    #[must_use]
    pub fn with_file_metadata(mut self, file: FileMetadata) -> Self {
        self.metadata.file = Some(file);
        self
    }

    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    #[must_use]
    pub const fn is_folder(&self) -> bool {
        matches!(self.kind, PathKind::Folder)
    }
}
