use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SpaceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    Paths,
    Spaces,
    Contexts,
}

impl CacheKind {
    pub const ALL: [Self; 3] = [Self::Paths, Self::Spaces, Self::Contexts];

    /// Table holding rows of this kind. Doubles as the wire name.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        match self {
            Self::Paths => "paths",
            Self::Spaces => "spaces",
            Self::Contexts => "contexts",
        }
    }
}

impl Display for CacheKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for CacheKind {
    type Err = SpaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paths" | "path" => Ok(Self::Paths),
            "spaces" | "space" => Ok(Self::Spaces),
            "contexts" | "context" => Ok(Self::Contexts),
            other => Err(SpaceError::Validation(format!("unknown cache kind: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRow {
    pub path: String,
    pub cache: String,
    pub version: String,
}
