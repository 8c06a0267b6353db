use std::path::{Path, PathBuf};
use std::time::Duration;

use super::env::{read_env_u64, read_non_empty_env};

const ENV_CACHE_VARIANT: &str = "SPACEFOLD_CACHE_VARIANT";
const ENV_CACHE_DEBOUNCE_MS: &str = "SPACEFOLD_CACHE_DEBOUNCE_MS";

pub const LIVE_DB_DEBOUNCE: Duration = Duration::from_millis(1_000);
pub const ROW_MIRROR_DEBOUNCE: Duration = Duration::from_millis(2_000);

/// Storage strategy behind the cache persister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheVariant {
    /// Live in-memory SQLite handle exported to disk as a whole image.
    #[default]
    LiveDb,
    /// Plain row mirror rewritten to disk as one file.
    RowMirror,
}

impl CacheVariant {
    #[must_use]
    pub const fn default_debounce(self) -> Duration {
        match self {
            Self::LiveDb => LIVE_DB_DEBOUNCE,
            Self::RowMirror => ROW_MIRROR_DEBOUNCE,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LiveDb => "live",
            Self::RowMirror => "mirror",
        }
    }
}

#[must_use]
pub fn resolve_cache_variant(raw: Option<&str>) -> CacheVariant {
    match raw.map(|value| value.trim().to_ascii_lowercase()) {
        Some(value) if matches!(value.as_str(), "mirror" | "mobile" | "rows" | "row-mirror") => {
            CacheVariant::RowMirror
        }
        _ => CacheVariant::LiveDb,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub variant: CacheVariant,
    pub debounce: Duration,
    /// Cache file. `None` keeps everything in memory.
    pub path: Option<PathBuf>,
}

impl CacheConfig {
    #[must_use]
    pub fn new(variant: CacheVariant) -> Self {
        Self {
            variant,
            debounce: variant.default_debounce(),
            path: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    #[must_use]
    pub(super) fn from_env() -> Self {
        let variant = resolve_cache_variant(read_non_empty_env(ENV_CACHE_VARIANT).as_deref());
        let debounce = read_env_u64(ENV_CACHE_DEBOUNCE_MS)
            .map_or_else(|| variant.default_debounce(), Duration::from_millis);
        Self {
            variant,
            debounce,
            path: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(CacheVariant::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_aliases() {
        assert_eq!(resolve_cache_variant(None), CacheVariant::LiveDb);
        assert_eq!(resolve_cache_variant(Some("desktop")), CacheVariant::LiveDb);
        assert_eq!(resolve_cache_variant(Some(" Mobile ")), CacheVariant::RowMirror);
        assert_eq!(resolve_cache_variant(Some("mirror")), CacheVariant::RowMirror);
        assert_eq!(resolve_cache_variant(Some("bogus")), CacheVariant::LiveDb);
    }

    #[test]
    fn debounce_follows_variant() {
        assert_eq!(CacheConfig::default().debounce, LIVE_DB_DEBOUNCE);
        assert_eq!(
            CacheConfig::new(CacheVariant::RowMirror).debounce,
            ROW_MIRROR_DEBOUNCE
        );
        let tuned = CacheConfig::new(CacheVariant::RowMirror)
            .with_debounce(Duration::from_millis(5))
            .with_path("cache.db");
        assert_eq!(tuned.debounce, Duration::from_millis(5));
        assert_eq!(tuned.path.as_deref(), Some(Path::new("cache.db")));
    }
}
