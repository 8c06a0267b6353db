mod cache;
mod env;
mod index;

pub use cache::{
    CacheConfig, CacheVariant, LIVE_DB_DEBOUNCE, ROW_MIRROR_DEBOUNCE, resolve_cache_variant,
};
pub use index::IndexConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub cache: CacheConfig,
    pub index: IndexConfig,
}

impl AppConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            cache: CacheConfig::from_env(),
            index: IndexConfig::from_env(),
        }
    }
}
