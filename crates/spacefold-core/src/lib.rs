// Public fallible APIs in this crate share one concrete error contract (`SpaceError`).
// Repeating per-function `# Errors` boilerplate obscures behavior more than it clarifies.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod index;
pub mod index_map;
pub mod models;
pub mod uri;

pub use cache::{CachePersister, LiveDbPersister, RowMirrorPersister, open_persister};
pub use config::{AppConfig, CacheConfig, CacheVariant, IndexConfig};
pub use error::{ErrorPayload, Result, SpaceError};
pub use filter::{FilterEnv, path_by_def, path_by_joins};
pub use index::{IndexEvent, SpaceIndex, SubscriptionId};
pub use index_map::IndexMap;
pub use uri::{SpaceUri, is_space_uri, parse_uri};
