mod cache;
mod filter;
mod path;
mod space;

pub use cache::{CacheKind, CacheRow};
pub use filter::{Combinator, FilterDef, FilterGroupDef, FilterValueType, JoinDefGroup};
pub use path::{FileMetadata, PathKind, PathLabel, PathMetadata, PathState};
pub use space::{SortField, SpaceKind, SpaceSort, SpaceState};
