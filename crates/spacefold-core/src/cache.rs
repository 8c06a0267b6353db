//! Write-behind persistence for index snapshots.
//!
//! Rows are kept per [`CacheKind`] and tagged with the index epoch they were
//! written under. Reads always come from memory; disk only matters after a
//! restart, so writes are coalesced behind a [`FlushSchedule`] and pushed out
//! by [`CachePersister::tick`], an explicit [`CachePersister::flush`], or on
//! drop.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{CacheConfig, CacheVariant};
use crate::error::Result;
use crate::models::{CacheKind, CacheRow};

mod live;
mod mirror;
mod schedule;
mod schema;


pub use live::LiveDbPersister;
pub use mirror::RowMirrorPersister;
pub use schedule::FlushSchedule;

/// Version of a store that has never been stamped.
pub const INITIAL_VERSION: &str = "0";

pub trait CachePersister: Send {
    /// Upserts a row stamped with the current version.
    fn store(&mut self, path: &str, cache: &str, kind: CacheKind) -> Result<()>;

    /// Returns whether a row was present.
    fn remove(&mut self, path: &str, kind: CacheKind) -> Result<bool>;

    /// Deletes every row of `kind` whose version differs from the current
    /// one. Returns the number of rows swept.
    fn clean_type(&mut self, kind: CacheKind) -> Result<usize>;

    /// Rows of `kind` ordered by path, including unflushed writes.
    fn load_all(&self, kind: CacheKind) -> Result<Vec<CacheRow>>;

    fn version(&self) -> &str;

    fn set_version(&mut self, version: &str) -> Result<()>;

    /// Writes pending changes to disk now and disarms the schedule.
    fn flush(&mut self) -> Result<()>;

    /// Flushes when the debounce deadline has passed. Returns whether it did.
    fn tick(&mut self, now: Instant) -> Result<bool>;

    fn drain_on_shutdown(&mut self) -> Result<()>;

    fn has_pending_flush(&self) -> bool;
}

/// Opens the variant selected by `config`, backed by `config.path` when set.
pub fn open_persister(config: &CacheConfig) -> Result<Box<dyn CachePersister>> {
    let path = config.path.as_deref();
    Ok(match config.variant {
        CacheVariant::LiveDb => Box::new(LiveDbPersister::open(path, config.debounce)?),
        CacheVariant::RowMirror => Box::new(RowMirrorPersister::open(path, config.debounce)?),
    })
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

fn prepare_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Moves a fully written temp file over `path`.
fn replace_file(tmp: &Path, path: &Path) -> Result<()> {
    fs::rename(tmp, path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

fn discard_stale_temp(tmp: &Path) -> Result<()> {
    match fs::remove_file(tmp) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
