use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use spacefold_core::SpaceIndex;
use spacefold_core::models::{FileMetadata, PathState, SpaceKind, SpaceState};
use spacefold_core::uri::path_extension;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Feeds every entry below `root` to the index as a created path. Folders
/// also get a folder space unless one is already defined. Entry contents are
/// never read.
pub(super) fn scan_root(root: &Path, skip: &[PathBuf], index: &mut SpaceIndex) -> Result<usize> {
    let root = fs::canonicalize(root)
        .with_context(|| format!("failed to resolve root {}", root.display()))?;
    let skip = skip.iter().map(|path| normalize(path)).collect::<Vec<_>>();

    let mut indexed = 0;
    let walker = WalkDir::new(&root)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.context("failed to walk root")?;
        if skip.iter().any(|skipped| skipped == entry.path()) {
            debug!(path = %entry.path().display(), "skipping cache file");
            continue;
        }
        let Some(relative) = vault_path(&root, entry.path()) else {
            continue;
        };
        let metadata = entry
            .metadata()
            .with_context(|| format!("failed to stat {}", entry.path().display()))?;
        let hidden = relative.split('/').any(|segment| segment.starts_with('.'));

        if metadata.is_dir() {
            index.on_path_created(PathState::folder(&relative).hidden(hidden));
            if index.space_state(&relative).is_none() {
                index.add_space(SpaceState::new(&relative, SpaceKind::Folder))?;
            }
        } else {
            let file = file_metadata(&relative, &metadata);
            index.on_path_created(
                PathState::file(&relative)
                    .with_file_metadata(file)
                    .hidden(hidden),
            );
        }
        indexed += 1;
    }
    info!(root = %root.display(), indexed, "scanned root");
    Ok(indexed)
}

/// `/`-separated path of `path` relative to `root`.
fn vault_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    (!segments.is_empty()).then(|| segments.join("/"))
}

/// Canonical form of a path that may not exist yet.
fn normalize(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

fn file_metadata(relative: &str, metadata: &Metadata) -> FileMetadata {
    FileMetadata {
        ctime: metadata.created().ok().and_then(epoch_millis),
        mtime: metadata.modified().ok().and_then(epoch_millis),
        size: Some(metadata.len()),
        extension: path_extension(relative).map(str::to_string),
    }
}

fn epoch_millis(time: SystemTime) -> Option<i64> {
    let elapsed = time.duration_since(UNIX_EPOCH).ok()?;
    i64::try_from(elapsed.as_millis()).ok()
}
