use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use spacefold_core::models::{CacheKind, SpaceKind, SpaceState};
use spacefold_core::uri::ROOT_PATH;
use spacefold_core::{AppConfig, CachePersister, SpaceIndex, open_persister, parse_uri};

use crate::cli::{CacheCommand, Commands};

mod scan;
mod support;


use self::scan::scan_root;
pub(crate) use self::support::error_payload;
use self::support::print_json;

pub(crate) fn run_from_root(root: &Path, cache: Option<&Path>, command: Commands) -> Result<()> {
    let config = AppConfig::from_env();
    match command {
        Commands::Uri(args) => print_json(&parse_uri(&args.uri)),
        Commands::Scan(args) => {
            let (index, report) = build_index(root, cache, args.spaces.as_deref(), &config)?;
            print_json(&report)?;
            finish(index)
        }
        Commands::Members(args) => {
            let (index, _) = build_index(root, cache, args.spaces.as_deref(), &config)?;
            let members = index
                .sorted_members(&args.space)
                .with_context(|| format!("unknown space {}", args.space))?
                .into_iter()
                .map(|state| MemberView {
                    path: state.path.clone(),
                    kind: state.kind.as_str(),
                    hidden: state.hidden,
                })
                .collect::<Vec<_>>();
            print_json(&members)?;
            finish(index)
        }
        Commands::Cache(args) => {
            let Some(cache) = cache else {
                bail!("cache commands need --cache <FILE>");
            };
            let mut persister: Box<dyn CachePersister> =
                open_persister(&config.cache.clone().with_path(cache))
                    .with_context(|| format!("failed to open cache {}", cache.display()))?;
            match args.command {
                CacheCommand::List { kind } => {
                    let kind = parse_kind(&kind)?;
                    print_json(&persister.load_all(kind)?)
                }
                CacheCommand::Clean { kind } => {
                    let kind = parse_kind(&kind)?;
                    let swept = persister.clean_type(kind)?;
                    persister.flush()?;
                    print_json(&serde_json::json!({
                        "kind": kind.table(),
                        "version": persister.version(),
                        "swept": swept,
                    }))
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct MemberView {
    path: String,
    #[serde(rename = "type")]
    kind: &'static str,
    hidden: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScanReport {
    root: PathBuf,
    paths: usize,
    spaces: usize,
    epoch: String,
    swept: usize,
    members: BTreeMap<String, usize>,
}

fn parse_kind(raw: &str) -> Result<CacheKind> {
    raw.parse::<CacheKind>()
        .map_err(|err| anyhow::anyhow!("invalid cache kind '{raw}': {err}"))
}

/// Indexes `root` from scratch. With a cache the fresh snapshot replaces
/// whatever earlier runs left there.
fn build_index(
    root: &Path,
    cache: Option<&Path>,
    spaces_file: Option<&Path>,
    config: &AppConfig,
) -> Result<(SpaceIndex, ScanReport)> {
    let mut index = match cache {
        Some(path) => {
            let persister = open_persister(&config.cache.clone().with_path(path))
                .with_context(|| format!("failed to open cache {}", path.display()))?;
            SpaceIndex::with_cache(config.index, persister)
        }
        None => SpaceIndex::new(config.index),
    };

    index.add_space(SpaceState::new(ROOT_PATH, SpaceKind::Vault))?;
    if let Some(file) = spaces_file {
        for space in load_space_definitions(file)? {
            let id = space.path.clone();
            index
                .add_space(space)
                .with_context(|| format!("duplicate space {id} in {}", file.display()))?;
        }
    }

    let skip = cache.map(cache_artifacts).unwrap_or_default();
    scan_root(root, &skip, &mut index)
        .with_context(|| format!("failed to scan {}", root.display()))?;
    let swept = index.rebuild().context("failed to rebuild index")?;

    let members = index
        .spaces()
        .keys()
        .map(|space| (space.clone(), index.space_members(space).len()))
        .collect();
    let report = ScanReport {
        root: root.to_path_buf(),
        paths: index.paths().len(),
        spaces: index.spaces().len(),
        epoch: index.epoch().to_string(),
        swept,
        members,
    };
    Ok((index, report))
}

fn load_space_definitions(file: &Path) -> Result<Vec<SpaceState>> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed to read space definitions {}", file.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid space definitions in {}", file.display()))
}

/// Files the cache itself writes, which must not be indexed.
fn cache_artifacts(cache: &Path) -> Vec<PathBuf> {
    let mut tmp = cache.as_os_str().to_os_string();
    tmp.push(".tmp");
    vec![cache.to_path_buf(), PathBuf::from(tmp)]
}

fn finish(mut index: SpaceIndex) -> Result<()> {
    index.shutdown().context("failed to write cache")
}
