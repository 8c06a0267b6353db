use std::time::{Duration, Instant};

use serde_json::json;
use spacefold_core::config::{CacheConfig, CacheVariant, IndexConfig};
use spacefold_core::models::{CacheKind, PathState, SpaceKind, SpaceState};
use spacefold_core::{CachePersister, SpaceIndex, open_persister};
use tempfile::tempdir;

fn open_index(config: &CacheConfig) -> SpaceIndex {
    let cache = open_persister(config).expect("open cache");
    SpaceIndex::with_cache(IndexConfig::default(), cache)
}

#[test]
fn index_state_survives_a_restart() {
    for variant in [CacheVariant::LiveDb, CacheVariant::RowMirror] {
        let dir = tempdir().expect("tempdir");
        let config = CacheConfig::new(variant).with_path(dir.path().join("spaces.db"));

        {
            let mut index = open_index(&config);
            index
                .add_space(SpaceState::new("Projects", SpaceKind::Folder))
                .expect("folder space");
            index
                .add_space(SpaceState::new("spaces://#todo", SpaceKind::Tag))
                .expect("tag space");
            index.on_path_created(PathState::folder("Projects"));
            index.on_path_created(
                PathState::file("Projects/plan.md")
                    .with_tag("#todo")
                    .with_property("due", json!("2024-05-01")),
            );
            index.on_path_created(PathState::file("Projects/old.md"));
            index.on_path_deleted("Projects/old.md").expect("delete");
            index.rebuild().expect("rebuild");
            index.shutdown().expect("shutdown");
        }

        let mut index = open_index(&config);
        let summary = index.load_from_cache().expect("load");
        assert_eq!(summary.paths, 2, "{variant:?}");
        assert_eq!(summary.spaces, 2);
        assert_eq!(summary.skipped, 0);

        let plan = index.path_state("Projects/plan.md").expect("plan restored");
        assert_eq!(plan.metadata.property.get("due"), Some(&json!("2024-05-01")));
        assert_eq!(
            plan.spaces.iter().cloned().collect::<Vec<_>>(),
            vec!["Projects".to_string(), "spaces://#todo".to_string()]
        );
        assert!(index.path_state("Projects/old.md").is_none());
        assert!(!index.has_pending_flush());
    }
}

#[test]
fn debounced_writes_reach_disk_on_tick() {
    let dir = tempdir().expect("tempdir");
    let file = dir.path().join("spaces.db");
    let config = CacheConfig::new(CacheVariant::RowMirror)
        .with_debounce(Duration::from_secs(30))
        .with_path(&file);

    let mut index = open_index(&config);
    index.on_path_created(PathState::file("a.md"));
    assert!(index.has_pending_flush());
    assert!(!index.tick(Instant::now()));
    assert!(!file.exists());

    assert!(index.tick(Instant::now() + Duration::from_secs(31)));
    assert!(file.exists());

    let reader: Box<dyn CachePersister> = open_persister(&config).expect("reader");
    let rows = reader.load_all(CacheKind::Paths).expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].path, "a.md");
}
