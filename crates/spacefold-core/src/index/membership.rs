use crate::filter::{ContextTables, FilterEnv, path_by_def, path_by_joins};
use crate::models::{PathState, SpaceKind, SpaceState};
use crate::uri::{ROOT_PATH, parent_path, tag_from_space_path};

/// Whether `path` belongs to `space`.
///
/// Explicit links always count. Computed rules depend on the kind and skip
/// hidden paths unless `include_hidden` is set. A space never contains
/// itself.
pub(super) fn space_admits(
    space: &SpaceState,
    path: &PathState,
    contexts: &ContextTables,
    include_hidden: bool,
) -> bool {
    if path.path == space.path {
        return false;
    }
    if space.links.iter().any(|link| *link == path.path) {
        return true;
    }
    if path.hidden && !include_hidden {
        return false;
    }
    match space.kind {
        SpaceKind::Folder => parent_path(&path.path).as_deref() == Some(folder_base(&space.path)),
        SpaceKind::Vault => parent_path(&path.path).as_deref() == Some(ROOT_PATH),
        SpaceKind::Tag => space_tag(&space.path).is_some_and(|tag| has_tag(path, &tag)),
        SpaceKind::Smart => {
            let env = FilterEnv::new(&space.properties).with_contexts(contexts);
            (!space.filters.is_empty() && path_by_def(&space.filters, path, &env, true))
                || path_by_joins(&space.joins, path, &env, false)
        }
        SpaceKind::Default => false,
    }
}

fn folder_base(space_path: &str) -> &str {
    let trimmed = space_path.trim_end_matches('/');
    if trimmed.is_empty() { ROOT_PATH } else { trimmed }
}

/// Tag behind a tag space, accepting both `spaces://#tag` and a bare `#tag`.
fn space_tag(space_path: &str) -> Option<String> {
    if space_path.starts_with('#') {
        return Some(space_path.to_string());
    }
    tag_from_space_path(space_path)
}

/// Exact tag or one nested under it (`#a/b` belongs to `#a`), ignoring case.
fn has_tag(path: &PathState, tag: &str) -> bool {
    let tag = tag.to_lowercase();
    path.tags.iter().any(|candidate| {
        let candidate = candidate.to_lowercase();
        candidate == tag
            || candidate
                .strip_prefix(tag.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::models::{FilterDef, FilterGroupDef};

    use super::*;

    fn admits(space: &SpaceState, path: &PathState) -> bool {
        space_admits(space, path, &ContextTables::new(), false)
    }

    #[test]
    fn folder_and_vault_take_direct_children() {
        let folder = SpaceState::new("Projects", SpaceKind::Folder);
        let vault = SpaceState::new("/", SpaceKind::Vault);
        assert!(admits(&folder, &PathState::file("Projects/a.md")));
        assert!(!admits(&folder, &PathState::file("Projects/Archive/b.md")));
        assert!(!admits(&folder, &PathState::folder("Projects")));
        assert!(admits(&vault, &PathState::folder("Projects")));
        assert!(!admits(&vault, &PathState::file("Projects/a.md")));
    }

    #[test]
    fn tag_spaces_include_nested_tags() {
        let space = SpaceState::new("spaces://#project", SpaceKind::Tag);
        assert!(admits(&space, &PathState::file("a.md").with_tag("#project")));
        assert!(admits(&space, &PathState::file("b.md").with_tag("#Project/alpha")));
        assert!(!admits(&space, &PathState::file("c.md").with_tag("#projects")));
    }

    #[test]
    fn hidden_paths_need_opt_in_unless_linked() {
        let folder = SpaceState::new("Projects", SpaceKind::Folder);
        let hidden = PathState::file("Projects/.draft.md").hidden(true);
        assert!(!admits(&folder, &hidden));
        assert!(space_admits(&folder, &hidden, &ContextTables::new(), true));

        let linked = folder.clone().with_links(vec!["Projects/.draft.md".to_string()]);
        assert!(admits(&linked, &hidden));
    }

    #[test]
    fn smart_spaces_without_rules_hold_only_links() {
        let space = SpaceState::new("spaces://Everything", SpaceKind::Smart);
        assert!(!admits(&space, &PathState::file("a.md")));

        let open = space.with_filters(vec![FilterGroupDef::all(vec![FilterDef::new(
            "frontmatter",
            "status",
            "is",
            "open",
        )])]);
        assert!(admits(
            &open,
            &PathState::file("a.md").with_property("status", json!("open"))
        ));
        assert!(!admits(&open, &PathState::file("b.md")));
    }

    #[test]
    fn default_spaces_hold_only_links() {
        let space = SpaceState::new("spaces://Pinned", SpaceKind::Default)
            .with_links(vec!["a.md".to_string()]);
        assert!(admits(&space, &PathState::file("a.md")));
        assert!(!admits(&space, &PathState::file("b.md")));
    }
}
