use std::cmp::Ordering;

use crate::models::{PathState, SortField, SpaceSort};
use crate::uri::path_name;

/// Orders members for display. `links` gives the rank order; unranked paths
/// follow ranked ones. Ties fall back to the path so the order is total.
pub(super) fn sort_members(members: &mut [&PathState], sort: SpaceSort, links: &[String]) {
    members.sort_by(|left, right| {
        let grouped = if sort.group {
            right.is_folder().cmp(&left.is_folder())
        } else {
            Ordering::Equal
        };
        let ordered = compare_field(left, right, sort.field, links);
        let ordered = if sort.asc { ordered } else { ordered.reverse() };
        grouped
            .then(ordered)
            .then_with(|| left.path.cmp(&right.path))
    });
}

fn compare_field(
    left: &PathState,
    right: &PathState,
    field: SortField,
    links: &[String],
) -> Ordering {
    match field {
        SortField::Rank => rank(left, links).cmp(&rank(right, links)),
        SortField::Name => path_name(&left.path)
            .to_lowercase()
            .cmp(&path_name(&right.path).to_lowercase()),
        SortField::Path => left.path.cmp(&right.path),
        SortField::Ctime | SortField::Mtime | SortField::Size => {
            file_value(left, field).cmp(&file_value(right, field))
        }
    }
}

fn rank(path: &PathState, links: &[String]) -> usize {
    links
        .iter()
        .position(|link| *link == path.path)
        .unwrap_or(usize::MAX)
}

/// Missing values sort as the smallest.
fn file_value(path: &PathState, field: SortField) -> Option<i64> {
    let file = path.metadata.file.as_ref()?;
    match field {
        SortField::Ctime => file.ctime,
        SortField::Mtime => file.mtime,
        SortField::Size => file.size.map(|size| i64::try_from(size).unwrap_or(i64::MAX)),
        SortField::Rank | SortField::Name | SortField::Path => None,
    }
}
