use std::collections::{BTreeMap, BTreeSet};

/// Many-to-many relation kept consistent in both directions.
///
/// Every `value` in `map[key]` has `key` in `inv_map[value]` and vice versa.
/// All mutations update both sides before returning; there is no repair pass.
/// Single-writer only.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexMap {
    map: BTreeMap<String, BTreeSet<String>>,
    inv_map: BTreeMap<String, BTreeSet<String>>,
}

impl IndexMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Owned copy of the values for `key`, empty when absent.
    #[must_use]
    pub fn get(&self, key: &str) -> BTreeSet<String> {
        self.map.get(key).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn get_inverse(&self, value: &str) -> Option<&BTreeSet<String>> {
        self.inv_map.get(value)
    }

    #[must_use]
    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.map.get(key).is_some_and(|values| values.contains(value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.inv_map.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn set(&mut self, key: &str, values: BTreeSet<String>) {
        set_edges(&mut self.map, &mut self.inv_map, key, values);
    }

    /// Authoritatively replaces the keys pointing at `value`.
    pub fn set_inverse(&mut self, value: &str, keys: BTreeSet<String>) {
        set_edges(&mut self.inv_map, &mut self.map, value, keys);
    }

    pub fn delete(&mut self, key: &str) -> bool {
        delete_edges(&mut self.map, &mut self.inv_map, key)
    }

    pub fn delete_inverse(&mut self, value: &str) -> bool {
        delete_edges(&mut self.inv_map, &mut self.map, value)
    }

    /// Moves the edges of `old_key` onto `new_key`, replacing whatever
    /// `new_key` pointed at before.
    pub fn rename(&mut self, old_key: &str, new_key: &str) -> bool {
        rename_edges(&mut self.map, &mut self.inv_map, old_key, new_key)
    }

    pub fn rename_inverse(&mut self, old_value: &str, new_value: &str) -> bool {
        rename_edges(&mut self.inv_map, &mut self.map, old_value, new_value)
    }

    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let forward = self.map.iter().all(|(key, values)| {
            !values.is_empty()
                && values
                    .iter()
                    .all(|value| self.inv_map.get(value).is_some_and(|keys| keys.contains(key)))
        });
        let backward = self.inv_map.iter().all(|(value, keys)| {
            !keys.is_empty()
                && keys
                    .iter()
                    .all(|key| self.map.get(key).is_some_and(|values| values.contains(value)))
        });
        forward && backward
    }
}

type Side = BTreeMap<String, BTreeSet<String>>;

fn set_edges(side: &mut Side, other: &mut Side, key: &str, values: BTreeSet<String>) {
    if values.is_empty() {
        delete_edges(side, other, key);
        return;
    }
    let previous = side.get(key).cloned().unwrap_or_default();
    for stale in previous.difference(&values) {
        unlink(other, stale, key);
    }
    for added in values.difference(&previous) {
        other
            .entry(added.clone())
            .or_default()
            .insert(key.to_string());
    }
    side.insert(key.to_string(), values);
}

fn delete_edges(side: &mut Side, other: &mut Side, key: &str) -> bool {
    let Some(values) = side.remove(key) else {
        return false;
    };
    for value in &values {
        unlink(other, value, key);
    }
    true
}

fn rename_edges(side: &mut Side, other: &mut Side, old_key: &str, new_key: &str) -> bool {
    if old_key == new_key {
        return side.contains_key(old_key);
    }
    let Some(values) = side.remove(old_key) else {
        return false;
    };
    for value in &values {
        unlink(other, value, old_key);
    }
    set_edges(side, other, new_key, values);
    true
}

fn unlink(side: &mut Side, key: &str, member: &str) {
    let mut drop_key = false;
    if let Some(members) = side.get_mut(key) {
        members.remove(member);
        drop_key = members.is_empty();
    }
    if drop_key {
        side.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|item| (*item).to_string()).collect()
    }

    #[test]
    fn set_links_both_directions() {
        let mut map = IndexMap::new();
        map.set("a.md", set_of(&["s1", "s2"]));
        map.set("b.md", set_of(&["s2"]));

        assert_eq!(map.get("a.md"), set_of(&["s1", "s2"]));
        assert_eq!(map.get_inverse("s2"), Some(&set_of(&["a.md", "b.md"])));
        assert_eq!(map.get_inverse("s1"), Some(&set_of(&["a.md"])));
        assert!(map.is_consistent());
    }

    #[test]
    fn get_returns_owned_copy() {
        let mut map = IndexMap::new();
        map.set("a.md", set_of(&["s1"]));
        let mut copy = map.get("a.md");
        copy.insert("s9".to_string());
        assert_eq!(map.get("a.md"), set_of(&["s1"]));
        assert!(map.get("missing").is_empty());
    }

    #[test]
    fn set_drops_stale_inverse_edges() {
        let mut map = IndexMap::new();
        map.set("a.md", set_of(&["s1", "s2"]));
        map.set("a.md", set_of(&["s2", "s3"]));

        assert_eq!(map.get_inverse("s1"), None);
        assert_eq!(map.get_inverse("s3"), Some(&set_of(&["a.md"])));
        assert!(map.is_consistent());
    }

    #[test]
    fn set_empty_is_delete() {
        let mut map = IndexMap::new();
        map.set("a.md", set_of(&["s1"]));
        map.set("a.md", BTreeSet::new());

        assert!(map.is_empty());
        assert_eq!(map.get_inverse("s1"), None);
        assert!(map.is_consistent());
    }

    #[test]
    fn set_inverse_primes_forward_side() {
        let mut map = IndexMap::new();
        map.set("a.md", set_of(&["s1"]));
        map.set("b.md", set_of(&["s1", "s2"]));
        map.set_inverse("s1", set_of(&["b.md", "c.md"]));

        assert!(map.get("a.md").is_empty());
        assert_eq!(map.get("b.md"), set_of(&["s1", "s2"]));
        assert_eq!(map.get("c.md"), set_of(&["s1"]));
        assert!(map.is_consistent());
    }

    #[test]
    fn delete_reports_missing_keys() {
        let mut map = IndexMap::new();
        map.set("a.md", set_of(&["s1"]));

        assert!(!map.delete("b.md"));
        assert!(map.delete("a.md"));
        assert!(!map.delete("a.md"));
        assert!(!map.delete_inverse("s1"));
        assert!(map.is_consistent());
    }

    #[test]
    fn delete_inverse_removes_value_everywhere() {
        let mut map = IndexMap::new();
        map.set("a.md", set_of(&["s1", "s2"]));
        map.set("b.md", set_of(&["s1"]));

        assert!(map.delete_inverse("s1"));
        assert_eq!(map.get("a.md"), set_of(&["s2"]));
        assert!(map.get("b.md").is_empty());
        assert_eq!(map.len(), 1);
        assert!(map.is_consistent());
    }

    #[test]
    fn rename_moves_edges() {
        let mut map = IndexMap::new();
        map.set("a.md", set_of(&["s1", "s2"]));
        map.set("c.md", set_of(&["s3"]));

        assert!(map.rename("a.md", "b.md"));
        assert!(map.get("a.md").is_empty());
        assert_eq!(map.get("b.md"), set_of(&["s1", "s2"]));
        assert_eq!(map.get_inverse("s1"), Some(&set_of(&["b.md"])));

        assert!(map.rename("b.md", "c.md"));
        assert_eq!(map.get("c.md"), set_of(&["s1", "s2"]));
        assert_eq!(map.get_inverse("s3"), None);
        assert!(!map.rename("missing", "x"));
        assert!(map.is_consistent());
    }

    #[test]
    fn rename_inverse_moves_value() {
        let mut map = IndexMap::new();
        map.set("a.md", set_of(&["s1"]));
        map.set("b.md", set_of(&["s1", "s2"]));

        assert!(map.rename_inverse("s1", "renamed"));
        assert_eq!(map.get("a.md"), set_of(&["renamed"]));
        assert_eq!(map.get("b.md"), set_of(&["renamed", "s2"]));
        assert_eq!(map.get_inverse("s1"), None);
        assert!(map.is_consistent());
    }

    #[test]
    fn invariant_holds_across_mixed_sequence() {
        let mut map = IndexMap::new();
        let keys = ["a", "b", "c", "d"];
        let values = ["x", "y", "z"];
        for step in 0..200usize {
            let key = keys[step % keys.len()];
            let other = keys[(step * 7 + 1) % keys.len()];
            match step % 6 {
                0 | 1 => {
                    let chosen = values
                        .iter()
                        .enumerate()
                        .filter(|(idx, _)| (step >> idx) & 1 == 1)
                        .map(|(_, value)| (*value).to_string())
                        .collect();
                    map.set(key, chosen);
                }
                2 => {
                    map.delete(key);
                }
                3 => {
                    map.rename(key, other);
                }
                4 => {
                    let chosen = keys
                        .iter()
                        .enumerate()
                        .filter(|(idx, _)| (step >> idx) & 1 == 0)
                        .map(|(_, key)| (*key).to_string())
                        .collect();
                    map.set_inverse(values[step % values.len()], chosen);
                }
                _ => {
                    map.delete_inverse(values[step % values.len()]);
                }
            }
            assert!(map.is_consistent(), "invariant broken at step {step}");
        }
    }
}
