use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type ContextRow = BTreeMap<String, String>;

/// Per-context tables: context id -> member path -> row of column values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextTables {
    tables: BTreeMap<String, BTreeMap<String, ContextRow>>,
}

impl ContextTables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn row(&self, context: &str, path: &str) -> Option<&ContextRow> {
        self.tables.get(context)?.get(path)
    }

    #[must_use]
    pub fn table(&self, context: &str) -> Option<&BTreeMap<String, ContextRow>> {
        self.tables.get(context)
    }

    pub fn contexts(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn set_row(&mut self, context: &str, path: &str, row: ContextRow) {
        self.tables
            .entry(context.to_string())
            .or_default()
            .insert(path.to_string(), row);
    }

    pub fn set_table(&mut self, context: &str, rows: BTreeMap<String, ContextRow>) {
        if rows.is_empty() {
            self.tables.remove(context);
        } else {
            self.tables.insert(context.to_string(), rows);
        }
    }

    pub fn remove_row(&mut self, context: &str, path: &str) -> bool {
        let Some(rows) = self.tables.get_mut(context) else {
            return false;
        };
        let removed = rows.remove(path).is_some();
        if rows.is_empty() {
            self.tables.remove(context);
        }
        removed
    }

    pub fn remove_context(&mut self, context: &str) -> bool {
        self.tables.remove(context).is_some()
    }

    pub fn rename_context(&mut self, old: &str, new: &str) -> bool {
        let Some(rows) = self.tables.remove(old) else {
            return false;
        };
        self.tables.insert(new.to_string(), rows);
        true
    }

    /// Drops `path` from every table. Returns the contexts that changed.
    pub fn remove_path(&mut self, path: &str) -> Vec<String> {
        let mut touched = Vec::new();
        for (context, rows) in &mut self.tables {
            if rows.remove(path).is_some() {
                touched.push(context.clone());
            }
        }
        self.tables.retain(|_, rows| !rows.is_empty());
        touched
    }

    pub fn rename_path(&mut self, old: &str, new: &str) -> Vec<String> {
        let mut touched = Vec::new();
        for (context, rows) in &mut self.tables {
            if let Some(row) = rows.remove(old) {
                rows.insert(new.to_string(), row);
                touched.push(context.clone());
            }
        }
        touched
    }
}
