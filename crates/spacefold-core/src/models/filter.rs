use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    Any,
    #[default]
    All,
}

impl Combinator {
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValueType {
    Property,
    #[default]
    #[serde(other)]
    Literal,
}

/// Wire form of one predicate, as stored in space definitions.
///
/// `kind` stays a plain string here; resolution into a typed target happens
/// in the filter engine so unknown kinds fail closed instead of failing to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDef {
    pub field: String,
    #[serde(rename = "fn")]
    pub func: String,
    #[serde(default)]
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "fType", default)]
    pub value_type: FilterValueType,
}

impl FilterDef {
    #[must_use]
    pub fn new(
        kind: impl Into<String>,
        field: impl Into<String>,
        func: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            func: func.into(),
            value: value.into(),
            kind: kind.into(),
            value_type: FilterValueType::Literal,
        }
    }

    #[must_use]
    pub fn from_property(mut self) -> Self {
        self.value_type = FilterValueType::Property;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterGroupDef {
    #[serde(rename = "type", default)]
    pub combinator: Combinator,
    #[serde(default)]
    pub filters: Vec<FilterDef>,
}

impl FilterGroupDef {
    #[must_use]
    pub fn all(filters: Vec<FilterDef>) -> Self {
        Self {
            combinator: Combinator::All,
            filters,
        }
    }

    #[must_use]
    pub fn any(filters: Vec<FilterDef>) -> Self {
        Self {
            combinator: Combinator::Any,
            filters,
        }
    }
}

/// Containment under `path` plus a filter predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinDefGroup {
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
    #[serde(rename = "type", default)]
    pub combinator: Combinator,
    #[serde(default)]
    pub groups: Vec<FilterGroupDef>,
}
