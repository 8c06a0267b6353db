use super::env::{parse_enabled_default_false, read_non_empty_env};

const ENV_INCLUDE_HIDDEN: &str = "SPACEFOLD_INCLUDE_HIDDEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexConfig {
    /// Let hidden paths take part in computed (folder, tag, smart) membership.
    pub include_hidden: bool,
}

impl IndexConfig {
    #[must_use]
    pub(super) fn from_env() -> Self {
        Self {
            include_hidden: parse_enabled_default_false(
                read_non_empty_env(ENV_INCLUDE_HIDDEN).as_deref(),
            ),
        }
    }
}
