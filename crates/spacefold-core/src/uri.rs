use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub const DEFAULT_SCHEME: &str = "vault";
pub const SPACE_SCHEME: &str = "spaces";
pub const ROOT_PATH: &str = "/";

const RESERVED_AUTHORITY_PREFIXES: [char; 2] = ['#', '$'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefType {
    Context,
    Block,
    Frame,
    Action,
    Heading,
}

impl RefType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Block => "block",
            Self::Frame => "frame",
            Self::Action => "action",
            Self::Heading => "heading",
        }
    }

    #[must_use]
    pub const fn marker(&self) -> Option<char> {
        match self {
            Self::Context | Self::Block => Some('^'),
            Self::Frame => Some('*'),
            Self::Action => Some(';'),
            Self::Heading => None,
        }
    }
}

/// Parsed address of a path, space or fragment.
///
/// Produced by [`parse_uri`], which is total: malformed pieces are dropped,
/// never reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceUri {
    pub full_path: String,
    pub scheme: String,
    pub authority: Option<String>,
    pub path: String,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub ref_type: Option<RefType>,
    pub alias: Option<String>,
    pub query: Option<BTreeMap<String, String>>,
    pub base_path: String,
    pub trail_slash: bool,
}

impl SpaceUri {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        parse_uri(value)
    }

    /// Rebuilds the canonical base path from the parsed parts.
    #[must_use]
    pub fn base_path_string(&self) -> String {
        build_base_path(&self.scheme, self.authority.as_deref(), &self.path)
    }

    #[must_use]
    pub fn is_space(&self) -> bool {
        self.scheme == SPACE_SCHEME
    }

    #[must_use]
    pub fn is_fragment(&self) -> bool {
        self.reference.is_some()
    }
}

impl Display for SpaceUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.base_path_string())?;
        if self.trail_slash && !self.path.is_empty() && self.path != ROOT_PATH {
            f.write_str("/")?;
        }
        if let Some(alias) = &self.alias {
            write!(f, "|{alias}")?;
        }
        if let Some(reference) = &self.reference {
            f.write_str("#")?;
            if let Some(marker) = self.ref_type.and_then(|ref_type| ref_type.marker()) {
                write!(f, "{marker}")?;
            }
            f.write_str(reference)?;
        }
        if let Some(query) = &self.query {
            let pairs = query
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>();
            if !pairs.is_empty() {
                write!(f, "?{}", pairs.join("&"))?;
            }
        }
        Ok(())
    }
}

#[must_use]
pub fn parse_uri(value: &str) -> SpaceUri {
    let (scheme, mut rest, has_scheme) = match value.find("://") {
        Some(idx) => (value[..idx].to_string(), &value[idx + 3..], true),
        None => (DEFAULT_SCHEME.to_string(), value, false),
    };

    let mut query = None;
    if let Some(idx) = rest.rfind('?') {
        query = Some(parse_query(&rest[idx + 1..])).filter(|pairs| !pairs.is_empty());
        rest = &rest[..idx];
    }

    let mut authority = None;
    if has_scheme {
        let (parsed, remainder) = split_authority(rest);
        authority = Some(parsed.to_string());
        rest = remainder;
    }

    let mut raw_reference = None;
    if let Some(idx) = rest.rfind('#') {
        if idx > 0 || authority.is_some() {
            raw_reference = Some(&rest[idx + 1..]);
            rest = &rest[..idx];
        }
    }

    let mut alias = None;
    if let Some(idx) = rest.rfind('|') {
        let after_last_slash = rest.rfind('/').is_none_or(|slash| slash < idx);
        if after_last_slash {
            alias = Some(rest[idx + 1..].to_string()).filter(|alias| !alias.is_empty());
            rest = &rest[..idx];
        }
    }

    let trimmed = rest.trim_end_matches('/');
    let (path, trail_slash) = if trimmed.is_empty() && !rest.is_empty() {
        (ROOT_PATH.to_string(), false)
    } else {
        (trimmed.to_string(), trimmed.len() != rest.len())
    };

    let (reference, ref_type) = match raw_reference {
        Some(raw) => classify_reference(raw, &path, trail_slash),
        None => (None, None),
    };

    let base_path = build_base_path(&scheme, authority.as_deref(), &path);
    SpaceUri {
        full_path: value.to_string(),
        scheme,
        authority,
        path,
        reference,
        ref_type,
        alias,
        query,
        base_path,
        trail_slash,
    }
}

/// True for `spaces://` addresses.
#[must_use]
pub fn is_space_uri(value: &str) -> bool {
    value
        .strip_prefix(SPACE_SCHEME)
        .is_some_and(|rest| rest.starts_with("://"))
}

fn split_authority(rest: &str) -> (&str, &str) {
    let segment_end = rest.find('/').unwrap_or(rest.len());
    let segment = &rest[..segment_end];

    if segment.starts_with(RESERVED_AUTHORITY_PREFIXES) {
        return match segment.rfind('#') {
            Some(idx) if idx > 0 => (&segment[..idx], &rest[idx..]),
            _ => (segment, strip_leading_slash(&rest[segment_end..])),
        };
    }

    match segment.find(['#', '|']) {
        Some(idx) => (&segment[..idx], &rest[idx..]),
        None => (segment, strip_leading_slash(&rest[segment_end..])),
    }
}

fn strip_leading_slash(value: &str) -> &str {
    value.strip_prefix('/').unwrap_or(value)
}

fn classify_reference(
    raw: &str,
    path: &str,
    trail_slash: bool,
) -> (Option<String>, Option<RefType>) {
    let mut chars = raw.chars();
    let (ref_type, body) = match chars.next() {
        Some('^') => {
            let ref_type = if trail_slash || !is_file_like(path) {
                RefType::Context
            } else {
                RefType::Block
            };
            (ref_type, chars.as_str())
        }
        Some('*') => (RefType::Frame, chars.as_str()),
        Some(';') => (RefType::Action, chars.as_str()),
        _ => (RefType::Heading, raw),
    };
    if body.is_empty() {
        return (None, None);
    }
    (Some(body.to_string()), Some(ref_type))
}

fn is_file_like(path: &str) -> bool {
    path_extension(path).is_some()
}

fn parse_query(raw: &str) -> BTreeMap<String, String> {
    raw.split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn build_base_path(scheme: &str, authority: Option<&str>, path: &str) -> String {
    let Some(authority) = authority else {
        if scheme == DEFAULT_SCHEME {
            return path.to_string();
        }
        return format!("{scheme}://{path}");
    };
    if path.is_empty() || path == ROOT_PATH {
        format!("{scheme}://{authority}")
    } else {
        format!("{scheme}://{authority}/{path}")
    }
}

/// Parent folder of a vault path; top-level entries live under [`ROOT_PATH`].
#[must_use]
pub fn parent_path(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() || path == ROOT_PATH {
        return None;
    }
    match trimmed.rfind('/') {
        Some(0) | None => Some(ROOT_PATH.to_string()),
        Some(idx) => Some(trimmed[..idx].to_string()),
    }
}

#[must_use]
pub fn path_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

#[must_use]
pub fn path_extension(path: &str) -> Option<&str> {
    let name = path_name(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(&name[idx + 1..]),
        _ => None,
    }
}

/// True when `path` sits strictly below `ancestor`.
#[must_use]
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    if path == ancestor || path == ROOT_PATH {
        return false;
    }
    if ancestor == ROOT_PATH {
        return true;
    }
    path.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('/'))
}

#[must_use]
pub fn tag_space_path(tag: &str) -> String {
    let tag = tag.trim();
    if tag.starts_with('#') {
        format!("{SPACE_SCHEME}://{tag}")
    } else {
        format!("{SPACE_SCHEME}://#{tag}")
    }
}

/// Tag named by a tag space path such as `spaces://#project`.
#[must_use]
pub fn tag_from_space_path(space_path: &str) -> Option<String> {
    let uri = parse_uri(space_path);
    if !uri.is_space() {
        return None;
    }
    uri.authority.filter(|authority| authority.starts_with('#'))
}
