use crate::models::{FilterDef, PathState};
use crate::uri::{parent_path, path_extension, path_name, tag_from_space_path};

use super::FilterEnv;
use super::multi::serialize_multi_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PathCacheField {
    Tags,
    Inlinks,
    Outlinks,
    Spaces,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileProp {
    Path,
    Name,
    Parent,
    Kind,
    SubType,
    Hidden,
    Color,
    Sticker,
    Ctime,
    Mtime,
    Size,
    Extension,
}

/// Field a predicate reads, resolved from the `type`/`field` pair of a [`FilterDef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FilterTarget<'d> {
    Context { context: &'d str, column: &'d str },
    Frontmatter { key: &'d str },
    PathCache(PathCacheField),
    FileProp(FileProp),
}

impl<'d> FilterTarget<'d> {
    pub(crate) fn resolve(def: &'d FilterDef) -> Option<Self> {
        let field = def.field.trim();
        if field.is_empty() {
            return None;
        }
        match def.kind.as_str() {
            "context" => {
                let (context, column) = field.rsplit_once('.')?;
                if context.is_empty() || column.is_empty() {
                    return None;
                }
                Some(Self::Context { context, column })
            }
            "frontmatter" => Some(Self::Frontmatter { key: field }),
            "path" => {
                let cache_field = match field {
                    "tags" => PathCacheField::Tags,
                    "inlinks" => PathCacheField::Inlinks,
                    "outlinks" => PathCacheField::Outlinks,
                    "spaces" => PathCacheField::Spaces,
                    _ => return None,
                };
                Some(Self::PathCache(cache_field))
            }
            "fileprop" => {
                let prop = match field {
                    "path" => FileProp::Path,
                    "name" => FileProp::Name,
                    "parent" => FileProp::Parent,
                    "type" => FileProp::Kind,
                    "subtype" | "subType" => FileProp::SubType,
                    "hidden" => FileProp::Hidden,
                    "color" => FileProp::Color,
                    "sticker" => FileProp::Sticker,
                    "ctime" => FileProp::Ctime,
                    "mtime" => FileProp::Mtime,
                    "size" => FileProp::Size,
                    "extension" => FileProp::Extension,
                    _ => return None,
                };
                Some(Self::FileProp(prop))
            }
            _ => None,
        }
    }

    /// Current value of the field for `path`; `None` when the field does not
    /// apply to it (e.g. a context the path is not a member of).
    pub(crate) fn fetch(&self, path: &PathState, env: &FilterEnv<'_>) -> Option<String> {
        match *self {
            Self::Context { context, column } => {
                if !is_context_member(path, context) {
                    return None;
                }
                let row = env.contexts()?.row(context, &path.path)?;
                Some(row.get(column).cloned().unwrap_or_default())
            }
            Self::Frontmatter { key } => Some(
                path.metadata
                    .property
                    .get(key)
                    .map(json_to_filter_string)
                    .unwrap_or_default(),
            ),
            Self::PathCache(field) => Some(match field {
                PathCacheField::Tags => {
                    serialize_multi_string(&path.tags.iter().collect::<Vec<_>>())
                }
                PathCacheField::Inlinks => serialize_multi_string(&path.metadata.inlinks),
                PathCacheField::Outlinks => serialize_multi_string(&path.metadata.outlinks),
                PathCacheField::Spaces => {
                    serialize_multi_string(&path.spaces.iter().collect::<Vec<_>>())
                }
            }),
            Self::FileProp(prop) => Some(read_file_prop(path, prop)),
        }
    }
}

fn is_context_member(path: &PathState, context: &str) -> bool {
    path.tags.contains(context)
        || path.spaces.contains(context)
        || tag_from_space_path(context).is_some_and(|tag| path.tags.contains(&tag))
}

fn read_file_prop(path: &PathState, prop: FileProp) -> String {
    let file = path.metadata.file.as_ref();
    match prop {
        FileProp::Path => path.path.clone(),
        FileProp::Name => path_name(&path.path).to_string(),
        FileProp::Parent => parent_path(&path.path).unwrap_or_default(),
        FileProp::Kind => path.kind.as_str().to_string(),
        FileProp::SubType => path.sub_type.clone().unwrap_or_default(),
        FileProp::Hidden => path.hidden.to_string(),
        FileProp::Color => path.label.color.clone().unwrap_or_default(),
        FileProp::Sticker => path.label.sticker.clone().unwrap_or_default(),
        FileProp::Ctime => file
            .and_then(|file| file.ctime)
            .map(|value| value.to_string())
            .unwrap_or_default(),
        FileProp::Mtime => file
            .and_then(|file| file.mtime)
            .map(|value| value.to_string())
            .unwrap_or_default(),
        FileProp::Size => file
            .and_then(|file| file.size)
            .map(|value| value.to_string())
            .unwrap_or_default(),
        FileProp::Extension => file
            .and_then(|file| file.extension.clone())
            .or_else(|| path_extension(&path.path).map(str::to_string))
            .unwrap_or_default(),
    }
}

fn json_to_filter_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Bool(flag) => flag.to_string(),
        serde_json::Value::Number(number) => number.to_string(),
        serde_json::Value::Array(items) => {
            serialize_multi_string(&items.iter().map(json_to_filter_string).collect::<Vec<_>>())
        }
        serde_json::Value::Object(_) => value.to_string(),
    }
}
