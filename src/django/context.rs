use std::collections::HashSet;
use std::fmt;
use std::path::{Path, MAIN_SEPARATOR};

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use serde::Serialize;

use super::type_map::{model_name, GeneratedMessage, TypeMapper};

lazy_static! {
    static ref PYTHON_IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Everything the templates can see
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderContext {
    /// Final segment of the output directory, used verbatim
    pub app_name: String,
    /// `app_name` title-cased, used for the `AppConfig` class name
    pub app_title: String,
    pub messages: Vec<GeneratedMessage>,
}

impl RenderContext {
    pub fn new<P: AsRef<Path>>(output_dir: P, messages: Vec<GeneratedMessage>) -> Self {
        let app_name = app_name_from_path(output_dir.as_ref());
        if !is_python_identifier(&app_name) {
            warn!(
                "App name '{}' is not a valid Python identifier; generated code will not import",
                app_name
            );
        }
        let app_title = title_case(&app_name);

        RenderContext {
            app_name,
            app_title,
            messages,
        }
    }
}

/// Final path segment of `path`.
///
/// Paths without one (`.`, `..`, `/`) fall back to their last textual
/// segment, and the empty path to `.`.
pub fn app_name_from_path(path: &Path) -> String {
    if let Some(name) = path.file_name() {
        return name.to_string_lossy().into_owned();
    }

    let text = path.to_string_lossy();
    let is_separator = |c: char| c == '/' || c == MAIN_SEPARATOR;
    let trimmed = text.trim_end_matches(is_separator);
    if trimmed.is_empty() {
        return if text.is_empty() {
            ".".to_string()
        } else {
            MAIN_SEPARATOR.to_string()
        };
    }
    trimmed
        .rsplit(is_separator)
        .next()
        .unwrap_or(trimmed)
        .to_string()
}

/// Upper-cases the first letter of each word and lower-cases the rest.
/// Words are runs of alphanumerics, `_` and `'`.
pub fn title_case(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut at_word_start = true;

    for c in text.chars() {
        if c.is_alphanumeric() || c == '_' || c == '\'' {
            if at_word_start {
                titled.extend(c.to_uppercase());
            } else {
                titled.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            titled.push(c);
            at_word_start = true;
        }
    }

    titled
}

pub fn is_python_identifier(name: &str) -> bool {
    PYTHON_IDENTIFIER_RE.is_match(name)
}

/// A relation field whose target is not a message in the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub message: String,
    pub field: String,
    pub target: String,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} references '{}', which is not a message in this schema",
            self.message, self.field, self.target
        )
    }
}

/// Lists fields typed with a name that is neither a registered type nor a
/// message defined in `messages`, in declaration order. Dotted names resolve
/// by their last segment, the model the generated relation points at.
pub fn dangling_references(
    messages: &[GeneratedMessage],
    mapper: &TypeMapper,
) -> Vec<DanglingReference> {
    let defined: HashSet<&str> = messages.iter().map(|m| m.name.as_str()).collect();

    messages
        .iter()
        .flat_map(|message| {
            message
                .fields
                .iter()
                .filter(|mapped| {
                    let target = mapped.field.field_type.as_str();
                    !mapper.is_registered(target)
                        && !defined.contains(model_name(target))
                })
                .map(move |mapped| DanglingReference {
                    message: message.name.clone(),
                    field: mapped.field.name.clone(),
                    target: mapped.field.field_type.clone(),
                })
        })
        .collect()
}
