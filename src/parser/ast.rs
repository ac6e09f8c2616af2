use serde::Serialize;

use super::error::Location;

/// Everything the generator keeps from a schema file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaFile {
    /// Value of the `syntax = "...";` statement, if any
    pub syntax: Option<String>,
    pub package: Option<String>,
    /// Message blocks in source order
    pub messages: Vec<SchemaMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaMessage {
    pub name: String,
    pub fields: Vec<SchemaField>,
    /// Where the message name appears in the source
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaField {
    pub name: String,
    /// Scalar keyword or the (possibly dotted) name of another message
    #[serde(rename = "type")]
    pub field_type: String,
    pub repeated: bool,
}

impl SchemaFile {
    pub fn new() -> Self {
        SchemaFile::default()
    }

    pub fn message_names(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|m| m.name.as_str())
    }
}

impl SchemaMessage {
    pub fn new(name: String, location: Location) -> Self {
        SchemaMessage {
            name,
            fields: Vec::new(),
            location,
        }
    }
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>, repeated: bool) -> Self {
        SchemaField {
            name: name.into(),
            field_type: field_type.into(),
            repeated,
        }
    }
}
