use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde::Serialize;

use crate::parser::ast::{SchemaField, SchemaMessage};

/// `max_length` given to `CharField` unless configured otherwise
pub const DEFAULT_STRING_MAX_LENGTH: u32 = 255;

/// Builds a Django field declaration from a declared type name
pub type DeclarationBuilder = Box<dyn Fn(&str) -> String + Send + Sync>;

/// A schema field together with the Django declaration chosen for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedField {
    #[serde(flatten)]
    pub field: SchemaField,
    pub django_type: String,
}

/// A schema message whose fields have all been mapped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedMessage {
    pub name: String,
    pub fields: Vec<MappedField>,
}

/// Maps declared field types to Django model field declarations.
///
/// Lookups are exact and case-sensitive. Names without a registered
/// builder go to the fallback, which by default declares a `ForeignKey`
/// to the model of that name.
pub struct TypeMapper {
    builders: HashMap<String, DeclarationBuilder>,
    fallback: DeclarationBuilder,
}

impl TypeMapper {
    /// A mapper with no scalar types; every name maps through the fallback.
    pub fn empty() -> Self {
        TypeMapper {
            builders: HashMap::new(),
            fallback: Box::new(foreign_key),
        }
    }

    /// The standard scalar table.
    pub fn django(string_max_length: u32) -> Self {
        let mut mapper = TypeMapper::empty();

        for name in ["int32", "int64"] {
            mapper.register(name, |_| "models.IntegerField()".to_string());
        }
        mapper.register("string", move |_| {
            format!("models.CharField(max_length={})", string_max_length)
        });
        mapper.register("bool", |_| "models.BooleanField()".to_string());
        for name in ["float", "double"] {
            mapper.register(name, |_| "models.FloatField()".to_string());
        }

        mapper
    }

    /// Adds a builder for `type_name`, replacing any existing one.
    pub fn register<F>(&mut self, type_name: impl Into<String>, builder: F) -> &mut Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.builders.insert(type_name.into(), Box::new(builder));
        self
    }

    /// Replaces the builder used for unregistered (custom) type names.
    pub fn with_fallback<F>(mut self, builder: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.fallback = Box::new(builder);
        self
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.builders.contains_key(type_name)
    }

    /// Returns the declaration for `type_name`. Never fails.
    pub fn map_type(&self, type_name: &str) -> String {
        match self.builders.get(type_name) {
            Some(builder) => builder(type_name),
            None => (self.fallback)(type_name),
        }
    }

    /// The `repeated` flag is carried along; it does not change the declaration.
    pub fn map_field(&self, field: SchemaField) -> MappedField {
        let django_type = self.map_type(&field.field_type);
        debug!("Mapped field {}: {} -> {}", field.name, field.field_type, django_type);
        MappedField { field, django_type }
    }

    pub fn map_message(&self, message: SchemaMessage) -> GeneratedMessage {
        GeneratedMessage {
            name: message.name,
            fields: message
                .fields
                .into_iter()
                .map(|field| self.map_field(field))
                .collect(),
        }
    }
}

impl Default for TypeMapper {
    fn default() -> Self {
        TypeMapper::django(DEFAULT_STRING_MAX_LENGTH)
    }
}

impl fmt::Debug for TypeMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.builders.keys().collect();
        names.sort();
        f.debug_struct("TypeMapper")
            .field("registered", &names)
            .finish_non_exhaustive()
    }
}

/// Model class a declared type refers to: the last segment of a dotted
/// name, so `.Author` and `pkg.v1.Author` both name `Author`.
pub fn model_name(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}

/// Relation to another model, deleted along with its target.
pub fn foreign_key(type_name: &str) -> String {
    format!(
        "models.ForeignKey({}, on_delete=models.CASCADE)",
        model_name(type_name)
    )
}
