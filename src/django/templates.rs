//! Built-in templates for a Django REST Framework app
//!
//! Templates are MiniJinja sources rendered with `trim_blocks` and
//! `lstrip_blocks`, so a line holding only a block tag leaves nothing
//! behind in the output.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use super::GenerationError;

/// Subdirectory holding the app's migrations package
pub const MIGRATIONS_DIR: &str = "migrations";

/// Extension of template override files, `<name>.jinja`
pub const TEMPLATE_EXTENSION: &str = "jinja";

pub const MODELS_TEMPLATE: &str = r#"from django.db import models
{% for message in messages %}


class {{ message.name }}(models.Model):
{% if message.fields %}
{% for field in message.fields %}
    {{ field.name }} = {{ field.django_type }}
{% endfor %}
{% else %}
    pass
{% endif %}
{% endfor %}
"#;

pub const SERIALIZERS_TEMPLATE: &str = r#"from rest_framework import serializers

{% for message in messages %}
from .models import {{ message.name }}
{% endfor %}
{% for message in messages %}


class {{ message.name }}Serializer(serializers.ModelSerializer):
    class Meta:
        model = {{ message.name }}
        fields = '__all__'
{% endfor %}
"#;

pub const VIEWSETS_TEMPLATE: &str = r#"from rest_framework import viewsets

{% for message in messages %}
from .models import {{ message.name }}
from .serializers import {{ message.name }}Serializer
{% endfor %}
{% for message in messages %}


class {{ message.name }}ViewSet(viewsets.ModelViewSet):
    queryset = {{ message.name }}.objects.all()
    serializer_class = {{ message.name }}Serializer
{% endfor %}
"#;

pub const URLS_TEMPLATE: &str = r#"from django.urls import include, path
from rest_framework.routers import DefaultRouter

{% for message in messages %}
from .viewsets import {{ message.name }}ViewSet
{% endfor %}

router = DefaultRouter()
{% for message in messages %}
router.register(r'{{ message.name | to_lower }}', {{ message.name }}ViewSet)
{% endfor %}

urlpatterns = [
    path('', include(router.urls)),
]
"#;

pub const ADMIN_TEMPLATE: &str = r#"from django.contrib import admin

{% for message in messages %}
from .models import {{ message.name }}
{% endfor %}

{% for message in messages %}
admin.site.register({{ message.name }})
{% endfor %}
"#;

pub const APPS_TEMPLATE: &str = r#"from django.apps import AppConfig


class {{ app_title }}Config(AppConfig):
    default_auto_field = 'django.db.models.BigAutoField'
    name = '{{ app_name }}'
"#;

/// A named template and the file it renders to
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSpec {
    pub name: String,
    /// Output path relative to the app directory
    pub output: PathBuf,
    pub source: String,
}

/// A file written as-is, independent of the schema
#[derive(Debug, Clone, PartialEq)]
pub struct StaticFile {
    pub path: PathBuf,
    pub content: String,
}

/// The ordered set of files an output target consists of
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateSet {
    templates: Vec<TemplateSpec>,
    static_files: Vec<StaticFile>,
}

impl TemplateSet {
    pub fn new() -> Self {
        TemplateSet::default()
    }

    /// Models, serializers, viewsets, urls, admin and app config, plus the
    /// package markers and a test stub.
    pub fn django() -> Self {
        let mut set = TemplateSet::new();
        set.add_template("models", "models.py", MODELS_TEMPLATE)
            .add_template("serializers", "serializers.py", SERIALIZERS_TEMPLATE)
            .add_template("viewsets", "viewsets.py", VIEWSETS_TEMPLATE)
            .add_template("urls", "urls.py", URLS_TEMPLATE)
            .add_template("admin", "admin.py", ADMIN_TEMPLATE)
            .add_template("apps", "apps.py", APPS_TEMPLATE)
            .add_static_file("__init__.py", "")
            .add_static_file(Path::new(MIGRATIONS_DIR).join("__init__.py"), "")
            .add_static_file("tests.py", "# placeholder\n");
        set
    }

    /// Adds a template, replacing the source and output of an existing
    /// template with the same name in place.
    pub fn add_template(
        &mut self,
        name: impl Into<String>,
        output: impl Into<PathBuf>,
        source: impl Into<String>,
    ) -> &mut Self {
        let spec = TemplateSpec {
            name: name.into(),
            output: output.into(),
            source: source.into(),
        };
        match self.templates.iter_mut().find(|t| t.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.templates.push(spec),
        }
        self
    }

    pub fn add_static_file(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> &mut Self {
        self.static_files.push(StaticFile {
            path: path.into(),
            content: content.into(),
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&TemplateSpec> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn templates(&self) -> &[TemplateSpec] {
        &self.templates
    }

    pub fn static_files(&self) -> &[StaticFile] {
        &self.static_files
    }

    /// Replaces the source of every template that has a `<name>.jinja`
    /// file in `dir`. Returns how many were replaced.
    pub fn load_overrides<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize, GenerationError> {
        let dir = dir.as_ref();
        let mut replaced = 0;

        for spec in &mut self.templates {
            let path = dir.join(&spec.name).with_extension(TEMPLATE_EXTENSION);
            if !path.is_file() {
                continue;
            }
            spec.source = fs::read_to_string(&path)
                .map_err(|source| GenerationError::TemplateLoad { path: path.clone(), source })?;
            info!("Using template override {}", path.display());
            replaced += 1;
        }

        Ok(replaced)
    }
}
