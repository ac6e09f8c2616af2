//! Django REST Framework app generator
//!
//! Turns a parsed schema into an app directory: every message becomes a
//! model with a serializer, a viewset, a router entry and an admin
//! registration. Declared field types go through a [`TypeMapper`], the
//! results are collected into a [`RenderContext`], and a [`TemplateRenderer`]
//! writes one file per template through an [`AppWriter`].

pub mod config;
pub mod context;
pub mod renderer;
pub mod templates;
pub mod type_map;
pub mod writer;

#[cfg(test)]
mod tests;

use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::parser::ast::SchemaFile;

pub use config::{Config, ConfigError};
pub use context::{dangling_references, DanglingReference, RenderContext};
pub use renderer::{Helper, HelperRegistry, TemplateRenderer};
pub use templates::TemplateSet;
pub use type_map::{GeneratedMessage, MappedField, TypeMapper};
pub use writer::AppWriter;

/// Errors that can occur while rendering and writing an app
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Template '{name}' does not compile: {source}")]
    TemplateSyntax {
        name: String,
        source: minijinja::Error,
    },
    #[error("Failed to read template {}: {source}", path.display())]
    TemplateLoad { path: PathBuf, source: io::Error },
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreation { path: PathBuf, source: io::Error },
    #[error("Failed to create file {}: {source}", path.display())]
    FileCreation { path: PathBuf, source: io::Error },
    #[error("Failed to write file {}: {source}", path.display())]
    FileWrite { path: PathBuf, source: io::Error },
    #[error("Failed to render template '{name}': {source}")]
    RenderExecution {
        name: String,
        source: minijinja::Error,
    },
}

/// Outcome of a successful generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub output_dir: PathBuf,
    pub app_name: String,
    pub message_count: usize,
    /// Every file written, in write order
    pub files: Vec<PathBuf>,
    pub dangling_references: Vec<DanglingReference>,
}

/// Maps, checks and renders schemas into Django apps
pub struct AppGenerator {
    mapper: TypeMapper,
    renderer: TemplateRenderer,
    warn_dangling_references: bool,
}

impl AppGenerator {
    pub fn new(mapper: TypeMapper, renderer: TemplateRenderer) -> Self {
        AppGenerator {
            mapper,
            renderer,
            warn_dangling_references: true,
        }
    }

    /// Builds the standard generator, applying the string length and any
    /// template overrides from `config`.
    pub fn from_config(config: &Config) -> Result<Self, GenerationError> {
        let mut templates = TemplateSet::django();
        if let Some(dir) = &config.template_dir {
            templates.load_overrides(dir)?;
        }
        let renderer = TemplateRenderer::new(templates, &HelperRegistry::with_defaults())?;

        let mut generator =
            AppGenerator::new(TypeMapper::django(config.string_max_length), renderer);
        generator.warn_dangling_references = config.warn_dangling_references;
        Ok(generator)
    }

    pub fn mapper(&self) -> &TypeMapper {
        &self.mapper
    }

    pub fn mapper_mut(&mut self) -> &mut TypeMapper {
        &mut self.mapper
    }

    /// Maps every message of `schema` and writes the app into `output_dir`.
    ///
    /// # Arguments
    ///
    /// * `schema` - The parsed schema
    /// * `output_dir` - App directory; its final segment is the app name
    ///
    /// # Returns
    ///
    /// A `GenerationReport` listing the files written, or the first
    /// `GenerationError` hit. Files written before a failure are kept.
    pub fn generate<P: AsRef<Path>>(
        &self,
        schema: SchemaFile,
        output_dir: P,
    ) -> Result<GenerationReport, GenerationError> {
        let output_dir = output_dir.as_ref();
        let messages: Vec<GeneratedMessage> = schema
            .messages
            .into_iter()
            .map(|message| self.mapper.map_message(message))
            .collect();

        let dangling = dangling_references(&messages, &self.mapper);
        if self.warn_dangling_references {
            for reference in &dangling {
                warn!("{}", reference);
            }
        }

        let context = RenderContext::new(output_dir, messages);
        let writer = AppWriter::new(output_dir);
        let files = self.renderer.generate(&context, &writer)?;

        info!(
            "Generated app '{}' with {} model(s), {} file(s) in {}",
            context.app_name,
            context.messages.len(),
            files.len(),
            output_dir.display()
        );

        Ok(GenerationReport {
            output_dir: output_dir.to_path_buf(),
            app_name: context.app_name,
            message_count: context.messages.len(),
            files,
            dangling_references: dangling,
        })
    }
}
