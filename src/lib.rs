//! Protobuf to Django REST Framework app generator
//!
//! This library reads a schema written in a subset of Protocol Buffers
//! (top-level messages made of scalar and message-typed fields) and
//! scaffolds a Django REST Framework app from it: models, serializers,
//! viewsets, router registrations, admin registrations and an app config.

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use log::debug;

pub mod django;
pub mod parser;

pub use django::{AppGenerator, Config, ConfigError, GenerationError, GenerationReport};
pub use parser::{parse_schema, ParseError};

use parser::ast::SchemaFile;

/// Errors that can occur during the conversion process
#[derive(Debug)]
pub enum ConversionError {
    FileRead(std::io::Error),
    Parse(ParseError),
    Generation(GenerationError),
    Config(ConfigError),
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::FileRead(err) => write!(f, "File read error: {}", err),
            ConversionError::Parse(err) => write!(f, "Parse error: {}", err),
            ConversionError::Generation(err) => write!(f, "Generation error: {}", err),
            ConversionError::Config(err) => write!(f, "Configuration error: {}", err),
        }
    }
}

impl Error for ConversionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConversionError::FileRead(err) => Some(err),
            ConversionError::Parse(err) => Some(err),
            ConversionError::Generation(err) => Some(err),
            ConversionError::Config(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConversionError {
    fn from(err: std::io::Error) -> Self {
        ConversionError::FileRead(err)
    }
}

impl From<ParseError> for ConversionError {
    fn from(err: ParseError) -> Self {
        ConversionError::Parse(err)
    }
}

impl From<GenerationError> for ConversionError {
    fn from(err: GenerationError) -> Self {
        ConversionError::Generation(err)
    }
}

impl From<ConfigError> for ConversionError {
    fn from(err: ConfigError) -> Self {
        ConversionError::Config(err)
    }
}

/// Read and parse a schema file
pub fn parse_schema_file<P: AsRef<Path>>(path: P) -> Result<SchemaFile, ConversionError> {
    let path = path.as_ref();
    debug!("Reading schema from {}", path.display());
    let source = fs::read_to_string(path)?;
    Ok(parse_schema(&source)?)
}

/// Generate a Django app from a schema file
///
/// # Arguments
///
/// * `proto_path` - Path to the input schema file
/// * `output_dir` - Directory to write the app into; its last segment names the app
/// * `config` - Generator settings
///
/// # Returns
///
/// A `GenerationReport` describing what was written.
///
/// # Errors
///
/// Returns a `ConversionError` naming the stage that failed. Files written
/// before a generation failure are left in place.
pub fn generate_app<P: AsRef<Path>, Q: AsRef<Path>>(
    proto_path: P,
    output_dir: Q,
    config: &Config,
) -> Result<GenerationReport, ConversionError> {
    let schema = parse_schema_file(proto_path)?;
    generate(schema, output_dir.as_ref(), config)
}

/// Generate a Django app from schema text held in memory
pub fn generate_app_from_source<P: AsRef<Path>>(
    source: &str,
    output_dir: P,
    config: &Config,
) -> Result<GenerationReport, ConversionError> {
    let schema = parse_schema(source)?;
    generate(schema, output_dir.as_ref(), config)
}

fn generate(
    schema: SchemaFile,
    output_dir: &Path,
    config: &Config,
) -> Result<GenerationReport, ConversionError> {
    let generator = AppGenerator::from_config(config)?;
    Ok(generator.generate(schema, output_dir)?)
}
