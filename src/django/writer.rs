use log::{debug, info};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::templates::MIGRATIONS_DIR;
use super::GenerationError;

/// Writes generated files below an app directory
pub struct AppWriter {
    /// Base directory for output files
    output_dir: PathBuf,
}

impl AppWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        AppWriter {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Creates the app directory and its migrations package directory
    pub fn prepare(&self) -> Result<(), GenerationError> {
        let migrations = self.output_dir.join(MIGRATIONS_DIR);
        fs::create_dir_all(&migrations).map_err(|source| GenerationError::DirectoryCreation {
            path: migrations.clone(),
            source,
        })?;
        debug!("Prepared output directory {}", self.output_dir.display());
        Ok(())
    }

    /// Creates or truncates `relative_path` and writes `content` to it.
    /// Returns the full path written.
    pub fn write_file<P: AsRef<Path>>(
        &self,
        relative_path: P,
        content: &str,
    ) -> Result<PathBuf, GenerationError> {
        let file_path = self.output_dir.join(relative_path);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).map_err(|source| GenerationError::DirectoryCreation {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        debug!("Writing file: {}", file_path.display());
        let mut file = File::create(&file_path).map_err(|source| GenerationError::FileCreation {
            path: file_path.clone(),
            source,
        })?;
        file.write_all(content.as_bytes())
            .map_err(|source| GenerationError::FileWrite {
                path: file_path.clone(),
                source,
            })?;
        info!("Successfully wrote file: {}", file_path.display());

        Ok(file_path)
    }

    /// Get the full path to a file in the output directory
    pub fn get_file_path<P: AsRef<Path>>(&self, relative_path: P) -> PathBuf {
        self.output_dir.join(relative_path)
    }
}
