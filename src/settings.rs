//! Settings for an import run

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ImportError, ImportResult};

/// Connection target for an in-memory database
pub const IN_MEMORY_TARGET: &str = ":memory:";

/// Resolved settings for one import run
///
/// Keys may be written in snake_case or with the PascalCase names used by
/// `appsettings.json` files (`CsvDirectoryPath`, `ConnectionString`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Directory that contains the CSV files to import
    #[serde(alias = "CsvDirectoryPath")]
    pub source_directory: PathBuf,
    /// Database file path, or `:memory:`
    #[serde(alias = "ConnectionString")]
    pub connection_target: String,
    /// Search subdirectories as well
    #[serde(default, alias = "SearchRecursively")]
    pub recursive: bool,
    /// Prefix table names with the file's directories relative to the source
    #[serde(default, alias = "IncludeDirectoryInTableName")]
    pub include_directory_in_table_name: bool,
}

impl ImportSettings {
    /// Create a new builder for ImportSettings
    pub fn builder() -> ImportSettingsBuilder {
        ImportSettingsBuilder::default()
    }

    /// Load settings from a JSON or TOML file, chosen by extension
    pub fn from_file(path: &Path) -> ImportResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ImportError::Config(format!("cannot read {}: {e}", path.display()))
        })?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match extension.to_lowercase().as_str() {
            "toml" => Self::from_toml(&content),
            "json" => Self::from_json(&content),
            other => Err(ImportError::Config(format!(
                "unsupported settings format '{other}' for {}. Expected .json or .toml",
                path.display()
            ))),
        }
    }

    /// Parse settings from a JSON document
    pub fn from_json(content: &str) -> ImportResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| ImportError::Config(format!("invalid JSON settings: {e}")))
    }

    /// Parse settings from a TOML document
    pub fn from_toml(content: &str) -> ImportResult<Self> {
        toml::from_str(content)
            .map_err(|e| ImportError::Config(format!("invalid TOML settings: {e}")))
    }

    /// Check required fields. Fails before any database interaction.
    ///
    /// Whether the source directory exists is checked by discovery.
    pub fn validate(&self) -> ImportResult<()> {
        if self.source_directory.as_os_str().is_empty() {
            return Err(ImportError::Config(
                "source directory is required".to_string(),
            ));
        }
        if self.connection_target.trim().is_empty() {
            return Err(ImportError::Config(
                "connection target is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for ImportSettings
#[derive(Debug, Default)]
pub struct ImportSettingsBuilder {
    source_directory: Option<PathBuf>,
    connection_target: Option<String>,
    recursive: bool,
    include_directory_in_table_name: bool,
}

impl ImportSettingsBuilder {
    pub fn source_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_directory = Some(path.into());
        self
    }

    pub fn connection_target(mut self, target: impl Into<String>) -> Self {
        self.connection_target = Some(target.into());
        self
    }

    /// Use an in-memory database
    pub fn in_memory(self) -> Self {
        self.connection_target(IN_MEMORY_TARGET)
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn include_directory_in_table_name(mut self, include: bool) -> Self {
        self.include_directory_in_table_name = include;
        self
    }

    /// Build and validate the settings
    pub fn build(self) -> ImportResult<ImportSettings> {
        let settings = ImportSettings {
            source_directory: self.source_directory.unwrap_or_default(),
            connection_target: self.connection_target.unwrap_or_default(),
            recursive: self.recursive,
            include_directory_in_table_name: self.include_directory_in_table_name,
        };
        settings.validate()?;
        Ok(settings)
    }
}
