//! Configuration structures for the extraction pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NfeError, Result};
use crate::filter::AllowedPrefixes;

/// Main configuration for the nfe pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NfeConfig {
    /// Invoice extraction configuration.
    pub extraction: ExtractionConfig,

    /// NCM prefix filter configuration.
    pub filter: FilterConfig,

    /// Spreadsheet export configuration.
    pub export: ExportConfig,
}

/// Invoice extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// chrono format pattern for the issue date column.
    pub date_format: String,

    /// Convert issue timestamps to the machine's local time zone instead of
    /// keeping the offset written in the document.
    pub local_time: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            date_format: "%d/%m/%Y %H:%M:%S".to_string(),
            local_time: false,
        }
    }
}

/// NCM filter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Allowed NCM prefixes for the filtered export.
    pub allowed_prefixes: AllowedPrefixes,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allowed_prefixes: AllowedPrefixes::default(),
        }
    }
}

/// Spreadsheet export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Name of the single worksheet.
    pub sheet_name: String,

    /// File name of the export with every item.
    pub full_file_name: String,

    /// File name of the NCM-filtered export.
    pub filtered_file_name: String,

    /// Render the header row in bold.
    pub bold_header: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sheet_name: "Itens".to_string(),
            full_file_name: "itens_nfe_completo.xlsx".to_string(),
            filtered_file_name: "itens_nfe_filtrado_NCM.xlsx".to_string(),
            bold_header: true,
        }
    }
}

impl NfeConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| NfeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| NfeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}
