//! Spreadsheet export of extracted items.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};
use tracing::{debug, info};

use crate::error::{NfeError, Result};
use crate::models::config::ExportConfig;
use crate::models::item::{InvoiceItem, FIELDS};

/// Result of an export request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// A file was written with `rows` data rows below the header.
    Written { path: PathBuf, rows: usize },
    /// There were no items; nothing was written.
    NothingToExport,
}

impl ExportOutcome {
    /// Human-readable status line.
    pub fn status_message(&self) -> String {
        match self {
            ExportOutcome::Written { path, rows } => {
                format!("Exported {} items to {}", rows, path.display())
            }
            ExportOutcome::NothingToExport => "No data to export.".to_string(),
        }
    }
}

/// Writes items to a single-sheet XLSX workbook.
///
/// The header row holds the item column labels; every value is written as a
/// string cell so codes such as `07891234567895` keep their leading zeros.
#[derive(Debug, Clone)]
pub struct XlsxExporter {
    sheet_name: String,
    bold_header: bool,
}

impl XlsxExporter {
    pub fn new() -> Self {
        Self::from_config(&ExportConfig::default())
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            sheet_name: config.sheet_name.clone(),
            bold_header: config.bold_header,
        }
    }

    /// Set the worksheet name.
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Write `items` to `path`. Empty input writes nothing.
    pub fn export_to_path(&self, items: &[InvoiceItem], path: &Path) -> Result<ExportOutcome> {
        if items.is_empty() {
            debug!("No items, skipping export to {}", path.display());
            return Ok(ExportOutcome::NothingToExport);
        }

        let mut workbook = self.build_workbook(items)?;
        workbook.save(path)?;
        info!("Wrote {} items to {}", items.len(), path.display());

        Ok(ExportOutcome::Written {
            path: path.to_path_buf(),
            rows: items.len(),
        })
    }

    /// Serialize `items` to XLSX bytes, `None` when there is nothing to export.
    pub fn export_to_buffer(&self, items: &[InvoiceItem]) -> Result<Option<Vec<u8>>> {
        if items.is_empty() {
            return Ok(None);
        }
        let mut workbook = self.build_workbook(items)?;
        Ok(Some(workbook.save_to_buffer()?))
    }

    fn build_workbook(&self, items: &[InvoiceItem]) -> Result<Workbook> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&self.sheet_name)?;

        let header_format = if self.bold_header {
            Format::new().set_bold()
        } else {
            Format::new()
        };

        for (col, field) in FIELDS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, field.label, &header_format)?;
        }

        for (i, item) in items.iter().enumerate() {
            let row = u32::try_from(i + 1)
                .map_err(|_| NfeError::Export(format!("too many rows: {}", items.len())))?;
            for (col, value) in item.values().enumerate() {
                worksheet.write_string(row, col as u16, value)?;
            }
        }

        worksheet.autofit();
        Ok(workbook)
    }
}

impl Default for XlsxExporter {
    fn default() -> Self {
        Self::new()
    }
}
