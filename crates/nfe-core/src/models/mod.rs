//! Data models: extracted items and pipeline configuration.

pub mod config;
pub mod item;

pub use config::{ExportConfig, ExtractionConfig, FilterConfig, NfeConfig};
pub use item::{FileError, InvoiceItem, ItemField, FIELDS, MISSING_KEY};
