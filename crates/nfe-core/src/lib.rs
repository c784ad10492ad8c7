//! Core library for Brazilian NF-e line-item extraction.
//!
//! This crate provides:
//! - Namespace-aware parsing of NF-e XML documents into flat item records
//! - Sequential batch processing with per-file error collection
//! - NCM prefix filtering
//! - XLSX export of item tables

pub mod batch;
pub mod error;
pub mod export;
pub mod filter;
pub mod invoice;
pub mod models;

pub use batch::{
    BatchOutcome, BatchProcessor, BatchProgress, CancellationToken, DocumentSource,
    InMemoryDocument,
};
pub use error::{NfeError, Result};
pub use export::{ExportOutcome, XlsxExporter};
pub use filter::{filter_items, AllowedPrefixes, DEFAULT_ALLOWED_PREFIXES};
pub use invoice::{ItemExtractor, NfeExtractor, NFE_NAMESPACE};
pub use models::{FileError, InvoiceItem, NfeConfig, FIELDS};
