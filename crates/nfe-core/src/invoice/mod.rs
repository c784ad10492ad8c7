//! NF-e document parsing and line-item extraction.

pub mod dates;
pub mod document;
mod extractor;
pub mod sanitize;

pub use dates::{IssueDate, IssueDateFormatter};
pub use document::{Element, XmlDocument};
pub use extractor::{text_of, NfeExtractor, NFE_NAMESPACE};

use crate::error::Result;
use crate::models::item::InvoiceItem;

/// Trait for per-document item extractors.
pub trait ItemExtractor {
    /// Extract every line item of one XML document.
    fn extract(&self, content: &str) -> Result<Vec<InvoiceItem>>;

    /// Extract items from raw file bytes, decoding invalid UTF-8 lossily.
    fn extract_bytes(&self, content: &[u8]) -> Result<Vec<InvoiceItem>> {
        self.extract(&String::from_utf8_lossy(content))
    }
}
