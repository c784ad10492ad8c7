//! Error types for the nfe-core library.

use thiserror::Error;

/// Main error type for the nfe library.
#[derive(Error, Debug)]
pub enum NfeError {
    /// The source file could not be read.
    #[error("failed to read file: {0}")]
    Read(#[source] std::io::Error),

    /// The document is not well-formed XML.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// A required NF-e element is absent from the document.
    #[error("required element not found: {0}")]
    MissingElement(String),

    /// Spreadsheet serialization failed.
    #[error("export error: {0}")]
    Export(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for NfeError {
    fn from(err: quick_xml::Error) -> Self {
        NfeError::Parse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for NfeError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        NfeError::Parse(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for NfeError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        NfeError::Export(err.to_string())
    }
}

/// Result type for the nfe library.
pub type Result<T> = std::result::Result<T, NfeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NfeError::MissingElement("<infNFe> tag not found".to_string());
        assert_eq!(err.to_string(), "required element not found: <infNFe> tag not found");

        let err = NfeError::Parse("unexpected end of document".to_string());
        assert_eq!(err.to_string(), "XML parse error: unexpected end of document");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: NfeError = io_err.into();
        assert!(matches!(err, NfeError::Io(_)));
    }
}
