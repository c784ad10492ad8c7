//! Line-item records extracted from NF-e documents.

use serde::{Deserialize, Serialize};

/// Invoice key used when `infNFe` carries no `Id` attribute.
pub const MISSING_KEY: &str = "N/A";

/// One product line of an NF-e, flattened together with its invoice header.
///
/// Every value is kept as the exact text found in the XML so that leading
/// zeros and decimal separators survive export unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    /// Access key of the source invoice (44 digits) or `N/A`.
    pub invoice_key: String,
    /// Formatted issue timestamp (`ide/dhEmi`).
    pub issue_date: String,
    /// `cProd`
    pub product_code: String,
    /// `cEAN`
    pub ean: String,
    /// `xProd`
    pub description: String,
    /// `NCM` classification code.
    pub ncm: String,
    /// `CEST`
    pub cest: String,
    /// `indEscala`
    pub scale_indicator: String,
    /// `CFOP`
    pub cfop: String,
    /// `uCom`
    pub commercial_unit: String,
    /// `qCom`
    pub commercial_quantity: String,
    /// `vUnCom`
    pub commercial_unit_value: String,
    /// `vProd`
    pub total_value: String,
    /// `cEANTrib`
    pub taxable_ean: String,
    /// `uTrib`
    pub taxable_unit: String,
    /// `qTrib`
    pub taxable_quantity: String,
    /// `vUnTrib`
    pub taxable_unit_value: String,
    /// `indTot`
    pub total_indicator: String,
}

/// A column of the item table: header label plus accessor.
#[derive(Clone, Copy)]
pub struct ItemField {
    /// Header label used in exported tables.
    pub label: &'static str,
    /// Reads the column value from an item.
    pub get: fn(&InvoiceItem) -> &str,
}

impl std::fmt::Debug for ItemField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemField").field("label", &self.label).finish()
    }
}

/// Columns in export order.
pub const FIELDS: [ItemField; 18] = [
    ItemField { label: "Chave", get: |i| i.invoice_key.as_str() },
    ItemField { label: "Data Emissão", get: |i| i.issue_date.as_str() },
    ItemField { label: "Código Produto", get: |i| i.product_code.as_str() },
    ItemField { label: "EAN", get: |i| i.ean.as_str() },
    ItemField { label: "Produto", get: |i| i.description.as_str() },
    ItemField { label: "NCM", get: |i| i.ncm.as_str() },
    ItemField { label: "CEST", get: |i| i.cest.as_str() },
    ItemField { label: "Ind. Escala", get: |i| i.scale_indicator.as_str() },
    ItemField { label: "CFOP", get: |i| i.cfop.as_str() },
    ItemField { label: "Unidade Comercial", get: |i| i.commercial_unit.as_str() },
    ItemField { label: "Quantidade Comercial", get: |i| i.commercial_quantity.as_str() },
    ItemField { label: "Valor Unitário Comercial", get: |i| i.commercial_unit_value.as_str() },
    ItemField { label: "Valor Produto", get: |i| i.total_value.as_str() },
    ItemField { label: "EAN Tributável", get: |i| i.taxable_ean.as_str() },
    ItemField { label: "Unidade Tributável", get: |i| i.taxable_unit.as_str() },
    ItemField { label: "Quantidade Tributável", get: |i| i.taxable_quantity.as_str() },
    ItemField { label: "Valor Unitário Tributável", get: |i| i.taxable_unit_value.as_str() },
    ItemField { label: "Indicador Total", get: |i| i.total_indicator.as_str() },
];

impl InvoiceItem {
    /// Header labels in export order.
    pub fn headers() -> impl Iterator<Item = &'static str> {
        FIELDS.iter().map(|f| f.label)
    }

    /// Column values in export order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        FIELDS.iter().map(move |f| (f.get)(self))
    }
}

/// A file that could not be processed, with a readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    /// Source file name.
    pub file: String,
    /// Failure description.
    pub message: String,
}

impl FileError {
    pub fn new(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file, self.message)
    }
}
