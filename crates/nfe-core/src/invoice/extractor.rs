//! NF-e line-item extractor.

use tracing::{debug, trace};

use crate::error::{NfeError, Result};
use crate::models::config::ExtractionConfig;
use crate::models::item::{InvoiceItem, MISSING_KEY};

use super::dates::IssueDateFormatter;
use super::document::{Element, XmlDocument};
use super::sanitize::sanitize_xml;
use super::ItemExtractor;

/// Namespace of every NF-e element.
pub const NFE_NAMESPACE: &str = "http://www.portalfiscal.inf.br/nfe";

/// Literal prefix of the `infNFe/@Id` attribute.
const KEY_PREFIX: &str = "NFe";

/// Extracts one [`InvoiceItem`] per `det/prod` of an NF-e document.
#[derive(Debug, Clone, Default)]
pub struct NfeExtractor {
    dates: IssueDateFormatter,
}

impl NfeExtractor {
    /// Create an extractor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            dates: IssueDateFormatter::from_config(config),
        }
    }

    /// Set the issue date formatter.
    pub fn with_date_formatter(mut self, dates: IssueDateFormatter) -> Self {
        self.dates = dates;
        self
    }

    fn extract_items(&self, content: &str) -> Result<Vec<InvoiceItem>> {
        let content = sanitize_xml(content);
        let document = XmlDocument::parse(&content)?;

        let inf_nfe = document
            .find_first(NFE_NAMESPACE, "infNFe")
            .ok_or_else(|| NfeError::MissingElement("<infNFe> tag not found".to_string()))?;

        let invoice_key = invoice_key(inf_nfe);
        let ide = inf_nfe.find_first(NFE_NAMESPACE, "ide");
        let issue_date = self.dates.format(&text_of(ide, "dhEmi")).into_string();

        let mut items = Vec::new();
        for (index, det) in inf_nfe.find_all(NFE_NAMESPACE, "det").into_iter().enumerate() {
            let Some(prod) = det.find_first(NFE_NAMESPACE, "prod") else {
                trace!("Skipping <det> #{} without <prod>", index + 1);
                continue;
            };
            items.push(read_product(prod, &invoice_key, &issue_date));
        }

        debug!("Extracted {} items from invoice {}", items.len(), invoice_key);
        Ok(items)
    }
}

impl ItemExtractor for NfeExtractor {
    fn extract(&self, content: &str) -> Result<Vec<InvoiceItem>> {
        self.extract_items(content)
    }
}

fn invoice_key(inf_nfe: &Element) -> String {
    match inf_nfe.attribute("Id") {
        Some(id) => id.strip_prefix(KEY_PREFIX).unwrap_or(id).to_string(),
        None => MISSING_KEY.to_string(),
    }
}

fn read_product(prod: &Element, invoice_key: &str, issue_date: &str) -> InvoiceItem {
    let field = |tag| text_of(Some(prod), tag);

    InvoiceItem {
        invoice_key: invoice_key.to_string(),
        issue_date: issue_date.to_string(),
        product_code: field("cProd"),
        ean: field("cEAN"),
        description: field("xProd"),
        ncm: field("NCM"),
        cest: field("CEST"),
        scale_indicator: field("indEscala"),
        cfop: field("CFOP"),
        commercial_unit: field("uCom"),
        commercial_quantity: field("qCom"),
        commercial_unit_value: field("vUnCom"),
        total_value: field("vProd"),
        taxable_ean: field("cEANTrib"),
        taxable_unit: field("uTrib"),
        taxable_quantity: field("qTrib"),
        taxable_unit_value: field("vUnTrib"),
        total_indicator: field("indTot"),
    }
}

/// Trimmed text of the first NF-e `tag` below `parent`; empty when either is missing.
pub fn text_of(parent: Option<&Element>, tag: &str) -> String {
    parent
        .and_then(|p| p.find_first(NFE_NAMESPACE, tag))
        .map(|el| el.text().trim().to_string())
        .unwrap_or_default()
}
