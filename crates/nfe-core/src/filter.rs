//! NCM prefix filtering.

use serde::{Deserialize, Serialize};

use crate::models::item::InvoiceItem;

/// Built-in allow-list of NCM prefixes (industrial and commercial chapters).
pub const DEFAULT_ALLOWED_PREFIXES: &[&str] = &[
    "25202", "2522", "2523", "2713", "2715", "28", "29", "31", "32", "37", "38", "39", "40", "41",
    "44", "4504", "47", "48", "50", "51", "52", "53", "54", "55", "56", "58", "59", "60", "61",
    "62", "63", "64", "65050022", "68", "69", "70", "72", "73", "74", "75", "76", "78", "79", "80",
    "81", "82", "83", "8484", "90049020", "90183", "902000", "94",
];

/// Ordered list of allowed NCM prefixes.
///
/// Entries are trimmed and empty entries dropped on construction; duplicates
/// are kept since they do not change the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct AllowedPrefixes {
    prefixes: Vec<String>,
}

impl AllowedPrefixes {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| p.as_ref().trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// A list that matches nothing.
    pub fn empty() -> Self {
        Self { prefixes: Vec::new() }
    }

    /// Parse a comma- or newline-separated list.
    pub fn parse(text: &str) -> Self {
        Self::new(text.split([',', '\n']))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.prefixes
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Whether `ncm` is non-empty and starts with any allowed prefix.
    pub fn matches(&self, ncm: &str) -> bool {
        if ncm.is_empty() {
            return false;
        }
        self.prefixes.iter().any(|prefix| ncm.starts_with(prefix.as_str()))
    }

    /// First prefix accepting `ncm`, if any.
    pub fn matching_prefix(&self, ncm: &str) -> Option<&str> {
        if ncm.is_empty() {
            return None;
        }
        self.prefixes
            .iter()
            .map(String::as_str)
            .find(|prefix| ncm.starts_with(prefix))
    }
}

impl Default for AllowedPrefixes {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_PREFIXES)
    }
}

impl From<Vec<String>> for AllowedPrefixes {
    fn from(prefixes: Vec<String>) -> Self {
        Self::new(prefixes)
    }
}

impl From<AllowedPrefixes> for Vec<String> {
    fn from(prefixes: AllowedPrefixes) -> Self {
        prefixes.prefixes
    }
}

impl std::fmt::Display for AllowedPrefixes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefixes.join(", "))
    }
}

/// Items whose NCM matches `prefixes`, in their original order.
pub fn filter_items(items: &[InvoiceItem], prefixes: &AllowedPrefixes) -> Vec<InvoiceItem> {
    items
        .iter()
        .filter(|item| prefixes.matches(&item.ncm))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(ncm: &str) -> InvoiceItem {
        InvoiceItem {
            ncm: ncm.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_matches_prefix() {
        assert!(AllowedPrefixes::new(["29"]).matches("29051100"));
        assert!(AllowedPrefixes::new(["39"]).matches("3901"));
        assert!(!AllowedPrefixes::default().matches("1005"));
        assert!(AllowedPrefixes::default().matches("90183119"));
        assert!(!AllowedPrefixes::default().matches("90184000"));
    }

    #[test]
    fn test_empty_code_never_matches() {
        assert!(!AllowedPrefixes::default().matches(""));
        assert_eq!(AllowedPrefixes::default().matching_prefix(""), None);
    }

    #[test]
    fn test_matching_prefix_is_first_in_order() {
        let prefixes = AllowedPrefixes::new(["2905", "29"]);
        assert_eq!(prefixes.matching_prefix("29051100"), Some("2905"));
        assert_eq!(prefixes.matching_prefix("2901"), Some("29"));
        assert_eq!(prefixes.matching_prefix("3901"), None);
    }

    #[test]
    fn test_empty_entries_are_dropped() {
        let prefixes = AllowedPrefixes::new(["", "  ", " 29 "]);
        assert_eq!(prefixes.as_slice(), &["29".to_string()]);

        // An empty entry would otherwise match everything.
        assert!(!prefixes.matches("3901"));
    }

    #[test]
    fn test_parse_commas_and_newlines() {
        let prefixes = AllowedPrefixes::parse("28, 29\r\n39\n\n,40,");
        assert_eq!(prefixes.as_slice(), &["28", "29", "39", "40"]);
    }

    #[test]
    fn test_default_list() {
        let prefixes = AllowedPrefixes::default();
        assert_eq!(prefixes.len(), 53);
        assert_eq!(prefixes.as_slice()[0], "25202");
        assert_eq!(prefixes.as_slice()[52], "94");
    }

    #[test]
    fn test_filter_items_keeps_order() {
        let items = vec![item("3901"), item("1005"), item(""), item("29051100"), item("3902")];
        let filtered = filter_items(&items, &AllowedPrefixes::new(["39", "29"]));

        let codes: Vec<_> = filtered.iter().map(|i| i.ncm.as_str()).collect();
        assert_eq!(codes, vec!["3901", "29051100", "3902"]);
    }

    #[test]
    fn test_empty_list_filters_everything() {
        let items: Vec<_> = (0..100).map(|n| item(&format!("{:08}", n))).collect();
        assert!(filter_items(&items, &AllowedPrefixes::empty()).is_empty());
        assert!(filter_items(&items, &AllowedPrefixes::parse(" , \n")).is_empty());
    }

    #[test]
    fn test_result_independent_of_order() {
        let items = vec![item("2901"), item("3901"), item("4001"), item("7308")];
        let forward = filter_items(&items, &AllowedPrefixes::new(["29", "73"]));
        let backward = filter_items(&items, &AllowedPrefixes::new(["73", "29"]));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_serde_as_plain_list() {
        let prefixes: AllowedPrefixes = serde_json::from_str(r#"["29", "", "39"]"#).unwrap();
        assert_eq!(prefixes.len(), 2);
        assert_eq!(serde_json::to_string(&prefixes).unwrap(), r#"["29","39"]"#);
    }
}
