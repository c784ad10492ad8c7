//! Cleanup of raw XML text before parsing.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // C0 controls that XML 1.0 forbids (tab, LF and CR are allowed)
    static ref ILLEGAL_CONTROL_CHARS: Regex = Regex::new(
        r"[\x00-\x08\x0B\x0C\x0E-\x1F]"
    ).unwrap();
}

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Remove control characters illegal in XML and a leading byte-order mark.
pub fn sanitize_xml(content: &str) -> Cow<'_, str> {
    let cleaned = ILLEGAL_CONTROL_CHARS.replace_all(content, "");

    match cleaned {
        Cow::Borrowed(s) => match s.strip_prefix(BYTE_ORDER_MARK) {
            Some(rest) => Cow::Borrowed(rest),
            None => Cow::Borrowed(s),
        },
        Cow::Owned(s) => match s.strip_prefix(BYTE_ORDER_MARK) {
            Some(rest) => Cow::Owned(rest.to_string()),
            None => Cow::Owned(s),
        },
    }
}
