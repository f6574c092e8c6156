//! Query fingerprinting
//!
//! A fingerprint is the query text with comments removed, literals replaced
//! by `?`, value lists collapsed and whitespace normalized, so that every
//! execution of the same statement shape maps to the same string.

use regex::Regex;
use sha2::{Digest, Sha256};

/// Number of hex digits kept from the digest for a class identifier
const CLASS_ID_LEN: usize = 16;

/// Reduces raw query text to its structural fingerprint
pub struct Fingerprinter {
    block_comment: Regex,
    line_comment: Regex,
    single_quoted: Regex,
    double_quoted: Regex,
    hex_literal: Regex,
    number: Regex,
    whitespace: Regex,
    in_list: Regex,
    values_list: Regex,
    limit_pair: Regex,
    use_db: Regex,
    call_proc: Regex,
}

impl Fingerprinter {
    /// Create a new fingerprinter
    pub fn new() -> Self {
        Self {
            block_comment: Regex::new(r"(?s)/\*.*?\*/").unwrap(),
            line_comment: Regex::new(r"(?m)(?:--\s|#).*$").unwrap(),
            single_quoted: Regex::new(r"'(?:[^'\\]|\\.|'')*'").unwrap(),
            double_quoted: Regex::new(r#""(?:[^"\\]|\\.|"")*""#).unwrap(),
            hex_literal: Regex::new(r"\b0x[0-9a-f]+\b").unwrap(),
            number: Regex::new(r"\b\d+(?:\.\d+)?(?:e[+-]?\d+)?\b").unwrap(),
            whitespace: Regex::new(r"\s+").unwrap(),
            in_list: Regex::new(r"\bin\s*\(\s*\?(?:\s*,\s*\?)*\s*\)").unwrap(),
            values_list: Regex::new(
                r"\bvalues?\s*(?:\([^()]*(?:\([^()]*\)[^()]*)*\)\s*,?\s*)+",
            )
            .unwrap(),
            limit_pair: Regex::new(r"\blimit \?(?:\s*,\s*\?| offset \?)").unwrap(),
            use_db: Regex::new(r"^use\s+\S+$").unwrap(),
            call_proc: Regex::new(r"^call\s+([\w.`]+)").unwrap(),
        }
    }

    /// Compute the fingerprint of a query
    pub fn fingerprint(&self, query: &str) -> String {
        let query = query.trim();
        if query
            .get(..22)
            .is_some_and(|head| head.eq_ignore_ascii_case("administrator command:"))
        {
            return query.to_lowercase();
        }

        let text = self.block_comment.replace_all(query, " ");
        let text = self.single_quoted.replace_all(&text, "?");
        let text = self.double_quoted.replace_all(&text, "?");
        let text = self.line_comment.replace_all(&text, "");
        let text = text.to_lowercase();
        let text = self.whitespace.replace_all(text.trim(), " ");

        if self.use_db.is_match(&text) {
            return "use ?".to_string();
        }
        if let Some(captures) = self.call_proc.captures(&text) {
            return format!("call {}", &captures[1]);
        }

        let text = self.hex_literal.replace_all(&text, "?");
        let text = self.number.replace_all(&text, "?");
        let text = self.in_list.replace_all(&text, "in(?+)");
        let text = self.values_list.replace_all(&text, "values(?+) ");
        let text = self.limit_pair.replace_all(&text, "limit ?");
        let text = self.whitespace.replace_all(text.trim(), " ");
        text.trim_end_matches(';').trim_end().to_string()
    }

    /// Stable class identifier for a fingerprint
    pub fn class_id(&self, fingerprint: &str) -> String {
        class_id(fingerprint)
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive the class identifier of a fingerprint: the first 16 hex digits of
/// its SHA-256 digest, upper-cased.
pub fn class_id(fingerprint: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fingerprint.as_bytes());
    hex::encode_upper(hasher.finalize())[..CLASS_ID_LEN].to_string()
}
