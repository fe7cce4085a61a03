//! Identifier normalization.
//!
//! Two independent rules exist because two identifier conventions exist:
//! printed asset tags carry a letter prefix in front of a numeric body
//! (`AB-000123`), while serial numbers are freeform. The rules are kept apart
//! on purpose; neither is a special case of the other.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Zero-pad width of strict-suffix keys used by the established sheets.
pub const DEFAULT_KEY_WIDTH: usize = 10;

/// Canonical comparison form of an identifier or a serial.
///
/// Keys only exist for inputs that carry something to compare; an input that
/// normalizes to nothing has no key and therefore matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strict-suffix rule: the decimal digits after the last ASCII letter,
/// left-padded with zeros to `width`.
///
/// Without any letter the whole input is searched for digits. Any Unicode
/// decimal digit counts and is kept as written. Longer digit runs are kept
/// whole, never truncated.
///
/// ```
/// use inventory_reconcile::normalize::strict_suffix;
/// assert_eq!(strict_suffix("ab-000123", 10), "0000000123");
/// assert_eq!(strict_suffix("12A-34 5", 10), "0000000345");
/// assert_eq!(strict_suffix("", 10), "0000000000");
/// ```
pub fn strict_suffix(raw: &str, width: usize) -> String {
    format!("{:0>width$}", suffix_digits(raw))
}

/// [`strict_suffix`] as a matching key; `None` when the suffix holds no digits.
pub fn strict_suffix_key(raw: &str, width: usize) -> Option<NormalizedKey> {
    let digits = suffix_digits(raw);
    if digits.is_empty() {
        None
    } else {
        Some(NormalizedKey(format!("{digits:0>width$}")))
    }
}

fn suffix_digits(raw: &str) -> String {
    let tail = match raw.rfind(|c: char| c.is_ascii_alphabetic()) {
        // ASCII letters are one byte wide.
        Some(idx) => &raw[idx + 1..],
        None => raw,
    };
    static DIGIT_RE: OnceLock<Regex> = OnceLock::new();
    let re = DIGIT_RE.get_or_init(|| Regex::new(r"\d").expect("valid regex"));
    re.find_iter(tail).map(|m| m.as_str()).collect()
}

/// Serial rule: trimmed and uppercased, nothing else.
pub fn serial(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// [`serial`] as a matching key; `None` for blank serials.
pub fn serial_key(raw: &str) -> Option<NormalizedKey> {
    let normalized = serial(raw);
    if normalized.is_empty() {
        None
    } else {
        Some(NormalizedKey(normalized))
    }
}
