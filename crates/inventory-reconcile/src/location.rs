use std::collections::BTreeSet;

use inventory_io::SheetStore;
use inventory_model::{SheetLayout, DATA_START_ROW};

/// Prefix `raw` with `"<TAG>: "` unless it already starts with `"<TAG>:"`
/// (case-insensitive). Blank input stays blank.
///
/// ```
/// use inventory_reconcile::location::normalize_location;
/// assert_eq!(normalize_location(" 1234 ", "SHR"), "SHR: 1234");
/// assert_eq!(normalize_location("shr:Dock", "SHR"), "shr:Dock");
/// ```
pub fn normalize_location(raw: &str, tag: &str) -> String {
    let s = raw.trim();
    if s.is_empty() {
        return String::new();
    }
    if has_tag(s, tag) {
        s.to_string()
    } else {
        format!("{tag}: {s}")
    }
}

fn has_tag(s: &str, tag: &str) -> bool {
    let prefix = format!("{}:", tag.to_uppercase());
    s.to_uppercase().starts_with(&prefix)
}

/// Distinct tagged locations already present in the sheet, sorted.
pub fn existing_locations(sheet: &impl SheetStore, layout: &SheetLayout, tag: &str) -> Vec<String> {
    let mut found = BTreeSet::new();
    for row in DATA_START_ROW..=sheet.row_count() {
        let value = sheet.cell(row, layout.location).to_text();
        let value = value.trim();
        if has_tag(value, tag) {
            found.insert(value.to_string());
        }
    }
    found.into_iter().collect()
}
