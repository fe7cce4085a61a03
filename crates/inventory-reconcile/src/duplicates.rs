//! Post-run report of asset tags that appear on more than one row.
//!
//! Grouping uses the raw tag text (trimmed, case-insensitive), not the
//! normalized key: two different printed tags sharing a numeric suffix are
//! not duplicates.

use std::collections::HashMap;
use std::fmt;

use inventory_io::SheetStore;
use inventory_model::{SheetLayout, DATA_START_ROW};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub identifier: String,
    /// Sheet rows holding the identifier, ascending.
    pub rows: Vec<u32>,
}

impl fmt::Display for DuplicateGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Asset ID '{}' appears in {} rows:",
            self.identifier,
            self.rows.len()
        )?;
        for row in &self.rows {
            write!(f, "\n    row {row}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateReport {
    /// Groups in order of first appearance.
    pub groups: Vec<DuplicateGroup>,
}

impl DuplicateReport {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Group data rows by trimmed identifier text, ignoring case, and keep groups
/// of two or more.
///
/// Empty identifiers and the `ignore` placeholders (case-insensitive) are
/// skipped. Read-only.
pub fn detect_duplicates(
    sheet: &impl SheetStore,
    layout: &SheetLayout,
    ignore: &[String],
) -> DuplicateReport {
    let ignore: Vec<String> = ignore.iter().map(|s| s.trim().to_lowercase()).collect();

    // Grouped by upper-cased text; each group shows the first spelling seen.
    let mut order: Vec<(String, String)> = Vec::new();
    let mut rows_by_identifier: HashMap<String, Vec<u32>> = HashMap::new();

    for row in DATA_START_ROW..=sheet.row_count() {
        let raw = sheet.cell(row, layout.identifier).to_text();
        let identifier = raw.trim();
        if identifier.is_empty() || ignore.contains(&identifier.to_lowercase()) {
            continue;
        }
        let folded = identifier.to_uppercase();
        rows_by_identifier
            .entry(folded.clone())
            .or_insert_with(|| {
                order.push((folded, identifier.to_string()));
                Vec::new()
            })
            .push(row);
    }

    let groups = order
        .into_iter()
        .filter_map(|(folded, identifier)| {
            let rows = rows_by_identifier.remove(&folded)?;
            (rows.len() > 1).then_some(DuplicateGroup { identifier, rows })
        })
        .collect();

    DuplicateReport { groups }
}
