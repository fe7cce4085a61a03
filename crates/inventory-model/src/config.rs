//! Deployment configuration for the inventory tools.
//!
//! Every field has a default reproducing the established spreadsheet
//! convention, so `InventoryConfig::default()` and the JSON document `{}` are
//! equivalent.

use serde::{Deserialize, Serialize};

use crate::{Column, ImportLayout, SheetLayout};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default)]
    pub layout: SheetLayout,
    #[serde(default)]
    pub import_layout: ImportLayout,
    /// Header text expected above the identifier column in scan modes.
    ///
    /// `None` disables the check.
    #[serde(default = "crate::serde_defaults::identifier_header")]
    pub identifier_header: Option<String>,
    /// Scope tag prefixed onto scan-out locations (`"SHR"` -> `"SHR: <loc>"`).
    #[serde(default = "crate::serde_defaults::location_tag")]
    pub location_tag: String,
    /// Zero-pad width of strict-suffix identifier keys.
    #[serde(default = "crate::serde_defaults::key_width")]
    pub key_width: usize,
    /// Placeholder identifiers the duplicate report skips (case-insensitive).
    #[serde(default = "crate::serde_defaults::duplicate_ignore")]
    pub duplicate_ignore: Vec<String>,
    /// Columns hidden from display after a run writes the sheet.
    #[serde(default = "crate::serde_defaults::hidden_columns")]
    pub hidden_columns: Vec<Column>,
    /// Status/scan columns left blank on rows created by a roster import.
    #[serde(default = "crate::serde_defaults::brand_new_blank_columns")]
    pub brand_new_blank_columns: Vec<Column>,
    /// Row whose cell styles are copied onto appended rows.
    #[serde(default = "crate::serde_defaults::style_template_row")]
    pub style_template_row: u32,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            layout: SheetLayout::default(),
            import_layout: ImportLayout::default(),
            identifier_header: crate::serde_defaults::identifier_header(),
            location_tag: crate::serde_defaults::location_tag(),
            key_width: crate::serde_defaults::key_width(),
            duplicate_ignore: crate::serde_defaults::duplicate_ignore(),
            hidden_columns: crate::serde_defaults::hidden_columns(),
            brand_new_blank_columns: crate::serde_defaults::brand_new_blank_columns(),
            style_template_row: crate::serde_defaults::style_template_row(),
        }
    }
}
