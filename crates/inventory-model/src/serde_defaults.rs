//! Default values for [`crate::InventoryConfig`] fields, referenced by path from
//! `#[serde(default = "crate::serde_defaults::...")]`.

use crate::Column;

pub(crate) fn identifier_header() -> Option<String> {
    Some("Asset Id".to_string())
}

pub(crate) fn location_tag() -> String {
    "SHR".to_string()
}

pub(crate) const fn key_width() -> usize {
    10
}

pub(crate) const fn style_template_row() -> u32 {
    crate::DATA_START_ROW
}

pub(crate) fn duplicate_ignore() -> Vec<String> {
    vec!["N/A".to_string(), "Other Equipment".to_string()]
}

pub(crate) fn hidden_columns() -> Vec<Column> {
    columns(&[
        "B", "D", "E", "F", "G", "K", "L", "N", "P", "Q", "R", "S", "T", "U", "V", "W",
    ])
}

pub(crate) fn brand_new_blank_columns() -> Vec<Column> {
    columns(&["X", "Y", "Z", "AA"])
}

fn columns(names: &[&str]) -> Vec<Column> {
    names
        .iter()
        .filter_map(|name| Column::from_name(name).ok())
        .collect()
}
