mod common;

use common::{codes_and_assets, InventorySheet, ASSET, NAME, TEMPLATE_STYLE};
use inventory_io::{SheetStore, Worksheet};
use inventory_model::{CellValue, Column, SheetLayout};
use inventory_reconcile::detect_duplicates;
use inventory_reconcile::finalize::{apply_hidden_columns, sort_by_sequence_code};
use pretty_assertions::assert_eq;

fn default_ignore() -> Vec<String> {
    vec!["N/A".to_string(), "Other Equipment".to_string()]
}

#[test]
fn sort_moves_whole_rows_and_puts_non_integer_codes_last() {
    let mut sheet = InventorySheet::new()
        .row(50001, "C", "")
        .row("", "BLANK-1", "")
        .row(3, "A", "")
        .row("x", "TEXT", "")
        .row(2.5, "FRACTION", "")
        .row(51000, "D", "")
        .row(1, "B", "")
        .build();

    assert!(sort_by_sequence_code(&mut sheet, &SheetLayout::default()));
    assert_eq!(
        codes_and_assets(&sheet),
        vec![
            ("1".to_string(), "B".to_string()),
            ("3".to_string(), "A".to_string()),
            ("50001".to_string(), "C".to_string()),
            ("51000".to_string(), "D".to_string()),
            ("".to_string(), "BLANK-1".to_string()),
            ("x".to_string(), "TEXT".to_string()),
            ("2.5".to_string(), "FRACTION".to_string()),
        ]
    );
    // Display columns travel with their row.
    assert_eq!(sheet.cell(2, NAME), &CellValue::from("item 8"));
}

#[test]
fn sorting_sorted_rows_changes_nothing() {
    let mut sheet = InventorySheet::new().row(1, "A", "").row(2, "B", "").build();
    assert!(!sort_by_sequence_code(&mut sheet, &SheetLayout::default()));
}

#[test]
fn hidden_columns_get_the_template_style() {
    let mut sheet = InventorySheet::new()
        .row(1, "A", "")
        .row(2, "B", "")
        .build();
    let hidden = [Column::new(2), Column::new(4), Column::new(40)];
    apply_hidden_columns(&mut sheet, &hidden, 2);

    assert!(sheet.is_column_hidden(Column::new(2)));
    assert!(sheet.is_column_hidden(Column::new(4)));
    assert!(!sheet.is_column_hidden(Column::new(40)));
    assert!(!sheet.is_column_hidden(ASSET));
    assert_eq!(sheet.style(3, Column::new(2)), Some(TEMPLATE_STYLE));
    assert_eq!(sheet.style(3, ASSET), None);
}

#[test]
fn repeated_identifiers_form_one_group() {
    let sheet = InventorySheet::new()
        .row(1, "X-1", "")
        .row(2, "", "")
        .row(3, " x-1 ", "")
        .row(4, "Y-2", "")
        .build();

    let report = detect_duplicates(&sheet, &SheetLayout::default(), &default_ignore());
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].identifier, "X-1");
    assert_eq!(report.groups[0].rows, vec![2, 4]);
}

#[test]
fn placeholders_and_blanks_are_never_duplicates() {
    let sheet = InventorySheet::new()
        .row(1, "n/a", "")
        .row(2, "N/A", "")
        .row(3, "other equipment", "")
        .row(4, "OTHER EQUIPMENT", "")
        .row(5, "", "")
        .row(6, "", "")
        .build();

    let report = detect_duplicates(&sheet, &SheetLayout::default(), &default_ignore());
    assert!(report.is_empty(), "{report:?}");
}

#[test]
fn tags_sharing_a_numeric_suffix_are_distinct() {
    let sheet = InventorySheet::new()
        .row(1, "AB-100", "")
        .row(2, "CD-100", "")
        .build();
    assert!(detect_duplicates(&sheet, &SheetLayout::default(), &default_ignore()).is_empty());
}

#[test]
fn groups_follow_first_appearance() {
    let mut sheet = Worksheet::new("S");
    sheet.set_cell(1, ASSET, "Asset Id".into());
    for (row, asset) in [(2, "B"), (3, "A"), (4, "A"), (5, "B")] {
        sheet.set_cell(row, ASSET, asset.into());
    }

    let report = detect_duplicates(&sheet, &SheetLayout::default(), &[]);
    let identifiers: Vec<&str> = report.groups.iter().map(|g| g.identifier.as_str()).collect();
    assert_eq!(identifiers, vec!["B", "A"]);
    assert_eq!(
        report.groups[0].to_string(),
        "Asset ID 'B' appears in 2 rows:\n    row 2\n    row 5"
    );
}
