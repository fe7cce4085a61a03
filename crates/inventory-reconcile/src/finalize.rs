//! End-of-run stages shared by every mode: ordering rows by sequence code and
//! the presentation pass over hidden columns.

use inventory_io::SheetStore;
use inventory_model::{Column, SheetLayout, DATA_START_ROW};

/// Reorder data rows ascending by sequence code.
///
/// Rows whose code is not an integer (blank, text, fractions) go last, keeping
/// their relative order. Whole rows move, every column included; styles stay
/// where they are. Returns whether any row changed position.
pub fn sort_by_sequence_code(sheet: &mut impl SheetStore, layout: &SheetLayout) -> bool {
    let rows = sheet.data_rows();
    let mut sorted = rows.clone();
    // `sort_by_key` is stable.
    sorted.sort_by_key(|row| match row.sequence_code(layout) {
        Some(code) => (0u8, code),
        None => (1u8, 0),
    });

    let mut changed = false;
    for (offset, row) in sorted.iter().enumerate() {
        let position = DATA_START_ROW + offset as u32;
        if row.position != position {
            changed = true;
        }
        sheet.write_row(position, &row.cells);
    }
    changed
}

/// Copy the template row's style down every data row of each hidden column,
/// then hide the column. Columns beyond the used area are skipped.
pub fn apply_hidden_columns(sheet: &mut impl SheetStore, columns: &[Column], template_row: u32) {
    let column_count = sheet.column_count();
    for &column in columns {
        if column.index() > column_count {
            continue;
        }
        for row in DATA_START_ROW..=sheet.row_count() {
            if row != template_row {
                sheet.copy_row_style(template_row, row, &[column]);
            }
        }
        sheet.hide_column(column);
    }
}
