//! Cell values of spreadsheet containers, loaded through `calamine`.
//!
//! Formulas and merged regions are not needed by the inventory tools. Styles
//! and hidden columns of `.xlsx`/`.xlsm` sheets are read from the package
//! itself (see `xlsx`).

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use inventory_model::{CellValue, Column};

use crate::{ImportSource, OpenError, SheetStore, SourceFormat, Workbook, Worksheet};

pub(crate) fn read_spreadsheet(path: &Path, format: SourceFormat) -> Result<Workbook, OpenError> {
    let mut workbook = open_workbook_auto(path).map_err(|err| OpenError::corrupt(path, err))?;
    let sheet_names = workbook.sheet_names().to_owned();
    if sheet_names.is_empty() {
        return Err(OpenError::NoSheets {
            path: path.to_path_buf(),
        });
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in sheet_names {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|err| OpenError::corrupt(path, format!("sheet `{sheet_name}`: {err}")))?;
        let range_start = range.start().unwrap_or((0, 0));

        let mut sheet = Worksheet::new(sheet_name.clone());
        for (row, col, value) in range.used_cells() {
            let Some((row, col)) = to_position(range_start, row, col) else {
                log::warn!(
                    "skipping out-of-bounds cell in sheet `{sheet_name}` at ({row},{col})"
                );
                continue;
            };
            let Some(value) = convert_value(value) else {
                continue;
            };
            sheet.set_cell(row, Column::new(col), value);
        }
        sheets.push(sheet);
    }

    Ok(Workbook {
        sheets,
        source: Some(ImportSource {
            path: path.to_path_buf(),
            format,
        }),
        package: None,
    })
}

/// 1-based sheet position of a used cell.
fn to_position(start: (u32, u32), row: usize, col: usize) -> Option<(u32, u32)> {
    // NOTE: calamine `Range` iterators return coordinates relative to `range.start()`
    // rather than absolute worksheet coordinates.
    let row: u32 = row.try_into().ok()?;
    let col: u32 = col.try_into().ok()?;
    let row = start.0.checked_add(row)?.checked_add(1)?;
    let col = start.1.checked_add(col)?.checked_add(1)?;
    Some((row, col))
}

fn convert_value(value: &Data) -> Option<CellValue> {
    match value {
        Data::Empty => None,
        Data::Bool(v) => Some(CellValue::Boolean(*v)),
        Data::Int(v) => Some(CellValue::Number(*v as f64)),
        Data::Float(v) => Some(CellValue::Number(*v)),
        Data::String(v) if v.is_empty() => None,
        Data::String(v) => Some(CellValue::String(v.clone())),
        Data::Error(e) => Some(CellValue::String(e.to_string())),
        Data::DateTime(v) => Some(match v.as_datetime() {
            Some(dt) => CellValue::Date(dt.date()),
            None => CellValue::Number(v.as_f64()),
        }),
        Data::DateTimeIso(v) => Some(CellValue::String(v.clone())),
        Data::DurationIso(v) => Some(CellValue::String(v.clone())),
    }
}
