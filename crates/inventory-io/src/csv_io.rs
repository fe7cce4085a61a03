use std::borrow::Cow;
use std::io::{self, Write};
use std::path::Path;

use csv::ByteRecord;
use encoding_rs::WINDOWS_1252;
use inventory_model::{CellValue, Column};

use crate::{
    atomic::atomic_write, ImportSource, OpenError, SaveError, SheetStore, SourceFormat, Workbook,
    Worksheet,
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read a CSV file into a single-sheet workbook.
///
/// Every non-empty field is kept as text: asset tags such as `000123` must
/// keep their leading zeros, and sequence codes are interpreted on demand.
pub(crate) fn read_csv_workbook(path: &Path) -> Result<Workbook, OpenError> {
    let bytes = std::fs::read(path).map_err(|err| OpenError::from_io(path, err))?;
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        // Spreadsheet exports routinely drop trailing empty fields.
        .flexible(true)
        .from_reader(bytes);

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "Sheet1".to_string());
    let mut sheet = Worksheet::new(name);

    let mut record = ByteRecord::new();
    let mut row: u32 = 0;
    loop {
        match reader.read_byte_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {}
            Err(err) => {
                return Err(OpenError::corrupt(
                    path,
                    format!("csv parse error at row {}: {err}", row + 1),
                ))
            }
        }
        row += 1;
        let sheet_row = sheet.append_row();
        debug_assert_eq!(sheet_row, row);
        for (idx, field) in record.iter().enumerate() {
            if field.is_empty() {
                continue;
            }
            let text = decode_field(field).into_owned();
            sheet.set_cell(row, Column::new(idx as u32 + 1), CellValue::String(text));
        }
    }

    Ok(Workbook {
        sheets: vec![sheet],
        source: Some(ImportSource {
            path: path.to_path_buf(),
            format: SourceFormat::Csv,
        }),
        package: None,
    })
}

/// Decode as UTF-8; fall back to Windows-1252 (common for Excel CSV exports on Windows).
fn decode_field(field: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(field) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(field);
            text
        }
    }
}

pub(crate) fn write_csv_sheet(sheet: &Worksheet, path: &Path) -> Result<(), SaveError> {
    atomic_write(path, |file| {
        let mut writer = csv::WriterBuilder::new()
            .flexible(false)
            .from_writer(io::BufWriter::new(file));
        let width = sheet.column_count().max(1);
        for row in 1..=sheet.row_count() {
            let record = (1..=width).map(|col| sheet.cell(row, Column::new(col)).to_text());
            writer
                .write_record(record.map(|text| text.into_owned()))
                .map_err(io::Error::from)?;
        }
        let mut inner = writer
            .into_inner()
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
        inner.flush()
    })
    .map_err(|err| SaveError::from_io(path, err))?;

    log::info!(
        "saved {} row(s) to `{}`",
        sheet.row_count(),
        path.display()
    );
    Ok(())
}
