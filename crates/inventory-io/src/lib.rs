//! Spreadsheet store used by the inventory reconciliation engine.
//!
//! The engine only ever talks to the [`SheetStore`] and [`InventoryStore`]
//! traits. This crate provides:
//! - [`Worksheet`], a dense in-memory grid with per-cell style ids and hidden columns
//! - `.csv` load/save
//! - loading of `.xlsx`/`.xlsm`/`.xlsb`/`.xls`/`.ods` through `calamine`
//! - in-place `.xlsx`/`.xlsm` saves that patch the original package
//! - atomic saves: a failed save never leaves a partially written file behind

mod atomic;
mod csv_io;
mod error;
mod sheet;
mod spreadsheet;
mod store;
mod workbook;
mod xlsx;

use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

pub use error::{OpenError, SaveError};
pub use sheet::{SheetStore, StyleId, Worksheet};
pub use store::{InventoryStore, MemoryStore, OpenedWorkbook};
pub use workbook::{ImportSource, SourceFormat, Workbook};

use xlsx::XlsxPackage;

/// Open a workbook from disk, dispatching on the file extension.
pub fn open_workbook(path: impl AsRef<Path>) -> Result<Workbook, OpenError> {
    let path = path.as_ref();
    let format = SourceFormat::from_path(path).ok_or_else(|| OpenError::Unsupported {
        path: path.to_path_buf(),
        extension: path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default(),
    })?;

    if let Err(err) = std::fs::metadata(path) {
        return Err(OpenError::from_io(path, err));
    }

    let workbook = match format {
        SourceFormat::Csv => csv_io::read_csv_workbook(path)?,
        SourceFormat::Xlsx | SourceFormat::Xlsm => {
            let mut workbook = spreadsheet::read_spreadsheet(path, format)?;
            let package =
                XlsxPackage::read(path, format).map_err(|err| OpenError::corrupt(path, err))?;
            if let Some(sheet) = workbook.first_sheet_mut() {
                package
                    .apply_formatting(sheet)
                    .map_err(|err| OpenError::corrupt(path, err))?;
            }
            workbook.package = Some(package);
            workbook
        }
        other => spreadsheet::read_spreadsheet(path, other)?,
    };
    log::debug!(
        "opened `{}` ({}) with {} sheet(s)",
        path.display(),
        format.label(),
        workbook.sheets.len()
    );
    Ok(workbook)
}

/// Save the first sheet of `workbook` to `path`, atomically.
///
/// The destination extension picks the format:
/// - `.csv` writes the first sheet's values
/// - `.xlsx`/`.xlsm` patch the package the workbook was opened from, keeping
///   every other part; without one, `.xlsx` gets a fresh single-sheet package
///
/// Legacy and OpenDocument containers cannot be written.
pub fn save_workbook(workbook: &Workbook, path: impl AsRef<Path>) -> Result<(), SaveError> {
    let path = path.as_ref();
    let format = SourceFormat::from_path(path).ok_or_else(|| SaveError::UnsupportedExtension {
        path: path.to_path_buf(),
    })?;
    let sheet = workbook.first_sheet().ok_or(SaveError::NoSheets)?;

    match format {
        SourceFormat::Csv => {
            if workbook.sheets.len() > 1 {
                log::warn!(
                    "only the first sheet (`{}`) is saved to `{}`; {} other sheet(s) dropped",
                    sheet.name(),
                    path.display(),
                    workbook.sheets.len() - 1
                );
            }
            csv_io::write_csv_sheet(sheet, path)
        }
        SourceFormat::Xlsx | SourceFormat::Xlsm => {
            let package = match &workbook.package {
                Some(package) if package.format() == format => Cow::Borrowed(package),
                // A macro-enabled package needs macros to come from somewhere.
                _ if format == SourceFormat::Xlsm => {
                    return Err(SaveError::ReadOnlyFormat {
                        path: path.to_path_buf(),
                        format,
                    })
                }
                existing => {
                    if existing.is_some() || workbook.sheets.len() > 1 {
                        log::warn!(
                            "`{}` is written as a new single-sheet package; other sheets and parts are dropped",
                            path.display()
                        );
                    }
                    let blank = XlsxPackage::blank(sheet.name())
                        .map_err(|err| SaveError::package(path, err))?;
                    Cow::Owned(blank)
                }
            };
            let bytes = package
                .with_sheet(sheet)
                .map_err(|err| SaveError::package(path, err))?;
            atomic::atomic_write(path, |file| file.write_all(&bytes))
                .map_err(|err| SaveError::from_io(path, err))?;
            log::info!(
                "saved {} row(s) to `{}`",
                sheet.row_count(),
                path.display()
            );
            Ok(())
        }
        SourceFormat::Xlsb | SourceFormat::Xls | SourceFormat::Ods => {
            Err(SaveError::ReadOnlyFormat {
                path: path.to_path_buf(),
                format,
            })
        }
    }
}
