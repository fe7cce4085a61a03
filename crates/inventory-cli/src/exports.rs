//! CSV side files written after a scan session.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use inventory_reconcile::{RowSummary, ScanRecord};
use serde::Serialize;

pub const NOT_SCANNED_FILE: &str = "not_scanned.csv";
pub const NEW_ITEMS_FILE: &str = "new_items.csv";

#[derive(Debug, Serialize)]
struct NewItem<'a> {
    sequence: Option<i64>,
    identifier: &'a str,
    scanned: NaiveDate,
    location: Option<&'a str>,
}

/// Write `not_scanned.csv` and `new_items.csv` into `dir`, creating it if needed.
pub fn write_scan_exports(
    dir: &Path,
    not_scanned: &[RowSummary],
    new_items: &[ScanRecord],
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;

    let not_scanned_path = dir.join(NOT_SCANNED_FILE);
    write_records(&not_scanned_path, not_scanned)?;

    let new_items_path = dir.join(NEW_ITEMS_FILE);
    let new_items: Vec<NewItem<'_>> = new_items
        .iter()
        .map(|record| NewItem {
            sequence: record.sequence,
            identifier: &record.code,
            scanned: record.date,
            location: record.location.as_deref(),
        })
        .collect();
    write_records(&new_items_path, &new_items)?;

    log::info!(
        "exported {} not-scanned and {} new item row(s) to {}",
        not_scanned.len(),
        new_items.len(),
        dir.display()
    );
    Ok(vec![not_scanned_path, new_items_path])
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
