//! Roster import: reconcile the inventory against the authoritative roster.
//!
//! Every non-blank roster row takes the next import index as its sequence code.
//! Matched inventory rows are renumbered in place; unmatched roster rows are
//! appended. When the roster is exhausted, active inventory rows that no roster
//! row claimed move to the pending-removal band.

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use inventory_io::{InventoryStore, SheetStore};
use inventory_model::{
    Band, CellValue, Column, ImportLayout, InventoryConfig, SequenceCode, DATA_START_ROW,
};

use crate::allocator::BandAllocator;
use crate::duplicates::detect_duplicates;
use crate::error::ReconcileError;
use crate::finalize::{apply_hidden_columns, sort_by_sequence_code};
use crate::index::{IdentityKey, RowIndex};
use crate::normalize;
use crate::report::{Classification, RunMode, ScanTotals, SessionReport, SessionReporter};

/// One roster row, as full-width cell values starting at column `A`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportRow {
    cells: Vec<CellValue>,
}

impl ImportRow {
    pub fn from_cells(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Build a row from its identifier and serial plus the remaining columns.
    ///
    /// `other_columns` is laid out from column `A`; the identifier and serial
    /// are written over it at their layout positions.
    pub fn from_parts(
        layout: &ImportLayout,
        identifier: impl Into<CellValue>,
        serial: impl Into<CellValue>,
        other_columns: Vec<CellValue>,
    ) -> Self {
        let mut row = Self::from_cells(other_columns);
        row.set(layout.identifier, identifier.into());
        row.set(layout.serial, serial.into());
        row
    }

    pub fn from_sheet(sheet: &impl SheetStore, row: u32) -> Self {
        Self::from_cells(sheet.read_row(row).cells)
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    pub fn cell(&self, column: Column) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells.get(column.index() as usize - 1).unwrap_or(&EMPTY)
    }

    pub fn identifier(&self, layout: &ImportLayout) -> &CellValue {
        self.cell(layout.identifier)
    }

    pub fn serial(&self, layout: &ImportLayout) -> &CellValue {
        self.cell(layout.serial)
    }

    fn set(&mut self, column: Column, value: CellValue) {
        let idx = column.index() as usize - 1;
        if self.cells.len() <= idx {
            self.cells.resize(idx + 1, CellValue::Empty);
        }
        self.cells[idx] = value;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Both keys absent; no import index was consumed.
    Skipped,
    /// Matched an active inventory row exactly.
    Unchanged { import_index: SequenceCode, row: u32 },
    /// Matched a pending-removal row, by identity or by serial alone.
    Rejoined {
        import_index: SequenceCode,
        row: u32,
        previous: Option<SequenceCode>,
        identifier: String,
        serial: String,
        via_serial: bool,
    },
    /// No match; a row was appended.
    BrandNew {
        import_index: SequenceCode,
        row: u32,
        identifier: String,
        serial: String,
    },
}

impl ImportOutcome {
    pub fn classification(&self) -> Option<Classification> {
        match self {
            ImportOutcome::Skipped => None,
            ImportOutcome::Unchanged { .. } => Some(Classification::Unchanged),
            ImportOutcome::Rejoined { .. } => Some(Classification::Rejoined),
            ImportOutcome::BrandNew { .. } => Some(Classification::BrandNew),
        }
    }

    pub fn import_index(&self) -> Option<SequenceCode> {
        match self {
            ImportOutcome::Skipped => None,
            ImportOutcome::Unchanged { import_index, .. }
            | ImportOutcome::Rejoined { import_index, .. }
            | ImportOutcome::BrandNew { import_index, .. } => Some(*import_index),
        }
    }
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportOutcome::Skipped => f.write_str("blank roster row skipped"),
            ImportOutcome::Unchanged { import_index, row } => {
                write!(f, "Row {row}: unchanged, now {import_index}")
            }
            ImportOutcome::Rejoined {
                import_index,
                row,
                previous,
                identifier,
                serial,
                via_serial,
            } => {
                let previous = previous.map_or_else(|| "?".to_string(), |c| c.to_string());
                if *via_serial {
                    write!(
                        f,
                        "Row {row}: Serial-only match, Asset set to {identifier:?}, Serial {serial:?} (was {previous}, now {import_index})"
                    )
                } else {
                    write!(
                        f,
                        "Row {row}: Asset {identifier:?} / Serial {serial:?} (was {previous}, now {import_index})"
                    )
                }
            }
            ImportOutcome::BrandNew {
                import_index,
                row,
                identifier,
                serial,
            } => write!(
                f,
                "Row {row}: Asset {identifier:?} / Serial {serial:?} (code {import_index})"
            ),
        }
    }
}

/// State of one roster import over the store's current sheet.
pub struct RosterImport<'a, S: InventoryStore> {
    store: &'a mut S,
    config: &'a InventoryConfig,
    index: RowIndex,
    /// Inventory rows claimed by a roster row.
    matched: HashSet<u32>,
    removals: BandAllocator,
    /// Width of the inventory sheet when the import began.
    existing_column_count: u32,
    last_import_index: SequenceCode,
    reporter: SessionReporter,
}

impl<'a, S: InventoryStore> RosterImport<'a, S> {
    pub fn begin(store: &'a mut S, config: &'a InventoryConfig, today: NaiveDate) -> Self {
        let sheet = store.sheet();
        let index = RowIndex::build(sheet, &config.layout, config.key_width);
        let existing_column_count = sheet.column_count();
        let removals = BandAllocator::gap_filling(Band::PendingRemoval, index.original_codes());

        log::info!(
            "roster import started over {} inventory row(s), {} column(s)",
            index.original_row_count().saturating_sub(DATA_START_ROW - 1),
            existing_column_count
        );

        Self {
            store,
            config,
            index,
            matched: HashSet::new(),
            removals,
            existing_column_count,
            last_import_index: 0,
            reporter: SessionReporter::new(RunMode::RosterImport, today),
        }
    }

    /// Reconcile one roster row against the inventory.
    pub fn submit_import_row(&mut self, row: &ImportRow) -> Result<ImportOutcome, ReconcileError> {
        let import_layout = &self.config.import_layout;
        let identifier_value = row.identifier(import_layout).clone();
        let identifier = identifier_value.to_text().trim().to_string();
        let serial = row.serial(import_layout).to_text().trim().to_string();

        let identifier_key = normalize::strict_suffix_key(&identifier, self.config.key_width);
        let serial_key = normalize::serial_key(&serial);
        let Some(identity) = IdentityKey::new(identifier_key, serial_key.clone()) else {
            log::debug!("skipping blank roster row");
            return Ok(ImportOutcome::Skipped);
        };

        let import_index = self.next_import_index()?;
        let config = self.config;
        let layout = &config.layout;

        let outcome = if let Some(existing) = self.index.identity_row(&identity) {
            let previous = self.index.original_code(existing);
            self.store
                .sheet_mut()
                .set_cell(existing, layout.sequence, import_index.into());
            self.matched.insert(existing);
            if previous.is_some_and(|code| Band::PendingRemoval.contains(code)) {
                ImportOutcome::Rejoined {
                    import_index,
                    row: existing,
                    previous,
                    identifier,
                    serial,
                    via_serial: false,
                }
            } else {
                ImportOutcome::Unchanged {
                    import_index,
                    row: existing,
                }
            }
        } else if let Some(existing) = serial_key
            .as_ref()
            .and_then(|serial| self.index.pending_serial_row(serial))
        {
            let previous = self.index.original_code(existing);
            let sheet = self.store.sheet_mut();
            sheet.set_cell(existing, layout.sequence, import_index.into());
            sheet.set_cell(existing, layout.identifier, identifier_value);
            self.matched.insert(existing);
            ImportOutcome::Rejoined {
                import_index,
                row: existing,
                previous,
                identifier,
                serial,
                via_serial: true,
            }
        } else {
            let appended = self.append_brand_new(row, import_index);
            ImportOutcome::BrandNew {
                import_index,
                row: appended,
                identifier,
                serial,
            }
        };

        log::debug!("{outcome}");
        if let Some(classification) = outcome.classification() {
            self.reporter.record(classification, outcome.to_string());
        }
        Ok(outcome)
    }

    /// Submit every data row of a roster sheet in order.
    pub fn import_sheet(
        &mut self,
        roster: &impl SheetStore,
    ) -> Result<Vec<ImportOutcome>, ReconcileError> {
        (DATA_START_ROW..=roster.row_count())
            .map(|row| self.submit_import_row(&ImportRow::from_sheet(roster, row)))
            .collect()
    }

    fn next_import_index(&mut self) -> Result<SequenceCode, ReconcileError> {
        let next = self.last_import_index + 1;
        if !Band::Active.contains(next) {
            return Err(ReconcileError::Internal(format!(
                "roster has more rows than the active band holds ({next})"
            )));
        }
        self.last_import_index = next;
        Ok(next)
    }

    /// Append a roster row shifted one column right, so roster column `c`
    /// lands in inventory column `c + 1` and column `A` holds the import index.
    fn append_brand_new(&mut self, row: &ImportRow, import_index: SequenceCode) -> u32 {
        let config = self.config;
        let width = self.existing_column_count;
        let columns: Vec<Column> = (1..=width).map(Column::new).collect();

        let sheet = self.store.sheet_mut();
        let dest = sheet.append_row();
        for &column in &columns {
            sheet.set_cell(dest, column, CellValue::Empty);
        }
        sheet.copy_row_style(config.style_template_row, dest, &columns);

        let copied = (row.cells().len() as u32).min(width.saturating_sub(1));
        let roster_columns = (1..).map(Column::new);
        for (column, value) in roster_columns.zip(row.cells().iter().take(copied as usize)) {
            sheet.set_cell(dest, column.shifted(1), value.clone());
        }
        for &column in &config.brand_new_blank_columns {
            if column.index() <= width {
                sheet.set_cell(dest, column, CellValue::Empty);
            }
        }
        sheet.set_cell(dest, config.layout.sequence, import_index.into());
        dest
    }

    /// Move unclaimed active rows to pending-removal, then sort, save and
    /// summarize. A failed save commits nothing.
    pub fn finish(mut self) -> Result<SessionReport, ReconcileError> {
        let config = self.config;
        let layout = &config.layout;

        let sheet = self.store.sheet_mut();
        for row in DATA_START_ROW..=self.index.original_row_count() {
            if self.matched.contains(&row) {
                continue;
            }
            let Some(code) = sheet.cell(row, layout.sequence).as_integer() else {
                continue;
            };
            if Band::of(code) != Some(Band::Active) {
                continue;
            }

            let renumbered = self.removals.allocate()?;
            sheet.set_cell(row, layout.sequence, renumbered.into());
            let line = format!(
                "Row {row}: Asset {:?} / Serial {:?} -> {renumbered}",
                sheet.cell(row, layout.identifier).to_text().trim(),
                sheet.cell(row, layout.serial).to_text().trim()
            );
            log::debug!("{line}");
            self.reporter.record(Classification::RemovedByImport, line);
        }

        sort_by_sequence_code(sheet, layout);
        apply_hidden_columns(sheet, &config.hidden_columns, config.style_template_row);
        let duplicates = detect_duplicates(&*sheet, layout, &config.duplicate_ignore);

        self.store.save().map_err(ReconcileError::PersistFailure)?;
        log::info!(
            "roster import committed: {} roster row(s), {} unchanged, {} rejoined, {} brand new, {} removed",
            self.last_import_index,
            self.reporter.count(Classification::Unchanged),
            self.reporter.count(Classification::Rejoined),
            self.reporter.count(Classification::BrandNew),
            self.reporter.count(Classification::RemovedByImport)
        );

        Ok(self.reporter.finish(ScanTotals::default(), duplicates))
    }

    /// End the import without saving. The store's working sheet still holds
    /// the import's edits and must be discarded by the caller.
    pub fn abandon(self) {
        log::info!("roster import abandoned; no changes committed");
    }
}
