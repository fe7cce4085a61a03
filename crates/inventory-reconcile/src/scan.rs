//! Interactive scan sessions ("scan in" and "scan out").
//!
//! A session is a synchronous request/response loop: the caller submits one
//! scanned code at a time and receives its outcome, then calls
//! [`ScanSession::finish`] to sort, save and summarize, or
//! [`ScanSession::abandon`] to drop every change.

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use inventory_io::{InventoryStore, SheetStore};
use inventory_model::{
    Band, CellValue, Disposition, InventoryConfig, SequenceCode, DATA_START_ROW, HEADER_ROW,
};

use crate::allocator::BandAllocator;
use crate::duplicates::detect_duplicates;
use crate::error::{InputError, ReconcileError, SessionWarning};
use crate::finalize::{apply_hidden_columns, sort_by_sequence_code};
use crate::index::RowIndex;
use crate::location::{existing_locations, normalize_location};
use crate::normalize::{self, NormalizedKey};
use crate::report::{Classification, RowSummary, RunMode, ScanTotals, SessionReport, SessionReporter};

/// Code that ends a session when scanned or typed (case-insensitive).
pub const FINISH_SENTINEL: &str = "done";

pub fn is_finish_sentinel(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(FINISH_SENTINEL)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Stamp scanned items as seen today.
    ScanIn,
    /// Additionally mark scanned items `Out` at a location.
    ScanOut,
}

impl ScanMode {
    pub const fn run_mode(self) -> RunMode {
        match self {
            ScanMode::ScanIn => RunMode::ScanIn,
            ScanMode::ScanOut => RunMode::ScanOut,
        }
    }
}

/// What a classified scan did to the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    /// The code as scanned (trimmed).
    pub code: String,
    /// Sheet row written, before the final sort.
    pub row: u32,
    /// Code given to an appended row.
    pub sequence: Option<SequenceCode>,
    pub date: NaiveDate,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Blank input.
    Ignored,
    /// The finish sentinel was scanned; the caller should call `finish`.
    FinishRequested,
    Found(ScanRecord),
    New(ScanRecord),
    Duplicate(ScanRecord),
    /// Known identifier without a row on record; nothing was written.
    Unlocatable { code: String },
}

impl ScanOutcome {
    pub fn classification(&self) -> Option<Classification> {
        match self {
            ScanOutcome::Found(_) => Some(Classification::Found),
            ScanOutcome::New(_) => Some(Classification::New),
            ScanOutcome::Duplicate(_) => Some(Classification::Duplicate),
            _ => None,
        }
    }

    pub fn record(&self) -> Option<&ScanRecord> {
        match self {
            ScanOutcome::Found(r) | ScanOutcome::New(r) | ScanOutcome::Duplicate(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (marker, record) = match self {
            ScanOutcome::Ignored => return Ok(()),
            ScanOutcome::FinishRequested => return f.write_str("finishing session"),
            ScanOutcome::Unlocatable { code } => {
                return write!(f, "[?] {code} found in inventory set, but row could not be located.")
            }
            ScanOutcome::Found(r) => ("✓", r),
            ScanOutcome::New(r) => ("X", r),
            ScanOutcome::Duplicate(r) => ("!", r),
        };

        write!(f, "[{marker}] {} ", record.code)?;
        match self {
            ScanOutcome::Found(_) => write!(f, "found in inventory. Row {}", record.row)?,
            ScanOutcome::New(_) => write!(f, "NOT found in inventory. Added row {}", record.row)?,
            _ => write!(f, "duplicate ID. Added row {}", record.row)?,
        }
        if let Some(sequence) = record.sequence {
            write!(f, " with code {sequence}")?;
        }
        write!(f, ", scanned {}", record.date)?;
        if let Some(location) = &record.location {
            write!(f, ", location '{location}', status Out")?;
        }
        f.write_str(".")
    }
}

/// State of one scan session: the store it writes, the row index built at
/// start, the identifiers scanned so far and the two append streams.
pub struct ScanSession<'a, S: InventoryStore> {
    store: &'a mut S,
    config: &'a InventoryConfig,
    mode: ScanMode,
    today: NaiveDate,
    location: Option<String>,
    index: RowIndex,
    scanned: HashSet<NormalizedKey>,
    new_items: BandAllocator,
    duplicates: BandAllocator,
    reporter: SessionReporter,
}

impl<'a, S: InventoryStore> ScanSession<'a, S> {
    /// Start a session over the store's current sheet.
    pub fn begin(
        store: &'a mut S,
        config: &'a InventoryConfig,
        mode: ScanMode,
        today: NaiveDate,
    ) -> Result<Self, ReconcileError> {
        check_identifier_header(store.sheet(), config)?;

        let index = RowIndex::build(store.sheet(), &config.layout, config.key_width);
        let codes: Vec<SequenceCode> = index.original_codes().collect();
        let new_items = BandAllocator::high_water(Band::PendingRemoval, codes.iter().copied());
        let duplicates = BandAllocator::high_water(Band::DuplicateFlag, codes);

        log::info!(
            "{:?} session started over {} data row(s)",
            mode,
            index.original_row_count().saturating_sub(HEADER_ROW)
        );

        Ok(Self {
            store,
            config,
            mode,
            today,
            location: None,
            index,
            scanned: HashSet::new(),
            new_items,
            duplicates,
            reporter: SessionReporter::new(mode.run_mode(), today),
        })
    }

    /// Set the scan-out location; the scope tag is prefixed when missing.
    ///
    /// A blank location clears it and is rejected with
    /// [`ReconcileError::LocationRequired`].
    pub fn set_location(&mut self, raw: &str) -> Result<&str, ReconcileError> {
        let location = normalize_location(raw, &self.config.location_tag);
        if location.is_empty() {
            self.location = None;
            return Err(ReconcileError::LocationRequired);
        }
        Ok(self.location.insert(location).as_str())
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Tagged locations already used in the sheet, for the caller to offer.
    pub fn known_locations(&self) -> Vec<String> {
        existing_locations(self.store.sheet(), &self.config.layout, &self.config.location_tag)
    }

    /// Whether `key` was scanned (or added) in this session.
    pub fn has_scanned(&self, key: &NormalizedKey) -> bool {
        self.scanned.contains(key)
    }

    /// Classify one scanned code and apply it to the sheet.
    pub fn submit_event(&mut self, code: &str) -> Result<ScanOutcome, ReconcileError> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(ScanOutcome::Ignored);
        }

        let location = match self.mode {
            ScanMode::ScanIn => None,
            ScanMode::ScanOut => match &self.location {
                Some(location) => Some(location.clone()),
                None => return Err(ReconcileError::LocationRequired),
            },
        };

        if is_finish_sentinel(code) {
            return Ok(ScanOutcome::FinishRequested);
        }

        let key = normalize::strict_suffix_key(code, self.config.key_width);
        let outcome = match key {
            Some(key) if self.index.contains_identifier(&key) => {
                if self.scanned.contains(&key) {
                    self.append_duplicate(code, location)?
                } else {
                    self.scanned.insert(key.clone());
                    match self.index.identifier_row(&key) {
                        Some(row) => self.stamp_found(code, row, location),
                        None => {
                            self.reporter.warn(SessionWarning::UnlocatableRow {
                                code: code.to_string(),
                            });
                            ScanOutcome::Unlocatable {
                                code: code.to_string(),
                            }
                        }
                    }
                }
            }
            key => self.append_new(code, key, location)?,
        };

        log::debug!("{outcome}");
        if let Some(classification) = outcome.classification() {
            self.reporter.record(classification, outcome.to_string());
        }
        Ok(outcome)
    }

    fn stamp_found(&mut self, code: &str, row: u32, location: Option<String>) -> ScanOutcome {
        self.write_stamp(row, location.as_deref());
        ScanOutcome::Found(ScanRecord {
            code: code.to_string(),
            row,
            sequence: None,
            date: self.today,
            location,
        })
    }

    fn append_new(
        &mut self,
        code: &str,
        key: Option<NormalizedKey>,
        location: Option<String>,
    ) -> Result<ScanOutcome, ReconcileError> {
        let sequence = self.new_items.allocate()?;
        let row = self.append_row(code, sequence, location.as_deref());
        match key {
            Some(key) => {
                self.index.track_identifier(key.clone(), row);
                self.scanned.insert(key);
            }
            None => self.reporter.warn(SessionWarning::UnmatchableCode {
                code: code.to_string(),
            }),
        }
        Ok(ScanOutcome::New(ScanRecord {
            code: code.to_string(),
            row,
            sequence: Some(sequence),
            date: self.today,
            location,
        }))
    }

    fn append_duplicate(
        &mut self,
        code: &str,
        location: Option<String>,
    ) -> Result<ScanOutcome, ReconcileError> {
        let sequence = self.duplicates.allocate()?;
        let row = self.append_row(code, sequence, location.as_deref());
        Ok(ScanOutcome::Duplicate(ScanRecord {
            code: code.to_string(),
            row,
            sequence: Some(sequence),
            date: self.today,
            location,
        }))
    }

    fn append_row(&mut self, code: &str, sequence: SequenceCode, location: Option<&str>) -> u32 {
        let config = self.config;
        let layout = &config.layout;
        let columns = match self.mode {
            ScanMode::ScanIn => layout.scan_in_columns(),
            ScanMode::ScanOut => layout.scan_out_columns(),
        };

        let sheet = self.store.sheet_mut();
        let row = sheet.append_row();
        sheet.copy_row_style(config.style_template_row, row, &columns);
        sheet.set_cell(row, layout.sequence, sequence.into());
        sheet.set_cell(row, layout.identifier, code.into());
        self.write_stamp(row, location);
        row
    }

    fn write_stamp(&mut self, row: u32, location: Option<&str>) {
        let layout = &self.config.layout;
        let today = self.today;
        let sheet = self.store.sheet_mut();
        sheet.set_cell(row, layout.last_scanned, CellValue::Date(today));
        sheet.set_cell(row, layout.last_verified, CellValue::Date(today));
        if let Some(location) = location {
            sheet.set_cell(row, layout.status, Disposition::Out.into());
            sheet.set_cell(row, layout.location, location.into());
        }
    }

    /// Rows present at session start whose identifier was never scanned.
    fn not_scanned(&self) -> Vec<RowSummary> {
        let layout = &self.config.layout;
        let sheet = self.store.sheet();
        (DATA_START_ROW..=self.index.original_row_count())
            .filter_map(|row| {
                let snapshot = sheet.read_row(row);
                let identifier = snapshot.identifier(layout);
                let key = normalize::strict_suffix_key(&identifier, self.config.key_width);
                if key.is_some_and(|key| self.scanned.contains(&key)) {
                    return None;
                }
                Some(RowSummary {
                    row,
                    sequence: snapshot.cell(layout.sequence).to_text().into_owned(),
                    serial: snapshot.serial(layout),
                    identifier,
                })
            })
            .collect()
    }

    /// Sort, save and summarize. A failed save commits nothing.
    pub fn finish(self) -> Result<SessionReport, ReconcileError> {
        let config = self.config;
        let layout = &config.layout;
        let not_scanned = self.not_scanned();
        let totals = ScanTotals {
            scanned_unique: self.scanned.len(),
            inventory_size: self
                .index
                .original_row_count()
                .saturating_sub(HEADER_ROW) as usize,
            not_scanned,
            location: self.location.clone(),
        };

        let sheet = self.store.sheet_mut();
        sort_by_sequence_code(sheet, layout);
        apply_hidden_columns(sheet, &config.hidden_columns, config.style_template_row);
        let duplicates = detect_duplicates(&*sheet, layout, &config.duplicate_ignore);

        self.store.save().map_err(ReconcileError::PersistFailure)?;
        log::info!(
            "{:?} session committed: {} unique scanned, {} new, {} duplicate",
            self.mode,
            totals.scanned_unique,
            self.reporter.count(Classification::New),
            self.reporter.count(Classification::Duplicate)
        );

        Ok(self.reporter.finish(totals, duplicates))
    }

    /// End the session without saving. The store's working sheet still holds
    /// the session's edits and must be discarded by the caller.
    pub fn abandon(self) {
        log::info!("{:?} session abandoned; no changes committed", self.mode);
    }
}

fn check_identifier_header(
    sheet: &impl SheetStore,
    config: &InventoryConfig,
) -> Result<(), ReconcileError> {
    let Some(expected) = &config.identifier_header else {
        return Ok(());
    };
    let column = config.layout.identifier;
    let found = sheet.cell(HEADER_ROW, column).to_text();
    if found.trim().eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(InputError::MissingColumn {
            column,
            expected: expected.clone(),
            found: found.into_owned(),
        }
        .into())
    }
}
