//! Session summaries: counts per classification, itemized lines and the
//! duplicate report. Formatting only; every decision is made by the sessions.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::duplicates::DuplicateReport;
use crate::error::SessionWarning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    ScanIn,
    ScanOut,
    RosterImport,
}

impl RunMode {
    pub const fn title(self) -> &'static str {
        match self {
            RunMode::ScanIn => "Inventory Updated",
            RunMode::ScanOut => "Scan OUT Completed",
            RunMode::RosterImport => "Roster Import Completed",
        }
    }
}

/// Outcome class of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Scan matched an existing row for the first time this session.
    Found,
    /// Scan matched nothing; a row was appended.
    New,
    /// Scan repeated an identifier already resolved this session.
    Duplicate,
    /// Roster row matched an active row exactly.
    Unchanged,
    /// Roster row matched a pending-removal row.
    Rejoined,
    /// Roster row matched nothing; a row was appended.
    BrandNew,
    /// Active row absent from the roster, moved to pending-removal.
    RemovedByImport,
}

impl Classification {
    pub const fn heading(self) -> &'static str {
        match self {
            Classification::Found => "Found items",
            Classification::New => "New items added (50xxx)",
            Classification::Duplicate => "Duplicate entries added (51xxx)",
            Classification::Unchanged => "No-change matches (existing non-50xxx items)",
            Classification::Rejoined => {
                "Added items (matched existing 50xxx rows, including serial-only matches)"
            }
            Classification::BrandNew => "Brand new items (only in roster)",
            Classification::RemovedByImport => "Removed by roster (re-numbered to 50xxx)",
        }
    }

    /// Whether individual events of this class are listed in the summary.
    pub const fn is_itemized(self) -> bool {
        !matches!(self, Classification::Found | Classification::Unchanged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportItem {
    pub classification: Classification,
    pub line: String,
}

/// One row of the inventory as listed in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowSummary {
    pub row: u32,
    pub sequence: String,
    pub identifier: String,
    pub serial: String,
}

impl fmt::Display for RowSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Row {}: Asset {:?} / Serial {:?} (code {})",
            self.row, self.identifier, self.serial, self.sequence
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub mode: RunMode,
    pub date: NaiveDate,
    pub counts: BTreeMap<Classification, usize>,
    pub items: Vec<ReportItem>,
    /// Scan modes: distinct identifier keys scanned (found or new).
    pub scanned_unique: usize,
    /// Scan modes: data rows present when the session started.
    pub inventory_size: usize,
    /// Scan modes: rows present at start whose identifier was never scanned.
    pub not_scanned: Vec<RowSummary>,
    /// Scan-out: the location applied.
    pub location: Option<String>,
    pub duplicates: DuplicateReport,
    pub warnings: Vec<SessionWarning>,
}

impl SessionReport {
    pub fn count(&self, classification: Classification) -> usize {
        self.counts.get(&classification).copied().unwrap_or(0)
    }

    pub fn items_of(&self, classification: Classification) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .filter(move |item| item.classification == classification)
            .map(|item| item.line.as_str())
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} ---", self.mode.title())?;
        match self.mode {
            RunMode::ScanIn | RunMode::ScanOut => {
                if self.mode == RunMode::ScanOut {
                    writeln!(
                        f,
                        "Location used: {}",
                        self.location.as_deref().unwrap_or("(none)")
                    )?;
                }
                writeln!(f, "Unique items scanned: {}", self.scanned_unique)?;
                writeln!(f, "{}: {}", Classification::New.heading(), self.count(Classification::New))?;
                writeln!(
                    f,
                    "{}: {}",
                    Classification::Duplicate.heading(),
                    self.count(Classification::Duplicate)
                )?;
                writeln!(
                    f,
                    "Not scanned: {} of {}",
                    self.not_scanned.len(),
                    self.inventory_size
                )?;
            }
            RunMode::RosterImport => {
                for classification in [
                    Classification::Unchanged,
                    Classification::Rejoined,
                    Classification::BrandNew,
                    Classification::RemovedByImport,
                ] {
                    writeln!(f, "{}: {}", classification.heading(), self.count(classification))?;
                }
            }
        }

        for classification in self.counts.keys().copied().filter(|c| c.is_itemized()) {
            let mut lines = self.items_of(classification).peekable();
            if lines.peek().is_none() {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{}:", classification.heading())?;
            for line in lines {
                writeln!(f, "  • {line}")?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "  • {warning}")?;
            }
        }

        writeln!(f)?;
        if self.duplicates.is_empty() {
            writeln!(f, "No duplicate Asset IDs detected (by full Asset Id).")?;
        } else {
            writeln!(f, "⚠ Duplicate Asset IDs detected (by full Asset Id):")?;
            for group in &self.duplicates.groups {
                writeln!(f, "  • {}", group.to_string().replace('\n', "\n    "))?;
            }
        }
        Ok(())
    }
}

/// Accumulates classified events while a session runs.
#[derive(Debug, Clone)]
pub struct SessionReporter {
    mode: RunMode,
    date: NaiveDate,
    counts: BTreeMap<Classification, usize>,
    items: Vec<ReportItem>,
    warnings: Vec<SessionWarning>,
}

impl SessionReporter {
    pub fn new(mode: RunMode, date: NaiveDate) -> Self {
        Self {
            mode,
            date,
            counts: BTreeMap::new(),
            items: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn record(&mut self, classification: Classification, line: impl Into<String>) {
        *self.counts.entry(classification).or_insert(0) += 1;
        if classification.is_itemized() {
            self.items.push(ReportItem {
                classification,
                line: line.into(),
            });
        }
    }

    pub fn warn(&mut self, warning: SessionWarning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn count(&self, classification: Classification) -> usize {
        self.counts.get(&classification).copied().unwrap_or(0)
    }

    pub fn finish(self, scan: ScanTotals, duplicates: DuplicateReport) -> SessionReport {
        SessionReport {
            mode: self.mode,
            date: self.date,
            counts: self.counts,
            items: self.items,
            scanned_unique: scan.scanned_unique,
            inventory_size: scan.inventory_size,
            not_scanned: scan.not_scanned,
            location: scan.location,
            duplicates,
            warnings: self.warnings,
        }
    }
}

/// Scan-session figures that are not per-event counts.
#[derive(Debug, Clone, Default)]
pub struct ScanTotals {
    pub scanned_unique: usize,
    pub inventory_size: usize,
    pub not_scanned: Vec<RowSummary>,
    pub location: Option<String>,
}
