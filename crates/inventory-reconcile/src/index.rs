//! Lookup structures over the sheet snapshot taken at the start of a run.
//!
//! The index is built once per run. Rows appended during the run are recorded
//! through [`RowIndex::track_identifier`]; the sheet is never re-scanned.

use std::collections::{HashMap, HashSet};

use inventory_io::SheetStore;
use inventory_model::{Band, SequenceCode, SheetLayout, DATA_START_ROW};

use crate::normalize::{self, NormalizedKey};

/// Identifier + serial pair used for exact roster matching.
///
/// At least one side is present; rows with neither are not indexed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub identifier: Option<NormalizedKey>,
    pub serial: Option<NormalizedKey>,
}

impl IdentityKey {
    pub fn new(identifier: Option<NormalizedKey>, serial: Option<NormalizedKey>) -> Option<Self> {
        if identifier.is_none() && serial.is_none() {
            None
        } else {
            Some(Self { identifier, serial })
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RowIndex {
    /// Strict-suffix identifier keys known to the sheet.
    identifiers: HashSet<NormalizedKey>,
    /// Identifier key -> sheet row. When several rows share a key the last one wins.
    positions: HashMap<NormalizedKey, u32>,
    /// Identifier + serial -> sheet row (last one wins).
    identities: HashMap<IdentityKey, u32>,
    /// Serial key -> sheet row, for rows whose pre-run code was pending-removal
    /// (last one wins).
    pending_serials: HashMap<NormalizedKey, u32>,
    /// Sequence codes as loaded, by sheet row.
    original_codes: HashMap<u32, SequenceCode>,
    /// Last sheet row present when the index was built.
    original_row_count: u32,
}

impl RowIndex {
    pub fn build(sheet: &impl SheetStore, layout: &SheetLayout, key_width: usize) -> Self {
        let mut index = RowIndex {
            original_row_count: sheet.row_count(),
            ..RowIndex::default()
        };

        for row in DATA_START_ROW..=sheet.row_count() {
            let code = sheet.cell(row, layout.sequence).as_integer();
            if let Some(code) = code {
                index.original_codes.insert(row, code);
            }

            let identifier =
                normalize::strict_suffix_key(&sheet.cell(row, layout.identifier).to_text(), key_width);
            let serial = normalize::serial_key(&sheet.cell(row, layout.serial).to_text());

            if let Some(key) = &identifier {
                index.identifiers.insert(key.clone());
                index.positions.insert(key.clone(), row);
            }

            if let (Some(code), Some(serial)) = (code, &serial) {
                if Band::PendingRemoval.contains(code) {
                    index.pending_serials.insert(serial.clone(), row);
                }
            }

            if let Some(identity) = IdentityKey::new(identifier, serial) {
                index.identities.insert(identity, row);
            }
        }

        log::debug!(
            "indexed {} row(s): {} identifier key(s), {} identity key(s), {} pending-removal serial(s)",
            index.original_row_count.saturating_sub(DATA_START_ROW - 1),
            index.identifiers.len(),
            index.identities.len(),
            index.pending_serials.len()
        );
        index
    }

    pub fn contains_identifier(&self, key: &NormalizedKey) -> bool {
        self.identifiers.contains(key)
    }

    pub fn identifier_row(&self, key: &NormalizedKey) -> Option<u32> {
        self.positions.get(key).copied()
    }

    /// Record an identifier appended to the sheet during the run.
    pub fn track_identifier(&mut self, key: NormalizedKey, row: u32) {
        self.identifiers.insert(key.clone());
        self.positions.insert(key, row);
    }

    pub fn identity_row(&self, key: &IdentityKey) -> Option<u32> {
        self.identities.get(key).copied()
    }

    pub fn pending_serial_row(&self, serial: &NormalizedKey) -> Option<u32> {
        self.pending_serials.get(serial).copied()
    }

    pub fn original_code(&self, row: u32) -> Option<SequenceCode> {
        self.original_codes.get(&row).copied()
    }

    pub fn original_row_count(&self) -> u32 {
        self.original_row_count
    }

    /// Pre-run codes, in no particular order.
    pub fn original_codes(&self) -> impl Iterator<Item = SequenceCode> + '_ {
        self.original_codes.values().copied()
    }
}
