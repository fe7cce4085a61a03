//! Fixed column positions of the inventory sheet and of the roster import sheet.
//!
//! These positions are a compatibility contract with existing workbooks. The
//! defaults must not change; deployments with a different layout override them
//! through [`crate::InventoryConfig`].

use serde::{Deserialize, Serialize};

use crate::Column;

/// Row holding the column headers.
pub const HEADER_ROW: u32 = 1;
/// First data row under the headers.
pub const DATA_START_ROW: u32 = 2;

/// Column layout of the inventory sheet (the system of record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    /// Sequence code (`A`).
    pub sequence: Column,
    /// Asset tag (`C`).
    pub identifier: Column,
    /// Location (`I`).
    pub location: Column,
    /// Serial number (`O`).
    pub serial: Column,
    /// In/Out disposition (`X`).
    pub status: Column,
    /// Last scanned date (`Z`).
    pub last_scanned: Column,
    /// Last verified date (`AA`).
    pub last_verified: Column,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            sequence: Column::new(1),
            identifier: Column::new(3),
            location: Column::new(9),
            serial: Column::new(15),
            status: Column::new(24),
            last_scanned: Column::new(26),
            last_verified: Column::new(27),
        }
    }
}

impl SheetLayout {
    /// Columns written when a scan-in session appends a row.
    pub fn scan_in_columns(&self) -> Vec<Column> {
        vec![
            self.sequence,
            self.identifier,
            self.last_scanned,
            self.last_verified,
        ]
    }

    /// Columns written when a scan-out session appends a row.
    pub fn scan_out_columns(&self) -> Vec<Column> {
        vec![
            self.sequence,
            self.identifier,
            self.location,
            self.status,
            self.last_scanned,
            self.last_verified,
        ]
    }
}

/// Column layout of the authoritative roster ("HR export") sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportLayout {
    /// Asset tag (`B`).
    pub identifier: Column,
    /// Serial number (`N`).
    pub serial: Column,
}

impl Default for ImportLayout {
    fn default() -> Self {
        Self {
            identifier: Column::new(2),
            serial: Column::new(14),
        }
    }
}
