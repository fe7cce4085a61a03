use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Band, CellValue, Column, SequenceCode, SheetLayout};

/// In/Out disposition of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disposition {
    In,
    Out,
}

impl Disposition {
    pub const fn as_str(self) -> &'static str {
        match self {
            Disposition::In => "In",
            Disposition::Out => "Out",
        }
    }

    /// Parse a status cell. Matching is case-insensitive; anything else is "unset".
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("in") {
            Some(Disposition::In)
        } else if text.eq_ignore_ascii_case("out") {
            Some(Disposition::Out)
        } else {
            None
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Disposition> for CellValue {
    fn from(value: Disposition) -> Self {
        CellValue::String(value.as_str().to_string())
    }
}

/// Snapshot of one inventory row.
///
/// The row owns every cell value, including the display columns the
/// reconciliation never interprets, so moving a row moves all of its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// 1-based sheet row the snapshot was taken from.
    pub position: u32,
    /// Cell values; index 0 is column `A`.
    pub cells: Vec<CellValue>,
}

static EMPTY: CellValue = CellValue::Empty;

impl Row {
    pub fn new(position: u32, cells: Vec<CellValue>) -> Self {
        Self { position, cells }
    }

    pub fn cell(&self, column: Column) -> &CellValue {
        self.cells
            .get(column.index() as usize - 1)
            .unwrap_or(&EMPTY)
    }

    pub fn sequence_code(&self, layout: &SheetLayout) -> Option<SequenceCode> {
        self.cell(layout.sequence).as_integer()
    }

    pub fn band(&self, layout: &SheetLayout) -> Option<Band> {
        self.sequence_code(layout).and_then(Band::of)
    }

    pub fn identifier(&self, layout: &SheetLayout) -> String {
        self.cell(layout.identifier).to_text().into_owned()
    }

    pub fn serial(&self, layout: &SheetLayout) -> String {
        self.cell(layout.serial).to_text().into_owned()
    }

    pub fn location(&self, layout: &SheetLayout) -> String {
        self.cell(layout.location).to_text().into_owned()
    }

    pub fn status(&self, layout: &SheetLayout) -> Option<Disposition> {
        Disposition::parse(&self.cell(layout.status).to_text())
    }

    pub fn last_scanned(&self, layout: &SheetLayout) -> Option<NaiveDate> {
        self.cell(layout.last_scanned).as_date()
    }

    pub fn last_verified(&self, layout: &SheetLayout) -> Option<NaiveDate> {
        self.cell(layout.last_verified).as_date()
    }
}
