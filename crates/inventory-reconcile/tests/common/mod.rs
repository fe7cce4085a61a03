#![allow(dead_code)]

use chrono::NaiveDate;
use inventory_io::{SheetStore, Worksheet};
use inventory_model::{CellValue, Column, SheetLayout};

pub const SEQ: Column = Column::new(1);
pub const NAME: Column = Column::new(2);
pub const ASSET: Column = Column::new(3);
pub const LOCATION: Column = Column::new(9);
pub const SERIAL: Column = Column::new(15);
pub const STATUS: Column = Column::new(24);
pub const SCANNED: Column = Column::new(26);
pub const VERIFIED: Column = Column::new(27);

pub const TEMPLATE_STYLE: u32 = 7;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date")
}

/// Inventory sheet builder over the default layout.
///
/// Row 1 carries the headers; `row` appends data rows. Row 2 (the style
/// template) gets style id [`TEMPLATE_STYLE`] on every column.
pub struct InventorySheet {
    sheet: Worksheet,
    next_row: u32,
}

impl InventorySheet {
    pub fn new() -> Self {
        let mut sheet = Worksheet::new("Inventory");
        for (column, header) in [
            (SEQ, "Seq"),
            (NAME, "Name"),
            (ASSET, "Asset Id"),
            (LOCATION, "Location"),
            (SERIAL, "Serial"),
            (STATUS, "Status"),
            (SCANNED, "Last Scanned"),
            (VERIFIED, "Last Verified"),
        ] {
            sheet.set_cell(1, column, header.into());
        }
        Self { sheet, next_row: 2 }
    }

    pub fn row(mut self, seq: impl Into<CellValue>, asset: &str, serial: &str) -> Self {
        let row = self.next_row;
        self.sheet.set_cell(row, SEQ, seq.into());
        self.sheet.set_cell(row, NAME, format!("item {row}").into());
        if !asset.is_empty() {
            self.sheet.set_cell(row, ASSET, asset.into());
        }
        if !serial.is_empty() {
            self.sheet.set_cell(row, SERIAL, serial.into());
        }
        if row == 2 {
            for col in 1..=VERIFIED.index() {
                self.sheet.set_style(row, Column::new(col), TEMPLATE_STYLE);
            }
        }
        self.next_row += 1;
        self
    }

    pub fn cell(mut self, row: u32, column: Column, value: impl Into<CellValue>) -> Self {
        self.sheet.set_cell(row, column, value.into());
        self
    }

    pub fn build(self) -> Worksheet {
        self.sheet
    }
}

/// `(sequence code text, asset text)` of every data row, in sheet order.
pub fn codes_and_assets(sheet: &Worksheet) -> Vec<(String, String)> {
    let layout = SheetLayout::default();
    sheet
        .data_rows()
        .iter()
        .map(|row| {
            (
                row.cell(layout.sequence).to_text().into_owned(),
                row.identifier(&layout),
            )
        })
        .collect()
}

/// Data row whose asset cell equals `asset`.
pub fn row_with_asset(sheet: &Worksheet, asset: &str) -> Option<u32> {
    let layout = SheetLayout::default();
    sheet
        .data_rows()
        .into_iter()
        .find(|row| row.identifier(&layout) == asset)
        .map(|row| row.position)
}
