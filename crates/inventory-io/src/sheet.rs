use std::collections::{BTreeSet, HashMap};

use inventory_model::{CellValue, Column, Row, DATA_START_ROW};

/// Opaque style id. Styles carry no meaning for reconciliation; they are only
/// copied between rows so appended rows look like their neighbours.
pub type StyleId = u32;

static EMPTY: CellValue = CellValue::Empty;

/// Cell-level access to one worksheet.
///
/// Rows and columns are **1-based**. Row 1 is the header row; data starts at
/// [`DATA_START_ROW`].
pub trait SheetStore {
    /// Value of a cell; cells outside the used area read as [`CellValue::Empty`].
    fn cell(&self, row: u32, column: Column) -> &CellValue;

    /// Overwrite a cell value, growing the used area if needed.
    fn set_cell(&mut self, row: u32, column: Column, value: CellValue);

    /// Index of the last used row (the header row counts).
    fn row_count(&self) -> u32;

    /// Index of the last used column.
    fn column_count(&self) -> u32;

    /// Append an empty row after the last used row and return its index.
    fn append_row(&mut self) -> u32;

    /// Copy visual formatting of `columns` from `src_row` to `dst_row`.
    fn copy_row_style(&mut self, src_row: u32, dst_row: u32, columns: &[Column]);

    /// Hide a column from display.
    fn hide_column(&mut self, column: Column);

    /// Snapshot of a full row across [`SheetStore::column_count`] columns.
    fn read_row(&self, row: u32) -> Row {
        let cells = (1..=self.column_count())
            .map(|col| self.cell(row, Column::new(col)).clone())
            .collect();
        Row::new(row, cells)
    }

    /// Overwrite every cell of `row` with `cells`; columns past the end of
    /// `cells` are cleared.
    fn write_row(&mut self, row: u32, cells: &[CellValue]) {
        let width = self.column_count().max(cells.len() as u32);
        for col in 1..=width {
            let value = cells.get(col as usize - 1).cloned().unwrap_or_default();
            self.set_cell(row, Column::new(col), value);
        }
    }

    /// Snapshots of every data row, in sheet order.
    fn data_rows(&self) -> Vec<Row> {
        (DATA_START_ROW..=self.row_count())
            .map(|row| self.read_row(row))
            .collect()
    }
}

/// Dense in-memory worksheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Worksheet {
    name: String,
    /// `rows[0]` is sheet row 1.
    rows: Vec<Vec<CellValue>>,
    column_count: u32,
    styles: HashMap<(u32, u32), StyleId>,
    hidden_columns: BTreeSet<u32>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build a worksheet from row-major values; `rows[0]` becomes sheet row 1.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let column_count = rows.iter().map(|r| r.len() as u32).max().unwrap_or(0);
        Self {
            name: name.into(),
            rows,
            column_count,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Values of a row as stored; may be shorter than [`SheetStore::column_count`].
    pub fn row_values(&self, row: u32) -> &[CellValue] {
        row.checked_sub(1)
            .and_then(|idx| self.rows.get(idx as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn style(&self, row: u32, column: Column) -> Option<StyleId> {
        self.styles.get(&(row, column.index())).copied()
    }

    pub fn set_style(&mut self, row: u32, column: Column, style: StyleId) {
        self.styles.insert((row, column.index()), style);
    }

    /// Every cell carrying a style id, in no particular order.
    pub fn styled_cells(&self) -> impl Iterator<Item = (u32, Column, StyleId)> + '_ {
        self.styles
            .iter()
            .map(|(&(row, col), &style)| (row, Column::new(col), style))
    }

    pub fn is_column_hidden(&self, column: Column) -> bool {
        self.hidden_columns.contains(&column.index())
    }

    pub fn hidden_columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.hidden_columns.iter().map(|&c| Column::new(c))
    }

    fn ensure_row(&mut self, row: u32) -> &mut Vec<CellValue> {
        let idx = row.max(1) as usize - 1;
        if self.rows.len() <= idx {
            self.rows.resize_with(idx + 1, Vec::new);
        }
        &mut self.rows[idx]
    }
}

impl SheetStore for Worksheet {
    fn cell(&self, row: u32, column: Column) -> &CellValue {
        self.row_values(row)
            .get(column.index() as usize - 1)
            .unwrap_or(&EMPTY)
    }

    fn set_cell(&mut self, row: u32, column: Column, value: CellValue) {
        let col = column.index();
        let cells = self.ensure_row(row);
        let idx = col as usize - 1;
        if cells.len() <= idx {
            cells.resize(idx + 1, CellValue::Empty);
        }
        cells[idx] = value;
        self.column_count = self.column_count.max(col);
    }

    fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    fn column_count(&self) -> u32 {
        self.column_count
    }

    fn append_row(&mut self) -> u32 {
        self.rows.push(Vec::new());
        self.rows.len() as u32
    }

    fn copy_row_style(&mut self, src_row: u32, dst_row: u32, columns: &[Column]) {
        for &column in columns {
            match self.style(src_row, column) {
                Some(style) => self.set_style(dst_row, column, style),
                None => {
                    self.styles.remove(&(dst_row, column.index()));
                }
            }
        }
    }

    fn hide_column(&mut self, column: Column) {
        self.hidden_columns.insert(column.index());
    }
}
