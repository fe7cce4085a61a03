//! Reading formatting out of, and writing cell data back into, a worksheet part.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use chrono::NaiveDate;
use inventory_model::{CellValue, Column};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::parts::{attr_u32, attr_value, prefix_of, qualified, StyleSummary};
use super::PackageError;
use crate::{SheetStore, StyleId, Worksheet};

/// Last column of a worksheet (`XFD`).
const MAX_COLUMN: u32 = 16_384;

/// Width given to columns that are hidden without an existing `<col>` entry.
const DEFAULT_COLUMN_WIDTH: &str = "9.140625";

static EMPTY: CellValue = CellValue::Empty;

/// Cell formatting found in a worksheet part.
#[derive(Debug, Default, PartialEq)]
pub(super) struct SheetFormatting {
    /// `(row, column, style)` for every cell with a non-default style.
    pub styles: Vec<(u32, u32, StyleId)>,
    /// Inclusive `(min, max)` column ranges marked hidden.
    pub hidden_columns: Vec<(u32, u32)>,
    /// Whether any cell carries a formula.
    pub has_formulas: bool,
}

impl SheetFormatting {
    pub fn apply_to(&self, sheet: &mut Worksheet) {
        for &(row, col, style) in &self.styles {
            sheet.set_style(row, Column::new(col), style);
        }
        for &(min, max) in &self.hidden_columns {
            for col in min..=max.min(MAX_COLUMN) {
                sheet.hide_column(Column::new(col));
            }
        }
    }
}

pub(super) fn scan_worksheet(xml: &[u8]) -> Result<SheetFormatting, PackageError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut formatting = SheetFormatting::default();
    let mut in_cols = false;
    let mut row: u32 = 0;
    let mut col: u32 = 0;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"cols" => in_cols = true,
            Event::End(e) if e.local_name().as_ref() == b"cols" => in_cols = false,
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"col" if in_cols => {
                    let spec = ColSpec::from_start(&e)?;
                    if spec.hidden {
                        formatting.hidden_columns.push((spec.min, spec.max));
                    }
                }
                b"row" => {
                    row = attr_u32(&e, b"r")?.unwrap_or(row + 1);
                    col = 0;
                }
                b"c" => {
                    col = match attr_value(&e, b"r")? {
                        Some(reference) => parse_cell_ref(&reference)
                            .map(|(_, c)| c)
                            .ok_or_else(|| PackageError::Invalid(format!("bad cell reference `{reference}`")))?,
                        None => col + 1,
                    };
                    if let Some(style) = attr_u32(&e, b"s")?.filter(|&s| s != 0) {
                        formatting.styles.push((row, col, style));
                    }
                }
                b"f" => formatting.has_formulas = true,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(formatting)
}

/// `"AB12"` -> `(12, 28)`.
fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.trim().replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    let col = Column::from_name(letters).ok()?.index();
    let row = digits.parse().ok().filter(|&r| r > 0)?;
    Some((row, col))
}

#[derive(Debug, Clone, PartialEq)]
struct ColSpec {
    min: u32,
    max: u32,
    /// Every other attribute, in document order.
    attrs: Vec<(String, String)>,
    hidden: bool,
}

impl ColSpec {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, PackageError> {
        let mut spec = ColSpec {
            min: 0,
            max: 0,
            attrs: Vec::new(),
            hidden: false,
        };
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| PackageError::Invalid(err.to_string()))?
                .into_owned();
            match key.as_str() {
                "min" => spec.min = value.trim().parse().unwrap_or(0),
                "max" => spec.max = value.trim().parse().unwrap_or(0),
                "hidden" => spec.hidden = matches!(value.trim(), "1" | "true"),
                _ => spec.attrs.push((key, value)),
            }
        }
        if spec.min == 0 || spec.max < spec.min {
            return Err(PackageError::Invalid(format!(
                "bad column range {}..{}",
                spec.min, spec.max
            )));
        }
        Ok(spec)
    }

    fn with_range(&self, min: u32, max: u32, hidden: bool) -> Self {
        ColSpec {
            min,
            max,
            attrs: self.attrs.clone(),
            hidden,
        }
    }

    fn write<W: Write>(&self, writer: &mut Writer<W>, prefix: Option<&str>) -> Result<(), PackageError> {
        let min = self.min.to_string();
        let max = self.max.to_string();
        let mut start = BytesStart::new(qualified(prefix, "col"));
        start.push_attribute(("min", min.as_str()));
        start.push_attribute(("max", max.as_str()));
        for (key, value) in &self.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if self.hidden {
            start.push_attribute(("hidden", "1"));
        }
        writer.write_event(Event::Empty(start))?;
        Ok(())
    }
}

/// Re-split the existing `<col>` ranges so exactly the columns in `hidden`
/// are hidden. Hidden columns without a range get one of their own.
fn merge_columns(existing: &[ColSpec], hidden: &BTreeSet<u32>) -> Vec<ColSpec> {
    let mut merged = Vec::new();
    for spec in existing {
        let mut start = spec.min;
        while start <= spec.max {
            let is_hidden = hidden.contains(&start);
            let mut end = start;
            if is_hidden {
                while end < spec.max && hidden.contains(&(end + 1)) {
                    end += 1;
                }
            } else if start < spec.max {
                end = hidden
                    .range(start + 1..=spec.max)
                    .next()
                    .map_or(spec.max, |&next| next - 1);
            }
            merged.push(spec.with_range(start, end, is_hidden));
            start = end + 1;
        }
    }

    for &col in hidden {
        if existing.iter().any(|spec| spec.min <= col && col <= spec.max) {
            continue;
        }
        merged.push(ColSpec {
            min: col,
            max: col,
            attrs: vec![("width".to_string(), DEFAULT_COLUMN_WIDTH.to_string())],
            hidden: true,
        });
    }
    merged.sort_by_key(|spec| spec.min);
    merged
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Dimension,
    Cols,
    SheetData,
}

impl Section {
    fn of(local: &[u8]) -> Option<Self> {
        match local {
            b"dimension" => Some(Section::Dimension),
            b"cols" => Some(Section::Cols),
            b"sheetData" => Some(Section::SheetData),
            _ => None,
        }
    }
}

/// Copy a worksheet part, replacing `<dimension>`, `<cols>` and `<sheetData>`
/// with the contents of `sheet`. Everything else passes through untouched.
pub(super) fn rewrite_worksheet<W: Write>(
    xml: &[u8],
    output: W,
    sheet: &Worksheet,
    styles: StyleSummary,
) -> Result<(), PackageError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(output);
    let mut buf = Vec::new();

    let hidden: BTreeSet<u32> = sheet.hidden_columns().map(Column::index).collect();
    let mut prefix: Option<String> = None;
    let mut existing_cols: Vec<ColSpec> = Vec::new();
    let mut skipping: Option<Section> = None;
    let mut wrote_cols = false;
    let mut wrote_sheet_data = false;

    loop {
        let event = reader.read_event_into(&mut buf)?;

        if let Some(section) = skipping {
            match event {
                Event::Start(ref e) | Event::Empty(ref e)
                    if section == Section::Cols && e.local_name().as_ref() == b"col" =>
                {
                    existing_cols.push(ColSpec::from_start(e)?);
                }
                Event::End(ref e) if Section::of(e.local_name().as_ref()) == Some(section) => {
                    skipping = None;
                    match section {
                        Section::Dimension => write_dimension(&mut writer, prefix.as_deref(), sheet)?,
                        Section::Cols => {
                            write_cols(&mut writer, prefix.as_deref(), &merge_columns(&existing_cols, &hidden))?;
                            wrote_cols = true;
                        }
                        Section::SheetData => {
                            write_sheet_data(&mut writer, prefix.as_deref(), sheet, styles)?;
                            wrote_sheet_data = true;
                        }
                    }
                }
                Event::Eof => {
                    return Err(PackageError::Invalid("worksheet ended inside a section".into()))
                }
                _ => {}
            }
            buf.clear();
            continue;
        }

        match event {
            Event::Eof => break,
            Event::Start(ref e) if e.local_name().as_ref() == b"worksheet" => {
                prefix = prefix_of(e.name().as_ref());
                writer.write_event(Event::Start(e.to_owned()))?;
            }
            Event::Start(ref e) | Event::Empty(ref e) if Section::of(e.local_name().as_ref()).is_some() => {
                let is_empty = matches!(event, Event::Empty(_));
                let section = Section::of(e.local_name().as_ref());
                if section == Some(Section::SheetData) && !wrote_cols {
                    write_cols(&mut writer, prefix.as_deref(), &merge_columns(&[], &hidden))?;
                    wrote_cols = true;
                }
                match (section, is_empty) {
                    (Some(section), false) => skipping = Some(section),
                    (Some(Section::Dimension), true) => write_dimension(&mut writer, prefix.as_deref(), sheet)?,
                    (Some(Section::Cols), true) => {
                        write_cols(&mut writer, prefix.as_deref(), &merge_columns(&[], &hidden))?;
                        wrote_cols = true;
                    }
                    (Some(Section::SheetData), true) => {
                        write_sheet_data(&mut writer, prefix.as_deref(), sheet, styles)?;
                        wrote_sheet_data = true;
                    }
                    (None, _) => {}
                }
            }
            event => writer.write_event(event)?,
        }
        buf.clear();
    }

    if !wrote_sheet_data {
        return Err(PackageError::Invalid("worksheet has no <sheetData>".into()));
    }
    Ok(())
}

/// Last used `(row, column)`, counting styled cells.
fn extent(sheet: &Worksheet) -> (u32, u32) {
    sheet.styled_cells().fold(
        (sheet.row_count(), sheet.column_count()),
        |(rows, cols), (row, col, _)| (rows.max(row), cols.max(col.index())),
    )
}

fn write_dimension<W: Write>(
    writer: &mut Writer<W>,
    prefix: Option<&str>,
    sheet: &Worksheet,
) -> Result<(), PackageError> {
    let reference = match extent(sheet) {
        (0, _) | (_, 0) => "A1".to_string(),
        (rows, cols) => format!("A1:{}{rows}", Column::new(cols).name()),
    };
    let mut start = BytesStart::new(qualified(prefix, "dimension"));
    start.push_attribute(("ref", reference.as_str()));
    writer.write_event(Event::Empty(start))?;
    Ok(())
}

fn write_cols<W: Write>(
    writer: &mut Writer<W>,
    prefix: Option<&str>,
    cols: &[ColSpec],
) -> Result<(), PackageError> {
    // `<cols>` must hold at least one `<col>`.
    if cols.is_empty() {
        return Ok(());
    }
    let name = qualified(prefix, "cols");
    writer.write_event(Event::Start(BytesStart::new(name.as_str())))?;
    for col in cols {
        col.write(writer, prefix)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
    Ok(())
}

/// One cell to write: its value (if any) and style (if any).
type CellSlot<'a> = (Option<&'a CellValue>, Option<StyleId>);

fn write_sheet_data<W: Write>(
    writer: &mut Writer<W>,
    prefix: Option<&str>,
    sheet: &Worksheet,
    styles: StyleSummary,
) -> Result<(), PackageError> {
    let mut rows: BTreeMap<u32, BTreeMap<u32, CellSlot<'_>>> = BTreeMap::new();
    for row in 1..=sheet.row_count() {
        for (idx, value) in sheet.row_values(row).iter().enumerate() {
            if !value.is_empty() {
                rows.entry(row).or_default().entry(idx as u32 + 1).or_default().0 = Some(value);
            }
        }
    }
    for (row, col, style) in sheet.styled_cells() {
        rows.entry(row).or_default().entry(col.index()).or_default().1 = Some(style);
    }

    let name = qualified(prefix, "sheetData");
    if rows.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(name.as_str())))?;
        return Ok(());
    }

    let row_name = qualified(prefix, "row");
    writer.write_event(Event::Start(BytesStart::new(name.as_str())))?;
    for (row, cells) in &rows {
        let r = row.to_string();
        let mut start = BytesStart::new(row_name.as_str());
        start.push_attribute(("r", r.as_str()));
        writer.write_event(Event::Start(start))?;
        for (&col, &(value, style)) in cells {
            let value = value.unwrap_or(&EMPTY);
            write_cell(writer, prefix, *row, col, value, style, styles)?;
        }
        writer.write_event(Event::End(BytesEnd::new(row_name.as_str())))?;
    }
    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
    Ok(())
}

enum CellBody {
    None,
    Value(String),
    Inline(String),
}

fn write_cell<W: Write>(
    writer: &mut Writer<W>,
    prefix: Option<&str>,
    row: u32,
    col: u32,
    value: &CellValue,
    style: Option<StyleId>,
    styles: StyleSummary,
) -> Result<(), PackageError> {
    let mut style = style.filter(|&s| styles.is_valid(s));
    let (kind, body) = match value {
        CellValue::Empty => (None, CellBody::None),
        CellValue::Number(n) if n.is_finite() => (None, CellBody::Value(n.to_string())),
        CellValue::Number(n) => (Some("inlineStr"), CellBody::Inline(n.to_string())),
        CellValue::String(s) => (Some("inlineStr"), CellBody::Inline(s.clone())),
        CellValue::Boolean(b) => (Some("b"), CellBody::Value(u8::from(*b).to_string())),
        CellValue::Date(date) => match (excel_serial(*date), style.or(styles.date_xf)) {
            (Some(serial), Some(date_style)) => {
                style = Some(date_style);
                (None, CellBody::Value(serial.to_string()))
            }
            _ => (Some("inlineStr"), CellBody::Inline(value.to_text().into_owned())),
        },
    };

    let reference = format!("{}{row}", Column::new(col).name());
    let style_text = style.map(|s| s.to_string());
    let cell_name = qualified(prefix, "c");
    let mut start = BytesStart::new(cell_name.as_str());
    start.push_attribute(("r", reference.as_str()));
    if let Some(style_text) = &style_text {
        start.push_attribute(("s", style_text.as_str()));
    }
    if let Some(kind) = kind {
        start.push_attribute(("t", kind));
    }

    match body {
        CellBody::None => writer.write_event(Event::Empty(start))?,
        CellBody::Value(text) => {
            let v = qualified(prefix, "v");
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Start(BytesStart::new(v.as_str())))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new(v.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new(cell_name.as_str())))?;
        }
        CellBody::Inline(text) => {
            let is = qualified(prefix, "is");
            let t = qualified(prefix, "t");
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Start(BytesStart::new(is.as_str())))?;
            let mut t_start = BytesStart::new(t.as_str());
            if text.trim() != text {
                t_start.push_attribute(("xml:space", "preserve"));
            }
            writer.write_event(Event::Start(t_start))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new(t.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new(is.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new(cell_name.as_str())))?;
        }
    }
    Ok(())
}

/// Day number in the 1900 date system. Dates before 1900-03-01 sit on the far
/// side of the phantom 1900-02-29 and are written as text instead.
fn excel_serial(date: NaiveDate) -> Option<i64> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let days = date.signed_duration_since(epoch).num_days();
    (days >= 61).then_some(days)
}
