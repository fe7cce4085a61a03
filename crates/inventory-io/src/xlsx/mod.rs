//! In-place saving of `.xlsx`/`.xlsm` inventories.
//!
//! The package read at open time is kept whole. Saving regenerates the first
//! worksheet's `<dimension>`, `<cols>` and `<sheetData>` from the in-memory
//! [`Worksheet`] and raw-copies every other part, so the other sheets,
//! styles, themes and macros survive a reconciliation run:
//! - cell style ids are written back as `s` attributes (ids unknown to
//!   `styles.xml` are dropped)
//! - hidden columns become `hidden="1"` on `<col>` ranges, splitting existing
//!   ranges where needed
//! - dates are written as 1900-system serials with a date cell format; one is
//!   appended to `styles.xml` when the workbook has none
//! - formulas on the inventory sheet are replaced by their values, and
//!   `calcChain.xml` is dropped when that happens

mod minimal;
mod parts;
mod worksheet;

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Cursor, Write};
use std::path::Path;

use inventory_model::{CellValue, Column};
use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::{SheetStore, SourceFormat, Worksheet};
use parts::{
    append_date_xf, drop_elements, first_sheet_relationship, parse_relationships, read_part,
    require_part, resolve_target, summarize_styles, StyleSummary, CONTENT_TYPES_PART,
    WORKBOOK_PART, WORKBOOK_RELS_PART,
};
use worksheet::scan_worksheet;

#[derive(Debug, Error)]
pub(crate) enum PackageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("xml attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),
    #[error("package part `{0}` is missing")]
    MissingPart(String),
    #[error("{0}")]
    Invalid(String),
}

/// An opened `.xlsx`/`.xlsm` package and the parts saving rewrites.
#[derive(Clone, PartialEq)]
pub(crate) struct XlsxPackage {
    format: SourceFormat,
    bytes: Vec<u8>,
    worksheet_part: String,
    styles_part: Option<String>,
    /// `(relationship id, part name)` of `calcChain.xml`.
    calc_chain: Option<(String, String)>,
}

impl fmt::Debug for XlsxPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XlsxPackage")
            .field("format", &self.format)
            .field("bytes", &self.bytes.len())
            .field("worksheet_part", &self.worksheet_part)
            .field("styles_part", &self.styles_part)
            .finish()
    }
}

impl XlsxPackage {
    pub(crate) fn read(path: &Path, format: SourceFormat) -> Result<Self, PackageError> {
        Self::from_bytes(std::fs::read(path)?, format)
    }

    /// Single empty sheet named after `sheet_name`.
    pub(crate) fn blank(sheet_name: &str) -> Result<Self, PackageError> {
        Self::from_bytes(minimal::blank_package(sheet_name)?, SourceFormat::Xlsx)
    }

    fn from_bytes(bytes: Vec<u8>, format: SourceFormat) -> Result<Self, PackageError> {
        let (worksheet_part, styles_part, calc_chain) = {
            let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice()))?;
            let workbook_xml = require_part(&mut archive, WORKBOOK_PART)?;
            let rels_xml = require_part(&mut archive, WORKBOOK_RELS_PART)?;

            let sheet_rel = first_sheet_relationship(&workbook_xml)?
                .ok_or_else(|| PackageError::Invalid("workbook lists no sheets".into()))?;
            let rels = parse_relationships(&rels_xml)?;
            let worksheet_part = rels
                .iter()
                .find(|rel| rel.id == sheet_rel)
                .map(|rel| resolve_target(WORKBOOK_PART, &rel.target))
                .ok_or_else(|| {
                    PackageError::Invalid(format!("no relationship `{sheet_rel}` for the first sheet"))
                })?;
            let styles_part = rels
                .iter()
                .find(|rel| rel.is_styles())
                .map(|rel| resolve_target(WORKBOOK_PART, &rel.target));
            let calc_chain = rels
                .iter()
                .find(|rel| rel.is_calc_chain())
                .map(|rel| (rel.id.clone(), resolve_target(WORKBOOK_PART, &rel.target)));
            (worksheet_part, styles_part, calc_chain)
        };

        Ok(Self {
            format,
            bytes,
            worksheet_part,
            styles_part,
            calc_chain,
        })
    }

    pub(crate) fn format(&self) -> SourceFormat {
        self.format
    }

    /// Copy the first worksheet's cell styles and hidden columns onto `sheet`.
    pub(crate) fn apply_formatting(&self, sheet: &mut Worksheet) -> Result<(), PackageError> {
        let mut archive = ZipArchive::new(Cursor::new(self.bytes.as_slice()))?;
        let xml = require_part(&mut archive, &self.worksheet_part)?;
        scan_worksheet(&xml)?.apply_to(sheet);
        Ok(())
    }

    /// Package bytes with the first worksheet replaced by `sheet`.
    pub(crate) fn with_sheet(&self, sheet: &Worksheet) -> Result<Vec<u8>, PackageError> {
        let mut archive = ZipArchive::new(Cursor::new(self.bytes.as_slice()))?;
        let worksheet_xml = require_part(&mut archive, &self.worksheet_part)?;
        let has_formulas = scan_worksheet(&worksheet_xml)?.has_formulas;

        let mut replaced: HashMap<String, Vec<u8>> = HashMap::new();
        let mut styles = StyleSummary::default();
        if let Some(part) = &self.styles_part {
            if let Some(xml) = read_part(&mut archive, part)? {
                styles = summarize_styles(&xml)?;
                if styles.date_xf.is_none() && styles.xf_count > 0 && needs_date_format(sheet) {
                    replaced.insert(part.clone(), append_date_xf(&xml)?);
                    styles.date_xf = Some(styles.xf_count);
                    styles.xf_count += 1;
                }
            }
        }

        let mut rewritten = Vec::with_capacity(worksheet_xml.len());
        worksheet::rewrite_worksheet(&worksheet_xml, &mut rewritten, sheet, styles)?;
        replaced.insert(self.worksheet_part.clone(), rewritten);

        // Values replaced formulas, so the calculation chain no longer matches.
        let dropped = match &self.calc_chain {
            Some((rel_id, part)) if has_formulas => {
                let content_types = require_part(&mut archive, CONTENT_TYPES_PART)?;
                let part_name = format!("/{part}");
                replaced.insert(
                    CONTENT_TYPES_PART.to_string(),
                    drop_elements(&content_types, b"Override", b"PartName", &part_name)?,
                );
                let rels = require_part(&mut archive, WORKBOOK_RELS_PART)?;
                replaced.insert(
                    WORKBOOK_RELS_PART.to_string(),
                    drop_elements(&rels, b"Relationship", b"Id", rel_id)?,
                );
                Some(part.as_str())
            }
            _ => None,
        };

        let mut buffer = Cursor::new(Vec::with_capacity(self.bytes.len()));
        {
            let mut zip = ZipWriter::new(&mut buffer);
            let options =
                FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);
            for i in 0..archive.len() {
                let file = archive.by_index(i)?;
                if file.is_dir() {
                    continue;
                }
                let name = file.name().to_string();
                if dropped == Some(name.as_str()) {
                    continue;
                }
                match replaced.remove(&name) {
                    Some(bytes) => {
                        zip.start_file(name, options)?;
                        zip.write_all(&bytes)?;
                    }
                    // Unchanged parts keep their compressed bytes.
                    None => zip.raw_copy_file(file)?,
                }
            }
            if let Some(missing) = replaced.keys().next() {
                return Err(PackageError::MissingPart(missing.clone()));
            }
            zip.finish()?;
        }
        Ok(buffer.into_inner())
    }
}

fn needs_date_format(sheet: &Worksheet) -> bool {
    (1..=sheet.row_count()).any(|row| {
        sheet
            .row_values(row)
            .iter()
            .enumerate()
            .any(|(idx, value)| {
                matches!(value, CellValue::Date(_))
                    && sheet.style(row, Column::new(idx as u32 + 1)).is_none()
            })
    })
}
