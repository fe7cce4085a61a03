use std::fmt;
use std::path::{Path, PathBuf};

use crate::xlsx::XlsxPackage;
use crate::Worksheet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Csv,
    Xlsx,
    Xlsm,
    Xlsb,
    Xls,
    Ods,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(SourceFormat::Csv),
            "xlsx" => Some(SourceFormat::Xlsx),
            "xlsm" => Some(SourceFormat::Xlsm),
            "xlsb" => Some(SourceFormat::Xlsb),
            "xls" => Some(SourceFormat::Xls),
            "ods" => Some(SourceFormat::Ods),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Xlsx => "xlsx",
            SourceFormat::Xlsm => "xlsm",
            SourceFormat::Xlsb => "xlsb",
            SourceFormat::Xls => "xls",
            SourceFormat::Ods => "ods",
        }
    }

    /// Whether workbooks of this format can be saved back in place.
    pub const fn is_writable(self) -> bool {
        matches!(
            self,
            SourceFormat::Csv | SourceFormat::Xlsx | SourceFormat::Xlsm
        )
    }

    /// Extension used when saving a workbook opened from this source.
    ///
    /// Legacy and OpenDocument sources are saved as `.xlsx`.
    pub const fn default_save_extension(self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Xlsm => "xlsm",
            SourceFormat::Xlsx | SourceFormat::Xlsb | SourceFormat::Xls | SourceFormat::Ods => {
                "xlsx"
            }
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSource {
    pub path: PathBuf,
    pub format: SourceFormat,
}

impl ImportSource {
    /// Where a workbook from this source is saved by default: the source
    /// itself when writable, otherwise a sibling file with the default
    /// save extension.
    pub fn default_save_path(&self) -> PathBuf {
        if self.format.is_writable() {
            self.path.clone()
        } else {
            self.path
                .with_extension(self.format.default_save_extension())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Worksheet>,
    pub source: Option<ImportSource>,
    /// Original `.xlsx`/`.xlsm` package, patched on save.
    pub(crate) package: Option<XlsxPackage>,
}

impl Workbook {
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            source: None,
            package: None,
        }
    }

    /// Workbook holding a single sheet and no on-disk source.
    pub fn with_sheet(sheet: Worksheet) -> Self {
        Self {
            sheets: vec![sheet],
            ..Self::new()
        }
    }

    /// The inventory always lives on the first sheet.
    pub fn first_sheet(&self) -> Option<&Worksheet> {
        self.sheets.first()
    }

    pub fn first_sheet_mut(&mut self) -> Option<&mut Worksheet> {
        self.sheets.first_mut()
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}
