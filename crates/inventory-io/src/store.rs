use std::io;
use std::path::{Path, PathBuf};

use crate::{open_workbook, save_workbook, OpenError, SaveError, SheetStore, Workbook, Worksheet};

/// One opened inventory document: its first sheet plus a way to commit it.
///
/// A reconciliation run mutates [`InventoryStore::sheet_mut`] freely and calls
/// [`InventoryStore::save`] exactly once at the end. Implementations must make
/// `save` all-or-nothing.
pub trait InventoryStore {
    type Sheet: SheetStore;

    fn sheet(&self) -> &Self::Sheet;
    fn sheet_mut(&mut self) -> &mut Self::Sheet;
    fn save(&mut self) -> Result<(), SaveError>;
}

/// File-backed inventory document.
#[derive(Debug)]
pub struct OpenedWorkbook {
    workbook: Workbook,
    save_path: PathBuf,
}

impl OpenedWorkbook {
    /// Open `path`; the document saves back to `path` when the format is
    /// writable, otherwise to a sibling `.xlsx`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        let path = path.as_ref();
        let workbook = open_workbook(path)?;
        if workbook.sheets.is_empty() {
            return Err(OpenError::NoSheets {
                path: path.to_path_buf(),
            });
        }
        let save_path = workbook
            .source
            .as_ref()
            .map(|source| source.default_save_path())
            .unwrap_or_else(|| path.to_path_buf());
        Ok(Self {
            workbook,
            save_path,
        })
    }

    /// Redirect the save target.
    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = path.into();
        self
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

}

impl InventoryStore for OpenedWorkbook {
    type Sheet = Worksheet;

    fn sheet(&self) -> &Worksheet {
        &self.workbook.sheets[0]
    }

    fn sheet_mut(&mut self) -> &mut Worksheet {
        &mut self.workbook.sheets[0]
    }

    fn save(&mut self) -> Result<(), SaveError> {
        save_workbook(&self.workbook, &self.save_path)
    }
}

/// In-memory inventory document.
///
/// `committed` holds the last successfully saved snapshot, so callers can
/// observe exactly what a run committed. A save failure can be injected to
/// exercise the abort path.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sheet: Worksheet,
    committed: Option<Worksheet>,
    fail_saves_with: Option<io::ErrorKind>,
    save_count: usize,
}

impl MemoryStore {
    pub fn new(sheet: Worksheet) -> Self {
        Self {
            committed: Some(sheet.clone()),
            sheet,
            ..Self::default()
        }
    }

    /// Make every subsequent save fail with an I/O error of `kind`.
    pub fn fail_saves_with(mut self, kind: io::ErrorKind) -> Self {
        self.fail_saves_with = Some(kind);
        self
    }

    pub fn committed(&self) -> Option<&Worksheet> {
        self.committed.as_ref()
    }

    pub fn save_count(&self) -> usize {
        self.save_count
    }
}

impl InventoryStore for MemoryStore {
    type Sheet = Worksheet;

    fn sheet(&self) -> &Worksheet {
        &self.sheet
    }

    fn sheet_mut(&mut self) -> &mut Worksheet {
        &mut self.sheet
    }

    fn save(&mut self) -> Result<(), SaveError> {
        if let Some(kind) = self.fail_saves_with {
            return Err(SaveError::from_io(
                Path::new("memory"),
                io::Error::new(kind, "injected save failure"),
            ));
        }
        self.committed = Some(self.sheet.clone());
        self.save_count += 1;
        Ok(())
    }
}
