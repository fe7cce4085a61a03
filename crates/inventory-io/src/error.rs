use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::SourceFormat;

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("workbook `{}` not found", path.display())]
    NotFound { path: PathBuf },
    #[error("workbook `{}` could not be read: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("unsupported workbook extension `{extension}` for `{}`", path.display())]
    Unsupported { path: PathBuf, extension: String },
    #[error("workbook `{}` has no sheets", path.display())]
    NoSheets { path: PathBuf },
    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl OpenError {
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => OpenError::NotFound {
                path: path.to_path_buf(),
            },
            _ => OpenError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    pub(crate) fn corrupt(path: &Path, reason: impl std::fmt::Display) -> Self {
        OpenError::Corrupt {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("permission denied writing `{}`", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write {} workbooks (`{}`); save as `.xlsx` or `.csv` instead", format.label(), path.display())]
    ReadOnlyFormat { path: PathBuf, format: SourceFormat },
    #[error("cannot save `{}`: unsupported destination extension", path.display())]
    UnsupportedExtension { path: PathBuf },
    #[error("failed to build workbook package for `{}`: {reason}", path.display())]
    Package { path: PathBuf, reason: String },
    #[error("workbook has no sheets to save")]
    NoSheets,
}

impl SaveError {
    pub(crate) fn package(path: &Path, reason: impl std::fmt::Display) -> Self {
        SaveError::Package {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => SaveError::PermissionDenied {
                path: path.to_path_buf(),
                source: err,
            },
            _ => SaveError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}
