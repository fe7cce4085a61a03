//! Atomic file replacement:
//! - write to a temp file in the destination directory (avoids cross-device renames)
//! - flush + `sync_all`
//! - rename into place with replace semantics
//!
//! If anything fails before the rename, the destination is left untouched.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

fn parent_dir_or_dot(path: &Path) -> &Path {
    // `Path::parent` returns `Some("")` for bare relative file names like `inventory.csv`.
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

pub(crate) fn atomic_write(
    dest: &Path,
    write_fn: impl FnOnce(&mut File) -> io::Result<()>,
) -> io::Result<()> {
    let dir = parent_dir_or_dot(dest);
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    write_fn(tmp.as_file_mut())?;

    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;

    // `persist` renames over the destination (MoveFileEx with replace on Windows).
    tmp.persist(dest).map_err(|err| err.error)?;

    // Best-effort: the file is already in place.
    let _ = sync_parent_dir(dest);
    Ok(())
}

fn sync_parent_dir(path: &Path) -> io::Result<()> {
    File::open(parent_dir_or_dot(path))?.sync_all()
}
