//! Capability-based filesystem helpers.
//!
//! Directories are opened through `cap-std` handles so that every write is
//! relative to a directory the caller named explicitly.

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::io;

/// Opens `path` as a directory handle.
pub(crate) fn open_ambient_dir(path: &Utf8Path) -> io::Result<Dir> {
    Dir::open_ambient_dir(path, ambient_authority())
}

/// Creates `path` and any missing parents, then opens it.
pub(crate) fn create_and_open_dir(path: &Utf8Path) -> io::Result<Dir> {
    Dir::create_ambient_dir_all(path, ambient_authority())?;
    open_ambient_dir(path)
}

/// Splits `path` into a handle on its parent and its final component.
pub(crate) fn open_parent_dir(path: &Utf8Path) -> io::Result<(Dir, &str)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("path {path} must include a file name")))?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = open_ambient_dir(parent)?;
    Ok((dir, file_name))
}

/// Recursively removes the directory at `path`. A missing directory is not
/// an error.
pub(crate) fn remove_dir_all_if_exists(path: &Utf8Path) -> io::Result<()> {
    let (parent, name) = match open_parent_dir(path) {
        Ok(handles) => handles,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    match parent.remove_dir_all(name) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}
