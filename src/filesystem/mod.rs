use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Represents errors that can occur during filesystem operations.
#[derive(Debug, Error)]
pub enum FilesystemError {
    /// Wrapper for standard IO errors.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Error for empty path input.
    #[error("Path is empty")]
    EmptyPath,
    /// Error for a path that is not valid UTF-8 where a string path is needed.
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),
}

/// Creates a directory if it does not exist.
///
/// # Arguments
///
/// * `dir` - Path to the directory to create.
/// * `recursive` - If true, creates parent directories as needed.
///
/// # Errors
///
/// Returns `FilesystemError` if the directory cannot be created.
pub fn create_if_not_exists<P: AsRef<Path>>(dir: P, recursive: bool) -> Result<(), FilesystemError> {
    let dir = dir.as_ref();
    let raw_path = dir
        .to_str()
        .ok_or_else(|| FilesystemError::NonUtf8Path(dir.to_path_buf()))?;
    if raw_path.is_empty() {
        return Err(FilesystemError::EmptyPath);
    }
    let path = expand_home(raw_path);

    if path.exists() {
        return Ok(());
    }

    if recursive {
        fs::create_dir_all(&path)?;
    } else {
        fs::create_dir(&path)?;
    }

    Ok(())
}

/// Checks if a file exists at the given path.
pub fn file_exists<P: AsRef<Path>>(file: P) -> bool {
    file.as_ref().is_file()
}

/// Removes a file at the given path. A missing file is not an error.
///
/// # Errors
///
/// Returns `FilesystemError` if the file exists but cannot be removed.
pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> Result<(), FilesystemError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Reads the raw bytes of a file.
///
/// The parsers decode the bytes themselves, since `.int` files are UTF-16.
///
/// # Errors
///
/// Returns `FilesystemError` if the file cannot be read.
pub fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, FilesystemError> {
    Ok(fs::read(path)?)
}

/// Returns the last modification time of a file.
///
/// # Errors
///
/// Returns `FilesystemError` if the metadata cannot be read or the platform
/// does not report modification times.
pub fn modified_time<P: AsRef<Path>>(path: P) -> Result<SystemTime, FilesystemError> {
    Ok(fs::metadata(path)?.modified()?)
}

/// Replaces the contents of `path` with `content` atomically.
///
/// The content is written to a temporary file in the target's directory and
/// then renamed over the target, so an interrupted write leaves the previous
/// file intact. Missing parent directories are created.
///
/// # Errors
///
/// Returns `FilesystemError` if the temporary file cannot be written or the
/// rename fails.
pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<(), FilesystemError> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    create_if_not_exists(dir, true)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Expands a path that starts with `~` to the user's home directory.
///
/// # Arguments
///
/// * `path` - Path string, possibly starting with `~`.
///
/// # Returns
///
/// The expanded `PathBuf`, or empty if expansion fails.
pub fn expand_home(path: &str) -> PathBuf {
    if path.is_empty() {
        return PathBuf::new();
    }
    if !path.starts_with('~') {
        return PathBuf::from(path);
    }
    let home = match dirs::home_dir() {
        Some(h) => h,
        None => return PathBuf::new(),
    };
    if path == "~" {
        return home;
    }
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        return home.join(rest);
    }
    // ~user is not supported
    PathBuf::new()
}
