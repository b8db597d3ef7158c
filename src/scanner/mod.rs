use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::ini_parser::{self, IniDocument};
use crate::int_parser::{self, ABILITY_TEMPLATE, AbilityRecord};

/// Name of the directory that holds a mod's `.ini` files.
pub const CONFIG_DIR: &str = "Config";
/// Name of the directory that holds a mod's `.int` files.
pub const LOCALIZATION_DIR: &str = "Localization";

/// Options controlling what the scanner looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Base names of the directories whose files are parsed. Matched exactly.
    pub recognized_dirs: Vec<String>,
    /// Header type of the `.int` blocks kept as records.
    pub template_type: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recognized_dirs: vec![CONFIG_DIR.to_string(), LOCALIZATION_DIR.to_string()],
            template_type: ABILITY_TEMPLATE.to_string(),
        }
    }
}

impl ScanOptions {
    fn is_recognized(&self, dir: &Path) -> bool {
        dir.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.recognized_dirs.iter().any(|d| d == name))
    }
}

/// Result of parsing one file.
///
/// `Failed` keeps the reason so callers can tell an unreadable file apart from
/// a file that parsed to nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileOutcome<T> {
    Parsed(T),
    Failed { reason: String },
}

impl<T> FileOutcome<T> {
    fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::Parsed(data),
            Err(e) => Self::Failed { reason: e.to_string() },
        }
    }

    pub fn parsed(&self) -> Option<&T> {
        match self {
            Self::Parsed(data) => Some(data),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Everything parsed from one mod folder, keyed by file name.
///
/// Keys are base names, so a file overwrites an earlier same-named file from
/// another recognized directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFolder {
    pub ini_files: IndexMap<String, FileOutcome<IniDocument>>,
    pub int_files: IndexMap<String, FileOutcome<Vec<AbilityRecord>>>,
}

impl ParsedFolder {
    pub fn is_empty(&self) -> bool {
        self.ini_files.is_empty() && self.int_files.is_empty()
    }

    /// Records of one `.int` file, or `None` if it is unknown or failed to parse.
    pub fn abilities(&self, file: &str) -> Option<&[AbilityRecord]> {
        self.int_files.get(file)?.parsed().map(Vec::as_slice)
    }

    /// First record named `name` in `file`.
    pub fn find_ability(&self, file: &str, name: &str) -> Option<&AbilityRecord> {
        self.abilities(file)?.iter().find(|r| r.name() == name)
    }

    pub fn ability_count(&self) -> usize {
        self.int_files
            .values()
            .filter_map(FileOutcome::parsed)
            .map(Vec::len)
            .sum()
    }

    pub fn failed_count(&self) -> usize {
        let ini = self.ini_files.values().filter(|o| o.is_failed()).count();
        let int = self.int_files.values().filter(|o| o.is_failed()).count();
        ini + int
    }
}

/// Cooperative cancellation flag, checked by the scanner between files.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("folder does not exist: {0}")]
    RootNotFound(PathBuf),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("scan cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Ini,
    Int,
}

fn classify(path: &Path) -> Option<FileKind> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ini") => Some(FileKind::Ini),
        Some("int") => Some(FileKind::Int),
        _ => None,
    }
}

/// Checks that `root` is an existing directory.
pub(crate) fn validate_root(root: &Path) -> Result<(), ScanError> {
    if !root.exists() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

/// Lists every file whose parent directory is recognized, in a stable order.
///
/// Files of every extension are listed. Unreadable entries are logged and skipped.
pub(crate) fn recognized_files(root: &Path, options: &ScanOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Cannot access path: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.parent().is_some_and(|dir| options.is_recognized(dir)) {
            files.push(path.to_path_buf());
        }
    }
    files
}

fn file_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn insert_outcome<T>(map: &mut IndexMap<String, FileOutcome<T>>, path: &Path, outcome: FileOutcome<T>) {
    match map.entry(file_key(path)) {
        Entry::Occupied(mut slot) => {
            warn!(
                "{} shadows an earlier file with the same name; keeping the later one",
                path.display()
            );
            slot.insert(outcome);
        }
        Entry::Vacant(slot) => {
            slot.insert(outcome);
        }
    }
}

/// Walks `root` and parses every `.ini` and `.int` file found directly inside
/// a recognized directory.
///
/// A file that cannot be read or decoded is recorded as `FileOutcome::Failed`
/// and does not stop the scan.
///
/// # Errors
///
/// Returns `ScanError` if `root` is not an existing directory or the scan is
/// cancelled through `cancel`.
pub fn scan_folder(root: &Path, options: &ScanOptions, cancel: &CancelToken) -> Result<ParsedFolder, ScanError> {
    validate_root(root)?;
    info!("Parsing folder {}", root.display());

    let mut parsed = ParsedFolder::default();
    for path in recognized_files(root, options) {
        if cancel.is_cancelled() {
            info!("Scan of {} cancelled", root.display());
            return Err(ScanError::Cancelled);
        }
        match classify(&path) {
            Some(FileKind::Ini) => {
                debug!("Parsing INI file {}", path.display());
                let result = ini_parser::parse_ini_file(&path);
                if let Err(e) = &result {
                    warn!("Failed to parse {}: {}", path.display(), e);
                }
                insert_outcome(&mut parsed.ini_files, &path, FileOutcome::from_result(result));
            }
            Some(FileKind::Int) => {
                debug!("Parsing INT file {}", path.display());
                let result = int_parser::parse_int_file(&path, &options.template_type);
                if let Err(e) = &result {
                    warn!("Failed to parse {}: {}", path.display(), e);
                }
                insert_outcome(&mut parsed.int_files, &path, FileOutcome::from_result(result));
            }
            None => {}
        }
    }

    info!(
        "Parsed {} INI files and {} INT files ({} abilities, {} failed)",
        parsed.ini_files.len(),
        parsed.int_files.len(),
        parsed.ability_count(),
        parsed.failed_count()
    );
    Ok(parsed)
}
