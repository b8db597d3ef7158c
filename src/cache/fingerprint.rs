use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::filesystem;
use crate::scanner::{self, ScanOptions};

/// Hex SHA-256 over the paths and modification times of a folder's recognized files.
///
/// File contents are not hashed: an edit that keeps the modification time
/// leaves the fingerprint unchanged. Every folder without recognized files
/// gets the digest of empty input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderFingerprint(String);

impl FolderFingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hex SHA-256 over the scan options that decide what a scan parses.
///
/// Directory names are sorted first, since their order does not change which
/// files are recognized.
pub fn options_digest(options: &ScanOptions) -> String {
    let mut dirs: Vec<&str> = options.recognized_dirs.iter().map(String::as_str).collect();
    dirs.sort_unstable();
    dirs.dedup();

    let mut hasher = Sha256::new();
    for dir in dirs {
        hasher.update(dir.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update([0xFFu8]);
    hasher.update(options.template_type.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cache key: the folder fingerprint plus the options the folder was parsed with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub options: String,
    pub folder: FolderFingerprint,
}

impl CacheKey {
    pub fn new(options: &ScanOptions, folder: FolderFingerprint) -> Self {
        Self {
            options: options_digest(options),
            folder,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.options.get(..12).unwrap_or(&self.options), self.folder)
    }
}

/// Formats a modification time as `<secs>.<nanos>` relative to the Unix epoch.
pub fn mtime_text(time: SystemTime) -> String {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => format!("{}.{:09}", d.as_secs(), d.subsec_nanos()),
        Err(e) => {
            let d = e.duration();
            format!("-{}.{:09}", d.as_secs(), d.subsec_nanos())
        }
    }
}

/// Computes the fingerprint of `root` in the scanner's traversal order.
///
/// A file that vanishes between listing and reading its metadata is left out.
pub fn fingerprint(root: &Path, options: &ScanOptions) -> FolderFingerprint {
    let mut hasher = Sha256::new();
    let mut count = 0usize;

    for path in scanner::recognized_files(root, options) {
        let mtime = match filesystem::modified_time(&path) {
            Ok(t) => t,
            Err(e) => {
                warn!("Cannot read modification time of {}: {}", path.display(), e);
                continue;
            }
        };
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        hasher.update(mtime_text(mtime).as_bytes());
        hasher.update([0u8]);
        count += 1;
    }

    let digest = FolderFingerprint(hex::encode(hasher.finalize()));
    debug!("Fingerprint of {} over {} files: {}", root.display(), count, digest);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;
    use tempfile::tempdir;

    const EMPTY_DIGEST: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn touch(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options().write(true).open(path).unwrap().set_modified(time).unwrap();
    }

    #[test]
    fn unchanged_folder_has_stable_fingerprint() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Config/Game.ini"), b"[S]\n");
        let options = ScanOptions::default();
        assert_eq!(fingerprint(dir.path(), &options), fingerprint(dir.path(), &options));
    }

    #[test]
    fn folders_without_recognized_files_share_the_empty_digest() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        touch(&b.path().join("Src/Thing.uc"), b"class Thing;");
        let options = ScanOptions::default();
        assert_eq!(fingerprint(a.path(), &options).as_str(), EMPTY_DIGEST);
        assert_eq!(fingerprint(b.path(), &options).as_str(), EMPTY_DIGEST);
    }

    #[test]
    fn modification_time_change_alters_fingerprint() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("Localization/Mod.int");
        touch(&file, b"");
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        set_mtime(&file, base);
        let options = ScanOptions::default();
        let before = fingerprint(dir.path(), &options);

        set_mtime(&file, base + Duration::from_secs(10));
        assert_ne!(before, fingerprint(dir.path(), &options));
    }

    #[test]
    fn adding_or_renaming_a_file_alters_fingerprint() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("Config/A.ini");
        touch(&first, b"");
        let options = ScanOptions::default();
        let one = fingerprint(dir.path(), &options);

        touch(&dir.path().join("Config/notes.txt"), b"");
        let two = fingerprint(dir.path(), &options);
        assert_ne!(one, two);

        fs::rename(&first, dir.path().join("Config/B.ini")).unwrap();
        assert_ne!(two, fingerprint(dir.path(), &options));
    }

    #[test]
    fn removing_a_file_alters_fingerprint() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Config/A.ini"), b"");
        let extra = dir.path().join("Localization/Extra.int");
        touch(&extra, b"");
        let options = ScanOptions::default();
        let before = fingerprint(dir.path(), &options);

        fs::remove_file(&extra).unwrap();
        let after = fingerprint(dir.path(), &options);
        assert_ne!(before, after);
        assert_ne!(after.as_str(), EMPTY_DIGEST);
    }

    #[test]
    fn options_digest_tracks_what_gets_parsed() {
        let defaults = ScanOptions::default();
        let reordered = ScanOptions {
            recognized_dirs: defaults.recognized_dirs.iter().rev().cloned().collect(),
            ..defaults.clone()
        };
        let other_template = ScanOptions {
            template_type: "X2SoldierClassTemplate".to_string(),
            ..defaults.clone()
        };
        let other_dirs = ScanOptions {
            recognized_dirs: vec!["Config".to_string()],
            ..defaults.clone()
        };

        assert_eq!(options_digest(&defaults), options_digest(&reordered));
        assert_ne!(options_digest(&defaults), options_digest(&other_template));
        assert_ne!(options_digest(&defaults), options_digest(&other_dirs));
    }

    #[test]
    fn files_outside_recognized_directories_do_not_count() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Config/A.ini"), b"");
        let options = ScanOptions::default();
        let before = fingerprint(dir.path(), &options);
        touch(&dir.path().join("Content/Big.upk"), b"");
        assert_eq!(before, fingerprint(dir.path(), &options));
    }

    #[test]
    fn mtime_text_has_nanosecond_precision() {
        let t = UNIX_EPOCH + Duration::new(12, 5);
        assert_eq!(mtime_text(t), "12.000000005");
        let before = UNIX_EPOCH - Duration::from_millis(1500);
        assert_eq!(mtime_text(before), "-1.500000000");
    }
}
