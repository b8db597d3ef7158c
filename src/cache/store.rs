use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use super::error::CacheError;
use super::fingerprint::{self, CacheKey, FolderFingerprint};
use super::schema::{CACHE_VERSION, CacheFile, CacheFileRef, CacheHeader};
use crate::filesystem;
use crate::scanner::{self, CancelToken, ParsedFolder, ScanOptions};

/// Cache file name used when no other path is configured.
pub const DEFAULT_CACHE_FILE: &str = "xcom2_modcfg_cache.bin";

/// Where the cache lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Path of the cache file. Relative paths resolve against the working directory.
    pub path: PathBuf,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CACHE_FILE),
        }
    }
}

/// Whether a lookup was answered from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

type Entries = IndexMap<CacheKey, ParsedFolder>;

/// Fingerprint-keyed store of parsed folders, backed by a single file.
///
/// Entries are also keyed by the scan options, so stores with different
/// options can share one file without seeing each other's results.
///
/// The whole file is read on [`CacheStore::open`] and rewritten on every
/// miss. Entries are never evicted.
pub struct CacheStore {
    path: PathBuf,
    scan_options: ScanOptions,
    entries: Entries,
}

impl CacheStore {
    /// Opens the store, loading the cache file if there is a usable one.
    pub fn open(options: CacheOptions) -> Self {
        let entries = Self::load(&options.path);
        Self {
            path: options.path,
            scan_options: ScanOptions::default(),
            entries,
        }
    }

    /// Replaces the options used for fingerprinting and scanning.
    pub fn with_scan_options(mut self, scan_options: ScanOptions) -> Self {
        self.scan_options = scan_options;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a folder fingerprint under this store's scan options.
    pub fn get(&self, fingerprint: &FolderFingerprint) -> Option<&ParsedFolder> {
        self.entries.get(&CacheKey::new(&self.scan_options, fingerprint.clone()))
    }

    pub fn entries(&self) -> &IndexMap<CacheKey, ParsedFolder> {
        &self.entries
    }

    /// Reads the cache file at `path`.
    ///
    /// A missing file gives an empty cache. So does a file that cannot be
    /// decoded or was written by another format version, with a warning.
    pub fn load(path: &Path) -> IndexMap<CacheKey, ParsedFolder> {
        if !filesystem::file_exists(path) {
            debug!("No cache file at {}", path.display());
            return IndexMap::new();
        }
        match Self::try_load(path) {
            Ok(entries) => {
                info!("Loaded {} cached folders from {}", entries.len(), path.display());
                entries
            }
            Err(e) => {
                warn!("Ignoring cache file {}: {}", path.display(), e);
                IndexMap::new()
            }
        }
    }

    /// Reads and decodes the cache file at `path`, reporting every failure.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the file cannot be read, carries another format
    /// version, or cannot be decoded.
    pub fn try_load(path: &Path) -> Result<IndexMap<CacheKey, ParsedFolder>, CacheError> {
        let data = filesystem::read_bytes(path)?;
        let header: CacheHeader =
            bincode::deserialize(&data).map_err(|e| CacheError::Deserialize(e.to_string()))?;
        if header.version != CACHE_VERSION {
            return Err(CacheError::VersionMismatch {
                found: header.version,
                expected: CACHE_VERSION,
            });
        }
        let file: CacheFile = bincode::deserialize(&data).map_err(|e| CacheError::Deserialize(e.to_string()))?;
        Ok(file.entries)
    }

    /// Writes every entry to the cache file, replacing it atomically.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if encoding or writing fails. The previous file is
    /// left untouched in that case.
    pub fn save(&self) -> Result<(), CacheError> {
        let file = CacheFileRef {
            version: CACHE_VERSION,
            entries: &self.entries,
        };
        let data = bincode::serialize(&file).map_err(|e| CacheError::Serialize(e.to_string()))?;
        filesystem::write_atomic(&self.path, &data)?;
        info!(
            "Saved cache: {} folders, {} bytes to {}",
            self.entries.len(),
            data.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Deletes the cache file and forgets every entry.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the file exists but cannot be removed.
    pub fn clear(&mut self) -> Result<(), CacheError> {
        filesystem::remove_if_exists(&self.path)?;
        self.entries.clear();
        info!("Cleared cache {}", self.path.display());
        Ok(())
    }

    /// Returns the parsed contents of `root`, scanning only when its
    /// fingerprint is not cached yet.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Scan` if `root` is not a readable directory, or
    /// another `CacheError` if the updated cache cannot be saved.
    pub fn get_or_parse(&mut self, root: &Path) -> Result<&ParsedFolder, CacheError> {
        self.lookup(root, &CancelToken::new()).map(|(parsed, _)| parsed)
    }

    /// Like [`CacheStore::get_or_parse`], with cancellation and the cache status.
    ///
    /// A cancelled scan stores nothing.
    pub fn lookup(&mut self, root: &Path, cancel: &CancelToken) -> Result<(&ParsedFolder, CacheStatus), CacheError> {
        scanner::validate_root(root)?;
        let key = CacheKey::new(&self.scan_options, fingerprint::fingerprint(root, &self.scan_options));

        if self.entries.contains_key(&key) {
            info!("Loading {} from cache", root.display());
            return Ok((&self.entries[&key], CacheStatus::Hit));
        }

        debug!("Cache miss for {} ({})", root.display(), key);
        let parsed = scanner::scan_folder(root, &self.scan_options, cancel)?;
        self.entries.insert(key.clone(), parsed);
        self.save()?;
        Ok((&self.entries[&key], CacheStatus::Miss))
    }
}
