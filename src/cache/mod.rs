pub mod error;
pub mod fingerprint;
pub mod schema;
pub mod store;

use std::path::Path;

pub use error::CacheError;
pub use fingerprint::{CacheKey, FolderFingerprint, fingerprint, options_digest};
pub use store::{CacheOptions, CacheStatus, CacheStore, DEFAULT_CACHE_FILE};

use crate::scanner::ParsedFolder;

/// Parses `folder` through the cache file in the working directory.
///
/// Unchanged folders are answered from the cache without scanning.
pub fn parse_folder<P: AsRef<Path>>(folder: P) -> Result<ParsedFolder, CacheError> {
    let mut store = CacheStore::open(CacheOptions::default());
    store.get_or_parse(folder.as_ref()).cloned()
}
