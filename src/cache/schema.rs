use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::fingerprint::CacheKey;
use crate::scanner::ParsedFolder;

/// Cache format version
/// v1: fingerprint -> ParsedFolder with per-file outcomes
/// v2: keyed by scan options digest + folder fingerprint
pub const CACHE_VERSION: u32 = 2;

/// Leading part of every cache file, read on its own to check the version
/// before decoding the entries.
#[derive(Debug, Deserialize)]
pub struct CacheHeader {
    pub version: u32,
}

/// On-disk layout of the cache file.
#[derive(Debug, Deserialize)]
pub struct CacheFile {
    pub version: u32,
    pub entries: IndexMap<CacheKey, ParsedFolder>,
}

/// Borrowed twin of [`CacheFile`] used when writing.
#[derive(Debug, Serialize)]
pub struct CacheFileRef<'a> {
    pub version: u32,
    pub entries: &'a IndexMap<CacheKey, ParsedFolder>,
}
