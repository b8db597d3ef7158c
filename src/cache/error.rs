use thiserror::Error;

use crate::filesystem::FilesystemError;
use crate::scanner::ScanError;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Filesystem(#[from] FilesystemError),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Deserialize error: {0}")]
    Deserialize(String),

    #[error("Cache version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error(transparent)]
    Scan(#[from] ScanError),
}
