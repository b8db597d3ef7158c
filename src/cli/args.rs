//! CLI argument definitions using clap.
//!
//! Without a view flag the folder's file tree is printed. `--file` and
//! `--ability` select a content view, `--json` dumps everything.

use std::path::PathBuf;

use clap::Parser;

use crate::cache::DEFAULT_CACHE_FILE;
use crate::filesystem::expand_home;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    /// Mod folder containing Config and Localization directories
    pub folder: PathBuf,

    /// Cache file location
    #[arg(long, env = "XCOM2_MODCFG_CACHE", default_value = DEFAULT_CACHE_FILE)]
    pub cache_file: PathBuf,

    /// Scan the folder without reading or writing the cache
    #[arg(long)]
    pub no_cache: bool,

    /// Delete the cache file before reading the folder
    #[arg(long)]
    pub clear_cache: bool,

    /// Show the contents of one file (by file name)
    #[arg(long, conflicts_with = "json")]
    pub file: Option<String>,

    /// Show one ability of the file given with --file
    #[arg(long, requires = "file")]
    pub ability: Option<String>,

    /// Print all parsed data as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Arguments {
    /// Folder path with a leading `~` expanded.
    pub fn folder_path(&self) -> PathBuf {
        expand_home(&self.folder.to_string_lossy())
    }

    /// Cache path with a leading `~` expanded.
    pub fn cache_path(&self) -> PathBuf {
        expand_home(&self.cache_file.to_string_lossy())
    }
}
