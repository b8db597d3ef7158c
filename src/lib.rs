/// The `filesystem` module holds the small file helpers the rest of the crate
/// builds on: home-directory expansion, modification times, raw reads and
/// atomic replacement of files.
pub mod filesystem;

/// The `int_parser` module reads UTF-16 `.int` localization files and extracts
/// the `X2AbilityTemplate` blocks they contain as [`int_parser::AbilityRecord`]s.
pub mod int_parser;

/// The `ini_parser` module parses `.ini` config files into sections of
/// key/value entries, keeping Unreal's array operators (`+`, `-`, `.`, `!`).
pub mod ini_parser;

/// The `scanner` module walks a mod folder, picks out the `Config` and
/// `Localization` directories and dispatches their files to the parsers.
pub mod scanner;

/// The `cache` module fingerprints a folder and keeps previously parsed
/// results on disk so an unchanged folder is not scanned twice.
pub mod cache;

/// The `encoding` module decodes UTF-16 and UTF-8 file contents.
pub mod encoding;

/// The `render` module formats parsed data as the text views shown to users.
pub mod render;

/// The `cli` module defines the command-line front end.
pub mod cli;

pub use cache::{CacheOptions, CacheStore, parse_folder};
pub use int_parser::AbilityRecord;
pub use scanner::{FileOutcome, ParsedFolder, ScanOptions};
