use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};

use crate::cache::{CacheOptions, CacheStore};
use crate::render;
use crate::scanner::{self, CancelToken, FileOutcome, ParsedFolder, ScanOptions};

mod args;

pub use args::Arguments;

/// How a run ended, reported through the process exit code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// Every recognized file parsed (exit code 0).
    AllParsed,
    /// The view was printed, but this many files could not be read or decoded (exit code 1).
    Unreadable(usize),
    /// Nothing was printed: missing folder, unknown file or ability, cache write error (exit code 2).
    Error,
}

impl ExitStatus {
    fn for_folder(parsed: &ParsedFolder) -> Self {
        match parsed.failed_count() {
            0 => Self::AllParsed,
            n => Self::Unreadable(n),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::AllParsed => 0,
            Self::Unreadable(_) => 1,
            Self::Error => 2,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Reads the folder named in `args` and writes the selected view to `out`.
///
/// # Returns
/// - `Ok(ExitStatus::AllParsed)` when every file parsed
/// - `Ok(ExitStatus::Unreadable(n))` when `n` files could not be parsed
/// - `Err` if the folder cannot be read, the cache cannot be written, or the
///   requested file or ability does not exist
pub fn run_cli<W: Write>(args: &Arguments, out: &mut W) -> Result<ExitStatus> {
    let parsed = load(args)?;

    match (&args.file, &args.ability) {
        (Some(file), Some(ability)) => {
            let record = parsed
                .find_ability(file, ability)
                .with_context(|| format!("ability `{ability}` not found in `{file}`"))?;
            write!(out, "{}", render::render_ability(record))?;
        }
        (Some(file), None) => write!(out, "{}", file_view(&parsed, file)?)?,
        (None, _) if args.json => {
            serde_json::to_writer_pretty(&mut *out, &parsed)?;
            writeln!(out)?;
        }
        (None, _) => write!(out, "{}", render::render_tree(&parsed))?,
    }

    Ok(ExitStatus::for_folder(&parsed))
}

fn load(args: &Arguments) -> Result<ParsedFolder> {
    let folder = args.folder_path();
    let options = CacheOptions {
        path: args.cache_path(),
    };
    if args.clear_cache {
        crate::filesystem::remove_if_exists(&options.path)?;
    }

    if args.no_cache {
        let parsed = scanner::scan_folder(&folder, &ScanOptions::default(), &CancelToken::new())?;
        return Ok(parsed);
    }

    let mut store = CacheStore::open(options);
    let parsed = store
        .get_or_parse(&folder)
        .with_context(|| format!("failed to read {}", folder.display()))?;
    Ok(parsed.clone())
}

fn file_view(parsed: &ParsedFolder, file: &str) -> Result<String> {
    if let Some(outcome) = parsed.int_files.get(file) {
        return match outcome {
            FileOutcome::Parsed(records) => Ok(render::render_int_file(records)),
            FileOutcome::Failed { reason } => bail!("`{file}` could not be parsed: {reason}"),
        };
    }
    if let Some(outcome) = parsed.ini_files.get(file) {
        return match outcome {
            FileOutcome::Parsed(doc) => Ok(render::render_ini_file(doc)),
            FileOutcome::Failed { reason } => bail!("`{file}` could not be parsed: {reason}"),
        };
    }
    bail!("no file named `{file}` in the folder")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_counts_unreadable_files() {
        let mut parsed = ParsedFolder::default();
        assert_eq!(ExitStatus::for_folder(&parsed), ExitStatus::AllParsed);

        parsed.int_files.insert("Ok.int".to_string(), FileOutcome::Parsed(Vec::new()));
        parsed.int_files.insert(
            "Bad.int".to_string(),
            FileOutcome::Failed {
                reason: "odd length".to_string(),
            },
        );
        parsed.ini_files.insert(
            "Bad.ini".to_string(),
            FileOutcome::Failed {
                reason: "invalid UTF-8".to_string(),
            },
        );
        assert_eq!(ExitStatus::for_folder(&parsed), ExitStatus::Unreadable(2));
    }

    #[test]
    fn exit_codes() {
        assert_eq!(ExitStatus::AllParsed.code(), 0);
        assert_eq!(ExitStatus::Unreadable(3).code(), 1);
        assert_eq!(ExitStatus::Error.code(), 2);
    }
}
