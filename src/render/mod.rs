//! Plain-text views of parsed mod data.
//!
//! These mirror what a front end shows: a tree of files and abilities, and a
//! content pane for a selected file or ability.

use std::fmt::Write;

use crate::ini_parser::IniDocument;
use crate::int_parser::{AbilityRecord, FRIENDLY_NAME_KEY, LONG_DESCRIPTION_KEY};
use crate::scanner::{FileOutcome, ParsedFolder};

pub const INI_ROOT: &str = "INI Files";
pub const INT_ROOT: &str = "INT Files";

const INDENT: &str = "  ";

/// Renders the file tree: INI files, then INT files with their ability names.
pub fn render_tree(parsed: &ParsedFolder) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{INI_ROOT}");
    for (file, outcome) in &parsed.ini_files {
        let _ = writeln!(out, "{INDENT}{file}{}", failure_suffix(outcome));
    }

    let _ = writeln!(out, "{INT_ROOT}");
    for (file, outcome) in &parsed.int_files {
        let _ = writeln!(out, "{INDENT}{file}{}", failure_suffix(outcome));
        for ability in outcome.parsed().into_iter().flatten() {
            let _ = writeln!(out, "{INDENT}{INDENT}{}", ability.name());
        }
    }

    out
}

fn failure_suffix<T>(outcome: &FileOutcome<T>) -> String {
    match outcome {
        FileOutcome::Parsed(_) => String::new(),
        FileOutcome::Failed { reason } => format!(" (unreadable: {reason})"),
    }
}

/// Renders one ability the way it appears in its localization file.
pub fn render_ability(record: &AbilityRecord) -> String {
    format!(
        "[{} {}]\n{FRIENDLY_NAME_KEY}={}\n{LONG_DESCRIPTION_KEY}={}\n",
        record.name(),
        record.template_type(),
        record.friendly_name(),
        record.long_description()
    )
}

/// Renders every ability of a file, separated by blank lines.
pub fn render_int_file(records: &[AbilityRecord]) -> String {
    records.iter().map(render_ability).collect::<Vec<_>>().join("\n")
}

/// Renders an INI document back into `[Section]` / `key=value` text.
pub fn render_ini_file(doc: &IniDocument) -> String {
    let mut out = String::new();
    for (name, entries) in doc.sections() {
        if !name.is_empty() || !out.is_empty() {
            let _ = writeln!(out, "[{name}]");
        }
        for entry in entries {
            let _ = writeln!(out, "{entry}");
        }
    }
    out
}
