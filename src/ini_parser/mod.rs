use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encoding::{self, DecodeError};
use crate::filesystem::{self, FilesystemError};

/// How an entry combines with the value the game already has for its key.
///
/// Unreal config files use a one-character prefix on the key for array edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IniOperator {
    /// `Key=Value`, replaces the value.
    Set,
    /// `+Key=Value`, appends unless already present.
    AddUnique,
    /// `.Key=Value`, appends even if already present.
    Add,
    /// `-Key=Value`, removes a matching array element.
    Remove,
    /// `!Key=`, empties the array.
    Clear,
}

impl IniOperator {
    fn from_prefix(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::AddUnique),
            '.' => Some(Self::Add),
            '-' => Some(Self::Remove),
            '!' => Some(Self::Clear),
            _ => None,
        }
    }

    /// The key prefix that selects this operator.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Set => "",
            Self::AddUnique => "+",
            Self::Add => ".",
            Self::Remove => "-",
            Self::Clear => "!",
        }
    }
}

/// A single `key=value` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IniEntry {
    /// The key without its operator prefix.
    pub key: String,
    /// The raw value, trimmed but otherwise verbatim.
    pub value: String,
    pub operator: IniOperator,
}

impl IniEntry {
    /// Interprets the raw value as a typed [`IniValue`].
    pub fn typed_value(&self) -> IniValue {
        IniValue::parse(&self.value)
    }
}

impl fmt::Display for IniEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}={}", self.operator.prefix(), self.key, self.value)
    }
}

/// Typed view of a raw INI value.
#[derive(Debug, Clone, PartialEq)]
pub enum IniValue {
    /// An integer value.
    Integer(i64),
    /// A floating-point value.
    Float(f64),
    /// A boolean value.
    Boolean(bool),
    /// Anything else, including quoted text and Unreal struct literals.
    String(String),
}

impl IniValue {
    /// Parses a raw value string into an `IniValue`.
    pub fn parse(value_str: &str) -> Self {
        if let Ok(v) = value_str.parse::<i64>() {
            return Self::Integer(v);
        }
        if let Ok(v) = value_str.parse::<f64>() {
            if v.is_finite() {
                return Self::Float(v);
            }
        }
        if value_str.eq_ignore_ascii_case("true") {
            return Self::Boolean(true);
        }
        if value_str.eq_ignore_ascii_case("false") {
            return Self::Boolean(false);
        }
        Self::String(value_str.to_string())
    }
}

/// A parsed `.ini` file: sections in file order, each with its entries in file order.
///
/// Entries that appear before the first section header live in the section
/// named `""`. A section header that repeats continues the earlier section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IniDocument {
    sections: IndexMap<String, Vec<IniEntry>>,
}

impl IniDocument {
    /// Iterates over `(section name, entries)` in file order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &[IniEntry])> {
        self.sections.iter().map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    /// Returns the entries of one section.
    pub fn section(&self, name: &str) -> Option<&[IniEntry]> {
        self.sections.get(name).map(Vec::as_slice)
    }

    /// Returns the last plain (`Set`) value of `key` in `section`.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?
            .iter()
            .rev()
            .find(|e| e.operator == IniOperator::Set && e.key == key)
            .map(|e| e.value.as_str())
    }

    /// Returns every entry for `key` in `section`, whatever its operator.
    pub fn entries(&self, section: &str, key: &str) -> Vec<&IniEntry> {
        self.section(section)
            .map(|entries| entries.iter().filter(|e| e.key == key).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    fn push(&mut self, section: &str, entry: IniEntry) {
        self.sections.entry(section.to_string()).or_default().push(entry);
    }

    fn open_section(&mut self, section: &str) {
        self.sections.entry(section.to_string()).or_default();
    }
}

/// Errors from reading or parsing `.ini` data.
#[derive(Debug, Error)]
pub enum IniParseError {
    #[error("failed to read the file: {0}")]
    Read(#[from] FilesystemError),
    #[error("failed to decode the file: {0}")]
    Decode(#[from] DecodeError),
    #[error("key is missing or empty in line `{0}`")]
    MissingKey(String),
    #[error("line `{0}` has no `=`")]
    MissingSeparator(String),
}

/// Parses a single `key=value` line, including an optional operator prefix.
///
/// # Errors
///
/// Returns `IniParseError::MissingSeparator` when there is no `=`, and
/// `IniParseError::MissingKey` when the key is empty.
pub fn parse_entry(line: &str) -> Result<IniEntry, IniParseError> {
    let (raw_key, value) = line
        .split_once('=')
        .ok_or_else(|| IniParseError::MissingSeparator(line.to_string()))?;
    let raw_key = raw_key.trim();

    let mut chars = raw_key.chars();
    let (operator, key) = match chars.next().and_then(IniOperator::from_prefix) {
        Some(op) => (op, chars.as_str().trim()),
        None => (IniOperator::Set, raw_key),
    };

    if key.is_empty() {
        return Err(IniParseError::MissingKey(line.to_string()));
    }

    Ok(IniEntry {
        key: key.to_string(),
        value: value.trim().to_string(),
        operator,
    })
}

fn is_comment(line: &str) -> bool {
    line.starts_with(';') || line.starts_with('#')
}

/// Parses `.ini` text into an [`IniDocument`].
///
/// Ignores empty lines, `;` and `#` comments, and lines that are not valid
/// entries.
pub fn parse_ini_string(content: &str) -> IniDocument {
    let mut doc = IniDocument::default();
    let mut section = String::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            section = trimmed[1..trimmed.len() - 1].trim().to_string();
            doc.open_section(&section);
            continue;
        }
        if let Ok(entry) = parse_entry(trimmed) {
            doc.push(&section, entry);
        }
    }

    doc
}

/// Reads an `.ini` file (UTF-8, or UTF-16 with a byte-order mark) and parses it.
///
/// # Errors
///
/// Returns `IniParseError` if the file cannot be read or decoded.
pub fn parse_ini_file<P: AsRef<Path>>(path: P) -> Result<IniDocument, IniParseError> {
    let bytes = filesystem::read_bytes(path)?;
    let content = encoding::decode_text(&bytes)?;
    Ok(parse_ini_string(&content))
}
