use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encoding::{self, DecodeError};
use crate::filesystem::{self, FilesystemError};

/// Template type of the blocks kept by the parser.
pub const ABILITY_TEMPLATE: &str = "X2AbilityTemplate";

pub const NAME_KEY: &str = "Name";
pub const TYPE_KEY: &str = "Type";
pub const FRIENDLY_NAME_KEY: &str = "LocFriendlyName";
pub const LONG_DESCRIPTION_KEY: &str = "LocLongDescription";

static HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[(.*?)\s+(.*?)\]").unwrap());

/// One `[Name Type]` block of a localization file.
///
/// Every field is a string. `Name` and `Type` come from the header, the rest
/// from the `key=value` lines of the block, in the order they appeared.
/// `LocFriendlyName` and `LocLongDescription` are always present, empty when
/// the block does not set them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityRecord {
    fields: IndexMap<String, String>,
}

impl AbilityRecord {
    fn new(name: &str, template_type: &str) -> Self {
        let mut fields = IndexMap::new();
        fields.insert(NAME_KEY.to_string(), name.to_string());
        fields.insert(TYPE_KEY.to_string(), template_type.to_string());
        fields.insert(FRIENDLY_NAME_KEY.to_string(), String::new());
        fields.insert(LONG_DESCRIPTION_KEY.to_string(), String::new());
        Self { fields }
    }

    fn set(&mut self, key: &str, value: &str) {
        self.fields.insert(key.to_string(), value.to_string());
    }

    pub fn name(&self) -> &str {
        self.field(NAME_KEY)
    }

    pub fn template_type(&self) -> &str {
        self.field(TYPE_KEY)
    }

    pub fn friendly_name(&self) -> &str {
        self.field(FRIENDLY_NAME_KEY)
    }

    pub fn long_description(&self) -> &str {
        self.field(LONG_DESCRIPTION_KEY)
    }

    /// Looks up any field, including keys outside the four well-known ones.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Iterates over all fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn field(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }
}

/// Errors that make a whole `.int` file unusable.
#[derive(Debug, Error)]
pub enum IntParseError {
    #[error("failed to read the file: {0}")]
    Read(#[from] FilesystemError),
    #[error("failed to decode the file as UTF-16: {0}")]
    Decode(#[from] DecodeError),
}

/// Parses the header line of a block.
///
/// Returns a fresh record only when the header matches `[Name Type]` and the
/// type equals `template_type`.
fn parse_header(line: &str, template_type: &str) -> Option<AbilityRecord> {
    let caps = HEADER_REGEX.captures(line)?;
    let name = caps.get(1)?.as_str();
    let ty = caps.get(2)?.as_str();
    (ty == template_type).then(|| AbilityRecord::new(name, ty))
}

/// Extracts the records of blocks whose header type equals `template_type`.
///
/// A header line always closes the open record. If the new header is not a
/// recognized template, the `key=value` lines that follow are dropped until the
/// next recognized header. Values lose surrounding whitespace and quotes.
pub fn parse_records(content: &str, template_type: &str) -> Vec<AbilityRecord> {
    let mut records = Vec::new();
    let mut current: Option<AbilityRecord> = None;

    for line in content.split(['\n', '\r']) {
        let line = line.trim();
        if line.starts_with('[') && line.ends_with(']') {
            if let Some(record) = current.take() {
                records.push(record);
            }
            current = parse_header(line, template_type);
        } else if let Some(record) = current.as_mut() {
            if let Some((key, value)) = line.split_once('=') {
                record.set(key.trim(), value.trim().trim_matches('"'));
            }
        }
    }

    if let Some(record) = current {
        records.push(record);
    }

    records
}

/// Extracts the `X2AbilityTemplate` records from already decoded text.
pub fn parse_int_string(content: &str) -> Vec<AbilityRecord> {
    parse_records(content, ABILITY_TEMPLATE)
}

/// Decodes UTF-16 bytes and extracts the records of `template_type` blocks.
///
/// # Errors
///
/// Returns `IntParseError::Decode` if the bytes are not valid UTF-16. No
/// partial result is produced.
pub fn parse_int_bytes(bytes: &[u8], template_type: &str) -> Result<Vec<AbilityRecord>, IntParseError> {
    let content = encoding::decode_utf16(bytes)?;
    Ok(parse_records(&content, template_type))
}

/// Reads a `.int` file and extracts the records of `template_type` blocks.
///
/// # Errors
///
/// Returns `IntParseError` if the file cannot be read or decoded.
pub fn parse_int_file<P: AsRef<Path>>(path: P, template_type: &str) -> Result<Vec<AbilityRecord>, IntParseError> {
    let bytes = filesystem::read_bytes(path)?;
    parse_int_bytes(&bytes, template_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode_utf16_le;
    use rstest::rstest;
    use std::fs;
    use tempfile::tempdir;

    const SCENARIO: &str = "[AbilityFoo X2AbilityTemplate]\n\
        LocFriendlyName=\"Foo Ability\"\n\
        LocLongDescription=\"Does foo.\"\n\
        [AbilityBar OtherTemplate]\n\
        SomeKey=\"ignored\"\n";

    #[test]
    fn parses_recognized_block_and_skips_foreign_one() {
        let records = parse_int_bytes(&encode_utf16_le(SCENARIO), ABILITY_TEMPLATE).unwrap();
        assert_eq!(records.len(), 1);
        let foo = &records[0];
        assert_eq!(foo.name(), "AbilityFoo");
        assert_eq!(foo.template_type(), "X2AbilityTemplate");
        assert_eq!(foo.friendly_name(), "Foo Ability");
        assert_eq!(foo.long_description(), "Does foo.");
        assert_eq!(foo.get("SomeKey"), None);
    }

    #[test]
    fn keeps_file_order_and_extra_keys() {
        let content = "[B X2AbilityTemplate]\n\
            LocHelpText=\"help\"\n\
            [A X2AbilityTemplate]\n\
            LocFriendlyName=A\n";
        let records = parse_int_string(content);
        let names: Vec<_> = records.iter().map(AbilityRecord::name).collect();
        assert_eq!(names, ["B", "A"]);
        assert_eq!(records[0].get("LocHelpText"), Some("help"));
        let keys: Vec<_> = records[0].fields().map(|(k, _)| k).collect();
        assert_eq!(keys, ["Name", "Type", "LocFriendlyName", "LocLongDescription", "LocHelpText"]);
    }

    #[test]
    fn missing_localized_fields_default_to_empty() {
        let records = parse_int_string("[Lonely X2AbilityTemplate]");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].friendly_name(), "");
        assert_eq!(records[0].long_description(), "");
    }

    #[test]
    fn foreign_header_closes_open_record_and_drops_its_lines() {
        let content = "[A X2AbilityTemplate]\n\
            LocFriendlyName=first\n\
            [Other X2CharacterTemplate]\n\
            LocFriendlyName=stolen\n\
            [B X2AbilityTemplate]\n\
            LocFriendlyName=second\n";
        let records = parse_int_string(content);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].friendly_name(), "first");
        assert_eq!(records[1].friendly_name(), "second");
    }

    #[test]
    fn lines_before_any_header_are_dropped() {
        let records = parse_int_string("Orphan=1\n[A X2AbilityTemplate]\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("Orphan"), None);
    }

    #[rstest]
    #[case("LocFriendlyName=  \"Padded\"  ", "Padded")]
    #[case("LocFriendlyName=a=b", "a=b")]
    #[case("LocFriendlyName=\"\"quoted twice\"\"", "quoted twice")]
    #[case("  LocFriendlyName  =plain", "plain")]
    #[case("LocFriendlyName=", "")]
    fn value_normalization(#[case] line: &str, #[case] expected: &str) {
        let content = format!("[A X2AbilityTemplate]\n{line}\n");
        let records = parse_int_string(&content);
        assert_eq!(records[0].friendly_name(), expected);
    }

    #[rstest]
    #[case("[NoType]")]
    #[case("[A X2AbilityTemplateExtra]")]
    #[case("[A x2abilitytemplate]")]
    fn unrecognized_headers_produce_nothing(#[case] header: &str) {
        let content = format!("{header}\nLocFriendlyName=x\n");
        assert!(parse_int_string(&content).is_empty());
    }

    #[test]
    fn handles_crlf_and_indentation() {
        let content = "  [A X2AbilityTemplate]  \r\n\tLocFriendlyName=\"A\"\r\n";
        let records = parse_int_string(content);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].friendly_name(), "A");
    }

    #[test]
    fn repeated_key_overwrites_in_place() {
        let records = parse_int_string("[A X2AbilityTemplate]\nLocFriendlyName=one\nLocFriendlyName=two\n");
        assert_eq!(records[0].friendly_name(), "two");
        assert_eq!(records[0].fields().count(), 4);
    }

    #[test]
    fn custom_template_type() {
        let records = parse_records("[Ranger X2SoldierClassTemplate]\nDisplayName=Ranger\n", "X2SoldierClassTemplate");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("DisplayName"), Some("Ranger"));
    }

    #[test]
    fn empty_content_yields_no_records() {
        assert!(parse_int_bytes(&[], ABILITY_TEMPLATE).unwrap().is_empty());
    }

    #[test]
    fn invalid_utf16_fails_whole_file() {
        let mut bytes = encode_utf16_le(SCENARIO);
        bytes.push(0x00);
        assert!(matches!(
            parse_int_bytes(&bytes, ABILITY_TEMPLATE),
            Err(IntParseError::Decode(DecodeError::OddLength(_)))
        ));
    }

    #[test]
    fn parses_file_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("XComGame.int");
        fs::write(&path, encode_utf16_le(SCENARIO)).unwrap();
        let records = parse_int_file(&path, ABILITY_TEMPLATE).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = parse_int_file("nonexistent_file.int", ABILITY_TEMPLATE);
        assert!(matches!(result, Err(IntParseError::Read(_))));
    }
}
