use thiserror::Error;

const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Errors raised while turning raw file bytes into text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("UTF-16 data has an odd length of {0} bytes")]
    OddLength(usize),
    #[error("unpaired UTF-16 surrogate 0x{0:04X}")]
    UnpairedSurrogate(u16),
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Decodes UTF-16 bytes into a `String`.
///
/// A leading byte-order mark picks the endianness and is dropped; without one
/// the data is read as little endian, which is what the game's own tools write.
pub fn decode_utf16(bytes: &[u8]) -> Result<String, DecodeError> {
    let (body, big_endian) = if let Some(rest) = bytes.strip_prefix(&UTF16_LE_BOM) {
        (rest, false)
    } else if let Some(rest) = bytes.strip_prefix(&UTF16_BE_BOM) {
        (rest, true)
    } else {
        (bytes, false)
    };

    if body.len() % 2 != 0 {
        return Err(DecodeError::OddLength(bytes.len()));
    }

    let units = body.chunks_exact(2).map(|pair| {
        let pair = [pair[0], pair[1]];
        if big_endian {
            u16::from_be_bytes(pair)
        } else {
            u16::from_le_bytes(pair)
        }
    });

    char::decode_utf16(units)
        .map(|c| c.map_err(|e| DecodeError::UnpairedSurrogate(e.unpaired_surrogate())))
        .collect()
}

/// Decodes text that is either UTF-16 (recognised by its byte-order mark) or
/// UTF-8 with an optional byte-order mark.
pub fn decode_text(bytes: &[u8]) -> Result<String, DecodeError> {
    if bytes.starts_with(&UTF16_LE_BOM) || bytes.starts_with(&UTF16_BE_BOM) {
        return decode_utf16(bytes);
    }
    let body = bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes);
    Ok(std::str::from_utf8(body)?.to_string())
}

/// Encodes `text` as little-endian UTF-16 with a byte-order mark.
#[cfg(test)]
pub(crate) fn encode_utf16_le(text: &str) -> Vec<u8> {
    let mut out = UTF16_LE_BOM.to_vec();
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_little_endian_with_bom() {
        let bytes = encode_utf16_le("[Foo X2AbilityTemplate]");
        assert_eq!(decode_utf16(&bytes).unwrap(), "[Foo X2AbilityTemplate]");
    }

    #[test]
    fn decodes_big_endian_with_bom() {
        let mut bytes = UTF16_BE_BOM.to_vec();
        for unit in "Ωx".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_utf16(&bytes).unwrap(), "Ωx");
    }

    #[test]
    fn defaults_to_little_endian_without_bom() {
        let bytes: Vec<u8> = "ab".encode_utf16().flat_map(u16::to_le_bytes).collect();
        assert_eq!(decode_utf16(&bytes).unwrap(), "ab");
    }

    #[test]
    fn empty_input_is_empty_text() {
        assert_eq!(decode_utf16(&[]).unwrap(), "");
        assert_eq!(decode_utf16(&UTF16_LE_BOM).unwrap(), "");
    }

    #[test]
    fn rejects_odd_length() {
        assert_eq!(decode_utf16(b"abc"), Err(DecodeError::OddLength(3)));
    }

    #[test]
    fn rejects_unpaired_surrogate() {
        let bytes = [0x00, 0xD8, 0x41, 0x00];
        assert_eq!(decode_utf16(&bytes), Err(DecodeError::UnpairedSurrogate(0xD800)));
    }

    #[test]
    fn decode_text_handles_utf8_and_utf16() {
        assert_eq!(decode_text(b"\xEF\xBB\xBF[Core]").unwrap(), "[Core]");
        assert_eq!(decode_text(b"[Core]").unwrap(), "[Core]");
        assert_eq!(decode_text(&encode_utf16_le("[Core]")).unwrap(), "[Core]");
        assert!(decode_text(&[0xC3, 0x28]).is_err());
    }
}
