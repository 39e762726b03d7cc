//! Binary cache of parsed decision trees.
//!
//! Parsing is the only step of a tree's life that does not depend on the
//! condition environment, so its result can be cached and reloaded without
//! touching the source grammar again. A cached tree is re-activated as usual.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"DTRE"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! ## Versioning
//!
//! The format version in the header must match exactly. If it does not,
//! deserialization fails immediately with [`DeserializeError::IncompatibleVersion`].
//! The engine version is informational only.

use thiserror::Error;

use crate::parse::{content_hash, ParsedTree};
use crate::types::{Instr, InstrKind};

const MAGIC: &[u8; 4] = b"DTRE";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

/// Errors that can occur when serializing a [`ParsedTree`] to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode tree: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`ParsedTree`] from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a decision tree binary: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(tree: &ParsedTree) -> Result<(), DeserializeError> {
    if content_hash(&tree.code) != tree.hash {
        return Err(DeserializeError::Validation(
            "hash does not match the embedded code".to_owned(),
        ));
    }

    let line_count = tree.code.lines().count();
    let last = tree.fragments.len().saturating_sub(1);
    for (no, frag) in tree.fragments.iter().enumerate() {
        if frag.level() > 1 {
            return Err(DeserializeError::Validation(format!(
                "fragment {no} has level {}",
                frag.level()
            )));
        }
        let span = frag.lines();
        if span.start == 0 || span.start > span.end || span.end > line_count + 1 {
            return Err(DeserializeError::Validation(format!(
                "fragment {no} spans lines {}..{} of {line_count}",
                span.start, span.end
            )));
        }
        if frag.kind() == InstrKind::Error && no != last {
            return Err(DeserializeError::Validation(format!(
                "error fragment {no} is not the last one"
            )));
        }
    }

    let trailing = tree.fragments.last().and_then(|frag| match frag.instr() {
        Instr::Error(err) => Some(err),
        _ => None,
    });
    if trailing != tree.error.as_ref() {
        return Err(DeserializeError::Validation(
            "recorded error does not match the error fragment".to_owned(),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) {
    let hash = blake3::hash(payload);
    let hash_bytes = hash.as_bytes();

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags (reserved)
    #[allow(clippy::cast_possible_truncation)] // trees never approach 4 GiB
    let payload_len = payload.len() as u32;
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash_bytes[..16]);
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32, always fits in u32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }

    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    // bytes[6..8] is engine_version, bytes[8..12] is flags
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(tree: &ParsedTree) -> Result<Vec<u8>, SerializeError> {
    let payload = bincode::serde::encode_to_vec(tree, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<ParsedTree, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_end = HEADER_SIZE + payload_len as usize;
    if bytes.len() < payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[HEADER_SIZE..payload_end];

    if blake3::hash(payload).as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (tree, _): (ParsedTree, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;

    validate(&tree)?;
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;
    use crate::types::{Fragment, LineSpan};

    const SRC: &str = "if FT in {PASS}:\n    return True\nreturn False";

    #[test]
    fn header_round_trip() {
        let payload = b"test payload data";
        let mut buf = Vec::new();
        write_header(&mut buf, payload);
        assert_eq!(buf.len(), HEADER_SIZE);

        let (format_version, payload_len, hash) = read_header(&buf).unwrap();
        assert_eq!(format_version, FORMAT_VERSION);
        assert_eq!(payload_len as usize, payload.len());
        assert_eq!(&hash, &blake3::hash(payload).as_bytes()[..16]);
    }

    #[test]
    fn header_bad_magic() {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(b"OORO");
        assert!(matches!(read_header(&buf), Err(DeserializeError::BadMagic)));
    }

    #[test]
    fn header_too_short() {
        assert!(matches!(
            read_header(&[0u8; 10]),
            Err(DeserializeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn encode_decode_keeps_syntax_error() {
        let tree = parse("return True\nreturn False");
        assert!(tree.error().is_some());
        let restored = decode(&encode(&tree).unwrap()).unwrap();
        assert_eq!(restored, tree);
    }

    #[test]
    fn validate_rejects_stale_hash() {
        let mut tree = parse(SRC);
        tree.hash = content_hash("return True");
        assert!(matches!(validate(&tree), Err(DeserializeError::Validation(_))));
    }

    #[test]
    fn validate_rejects_deep_level() {
        let mut tree = parse(SRC);
        tree.fragments[1] = Fragment::new(
            Instr::Return { decision: true },
            2,
            LineSpan { start: 2, end: 3 },
        );
        let err = validate(&tree).unwrap_err();
        assert!(err.to_string().contains("level 2"));
    }

    #[test]
    fn validate_rejects_span_past_end() {
        let mut tree = parse(SRC);
        tree.fragments[2] = Fragment::new(
            Instr::Return { decision: false },
            0,
            LineSpan { start: 3, end: 9 },
        );
        assert!(matches!(validate(&tree), Err(DeserializeError::Validation(_))));
    }

    #[test]
    fn validate_rejects_dangling_error() {
        let mut tree = parse("return True\nreturn False");
        tree.error = None;
        let err = validate(&tree).unwrap_err();
        assert!(err.to_string().contains("recorded error"));
    }
}
