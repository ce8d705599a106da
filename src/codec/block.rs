//! Block codec
//!
//! Versioned, checksummed encoding of identifier sets and code blocks as
//! stored in the persistent backend's `keys` and `vals` tables.
//!
//! ## Envelope
//! ```text
//! ┌──────────┬─────────┬──────────┬──────────┬─────────┬──────────────┐
//! │Magic (4) │ Ver (1) │ Rsvd (1) │ Len (4)  │ CRC (4) │   Payload    │
//! └──────────┴─────────┴──────────┴──────────┴─────────┴──────────────┘
//! ```
//!
//! ## Code Block Payload
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────────────────────────────┐
//! │ Rows (8) │ Cols (8) │ Elem (1) │ rows*cols elements, row-major    │
//! └──────────┴──────────┴──────────┴──────────────────────────────────┘
//! ```
//!
//! Integers are little-endian. The identifier payload is the bincode
//! encoding of the identifier list.

use bytes::{Buf, BufMut, BytesMut};

use crate::batch::{CodeBlock, CodeData, ElementType, IdentifierSet};
use crate::error::{Result, StoreError};

/// Magic for identifier set envelopes
pub const IDENTIFIERS_MAGIC: &[u8; 4] = b"PQID";

/// Magic for code block envelopes
pub const CODES_MAGIC: &[u8; 4] = b"PQCB";

/// Current envelope version
pub const FORMAT_VERSION: u8 = 1;

/// Envelope header size: magic + version + reserved + length + crc
pub const HEADER_SIZE: usize = 14;

/// Code block payload header: rows + cols + element tag
const BLOCK_HEADER_SIZE: usize = 17;

// =============================================================================
// Identifier Sets
// =============================================================================

/// Encode an identifier set
pub fn encode_identifiers(identifiers: &IdentifierSet) -> Result<Vec<u8>> {
    let payload = bincode::serialize(identifiers)?;
    frame(IDENTIFIERS_MAGIC, &payload)
}

/// Decode an identifier set
pub fn decode_identifiers(bytes: &[u8]) -> Result<IdentifierSet> {
    let payload = unframe(IDENTIFIERS_MAGIC, bytes)?;
    Ok(bincode::deserialize(payload)?)
}

// =============================================================================
// Code Blocks
// =============================================================================

/// Encode a code block
pub fn encode_codes(codes: &CodeBlock) -> Result<Vec<u8>> {
    let element = codes.element_type();
    let mut payload =
        BytesMut::with_capacity(BLOCK_HEADER_SIZE + codes.data().len() * element.width());

    payload.put_u64_le(codes.rows() as u64);
    payload.put_u64_le(codes.cols() as u64);
    payload.put_u8(element as u8);

    match codes.data() {
        CodeData::U8(values) => payload.put_slice(values),
        CodeData::U16(values) => values.iter().for_each(|v| payload.put_u16_le(*v)),
        CodeData::U32(values) => values.iter().for_each(|v| payload.put_u32_le(*v)),
        CodeData::I32(values) => values.iter().for_each(|v| payload.put_i32_le(*v)),
        CodeData::F32(values) => values.iter().for_each(|v| payload.put_f32_le(*v)),
        CodeData::F64(values) => values.iter().for_each(|v| payload.put_f64_le(*v)),
    }

    frame(CODES_MAGIC, &payload)
}

/// Decode a code block
pub fn decode_codes(bytes: &[u8]) -> Result<CodeBlock> {
    let mut payload = unframe(CODES_MAGIC, bytes)?;

    if payload.len() < BLOCK_HEADER_SIZE {
        return Err(StoreError::Serialization(format!(
            "code block header: expected {} bytes, got {}",
            BLOCK_HEADER_SIZE,
            payload.len()
        )));
    }

    let rows = to_usize(payload.get_u64_le())?;
    let cols = to_usize(payload.get_u64_le())?;
    let tag = payload.get_u8();
    let element = ElementType::from_tag(tag).ok_or_else(|| {
        StoreError::Serialization(format!("unknown element tag 0x{:02x}", tag))
    })?;

    let count = rows
        .checked_mul(cols)
        .ok_or_else(|| StoreError::Serialization(format!("{} x {} overflows", rows, cols)))?;
    let expected = count
        .checked_mul(element.width())
        .ok_or_else(|| StoreError::Serialization(format!("{} elements overflow", count)))?;

    if payload.remaining() != expected {
        return Err(StoreError::Serialization(format!(
            "code block body: expected {} bytes, got {}",
            expected,
            payload.remaining()
        )));
    }

    let data = match element {
        ElementType::U8 => CodeData::U8(payload.to_vec()),
        ElementType::U16 => CodeData::U16((0..count).map(|_| payload.get_u16_le()).collect()),
        ElementType::U32 => CodeData::U32((0..count).map(|_| payload.get_u32_le()).collect()),
        ElementType::I32 => CodeData::I32((0..count).map(|_| payload.get_i32_le()).collect()),
        ElementType::F32 => CodeData::F32((0..count).map(|_| payload.get_f32_le()).collect()),
        ElementType::F64 => CodeData::F64((0..count).map(|_| payload.get_f64_le()).collect()),
    };

    CodeBlock::new(rows, cols, data)
}

// =============================================================================
// Envelope
// =============================================================================

fn frame(magic: &[u8; 4], payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        StoreError::Serialization(format!("payload of {} bytes is too large", payload.len()))
    })?;

    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_slice(magic);
    message.put_u8(FORMAT_VERSION);
    message.put_u8(0);
    message.put_u32_le(len);
    message.put_u32_le(crc32fast::hash(payload));
    message.put_slice(payload);

    Ok(message.to_vec())
}

fn unframe<'a>(magic: &[u8; 4], bytes: &'a [u8]) -> Result<&'a [u8]> {
    if bytes.len() < HEADER_SIZE {
        return Err(StoreError::Serialization(format!(
            "incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    if &bytes[..4] != magic {
        return Err(StoreError::Serialization(format!(
            "bad magic {:?}, expected {:?}",
            String::from_utf8_lossy(&bytes[..4]),
            String::from_utf8_lossy(magic)
        )));
    }

    let mut header = &bytes[4..HEADER_SIZE];
    let version = header.get_u8();
    let _reserved = header.get_u8();
    let len = header.get_u32_le() as usize;
    let stored_crc = header.get_u32_le();

    if version != FORMAT_VERSION {
        return Err(StoreError::Serialization(format!(
            "unsupported format version {}",
            version
        )));
    }

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != len {
        return Err(StoreError::Serialization(format!(
            "payload length mismatch: header says {}, got {}",
            len,
            payload.len()
        )));
    }

    let actual_crc = crc32fast::hash(payload);
    if actual_crc != stored_crc {
        return Err(StoreError::Corruption(format!(
            "checksum mismatch: stored {:08x}, computed {:08x}",
            stored_crc, actual_crc
        )));
    }

    Ok(payload)
}

fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| StoreError::Serialization(format!("dimension {} exceeds usize", value)))
}
