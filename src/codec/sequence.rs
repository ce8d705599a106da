//! Sequence keys
//!
//! Batch indices rendered as fixed-width, zero-padded decimal ASCII. Within
//! the width, byte order equals numeric order, so an ordered scan replays
//! batches in insertion order.

use crate::error::{Result, StoreError};

/// Default key width: indices 0 ..= 99_999_999
pub const DEFAULT_KEY_DIGITS: usize = 8;

/// Widest key whose capacity still fits in a u64
pub const MAX_KEY_DIGITS: usize = 19;

/// Number of distinct indices a key of `digits` width can hold
pub fn capacity(digits: usize) -> Result<u64> {
    if digits == 0 || digits > MAX_KEY_DIGITS {
        return Err(StoreError::Config(format!(
            "key width must be 1..={} digits, got {}",
            MAX_KEY_DIGITS, digits
        )));
    }
    Ok(10u64.pow(digits as u32))
}

/// Render `index` as a `digits`-wide key
///
/// Fails with `Capacity` once `index` no longer fits, instead of producing a
/// longer key that would sort out of order.
pub fn encode(index: u64, digits: usize) -> Result<Vec<u8>> {
    let limit = capacity(digits)?;
    if index >= limit {
        return Err(StoreError::Capacity(format!(
            "batch index {} does not fit in a {}-digit sequence key",
            index, digits
        )));
    }
    Ok(format!("{:0width$}", index, width = digits).into_bytes())
}

/// Parse a key back into its index
pub fn decode(key: &[u8]) -> Result<u64> {
    if key.is_empty() || !key.iter().all(u8::is_ascii_digit) {
        return Err(StoreError::Corruption(format!(
            "malformed sequence key {:?}",
            String::from_utf8_lossy(key)
        )));
    }

    // All-digit ASCII is valid UTF-8
    let text = std::str::from_utf8(key).map_err(|e| StoreError::Corruption(e.to_string()))?;
    text.parse()
        .map_err(|e| StoreError::Corruption(format!("sequence key {}: {}", text, e)))
}
