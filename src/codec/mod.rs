//! Codec Module
//!
//! Byte encodings used by the persistent backend.
//!
//! ## Responsibilities
//! - Fixed-width scalars for counters (`scalar`)
//! - Zero-padded decimal sequence keys for batch order (`sequence`)
//! - Versioned, checksummed identifier and code block blobs (`block`)

pub mod block;
pub mod scalar;
pub mod sequence;

pub use block::{decode_codes, decode_identifiers, encode_codes, encode_identifiers};
pub use scalar::{pack, unpack, Scalar};
