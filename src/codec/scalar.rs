//! Scalar codec
//!
//! Packs fixed-width scalars into native-order byte strings with no padding.
//! Only counters and other small keys/values go through here.

use crate::error::{Result, StoreError};

/// A fixed-width scalar with a native byte order encoding
pub trait Scalar: Sized + Copy {
    /// Encoded width in bytes
    const WIDTH: usize;

    /// Encode to exactly `WIDTH` bytes
    fn pack(self) -> Vec<u8>;

    /// Decode from exactly `WIDTH` bytes
    fn unpack(bytes: &[u8]) -> Result<Self>;
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn pack(self) -> Vec<u8> {
                    self.to_ne_bytes().to_vec()
                }

                fn unpack(bytes: &[u8]) -> Result<Self> {
                    let raw: [u8; std::mem::size_of::<$ty>()] =
                        bytes.try_into().map_err(|_| {
                            StoreError::Serialization(format!(
                                "{}: expected {} bytes, got {}",
                                stringify!($ty),
                                Self::WIDTH,
                                bytes.len()
                            ))
                        })?;
                    Ok(<$ty>::from_ne_bytes(raw))
                }
            }
        )*
    };
}

impl_scalar!(i32, u32, i64, u64);

/// Encode a scalar
pub fn pack<S: Scalar>(value: S) -> Vec<u8> {
    value.pack()
}

/// Decode a scalar
pub fn unpack<S: Scalar>(bytes: &[u8]) -> Result<S> {
    S::unpack(bytes)
}
