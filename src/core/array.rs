//! Chunked little-endian integer array loading
//!
//! The directory tables are flat arrays of little-endian integers stored in
//! streams that may be scattered across pages. [`load_array`] pulls them out
//! in bounded reads and refuses to return a partially filled array.

use crate::error::{MsfError, Result};
use crate::source::ByteSource;

/// Upper bound on the byte length of a single read issued by the loader
pub const MAX_CHUNK_SIZE: usize = 64 * 1024;

/// Fixed-width unsigned integer with a little-endian wire form
pub trait LeInt: Copy {
    const WIDTH: usize;

    /// Decode from exactly `WIDTH` bytes
    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_le_int {
    ($($ty:ty),*) => {
        $(
            impl LeInt for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_le_int!(u8, u16, u32, u64);

/// Load `count` little-endian values of type `T` starting at `offset`
pub fn load_array<T, S>(source: &S, offset: u64, count: usize) -> Result<Vec<T>>
where
    T: LeInt,
    S: ByteSource + ?Sized,
{
    load_array_chunked(source, offset, count, MAX_CHUNK_SIZE)
}

/// [`load_array`] with an explicit cap on the bytes requested per read
///
/// The effective chunk is the largest multiple of `T::WIDTH` not exceeding
/// `max_chunk_size`, and never smaller than one element.
pub fn load_array_chunked<T, S>(
    source: &S,
    offset: u64,
    count: usize,
    max_chunk_size: usize,
) -> Result<Vec<T>>
where
    T: LeInt,
    S: ByteSource + ?Sized,
{
    let total = count.checked_mul(T::WIDTH).ok_or(MsfError::TruncatedData {
        offset,
        expected: usize::MAX,
        actual: 0,
    })?;

    // Reject before allocating: a corrupt count must not size the Vec.
    let available = source.len().saturating_sub(offset);
    if (total as u64) > available {
        return Err(MsfError::TruncatedData {
            offset,
            expected: total,
            actual: available.min(usize::MAX as u64) as usize,
        });
    }

    let chunk_cap = (max_chunk_size / T::WIDTH).max(1) * T::WIDTH;
    let mut values = Vec::with_capacity(count);
    let mut remaining = total;
    let mut pos = offset;

    while remaining != 0 {
        let chunk = chunk_cap.min(remaining);
        let bytes = source.read(pos, chunk);
        if bytes.len() != chunk {
            return Err(MsfError::TruncatedData {
                offset: pos,
                expected: chunk,
                actual: bytes.len(),
            });
        }

        values.extend(bytes.chunks_exact(T::WIDTH).map(T::from_le_slice));

        remaining -= chunk;
        pos += chunk as u64;
    }

    Ok(values)
}

/// Load a single little-endian value at `offset`
pub fn load_value<T, S>(source: &S, offset: u64) -> Result<T>
where
    T: LeInt,
    S: ByteSource + ?Sized,
{
    let bytes = source.read(offset, T::WIDTH);
    if bytes.len() != T::WIDTH {
        return Err(MsfError::TruncatedData {
            offset,
            expected: T::WIDTH,
            actual: bytes.len(),
        });
    }
    Ok(T::from_le_slice(&bytes))
}
