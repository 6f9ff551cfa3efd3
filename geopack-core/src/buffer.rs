//! Byte-order aware reading and writing of the numeric fields used by the
//! header and body codecs.
//!
//! Coordinate runs go through [`decode_f64s`] / [`put_f64s`], which move the
//! whole run with a single copy and only touch individual values when the
//! declared byte order differs from the host's.

use crate::error::{GeoPackError, Result};

/// Byte order of multi-byte fields, as declared by a header flag bit or a
/// WKB byte-order marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    BigEndian,
    #[default]
    LittleEndian,
}

impl ByteOrder {
    /// WKB marker / header flag bit value: 0 for big endian, 1 for little.
    pub fn marker(self) -> u8 {
        match self {
            ByteOrder::BigEndian => 0,
            ByteOrder::LittleEndian => 1,
        }
    }

    pub fn from_little_endian(little_endian: bool) -> Self {
        if little_endian {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }

    pub fn is_little_endian(self) -> bool {
        self == ByteOrder::LittleEndian
    }

    pub fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }
}

/// Forward-only cursor over a blob slice. `base` is the absolute offset of
/// `bytes[0]` inside the whole blob so errors can report blob positions.
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8], base: usize) -> Self {
        Self {
            bytes,
            pos: 0,
            base,
        }
    }

    pub(crate) fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub(crate) fn take(&mut self, len: usize, reason: &'static str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(GeoPackError::format(self.offset(), reason));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self, reason: &'static str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N, reason)?);
        Ok(buf)
    }

    pub(crate) fn read_u8(&mut self, reason: &'static str) -> Result<u8> {
        Ok(self.take(1, reason)?[0])
    }

    pub(crate) fn read_u32(&mut self, order: ByteOrder, reason: &'static str) -> Result<u32> {
        let buf = self.take_array::<4>(reason)?;
        Ok(match order {
            ByteOrder::BigEndian => u32::from_be_bytes(buf),
            ByteOrder::LittleEndian => u32::from_le_bytes(buf),
        })
    }

    pub(crate) fn read_i32(&mut self, order: ByteOrder, reason: &'static str) -> Result<i32> {
        let buf = self.take_array::<4>(reason)?;
        Ok(match order {
            ByteOrder::BigEndian => i32::from_be_bytes(buf),
            ByteOrder::LittleEndian => i32::from_le_bytes(buf),
        })
    }

    /// Read `count` doubles as one bulk transfer.
    pub(crate) fn read_f64s(
        &mut self,
        count: usize,
        order: ByteOrder,
        reason: &'static str,
    ) -> Result<Vec<f64>> {
        let len = count
            .checked_mul(8)
            .ok_or_else(|| GeoPackError::format(self.offset(), reason))?;
        Ok(decode_f64s(self.take(len, reason)?, order))
    }
}

/// Reinterpret a byte run as doubles in the given order.
///
/// A trailing partial value is ignored.
pub(crate) fn decode_f64s(bytes: &[u8], order: ByteOrder) -> Vec<f64> {
    let whole = bytes.len() - bytes.len() % 8;
    let mut values: Vec<f64> = bytemuck::allocation::pod_collect_to_vec(&bytes[..whole]);
    if order != ByteOrder::native() {
        for value in &mut values {
            *value = f64::from_bits(value.to_bits().swap_bytes());
        }
    }
    values
}

pub(crate) fn put_u32(out: &mut Vec<u8>, value: u32, order: ByteOrder) {
    match order {
        ByteOrder::BigEndian => out.extend_from_slice(&value.to_be_bytes()),
        ByteOrder::LittleEndian => out.extend_from_slice(&value.to_le_bytes()),
    }
}

pub(crate) fn put_i32(out: &mut Vec<u8>, value: i32, order: ByteOrder) {
    match order {
        ByteOrder::BigEndian => out.extend_from_slice(&value.to_be_bytes()),
        ByteOrder::LittleEndian => out.extend_from_slice(&value.to_le_bytes()),
    }
}

/// Append `values` in the given order as one bulk transfer.
pub(crate) fn put_f64s(out: &mut Vec<u8>, values: &[f64], order: ByteOrder) {
    if order == ByteOrder::native() {
        out.extend_from_slice(bytemuck::cast_slice(values));
        return;
    }
    out.reserve(values.len() * 8);
    for value in values {
        match order {
            ByteOrder::BigEndian => out.extend_from_slice(&value.to_be_bytes()),
            ByteOrder::LittleEndian => out.extend_from_slice(&value.to_le_bytes()),
        }
    }
}
