//! GeoPackage binary header: magic, version, flags, SRS id and the optional
//! envelope that precede the WKB body.
//!
//! ```text
//! bytes 0..2   "GP"
//! byte  2      version (0)
//! byte  3      flags: bit0 byte order, bits1-3 envelope code, bit4 empty,
//!              bits5-7 reserved (kept as read)
//! bytes 4..8   srs_id (i32, flag byte order)
//! bytes 8..    0, 4, 6 or 8 envelope doubles
//! ```

use crate::buffer::{put_f64s, put_i32, ByteOrder, ByteReader};
use crate::envelope::{Envelope, EnvelopeCode};
use crate::error::{GeoPackError, Result};

pub const GP_MAGIC: [u8; 2] = *b"GP";
pub const GP_VERSION: u8 = 0;

/// Size of the fixed part of the header.
pub const HEADER_PREFIX_LEN: usize = 8;

const FLAG_LITTLE_ENDIAN: u8 = 0b0000_0001;
const FLAG_ENVELOPE_MASK: u8 = 0b0000_1110;
const FLAG_EMPTY: u8 = 0b0001_0000;
const FLAG_RESERVED_MASK: u8 = 0b1110_0000;

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryHeader {
    pub version: u8,
    pub byte_order: ByteOrder,
    pub envelope_code: EnvelopeCode,
    pub is_empty: bool,
    pub srs_id: i32,
    pub envelope: Option<Envelope>,
    /// Bits 5-7 of the flag byte, in place.
    pub reserved_flags: u8,
}

impl GeometryHeader {
    pub fn new(srs_id: i32, envelope: Option<Envelope>, is_empty: bool, byte_order: ByteOrder) -> Self {
        Self {
            version: GP_VERSION,
            byte_order,
            envelope_code: envelope.map_or(EnvelopeCode::None, |e| e.code()),
            is_empty,
            srs_id,
            envelope,
            reserved_flags: 0,
        }
    }

    pub fn little_endian(&self) -> bool {
        self.byte_order.is_little_endian()
    }

    /// Total header length, including the envelope.
    pub fn byte_len(&self) -> usize {
        HEADER_PREFIX_LEN + self.envelope_code.byte_len()
    }

    pub fn flags(&self) -> u8 {
        let mut flags = self.reserved_flags & FLAG_RESERVED_MASK;
        if self.byte_order.is_little_endian() {
            flags |= FLAG_LITTLE_ENDIAN;
        }
        flags |= (self.envelope_code as u8) << 1;
        if self.is_empty {
            flags |= FLAG_EMPTY;
        }
        flags
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.reserve(self.byte_len());
        out.extend_from_slice(&GP_MAGIC);
        out.push(self.version);
        out.push(self.flags());
        put_i32(out, self.srs_id, self.byte_order);
        if let Some(envelope) = &self.envelope {
            put_f64s(out, &envelope.to_values(), self.byte_order);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        self.encode(&mut out);
        out
    }

    /// Parse the header prefix of `bytes`. Only the header bytes are read.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes, 0);
        let magic = reader.take(2, "truncated header magic")?;
        if magic != &GP_MAGIC[..] {
            return Err(GeoPackError::format(0, "bad magic"));
        }
        let version = reader.read_u8("truncated header version")?;
        if version != GP_VERSION {
            return Err(GeoPackError::format(2, "unsupported header version"));
        }
        let flags = reader.read_u8("truncated header flags")?;
        let byte_order = ByteOrder::from_little_endian(flags & FLAG_LITTLE_ENDIAN != 0);
        let envelope_code = EnvelopeCode::from_u8((flags & FLAG_ENVELOPE_MASK) >> 1)
            .ok_or_else(|| GeoPackError::format(3, "undefined envelope indicator"))?;
        let srs_id = reader.read_i32(byte_order, "truncated srs id")?;
        let values = reader.read_f64s(
            envelope_code.value_count(),
            byte_order,
            "truncated header envelope",
        )?;
        let envelope = Envelope::from_values(envelope_code, &values)?;
        if envelope.as_ref().is_some_and(|e| !e.is_ordered()) {
            return Err(GeoPackError::format(
                HEADER_PREFIX_LEN,
                "header envelope has min greater than max",
            ));
        }
        Ok(Self {
            version,
            byte_order,
            envelope_code,
            is_empty: flags & FLAG_EMPTY != 0,
            srs_id,
            envelope,
            reserved_flags: flags & FLAG_RESERVED_MASK,
        })
    }
}

/// Encode a header for the given fields.
pub fn encode_header(
    srs_id: i32,
    envelope: Option<&Envelope>,
    is_empty: bool,
    little_endian: bool,
) -> Vec<u8> {
    GeometryHeader::new(
        srs_id,
        envelope.copied(),
        is_empty,
        ByteOrder::from_little_endian(little_endian),
    )
    .to_bytes()
}

/// Decode the header prefix of a geometry blob.
pub fn decode_header(bytes: &[u8]) -> Result<GeometryHeader> {
    GeometryHeader::decode(bytes)
}
