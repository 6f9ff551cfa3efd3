//! Geometry values as stored in a GeoPackage geometry column.
//!
//! A value read from storage parses its header eagerly and keeps the WKB body
//! undecoded until coordinates are needed. Point bodies are small enough to
//! decode up front. Both the decoded shape and the derived envelope are
//! memoized in `OnceLock` cells, so a shared value decodes at most once.

use std::sync::OnceLock;

use geozero::ToWkt;
use tracing::trace;

use crate::buffer::ByteOrder;
use crate::dimension::Dimension;
use crate::envelope::Envelope;
use crate::error::{GeoPackError, Result};
use crate::geometry_type::GeometryType;
use crate::header::GeometryHeader;
use crate::options::{EncodeOptions, EnvelopePolicy};
use crate::shape::Shape;
use crate::wkb;

#[derive(Debug, Clone)]
pub struct Geometry {
    geometry_type: GeometryType,
    srs_id: i32,
    /// Set up front when the header or a cheap body peek decides it,
    /// otherwise on first use from the decoded coordinates.
    empty: OnceLock<bool>,
    header: Option<GeometryHeader>,
    body: Option<Box<[u8]>>,
    /// Absolute offset of `body` in the blob it was read from.
    body_offset: usize,
    shape: OnceLock<Shape>,
    envelope: OnceLock<Option<Envelope>>,
}

impl Geometry {
    pub fn new(shape: impl Into<Shape>, srs_id: i32) -> Self {
        let shape = shape.into();
        let envelope = shape.envelope();
        Self {
            geometry_type: shape.geometry_type(),
            srs_id,
            empty: OnceLock::from(envelope.is_none()),
            header: None,
            body: None,
            body_offset: 0,
            shape: OnceLock::from(shape),
            envelope: OnceLock::from(envelope),
        }
    }

    pub fn empty(geometry_type: GeometryType, srs_id: i32) -> Self {
        Self::new(Shape::empty(geometry_type), srs_id)
    }

    /// Parse a storage blob of any supported type. The body must be present.
    pub fn from_storage_bytes(bytes: &[u8]) -> Result<Self> {
        let header = GeometryHeader::decode(bytes)?;
        let body_offset = header.byte_len();
        let body = required_body(bytes, body_offset)?;
        Self::from_parts(header, body, body_offset)
    }

    /// Parse a storage blob that must hold `expected`.
    ///
    /// A blob flagged empty with no body at all decodes to the empty value of
    /// `expected`.
    pub fn from_storage_bytes_as(bytes: &[u8], expected: GeometryType) -> Result<Self> {
        let header = GeometryHeader::decode(bytes)?;
        let body_offset = header.byte_len();
        let body = &bytes[body_offset..];
        if body.is_empty() {
            if !header.is_empty {
                return Err(GeoPackError::format(body_offset, "missing geometry body"));
            }
            let mut geometry = Self::empty(expected, header.srs_id);
            geometry.header = Some(header);
            return Ok(geometry);
        }
        let geometry = Self::from_parts(header, body, body_offset)?;
        if geometry.geometry_type != expected {
            return Err(GeoPackError::format(
                body_offset + 1,
                "geometry type code does not match the expected type",
            ));
        }
        Ok(geometry)
    }

    fn from_parts(header: GeometryHeader, body: &[u8], body_offset: usize) -> Result<Self> {
        let geometry_type = checked_body_type(&header, body, body_offset)?;
        let shape = OnceLock::new();
        let empty = OnceLock::new();
        if geometry_type.is_point() {
            let point = wkb::decode_body_at(body, body_offset, Some(geometry_type))?;
            let _ = empty.set(header.is_empty || point.is_empty());
            let _ = shape.set(point);
        } else if let Some(decided) = prefix_emptiness(&header, body, body_offset)? {
            let _ = empty.set(decided);
        }
        Ok(Self {
            geometry_type,
            srs_id: header.srs_id,
            empty,
            header: Some(header),
            body: Some(body.into()),
            body_offset,
            shape,
            envelope: OnceLock::new(),
        })
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    pub fn dimension(&self) -> Dimension {
        self.geometry_type.dimension
    }

    pub fn srs_id(&self) -> i32 {
        self.srs_id
    }

    /// Header the value was read with, `None` for values built in memory.
    pub fn header(&self) -> Option<&GeometryHeader> {
        self.header.as_ref()
    }

    /// True when the value has no real position: the header empty flag,
    /// zero counts, NaN-marked points, or parts that are all empty.
    ///
    /// A body that cannot be decoded counts as non-empty; [`Geometry::shape`]
    /// reports the error.
    pub fn is_empty(&self) -> bool {
        *self.empty.get_or_init(|| {
            self.shape()
                .map(|shape| shape.envelope().is_none())
                .unwrap_or(false)
        })
    }

    /// Whether the body has been decoded yet.
    pub fn is_decoded(&self) -> bool {
        self.shape.get().is_some()
    }

    /// Decoded shape, decoding the body on first use.
    pub fn shape(&self) -> Result<&Shape> {
        if let Some(shape) = self.shape.get() {
            return Ok(shape);
        }
        let body = self.body.as_deref().ok_or_else(|| {
            GeoPackError::InvalidInput("geometry has neither a shape nor a body".to_string())
        })?;
        trace!(
            geometry_type = %self.geometry_type,
            body_len = body.len(),
            "decoding geometry body"
        );
        let decoded = wkb::decode_body_at(body, self.body_offset, Some(self.geometry_type))?;
        Ok(self.shape.get_or_init(|| decoded))
    }

    /// Bounding box: the header envelope when there is one, otherwise derived
    /// from the coordinates. `None` for empty values.
    pub fn envelope(&self) -> Result<Option<Envelope>> {
        if let Some(envelope) = self.envelope.get() {
            return Ok(*envelope);
        }
        let header_envelope = self
            .header
            .as_ref()
            .and_then(|h| h.envelope)
            .filter(Envelope::has_xy);
        let envelope = if self.empty.get() == Some(&true) {
            None
        } else if let Some(envelope) = header_envelope {
            Some(envelope)
        } else {
            self.shape()?.envelope()
        };
        Ok(*self.envelope.get_or_init(|| envelope))
    }

    /// Like [`Geometry::envelope`], but covering every ordinate of the
    /// geometry's dimensionality even when the header only stores XY.
    pub fn full_envelope(&self) -> Result<Option<Envelope>> {
        match self.envelope()? {
            Some(envelope) if envelope.dimension() == self.dimension() => Ok(Some(envelope)),
            Some(_) => Ok(self.shape()?.envelope()),
            None => Ok(None),
        }
    }

    pub fn to_storage_bytes(&self) -> Result<Vec<u8>> {
        self.to_storage_bytes_with(&EncodeOptions::default())
    }

    pub fn to_storage_bytes_with(&self, options: &EncodeOptions) -> Result<Vec<u8>> {
        let empty = self.is_empty();
        let envelope = if empty {
            None
        } else {
            match options.envelope {
                EnvelopePolicy::Auto => self
                    .full_envelope()?
                    .map(|e| e.restricted_to(self.dimension())),
                EnvelopePolicy::Omit => None,
                EnvelopePolicy::XyOnly => self.envelope()?.map(|e| e.xy()),
            }
        };
        let mut header = GeometryHeader::new(self.srs_id, envelope, empty, options.byte_order);
        if let Some(source) = &self.header {
            header.reserved_flags = source.reserved_flags;
        }
        let mut out = header.to_bytes();
        match (self.body.as_deref(), self.shape.get()) {
            (Some(body), None) if body_byte_order(body) == Some(options.byte_order) => {
                out.extend_from_slice(body);
            }
            _ => wkb::write_body(&mut out, self.shape()?, options.byte_order)?,
        }
        Ok(out)
    }

    /// Copy tagged with another SRS id.
    pub fn with_srs_id(&self, srs_id: i32) -> Self {
        let mut geometry = self.clone();
        geometry.srs_id = srs_id;
        if let Some(header) = &mut geometry.header {
            header.srs_id = srs_id;
        }
        geometry
    }

    /// XY projection as a `geo` geometry.
    pub fn to_geo(&self) -> Result<geo::Geometry<f64>> {
        self.shape()?.to_geo()
    }

    /// WKT of the XY projection, `"<TYPE> EMPTY"` for empty values.
    pub fn to_wkt(&self) -> Result<String> {
        if self.is_empty() {
            return Ok(format!("{} EMPTY", self.geometry_type));
        }
        Ok(self.to_geo()?.to_wkt()?)
    }
}

/// What a storage blob's header and body prefix say without touching the
/// coordinates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlobSummary {
    pub geometry_type: GeometryType,
    /// `None` when only the coordinates can tell.
    pub is_empty: Option<bool>,
    /// Bounds known without a body copy: the header envelope when it holds
    /// real XY values, else a point's own bounds.
    pub envelope: Option<Envelope>,
}

impl BlobSummary {
    /// Validate what [`Geometry::from_storage_bytes`] validates up front and
    /// summarize the blob without copying its body.
    pub(crate) fn read(bytes: &[u8]) -> Result<Self> {
        let header = GeometryHeader::decode(bytes)?;
        let body_offset = header.byte_len();
        let body = required_body(bytes, body_offset)?;
        let geometry_type = checked_body_type(&header, body, body_offset)?;
        if geometry_type.is_point() {
            let point = wkb::decode_body_at(body, body_offset, Some(geometry_type))?;
            let is_empty = header.is_empty || point.is_empty();
            let envelope = match header.envelope.filter(Envelope::has_xy) {
                _ if is_empty => None,
                Some(envelope) => Some(envelope),
                None => point.envelope(),
            };
            return Ok(Self {
                geometry_type,
                is_empty: Some(is_empty),
                envelope,
            });
        }
        let is_empty = prefix_emptiness(&header, body, body_offset)?;
        let envelope = match is_empty {
            Some(false) => header.envelope.filter(Envelope::has_xy),
            _ => None,
        };
        Ok(Self {
            geometry_type,
            is_empty,
            envelope,
        })
    }
}

fn required_body(bytes: &[u8], body_offset: usize) -> Result<&[u8]> {
    let body = &bytes[body_offset..];
    if body.is_empty() {
        return Err(GeoPackError::format(body_offset, "missing geometry body"));
    }
    Ok(body)
}

/// Body type, checked against the ordinates the header envelope carries.
fn checked_body_type(
    header: &GeometryHeader,
    body: &[u8],
    body_offset: usize,
) -> Result<GeometryType> {
    let geometry_type = wkb::peek_geometry_type_at(body, body_offset)?;
    if let Some(envelope) = &header.envelope {
        let dimension = envelope.dimension();
        if (dimension.has_z() && !geometry_type.dimension.has_z())
            || (dimension.has_m() && !geometry_type.dimension.has_m())
        {
            return Err(GeoPackError::format(
                3,
                "header envelope has ordinates the geometry lacks",
            ));
        }
    }
    Ok(geometry_type)
}

/// Emptiness of a non-point body as far as the header flag, the top-level
/// count and the header envelope decide it.
fn prefix_emptiness(
    header: &GeometryHeader,
    body: &[u8],
    body_offset: usize,
) -> Result<Option<bool>> {
    if header.is_empty || wkb::peek_count_at(body, body_offset)? == Some(0) {
        Ok(Some(true))
    } else if header.envelope.as_ref().is_some_and(Envelope::has_xy) {
        Ok(Some(false))
    } else {
        Ok(None)
    }
}

fn body_byte_order(body: &[u8]) -> Option<ByteOrder> {
    match body.first() {
        Some(0) => Some(ByteOrder::BigEndian),
        Some(1) => Some(ByteOrder::LittleEndian),
        _ => None,
    }
}

/// Structural equality: same type, SRS id, emptiness and coordinates.
/// Values whose bodies fail to decode are never equal.
impl PartialEq for Geometry {
    fn eq(&self, other: &Self) -> bool {
        if self.geometry_type != other.geometry_type
            || self.srs_id != other.srs_id
            || self.is_empty() != other.is_empty()
        {
            return false;
        }
        match (self.shape(), other.shape()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Shape> for Geometry {
    fn from(shape: Shape) -> Self {
        Geometry::new(shape, 0)
    }
}
