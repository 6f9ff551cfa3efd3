//! Blob-level accessor functions.
//!
//! ST_SRID, ST_SetSRID, ST_GeometryType, ST_NDims, ST_IsEmpty, ST_AsText

use crate::error::Result;
use crate::geometry::{BlobSummary, Geometry};

/// ST_SRID: the SRS id stored in the header.
///
/// # Example
///
/// ```
/// use geopack_core::functions::accessors::st_srid;
/// use geopack_core::{Geometry, Point};
///
/// let blob = Geometry::new(Point::xy(1.0, 2.0), 4326).to_storage_bytes().unwrap();
/// assert_eq!(st_srid(&blob).unwrap(), 4326);
/// ```
pub fn st_srid(blob: &[u8]) -> Result<i32> {
    Ok(Geometry::from_storage_bytes(blob)?.srs_id())
}

/// ST_SetSRID: re-encode with another SRS id.
///
/// # Example
///
/// ```
/// use geopack_core::functions::accessors::{st_set_srid, st_srid};
/// use geopack_core::{Geometry, Point};
///
/// let blob = Geometry::new(Point::xy(1.0, 2.0), 4326).to_storage_bytes().unwrap();
/// let updated = st_set_srid(&blob, 3857).unwrap();
/// assert_eq!(st_srid(&updated).unwrap(), 3857);
/// ```
pub fn st_set_srid(blob: &[u8], srs_id: i32) -> Result<Vec<u8>> {
    Geometry::from_storage_bytes(blob)?
        .with_srs_id(srs_id)
        .to_storage_bytes()
}

/// ST_GeometryType: upper-case type name with its dimension suffix, e.g.
/// `"LINESTRING ZM"`.
///
/// # Example
///
/// ```
/// use geopack_core::functions::accessors::st_geometry_type;
/// use geopack_core::{Dimension, Geometry, Point};
///
/// let point = Point::new(Dimension::Xyz, &[1.0, 2.0, 3.0]).unwrap();
/// let blob = Geometry::new(point, 0).to_storage_bytes().unwrap();
/// assert_eq!(st_geometry_type(&blob).unwrap(), "POINT Z");
/// ```
pub fn st_geometry_type(blob: &[u8]) -> Result<String> {
    Ok(Geometry::from_storage_bytes(blob)?.geometry_type().to_string())
}

/// ST_NDims: ordinates per coordinate tuple (2, 3 or 4).
pub fn st_ndims(blob: &[u8]) -> Result<i32> {
    Ok(Geometry::from_storage_bytes(blob)?.dimension().arity() as i32)
}

/// ST_IsEmpty: true when the geometry has no position to index.
///
/// Covers the header empty flag, NaN-marked points, zero-count bodies and
/// bodies whose only coordinates are NaN.
///
/// # Example
///
/// ```
/// use geopack_core::functions::accessors::st_is_empty;
/// use geopack_core::{Dimension, Geometry, GeometryType, Point, ShapeFamily};
///
/// let blob = Geometry::new(Point::xy(1.0, 2.0), 0).to_storage_bytes().unwrap();
/// assert!(!st_is_empty(&blob).unwrap());
///
/// let line = GeometryType::new(ShapeFamily::LineString, Dimension::Xy);
/// let empty = Geometry::empty(line, 0).to_storage_bytes().unwrap();
/// assert!(st_is_empty(&empty).unwrap());
/// ```
pub fn st_is_empty(blob: &[u8]) -> Result<bool> {
    if let Some(empty) = BlobSummary::read(blob)?.is_empty {
        return Ok(empty);
    }
    let geometry = Geometry::from_storage_bytes(blob)?;
    geometry.shape()?;
    Ok(geometry.is_empty())
}

/// ST_AsText: WKT of the XY projection.
pub fn st_as_text(blob: &[u8]) -> Result<String> {
    Geometry::from_storage_bytes(blob)?.to_wkt()
}
