//! Bounding-box functions.
//!
//! ST_MinX, ST_MaxX, ST_MinY, ST_MaxY, ST_MinZ, ST_MaxZ, ST_MinM, ST_MaxM
//!
//! Bounds are read from the header envelope (or a point's own coordinates)
//! without copying the body. Bodies without a usable header envelope are
//! decoded. Z and M bounds fall back to the coordinates when the header
//! envelope does not carry them. Empty geometries and absent ordinates give
//! `None`.

use crate::envelope::Envelope;
use crate::error::Result;
use crate::geometry::{BlobSummary, Geometry};

fn xy_bound(blob: &[u8], pick: fn(&Envelope) -> f64) -> Result<Option<f64>> {
    let summary = BlobSummary::read(blob)?;
    if summary.is_empty == Some(true) {
        return Ok(None);
    }
    let envelope = match summary.envelope {
        Some(envelope) => Some(envelope),
        None => Geometry::from_storage_bytes(blob)?.envelope()?,
    };
    Ok(envelope.map(|e| pick(&e)))
}

fn zm_bound(blob: &[u8], pick: fn(&Envelope) -> Option<f64>) -> Result<Option<f64>> {
    let summary = BlobSummary::read(blob)?;
    if summary.is_empty == Some(true) {
        return Ok(None);
    }
    let envelope = match summary.envelope {
        Some(envelope) if envelope.dimension() == summary.geometry_type.dimension => {
            Some(envelope)
        }
        _ => Geometry::from_storage_bytes(blob)?.full_envelope()?,
    };
    Ok(envelope.and_then(|e| pick(&e)))
}

/// ST_MinX
///
/// # Example
///
/// ```
/// use geopack_core::functions::bounds::st_min_x;
/// use geopack_core::{Dimension, Geometry, LineString};
///
/// let line = LineString::from_tuples(Dimension::Xy, [[1.0, 2.0], [3.0, 4.0]]).unwrap();
/// let blob = Geometry::new(line, 0).to_storage_bytes().unwrap();
/// assert_eq!(st_min_x(&blob).unwrap(), Some(1.0));
/// ```
pub fn st_min_x(blob: &[u8]) -> Result<Option<f64>> {
    xy_bound(blob, |e| e.min_x)
}

pub fn st_max_x(blob: &[u8]) -> Result<Option<f64>> {
    xy_bound(blob, |e| e.max_x)
}

pub fn st_min_y(blob: &[u8]) -> Result<Option<f64>> {
    xy_bound(blob, |e| e.min_y)
}

pub fn st_max_y(blob: &[u8]) -> Result<Option<f64>> {
    xy_bound(blob, |e| e.max_y)
}

/// ST_MinZ, `None` for geometries without Z.
pub fn st_min_z(blob: &[u8]) -> Result<Option<f64>> {
    zm_bound(blob, Envelope::min_z)
}

pub fn st_max_z(blob: &[u8]) -> Result<Option<f64>> {
    zm_bound(blob, Envelope::max_z)
}

/// ST_MinM, `None` for geometries without M.
pub fn st_min_m(blob: &[u8]) -> Result<Option<f64>> {
    zm_bound(blob, Envelope::min_m)
}

pub fn st_max_m(blob: &[u8]) -> Result<Option<f64>> {
    zm_bound(blob, Envelope::max_m)
}
