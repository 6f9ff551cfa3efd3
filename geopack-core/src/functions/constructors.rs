//! Geometry constructor functions.
//!
//! ST_Point, ST_GeomFromText

use geozero::ToGeo;

use crate::dimension::Dimension;
use crate::error::{GeoPackError, Result};
use crate::geometry::Geometry;
use crate::geometry_type::{GeometryType, ShapeFamily};
use crate::shape::{Point, Shape};

/// ST_Point: XY point blob.
///
/// # Example
///
/// ```
/// use geopack_core::functions::constructors::st_point;
/// use geopack_core::functions::bounds::st_max_y;
///
/// let blob = st_point(1.0, 2.0, Some(4326)).unwrap();
/// assert_eq!(st_max_y(&blob).unwrap(), Some(2.0));
/// ```
pub fn st_point(x: f64, y: f64, srs_id: Option<i32>) -> Result<Vec<u8>> {
    Geometry::new(Point::xy(x, y), srs_id.unwrap_or(0)).to_storage_bytes()
}

/// ST_GeomFromText: parse XY WKT into a geometry blob.
///
/// `<TYPE> [Z|M|ZM] EMPTY` is accepted for every supported type.
///
/// # Example
///
/// ```
/// use geopack_core::functions::accessors::{st_geometry_type, st_is_empty};
/// use geopack_core::functions::constructors::geom_from_text;
///
/// let blob = geom_from_text("POLYGON((0 0,4 0,4 4,0 4,0 0))", None).unwrap();
/// assert_eq!(st_geometry_type(&blob).unwrap(), "POLYGON");
///
/// let empty = geom_from_text("LINESTRING Z EMPTY", Some(4326)).unwrap();
/// assert!(st_is_empty(&empty).unwrap());
/// ```
pub fn geom_from_text(wkt: &str, srs_id: Option<i32>) -> Result<Vec<u8>> {
    let srs_id = srs_id.unwrap_or(0);
    if let Some(geometry_type) = parse_empty_wkt(wkt)? {
        return Geometry::empty(geometry_type, srs_id).to_storage_bytes();
    }
    let parsed: geo::Geometry<f64> = geozero::wkt::Wkt(wkt.as_bytes()).to_geo()?;
    Geometry::new(Shape::from_geo(&parsed)?, srs_id).to_storage_bytes()
}

/// `Some(type)` for `<TYPE> [Z|M|ZM] EMPTY`, `None` for any other text.
fn parse_empty_wkt(wkt: &str) -> Result<Option<GeometryType>> {
    let words: Vec<&str> = wkt.split_whitespace().collect();
    let Some((last, rest)) = words.split_last() else {
        return Ok(None);
    };
    if !last.eq_ignore_ascii_case("EMPTY") || rest.is_empty() || rest.len() > 2 {
        return Ok(None);
    }
    let family = ShapeFamily::from_name(rest[0])
        .ok_or_else(|| GeoPackError::UnsupportedGeometryName(rest[0].to_string()))?;
    let dimension = match rest.get(1).map(|s| s.to_ascii_uppercase()).as_deref() {
        None => Dimension::Xy,
        Some("Z") => Dimension::Xyz,
        Some("M") => Dimension::Xym,
        Some("ZM") => Dimension::Xyzm,
        Some(other) => {
            return Err(GeoPackError::InvalidInput(format!(
                "unknown dimension qualifier {other:?}"
            )))
        }
    };
    Ok(Some(GeometryType::new(family, dimension)))
}
