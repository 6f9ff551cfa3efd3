//! Shape families and their ISO WKB type codes.

use std::fmt;

use crate::dimension::Dimension;
use crate::error::{GeoPackError, Result};

const EWKB_Z_FLAG: u32 = 0x8000_0000;
const EWKB_M_FLAG: u32 = 0x4000_0000;
const EWKB_SRID_FLAG: u32 = 0x2000_0000;

const WKB_GEOMETRY_COLLECTION: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ShapeFamily {
    Point = 1,
    LineString = 2,
    Polygon = 3,
    MultiPoint = 4,
    MultiLineString = 5,
    MultiPolygon = 6,
}

impl ShapeFamily {
    pub const ALL: [ShapeFamily; 6] = [
        ShapeFamily::Point,
        ShapeFamily::LineString,
        ShapeFamily::Polygon,
        ShapeFamily::MultiPoint,
        ShapeFamily::MultiLineString,
        ShapeFamily::MultiPolygon,
    ];

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(ShapeFamily::Point),
            2 => Some(ShapeFamily::LineString),
            3 => Some(ShapeFamily::Polygon),
            4 => Some(ShapeFamily::MultiPoint),
            5 => Some(ShapeFamily::MultiLineString),
            6 => Some(ShapeFamily::MultiPolygon),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    /// Upper-case name as used in WKT and geometry column declarations.
    pub fn name(self) -> &'static str {
        match self {
            ShapeFamily::Point => "POINT",
            ShapeFamily::LineString => "LINESTRING",
            ShapeFamily::Polygon => "POLYGON",
            ShapeFamily::MultiPoint => "MULTIPOINT",
            ShapeFamily::MultiLineString => "MULTILINESTRING",
            ShapeFamily::MultiPolygon => "MULTIPOLYGON",
        }
    }

    /// Case-insensitive inverse of [`ShapeFamily::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|family| family.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Family of the parts of a multi-geometry.
    pub fn part_family(self) -> Option<ShapeFamily> {
        match self {
            ShapeFamily::MultiPoint => Some(ShapeFamily::Point),
            ShapeFamily::MultiLineString => Some(ShapeFamily::LineString),
            ShapeFamily::MultiPolygon => Some(ShapeFamily::Polygon),
            _ => None,
        }
    }

    pub fn is_multi(self) -> bool {
        self.part_family().is_some()
    }
}

impl fmt::Display for ShapeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the 24 supported (family, dimension) variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryType {
    pub family: ShapeFamily,
    pub dimension: Dimension,
}

impl GeometryType {
    pub fn new(family: ShapeFamily, dimension: Dimension) -> Self {
        Self { family, dimension }
    }

    /// Every supported variant, families outermost.
    pub fn all() -> impl Iterator<Item = GeometryType> {
        ShapeFamily::ALL.into_iter().flat_map(|family| {
            Dimension::ALL
                .into_iter()
                .map(move |dimension| GeometryType::new(family, dimension))
        })
    }

    /// ISO type code: base code plus 1000/2000/3000.
    pub fn type_code(self) -> u32 {
        self.family.code() + self.dimension.type_code_offset()
    }

    /// Parse an ISO type code. EWKB-style Z/M high bits are accepted as an
    /// alternative spelling; the EWKB SRID bit is not.
    pub fn from_type_code(code: u32) -> Result<Self> {
        let unsupported = || GeoPackError::UnsupportedGeometry { code };
        if code & EWKB_SRID_FLAG != 0 {
            return Err(unsupported());
        }
        let ewkb_z = code & EWKB_Z_FLAG != 0;
        let ewkb_m = code & EWKB_M_FLAG != 0;
        let iso = code & !(EWKB_Z_FLAG | EWKB_M_FLAG);
        let base = iso % 1000;
        if base == WKB_GEOMETRY_COLLECTION {
            return Err(unsupported());
        }
        let family = ShapeFamily::from_code(base).ok_or_else(unsupported)?;
        let iso_dimension =
            Dimension::from_type_code_offset(iso - base).ok_or_else(unsupported)?;
        let dimension = match (ewkb_z || ewkb_m, iso_dimension) {
            (false, dimension) => dimension,
            (true, Dimension::Xy) => Dimension::from_flags(ewkb_z, ewkb_m),
            (true, _) => return Err(unsupported()),
        };
        Ok(Self { family, dimension })
    }

    pub fn is_point(self) -> bool {
        self.family == ShapeFamily::Point
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dimension {
            Dimension::Xy => f.write_str(self.family.name()),
            dimension => write!(f, "{} {}", self.family.name(), dimension.label()),
        }
    }
}
