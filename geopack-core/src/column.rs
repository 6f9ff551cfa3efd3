//! Geometry column declarations (`gpkg_geometry_columns` rows) and the check
//! that a value may be stored in a column.

use crate::dimension::Dimension;
use crate::error::{GeoPackError, Result};
use crate::geometry::Geometry;
use crate::geometry_type::ShapeFamily;

/// Z / M flag of a geometry column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ZmFlag {
    #[default]
    Prohibited = 0,
    Mandatory = 1,
    Optional = 2,
}

impl ZmFlag {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ZmFlag::Prohibited),
            1 => Some(ZmFlag::Mandatory),
            2 => Some(ZmFlag::Optional),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    fn allows(self, present: bool) -> bool {
        match self {
            ZmFlag::Prohibited => !present,
            ZmFlag::Mandatory => present,
            ZmFlag::Optional => true,
        }
    }
}

/// Declared geometry type of a column: one family, or `GEOMETRY` for any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnGeometryType {
    Any,
    Family(ShapeFamily),
}

impl ColumnGeometryType {
    pub fn parse(name: &str) -> Result<Self> {
        if name.trim().eq_ignore_ascii_case("GEOMETRY") {
            return Ok(ColumnGeometryType::Any);
        }
        ShapeFamily::from_name(name)
            .map(ColumnGeometryType::Family)
            .ok_or_else(|| GeoPackError::UnsupportedGeometryName(name.to_string()))
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnGeometryType::Any => "GEOMETRY",
            ColumnGeometryType::Family(family) => family.name(),
        }
    }

    pub fn accepts(self, family: ShapeFamily) -> bool {
        match self {
            ColumnGeometryType::Any => true,
            ColumnGeometryType::Family(declared) => declared == family,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDeclaration {
    pub geometry_type: ColumnGeometryType,
    pub srs_id: i32,
    pub z: ZmFlag,
    pub m: ZmFlag,
}

impl ColumnDeclaration {
    pub fn new(geometry_type_name: &str, srs_id: i32, z: ZmFlag, m: ZmFlag) -> Result<Self> {
        Ok(Self {
            geometry_type: ColumnGeometryType::parse(geometry_type_name)?,
            srs_id,
            z,
            m,
        })
    }

    /// Dimensionality to use for new values: ordinates are included unless
    /// prohibited.
    pub fn preferred_dimension(&self) -> Dimension {
        Dimension::from_flags(self.z != ZmFlag::Prohibited, self.m != ZmFlag::Prohibited)
    }

    /// Check that `geometry` may be stored in this column.
    pub fn validate(&self, geometry: &Geometry) -> Result<()> {
        let dimension = geometry.dimension();
        if !self.z.allows(dimension.has_z()) || !self.m.allows(dimension.has_m()) {
            return Err(GeoPackError::DimensionMismatch {
                expected: self.closest_dimension(dimension),
                found: dimension,
            });
        }
        let family = geometry.geometry_type().family;
        if !self.geometry_type.accepts(family) {
            return Err(GeoPackError::UnsupportedGeometry {
                code: geometry.geometry_type().type_code(),
            });
        }
        if geometry.srs_id() != self.srs_id {
            return Err(GeoPackError::InvalidInput(format!(
                "srs id {} does not match column srs id {}",
                geometry.srs_id(),
                self.srs_id
            )));
        }
        Ok(())
    }

    /// The permitted dimensionality nearest to `found`, for error reporting.
    fn closest_dimension(&self, found: Dimension) -> Dimension {
        let pick = |flag: ZmFlag, present: bool| match flag {
            ZmFlag::Prohibited => false,
            ZmFlag::Mandatory => true,
            ZmFlag::Optional => present,
        };
        Dimension::from_flags(pick(self.z, found.has_z()), pick(self.m, found.has_m()))
    }
}
