//! Coordinate dimensionality shared by the header, the body codec and
//! column declarations.

use std::fmt;

/// One of the four coordinate layouts a geometry value can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dimension {
    #[default]
    Xy,
    Xyz,
    Xym,
    Xyzm,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Xy,
        Dimension::Xyz,
        Dimension::Xym,
        Dimension::Xyzm,
    ];

    pub fn from_flags(has_z: bool, has_m: bool) -> Self {
        match (has_z, has_m) {
            (false, false) => Dimension::Xy,
            (true, false) => Dimension::Xyz,
            (false, true) => Dimension::Xym,
            (true, true) => Dimension::Xyzm,
        }
    }

    pub fn has_z(self) -> bool {
        matches!(self, Dimension::Xyz | Dimension::Xyzm)
    }

    pub fn has_m(self) -> bool {
        matches!(self, Dimension::Xym | Dimension::Xyzm)
    }

    /// Number of doubles per coordinate tuple.
    pub fn arity(self) -> usize {
        2 + self.has_z() as usize + self.has_m() as usize
    }

    /// ISO WKB type code offset (0, 1000, 2000 or 3000).
    pub fn type_code_offset(self) -> u32 {
        match self {
            Dimension::Xy => 0,
            Dimension::Xyz => 1000,
            Dimension::Xym => 2000,
            Dimension::Xyzm => 3000,
        }
    }

    pub fn from_type_code_offset(offset: u32) -> Option<Self> {
        match offset {
            0 => Some(Dimension::Xy),
            1000 => Some(Dimension::Xyz),
            2000 => Some(Dimension::Xym),
            3000 => Some(Dimension::Xyzm),
            _ => None,
        }
    }

    /// WKT dimension suffix (`""`, `"Z"`, `"M"`, `"ZM"`).
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Xy => "",
            Dimension::Xyz => "Z",
            Dimension::Xym => "M",
            Dimension::Xyzm => "ZM",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Xy => f.write_str("XY"),
            Dimension::Xyz => f.write_str("XYZ"),
            Dimension::Xym => f.write_str("XYM"),
            Dimension::Xyzm => f.write_str("XYZM"),
        }
    }
}
