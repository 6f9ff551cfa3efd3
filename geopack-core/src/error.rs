use thiserror::Error;

use crate::dimension::Dimension;

#[derive(Debug, Error)]
pub enum GeoPackError {
    /// Malformed blob. `offset` is the absolute byte position at which the
    /// inconsistency was detected.
    #[error("malformed geometry blob at byte {offset}: {reason}")]
    Format { offset: usize, reason: &'static str },

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: Dimension, found: Dimension },

    #[error("coordinate arity mismatch: {dimension} takes {expected} ordinates per tuple, got {found}")]
    ArityMismatch {
        dimension: Dimension,
        expected: usize,
        found: usize,
    },

    #[error("unsupported geometry type code {code}")]
    UnsupportedGeometry { code: u32 },

    #[error("unsupported geometry type name {0:?}")]
    UnsupportedGeometryName(String),

    #[error("spatial index for {table}.{column} is not registered")]
    IndexConsistency { table: String, column: String },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(&'static str),

    #[error("geozero error: {0}")]
    Geozero(#[from] geozero::error::GeozeroError),

    #[error("{0}")]
    InvalidInput(String),
}

impl GeoPackError {
    pub(crate) fn format(offset: usize, reason: &'static str) -> Self {
        GeoPackError::Format { offset, reason }
    }

    /// `true` for the error kinds that signal a corrupt or foreign blob.
    pub fn is_format(&self) -> bool {
        matches!(self, GeoPackError::Format { .. })
    }

    /// `true` for both the column-flag and the tuple-arity flavours of a
    /// dimensionality disagreement.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            GeoPackError::DimensionMismatch { .. } | GeoPackError::ArityMismatch { .. }
        )
    }

    pub fn is_unsupported_geometry(&self) -> bool {
        matches!(
            self,
            GeoPackError::UnsupportedGeometry { .. } | GeoPackError::UnsupportedGeometryName(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GeoPackError>;
