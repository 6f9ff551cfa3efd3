//! Flat, dimension-strided coordinate storage.

use crate::dimension::Dimension;
use crate::error::{GeoPackError, Result};

/// Coordinate tuples stored back to back, `dimension.arity()` doubles each.
///
/// Equality treats NaN ordinates as equal to each other so NaN-marked
/// values compare structurally.
#[derive(Debug, Clone, Default)]
pub struct Coords {
    dimension: Dimension,
    values: Vec<f64>,
}

impl Coords {
    pub fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            values: Vec::new(),
        }
    }

    /// Wrap a flat run. Fails when the length is not a whole number of tuples.
    pub fn from_flat(dimension: Dimension, values: Vec<f64>) -> Result<Self> {
        let arity = dimension.arity();
        if values.len() % arity != 0 {
            return Err(GeoPackError::ArityMismatch {
                dimension,
                expected: arity,
                found: values.len(),
            });
        }
        Ok(Self { dimension, values })
    }

    /// Build from per-tuple slices; every tuple must have the dimension's arity.
    pub fn from_tuples<T, I>(dimension: Dimension, tuples: I) -> Result<Self>
    where
        T: AsRef<[f64]>,
        I: IntoIterator<Item = T>,
    {
        let arity = dimension.arity();
        let mut values = Vec::new();
        for tuple in tuples {
            let tuple = tuple.as_ref();
            if tuple.len() != arity {
                return Err(GeoPackError::ArityMismatch {
                    dimension,
                    expected: arity,
                    found: tuple.len(),
                });
            }
            values.extend_from_slice(tuple);
        }
        Ok(Self { dimension, values })
    }

    /// Caller guarantees `values.len()` is a multiple of the arity.
    pub(crate) fn from_flat_unchecked(dimension: Dimension, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len() % dimension.arity(), 0);
        Self { dimension, values }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Number of tuples.
    pub fn len(&self) -> usize {
        self.values.len() / self.dimension.arity()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_flat(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&[f64]> {
        let arity = self.dimension.arity();
        self.values.get(index * arity..(index + 1) * arity)
    }

    pub fn first(&self) -> Option<&[f64]> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&[f64]> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn iter(&self) -> std::slice::ChunksExact<'_, f64> {
        self.values.chunks_exact(self.dimension.arity())
    }

    /// First tuple equals the last one.
    pub fn is_closed(&self) -> bool {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => first == last,
            _ => false,
        }
    }

    pub(crate) fn xy_coords(&self) -> Vec<geo::Coord<f64>> {
        self.iter()
            .map(|t| geo::Coord { x: t[0], y: t[1] })
            .collect()
    }
}

impl PartialEq for Coords {
    fn eq(&self, other: &Self) -> bool {
        self.dimension == other.dimension
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }
}
