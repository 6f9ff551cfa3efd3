//! Axis-aligned bounding boxes and the header envelope indicator codes.

use crate::dimension::Dimension;
use crate::error::{GeoPackError, Result};

/// Header envelope indicator (flag bits 1-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum EnvelopeCode {
    #[default]
    None = 0,
    Xy = 1,
    Xyz = 2,
    Xym = 3,
    Xyzm = 4,
}

impl EnvelopeCode {
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(EnvelopeCode::None),
            1 => Some(EnvelopeCode::Xy),
            2 => Some(EnvelopeCode::Xyz),
            3 => Some(EnvelopeCode::Xym),
            4 => Some(EnvelopeCode::Xyzm),
            _ => None,
        }
    }

    pub fn for_dimension(dimension: Dimension) -> Self {
        match dimension {
            Dimension::Xy => EnvelopeCode::Xy,
            Dimension::Xyz => EnvelopeCode::Xyz,
            Dimension::Xym => EnvelopeCode::Xym,
            Dimension::Xyzm => EnvelopeCode::Xyzm,
        }
    }

    /// Dimensionality covered by the envelope, `None` for code 0.
    pub fn dimension(self) -> Option<Dimension> {
        match self {
            EnvelopeCode::None => None,
            EnvelopeCode::Xy => Some(Dimension::Xy),
            EnvelopeCode::Xyz => Some(Dimension::Xyz),
            EnvelopeCode::Xym => Some(Dimension::Xym),
            EnvelopeCode::Xyzm => Some(Dimension::Xyzm),
        }
    }

    pub fn value_count(self) -> usize {
        self.dimension().map_or(0, |d| d.arity() * 2)
    }

    /// 0, 32, 48, 48 or 64.
    pub fn byte_len(self) -> usize {
        self.value_count() * 8
    }
}

/// Closed interval on one ordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub z: Option<Bounds>,
    pub m: Option<Bounds>,
}

impl Envelope {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            z: None,
            m: None,
        }
    }

    pub fn with_z(mut self, min_z: f64, max_z: f64) -> Self {
        self.z = Some(Bounds::new(min_z, max_z));
        self
    }

    pub fn with_m(mut self, min_m: f64, max_m: f64) -> Self {
        self.m = Some(Bounds::new(min_m, max_m));
        self
    }

    pub fn dimension(&self) -> Dimension {
        Dimension::from_flags(self.z.is_some(), self.m.is_some())
    }

    pub fn code(&self) -> EnvelopeCode {
        EnvelopeCode::for_dimension(self.dimension())
    }

    pub fn min_z(&self) -> Option<f64> {
        self.z.map(|b| b.min)
    }

    pub fn max_z(&self) -> Option<f64> {
        self.z.map(|b| b.max)
    }

    pub fn min_m(&self) -> Option<f64> {
        self.m.map(|b| b.min)
    }

    pub fn max_m(&self) -> Option<f64> {
        self.m.map(|b| b.max)
    }

    /// The XY part only.
    pub fn xy(&self) -> Envelope {
        Envelope::new(self.min_x, self.max_x, self.min_y, self.max_y)
    }

    /// Keep only the ordinates present in `dimension`.
    pub(crate) fn restricted_to(&self, dimension: Dimension) -> Envelope {
        Envelope {
            z: self.z.filter(|_| dimension.has_z()),
            m: self.m.filter(|_| dimension.has_m()),
            ..*self
        }
    }

    /// Smallest envelope covering both. An ordinate present on only one side
    /// keeps that side's bounds.
    pub fn union(&self, other: &Envelope) -> Envelope {
        let merge = |a: Option<Bounds>, b: Option<Bounds>| match (a, b) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        };
        Envelope {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
            z: merge(self.z, other.z),
            m: merge(self.m, other.m),
        }
    }

    /// `min <= max` on every present ordinate. NaN bounds mark an ordinate
    /// with no value and are not compared.
    pub fn is_ordered(&self) -> bool {
        let ordered = |min: f64, max: f64| min.is_nan() || max.is_nan() || min <= max;
        let ordered_opt = |b: Option<Bounds>| b.is_none_or(|b| ordered(b.min, b.max));
        ordered(self.min_x, self.max_x)
            && ordered(self.min_y, self.max_y)
            && ordered_opt(self.z)
            && ordered_opt(self.m)
    }

    /// Whether the XY bounds hold real values.
    pub fn has_xy(&self) -> bool {
        !(self.min_x.is_nan() || self.max_x.is_nan() || self.min_y.is_nan() || self.max_y.is_nan())
    }

    /// Values in header order: x, y, then z and m when present.
    pub fn to_values(&self) -> Vec<f64> {
        let mut values = vec![self.min_x, self.max_x, self.min_y, self.max_y];
        if let Some(z) = self.z {
            values.extend_from_slice(&[z.min, z.max]);
        }
        if let Some(m) = self.m {
            values.extend_from_slice(&[m.min, m.max]);
        }
        values
    }

    /// Inverse of [`Envelope::to_values`] for a given indicator code.
    pub fn from_values(code: EnvelopeCode, values: &[f64]) -> Result<Option<Envelope>> {
        if values.len() != code.value_count() {
            return Err(GeoPackError::InvalidInput(format!(
                "envelope code {} takes {} values, got {}",
                code as u8,
                code.value_count(),
                values.len()
            )));
        }
        let Some(dimension) = code.dimension() else {
            return Ok(None);
        };
        let mut envelope = Envelope::new(values[0], values[1], values[2], values[3]);
        let mut rest = &values[4..];
        if dimension.has_z() {
            envelope.z = Some(Bounds::new(rest[0], rest[1]));
            rest = &rest[2..];
        }
        if dimension.has_m() {
            envelope.m = Some(Bounds::new(rest[0], rest[1]));
        }
        Ok(Some(envelope))
    }

    /// Closed counter-clockwise XY rectangle starting at `(min_x, min_y)`.
    pub fn to_polygon(&self) -> geo::Polygon<f64> {
        geo::Polygon::new(
            geo::LineString::from(vec![
                (self.min_x, self.min_y),
                (self.max_x, self.min_y),
                (self.max_x, self.max_y),
                (self.min_x, self.max_y),
                (self.min_x, self.min_y),
            ]),
            vec![],
        )
    }
}

/// Rectangle for `envelope`, or an empty polygon when there is none.
pub fn envelope_polygon(envelope: Option<&Envelope>) -> geo::Polygon<f64> {
    match envelope {
        Some(envelope) => envelope.to_polygon(),
        None => geo::Polygon::new(geo::LineString::new(vec![]), vec![]),
    }
}

/// Running componentwise min/max over coordinate tuples. NaN ordinates are
/// skipped, so NaN-marked empty points contribute nothing.
#[derive(Debug, Clone)]
pub(crate) struct EnvelopeBuilder {
    dimension: Dimension,
    min: [f64; 4],
    max: [f64; 4],
}

impl EnvelopeBuilder {
    pub(crate) fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            min: [f64::INFINITY; 4],
            max: [f64::NEG_INFINITY; 4],
        }
    }

    /// Add every tuple of a flat, `dimension`-strided coordinate run.
    pub(crate) fn add_flat(&mut self, values: &[f64]) {
        let arity = self.dimension.arity();
        for tuple in values.chunks_exact(arity) {
            for (axis, &v) in tuple.iter().enumerate() {
                if v.is_nan() {
                    continue;
                }
                self.min[axis] = self.min[axis].min(v);
                self.max[axis] = self.max[axis].max(v);
            }
        }
    }

    /// `None` when no tuple contributed a real X and Y.
    pub(crate) fn finish(&self) -> Option<Envelope> {
        if self.min[0] > self.max[0] || self.min[1] > self.max[1] {
            return None;
        }
        let axis = |i: usize| {
            if self.min[i] > self.max[i] {
                Bounds::new(f64::NAN, f64::NAN)
            } else {
                Bounds::new(self.min[i], self.max[i])
            }
        };
        let mut envelope = Envelope::new(self.min[0], self.max[0], self.min[1], self.max[1]);
        let mut next = 2;
        if self.dimension.has_z() {
            envelope.z = Some(axis(next));
            next += 1;
        }
        if self.dimension.has_m() {
            envelope.m = Some(axis(next));
        }
        Some(envelope)
    }
}
