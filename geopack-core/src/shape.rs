//! Decoded geometry shapes: the six families, each carrying its
//! dimensionality.

use crate::coords::Coords;
use crate::dimension::Dimension;
use crate::envelope::{Envelope, EnvelopeBuilder};
use crate::error::{GeoPackError, Result};
use crate::geometry_type::{GeometryType, ShapeFamily};

fn check_dimension(expected: Dimension, found: Dimension) -> Result<()> {
    if expected != found {
        return Err(GeoPackError::DimensionMismatch { expected, found });
    }
    Ok(())
}

/// A single position, or no position at all for an empty point.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    coords: Coords,
}

impl Point {
    pub fn new(dimension: Dimension, tuple: &[f64]) -> Result<Self> {
        Ok(Self {
            coords: Coords::from_tuples(dimension, [tuple])?,
        })
    }

    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            coords: Coords::from_flat_unchecked(Dimension::Xy, vec![x, y]),
        }
    }

    pub fn empty(dimension: Dimension) -> Self {
        Self {
            coords: Coords::new(dimension),
        }
    }

    pub(crate) fn from_coords(coords: Coords) -> Self {
        debug_assert!(coords.len() <= 1);
        Self { coords }
    }

    pub fn dimension(&self) -> Dimension {
        self.coords.dimension()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn coords(&self) -> &Coords {
        &self.coords
    }

    /// The ordinates, `None` for an empty point.
    pub fn tuple(&self) -> Option<&[f64]> {
        self.coords.first()
    }

    pub fn x(&self) -> Option<f64> {
        self.tuple().map(|t| t[0])
    }

    pub fn y(&self) -> Option<f64> {
        self.tuple().map(|t| t[1])
    }

    pub fn z(&self) -> Option<f64> {
        if !self.dimension().has_z() {
            return None;
        }
        self.tuple().map(|t| t[2])
    }

    pub fn m(&self) -> Option<f64> {
        if !self.dimension().has_m() {
            return None;
        }
        let index = self.dimension().arity() - 1;
        self.tuple().map(|t| t[index])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineString {
    coords: Coords,
}

impl LineString {
    pub fn new(coords: Coords) -> Self {
        Self { coords }
    }

    pub fn from_tuples<T: AsRef<[f64]>>(
        dimension: Dimension,
        tuples: impl IntoIterator<Item = T>,
    ) -> Result<Self> {
        Ok(Self::new(Coords::from_tuples(dimension, tuples)?))
    }

    pub fn empty(dimension: Dimension) -> Self {
        Self::new(Coords::new(dimension))
    }

    pub fn dimension(&self) -> Dimension {
        self.coords.dimension()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn coords(&self) -> &Coords {
        &self.coords
    }

    pub fn num_points(&self) -> usize {
        self.coords.len()
    }
}

/// Closed coordinate run bounding a polygon.
///
/// [`LinearRing::new`] requires zero points or at least four with the first
/// equal to the last. Decoded rings keep whatever the blob held.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRing {
    coords: Coords,
}

impl LinearRing {
    pub fn new(coords: Coords) -> Result<Self> {
        if !coords.is_empty() {
            if coords.len() < 4 {
                return Err(GeoPackError::InvalidGeometry(
                    "linear ring needs at least four points",
                ));
            }
            if !coords.is_closed() {
                return Err(GeoPackError::InvalidGeometry("linear ring is not closed"));
            }
        }
        Ok(Self { coords })
    }

    pub fn from_tuples<T: AsRef<[f64]>>(
        dimension: Dimension,
        tuples: impl IntoIterator<Item = T>,
    ) -> Result<Self> {
        Self::new(Coords::from_tuples(dimension, tuples)?)
    }

    pub(crate) fn from_coords_unchecked(coords: Coords) -> Self {
        Self { coords }
    }

    pub fn dimension(&self) -> Dimension {
        self.coords.dimension()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn coords(&self) -> &Coords {
        &self.coords
    }

    pub fn num_points(&self) -> usize {
        self.coords.len()
    }
}

/// Exterior ring first, holes after.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    dimension: Dimension,
    rings: Vec<LinearRing>,
}

impl Polygon {
    pub fn new(dimension: Dimension, rings: Vec<LinearRing>) -> Result<Self> {
        for ring in &rings {
            check_dimension(dimension, ring.dimension())?;
        }
        Ok(Self { dimension, rings })
    }

    pub fn empty(dimension: Dimension) -> Self {
        Self {
            dimension,
            rings: Vec::new(),
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// True when every ring is empty, including when there are none.
    pub fn is_empty(&self) -> bool {
        self.rings.iter().all(LinearRing::is_empty)
    }

    pub fn rings(&self) -> &[LinearRing] {
        &self.rings
    }

    pub fn exterior(&self) -> Option<&LinearRing> {
        self.rings.first()
    }

    pub fn interiors(&self) -> &[LinearRing] {
        self.rings.get(1..).unwrap_or(&[])
    }

    pub fn num_points(&self) -> usize {
        self.rings.iter().map(LinearRing::num_points).sum()
    }
}

macro_rules! multi_shape {
    ($name:ident, $part:ident, $parts:ident) => {
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            dimension: Dimension,
            $parts: Vec<$part>,
        }

        impl $name {
            /// Every part must share `dimension`.
            pub fn new(dimension: Dimension, $parts: Vec<$part>) -> Result<Self> {
                for part in &$parts {
                    check_dimension(dimension, part.dimension())?;
                }
                Ok(Self { dimension, $parts })
            }

            pub fn empty(dimension: Dimension) -> Self {
                Self {
                    dimension,
                    $parts: Vec::new(),
                }
            }

            pub fn dimension(&self) -> Dimension {
                self.dimension
            }

            /// True when no part holds a coordinate.
            pub fn is_empty(&self) -> bool {
                self.$parts.iter().all(|part| part.is_empty())
            }

            pub fn $parts(&self) -> &[$part] {
                &self.$parts
            }

            pub fn num_parts(&self) -> usize {
                self.$parts.len()
            }
        }
    };
}

multi_shape!(MultiPoint, Point, points);
multi_shape!(MultiLineString, LineString, lines);
multi_shape!(MultiPolygon, Polygon, polygons);

/// Any supported shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(Point),
    LineString(LineString),
    Polygon(Polygon),
    MultiPoint(MultiPoint),
    MultiLineString(MultiLineString),
    MultiPolygon(MultiPolygon),
}

impl Shape {
    /// Canonical empty value of a variant.
    pub fn empty(geometry_type: GeometryType) -> Self {
        let dimension = geometry_type.dimension;
        match geometry_type.family {
            ShapeFamily::Point => Shape::Point(Point::empty(dimension)),
            ShapeFamily::LineString => Shape::LineString(LineString::empty(dimension)),
            ShapeFamily::Polygon => Shape::Polygon(Polygon::empty(dimension)),
            ShapeFamily::MultiPoint => Shape::MultiPoint(MultiPoint::empty(dimension)),
            ShapeFamily::MultiLineString => {
                Shape::MultiLineString(MultiLineString::empty(dimension))
            }
            ShapeFamily::MultiPolygon => Shape::MultiPolygon(MultiPolygon::empty(dimension)),
        }
    }

    pub fn family(&self) -> ShapeFamily {
        match self {
            Shape::Point(_) => ShapeFamily::Point,
            Shape::LineString(_) => ShapeFamily::LineString,
            Shape::Polygon(_) => ShapeFamily::Polygon,
            Shape::MultiPoint(_) => ShapeFamily::MultiPoint,
            Shape::MultiLineString(_) => ShapeFamily::MultiLineString,
            Shape::MultiPolygon(_) => ShapeFamily::MultiPolygon,
        }
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            Shape::Point(s) => s.dimension(),
            Shape::LineString(s) => s.dimension(),
            Shape::Polygon(s) => s.dimension(),
            Shape::MultiPoint(s) => s.dimension(),
            Shape::MultiLineString(s) => s.dimension(),
            Shape::MultiPolygon(s) => s.dimension(),
        }
    }

    pub fn geometry_type(&self) -> GeometryType {
        GeometryType::new(self.family(), self.dimension())
    }

    /// No coordinate anywhere: zero counts, empty parts, or points without
    /// a position.
    pub fn is_empty(&self) -> bool {
        match self {
            Shape::Point(s) => s.is_empty(),
            Shape::LineString(s) => s.is_empty(),
            Shape::Polygon(s) => s.is_empty(),
            Shape::MultiPoint(s) => s.is_empty(),
            Shape::MultiLineString(s) => s.is_empty(),
            Shape::MultiPolygon(s) => s.is_empty(),
        }
    }

    /// Call `f` with every flat coordinate run, in encoding order.
    pub fn for_each_coords(&self, mut f: impl FnMut(&Coords)) {
        fn polygon(p: &Polygon, f: &mut dyn FnMut(&Coords)) {
            for ring in p.rings() {
                f(ring.coords());
            }
        }
        match self {
            Shape::Point(p) => f(p.coords()),
            Shape::LineString(l) => f(l.coords()),
            Shape::Polygon(p) => polygon(p, &mut f),
            Shape::MultiPoint(mp) => mp.points().iter().for_each(|p| f(p.coords())),
            Shape::MultiLineString(ml) => ml.lines().iter().for_each(|l| f(l.coords())),
            Shape::MultiPolygon(mp) => {
                for p in mp.polygons() {
                    polygon(p, &mut f);
                }
            }
        }
    }

    pub fn num_points(&self) -> usize {
        let mut count = 0;
        self.for_each_coords(|c| count += c.len());
        count
    }

    /// Componentwise min/max over every coordinate, `None` when there is no
    /// real position.
    pub fn envelope(&self) -> Option<Envelope> {
        let mut builder = EnvelopeBuilder::new(self.dimension());
        self.for_each_coords(|c| builder.add_flat(c.as_flat()));
        builder.finish()
    }

    /// XY projection as a `geo` geometry. Empty points inside multi-points
    /// are skipped; a bare empty point has no `geo` counterpart.
    pub fn to_geo(&self) -> Result<geo::Geometry<f64>> {
        fn line(coords: &Coords) -> geo::LineString<f64> {
            geo::LineString::new(coords.xy_coords())
        }
        fn polygon(p: &Polygon) -> geo::Polygon<f64> {
            let exterior = p
                .exterior()
                .map_or_else(|| geo::LineString::new(vec![]), |r| line(r.coords()));
            let interiors = p.interiors().iter().map(|r| line(r.coords())).collect();
            geo::Polygon::new(exterior, interiors)
        }
        fn point(p: &Point) -> Option<geo::Point<f64>> {
            p.tuple().map(|t| geo::Point::new(t[0], t[1]))
        }
        Ok(match self {
            Shape::Point(p) => geo::Geometry::Point(
                point(p).ok_or(GeoPackError::InvalidGeometry("empty point has no XY position"))?,
            ),
            Shape::LineString(l) => geo::Geometry::LineString(line(l.coords())),
            Shape::Polygon(p) => geo::Geometry::Polygon(polygon(p)),
            Shape::MultiPoint(mp) => geo::Geometry::MultiPoint(geo::MultiPoint::new(
                mp.points().iter().filter_map(point).collect(),
            )),
            Shape::MultiLineString(ml) => geo::Geometry::MultiLineString(
                geo::MultiLineString::new(ml.lines().iter().map(|l| line(l.coords())).collect()),
            ),
            Shape::MultiPolygon(mp) => geo::Geometry::MultiPolygon(geo::MultiPolygon::new(
                mp.polygons().iter().map(polygon).collect(),
            )),
        })
    }
}

impl Shape {
    /// XY shape from a `geo` geometry. Rings of polygons are closed by `geo`;
    /// collections have no counterpart here.
    pub fn from_geo(geometry: &geo::Geometry<f64>) -> Result<Shape> {
        fn run(line: &geo::LineString<f64>) -> Coords {
            let values = line.coords().flat_map(|c| [c.x, c.y]).collect();
            Coords::from_flat_unchecked(Dimension::Xy, values)
        }
        fn polygon(p: &geo::Polygon<f64>) -> Result<Polygon> {
            if p.exterior().0.is_empty() {
                return Ok(Polygon::empty(Dimension::Xy));
            }
            let rings = std::iter::once(p.exterior())
                .chain(p.interiors())
                .map(|ring| LinearRing::new(run(ring)))
                .collect::<Result<Vec<_>>>()?;
            Polygon::new(Dimension::Xy, rings)
        }
        Ok(match geometry {
            geo::Geometry::Point(p) => Shape::Point(Point::xy(p.x(), p.y())),
            geo::Geometry::Line(l) => {
                Shape::LineString(LineString::new(run(&geo::LineString::from(*l))))
            }
            geo::Geometry::LineString(l) => Shape::LineString(LineString::new(run(l))),
            geo::Geometry::Polygon(p) => Shape::Polygon(polygon(p)?),
            geo::Geometry::Rect(r) => Shape::Polygon(polygon(&r.to_polygon())?),
            geo::Geometry::Triangle(t) => Shape::Polygon(polygon(&t.to_polygon())?),
            geo::Geometry::MultiPoint(mp) => Shape::MultiPoint(MultiPoint::new(
                Dimension::Xy,
                mp.iter().map(|p| Point::xy(p.x(), p.y())).collect(),
            )?),
            geo::Geometry::MultiLineString(ml) => Shape::MultiLineString(MultiLineString::new(
                Dimension::Xy,
                ml.iter().map(|l| LineString::new(run(l))).collect(),
            )?),
            geo::Geometry::MultiPolygon(mp) => Shape::MultiPolygon(MultiPolygon::new(
                Dimension::Xy,
                mp.iter().map(polygon).collect::<Result<Vec<_>>>()?,
            )?),
            geo::Geometry::GeometryCollection(_) => {
                return Err(GeoPackError::UnsupportedGeometry { code: 7 })
            }
        })
    }
}

macro_rules! impl_from_shape {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Shape {
                fn from(value: $variant) -> Self {
                    Shape::$variant(value)
                }
            }
        )*
    };
}

impl_from_shape!(
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon
);

#[cfg(test)]
mod tests {
    use super::*;

    fn square(dimension: Dimension, x0: f64, y0: f64, size: f64) -> LinearRing {
        let extra = vec![0.0; dimension.arity() - 2];
        let tuple = |x: f64, y: f64| {
            let mut t = vec![x, y];
            t.extend_from_slice(&extra);
            t
        };
        LinearRing::from_tuples(
            dimension,
            [
                tuple(x0, y0),
                tuple(x0 + size, y0),
                tuple(x0 + size, y0 + size),
                tuple(x0, y0 + size),
                tuple(x0, y0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn ring_construction_contract() {
        assert!(LinearRing::from_tuples(Dimension::Xy, Vec::<[f64; 2]>::new()).is_ok());
        let open = LinearRing::from_tuples(
            Dimension::Xy,
            [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        );
        assert!(matches!(open, Err(GeoPackError::InvalidGeometry(_))));
        let short = LinearRing::from_tuples(Dimension::Xy, [[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]]);
        assert!(matches!(short, Err(GeoPackError::InvalidGeometry(_))));
    }

    #[test]
    fn parts_must_share_dimension() {
        let err = Polygon::new(Dimension::Xyz, vec![square(Dimension::Xy, 0.0, 0.0, 1.0)])
            .unwrap_err();
        assert!(matches!(
            err,
            GeoPackError::DimensionMismatch {
                expected: Dimension::Xyz,
                found: Dimension::Xy
            }
        ));
        let err = MultiPoint::new(Dimension::Xy, vec![Point::empty(Dimension::Xym)]).unwrap_err();
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn point_ordinate_accessors() {
        let p = Point::new(Dimension::Xym, &[1.0, 2.0, 9.0]).unwrap();
        assert_eq!(p.z(), None);
        assert_eq!(p.m(), Some(9.0));
        let p = Point::new(Dimension::Xyzm, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!((p.z(), p.m()), (Some(3.0), Some(4.0)));
        assert_eq!(Point::empty(Dimension::Xy).x(), None);
    }

    #[test]
    fn envelope_spans_every_part() {
        let mp = MultiPolygon::new(
            Dimension::Xy,
            vec![
                Polygon::new(Dimension::Xy, vec![square(Dimension::Xy, 0.0, 0.0, 1.0)]).unwrap(),
                Polygon::new(Dimension::Xy, vec![square(Dimension::Xy, 5.0, -2.0, 3.0)]).unwrap(),
            ],
        )
        .unwrap();
        let shape = Shape::from(mp);
        assert_eq!(shape.envelope(), Some(Envelope::new(0.0, 8.0, -2.0, 1.0)));
        assert_eq!(shape.num_points(), 10);
    }

    #[test]
    fn empty_shapes_have_no_envelope() {
        for t in GeometryType::all() {
            let shape = Shape::empty(t);
            assert!(shape.is_empty());
            assert_eq!(shape.geometry_type(), t);
            assert_eq!(shape.envelope(), None);
        }
    }

    #[test]
    fn parts_without_coordinates_are_empty() {
        let lines = MultiLineString::new(Dimension::Xy, vec![LineString::empty(Dimension::Xy)])
            .unwrap();
        let points = MultiPoint::new(Dimension::Xyz, vec![Point::empty(Dimension::Xyz)]).unwrap();
        let ring = LinearRing::new(Coords::new(Dimension::Xy)).unwrap();
        let polygon = Polygon::new(Dimension::Xy, vec![ring]).unwrap();
        for shape in [Shape::from(lines), Shape::from(points), Shape::from(polygon)] {
            assert!(shape.is_empty(), "{shape:?}");
            assert_eq!(shape.envelope(), None);
        }

        let mixed = MultiPoint::new(
            Dimension::Xy,
            vec![Point::empty(Dimension::Xy), Point::xy(1.0, 2.0)],
        )
        .unwrap();
        assert!(!mixed.is_empty());
    }
}
