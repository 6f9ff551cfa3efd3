//! Sample shapes shared by the integration tests.

#![allow(dead_code)]

use geopack_core::{
    Dimension, GeometryType, LineString, LinearRing, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon, Shape, ShapeFamily,
};

/// `(x, y)` extended with the ordinates `dimension` carries.
pub fn tuple(dimension: Dimension, x: f64, y: f64) -> Vec<f64> {
    let mut t = vec![x, y];
    if dimension.has_z() {
        t.push(x + y);
    }
    if dimension.has_m() {
        t.push(x * 10.0);
    }
    t
}

pub fn point(dimension: Dimension, x: f64, y: f64) -> Point {
    Point::new(dimension, &tuple(dimension, x, y)).unwrap()
}

pub fn line(dimension: Dimension, points: &[(f64, f64)]) -> LineString {
    LineString::from_tuples(dimension, points.iter().map(|&(x, y)| tuple(dimension, x, y)))
        .unwrap()
}

/// Closed square ring with its lower-left corner at `(x, y)`.
pub fn square(dimension: Dimension, x: f64, y: f64, size: f64) -> LinearRing {
    let corners = [
        (x, y),
        (x + size, y),
        (x + size, y + size),
        (x, y + size),
        (x, y),
    ];
    LinearRing::from_tuples(dimension, corners.iter().map(|&(x, y)| tuple(dimension, x, y)))
        .unwrap()
}

pub fn polygon_with_hole(dimension: Dimension, x: f64, y: f64) -> Polygon {
    Polygon::new(
        dimension,
        vec![
            square(dimension, x, y, 10.0),
            square(dimension, x + 2.0, y + 2.0, 3.0),
        ],
    )
    .unwrap()
}

/// A non-empty value of every supported variant.
pub fn sample(geometry_type: GeometryType) -> Shape {
    let dim = geometry_type.dimension;
    match geometry_type.family {
        ShapeFamily::Point => point(dim, 1.5, -2.5).into(),
        ShapeFamily::LineString => line(dim, &[(0.0, 0.0), (3.0, 4.0), (-1.0, 7.5)]).into(),
        ShapeFamily::Polygon => polygon_with_hole(dim, 0.0, 0.0).into(),
        ShapeFamily::MultiPoint => {
            MultiPoint::new(dim, vec![point(dim, 1.0, 2.0), point(dim, -3.0, 4.0)])
                .unwrap()
                .into()
        }
        ShapeFamily::MultiLineString => MultiLineString::new(
            dim,
            vec![
                line(dim, &[(0.0, 0.0), (1.0, 1.0)]),
                line(dim, &[(5.0, 5.0), (6.0, 4.0), (7.0, 9.0)]),
            ],
        )
        .unwrap()
        .into(),
        ShapeFamily::MultiPolygon => MultiPolygon::new(
            dim,
            vec![
                Polygon::new(dim, vec![square(dim, 0.0, 0.0, 1.0)]).unwrap(),
                polygon_with_hole(dim, 20.0, 30.0),
            ],
        )
        .unwrap()
        .into(),
    }
}
