#![doc = include_str!("../../README.md")]
//! Crate-specific API surface for `geopack-core`.

pub mod buffer;
pub mod column;
pub mod coords;
pub mod dimension;
pub mod envelope;
pub mod error;
pub mod function_catalog;
pub mod functions;
pub mod geometry;
pub mod geometry_type;
pub mod header;
pub mod options;
pub mod shape;
pub mod wkb;

pub use buffer::ByteOrder;
pub use column::{ColumnDeclaration, ColumnGeometryType, ZmFlag};
pub use coords::Coords;
pub use dimension::Dimension;
pub use envelope::{envelope_polygon, Bounds, Envelope, EnvelopeCode};
pub use error::{GeoPackError, Result};
pub use geometry::Geometry;
pub use geometry_type::{GeometryType, ShapeFamily};
pub use header::{decode_header, encode_header, GeometryHeader};
pub use options::{EncodeOptions, EnvelopePolicy};
pub use shape::{
    LineString, LinearRing, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon, Shape,
};
pub use wkb::{decode_body, decode_body_as, encode_body, peek_geometry_type};
