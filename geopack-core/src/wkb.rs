//! ISO WKB body codec for the six supported families.
//!
//! Every (sub-)geometry starts with a byte-order marker and a `u32` type
//! code; multi-geometry parts are full self-describing encodings. Coordinate
//! runs are moved in bulk through [`crate::buffer`].

use crate::buffer::{put_f64s, put_u32, ByteOrder, ByteReader};
use crate::coords::Coords;
use crate::dimension::Dimension;
use crate::error::{GeoPackError, Result};
use crate::geometry_type::{GeometryType, ShapeFamily};
use crate::shape::{
    LineString, LinearRing, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon, Shape,
};

/// Byte-order marker plus type code.
pub const WKB_PREFIX_LEN: usize = 5;

const COUNT_LEN: usize = 4;

// ── Encoding ────────────────────────────────────────────────────────────────

/// Encode `shape` as a WKB body in the given byte order.
pub fn encode_body(shape: &Shape, order: ByteOrder) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(WKB_PREFIX_LEN + shape.num_points() * 8 * shape.dimension().arity());
    write_body(&mut out, shape, order)?;
    Ok(out)
}

/// Append the WKB body of `shape` to `out`.
///
/// An empty point is written as a point whose ordinates are all NaN.
pub fn write_body(out: &mut Vec<u8>, shape: &Shape, order: ByteOrder) -> Result<()> {
    write_prefix(out, shape.geometry_type(), order);
    match shape {
        Shape::Point(p) => write_point_coords(out, p, order),
        Shape::LineString(l) => write_run(out, l.coords(), order)?,
        Shape::Polygon(p) => write_rings(out, p, order)?,
        Shape::MultiPoint(mp) => {
            write_count(out, mp.points().len(), order)?;
            for p in mp.points() {
                write_prefix(out, GeometryType::new(ShapeFamily::Point, p.dimension()), order);
                write_point_coords(out, p, order);
            }
        }
        Shape::MultiLineString(ml) => {
            write_count(out, ml.lines().len(), order)?;
            for l in ml.lines() {
                write_prefix(
                    out,
                    GeometryType::new(ShapeFamily::LineString, l.dimension()),
                    order,
                );
                write_run(out, l.coords(), order)?;
            }
        }
        Shape::MultiPolygon(mp) => {
            write_count(out, mp.polygons().len(), order)?;
            for p in mp.polygons() {
                write_prefix(out, GeometryType::new(ShapeFamily::Polygon, p.dimension()), order);
                write_rings(out, p, order)?;
            }
        }
    }
    Ok(())
}

fn write_prefix(out: &mut Vec<u8>, geometry_type: GeometryType, order: ByteOrder) {
    out.push(order.marker());
    put_u32(out, geometry_type.type_code(), order);
}

fn write_count(out: &mut Vec<u8>, count: usize, order: ByteOrder) -> Result<()> {
    let count = u32::try_from(count)
        .map_err(|_| GeoPackError::InvalidInput(format!("count {count} does not fit in u32")))?;
    put_u32(out, count, order);
    Ok(())
}

fn write_point_coords(out: &mut Vec<u8>, point: &Point, order: ByteOrder) {
    match point.tuple() {
        Some(tuple) => put_f64s(out, tuple, order),
        None => put_f64s(out, &vec![f64::NAN; point.dimension().arity()], order),
    }
}

fn write_run(out: &mut Vec<u8>, coords: &Coords, order: ByteOrder) -> Result<()> {
    write_count(out, coords.len(), order)?;
    put_f64s(out, coords.as_flat(), order);
    Ok(())
}

fn write_rings(out: &mut Vec<u8>, polygon: &Polygon, order: ByteOrder) -> Result<()> {
    write_count(out, polygon.rings().len(), order)?;
    for ring in polygon.rings() {
        write_run(out, ring.coords(), order)?;
    }
    Ok(())
}

// ── Decoding ────────────────────────────────────────────────────────────────

/// Decode a complete WKB body whose dimensionality must be `dimension`.
///
/// Any bytes after the body are an error.
pub fn decode_body(bytes: &[u8], dimension: Dimension) -> Result<Shape> {
    let shape = decode_body_at(bytes, 0, None)?;
    if shape.dimension() != dimension {
        return Err(GeoPackError::format(
            1,
            "body dimensionality does not match the expected one",
        ));
    }
    Ok(shape)
}

/// Decode a complete WKB body that must be exactly `expected`.
pub fn decode_body_as(bytes: &[u8], expected: GeometryType) -> Result<Shape> {
    decode_body_at(bytes, 0, Some(expected))
}

/// Decode a body that starts at absolute blob offset `base`.
pub(crate) fn decode_body_at(
    bytes: &[u8],
    base: usize,
    expected: Option<GeometryType>,
) -> Result<Shape> {
    let mut reader = ByteReader::new(bytes, base);
    let shape = read_shape(&mut reader, expected)?;
    if reader.remaining() != 0 {
        return Err(GeoPackError::format(
            reader.offset(),
            "trailing bytes after geometry body",
        ));
    }
    Ok(shape)
}

/// Read only the byte-order marker and the type code of a body.
pub fn peek_geometry_type(bytes: &[u8]) -> Result<GeometryType> {
    peek_geometry_type_at(bytes, 0)
}

pub(crate) fn peek_geometry_type_at(bytes: &[u8], base: usize) -> Result<GeometryType> {
    let mut reader = ByteReader::new(bytes, base);
    let (_, geometry_type) = read_prefix(&mut reader)?;
    Ok(geometry_type)
}

/// Read the top-level element count that follows the prefix, if the family
/// has one.
pub(crate) fn peek_count_at(bytes: &[u8], base: usize) -> Result<Option<u32>> {
    let mut reader = ByteReader::new(bytes, base);
    let (order, geometry_type) = read_prefix(&mut reader)?;
    if geometry_type.is_point() {
        return Ok(None);
    }
    reader.read_u32(order, "truncated element count").map(Some)
}

fn read_prefix(reader: &mut ByteReader<'_>) -> Result<(ByteOrder, GeometryType)> {
    let marker_offset = reader.offset();
    let order = match reader.read_u8("truncated byte order marker")? {
        0 => ByteOrder::BigEndian,
        1 => ByteOrder::LittleEndian,
        _ => {
            return Err(GeoPackError::format(
                marker_offset,
                "invalid byte order marker",
            ))
        }
    };
    let code = reader.read_u32(order, "truncated geometry type code")?;
    Ok((order, GeometryType::from_type_code(code)?))
}

fn read_shape(reader: &mut ByteReader<'_>, expected: Option<GeometryType>) -> Result<Shape> {
    let type_offset = reader.offset() + 1;
    let (order, geometry_type) = read_prefix(reader)?;
    if let Some(expected) = expected {
        if expected != geometry_type {
            return Err(GeoPackError::format(
                type_offset,
                "geometry type code does not match the expected type",
            ));
        }
    }
    let dimension = geometry_type.dimension;
    Ok(match geometry_type.family {
        ShapeFamily::Point => Shape::Point(read_point_coords(reader, dimension, order)?),
        ShapeFamily::LineString => {
            Shape::LineString(LineString::new(read_run(reader, dimension, order)?))
        }
        ShapeFamily::Polygon => Shape::Polygon(read_rings(reader, dimension, order)?),
        ShapeFamily::MultiPoint => {
            let parts = read_parts(reader, ShapeFamily::Point, dimension, order, |s| match s {
                Shape::Point(p) => Some(p),
                _ => None,
            })?;
            Shape::MultiPoint(MultiPoint::new(dimension, parts)?)
        }
        ShapeFamily::MultiLineString => {
            let parts =
                read_parts(reader, ShapeFamily::LineString, dimension, order, |s| match s {
                    Shape::LineString(l) => Some(l),
                    _ => None,
                })?;
            Shape::MultiLineString(MultiLineString::new(dimension, parts)?)
        }
        ShapeFamily::MultiPolygon => {
            let parts = read_parts(reader, ShapeFamily::Polygon, dimension, order, |s| match s {
                Shape::Polygon(p) => Some(p),
                _ => None,
            })?;
            Shape::MultiPolygon(MultiPolygon::new(dimension, parts)?)
        }
    })
}

/// A point whose X and Y are both NaN is the empty point.
fn read_point_coords(
    reader: &mut ByteReader<'_>,
    dimension: Dimension,
    order: ByteOrder,
) -> Result<Point> {
    let values = reader.read_f64s(dimension.arity(), order, "truncated point coordinates")?;
    if values[0].is_nan() && values[1].is_nan() {
        return Ok(Point::empty(dimension));
    }
    Ok(Point::from_coords(Coords::from_flat_unchecked(
        dimension, values,
    )))
}

/// Read a `u32` count and check that `count * min_item_len` bytes remain.
fn read_count(
    reader: &mut ByteReader<'_>,
    order: ByteOrder,
    min_item_len: usize,
    reason: &'static str,
) -> Result<usize> {
    let count_offset = reader.offset();
    let count = reader.read_u32(order, "truncated element count")? as usize;
    let needed = count.checked_mul(min_item_len);
    if needed.is_none_or(|needed| needed > reader.remaining()) {
        return Err(GeoPackError::format(count_offset, reason));
    }
    Ok(count)
}

fn read_run(reader: &mut ByteReader<'_>, dimension: Dimension, order: ByteOrder) -> Result<Coords> {
    let tuple_len = dimension.arity() * 8;
    let count = read_count(
        reader,
        order,
        tuple_len,
        "declared point count exceeds the remaining bytes",
    )?;
    let values = reader.read_f64s(
        count * dimension.arity(),
        order,
        "truncated coordinate run",
    )?;
    Ok(Coords::from_flat_unchecked(dimension, values))
}

fn read_rings(reader: &mut ByteReader<'_>, dimension: Dimension, order: ByteOrder) -> Result<Polygon> {
    let count = read_count(
        reader,
        order,
        COUNT_LEN,
        "declared ring count exceeds the remaining bytes",
    )?;
    let mut rings = Vec::with_capacity(count);
    for _ in 0..count {
        rings.push(LinearRing::from_coords_unchecked(read_run(
            reader, dimension, order,
        )?));
    }
    Polygon::new(dimension, rings)
}

fn read_parts<T>(
    reader: &mut ByteReader<'_>,
    part_family: ShapeFamily,
    dimension: Dimension,
    order: ByteOrder,
    unwrap_part: impl Fn(Shape) -> Option<T>,
) -> Result<Vec<T>> {
    let min_part_len = WKB_PREFIX_LEN
        + match part_family {
            ShapeFamily::Point => dimension.arity() * 8,
            _ => COUNT_LEN,
        };
    let count = read_count(
        reader,
        order,
        min_part_len,
        "declared part count exceeds the remaining bytes",
    )?;
    let expected = GeometryType::new(part_family, dimension);
    let mut parts = Vec::with_capacity(count);
    for _ in 0..count {
        let part_offset = reader.offset();
        let part = read_shape(reader, Some(expected))?;
        parts.push(
            unwrap_part(part)
                .ok_or_else(|| GeoPackError::format(part_offset, "unexpected part family"))?,
        );
    }
    Ok(parts)
}
