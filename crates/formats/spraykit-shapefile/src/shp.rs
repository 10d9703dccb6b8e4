//! `.shp` / `.shx` codec at the record and shape level.
//!
//! Only the planar X/Y coordinates are materialised. Z and M payloads are
//! skipped using each record's declared content length, so a `PolygonZ` file
//! reads the same rings as its 2D counterpart.

use std::fmt;

use bytes::{Buf, BufMut};

use crate::error::{ShapefileError, ShapefileResult, SourcePosition};

/// Magic number at the start of every `.shp` and `.shx` file (big-endian).
pub const FILE_CODE: i32 = 9994;
/// Format version stored in the main header (little-endian).
pub const VERSION: i32 = 1000;
/// Length of the main file header in bytes.
pub const HEADER_LEN: usize = 100;

const RECORD_HEADER_LEN: usize = 8;
const INDEX_ENTRY_LEN: usize = 8;
const POINT_LEN: usize = 16;
const BBOX_LEN: usize = 32;

/// Shape types defined by the ESRI Shapefile technical description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
    MultiPatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Null,
    Point,
    MultiPoint,
    Parts,
    Patch,
}

impl ShapeType {
    /// Decode a shape type code, returning `None` for codes outside the format.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        let shape_type = match code {
            0 => ShapeType::Null,
            1 => ShapeType::Point,
            3 => ShapeType::PolyLine,
            5 => ShapeType::Polygon,
            8 => ShapeType::MultiPoint,
            11 => ShapeType::PointZ,
            13 => ShapeType::PolyLineZ,
            15 => ShapeType::PolygonZ,
            18 => ShapeType::MultiPointZ,
            21 => ShapeType::PointM,
            23 => ShapeType::PolyLineM,
            25 => ShapeType::PolygonM,
            28 => ShapeType::MultiPointM,
            31 => ShapeType::MultiPatch,
            _ => return None,
        };
        Some(shape_type)
    }

    /// The numeric code written to headers and record contents.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            ShapeType::Null => 0,
            ShapeType::Point => 1,
            ShapeType::PolyLine => 3,
            ShapeType::Polygon => 5,
            ShapeType::MultiPoint => 8,
            ShapeType::PointZ => 11,
            ShapeType::PolyLineZ => 13,
            ShapeType::PolygonZ => 15,
            ShapeType::MultiPointZ => 18,
            ShapeType::PointM => 21,
            ShapeType::PolyLineM => 23,
            ShapeType::PolygonM => 25,
            ShapeType::MultiPointM => 28,
            ShapeType::MultiPatch => 31,
        }
    }

    /// Returns `true` for the polygon family (2D, Z and M).
    #[must_use]
    pub fn is_polygon(self) -> bool {
        matches!(
            self,
            ShapeType::Polygon | ShapeType::PolygonZ | ShapeType::PolygonM
        )
    }

    /// Returns `true` for the single point family (2D, Z and M).
    #[must_use]
    pub fn is_point(self) -> bool {
        self.layout() == Layout::Point
    }

    /// Human readable name of the shape type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeType::Null => "Null",
            ShapeType::Point => "Point",
            ShapeType::PolyLine => "PolyLine",
            ShapeType::Polygon => "Polygon",
            ShapeType::MultiPoint => "MultiPoint",
            ShapeType::PointZ => "PointZ",
            ShapeType::PolyLineZ => "PolyLineZ",
            ShapeType::PolygonZ => "PolygonZ",
            ShapeType::MultiPointZ => "MultiPointZ",
            ShapeType::PointM => "PointM",
            ShapeType::PolyLineM => "PolyLineM",
            ShapeType::PolygonM => "PolygonM",
            ShapeType::MultiPointM => "MultiPointM",
            ShapeType::MultiPatch => "MultiPatch",
        }
    }

    fn layout(self) -> Layout {
        match self {
            ShapeType::Null => Layout::Null,
            ShapeType::Point | ShapeType::PointZ | ShapeType::PointM => Layout::Point,
            ShapeType::MultiPoint | ShapeType::MultiPointZ | ShapeType::MultiPointM => {
                Layout::MultiPoint
            },
            ShapeType::PolyLine
            | ShapeType::PolyLineZ
            | ShapeType::PolyLineM
            | ShapeType::Polygon
            | ShapeType::PolygonZ
            | ShapeType::PolygonM => Layout::Parts,
            ShapeType::MultiPatch => Layout::Patch,
        }
    }

    fn is_planar(self) -> bool {
        matches!(
            self,
            ShapeType::Null
                | ShapeType::Point
                | ShapeType::PolyLine
                | ShapeType::Polygon
                | ShapeType::MultiPoint
        )
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A planar coordinate in the geometry's native units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box as stored in headers (`xmin, ymin, xmax, ymax`).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    /// Smallest box enclosing every point, or the zero box when there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Self {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Self::default();
        };
        points.fold(
            Self {
                x_min: first.x,
                y_min: first.y,
                x_max: first.x,
                y_max: first.y,
            },
            |bbox, p| Self {
                x_min: bbox.x_min.min(p.x),
                y_min: bbox.y_min.min(p.y),
                x_max: bbox.x_max.max(p.x),
                y_max: bbox.y_max.max(p.y),
            },
        )
    }
}

/// One geometry record.
///
/// Point shapes hold a single part with a single point; multipoints hold one
/// part with every point; polylines, polygons and multipatches hold one part
/// per ring or line. Null shapes have no parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub shape_type: ShapeType,
    pub parts: Vec<Vec<Point>>,
}

impl Shape {
    #[must_use]
    pub fn null() -> Self {
        Self {
            shape_type: ShapeType::Null,
            parts: Vec::new(),
        }
    }

    #[must_use]
    pub fn point(x: f64, y: f64) -> Self {
        Self {
            shape_type: ShapeType::Point,
            parts: vec![vec![Point::new(x, y)]],
        }
    }

    #[must_use]
    pub fn polygon(rings: Vec<Vec<Point>>) -> Self {
        Self {
            shape_type: ShapeType::Polygon,
            parts: rings,
        }
    }

    /// Total number of points across all parts.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.parts.iter().map(Vec::len).sum()
    }

    /// Iterate over every point of every part.
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.parts.iter().flatten()
    }

    /// The coordinate of a single point shape.
    #[must_use]
    pub fn as_point(&self) -> Option<Point> {
        if !self.shape_type.is_point() {
            return None;
        }
        match self.parts.as_slice() {
            [part] if part.len() == 1 => Some(part[0]),
            _ => None,
        }
    }
}

/// Main header fields shared by `.shp` and `.shx`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MainHeader {
    pub shape_type: ShapeType,
    /// Declared file length in bytes.
    pub file_length: usize,
    pub bbox: BoundingBox,
}

/// One `.shx` entry. Both values are expressed in 16-bit words, as on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub offset: u32,
    pub content_length: u32,
}

/// A decoded geometry file: its header and every record in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeFile {
    pub header: MainHeader,
    pub shapes: Vec<Shape>,
}

/// Encoded `.shp` and `.shx` payloads produced by [`ShapeFile::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedShapes {
    pub shp: Vec<u8>,
    pub shx: Vec<u8>,
}

impl ShapeFile {
    /// Assemble a shape file whose header bounding box covers every shape.
    #[must_use]
    pub fn new(shape_type: ShapeType, shapes: Vec<Shape>) -> Self {
        let bbox = BoundingBox::from_points(shapes.iter().flat_map(Shape::points));
        Self {
            header: MainHeader {
                shape_type,
                file_length: 0,
                bbox,
            },
            shapes,
        }
    }

    /// Decode a `.shp` payload.
    ///
    /// # Errors
    ///
    /// Returns a parse error when the header is invalid, a record is truncated
    /// or a record uses an unknown shape type.
    pub fn read(bytes: &[u8]) -> ShapefileResult<Self> {
        let header = read_main_header(bytes, "geometry file")?;
        let end = effective_end(&header, bytes.len());

        let mut shapes = Vec::new();
        let mut offset = HEADER_LEN;
        while offset < end {
            let position = SourcePosition::at_record(shapes.len() + 1, offset);
            if end - offset < RECORD_HEADER_LEN {
                return Err(ShapefileError::truncated(
                    RECORD_HEADER_LEN - (end - offset),
                    position,
                    "geometry file",
                ));
            }

            let mut record_header = &bytes[offset..offset + RECORD_HEADER_LEN];
            let _record_number = record_header.get_i32();
            let words = record_header.get_i32();
            let content_len = usize::try_from(words)
                .ok()
                .and_then(|w| w.checked_mul(2))
                .ok_or_else(|| {
                    ShapefileError::parse(
                        format!("negative content length {words}"),
                        position.clone(),
                        "geometry file",
                    )
                })?;

            let start = offset + RECORD_HEADER_LEN;
            let stop = start
                .checked_add(content_len)
                .filter(|stop| *stop <= end)
                .ok_or_else(|| {
                    ShapefileError::truncated(
                        start.saturating_add(content_len) - end,
                        position.clone(),
                        "geometry file",
                    )
                })?;

            shapes.push(decode_shape(&bytes[start..stop], &position)?);
            offset = stop;
        }

        Ok(Self { header, shapes })
    }

    /// Encode the shapes into matching `.shp` and `.shx` payloads.
    ///
    /// Only the planar shape types (`Null`, `Point`, `PolyLine`, `Polygon`,
    /// `MultiPoint`) can be written. Each shape must be `Null` or of the file's
    /// shape type.
    ///
    /// # Errors
    ///
    /// Returns a layout error for unsupported or mixed shape types and for
    /// files too large for the 32-bit word offsets of the format.
    pub fn write(&self) -> ShapefileResult<EncodedShapes> {
        let shape_type = self.header.shape_type;
        if !shape_type.is_planar() {
            return Err(ShapefileError::layout(format!(
                "writing {shape_type} files is not supported"
            )));
        }

        let mut records = Vec::new();
        let mut index = Vec::with_capacity(self.shapes.len());
        for (i, shape) in self.shapes.iter().enumerate() {
            if shape.shape_type != ShapeType::Null && shape.shape_type != shape_type {
                return Err(ShapefileError::layout(format!(
                    "shape {} is {}, expected {shape_type}",
                    i + 1,
                    shape.shape_type
                )));
            }
            let content = encode_shape(shape)?;
            let offset = to_words(HEADER_LEN + records.len())?;
            let content_length = to_words(content.len())?;
            records.put_i32(to_i32(i + 1)?);
            records.put_i32(to_i32(content_length as usize)?);
            records.put_slice(&content);
            index.push(IndexEntry {
                offset,
                content_length,
            });
        }

        let bbox = BoundingBox::from_points(self.shapes.iter().flat_map(Shape::points));

        let mut shp = Vec::with_capacity(HEADER_LEN + records.len());
        put_main_header(&mut shp, HEADER_LEN + records.len(), shape_type, bbox)?;
        shp.put_slice(&records);

        let shx_len = HEADER_LEN + index.len() * INDEX_ENTRY_LEN;
        let mut shx = Vec::with_capacity(shx_len);
        put_main_header(&mut shx, shx_len, shape_type, bbox)?;
        for entry in &index {
            shx.put_u32(entry.offset);
            shx.put_u32(entry.content_length);
        }

        Ok(EncodedShapes { shp, shx })
    }
}

/// Decode the entries of a `.shx` payload.
///
/// # Errors
///
/// Returns a parse error when the header is invalid or the entry table is not
/// a whole number of entries.
pub fn read_index(bytes: &[u8]) -> ShapefileResult<Vec<IndexEntry>> {
    let header = read_main_header(bytes, "index file")?;
    let end = effective_end(&header, bytes.len());
    let body = &bytes[HEADER_LEN..end];
    if body.len() % INDEX_ENTRY_LEN != 0 {
        return Err(ShapefileError::parse(
            format!(
                "index body of {} bytes is not a multiple of {INDEX_ENTRY_LEN}",
                body.len()
            ),
            SourcePosition::at_byte(end),
            "index file",
        ));
    }

    let mut buf = body;
    let mut entries = Vec::with_capacity(body.len() / INDEX_ENTRY_LEN);
    while buf.has_remaining() {
        entries.push(IndexEntry {
            offset: buf.get_u32(),
            content_length: buf.get_u32(),
        });
    }
    Ok(entries)
}

fn read_main_header(bytes: &[u8], context: &str) -> ShapefileResult<MainHeader> {
    if bytes.len() < HEADER_LEN {
        return Err(ShapefileError::truncated(
            HEADER_LEN - bytes.len(),
            SourcePosition::at_byte(bytes.len()),
            context,
        ));
    }

    let mut buf = &bytes[..HEADER_LEN];
    let file_code = buf.get_i32();
    if file_code != FILE_CODE {
        return Err(ShapefileError::parse(
            format!("unexpected file code {file_code}, expected {FILE_CODE}"),
            SourcePosition::at_byte(0),
            context,
        ));
    }
    buf.advance(20);
    let file_length_words = buf.get_i32();
    let version = buf.get_i32_le();
    if version != VERSION {
        return Err(ShapefileError::parse(
            format!("unsupported version {version}, expected {VERSION}"),
            SourcePosition::at_byte(28),
            context,
        ));
    }
    let code = buf.get_i32_le();
    let shape_type = ShapeType::from_code(code).ok_or_else(|| {
        ShapefileError::parse(
            format!("unknown shape type {code}"),
            SourcePosition::at_byte(32),
            context,
        )
    })?;
    let bbox = BoundingBox {
        x_min: buf.get_f64_le(),
        y_min: buf.get_f64_le(),
        x_max: buf.get_f64_le(),
        y_max: buf.get_f64_le(),
    };

    Ok(MainHeader {
        shape_type,
        file_length: usize::try_from(file_length_words)
            .unwrap_or(0)
            .saturating_mul(2),
        bbox,
    })
}

// Some writers leave the declared length at zero; fall back to the payload size.
fn effective_end(header: &MainHeader, actual: usize) -> usize {
    if header.file_length >= HEADER_LEN {
        header.file_length.min(actual)
    } else {
        actual
    }
}

fn ensure(buf: &[u8], needed: usize, position: &SourcePosition) -> ShapefileResult<()> {
    if buf.remaining() < needed {
        return Err(ShapefileError::truncated(
            needed - buf.remaining(),
            position.clone(),
            "geometry file",
        ));
    }
    Ok(())
}

fn read_count(buf: &mut &[u8], what: &str, position: &SourcePosition) -> ShapefileResult<usize> {
    let value = buf.get_i32_le();
    usize::try_from(value).map_err(|_| {
        ShapefileError::parse(
            format!("negative {what} {value}"),
            position.clone(),
            "geometry file",
        )
    })
}

fn read_points(
    buf: &mut &[u8],
    count: usize,
    position: &SourcePosition,
) -> ShapefileResult<Vec<Point>> {
    let needed = count.checked_mul(POINT_LEN).ok_or_else(|| {
        ShapefileError::parse(
            format!("point count {count} overflows"),
            position.clone(),
            "geometry file",
        )
    })?;
    ensure(buf, needed, position)?;
    Ok((0..count)
        .map(|_| Point::new(buf.get_f64_le(), buf.get_f64_le()))
        .collect())
}

fn decode_shape(content: &[u8], position: &SourcePosition) -> ShapefileResult<Shape> {
    let mut buf = content;
    ensure(buf, 4, position)?;
    let code = buf.get_i32_le();
    let shape_type = ShapeType::from_code(code).ok_or_else(|| {
        ShapefileError::parse(
            format!("unknown shape type {code}"),
            position.clone(),
            "geometry file",
        )
    })?;

    let parts = match shape_type.layout() {
        Layout::Null => Vec::new(),
        Layout::Point => vec![read_points(&mut buf, 1, position)?],
        Layout::MultiPoint => {
            ensure(buf, BBOX_LEN + 4, position)?;
            buf.advance(BBOX_LEN);
            let num_points = read_count(&mut buf, "point count", position)?;
            vec![read_points(&mut buf, num_points, position)?]
        },
        Layout::Parts | Layout::Patch => {
            ensure(buf, BBOX_LEN + 8, position)?;
            buf.advance(BBOX_LEN);
            let num_parts = read_count(&mut buf, "part count", position)?;
            let num_points = read_count(&mut buf, "point count", position)?;

            let index_len = num_parts.checked_mul(4).ok_or_else(|| {
                ShapefileError::parse(
                    format!("part count {num_parts} overflows"),
                    position.clone(),
                    "geometry file",
                )
            })?;
            ensure(buf, index_len, position)?;
            let mut starts = Vec::with_capacity(num_parts);
            for _ in 0..num_parts {
                starts.push(read_count(&mut buf, "part index", position)?);
            }
            if shape_type.layout() == Layout::Patch {
                ensure(buf, index_len, position)?;
                buf.advance(index_len);
            }

            let points = read_points(&mut buf, num_points, position)?;
            split_parts(points, &starts, position)?
        },
    };

    Ok(Shape { shape_type, parts })
}

fn split_parts(
    points: Vec<Point>,
    starts: &[usize],
    position: &SourcePosition,
) -> ShapefileResult<Vec<Vec<Point>>> {
    if starts.is_empty() {
        return Ok(if points.is_empty() {
            Vec::new()
        } else {
            vec![points]
        });
    }

    let mut parts = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let stop = starts.get(i + 1).copied().unwrap_or(points.len());
        if start > stop || stop > points.len() {
            return Err(ShapefileError::parse(
                format!("part {} spans points {start}..{stop} of {}", i + 1, points.len()),
                position.clone(),
                "geometry file",
            ));
        }
        parts.push(points[start..stop].to_vec());
    }
    Ok(parts)
}

fn encode_shape(shape: &Shape) -> ShapefileResult<Vec<u8>> {
    let mut out = Vec::new();
    out.put_i32_le(shape.shape_type.code());

    match shape.shape_type.layout() {
        Layout::Null => {},
        Layout::Point => {
            let point = shape.as_point().ok_or_else(|| {
                ShapefileError::layout("point shape must hold exactly one point")
            })?;
            out.put_f64_le(point.x);
            out.put_f64_le(point.y);
        },
        Layout::MultiPoint => {
            put_bbox(&mut out, BoundingBox::from_points(shape.points()));
            out.put_i32_le(to_i32(shape.point_count())?);
            put_points(&mut out, shape.points());
        },
        Layout::Parts => {
            put_bbox(&mut out, BoundingBox::from_points(shape.points()));
            out.put_i32_le(to_i32(shape.parts.len())?);
            out.put_i32_le(to_i32(shape.point_count())?);
            let mut start = 0;
            for part in &shape.parts {
                out.put_i32_le(to_i32(start)?);
                start += part.len();
            }
            put_points(&mut out, shape.points());
        },
        Layout::Patch => {
            return Err(ShapefileError::layout("writing MultiPatch shapes is not supported"));
        },
    }
    Ok(out)
}

fn put_main_header(
    out: &mut Vec<u8>,
    file_length: usize,
    shape_type: ShapeType,
    bbox: BoundingBox,
) -> ShapefileResult<()> {
    out.put_i32(FILE_CODE);
    out.put_bytes(0, 20);
    out.put_i32(to_i32(to_words(file_length)? as usize)?);
    out.put_i32_le(VERSION);
    out.put_i32_le(shape_type.code());
    put_bbox(out, bbox);
    // z and m ranges
    out.put_bytes(0, 32);
    Ok(())
}

fn put_bbox(out: &mut Vec<u8>, bbox: BoundingBox) {
    out.put_f64_le(bbox.x_min);
    out.put_f64_le(bbox.y_min);
    out.put_f64_le(bbox.x_max);
    out.put_f64_le(bbox.y_max);
}

fn put_points<'a>(out: &mut Vec<u8>, points: impl Iterator<Item = &'a Point>) {
    for point in points {
        out.put_f64_le(point.x);
        out.put_f64_le(point.y);
    }
}

fn to_words(bytes: usize) -> ShapefileResult<u32> {
    u32::try_from(bytes / 2)
        .map_err(|_| ShapefileError::layout(format!("{bytes} bytes exceed the format's offsets")))
}

fn to_i32(value: usize) -> ShapefileResult<i32> {
    i32::try_from(value)
        .map_err(|_| ShapefileError::layout(format!("{value} does not fit a 32-bit field")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x, y + size),
            Point::new(x + size, y + size),
            Point::new(x + size, y),
            Point::new(x, y),
        ]
    }

    #[test]
    fn test_polygon_file_reads_back() {
        let shapes = vec![
            Shape::polygon(vec![square(0.0, 0.0, 10.0)]),
            Shape::polygon(vec![square(20.0, 0.0, 5.0), square(21.0, 1.0, 1.0)]),
        ];
        let encoded = ShapeFile::new(ShapeType::Polygon, shapes.clone())
            .write()
            .unwrap();

        let decoded = ShapeFile::read(&encoded.shp).unwrap();
        assert_eq!(decoded.header.shape_type, ShapeType::Polygon);
        assert_eq!(decoded.header.file_length, encoded.shp.len());
        assert_eq!(decoded.header.bbox.x_max, 25.0);
        assert_eq!(decoded.shapes, shapes);
    }

    #[test]
    fn test_index_matches_records() {
        let shapes = vec![Shape::point(1.0, 2.0), Shape::null(), Shape::point(3.0, 4.0)];
        let encoded = ShapeFile::new(ShapeType::Point, shapes).write().unwrap();

        let index = read_index(&encoded.shx).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index[0].offset, 50);
        // point content: type + x + y = 20 bytes = 10 words
        assert_eq!(index[0].content_length, 10);
        // null content: type only = 4 bytes = 2 words
        assert_eq!(index[1].content_length, 2);
        assert_eq!(index[1].offset, 50 + 4 + 10);
        assert_eq!(index[2].offset, 50 + 4 + 10 + 4 + 2);
    }

    #[test]
    fn test_point_accessor() {
        let shapes = ShapeFile::read(
            &ShapeFile::new(ShapeType::Point, vec![Shape::point(-74.006, 40.7128)])
                .write()
                .unwrap()
                .shp,
        )
        .unwrap()
        .shapes;
        assert_eq!(shapes[0].as_point(), Some(Point::new(-74.006, 40.7128)));
        assert_eq!(Shape::null().as_point(), None);
    }

    #[test]
    fn test_rejects_bad_file_code() {
        let mut bytes = ShapeFile::new(ShapeType::Point, vec![]).write().unwrap().shp;
        bytes[3] = 0;
        let err = ShapeFile::read(&bytes).unwrap_err();
        assert!(err.to_string().contains("unexpected file code"));
    }

    #[test]
    fn test_rejects_short_header() {
        let err = ShapeFile::read(&[0u8; 40]).unwrap_err();
        assert!(err.to_string().contains("60 more byte(s) required"));
    }

    #[test]
    fn test_rejects_truncated_record() {
        let shapes = vec![Shape::polygon(vec![square(0.0, 0.0, 1.0)])];
        let mut bytes = ShapeFile::new(ShapeType::Polygon, shapes).write().unwrap().shp;
        bytes.truncate(bytes.len() - 8);
        // header still declares the full length; trust the real payload size
        let err = ShapeFile::read(&bytes).unwrap_err();
        match err {
            ShapefileError::Parse { position, .. } => {
                assert_eq!(position.unwrap().record, Some(1));
            },
            ShapefileError::Layout { .. } => panic!("expected parse error"),
        }
    }

    #[test]
    fn test_reads_polygon_z_planar_rings() {
        // Hand-built PolygonZ record: planar prefix followed by z range and values.
        let ring = square(0.0, 0.0, 2.0);
        let mut content = Vec::new();
        content.put_i32_le(ShapeType::PolygonZ.code());
        put_bbox(&mut content, BoundingBox::from_points(&ring));
        content.put_i32_le(1);
        content.put_i32_le(ring.len() as i32);
        content.put_i32_le(0);
        put_points(&mut content, ring.iter());
        content.put_f64_le(0.0);
        content.put_f64_le(0.0);
        for _ in &ring {
            content.put_f64_le(7.5);
        }

        let mut bytes = Vec::new();
        put_main_header(
            &mut bytes,
            HEADER_LEN + 8 + content.len(),
            ShapeType::PolygonZ,
            BoundingBox::default(),
        )
        .unwrap();
        bytes.put_i32(1);
        bytes.put_i32((content.len() / 2) as i32);
        bytes.put_slice(&content);

        let decoded = ShapeFile::read(&bytes).unwrap();
        assert_eq!(decoded.shapes.len(), 1);
        assert_eq!(decoded.shapes[0].shape_type, ShapeType::PolygonZ);
        assert_eq!(decoded.shapes[0].parts, vec![ring]);
    }

    #[test]
    fn test_writer_rejects_mixed_types() {
        let file = ShapeFile::new(ShapeType::Polygon, vec![Shape::point(0.0, 0.0)]);
        assert!(matches!(file.write(), Err(ShapefileError::Layout { .. })));
    }

    #[test]
    fn test_shape_type_codes_round_trip() {
        for code in [0, 1, 3, 5, 8, 11, 13, 15, 18, 21, 23, 25, 28, 31] {
            assert_eq!(ShapeType::from_code(code).unwrap().code(), code);
        }
        assert_eq!(ShapeType::from_code(2), None);
        assert!(ShapeType::PolygonM.is_polygon());
        assert!(ShapeType::PointZ.is_point());
        assert!(!ShapeType::MultiPoint.is_point());
    }
}
