// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use sedona_geometry::error::{Result, SedonaGeometryError};

use crate::geometry::{
    is_null_geography, Figure, FigureAttribute, Geometry, Point, Segment,
    SerializationProperties, Shape, ShapeType,
};

/// Decode a SQL Server geometry value
pub fn read_geometry(buf: &[u8]) -> Result<Geometry> {
    // A geometry column has no NULL sentinel SRID, so a value is always produced
    UdtReader::new(buf)
        .read(false)?
        .ok_or_else(|| SedonaGeometryError::Format("missing geometry".to_string()))
}

/// Decode a SQL Server geography value
///
/// Returns `None` for the NULL sentinel (SRID -1).
pub fn read_geography(buf: &[u8]) -> Result<Option<Geometry>> {
    UdtReader::new(buf).read(true)
}

/// Decode a SQL Server geometry or geography value
///
/// Points are returned in (X, Y) order for both types; geography stores them
/// latitude first on the wire.
pub fn read_udt(buf: &[u8], is_geography: bool) -> Result<Option<Geometry>> {
    UdtReader::new(buf).read(is_geography)
}

struct UdtReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> UdtReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(buf),
        }
    }

    fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.position())
    }

    fn read_u8(&mut self, what: &str) -> Result<u8> {
        let pos = self.position();
        self.cursor.read_u8().map_err(|_| truncated(what, pos))
    }

    fn read_u32(&mut self, what: &str) -> Result<u32> {
        let pos = self.position();
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| truncated(what, pos))
    }

    fn read_i32(&mut self, what: &str) -> Result<i32> {
        let pos = self.position();
        self.cursor
            .read_i32::<LittleEndian>()
            .map_err(|_| truncated(what, pos))
    }

    fn read_f64(&mut self, what: &str) -> Result<f64> {
        let pos = self.position();
        self.cursor
            .read_f64::<LittleEndian>()
            .map_err(|_| truncated(what, pos))
    }

    fn read_count(&mut self, what: &str, item_size: usize) -> Result<usize> {
        let count = self.read_u32(what)? as usize;
        if count.saturating_mul(item_size) > self.remaining() {
            return Err(SedonaGeometryError::Format(format!(
                "{what} {count} exceeds the remaining {} bytes",
                self.remaining()
            )));
        }
        Ok(count)
    }

    /// Reads a signed offset where -1 stands for "none"
    fn read_offset(&mut self, what: &str) -> Result<Option<u32>> {
        match self.read_i32(what)? {
            -1 => Ok(None),
            offset if offset >= 0 => Ok(Some(offset as u32)),
            offset => Err(SedonaGeometryError::Format(format!(
                "Invalid {what} {offset}"
            ))),
        }
    }

    fn read(&mut self, is_geography: bool) -> Result<Option<Geometry>> {
        let srid = self.read_i32("SRID")?;
        if is_geography && is_null_geography(srid)? {
            return Ok(None);
        }

        let version = self.read_u8("version")?;
        if version > 2 {
            return Err(SedonaGeometryError::Format(format!(
                "Version {version} is not supported"
            )));
        }

        let flags = self.read_u8("flags")?;
        let properties = SerializationProperties::from_flags(flags, version);
        if properties.is_single_point && properties.is_single_line_segment {
            return Err(SedonaGeometryError::InconsistentFlags);
        }
        let compact = properties.is_single_point || properties.is_single_line_segment;
        log::trace!("SQL Server UDT: SRID {srid}, version {version}, flags {flags:#04x}");

        let num_points = if properties.is_single_point {
            1
        } else if properties.is_single_line_segment {
            2
        } else {
            self.read_count("number of points", 16)?
        };

        let mut points = Vec::with_capacity(num_points);
        for _ in 0..num_points {
            let first = self.read_f64("point")?;
            let second = self.read_f64("point")?;
            points.push(if is_geography {
                Point::new(second, first)
            } else {
                Point::new(first, second)
            });
        }
        if properties.has_z {
            for point in points.iter_mut() {
                point.z = self.read_f64("z")?;
            }
        }
        if properties.has_m {
            for point in points.iter_mut() {
                point.m = self.read_f64("m")?;
            }
        }

        let figures = if compact {
            vec![Figure::new(FigureAttribute::STROKE, 0)]
        } else {
            let num_figures = self.read_count("number of figures", 5)?;
            let mut figures = Vec::with_capacity(num_figures);
            for _ in 0..num_figures {
                let attribute = FigureAttribute::try_from_u8(self.read_u8("figure")?, version)?;
                let offset = self.read_u32("figure offset")?;
                figures.push(Figure::new(attribute, offset));
            }
            figures
        };

        let shapes = if compact {
            let shape_type = if properties.is_single_point {
                ShapeType::Point
            } else {
                ShapeType::LineString
            };
            vec![Shape::new(0, None, Some(0), shape_type)]
        } else {
            let num_shapes = self.read_count("number of shapes", 9)?;
            let mut shapes = Vec::with_capacity(num_shapes);
            for index in 0..num_shapes {
                let parent_offset = self.read_offset("parent offset")?;
                let figure_offset = self.read_offset("figure offset")?;
                let shape_type = ShapeType::try_from_u8(self.read_u8("shape type")?)?;
                shapes.push(Shape::new(index, parent_offset, figure_offset, shape_type));
            }
            shapes
        };

        // The segment count is omitted entirely when there are no segments
        let segments = if version == 2 && self.remaining() > 0 {
            let num_segments = self.read_count("number of segments", 1)?;
            (0..num_segments)
                .map(|_| Segment::try_from_u8(self.read_u8("segment")?))
                .collect::<Result<Vec<_>>>()?
        } else {
            vec![]
        };

        let geom = Geometry {
            srid,
            version,
            properties,
            points,
            figures,
            shapes,
            segments,
        };
        validate_offsets(&geom)?;
        Ok(Some(geom))
    }
}

/// Check that every offset points inside its target sequence, that offsets
/// never decrease and that parents precede their children
fn validate_offsets(geom: &Geometry) -> Result<()> {
    let mut last_point = 0;
    for figure in &geom.figures {
        if figure.offset < last_point || figure.offset as usize > geom.points.len() {
            return Err(SedonaGeometryError::Format(format!(
                "Invalid figure offset {}",
                figure.offset
            )));
        }
        last_point = figure.offset;
    }

    let mut last_figure = 0;
    for shape in &geom.shapes {
        if let Some(offset) = shape.figure_offset {
            if offset < last_figure || offset as usize > geom.figures.len() {
                return Err(SedonaGeometryError::Format(format!(
                    "Invalid figure offset {offset} for shape {}",
                    shape.index()
                )));
            }
            last_figure = offset;
        }
        if let Some(parent) = shape.parent_offset {
            if parent as usize >= shape.index() {
                return Err(SedonaGeometryError::Format(format!(
                    "Parent {parent} of shape {} does not precede it",
                    shape.index()
                )));
            }
        }
    }

    Ok(())
}

fn truncated(what: &str, pos: usize) -> SedonaGeometryError {
    SedonaGeometryError::Format(format!(
        "unexpected end of buffer reading {what} at byte {pos}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sedona_testing::fixtures::{
        UDT_GEOGRAPHY_POINT, UDT_GEOMETRY_LINE_SEGMENT, UDT_GEOMETRY_POINT,
    };

    /// Writes the fields of an uncompressed version 1 geometry by hand
    fn udt_bytes(
        srid: i32,
        flags: u8,
        points: &[(f64, f64)],
        figures: &[(u8, u32)],
        shapes: &[(i32, i32, u8)],
    ) -> Vec<u8> {
        let mut buf = srid.to_le_bytes().to_vec();
        buf.push(0x01);
        buf.push(flags);
        buf.extend_from_slice(&(points.len() as u32).to_le_bytes());
        for (x, y) in points {
            buf.extend_from_slice(&x.to_le_bytes());
            buf.extend_from_slice(&y.to_le_bytes());
        }
        buf.extend_from_slice(&(figures.len() as u32).to_le_bytes());
        for (attribute, offset) in figures {
            buf.push(*attribute);
            buf.extend_from_slice(&offset.to_le_bytes());
        }
        buf.extend_from_slice(&(shapes.len() as u32).to_le_bytes());
        for (parent, figure, shape_type) in shapes {
            buf.extend_from_slice(&parent.to_le_bytes());
            buf.extend_from_slice(&figure.to_le_bytes());
            buf.push(*shape_type);
        }
        buf
    }

    #[test]
    fn single_point() {
        let geom = read_geometry(&UDT_GEOMETRY_POINT).unwrap();
        assert_eq!(geom.srid, 0);
        assert_eq!(geom.version, 1);
        assert!(geom.properties.is_single_point);
        assert!(geom.properties.is_valid);
        assert_eq!(geom.points, vec![Point::new(1.0, 2.0)]);
        assert_eq!(
            geom.figures,
            vec![Figure::new(FigureAttribute::STROKE, 0)]
        );
        assert_eq!(
            geom.shapes,
            vec![Shape::new(0, None, Some(0), ShapeType::Point)]
        );
        assert!(geom.segments.is_empty());
    }

    #[test]
    fn single_line_segment() {
        let geom = read_geometry(&UDT_GEOMETRY_LINE_SEGMENT).unwrap();
        assert!(geom.properties.is_single_line_segment);
        assert_eq!(geom.points, vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert_eq!(geom.shapes[0].shape_type, ShapeType::LineString);
        assert_eq!(geom.points_of(0).len(), 2);
    }

    #[test]
    fn geography_point() {
        let geom = read_geography(&UDT_GEOGRAPHY_POINT).unwrap().unwrap();
        assert_eq!(geom.srid, 4326);
        assert_eq!(geom.points, vec![Point::new(10.0, 20.0)]);

        // Read as a geometry the ordinates stay in wire order
        let geom = read_geometry(&UDT_GEOGRAPHY_POINT).unwrap();
        assert_eq!(geom.points, vec![Point::new(20.0, 10.0)]);
    }

    #[test]
    fn geography_srid_domain() {
        let mut buf = UDT_GEOGRAPHY_POINT.to_vec();
        buf[..4].copy_from_slice(&(-1i32).to_le_bytes());
        assert_eq!(read_geography(&buf).unwrap(), None);
        // Nothing after the SRID is needed for the NULL sentinel
        assert_eq!(read_geography(&buf[..4]).unwrap(), None);

        buf[..4].copy_from_slice(&5000i32.to_le_bytes());
        let err = read_geography(&buf).unwrap_err();
        assert!(matches!(err, SedonaGeometryError::InvalidSrid(5000)));

        // Geometry columns accept any SRID
        assert_eq!(read_geometry(&buf).unwrap().srid, 5000);
    }

    #[test]
    fn multipoint() {
        let buf = udt_bytes(
            4326,
            0x04,
            &[(1.0, 2.0), (3.0, 4.0)],
            &[(1, 0), (1, 1)],
            &[(-1, 0, 4), (0, 0, 1), (0, 1, 1)],
        );
        let geom = read_geometry(&buf).unwrap();
        assert_eq!(geom.srid, 4326);
        assert_eq!(geom.shapes.len(), 3);
        assert_eq!(geom.shapes[0].shape_type, ShapeType::MultiPoint);
        assert_eq!(geom.shapes[0].parent_offset, None);
        assert_eq!(geom.shapes[2].index(), 2);
        assert_eq!(geom.shapes[2].parent_offset, Some(0));
        assert_eq!(geom.points_of(1), &[Point::new(3.0, 4.0)]);
        assert_eq!(geom.children_of(0).count(), 2);
    }

    #[test]
    fn z_and_m_columns() {
        let mut buf = 0i32.to_le_bytes().to_vec();
        buf.extend_from_slice(&[0x01, 0x0f]); // valid, Z, M, single point
        for v in [1.0f64, 2.0, 3.0, 4.0] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        let geom = read_geometry(&buf).unwrap();
        assert!(geom.properties.has_z);
        assert!(geom.properties.has_m);
        assert_eq!(geom.points, vec![Point::new_zm(1.0, 2.0, 3.0, 4.0)]);
    }

    #[test]
    fn version_2_segments() {
        // CIRCULARSTRING (0 0, 1 1, 2 0) followed by two segments
        let mut buf = udt_bytes(
            0,
            0x04,
            &[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)],
            &[(2, 0)],
            &[(-1, 0, 8)],
        );
        buf[4] = 0x02;
        let geom = read_geometry(&buf).unwrap();
        assert_eq!(geom.version, 2);
        assert_eq!(geom.figures[0].attribute, FigureAttribute::V2_ARC);
        assert_eq!(geom.shapes[0].shape_type, ShapeType::CircularString);
        assert!(geom.segments.is_empty());

        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&[0x03, 0x01]);
        let geom = read_geometry(&buf).unwrap();
        assert_eq!(geom.segments, vec![Segment::FirstArc, Segment::Arc]);
    }

    #[test]
    fn malformed_values() {
        // P and L at the same time
        let mut buf = UDT_GEOMETRY_POINT.to_vec();
        buf[5] = 0x1c;
        assert!(matches!(
            read_geometry(&buf).unwrap_err(),
            SedonaGeometryError::InconsistentFlags
        ));

        let mut buf = UDT_GEOMETRY_POINT.to_vec();
        buf[4] = 0x03;
        let err = read_geometry(&buf).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid binary geometry: Version 3 is not supported"
        );

        for len in 0..UDT_GEOMETRY_POINT.len() {
            let err = read_geometry(&UDT_GEOMETRY_POINT[..len]).unwrap_err();
            assert!(matches!(err, SedonaGeometryError::Format(_)), "{len}: {err}");
        }
    }

    #[test]
    fn malformed_structure() {
        // Figure offset past the end of the points
        let buf = udt_bytes(0, 0x04, &[(1.0, 2.0)], &[(1, 3)], &[(-1, 0, 1)]);
        assert!(matches!(
            read_geometry(&buf).unwrap_err(),
            SedonaGeometryError::Format(_)
        ));

        // Parent that does not precede its child
        let buf = udt_bytes(
            0,
            0x04,
            &[(1.0, 2.0), (3.0, 4.0)],
            &[(1, 0), (1, 1)],
            &[(1, 0, 1), (-1, 0, 4)],
        );
        let err = read_geometry(&buf).unwrap_err();
        assert!(err.to_string().contains("does not precede"));

        // Unknown shape type
        let buf = udt_bytes(0, 0x04, &[(1.0, 2.0)], &[(1, 0)], &[(-1, 0, 42)]);
        assert!(matches!(
            read_geometry(&buf).unwrap_err(),
            SedonaGeometryError::UnsupportedType(_)
        ));

        // Negative offsets other than -1
        let buf = udt_bytes(0, 0x04, &[(1.0, 2.0)], &[(1, 0)], &[(-2, 0, 1)]);
        assert!(matches!(
            read_geometry(&buf).unwrap_err(),
            SedonaGeometryError::Format(_)
        ));

        // Huge counts are rejected before allocating
        let mut buf = 0i32.to_le_bytes().to_vec();
        buf.extend_from_slice(&[0x01, 0x04]);
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        let err = read_geometry(&buf).unwrap_err();
        assert!(err.to_string().contains("exceeds the remaining"));
    }

    #[test]
    fn empty_shape() {
        // POINT EMPTY: no points, no figures, one shape with figure offset -1
        let buf = udt_bytes(0, 0x04, &[], &[], &[(-1, -1, 1)]);
        let geom = read_geometry(&buf).unwrap();
        assert_eq!(geom.shapes[0].figure_offset, None);
        assert!(geom.figures_of(0).is_empty());
    }
}
