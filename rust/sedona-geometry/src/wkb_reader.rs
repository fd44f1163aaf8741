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

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use wkb::Endianness;

use crate::error::{Result, SedonaGeometryError};
use crate::types::GeometryTypeId;
use crate::wkb_header::WkbHeader;

/// Collections nested deeper than this are rejected rather than recursed into
pub const MAX_NESTING_DEPTH: usize = 64;

/// A coordinate read from WKB
///
/// Ordinates that the node does not declare are left at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WkbCoord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub m: f64,
}

impl WkbCoord {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }
}

/// A fully decoded WKB geometry
///
/// Every node keeps its own [WkbHeader] because byte order, dimensions and
/// SRID are declared per node. Children of the Multi* variants are guaranteed
/// by [read_wkb] to be of the matching single type.
#[derive(Debug, Clone, PartialEq)]
pub enum WkbGeometry {
    Point {
        header: WkbHeader,
        coord: WkbCoord,
    },
    LineString {
        header: WkbHeader,
        coords: Vec<WkbCoord>,
    },
    Polygon {
        header: WkbHeader,
        rings: Vec<Vec<WkbCoord>>,
    },
    MultiPoint {
        header: WkbHeader,
        points: Vec<WkbGeometry>,
    },
    MultiLineString {
        header: WkbHeader,
        line_strings: Vec<WkbGeometry>,
    },
    MultiPolygon {
        header: WkbHeader,
        polygons: Vec<WkbGeometry>,
    },
    GeometryCollection {
        header: WkbHeader,
        geometries: Vec<WkbGeometry>,
    },
    CircularString {
        header: WkbHeader,
        coords: Vec<WkbCoord>,
    },
}

impl WkbGeometry {
    pub fn header(&self) -> &WkbHeader {
        match self {
            WkbGeometry::Point { header, .. }
            | WkbGeometry::LineString { header, .. }
            | WkbGeometry::Polygon { header, .. }
            | WkbGeometry::MultiPoint { header, .. }
            | WkbGeometry::MultiLineString { header, .. }
            | WkbGeometry::MultiPolygon { header, .. }
            | WkbGeometry::GeometryCollection { header, .. }
            | WkbGeometry::CircularString { header, .. } => header,
        }
    }

    pub fn geometry_type_id(&self) -> GeometryTypeId {
        self.header().geometry_type_id()
    }
}

/// Decode standard or PostGIS extended WKB into a [WkbGeometry]
///
/// Bytes following the first complete geometry are ignored. Geometry types
/// without a dedicated reader (compound curves, curve polygons, multi curves)
/// fail with [SedonaGeometryError::UnsupportedType].
pub fn read_wkb(buf: &[u8]) -> Result<WkbGeometry> {
    WkbReader::new(buf).read_geometry(0)
}

struct WkbReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> WkbReader<'a> {
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

    fn read_header(&mut self) -> Result<WkbHeader> {
        let pos = self.position();
        let rest = self.cursor.get_ref().get(pos..).unwrap_or(&[]);
        let header = WkbHeader::try_new(rest)?;
        self.cursor.set_position((pos + header.size()) as u64);
        Ok(header)
    }

    fn read_u32(&mut self, endianness: Endianness, what: &str) -> Result<u32> {
        let pos = self.position();
        match endianness {
            Endianness::BigEndian => self.cursor.read_u32::<BigEndian>(),
            Endianness::LittleEndian => self.cursor.read_u32::<LittleEndian>(),
        }
        .map_err(|_| truncated(what, pos))
    }

    fn read_f64(&mut self, endianness: Endianness, what: &str) -> Result<f64> {
        let pos = self.position();
        match endianness {
            Endianness::BigEndian => self.cursor.read_f64::<BigEndian>(),
            Endianness::LittleEndian => self.cursor.read_f64::<LittleEndian>(),
        }
        .map_err(|_| truncated(what, pos))
    }

    /// Reads an element count, rejecting counts that cannot possibly fit in
    /// the rest of the buffer given the minimum size of one element
    fn read_count(&mut self, endianness: Endianness, what: &str, min_size: usize) -> Result<usize> {
        let count = self.read_u32(endianness, what)? as usize;
        if count.saturating_mul(min_size) > self.remaining() {
            return Err(SedonaGeometryError::Format(format!(
                "{what} count {count} exceeds the remaining {} bytes",
                self.remaining()
            )));
        }
        Ok(count)
    }

    fn read_coord(&mut self, header: &WkbHeader) -> Result<WkbCoord> {
        let endianness = header.endianness();
        let mut coord = WkbCoord {
            x: self.read_f64(endianness, "x")?,
            y: self.read_f64(endianness, "y")?,
            ..Default::default()
        };
        if header.has_z() {
            coord.z = self.read_f64(endianness, "z")?;
        }
        if header.has_m() {
            coord.m = self.read_f64(endianness, "m")?;
        }
        Ok(coord)
    }

    fn read_coords(&mut self, header: &WkbHeader) -> Result<Vec<WkbCoord>> {
        let coord_size = 8 * (2 + header.has_z() as usize + header.has_m() as usize);
        let count = self.read_count(header.endianness(), "point", coord_size)?;
        (0..count).map(|_| self.read_coord(header)).collect()
    }

    fn read_children(
        &mut self,
        header: &WkbHeader,
        expected: Option<GeometryTypeId>,
        depth: usize,
    ) -> Result<Vec<WkbGeometry>> {
        let count = self.read_count(header.endianness(), "geometry", 5)?;
        let mut children = Vec::with_capacity(count);
        for _ in 0..count {
            let child = self.read_geometry(depth + 1)?;
            if let Some(expected) = expected {
                if child.geometry_type_id() != expected {
                    return Err(SedonaGeometryError::Format(format!(
                        "{} may only contain {expected}, found {}",
                        header.geometry_type_id(),
                        child.geometry_type_id()
                    )));
                }
            }
            children.push(child);
        }
        Ok(children)
    }

    fn read_geometry(&mut self, depth: usize) -> Result<WkbGeometry> {
        if depth > MAX_NESTING_DEPTH {
            return Err(SedonaGeometryError::Format(format!(
                "WKB nested deeper than {MAX_NESTING_DEPTH} levels"
            )));
        }

        let header = self.read_header()?;
        log::trace!(
            "WKB {} {:?} at depth {depth}",
            header.geometry_type_id(),
            header.dimensions()
        );

        let geometry = match header.geometry_type_id() {
            GeometryTypeId::Point => WkbGeometry::Point {
                coord: self.read_coord(&header)?,
                header,
            },
            GeometryTypeId::LineString => WkbGeometry::LineString {
                coords: self.read_coords(&header)?,
                header,
            },
            GeometryTypeId::Polygon => {
                let num_rings = self.read_count(header.endianness(), "ring", 4)?;
                let rings = (0..num_rings)
                    .map(|_| self.read_coords(&header))
                    .collect::<Result<Vec<_>>>()?;
                WkbGeometry::Polygon { header, rings }
            }
            GeometryTypeId::MultiPoint => WkbGeometry::MultiPoint {
                points: self.read_children(&header, Some(GeometryTypeId::Point), depth)?,
                header,
            },
            GeometryTypeId::MultiLineString => WkbGeometry::MultiLineString {
                line_strings: self.read_children(
                    &header,
                    Some(GeometryTypeId::LineString),
                    depth,
                )?,
                header,
            },
            GeometryTypeId::MultiPolygon => WkbGeometry::MultiPolygon {
                polygons: self.read_children(&header, Some(GeometryTypeId::Polygon), depth)?,
                header,
            },
            GeometryTypeId::GeometryCollection => WkbGeometry::GeometryCollection {
                geometries: self.read_children(&header, None, depth)?,
                header,
            },
            GeometryTypeId::CircularString => WkbGeometry::CircularString {
                coords: self.read_coords(&header)?,
                header,
            },
            other @ (GeometryTypeId::Geometry
            | GeometryTypeId::CompoundCurve
            | GeometryTypeId::CurvePolygon
            | GeometryTypeId::MultiCurve) => {
                return Err(SedonaGeometryError::UnsupportedType(other.to_string()))
            }
        };

        Ok(geometry)
    }
}

fn truncated(what: &str, pos: usize) -> SedonaGeometryError {
    SedonaGeometryError::Format(format!(
        "unexpected end of WKB buffer reading {what} at byte {pos}"
    ))
}
