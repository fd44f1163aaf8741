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
//! In-memory model of the SQL Server CLR geometry/geography serialization
//!
//! The model mirrors the wire format: flat point, figure, shape and segment
//! sequences linked to each other by offsets. A figure owns the points from its
//! offset up to the offset of the next figure (or the end of the points), and a
//! shape owns figures the same way. Shapes form a forest in which every parent
//! precedes its children.
use std::ops::{Range, RangeInclusive};

use sedona_geometry::error::{Result, SedonaGeometryError};

/// SRIDs accepted by the geography type
pub const GEOGRAPHY_SRID_RANGE: RangeInclusive<i32> = 4210..=4999;

/// Geography SRID marking a NULL geometry
pub const GEOGRAPHY_NULL_SRID: i32 = -1;

/// SRID assigned by SQL Server to geometry values that do not specify one
pub const DEFAULT_GEOMETRY_SRID: i32 = 0;

/// SRID assigned by SQL Server to geography values that do not specify one (WGS 84)
pub const DEFAULT_GEOGRAPHY_SRID: i32 = 4326;

/// Returns true if `srid` is the geography NULL sentinel and an error if it is
/// otherwise outside of [GEOGRAPHY_SRID_RANGE]
pub(crate) fn is_null_geography(srid: i32) -> Result<bool> {
    if srid == GEOGRAPHY_NULL_SRID {
        Ok(true)
    } else if GEOGRAPHY_SRID_RANGE.contains(&srid) {
        Ok(false)
    } else {
        Err(SedonaGeometryError::InvalidSrid(srid))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub m: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    pub fn new_zm(x: f64, y: f64, z: f64, m: f64) -> Self {
        Self { x, y, z, m }
    }
}

/// Role of a figure
///
/// The numeric values are shared between the two serialization versions but
/// their meaning differs: version 1 uses ring/stroke attributes while version 2
/// describes the kind of curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FigureAttribute(u8);

impl FigureAttribute {
    pub const INTERIOR_RING: Self = Self(0);
    pub const STROKE: Self = Self(1);
    pub const EXTERIOR_RING: Self = Self(2);

    pub const V2_POINT: Self = Self(0);
    pub const V2_LINE: Self = Self(1);
    pub const V2_ARC: Self = Self(2);
    pub const V2_COMPOSITE_CURVE: Self = Self(3);

    /// Validate a serialized attribute against the serialization version
    pub fn try_from_u8(value: u8, version: u8) -> Result<Self> {
        let max = if version >= 2 { 3 } else { 2 };
        if value > max {
            return Err(SedonaGeometryError::Format(format!(
                "Invalid figure attribute {value} for version {version}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Figure {
    pub attribute: FigureAttribute,
    /// Index of the first point of this figure
    pub offset: u32,
}

impl Figure {
    pub fn new(attribute: FigureAttribute, offset: u32) -> Self {
        Self { attribute, offset }
    }
}

/// OGC type of a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ShapeType {
    Point = 1,
    LineString = 2,
    Polygon = 3,
    MultiPoint = 4,
    MultiLineString = 5,
    MultiPolygon = 6,
    GeometryCollection = 7,
    CircularString = 8,
    CompoundCurve = 9,
    CurvePolygon = 10,
    FullGlobe = 11,
}

impl ShapeType {
    pub fn try_from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Point),
            2 => Ok(Self::LineString),
            3 => Ok(Self::Polygon),
            4 => Ok(Self::MultiPoint),
            5 => Ok(Self::MultiLineString),
            6 => Ok(Self::MultiPolygon),
            7 => Ok(Self::GeometryCollection),
            8 => Ok(Self::CircularString),
            9 => Ok(Self::CompoundCurve),
            10 => Ok(Self::CurvePolygon),
            11 => Ok(Self::FullGlobe),
            _ => Err(SedonaGeometryError::UnsupportedType(format!(
                "Unknown shape type {value}"
            ))),
        }
    }

    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// Shape types that only exist in serialization version 2
    pub fn requires_v2(&self) -> bool {
        self.value() > Self::GeometryCollection.value()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    /// Index of the enclosing shape, `None` for roots
    pub parent_offset: Option<u32>,
    /// Index of the first figure of this shape, `None` for empty shapes
    pub figure_offset: Option<u32>,
    pub shape_type: ShapeType,
    index: usize,
}

impl Shape {
    pub fn new(
        index: usize,
        parent_offset: Option<u32>,
        figure_offset: Option<u32>,
        shape_type: ShapeType,
    ) -> Self {
        Self {
            parent_offset,
            figure_offset,
            shape_type,
            index,
        }
    }

    /// Position of this shape in [Geometry::shapes]
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Segment kinds used by version 2 compound curves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Segment {
    Line = 0,
    Arc = 1,
    FirstLine = 2,
    FirstArc = 3,
}

impl Segment {
    pub fn try_from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Line),
            1 => Ok(Self::Arc),
            2 => Ok(Self::FirstLine),
            3 => Ok(Self::FirstArc),
            _ => Err(SedonaGeometryError::Format(format!(
                "Invalid segment type {value}"
            ))),
        }
    }

    pub fn value(&self) -> u8 {
        *self as u8
    }
}

pub const FLAG_Z: u8 = 1 << 0;
pub const FLAG_M: u8 = 1 << 1;
pub const FLAG_VALID: u8 = 1 << 2;
pub const FLAG_SINGLE_POINT: u8 = 1 << 3;
pub const FLAG_SINGLE_LINE_SEGMENT: u8 = 1 << 4;
pub const FLAG_LARGER_THAN_HEMISPHERE: u8 = 1 << 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SerializationProperties {
    pub has_z: bool,
    pub has_m: bool,
    pub is_valid: bool,
    /// One point, one figure, one shape; counts and arrays are omitted
    pub is_single_point: bool,
    /// Two points, one figure, one shape; counts and arrays are omitted
    pub is_single_line_segment: bool,
    /// Version 2 geography only
    pub is_larger_than_hemisphere: bool,
}

impl SerializationProperties {
    pub fn from_flags(flags: u8, version: u8) -> Self {
        Self {
            has_z: flags & FLAG_Z != 0,
            has_m: flags & FLAG_M != 0,
            is_valid: flags & FLAG_VALID != 0,
            is_single_point: flags & FLAG_SINGLE_POINT != 0,
            is_single_line_segment: flags & FLAG_SINGLE_LINE_SEGMENT != 0,
            is_larger_than_hemisphere: version == 2 && flags & FLAG_LARGER_THAN_HEMISPHERE != 0,
        }
    }

    pub fn to_flags(&self, version: u8) -> u8 {
        let mut flags = 0;
        for (set, flag) in [
            (self.has_z, FLAG_Z),
            (self.has_m, FLAG_M),
            (self.is_valid, FLAG_VALID),
            (self.is_single_point, FLAG_SINGLE_POINT),
            (self.is_single_line_segment, FLAG_SINGLE_LINE_SEGMENT),
            (
                version == 2 && self.is_larger_than_hemisphere,
                FLAG_LARGER_THAN_HEMISPHERE,
            ),
        ] {
            if set {
                flags |= flag;
            }
        }
        flags
    }
}

/// A SQL Server geometry or geography value
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub srid: i32,
    /// Serialization version, 1 or 2
    pub version: u8,
    pub properties: SerializationProperties,
    pub points: Vec<Point>,
    pub figures: Vec<Figure>,
    pub shapes: Vec<Shape>,
    pub segments: Vec<Segment>,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            srid: DEFAULT_GEOMETRY_SRID,
            version: 1,
            properties: SerializationProperties {
                is_valid: true,
                ..Default::default()
            },
            points: vec![],
            figures: vec![],
            shapes: vec![],
            segments: vec![],
        }
    }
}

impl Geometry {
    /// A geometry without any shapes
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Range of [Geometry::figures] owned by a shape
    ///
    /// Container shapes usually own no figures themselves: their children
    /// start at the same figure offset.
    pub fn figure_range(&self, shape_index: usize) -> Range<usize> {
        let Some(start) = self
            .shapes
            .get(shape_index)
            .and_then(|shape| shape.figure_offset)
        else {
            return 0..0;
        };
        let start = start as usize;
        let end = self.shapes[shape_index + 1..]
            .iter()
            .find_map(|shape| shape.figure_offset)
            .map(|offset| offset as usize)
            .unwrap_or(self.figures.len());
        start..end.max(start)
    }

    pub fn figures_of(&self, shape_index: usize) -> &[Figure] {
        self.figures
            .get(self.figure_range(shape_index))
            .unwrap_or(&[])
    }

    /// Range of [Geometry::points] owned by a figure
    pub fn point_range(&self, figure_index: usize) -> Range<usize> {
        let Some(figure) = self.figures.get(figure_index) else {
            return 0..0;
        };
        let start = figure.offset as usize;
        let end = self
            .figures
            .get(figure_index + 1)
            .map(|next| next.offset as usize)
            .unwrap_or(self.points.len());
        start..end.max(start)
    }

    pub fn points_of(&self, figure_index: usize) -> &[Point] {
        self.points
            .get(self.point_range(figure_index))
            .unwrap_or(&[])
    }

    /// All points of a shape, excluding those of its child shapes
    pub fn shape_points(&self, shape_index: usize) -> &[Point] {
        let figures = self.figure_range(shape_index);
        if figures.is_empty() {
            return &[];
        }
        let start = self.point_range(figures.start).start;
        let end = self.point_range(figures.end - 1).end;
        self.points.get(start..end).unwrap_or(&[])
    }

    pub fn parent_of(&self, shape_index: usize) -> Option<&Shape> {
        self.shapes
            .get(shape_index)?
            .parent_offset
            .and_then(|parent| self.shapes.get(parent as usize))
    }

    pub fn children_of(&self, shape_index: usize) -> impl Iterator<Item = &Shape> + '_ {
        self.shapes
            .iter()
            .skip(shape_index + 1)
            .filter(move |shape| shape.parent_offset == Some(shape_index as u32))
    }

    /// Shapes without a parent
    pub fn roots(&self) -> impl Iterator<Item = &Shape> + '_ {
        self.shapes.iter().filter(|shape| shape.parent_offset.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// MULTIPOLYGON (((0 0, 1 0, 1 1, 0 0)), ((5 5, 6 5, 6 6, 5 5), (5.2 5.2, 5.4 5.2, 5.4 5.4, 5.2 5.2)))
    fn multipolygon() -> Geometry {
        let ring = |x: f64, size: f64| {
            vec![
                Point::new(x, x),
                Point::new(x + size, x),
                Point::new(x + size, x + size),
                Point::new(x, x),
            ]
        };
        let mut points = ring(0.0, 1.0);
        points.extend(ring(5.0, 1.0));
        points.extend(ring(5.2, 0.2));

        Geometry {
            points,
            figures: vec![
                Figure::new(FigureAttribute::EXTERIOR_RING, 0),
                Figure::new(FigureAttribute::EXTERIOR_RING, 4),
                Figure::new(FigureAttribute::INTERIOR_RING, 8),
            ],
            shapes: vec![
                Shape::new(0, None, Some(0), ShapeType::MultiPolygon),
                Shape::new(1, Some(0), Some(0), ShapeType::Polygon),
                Shape::new(2, Some(0), Some(1), ShapeType::Polygon),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn structural_accessors() {
        let geom = multipolygon();

        assert!(geom.figures_of(0).is_empty());
        assert_eq!(geom.figure_range(1), 0..1);
        assert_eq!(geom.figure_range(2), 1..3);
        assert_eq!(
            geom.figures_of(2)[1].attribute,
            FigureAttribute::INTERIOR_RING
        );

        assert_eq!(geom.point_range(0), 0..4);
        assert_eq!(geom.point_range(2), 8..12);
        assert_eq!(geom.points_of(1)[0], Point::new(5.0, 5.0));
        assert_eq!(geom.shape_points(2).len(), 8);
        assert!(geom.shape_points(0).is_empty());

        assert_eq!(geom.parent_of(0), None);
        assert_eq!(geom.parent_of(2).map(|s| s.index()), Some(0));
        let children: Vec<_> = geom.children_of(0).map(|s| s.index()).collect();
        assert_eq!(children, vec![1, 2]);
        assert_eq!(geom.roots().count(), 1);
    }

    #[test]
    fn out_of_range_accessors() {
        let geom = multipolygon();
        assert!(geom.figures_of(10).is_empty());
        assert!(geom.points_of(10).is_empty());
        assert_eq!(geom.parent_of(10), None);
        assert_eq!(geom.children_of(10).count(), 0);

        let empty = Geometry::default();
        assert!(empty.is_empty());
        assert!(empty.shape_points(0).is_empty());
    }

    #[test]
    fn empty_shape_figures() {
        // MULTIPOINT (EMPTY, (1 2)): the empty child has no figure offset
        let geom = Geometry {
            points: vec![Point::new(1.0, 2.0)],
            figures: vec![Figure::new(FigureAttribute::STROKE, 0)],
            shapes: vec![
                Shape::new(0, None, Some(0), ShapeType::MultiPoint),
                Shape::new(1, Some(0), None, ShapeType::Point),
                Shape::new(2, Some(0), Some(0), ShapeType::Point),
            ],
            ..Default::default()
        };
        assert!(geom.figures_of(0).is_empty());
        assert!(geom.figures_of(1).is_empty());
        assert_eq!(geom.figures_of(2).len(), 1);
    }

    #[rstest]
    fn flags_roundtrip(
        #[values(0x00, 0x01, 0x02, 0x04, 0x05, 0x0c, 0x14, 0x07)] flags: u8,
        #[values(1, 2)] version: u8,
    ) {
        let properties = SerializationProperties::from_flags(flags, version);
        assert_eq!(properties.to_flags(version), flags);
    }

    #[test]
    fn larger_than_hemisphere_is_version_2_only() {
        let properties = SerializationProperties::from_flags(0x24, 1);
        assert!(!properties.is_larger_than_hemisphere);
        assert!(properties.is_valid);

        let properties = SerializationProperties::from_flags(0x24, 2);
        assert!(properties.is_larger_than_hemisphere);
        assert_eq!(properties.to_flags(2), 0x24);
        assert_eq!(properties.to_flags(1), 0x04);
    }

    #[test]
    fn shape_types() {
        for value in 1..=11u8 {
            let shape_type = ShapeType::try_from_u8(value).unwrap();
            assert_eq!(shape_type.value(), value);
            assert_eq!(shape_type.requires_v2(), value > 7);
        }
        let err = ShapeType::try_from_u8(12).unwrap_err();
        assert!(matches!(err, SedonaGeometryError::UnsupportedType(_)));
    }

    #[test]
    fn figure_attributes() {
        assert_eq!(
            FigureAttribute::try_from_u8(2, 1).unwrap(),
            FigureAttribute::EXTERIOR_RING
        );
        assert_eq!(
            FigureAttribute::try_from_u8(3, 2).unwrap(),
            FigureAttribute::V2_COMPOSITE_CURVE
        );
        assert!(FigureAttribute::try_from_u8(3, 1).is_err());
        assert!(FigureAttribute::try_from_u8(4, 2).is_err());
    }

    #[test]
    fn segments() {
        for value in 0..=3u8 {
            assert_eq!(Segment::try_from_u8(value).unwrap().value(), value);
        }
        assert!(Segment::try_from_u8(4).is_err());
    }

    #[test]
    fn geography_srid_domain() {
        assert!(is_null_geography(-1).unwrap());
        assert!(!is_null_geography(4326).unwrap());
        assert!(!is_null_geography(4210).unwrap());
        assert!(!is_null_geography(4999).unwrap());
        for srid in [0, 4209, 5000] {
            assert!(matches!(
                is_null_geography(srid),
                Err(SedonaGeometryError::InvalidSrid(s)) if s == srid
            ));
        }
    }
}
