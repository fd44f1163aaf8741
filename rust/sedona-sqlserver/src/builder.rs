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
use sedona_geometry::error::Result;

use crate::geometry::{
    Figure, FigureAttribute, Geometry, Point, Shape, ShapeType, DEFAULT_GEOGRAPHY_SRID,
    DEFAULT_GEOMETRY_SRID,
};
use crate::writer::write_udt;

/// Incrementally assembles a [Geometry]
///
/// Shapes are opened with [GeometryBuilder::add_shape] and closed with
/// [GeometryBuilder::close_shape]; shapes opened while another one is open
/// become its children. Figures and points are appended to the most recently
/// added shape and figure respectively.
///
/// Unbalanced calls are bugs in the caller rather than bad input and panic.
#[derive(Debug)]
pub struct GeometryBuilder {
    geometry: Geometry,
    srid: i32,
    shape_stack: Vec<usize>,
    is_geography: bool,
}

impl GeometryBuilder {
    pub fn new(is_geography: bool) -> Self {
        Self {
            geometry: Geometry::default(),
            srid: if is_geography {
                DEFAULT_GEOGRAPHY_SRID
            } else {
                DEFAULT_GEOMETRY_SRID
            },
            shape_stack: vec![],
            is_geography,
        }
    }

    pub fn is_geography(&self) -> bool {
        self.is_geography
    }

    pub fn srid(&self) -> i32 {
        self.srid
    }

    /// SRID applied to the geometry when it is finished
    pub fn set_srid(&mut self, srid: i32) {
        self.srid = srid;
    }

    /// Enable Z and/or M ordinates; once enabled they stay enabled
    pub fn include_dimensions(&mut self, has_z: bool, has_m: bool) {
        self.geometry.properties.has_z |= has_z;
        self.geometry.properties.has_m |= has_m;
    }

    pub fn add_shape(&mut self, shape_type: ShapeType) {
        let index = self.geometry.shapes.len();
        // Offsets that overflow u32 are rejected by the writer
        let parent_offset = self.shape_stack.last().map(|parent| *parent as u32);
        let figure_offset = Some(self.geometry.figures.len() as u32);
        self.geometry
            .shapes
            .push(Shape::new(index, parent_offset, figure_offset, shape_type));
        self.shape_stack.push(index);

        if shape_type.requires_v2() {
            self.geometry.version = 2;
        }
    }

    /// Close the most recently added shape
    ///
    /// # Panics
    ///
    /// Panics if there is no open shape.
    pub fn close_shape(&mut self) {
        if self.shape_stack.pop().is_none() {
            panic!("close_shape() called without a matching add_shape()");
        }
    }

    pub fn add_figure(&mut self, attribute: FigureAttribute) {
        let offset = self.geometry.points.len() as u32;
        self.geometry.figures.push(Figure::new(attribute, offset));
    }

    pub fn add_point(&mut self, x: f64, y: f64, z: f64, m: f64) {
        self.geometry.points.push(Point::new_zm(x, y, z, m));
    }

    /// Finish the most recently added figure
    ///
    /// For geography, rings wound clockwise are reversed in place so that
    /// the interior is on the left. Self-intersecting rings are not detected.
    ///
    /// # Panics
    ///
    /// Panics if no figure has been added.
    pub fn end_figure(&mut self) {
        let Some(figure) = self.geometry.figures.last() else {
            panic!("end_figure() called without a figure");
        };
        if !self.is_geography {
            return;
        }

        let offset = figure.offset as usize;
        let points = &mut self.geometry.points[offset..];
        if is_clockwise(points) {
            log::debug!("Reversing clockwise ring of {} points", points.len());
            points.reverse();
        }
    }

    /// Apply the SRID and return the assembled geometry
    ///
    /// # Panics
    ///
    /// Panics if a shape is still open.
    pub fn finish(self) -> Geometry {
        assert!(
            self.shape_stack.is_empty(),
            "{} shape(s) still open",
            self.shape_stack.len()
        );
        Geometry {
            srid: self.srid,
            ..self.geometry
        }
    }

    /// Finish the geometry and serialize it
    pub fn generate(self) -> Result<Vec<u8>> {
        let is_geography = self.is_geography;
        write_udt(&self.finish(), is_geography)
    }
}

/// Shoelace test for a clockwise ring
///
/// Accumulates `(x2 - x1) * (y2 + y1)` over consecutive vertices, including
/// the edge from the last vertex back to the first; a positive total means
/// clockwise. Rings with fewer than three points are never clockwise.
pub fn is_clockwise(vertices: &[Point]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let area: f64 = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| (b.x - a.x) * (b.y + a.y))
        .sum();

    area > 0.0
}
