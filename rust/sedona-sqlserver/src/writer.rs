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
use byteorder::{LittleEndian, WriteBytesExt};
use sedona_geometry::error::{Result, SedonaGeometryError};

use crate::geometry::{
    is_null_geography, Figure, FigureAttribute, Geometry, SerializationProperties, ShapeType,
};

/// Compact encodings that omit the counts and the figure and shape arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompactForm {
    SinglePoint,
    SingleLineSegment,
}

/// Encode a SQL Server geometry value
pub fn write_geometry(geom: &Geometry) -> Result<Vec<u8>> {
    write_udt(geom, false)
}

/// Encode a SQL Server geography value
///
/// A geometry carrying the NULL sentinel SRID (-1) encodes to an empty buffer.
pub fn write_geography(geom: &Geometry) -> Result<Vec<u8>> {
    write_udt(geom, true)
}

/// Encode a SQL Server geometry or geography value
///
/// The single point and single line segment flags are derived from the
/// structure of `geom`; whatever the caller set in [Geometry::properties] for
/// them is ignored. The valid flag is always set.
pub fn write_udt(geom: &Geometry, is_geography: bool) -> Result<Vec<u8>> {
    if is_geography && is_null_geography(geom.srid)? {
        return Ok(Vec::new());
    }
    if geom.version > 2 {
        return Err(SedonaGeometryError::Format(format!(
            "Version {} is not supported",
            geom.version
        )));
    }
    if geom.version < 2 {
        if let Some(shape) = geom.shapes.iter().find(|shape| shape.shape_type.requires_v2()) {
            return Err(SedonaGeometryError::Format(format!(
                "{:?} requires serialization version 2",
                shape.shape_type
            )));
        }
    }

    let compact = compact_form(geom);
    let properties = SerializationProperties {
        is_valid: true,
        is_single_point: compact == Some(CompactForm::SinglePoint),
        is_single_line_segment: compact == Some(CompactForm::SingleLineSegment),
        ..geom.properties
    };
    log::trace!(
        "Writing SQL Server UDT: SRID {}, version {}, compact form {compact:?}",
        geom.srid,
        geom.version
    );

    let num_points = u32::try_from(geom.points.len())?;
    let num_figures = u32::try_from(geom.figures.len())?;
    let num_shapes = u32::try_from(geom.shapes.len())?;
    let num_ordinates = 2 + properties.has_z as usize + properties.has_m as usize;

    let mut buf = Vec::with_capacity(
        6 + 12
            + geom.points.len() * num_ordinates * 8
            + geom.figures.len() * 5
            + geom.shapes.len() * 9,
    );

    buf.write_i32::<LittleEndian>(geom.srid)?;
    buf.write_u8(geom.version)?;
    buf.write_u8(properties.to_flags(geom.version))?;

    if compact.is_none() {
        buf.write_u32::<LittleEndian>(num_points)?;
    }
    for point in &geom.points {
        let (first, second) = if is_geography {
            (point.y, point.x)
        } else {
            (point.x, point.y)
        };
        buf.write_f64::<LittleEndian>(first)?;
        buf.write_f64::<LittleEndian>(second)?;
    }
    if properties.has_z {
        for point in &geom.points {
            buf.write_f64::<LittleEndian>(point.z)?;
        }
    }
    if properties.has_m {
        for point in &geom.points {
            buf.write_f64::<LittleEndian>(point.m)?;
        }
    }

    if compact.is_none() {
        buf.write_u32::<LittleEndian>(num_figures)?;
        for figure in &geom.figures {
            buf.write_u8(figure.attribute.value())?;
            buf.write_u32::<LittleEndian>(figure.offset)?;
        }

        buf.write_u32::<LittleEndian>(num_shapes)?;
        for shape in &geom.shapes {
            buf.write_i32::<LittleEndian>(offset_to_i32(shape.parent_offset)?)?;
            buf.write_i32::<LittleEndian>(offset_to_i32(shape.figure_offset)?)?;
            buf.write_u8(shape.shape_type.value())?;
        }
    }

    if geom.version == 2 && !geom.segments.is_empty() {
        buf.write_u32::<LittleEndian>(u32::try_from(geom.segments.len())?)?;
        for segment in &geom.segments {
            buf.write_u8(segment.value())?;
        }
    }

    Ok(buf)
}

/// A single point or line segment can only use the compact form if it is
/// exactly what the reader synthesizes for it
fn compact_form(geom: &Geometry) -> Option<CompactForm> {
    let ([figure], [shape]) = (geom.figures.as_slice(), geom.shapes.as_slice()) else {
        return None;
    };
    if *figure != Figure::new(FigureAttribute::STROKE, 0)
        || shape.parent_offset.is_some()
        || shape.figure_offset != Some(0)
    {
        return None;
    }

    match (geom.points.len(), shape.shape_type) {
        (1, ShapeType::Point) => Some(CompactForm::SinglePoint),
        (2, ShapeType::LineString) => Some(CompactForm::SingleLineSegment),
        _ => None,
    }
}

fn offset_to_i32(offset: Option<u32>) -> Result<i32> {
    match offset {
        Some(offset) => Ok(i32::try_from(offset)?),
        None => Ok(-1),
    }
}
