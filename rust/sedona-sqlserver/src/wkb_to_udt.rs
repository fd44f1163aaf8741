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
use sedona_geometry::{
    error::Result,
    wkb_reader::{read_wkb, WkbCoord, WkbGeometry},
};

use crate::{
    builder::GeometryBuilder,
    geometry::{FigureAttribute, Geometry, ShapeType},
    options::ConversionOptions,
    writer::write_udt,
};

/// Convert WKB or EWKB into the SQL Server binary format
///
/// The SRID embedded in the input wins over [ConversionOptions::srid].
pub fn wkb_to_udt(wkb: &[u8], options: &ConversionOptions) -> Result<Vec<u8>> {
    let geom = wkb_to_geometry(wkb, options)?;
    write_udt(&geom, options.is_geography())
}

/// Convert WKB or EWKB into a [Geometry] without serializing it
pub fn wkb_to_geometry(wkb: &[u8], options: &ConversionOptions) -> Result<Geometry> {
    let wkb_geom = read_wkb(wkb)?;
    log::trace!(
        "Converting {} to {}",
        wkb_geom.geometry_type_id(),
        options.kind
    );

    let mut builder = GeometryBuilder::new(options.is_geography());
    builder.set_srid(options.srid());
    append_wkb_geometry(&mut builder, &wkb_geom);
    Ok(builder.finish())
}

/// Replay a decoded WKB tree into a [GeometryBuilder]
///
/// Single geometries apply their SRID before their points are added and
/// collections apply theirs after their children, so the outermost SRID
/// wins. Nodes without an SRID leave the builder's SRID untouched.
pub fn append_wkb_geometry(builder: &mut GeometryBuilder, geom: &WkbGeometry) {
    let header = geom.header();
    builder.include_dimensions(header.has_z(), header.has_m());

    match geom {
        WkbGeometry::Point { coord, .. } => {
            apply_srid(builder, geom);
            builder.add_shape(ShapeType::Point);
            builder.add_figure(FigureAttribute::STROKE);
            add_coord(builder, coord);
            builder.close_shape();
        }
        WkbGeometry::LineString { coords, .. } => {
            apply_srid(builder, geom);
            builder.add_shape(ShapeType::LineString);
            add_stroke(builder, FigureAttribute::STROKE, coords);
            builder.close_shape();
        }
        WkbGeometry::CircularString { coords, .. } => {
            apply_srid(builder, geom);
            builder.add_shape(ShapeType::CircularString);
            add_stroke(builder, FigureAttribute::V2_ARC, coords);
            builder.close_shape();
        }
        WkbGeometry::Polygon { rings, .. } => {
            apply_srid(builder, geom);
            builder.add_shape(ShapeType::Polygon);
            for (i, ring) in rings.iter().enumerate() {
                let attribute = if i == 0 {
                    FigureAttribute::EXTERIOR_RING
                } else {
                    FigureAttribute::INTERIOR_RING
                };
                add_stroke(builder, attribute, ring);
                builder.end_figure();
            }
            builder.close_shape();
        }
        WkbGeometry::MultiPoint { points: children, .. } => {
            append_collection(builder, ShapeType::MultiPoint, children);
            apply_srid(builder, geom);
        }
        WkbGeometry::MultiLineString {
            line_strings: children,
            ..
        } => {
            append_collection(builder, ShapeType::MultiLineString, children);
            apply_srid(builder, geom);
        }
        WkbGeometry::MultiPolygon {
            polygons: children, ..
        } => {
            append_collection(builder, ShapeType::MultiPolygon, children);
            apply_srid(builder, geom);
        }
        WkbGeometry::GeometryCollection {
            geometries: children,
            ..
        } => {
            append_collection(builder, ShapeType::GeometryCollection, children);
            apply_srid(builder, geom);
        }
    }
}

fn append_collection(
    builder: &mut GeometryBuilder,
    shape_type: ShapeType,
    children: &[WkbGeometry],
) {
    builder.add_shape(shape_type);
    for child in children {
        append_wkb_geometry(builder, child);
    }
    builder.close_shape();
}

fn apply_srid(builder: &mut GeometryBuilder, geom: &WkbGeometry) {
    if let Some(srid) = geom.header().srid() {
        builder.set_srid(srid);
    }
}

fn add_stroke(builder: &mut GeometryBuilder, attribute: FigureAttribute, coords: &[WkbCoord]) {
    builder.add_figure(attribute);
    for coord in coords {
        add_coord(builder, coord);
    }
}

fn add_coord(builder: &mut GeometryBuilder, coord: &WkbCoord) {
    builder.add_point(coord.x, coord.y, coord.z, coord.m);
}
