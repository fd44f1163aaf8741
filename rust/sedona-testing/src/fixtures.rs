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
/// A well-known binary blob of POINT (1 2) in big-endian (XDR) byte order
///
/// The georust writers only emit little-endian output, so this is spelled out
/// by hand.
pub const POINT_XDR_WKB: [u8; 21] = [
    0x00, // byte-order
    0x00, 0x00, 0x00, 0x01, // point
    0x3f, 0xf0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // x-coordinate of point
    0x40, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // y-coordinate of point
];

/// A PostGIS extended well-known binary blob of SRID=4326;POINT (1 2)
pub const POINT_WITH_SRID_EWKB: [u8; 25] = [
    0x01, // byte-order
    0x01, 0x00, 0x00, 0x20, // point with the SRID flag set
    0xe6, 0x10, 0x00, 0x00, // SRID 4326
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf0, 0x3f, // x-coordinate of point
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x40, // y-coordinate of point
];

/// A PostGIS extended well-known binary blob of POINT Z (1 2 3)
///
/// Dimensions are flagged in the high bits rather than with the ISO 1000 offset.
pub const POINT_Z_EWKB: [u8; 29] = [
    0x01, // byte-order
    0x01, 0x00, 0x00, 0x80, // point with the Z flag set
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf0, 0x3f, // x-coordinate of point
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x40, // y-coordinate of point
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x08, 0x40, // z-coordinate of point
];

/// A well-known binary blob of a MULTIPOINT whose only child is LINESTRING EMPTY
///
/// The wkt crate's parser rejects this; it is used to check that collections
/// only accept children of the matching type.
pub const MULTIPOINT_WITH_LINESTRING_CHILD_WKB: [u8; 18] = [
    0x01, // byte-order
    0x04, 0x00, 0x00, 0x00, // multipoint
    0x01, 0x00, 0x00, 0x00, // 1 child
    // nested linestring geom
    0x01, // byte-order
    0x02, 0x00, 0x00, 0x00, // linestring
    0x00, 0x00, 0x00, 0x00, // 0 points
];

/// SQL Server geometry serialization of POINT (1 2) with SRID 0
///
/// Uses the single point (P) compact form: no counts, figures or shapes.
pub const UDT_GEOMETRY_POINT: [u8; 22] = [
    0x00, 0x00, 0x00, 0x00, // SRID 0
    0x01, // version
    0x0c, // flags: valid, single point
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf0, 0x3f, // x
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x40, // y
];

/// SQL Server geography serialization of POINT (10 20) with SRID 4326
///
/// Geography stores latitude first, so the Y ordinate comes before X.
pub const UDT_GEOGRAPHY_POINT: [u8; 22] = [
    0xe6, 0x10, 0x00, 0x00, // SRID 4326
    0x01, // version
    0x0c, // flags: valid, single point
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x34, 0x40, // latitude (y = 20)
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x24, 0x40, // longitude (x = 10)
];

/// SQL Server geometry serialization of LINESTRING (0 0, 1 1) with SRID 0
///
/// Uses the single line segment (L) compact form.
pub const UDT_GEOMETRY_LINE_SEGMENT: [u8; 38] = [
    0x00, 0x00, 0x00, 0x00, // SRID 0
    0x01, // version
    0x14, // flags: valid, single line segment
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // x of first point
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // y of first point
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf0, 0x3f, // x of second point
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf0, 0x3f, // y of second point
];
