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

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use geo_traits::Dimensions;
use wkb::Endianness;

use crate::error::{Result, SedonaGeometryError};
use crate::types::GeometryTypeId;

/// PostGIS EWKB flag marking the presence of Z ordinates
pub const EWKB_Z_FLAG: u32 = 0x8000_0000;
/// PostGIS EWKB flag marking the presence of M ordinates
pub const EWKB_M_FLAG: u32 = 0x4000_0000;
/// PostGIS EWKB flag marking an SRID following the type code
pub const EWKB_SRID_FLAG: u32 = 0x2000_0000;

const EWKB_FLAGS: u32 = EWKB_Z_FLAG | EWKB_M_FLAG | EWKB_SRID_FLAG;

/// WKB node header
///
/// Parses the byte order marker, the type code and (for PostGIS extended WKB)
/// the SRID of a single WKB node without touching its body. Dimensions may be
/// declared either with the EWKB high bits or with the ISO 1000/2000/3000
/// offsets; both spellings are accepted as long as they agree.
///
/// See https://libgeos.org/specifications/wkb/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WkbHeader {
    endianness: Endianness,
    geometry_type_id: GeometryTypeId,
    dimensions: Dimensions,
    srid: Option<i32>,
}

impl WkbHeader {
    /// Creates a new [WkbHeader] from the start of a buffer
    pub fn try_new(buf: &[u8]) -> Result<Self> {
        if buf.len() < 5 {
            return Err(SedonaGeometryError::Format(format!(
                "WKB buffer too small ({} bytes)",
                buf.len()
            )));
        }

        let endianness = match buf[0] {
            0 => Endianness::BigEndian,
            1 => Endianness::LittleEndian,
            other => {
                return Err(SedonaGeometryError::Format(format!(
                    "Unexpected byte order: {other}"
                )))
            }
        };

        let code = read_u32(endianness, &buf[1..5]);
        let flag_z = code & EWKB_Z_FLAG != 0;
        let flag_m = code & EWKB_M_FLAG != 0;
        let flag_srid = code & EWKB_SRID_FLAG != 0;

        // 0000 -> xy or unspecified
        // 1000 -> xyz
        // 2000 -> xym
        // 3000 -> xyzm
        let iso_code = code & !EWKB_FLAGS;
        let (iso_z, iso_m) = match iso_code / 1000 {
            0 => (false, false),
            1 => (true, false),
            2 => (false, true),
            3 => (true, true),
            _ => {
                return Err(SedonaGeometryError::Format(format!(
                    "Unexpected geometry type code: {code:#x}"
                )))
            }
        };

        if (flag_z || flag_m) && iso_code >= 1000 && (flag_z, flag_m) != (iso_z, iso_m) {
            return Err(SedonaGeometryError::Format(format!(
                "Conflicting dimensions in geometry type code: {code:#x}"
            )));
        }

        let dimensions = match (flag_z || iso_z, flag_m || iso_m) {
            (false, false) => Dimensions::Xy,
            (true, false) => Dimensions::Xyz,
            (false, true) => Dimensions::Xym,
            (true, true) => Dimensions::Xyzm,
        };

        let geometry_type_id = GeometryTypeId::try_from_wkb_id(iso_code % 1000)?;

        let srid = if flag_srid {
            if buf.len() < 9 {
                return Err(SedonaGeometryError::Format(format!(
                    "WKB buffer too small for SRID ({} bytes)",
                    buf.len()
                )));
            }
            Some(read_u32(endianness, &buf[5..9]) as i32)
        } else {
            None
        };

        Ok(Self {
            endianness,
            geometry_type_id,
            dimensions,
            srid,
        })
    }

    /// Byte order of this node and, unless they declare their own, its children
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// The base geometry type, with the dimension and SRID bits masked off
    pub fn geometry_type_id(&self) -> GeometryTypeId {
        self.geometry_type_id
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn has_z(&self) -> bool {
        matches!(self.dimensions, Dimensions::Xyz | Dimensions::Xyzm)
    }

    pub fn has_m(&self) -> bool {
        matches!(self.dimensions, Dimensions::Xym | Dimensions::Xyzm)
    }

    /// The embedded SRID (PostGIS EWKB only)
    pub fn srid(&self) -> Option<i32> {
        self.srid
    }

    /// Number of bytes occupied by the header in the buffer
    pub fn size(&self) -> usize {
        if self.srid.is_some() {
            9
        } else {
            5
        }
    }
}

fn read_u32(endianness: Endianness, buf: &[u8]) -> u32 {
    match endianness {
        Endianness::BigEndian => BigEndian::read_u32(buf),
        Endianness::LittleEndian => LittleEndian::read_u32(buf),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sedona_testing::fixtures::{POINT_WITH_SRID_EWKB, POINT_XDR_WKB, POINT_Z_EWKB};
    use std::str::FromStr;
    use wkt::Wkt;

    fn make_wkb(wkt_value: &'static str) -> Vec<u8> {
        let geom = Wkt::<f64>::from_str(wkt_value).unwrap();
        let mut buf: Vec<u8> = vec![];
        wkb::writer::write_geometry(&mut buf, &geom, &Default::default()).unwrap();
        buf
    }

    #[test]
    fn geometry_type_id() {
        let wkb = make_wkb("POINT (1 2)");
        let header = WkbHeader::try_new(&wkb).unwrap();
        assert_eq!(header.geometry_type_id(), GeometryTypeId::Point);
        assert_eq!(header.endianness(), Endianness::LittleEndian);
        assert_eq!(header.size(), 5);

        let wkb = make_wkb("LINESTRING (1 2, 3 4)");
        let header = WkbHeader::try_new(&wkb).unwrap();
        assert_eq!(header.geometry_type_id(), GeometryTypeId::LineString);

        let wkb = make_wkb("POLYGON ((0 0, 0 1, 1 0, 0 0))");
        let header = WkbHeader::try_new(&wkb).unwrap();
        assert_eq!(header.geometry_type_id(), GeometryTypeId::Polygon);

        let wkb = make_wkb("MULTIPOINT ((1 2), (3 4))");
        let header = WkbHeader::try_new(&wkb).unwrap();
        assert_eq!(header.geometry_type_id(), GeometryTypeId::MultiPoint);

        let wkb = make_wkb("MULTILINESTRING ((1 2, 3 4))");
        let header = WkbHeader::try_new(&wkb).unwrap();
        assert_eq!(header.geometry_type_id(), GeometryTypeId::MultiLineString);

        let wkb = make_wkb("MULTIPOLYGON (((0 0, 0 1, 1 0, 0 0)))");
        let header = WkbHeader::try_new(&wkb).unwrap();
        assert_eq!(header.geometry_type_id(), GeometryTypeId::MultiPolygon);

        let wkb = make_wkb("GEOMETRYCOLLECTION (POINT (1 2))");
        let header = WkbHeader::try_new(&wkb).unwrap();
        assert_eq!(
            header.geometry_type_id(),
            GeometryTypeId::GeometryCollection
        );

        // Some cases with z and m dimensions
        let wkb = make_wkb("POINT Z (1 2 3)");
        let header = WkbHeader::try_new(&wkb).unwrap();
        assert_eq!(header.geometry_type_id(), GeometryTypeId::Point);

        let wkb = make_wkb("POLYGON M ((0 0 0, 0 1 0, 1 0 0, 0 0 0))");
        let header = WkbHeader::try_new(&wkb).unwrap();
        assert_eq!(header.geometry_type_id(), GeometryTypeId::Polygon);
    }

    #[test]
    fn dimensions() {
        let wkb = make_wkb("POINT (1 2)");
        let header = WkbHeader::try_new(&wkb).unwrap();
        assert_eq!(header.dimensions(), Dimensions::Xy);
        assert!(!header.has_z());
        assert!(!header.has_m());

        let wkb = make_wkb("POINT Z (1 2 3)");
        let header = WkbHeader::try_new(&wkb).unwrap();
        assert_eq!(header.dimensions(), Dimensions::Xyz);
        assert!(header.has_z());

        let wkb = make_wkb("POINT M (1 2 3)");
        let header = WkbHeader::try_new(&wkb).unwrap();
        assert_eq!(header.dimensions(), Dimensions::Xym);
        assert!(header.has_m());

        let wkb = make_wkb("POINT ZM (1 2 3 4)");
        let header = WkbHeader::try_new(&wkb).unwrap();
        assert_eq!(header.dimensions(), Dimensions::Xyzm);
    }

    #[test]
    fn extended_wkb() {
        let header = WkbHeader::try_new(&POINT_WITH_SRID_EWKB).unwrap();
        assert_eq!(header.geometry_type_id(), GeometryTypeId::Point);
        assert_eq!(header.srid(), Some(4326));
        assert_eq!(header.size(), 9);
        assert_eq!(header.dimensions(), Dimensions::Xy);

        let header = WkbHeader::try_new(&POINT_Z_EWKB).unwrap();
        assert_eq!(header.dimensions(), Dimensions::Xyz);
        assert_eq!(header.srid(), None);

        // EWKB Z flag combined with a matching ISO code is tolerated
        let mut code = (EWKB_Z_FLAG | 1001).to_le_bytes().to_vec();
        code.insert(0, 0x01);
        let header = WkbHeader::try_new(&code).unwrap();
        assert_eq!(header.dimensions(), Dimensions::Xyz);
    }

    #[test]
    fn big_endian() {
        let header = WkbHeader::try_new(&POINT_XDR_WKB).unwrap();
        assert_eq!(header.endianness(), Endianness::BigEndian);
        assert_eq!(header.geometry_type_id(), GeometryTypeId::Point);
    }

    #[test]
    fn curve_types() {
        let buf = [0x01, 0x08, 0x00, 0x00, 0x00];
        let header = WkbHeader::try_new(&buf).unwrap();
        assert_eq!(header.geometry_type_id(), GeometryTypeId::CircularString);
    }

    #[test]
    fn invalid_headers() {
        let err = WkbHeader::try_new(&[0x01, 0x01]).unwrap_err();
        assert!(matches!(err, SedonaGeometryError::Format(_)));
        assert!(err.to_string().contains("buffer too small"));

        let err = WkbHeader::try_new(&[0x02, 0x01, 0x00, 0x00, 0x00]).unwrap_err();
        assert!(err.to_string().contains("Unexpected byte order: 2"));

        // SRID flag without room for the SRID
        let err = WkbHeader::try_new(&POINT_WITH_SRID_EWKB[..7]).unwrap_err();
        assert!(matches!(err, SedonaGeometryError::Format(_)));

        // EWKB M flag on an ISO Z code
        let mut code = (EWKB_M_FLAG | 1001).to_le_bytes().to_vec();
        code.insert(0, 0x01);
        let err = WkbHeader::try_new(&code).unwrap_err();
        assert!(err.to_string().contains("Conflicting dimensions"));

        let err = WkbHeader::try_new(&[0x01, 0x11, 0x00, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, SedonaGeometryError::UnsupportedType(_)));
    }
}
