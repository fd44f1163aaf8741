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
//! Row-level entry points used when loading spatial columns
//!
//! Input rows carry WKB as a hex string. A value that cannot be converted is
//! stored as NULL rather than failing the whole load.
use sedona_geometry::error::{Result, SedonaGeometryError};

use crate::{
    geometry::Geometry, options::ConversionOptions, reader::read_udt, wkb_to_udt::wkb_to_udt,
};

/// Convert one hex-encoded WKB value
///
/// Returns `None` if the value cannot be converted or converts to an empty
/// blob (a geography with the null SRID). Failures are logged as warnings.
pub fn encode_wkb_hex(hex: &str, options: &ConversionOptions) -> Option<Vec<u8>> {
    match decode_hex(hex).and_then(|wkb| encode_wkb(&wkb, options)) {
        Ok(blob) if blob.is_empty() => None,
        Ok(blob) => Some(blob),
        Err(err) => {
            log::warn!("Storing NULL for {} value: {err}", options.kind);
            None
        }
    }
}

/// Convert one WKB value
pub fn encode_wkb(wkb: &[u8], options: &ConversionOptions) -> Result<Vec<u8>> {
    wkb_to_udt(wkb, options)
}

/// Read a stored value back
pub fn decode_udt(blob: &[u8], options: &ConversionOptions) -> Result<Option<Geometry>> {
    read_udt(blob, options.is_geography())
}

fn decode_hex(hex: &str) -> Result<Vec<u8>> {
    let hex = hex.as_bytes();
    if hex.len() % 2 != 0 {
        return Err(SedonaGeometryError::Format(format!(
            "hex string has odd length {}",
            hex.len()
        )));
    }

    hex.chunks_exact(2)
        .map(|pair| -> Result<u8> { Ok((hex_digit(pair[0])? << 4) | hex_digit(pair[1])?) })
        .collect()
}

fn hex_digit(c: u8) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(SedonaGeometryError::Format(format!(
            "invalid hex digit '{}'",
            c.escape_ascii()
        ))),
    }
}
