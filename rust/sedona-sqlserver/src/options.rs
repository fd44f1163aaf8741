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
use std::{fmt::Display, str::FromStr};

use sedona_geometry::error::SedonaGeometryError;
use serde::{Deserialize, Serialize};

use crate::geometry::{DEFAULT_GEOGRAPHY_SRID, DEFAULT_GEOMETRY_SRID};

/// Kind of spatial column a value is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpatialColumnKind {
    /// Planar coordinates written as (X, Y)
    #[default]
    Geometry,
    /// Geodetic coordinates written as (latitude, longitude)
    Geography,
}

impl SpatialColumnKind {
    pub fn is_geography(&self) -> bool {
        matches!(self, Self::Geography)
    }

    pub fn default_srid(&self) -> i32 {
        match self {
            Self::Geometry => DEFAULT_GEOMETRY_SRID,
            Self::Geography => DEFAULT_GEOGRAPHY_SRID,
        }
    }
}

impl Display for SpatialColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Geometry => write!(f, "geometry"),
            Self::Geography => write!(f, "geography"),
        }
    }
}

impl FromStr for SpatialColumnKind {
    type Err = SedonaGeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "geometry" => Ok(Self::Geometry),
            "geography" => Ok(Self::Geography),
            _ => Err(SedonaGeometryError::Invalid(format!(
                "Unknown spatial column kind '{s}'"
            ))),
        }
    }
}

/// Options controlling WKB to SQL Server conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    pub kind: SpatialColumnKind,
    /// SRID used when the input does not carry one
    ///
    /// When unset, the default of the column kind is used.
    pub default_srid: Option<i32>,
}

impl ConversionOptions {
    pub fn geometry() -> Self {
        Self::default()
    }

    pub fn geography() -> Self {
        Self {
            kind: SpatialColumnKind::Geography,
            default_srid: None,
        }
    }

    pub fn with_default_srid(self, srid: i32) -> Self {
        Self {
            default_srid: Some(srid),
            ..self
        }
    }

    pub fn is_geography(&self) -> bool {
        self.kind.is_geography()
    }

    pub fn srid(&self) -> i32 {
        self.default_srid
            .unwrap_or_else(|| self.kind.default_srid())
    }
}
