// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// Default SRID for a 2D point with no explicit `srid` given by the caller:
/// WGS 84, i.e. (longitude, latitude).
pub const DEFAULT_SRID_2D: i64 = 4326;
/// Default SRID for a 3D point with no explicit `srid`: WGS 84 3D.
pub const DEFAULT_SRID_3D: i64 = 4979;

/// A point in 2D space, as carried by the `Point2D` structure (signature
/// `0x58`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub srid: i64,
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            srid: DEFAULT_SRID_2D,
            x,
            y,
        }
    }

    pub fn with_srid(srid: i64, x: f64, y: f64) -> Self {
        Self { srid, x, y }
    }
}

/// A point in 3D space, as carried by the `Point3D` structure (signature
/// `0x59`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3D {
    pub srid: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            srid: DEFAULT_SRID_3D,
            x,
            y,
            z,
        }
    }

    pub fn with_srid(srid: i64, x: f64, y: f64, z: f64) -> Self {
        Self { srid, x, y, z }
    }
}
