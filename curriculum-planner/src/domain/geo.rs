//! Geographic coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned for coordinates outside the valid range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinate ({lat}, {lon})")]
pub struct InvalidCoord {
    pub lat: f64,
    pub lon: f64,
}

/// A WGS84 point.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidCoord> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        if !valid {
            return Err(InvalidCoord { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    /// Hashable key, quantised to 1e-7 degrees (about 1 cm).
    pub fn key(&self) -> CoordKey {
        CoordKey {
            lat_e7: (self.lat * 1e7).round() as i64,
            lon_e7: (self.lon * 1e7).round() as i64,
        }
    }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coord({:.7}, {:.7})", self.lat, self.lon)
    }
}

/// Quantised coordinate usable as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoordKey {
    pub lat_e7: i64,
    pub lon_e7: i64,
}

impl CoordKey {
    pub fn to_coord(&self) -> Coord {
        Coord {
            lat: self.lat_e7 as f64 / 1e7,
            lon: self.lon_e7 as f64 / 1e7,
        }
    }
}
