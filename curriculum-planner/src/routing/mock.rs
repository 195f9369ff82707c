//! Table-driven geocoder and route engine for tests and offline runs.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;

use crate::domain::{Coord, CoordKey};

use super::engine::{RouteEngine, RouteSegment};
use super::error::RoutingError;
use super::geocode::Geocoder;

/// Average walking speed in metres per second.
const WALKING_SPEED: f64 = 1.4;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

fn read(path: &Path) -> Result<String, RoutingError> {
    std::fs::read_to_string(path).map_err(|e| RoutingError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn parse<T: for<'de> Deserialize<'de>>(json: &str) -> Result<T, RoutingError> {
    serde_json::from_str(json).map_err(|e| RoutingError::Json {
        message: e.to_string(),
        body: None,
    })
}

/// Geocoder answering from a fixed address table.
///
/// Unknown addresses are not found. Every call is counted, including ones
/// that fail.
#[derive(Debug, Default)]
pub struct StaticGeocoder {
    places: HashMap<String, Coord>,
    broken: HashSet<String>,
    transient_failures: AtomicUsize,
    calls: AtomicUsize,
}

impl StaticGeocoder {
    pub fn new(places: impl IntoIterator<Item = (String, Coord)>) -> Self {
        Self {
            places: places.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Parse a JSON object mapping addresses to `{"lat", "lon"}`.
    pub fn from_json(json: &str) -> Result<Self, RoutingError> {
        let places: HashMap<String, Coord> = parse(json)?;
        Ok(Self::new(places))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RoutingError> {
        Self::from_json(&read(path.as_ref())?)
    }

    /// Make lookups of `address` fail with a server error.
    pub fn with_broken(mut self, address: impl Into<String>) -> Self {
        self.broken.insert(address.into());
        self
    }

    /// Make the next `n` calls fail as rate limited.
    pub fn with_transient_failures(self, n: usize) -> Self {
        self.transient_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Number of lookups issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Geocoder for StaticGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coord>, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let throttled = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if throttled {
            return Err(RoutingError::RateLimited {
                service: "static",
            });
        }

        if self.broken.contains(address) {
            return Err(RoutingError::Api {
                status: 500,
                message: format!("lookup of {address} failed"),
            });
        }
        Ok(self.places.get(address).copied())
    }
}

#[derive(Debug, Deserialize)]
struct RouteTableFile {
    #[serde(default)]
    straight_lines: bool,
    #[serde(default)]
    routes: Vec<RouteSegment>,
}

/// Route engine answering from a fixed table of segments.
///
/// Pairs not in the table have no route, unless straight lines are enabled,
/// in which case they get a direct segment at walking speed.
#[derive(Debug, Default)]
pub struct StaticRouteEngine {
    routes: HashMap<(CoordKey, CoordKey), RouteSegment>,
    broken: HashSet<(CoordKey, CoordKey)>,
    straight_lines: bool,
    calls: AtomicUsize,
}

impl StaticRouteEngine {
    pub fn new(routes: impl IntoIterator<Item = RouteSegment>) -> Self {
        Self {
            routes: routes
                .into_iter()
                .map(|s| ((s.from.key(), s.to.key()), s))
                .collect(),
            ..Self::default()
        }
    }

    /// Parse `{"straight_lines": bool, "routes": [segment, ...]}`.
    pub fn from_json(json: &str) -> Result<Self, RoutingError> {
        let file: RouteTableFile = parse(json)?;
        Ok(Self::new(file.routes).with_straight_lines(file.straight_lines))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RoutingError> {
        Self::from_json(&read(path.as_ref())?)
    }

    pub fn with_straight_lines(mut self, enabled: bool) -> Self {
        self.straight_lines = enabled;
        self
    }

    /// Make routing from `from` to `to` fail with a server error.
    pub fn with_broken(mut self, from: Coord, to: Coord) -> Self {
        self.broken.insert((from.key(), to.key()));
        self
    }

    /// Number of routes requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RouteEngine for StaticRouteEngine {
    async fn route(&self, from: Coord, to: Coord) -> Result<Option<RouteSegment>, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let key = (from.key(), to.key());
        if self.broken.contains(&key) {
            return Err(RoutingError::Api {
                status: 503,
                message: "routing backend unavailable".to_string(),
            });
        }
        if let Some(segment) = self.routes.get(&key) {
            return Ok(Some(segment.clone()));
        }
        if !self.straight_lines {
            return Ok(None);
        }

        let distance_m = haversine_m(from, to);
        Ok(Some(RouteSegment {
            from,
            to,
            distance_m,
            duration_s: distance_m / WALKING_SPEED,
            path: vec![from, to],
        }))
    }
}

/// Great-circle distance in metres.
fn haversine_m(a: Coord, b: Coord) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}
