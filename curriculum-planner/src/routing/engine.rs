//! Walking routes between two points.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::domain::Coord;

use super::error::RoutingError;

/// Default base URL for the public OSRM demo server.
const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

const SERVICE: &str = "osrm";

/// A walking route from one room address to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub from: Coord,
    pub to: Coord,
    /// Walking distance in metres
    pub distance_m: f64,
    /// Walking time in seconds
    pub duration_s: f64,
    /// Polyline from `from` to `to`, both included
    pub path: Vec<Coord>,
}

/// Something that can compute a walking route.
pub trait RouteEngine {
    /// Route from `from` to `to`.
    ///
    /// `Ok(None)` means the engine answered but found no route.
    fn route(
        &self,
        from: Coord,
        to: Coord,
    ) -> impl Future<Output = Result<Option<RouteSegment>, RoutingError>> + Send;
}

/// Configuration for the OSRM client.
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    /// Routing profile, `foot` for pedestrian routes
    pub profile: String,
    pub timeout_secs: u64,
}

impl OsrmConfig {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            profile: "foot".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

/// GeoJSON line string, coordinates as `[lon, lat]`.
#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// OSRM HTTP client.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    http: reqwest::Client,
    base_url: String,
    profile: String,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, RoutingError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profile: config.profile,
        })
    }

    fn url(&self, from: Coord, to: Coord) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.base_url, self.profile, from.lon, from.lat, to.lon, to.lat
        )
    }
}

impl RouteEngine for OsrmClient {
    async fn route(&self, from: Coord, to: Coord) -> Result<Option<RouteSegment>, RoutingError> {
        let response = self
            .http
            .get(self.url(from, to))
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RoutingError::RateLimited { service: SERVICE });
        }

        // OSRM reports "no route" as a client error with a JSON body
        let body = response.text().await?;
        let parsed: Result<OsrmResponse, _> = serde_json::from_str(&body);
        if !status.is_success() {
            return match parsed {
                Ok(r) if is_no_route(&r.code) => Ok(None),
                Ok(r) => Err(RoutingError::Api {
                    status: status.as_u16(),
                    message: r.message.unwrap_or(r.code),
                }),
                Err(_) => Err(RoutingError::Api {
                    status: status.as_u16(),
                    message: body,
                }),
            };
        }

        let parsed = parsed.map_err(|e| RoutingError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })?;
        trace!(code = %parsed.code, routes = parsed.routes.len(), "osrm response");
        segment_from_response(from, to, parsed)
    }
}

fn is_no_route(code: &str) -> bool {
    matches!(code, "NoRoute" | "NoSegment")
}

fn segment_from_response(
    from: Coord,
    to: Coord,
    response: OsrmResponse,
) -> Result<Option<RouteSegment>, RoutingError> {
    if is_no_route(&response.code) {
        return Ok(None);
    }
    if response.code != "Ok" {
        return Err(RoutingError::Api {
            status: 200,
            message: response.message.unwrap_or(response.code),
        });
    }
    let Some(route) = response.routes.into_iter().next() else {
        return Ok(None);
    };

    let mut path = Vec::with_capacity(route.geometry.coordinates.len() + 2);
    path.push(from);
    for [lon, lat] in route.geometry.coordinates {
        let point = Coord::new(lat, lon).map_err(|e| RoutingError::Json {
            message: e.to_string(),
            body: None,
        })?;
        path.push(point);
    }
    path.push(to);

    Ok(Some(RouteSegment {
        from,
        to,
        distance_m: route.distance,
        duration_s: route.duration,
        path,
    }))
}
