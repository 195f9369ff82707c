//! Address geocoding.

use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::trace;

use crate::domain::Coord;

use super::error::RoutingError;

/// Default base URL for the public Nominatim instance.
const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

const SERVICE: &str = "nominatim";

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit pattern is valid"));

/// Whether an address looks like it names a building.
///
/// Requires a run of one to four digits. Postcodes alone don't count, nor do
/// bare building names such as "Audimax".
pub fn has_house_number(address: &str) -> bool {
    DIGIT_RUN
        .find_iter(address)
        .any(|m| (1..=4).contains(&m.as_str().len()))
}

/// Something that can turn an address into a coordinate.
pub trait Geocoder {
    /// Look up `address`.
    ///
    /// `Ok(None)` means the service answered but knows no such place.
    fn geocode(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Option<Coord>, RoutingError>> + Send;
}

/// Configuration for the Nominatim client.
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Contact address sent with every request, required by the usage policy
    pub email: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl NominatimConfig {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// One search hit. Nominatim sends coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// Nominatim HTTP client.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
    email: String,
}

impl NominatimClient {
    pub fn new(config: NominatimConfig) -> Result<Self, RoutingError> {
        let mut headers = HeaderMap::new();
        let agent = format!(
            "curriculum-planner/{} ({})",
            env!("CARGO_PKG_VERSION"),
            config.email
        );
        let agent = HeaderValue::from_str(&agent).map_err(|_| RoutingError::Api {
            status: 0,
            message: "Invalid contact e-mail for user agent".to_string(),
        })?;
        headers.insert(USER_AGENT, agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            email: config.email,
        })
    }
}

impl Geocoder for NominatimClient {
    async fn geocode(&self, address: &str) -> Result<Option<Coord>, RoutingError> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", address),
                ("format", "jsonv2"),
                ("limit", "1"),
                ("email", self.email.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::UNAUTHORIZED
        {
            return Err(RoutingError::Unauthorized { service: SERVICE });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RoutingError::RateLimited { service: SERVICE });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoutingError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let coord = first_place(&body)?;
        trace!(address, found = coord.is_some(), "geocoded");
        Ok(coord)
    }
}

fn first_place(body: &str) -> Result<Option<Coord>, RoutingError> {
    let json_error = |message: String| RoutingError::Json {
        message,
        body: Some(body.chars().take(500).collect()),
    };

    let places: Vec<Place> = serde_json::from_str(body).map_err(|e| json_error(e.to_string()))?;
    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };

    let lat: f64 = place.lat.parse().map_err(|_| json_error(format!("bad lat {}", place.lat)))?;
    let lon: f64 = place.lon.parse().map_err(|_| json_error(format!("bad lon {}", place.lon)))?;
    Coord::new(lat, lon)
        .map(Some)
        .map_err(|e| json_error(e.to_string()))
}
