//! Binary configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_OFFERINGS_PATH: &str = "data/offerings.sample.json";
const DEFAULT_CACHE_DIR: &str = "cache";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("invalid {name}: {message}")]
    Invalid { name: &'static str, message: String },

    /// A variable required by the chosen mode is unset
    #[error("{0} must be set unless PLACES_PATH selects offline routing")]
    Missing(&'static str),
}

/// Where geocodes and routes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingSource {
    /// Nominatim and OSRM over HTTP.
    Online {
        geocoder_email: String,
        geocoder_url: Option<String>,
        router_url: Option<String>,
    },
    /// A fixed address table and straight-line routes.
    Offline { places_path: PathBuf },
}

/// Settings for the server binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub offerings_path: PathBuf,
    /// Curriculum table, the built-in one when unset
    pub curriculum_path: Option<PathBuf>,
    /// Selection rules, the built-in ones when unset
    pub rules_path: Option<PathBuf>,
    pub cache_dir: PathBuf,
    pub routing: RoutingSource,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// Read `OFFERINGS_PATH`, `CURRICULUM_PATH`, `RULES_PATH`, `CACHE_DIR`,
    /// `PLACES_PATH`, `GEOCODER_EMAIL`, `GEOCODER_URL`, `ROUTER_URL` and
    /// `BIND_ADDR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`AppConfig::from_env`], reading variables through `lookup`.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let routing = match var("PLACES_PATH") {
            Some(path) => RoutingSource::Offline {
                places_path: path.into(),
            },
            None => RoutingSource::Online {
                geocoder_email: var("GEOCODER_EMAIL")
                    .ok_or(ConfigError::Missing("GEOCODER_EMAIL"))?,
                geocoder_url: var("GEOCODER_URL"),
                router_url: var("ROUTER_URL"),
            },
        };

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr.parse().map_err(|e| ConfigError::Invalid {
            name: "BIND_ADDR",
            message: format!("{bind_addr}: {e}"),
        })?;

        Ok(Self {
            offerings_path: var("OFFERINGS_PATH")
                .unwrap_or_else(|| DEFAULT_OFFERINGS_PATH.to_string())
                .into(),
            curriculum_path: var("CURRICULUM_PATH").map(PathBuf::from),
            rules_path: var("RULES_PATH").map(PathBuf::from),
            cache_dir: var("CACHE_DIR")
                .unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string())
                .into(),
            routing,
            bind_addr,
        })
    }
}
