//! Geocoding and walking routes between consecutive rooms.
//!
//! External services sit behind the [`Geocoder`] and [`RouteEngine`]
//! traits. Results, including negative ones, are memoized in
//! [`GeoCache`] and [`RouteCache`], which can be persisted as JSON.

mod cache;
mod cancel;
mod engine;
mod error;
mod geocode;
mod mock;
mod planner;
mod throttle;

pub use cache::{CacheConfig, CacheFile, GeoCache, MemoCache, RouteCache};
pub use cancel::CancelSignal;
pub use engine::{OsrmClient, OsrmConfig, RouteEngine, RouteSegment};
pub use error::{CacheError, RoutingError};
pub use geocode::{Geocoder, NominatimClient, NominatimConfig, has_house_number};
pub use mock::{StaticGeocoder, StaticRouteEngine};
pub use planner::{DayRoute, Leg, MissingReason, RoutePlanner, RoutePlannerConfig, RouteTable};
pub use throttle::Throttle;
