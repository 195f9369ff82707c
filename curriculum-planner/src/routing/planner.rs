//! Route planning over a schedule graph.
//!
//! For every resolved day the planner geocodes the room addresses in
//! attendance order and routes between consecutive rooms. External calls
//! go through the memo caches, so each address and each ordered pair of
//! coordinates is looked up at most once, and through throttles that keep
//! the services' usage limits.

use std::collections::BTreeMap;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::domain::{Coord, Semester, StudySemester, Track, Weekday};
use crate::resolver::ScheduleGraph;

use super::cache::{CacheConfig, GeoCache, RouteCache};
use super::cancel::CancelSignal;
use super::engine::{RouteEngine, RouteSegment};
use super::error::{CacheError, RoutingError};
use super::geocode::{Geocoder, has_house_number};
use super::throttle::Throttle;

/// Configuration for the route planner.
#[derive(Debug, Clone)]
pub struct RoutePlannerConfig {
    /// Minimum spacing between geocoding requests.
    pub geocode_interval: Duration,

    /// Minimum spacing between routing requests.
    pub route_interval: Duration,

    /// Maximum concurrent requests per service.
    pub max_concurrent: usize,

    /// Maximum days built at once by a batch.
    pub max_concurrent_days: usize,

    /// Extra attempts after a transient geocoding failure.
    pub geocode_retries: u32,

    /// Pause before each retry.
    pub retry_backoff: Duration,
}

impl Default for RoutePlannerConfig {
    fn default() -> Self {
        Self {
            geocode_interval: Duration::from_secs(1),
            route_interval: Duration::ZERO,
            max_concurrent: 4,
            max_concurrent_days: 4,
            geocode_retries: 2,
            retry_backoff: Duration::from_secs(2),
        }
    }
}

impl RoutePlannerConfig {
    pub fn with_geocode_interval(mut self, interval: Duration) -> Self {
        self.geocode_interval = interval;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

/// Why a leg has no route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReason {
    /// One of the two rooms has no coordinate
    UnresolvedEndpoint,
    /// The engine found no walking route
    NoRoute,
    /// The routing service failed
    ServiceFailed,
}

/// The way from one room to the next.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Leg {
    Routed(RouteSegment),
    /// Both rooms are at the same coordinate
    SamePlace,
    Missing { reason: MissingReason },
}

impl Leg {
    pub fn segment(&self) -> Option<&RouteSegment> {
        match self {
            Leg::Routed(segment) => Some(segment),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Leg::Missing { .. })
    }
}

/// One day's rooms and the legs between them.
///
/// `legs[i]` leads from `points[i]` to `points[i + 1]`, so a day with one
/// room has a single point and no legs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRoute {
    pub weekday: Weekday,
    pub addresses: Vec<Option<String>>,
    pub points: Vec<Option<Coord>>,
    pub legs: Vec<Leg>,
}

impl DayRoute {
    /// Coordinates of the rooms that could be located.
    pub fn markers(&self) -> impl Iterator<Item = Coord> + '_ {
        self.points.iter().flatten().copied()
    }

    /// Total walking distance of the routed legs, in metres.
    pub fn distance_m(&self) -> f64 {
        self.legs
            .iter()
            .filter_map(Leg::segment)
            .map(|s| s.distance_m)
            .sum()
    }
}

/// Day routes per semester, study semester and weekday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteTable {
    pub track: Track,
    pub days: BTreeMap<Semester, BTreeMap<StudySemester, BTreeMap<Weekday, DayRoute>>>,
    /// False when the build was cancelled before every day was routed.
    pub complete: bool,
}

impl RouteTable {
    pub fn new(track: Track) -> Self {
        Self {
            track,
            days: BTreeMap::new(),
            complete: true,
        }
    }

    pub fn insert(&mut self, semester: Semester, study_semester: StudySemester, day: DayRoute) {
        self.days
            .entry(semester)
            .or_default()
            .entry(study_semester)
            .or_default()
            .insert(day.weekday, day);
    }

    pub fn get(
        &self,
        semester: Semester,
        study_semester: StudySemester,
    ) -> Option<&BTreeMap<Weekday, DayRoute>> {
        self.days.get(&semester)?.get(&study_semester)
    }

    pub fn day(
        &self,
        semester: Semester,
        study_semester: StudySemester,
        weekday: Weekday,
    ) -> Option<&DayRoute> {
        self.get(semester, study_semester)?.get(&weekday)
    }

    /// Number of day routes.
    pub fn len(&self) -> usize {
        self.days
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Geocodes and routes schedule days through the memo caches.
pub struct RoutePlanner<G, E> {
    geocoder: G,
    engine: E,
    geo_cache: GeoCache,
    route_cache: RouteCache,
    geo_throttle: Throttle,
    route_throttle: Throttle,
    config: RoutePlannerConfig,
}

impl<G: Geocoder, E: RouteEngine> RoutePlanner<G, E> {
    pub fn new(
        geocoder: G,
        engine: E,
        geo_cache: GeoCache,
        route_cache: RouteCache,
        config: RoutePlannerConfig,
    ) -> Self {
        Self {
            geocoder,
            engine,
            geo_cache,
            route_cache,
            geo_throttle: Throttle::new(config.geocode_interval, config.max_concurrent),
            route_throttle: Throttle::new(config.route_interval, config.max_concurrent),
            config,
        }
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn geo_cache(&self) -> &GeoCache {
        &self.geo_cache
    }

    pub fn route_cache(&self) -> &RouteCache {
        &self.route_cache
    }

    /// Write both caches to the configured directory.
    pub fn persist(&self, config: &CacheConfig) -> Result<(), CacheError> {
        self.geo_cache.save_to(&config.geo_file())?;
        self.route_cache.save_to(&config.route_file())
    }

    /// Locate a room address.
    ///
    /// Addresses without a house number are never looked up. A lookup that
    /// fails after all retries yields `None` without being cached, so a
    /// later call tries again.
    pub async fn resolve_coordinates(&self, address: &str) -> Option<Coord> {
        if !has_house_number(address) {
            trace!(address, "no house number, not geocoding");
            return None;
        }

        let lookup = self.geocode_with_retries(address);
        match self.geo_cache.get_or_try_compute(address.to_string(), lookup).await {
            Ok(coord) => coord,
            Err(error) => {
                warn!(address, %error, "geocoding failed");
                None
            }
        }
    }

    async fn geocode_with_retries(&self, address: &str) -> Result<Option<Coord>, RoutingError> {
        let mut attempt = 0;
        loop {
            let result = {
                let _permit = self.geo_throttle.acquire().await?;
                self.geocoder.geocode(address).await
            };
            match result {
                Err(error) if error.is_transient() && attempt < self.config.geocode_retries => {
                    attempt += 1;
                    debug!(address, attempt, %error, "retrying geocode");
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
                other => return other,
            }
        }
    }

    /// Walking route from `from` to `to`.
    ///
    /// Cached per ordered pair, "no route" included. Errors are returned
    /// and not cached.
    pub async fn compute_route(
        &self,
        from: Coord,
        to: Coord,
    ) -> Result<Option<RouteSegment>, Arc<RoutingError>> {
        self.route_cache
            .get_or_try_compute((from.key(), to.key()), self.route_uncached(from, to))
            .await
    }

    async fn route_uncached(
        &self,
        from: Coord,
        to: Coord,
    ) -> Result<Option<RouteSegment>, RoutingError> {
        let _permit = self.route_throttle.acquire().await?;
        self.engine.route(from, to).await
    }

    async fn leg(&self, from: Option<Coord>, to: Option<Coord>) -> Leg {
        let (Some(from), Some(to)) = (from, to) else {
            return Leg::Missing {
                reason: MissingReason::UnresolvedEndpoint,
            };
        };
        if from.key() == to.key() {
            return Leg::SamePlace;
        }
        match self.compute_route(from, to).await {
            Ok(Some(segment)) => Leg::Routed(segment),
            Ok(None) => Leg::Missing {
                reason: MissingReason::NoRoute,
            },
            Err(error) => {
                warn!(?from, ?to, %error, "routing failed");
                Leg::Missing {
                    reason: MissingReason::ServiceFailed,
                }
            }
        }
    }

    /// Locate each room of a day and route between consecutive rooms.
    ///
    /// Never fails: a room that cannot be located has no point, and any
    /// leg touching it is missing.
    pub async fn build_day_routes(&self, weekday: Weekday, addresses: &[Option<&str>]) -> DayRoute {
        let points = join_all(addresses.iter().map(|address| async move {
            match address {
                Some(address) => self.resolve_coordinates(address).await,
                None => None,
            }
        }))
        .await;

        let legs = join_all(points.windows(2).map(|pair| self.leg(pair[0], pair[1]))).await;

        DayRoute {
            weekday,
            addresses: addresses.iter().map(|a| a.map(str::to_string)).collect(),
            points,
            legs,
        }
    }

    /// Route every day of a schedule graph.
    ///
    /// Days are built concurrently up to the configured bound. Cancelling
    /// stops the batch and returns what was built, marked incomplete.
    pub async fn build_route_table(
        &self,
        graph: &ScheduleGraph,
        cancel: &CancelSignal,
    ) -> RouteTable {
        let jobs: Vec<_> = graph
            .iter()
            .flat_map(|entry| {
                entry.addresses().map(move |(weekday, addresses)| {
                    (entry.semester, entry.study_semester, weekday, addresses)
                })
            })
            .collect();
        let total = jobs.len();

        let days = stream::iter(jobs)
            .map(move |(semester, study_semester, weekday, addresses)| async move {
                let day = self.build_day_routes(weekday, &addresses).await;
                (semester, study_semester, day)
            })
            .buffer_unordered(self.config.max_concurrent_days.max(1))
            .take_until(cancel.cancelled());
        let mut days = pin!(days);

        let mut table = RouteTable::new(graph.track);
        while let Some((semester, study_semester, day)) = days.next().await {
            debug!(%semester, %study_semester, weekday = %day.weekday, "day routed");
            table.insert(semester, study_semester, day);
        }

        table.complete = table.len() == total;
        if !table.complete {
            warn!(track = %graph.track, built = table.len(), total, "route table build cancelled");
        }
        info!(
            track = %graph.track,
            days = table.len(),
            places = self.geo_cache.len(),
            routes = self.route_cache.len(),
            "route table built"
        );
        table
    }
}
