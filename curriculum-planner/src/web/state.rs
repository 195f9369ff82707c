//! Application state for the web layer.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::Track;
use crate::resolver::ScheduleGraph;
use crate::routing::RouteTable;

/// Shared application state.
///
/// Everything is computed before the server starts and served read-only.
#[derive(Clone)]
pub struct AppState {
    /// Schedule graph per track
    pub schedules: Arc<BTreeMap<Track, ScheduleGraph>>,

    /// Route table per track
    pub routes: Arc<BTreeMap<Track, RouteTable>>,
}

impl AppState {
    pub fn new(
        schedules: impl IntoIterator<Item = ScheduleGraph>,
        routes: impl IntoIterator<Item = RouteTable>,
    ) -> Self {
        Self {
            schedules: Arc::new(schedules.into_iter().map(|g| (g.track, g)).collect()),
            routes: Arc::new(routes.into_iter().map(|t| (t.track, t)).collect()),
        }
    }

    pub fn schedule(&self, track: Track) -> Option<&ScheduleGraph> {
        self.schedules.get(&track)
    }

    pub fn route_table(&self, track: Track) -> Option<&RouteTable> {
        self.routes.get(&track)
    }
}
