//! Response types for the JSON API.

use serde::Serialize;

use crate::domain::{OfferingKey, Semester, StudySemester, Track, Weekday};
use crate::resolver::{ScheduleEntry, ScheduleGraph, Stop, UnresolvedSlot};
use crate::routing::{DayRoute, RouteTable};

/// One semester of a track's schedule graph.
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub track: Track,
    pub semester: Semester,
    /// Resolved slots, ascending by study semester
    pub slots: Vec<SlotDto>,
    /// Slots of this semester that could not be resolved
    pub unresolved: Vec<UnresolvedSlot>,
}

/// The week of one study semester.
#[derive(Debug, Serialize)]
pub struct SlotDto {
    pub study_semester: StudySemester,
    pub days: Vec<DayDto>,
    /// Practicals left out to avoid clashes
    pub dropped: Vec<OfferingKey>,
}

/// One day's sessions in attendance order.
#[derive(Debug, Serialize)]
pub struct DayDto {
    pub weekday: Weekday,
    pub weekday_name: &'static str,
    pub stops: Vec<Stop>,
    pub addresses: Vec<Option<String>>,
}

/// Walking routes for one study semester.
#[derive(Debug, Serialize)]
pub struct RoutesResponse {
    pub track: Track,
    pub semester: Semester,
    pub study_semester: StudySemester,
    /// False when the route build stopped early
    pub complete: bool,
    pub days: Vec<DayRoute>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl ScheduleResponse {
    /// `None` when the graph knows nothing about `semester`.
    pub fn from_graph(graph: &ScheduleGraph, semester: Semester) -> Option<Self> {
        let slots: Vec<SlotDto> = graph
            .semester(semester)
            .map(|entries| entries.values().map(SlotDto::from).collect())
            .unwrap_or_default();
        let unresolved: Vec<UnresolvedSlot> = graph
            .unresolved
            .iter()
            .filter(|u| u.semester == semester)
            .cloned()
            .collect();

        if slots.is_empty() && unresolved.is_empty() {
            return None;
        }
        Some(Self {
            track: graph.track,
            semester,
            slots,
            unresolved,
        })
    }
}

impl From<&ScheduleEntry> for SlotDto {
    fn from(entry: &ScheduleEntry) -> Self {
        let days = entry
            .days
            .iter()
            .map(|(weekday, stops)| DayDto {
                weekday: *weekday,
                weekday_name: weekday.name(),
                stops: stops.clone(),
                addresses: stops.iter().map(|s| s.address.clone()).collect(),
            })
            .collect();

        Self {
            study_semester: entry.study_semester,
            days,
            dropped: entry.dropped.clone(),
        }
    }
}

impl RoutesResponse {
    pub fn from_table(
        table: &RouteTable,
        semester: Semester,
        study_semester: StudySemester,
    ) -> Option<Self> {
        let days = table.get(semester, study_semester)?;
        Some(Self {
            track: table.track,
            semester,
            study_semester,
            complete: table.complete,
            days: days.values().cloned().collect(),
        })
    }
}
