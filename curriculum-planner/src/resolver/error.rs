//! Resolver errors.

use chrono::NaiveTime;

use crate::domain::{OfferingKey, Semester, StudySemester, Weekday};

/// Why a slot could not be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// A mandatory session clashes with the session before it
    #[error("mandatory {key} on {weekday} at {start} clashes with an earlier session")]
    Infeasible {
        key: OfferingKey,
        weekday: Weekday,
        start: NaiveTime,
    },

    /// Search budget used up before an answer was found
    #[error("search gave up after {max_steps} steps")]
    Exhausted { max_steps: usize },

    /// A slot failed while building a whole graph
    #[error("no schedule for {semester} study semester {study_semester}: {source}")]
    Slot {
        semester: Semester,
        study_semester: StudySemester,
        source: Box<ResolveError>,
    },
}
