//! The schedule graph: resolved weeks for every slot of a track.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{OfferingKey, Semester, StudySemester, Track, Weekday};

use super::backtrack::{DaySchedule, Stop};
use super::error::ResolveError;

/// The resolved week of one (semester, study semester) slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub semester: Semester,
    pub study_semester: StudySemester,
    pub days: BTreeMap<Weekday, Vec<Stop>>,
    pub dropped: Vec<OfferingKey>,
}

impl ScheduleEntry {
    pub fn new(semester: Semester, study_semester: StudySemester, schedule: DaySchedule) -> Self {
        Self {
            semester,
            study_semester,
            days: schedule.days,
            dropped: schedule.dropped,
        }
    }

    /// Room addresses per weekday, in attendance order.
    pub fn addresses(&self) -> impl Iterator<Item = (Weekday, Vec<Option<&str>>)> {
        self.days.iter().map(|(weekday, stops)| {
            (
                *weekday,
                stops.iter().map(|s| s.address.as_deref()).collect(),
            )
        })
    }
}

/// A slot left out of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedSlot {
    pub semester: Semester,
    pub study_semester: StudySemester,
    pub reason: String,
}

impl UnresolvedSlot {
    pub fn new(semester: Semester, study_semester: StudySemester, error: &ResolveError) -> Self {
        Self {
            semester,
            study_semester,
            reason: error.to_string(),
        }
    }
}

/// Resolved weeks per semester and study semester, plus the slots that
/// could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleGraph {
    pub track: Track,
    pub entries: BTreeMap<Semester, BTreeMap<StudySemester, ScheduleEntry>>,
    pub unresolved: Vec<UnresolvedSlot>,
}

impl ScheduleGraph {
    pub fn new(track: Track) -> Self {
        Self {
            track,
            entries: BTreeMap::new(),
            unresolved: Vec::new(),
        }
    }

    pub fn insert(&mut self, entry: ScheduleEntry) {
        self.entries
            .entry(entry.semester)
            .or_default()
            .insert(entry.study_semester, entry);
    }

    pub fn get(&self, semester: Semester, study_semester: StudySemester) -> Option<&ScheduleEntry> {
        self.entries.get(&semester)?.get(&study_semester)
    }

    pub fn semester(&self, semester: Semester) -> Option<&BTreeMap<StudySemester, ScheduleEntry>> {
        self.entries.get(&semester)
    }

    /// Every entry, ascending by semester then study semester.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.values().flat_map(BTreeMap::values)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
