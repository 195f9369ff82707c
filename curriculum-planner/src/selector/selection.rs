//! Selector output types.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{OfferingKey, Semester, StudySemester, Track};

/// Why an offering is in a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum Selected {
    /// Fills a named module requirement.
    Module(OfferingKey),
    /// The slot's single project.
    Project(OfferingKey),
    /// The slot's single seminar.
    Seminar(OfferingKey),
    /// Attached to one of the slot's lectures.
    Practical(OfferingKey),
}

impl Selected {
    pub fn key(&self) -> &OfferingKey {
        match self {
            Selected::Module(k) | Selected::Project(k) | Selected::Seminar(k) => k,
            Selected::Practical(k) => k,
        }
    }
}

/// Offerings chosen for one study semester, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotSelection {
    items: Vec<Selected>,
}

impl SlotSelection {
    pub fn items(&self) -> &[Selected] {
        &self.items
    }

    pub fn keys(&self) -> Vec<OfferingKey> {
        self.items.iter().map(|s| s.key().clone()).collect()
    }

    /// Keys that practicals may attach to.
    pub fn parent_keys(&self) -> Vec<OfferingKey> {
        self.items
            .iter()
            .filter(|s| !matches!(s, Selected::Practical(_)))
            .map(|s| s.key().clone())
            .collect()
    }

    pub fn contains(&self, key: &OfferingKey) -> bool {
        self.items.iter().any(|s| s.key() == key)
    }

    pub fn has_project(&self) -> bool {
        self.items.iter().any(|s| matches!(s, Selected::Project(_)))
    }

    pub fn has_seminar(&self) -> bool {
        self.items.iter().any(|s| matches!(s, Selected::Seminar(_)))
    }

    /// Append unless the key is already in the slot. Returns whether it was added.
    pub fn push(&mut self, item: Selected) -> bool {
        if self.contains(item.key()) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// All slots of one calendar semester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemesterSelection {
    pub semester: Semester,
    pub slots: BTreeMap<StudySemester, SlotSelection>,
}

impl SemesterSelection {
    pub fn new(semester: Semester) -> Self {
        Self {
            semester,
            slots: BTreeMap::new(),
        }
    }

    pub fn slot(&self, study_semester: StudySemester) -> Option<&SlotSelection> {
        self.slots.get(&study_semester)
    }

    pub fn slot_mut(&mut self, study_semester: StudySemester) -> &mut SlotSelection {
        self.slots.entry(study_semester).or_default()
    }
}

/// A track's selection over every semester of the offering table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub track: Track,
    pub semesters: BTreeMap<Semester, SemesterSelection>,
}

impl Selection {
    pub fn new(track: Track) -> Self {
        Self {
            track,
            semesters: BTreeMap::new(),
        }
    }

    pub fn semester(&self, semester: Semester) -> Option<&SemesterSelection> {
        self.semesters.get(&semester)
    }
}
