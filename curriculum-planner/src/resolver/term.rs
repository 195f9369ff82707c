//! Resolver input rows.

use chrono::NaiveTime;
use serde::Serialize;

use crate::domain::{CourseOffering, CourseType, OfferingKey, Session, Weekday, contains_casefold};

/// Title fragments that mark an offering as a practical regardless of type.
pub const PRACTICAL_KEYWORDS: &[&str] = &[
    "übung",
    "praktikum",
    "exercise",
    "tutorium",
    "repetitorium",
    "kolloquium",
    "tutorial",
];

/// One weekly session of a selected offering, with both times known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Term {
    pub key: OfferingKey,
    pub title: String,
    pub course_type: CourseType,
    pub parent_key: Option<OfferingKey>,
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub address: Option<String>,
}

impl Term {
    /// Build a term from one session; `None` if the session lacks a time.
    pub fn from_session(offering: &CourseOffering, session: &Session) -> Option<Self> {
        let (start, end) = session.times()?;
        Some(Self {
            key: offering.key.clone(),
            title: offering.title.clone(),
            course_type: offering.course_type,
            parent_key: offering.parent_key.clone(),
            weekday: session.weekday,
            start,
            end,
            address: session.room_address.clone(),
        })
    }

    /// Practicals are optional: the resolver may drop them.
    ///
    /// An attached exercise is a practical, and so is anything whose title
    /// reads like one, even if the catalogue types it as a lecture.
    pub fn is_practical(&self) -> bool {
        let attached_exercise = self.parent_key.is_some()
            && !matches!(
                self.course_type,
                CourseType::Lecture | CourseType::Seminar | CourseType::LectureExercise
            );
        attached_exercise
            || PRACTICAL_KEYWORDS
                .iter()
                .any(|kw| contains_casefold(&self.title, kw))
    }

    /// Resolver order: weekday, then start, then end, then key.
    pub fn sort_key(&self) -> (Weekday, NaiveTime, NaiveTime, &OfferingKey) {
        (self.weekday, self.start, self.end, &self.key)
    }
}

/// Whether two half-open time spans overlap.
pub(crate) fn spans_overlap(a: (NaiveTime, NaiveTime), b: (NaiveTime, NaiveTime)) -> bool {
    a.0 < b.1 && b.0 < a.1
}
