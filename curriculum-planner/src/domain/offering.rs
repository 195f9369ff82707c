//! Course offerings read from the external catalogue.

use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::classification::Classification;
use super::semester::Semester;
use super::weekday::Weekday;

/// Error returned when parsing an empty offering key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid offering key: {reason}")]
pub struct InvalidOfferingKey {
    reason: &'static str,
}

/// Opaque identifier of an offering within a semester.
///
/// Ordered lexicographically; that order is the selector's tie-break.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OfferingKey(String);

impl OfferingKey {
    pub fn new(s: impl Into<String>) -> Result<Self, InvalidOfferingKey> {
        let s = s.into();
        if s.is_empty() {
            return Err(InvalidOfferingKey {
                reason: "key cannot be empty",
            });
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OfferingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OfferingKey({})", self.0)
    }
}

impl fmt::Display for OfferingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OfferingKey {
    type Error = InvalidOfferingKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OfferingKey> for String {
    fn from(value: OfferingKey) -> Self {
        value.0
    }
}

/// Error returned for an unknown course type code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown course type: {0}")]
pub struct InvalidCourseType(pub String);

/// Kind of offering, as coded by the catalogue (`V`, `UE`, `S`, `V-UE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CourseType {
    Lecture,
    Exercise,
    Seminar,
    LectureExercise,
}

impl CourseType {
    pub fn parse(s: &str) -> Result<Self, InvalidCourseType> {
        match s {
            "V" => Ok(CourseType::Lecture),
            "UE" => Ok(CourseType::Exercise),
            "S" => Ok(CourseType::Seminar),
            "V-UE" => Ok(CourseType::LectureExercise),
            other => Err(InvalidCourseType(other.to_string())),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CourseType::Lecture => "V",
            CourseType::Exercise => "UE",
            CourseType::Seminar => "S",
            CourseType::LectureExercise => "V-UE",
        }
    }

    /// Lecture, seminar and combined lecture-exercise sessions must be attended.
    pub fn is_mandatory(&self) -> bool {
        !matches!(self, CourseType::Exercise)
    }
}

impl TryFrom<String> for CourseType {
    type Error = InvalidCourseType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CourseType> for String {
    fn from(value: CourseType) -> Self {
        value.code().to_string()
    }
}

/// One weekly meeting of an offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub weekday: Weekday,

    #[serde(default, with = "hhmm::option")]
    pub start: Option<NaiveTime>,

    #[serde(default, with = "hhmm::option")]
    pub end: Option<NaiveTime>,

    /// Canonicalised room address, if the room has one.
    #[serde(default)]
    pub room_address: Option<String>,
}

impl Session {
    /// Start and end, if both are known.
    pub fn times(&self) -> Option<(NaiveTime, NaiveTime)> {
        Some((self.start?, self.end?))
    }
}

/// One scheduled instance of a course in a given semester.
///
/// Identity is `(semester, key)`. An offering without sessions has no
/// weekday and never reaches the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseOffering {
    pub semester: Semester,
    pub key: OfferingKey,
    pub title: String,

    #[serde(rename = "type")]
    pub course_type: CourseType,

    /// Set when this offering is a practical attached to a lecture.
    #[serde(default)]
    pub parent_key: Option<OfferingKey>,

    #[serde(default)]
    pub classification: Option<Classification>,

    #[serde(default)]
    pub sessions: Vec<Session>,
}

impl CourseOffering {
    /// Case-insensitive substring match on the title.
    pub fn title_contains(&self, needle: &str) -> bool {
        contains_casefold(&self.title, needle)
    }

    /// Faculty code from the classification path.
    pub fn faculty(&self) -> Option<&str> {
        self.classification.as_ref().and_then(|c| c.faculty())
    }
}

/// Case-insensitive substring test.
pub fn contains_casefold(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Serde helpers for `HH:MM` times of day.
pub mod hhmm {
    use chrono::NaiveTime;

    pub const FORMAT: &str = "%H:%M";

    pub fn parse(s: &str) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(s, FORMAT)
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(t) => serializer.serialize_some(&t.format(super::FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            raw.map(|s| super::parse(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
