//! Classification paths and study tracks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an empty classification path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid classification path: {reason}")]
pub struct InvalidClassification {
    reason: &'static str,
}

/// A dot-separated classification path from the course catalogue.
///
/// Fixed positions carry meaning: segment 1 is the faculty code, segment 2
/// the department, segment 3 the programme code.
///
/// # Examples
///
/// ```
/// use curriculum_planner::domain::Classification;
///
/// let c = Classification::parse("lecture.techn.infora.bachel_1.pflich").unwrap();
/// assert_eq!(c.faculty(), Some("techn"));
/// assert_eq!(c.department(), Some("infora"));
/// assert_eq!(c.program(), Some("bachel_1"));
/// assert_eq!(c.len(), 5);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Classification {
    raw: String,
    segments: Vec<String>,
}

impl Classification {
    pub fn parse(s: &str) -> Result<Self, InvalidClassification> {
        let s = s.trim();
        if s.is_empty() {
            return Err(InvalidClassification {
                reason: "path cannot be empty",
            });
        }

        Ok(Self {
            raw: s.to_string(),
            segments: s.split('.').map(str::to_string).collect(),
        })
    }

    pub fn segment(&self, idx: usize) -> Option<&str> {
        self.segments.get(idx).map(String::as_str)
    }

    pub fn faculty(&self) -> Option<&str> {
        self.segment(1)
    }

    pub fn department(&self) -> Option<&str> {
        self.segment(2)
    }

    pub fn program(&self) -> Option<&str> {
        self.segment(3)
    }

    /// Number of segments in the path.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Debug for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Classification({})", self.raw)
    }
}

impl TryFrom<String> for Classification {
    type Error = InvalidClassification;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Classification> for String {
    fn from(value: Classification) -> Self {
        value.raw
    }
}

/// Error returned for an unknown track code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown track: {0}")]
pub struct InvalidTrack(pub String);

/// The degree programme a schedule is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    /// Computer science (Informatik).
    Cs,
    /// Business computer science (Wirtschaftsinformatik).
    BusinessCs,
}

impl Track {
    pub const ALL: [Track; 2] = [Track::Cs, Track::BusinessCs];

    /// Short code used in URLs.
    pub fn code(&self) -> &'static str {
        match self {
            Track::Cs => "inf",
            Track::BusinessCs => "winf",
        }
    }

    /// Parse from the URL code (`inf` / `winf`).
    pub fn from_code(s: &str) -> Result<Self, InvalidTrack> {
        match s {
            "inf" => Ok(Track::Cs),
            "winf" => Ok(Track::BusinessCs),
            other => Err(InvalidTrack(other.to_string())),
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
