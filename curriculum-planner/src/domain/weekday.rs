//! Teaching weekdays.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned for a weekday number outside 1..=6.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid weekday {0}: must be 1 (Monday) to 6 (Saturday)")]
pub struct InvalidWeekday(pub u8);

/// A teaching day, 1 = Monday through 6 = Saturday.
///
/// # Examples
///
/// ```
/// use curriculum_planner::domain::Weekday;
///
/// let tue = Weekday::new(2).unwrap();
/// assert_eq!(tue.name(), "Tuesday");
/// assert!(Weekday::new(0).is_err());
/// assert!(Weekday::new(7).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Weekday(u8);

impl Weekday {
    pub fn new(n: u8) -> Result<Self, InvalidWeekday> {
        if !(1..=6).contains(&n) {
            return Err(InvalidWeekday(n));
        }
        Ok(Self(n))
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn name(&self) -> &'static str {
        match self.0 {
            1 => "Monday",
            2 => "Tuesday",
            3 => "Wednesday",
            4 => "Thursday",
            5 => "Friday",
            _ => "Saturday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Weekday {
    type Error = InvalidWeekday;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Weekday> for u8 {
    fn from(value: Weekday) -> Self {
        value.0
    }
}
