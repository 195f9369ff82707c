//! Calendar semesters and study-programme semesters.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid semester string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid semester: {reason}")]
pub struct InvalidSemester {
    reason: &'static str,
}

/// Error returned for a study-programme semester outside 1..=6.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid study semester {0}: must be 1-6")]
pub struct InvalidStudySemester(pub u8);

/// Half of the academic year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Season {
    /// Summer semester (`s` suffix), comes first within a calendar year.
    Summer,
    /// Winter semester (`w` suffix).
    Winter,
}

/// A calendar semester such as `2019w` or `2022s`.
///
/// Semesters order chronologically: `2019s < 2019w < 2020s`.
///
/// # Examples
///
/// ```
/// use curriculum_planner::domain::{Season, Semester};
///
/// let sem = Semester::parse("2019w").unwrap();
/// assert_eq!(sem.year(), 2019);
/// assert_eq!(sem.season(), Season::Winter);
/// assert_eq!(sem.to_string(), "2019w");
///
/// assert!(Semester::parse("2019").is_err());
/// assert!(Semester::parse("19w").is_err());
/// assert!(Semester::parse("2019x").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Semester {
    year: u16,
    season: Season,
}

impl Semester {
    /// Create a semester from its components.
    pub fn new(year: u16, season: Season) -> Self {
        Self { year, season }
    }

    /// Parse a semester from `YYYYs` / `YYYYw`.
    pub fn parse(s: &str) -> Result<Self, InvalidSemester> {
        if s.len() != 5 || !s.is_ascii() {
            return Err(InvalidSemester {
                reason: "expected YYYYs or YYYYw",
            });
        }

        let (digits, suffix) = s.split_at(4);
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidSemester {
                reason: "year must be four digits",
            });
        }
        let year = digits.parse().map_err(|_| InvalidSemester {
            reason: "year must be four digits",
        })?;

        let season = match suffix {
            "s" => Season::Summer,
            "w" => Season::Winter,
            _ => {
                return Err(InvalidSemester {
                    reason: "suffix must be 's' or 'w'",
                });
            }
        };

        Ok(Self { year, season })
    }

    /// The calendar year the semester starts in.
    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn season(&self) -> Season {
        self.season
    }
}

impl Ord for Semester {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year, self.season).cmp(&(other.year, other.season))
    }
}

impl PartialOrd for Semester {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Semester({self})")
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.season {
            Season::Summer => 's',
            Season::Winter => 'w',
        };
        write!(f, "{}{}", self.year, suffix)
    }
}

impl TryFrom<String> for Semester {
    type Error = InvalidSemester;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Semester> for String {
    fn from(value: Semester) -> Self {
        value.to_string()
    }
}

/// The ordinal semester (1-6) within a student's curriculum.
///
/// Distinct from the calendar [`Semester`]: a student in study semester 3
/// during `2020w` started in `2019w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct StudySemester(u8);

impl StudySemester {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub fn new(n: u8) -> Result<Self, InvalidStudySemester> {
        if !(Self::MIN..=Self::MAX).contains(&n) {
            return Err(InvalidStudySemester(n));
        }
        Ok(Self(n))
    }

    /// Parse from the string form used as a table key ("1".."6").
    pub fn parse(s: &str) -> Result<Self, InvalidStudySemester> {
        let n: u8 = s.trim().parse().map_err(|_| InvalidStudySemester(0))?;
        Self::new(n)
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// All study semesters in ascending order.
    pub fn all() -> impl Iterator<Item = StudySemester> {
        (Self::MIN..=Self::MAX).map(StudySemester)
    }

    /// Whether this study semester is taught in the given season.
    ///
    /// Odd study semesters run in winter, even ones in summer.
    pub fn fits(&self, season: Season) -> bool {
        match season {
            Season::Winter => self.0 % 2 == 1,
            Season::Summer => self.0 % 2 == 0,
        }
    }

    /// The year in which students of this study semester started, given the
    /// calendar year of the current semester.
    ///
    /// # Examples
    ///
    /// ```
    /// use curriculum_planner::domain::StudySemester;
    ///
    /// let third = StudySemester::new(3).unwrap();
    /// assert_eq!(third.cohort_year(2020), 2019);
    /// let sixth = StudySemester::new(6).unwrap();
    /// assert_eq!(sixth.cohort_year(2022), 2019);
    /// ```
    pub fn cohort_year(&self, calendar_year: u16) -> u16 {
        calendar_year.saturating_sub(u16::from(self.0 / 2))
    }
}

impl fmt::Display for StudySemester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for StudySemester {
    type Error = InvalidStudySemester;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StudySemester> for u8 {
    fn from(value: StudySemester) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid() {
        let s = Semester::parse("2022s").unwrap();
        assert_eq!(s.year(), 2022);
        assert_eq!(s.season(), Season::Summer);
        assert_eq!(format!("{s:?}"), "Semester(2022s)");
    }

    #[test]
    fn parse_invalid() {
        assert!(Semester::parse("").is_err());
        assert!(Semester::parse("2022").is_err());
        assert!(Semester::parse("2022ss").is_err());
        assert!(Semester::parse("20a2s").is_err());
        assert!(Semester::parse("2022W").is_err());
    }

    #[test]
    fn chronological_order() {
        let mut sems = vec![
            Semester::parse("2020s").unwrap(),
            Semester::parse("2019w").unwrap(),
            Semester::parse("2019s").unwrap(),
        ];
        sems.sort();
        let names: Vec<String> = sems.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["2019s", "2019w", "2020s"]);
    }

    #[test]
    fn serde_as_string() {
        let s = Semester::parse("2021w").unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"2021w\"");
        let back: Semester = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
        assert!(serde_json::from_str::<Semester>("\"2021\"").is_err());
    }

    #[test]
    fn study_semester_bounds() {
        assert!(StudySemester::new(0).is_err());
        assert!(StudySemester::new(7).is_err());
        assert_eq!(StudySemester::parse("4").unwrap().get(), 4);
        assert!(StudySemester::parse("x").is_err());
        assert_eq!(StudySemester::all().count(), 6);
    }

    #[test]
    fn study_semester_season_parity() {
        let first = StudySemester::new(1).unwrap();
        let second = StudySemester::new(2).unwrap();
        assert!(first.fits(Season::Winter));
        assert!(!first.fits(Season::Summer));
        assert!(second.fits(Season::Summer));
        assert!(!second.fits(Season::Winter));
    }

    #[test]
    fn cohort_year_matches_truncated_rule() {
        // year - (s - 1) / 2, truncated toward zero
        for s in 1..=6u8 {
            let ss = StudySemester::new(s).unwrap();
            let expected = (2020.0 - (f64::from(s) - 1.0) / 2.0).trunc() as u16;
            assert_eq!(ss.cohort_year(2020), expected, "study semester {s}");
        }
    }
}
