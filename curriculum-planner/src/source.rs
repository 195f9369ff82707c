//! The course-offering source.
//!
//! A read-only table of every offering across all semesters, indexed by
//! semester and key. The selector and resolver query it; nothing writes to
//! it after loading.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use crate::curriculum::TrackProfile;
use crate::domain::{CourseOffering, CourseType, OfferingKey, Semester};
use crate::resolver::Term;

/// Errors from loading the offering table.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    /// File could not be read
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// File is not a JSON list of offerings
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// The same key appears twice in one semester
    #[error("duplicate offering {key} in {semester}")]
    Duplicate { semester: Semester, key: OfferingKey },
}

/// All course offerings, by semester and key.
#[derive(Debug, Clone, Default)]
pub struct OfferingTable {
    semesters: BTreeMap<Semester, BTreeMap<OfferingKey, CourseOffering>>,
}

impl OfferingTable {
    /// Load a JSON array of offerings.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let offerings: Vec<CourseOffering> =
            serde_json::from_str(json).map_err(|e| SourceError::Json {
                message: e.to_string(),
            })?;
        Self::from_offerings(offerings)
    }

    pub fn from_offerings(
        offerings: impl IntoIterator<Item = CourseOffering>,
    ) -> Result<Self, SourceError> {
        let mut semesters: BTreeMap<Semester, BTreeMap<OfferingKey, CourseOffering>> =
            BTreeMap::new();
        for offering in offerings {
            let by_key = semesters.entry(offering.semester).or_default();
            if by_key.contains_key(&offering.key) {
                return Err(SourceError::Duplicate {
                    semester: offering.semester,
                    key: offering.key,
                });
            }
            by_key.insert(offering.key.clone(), offering);
        }
        Ok(Self { semesters })
    }

    /// Semesters with at least one offering, ascending.
    pub fn semesters(&self) -> impl Iterator<Item = Semester> + '_ {
        self.semesters.keys().copied()
    }

    /// Offerings of one semester, ascending by key.
    pub fn offerings_in(&self, semester: Semester) -> impl Iterator<Item = &CourseOffering> {
        self.semesters
            .get(&semester)
            .into_iter()
            .flat_map(|by_key| by_key.values())
    }

    pub fn get(&self, semester: Semester, key: &OfferingKey) -> Option<&CourseOffering> {
        self.semesters.get(&semester)?.get(key)
    }

    pub fn len(&self) -> usize {
        self.semesters.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offerings that may fill a requirement of the track, ascending by key.
    ///
    /// Only classified offerings from the track's faculties are considered,
    /// and exercises attached to a lecture are left for practical
    /// attachment. Offerings rejected by `admissible` are dropped before
    /// titles are compared, then offerings sharing a title collapse to one:
    /// the `preferred_faculty` one if any, otherwise the smallest key.
    pub fn candidates(
        &self,
        semester: Semester,
        profile: &TrackProfile,
        preferred_faculty: &str,
        admissible: impl Fn(&CourseOffering) -> bool,
    ) -> Vec<&CourseOffering> {
        let mut by_title: HashMap<&str, &CourseOffering> = HashMap::new();
        for offering in self.offerings_in(semester) {
            let Some(faculty) = offering.faculty() else {
                continue;
            };
            if !profile.faculties.iter().any(|f| f == faculty) {
                continue;
            }
            if offering.course_type == CourseType::Exercise && offering.parent_key.is_some() {
                continue;
            }
            if !admissible(offering) {
                continue;
            }

            // Iteration is by ascending key, so the incumbent has the smaller key.
            let prefer = |o: &CourseOffering| o.faculty() == Some(preferred_faculty);
            by_title
                .entry(offering.title.as_str())
                .and_modify(|current| {
                    if prefer(offering) && !prefer(*current) {
                        *current = offering;
                    }
                })
                .or_insert(offering);
        }

        let mut candidates: Vec<&CourseOffering> = by_title.into_values().collect();
        candidates.sort_by(|a, b| a.key.cmp(&b.key));
        candidates
    }

    /// Offerings attached to one of `parents`, ascending by key.
    ///
    /// Practicals with the same title and parent collapse to the smallest key.
    pub fn practicals_for(
        &self,
        semester: Semester,
        parents: &[OfferingKey],
        excluded_types: &[CourseType],
    ) -> Vec<&CourseOffering> {
        let mut seen: BTreeSet<(&str, &OfferingKey)> = BTreeSet::new();
        let mut practicals = Vec::new();
        for offering in self.offerings_in(semester) {
            if excluded_types.contains(&offering.course_type) {
                continue;
            }
            let Some(parent) = offering.parent_key.as_ref() else {
                continue;
            };
            if parents.contains(parent) && seen.insert((offering.title.as_str(), parent)) {
                practicals.push(offering);
            }
        }
        practicals
    }

    /// Resolver input for the selected keys of one slot.
    ///
    /// One term per timed session, sorted by weekday, start, end and key.
    /// Unknown keys are ignored.
    pub fn terms_for(&self, semester: Semester, keys: &[OfferingKey]) -> Vec<Term> {
        let mut terms: Vec<Term> = keys
            .iter()
            .filter_map(|key| self.get(semester, key))
            .flat_map(|offering| {
                offering
                    .sessions
                    .iter()
                    .filter_map(move |session| Term::from_session(offering, session))
            })
            .collect();
        terms.sort_by(|a, b| {
            a.sort_key()
                .cmp(&b.sort_key())
                .then_with(|| a.address.cmp(&b.address))
        });
        terms.dedup();
        terms
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::domain::{Classification, Session, Weekday, hhmm};

    use super::*;

    /// A minimal offering builder for tests.
    pub struct OfferingBuilder(CourseOffering);

    impl OfferingBuilder {
        pub fn new(semester: &str, key: &str, title: &str, course_type: CourseType) -> Self {
            Self(CourseOffering {
                semester: Semester::parse(semester).unwrap(),
                key: OfferingKey::new(key).unwrap(),
                title: title.to_string(),
                course_type,
                parent_key: None,
                classification: None,
                sessions: Vec::new(),
            })
        }

        pub fn classified(mut self, path: &str) -> Self {
            self.0.classification = Some(Classification::parse(path).unwrap());
            self
        }

        pub fn parent(mut self, key: &str) -> Self {
            self.0.parent_key = Some(OfferingKey::new(key).unwrap());
            self
        }

        pub fn session(mut self, weekday: u8, start: &str, end: &str, room: &str) -> Self {
            self.0.sessions.push(Session {
                weekday: Weekday::new(weekday).unwrap(),
                start: Some(hhmm::parse(start).unwrap()),
                end: Some(hhmm::parse(end).unwrap()),
                room_address: Some(room.to_string()),
            });
            self
        }

        pub fn build(self) -> CourseOffering {
            self.0
        }
    }
}
