//! Special-case rules for matching offerings to curriculum requirements.
//!
//! The catalogue data is messy: modules get renamed, cross-listed, offered
//! by several faculties or split into numbered groups. All of that lives
//! here as data so a new catalogue year never needs resolver changes.

use std::path::Path;

use serde::Deserialize;

use crate::domain::{
    Classification, CourseType, OfferingKey, Semester, StudySemester, Track, contains_casefold,
};

use super::error::CatalogError;

const BUILTIN_RULES: &str = include_str!("../../data/selection_rules.json");

/// How one track reads the classification paths.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackProfile {
    pub track: Track,

    /// Faculty codes whose offerings are considered at all.
    pub faculties: Vec<String>,

    /// Programme codes accepted for home-faculty offerings.
    pub programs: Vec<String>,

    /// Programme code of the track's own seminars.
    pub seminar_program: String,

    /// Programme code of the track's projects; `None` if it has none.
    pub project_program: Option<String>,

    /// Study semester in which the project is scheduled.
    pub project_study_semester: Option<StudySemester>,

    /// Practical types that are never attached to a lecture of this track.
    pub practical_excluded_types: Vec<CourseType>,
}

/// Requirement titles that only some faculties may fill.
#[derive(Debug, Clone, Deserialize)]
pub struct FacultyRule {
    pub title: String,

    #[serde(default)]
    pub excluded_faculties: Vec<String>,

    /// If set, an offering with a department segment must be from this one.
    #[serde(default)]
    pub required_department: Option<String>,
}

impl FacultyRule {
    /// Whether an offering with this classification may fill the requirement.
    pub fn allows(&self, classification: &Classification) -> bool {
        let faculty_ok = classification
            .faculty()
            .is_none_or(|f| !self.excluded_faculties.iter().any(|x| x == f));
        let department_ok = match (&self.required_department, classification.department()) {
            (Some(required), Some(dept)) => required == dept,
            _ => true,
        };
        faculty_ok && department_ok
    }
}

/// A module that, for one curriculum version and calendar year, is taught
/// under a different study semester than the table says.
#[derive(Debug, Clone, Deserialize)]
pub struct CrossListing {
    pub track: Track,
    pub curriculum_year: u16,
    pub calendar_year: u16,
    pub title: String,
    pub study_semester: StudySemester,
}

/// A requirement that, in one semester, is filled by an offering with a
/// different title.
#[derive(Debug, Clone, Deserialize)]
pub struct RenamedModule {
    pub requirement: String,
    pub matches: String,
    pub semester: Semester,
    pub study_semester: StudySemester,
}

/// A practical that must not be attached.
#[derive(Debug, Clone, Deserialize)]
pub struct DeniedPractical {
    #[serde(default)]
    pub track: Option<Track>,
    pub title: String,
    #[serde(default)]
    pub semester: Option<Semester>,
    /// Only deny when this key is already in the slot.
    #[serde(default)]
    pub when_selected: Option<OfferingKey>,
}

/// A practical added to a slot by hand.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtraPractical {
    pub track: Track,
    pub semester: Semester,
    pub study_semester: StudySemester,
    pub key: OfferingKey,
}

/// All selection special cases.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionRules {
    /// Faculty code of the engineering faculty that owns both tracks.
    pub home_faculty: String,
    pub home_department: String,

    /// Title fragment identifying seminars.
    pub seminar_title: String,
    /// Title fragment identifying projects.
    pub project_title: String,
    /// Module that sometimes carries "Seminar" in its title.
    pub independent_study_title: String,
    /// Marker of two-subject-programme variants.
    pub two_subject_marker: String,

    #[serde(default)]
    pub skipped_semesters: Vec<Semester>,

    pub tracks: Vec<TrackProfile>,

    #[serde(default)]
    pub faculty_rules: Vec<FacultyRule>,
    #[serde(default)]
    pub cross_listings: Vec<CrossListing>,
    #[serde(default)]
    pub renamed_modules: Vec<RenamedModule>,
    #[serde(default)]
    pub equivalent_keys: Vec<Vec<OfferingKey>>,
    #[serde(default)]
    pub practical_denylist: Vec<DeniedPractical>,
    #[serde(default)]
    pub extra_practicals: Vec<ExtraPractical>,
}

impl SelectionRules {
    /// The rules shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_RULES)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let rules: Self = serde_json::from_str(json).map_err(|e| CatalogError::Json {
            message: e.to_string(),
        })?;
        for track in Track::ALL {
            if rules.profile(track).is_none() {
                return Err(CatalogError::Invalid {
                    message: format!("no track profile for {track}"),
                });
            }
        }
        Ok(rules)
    }

    pub fn profile(&self, track: Track) -> Option<&TrackProfile> {
        self.tracks.iter().find(|p| p.track == track)
    }

    pub fn is_skipped(&self, semester: Semester) -> bool {
        self.skipped_semesters.contains(&semester)
    }

    pub fn faculty_rule(&self, title: &str) -> Option<&FacultyRule> {
        self.faculty_rules.iter().find(|r| r.title == title)
    }

    /// The cross-listing that moves `title` for this version and year.
    pub fn cross_listing(
        &self,
        track: Track,
        curriculum_year: u16,
        calendar_year: u16,
        title: &str,
    ) -> Option<&CrossListing> {
        self.cross_listings.iter().find(|c| {
            c.track == track
                && c.curriculum_year == curriculum_year
                && c.calendar_year == calendar_year
                && contains_casefold(title, &c.title)
        })
    }

    /// Whether `title` fills `requirement` by rename in this slot.
    pub fn renamed_match(
        &self,
        requirement: &str,
        title: &str,
        semester: Semester,
        study_semester: StudySemester,
    ) -> bool {
        self.renamed_modules.iter().any(|r| {
            r.requirement == requirement
                && r.semester == semester
                && r.study_semester == study_semester
                && contains_casefold(title, &r.matches)
        })
    }

    /// The keys interchangeable with `key`, excluding `key` itself.
    pub fn equivalents<'a>(&'a self, key: &'a OfferingKey) -> impl Iterator<Item = &'a OfferingKey> {
        self.equivalent_keys
            .iter()
            .filter(move |group| group.contains(key))
            .flatten()
            .filter(move |k| *k != key)
    }

    /// Whether a practical titled `title` must be left out of a slot.
    pub fn is_denied_practical(
        &self,
        track: Track,
        semester: Semester,
        title: &str,
        slot: &[OfferingKey],
    ) -> bool {
        self.practical_denylist.iter().any(|d| {
            d.track.is_none_or(|t| t == track)
                && d.semester.is_none_or(|s| s == semester)
                && d.title == title
                && d.when_selected.as_ref().is_none_or(|k| slot.contains(k))
        })
    }

    pub fn extra_practicals(
        &self,
        track: Track,
    ) -> impl Iterator<Item = &ExtraPractical> {
        self.extra_practicals.iter().filter(move |e| e.track == track)
    }
}
