//! Versioned curriculum tables.
//!
//! Each track has several curriculum versions, each effective from a year.
//! Students keep the version that was current when they started, so the
//! version that applies depends on both the calendar semester and the
//! study semester.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{Semester, StudySemester, Track};

use super::error::CatalogError;

const BUILTIN_CURRICULUM: &str = include_str!("../../data/curriculum.json");

/// Special requirement kinds that are not matched by title alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialRequirement {
    Seminar,
    Project,
}

/// One required entry in a study semester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// A module matched by (case-insensitive) title substring.
    Module(String),
    /// Any one seminar of the track.
    Seminar,
    /// Any one project of the track.
    Project,
}

impl Requirement {
    /// The module title, if this is a plain module requirement.
    pub fn title(&self) -> Option<&str> {
        match self {
            Requirement::Module(title) => Some(title),
            _ => None,
        }
    }
}

/// A dated set of required titles per study semester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurriculumVersion {
    pub track: Track,
    pub effective_year: u16,
    pub requirements: BTreeMap<StudySemester, Vec<Requirement>>,
}

impl CurriculumVersion {
    pub fn requirements_for(&self, study_semester: StudySemester) -> &[Requirement] {
        self.requirements
            .get(&study_semester)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// All curriculum versions, ordered by effective year within each track.
#[derive(Debug, Clone, Default)]
pub struct CurriculumCatalog {
    versions: BTreeMap<Track, Vec<CurriculumVersion>>,
}

impl CurriculumCatalog {
    /// Build a catalogue from versions in any order.
    pub fn new(versions: Vec<CurriculumVersion>) -> Self {
        let mut by_track: BTreeMap<Track, Vec<CurriculumVersion>> = BTreeMap::new();
        for version in versions {
            by_track.entry(version.track).or_default().push(version);
        }
        for list in by_track.values_mut() {
            list.sort_by_key(|v| v.effective_year);
        }
        Self { versions: by_track }
    }

    /// The tables shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CURRICULUM)
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
        let file: CurriculumFile = serde_json::from_str(json).map_err(|e| CatalogError::Json {
            message: e.to_string(),
        })?;

        let mut versions = Vec::with_capacity(file.versions.len());
        for raw in file.versions {
            let mut requirements = BTreeMap::new();
            for (sem, entries) in raw.requirements {
                let sem = StudySemester::parse(&sem).map_err(|e| CatalogError::Invalid {
                    message: format!("{} {}: {}", raw.track, raw.effective_year, e),
                })?;
                let entries = entries.into_iter().map(RequirementEntry::into_requirement);
                requirements.insert(sem, entries.collect());
            }
            versions.push(CurriculumVersion {
                track: raw.track,
                effective_year: raw.effective_year,
                requirements,
            });
        }

        let catalog = Self::new(versions);
        catalog.check_unique_years()?;
        Ok(catalog)
    }

    fn check_unique_years(&self) -> Result<(), CatalogError> {
        for (track, list) in &self.versions {
            for pair in list.windows(2) {
                if pair[0].effective_year == pair[1].effective_year {
                    return Err(CatalogError::Invalid {
                        message: format!(
                            "duplicate {} version for {}",
                            track, pair[0].effective_year
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Versions of a track, ascending by effective year.
    pub fn versions(&self, track: Track) -> &[CurriculumVersion] {
        self.versions
            .get(&track)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The version that applies to students of `study_semester` in `semester`.
    ///
    /// That is the latest version whose effective year is at most the
    /// cohort's start year. Returns `None` if the cohort started before
    /// the first version.
    pub fn applicable(
        &self,
        track: Track,
        semester: Semester,
        study_semester: StudySemester,
    ) -> Option<&CurriculumVersion> {
        let cohort = study_semester.cohort_year(semester.year());
        let versions = self.versions(track);
        versions
            .iter()
            .enumerate()
            .find(|(i, v)| {
                let next = versions.get(i + 1).map(|n| n.effective_year);
                v.effective_year <= cohort && next.is_none_or(|next| cohort < next)
            })
            .map(|(_, v)| v)
    }
}

#[derive(Debug, Deserialize)]
struct CurriculumFile {
    versions: Vec<VersionEntry>,
}

#[derive(Debug, Deserialize)]
struct VersionEntry {
    track: Track,
    effective_year: u16,
    requirements: BTreeMap<String, Vec<RequirementEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RequirementEntry {
    Title(String),
    Special { special: SpecialRequirement },
}

impl RequirementEntry {
    fn into_requirement(self) -> Requirement {
        match self {
            RequirementEntry::Title(title) => Requirement::Module(title),
            RequirementEntry::Special {
                special: SpecialRequirement::Seminar,
            } => Requirement::Seminar,
            RequirementEntry::Special {
                special: SpecialRequirement::Project,
            } => Requirement::Project,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sem(s: &str) -> Semester {
        Semester::parse(s).unwrap()
    }

    fn study(n: u8) -> StudySemester {
        StudySemester::new(n).unwrap()
    }

    #[test]
    fn builtin_loads() {
        let catalog = CurriculumCatalog::builtin().unwrap();
        let years: Vec<u16> = catalog
            .versions(Track::BusinessCs)
            .iter()
            .map(|v| v.effective_year)
            .collect();
        assert_eq!(years, vec![2015, 2017, 2019, 2021]);

        let years: Vec<u16> = catalog
            .versions(Track::Cs)
            .iter()
            .map(|v| v.effective_year)
            .collect();
        assert_eq!(years, vec![2015, 2019, 2021]);
    }

    #[test]
    fn builtin_special_requirements() {
        let catalog = CurriculumCatalog::builtin().unwrap();
        let winf_2019 = &catalog.versions(Track::BusinessCs)[2];
        let fifth = winf_2019.requirements_for(study(5));
        assert!(fifth.contains(&Requirement::Seminar));
        assert!(fifth.contains(&Requirement::Project));
        assert!(fifth.contains(&Requirement::Module("Datenschutz".to_string())));
    }

    #[test]
    fn missing_study_semester_is_empty() {
        let catalog = CurriculumCatalog::builtin().unwrap();
        let inf_2021 = &catalog.versions(Track::Cs)[2];
        assert!(inf_2021.requirements_for(study(6)).is_empty());
    }

    #[test]
    fn applicable_follows_cohort_year() {
        let catalog = CurriculumCatalog::builtin().unwrap();

        // First-years in 2021w started 2021
        let v = catalog.applicable(Track::Cs, sem("2021w"), study(1)).unwrap();
        assert_eq!(v.effective_year, 2021);

        // Third-years in 2021w started 2020 -> 2019 version
        let v = catalog.applicable(Track::Cs, sem("2021w"), study(3)).unwrap();
        assert_eq!(v.effective_year, 2019);

        // Sixth semester in 2022s started 2019
        let v = catalog.applicable(Track::Cs, sem("2022s"), study(6)).unwrap();
        assert_eq!(v.effective_year, 2019);

        // 2018 cohort of business CS is still on the 2017 version
        let v = catalog
            .applicable(Track::BusinessCs, sem("2019s"), study(2))
            .unwrap();
        assert_eq!(v.effective_year, 2017);
    }

    #[test]
    fn applicable_none_before_first_version() {
        let catalog = CurriculumCatalog::builtin().unwrap();
        assert!(catalog.applicable(Track::Cs, sem("2015w"), study(3)).is_none());
    }

    #[test]
    fn rejects_bad_study_semester() {
        let json = r#"{"versions": [{"track": "cs", "effective_year": 2020,
            "requirements": {"7": ["X"]}}]}"#;
        assert!(matches!(
            CurriculumCatalog::from_json(json),
            Err(CatalogError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_years() {
        let json = r#"{"versions": [
            {"track": "cs", "effective_year": 2020, "requirements": {}},
            {"track": "cs", "effective_year": 2020, "requirements": {}}
        ]}"#;
        assert!(CurriculumCatalog::from_json(json).is_err());
    }

    #[test]
    fn rejects_unknown_special() {
        let json = r#"{"versions": [{"track": "cs", "effective_year": 2020,
            "requirements": {"1": [{"special": "thesis"}]}}]}"#;
        assert!(matches!(
            CurriculumCatalog::from_json(json),
            Err(CatalogError::Json { .. })
        ));
    }
}
