//! Matching offerings against curriculum requirements.
//!
//! For one calendar semester, every candidate offering is checked against
//! every curriculum version already in force, and within a version against
//! the requirements of each study semester the version applies to. An
//! offering can land in several study semesters, but fills at most one
//! requirement per slot.

use tracing::{debug, trace, warn};

use crate::curriculum::{
    CurriculumCatalog, CurriculumVersion, Requirement, SelectionRules, TrackProfile,
};
use crate::domain::{
    CourseOffering, CourseType, Semester, StudySemester, Track, contains_casefold,
};
use crate::source::OfferingTable;

use super::selection::{Selected, Selection, SemesterSelection, SlotSelection};

/// Offering selector over a catalogue and its special-case rules.
pub struct Selector<'a> {
    catalog: &'a CurriculumCatalog,
    rules: &'a SelectionRules,
}

/// What one requirement check decided for an offering.
enum Outcome {
    /// Try the next requirement of the slot.
    Next,
    /// Stop checking this slot.
    Stop,
}

impl<'a> Selector<'a> {
    pub fn new(catalog: &'a CurriculumCatalog, rules: &'a SelectionRules) -> Self {
        Self { catalog, rules }
    }

    /// Select offerings for every semester in the table.
    pub fn select_all(&self, track: Track, table: &OfferingTable) -> Selection {
        let mut selection = Selection::new(track);
        for semester in table.semesters() {
            let chosen = self.select(semester, track, table);
            if !chosen.slots.is_empty() {
                selection.semesters.insert(semester, chosen);
            }
        }
        selection
    }

    /// Select offerings for one semester.
    ///
    /// Requirements that match nothing are left unfilled; an empty slot is
    /// still listed if a curriculum version applies to it.
    pub fn select(
        &self,
        semester: Semester,
        track: Track,
        table: &OfferingTable,
    ) -> SemesterSelection {
        let mut chosen = SemesterSelection::new(semester);

        if self.rules.is_skipped(semester) {
            debug!(%semester, "semester skipped by rules");
            return chosen;
        }
        let Some(profile) = self.rules.profile(track) else {
            warn!(%track, "no track profile, nothing selected");
            return chosen;
        };

        let candidates = table.candidates(semester, profile, &self.rules.home_faculty, |o| {
            self.admissible(o, profile)
        });
        debug!(%semester, %track, candidates = candidates.len(), "selecting offerings");

        for offering in candidates {
            for version in self.catalog.versions(track) {
                if semester.year() < version.effective_year {
                    continue;
                }
                self.place_in_version(offering, semester, track, profile, version, &mut chosen);
            }
        }

        chosen
    }

    /// Home-faculty offerings must come from the home department and one
    /// of the track's programmes; others are taken as they are.
    fn admissible(&self, offering: &CourseOffering, profile: &TrackProfile) -> bool {
        let Some(classification) = &offering.classification else {
            return false;
        };
        if classification.faculty() != Some(self.rules.home_faculty.as_str()) {
            return true;
        }
        classification.len() >= 5
            && classification.department() == Some(self.rules.home_department.as_str())
            && classification
                .program()
                .is_some_and(|p| profile.programs.iter().any(|x| x == p))
    }

    fn is_home(&self, offering: &CourseOffering) -> bool {
        offering.faculty() == Some(self.rules.home_faculty.as_str())
    }

    fn place_in_version(
        &self,
        offering: &CourseOffering,
        semester: Semester,
        track: Track,
        profile: &TrackProfile,
        version: &CurriculumVersion,
        chosen: &mut SemesterSelection,
    ) {
        if self.is_home(offering)
            && let Some(listing) = self.rules.cross_listing(
                track,
                version.effective_year,
                semester.year(),
                &offering.title,
            )
        {
            trace!(key = %offering.key, study_semester = %listing.study_semester, "cross-listed");
            chosen
                .slot_mut(listing.study_semester)
                .push(Selected::Module(offering.key.clone()));
            return;
        }

        for (&study_semester, requirements) in &version.requirements {
            if !study_semester.fits(semester.season()) {
                continue;
            }
            let applies = self
                .catalog
                .applicable(track, semester, study_semester)
                .is_some_and(|v| v.effective_year == version.effective_year);
            if !applies {
                continue;
            }

            let slot = chosen.slot_mut(study_semester);
            for requirement in requirements {
                let outcome = self.check(
                    offering,
                    requirement,
                    semester,
                    study_semester,
                    profile,
                    slot,
                );
                if let Outcome::Stop = outcome {
                    break;
                }
            }
        }
    }

    /// Check one requirement, pushing the offering into the slot on a match.
    fn check(
        &self,
        offering: &CourseOffering,
        requirement: &Requirement,
        semester: Semester,
        study_semester: StudySemester,
        profile: &TrackProfile,
        slot: &mut SlotSelection,
    ) -> Outcome {
        let program = offering.classification.as_ref().and_then(|c| c.program());

        let title = match requirement {
            Requirement::Project => {
                let eligible = self.is_home(offering)
                    && offering.title_contains(&self.rules.project_title)
                    && !slot.has_project()
                    && profile.project_study_semester == Some(study_semester)
                    && program.is_some()
                    && profile.project_program.as_deref() == program;
                if eligible && slot.push(Selected::Project(offering.key.clone())) {
                    trace!(key = %offering.key, %study_semester, "project selected");
                }
                return Outcome::Next;
            }
            Requirement::Seminar => {
                let eligible = offering.course_type == CourseType::Seminar
                    && offering.title_contains(&self.rules.seminar_title)
                    && !offering.title_contains(&self.rules.independent_study_title)
                    && self.is_home(offering)
                    && program == Some(profile.seminar_program.as_str())
                    && !slot.has_seminar();
                if eligible && slot.push(Selected::Seminar(offering.key.clone())) {
                    trace!(key = %offering.key, %study_semester, "seminar selected");
                }
                return Outcome::Next;
            }
            Requirement::Module(title) => title,
        };

        if offering.title_contains(&self.rules.two_subject_marker) {
            return Outcome::Stop;
        }

        if let (Some(rule), Some(classification)) =
            (self.rules.faculty_rule(title), &offering.classification)
            && offering.title_contains(title)
            && !rule.allows(classification)
        {
            return Outcome::Stop;
        }

        if self
            .rules
            .renamed_match(title, &offering.title, semester, study_semester)
        {
            slot.push(Selected::Module(offering.key.clone()));
            return Outcome::Stop;
        }

        if !contains_casefold(&offering.title, title) {
            return Outcome::Next;
        }

        if self
            .rules
            .equivalents(&offering.key)
            .any(|other| slot.contains(other))
        {
            return Outcome::Stop;
        }

        if slot.push(Selected::Module(offering.key.clone())) {
            trace!(key = %offering.key, requirement = %title, %study_semester, "module selected");
        }
        Outcome::Stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OfferingKey, Weekday};
    use crate::resolver::Resolver;
    use crate::source::fixtures::OfferingBuilder;
    use std::collections::BTreeMap;

    fn sem(s: &str) -> Semester {
        Semester::parse(s).unwrap()
    }

    fn study(n: u8) -> StudySemester {
        StudySemester::new(n).unwrap()
    }

    fn key(s: &str) -> OfferingKey {
        OfferingKey::new(s).unwrap()
    }

    fn version(track: Track, year: u16, reqs: &[(u8, Vec<Requirement>)]) -> CurriculumVersion {
        CurriculumVersion {
            track,
            effective_year: year,
            requirements: reqs
                .iter()
                .map(|(s, r)| (study(*s), r.clone()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn module(title: &str) -> Requirement {
        Requirement::Module(title.to_string())
    }

    fn keys(slot: Option<&SlotSelection>) -> Vec<String> {
        slot.map(|s| s.keys().iter().map(|k| k.to_string()).collect())
            .unwrap_or_default()
    }

    const CS_LECTURE: &str = "lecture.techn.infora.bachel.pflich";
    const WINF_LECTURE: &str = "lecture.techn.infora.bachel_1.pflich";

    #[test]
    fn scenario_both_modules_selected() {
        let catalog = CurriculumCatalog::new(vec![version(
            Track::Cs,
            2019,
            &[(2, vec![module("Algorithms"), module("Networks")])],
        )]);
        let rules = SelectionRules::builtin().unwrap();
        let table = OfferingTable::from_offerings(vec![
            OfferingBuilder::new("2020s", "algo", "Introduction to Algorithms", CourseType::Lecture)
                .classified(CS_LECTURE)
                .session(2, "10:00", "12:00", "Room Algo 1")
                .build(),
            OfferingBuilder::new("2020s", "net", "Computer Networks", CourseType::Lecture)
                .classified(CS_LECTURE)
                .session(2, "13:00", "15:00", "Room Net 2")
                .build(),
        ])
        .unwrap();

        let selector = Selector::new(&catalog, &rules);
        let chosen = selector.select(sem("2020s"), Track::Cs, &table);
        let slot = chosen.slot(study(2));
        assert_eq!(keys(slot), vec!["algo", "net"]);

        let terms = table.terms_for(sem("2020s"), &slot.unwrap().keys());
        let schedule = Resolver::default().resolve(&terms).unwrap();
        assert_eq!(
            schedule.addresses(Weekday::new(2).unwrap()),
            vec![Some("Room Algo 1"), Some("Room Net 2")]
        );
    }

    #[test]
    fn inadmissible_home_offering_does_not_hide_namesake() {
        let catalog = CurriculumCatalog::new(vec![version(
            Track::Cs,
            2019,
            &[(2, vec![module("Analysis")])],
        )]);
        let rules = SelectionRules::builtin().unwrap();
        let table = OfferingTable::from_offerings(vec![
            OfferingBuilder::new("2020s", "a", "Analysis", CourseType::Lecture)
                .classified("lecture.techn.elektro.bachel.pflich")
                .build(),
            OfferingBuilder::new("2020s", "b", "Analysis", CourseType::Lecture)
                .classified("lecture.mathe.math")
                .build(),
        ])
        .unwrap();

        let chosen = Selector::new(&catalog, &rules).select(sem("2020s"), Track::Cs, &table);
        assert_eq!(keys(chosen.slot(study(2))), vec!["b"]);
    }

    #[test]
    fn season_and_version_gating() {
        let catalog = CurriculumCatalog::new(vec![
            version(Track::Cs, 2019, &[(1, vec![module("Algo")]), (2, vec![module("Algo")])]),
            version(Track::Cs, 2021, &[(1, vec![module("Algo")]), (2, vec![module("Algo")])]),
        ]);
        let rules = SelectionRules::builtin().unwrap();
        let table = OfferingTable::from_offerings(vec![
            OfferingBuilder::new("2021w", "algo", "Algo", CourseType::Lecture)
                .classified(CS_LECTURE)
                .build(),
            OfferingBuilder::new("2018w", "algo", "Algo", CourseType::Lecture)
                .classified(CS_LECTURE)
                .build(),
        ])
        .unwrap();

        let selector = Selector::new(&catalog, &rules);
        let chosen = selector.select(sem("2021w"), Track::Cs, &table);
        assert!(chosen.slot(study(2)).is_none());
        assert_eq!(keys(chosen.slot(study(1))), vec!["algo"]);

        // Before the first version nothing applies
        let chosen = selector.select(sem("2018w"), Track::Cs, &table);
        assert!(chosen.slots.is_empty());
    }

    #[test]
    fn skipped_semester_is_empty() {
        let catalog = CurriculumCatalog::builtin().unwrap();
        let rules = SelectionRules::builtin().unwrap();
        let table = OfferingTable::from_offerings(vec![
            OfferingBuilder::new("2015s", "x", "Programmierung", CourseType::Lecture)
                .classified(CS_LECTURE)
                .build(),
        ])
        .unwrap();
        let chosen = Selector::new(&catalog, &rules).select(sem("2015s"), Track::Cs, &table);
        assert!(chosen.slots.is_empty());
    }

    #[test]
    fn home_faculty_needs_department_and_program() {
        let catalog = CurriculumCatalog::new(vec![version(
            Track::Cs,
            2019,
            &[(2, vec![module("Algo")])],
        )]);
        let rules = SelectionRules::builtin().unwrap();
        let table = OfferingTable::from_offerings(vec![
            OfferingBuilder::new("2020s", "a", "Algo I", CourseType::Lecture)
                .classified("lecture.techn.elektro.bachel.pflich")
                .build(),
            OfferingBuilder::new("2020s", "b", "Algo II", CourseType::Lecture)
                .classified(WINF_LECTURE)
                .build(),
            OfferingBuilder::new("2020s", "c", "Algo III", CourseType::Lecture)
                .classified("lecture.techn.infora")
                .build(),
            OfferingBuilder::new("2020s", "d", "Algo IV", CourseType::Lecture)
                .classified("lecture.mathe.math")
                .build(),
        ])
        .unwrap();

        let chosen = Selector::new(&catalog, &rules).select(sem("2020s"), Track::Cs, &table);
        assert_eq!(keys(chosen.slot(study(2))), vec!["d"]);
    }

    #[test]
    fn one_seminar_per_slot() {
        let catalog = CurriculumCatalog::new(vec![version(
            Track::Cs,
            2019,
            &[(5, vec![Requirement::Seminar])],
        )]);
        let rules = SelectionRules::builtin().unwrap();
        let table = OfferingTable::from_offerings(vec![
            OfferingBuilder::new("2021w", "s1", "Seminar Datenbanken", CourseType::Seminar)
                .classified(CS_LECTURE)
                .build(),
            OfferingBuilder::new("2021w", "s2", "Seminar Compilerbau", CourseType::Seminar)
                .classified(CS_LECTURE)
                .build(),
            OfferingBuilder::new(
                "2021w",
                "s0",
                "Seminar Wissenschaftliches Arbeiten",
                CourseType::Seminar,
            )
            .classified(CS_LECTURE)
            .build(),
            OfferingBuilder::new("2021w", "l0", "Seminarvorlesung", CourseType::Lecture)
                .classified(CS_LECTURE)
                .build(),
        ])
        .unwrap();

        let chosen = Selector::new(&catalog, &rules).select(sem("2021w"), Track::Cs, &table);
        let slot = chosen.slot(study(5)).unwrap();
        assert_eq!(slot.items(), &[Selected::Seminar(key("s1"))]);
    }

    #[test]
    fn seminar_program_must_match_track() {
        let catalog = CurriculumCatalog::new(vec![version(
            Track::BusinessCs,
            2019,
            &[(5, vec![Requirement::Seminar])],
        )]);
        let rules = SelectionRules::builtin().unwrap();
        let table = OfferingTable::from_offerings(vec![
            OfferingBuilder::new("2021w", "s1", "Seminar Datenbanken", CourseType::Seminar)
                .classified(CS_LECTURE)
                .build(),
            OfferingBuilder::new("2021w", "s2", "Seminar WI", CourseType::Seminar)
                .classified(WINF_LECTURE)
                .build(),
        ])
        .unwrap();

        let chosen =
            Selector::new(&catalog, &rules).select(sem("2021w"), Track::BusinessCs, &table);
        assert_eq!(keys(chosen.slot(study(5))), vec!["s2"]);
    }

    #[test]
    fn one_project_in_its_study_semester() {
        let catalog = CurriculumCatalog::new(vec![version(
            Track::BusinessCs,
            2019,
            &[
                (3, vec![Requirement::Project]),
                (5, vec![Requirement::Project]),
            ],
        )]);
        let rules = SelectionRules::builtin().unwrap();
        let table = OfferingTable::from_offerings(vec![
            OfferingBuilder::new("2021w", "p1", "Projekt A", CourseType::Lecture)
                .classified(WINF_LECTURE)
                .build(),
            OfferingBuilder::new("2021w", "p2", "Projekt B", CourseType::Lecture)
                .classified(WINF_LECTURE)
                .build(),
        ])
        .unwrap();

        let chosen =
            Selector::new(&catalog, &rules).select(sem("2021w"), Track::BusinessCs, &table);
        assert_eq!(
            chosen.slot(study(5)).unwrap().items(),
            &[Selected::Project(key("p1"))]
        );
        assert!(chosen.slot(study(3)).unwrap().is_empty());
    }

    #[test]
    fn two_subject_variant_skipped() {
        let catalog = CurriculumCatalog::new(vec![version(
            Track::Cs,
            2019,
            &[(2, vec![module("Programmierung")])],
        )]);
        let rules = SelectionRules::builtin().unwrap();
        let table = OfferingTable::from_offerings(vec![
            OfferingBuilder::new("2020s", "a", "Programmierung (2F)", CourseType::Lecture)
                .classified(CS_LECTURE)
                .build(),
        ])
        .unwrap();

        let chosen = Selector::new(&catalog, &rules).select(sem("2020s"), Track::Cs, &table);
        assert!(chosen.slot(study(2)).unwrap().is_empty());
    }

    #[test]
    fn faculty_rule_rejects_math_statistics() {
        let catalog = CurriculumCatalog::new(vec![version(
            Track::BusinessCs,
            2019,
            &[(2, vec![module("Statistische Methoden")])],
        )]);
        let rules = SelectionRules::builtin().unwrap();
        let table = OfferingTable::from_offerings(vec![
            OfferingBuilder::new("2020s", "m", "Statistische Methoden", CourseType::Lecture)
                .classified("lecture.mathe.stat.bachel")
                .build(),
            OfferingBuilder::new("2020s", "w", "Statistische Methoden fuer WI", CourseType::Lecture)
                .classified("lecture.wirtsc.instit.zentr")
                .build(),
        ])
        .unwrap();

        let chosen =
            Selector::new(&catalog, &rules).select(sem("2020s"), Track::BusinessCs, &table);
        assert_eq!(keys(chosen.slot(study(2))), vec!["w"]);
    }

    #[test]
    fn renamed_module_override() {
        let catalog = CurriculumCatalog::new(vec![version(
            Track::BusinessCs,
            2019,
            &[(
                4,
                vec![module("Theoretische Grundlagen der Informatik - Einführung")],
            )],
        )]);
        let rules = SelectionRules::builtin().unwrap();
        let offering = |semester: &str| {
            OfferingBuilder::new(
                semester,
                "tgi",
                "Theoretische Grundlagen der Informatik",
                CourseType::Lecture,
            )
            .classified(CS_LECTURE)
            .build()
        };
        let table = OfferingTable::from_offerings(vec![offering("2021s"), offering("2022s")])
            .unwrap();

        let selector = Selector::new(&catalog, &rules);
        let chosen = selector.select(sem("2021s"), Track::BusinessCs, &table);
        assert_eq!(keys(chosen.slot(study(4))), vec!["tgi"]);

        // Plain substring matching does not find it the other way round
        let chosen = selector.select(sem("2022s"), Track::BusinessCs, &table);
        assert!(chosen.slot(study(4)).unwrap().is_empty());
    }

    #[test]
    fn cross_listing_moves_study_semester() {
        let catalog = CurriculumCatalog::new(vec![version(
            Track::BusinessCs,
            2019,
            &[(2, vec![module("Computer Networks")])],
        )]);
        let rules = SelectionRules::builtin().unwrap();
        let table = OfferingTable::from_offerings(vec![
            OfferingBuilder::new("2022s", "cn", "Computer Networks", CourseType::Lecture)
                .classified(WINF_LECTURE)
                .build(),
            OfferingBuilder::new("2021s", "cn", "Computer Networks", CourseType::Lecture)
                .classified(WINF_LECTURE)
                .build(),
        ])
        .unwrap();

        let selector = Selector::new(&catalog, &rules);
        let chosen = selector.select(sem("2022s"), Track::BusinessCs, &table);
        assert_eq!(keys(chosen.slot(study(4))), vec!["cn"]);
        assert!(chosen.slot(study(2)).is_none());

        let chosen = selector.select(sem("2021s"), Track::BusinessCs, &table);
        assert_eq!(keys(chosen.slot(study(2))), vec!["cn"]);
    }

    #[test]
    fn equivalent_keys_fill_slot_once() {
        let catalog = CurriculumCatalog::new(vec![version(
            Track::BusinessCs,
            2019,
            &[(2, vec![module("Volkswirtschaftslehre")])],
        )]);
        let rules = SelectionRules::builtin().unwrap();
        let table = OfferingTable::from_offerings(vec![
            OfferingBuilder::new(
                "2020s",
                "Lecture.wirtsc.instit.lehrst.einfhr",
                "Einführung in die Volkswirtschaftslehre (Gruppe A)",
                CourseType::Lecture,
            )
            .classified("lecture.wirtsc.instit.lehrst")
            .build(),
            OfferingBuilder::new(
                "2020s",
                "Lecture.wirtsc.instit.zentr.evwl",
                "Einführung in die Volkswirtschaftslehre (Gruppe B)",
                CourseType::Lecture,
            )
            .classified("lecture.wirtsc.instit.zentr")
            .build(),
        ])
        .unwrap();

        let chosen =
            Selector::new(&catalog, &rules).select(sem("2020s"), Track::BusinessCs, &table);
        assert_eq!(
            keys(chosen.slot(study(2))),
            vec!["Lecture.wirtsc.instit.lehrst.einfhr"]
        );
    }

    #[test]
    fn first_key_wins_ties() {
        let catalog = CurriculumCatalog::new(vec![version(
            Track::Cs,
            2019,
            &[(2, vec![module("Algo"), module("Datenbanken")])],
        )]);
        let rules = SelectionRules::builtin().unwrap();
        let table = OfferingTable::from_offerings(vec![
            OfferingBuilder::new("2020s", "b", "Algo und Datenbanken", CourseType::Lecture)
                .classified(CS_LECTURE)
                .build(),
            OfferingBuilder::new("2020s", "a", "Datenbanken", CourseType::Lecture)
                .classified(CS_LECTURE)
                .build(),
        ])
        .unwrap();

        let chosen = Selector::new(&catalog, &rules).select(sem("2020s"), Track::Cs, &table);
        // "b" fills only its first matching requirement
        assert_eq!(keys(chosen.slot(study(2))), vec!["a", "b"]);
    }

    #[test]
    fn select_all_drops_empty_semesters() {
        let catalog = CurriculumCatalog::new(vec![version(
            Track::Cs,
            2019,
            &[(2, vec![module("Algo")])],
        )]);
        let rules = SelectionRules::builtin().unwrap();
        let table = OfferingTable::from_offerings(vec![
            OfferingBuilder::new("2020s", "a", "Algo", CourseType::Lecture)
                .classified(CS_LECTURE)
                .build(),
            OfferingBuilder::new("2020w", "a", "Algo", CourseType::Lecture)
                .classified(CS_LECTURE)
                .build(),
        ])
        .unwrap();

        let selection = Selector::new(&catalog, &rules).select_all(Track::Cs, &table);
        assert_eq!(selection.semesters.len(), 1);
        assert!(selection.semester(sem("2020s")).is_some());
    }
}
