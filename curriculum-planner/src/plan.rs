//! The schedule pipeline: select, attach practicals, resolve.

use tracing::{info, warn};

use crate::curriculum::{CurriculumCatalog, SelectionRules};
use crate::domain::Track;
use crate::resolver::{
    FailurePolicy, ResolveError, Resolver, ResolverConfig, ScheduleEntry, ScheduleGraph,
    UnresolvedSlot,
};
use crate::selector::{Selection, Selector, attach_practicals};
use crate::source::OfferingTable;

/// Build a track's schedule graph over every semester of the table.
pub fn build_schedule_graph(
    table: &OfferingTable,
    catalog: &CurriculumCatalog,
    rules: &SelectionRules,
    track: Track,
    config: &ResolverConfig,
) -> Result<ScheduleGraph, ResolveError> {
    let mut selection = Selector::new(catalog, rules).select_all(track, table);
    attach_practicals(&mut selection, table, rules);
    resolve_selection(&selection, table, config)
}

/// Resolve every slot of a selection.
///
/// Slots are independent: one infeasible slot is either listed as
/// unresolved or aborts the build, depending on the failure policy.
pub fn resolve_selection(
    selection: &Selection,
    table: &OfferingTable,
    config: &ResolverConfig,
) -> Result<ScheduleGraph, ResolveError> {
    let resolver = Resolver::new(config.clone());
    let mut graph = ScheduleGraph::new(selection.track);

    for (&semester, chosen) in &selection.semesters {
        for (&study_semester, slot) in &chosen.slots {
            let terms = table.terms_for(semester, &slot.keys());
            match resolver.resolve(&terms) {
                Ok(schedule) => {
                    graph.insert(ScheduleEntry::new(semester, study_semester, schedule));
                }
                Err(error) => match config.failure_policy {
                    FailurePolicy::Omit => {
                        warn!(%semester, %study_semester, %error, "slot left unresolved");
                        graph
                            .unresolved
                            .push(UnresolvedSlot::new(semester, study_semester, &error));
                    }
                    FailurePolicy::Fail => {
                        return Err(ResolveError::Slot {
                            semester,
                            study_semester,
                            source: Box::new(error),
                        });
                    }
                },
            }
        }
    }

    info!(
        track = %selection.track,
        entries = graph.len(),
        unresolved = graph.unresolved.len(),
        "schedule graph built"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OfferingKey, Semester, StudySemester, Weekday};

    const SAMPLE: &str = include_str!("../data/offerings.sample.json");

    fn inputs() -> (OfferingTable, CurriculumCatalog, SelectionRules) {
        (
            OfferingTable::from_json(SAMPLE).unwrap(),
            CurriculumCatalog::builtin().unwrap(),
            SelectionRules::builtin().unwrap(),
        )
    }

    fn sem(s: &str) -> Semester {
        Semester::parse(s).unwrap()
    }

    fn study(n: u8) -> StudySemester {
        StudySemester::new(n).unwrap()
    }

    fn day(n: u8) -> Weekday {
        Weekday::new(n).unwrap()
    }

    #[test]
    fn sample_second_semester() {
        let (table, catalog, rules) = inputs();
        let graph =
            build_schedule_graph(&table, &catalog, &rules, Track::Cs, &ResolverConfig::default())
                .unwrap();

        let entry = graph.get(sem("2020s"), study(2)).unwrap();
        let monday: Vec<&str> = entry.days[&day(1)].iter().map(|s| s.key.as_str()).collect();
        assert_eq!(
            monday,
            vec![
                "Lecture.techn.infora.bachel.aud",
                "Lecture.techn.infora.bachel.bsks",
                "Lecture.mathe.math.bachel.mfib",
            ]
        );
        assert_eq!(entry.days[&day(2)].len(), 1);
        assert_eq!(entry.days[&day(4)][0].address.as_deref(), Some("Audimax"));
        assert_eq!(
            entry.dropped,
            vec![OfferingKey::new("Lecture.techn.infora.bachel.aud.ue1").unwrap()]
        );
    }

    #[test]
    fn infeasible_slot_omitted() {
        let (table, catalog, rules) = inputs();
        let graph =
            build_schedule_graph(&table, &catalog, &rules, Track::Cs, &ResolverConfig::default())
                .unwrap();

        assert!(graph.get(sem("2020s"), study(4)).is_none());
        assert_eq!(graph.unresolved.len(), 1);
        assert_eq!(graph.unresolved[0].study_semester, study(4));
        assert!(graph.unresolved[0].reason.contains("tgi"));

        // An applicable slot with no requirements resolves to an empty week
        let sixth = graph.get(sem("2020s"), study(6)).unwrap();
        assert!(sixth.days.is_empty());
    }

    #[test]
    fn infeasible_slot_fails_when_asked() {
        let (table, catalog, rules) = inputs();
        let config = ResolverConfig::default().with_failure_policy(FailurePolicy::Fail);
        let err = build_schedule_graph(&table, &catalog, &rules, Track::Cs, &config).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Slot { study_semester, .. } if study_semester == study(4)
        ));
    }

    #[test]
    fn repeated_builds_identical() {
        let (table, catalog, rules) = inputs();
        let config = ResolverConfig::default();
        let a = build_schedule_graph(&table, &catalog, &rules, Track::Cs, &config).unwrap();
        let b = build_schedule_graph(&table, &catalog, &rules, Track::Cs, &config).unwrap();
        assert_eq!(a, b);
    }
}
