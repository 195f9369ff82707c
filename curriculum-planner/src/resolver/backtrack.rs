//! Backtracking search for a conflict-free week.
//!
//! Terms are walked in (weekday, start) order, each compared with the last
//! committed one. Mandatory terms must fit or the branch fails. Practicals
//! are optional: a clashing practical is skipped, and a practical that
//! makes the rest of the week infeasible is backtracked out.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::Serialize;
use tracing::{debug, trace};

use crate::domain::{OfferingKey, Weekday};

use super::config::ResolverConfig;
use super::error::ResolveError;
use super::term::{Term, spans_overlap};

/// One attended session in a resolved week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stop {
    pub key: OfferingKey,
    pub title: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub address: Option<String>,
    pub practical: bool,
}

/// A resolved week: attended sessions per weekday in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DaySchedule {
    pub days: BTreeMap<Weekday, Vec<Stop>>,

    /// Practicals none of whose sessions could be attended.
    pub dropped: Vec<OfferingKey>,
}

impl DaySchedule {
    /// Room addresses of one weekday, in attendance order.
    pub fn addresses(&self, weekday: Weekday) -> Vec<Option<&str>> {
        self.days
            .get(&weekday)
            .map(|stops| stops.iter().map(|s| s.address.as_deref()).collect())
            .unwrap_or_default()
    }
}

/// Pairs of mandatory sessions on the same weekday whose times overlap.
///
/// Empty for every schedule the resolver produces.
pub fn mandatory_overlaps(schedule: &DaySchedule) -> Vec<(OfferingKey, OfferingKey)> {
    let mut overlaps = Vec::new();
    for stops in schedule.days.values() {
        let mandatory: Vec<&Stop> = stops.iter().filter(|s| !s.practical).collect();
        for (i, a) in mandatory.iter().enumerate() {
            for b in &mandatory[i + 1..] {
                if spans_overlap((a.start, a.end), (b.start, b.end)) {
                    overlaps.push((a.key.clone(), b.key.clone()));
                }
            }
        }
    }
    overlaps
}

/// Step of a successful branch, collected while the recursion unwinds.
#[derive(Debug, Clone, Copy)]
enum Placement {
    Placed(usize),
    Dropped(usize),
}

/// The last committed session.
#[derive(Debug, Clone, Copy)]
struct Previous {
    weekday: Weekday,
    end: NaiveTime,
}

impl Previous {
    fn of(term: &Term) -> Self {
        Self {
            weekday: term.weekday,
            end: term.end,
        }
    }
}

/// Placements of a feasible branch in reverse order, or the index of the
/// mandatory term whose clash ended an infeasible one.
type Branch = Result<Vec<Placement>, usize>;

struct Search<'t> {
    terms: &'t [&'t Term],
    practical: Vec<bool>,
    steps: usize,
    max_steps: usize,
}

impl<'t> Search<'t> {
    fn run(
        &mut self,
        prev: Option<Previous>,
        idx: usize,
        used: &mut Vec<&'t OfferingKey>,
    ) -> Result<Branch, ResolveError> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(ResolveError::Exhausted {
                max_steps: self.max_steps,
            });
        }

        let terms = self.terms;
        let Some(&term) = terms.get(idx) else {
            return Ok(Ok(Vec::new()));
        };

        if self.practical[idx] {
            return self.run_practical(term, prev, idx, used);
        }

        // The sentinel before the first term never clashes
        let clash = prev.is_some_and(|p| term.weekday <= p.weekday && term.start < p.end);
        if clash {
            trace!(key = %term.key, weekday = %term.weekday, "mandatory clash");
            return Ok(Err(idx));
        }

        let rest = self.run(Some(Previous::of(term)), idx + 1, used)?;
        Ok(rest.map(|mut placements| {
            placements.push(Placement::Placed(idx));
            placements
        }))
    }

    fn run_practical(
        &mut self,
        term: &'t Term,
        prev: Option<Previous>,
        idx: usize,
        used: &mut Vec<&'t OfferingKey>,
    ) -> Result<Branch, ResolveError> {
        let already_used = used.contains(&&term.key);
        let clash = prev.is_some_and(|p| term.weekday == p.weekday && term.start < p.end);

        if !already_used && !clash {
            used.push(&term.key);
            let with = self.run(Some(Previous::of(term)), idx + 1, used);
            used.pop();
            if let Ok(mut placements) = with? {
                placements.push(Placement::Placed(idx));
                return Ok(Ok(placements));
            }
            trace!(key = %term.key, weekday = %term.weekday, "backtracking over practical");
        }

        let without = self.run(prev, idx + 1, used)?;
        Ok(without.map(|mut placements| {
            placements.push(Placement::Dropped(idx));
            placements
        }))
    }
}

/// Backtracking schedule resolver.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Find a week in which every mandatory term is attended.
    ///
    /// Terms are sorted by weekday, start, end and key first, so the
    /// result does not depend on input order.
    pub fn resolve(&self, terms: &[Term]) -> Result<DaySchedule, ResolveError> {
        let mut sorted: Vec<&Term> = terms.iter().collect();
        sorted.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        let practical: Vec<bool> = sorted.iter().map(|t| t.is_practical()).collect();

        let mut search = Search {
            terms: &sorted,
            practical,
            steps: 0,
            max_steps: self.config.max_steps,
        };
        let mut used = Vec::new();
        let outcome = search.run(None, 0, &mut used)?;

        let mut placements = match outcome {
            Ok(placements) => placements,
            Err(idx) => {
                let term = sorted[idx];
                debug!(key = %term.key, steps = search.steps, "no feasible schedule");
                return Err(ResolveError::Infeasible {
                    key: term.key.clone(),
                    weekday: term.weekday,
                    start: term.start,
                });
            }
        };
        placements.reverse();

        let mut schedule = DaySchedule::default();
        for placement in &placements {
            if let Placement::Placed(idx) = *placement {
                let term = sorted[idx];
                schedule.days.entry(term.weekday).or_default().push(Stop {
                    key: term.key.clone(),
                    title: term.title.clone(),
                    start: term.start,
                    end: term.end,
                    address: term.address.clone(),
                    practical: search.practical[idx],
                });
            }
        }

        for placement in &placements {
            if let Placement::Dropped(idx) = *placement {
                let key = &sorted[idx].key;
                let attended = schedule
                    .days
                    .values()
                    .flatten()
                    .any(|stop| &stop.key == key);
                if !attended && !schedule.dropped.contains(key) {
                    schedule.dropped.push(key.clone());
                }
            }
        }

        debug!(
            steps = search.steps,
            days = schedule.days.len(),
            dropped = schedule.dropped.len(),
            "schedule resolved"
        );
        Ok(schedule)
    }
}
