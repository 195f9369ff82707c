//! Schedule resolution.
//!
//! Turns the selected offerings of one slot into a weekly schedule in which
//! no mandatory sessions clash, dropping practicals where needed.

mod backtrack;
mod config;
mod error;
mod graph;
mod term;

pub use backtrack::{DaySchedule, Resolver, Stop, mandatory_overlaps};
pub use config::{FailurePolicy, ResolverConfig};
pub use error::ResolveError;
pub use graph::{ScheduleEntry, ScheduleGraph, UnresolvedSlot};
pub use term::{PRACTICAL_KEYWORDS, Term};
