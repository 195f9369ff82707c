//! Offering selection.
//!
//! Picks the concrete offerings that fill each study semester's curriculum
//! requirements, then attaches their practicals.

mod exercises;
mod select;
mod selection;

pub use exercises::attach_practicals;
pub use select::Selector;
pub use selection::{Selected, Selection, SemesterSelection, SlotSelection};
