//! Curriculum schedule planner.
//!
//! Builds, for every semester and study semester of a degree programme, the
//! weekly timetable a student following the recommended curriculum would
//! attend, and the walking routes between consecutive rooms of each day.

pub mod config;
pub mod curriculum;
pub mod domain;
pub mod plan;
pub mod resolver;
pub mod routing;
pub mod selector;
pub mod source;
pub mod web;
