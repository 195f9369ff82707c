//! Domain types for the curriculum planner.
//!
//! These are validated value types: every constructor checks its input, so
//! code that receives a `Semester`, `Weekday` or `OfferingKey` can trust it.

mod classification;
mod error;
mod geo;
mod offering;
mod semester;
mod weekday;

pub use classification::{Classification, InvalidClassification, InvalidTrack, Track};
pub use error::DomainError;
pub use geo::{Coord, CoordKey, InvalidCoord};
pub use offering::{
    CourseOffering, CourseType, InvalidCourseType, InvalidOfferingKey, OfferingKey, Session,
    contains_casefold, hhmm,
};
pub use semester::{InvalidSemester, InvalidStudySemester, Season, Semester, StudySemester};
pub use weekday::{InvalidWeekday, Weekday};
