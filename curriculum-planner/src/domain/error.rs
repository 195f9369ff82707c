//! Domain error types.
//!
//! Validation failures from any value type, collected into one enum for
//! callers that load whole tables.

use super::{
    InvalidClassification, InvalidCoord, InvalidCourseType, InvalidOfferingKey, InvalidSemester,
    InvalidStudySemester, InvalidTrack, InvalidWeekday,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error(transparent)]
    Semester(#[from] InvalidSemester),

    #[error(transparent)]
    StudySemester(#[from] InvalidStudySemester),

    #[error(transparent)]
    Weekday(#[from] InvalidWeekday),

    #[error(transparent)]
    OfferingKey(#[from] InvalidOfferingKey),

    #[error(transparent)]
    CourseType(#[from] InvalidCourseType),

    #[error(transparent)]
    Classification(#[from] InvalidClassification),

    #[error(transparent)]
    Track(#[from] InvalidTrack),

    #[error(transparent)]
    Coord(#[from] InvalidCoord),
}
