//! Curriculum catalogue and selection rules.
//!
//! Both are data: the built-in tables are embedded from `data/` and can be
//! replaced by files on disk.

mod catalog;
mod error;
mod rules;

pub use catalog::{CurriculumCatalog, CurriculumVersion, Requirement, SpecialRequirement};
pub use error::CatalogError;
pub use rules::{
    CrossListing, DeniedPractical, ExtraPractical, FacultyRule, RenamedModule, SelectionRules,
    TrackProfile,
};
