//! Normalization and cross-referencing pipeline for schedule snapshots.
//!
//! This crate turns raw scraped rows into four linked collections
//! (sections, courses, instructors, subjects) and assembles them into a
//! single bundle.

pub mod aggregate;
pub mod bundle;
pub mod courses;
pub mod instructors;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod reference;
pub mod subjects;
pub mod tags;
pub mod validate;

pub use pipeline::{PipelineOutput, ProgressReporter, SilentProgress};
pub use reference::{ReferenceTables, SubjectTable, TagTable};
