//! End-to-end pipeline: raw sections → sections → courses / instructors →
//! subjects.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument};

use schedkit_shared::{Course, Instructor, RawSection, Result, Section, Subject};

use crate::courses::build_courses;
use crate::instructors::build_instructors;
use crate::normalize::normalize_sections;
use crate::output::{read_json, write_json};
use crate::reference::ReferenceTables;
use crate::subjects::build_subjects;

/// Conventional snapshot file names inside an output directory.
pub const SECTIONS_FILE: &str = "sections.json";
pub const COURSES_FILE: &str = "courses.json";
pub const INSTRUCTORS_FILE: &str = "instructors.json";
pub const SUBJECTS_FILE: &str = "subjects.json";

/// The four linked collections produced by one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub sections: Vec<Section>,
    pub courses: Vec<Course>,
    pub instructors: Vec<Instructor>,
    pub subjects: Vec<Subject>,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, output: &PipelineOutput);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _output: &PipelineOutput) {}
}

/// Run every stage in dependency order.
///
/// Subjects are built from the already-sorted course collection, so their
/// `courseIdxs` point at final course positions.
#[instrument(skip_all, fields(records = raw.len()))]
pub fn run(
    raw: &[RawSection],
    tables: &ReferenceTables,
    progress: &dyn ProgressReporter,
) -> Result<PipelineOutput> {
    let start = Instant::now();

    progress.phase("Normalizing sections");
    let sections = normalize_sections(raw, &tables.tags)?;

    progress.phase("Aggregating courses");
    let courses = build_courses(&sections);

    progress.phase("Aggregating instructors");
    let instructors = build_instructors(&sections);

    progress.phase("Aggregating subjects");
    let subjects = build_subjects(&courses, &tables.subjects);

    let output = PipelineOutput {
        sections,
        courses,
        instructors,
        subjects,
    };

    progress.done(&output);

    info!(
        sections = output.sections.len(),
        courses = output.courses.len(),
        instructors = output.instructors.len(),
        subjects = output.subjects.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "pipeline complete"
    );

    Ok(output)
}

/// Read a raw snapshot from `input` and run the pipeline over it.
pub fn run_file(
    input: &Path,
    tables: &ReferenceTables,
    progress: &dyn ProgressReporter,
) -> Result<PipelineOutput> {
    let raw: Vec<RawSection> = read_json(input)?;
    info!(path = %input.display(), records = raw.len(), "raw snapshot loaded");
    run(&raw, tables, progress)
}

/// Paths of the four snapshots written by [`write_outputs`].
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub sections: PathBuf,
    pub courses: PathBuf,
    pub instructors: PathBuf,
    pub subjects: PathBuf,
}

impl OutputPaths {
    /// Conventional file names under `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            sections: dir.join(SECTIONS_FILE),
            courses: dir.join(COURSES_FILE),
            instructors: dir.join(INSTRUCTORS_FILE),
            subjects: dir.join(SUBJECTS_FILE),
        }
    }
}

/// Write all four snapshots as indented JSON.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn write_outputs(output: &PipelineOutput, dir: &Path) -> Result<OutputPaths> {
    let paths = OutputPaths::in_dir(dir);

    write_json(&paths.sections, &output.sections)?;
    write_json(&paths.courses, &output.courses)?;
    write_json(&paths.instructors, &output.instructors)?;
    write_json(&paths.subjects, &output.subjects)?;

    info!(dir = %dir.display(), "snapshots written");
    Ok(paths)
}

/// Load the four snapshots previously written to `dir`.
pub fn read_outputs(dir: &Path) -> Result<PipelineOutput> {
    let paths = OutputPaths::in_dir(dir);
    Ok(PipelineOutput {
        sections: read_json(&paths.sections)?,
        courses: read_json(&paths.courses)?,
        instructors: read_json(&paths.instructors)?,
        subjects: read_json(&paths.subjects)?,
    })
}
