//! Cross-reference checks over a finished set of snapshots.
//!
//! Verifies that sort orders hold, dedup keys are unique, and every
//! back-reference array partitions its upstream collection.

use tracing::{debug, instrument};

use schedkit_shared::{Result, SchedKitError};

use crate::pipeline::PipelineOutput;

/// Check every cross-collection invariant of `output`.
#[instrument(skip_all, fields(
    sections = output.sections.len(),
    courses = output.courses.len(),
))]
pub fn validate_output(output: &PipelineOutput) -> Result<()> {
    let sections = &output.sections;
    let courses = &output.courses;

    if let Some(w) = sections.windows(2).find(|w| w[0].crn >= w[1].crn) {
        return Err(SchedKitError::validation(format!(
            "sections not strictly ascending by crn at {} -> {}",
            w[0].crn, w[1].crn
        )));
    }

    // Courses
    if let Some(w) = courses
        .windows(2)
        .find(|w| (&w[0].subject, w[0].course) >= (&w[1].subject, w[1].course))
    {
        return Err(SchedKitError::validation(format!(
            "courses not strictly sorted at {} {}",
            w[1].subject, w[1].course
        )));
    }
    check_partition(
        "course",
        "section",
        courses.iter().map(|c| c.section_idxs.as_slice()),
        sections.len(),
    )?;
    for course in courses {
        let members = course.section_idxs.iter().map(|&i| &sections[i]);
        let mut cr = [f64::INFINITY, f64::NEG_INFINITY];
        for section in members {
            if section.subject != course.subject || section.course != course.course {
                return Err(SchedKitError::validation(format!(
                    "course {} {} references section crn {} of {} {}",
                    course.subject, course.course, section.crn, section.subject, section.course
                )));
            }
            cr[0] = cr[0].min(section.cr[0]);
            cr[1] = cr[1].max(section.cr[1]);
        }
        if course.cr != cr || course.cr[0] > course.cr[1] {
            return Err(SchedKitError::validation(format!(
                "course {} {} credit range {:?} does not match its sections ({:?})",
                course.subject, course.course, course.cr, cr
            )));
        }
    }

    // Instructors
    let instructors = &output.instructors;
    if let Some(w) = instructors.windows(2).find(|w| w[0].name >= w[1].name) {
        return Err(SchedKitError::validation(format!(
            "instructors not strictly sorted at {:?}",
            w[1].name
        )));
    }
    check_partition(
        "instructor",
        "section",
        instructors.iter().map(|i| i.section_idxs.as_slice()),
        sections.len(),
    )?;
    for instructor in instructors {
        if let Some(&i) = instructor
            .section_idxs
            .iter()
            .find(|&&i| sections[i].instructor != instructor.name)
        {
            return Err(SchedKitError::validation(format!(
                "instructor {:?} references section crn {} taught by {:?}",
                instructor.name, sections[i].crn, sections[i].instructor
            )));
        }
    }

    // Subjects
    let subjects = &output.subjects;
    if let Some(w) = subjects.windows(2).find(|w| w[0].subject >= w[1].subject) {
        return Err(SchedKitError::validation(format!(
            "subjects not strictly sorted at {}",
            w[1].subject
        )));
    }
    check_partition(
        "subject",
        "course",
        subjects.iter().map(|s| s.course_idxs.as_slice()),
        courses.len(),
    )?;
    for subject in subjects {
        if let Some(&i) = subject
            .course_idxs
            .iter()
            .find(|&&i| courses[i].subject != subject.subject)
        {
            return Err(SchedKitError::validation(format!(
                "subject {} references course {} {}",
                subject.subject, courses[i].subject, courses[i].course
            )));
        }
    }

    debug!("snapshot cross-references valid");
    Ok(())
}

/// Every upstream position must appear exactly once across all lists.
fn check_partition<'a>(
    kind: &str,
    upstream: &str,
    lists: impl Iterator<Item = &'a [usize]>,
    upstream_len: usize,
) -> Result<()> {
    let mut seen = vec![false; upstream_len];

    for idxs in lists {
        for &idx in idxs {
            match seen.get_mut(idx) {
                None => {
                    return Err(SchedKitError::validation(format!(
                        "{kind} references {upstream} index {idx} out of range (len {upstream_len})"
                    )));
                }
                Some(true) => {
                    return Err(SchedKitError::validation(format!(
                        "{upstream} index {idx} referenced more than once by {kind}s"
                    )));
                }
                Some(slot) => *slot = true,
            }
        }
    }

    if let Some(missing) = seen.iter().position(|s| !s) {
        return Err(SchedKitError::validation(format!(
            "{upstream} index {missing} not referenced by any {kind}"
        )));
    }

    Ok(())
}
