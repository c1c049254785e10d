//! Subject aggregator: courses grouped by subject code.

use tracing::{info, instrument};

use schedkit_shared::{Course, Subject};

use crate::aggregate::{self, Aggregate};
use crate::reference::SubjectTable;

impl Aggregate for Subject {
    type Item = Course;
    type Key = String;
    type Context = SubjectTable;

    fn key(course: &Course) -> String {
        course.subject.clone()
    }

    fn seed(course: &Course, idx: usize, table: &SubjectTable) -> Self {
        Subject {
            subject: course.subject.clone(),
            title: table.resolve(&course.subject),
            course_idxs: vec![idx],
        }
    }

    fn merge(&mut self, _course: &Course, idx: usize) {
        self.course_idxs.push(idx);
    }
}

/// Group courses by subject code, sorted by code.
///
/// `courses` must be the final, sorted course collection: `courseIdxs` are
/// positions into it.
#[instrument(skip_all, fields(courses = courses.len()))]
pub fn build_subjects(courses: &[Course], table: &SubjectTable) -> Vec<Subject> {
    let subjects: Vec<Subject> = aggregate::aggregate(courses, table);
    let unknown = subjects.iter().filter(|s| !table.contains(&s.subject)).count();
    info!(subjects = subjects.len(), unknown, "subjects aggregated");
    subjects
}
