//! Course aggregator: sections grouped by `(subject, course)`.

use tracing::{info, instrument};

use schedkit_shared::{Course, Section};

use crate::aggregate::{self, Aggregate};

impl Aggregate for Course {
    type Item = Section;
    type Key = (String, u32);
    type Context = ();

    fn key(section: &Section) -> Self::Key {
        (section.subject.clone(), section.course)
    }

    fn seed(section: &Section, idx: usize, _ctx: &()) -> Self {
        Course {
            subject: section.subject.clone(),
            course: section.course,
            cr: section.cr,
            tags: section.tags.clone(),
            description: section.description.clone(),
            title: section.title.clone(),
            section_idxs: vec![idx],
        }
    }

    fn merge(&mut self, section: &Section, idx: usize) {
        self.cr[0] = self.cr[0].min(section.cr[0]);
        self.cr[1] = self.cr[1].max(section.cr[1]);

        for tag in &section.tags {
            if !self.tags.contains(tag) {
                self.tags.push(tag.clone());
            }
        }

        self.section_idxs.push(idx);
    }
}

/// Group normalized sections into courses, sorted by `(subject, course)`.
///
/// `sections` must already be in canonical (crn) order.
#[instrument(skip_all, fields(sections = sections.len()))]
pub fn build_courses(sections: &[Section]) -> Vec<Course> {
    let courses: Vec<Course> = aggregate::aggregate(sections, &());
    info!(courses = courses.len(), "courses aggregated");
    courses
}
