//! Instructor aggregator: sections grouped by instructor name.

use tracing::{info, instrument};

use schedkit_shared::{Instructor, Section};

use crate::aggregate::{self, Aggregate};

impl Aggregate for Instructor {
    type Item = Section;
    type Key = String;
    type Context = ();

    fn key(section: &Section) -> String {
        section.instructor.clone()
    }

    fn seed(section: &Section, idx: usize, _ctx: &()) -> Self {
        Instructor {
            name: section.instructor.clone(),
            section_idxs: vec![idx],
        }
    }

    fn merge(&mut self, _section: &Section, idx: usize) {
        self.section_idxs.push(idx);
    }
}

/// Group normalized sections by instructor name, sorted by name.
///
/// Sections with no listed instructor collect under the empty name, which
/// sorts first.
#[instrument(skip_all, fields(sections = sections.len()))]
pub fn build_instructors(sections: &[Section]) -> Vec<Instructor> {
    let instructors: Vec<Instructor> = aggregate::aggregate(sections, &());
    info!(instructors = instructors.len(), "instructors aggregated");
    instructors
}
