//! Core domain types for schedule snapshots.
//!
//! Field names follow the on-disk JSON format consumed by the schedule
//! client, so back-reference arrays stay camelCase (`sectionIdxs`).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RawSection
// ---------------------------------------------------------------------------

/// Credit hours as scraped: either an explicit `[min, max]` pair or a single
/// cell value such as `"3"` or `"1-3"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCredits {
    Pair(Vec<String>),
    Text(String),
}

/// One scraped schedule row. Every scalar is still text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSection {
    pub crn: String,
    pub subject: String,
    pub course: String,
    #[serde(default)]
    pub section: String,
    pub cr: RawCredits,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub session: String,
    #[serde(default)]
    pub days: Vec<String>,
    /// `(start, end)` pairs in the site's numeric clock encoding (`"0800"`).
    #[serde(default)]
    pub times: Vec<Vec<String>>,
    /// `(building, room)` pairs.
    #[serde(default)]
    pub places: Vec<Vec<String>>,
    #[serde(default)]
    pub instructor: String,
    /// `(enrolled, capacity)`.
    pub cap: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tag
// ---------------------------------------------------------------------------

/// A requirement tag, serialized as `["HU", "Humanities Elective"]`.
///
/// Ordering compares the code first, so sorted tag lists are sorted by code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag(pub String, pub String);

impl Tag {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self(code.into(), label.into())
    }

    /// Requirement code, e.g. `HU`.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Human-readable label, e.g. `Humanities Elective`.
    pub fn label(&self) -> &str {
        &self.1
    }
}

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// A normalized, typed schedule section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Course reference number; unique across a snapshot.
    pub crn: u32,
    pub subject: String,
    pub course: u32,
    pub section: String,
    /// `[enrolled, capacity]`.
    pub cap: [u32; 2],
    /// `[min, max]` credit hours, `min <= max`.
    pub cr: [f64; 2],
    pub tags: Vec<Tag>,
    pub times: Vec<[u32; 2]>,
    pub title: String,
    pub description: String,
    pub note: String,
    pub session: String,
    pub days: Vec<String>,
    pub places: Vec<Vec<String>>,
    /// Empty string when the schedule lists no instructor.
    pub instructor: String,
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// All sections sharing one `(subject, course)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub subject: String,
    pub course: u32,
    /// Elementwise min/max of the member sections' credit ranges.
    pub cr: [f64; 2],
    /// Union of member tags in first-seen order.
    pub tags: Vec<Tag>,
    pub description: String,
    pub title: String,
    /// Positions into the sections collection, in encounter order.
    #[serde(rename = "sectionIdxs")]
    pub section_idxs: Vec<usize>,
}

/// All sections taught by one instructor name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub name: String,
    #[serde(rename = "sectionIdxs")]
    pub section_idxs: Vec<usize>,
}

/// All courses sharing one subject code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub subject: String,
    pub title: String,
    /// Positions into the (sorted) courses collection.
    #[serde(rename = "courseIdxs")]
    pub course_idxs: Vec<usize>,
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// The four collections stitched together with a generation timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub sections: Vec<Section>,
    pub courses: Vec<Course>,
    pub subjects: Vec<Subject>,
    pub instructors: Vec<Instructor>,
    /// Epoch seconds at assembly time.
    pub timestamp: f64,
}
