//! Static reference tables: requirement tags and subject titles.
//!
//! Both tables are data, not code. The built-in versions are embedded from
//! `data/*.toml`; a config file may point at replacement files with the same
//! schema.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use schedkit_shared::{Result, SchedKitError, TablesConfig, Tag};

const BUILTIN_TAGS: &str = include_str!("../data/tags.toml");
const BUILTIN_SUBJECTS: &str = include_str!("../data/subjects.toml");

// ---------------------------------------------------------------------------
// File schema
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TagFile {
    #[serde(default)]
    tag: Vec<TagRow>,
}

#[derive(Debug, Deserialize)]
struct TagRow {
    code: String,
    label: String,
}

#[derive(Debug, Deserialize)]
struct SubjectFile {
    #[serde(default)]
    subject: Vec<SubjectRow>,
}

#[derive(Debug, Deserialize)]
struct SubjectRow {
    code: String,
    title: String,
}

// ---------------------------------------------------------------------------
// TagTable
// ---------------------------------------------------------------------------

/// Controlled vocabulary of requirement codes, keyed by upper-case code.
#[derive(Debug, Clone)]
pub struct TagTable {
    by_code: HashMap<String, Tag>,
}

impl TagTable {
    /// Parse a tag table from TOML text.
    pub fn from_toml(source: &str) -> Result<Self> {
        let file: TagFile = toml::from_str(source)
            .map_err(|e| SchedKitError::config(format!("invalid tag table: {e}")))?;

        let mut by_code = HashMap::with_capacity(file.tag.len());
        for row in file.tag {
            let code = row.code.to_uppercase();
            if by_code.contains_key(&code) {
                return Err(SchedKitError::config(format!(
                    "duplicate tag code '{code}' in tag table"
                )));
            }
            by_code.insert(code.clone(), Tag::new(code, row.label));
        }

        Ok(Self { by_code })
    }

    /// Exact lookup of an upper-case code.
    pub fn get(&self, code: &str) -> Option<&Tag> {
        self.by_code.get(code)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

impl Default for TagTable {
    fn default() -> Self {
        Self::from_toml(BUILTIN_TAGS).expect("built-in tag table is valid")
    }
}

// ---------------------------------------------------------------------------
// SubjectTable
// ---------------------------------------------------------------------------

/// Subject code → display title.
#[derive(Debug, Clone)]
pub struct SubjectTable {
    titles: HashMap<String, String>,
}

impl SubjectTable {
    /// Parse a subject table from TOML text.
    pub fn from_toml(source: &str) -> Result<Self> {
        let file: SubjectFile = toml::from_str(source)
            .map_err(|e| SchedKitError::config(format!("invalid subject table: {e}")))?;

        let mut seen = HashSet::with_capacity(file.subject.len());
        let mut titles = HashMap::with_capacity(file.subject.len());
        for row in file.subject {
            if !seen.insert(row.code.clone()) {
                return Err(SchedKitError::config(format!(
                    "duplicate subject code '{}' in subject table",
                    row.code
                )));
            }
            titles.insert(row.code, row.title);
        }

        Ok(Self { titles })
    }

    /// Title for `code`, or `code` itself when the table has no entry.
    pub fn resolve(&self, code: &str) -> String {
        match self.titles.get(code) {
            Some(title) => title.clone(),
            None => {
                debug!(code, "unknown subject code, using code as title");
                code.to_string()
            }
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.titles.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

impl Default for SubjectTable {
    fn default() -> Self {
        Self::from_toml(BUILTIN_SUBJECTS).expect("built-in subject table is valid")
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Both reference tables, as used by one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub tags: TagTable,
    pub subjects: SubjectTable,
}

impl ReferenceTables {
    /// Load tables, honoring any override paths from config.
    pub fn load(config: &TablesConfig) -> Result<Self> {
        let tags = match &config.tags_path {
            Some(path) => TagTable::from_toml(&read_table(Path::new(path))?)?,
            None => TagTable::default(),
        };
        let subjects = match &config.subjects_path {
            Some(path) => SubjectTable::from_toml(&read_table(Path::new(path))?)?,
            None => SubjectTable::default(),
        };

        debug!(
            tags = tags.len(),
            subjects = subjects.len(),
            "reference tables loaded"
        );

        Ok(Self { tags, subjects })
    }
}

fn read_table(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(SchedKitError::config(format!(
            "table file not found: {}",
            path.display()
        )));
    }
    std::fs::read_to_string(path).map_err(|e| SchedKitError::io(path, e))
}
