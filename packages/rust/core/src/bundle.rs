//! Bundle assembler.
//!
//! Stitches the four snapshots into one compact JSON document with the
//! generation timestamp, and reports a checksum of what was written.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use schedkit_shared::{Bundle, Result, SchedKitError};

use crate::output::{read_json, write_atomic};
use crate::pipeline::{OutputPaths, PipelineOutput};

/// Metadata for a written bundle file.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BundleMeta {
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: usize,
    pub timestamp: f64,
}

/// Epoch seconds with microsecond precision.
pub fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

/// Combine the four collections with a timestamp.
pub fn assemble(output: PipelineOutput, timestamp: f64) -> Bundle {
    Bundle {
        sections: output.sections,
        courses: output.courses,
        subjects: output.subjects,
        instructors: output.instructors,
        timestamp,
    }
}

/// Write a bundle as compact JSON.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_bundle(bundle: &Bundle, path: &Path) -> Result<BundleMeta> {
    let bytes = serde_json::to_vec(bundle)
        .map_err(|e| SchedKitError::validation(format!("JSON serialization failed: {e}")))?;
    write_atomic(path, &bytes)?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let meta = BundleMeta {
        path: path.to_path_buf(),
        sha256: format!("{:x}", hasher.finalize()),
        size_bytes: bytes.len(),
        timestamp: bundle.timestamp,
    };

    info!(
        sections = bundle.sections.len(),
        courses = bundle.courses.len(),
        subjects = bundle.subjects.len(),
        instructors = bundle.instructors.len(),
        size = meta.size_bytes,
        "bundle written"
    );

    Ok(meta)
}

/// Read four snapshot files, stamp them with the current time, and write
/// the bundle to `out`.
pub fn bundle_files(inputs: &OutputPaths, out: &Path) -> Result<BundleMeta> {
    let output = PipelineOutput {
        sections: read_json(&inputs.sections)?,
        courses: read_json(&inputs.courses)?,
        instructors: read_json(&inputs.instructors)?,
        subjects: read_json(&inputs.subjects)?,
    };

    let bundle = assemble(output, epoch_seconds(Utc::now()));
    write_bundle(&bundle, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{SilentProgress, run, write_outputs};
    use crate::reference::ReferenceTables;
    use chrono::TimeZone;
    use schedkit_shared::{RawCredits, RawSection};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("schedkit-bundle-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn output() -> PipelineOutput {
        let raw = vec![RawSection {
            crn: "10001".into(),
            subject: "BIO".into(),
            course: "1010".into(),
            section: "01".into(),
            cr: RawCredits::Text("4".into()),
            title: "Biological Discovery 1".into(),
            description: String::new(),
            note: String::new(),
            session: String::new(),
            days: vec![],
            times: vec![],
            places: vec![],
            instructor: String::new(),
            cap: vec!["40".into(), "48".into()],
        }];
        run(&raw, &ReferenceTables::default(), &SilentProgress).unwrap()
    }

    #[test]
    fn epoch_seconds_keeps_fraction() {
        let at = Utc.timestamp_opt(1_600_000_000, 250_000_000).unwrap();
        assert_eq!(epoch_seconds(at), 1_600_000_000.25);
    }

    #[test]
    fn bundle_is_compact_with_fixed_key_order() {
        let tmp = temp_dir();
        let path = tmp.join("final.json");
        let bundle = assemble(output(), 1_600_000_000.0);

        let meta = write_bundle(&bundle, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert!(!text.contains('\n'));
        let order: Vec<usize> = ["\"sections\"", "\"courses\"", "\"subjects\"", "\"instructors\"", "\"timestamp\""]
            .iter()
            .map(|k| text.find(k).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert!(text.ends_with("\"timestamp\":1600000000.0}"));

        assert_eq!(meta.sha256.len(), 64);
        assert_eq!(meta.size_bytes, text.len());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn bundles_snapshot_files() {
        let tmp = temp_dir();
        let snapshot = output();
        let paths = write_outputs(&snapshot, &tmp).unwrap();

        let before = epoch_seconds(Utc::now());
        let meta = bundle_files(&paths, &tmp.join("final.json")).unwrap();
        assert!(meta.timestamp >= before);

        let bundle: Bundle = read_json(&meta.path).unwrap();
        assert_eq!(bundle.sections, snapshot.sections);
        assert_eq!(bundle.subjects[0].title, "Biology");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_snapshot_fails_before_writing() {
        let tmp = temp_dir();
        let paths = OutputPaths::in_dir(&tmp);
        let out = tmp.join("final.json");

        let err = bundle_files(&paths, &out).unwrap_err();
        assert!(matches!(err, SchedKitError::MissingFile { .. }));
        assert!(!out.exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
