//! JSON snapshot I/O shared by every stage.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::debug;

use schedkit_shared::{Result, SchedKitError};

/// Indentation used for the per-stage snapshots.
const INDENT: &[u8] = b"    ";

/// Read and deserialize a JSON snapshot.
///
/// A path that does not exist is reported as [`SchedKitError::MissingFile`]
/// before anything is parsed.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(SchedKitError::MissingFile {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| SchedKitError::io(path, e))?;
    let value = serde_json::from_str(&content).map_err(|e| SchedKitError::json(path, &e))?;
    debug!(path = %path.display(), bytes = content.len(), "read JSON file");
    Ok(value)
}

/// Serialize with four-space indentation.
pub fn to_indented_json<T: Serialize>(data: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    data.serialize(&mut ser).map_err(|e| {
        SchedKitError::validation(format!("JSON serialization failed: {e}"))
    })?;
    Ok(buf)
}

/// Write an indented JSON snapshot.
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let bytes = to_indented_json(data)?;
    write_atomic(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote JSON file");
    Ok(())
}

/// Write to a sibling temp file, then rename over the target so readers
/// never observe a half-written snapshot.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SchedKitError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| SchedKitError::validation(format!("not a file path: {}", path.display())))?
        .to_string_lossy();
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, bytes).map_err(|e| SchedKitError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| SchedKitError::io(path, e))?;
    Ok(())
}
