use anyhow::{anyhow, Result};
use std::path::Path;

/// Reads a whole file into a string. `kind` describes the file in the error
/// message (e.g. "project").
pub fn read_to_string(path: &Path, kind: &str) -> Result<String> {
    match std::fs::read_to_string(path) {
        Err(e) => Err(anyhow!("Reading {} file `{}`: {}", kind, path.display(), e)),
        Ok(contents) => Ok(contents),
    }
}
