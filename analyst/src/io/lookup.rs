//! Reference documentation lookup for tools.
//!
//! Tool docs live as plain text files named `<tool>.txt` under the configured
//! docs directory. Lookup is read-only and absence is not an error: callers
//! get an empty string and prompt sections simply drop out.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

/// Read-only library of tool reference text.
#[derive(Debug, Clone)]
pub struct DocLibrary {
    dir: PathBuf,
}

impl DocLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Reference text for a tool, or `""` when no document exists.
    pub fn lookup(&self, tool_id: &str) -> String {
        let path = self.dir.join(format!("{tool_id}.txt"));
        match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(_) => {
                debug!(tool_id, path = %path.display(), "no reference document");
                String::new()
            }
        }
    }
}
