//! Session persistence (`.analyst/session.json`).
//!
//! These are the only fields that survive across separate invocations of the
//! workflow: the plan and cursor, the cumulative code and output logs, the
//! conversation transcript, and the run-lifetime replanned flag.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::plan::Plan;

/// One conversation turn visible to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// Persisted workflow state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Plan and cursor, owned by the plan store operations.
    pub plan: Plan,
    /// Input file path -> description, extracted by the planner.
    pub input_files: BTreeMap<String, String>,
    /// Append-only log of every successfully executed artifact, in task order.
    pub code_log: String,
    /// Append-only log of stdout from every successful task, in task order.
    pub output_log: String,
    /// Conversation transcript across requests.
    pub transcript: Vec<Turn>,
    /// Set permanently once any task escalates; never reset within a session.
    pub replanned: bool,
}

impl Session {
    pub fn record(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.transcript.push(Turn {
            speaker,
            text: text.into(),
        });
    }

    /// Render the transcript for prompt context.
    pub fn transcript_text(&self) -> String {
        let mut lines = Vec::with_capacity(self.transcript.len());
        for turn in &self.transcript {
            let speaker = match turn.speaker {
                Speaker::User => "user",
                Speaker::Assistant => "assistant",
            };
            lines.push(format!("{speaker}: {}", turn.text));
        }
        lines.join("\n")
    }
}

/// Load session state from disk. Missing file means a fresh session.
pub fn load_session(path: &Path) -> Result<Session> {
    if !path.exists() {
        return Ok(Session::default());
    }
    debug!(path = %path.display(), "loading session");
    let contents =
        fs::read_to_string(path).with_context(|| format!("read session {}", path.display()))?;
    let session: Session = serde_json::from_str(&contents)
        .with_context(|| format!("parse session {}", path.display()))?;
    Ok(session)
}

/// Atomically write session state to disk (temp file + rename).
pub fn write_session(path: &Path, session: &Session) -> Result<()> {
    debug!(path = %path.display(), cursor = session.plan.cursor(), "writing session");
    let mut buf = serde_json::to_string_pretty(session)?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("session path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &buf)
        .with_context(|| format!("write temp session {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace session {}", path.display()))?;
    Ok(())
}
