//! Shared deterministic types for the analysis workflow.
//!
//! These types define stable contracts between core components. They should not
//! depend on external state or I/O and must remain deterministic across runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One generated candidate unit of executable code for a task attempt.
///
/// Produced fresh on every generation attempt. Discarded when the attempt
/// fails; appended to the cumulative code log only on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Free-form description of the problem and approach.
    pub prefix: String,
    /// Import statements and other setup.
    pub imports: String,
    /// Main body of the script, excluding imports.
    pub code: String,
}

impl Artifact {
    /// Render the artifact as a single runnable script.
    pub fn script(&self) -> String {
        format!("{}\n{}", self.imports, self.code)
    }
}

/// Diagnosis of a failed execution with a suggested fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    /// Description of the error encountered.
    pub error: String,
    /// Suggested fix or improvement for the next attempt.
    pub suggestion: String,
}

/// Plan produced by the planner collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOutput {
    /// Ordered list of task descriptions.
    pub steps: Vec<String>,
    /// Input file path -> description, when the request names data files.
    #[serde(default)]
    pub input_files: BTreeMap<String, String>,
}

/// Revised plan produced by the plan editor collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEdit {
    pub steps: Vec<String>,
}

/// Per-task record the retry controller maintains while a task is in flight.
///
/// `iterations` counts generation attempts for the current task text and is
/// reset to 0 when the cursor advances or an escalation rewrites the task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskAttempt {
    /// Active task text (may be rewritten once by escalation).
    pub task: String,
    /// Tool selected for this task, if any.
    pub tool: Option<String>,
    /// Generation attempts made for the current task text.
    pub iterations: u32,
}

impl TaskAttempt {
    pub fn new(task: String, tool: Option<String>) -> Self {
        Self {
            task,
            tool,
            iterations: 0,
        }
    }
}

/// One entry of the task-scoped context log.
///
/// The log is reset when the cursor advances and carried forward across
/// same-task retries and escalations so reflections and rewrites see the
/// full local history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub role: ContextRole,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextRole {
    Task,
    Failure,
    Reflection,
    Revision,
    Success,
}

impl ContextEntry {
    pub fn new(role: ContextRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Render context entries as a transcript block for prompt templates.
pub fn render_context(entries: &[ContextEntry]) -> String {
    let mut lines = Vec::with_capacity(entries.len());
    for entry in entries {
        let role = match entry.role {
            ContextRole::Task => "task",
            ContextRole::Failure => "failure",
            ContextRole::Reflection => "reflection",
            ContextRole::Revision => "revision",
            ContextRole::Success => "success",
        };
        lines.push(format!("[{role}] {}", entry.text));
    }
    lines.join("\n")
}
