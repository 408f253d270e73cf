//! Plan store: the ordered task sequence and its cursor.
//!
//! The plan is the unit of work for a run. It is mutated either wholesale
//! (create/edit) or at a single position (revise_current during escalation).
//! The cursor only moves forward, by exactly one completed task at a time.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Operation on an empty or out-of-range plan. Fatal precondition violation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanStateError {
    #[error("plan is empty")]
    Empty,
    #[error("cursor {cursor} out of range for plan of {len} tasks")]
    CursorOutOfRange { cursor: usize, len: usize },
}

/// Ordered task descriptions plus the index of the task currently attempted.
///
/// Invariant: `cursor <= steps.len()` at all times.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    steps: Vec<String>,
    cursor: usize,
}

impl Plan {
    /// Replace the plan wholesale and rewind the cursor to the first task.
    pub fn create(&mut self, steps: Vec<String>) -> Result<(), PlanStateError> {
        if steps.is_empty() {
            return Err(PlanStateError::Empty);
        }
        self.steps = steps;
        self.cursor = 0;
        Ok(())
    }

    /// Replace the plan wholesale without touching the cursor.
    ///
    /// Only valid before execution has started advancing through the plan.
    pub fn edit(&mut self, revised_steps: Vec<String>) -> Result<(), PlanStateError> {
        if revised_steps.is_empty() {
            return Err(PlanStateError::Empty);
        }
        if self.cursor > revised_steps.len() {
            return Err(PlanStateError::CursorOutOfRange {
                cursor: self.cursor,
                len: revised_steps.len(),
            });
        }
        self.steps = revised_steps;
        Ok(())
    }

    /// Task under the cursor.
    pub fn current(&self) -> Result<&str, PlanStateError> {
        if self.steps.is_empty() {
            return Err(PlanStateError::Empty);
        }
        self.steps
            .get(self.cursor)
            .map(String::as_str)
            .ok_or(PlanStateError::CursorOutOfRange {
                cursor: self.cursor,
                len: self.steps.len(),
            })
    }

    /// Move the cursor forward by exactly one task.
    pub fn advance(&mut self) -> Result<(), PlanStateError> {
        if self.steps.is_empty() {
            return Err(PlanStateError::Empty);
        }
        if self.cursor + 1 > self.steps.len() {
            return Err(PlanStateError::CursorOutOfRange {
                cursor: self.cursor + 1,
                len: self.steps.len(),
            });
        }
        self.cursor += 1;
        Ok(())
    }

    /// Rewrite the task under the cursor in place. The cursor does not move.
    pub fn revise_current(&mut self, new_text: String) -> Result<(), PlanStateError> {
        if self.steps.is_empty() {
            return Err(PlanStateError::Empty);
        }
        let len = self.steps.len();
        let slot = self
            .steps
            .get_mut(self.cursor)
            .ok_or(PlanStateError::CursorOutOfRange {
                cursor: self.cursor,
                len,
            })?;
        *slot = new_text;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// True when the cursor sits on the last valid task index.
    pub fn is_last_task(&self) -> bool {
        !self.steps.is_empty() && self.cursor == self.steps.len() - 1
    }

    /// One-line-per-step rendering with the cursor marked.
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.steps.len());
        for (idx, step) in self.steps.iter().enumerate() {
            let marker = if idx == self.cursor { ">" } else { " " };
            lines.push(format!("{marker} {}. {step}", idx + 1));
        }
        lines.join("\n")
    }
}
