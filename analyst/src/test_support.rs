//! Test-only scripted collaborators.
//!
//! Scripted doubles route on the first heading of the rendered prompt, so a
//! test declares what each collaborator should answer without caring about
//! call interleaving.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::{Result, anyhow};

use crate::agents::{GenRequest, Generator};
use crate::core::types::Artifact;
use crate::io::sandbox::{ExecutionOutcome, Runner};

/// Serialize an artifact the way the generation backend would emit it.
pub fn artifact_completion(prefix: &str, imports: &str, code: &str) -> String {
    serde_json::to_string(&Artifact {
        prefix: prefix.to_string(),
        imports: imports.to_string(),
        code: code.to_string(),
    })
    .expect("serialize artifact")
}

/// Serialize a reflection completion.
pub fn reflection_completion(error: &str, suggestion: &str) -> String {
    format!(r#"{{"error": {error:?}, "suggestion": {suggestion:?}}}"#)
}

/// Prompt kinds a scripted generator can answer, keyed by template heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Route,
    FrontDesk,
    Plan,
    PlanEdit,
    Codegen,
    Reflection,
    Revision,
    Report,
}

impl PromptKind {
    fn of(prompt: &str) -> Option<Self> {
        let heading = prompt.lines().next().unwrap_or_default();
        match heading {
            "# Routing" => Some(Self::Route),
            "# Front desk" => Some(Self::FrontDesk),
            "# Planning" => Some(Self::Plan),
            "# Plan editing" => Some(Self::PlanEdit),
            "# Code generation" => Some(Self::Codegen),
            "# Reflection" => Some(Self::Reflection),
            "# Task revision" => Some(Self::Revision),
            "# Reporting" => Some(Self::Report),
            _ => None,
        }
    }
}

/// Generator that answers from per-kind queues of canned completions.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    queues: RefCell<std::collections::HashMap<PromptKind, VecDeque<String>>>,
    prompts: RefCell<Vec<(PromptKind, String)>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, kind: PromptKind, completion: impl Into<String>) -> &Self {
        self.queues
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push_back(completion.into());
        self
    }

    /// Push `n` identical completions.
    pub fn push_n(&self, kind: PromptKind, completion: &str, n: usize) -> &Self {
        for _ in 0..n {
            self.push(kind, completion);
        }
        self
    }

    /// Prompts seen so far, in call order.
    pub fn seen(&self) -> Vec<(PromptKind, String)> {
        self.prompts.borrow().clone()
    }

    /// Number of generation calls of the given kind.
    pub fn calls(&self, kind: PromptKind) -> usize {
        self.prompts.borrow().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, request: &GenRequest) -> Result<String> {
        let kind = PromptKind::of(&request.prompt)
            .ok_or_else(|| anyhow!("unscripted prompt heading: {:?}", request.prompt.lines().next()))?;
        self.prompts
            .borrow_mut()
            .push((kind, request.prompt.clone()));
        self.queues
            .borrow_mut()
            .get_mut(&kind)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| anyhow!("no scripted completion left for {kind:?}"))
    }
}

/// Runner that returns canned outcomes without touching a sandbox.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    outcomes: RefCell<VecDeque<ExecutionOutcome>>,
    runs: RefCell<Vec<Artifact>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_success(&self, stdout: &str) -> &Self {
        self.outcomes.borrow_mut().push_back(ExecutionOutcome {
            success: true,
            stdout: stdout.to_string(),
            diagnostic: String::new(),
        });
        self
    }

    pub fn push_failure(&self, diagnostic: &str) -> &Self {
        self.outcomes.borrow_mut().push_back(ExecutionOutcome {
            success: false,
            stdout: String::new(),
            diagnostic: diagnostic.to_string(),
        });
        self
    }

    pub fn push_failures(&self, diagnostic: &str, n: usize) -> &Self {
        for _ in 0..n {
            self.push_failure(diagnostic);
        }
        self
    }

    /// Artifacts executed so far, in call order.
    pub fn executed(&self) -> Vec<Artifact> {
        self.runs.borrow().clone()
    }
}

impl Runner for ScriptedRunner {
    fn run(&self, artifact: &Artifact) -> ExecutionOutcome {
        self.runs.borrow_mut().push(artifact.clone());
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| ExecutionOutcome {
                success: false,
                stdout: String::new(),
                diagnostic: "no scripted outcome left".to_string(),
            })
    }
}
