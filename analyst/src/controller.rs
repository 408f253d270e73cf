//! Retry controller: drives one task through generate -> execute -> recover
//! cycles until it succeeds or the run must abort.
//!
//! Per task the machine moves GENERATE -> EXECUTE -> {ADVANCE | RETRY |
//! ESCALATE | FATAL}. Execution failures are absorbed here and converted into
//! forward progress: a reflection feeds the next attempt, and a task that
//! exhausts its budget is rewritten exactly once for the whole run. A second
//! exhaustion anywhere after that rewrite aborts with [`RetryExhaustion`].

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::agents::{Generator, coding, planning};
use crate::core::plan::Plan;
use crate::core::retry::{RetryDecision, decide};
use crate::core::types::{Artifact, ContextEntry, ContextRole, TaskAttempt, render_context};
use crate::io::lookup::DocLibrary;
use crate::io::prompt::{CodegenInputs, PromptEngine};
use crate::io::sandbox::Runner;

/// Escalation already spent and the revised task exhausted its budget too.
/// Unrecoverable; carries the full diagnostic context for inspection.
#[derive(Error, Debug)]
#[error("task '{task}' exhausted its retry budget after the one-shot revision")]
pub struct RetryExhaustion {
    /// Task text at the moment of the abort (the revised text).
    pub task: String,
    /// Last generated artifact.
    pub last_artifact: Artifact,
    /// Diagnostic from the last failed execution.
    pub last_diagnostic: String,
    /// Full task-scoped context log.
    pub context_log: Vec<ContextEntry>,
}

/// Read-only background the code generator sees: what already ran and what
/// the workflow inputs are.
#[derive(Debug, Clone, Default)]
pub struct TaskBackground<'a> {
    /// Cumulative code log of previously successful tasks.
    pub code_log: &'a str,
    /// Cumulative stdout of previously successful tasks.
    pub output_log: &'a str,
    /// Rendered input-file map for the whole workflow.
    pub input_files: &'a str,
}

/// Result of a task that reached ADVANCE.
#[derive(Debug, Clone)]
pub struct TaskSuccess {
    pub artifact: Artifact,
    pub stdout: String,
    /// Generation attempts spent on the final task text.
    pub iterations: u32,
}

/// The controller and its collaborators for one run.
pub struct RetryController<'a, G, R> {
    pub generator: &'a G,
    pub engine: &'a PromptEngine,
    pub runner: &'a R,
    pub docs: &'a DocLibrary,
    pub max_iterations: u32,
}

impl<'a, G: Generator, R: Runner> RetryController<'a, G, R> {
    /// Drive the task under the plan cursor to success or a terminal error.
    ///
    /// The context log is task-scoped: the caller resets it when the cursor
    /// advances, and this method appends to it across retries and the
    /// escalation so later prompts see the full local history. `replanned` is
    /// the run-lifetime escalation flag; it is set here, never cleared.
    #[instrument(skip_all, fields(cursor = plan.cursor()))]
    pub fn run_task(
        &self,
        plan: &mut Plan,
        replanned: &mut bool,
        tool: Option<&str>,
        background: &TaskBackground<'_>,
        context_log: &mut Vec<ContextEntry>,
    ) -> Result<TaskSuccess> {
        let task = plan.current()?.to_string();
        let mut attempt = TaskAttempt::new(task, tool.map(str::to_string));
        let tool_docs = attempt
            .tool
            .as_deref()
            .map(|t| self.docs.lookup(t))
            .unwrap_or_default();

        loop {
            // GENERATE
            let inputs = CodegenInputs {
                task: attempt.task.clone(),
                tool: attempt.tool.clone(),
                tool_docs: tool_docs.clone(),
                input_files: background.input_files.to_string(),
                previous_output: background.output_log.to_string(),
                context: render_context(context_log),
            };
            let artifact = coding::generate_artifact(self.generator, self.engine, &inputs)?;
            attempt.iterations += 1;
            debug_assert!(attempt.iterations <= self.max_iterations);
            debug!(iterations = attempt.iterations, "artifact generated");

            // EXECUTE
            let outcome = self.runner.run(&artifact);

            match decide(
                outcome.success,
                attempt.iterations,
                self.max_iterations,
                *replanned,
            ) {
                RetryDecision::Advance => {
                    info!(iterations = attempt.iterations, "task succeeded");
                    context_log.push(ContextEntry::new(
                        ContextRole::Success,
                        format!("Task completed: {}", attempt.task),
                    ));
                    return Ok(TaskSuccess {
                        artifact,
                        stdout: outcome.stdout,
                        iterations: attempt.iterations,
                    });
                }
                RetryDecision::Reflect => {
                    warn!(iterations = attempt.iterations, "execution failed, reflecting");
                    context_log.push(ContextEntry::new(
                        ContextRole::Failure,
                        outcome.diagnostic.clone(),
                    ));
                    let reflection = coding::reflect(
                        self.generator,
                        self.engine,
                        &artifact.script(),
                        &outcome.diagnostic,
                        background.code_log,
                        &render_context(context_log),
                    )?;
                    context_log.push(ContextEntry::new(
                        ContextRole::Reflection,
                        format!("{} Suggested fix: {}", reflection.error, reflection.suggestion),
                    ));
                }
                RetryDecision::Escalate => {
                    warn!(task = %attempt.task, "retry budget exhausted, revising the task");
                    context_log.push(ContextEntry::new(
                        ContextRole::Failure,
                        outcome.diagnostic.clone(),
                    ));
                    let revised = planning::revise_task(
                        self.generator,
                        self.engine,
                        &attempt.task,
                        &plan.render(),
                        &render_context(context_log),
                    )?;
                    plan.revise_current(revised.clone())?;
                    *replanned = true;
                    info!(revised = %revised, "task revised, budget reset");
                    context_log.push(ContextEntry::new(
                        ContextRole::Revision,
                        format!("Revised task: {revised}"),
                    ));
                    attempt.task = revised;
                    attempt.iterations = 0;
                }
                RetryDecision::Fatal => {
                    context_log.push(ContextEntry::new(
                        ContextRole::Failure,
                        outcome.diagnostic.clone(),
                    ));
                    warn!(task = %attempt.task, "retry budget exhausted after revision, aborting");
                    return Err(RetryExhaustion {
                        task: attempt.task,
                        last_artifact: artifact,
                        last_diagnostic: outcome.diagnostic,
                        context_log: context_log.clone(),
                    }
                    .into());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        PromptKind, ScriptedGenerator, ScriptedRunner, artifact_completion, reflection_completion,
    };

    fn engine() -> PromptEngine {
        PromptEngine::new()
    }

    fn docs() -> DocLibrary {
        DocLibrary::new("/nonexistent/docs")
    }

    fn plan_of(steps: &[&str]) -> Plan {
        let mut plan = Plan::default();
        plan.create(steps.iter().map(|s| s.to_string()).collect())
            .expect("create plan");
        plan
    }

    fn controller<'a>(
        generator: &'a ScriptedGenerator,
        engine: &'a PromptEngine,
        runner: &'a ScriptedRunner,
        docs: &'a DocLibrary,
    ) -> RetryController<'a, ScriptedGenerator, ScriptedRunner> {
        RetryController {
            generator,
            engine,
            runner,
            docs,
            max_iterations: 6,
        }
    }

    #[test]
    fn first_attempt_success_advances() {
        let generator = ScriptedGenerator::new();
        generator.push(
            PromptKind::Codegen,
            artifact_completion("load", "import csv", "print('rows')"),
        );
        let runner = ScriptedRunner::new();
        runner.push_success("rows loaded\n");
        let engine = engine();
        let docs = docs();
        let controller = controller(&generator, &engine, &runner, &docs);

        let mut plan = plan_of(&["load data", "normalize", "plot"]);
        let mut replanned = false;
        let mut context_log = Vec::new();

        let success = controller
            .run_task(
                &mut plan,
                &mut replanned,
                None,
                &TaskBackground::default(),
                &mut context_log,
            )
            .expect("task success");

        assert_eq!(success.iterations, 1);
        assert_eq!(success.stdout, "rows loaded\n");
        assert!(!replanned);
        assert_eq!(generator.calls(PromptKind::Codegen), 1);
        assert_eq!(generator.calls(PromptKind::Reflection), 0);
    }

    #[test]
    fn five_failures_then_success_never_escalates() {
        let generator = ScriptedGenerator::new();
        generator.push_n(
            PromptKind::Codegen,
            &artifact_completion("try", "", "print('x')"),
            6,
        );
        generator.push_n(
            PromptKind::Reflection,
            &reflection_completion("bad column", "use the header row"),
            5,
        );
        let runner = ScriptedRunner::new();
        runner.push_failures("KeyError: 'x'", 5);
        runner.push_success("done\n");
        let engine = engine();
        let docs = docs();
        let controller = controller(&generator, &engine, &runner, &docs);

        let mut plan = plan_of(&["normalize"]);
        let mut replanned = false;
        let mut context_log = Vec::new();

        let success = controller
            .run_task(
                &mut plan,
                &mut replanned,
                None,
                &TaskBackground::default(),
                &mut context_log,
            )
            .expect("task success");

        assert_eq!(success.iterations, 6);
        assert!(!replanned);
        assert_eq!(generator.calls(PromptKind::Codegen), 6);
        assert_eq!(generator.calls(PromptKind::Reflection), 5);
        assert_eq!(generator.calls(PromptKind::Revision), 0);
        assert_eq!(plan.steps(), &["normalize".to_string()]);
    }

    #[test]
    fn six_failures_escalate_once_and_reset_the_budget() {
        let generator = ScriptedGenerator::new();
        generator.push_n(
            PromptKind::Codegen,
            &artifact_completion("try", "", "print('x')"),
            7,
        );
        generator.push_n(
            PromptKind::Reflection,
            &reflection_completion("bad", "fix"),
            5,
        );
        generator.push(PromptKind::Revision, "Normalize using the raw counts file.");
        let runner = ScriptedRunner::new();
        runner.push_failures("boom", 6);
        runner.push_success("ok\n");
        let engine = engine();
        let docs = docs();
        let controller = controller(&generator, &engine, &runner, &docs);

        let mut plan = plan_of(&["load", "normalize"]);
        plan.advance().expect("advance");
        let mut replanned = false;
        let mut context_log = Vec::new();

        let success = controller
            .run_task(
                &mut plan,
                &mut replanned,
                None,
                &TaskBackground::default(),
                &mut context_log,
            )
            .expect("task success after revision");

        assert!(replanned);
        // Budget was reset on escalation: the revised task succeeded first try.
        assert_eq!(success.iterations, 1);
        assert_eq!(generator.calls(PromptKind::Revision), 1);
        assert_eq!(
            plan.steps()[1],
            "Normalize using the raw counts file.".to_string()
        );
        assert_eq!(plan.cursor(), 1);
        assert!(
            context_log
                .iter()
                .any(|e| e.role == ContextRole::Revision)
        );
    }

    #[test]
    fn exhaustion_after_revision_is_fatal() {
        let generator = ScriptedGenerator::new();
        generator.push_n(
            PromptKind::Codegen,
            &artifact_completion("try", "", "print('x')"),
            12,
        );
        generator.push_n(
            PromptKind::Reflection,
            &reflection_completion("bad", "fix"),
            10,
        );
        generator.push(PromptKind::Revision, "Try the simpler variant.");
        let runner = ScriptedRunner::new();
        runner.push_failures("always broken", 12);
        let engine = engine();
        let docs = docs();
        let controller = controller(&generator, &engine, &runner, &docs);

        let mut plan = plan_of(&["hopeless task"]);
        let mut replanned = false;
        let mut context_log = Vec::new();

        let err = controller
            .run_task(
                &mut plan,
                &mut replanned,
                None,
                &TaskBackground::default(),
                &mut context_log,
            )
            .expect_err("should abort");

        let exhaustion = err
            .downcast_ref::<RetryExhaustion>()
            .expect("retry exhaustion");
        assert_eq!(exhaustion.task, "Try the simpler variant.");
        assert_eq!(exhaustion.last_diagnostic, "always broken");
        assert!(!exhaustion.context_log.is_empty());
        // Exactly 12 generations: 6 for the original text, 6 for the revision.
        assert_eq!(generator.calls(PromptKind::Codegen), 12);
        assert_eq!(generator.calls(PromptKind::Revision), 1);
        assert!(replanned);
    }

    #[test]
    fn replanned_flag_from_an_earlier_task_makes_exhaustion_fatal_immediately() {
        let generator = ScriptedGenerator::new();
        generator.push_n(
            PromptKind::Codegen,
            &artifact_completion("try", "", "print('x')"),
            6,
        );
        generator.push_n(
            PromptKind::Reflection,
            &reflection_completion("bad", "fix"),
            5,
        );
        let runner = ScriptedRunner::new();
        runner.push_failures("broken", 6);
        let engine = engine();
        let docs = docs();
        let controller = controller(&generator, &engine, &runner, &docs);

        let mut plan = plan_of(&["second task"]);
        // The run already escalated on some earlier task.
        let mut replanned = true;
        let mut context_log = Vec::new();

        let err = controller
            .run_task(
                &mut plan,
                &mut replanned,
                None,
                &TaskBackground::default(),
                &mut context_log,
            )
            .expect_err("should abort");

        assert!(err.downcast_ref::<RetryExhaustion>().is_some());
        assert_eq!(generator.calls(PromptKind::Revision), 0);
        // No rewrite happened: the task text is unchanged.
        assert_eq!(plan.steps(), &["second task".to_string()]);
    }

    #[test]
    fn failed_artifacts_are_not_persisted_anywhere() {
        let generator = ScriptedGenerator::new();
        generator.push(
            PromptKind::Codegen,
            artifact_completion("bad", "", "explode()"),
        );
        generator.push(
            PromptKind::Codegen,
            artifact_completion("good", "", "print('ok')"),
        );
        generator.push(PromptKind::Reflection, reflection_completion("bad", "fix"));
        let runner = ScriptedRunner::new();
        runner.push_failure("NameError");
        runner.push_success("ok\n");
        let engine = engine();
        let docs = docs();
        let controller = controller(&generator, &engine, &runner, &docs);

        let mut plan = plan_of(&["task"]);
        let mut replanned = false;
        let mut context_log = Vec::new();

        let success = controller
            .run_task(
                &mut plan,
                &mut replanned,
                None,
                &TaskBackground::default(),
                &mut context_log,
            )
            .expect("success");

        // Only the successful artifact comes back; the failed one survives
        // solely as diagnostic text in the context log.
        assert_eq!(success.artifact.prefix, "good");
        assert!(
            context_log
                .iter()
                .any(|e| e.role == ContextRole::Failure && e.text.contains("NameError"))
        );
    }
}
