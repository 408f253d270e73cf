//! Request orchestration: route a request, act on the plan, run the analysis
//! loop, and finalize through the reporter.
//!
//! The session is the single shared state record. Each component receives the
//! fields it needs and returns only what it changed; this module is the sole
//! writer that merges those results back into the session.

use std::collections::BTreeMap;

use anyhow::Result;
use tracing::{info, instrument};

use crate::agents::{Generator, conductor, frontdesk, planning, reporter};
use crate::controller::{RetryController, TaskBackground};
use crate::core::resolver::select_tool;
use crate::core::router::{Route, resolve_route};
use crate::core::types::{ContextEntry, ContextRole};
use crate::io::lookup::DocLibrary;
use crate::io::prompt::PromptEngine;
use crate::io::sandbox::Runner;
use crate::io::session::{Session, Speaker};

/// What a handled request produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Conversational front-desk answer.
    Chat(String),
    /// A new or revised plan, rendered for display.
    Plan(String),
    /// Final report after the whole plan executed.
    Report(String),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Chat(text) | Reply::Plan(text) | Reply::Report(text) => text,
        }
    }
}

/// Everything a request handler needs besides the session.
pub struct Workflow<'a, G, R> {
    pub generator: &'a G,
    pub engine: &'a PromptEngine,
    pub runner: &'a R,
    pub docs: &'a DocLibrary,
    /// Catalog of available tools: name -> description.
    pub tools: &'a BTreeMap<String, String>,
    pub max_iterations: u32,
}

impl<'a, G: Generator, R: Runner> Workflow<'a, G, R> {
    /// Handle one request end to end and record the exchange in the session.
    #[instrument(skip_all)]
    pub fn handle_request(&self, session: &mut Session, request: &str) -> Result<Reply> {
        // Classify against the history as it stood before this request.
        let transcript = session.transcript_text();
        let route = conductor::classify(self.generator, self.engine, request, &transcript)?;
        let route = resolve_route(route, session.plan.is_empty());
        info!(route = route.as_str(), "request routed");

        session.record(Speaker::User, request);

        let reply = match route {
            Route::FrontDesk => {
                let text = frontdesk::reply(self.generator, self.engine, request, &transcript)?;
                Reply::Chat(text)
            }
            Route::PlanCreate => {
                let tool = select_tool(request, self.tools);
                let tool_docs = tool.as_deref().map(|t| self.docs.lookup(t)).unwrap_or_default();
                let output = planning::create_plan(
                    self.generator,
                    self.engine,
                    request,
                    tool.as_deref(),
                    &tool_docs,
                )?;
                session.plan.create(output.steps)?;
                session.input_files = output.input_files;
                Reply::Plan(format!(
                    "Here is the planned sequence of tasks. Let me know if you need any changes:\n\n{}",
                    session.plan.render()
                ))
            }
            Route::PlanEdit => {
                // Editing requires an existing plan; empty is a hard error.
                session.plan.current()?;
                let output = planning::edit_plan(
                    self.generator,
                    self.engine,
                    request,
                    &session.plan.render(),
                )?;
                session.plan.edit(output.steps)?;
                Reply::Plan(format!(
                    "This is the revised plan, let me know if you still need any changes:\n\n{}",
                    session.plan.render()
                ))
            }
            Route::Analysis => {
                let report = self.run_analysis(session)?;
                Reply::Report(report)
            }
        };

        session.record(Speaker::Assistant, reply.text());
        Ok(reply)
    }

    /// Execute the plan task by task until the completion gate finalizes.
    ///
    /// Each completed task appends its artifact to the cumulative code log
    /// and its stdout to the cumulative output log; the task-scoped context
    /// log starts fresh for every task.
    fn run_analysis(&self, session: &mut Session) -> Result<String> {
        let controller = RetryController {
            generator: self.generator,
            engine: self.engine,
            runner: self.runner,
            docs: self.docs,
            max_iterations: self.max_iterations,
        };
        let input_files = render_input_files(&session.input_files);

        loop {
            let task = session.plan.current()?.to_string();
            let tool = select_tool(&task, self.tools);
            info!(cursor = session.plan.cursor(), task = %task, "starting task");

            let mut context_log = vec![ContextEntry::new(
                ContextRole::Task,
                format!("Task {}: {}", session.plan.cursor() + 1, task),
            )];
            let background = TaskBackground {
                code_log: &session.code_log,
                output_log: &session.output_log,
                input_files: &input_files,
            };
            let success = controller.run_task(
                &mut session.plan,
                &mut session.replanned,
                tool.as_deref(),
                &background,
                &mut context_log,
            )?;

            // Only successful work is persisted; failed attempts left nothing
            // behind but their reflections.
            let final_task = session.plan.current()?.to_string();
            session
                .code_log
                .push_str(&format!("\n# Task: {final_task}\n{}\n", success.artifact.script()));
            if !success.stdout.trim().is_empty() {
                session
                    .output_log
                    .push_str(&format!("{}\n", success.stdout.trim()));
            }

            // Completion gate: finalize on the last task, otherwise advance.
            if session.plan.is_last_task() {
                info!("plan complete, generating report");
                return reporter::report(self.generator, self.engine, &session.output_log);
            }
            session.plan.advance()?;
        }
    }
}

fn render_input_files(input_files: &BTreeMap<String, String>) -> String {
    let mut lines = Vec::with_capacity(input_files.len());
    for (path, description) in input_files {
        lines.push(format!("{path}: {description}"));
    }
    lines.join("\n")
}
