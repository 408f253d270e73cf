//! Prompt rendering for the text-generation collaborators.
//!
//! Templates are embedded at compile time and rendered with minijinja.
//! Optional sections drop out of the prompt entirely when their input is
//! empty, so collaborators never see placeholder headings.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

const CONDUCTOR_TEMPLATE: &str = include_str!("prompts/conductor.md");
const FRONTDESK_TEMPLATE: &str = include_str!("prompts/frontdesk.md");
const PLANNER_TEMPLATE: &str = include_str!("prompts/planner.md");
const PLAN_EDITOR_TEMPLATE: &str = include_str!("prompts/plan_editor.md");
const CODEGEN_TEMPLATE: &str = include_str!("prompts/codegen.md");
const REFLECTOR_TEMPLATE: &str = include_str!("prompts/reflector.md");
const REPLANNER_TEMPLATE: &str = include_str!("prompts/replanner.md");
const REPORTER_TEMPLATE: &str = include_str!("prompts/reporter.md");

/// Inputs for a code-generation prompt.
#[derive(Debug, Clone, Default)]
pub struct CodegenInputs {
    pub task: String,
    pub tool: Option<String>,
    pub tool_docs: String,
    pub input_files: String,
    pub previous_output: String,
    pub context: String,
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        for (name, template) in [
            ("conductor", CONDUCTOR_TEMPLATE),
            ("frontdesk", FRONTDESK_TEMPLATE),
            ("planner", PLANNER_TEMPLATE),
            ("plan_editor", PLAN_EDITOR_TEMPLATE),
            ("codegen", CODEGEN_TEMPLATE),
            ("reflector", REFLECTOR_TEMPLATE),
            ("replanner", REPLANNER_TEMPLATE),
            ("reporter", REPORTER_TEMPLATE),
        ] {
            env.add_template(name, template)
                .expect("embedded template should be valid");
        }
        Self { env }
    }

    pub fn render_conductor(&self, request: &str, transcript: &str) -> Result<String> {
        self.render(
            "conductor",
            context! {
                request => request.trim(),
                transcript => non_empty(transcript),
            },
        )
    }

    pub fn render_frontdesk(&self, request: &str, transcript: &str) -> Result<String> {
        self.render(
            "frontdesk",
            context! {
                request => request.trim(),
                transcript => non_empty(transcript),
            },
        )
    }

    pub fn render_planner(
        &self,
        request: &str,
        tool: Option<&str>,
        tool_docs: &str,
    ) -> Result<String> {
        self.render(
            "planner",
            context! {
                request => request.trim(),
                tool => tool,
                tool_docs => non_empty(tool_docs),
            },
        )
    }

    pub fn render_plan_editor(&self, request: &str, plan: &str) -> Result<String> {
        self.render(
            "plan_editor",
            context! {
                request => request.trim(),
                plan => plan.trim(),
            },
        )
    }

    pub fn render_codegen(&self, inputs: &CodegenInputs) -> Result<String> {
        self.render(
            "codegen",
            context! {
                task => inputs.task.trim(),
                tool => inputs.tool.as_deref(),
                tool_docs => non_empty(&inputs.tool_docs),
                input_files => non_empty(&inputs.input_files),
                previous_output => non_empty(&inputs.previous_output),
                context => non_empty(&inputs.context),
            },
        )
    }

    pub fn render_reflector(
        &self,
        script: &str,
        diagnostic: &str,
        code_log: &str,
        context_log: &str,
    ) -> Result<String> {
        self.render(
            "reflector",
            context! {
                script => script.trim(),
                diagnostic => diagnostic.trim(),
                code_log => non_empty(code_log),
                context => non_empty(context_log),
            },
        )
    }

    pub fn render_replanner(&self, task: &str, plan: &str, context_log: &str) -> Result<String> {
        self.render(
            "replanner",
            context! {
                task => task.trim(),
                plan => plan.trim(),
                context => context_log.trim(),
            },
        )
    }

    pub fn render_reporter(&self, output_log: &str) -> Result<String> {
        self.render(
            "reporter",
            context! {
                output_log => output_log.trim(),
            },
        )
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        let template = self.env.get_template(name)?;
        template
            .render(ctx)
            .with_context(|| format!("render template '{name}'"))
    }
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conductor_includes_request_and_tags() {
        let engine = PromptEngine::new();
        let prompt = engine
            .render_conductor("plot my data", "user: hi")
            .expect("render");
        assert!(prompt.contains("plot my data"));
        assert!(prompt.contains("user: hi"));
        assert!(prompt.contains("front_desk"));
    }

    #[test]
    fn empty_transcript_section_drops_out() {
        let engine = PromptEngine::new();
        let prompt = engine.render_conductor("hello", "  ").expect("render");
        assert!(!prompt.contains("Conversation history"));
    }

    #[test]
    fn codegen_includes_optional_sections_when_present() {
        let engine = PromptEngine::new();
        let inputs = CodegenInputs {
            task: "normalize counts".to_string(),
            tool: Some("normalizer".to_string()),
            tool_docs: "docs here".to_string(),
            input_files: "/data/a.csv: raw counts".to_string(),
            previous_output: "loaded 10 rows".to_string(),
            context: "[failure] boom".to_string(),
        };
        let prompt = engine.render_codegen(&inputs).expect("render");
        assert!(prompt.contains("normalize counts"));
        assert!(prompt.contains("normalizer"));
        assert!(prompt.contains("docs here"));
        assert!(prompt.contains("loaded 10 rows"));
        assert!(prompt.contains("[failure] boom"));
    }

    #[test]
    fn codegen_omits_absent_sections() {
        let engine = PromptEngine::new();
        let inputs = CodegenInputs {
            task: "load data".to_string(),
            ..CodegenInputs::default()
        };
        let prompt = engine.render_codegen(&inputs).expect("render");
        assert!(!prompt.contains("Selected tool"));
        assert!(!prompt.contains("Attempt history"));
    }

    #[test]
    fn replanner_names_task_and_plan() {
        let engine = PromptEngine::new();
        let prompt = engine
            .render_replanner("plot", "1. load\n2. plot", "[failure] no column x")
            .expect("render");
        assert!(prompt.contains("no column x"));
        assert!(prompt.contains("2. plot"));
    }
}
