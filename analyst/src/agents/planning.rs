//! Planning collaborators: plan creation, plan editing, and the one-shot task
//! revision used by escalation.

use anyhow::Result;
use tracing::{debug, instrument};

use crate::core::types::{PlanEdit, PlanOutput};
use crate::io::prompt::PromptEngine;

use super::{GenRequest, Generator, generate_json};

const PLAN_SCHEMA: &str = include_str!("../../schemas/plan.schema.json");
const PLAN_EDIT_SCHEMA: &str = include_str!("../../schemas/plan_edit.schema.json");

/// Produce a fresh plan for the request, with any input files the request
/// names extracted alongside.
#[instrument(skip_all)]
pub fn create_plan<G: Generator>(
    generator: &G,
    engine: &PromptEngine,
    request: &str,
    tool: Option<&str>,
    tool_docs: &str,
) -> Result<PlanOutput> {
    let prompt = engine.render_planner(request, tool, tool_docs)?;
    let output: PlanOutput = generate_json(generator, prompt, PLAN_SCHEMA)?;
    debug!(steps = output.steps.len(), "plan created");
    Ok(output)
}

/// Rewrite the existing plan wholesale from user feedback.
#[instrument(skip_all)]
pub fn edit_plan<G: Generator>(
    generator: &G,
    engine: &PromptEngine,
    request: &str,
    current_plan: &str,
) -> Result<PlanEdit> {
    let prompt = engine.render_plan_editor(request, current_plan)?;
    let output: PlanEdit = generate_json(generator, prompt, PLAN_EDIT_SCHEMA)?;
    debug!(steps = output.steps.len(), "plan edited");
    Ok(output)
}

/// Synthesize a revised description for a persistently failing task from its
/// accumulated failure history and the original plan.
#[instrument(skip_all)]
pub fn revise_task<G: Generator>(
    generator: &G,
    engine: &PromptEngine,
    task: &str,
    plan: &str,
    context_log: &str,
) -> Result<String> {
    let prompt = engine.render_replanner(task, plan, context_log)?;
    let completion = generator.generate(&GenRequest {
        prompt,
        schema: None,
    })?;
    Ok(completion.trim().to_string())
}
