//! Coding collaborators: artifact synthesis and failure reflection.

use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, instrument};

use crate::core::types::{Artifact, Reflection};
use crate::io::prompt::{CodegenInputs, PromptEngine};

use super::{Generator, generate_json};

const ARTIFACT_SCHEMA: &str = include_str!("../../schemas/artifact.schema.json");
const REFLECTION_SCHEMA: &str = include_str!("../../schemas/reflection.schema.json");

/// Generate one candidate artifact for the current task.
///
/// Code fields occasionally come back wrapped in markdown fences despite the
/// prompt instructions; those are stripped before the artifact is used.
#[instrument(skip_all)]
pub fn generate_artifact<G: Generator>(
    generator: &G,
    engine: &PromptEngine,
    inputs: &CodegenInputs,
) -> Result<Artifact> {
    let prompt = engine.render_codegen(inputs)?;
    let mut artifact: Artifact = generate_json(generator, prompt, ARTIFACT_SCHEMA)?;
    artifact.imports = strip_fences(&artifact.imports);
    artifact.code = strip_fences(&artifact.code);
    debug!(code_bytes = artifact.code.len(), "artifact generated");
    Ok(artifact)
}

/// Diagnose a failed execution and suggest a fix for the next attempt.
#[instrument(skip_all)]
pub fn reflect<G: Generator>(
    generator: &G,
    engine: &PromptEngine,
    script: &str,
    diagnostic: &str,
    code_log: &str,
    context_log: &str,
) -> Result<Reflection> {
    let prompt = engine.render_reflector(script, diagnostic, code_log, context_log)?;
    let reflection: Reflection = generate_json(generator, prompt, REFLECTION_SCHEMA)?;
    Ok(reflection)
}

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A\s*```[a-zA-Z0-9_]*\n(.*?)\n?```\s*\z").unwrap());

fn strip_fences(text: &str) -> String {
    match FENCE_RE.captures(text) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or("").to_string(),
        None => text.to_string(),
    }
}
