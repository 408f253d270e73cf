//! Reporter collaborator: final human-readable summary of a completed run.

use anyhow::Result;
use tracing::instrument;

use crate::io::prompt::PromptEngine;

use super::{GenRequest, Generator};

/// Summarize the accumulated stdout of a completed run.
#[instrument(skip_all)]
pub fn report<G: Generator>(
    generator: &G,
    engine: &PromptEngine,
    output_log: &str,
) -> Result<String> {
    let prompt = engine.render_reporter(output_log)?;
    let completion = generator.generate(&GenRequest {
        prompt,
        schema: None,
    })?;
    Ok(completion.trim().to_string())
}
