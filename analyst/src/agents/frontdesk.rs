//! Front desk collaborator: conversational replies outside the analysis flow.

use anyhow::Result;
use tracing::instrument;

use crate::io::prompt::PromptEngine;

use super::{GenRequest, Generator};

/// Produce a conversational reply to a request that needs no plan action.
#[instrument(skip_all)]
pub fn reply<G: Generator>(
    generator: &G,
    engine: &PromptEngine,
    request: &str,
    transcript: &str,
) -> Result<String> {
    let prompt = engine.render_frontdesk(request, transcript)?;
    let completion = generator.generate(&GenRequest {
        prompt,
        schema: None,
    })?;
    Ok(completion.trim().to_string())
}
