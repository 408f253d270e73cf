//! Conductor collaborator: classifies a request into a workflow route.

use anyhow::Result;
use tracing::{debug, instrument};

use crate::core::router::{Route, RoutingError};
use crate::io::prompt::PromptEngine;

use super::{GenRequest, Generator};

/// Classify the request. The conductor emits a bare tag; anything outside the
/// closed route set is a [`RoutingError`], never a silent fallback.
#[instrument(skip_all)]
pub fn classify<G: Generator>(
    generator: &G,
    engine: &PromptEngine,
    request: &str,
    transcript: &str,
) -> Result<Route> {
    let prompt = engine.render_conductor(request, transcript)?;
    let completion = generator.generate(&GenRequest {
        prompt,
        schema: None,
    })?;
    let route = Route::parse(&completion).map_err(|err: RoutingError| anyhow::Error::new(err))?;
    debug!(route = route.as_str(), "request classified");
    Ok(route)
}
