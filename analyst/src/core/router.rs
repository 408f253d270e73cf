//! Route classification for incoming requests.
//!
//! The conductor collaborator emits a textual tag; this module maps it onto a
//! closed set of routes with exhaustive matching. Anything outside the set is
//! a [`RoutingError`], which aborts the run before any plan action.

use thiserror::Error;

/// Unrecognized route tag from the conductor. Fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized route tag '{tag}'")]
pub struct RoutingError {
    pub tag: String,
}

/// Workflow entry routes for a classified request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Conversational reply, no plan action.
    FrontDesk,
    /// Generate a fresh plan from the request.
    PlanCreate,
    /// Revise the existing plan from user feedback.
    PlanEdit,
    /// Execute the existing plan task by task.
    Analysis,
}

impl Route {
    /// Parse a conductor tag. Unknown tags are a hard error, never a fallback.
    pub fn parse(tag: &str) -> Result<Self, RoutingError> {
        match tag.trim() {
            "front_desk" => Ok(Route::FrontDesk),
            "plan_create" => Ok(Route::PlanCreate),
            "plan_edit" => Ok(Route::PlanEdit),
            "analysis" => Ok(Route::Analysis),
            other => Err(RoutingError {
                tag: other.to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Route::FrontDesk => "front_desk",
            Route::PlanCreate => "plan_create",
            Route::PlanEdit => "plan_edit",
            Route::Analysis => "analysis",
        }
    }
}

/// Apply the empty-plan policy: analysis without a plan silently becomes plan
/// creation. Every other route passes through unchanged.
pub fn resolve_route(route: Route, plan_is_empty: bool) -> Route {
    match route {
        Route::Analysis if plan_is_empty => Route::PlanCreate,
        other => other,
    }
}
