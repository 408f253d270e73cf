//! Plan-driven data-analysis workflow runner.
//!
//! This crate implements a request-routing workflow where an analysis goal is
//! broken into an ordered plan of tasks, and each task is driven through
//! generate/execute/recover cycles until it succeeds or the run must abort.
//! The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (plan state, routing, tool
//!   resolution, retry decisions). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config, session persistence,
//!   sandboxed execution, process spawning, prompt rendering).
//! - **[`agents`]**: Text-generation collaborators behind the [`agents::Generator`]
//!   seam, so tests script completions without spawning anything.
//!
//! Orchestration modules ([`workflow`], [`controller`]) coordinate core logic
//! with I/O to implement the CLI commands.

pub mod agents;
pub mod controller;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod workflow;
