//! Deterministic, pure logic shared by the workflow.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod plan;
pub mod resolver;
pub mod retry;
pub mod router;
pub mod types;
