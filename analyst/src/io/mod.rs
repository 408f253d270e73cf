//! Side-effecting operations: filesystem, process execution, persistence.

pub mod config;
pub mod lookup;
pub mod process;
pub mod prompt;
pub mod sandbox;
pub mod session;
