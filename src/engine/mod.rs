//! Engine module
//!
//! This module contains the per-request execution context, the buffered
//! response, and the top-level interpreter that sequences statements.

pub mod context;
pub mod engine;
pub mod response;

pub use context::{ExecutionContext, Variable};
pub use engine::Engine;
pub use response::Response;
