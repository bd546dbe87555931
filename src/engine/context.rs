//! Execution context
//!
//! The per-request container of variable bindings and the buffered
//! response. Variables are write-once: no name may be rebound after its
//! first assignment within a request.

use indexmap::IndexMap;
use tracing::debug;

use crate::engine::Response;
use crate::error::{Error, Result};
use crate::types::{Value, ValueType};

/// A bound variable: declared type plus value
#[derive(Debug, Clone)]
pub struct Variable {
    pub value_type: ValueType,
    pub value: Value,
}

/// The per-request execution context
#[derive(Debug, Default)]
pub struct ExecutionContext {
    variables: IndexMap<String, Variable>,
    /// The buffered response modules write into
    pub response: Response,
}

impl ExecutionContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable to a name. Names are single-assignment.
    ///
    /// Bound values carry user-supplied data and are not logged.
    pub fn bind(&mut self, name: &str, value_type: ValueType, value: Value) -> Result<()> {
        if self.variables.contains_key(name) {
            return Err(Error::VariableRedefined(name.to_string()));
        }
        debug!(variable = name, kind = value_type.kind(), "binding variable");
        self.variables
            .insert(name.to_string(), Variable { value_type, value });
        Ok(())
    }

    /// Look up a bound variable by name
    pub fn lookup(&self, name: &str) -> Result<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| Error::UnknownVariable(name.to_string()))
    }
}
