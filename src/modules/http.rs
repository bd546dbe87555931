//! HTTP responder module
//!
//! Handles the `plain` statement kind: concatenates literal fragments with
//! resolved variable references, applies the declared headers, writes the
//! status code and ends the response.

use async_trait::async_trait;

use crate::engine::ExecutionContext;
use crate::error::{Error, Result};
use crate::modules::{Module, ModuleContext};
use crate::program::{variable_reference, Operation, Statement};

/// Name under which the responder is installed for every request
pub const MODULE_NAME: &str = "http";

/// The HTTP responder module
#[derive(Debug, Default)]
pub struct HttpResponder;

impl HttpResponder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for HttpResponder {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    async fn new_context(&self) -> Result<Box<dyn ModuleContext>> {
        Ok(Box::new(HttpResponderContext))
    }

    async fn finalize(&self) -> Result<()> {
        Ok(())
    }
}

/// Per-request context; the responder holds no request-scoped resources
struct HttpResponderContext;

#[async_trait]
impl ModuleContext for HttpResponderContext {
    async fn execute(
        &mut self,
        context: &mut ExecutionContext,
        statement: &Statement,
    ) -> Result<()> {
        match &statement.op {
            Operation::Plain {
                body,
                headers,
                status,
            } => {
                let mut payload = String::new();
                for fragment in body {
                    match variable_reference(fragment) {
                        Some(name) => {
                            let variable = context.lookup(name)?;
                            payload.push_str(&variable.value.to_literal());
                        }
                        None => payload.push_str(fragment),
                    }
                }
                for header in headers {
                    context.response.set_header(&header.name, &header.value);
                }
                context.response.write_head(*status);
                context.response.end(payload);
                Ok(())
            }
            other => Err(Error::UnsupportedStatement {
                module: MODULE_NAME.to_string(),
                kind: other.kind_name().to_string(),
            }),
        }
    }

    async fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}
