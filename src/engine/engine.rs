//! Top-level interpreter
//!
//! Per request: install the program's modules, build the execution context
//! and every module context, dispatch statements strictly in order, map
//! failures into the response, and finalize everything regardless of
//! outcome.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, error};

use crate::engine::{ExecutionContext, Response};
use crate::error::{Error, Result};
use crate::modules::{self, HttpResponder, Module, ModuleContext};
use crate::program::Program;
use crate::types::ValueType;

/// The engine owning the modules installed for one program run
pub struct Engine {
    modules: Vec<Arc<dyn Module>>,
}

impl Engine {
    /// Create an engine with the implicit HTTP responder module installed
    pub fn new() -> Self {
        let modules: Vec<Arc<dyn Module>> = vec![Arc::new(HttpResponder::new())];
        Self { modules }
    }

    /// Create an engine over an explicit module set.
    ///
    /// Embedders that construct modules themselves (or substitute backends)
    /// use this instead of [`Engine::install`].
    pub fn with_modules(modules: Vec<Arc<dyn Module>>) -> Self {
        Self { modules }
    }

    /// Run one full engine lifecycle: install the program's modules, execute
    /// its statements, and tear the modules down again. Installation errors
    /// are returned to the caller; execution errors are already mapped into
    /// the response.
    pub async fn execute(program: &Program) -> Result<Response> {
        let mut engine = Engine::new();
        let result = match engine.install(program) {
            Ok(()) => Ok(engine.run(program).await),
            Err(error) => Err(error),
        };
        engine.finalize().await;
        result
    }

    /// Install the program's declared modules, rejecting duplicate names
    /// and unknown class names
    pub fn install(&mut self, program: &Program) -> Result<()> {
        for descriptor in &program.modules {
            if self.modules.iter().any(|m| m.name() == descriptor.name) {
                return Err(Error::ModuleRedefined(descriptor.name.clone()));
            }
            self.modules.push(modules::instantiate(descriptor)?);
        }
        Ok(())
    }

    /// Execute the program's statement list and return the response.
    ///
    /// A business-logic failure becomes its `{status, message}` envelope;
    /// any other failure becomes a 500 with the error text. Neither
    /// overwrites an already-ended response. Every module context is
    /// finalized afterwards, each failure logged in isolation.
    pub async fn run(&self, program: &Program) -> Response {
        let mut context = ExecutionContext::new();
        let mut module_contexts: IndexMap<String, Box<dyn ModuleContext>> = IndexMap::new();

        match self.drive(program, &mut context, &mut module_contexts).await {
            Ok(()) => {}
            Err(Error::BusinessRule { status, message }) => {
                if !context.response.is_ended() {
                    let envelope = serde_json::json!({ "status": status, "message": message });
                    context.response.set_header("Content-Type", "application/json");
                    context.response.write_head(status);
                    context.response.end(envelope.to_string());
                }
            }
            Err(other) => {
                error!("program execution failed: {other}");
                if !context.response.is_ended() {
                    context.response.set_header("Content-Type", "text/plain");
                    context.response.write_head(500);
                    context.response.end(other.to_string());
                }
            }
        }

        for (name, mut module_context) in module_contexts {
            if let Err(error) = module_context.finalize().await {
                error!(module = %name, "context finalization failed: {error}");
            }
        }

        context.response
    }

    /// Build module contexts, seed constants, dispatch statements in order.
    async fn drive(
        &self,
        program: &Program,
        context: &mut ExecutionContext,
        module_contexts: &mut IndexMap<String, Box<dyn ModuleContext>>,
    ) -> Result<()> {
        for module in &self.modules {
            module_contexts.insert(module.name().to_string(), module.new_context().await?);
        }

        for (name, declaration) in &program.variables {
            let value_type = ValueType::parse(&declaration.descriptor)?;
            let value = value_type.from_literal(&declaration.value)?;
            context.bind(name, value_type, value)?;
        }

        for statement in &program.statements {
            debug!(
                module = %statement.module,
                kind = statement.op.kind_name(),
                "dispatching statement"
            );
            let module_context = module_contexts
                .get_mut(&statement.module)
                .ok_or_else(|| Error::UnknownModule(statement.module.clone()))?;
            module_context.execute(context, statement).await?;
        }

        Ok(())
    }

    /// Tear down the installed modules. Failures are logged, never re-raised.
    pub async fn finalize(&self) {
        for module in &self.modules {
            if let Err(error) = module.finalize().await {
                error!(module = module.name(), "module finalization failed: {error}");
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
