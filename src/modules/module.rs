//! Module capability traits
//!
//! A module is a named backend capability constructed from a descriptor.
//! Each module hands out a per-request context owning request-scoped
//! resources; the context executes statements against the shared execution
//! context, which is passed by reference at execute time rather than
//! captured at construction.

use std::sync::Arc;

use async_trait::async_trait;

use crate::engine::ExecutionContext;
use crate::error::{Error, Result};
use crate::program::{ModuleDescriptor, Statement};

/// A named backend capability with a process-facing lifetime
#[async_trait]
pub trait Module: Send + Sync {
    /// Module name statements are addressed to
    fn name(&self) -> &str;

    /// Construct a per-request context
    async fn new_context(&self) -> Result<Box<dyn ModuleContext>>;

    /// Tear down module-scoped resources
    async fn finalize(&self) -> Result<()>;
}

/// A per-request module context
#[async_trait]
pub trait ModuleContext: Send {
    /// Execute one statement
    async fn execute(
        &mut self,
        context: &mut ExecutionContext,
        statement: &Statement,
    ) -> Result<()>;

    /// Release request-scoped resources exactly once
    async fn finalize(&mut self) -> Result<()>;
}

/// Construct a module from its descriptor, dispatched once by class name
pub fn instantiate(descriptor: &ModuleDescriptor) -> Result<Arc<dyn Module>> {
    match descriptor.class_name.as_str() {
        "mysql" => Ok(Arc::new(crate::modules::sql::SqlModule::from_descriptor(
            descriptor,
        ))),
        other => Err(Error::UnknownModuleClass(other.to_string())),
    }
}
