//! Backend modules
//!
//! This module contains the module capability traits and the two backend
//! variants: the HTTP responder and the SQL datastore.

pub mod http;
pub mod module;
pub mod sql;

pub use http::HttpResponder;
pub use module::{instantiate, Module, ModuleContext};
pub use sql::SqlModule;
