//! Program document module
//!
//! This module contains the wire model of the JSON-described program
//! executed for one inbound request.

pub mod document;

pub use document::{
    variable_reference, Clause, ClauseQuery, Header, ModuleDescriptor, Operation, Program,
    Statement, Subquery, VariableDecl,
};
