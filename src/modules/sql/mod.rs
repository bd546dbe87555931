//! SQL datastore module
//!
//! This module contains the connection-pool-owning module, the per-request
//! context with its transaction state machine, the statement interpreter,
//! and the query backend capability.

pub mod backend;
pub mod module;
pub mod transaction;

pub use backend::{PreparedQuery, QueryBackend, ResultSet, SqlxBackend};
pub use module::{SqlContext, SqlModule};
pub use transaction::TransactionState;
