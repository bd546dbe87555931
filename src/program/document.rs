//! Program document model
//!
//! A program arrives already parsed from the request body as JSON. It
//! declares constant variables, backend modules, and the ordered statement
//! list the engine dispatches.

use indexmap::IndexMap;
use serde::Deserialize;

/// A declarative program executed for one inbound request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Program {
    /// Constant variables, seeded into the execution context in order
    #[serde(default)]
    pub variables: IndexMap<String, VariableDecl>,
    /// Backend module descriptors
    #[serde(default)]
    pub modules: Vec<ModuleDescriptor>,
    /// Ordered statement list
    #[serde(default)]
    pub statements: Vec<Statement>,
}

/// A declared constant: type descriptor plus literal value
#[derive(Debug, Clone, Deserialize)]
pub struct VariableDecl {
    /// Type descriptor, e.g. `int` or `string(32)`
    #[serde(rename = "type")]
    pub descriptor: String,
    /// Literal value, converted through the descriptor's type before binding
    pub value: String,
}

/// Construction parameters for a backend module
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    /// Module name statements refer to
    pub name: String,
    /// Backend class, dispatched once at construction
    pub class_name: String,
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub port: Option<u16>,
    /// Connection pool size, defaulted by the module when absent
    pub connection_limit: Option<u32>,
}

/// One instruction in a request's program, bound to exactly one module
#[derive(Debug, Clone, Deserialize)]
pub struct Statement {
    /// Target module name
    pub module: String,
    /// The operation and its kind-specific fields
    #[serde(flatten)]
    pub op: Operation,
}

/// Statement kinds
///
/// Query bodies are sequences of literal text fragments; a fragment starting
/// with `:` is a reference to a bound variable.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Operation {
    /// Raw response from literal fragments, headers and a status code
    Plain {
        #[serde(default)]
        body: Vec<String>,
        #[serde(default)]
        headers: Vec<Header>,
        status: u16,
    },
    /// Single-row primary query assembled with one-to-many subqueries
    Aggregate {
        query: ClauseQuery,
        #[serde(default)]
        subqueries: Vec<Subquery>,
    },
    /// Single-row query whose first column binds to a new variable
    #[serde(rename_all = "camelCase")]
    Assign {
        query: Vec<String>,
        #[serde(rename = "type")]
        descriptor: String,
        assign_name: String,
    },
    /// Business-rule assertion; any returned row aborts the request
    #[serde(rename_all = "camelCase")]
    Check {
        query: Vec<String>,
        require_transaction: Option<bool>,
    },
    /// Mutating query, optionally recording row counts into int variables
    #[serde(rename_all = "camelCase")]
    Update {
        query: Vec<String>,
        affected_rows_name: Option<String>,
        changed_rows_name: Option<String>,
    },
    /// Commit the open transaction
    Commit,
    /// Roll back the open transaction
    Rollback,
    /// Open a transaction
    StartTransaction,
}

impl Operation {
    /// Wire name of this statement kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Operation::Plain { .. } => "plain",
            Operation::Aggregate { .. } => "aggregate",
            Operation::Assign { .. } => "assign",
            Operation::Check { .. } => "check",
            Operation::Update { .. } => "update",
            Operation::Commit => "commit",
            Operation::Rollback => "rollback",
            Operation::StartTransaction => "startTransaction",
        }
    }
}

/// A response header declared by a plain statement
#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// A query body plus the output clause names it projects
#[derive(Debug, Clone, Deserialize)]
pub struct ClauseQuery {
    pub body: Vec<String>,
    #[serde(default)]
    pub clauses: Vec<Clause>,
}

/// A named output clause
#[derive(Debug, Clone, Deserialize)]
pub struct Clause {
    pub name: String,
}

/// A named one-to-many detail query of an aggregate statement
#[derive(Debug, Clone, Deserialize)]
pub struct Subquery {
    pub name: String,
    pub body: Vec<String>,
    #[serde(default)]
    pub clauses: Vec<Clause>,
}

/// Resolve a body fragment to the variable name it references, if any.
pub fn variable_reference(fragment: &str) -> Option<&str> {
    fragment.strip_prefix(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_reference() {
        assert_eq!(variable_reference(":customerId"), Some("customerId"));
        assert_eq!(variable_reference("SELECT 1"), None);
        assert_eq!(variable_reference(""), None);
    }

    #[test]
    fn test_deserialize_full_program() {
        let raw = r#"{
            "variables": {
                "customerId": { "type": "int", "value": "42" },
                "name": { "type": "string(64)", "value": "Ada" }
            },
            "modules": [
                {
                    "name": "store",
                    "className": "mysql",
                    "host": "localhost",
                    "user": "app",
                    "password": "secret",
                    "database": "shop",
                    "port": 3306,
                    "connectionLimit": 4
                }
            ],
            "statements": [
                { "module": "store", "kind": "startTransaction" },
                {
                    "module": "store",
                    "kind": "check",
                    "query": ["SELECT 409, 'duplicate' FROM orders WHERE id=", ":customerId"]
                },
                {
                    "module": "store",
                    "kind": "update",
                    "query": ["UPDATE orders SET state='paid' WHERE id=", ":customerId"],
                    "affectedRowsName": "touched"
                },
                {
                    "module": "store",
                    "kind": "assign",
                    "query": ["SELECT LAST_INSERT_ID()"],
                    "type": "int",
                    "assignName": "orderId"
                },
                { "module": "store", "kind": "commit" },
                {
                    "module": "http",
                    "kind": "plain",
                    "body": ["created ", ":orderId"],
                    "headers": [{ "name": "Content-Type", "value": "text/plain" }],
                    "status": 201
                }
            ]
        }"#;

        let program: Program = serde_json::from_str(raw).unwrap();
        assert_eq!(program.variables.len(), 2);
        assert_eq!(program.variables["customerId"].descriptor, "int");
        assert_eq!(program.modules[0].class_name, "mysql");
        assert_eq!(program.modules[0].connection_limit, Some(4));
        assert_eq!(program.statements.len(), 6);
        assert_eq!(program.statements[0].op.kind_name(), "startTransaction");

        match &program.statements[2].op {
            Operation::Update {
                affected_rows_name,
                changed_rows_name,
                ..
            } => {
                assert_eq!(affected_rows_name.as_deref(), Some("touched"));
                assert!(changed_rows_name.is_none());
            }
            other => panic!("unexpected kind '{}'", other.kind_name()),
        }

        match &program.statements[3].op {
            Operation::Assign {
                descriptor,
                assign_name,
                ..
            } => {
                assert_eq!(descriptor, "int");
                assert_eq!(assign_name, "orderId");
            }
            other => panic!("unexpected kind '{}'", other.kind_name()),
        }
    }

    #[test]
    fn test_deserialize_aggregate() {
        let raw = r#"{
            "module": "store",
            "kind": "aggregate",
            "query": {
                "body": ["SELECT id, placed_at FROM orders WHERE id=", ":orderId"],
                "clauses": [{ "name": "id" }, { "name": "placedAt" }]
            },
            "subqueries": [
                {
                    "name": "lines",
                    "body": ["SELECT sku, quantity FROM order_lines WHERE order_id=", ":orderId"],
                    "clauses": [{ "name": "sku" }, { "name": "quantity" }]
                }
            ]
        }"#;

        let statement: Statement = serde_json::from_str(raw).unwrap();
        match &statement.op {
            Operation::Aggregate { query, subqueries } => {
                assert_eq!(query.clauses.len(), 2);
                assert_eq!(subqueries[0].name, "lines");
            }
            other => panic!("unexpected kind '{}'", other.kind_name()),
        }
    }

    #[test]
    fn test_empty_document_defaults() {
        let program: Program = serde_json::from_str("{}").unwrap();
        assert!(program.variables.is_empty());
        assert!(program.modules.is_empty());
        assert!(program.statements.is_empty());
    }
}
