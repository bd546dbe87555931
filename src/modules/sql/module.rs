//! SQL module and per-request context
//!
//! The module owns a lazily-connecting connection pool for its lifetime.
//! Each request context acquires at most one pooled connection on first
//! query, tracks transaction state, interprets the SQL statement kinds and
//! shapes query results into JSON.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::{debug, info};

use crate::engine::ExecutionContext;
use crate::error::{Error, Result};
use crate::modules::sql::backend::{cell_literal, PreparedQuery, QueryBackend, ResultSet, SqlxBackend};
use crate::modules::sql::transaction::TransactionState;
use crate::modules::{Module, ModuleContext};
use crate::program::{
    variable_reference, Clause, ClauseQuery, ModuleDescriptor, Operation, Statement, Subquery,
};
use crate::types::{Value, ValueType};

/// Pool size used when the descriptor does not carry one
const DEFAULT_CONNECTION_LIMIT: u32 = 10;

/// MySQL default port
const DEFAULT_PORT: u16 = 3306;

/// Status of a business-rule violation without a `status` column
const DEFAULT_CHECK_STATUS: u16 = 409;

/// SQL datastore module: a named connection pool
pub struct SqlModule {
    name: String,
    pool: MySqlPool,
}

impl SqlModule {
    /// Build a module from its descriptor.
    ///
    /// The pool connects lazily: installing the module opens no connection,
    /// so programs that never issue SQL never reserve one.
    pub fn from_descriptor(descriptor: &ModuleDescriptor) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&descriptor.host)
            .username(&descriptor.user)
            .password(&descriptor.password)
            .database(&descriptor.database)
            .port(descriptor.port.unwrap_or(DEFAULT_PORT));
        let pool = MySqlPoolOptions::new()
            .max_connections(descriptor.connection_limit.unwrap_or(DEFAULT_CONNECTION_LIMIT))
            .connect_lazy_with(options);
        Self {
            name: descriptor.name.clone(),
            pool,
        }
    }
}

#[async_trait]
impl Module for SqlModule {
    fn name(&self) -> &str {
        &self.name
    }

    async fn new_context(&self) -> Result<Box<dyn ModuleContext>> {
        Ok(Box::new(SqlContext::new(
            self.name.clone(),
            self.pool.clone(),
        )))
    }

    async fn finalize(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Per-request SQL context: at most one pooled connection plus the
/// transaction state
pub struct SqlContext {
    module: String,
    pool: Option<MySqlPool>,
    backend: Option<Box<dyn QueryBackend>>,
    transaction: TransactionState,
}

impl SqlContext {
    fn new(module: String, pool: MySqlPool) -> Self {
        Self {
            module,
            pool: Some(pool),
            backend: None,
            transaction: TransactionState::default(),
        }
    }

    /// Build a context over an already-acquired backend, bypassing the
    /// pool. Embedders that bring their own client use this.
    pub fn with_backend(module: impl Into<String>, backend: Box<dyn QueryBackend>) -> Self {
        Self {
            module: module.into(),
            pool: None,
            backend: Some(backend),
            transaction: TransactionState::default(),
        }
    }

    /// Lazily acquire the pooled connection on first query
    async fn backend(&mut self) -> Result<&mut dyn QueryBackend> {
        if self.backend.is_none() {
            let pool = self
                .pool
                .as_ref()
                .ok_or_else(|| Error::Internal("context has no connection source".to_string()))?;
            info!(module = %self.module, "acquiring pooled connection");
            let connection = pool.acquire().await?;
            self.backend = Some(Box::new(SqlxBackend::new(connection)));
        }
        match self.backend.as_mut() {
            Some(backend) => Ok(backend.as_mut()),
            None => Err(Error::Internal("context has no connection source".to_string())),
        }
    }

    async fn run(&mut self, context: &ExecutionContext, body: &[String]) -> Result<ResultSet> {
        let query = render_query(context, body)?;
        debug!(module = %self.module, sql = %query.sql, "executing query");
        self.backend().await?.run(&query).await
    }

    async fn run_raw(&mut self, sql: &'static str) -> Result<ResultSet> {
        debug!(module = %self.module, sql, "executing query");
        self.backend().await?.run(&PreparedQuery::raw(sql)).await
    }

    async fn execute_assign(
        &mut self,
        context: &mut ExecutionContext,
        query: &[String],
        descriptor: &str,
        assign_name: &str,
    ) -> Result<()> {
        let resultset = self.run(context, query).await?;
        let cell = resultset
            .rows
            .first()
            .and_then(|row| row.first())
            .ok_or(Error::EmptyResultSet)?;
        let value_type = ValueType::parse(descriptor)?;
        let value = value_type.from_literal(&cell_literal(cell)?)?;
        context.bind(assign_name, value_type, value)
    }

    async fn execute_check(
        &mut self,
        context: &mut ExecutionContext,
        query: &[String],
        require_transaction: bool,
    ) -> Result<()> {
        if require_transaction {
            self.transaction.ensure_open("CHECK")?;
        }
        let resultset = self.run(context, query).await?;
        if resultset.rows.is_empty() {
            return Ok(());
        }
        if self.transaction.is_open() {
            self.run_raw("ROLLBACK").await?;
            self.transaction.close();
        }
        let (status, message) = violation(&resultset)?;
        Err(Error::BusinessRule { status, message })
    }

    async fn execute_update(
        &mut self,
        context: &mut ExecutionContext,
        query: &[String],
        affected_rows_name: Option<&str>,
        changed_rows_name: Option<&str>,
    ) -> Result<()> {
        self.transaction.ensure_open("UPDATE")?;
        let resultset = self.run(context, query).await?;
        if let Some(name) = affected_rows_name {
            debug!(module = %self.module, variable = name, "recording affected row count");
            context.bind(name, ValueType::Int, Value::Int(resultset.affected_rows as i64))?;
        }
        if let Some(name) = changed_rows_name {
            debug!(module = %self.module, variable = name, "recording changed row count");
            context.bind(name, ValueType::Int, Value::Int(resultset.changed_rows as i64))?;
        }
        Ok(())
    }

    async fn execute_aggregate(
        &mut self,
        context: &mut ExecutionContext,
        query: &ClauseQuery,
        subqueries: &[Subquery],
    ) -> Result<()> {
        let resultset = self.run(context, &query.body).await?;
        match resultset.rows.len() {
            0 => {
                context.response.set_header("Content-Type", "text/plain");
                context.response.write_head(404);
                context.response.end("Empty.");
                Ok(())
            }
            1 => {
                let mut document = project(&query.clauses, &resultset.rows[0]);
                for subquery in subqueries {
                    let details = self.run(context, &subquery.body).await?;
                    let collection: Vec<JsonValue> = details
                        .rows
                        .iter()
                        .map(|row| JsonValue::Object(project(&subquery.clauses, row)))
                        .collect();
                    document.insert(subquery.name.clone(), JsonValue::Array(collection));
                }
                let payload = serde_json::to_string(&JsonValue::Object(document))?;
                context.response.set_header("Content-Type", "application/json");
                context.response.write_head(200);
                context.response.end(payload);
                Ok(())
            }
            _ => Err(Error::AmbiguousResultSet),
        }
    }
}

#[async_trait]
impl ModuleContext for SqlContext {
    async fn execute(
        &mut self,
        context: &mut ExecutionContext,
        statement: &Statement,
    ) -> Result<()> {
        match &statement.op {
            Operation::Aggregate { query, subqueries } => {
                self.execute_aggregate(context, query, subqueries).await
            }
            Operation::Assign {
                query,
                descriptor,
                assign_name,
            } => {
                self.execute_assign(context, query, descriptor, assign_name)
                    .await
            }
            Operation::Check {
                query,
                require_transaction,
            } => {
                self.execute_check(context, query, require_transaction.unwrap_or(true))
                    .await
            }
            Operation::Update {
                query,
                affected_rows_name,
                changed_rows_name,
            } => {
                self.execute_update(
                    context,
                    query,
                    affected_rows_name.as_deref(),
                    changed_rows_name.as_deref(),
                )
                .await
            }
            Operation::Commit => {
                self.transaction.ensure_open("COMMIT")?;
                self.run_raw("COMMIT").await?;
                self.transaction.close();
                Ok(())
            }
            Operation::Rollback => {
                self.transaction.ensure_open("ROLLBACK")?;
                self.run_raw("ROLLBACK").await?;
                self.transaction.close();
                Ok(())
            }
            Operation::StartTransaction => {
                self.transaction.ensure_closed()?;
                self.run_raw("START TRANSACTION").await?;
                self.transaction.open();
                Ok(())
            }
            other => Err(Error::UnsupportedStatement {
                module: self.module.clone(),
                kind: other.kind_name().to_string(),
            }),
        }
    }

    async fn finalize(&mut self) -> Result<()> {
        if self.transaction.is_open() {
            // roll back before anything can return to the pool
            self.run_raw("ROLLBACK").await?;
            self.transaction.close();
            return Err(Error::TransactionLeftOpen);
        }
        if let Some(backend) = self.backend.take() {
            drop(backend);
        }
        Ok(())
    }
}

/// Render a query body into SQL text with placeholders.
///
/// Literal fragments are trusted as-is; every variable reference becomes a
/// driver-bound parameter, uuid values wrapped in their conversion
/// expression. Parameter binding is the sole injection-prevention boundary.
pub fn render_query(context: &ExecutionContext, body: &[String]) -> Result<PreparedQuery> {
    let mut sql = String::new();
    let mut params = Vec::new();
    for fragment in body {
        match variable_reference(fragment) {
            Some(name) => {
                let variable = context.lookup(name)?;
                match &variable.value {
                    Value::Uuid(_) => sql.push_str("UUID_TO_BIN(?)"),
                    _ => sql.push('?'),
                }
                params.push(variable.value.clone());
            }
            None => sql.push_str(fragment),
        }
    }
    Ok(PreparedQuery { sql, params })
}

/// Map declared clause names onto the columns of one row, in order
fn project(clauses: &[Clause], row: &[JsonValue]) -> serde_json::Map<String, JsonValue> {
    let mut object = serde_json::Map::new();
    for (index, clause) in clauses.iter().enumerate() {
        object.insert(
            clause.name.clone(),
            row.get(index).cloned().unwrap_or(JsonValue::Null),
        );
    }
    object
}

/// Extract the status and message of a matched check row.
///
/// The `status` and `message` columns are used when present; otherwise the
/// status defaults and the first column carries the message.
fn violation(resultset: &ResultSet) -> Result<(u16, String)> {
    let row = resultset.rows.first().ok_or(Error::EmptyResultSet)?;
    let status = match column_index(resultset, "status") {
        Some(index) => cell_literal(row.get(index).unwrap_or(&JsonValue::Null))?
            .parse::<u16>()
            .unwrap_or(DEFAULT_CHECK_STATUS),
        None => DEFAULT_CHECK_STATUS,
    };
    let message_index = column_index(resultset, "message").unwrap_or(0);
    let message = cell_literal(row.get(message_index).unwrap_or(&JsonValue::Null))?;
    Ok((status, message))
}

fn column_index(resultset: &ResultSet, name: &str) -> Option<usize> {
    resultset.columns.iter().position(|column| column == name)
}
