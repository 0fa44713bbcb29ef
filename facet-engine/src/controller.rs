//! Single-query execution with cancellation and dedup.
//!
//! A controller owns the lifecycle of exactly one query (or raw SQL
//! statement) at a time. Starting a new execution supersedes any in-flight
//! one: the older completion is discarded silently, never surfaced as an
//! error. Structurally identical input to the most recently executed request
//! is suppressed entirely; `refetch` bypasses that check.

use facet_client::QueryGateway;
use facet_core::{QueryDefinition, QueryResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// What a controller executes: a modeled query (optionally through the
/// bounded preview endpoint) or a raw SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionInput {
    Query {
        query: QueryDefinition,
        /// Route through `query/preview?limit=N` instead of full execution.
        preview_limit: Option<u64>,
    },
    Sql {
        sql: String,
        /// Validate before executing; validation failures become the
        /// execution error and nothing is executed.
        validate_first: bool,
    },
}

/// Observable execution state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionSnapshot {
    pub data: Option<QueryResult>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Tables referenced by the last validated raw-SQL statement.
    pub referenced_tables: Vec<String>,
}

/// What an `execute`/`refetch` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Completed,
    Failed,
    /// Input was structurally equal to the last executed request; no call
    /// was made.
    Skipped,
    /// A newer execution started before this one resolved; result dropped.
    Superseded,
    /// The controller is disabled or has no input to run.
    Disabled,
}

struct ControllerInner {
    enabled: bool,
    last_executed: Option<ExecutionInput>,
    snapshot: ExecutionSnapshot,
}

/// Cancellable, dedup-aware executor for one logical query target.
pub struct QueryExecutionController<G: QueryGateway> {
    gateway: Arc<G>,
    seq: AtomicU64,
    inner: Mutex<ControllerInner>,
}

impl<G: QueryGateway> QueryExecutionController<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            seq: AtomicU64::new(0),
            inner: Mutex::new(ControllerInner {
                enabled: true,
                last_executed: None,
                snapshot: ExecutionSnapshot::default(),
            }),
        }
    }

    /// Current execution state.
    pub fn snapshot(&self) -> ExecutionSnapshot {
        self.inner.lock().unwrap().snapshot.clone()
    }

    /// Enable or disable the controller. Disabling cancels any in-flight
    /// execution and clears data and error without a network call.
    pub fn set_enabled(&self, enabled: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.enabled = enabled;
        if !enabled {
            self.seq.fetch_add(1, Ordering::SeqCst);
            inner.snapshot = ExecutionSnapshot::default();
        }
    }

    /// Clear the input, cancelling any in-flight execution and resetting the
    /// snapshot without a network call.
    pub fn clear(&self) {
        self.seq.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock().unwrap();
        inner.last_executed = None;
        inner.snapshot = ExecutionSnapshot::default();
    }

    /// Execute `input`, unless it is structurally equal to the most recently
    /// executed request.
    pub async fn execute(&self, input: ExecutionInput) -> ExecutionOutcome {
        {
            let inner = self.inner.lock().unwrap();
            if !inner.enabled {
                return ExecutionOutcome::Disabled;
            }
            if inner.last_executed.as_ref() == Some(&input) {
                tracing::debug!("suppressing re-execution of structurally equal input");
                return ExecutionOutcome::Skipped;
            }
        }
        self.run(input).await
    }

    /// Re-run the last request unconditionally.
    pub async fn refetch(&self) -> ExecutionOutcome {
        let input = {
            let inner = self.inner.lock().unwrap();
            if !inner.enabled {
                return ExecutionOutcome::Disabled;
            }
            inner.last_executed.clone()
        };
        match input {
            Some(input) => self.run(input).await,
            None => ExecutionOutcome::Disabled,
        }
    }

    async fn run(&self, input: ExecutionInput) -> ExecutionOutcome {
        let ticket = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut inner = self.inner.lock().unwrap();
            inner.snapshot.is_loading = true;
            inner.last_executed = Some(input.clone());
        }

        let mut referenced_tables = Vec::new();
        let result = match &input {
            ExecutionInput::Query {
                query,
                preview_limit,
            } => match preview_limit {
                Some(limit) => self.gateway.preview_query(query, *limit).await,
                None => self.gateway.execute_query(query).await,
            }
            .map_err(|e| e.to_string()),
            ExecutionInput::Sql {
                sql,
                validate_first,
            } => self.run_sql(sql, *validate_first, &mut referenced_tables).await,
        };

        let mut inner = self.inner.lock().unwrap();
        if self.seq.load(Ordering::SeqCst) != ticket {
            tracing::debug!(ticket, "discarding superseded execution result");
            return ExecutionOutcome::Superseded;
        }
        inner.snapshot.is_loading = false;
        inner.snapshot.referenced_tables = referenced_tables;
        match result {
            Ok(data) => {
                inner.snapshot.data = Some(data);
                inner.snapshot.error = None;
                ExecutionOutcome::Completed
            }
            Err(message) => {
                inner.snapshot.data = None;
                inner.snapshot.error = Some(message);
                ExecutionOutcome::Failed
            }
        }
    }

    async fn run_sql(
        &self,
        sql: &str,
        validate_first: bool,
        referenced_tables: &mut Vec<String>,
    ) -> Result<QueryResult, String> {
        if validate_first {
            let validation = self
                .gateway
                .validate_sql(sql)
                .await
                .map_err(|e| e.to_string())?;
            if !validation.valid {
                return Err(validation.joined_errors());
            }
            *referenced_tables = validation.tables;
        }
        self.gateway
            .execute_sql(sql, None)
            .await
            .map_err(|e| e.to_string())
    }
}
