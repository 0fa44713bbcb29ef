//! SQL preview orchestration.
//!
//! Regenerates SQL text whenever the query changes. Generation is
//! asynchronous and the query can change again before a prior call resolves,
//! so every call captures a monotonically increasing sequence number; a
//! completion whose ticket is no longer current is discarded. Last write
//! wins regardless of network ordering.

use facet_client::QueryGateway;
use facet_core::QueryDefinition;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Observable preview state.
///
/// `error` is a "could not generate SQL" condition, surfaced separately from
/// execution errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewState {
    pub sql: Option<String>,
    pub error: Option<String>,
    pub is_generating: bool,
}

/// What a `query_changed` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// The preview now shows this call's SQL.
    Updated,
    /// The query was not executable; the preview was cleared.
    Cleared,
    /// A newer call was issued before this one resolved; result dropped.
    Superseded,
    /// Generation failed; the error is surfaced in the state.
    Failed,
}

/// Race-safe SQL preview driver.
pub struct SqlPreviewOrchestrator<G: QueryGateway> {
    gateway: Arc<G>,
    seq: AtomicU64,
    state: Mutex<PreviewState>,
}

impl<G: QueryGateway> SqlPreviewOrchestrator<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            seq: AtomicU64::new(0),
            state: Mutex::new(PreviewState::default()),
        }
    }

    /// Current preview state.
    pub fn snapshot(&self) -> PreviewState {
        self.state.lock().unwrap().clone()
    }

    /// React to a query edit.
    ///
    /// Non-executable queries clear the preview; executable ones regenerate
    /// it. Stale completions never overwrite a newer call's result.
    pub async fn query_changed(&self, query: &QueryDefinition) -> PreviewOutcome {
        if !query.can_execute() {
            // Invalidate any in-flight generation before clearing.
            self.seq.fetch_add(1, Ordering::SeqCst);
            *self.state.lock().unwrap() = PreviewState::default();
            return PreviewOutcome::Cleared;
        }

        let ticket = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.lock().unwrap().is_generating = true;

        let result = self.gateway.generate_sql(query).await;

        let mut state = self.state.lock().unwrap();
        if self.seq.load(Ordering::SeqCst) != ticket {
            tracing::debug!(ticket, "discarding superseded SQL preview");
            return PreviewOutcome::Superseded;
        }
        state.is_generating = false;
        match result {
            Ok(sql) => {
                state.sql = Some(sql);
                state.error = None;
                PreviewOutcome::Updated
            }
            Err(err) => {
                state.sql = None;
                state.error = Some(err.to_string());
                PreviewOutcome::Failed
            }
        }
    }
}
