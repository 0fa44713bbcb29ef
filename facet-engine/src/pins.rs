//! Pin ordering layer.
//!
//! Pin, unpin and reorder mutations delegate to the gateway and share one
//! mutation-state record visible to every caller. Errors are stored in that
//! shared state *and* returned, so callers can run optimistic-rollback or
//! retry logic. Position invariants (dense zero-based ranks, one pin per
//! `(dashboard, context)` pair) are enforced by the backend and consumed
//! here, not re-implemented.

use facet_client::types::{PinRequest, ReorderPinsRequest};
use facet_client::{GatewayError, PinGateway};
use facet_core::{DashboardId, PinnedDashboard};
use std::sync::{Arc, Mutex};

/// Mutation state shared by all callers of the layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationState {
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Pin/unpin/reorder operations over the gateway.
pub struct PinOrdering<G: PinGateway> {
    gateway: Arc<G>,
    state: Mutex<MutationState>,
}

impl<G: PinGateway> PinOrdering<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            state: Mutex::new(MutationState::default()),
        }
    }

    /// Current shared mutation state.
    pub fn state(&self) -> MutationState {
        self.state.lock().unwrap().clone()
    }

    /// Pin a dashboard to a context. The backend rejects a duplicate
    /// `(dashboard, context)` pair.
    pub async fn pin(
        &self,
        dashboard_id: DashboardId,
        context: &str,
        position: Option<u32>,
    ) -> Result<PinnedDashboard, GatewayError> {
        self.begin();
        let request = PinRequest {
            dashboard_id,
            context: context.to_string(),
            position,
        };
        let result = self.gateway.pin(&request).await;
        self.settle(result)
    }

    /// Remove a pin.
    pub async fn unpin(
        &self,
        dashboard_id: DashboardId,
        context: &str,
    ) -> Result<(), GatewayError> {
        self.begin();
        let result = self.gateway.unpin(dashboard_id, context).await;
        self.settle(result)
    }

    /// Reorder pins within a context. `dashboard_ids` must be the complete
    /// id set for the context; partial reordering is undefined.
    pub async fn reorder(
        &self,
        context: &str,
        dashboard_ids: Vec<DashboardId>,
    ) -> Result<Vec<PinnedDashboard>, GatewayError> {
        self.begin();
        let request = ReorderPinsRequest {
            context: context.to_string(),
            dashboard_ids,
        };
        let result = self.gateway.reorder_pins(&request).await;
        self.settle(result)
    }

    /// Pins for a context, ordered by position. Read-only; does not touch
    /// the shared mutation state.
    pub async fn pins_for_context(
        &self,
        context: &str,
    ) -> Result<Vec<PinnedDashboard>, GatewayError> {
        self.gateway.pins_for_context(context).await
    }

    /// Every pin of one dashboard across contexts.
    pub async fn pins_for_dashboard(
        &self,
        dashboard_id: DashboardId,
    ) -> Result<Vec<PinnedDashboard>, GatewayError> {
        self.gateway.pins_for_dashboard(dashboard_id).await
    }

    fn begin(&self) {
        let mut state = self.state.lock().unwrap();
        state.is_loading = true;
        state.error = None;
    }

    fn settle<T>(&self, result: Result<T, GatewayError>) -> Result<T, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        if let Err(err) = &result {
            tracing::warn!(error = %err, "pin mutation failed");
            state.error = Some(err.to_string());
        }
        result
    }
}
