//! Debounced layout autosave.
//!
//! Coalesces rapid layout-change events into one persisted update. The save
//! state machine is `Idle -> Pending -> Saving -> {Saved -> Idle, Error}`;
//! `Saved` reverts to `Idle` after a fixed display duration, `Error` is
//! sticky until the next queued update or an explicit flush. Timer races are
//! suppressed with the same sequence-number pattern as the preview
//! orchestrator: every queued update bumps the sequence, and a timer whose
//! ticket is stale does nothing.

use facet_client::types::WidgetPlacement;
use facet_client::DashboardGateway;
use facet_core::DashboardId;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Visible save state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SaveState {
    #[default]
    Idle,
    Pending,
    Saving,
    Saved,
    Error(String),
}

/// Configuration for the autosave driver.
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    /// Quiet period after the last queued update before saving.
    pub debounce: Duration,
    /// How long the `Saved` state stays visible before reverting to `Idle`.
    pub saved_display: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(800),
            saved_display: Duration::from_secs(2),
        }
    }
}

impl AutosaveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the `Saved` display duration.
    pub fn with_saved_display(mut self, saved_display: Duration) -> Self {
        self.saved_display = saved_display;
        self
    }
}

#[derive(Default)]
struct AutosaveInner {
    pending: Option<Vec<WidgetPlacement>>,
    state: SaveState,
    seq: u64,
}

/// Debounced persister for one dashboard's widget layout.
pub struct LayoutAutosave<G>
where
    G: DashboardGateway + 'static,
{
    gateway: Arc<G>,
    dashboard_id: DashboardId,
    config: AutosaveConfig,
    inner: Arc<Mutex<AutosaveInner>>,
}

impl<G> Clone for LayoutAutosave<G>
where
    G: DashboardGateway + 'static,
{
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            dashboard_id: self.dashboard_id,
            config: self.config.clone(),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G> LayoutAutosave<G>
where
    G: DashboardGateway + 'static,
{
    pub fn new(gateway: Arc<G>, dashboard_id: DashboardId, config: AutosaveConfig) -> Self {
        Self {
            gateway,
            dashboard_id,
            config,
            inner: Arc::new(Mutex::new(AutosaveInner::default())),
        }
    }

    /// Current save state.
    pub fn state(&self) -> SaveState {
        self.inner.lock().unwrap().state.clone()
    }

    /// Store the latest pending payload and (re)start the debounce timer.
    pub fn queue_update(&self, positions: Vec<WidgetPlacement>) {
        let ticket = {
            let mut inner = self.inner.lock().unwrap();
            inner.pending = Some(positions);
            inner.state = SaveState::Pending;
            inner.seq += 1;
            inner.seq
        };

        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(this.config.debounce).await;
            this.fire(ticket).await;
        });
    }

    /// Cancel the timer and save the pending payload immediately. Used on
    /// navigation-away. A no-op when nothing is pending.
    pub async fn flush(&self) {
        let (ticket, payload) = {
            let mut inner = self.inner.lock().unwrap();
            inner.seq += 1;
            let Some(payload) = inner.pending.take() else {
                return;
            };
            inner.state = SaveState::Saving;
            (inner.seq, payload)
        };
        self.save(ticket, payload).await;
    }

    /// Discard the pending payload and return to `Idle` without saving.
    pub fn cancel(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.seq += 1;
        inner.pending = None;
        inner.state = SaveState::Idle;
    }

    async fn fire(&self, ticket: u64) {
        let payload = {
            let mut inner = self.inner.lock().unwrap();
            if inner.seq != ticket || inner.state != SaveState::Pending {
                return;
            }
            let Some(payload) = inner.pending.take() else {
                return;
            };
            inner.state = SaveState::Saving;
            payload
        };
        self.save(ticket, payload).await;
    }

    async fn save(&self, ticket: u64, payload: Vec<WidgetPlacement>) {
        let result = self
            .gateway
            .update_layout(self.dashboard_id, &payload)
            .await;

        let mut inner = self.inner.lock().unwrap();
        if inner.seq != ticket {
            // A newer update or cancel arrived while saving.
            return;
        }
        match result {
            Ok(()) => {
                inner.state = SaveState::Saved;
                drop(inner);
                self.schedule_revert(ticket);
            }
            Err(err) => {
                tracing::warn!(dashboard = %self.dashboard_id, error = %err, "layout autosave failed");
                inner.state = SaveState::Error(err.to_string());
            }
        }
    }

    fn schedule_revert(&self, ticket: u64) {
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(this.config.saved_display).await;
            let mut inner = this.inner.lock().unwrap();
            if inner.seq == ticket && inner.state == SaveState::Saved {
                inner.state = SaveState::Idle;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use facet_client::types::{CreateDashboardRequest, UpdateDashboardRequest};
    use facet_client::GatewayError;
    use facet_core::{Dashboard, EntityIdType, Widget, WidgetId};
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    #[derive(Default)]
    struct RecordingGateway {
        layout_calls: AtomicU64,
        last_payload: Mutex<Option<Vec<WidgetPlacement>>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl DashboardGateway for RecordingGateway {
        async fn list_dashboards(&self) -> Result<Vec<Dashboard>, GatewayError> {
            Ok(Vec::new())
        }

        async fn get_dashboard(&self, _id: DashboardId) -> Result<Dashboard, GatewayError> {
            Err(GatewayError::Http {
                status: 404,
                message: "not used".to_string(),
            })
        }

        async fn create_dashboard(
            &self,
            _request: &CreateDashboardRequest,
        ) -> Result<Dashboard, GatewayError> {
            Err(GatewayError::Http {
                status: 400,
                message: "not used".to_string(),
            })
        }

        async fn update_dashboard(
            &self,
            _id: DashboardId,
            _request: &UpdateDashboardRequest,
        ) -> Result<Dashboard, GatewayError> {
            Err(GatewayError::Http {
                status: 400,
                message: "not used".to_string(),
            })
        }

        async fn delete_dashboard(&self, _id: DashboardId) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn create_widget(
            &self,
            _dashboard_id: DashboardId,
            widget: &Widget,
        ) -> Result<Widget, GatewayError> {
            Ok(widget.clone())
        }

        async fn update_widget(
            &self,
            _dashboard_id: DashboardId,
            widget: &Widget,
        ) -> Result<Widget, GatewayError> {
            Ok(widget.clone())
        }

        async fn delete_widget(
            &self,
            _dashboard_id: DashboardId,
            _widget_id: WidgetId,
        ) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn update_layout(
            &self,
            _dashboard_id: DashboardId,
            positions: &[WidgetPlacement],
        ) -> Result<(), GatewayError> {
            self.layout_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(GatewayError::Http {
                    status: 500,
                    message: "layout save failed".to_string(),
                });
            }
            *self.last_payload.lock().unwrap() = Some(positions.to_vec());
            Ok(())
        }
    }

    fn placement(x: u32) -> WidgetPlacement {
        WidgetPlacement {
            id: WidgetId::generate(),
            x,
            y: 0,
            w: 4,
            h: 3,
        }
    }

    fn autosave(gateway: Arc<RecordingGateway>) -> LayoutAutosave<RecordingGateway> {
        LayoutAutosave::new(
            gateway,
            DashboardId::generate(),
            AutosaveConfig::new()
                .with_debounce(Duration::from_millis(100))
                .with_saved_display(Duration::from_secs(1)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_updates_coalesce_to_one_save() {
        let gateway = Arc::new(RecordingGateway::default());
        let autosave = autosave(Arc::clone(&gateway));

        autosave.queue_update(vec![placement(1)]);
        autosave.queue_update(vec![placement(2)]);
        autosave.queue_update(vec![placement(3)]);
        assert_eq!(autosave.state(), SaveState::Pending);

        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(150)).await;
        tokio::task::yield_now().await;

        assert_eq!(gateway.layout_calls.load(Ordering::SeqCst), 1);
        let payload = gateway.last_payload.lock().unwrap().clone().unwrap();
        assert_eq!(payload[0].x, 3);
        assert_eq!(autosave.state(), SaveState::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_saved_reverts_to_idle_after_display_duration() {
        let gateway = Arc::new(RecordingGateway::default());
        let autosave = autosave(Arc::clone(&gateway));

        autosave.queue_update(vec![placement(1)]);
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(150)).await;
        tokio::task::yield_now().await;
        assert_eq!(autosave.state(), SaveState::Saved);

        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(autosave.state(), SaveState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_saves_immediately() {
        let gateway = Arc::new(RecordingGateway::default());
        let autosave = autosave(Arc::clone(&gateway));

        autosave.queue_update(vec![placement(7)]);
        autosave.flush().await;

        assert_eq!(gateway.layout_calls.load(Ordering::SeqCst), 1);
        assert_eq!(autosave.state(), SaveState::Saved);

        // The cancelled debounce timer must not save a second time.
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;
        assert_eq!(gateway.layout_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_without_pending_is_a_noop() {
        let gateway = Arc::new(RecordingGateway::default());
        let autosave = autosave(Arc::clone(&gateway));

        autosave.flush().await;
        assert_eq!(gateway.layout_calls.load(Ordering::SeqCst), 0);
        assert_eq!(autosave.state(), SaveState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending_payload() {
        let gateway = Arc::new(RecordingGateway::default());
        let autosave = autosave(Arc::clone(&gateway));

        autosave.queue_update(vec![placement(1)]);
        autosave.cancel();
        assert_eq!(autosave.state(), SaveState::Idle);

        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;
        assert_eq!(gateway.layout_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_sticky_until_next_update() {
        let gateway = Arc::new(RecordingGateway::default());
        let autosave = autosave(Arc::clone(&gateway));

        gateway.fail.store(true, Ordering::SeqCst);
        autosave.queue_update(vec![placement(1)]);
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(150)).await;
        tokio::task::yield_now().await;
        assert_eq!(
            autosave.state(),
            SaveState::Error("layout save failed".to_string())
        );

        // Error holds through time passing.
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        assert!(matches!(autosave.state(), SaveState::Error(_)));

        // The next queued update leaves the error state.
        gateway.fail.store(false, Ordering::SeqCst);
        autosave.queue_update(vec![placement(2)]);
        assert_eq!(autosave.state(), SaveState::Pending);
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(150)).await;
        tokio::task::yield_now().await;
        assert_eq!(autosave.state(), SaveState::Saved);
    }
}
