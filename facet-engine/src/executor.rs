//! Dashboard loading and batched widget execution.
//!
//! The executor owns one dashboard's in-memory editing copy and runs every
//! contained widget's query in bounded-size batches: batches are strictly
//! sequential, queries within a batch run concurrently, and one widget's
//! failure never aborts its siblings.

use chrono::Utc;
use facet_client::types::{CreateDashboardRequest, UpdateDashboardRequest, WidgetPlacement};
use facet_client::{DashboardGateway, GatewayError, QueryGateway};
use facet_core::{
    Dashboard, DashboardId, QueryDefinition, QueryResult, Timestamp, Widget, WidgetId,
};
use futures_util::future::join_all;
use futures_util::FutureExt;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::cache::DashboardCache;

/// Configuration for the widget batch executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum queries in flight at once.
    pub batch_size: usize,
    /// How many layout-changed events to ignore after a (re)load. The layout
    /// subsystem fires spurious events during initial mount; this must be at
    /// least the observed spurious count.
    pub layout_event_grace: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            batch_size: 4,
            layout_event_grace: 2,
        }
    }
}

impl ExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size. Values below 1 are clamped to 1.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the post-load layout event grace count.
    pub fn with_layout_event_grace(mut self, grace: u32) -> Self {
        self.layout_event_grace = grace;
        self
    }
}

/// Per-widget execution state, tracked independently by widget id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetRunState {
    pub loading: bool,
    pub result: Option<QueryResult>,
    pub error: Option<String>,
    pub last_refreshed_at: Option<Timestamp>,
}

/// Disposition of a layout-changed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutChange {
    /// Ignored as part of the post-load grace window.
    Suppressed,
    /// Applied to the in-memory dashboard and marked dirty.
    Applied,
}

#[derive(Default)]
struct ExecutorState {
    dashboard: Option<Dashboard>,
    widget_states: HashMap<WidgetId, WidgetRunState>,
    refreshing: HashSet<WidgetId>,
    dirty: bool,
    layout_events_to_ignore: u32,
    load_error: Option<String>,
}

/// Loads one dashboard and runs every contained widget's query.
pub struct WidgetBatchExecutor<G>
where
    G: QueryGateway + DashboardGateway + 'static,
{
    gateway: Arc<G>,
    cache: Arc<DashboardCache>,
    config: ExecutorConfig,
    state: Mutex<ExecutorState>,
}

impl<G> WidgetBatchExecutor<G>
where
    G: QueryGateway + DashboardGateway + 'static,
{
    pub fn new(gateway: Arc<G>, cache: Arc<DashboardCache>, config: ExecutorConfig) -> Self {
        Self {
            gateway,
            cache,
            config,
            state: Mutex::new(ExecutorState::default()),
        }
    }

    // ------------------------------------------------------------------------
    // Load and execute
    // ------------------------------------------------------------------------

    /// Load a dashboard (through the cache) and execute all widget queries.
    ///
    /// A cache hit still triggers widget execution from the cached copy; a
    /// miss joins any fetch already in flight for the same id.
    pub async fn load(&self, id: DashboardId) -> Result<(), GatewayError> {
        let gateway = Arc::clone(&self.gateway);
        let fetched = self
            .cache
            .load(id, move || {
                async move { gateway.get_dashboard(id).await }.boxed()
            })
            .await;

        let dashboard = match fetched {
            Ok(dashboard) => dashboard,
            Err(err) => {
                self.state.lock().unwrap().load_error = Some(err.to_string());
                return Err(err);
            }
        };

        self.install_dashboard(dashboard);
        self.run_all_widgets().await;
        Ok(())
    }

    fn install_dashboard(&self, dashboard: Dashboard) {
        let mut state = self.state.lock().unwrap();
        state.load_error = None;
        state.widget_states = dashboard
            .widgets
            .iter()
            .map(|w| (w.id, WidgetRunState::default()))
            .collect();
        state.refreshing.clear();
        state.dashboard = Some(dashboard);
        state.dirty = false;
        state.layout_events_to_ignore = self.config.layout_event_grace;
    }

    /// Execute every widget query in bounded-size batches.
    ///
    /// Batches run strictly in sequence; queries within a batch run
    /// concurrently, bounding peak outstanding requests to the batch size.
    pub async fn run_all_widgets(&self) {
        let runnable: Vec<(WidgetId, String, QueryDefinition)> = {
            let state = self.state.lock().unwrap();
            state
                .dashboard
                .as_ref()
                .map(|d| {
                    d.widgets
                        .iter()
                        .filter_map(|w| w.query.clone().map(|q| (w.id, w.title.clone(), q)))
                        .collect()
                })
                .unwrap_or_default()
        };
        if runnable.is_empty() {
            return;
        }

        {
            let mut state = self.state.lock().unwrap();
            for (id, _, _) in &runnable {
                state.widget_states.entry(*id).or_default().loading = true;
            }
        }

        for batch in runnable.chunks(self.config.batch_size) {
            let executions = batch.iter().map(|(id, title, query)| {
                let gateway = Arc::clone(&self.gateway);
                let query = query.clone();
                let id = *id;
                let title = title.clone();
                async move { (id, title, gateway.execute_query(&query).await) }
            });

            let completed = join_all(executions).await;

            let mut state = self.state.lock().unwrap();
            for (id, title, result) in completed {
                apply_widget_result(&mut state, id, &title, result);
            }
        }
    }

    /// Re-run a single widget's query, bypassing the dashboard cache.
    ///
    /// While running, the widget id is tracked in the refreshing set,
    /// distinct from the generic loading flag, so callers can distinguish
    /// user-triggered refresh from initial load. Returns `false` when the
    /// widget does not exist or has no query.
    pub async fn refresh_widget(&self, id: WidgetId) -> bool {
        let widget = {
            let state = self.state.lock().unwrap();
            state
                .dashboard
                .as_ref()
                .and_then(|d| d.find_widget(id))
                .cloned()
        };
        let Some(widget) = widget else {
            return false;
        };
        let Some(query) = widget.query.clone() else {
            return false;
        };

        self.state.lock().unwrap().refreshing.insert(id);
        let result = self.gateway.execute_query(&query).await;

        let mut state = self.state.lock().unwrap();
        state.refreshing.remove(&id);
        apply_widget_result(&mut state, id, &widget.title, result);
        true
    }

    // ------------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------------

    /// Add a widget to the in-memory dashboard.
    pub fn add_widget(&self, widget: Widget) {
        let mut state = self.state.lock().unwrap();
        if let Some(dashboard) = state.dashboard.as_mut() {
            let id = widget.id;
            dashboard.widgets.push(widget);
            state.widget_states.insert(id, WidgetRunState::default());
            state.dirty = true;
        }
    }

    /// Replace a widget in place by id.
    pub fn update_widget(&self, widget: Widget) {
        let mut state = self.state.lock().unwrap();
        if let Some(dashboard) = state.dashboard.as_mut() {
            if let Some(slot) = dashboard.widgets.iter_mut().find(|w| w.id == widget.id) {
                *slot = widget;
                state.dirty = true;
            }
        }
    }

    /// Remove a widget and its execution state.
    pub fn remove_widget(&self, id: WidgetId) {
        let mut state = self.state.lock().unwrap();
        if let Some(dashboard) = state.dashboard.as_mut() {
            let before = dashboard.widgets.len();
            dashboard.widgets.retain(|w| w.id != id);
            if dashboard.widgets.len() != before {
                state.widget_states.remove(&id);
                state.refreshing.remove(&id);
                state.dirty = true;
            }
        }
    }

    /// React to a layout-changed event from the grid subsystem.
    ///
    /// The first `layout_event_grace` events after a (re)load are spurious
    /// mount noise and are ignored; later events update widget positions and
    /// mark the dashboard dirty.
    pub fn handle_layout_change(&self, positions: &[WidgetPlacement]) -> LayoutChange {
        let mut state = self.state.lock().unwrap();
        if state.layout_events_to_ignore > 0 {
            state.layout_events_to_ignore -= 1;
            tracing::debug!(
                remaining = state.layout_events_to_ignore,
                "ignoring spurious layout event"
            );
            return LayoutChange::Suppressed;
        }

        if let Some(dashboard) = state.dashboard.as_mut() {
            for placement in positions {
                if let Some(widget) = dashboard.widgets.iter_mut().find(|w| w.id == placement.id) {
                    widget.position.x = placement.x;
                    widget.position.y = placement.y;
                    widget.position.w = placement.w;
                    widget.position.h = placement.h;
                }
            }
        }
        state.dirty = true;
        LayoutChange::Applied
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Persist the dashboard: create when it has no id yet, otherwise a
    /// partial update. The canonical server copy is reloaded afterwards; a
    /// reload failure does not fail the save, and the last local state stays
    /// displayed.
    pub async fn save(&self, draft: &Dashboard) -> Result<Dashboard, GatewayError> {
        let saved = match draft.id {
            Some(id) => {
                self.gateway
                    .update_dashboard(id, &UpdateDashboardRequest::from(draft))
                    .await?
            }
            None => {
                self.gateway
                    .create_dashboard(&CreateDashboardRequest::from(draft))
                    .await?
            }
        };

        let canonical = match saved.id {
            Some(id) => match self.gateway.get_dashboard(id).await {
                Ok(canonical) => canonical,
                Err(err) => {
                    // The save itself succeeded; keep the local copy.
                    tracing::warn!(%id, error = %err, "reload after save failed, keeping local state");
                    saved
                }
            },
            None => saved,
        };

        {
            let mut state = self.state.lock().unwrap();
            state.dashboard = Some(canonical.clone());
            state.dirty = false;
            state.layout_events_to_ignore = self.config.layout_event_grace;
        }
        if let Some(id) = canonical.id {
            self.cache.set(id, canonical.clone());
        }
        Ok(canonical)
    }

    // ------------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------------

    /// The in-memory dashboard copy, if loaded.
    pub fn dashboard(&self) -> Option<Dashboard> {
        self.state.lock().unwrap().dashboard.clone()
    }

    /// Execution state for one widget.
    pub fn widget_state(&self, id: WidgetId) -> Option<WidgetRunState> {
        self.state.lock().unwrap().widget_states.get(&id).cloned()
    }

    /// Whether a user-triggered refresh is running for this widget.
    pub fn is_refreshing(&self, id: WidgetId) -> bool {
        self.state.lock().unwrap().refreshing.contains(&id)
    }

    /// Whether unsaved edits exist. Set explicitly by every mutating
    /// operation, never inferred by deep comparison.
    pub fn is_dirty(&self) -> bool {
        self.state.lock().unwrap().dirty
    }

    /// Dashboard-level load failure, if any.
    pub fn load_error(&self) -> Option<String> {
        self.state.lock().unwrap().load_error.clone()
    }
}

fn apply_widget_result(
    state: &mut ExecutorState,
    id: WidgetId,
    title: &str,
    result: Result<QueryResult, GatewayError>,
) {
    let entry = state.widget_states.entry(id).or_default();
    entry.loading = false;
    match result {
        Ok(data) => {
            entry.result = Some(data);
            entry.error = None;
            entry.last_refreshed_at = Some(Utc::now());
        }
        Err(err) => {
            tracing::warn!(widget = %id, error = %err, "widget query failed");
            entry.result = None;
            entry.error = Some(format!("{}: {}", title, err));
        }
    }
}
