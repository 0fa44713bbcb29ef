//! Dashboard, widget and pin entities.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::{DashboardId, Timestamp, WidgetId};
use crate::query::QueryDefinition;

/// Grid placement of a widget. Mutated independently of the widget body by
/// layout-change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetPosition {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub min_w: u32,
    pub min_h: u32,
}

/// A dashboard cell bound to an optional query and a visualization type.
///
/// `widget_type` and `config` are opaque to the engine; rendering is an
/// external collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: WidgetId,
    pub widget_type: String,
    pub title: String,
    pub query: Option<QueryDefinition>,
    pub position: WidgetPosition,
    #[serde(default)]
    pub config: Value,
}

/// Layout compaction mode of the grid subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompactType {
    Vertical,
    Horizontal,
    None,
}

/// Grid configuration for a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardLayout {
    pub columns: u32,
    pub row_height: u32,
    pub margin: u32,
    pub compact_type: CompactType,
}

impl Default for DashboardLayout {
    fn default() -> Self {
        Self {
            columns: 12,
            row_height: 60,
            margin: 8,
            compact_type: CompactType::Vertical,
        }
    }
}

/// A dashboard under edit or display.
///
/// `id` is `None` until the first successful save; the in-memory copy is the
/// source of truth while editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: Option<DashboardId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub layout: DashboardLayout,
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub filters: Value,
    #[serde(default)]
    pub is_public: bool,
}

impl Dashboard {
    /// Look up a widget by id.
    pub fn find_widget(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }
}

/// A dashboard pinned to a named context (e.g. "accounts").
///
/// At most one pin exists per `(dashboard_id, context)` pair; `position` is a
/// dense zero-based rank unique within a context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinnedDashboard {
    pub dashboard_id: DashboardId,
    pub context: String,
    pub position: u32,
    pub pinned_at: Timestamp,
}

/// A selection made in one widget that narrows the data shown in others.
///
/// At most one cross-filter is active per source widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossFilter {
    pub source_widget_id: WidgetId,
    pub column: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
}
