//! Request and response payloads for the gateway endpoints.

use facet_core::{
    Dashboard, DashboardId, DashboardLayout, QueryDefinition, Widget, WidgetId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body for the query endpoints that take a full query definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: QueryDefinition,
}

/// Response of `POST query/sql`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlResponse {
    pub sql: String,
}

/// Response of `POST query/validate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryValidation {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Response of `POST query/validate-sql`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlValidation {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    /// Tables the statement references, populated on success.
    #[serde(default)]
    pub tables: Vec<String>,
}

impl SqlValidation {
    /// Join the structured error list into one display message.
    pub fn joined_errors(&self) -> String {
        self.errors.join("; ")
    }
}

/// Body for `POST query/execute-sql`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteSqlRequest {
    pub sql: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Body for `POST dashboards`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDashboardRequest {
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

impl From<&Dashboard> for CreateDashboardRequest {
    fn from(dashboard: &Dashboard) -> Self {
        Self {
            name: dashboard.name.clone(),
            description: dashboard.description.clone(),
            layout: dashboard.layout.clone(),
            widgets: dashboard.widgets.clone(),
            filters: dashboard.filters.clone(),
            is_public: dashboard.is_public,
        }
    }
}

/// Body for `PATCH dashboards/:id`. Absent fields are left untouched by the
/// backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateDashboardRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<DashboardLayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widgets: Option<Vec<Widget>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl From<&Dashboard> for UpdateDashboardRequest {
    fn from(dashboard: &Dashboard) -> Self {
        Self {
            name: Some(dashboard.name.clone()),
            description: dashboard.description.clone(),
            layout: Some(dashboard.layout.clone()),
            widgets: Some(dashboard.widgets.clone()),
            filters: Some(dashboard.filters.clone()),
            is_public: Some(dashboard.is_public),
        }
    }
}

/// One widget's grid placement, as persisted by `PUT dashboards/:id/layout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetPlacement {
    pub id: WidgetId,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Body for `PUT dashboards/:id/layout`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutUpdateRequest {
    pub positions: Vec<WidgetPlacement>,
}

/// Body for `POST pins`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinRequest {
    pub dashboard_id: DashboardId,
    pub context: String,
    /// Desired rank; the backend appends when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

/// Body for `PUT pins/order`. `dashboard_ids` must be the complete id set
/// for the context; partial reordering is undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderPinsRequest {
    pub context: String,
    pub dashboard_ids: Vec<DashboardId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_core::CompactType;

    #[test]
    fn test_update_request_serializes_only_present_fields() {
        let req = UpdateDashboardRequest {
            name: Some("Revenue".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Revenue" }));
    }

    #[test]
    fn test_create_request_from_dashboard() {
        let dashboard = Dashboard {
            id: None,
            name: "Ops".to_string(),
            description: Some("ops overview".to_string()),
            layout: DashboardLayout {
                columns: 24,
                row_height: 40,
                margin: 4,
                compact_type: CompactType::None,
            },
            widgets: Vec::new(),
            filters: Value::Null,
            is_public: true,
        };
        let req = CreateDashboardRequest::from(&dashboard);
        assert_eq!(req.name, "Ops");
        assert_eq!(req.layout.columns, 24);
        assert!(req.is_public);
    }

    #[test]
    fn test_sql_validation_joined_errors() {
        let validation = SqlValidation {
            valid: false,
            errors: vec!["syntax error".to_string(), "unknown table".to_string()],
            tables: Vec::new(),
        };
        assert_eq!(validation.joined_errors(), "syntax error; unknown table");
    }
}
