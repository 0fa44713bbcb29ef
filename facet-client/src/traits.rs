//! Gateway traits consumed by the engine.
//!
//! The engine's orchestration components are generic over these traits so
//! tests can substitute in-crate mocks; [`crate::ApiClient`] is the
//! production implementation of all three.

use async_trait::async_trait;
use facet_core::{
    Dashboard, DashboardId, DatabaseSchema, PinnedDashboard, QueryDefinition, QueryResult, Widget,
    WidgetId,
};
use serde_json::Value;

use crate::error::GatewayError;
use crate::types::{
    CreateDashboardRequest, PinRequest, QueryValidation, ReorderPinsRequest, SqlValidation,
    UpdateDashboardRequest, WidgetPlacement,
};

/// Query-related gateway operations: schema introspection, validation, SQL
/// generation and execution.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    /// `GET schema`.
    async fn fetch_schema(&self) -> Result<DatabaseSchema, GatewayError>;

    /// `POST query/validate`.
    async fn validate_query(&self, query: &QueryDefinition)
        -> Result<QueryValidation, GatewayError>;

    /// `POST query/sql`: generate SQL text without executing.
    async fn generate_sql(&self, query: &QueryDefinition) -> Result<String, GatewayError>;

    /// `POST query/execute`.
    async fn execute_query(&self, query: &QueryDefinition) -> Result<QueryResult, GatewayError>;

    /// `POST query/preview?limit=N`: bounded execution for editing flows.
    async fn preview_query(
        &self,
        query: &QueryDefinition,
        limit: u64,
    ) -> Result<QueryResult, GatewayError>;

    /// `POST query/validate-sql`.
    async fn validate_sql(&self, sql: &str) -> Result<SqlValidation, GatewayError>;

    /// `POST query/execute-sql`.
    async fn execute_sql(
        &self,
        sql: &str,
        params: Option<&Value>,
    ) -> Result<QueryResult, GatewayError>;
}

/// Dashboard CRUD and layout persistence.
#[async_trait]
pub trait DashboardGateway: Send + Sync {
    /// `GET dashboards`.
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>, GatewayError>;

    /// `GET dashboards/:id`.
    async fn get_dashboard(&self, id: DashboardId) -> Result<Dashboard, GatewayError>;

    /// `POST dashboards`.
    async fn create_dashboard(
        &self,
        request: &CreateDashboardRequest,
    ) -> Result<Dashboard, GatewayError>;

    /// `PATCH dashboards/:id`: partial update.
    async fn update_dashboard(
        &self,
        id: DashboardId,
        request: &UpdateDashboardRequest,
    ) -> Result<Dashboard, GatewayError>;

    /// `DELETE dashboards/:id`.
    async fn delete_dashboard(&self, id: DashboardId) -> Result<(), GatewayError>;

    /// `POST dashboards/:id/widgets`.
    async fn create_widget(
        &self,
        dashboard_id: DashboardId,
        widget: &Widget,
    ) -> Result<Widget, GatewayError>;

    /// `PATCH dashboards/:id/widgets/:wid`.
    async fn update_widget(
        &self,
        dashboard_id: DashboardId,
        widget: &Widget,
    ) -> Result<Widget, GatewayError>;

    /// `DELETE dashboards/:id/widgets/:wid`.
    async fn delete_widget(
        &self,
        dashboard_id: DashboardId,
        widget_id: WidgetId,
    ) -> Result<(), GatewayError>;

    /// `PUT dashboards/:id/layout`.
    async fn update_layout(
        &self,
        dashboard_id: DashboardId,
        positions: &[WidgetPlacement],
    ) -> Result<(), GatewayError>;
}

/// Pin operations.
#[async_trait]
pub trait PinGateway: Send + Sync {
    /// `POST pins`. The backend rejects a duplicate `(dashboard, context)`
    /// pair.
    async fn pin(&self, request: &PinRequest) -> Result<PinnedDashboard, GatewayError>;

    /// `DELETE pins`.
    async fn unpin(&self, dashboard_id: DashboardId, context: &str) -> Result<(), GatewayError>;

    /// `GET pins?context=`.
    async fn pins_for_context(&self, context: &str) -> Result<Vec<PinnedDashboard>, GatewayError>;

    /// `GET dashboards/:id/pins`.
    async fn pins_for_dashboard(
        &self,
        dashboard_id: DashboardId,
    ) -> Result<Vec<PinnedDashboard>, GatewayError>;

    /// `PUT pins/order`. `request.dashboard_ids` must be the complete id set
    /// for the context.
    async fn reorder_pins(
        &self,
        request: &ReorderPinsRequest,
    ) -> Result<Vec<PinnedDashboard>, GatewayError>;
}
