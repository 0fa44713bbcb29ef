//! REST gateway client.
//!
//! Every request carries the tenant/user identity headers; failure bodies are
//! decoded into human-readable messages before they leave this module.

use async_trait::async_trait;
use facet_core::{
    Dashboard, DashboardId, DatabaseSchema, PinnedDashboard, QueryDefinition, QueryResult, Widget,
    WidgetId,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{decode_error_message, GatewayError};
use crate::traits::{DashboardGateway, PinGateway, QueryGateway};
use crate::types::{
    CreateDashboardRequest, ExecuteSqlRequest, LayoutUpdateRequest, PinRequest, QueryRequest,
    QueryValidation, ReorderPinsRequest, SqlResponse, SqlValidation, UpdateDashboardRequest,
    WidgetPlacement,
};

/// Typed REST façade over the analytical backend.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    identity_headers: HeaderMap,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, GatewayError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let identity_headers = build_identity_headers(config)?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            identity_headers,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(url)
            .headers(self.identity_headers.clone())
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn get_json_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(url)
            .headers(self.identity_headers.clone())
            .query(query)
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(url)
            .headers(self.identity_headers.clone())
            .json(body)
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn post_json_with_query<T, B, Q>(
        &self,
        path: &str,
        body: &B,
        query: &Q,
    ) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(url)
            .headers(self.identity_headers.clone())
            .query(query)
            .json(body)
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn patch_json<T, B>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .patch(url)
            .headers(self.identity_headers.clone())
            .json(body)
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn put_json<T, B>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .put(url)
            .headers(self.identity_headers.clone())
            .json(body)
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn put_no_content<B>(&self, path: &str, body: &B) -> Result<(), GatewayError>
    where
        B: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .put(url)
            .headers(self.identity_headers.clone())
            .json(body)
            .send()
            .await?;
        self.expect_no_content(response).await
    }

    async fn delete_no_content<B>(&self, path: &str, body: Option<&B>) -> Result<(), GatewayError>
    where
        B: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .delete(url)
            .headers(self.identity_headers.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        self.expect_no_content(response).await
    }

    async fn parse_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            Err(self.decode_failure(response).await)
        }
    }

    async fn expect_no_content(&self, response: reqwest::Response) -> Result<(), GatewayError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.decode_failure(response).await)
        }
    }

    async fn decode_failure(&self, response: reqwest::Response) -> GatewayError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = decode_error_message(status.as_u16(), status.canonical_reason(), &text);
        tracing::warn!(status = status.as_u16(), %message, "gateway request failed");
        GatewayError::Http {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl QueryGateway for ApiClient {
    async fn fetch_schema(&self) -> Result<DatabaseSchema, GatewayError> {
        self.get_json("/api/v1/schema").await
    }

    async fn validate_query(
        &self,
        query: &QueryDefinition,
    ) -> Result<QueryValidation, GatewayError> {
        let body = QueryRequest {
            query: query.clone(),
        };
        self.post_json("/api/v1/query/validate", &body).await
    }

    async fn generate_sql(&self, query: &QueryDefinition) -> Result<String, GatewayError> {
        let body = QueryRequest {
            query: query.clone(),
        };
        let response: SqlResponse = self.post_json("/api/v1/query/sql", &body).await?;
        Ok(response.sql)
    }

    async fn execute_query(&self, query: &QueryDefinition) -> Result<QueryResult, GatewayError> {
        let body = QueryRequest {
            query: query.clone(),
        };
        self.post_json("/api/v1/query/execute", &body).await
    }

    async fn preview_query(
        &self,
        query: &QueryDefinition,
        limit: u64,
    ) -> Result<QueryResult, GatewayError> {
        let body = QueryRequest {
            query: query.clone(),
        };
        self.post_json_with_query("/api/v1/query/preview", &body, &[("limit", limit)])
            .await
    }

    async fn validate_sql(&self, sql: &str) -> Result<SqlValidation, GatewayError> {
        let body = serde_json::json!({ "sql": sql });
        self.post_json("/api/v1/query/validate-sql", &body).await
    }

    async fn execute_sql(
        &self,
        sql: &str,
        params: Option<&Value>,
    ) -> Result<QueryResult, GatewayError> {
        let body = ExecuteSqlRequest {
            sql: sql.to_string(),
            params: params.cloned(),
        };
        self.post_json("/api/v1/query/execute-sql", &body).await
    }
}

#[async_trait]
impl DashboardGateway for ApiClient {
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>, GatewayError> {
        self.get_json("/api/v1/dashboards").await
    }

    async fn get_dashboard(&self, id: DashboardId) -> Result<Dashboard, GatewayError> {
        self.get_json(&format!("/api/v1/dashboards/{}", id)).await
    }

    async fn create_dashboard(
        &self,
        request: &CreateDashboardRequest,
    ) -> Result<Dashboard, GatewayError> {
        self.post_json("/api/v1/dashboards", request).await
    }

    async fn update_dashboard(
        &self,
        id: DashboardId,
        request: &UpdateDashboardRequest,
    ) -> Result<Dashboard, GatewayError> {
        self.patch_json(&format!("/api/v1/dashboards/{}", id), request)
            .await
    }

    async fn delete_dashboard(&self, id: DashboardId) -> Result<(), GatewayError> {
        self.delete_no_content::<()>(&format!("/api/v1/dashboards/{}", id), None)
            .await
    }

    async fn create_widget(
        &self,
        dashboard_id: DashboardId,
        widget: &Widget,
    ) -> Result<Widget, GatewayError> {
        self.post_json(&format!("/api/v1/dashboards/{}/widgets", dashboard_id), widget)
            .await
    }

    async fn update_widget(
        &self,
        dashboard_id: DashboardId,
        widget: &Widget,
    ) -> Result<Widget, GatewayError> {
        self.patch_json(
            &format!("/api/v1/dashboards/{}/widgets/{}", dashboard_id, widget.id),
            widget,
        )
        .await
    }

    async fn delete_widget(
        &self,
        dashboard_id: DashboardId,
        widget_id: WidgetId,
    ) -> Result<(), GatewayError> {
        self.delete_no_content::<()>(
            &format!("/api/v1/dashboards/{}/widgets/{}", dashboard_id, widget_id),
            None,
        )
        .await
    }

    async fn update_layout(
        &self,
        dashboard_id: DashboardId,
        positions: &[WidgetPlacement],
    ) -> Result<(), GatewayError> {
        let body = LayoutUpdateRequest {
            positions: positions.to_vec(),
        };
        self.put_no_content(&format!("/api/v1/dashboards/{}/layout", dashboard_id), &body)
            .await
    }
}

#[async_trait]
impl PinGateway for ApiClient {
    async fn pin(&self, request: &PinRequest) -> Result<PinnedDashboard, GatewayError> {
        self.post_json("/api/v1/pins", request).await
    }

    async fn unpin(&self, dashboard_id: DashboardId, context: &str) -> Result<(), GatewayError> {
        let body = serde_json::json!({
            "dashboard_id": dashboard_id,
            "context": context,
        });
        self.delete_no_content("/api/v1/pins", Some(&body)).await
    }

    async fn pins_for_context(&self, context: &str) -> Result<Vec<PinnedDashboard>, GatewayError> {
        self.get_json_with_query("/api/v1/pins", &[("context", context)])
            .await
    }

    async fn pins_for_dashboard(
        &self,
        dashboard_id: DashboardId,
    ) -> Result<Vec<PinnedDashboard>, GatewayError> {
        self.get_json(&format!("/api/v1/dashboards/{}/pins", dashboard_id))
            .await
    }

    async fn reorder_pins(
        &self,
        request: &ReorderPinsRequest,
    ) -> Result<Vec<PinnedDashboard>, GatewayError> {
        self.put_json("/api/v1/pins/order", request).await
    }
}

fn build_identity_headers(config: &ClientConfig) -> Result<HeaderMap, GatewayError> {
    let mut headers = HeaderMap::new();
    let header_value = |value: &str, field: &str| {
        HeaderValue::from_str(value)
            .map_err(|_| GatewayError::Config(format!("invalid header value for {}", field)))
    };

    headers.insert(
        HeaderName::from_static("x-tenant-id"),
        header_value(&config.tenant_id.to_string(), "tenant_id")?,
    );
    headers.insert(
        HeaderName::from_static("x-user-id"),
        header_value(&config.user_id.to_string(), "user_id")?,
    );
    if let Some(api_key) = &config.auth.api_key {
        headers.insert(
            HeaderName::from_static("x-api-key"),
            header_value(api_key, "auth.api_key")?,
        );
    }
    if let Some(token) = &config.auth.bearer_token {
        headers.insert(
            HeaderName::from_static("authorization"),
            header_value(&format!("Bearer {}", token), "auth.bearer_token")?,
        );
    }
    Ok(headers)
}
