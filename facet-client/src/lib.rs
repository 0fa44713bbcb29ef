//! Facet Client - Typed REST Gateway
//!
//! Thin typed façade over the analytical backend's HTTP API. The engine
//! consumes the [`QueryGateway`], [`DashboardGateway`] and [`PinGateway`]
//! traits; [`ApiClient`] is the production implementation of all three.
//!
//! Call discipline is part of the contract: every request carries the
//! tenant/user identity headers, and failure responses are decoded into
//! human-readable messages (`detail` field, then `"<status> <reason>"`
//! fallback) before they reach callers.

pub mod client;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use client::ApiClient;
pub use config::{AuthConfig, ClientConfig, ConfigError};
pub use error::{decode_error_message, GatewayError};
pub use traits::{DashboardGateway, PinGateway, QueryGateway};
pub use types::{
    CreateDashboardRequest, ExecuteSqlRequest, LayoutUpdateRequest, PinRequest, QueryRequest,
    QueryValidation, ReorderPinsRequest, SqlResponse, SqlValidation, UpdateDashboardRequest,
    WidgetPlacement,
};
