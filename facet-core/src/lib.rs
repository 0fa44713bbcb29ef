//! Facet Core - Query Model and Entity Types
//!
//! Pure data structures and side-effect-free query model operations. All
//! other Facet crates depend on this; it contains no I/O and no async code.
//!
//! The central type is [`QueryDefinition`], an immutable-by-replacement value
//! object: every edit returns a new definition, so callers can rely on cheap
//! snapshot equality for change detection.

pub mod dashboard;
pub mod error;
pub mod identity;
pub mod query;
pub mod result;
pub mod schema;

pub use dashboard::{
    CompactType, CrossFilter, Dashboard, DashboardLayout, PinnedDashboard, Widget, WidgetPosition,
};
pub use error::ModelError;
pub use identity::{DashboardId, EntityIdType, TenantId, Timestamp, UserId, WidgetId};
pub use query::{
    default_filter_seed, default_join_seed, Aggregation, ColumnSelection, FilterDefinition,
    FilterOperator, FilterValue, JoinDefinition, JoinType, QueryDefinition, QueryTable,
    SortDefinition, SortDirection, ValueShape,
};
pub use result::QueryResult;
pub use schema::{ColumnSchema, DataType, DatabaseSchema, Relationship, TableSchema};
