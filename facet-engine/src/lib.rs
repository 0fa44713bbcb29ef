//! Facet Engine - Query and Widget Orchestration
//!
//! Turns query edits into safe, cancellable, deduplicated network operations
//! and runs whole dashboards of widget queries with per-widget failure
//! isolation. All components are generic over the gateway traits from
//! `facet-client`, so tests (and alternative transports) substitute their
//! own implementations.
//!
//! # Concurrency model
//!
//! Cooperative async on the tokio runtime. Shared maps are guarded by
//! mutexes that are never held across an await; every operation that can be
//! superseded captures a monotonic sequence number at call time and compares
//! it at completion, so a stale response can never overwrite a newer result.
//! Superseded completions are dropped silently - cancellation is not an
//! error.

pub mod autosave;
pub mod cache;
pub mod controller;
pub mod crossfilter;
pub mod executor;
pub mod pins;
pub mod preview;

pub use autosave::{AutosaveConfig, LayoutAutosave, SaveState};
pub use cache::{CacheConfig, CacheStats, DashboardCache};
pub use controller::{
    ExecutionInput, ExecutionOutcome, ExecutionSnapshot, QueryExecutionController,
};
pub use crossfilter::CrossFilterBus;
pub use executor::{
    ExecutorConfig, LayoutChange, WidgetBatchExecutor, WidgetRunState,
};
pub use pins::{MutationState, PinOrdering};
pub use preview::{PreviewOutcome, PreviewState, SqlPreviewOrchestrator};
