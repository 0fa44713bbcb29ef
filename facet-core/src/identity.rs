//! Identity types for Facet entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Common behavior for UUID-backed entity identifiers.
///
/// IDs use UUIDv7 so they sort naturally by creation time.
pub trait EntityIdType: Copy + Eq + std::hash::Hash {
    /// Wrap an existing UUID.
    fn new(id: Uuid) -> Self;

    /// Generate a fresh, timestamp-sortable ID.
    fn generate() -> Self
    where
        Self: Sized,
    {
        Self::new(Uuid::now_v7())
    }

    /// The underlying UUID.
    fn as_uuid(&self) -> Uuid;
}

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl EntityIdType for $name {
            fn new(id: Uuid) -> Self {
                Self(id)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

entity_id! {
    /// Identifier for a persisted dashboard.
    DashboardId
}

entity_id! {
    /// Identifier for a widget within a dashboard.
    WidgetId
}

entity_id! {
    /// Identifier for the tenant on whose behalf calls are made.
    TenantId
}

entity_id! {
    /// Identifier for the acting user.
    UserId
}
