//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Worlds, connections, events, and echoes all carry a strongly-typed ID so a
//! world ID can never be passed where an event ID is expected. App-side
//! generation uses UUID v7 (time-ordered) for index locality.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a simulated world (node in the connection graph).
    WorldId
}

define_id! {
    /// Unique identifier for a bleed connection (edge in the connection graph).
    ConnectionId
}

define_id! {
    /// Unique identifier for a narrative event produced by a world.
    EventId
}

define_id! {
    /// Unique identifier for an echo (propagation record).
    EchoId
}

define_id! {
    /// Unique identifier for a campaign that amplified an event.
    CampaignId
}
