//! Enumeration types for the Bleed engine.
//!
//! Every enum here has a stable lowercase wire form shared by the JSON API,
//! the `PostgreSQL` text columns, and the generated `TypeScript` bindings.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Failure to parse an enum from its wire string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Implements `as_str`, `Display`, and `FromStr` from one variant table.
macro_rules! wire_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in canonical order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The lowercase wire form of this variant.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Echo status
// ---------------------------------------------------------------------------

/// Lifecycle state of an echo record.
///
/// ```text
/// pending --approve--> generating --complete--> completed
///    |
///    +-----reject----> rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EchoStatus {
    /// Created and awaiting human review.
    Pending,
    /// Approved; the content generator is producing the target event.
    Generating,
    /// The target event exists. Terminal.
    Completed,
    /// Declined during review. Terminal.
    Rejected,
}

wire_enum!(EchoStatus, "echo status", {
    Pending => "pending",
    Generating => "generating",
    Completed => "completed",
    Rejected => "rejected",
});

impl EchoStatus {
    /// Whether the lifecycle allows moving from `self` directly to `next`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Generating | Self::Rejected)
                | (Self::Generating, Self::Completed)
        )
    }
}

// ---------------------------------------------------------------------------
// Echo vector
// ---------------------------------------------------------------------------

/// Thematic channel through which an event bleeds into another world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EchoVector {
    /// Trade goods, prices, and markets.
    Commerce,
    /// Words and phrases crossing over.
    Language,
    /// Half-remembered histories.
    Memory,
    /// Generic sympathetic resonance; the fallback channel.
    Resonance,
    /// Buildings and spatial forms.
    Architecture,
    /// Dreams shared across worlds.
    Dream,
    /// Wants and longings.
    Desire,
}

wire_enum!(EchoVector, "echo vector", {
    Commerce => "commerce",
    Language => "language",
    Memory => "memory",
    Resonance => "resonance",
    Architecture => "architecture",
    Dream => "dream",
    Desire => "desire",
});

// ---------------------------------------------------------------------------
// Listing direction
// ---------------------------------------------------------------------------

/// Which side of an echo a world must be on to be listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EchoDirection {
    /// Echoes targeting the world.
    #[default]
    Incoming,
    /// Echoes originating from the world.
    Outgoing,
}

wire_enum!(EchoDirection, "echo direction", {
    Incoming => "incoming",
    Outgoing => "outgoing",
});

// ---------------------------------------------------------------------------
// World status
// ---------------------------------------------------------------------------

/// Activity status of a world, owned by the surrounding platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum WorldStatus {
    /// The world is running and producing events.
    Active,
    /// The world is frozen.
    Archived,
}

wire_enum!(WorldStatus, "world status", {
    Active => "active",
    Archived => "archived",
});

// ---------------------------------------------------------------------------
// Notification kind
// ---------------------------------------------------------------------------

/// What happened to an echo, as published on the notification stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum NotificationKind {
    /// A pending echo was created.
    Created,
    /// A pending echo was approved and handed to the content generator.
    Approved,
    /// A pending echo was rejected.
    Rejected,
    /// The content generator delivered the target event.
    Completed,
}

wire_enum!(NotificationKind, "notification kind", {
    Created => "created",
    Approved => "approved",
    Rejected => "rejected",
    Completed => "completed",
});
