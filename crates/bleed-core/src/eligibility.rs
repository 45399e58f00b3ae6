//! Eligibility rules: may this event propagate at all?
//!
//! Rules run in order and stop at the first failure:
//!
//! 1. impact at least [`MIN_IMPACT`]
//! 2. propagation enabled for the source world
//! 3. impact at least the configured minimum, raised by
//!    [`CAMPAIGN_IMPACT_PENALTY`] for campaign-amplified events
//! 4. for echo-produced events, recorded depth below the cascade limit
//!
//! The depth rule is the only cascade terminator and always looks at the
//! incoming event's depth, not the depth the new echoes would get.

use bleed_types::{MIN_IMPACT, SourceEvent};

use crate::settings::PropagationSettings;

/// Extra impact a campaign-amplified event needs to qualify.
pub const CAMPAIGN_IMPACT_PENALTY: i32 = 1;

/// The first rule an event failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Ineligible {
    /// Impact below the absolute floor.
    #[error("impact {impact} below floor {MIN_IMPACT}")]
    BelowFloor {
        /// Event impact.
        impact: i32,
    },

    /// The source world has propagation switched off.
    #[error("propagation disabled for source world")]
    Disabled,

    /// Impact below the (possibly campaign-raised) threshold.
    #[error("impact {impact} below threshold {threshold}")]
    BelowThreshold {
        /// Event impact.
        impact: i32,
        /// Effective minimum.
        threshold: i32,
    },

    /// The event is already as deep in a cascade as allowed.
    #[error("cascade depth {depth} reached limit {limit}")]
    DepthExhausted {
        /// Depth recorded on the incoming event.
        depth: u32,
        /// Configured limit.
        limit: u32,
    },
}

/// Check every rule and report the first failure.
///
/// # Errors
///
/// Returns the [`Ineligible`] reason for the first rule the event fails.
pub fn check(event: &SourceEvent, settings: &PropagationSettings) -> Result<(), Ineligible> {
    if event.impact_level < MIN_IMPACT {
        return Err(Ineligible::BelowFloor {
            impact: event.impact_level,
        });
    }

    if !settings.bleed_enabled {
        return Err(Ineligible::Disabled);
    }

    let threshold = if event.campaign_id.is_some() {
        settings.min_impact.saturating_add(CAMPAIGN_IMPACT_PENALTY)
    } else {
        settings.min_impact
    };
    if event.impact_level < threshold {
        return Err(Ineligible::BelowThreshold {
            impact: event.impact_level,
            threshold,
        });
    }

    if event.is_bleed() {
        let depth = event.prior_depth().unwrap_or(0);
        if depth >= settings.max_cascade_depth {
            return Err(Ineligible::DepthExhausted {
                depth,
                limit: settings.max_cascade_depth,
            });
        }
    }

    Ok(())
}

/// Whether `event` may propagate under `settings`.
pub fn evaluate(event: &SourceEvent, settings: &PropagationSettings) -> bool {
    match check(event, settings) {
        Ok(()) => true,
        Err(reason) => {
            tracing::debug!(event_id = %event.id, %reason, "Event not eligible for propagation");
            false
        }
    }
}
