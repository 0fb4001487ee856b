//! Break length derived from the focus duration.
//!
//! A plain tier table: the first tier whose `max_focus_minutes` covers the
//! focus duration wins, anything longer gets the fallback.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakTier {
    /// Inclusive upper bound on the focus duration in minutes.
    pub max_focus_minutes: u32,
    pub break_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakPolicy {
    #[serde(default = "default_fallback_break_minutes")]
    pub fallback_break_minutes: u32,
    #[serde(default = "default_tiers")]
    pub tiers: Vec<BreakTier>,
}

fn default_tiers() -> Vec<BreakTier> {
    vec![
        BreakTier {
            max_focus_minutes: 25,
            break_minutes: 5,
        },
        BreakTier {
            max_focus_minutes: 45,
            break_minutes: 10,
        },
    ]
}

fn default_fallback_break_minutes() -> u32 {
    15
}

impl Default for BreakPolicy {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
            fallback_break_minutes: default_fallback_break_minutes(),
        }
    }
}

impl BreakPolicy {
    pub fn new(tiers: Vec<BreakTier>, fallback_break_minutes: u32) -> Self {
        Self {
            tiers,
            fallback_break_minutes,
        }
    }

    /// Suggested break in minutes for a focus session of `focus_minutes`.
    ///
    /// Tiers need not be sorted; the tightest covering tier is used.
    pub fn break_minutes(&self, focus_minutes: u32) -> u32 {
        self.tiers
            .iter()
            .filter(|tier| focus_minutes <= tier.max_focus_minutes)
            .min_by_key(|tier| tier.max_focus_minutes)
            .map(|tier| tier.break_minutes)
            .unwrap_or(self.fallback_break_minutes)
    }
}
