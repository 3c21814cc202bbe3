//! Stat modifiers.
//!
//! A modifier is a small immutable value object targeting one stat. Stats
//! and status effects hold modifiers behind `Arc` and compare them by
//! pointer: two modifiers with identical fields are still distinct
//! entries for add/remove purposes.

use crate::stat_id::StatId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared handle to a modifier. Identity is the allocation, not the value.
pub type ModifierRef = Arc<StatModifier>;

/// A flat or percentage adjustment to a stat.
///
/// Percentage values are whole percents (`10.0` means +10% of the base
/// value).
///
/// # Examples
///
/// ```rust
/// use statforge::StatModifier;
///
/// let flat = StatModifier::flat("Strength", 5.0);
/// let pct = StatModifier::percentage("Strength", 10.0);
///
/// assert!(!flat.is_percentage());
/// assert!(pct.is_percentage());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    stat: StatId,
    value: f64,
    #[serde(default)]
    percentage: bool,
    #[serde(default)]
    affects_runtime: bool,
}

impl StatModifier {
    /// Create a flat modifier.
    pub fn flat(stat: impl Into<StatId>, value: f64) -> Self {
        Self {
            stat: stat.into(),
            value,
            percentage: false,
            affects_runtime: false,
        }
    }

    /// Create a percentage modifier, in whole percents of the base value.
    pub fn percentage(stat: impl Into<StatId>, value: f64) -> Self {
        Self {
            stat: stat.into(),
            value,
            percentage: true,
            affects_runtime: false,
        }
    }

    /// Mark the modifier as also nudging the runtime counter of its stat.
    ///
    /// When such a modifier is added to a container, the current value of
    /// the stat's runtime counter moves by `value` as well (a +10 max
    /// health buff also heals 10).
    pub fn affecting_runtime(mut self) -> Self {
        self.affects_runtime = true;
        self
    }

    /// Wrap into a shared handle.
    pub fn into_ref(self) -> ModifierRef {
        Arc::new(self)
    }

    /// The stat this modifier targets.
    pub fn stat(&self) -> &StatId {
        &self.stat
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_percentage(&self) -> bool {
        self.percentage
    }

    pub fn affects_runtime(&self) -> bool {
        self.affects_runtime
    }
}
