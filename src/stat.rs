//! Stats.
//!
//! A `Stat` is one named attribute of an entity: a base value, bounds, the
//! modifiers currently applied to it, and optionally a formula that
//! derives its value from other stats.
//!
//! A stat has two readings:
//!
//! ```text
//! basic = clamp(base + Σflat + base · Σpct / 100, min, max)
//! final = clamp(formula(basic values of referenced stats), min, max)   // with a formula
//!       = basic                                                        // without
//! ```
//!
//! Percentages always apply to the base value and never compound on each
//! other. Formulas read the *basic* value of every stat they reference,
//! so evaluation never recurses through another formula.

use crate::error::StatError;
use crate::event::{ListenerId, Listeners};
use crate::formula::Formula;
use crate::modifier::ModifierRef;
use crate::stat_id::StatId;
use std::sync::Arc;
use tracing::warn;

/// A single named attribute.
///
/// # Examples
///
/// ```rust
/// use statforge::{Stat, StatModifier};
///
/// let mut speed = Stat::new("Speed", 10.0).with_max(15.0);
/// speed.add_modifier(StatModifier::flat("Speed", 2.0).into_ref());
/// speed.add_modifier(StatModifier::percentage("Speed", 50.0).into_ref());
///
/// // 10 + 2 + 10 * 0.5 = 17, clamped to 15
/// assert_eq!(speed.basic_final_value(), 15.0);
/// ```
#[derive(Debug)]
pub struct Stat {
    id: StatId,
    base_value: f64,
    min_value: f64,
    max_value: Option<f64>,
    has_runtime_value: bool,
    hidden: bool,
    formula: Option<Formula>,
    modifiers: Vec<ModifierRef>,
    listeners: Listeners,
}

impl Stat {
    /// Create a stat with a minimum of `0` and no maximum.
    pub fn new(id: impl Into<StatId>, base_value: f64) -> Self {
        Self {
            id: id.into(),
            base_value,
            min_value: 0.0,
            max_value: None,
            has_runtime_value: false,
            hidden: false,
            formula: None,
            modifiers: Vec::new(),
            listeners: Listeners::new(),
        }
    }

    pub fn with_min(mut self, min_value: f64) -> Self {
        self.min_value = min_value;
        self
    }

    pub fn with_max(mut self, max_value: f64) -> Self {
        self.max_value = Some(max_value);
        self
    }

    /// Give the stat a runtime counter (current/max) in its container.
    pub fn with_runtime_value(mut self) -> Self {
        self.has_runtime_value = true;
        self
    }

    pub fn with_formula(mut self, formula: impl Into<Formula>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    /// Exclude the stat from [`UnitStats::visible_stats`](crate::UnitStats::visible_stats).
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn id(&self) -> &StatId {
        &self.id
    }

    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    pub(crate) fn set_base_value(&mut self, base_value: f64) {
        self.base_value = base_value;
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> Option<f64> {
        self.max_value
    }

    pub fn has_runtime_value(&self) -> bool {
        self.has_runtime_value
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn formula(&self) -> Option<&Formula> {
        self.formula.as_ref()
    }

    /// Replace the formula. The owning container must be re-initialized
    /// for the dependency graph to pick up the change.
    pub fn set_formula(&mut self, formula: Option<Formula>) {
        self.formula = formula;
    }

    pub fn modifiers(&self) -> &[ModifierRef] {
        &self.modifiers
    }

    pub fn flat_modifiers(&self) -> impl Iterator<Item = &ModifierRef> {
        self.modifiers.iter().filter(|m| !m.is_percentage())
    }

    pub fn percentage_modifiers(&self) -> impl Iterator<Item = &ModifierRef> {
        self.modifiers.iter().filter(|m| m.is_percentage())
    }

    /// Value from base and modifiers only, ignoring any formula.
    pub fn basic_final_value(&self) -> f64 {
        let mut flat = 0.0;
        let mut percent = 0.0;
        for modifier in &self.modifiers {
            if modifier.is_percentage() {
                percent += modifier.value();
            } else {
                flat += modifier.value();
            }
        }
        self.clamp(self.base_value + flat + self.base_value * percent / 100.0)
    }

    /// Value through the formula, if any.
    ///
    /// `resolve` supplies the basic value of each stat the formula names.
    /// A formula that fails to parse or evaluate yields `0` and logs a
    /// warning.
    pub fn final_value(&self, resolve: impl FnMut(&StatId) -> f64) -> f64 {
        match self.try_final_value(resolve) {
            Ok(value) => value,
            Err(err) => {
                warn!(stat = %self.id, error = %err, "formula evaluation failed, using 0");
                0.0
            }
        }
    }

    /// Like [`final_value`](Self::final_value) but reports formula errors.
    pub fn try_final_value(&self, resolve: impl FnMut(&StatId) -> f64) -> Result<f64, StatError> {
        match &self.formula {
            None => Ok(self.basic_final_value()),
            Some(formula) => formula.evaluate(resolve).map(|v| self.clamp(v)),
        }
    }

    /// Append a modifier. Notification is the container's job.
    pub fn add_modifier(&mut self, modifier: ModifierRef) {
        self.modifiers.push(modifier);
    }

    /// Remove the first occurrence of `modifier` (by identity).
    pub fn remove_modifier(&mut self, modifier: &ModifierRef) -> bool {
        match self.modifiers.iter().position(|m| Arc::ptr_eq(m, modifier)) {
            Some(index) => {
                self.modifiers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove the last occurrence of `modifier`, undoing the latest push.
    pub(crate) fn pop_modifier(&mut self, modifier: &ModifierRef) -> bool {
        match self.modifiers.iter().rposition(|m| Arc::ptr_eq(m, modifier)) {
            Some(index) => {
                self.modifiers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear_modifiers(&mut self) {
        self.modifiers.clear();
    }

    /// Subscribe to changes of the stat's final value.
    pub fn on_changed(&mut self, callback: impl Fn(f64) + 'static) -> ListenerId {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub(crate) fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    fn clamp(&self, value: f64) -> f64 {
        if value < self.min_value {
            return self.min_value;
        }
        match self.max_value {
            Some(max) if value > max => max,
            _ => value,
        }
    }
}
