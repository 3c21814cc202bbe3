//! Status effect definitions.
//!
//! A `StatusEffect` is a shared, immutable bundle of modifiers with a
//! duration and a stacking rule. Each application of an effect to an
//! entity creates a `RuntimeStatusEffect` that remembers when it expires.

use crate::modifier::{ModifierRef, StatModifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

/// Identity of a status effect for stacking purposes.
///
/// Distinct from the display name: two effects with the same id share a
/// stacking lane even if they are named differently.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct EffectId(Arc<str>);

impl EffectId {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        Self(Arc::from(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EffectId {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for EffectId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for EffectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EffectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(EffectId::from(String::deserialize(deserializer)?))
    }
}

/// How a new application interacts with active instances of the same id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackingRule {
    /// Every application adds an independent instance.
    #[default]
    Stack,
    /// Reset the timer of the existing instance.
    Refresh,
    /// Revoke all existing instances, then apply.
    Overwrite,
    /// Do nothing while an instance is active.
    Ignore,
}

/// Duration value meaning "never expires".
pub const INFINITE_DURATION: f64 = -1.0;

/// A buff or debuff definition.
///
/// # Examples
///
/// ```rust
/// use statforge::{StackingRule, StatModifier, StatusEffect};
///
/// let poison = StatusEffect::new("Poison", 5.0, StackingRule::Refresh)
///     .with_modifier(StatModifier::flat("Health", -10.0));
///
/// assert_eq!(poison.expire_time(2.0), Some(7.0));
/// assert_eq!(poison.modifiers().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct StatusEffect {
    id: EffectId,
    name: String,
    description: String,
    duration: f64,
    stacking_rule: StackingRule,
    modifiers: Vec<ModifierRef>,
}

impl StatusEffect {
    /// Create an effect whose display name equals its id.
    pub fn new(id: impl Into<EffectId>, duration: f64, stacking_rule: StackingRule) -> Self {
        let id = id.into();
        Self {
            name: id.as_str().to_string(),
            id,
            description: String::new(),
            duration,
            stacking_rule,
            modifiers: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_modifier(mut self, modifier: StatModifier) -> Self {
        self.modifiers.push(modifier.into_ref());
        self
    }

    /// Share the definition.
    pub fn into_shared(self) -> Arc<StatusEffect> {
        Arc::new(self)
    }

    pub fn id(&self) -> &EffectId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Duration in seconds; negative means infinite.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_infinite(&self) -> bool {
        self.duration < 0.0
    }

    pub fn stacking_rule(&self) -> StackingRule {
        self.stacking_rule
    }

    pub fn modifiers(&self) -> &[ModifierRef] {
        &self.modifiers
    }

    /// When an application at `now` would expire, if ever.
    pub fn expire_time(&self, now: f64) -> Option<f64> {
        if self.is_infinite() {
            None
        } else {
            Some(now + self.duration)
        }
    }
}

/// One active application of a status effect.
#[derive(Debug, Clone)]
pub struct RuntimeStatusEffect {
    source: Arc<StatusEffect>,
    expire_time: Option<f64>,
}

impl RuntimeStatusEffect {
    pub fn new(source: Arc<StatusEffect>, now: f64) -> Self {
        let expire_time = source.expire_time(now);
        Self {
            source,
            expire_time,
        }
    }

    pub fn source(&self) -> &Arc<StatusEffect> {
        &self.source
    }

    pub fn expire_time(&self) -> Option<f64> {
        self.expire_time
    }

    /// Restart the timer from `now`.
    pub fn refresh(&mut self, now: f64) {
        self.expire_time = self.source.expire_time(now);
    }

    /// Restart the timer from `now` with the duration of `applied`, which
    /// may be a different definition sharing this instance's id.
    pub fn refresh_from(&mut self, applied: &StatusEffect, now: f64) {
        self.expire_time = applied.expire_time(now);
    }

    pub fn is_expired(&self, now: f64) -> bool {
        matches!(self.expire_time, Some(t) if now >= t)
    }

    /// Seconds left at `now`, `None` for infinite effects.
    pub fn remaining(&self, now: f64) -> Option<f64> {
        self.expire_time.map(|t| (t - now).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_defaults_to_id() {
        let effect = StatusEffect::new("Haste", 3.0, StackingRule::Stack);
        assert_eq!(effect.name(), "Haste");
        let renamed = effect.with_name("Swiftness");
        assert_eq!(renamed.name(), "Swiftness");
        assert_eq!(renamed.id().as_str(), "Haste");
    }

    #[test]
    fn test_infinite_duration() {
        let effect = StatusEffect::new("Level", INFINITE_DURATION, StackingRule::Overwrite).into_shared();
        let active = RuntimeStatusEffect::new(effect, 10.0);
        assert_eq!(active.expire_time(), None);
        assert!(!active.is_expired(1.0e9));
        assert_eq!(active.remaining(50.0), None);
    }

    #[test]
    fn test_expiry_and_refresh() {
        let effect = StatusEffect::new("Poison", 5.0, StackingRule::Refresh).into_shared();
        let mut active = RuntimeStatusEffect::new(effect, 0.0);
        assert_eq!(active.expire_time(), Some(5.0));
        assert!(!active.is_expired(4.9));
        assert!(active.is_expired(5.0));

        active.refresh(2.0);
        assert_eq!(active.expire_time(), Some(7.0));
        assert_eq!(active.remaining(6.0), Some(1.0));
        assert_eq!(active.remaining(9.0), Some(0.0));
    }

    #[test]
    fn test_refresh_from_other_definition() {
        let short = StatusEffect::new("Poison", 5.0, StackingRule::Refresh).into_shared();
        let lingering = StatusEffect::new("Poison", 12.0, StackingRule::Refresh);
        let mut active = RuntimeStatusEffect::new(short, 0.0);

        active.refresh_from(&lingering, 1.0);
        assert_eq!(active.expire_time(), Some(13.0));
        assert_eq!(active.source().duration(), 5.0);

        active.refresh_from(&StatusEffect::new("Poison", INFINITE_DURATION, StackingRule::Refresh), 2.0);
        assert_eq!(active.expire_time(), None);
    }

    #[test]
    fn test_stacking_rule_serde() {
        let rule: StackingRule = serde_json::from_str("\"Overwrite\"").unwrap();
        assert_eq!(rule, StackingRule::Overwrite);
    }
}
