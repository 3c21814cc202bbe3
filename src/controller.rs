//! Status effect controller.
//!
//! Tracks the active status effects of one entity and keeps their
//! modifiers applied to the entity's [`UnitStats`]. Effects sharing an
//! [`EffectId`] form a lane; a new application is resolved against the
//! lane according to the effect's [`StackingRule`]:
//!
//! | Rule      | Lane empty | Lane active                                            |
//! |-----------|------------|--------------------------------------------------------|
//! | Stack     | apply      | apply another instance                                 |
//! | Refresh   | apply      | restart the first instance's timer from the new effect |
//! | Overwrite | apply      | revoke every instance, then apply                      |
//! | Ignore    | apply      | nothing                                                |
//!
//! Time is supplied by the caller as a monotonic reading in seconds.
//! [`StatusEffectController::update`] must be called every tick to expire
//! timed effects.

use crate::effect::{EffectId, RuntimeStatusEffect, StackingRule, StatusEffect};
use crate::unit_stats::UnitStats;
use std::sync::Arc;
use tracing::debug;

/// What [`StatusEffectController::apply_status_effect`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new instance was created and its modifiers applied.
    Applied,
    /// An existing instance had its timer restarted.
    Refreshed,
    /// Existing instances were revoked and a new one applied.
    Overwritten,
    /// The lane was active and the rule said to skip.
    Ignored,
}

/// Active status effects of one entity, applied to the stats it owns.
///
/// # Examples
///
/// ```rust
/// use statforge::{
///     ApplyOutcome, Stat, StackingRule, StatModifier, StatusEffect, StatusEffectController,
///     UnitStats,
/// };
///
/// let stats = UnitStats::from_stats(vec![Stat::new("Speed", 10.0)]).unwrap();
/// let mut controller = StatusEffectController::new(stats);
///
/// let haste = StatusEffect::new("Haste", 3.0, StackingRule::Refresh)
///     .with_modifier(StatModifier::percentage("Speed", 50.0))
///     .into_shared();
///
/// assert_eq!(controller.apply_status_effect(&haste, 0.0), ApplyOutcome::Applied);
/// assert_eq!(controller.stats().formula_value(&"Speed".into()), 15.0);
///
/// controller.update(3.0);
/// assert_eq!(controller.stats().formula_value(&"Speed".into()), 10.0);
/// ```
#[derive(Debug)]
pub struct StatusEffectController {
    stats: UnitStats,
    active: Vec<RuntimeStatusEffect>,
}

impl StatusEffectController {
    pub fn new(stats: UnitStats) -> Self {
        Self {
            stats,
            active: Vec::new(),
        }
    }

    pub fn stats(&self) -> &UnitStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut UnitStats {
        &mut self.stats
    }

    /// Give back the stats. Modifiers of still-active effects stay
    /// applied.
    pub fn into_stats(self) -> UnitStats {
        self.stats
    }

    /// Apply `effect` at time `now` according to its stacking rule.
    pub fn apply_status_effect(&mut self, effect: &Arc<StatusEffect>, now: f64) -> ApplyOutcome {
        let lane_active = self.is_active(effect.id());

        let outcome = match (effect.stacking_rule(), lane_active) {
            (StackingRule::Ignore, true) => {
                debug!(effect = %effect.id(), "status effect already active, ignored");
                return ApplyOutcome::Ignored;
            }
            (StackingRule::Refresh, true) => {
                if let Some(existing) = self
                    .active
                    .iter_mut()
                    .find(|a| a.source().id() == effect.id())
                {
                    existing.refresh_from(effect, now);
                }
                debug!(effect = %effect.id(), name = effect.name(), "status effect refreshed");
                return ApplyOutcome::Refreshed;
            }
            (StackingRule::Overwrite, true) => {
                let removed = self.revoke_lane(effect.id());
                debug!(effect = %effect.id(), removed, "status effect overwritten");
                ApplyOutcome::Overwritten
            }
            _ => ApplyOutcome::Applied,
        };

        for modifier in effect.modifiers() {
            self.stats
                .add_modifier(modifier.stat(), modifier.clone(), true);
        }
        self.active
            .push(RuntimeStatusEffect::new(Arc::clone(effect), now));
        debug!(effect = %effect.id(), name = effect.name(), "status effect applied");
        outcome
    }

    /// Expire every timed instance whose time has come. Returns how many
    /// were removed.
    pub fn update(&mut self, now: f64) -> usize {
        let mut expired = 0;
        for i in (0..self.active.len()).rev() {
            if self.active[i].is_expired(now) {
                let instance = self.active.remove(i);
                self.revoke(&instance);
                debug!(effect = %instance.source().id(), "status effect expired");
                expired += 1;
            }
        }
        expired
    }

    /// Revoke every instance of `id`. Returns how many were removed.
    pub fn remove_status_effect(&mut self, id: &EffectId) -> usize {
        self.revoke_lane(id)
    }

    /// Revoke every active instance.
    pub fn clear_status_effects(&mut self) {
        for instance in std::mem::take(&mut self.active) {
            self.revoke(&instance);
        }
    }

    /// Active instances in application order.
    pub fn active_effects(&self) -> &[RuntimeStatusEffect] {
        &self.active
    }

    pub fn is_active(&self, id: &EffectId) -> bool {
        self.active.iter().any(|a| a.source().id() == id)
    }

    pub fn stack_count(&self, id: &EffectId) -> usize {
        self.active.iter().filter(|a| a.source().id() == id).count()
    }

    /// Longest remaining time among timed instances of `id`. `None` when
    /// the lane is empty or only holds infinite instances.
    pub fn remaining_time(&self, id: &EffectId, now: f64) -> Option<f64> {
        self.active
            .iter()
            .filter(|a| a.source().id() == id)
            .filter_map(|a| a.remaining(now))
            .reduce(f64::max)
    }

    fn revoke_lane(&mut self, id: &EffectId) -> usize {
        let (lane, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.active)
            .into_iter()
            .partition(|a| a.source().id() == id);
        self.active = rest;
        for instance in &lane {
            self.revoke(instance);
        }
        lane.len()
    }

    fn revoke(&mut self, instance: &RuntimeStatusEffect) {
        for modifier in instance.source().modifiers() {
            self.stats.remove_modifier(modifier.stat(), modifier, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::INFINITE_DURATION;
    use crate::modifier::StatModifier;
    use crate::stat::Stat;
    use crate::stat_id::StatId;

    fn controller() -> StatusEffectController {
        let stats = UnitStats::from_stats(vec![
            Stat::new("Strength", 10.0),
            Stat::new("Speed", 5.0),
        ])
        .unwrap();
        StatusEffectController::new(stats)
    }

    fn effect(id: &str, duration: f64, rule: StackingRule, value: f64) -> Arc<StatusEffect> {
        StatusEffect::new(id, duration, rule)
            .with_modifier(StatModifier::flat("Strength", value))
            .into_shared()
    }

    fn strength(c: &StatusEffectController) -> f64 {
        c.stats().formula_value(&StatId::from_str("Strength"))
    }

    #[test]
    fn test_ignore_while_active() {
        let mut c = controller();
        let rage = effect("Rage", 5.0, StackingRule::Ignore, 3.0);
        assert_eq!(c.apply_status_effect(&rage, 0.0), ApplyOutcome::Applied);
        assert_eq!(c.apply_status_effect(&rage, 1.0), ApplyOutcome::Ignored);
        assert_eq!(c.stack_count(rage.id()), 1);
        assert_eq!(strength(&c), 13.0);
    }

    #[test]
    fn test_refresh_resets_timer_without_reapplying() {
        let mut c = controller();
        let rage = effect("Rage", 5.0, StackingRule::Refresh, 3.0);
        c.apply_status_effect(&rage, 0.0);
        assert_eq!(c.apply_status_effect(&rage, 2.0), ApplyOutcome::Refreshed);
        assert_eq!(c.stack_count(rage.id()), 1);
        assert_eq!(c.active_effects()[0].expire_time(), Some(7.0));
        assert_eq!(strength(&c), 13.0);
    }

    #[test]
    fn test_refresh_uses_applied_duration() {
        let mut c = controller();
        let brief = effect("Rage", 5.0, StackingRule::Refresh, 3.0);
        let long = effect("Rage", 10.0, StackingRule::Refresh, 3.0);
        c.apply_status_effect(&brief, 0.0);
        assert_eq!(c.apply_status_effect(&long, 2.0), ApplyOutcome::Refreshed);
        assert_eq!(c.active_effects()[0].expire_time(), Some(12.0));

        c.update(7.0);
        assert!(c.is_active(brief.id()));
        assert_eq!(c.update(12.0), 1);
        assert_eq!(strength(&c), 10.0);
    }

    #[test]
    fn test_overwrite_replaces_lane() {
        let mut c = controller();
        let weak = effect("Might", 5.0, StackingRule::Stack, 2.0);
        let strong = effect("Might", 5.0, StackingRule::Overwrite, 7.0);
        c.apply_status_effect(&weak, 0.0);
        c.apply_status_effect(&weak, 0.0);
        assert_eq!(strength(&c), 14.0);

        assert_eq!(c.apply_status_effect(&strong, 1.0), ApplyOutcome::Overwritten);
        assert_eq!(c.stack_count(strong.id()), 1);
        assert!(Arc::ptr_eq(c.active_effects()[0].source(), &strong));
        assert_eq!(strength(&c), 17.0);
    }

    #[test]
    fn test_stack_twice() {
        let mut c = controller();
        let might = effect("Might", 5.0, StackingRule::Stack, 2.0);
        c.apply_status_effect(&might, 0.0);
        c.apply_status_effect(&might, 0.0);
        assert_eq!(c.stack_count(might.id()), 2);
        assert_eq!(strength(&c), 14.0);
        assert_eq!(
            c.stats().stat(&StatId::from_str("Strength")).unwrap().modifiers().len(),
            2
        );
    }

    #[test]
    fn test_lanes_are_independent() {
        let mut c = controller();
        let a = effect("A", 5.0, StackingRule::Ignore, 1.0);
        let b = effect("B", 5.0, StackingRule::Ignore, 2.0);
        c.apply_status_effect(&a, 0.0);
        assert_eq!(c.apply_status_effect(&b, 0.0), ApplyOutcome::Applied);
        assert_eq!(strength(&c), 13.0);
    }

    #[test]
    fn test_update_expires_in_place() {
        let mut c = controller();
        let short = effect("Short", 1.0, StackingRule::Stack, 1.0);
        let long = effect("Long", 10.0, StackingRule::Stack, 2.0);
        let forever = effect("Forever", INFINITE_DURATION, StackingRule::Stack, 4.0);
        c.apply_status_effect(&short, 0.0);
        c.apply_status_effect(&long, 0.0);
        c.apply_status_effect(&short, 0.5);
        c.apply_status_effect(&forever, 0.0);
        assert_eq!(strength(&c), 18.0);

        assert_eq!(c.update(0.99), 0);
        assert_eq!(c.update(1.0), 1);
        assert_eq!(c.update(1.5), 1);
        assert_eq!(strength(&c), 16.0);
        assert_eq!(c.update(1000.0), 1);
        assert_eq!(strength(&c), 14.0);
        assert!(c.is_active(forever.id()));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut c = controller();
        let might = effect("Might", 5.0, StackingRule::Stack, 2.0);
        let rage = effect("Rage", 5.0, StackingRule::Stack, 3.0);
        c.apply_status_effect(&might, 0.0);
        c.apply_status_effect(&might, 0.0);
        c.apply_status_effect(&rage, 0.0);

        assert_eq!(c.remove_status_effect(might.id()), 2);
        assert_eq!(strength(&c), 13.0);
        assert_eq!(c.remove_status_effect(might.id()), 0);

        c.clear_status_effects();
        assert!(c.active_effects().is_empty());
        assert_eq!(strength(&c), 10.0);
    }

    #[test]
    fn test_missing_stat_modifier_is_skipped() {
        let mut c = controller();
        let odd = StatusEffect::new("Odd", 5.0, StackingRule::Stack)
            .with_modifier(StatModifier::flat("Charisma", 5.0))
            .with_modifier(StatModifier::flat("Speed", 1.0))
            .into_shared();
        c.apply_status_effect(&odd, 0.0);
        assert_eq!(c.stats().formula_value(&StatId::from_str("Speed")), 6.0);
        c.update(5.0);
        assert_eq!(c.stats().formula_value(&StatId::from_str("Speed")), 5.0);
    }

    #[test]
    fn test_remaining_time() {
        let mut c = controller();
        let might = effect("Might", 5.0, StackingRule::Stack, 2.0);
        assert_eq!(c.remaining_time(might.id(), 0.0), None);
        c.apply_status_effect(&might, 0.0);
        c.apply_status_effect(&might, 2.0);
        assert_eq!(c.remaining_time(might.id(), 3.0), Some(4.0));
    }
}
