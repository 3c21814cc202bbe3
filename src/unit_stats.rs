//! Stat container module.
//!
//! `UnitStats` owns every stat and runtime counter of one entity, the
//! dependency graph between them, and the propagation of changes.
//!
//! ## Lifecycle
//!
//! ```text
//! UnitStats::new(stats) → initialize() → add/remove modifiers, preview, ...
//!                              ↑
//!              re-run after adding stats or changing formulas
//! ```
//!
//! ## Propagation
//!
//! When a stat's basic value changes (with notification enabled), its own
//! listeners receive its new final value, then every direct dependent in
//! the dependency graph re-announces its final value and, if it has a
//! runtime counter, its new maximum. Formulas only read basic values, so
//! the dependents of a stat are exactly the stats whose value can move;
//! one hop is complete.

use crate::error::StatError;
use crate::event::ListenerId;
use crate::formula::Formula;
use crate::graph::DependencyGraph;
use crate::modifier::ModifierRef;
use crate::runtime::{RuntimeStat, RuntimeStatMut, RuntimeStatRef};
use crate::stat::Stat;
use crate::stat_id::StatId;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, trace, warn};

/// Stats in configuration order plus an id index.
///
/// The index is the dispatch table formulas resolve their variables
/// through; it is rebuilt by [`UnitStats::initialize`].
#[derive(Debug, Default)]
pub(crate) struct StatTable {
    stats: Vec<Stat>,
    index: HashMap<StatId, usize>,
}

impl StatTable {
    fn build_index(stats: &[Stat]) -> Result<HashMap<StatId, usize>, StatError> {
        let mut index = HashMap::with_capacity(stats.len());
        for (i, stat) in stats.iter().enumerate() {
            if index.insert(stat.id().clone(), i).is_some() {
                return Err(StatError::DuplicateStat(stat.id().clone()));
            }
        }
        Ok(index)
    }

    pub(crate) fn get(&self, id: &StatId) -> Option<&Stat> {
        self.index.get(id).map(|&i| &self.stats[i])
    }

    fn get_mut(&mut self, id: &StatId) -> Option<&mut Stat> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.stats[i]),
            None => None,
        }
    }

    pub(crate) fn basic_value(&self, id: &StatId) -> f64 {
        match self.get(id) {
            Some(stat) => stat.basic_final_value(),
            None => {
                warn!(stat = %id, "stat not found, using 0");
                0.0
            }
        }
    }

    pub(crate) fn formula_value(&self, id: &StatId) -> f64 {
        match self.get(id) {
            Some(stat) => stat.final_value(|dep| self.basic_value(dep)),
            None => {
                warn!(stat = %id, "stat not found, using 0");
                0.0
            }
        }
    }
}

/// Before/after values of one stat in a preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatPreviewChange {
    pub before: f64,
    pub after: f64,
}

impl StatPreviewChange {
    pub fn delta(&self) -> f64 {
        self.after - self.before
    }
}

/// Reused between previews to avoid reallocating.
#[derive(Debug, Default)]
struct PreviewScratch {
    affected: BTreeSet<StatId>,
    applied: Vec<(usize, ModifierRef)>,
    changes: BTreeMap<StatId, StatPreviewChange>,
}

impl PreviewScratch {
    fn clear(&mut self) {
        self.affected.clear();
        self.applied.clear();
        self.changes.clear();
    }
}

/// All stats of one entity.
///
/// # Examples
///
/// ```rust
/// use statforge::{Stat, StatModifier, UnitStats};
///
/// let mut stats = UnitStats::new(vec![
///     Stat::new("Strength", 10.0),
///     Stat::new("Damage", 0.0).with_formula("Strength * 2"),
/// ]);
/// stats.initialize().unwrap();
///
/// let strength = "Strength".into();
/// let damage = "Damage".into();
/// let buff = StatModifier::flat("Strength", 5.0).into_ref();
///
/// stats.add_modifier(&strength, buff.clone(), true);
/// assert_eq!(stats.formula_value(&damage), 30.0);
///
/// stats.remove_modifier(&strength, &buff, true);
/// assert_eq!(stats.formula_value(&damage), 20.0);
/// ```
#[derive(Debug, Default)]
pub struct UnitStats {
    table: StatTable,
    runtime: BTreeMap<StatId, RuntimeStat>,
    graph: DependencyGraph,
    preview: PreviewScratch,
}

impl UnitStats {
    /// Create a container. Nothing is resolvable until
    /// [`initialize`](Self::initialize) has run.
    pub fn new(stats: Vec<Stat>) -> Self {
        Self {
            table: StatTable {
                stats,
                index: HashMap::new(),
            },
            ..Self::default()
        }
    }

    /// Create and initialize a container.
    pub fn from_stats(stats: Vec<Stat>) -> Result<Self, StatError> {
        let mut unit = Self::new(stats);
        unit.initialize()?;
        Ok(unit)
    }

    /// Append a stat. Call [`initialize`](Self::initialize) afterwards.
    pub fn push_stat(&mut self, stat: Stat) {
        self.table.stats.push(stat);
    }

    /// Index the stats, rebuild the dependency graph and reconcile the
    /// runtime counters.
    ///
    /// Safe to call repeatedly. Existing runtime counters keep their
    /// current value and subscriptions; new ones start full. On error the
    /// previous state is left untouched.
    ///
    /// # Errors
    ///
    /// * [`StatError::DuplicateStat`] if two stats share an id
    /// * [`StatError::Cycle`] if formulas reference each other in a loop
    pub fn initialize(&mut self) -> Result<(), StatError> {
        let index = StatTable::build_index(&self.table.stats)?;
        let graph = DependencyGraph::build(&self.table.stats);
        graph.detect_cycles()?;

        for stat in self.table.stats.iter().filter(|s| !s.id().is_formula_name()) {
            warn!(stat = %stat.id(), "stat name cannot be referenced from formulas");
        }

        self.table.index = index;
        self.graph = graph;

        let mut runtime = BTreeMap::new();
        for stat in self.table.stats.iter().filter(|s| s.has_runtime_value()) {
            let id = stat.id().clone();
            let counter = match self.runtime.remove(&id) {
                Some(existing) => existing,
                None => RuntimeStat::new(id.clone(), self.table.formula_value(&id)),
            };
            runtime.insert(id, counter);
        }
        self.runtime = runtime;

        info!(
            stats = self.table.stats.len(),
            runtime = self.runtime.len(),
            dependencies = self.graph.edge_count(),
            "unit stats initialized"
        );
        Ok(())
    }

    pub fn contains(&self, id: &StatId) -> bool {
        self.table.index.contains_key(id)
    }

    pub fn stat(&self, id: &StatId) -> Option<&Stat> {
        self.table.get(id)
    }

    /// All stats in configuration order.
    pub fn stats(&self) -> impl Iterator<Item = &Stat> {
        self.table.stats.iter()
    }

    /// Stats not flagged hidden, in configuration order.
    pub fn visible_stats(&self) -> impl Iterator<Item = &Stat> {
        self.table.stats.iter().filter(|s| !s.is_hidden())
    }

    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Basic value (no formula) of a stat; `0` with a warning if missing.
    pub fn basic_value(&self, id: &StatId) -> f64 {
        self.table.basic_value(id)
    }

    /// Final value (through the formula) of a stat; `0` with a warning if
    /// missing or if the formula fails.
    pub fn formula_value(&self, id: &StatId) -> f64 {
        self.table.formula_value(id)
    }

    pub fn try_basic_value(&self, id: &StatId) -> Result<f64, StatError> {
        self.table
            .get(id)
            .map(Stat::basic_final_value)
            .ok_or_else(|| StatError::MissingStat(id.clone()))
    }

    pub fn try_formula_value(&self, id: &StatId) -> Result<f64, StatError> {
        let stat = self
            .table
            .get(id)
            .ok_or_else(|| StatError::MissingStat(id.clone()))?;
        stat.try_final_value(|dep| self.table.basic_value(dep))
    }

    pub fn runtime_stat(&self, id: &StatId) -> Option<RuntimeStatRef<'_>> {
        self.runtime
            .get(id)
            .map(|rt| RuntimeStatRef::new(rt, &self.table))
    }

    pub fn runtime_stat_mut(&mut self, id: &StatId) -> Option<RuntimeStatMut<'_>> {
        self.runtime
            .get_mut(id)
            .map(|rt| RuntimeStatMut::new(rt, &self.table))
    }

    /// Iterate runtime counters ordered by id.
    pub fn runtime_stats(&self) -> impl Iterator<Item = RuntimeStatRef<'_>> {
        self.runtime
            .values()
            .map(|rt| RuntimeStatRef::new(rt, &self.table))
    }

    /// Clamped add to a runtime counter; warns if there is none.
    pub fn add_to_runtime(&mut self, id: &StatId, amount: f64) {
        match self.runtime_stat_mut(id) {
            Some(mut runtime) => runtime.add(amount, true),
            None => warn!(stat = %id, "no runtime value for stat"),
        }
    }

    /// Subscribe to final-value changes of a stat.
    pub fn subscribe(
        &mut self,
        id: &StatId,
        callback: impl Fn(f64) + 'static,
    ) -> Option<ListenerId> {
        self.table.get_mut(id).map(|stat| stat.on_changed(callback))
    }

    pub fn unsubscribe(&mut self, id: &StatId, listener: ListenerId) -> bool {
        self.table
            .get_mut(id)
            .map_or(false, |stat| stat.unsubscribe(listener))
    }

    /// Drop every stat and runtime subscription.
    pub fn clear_all_listeners(&mut self) {
        for stat in &mut self.table.stats {
            stat.clear_listeners();
        }
        for runtime in self.runtime.values_mut() {
            runtime.clear_listeners();
        }
    }

    /// Apply a modifier to the stat `id`.
    ///
    /// With `notify`, the stat's listeners and its dependents are
    /// informed. If the stat has a runtime counter, a modifier flagged
    /// [`affects_runtime`](crate::StatModifier::affects_runtime) also
    /// moves its current value by the modifier's value, and the counter's
    /// maximum is re-announced either way. A missing stat is a warning and
    /// a no-op.
    pub fn add_modifier(&mut self, id: &StatId, modifier: ModifierRef, notify: bool) {
        let Some(stat) = self.table.get_mut(id) else {
            warn!(stat = %id, "cannot add modifier, stat not found");
            return;
        };
        stat.add_modifier(modifier.clone());
        if notify {
            self.propagate(id);
        }

        if let Some(runtime) = self.runtime.get_mut(id) {
            let max = self.table.formula_value(id);
            if modifier.affects_runtime() {
                runtime.add(modifier.value(), max, true);
            }
            runtime.notify_max(max);
        }
    }

    /// Remove a modifier from the stat `id` by identity.
    ///
    /// Returns whether the modifier was present. The runtime counter's
    /// maximum is re-announced regardless.
    pub fn remove_modifier(&mut self, id: &StatId, modifier: &ModifierRef, notify: bool) -> bool {
        let Some(stat) = self.table.get_mut(id) else {
            warn!(stat = %id, "cannot remove modifier, stat not found");
            return false;
        };
        let removed = stat.remove_modifier(modifier);
        if removed && notify {
            self.propagate(id);
        }
        self.refresh_runtime_max(id);
        removed
    }

    /// Remove every modifier of one stat, notifying.
    pub fn clear_modifiers(&mut self, id: &StatId) {
        let Some(stat) = self.table.get_mut(id) else {
            warn!(stat = %id, "cannot clear modifiers, stat not found");
            return;
        };
        stat.clear_modifiers();
        self.propagate(id);
        self.refresh_runtime_max(id);
    }

    /// Remove every modifier of every stat, notifying each.
    pub fn clear_all_modifiers(&mut self) {
        let ids: Vec<StatId> = self.table.stats.iter().map(|s| s.id().clone()).collect();
        for id in &ids {
            self.clear_modifiers(id);
        }
    }

    /// Change the base value of a stat.
    pub fn set_base_value(&mut self, id: &StatId, base_value: f64, notify: bool) {
        let Some(stat) = self.table.get_mut(id) else {
            warn!(stat = %id, "cannot set base value, stat not found");
            return;
        };
        stat.set_base_value(base_value);
        if notify {
            self.propagate(id);
        }
        self.refresh_runtime_max(id);
    }

    /// Replace the formula of a stat and re-initialize.
    ///
    /// # Errors
    ///
    /// * [`StatError::MissingStat`] if there is no such stat
    /// * [`StatError::Cycle`] if the new formula closes a loop; the
    ///   previous formula is restored
    pub fn set_formula(
        &mut self,
        id: &StatId,
        formula: Option<Formula>,
    ) -> Result<(), StatError> {
        let stat = self
            .table
            .get_mut(id)
            .ok_or_else(|| StatError::MissingStat(id.clone()))?;
        let previous = stat.formula().cloned();
        stat.set_formula(formula);

        if let Err(err) = self.initialize() {
            if let Some(stat) = self.table.get_mut(id) {
                stat.set_formula(previous);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Compute what a set of modifiers would do, without applying them.
    ///
    /// Every stat that directly depends on one of the input stats is
    /// reported with its final value before and after the hypothetical
    /// modifiers. The modifiers are applied silently and removed again
    /// before returning; no listener fires, no runtime counter moves, and
    /// every modifier list ends up exactly as it was.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statforge::{Stat, StatId, StatModifier, UnitStats};
    /// use std::collections::BTreeMap;
    ///
    /// let mut stats = UnitStats::from_stats(vec![
    ///     Stat::new("Strength", 10.0),
    ///     Stat::new("Damage", 0.0).with_formula("Strength * 2"),
    /// ])
    /// .unwrap();
    ///
    /// let mut sword = BTreeMap::new();
    /// sword.insert(
    ///     StatId::from_str("Strength"),
    ///     vec![StatModifier::flat("Strength", 5.0).into_ref()],
    /// );
    ///
    /// let preview = stats.preview_stat_changes(&sword);
    /// let damage = preview[&StatId::from_str("Damage")];
    /// assert_eq!((damage.before, damage.after), (20.0, 30.0));
    /// assert_eq!(stats.formula_value(&"Damage".into()), 20.0);
    /// ```
    pub fn preview_stat_changes<'m, I>(
        &mut self,
        modifiers_per_stat: I,
    ) -> &BTreeMap<StatId, StatPreviewChange>
    where
        I: IntoIterator<Item = (&'m StatId, &'m Vec<ModifierRef>)>,
    {
        let mut scratch = std::mem::take(&mut self.preview);
        scratch.clear();

        for (id, modifiers) in modifiers_per_stat {
            scratch.affected.extend(self.graph.dependents(id));
            match self.table.index.get(id) {
                Some(&i) => scratch
                    .applied
                    .extend(modifiers.iter().map(|m| (i, m.clone()))),
                None => warn!(stat = %id, "preview skips modifiers for unknown stat"),
            }
        }

        for id in &scratch.affected {
            let before = self.table.formula_value(id);
            scratch
                .changes
                .insert(id.clone(), StatPreviewChange { before, after: before });
        }

        for (i, modifier) in &scratch.applied {
            self.table.stats[*i].add_modifier(modifier.clone());
        }

        for (id, change) in scratch.changes.iter_mut() {
            change.after = self.table.formula_value(id);
        }

        for (i, modifier) in scratch.applied.iter().rev() {
            self.table.stats[*i].pop_modifier(modifier);
        }
        scratch.applied.clear();

        debug!(affected = scratch.changes.len(), "stat preview computed");
        self.preview = scratch;
        &self.preview.changes
    }

    /// [`preview_stat_changes`](Self::preview_stat_changes) as a list of
    /// `(stat, before, after)` ordered by stat id.
    pub fn preview_stat_change_list<'m, I>(&mut self, modifiers_per_stat: I) -> Vec<(StatId, f64, f64)>
    where
        I: IntoIterator<Item = (&'m StatId, &'m Vec<ModifierRef>)>,
    {
        self.preview_stat_changes(modifiers_per_stat)
            .iter()
            .map(|(id, change)| (id.clone(), change.before, change.after))
            .collect()
    }

    /// Log one line per dependency source.
    pub fn log_dependency_graph(&self) {
        for (source, dependents) in self.graph.to_adjacency() {
            let names: Vec<&str> = dependents.iter().map(StatId::as_str).collect();
            info!("{} affects: {}", source, names.join(", "));
        }
    }

    fn propagate(&self, id: &StatId) {
        if let Some(stat) = self.table.get(id) {
            stat.listeners().notify(self.table.formula_value(id));
        }
        for dependent in self.graph.dependents(id) {
            trace!(source = %id, dependent = %dependent, "propagating change");
            if let Some(stat) = self.table.get(&dependent) {
                stat.listeners().notify(self.table.formula_value(&dependent));
            }
            if let Some(runtime) = self.runtime.get(&dependent) {
                runtime.notify_max(self.table.formula_value(&dependent));
            }
        }
    }

    fn refresh_runtime_max(&self, id: &StatId) {
        if let Some(runtime) = self.runtime.get(id) {
            runtime.notify_max(self.table.formula_value(id));
        }
    }
}
