//! Runtime counters.
//!
//! Stats flagged with a runtime value (health, mana, experience) get a
//! `RuntimeStat`: a current value that gameplay moves up and down between
//! `0` and the stat's final value. The maximum is never stored; it is
//! computed from the owning container every time it is needed, so it
//! always reflects the modifiers currently applied.
//!
//! The counter lives inside its [`UnitStats`](crate::UnitStats). Mutation
//! goes through [`RuntimeStatMut`], a borrowed view that pairs the counter
//! with the stat table it reads its maximum from. Because the view
//! borrows the container, a counter can never outlive its owner.

use crate::event::{ListenerId, Listeners};
use crate::stat_id::StatId;
use crate::unit_stats::StatTable;
use std::ops::{Deref, DerefMut};

/// Changes of the current value at or below this size are applied but
/// not announced.
pub const NOTIFY_EPSILON: f64 = 1e-3;

/// Current value of a bounded stat.
#[derive(Debug)]
pub struct RuntimeStat {
    id: StatId,
    current_value: f64,
    current_listeners: Listeners,
    max_listeners: Listeners,
}

impl RuntimeStat {
    pub(crate) fn new(id: StatId, current_value: f64) -> Self {
        Self {
            id,
            current_value,
            current_listeners: Listeners::new(),
            max_listeners: Listeners::new(),
        }
    }

    pub fn id(&self) -> &StatId {
        &self.id
    }

    pub fn current_value(&self) -> f64 {
        self.current_value
    }

    /// Subscribe to changes of the current value.
    pub fn on_current_changed(&mut self, callback: impl Fn(f64) + 'static) -> ListenerId {
        self.current_listeners.subscribe(callback)
    }

    /// Subscribe to changes of the maximum.
    pub fn on_max_changed(&mut self, callback: impl Fn(f64) + 'static) -> ListenerId {
        self.max_listeners.subscribe(callback)
    }

    pub fn unsubscribe_current(&mut self, id: ListenerId) -> bool {
        self.current_listeners.unsubscribe(id)
    }

    pub fn unsubscribe_max(&mut self, id: ListenerId) -> bool {
        self.max_listeners.unsubscribe(id)
    }

    pub fn clear_listeners(&mut self) {
        self.current_listeners.clear();
        self.max_listeners.clear();
    }

    pub(crate) fn add(&mut self, amount: f64, max: f64, clamp: bool) {
        self.set(self.current_value + amount, max, clamp);
    }

    pub(crate) fn set(&mut self, value: f64, max: f64, clamp: bool) {
        let old = self.current_value;
        self.current_value = if clamp { clamp_to(value, max) } else { value };
        if (old - self.current_value).abs() > NOTIFY_EPSILON {
            self.current_listeners.notify(self.current_value);
        }
    }

    pub(crate) fn restore_to_max(&mut self, max: f64) {
        self.current_value = max;
        self.current_listeners.notify(self.current_value);
    }

    pub(crate) fn notify_max(&self, max: f64) {
        self.max_listeners.notify(max);
    }
}

fn clamp_to(value: f64, max: f64) -> f64 {
    if value < 0.0 {
        0.0
    } else if value > max {
        max
    } else {
        value
    }
}

/// Read access to a runtime counter together with its maximum.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeStatRef<'a> {
    runtime: &'a RuntimeStat,
    table: &'a StatTable,
}

impl<'a> RuntimeStatRef<'a> {
    pub(crate) fn new(runtime: &'a RuntimeStat, table: &'a StatTable) -> Self {
        Self { runtime, table }
    }

    /// The stat's current final value.
    pub fn max_value(&self) -> f64 {
        self.table.formula_value(self.runtime.id())
    }
}

impl Deref for RuntimeStatRef<'_> {
    type Target = RuntimeStat;

    fn deref(&self) -> &RuntimeStat {
        self.runtime
    }
}

/// Mutable access to a runtime counter.
///
/// # Examples
///
/// ```rust
/// use statforge::{Stat, UnitStats};
///
/// let mut stats = UnitStats::new(vec![Stat::new("Health", 100.0).with_runtime_value()]);
/// stats.initialize().unwrap();
///
/// let mut health = stats.runtime_stat_mut(&"Health".into()).unwrap();
/// health.add(-150.0, true);
/// assert_eq!(health.current_value(), 0.0);
///
/// health.restore_to_max();
/// assert_eq!(health.current_value(), 100.0);
/// ```
#[derive(Debug)]
pub struct RuntimeStatMut<'a> {
    runtime: &'a mut RuntimeStat,
    table: &'a StatTable,
}

impl<'a> RuntimeStatMut<'a> {
    pub(crate) fn new(runtime: &'a mut RuntimeStat, table: &'a StatTable) -> Self {
        Self { runtime, table }
    }

    /// The stat's current final value.
    pub fn max_value(&self) -> f64 {
        self.table.formula_value(self.runtime.id())
    }

    /// Move the current value by `amount`, clamped to `[0, max]` when
    /// `clamp` is set.
    pub fn add(&mut self, amount: f64, clamp: bool) {
        let max = self.max_value();
        self.runtime.add(amount, max, clamp);
    }

    /// Set the current value, clamped to `[0, max]` when `clamp` is set.
    pub fn set(&mut self, value: f64, clamp: bool) {
        let max = self.max_value();
        self.runtime.set(value, max, clamp);
    }

    /// Fill the counter. Always notifies.
    pub fn restore_to_max(&mut self) {
        let max = self.max_value();
        self.runtime.restore_to_max(max);
    }

    /// Announce the freshly computed maximum without touching the
    /// current value.
    pub fn update_max_notify(&self) {
        self.runtime.notify_max(self.max_value());
    }
}

impl Deref for RuntimeStatMut<'_> {
    type Target = RuntimeStat;

    fn deref(&self) -> &RuntimeStat {
        self.runtime
    }
}

impl DerefMut for RuntimeStatMut<'_> {
    fn deref_mut(&mut self) -> &mut RuntimeStat {
        self.runtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(runtime: &mut RuntimeStat) -> Rc<RefCell<Vec<f64>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        runtime.on_current_changed(move |v| sink.borrow_mut().push(v));
        log
    }

    #[test]
    fn test_add_clamps() {
        let mut rt = RuntimeStat::new(StatId::from_str("Health"), 50.0);
        rt.add(-80.0, 100.0, true);
        assert_eq!(rt.current_value(), 0.0);
        rt.add(500.0, 100.0, true);
        assert_eq!(rt.current_value(), 100.0);
    }

    #[test]
    fn test_unclamped_may_exceed_bounds() {
        let mut rt = RuntimeStat::new(StatId::from_str("Experience"), 90.0);
        rt.add(25.0, 100.0, false);
        assert_eq!(rt.current_value(), 115.0);
        rt.set(-5.0, 100.0, false);
        assert_eq!(rt.current_value(), -5.0);
    }

    #[test]
    fn test_small_changes_are_silent() {
        let mut rt = RuntimeStat::new(StatId::from_str("Mana"), 10.0);
        let log = recorder(&mut rt);
        rt.add(0.0005, 100.0, true);
        rt.set(10.0, 100.0, true);
        assert!(log.borrow().is_empty());
        rt.add(1.0, 100.0, true);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_clamped_noop_is_silent() {
        let mut rt = RuntimeStat::new(StatId::from_str("Health"), 100.0);
        let log = recorder(&mut rt);
        rt.add(10.0, 100.0, true);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_restore_always_notifies() {
        let mut rt = RuntimeStat::new(StatId::from_str("Health"), 100.0);
        let log = recorder(&mut rt);
        rt.restore_to_max(100.0);
        assert_eq!(*log.borrow(), vec![100.0]);
    }

    #[test]
    fn test_max_notification() {
        let mut rt = RuntimeStat::new(StatId::from_str("Health"), 30.0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let id = rt.on_max_changed(move |v| sink.borrow_mut().push(v));
        rt.notify_max(120.0);
        assert_eq!(*log.borrow(), vec![120.0]);
        assert_eq!(rt.current_value(), 30.0);
        assert!(rt.unsubscribe_max(id));
        rt.notify_max(130.0);
        assert_eq!(log.borrow().len(), 1);
    }
}
