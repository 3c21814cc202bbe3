//! Change notification.
//!
//! `Listeners` is a synchronous observer list. Notification iterates a
//! snapshot of the registered callbacks, so the list itself can change
//! while a notification is in flight without corrupting the iteration.

use std::fmt;
use std::rc::Rc;

/// Handle returned by [`Listeners::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Callback = Rc<dyn Fn(f64)>;

/// A list of value-change callbacks.
///
/// # Examples
///
/// ```rust
/// use statforge::event::Listeners;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let seen = Rc::new(Cell::new(0.0));
/// let mut listeners = Listeners::new();
///
/// let sink = Rc::clone(&seen);
/// let id = listeners.subscribe(move |v| sink.set(v));
/// listeners.notify(42.0);
/// assert_eq!(seen.get(), 42.0);
///
/// assert!(listeners.unsubscribe(id));
/// listeners.notify(7.0);
/// assert_eq!(seen.get(), 42.0);
/// ```
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Callback)>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. Callbacks run in registration order.
    pub fn subscribe(&mut self, callback: impl Fn(f64) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Rc::new(callback)));
        id
    }

    /// Remove a callback. Returns `false` if the id was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Invoke every registered callback with `value`.
    pub fn notify(&self, value: f64) {
        if self.entries.is_empty() {
            return;
        }
        let snapshot: Vec<Callback> = self.entries.iter().map(|(_, cb)| Rc::clone(cb)).collect();
        for callback in snapshot {
            callback(value);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_notify_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::new();
        for tag in 0..3 {
            let log = Rc::clone(&log);
            listeners.subscribe(move |v| log.borrow_mut().push((tag, v)));
        }
        listeners.notify(1.5);
        assert_eq!(*log.borrow(), vec![(0, 1.5), (1, 1.5), (2, 1.5)]);
    }

    #[test]
    fn test_unsubscribe_unknown_id() {
        let mut listeners = Listeners::new();
        let id = listeners.subscribe(|_| {});
        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut listeners = Listeners::new();
        let a = listeners.subscribe(|_| {});
        listeners.unsubscribe(a);
        let b = listeners.subscribe(|_| {});
        assert_ne!(a, b);
    }

    #[test]
    fn test_clear() {
        let mut listeners = Listeners::new();
        listeners.subscribe(|_| {});
        listeners.subscribe(|_| {});
        assert_eq!(listeners.len(), 2);
        listeners.clear();
        assert!(listeners.is_empty());
    }
}
