//! Broadcast events
//!
//! [`ModEvent`] is the basic multi-listener dispatch primitive. It is generic
//! over the argument pack `A`, so a zero-argument event is `ModEvent<()>`, a
//! one-argument event is `ModEvent<T>` and wider events use tuples:
//!
//! ```rust,no_run
//! use modhook_core::ModEvent;
//!
//! let on_damage: ModEvent<(u32, f32)> = ModEvent::new();
//! on_damage.on(|(entity, amount): (u32, f32)| println!("{entity} took {amount}"));
//! on_damage.on_ref(|args: &mut (u32, f32)| args.1 *= 0.5);
//!
//! let (_, amount) = on_damage.run((7, 40.0));
//! assert_eq!(amount, 20.0);
//! ```
//!
//! # Dispatch rules
//!
//! - Listeners run in registration order, synchronously, on the calling thread.
//! - The listener list is snapshotted when dispatch starts. A listener may add
//!   or remove listeners (itself included) while running; the change applies
//!   from the next dispatch on.
//! - By-reference listeners see the writes of every listener before them.
//! - A panicking listener is not caught. The panic reaches the caller of
//!   `invoke` and the listeners after it do not run in that round.
//!
//! The listener list is guarded by a lock that is only held while it is
//! copied or edited, never while a callback runs. Two threads invoking the
//! same event each work from their own snapshot; ordering between them is
//! up to the host.

use std::fmt;

use parking_lot::Mutex;

use crate::error::EventError;
use crate::listener::{Listener, ListenerRegistry, Snapshot};

/// Common surface of the event types a hook can fire.
///
/// Implemented by [`ModEvent`] and [`crate::SharedModEvent`] so a hook can
/// switch between them at runtime.
pub trait HookEvent<A>: Send + Sync {
    /// Register a listener. Returns `false` when the event refused it.
    fn add_listener(&self, listener: Listener<A>) -> bool;

    /// Unregister a listener. Returns `false` when it was not found.
    fn remove_listener(&self, listener: &Listener<A>) -> bool;

    /// Run every listener this event holds.
    fn fire(&self, args: &mut A);

    /// Total number of registered listeners.
    fn listener_count(&self) -> usize;
}

/// Multi-listener broadcast event over argument pack `A`.
pub struct ModEvent<A> {
    registry: Mutex<ListenerRegistry<A>>,
}

impl<A> ModEvent<A> {
    /// Create an event with no listeners.
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(ListenerRegistry::new()),
        }
    }

    /// Register a listener at the end of the list.
    pub fn add_listener(&self, listener: Listener<A>) {
        let mut registry = self.registry.lock();
        registry.add(listener);
        log::debug!("Listener added ({} registered)", registry.len());
    }

    /// Register a by-value closure and return its handle.
    pub fn on<F>(&self, callback: F) -> Listener<A>
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        let listener = Listener::by_value(callback);
        self.add_listener(listener.clone());
        listener
    }

    /// Register a by-reference closure and return its handle.
    pub fn on_ref<F>(&self, callback: F) -> Listener<A>
    where
        F: Fn(&mut A) + Send + Sync + 'static,
    {
        let listener = Listener::by_ref(callback);
        self.add_listener(listener.clone());
        listener
    }

    /// Remove the first registration of `listener`.
    pub fn remove_listener(&self, listener: &Listener<A>) -> bool {
        self.try_remove_listener(listener).is_ok()
    }

    pub fn try_remove_listener(&self, listener: &Listener<A>) -> Result<(), EventError> {
        let mut registry = self.registry.lock();
        registry.try_remove(listener)?;
        log::debug!("Listener removed ({} registered)", registry.len());
        Ok(())
    }

    /// Remove the listener at `index`, counted in registration order.
    pub fn remove_listener_at(&self, index: usize) -> bool {
        self.try_remove_listener_at(index).is_ok()
    }

    pub fn try_remove_listener_at(&self, index: usize) -> Result<(), EventError> {
        let mut registry = self.registry.lock();
        registry.try_remove_at(index)?;
        log::debug!(
            "Listener #{} removed ({} registered)",
            index,
            registry.len()
        );
        Ok(())
    }

    pub fn contains(&self, listener: &Listener<A>) -> bool {
        self.registry.lock().contains(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.lock().is_empty()
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.registry.lock().clear();
    }

    /// Copy of the listeners registered right now.
    pub fn snapshot(&self) -> Snapshot<A> {
        self.registry.lock().snapshot()
    }
}

impl<A: Clone> ModEvent<A> {
    /// Call every listener registered at this moment, in order.
    ///
    /// By-value listeners receive a clone of `args`; by-reference listeners
    /// write straight into it.
    pub fn invoke(&self, args: &mut A) {
        // The lock is released here, before any callback runs.
        let snapshot = self.snapshot();
        log::trace!("Dispatching to {} listener(s)", snapshot.len());
        snapshot.dispatch(args);
    }

    /// By-value form of [`ModEvent::invoke`]: returns the arguments as left
    /// by the last listener.
    pub fn run(&self, mut args: A) -> A {
        self.invoke(&mut args);
        args
    }
}

impl<A> Default for ModEvent<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for ModEvent<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModEvent")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<A: Clone> HookEvent<A> for ModEvent<A> {
    fn add_listener(&self, listener: Listener<A>) -> bool {
        ModEvent::add_listener(self, listener);
        true
    }

    fn remove_listener(&self, listener: &Listener<A>) -> bool {
        ModEvent::remove_listener(self, listener)
    }

    fn fire(&self, args: &mut A) {
        self.invoke(args);
    }

    fn listener_count(&self) -> usize {
        ModEvent::listener_count(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_invoke_in_registration_order() {
        let event: ModEvent<()> = ModEvent::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..4 {
            let order = Arc::clone(&order);
            event.on(move |_| order.lock().push(i));
        }
        event.invoke(&mut ());
        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_by_ref_mutation_is_threaded() {
        let event: ModEvent<i32> = ModEvent::new();
        event.on_ref(|v| *v += 1);
        event.on_ref(|v| *v *= 10);
        let mut value = 0;
        event.invoke(&mut value);
        assert_eq!(value, 10);
        assert_eq!(event.run(1), 20);
    }

    #[test]
    fn test_by_value_listener_sees_prior_writes() {
        let event: ModEvent<i32> = ModEvent::new();
        let seen = Arc::new(AtomicUsize::new(0));
        event.on_ref(|v| *v = 42);
        let seen_by_listener = Arc::clone(&seen);
        event.on(move |v| seen_by_listener.store(v as usize, Ordering::SeqCst));
        assert_eq!(event.run(0), 42);
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_remove_listener_at() {
        let event: ModEvent<i32> = ModEvent::new();
        event.on_ref(|v| *v += 1);
        event.on_ref(|v| *v += 100);
        assert!(event.remove_listener_at(1));
        assert!(!event.remove_listener_at(1));
        assert_eq!(event.run(0), 1);
    }

    #[test]
    fn test_hook_event_impl_accepts_everything() {
        let event: ModEvent<i32> = ModEvent::new();
        let listener = Listener::by_ref(|v: &mut i32| *v -= 1);
        assert!(HookEvent::add_listener(&event, listener.clone()));
        assert_eq!(HookEvent::listener_count(&event), 1);
        let mut value = 5;
        event.fire(&mut value);
        assert_eq!(value, 4);
        assert!(HookEvent::remove_listener(&event, &listener));
        assert!(!HookEvent::remove_listener(&event, &listener));
    }
}
