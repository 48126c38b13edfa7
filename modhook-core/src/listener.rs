//! Listener handles and the ordered registry they live in.
//!
//! A [`Listener`] wraps a callback in one of two shapes:
//!
//! - **by value**: the callback receives its own clone of the argument pack;
//! - **by reference**: the callback receives `&mut` to the argument pack and
//!   may write any slot, with the write visible to every later listener.
//!
//! Handles are compared by identity: clones of one handle are the same
//! listener, two handles built separately are different listeners even when
//! they wrap the same closure code.

use std::fmt;
use std::sync::Arc;

use crate::error::EventError;

type ValueFn<A> = dyn Fn(A) + Send + Sync;
type RefFn<A> = dyn Fn(&mut A) + Send + Sync;

enum Callback<A> {
    Value(Arc<ValueFn<A>>),
    Ref(Arc<RefFn<A>>),
}

impl<A> Clone for Callback<A> {
    fn clone(&self) -> Self {
        match self {
            Callback::Value(f) => Callback::Value(Arc::clone(f)),
            Callback::Ref(f) => Callback::Ref(Arc::clone(f)),
        }
    }
}

/// A registered callback for an event carrying argument pack `A`.
///
/// `A` is `()` for events without arguments, the argument type itself for
/// one argument, and a tuple for more.
pub struct Listener<A> {
    callback: Callback<A>,
}

impl<A> Listener<A> {
    /// Wrap a callback that receives a clone of the arguments.
    pub fn by_value<F>(callback: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            callback: Callback::Value(Arc::new(callback)),
        }
    }

    /// Wrap a callback that receives the arguments by mutable reference.
    pub fn by_ref<F>(callback: F) -> Self
    where
        F: Fn(&mut A) + Send + Sync + 'static,
    {
        Self {
            callback: Callback::Ref(Arc::new(callback)),
        }
    }

    /// Whether this listener may write through to the caller's arguments.
    pub fn is_by_ref(&self) -> bool {
        matches!(self.callback, Callback::Ref(_))
    }

    /// Identity comparison: true only for clones of the same handle.
    pub fn same_as(&self, other: &Listener<A>) -> bool {
        match (&self.callback, &other.callback) {
            (Callback::Value(a), Callback::Value(b)) => Arc::ptr_eq(a, b),
            (Callback::Ref(a), Callback::Ref(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<A: Clone> Listener<A> {
    /// Run the callback against `args`.
    pub fn call(&self, args: &mut A) {
        match &self.callback {
            Callback::Value(f) => f(args.clone()),
            Callback::Ref(f) => f(args),
        }
    }
}

impl<A> Clone for Listener<A> {
    fn clone(&self) -> Self {
        Self {
            callback: self.callback.clone(),
        }
    }
}

impl<A> PartialEq for Listener<A> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl<A> Eq for Listener<A> {}

impl<A> fmt::Debug for Listener<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = if self.is_by_ref() { "by_ref" } else { "by_value" };
        f.debug_struct("Listener").field("shape", &shape).finish()
    }
}

/// Ordered listener list for one event.
///
/// Duplicates are allowed; order is registration order.
pub struct ListenerRegistry<A> {
    listeners: Vec<Listener<A>>,
}

impl<A> ListenerRegistry<A> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Append a listener.
    pub fn add(&mut self, listener: Listener<A>) {
        self.listeners.push(listener);
    }

    /// Remove the first occurrence of `listener`.
    ///
    /// Returns `false` if it was not registered.
    pub fn remove(&mut self, listener: &Listener<A>) -> bool {
        self.try_remove(listener).is_ok()
    }

    pub fn try_remove(&mut self, listener: &Listener<A>) -> Result<Listener<A>, EventError> {
        let position = self
            .listeners
            .iter()
            .position(|l| l.same_as(listener))
            .ok_or(EventError::ListenerNotFound)?;
        Ok(self.listeners.remove(position))
    }

    /// Remove the listener at `index`. Out-of-range indices return `false`.
    pub fn remove_at(&mut self, index: usize) -> bool {
        self.try_remove_at(index).is_ok()
    }

    pub fn try_remove_at(&mut self, index: usize) -> Result<Listener<A>, EventError> {
        let len = self.listeners.len();
        if index >= len {
            return Err(EventError::IndexOutOfRange { index, len });
        }
        Ok(self.listeners.remove(index))
    }

    pub fn contains(&self, listener: &Listener<A>) -> bool {
        self.listeners.iter().any(|l| l.same_as(listener))
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Copy the current listener list.
    ///
    /// Later changes to the registry do not show up in the returned
    /// snapshot, which is what lets a dispatch loop survive listeners that
    /// register or unregister while it runs.
    pub fn snapshot(&self) -> Snapshot<A> {
        Snapshot {
            listeners: self.listeners.clone(),
        }
    }
}

impl<A> Default for ListenerRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for ListenerRegistry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.listeners.iter()).finish()
    }
}

/// Point-in-time copy of a listener list. Iterable any number of times.
pub struct Snapshot<A> {
    listeners: Vec<Listener<A>>,
}

impl<A> Snapshot<A> {
    pub fn iter(&self) -> std::slice::Iter<'_, Listener<A>> {
        self.listeners.iter()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<A: Clone> Snapshot<A> {
    /// Run every listener in the snapshot against `args`, in order.
    pub fn dispatch(&self, args: &mut A) {
        for listener in &self.listeners {
            listener.call(args);
        }
    }
}

impl<A> IntoIterator for Snapshot<A> {
    type Item = Listener<A>;
    type IntoIter = std::vec::IntoIter<Listener<A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.listeners.into_iter()
    }
}

impl<'a, A> IntoIterator for &'a Snapshot<A> {
    type Item = &'a Listener<A>;
    type IntoIter = std::slice::Iter<'a, Listener<A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.listeners.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_per_handle() {
        let a = Listener::<i32>::by_value(|_| {});
        let b = Listener::<i32>::by_value(|_| {});
        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
    }

    #[test]
    fn test_remove_first_occurrence() {
        let mut registry = ListenerRegistry::new();
        let a = Listener::<i32>::by_value(|_| {});
        let b = Listener::<i32>::by_value(|_| {});
        registry.add(a.clone());
        registry.add(b.clone());
        registry.add(a.clone());

        assert!(registry.remove(&a));
        let remaining: Vec<_> = registry.snapshot().into_iter().collect();
        assert_eq!(remaining.len(), 2);
        assert!(remaining[0].same_as(&b));
        assert!(remaining[1].same_as(&a));
    }

    #[test]
    fn test_remove_at_out_of_range() {
        let mut registry = ListenerRegistry::new();
        registry.add(Listener::<()>::by_value(|_| {}));
        assert!(!registry.remove_at(1));
        assert_eq!(
            registry.try_remove_at(5).unwrap_err(),
            EventError::IndexOutOfRange { index: 5, len: 1 }
        );
        assert!(registry.remove_at(0));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached_and_restartable() {
        let mut registry = ListenerRegistry::new();
        let a = Listener::<i32>::by_ref(|v| *v += 1);
        registry.add(a.clone());
        let snapshot = registry.snapshot();
        registry.clear();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.iter().count(), 1);
        assert_eq!((&snapshot).into_iter().count(), 1);

        let mut value = 0;
        for listener in &snapshot {
            listener.call(&mut value);
        }
        assert_eq!(value, 1);
    }

    #[test]
    fn test_by_value_listener_gets_a_copy() {
        let listener = Listener::<i32>::by_value(|v| assert_eq!(v, 1));
        let mut value = 1;
        listener.call(&mut value);
        assert_eq!(value, 1);
        assert!(!listener.is_by_ref());
    }
}
