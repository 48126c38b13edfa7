//! Owner-scoped events
//!
//! A [`SharedModEvent`] keeps one [`ModEvent`] per mod. Every call asks the
//! injected [`OwnerResolver`] who is calling and routes to that mod's event,
//! so one mod removing a listener can never take out another mod's listener
//! and `invoke_own` only reaches the caller's own listeners. `invoke_all`
//! fans out to every mod, in the order the mods were first seen.
//!
//! Per-owner entries are created on first contact and live as long as the
//! `SharedModEvent` does. Unloading a mod does not remove its entry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::EventError;
use crate::event::{HookEvent, ModEvent};
use crate::listener::Listener;
use crate::owner::{OwnerId, OwnerResolver};

struct OwnerTable<A> {
    /// Owners in first-seen order; drives `invoke_all`.
    order: Vec<OwnerId>,
    events: HashMap<OwnerId, Arc<ModEvent<A>>>,
}

impl<A> OwnerTable<A> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            events: HashMap::new(),
        }
    }
}

/// Broadcast event partitioned by calling owner.
pub struct SharedModEvent<A> {
    resolver: Arc<dyn OwnerResolver>,
    owners: Mutex<OwnerTable<A>>,
}

impl<A> SharedModEvent<A> {
    pub fn new(resolver: impl OwnerResolver + 'static) -> Self {
        Self::with_resolver(Arc::new(resolver))
    }

    /// Build from a resolver that is shared with other events.
    pub fn with_resolver(resolver: Arc<dyn OwnerResolver>) -> Self {
        Self {
            resolver,
            owners: Mutex::new(OwnerTable::new()),
        }
    }

    pub fn resolver(&self) -> &Arc<dyn OwnerResolver> {
        &self.resolver
    }

    /// The calling owner's event, created on first use.
    ///
    /// `None` when the resolver cannot name the caller.
    pub fn owner_event(&self) -> Option<Arc<ModEvent<A>>> {
        let owner = self.resolver.resolve()?;
        Some(self.event_entry(owner))
    }

    fn event_entry(&self, owner: OwnerId) -> Arc<ModEvent<A>> {
        let mut table = self.owners.lock();
        if let Some(event) = table.events.get(&owner) {
            return Arc::clone(event);
        }
        log::debug!("Creating listener set for owner '{}'", owner);
        let event = Arc::new(ModEvent::new());
        table.order.push(owner.clone());
        table.events.insert(owner, Arc::clone(&event));
        event
    }

    /// Look up an owner's event without creating it.
    pub fn event_for(&self, owner: &OwnerId) -> Option<Arc<ModEvent<A>>> {
        self.owners.lock().events.get(owner).cloned()
    }

    /// Owners seen so far, in first-seen order.
    pub fn owners(&self) -> Vec<OwnerId> {
        self.owners.lock().order.clone()
    }

    pub fn owner_count(&self) -> usize {
        self.owners.lock().order.len()
    }

    /// Listeners across all owners.
    pub fn listener_count(&self) -> usize {
        self.owner_events()
            .iter()
            .map(|event| event.listener_count())
            .sum()
    }

    fn owner_events(&self) -> Vec<Arc<ModEvent<A>>> {
        let table = self.owners.lock();
        table
            .order
            .iter()
            .filter_map(|owner| table.events.get(owner).cloned())
            .collect()
    }

    /// Register `listener` under the calling owner.
    pub fn add_listener(&self, listener: Listener<A>) -> bool {
        match self.try_add_listener(listener) {
            Ok(()) => true,
            Err(err) => {
                log::debug!("Listener not added: {}", err);
                false
            }
        }
    }

    pub fn try_add_listener(&self, listener: Listener<A>) -> Result<(), EventError> {
        let event = self.owner_event().ok_or(EventError::OwnerUnresolved)?;
        event.add_listener(listener);
        Ok(())
    }

    /// Register a by-value closure under the calling owner.
    pub fn on<F>(&self, callback: F) -> Option<Listener<A>>
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        let listener = Listener::by_value(callback);
        self.add_listener(listener.clone()).then_some(listener)
    }

    /// Register a by-reference closure under the calling owner.
    pub fn on_ref<F>(&self, callback: F) -> Option<Listener<A>>
    where
        F: Fn(&mut A) + Send + Sync + 'static,
    {
        let listener = Listener::by_ref(callback);
        self.add_listener(listener.clone()).then_some(listener)
    }

    /// Remove `listener` from the calling owner's event only.
    pub fn remove_listener(&self, listener: &Listener<A>) -> bool {
        match self.try_remove_listener(listener) {
            Ok(()) => true,
            Err(err) => {
                log::debug!("Listener not removed: {}", err);
                false
            }
        }
    }

    pub fn try_remove_listener(&self, listener: &Listener<A>) -> Result<(), EventError> {
        let event = self.owner_event().ok_or(EventError::OwnerUnresolved)?;
        event.try_remove_listener(listener)
    }

    /// Remove by position within the calling owner's event.
    pub fn remove_listener_at(&self, index: usize) -> bool {
        self.try_remove_listener_at(index).is_ok()
    }

    pub fn try_remove_listener_at(&self, index: usize) -> Result<(), EventError> {
        let event = self.owner_event().ok_or(EventError::OwnerUnresolved)?;
        event.try_remove_listener_at(index)
    }
}

impl<A: Clone> SharedModEvent<A> {
    /// Fire only the calling owner's listeners.
    ///
    /// Does nothing when the owner cannot be resolved.
    pub fn invoke_own(&self, args: &mut A) {
        match self.owner_event() {
            Some(event) => event.invoke(args),
            None => log::trace!("invoke_own skipped: owner unresolved"),
        }
    }

    /// Fire every owner's listeners, owner by owner in first-seen order.
    ///
    /// The same argument pack is threaded through all of them. Every
    /// owner's listener list is snapshotted before the first listener runs,
    /// so owners or listeners that appear while this runs wait for the next
    /// round.
    pub fn invoke_all(&self, args: &mut A) {
        let snapshots: Vec<_> = self
            .owner_events()
            .iter()
            .map(|event| event.snapshot())
            .collect();
        log::trace!("Dispatching to {} owner(s)", snapshots.len());
        for snapshot in &snapshots {
            snapshot.dispatch(args);
        }
    }

    pub fn run_own(&self, mut args: A) -> A {
        self.invoke_own(&mut args);
        args
    }

    pub fn run_all(&self, mut args: A) -> A {
        self.invoke_all(&mut args);
        args
    }
}

impl<A> fmt::Debug for SharedModEvent<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedModEvent")
            .field("owners", &self.owners())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<A: Clone> HookEvent<A> for SharedModEvent<A> {
    fn add_listener(&self, listener: Listener<A>) -> bool {
        SharedModEvent::add_listener(self, listener)
    }

    fn remove_listener(&self, listener: &Listener<A>) -> bool {
        SharedModEvent::remove_listener(self, listener)
    }

    fn fire(&self, args: &mut A) {
        self.invoke_all(args);
    }

    fn listener_count(&self) -> usize {
        SharedModEvent::listener_count(self)
    }
}
