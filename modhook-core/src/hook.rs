//! Before/after event pairs around one hooked function
//!
//! A [`ModEventHook`] owns the two events that surround a hooked call and a
//! small state machine tracking whether the call is in flight:
//!
//! ```text
//! Idle -> BeforeFiring -> Calling -> AfterFiring -> Idle
//! ```
//!
//! The hook never calls the real function. The host drives it:
//!
//! ```rust,no_run
//! use modhook_core::ModEventHook;
//!
//! fn original(health: u32) -> u32 {
//!     health / 2
//! }
//!
//! let hook: ModEventHook<u32, (u32, u32)> = ModEventHook::new();
//! let mut args = 10;
//! hook.fire_before(&mut args);       // Idle -> BeforeFiring -> Calling
//! let ret = original(args);          // host calls the real function
//! hook.fire_after(&mut (args, ret)); // -> AfterFiring -> Idle
//! assert!(!hook.is_running());
//! ```
//!
//! `B` is the argument pack handed to `Before` listeners (usually an
//! [`crate::EventParams`]), `R` the pack handed to `After` listeners.
//!
//! If a listener panics during either transition, the hook drops back to
//! `Idle` before the panic continues. Nested calls through the same hook
//! are not tracked separately: the state always reflects the most recent
//! transition.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::event::{HookEvent, ModEvent};
use crate::owner::OwnerResolver;
use crate::shared::SharedModEvent;

/// Where a hooked call currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HookState {
    Idle = 0,
    BeforeFiring = 1,
    /// The host is running the original function.
    Calling = 2,
    AfterFiring = 3,
}

impl HookState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => HookState::BeforeFiring,
            2 => HookState::Calling,
            3 => HookState::AfterFiring,
            _ => HookState::Idle,
        }
    }

    pub fn is_running(self) -> bool {
        self != HookState::Idle
    }
}

/// Puts the hook back to `Idle` if a listener unwinds through a transition.
struct IdleOnUnwind<'a>(&'a AtomicU8);

impl Drop for IdleOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.store(HookState::Idle as u8, Ordering::SeqCst);
        }
    }
}

/// Before/after event pair for one hooked function signature.
pub struct ModEventHook<B, R> {
    before: RwLock<Arc<dyn HookEvent<B>>>,
    after: RwLock<Arc<dyn HookEvent<R>>>,
    state: AtomicU8,
}

impl<B, R> ModEventHook<B, R>
where
    B: Clone + 'static,
    R: Clone + 'static,
{
    /// Hook backed by plain broadcast events.
    pub fn new() -> Self {
        Self::with_events(Arc::new(ModEvent::new()), Arc::new(ModEvent::new()))
    }

    /// Hook backed by owner-scoped events sharing one resolver.
    pub fn shared(resolver: Arc<dyn OwnerResolver>) -> Self {
        Self::with_events(
            Arc::new(SharedModEvent::with_resolver(Arc::clone(&resolver))),
            Arc::new(SharedModEvent::with_resolver(resolver)),
        )
    }
}

impl<B, R> ModEventHook<B, R> {
    pub fn with_events(before: Arc<dyn HookEvent<B>>, after: Arc<dyn HookEvent<R>>) -> Self {
        Self {
            before: RwLock::new(before),
            after: RwLock::new(after),
            state: AtomicU8::new(HookState::Idle as u8),
        }
    }

    /// The event fired before the hooked function runs.
    pub fn before(&self) -> Arc<dyn HookEvent<B>> {
        Arc::clone(&self.before.read())
    }

    /// The event fired after the hooked function returns.
    pub fn after(&self) -> Arc<dyn HookEvent<R>> {
        Arc::clone(&self.after.read())
    }

    /// Swap the `Before` event. Listeners on the old event stay there.
    pub fn set_before(&self, event: Arc<dyn HookEvent<B>>) {
        *self.before.write() = event;
    }

    /// Swap the `After` event. Listeners on the old event stay there.
    pub fn set_after(&self, event: Arc<dyn HookEvent<R>>) {
        *self.after.write() = event;
    }

    pub fn state(&self) -> HookState {
        HookState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn set_state(&self, state: HookState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// True from the start of `Before` until `After` has finished.
    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    /// Coarse switch for hosts that sequence the call themselves:
    /// `true` marks the original function as running, `false` goes idle.
    pub fn set_running(&self, running: bool) {
        let state = if running {
            HookState::Calling
        } else {
            HookState::Idle
        };
        self.set_state(state);
    }

    /// Fire `Before`, then leave the hook in `Calling`.
    pub fn fire_before(&self, args: &mut B) {
        self.set_state(HookState::BeforeFiring);
        let _unwind = IdleOnUnwind(&self.state);
        // Clone out of the lock so listeners may swap events mid-dispatch.
        let event = self.before();
        event.fire(args);
        self.set_state(HookState::Calling);
    }

    /// Fire `After`, then return the hook to `Idle`.
    pub fn fire_after(&self, args: &mut R) {
        self.set_state(HookState::AfterFiring);
        let _unwind = IdleOnUnwind(&self.state);
        let event = self.after();
        event.fire(args);
        self.set_state(HookState::Idle);
    }
}

impl<B, R> Default for ModEventHook<B, R>
where
    B: Clone + 'static,
    R: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<B, R> fmt::Debug for ModEventHook<B, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModEventHook")
            .field("state", &self.state())
            .field("before_listeners", &self.before().listener_count())
            .field("after_listeners", &self.after().listener_count())
            .finish()
    }
}
