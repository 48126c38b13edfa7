//! Thread-Scoped Owner Resolution
//!
//! The host knows which mod it is calling into. Before handing control to a
//! mod (its init routine, a listener, a command handler), it enters an
//! [`OwnerScope`] for that mod; shared events then attribute any
//! registration made on that thread to the mod.
//!
//! # Usage
//!
//! ```rust,no_run
//! use modhook_core::{Listener, ModEventHook};
//! use modhook_runtime::scope::{OwnerScope, ScopedOwnerResolver};
//! use std::sync::Arc;
//!
//! let hook: ModEventHook<u32, u32> = ModEventHook::shared(Arc::new(ScopedOwnerResolver::new()));
//!
//! {
//!     let _scope = OwnerScope::enter("god_mode");
//!     // Registrations made here land under "god_mode".
//!     hook.before().add_listener(Listener::by_ref(|damage: &mut u32| *damage = 0));
//! }
//! ```
//!
//! Scopes nest: a mod calling into another mod's API pushes the inner mod,
//! and dropping the guard restores the outer one.

use std::cell::RefCell;
use std::marker::PhantomData;

use modhook_core::{OwnerId, OwnerResolver};

use crate::config::DispatchConfig;

thread_local! {
    static OWNER_STACK: RefCell<Vec<OwnerId>> = const { RefCell::new(Vec::new()) };
}

/// Per-thread record of which mod is executing.
pub struct OwnerScope;

impl OwnerScope {
    /// Mark `owner` as executing on this thread until the guard drops.
    pub fn enter(owner: impl Into<OwnerId>) -> OwnerScopeGuard {
        let owner = owner.into();
        log::trace!("Entering owner scope '{}'", owner);
        OWNER_STACK.with(|stack| stack.borrow_mut().push(owner));
        OwnerScopeGuard {
            _not_send: PhantomData,
        }
    }

    /// Innermost owner on this thread, if any.
    pub fn current() -> Option<OwnerId> {
        OWNER_STACK.with(|stack| stack.borrow().last().cloned())
    }

    /// Number of nested scopes on this thread.
    pub fn depth() -> usize {
        OWNER_STACK.with(|stack| stack.borrow().len())
    }
}

/// Pops its owner scope on drop. Tied to the thread that created it.
#[must_use = "the owner scope ends as soon as the guard is dropped"]
pub struct OwnerScopeGuard {
    _not_send: PhantomData<*const ()>,
}

impl Drop for OwnerScopeGuard {
    fn drop(&mut self) {
        let popped = OWNER_STACK.with(|stack| stack.borrow_mut().pop());
        if let Some(owner) = popped {
            log::trace!("Leaving owner scope '{}'", owner);
        }
    }
}

/// Run `f` with `owner` as the current owner.
pub fn with_owner<T>(owner: impl Into<OwnerId>, f: impl FnOnce() -> T) -> T {
    let _scope = OwnerScope::enter(owner);
    f()
}

/// [`OwnerResolver`] backed by [`OwnerScope::current`].
#[derive(Debug, Clone, Default)]
pub struct ScopedOwnerResolver {
    warn_unresolved: bool,
}

impl ScopedOwnerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            warn_unresolved: config.warn_unresolved_owner,
        }
    }

    /// Log a warning whenever a lookup happens outside any owner scope.
    pub fn warn_unresolved(mut self, warn: bool) -> Self {
        self.warn_unresolved = warn;
        self
    }
}

impl OwnerResolver for ScopedOwnerResolver {
    fn resolve(&self) -> Option<OwnerId> {
        let owner = OwnerScope::current();
        if owner.is_none() && self.warn_unresolved {
            log::warn!("Shared event used outside of any mod scope; call not attributed");
        }
        owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes_nest_and_unwind() {
        assert_eq!(OwnerScope::current(), None);
        {
            let _outer = OwnerScope::enter("outer");
            {
                let _inner = OwnerScope::enter("inner");
                assert_eq!(OwnerScope::current(), Some(OwnerId::new("inner")));
                assert_eq!(OwnerScope::depth(), 2);
            }
            assert_eq!(OwnerScope::current(), Some(OwnerId::new("outer")));
        }
        assert_eq!(OwnerScope::depth(), 0);
    }

    #[test]
    fn test_scope_is_per_thread() {
        let _scope = OwnerScope::enter("main");
        let seen = std::thread::spawn(OwnerScope::current).join().unwrap();
        assert_eq!(seen, None);
        assert_eq!(OwnerScope::current(), Some(OwnerId::new("main")));
    }

    #[test]
    fn test_resolver_reads_scope() {
        let resolver = ScopedOwnerResolver::new();
        assert_eq!(resolver.resolve(), None);
        let owner = with_owner("mod_a", || resolver.resolve());
        assert_eq!(owner, Some(OwnerId::new("mod_a")));
    }

    #[test]
    fn test_scope_popped_on_panic() {
        let result = std::panic::catch_unwind(|| {
            with_owner("crashy", || panic!("mod init failed"));
        });
        assert!(result.is_err());
        assert_eq!(OwnerScope::current(), None);
    }
}
