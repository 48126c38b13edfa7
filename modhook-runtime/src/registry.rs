//! Named Hook Table
//!
//! Maps function names to their [`ModEventHook`]s so the host and mods can
//! find the same hook without passing it around. Hooks of any signature live
//! in one table; lookups name the signature they expect and fail with
//! [`HookError::SignatureMismatch`] if it differs from the registered one.
//!
//! ```rust,no_run
//! use modhook_core::ModEventHook;
//! use modhook_runtime::{HookError, HookRegistry};
//!
//! fn main() -> Result<(), HookError> {
//!     let registry = HookRegistry::new();
//!     let hook = registry.get_or_create("Player::TakeDamage", ModEventHook::<(u32, i32), u32>::new)?;
//!     // elsewhere
//!     let same = registry.get::<(u32, i32), u32>("Player::TakeDamage")?;
//!     assert!(std::sync::Arc::ptr_eq(&hook, &same));
//!     Ok(())
//! }
//! ```

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

use modhook_core::{HookState, ModEventHook};
use parking_lot::RwLock;

use crate::error::HookError;

/// Signature-erased view of a hook, for status queries.
trait HookStatus: Send + Sync {
    fn state(&self) -> HookState;
}

impl<B: 'static, R: 'static> HookStatus for ModEventHook<B, R> {
    fn state(&self) -> HookState {
        ModEventHook::state(self)
    }
}

struct HookEntry {
    hook: Arc<dyn Any + Send + Sync>,
    status: Arc<dyn HookStatus>,
    signature: &'static str,
}

/// Hooks registered by function name.
pub struct HookRegistry {
    hooks: RwLock<HashMap<String, HookEntry>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(HashMap::new()),
        }
    }

    /// Register `hook` under `name`.
    ///
    /// # Returns
    /// The shared hook, or `AlreadyRegistered` if the name is taken.
    pub fn register<B, R>(
        &self,
        name: impl Into<String>,
        hook: ModEventHook<B, R>,
    ) -> Result<Arc<ModEventHook<B, R>>, HookError>
    where
        B: 'static,
        R: 'static,
    {
        let name = name.into();
        let mut hooks = self.hooks.write();
        if hooks.contains_key(&name) {
            return Err(HookError::AlreadyRegistered(name));
        }
        let hook = Arc::new(hook);
        log::debug!("Registered hook '{}'", name);
        hooks.insert(name, Self::entry(&hook));
        Ok(hook)
    }

    fn entry<B: 'static, R: 'static>(hook: &Arc<ModEventHook<B, R>>) -> HookEntry {
        HookEntry {
            hook: Arc::clone(hook) as Arc<dyn Any + Send + Sync>,
            status: Arc::clone(hook) as Arc<dyn HookStatus>,
            signature: type_name::<ModEventHook<B, R>>(),
        }
    }

    /// Look up the hook registered under `name` with signature `(B, R)`.
    pub fn get<B, R>(&self, name: &str) -> Result<Arc<ModEventHook<B, R>>, HookError>
    where
        B: 'static,
        R: 'static,
    {
        let hooks = self.hooks.read();
        let entry = hooks
            .get(name)
            .ok_or_else(|| HookError::NotRegistered(name.to_string()))?;
        Self::downcast(name, entry)
    }

    fn downcast<B: 'static, R: 'static>(
        name: &str,
        entry: &HookEntry,
    ) -> Result<Arc<ModEventHook<B, R>>, HookError> {
        Arc::clone(&entry.hook)
            .downcast::<ModEventHook<B, R>>()
            .map_err(|_| {
                log::warn!("Hook '{}' requested with the wrong signature", name);
                HookError::SignatureMismatch {
                    name: name.to_string(),
                    expected: type_name::<ModEventHook<B, R>>(),
                    found: entry.signature,
                }
            })
    }

    /// Fetch the hook under `name`, registering `make()` first if absent.
    pub fn get_or_create<B, R>(
        &self,
        name: &str,
        make: impl FnOnce() -> ModEventHook<B, R>,
    ) -> Result<Arc<ModEventHook<B, R>>, HookError>
    where
        B: 'static,
        R: 'static,
    {
        let mut hooks = self.hooks.write();
        if let Some(entry) = hooks.get(name) {
            return Self::downcast(name, entry);
        }
        let hook = Arc::new(make());
        log::debug!("Registered hook '{}'", name);
        hooks.insert(name.to_string(), Self::entry(&hook));
        Ok(hook)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.hooks.read().contains_key(name)
    }

    /// Registered hook names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.hooks.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn state(&self, name: &str) -> Option<HookState> {
        self.hooks.read().get(name).map(|entry| entry.status.state())
    }

    /// Names of hooks whose call is currently in flight, sorted.
    pub fn running_hooks(&self) -> Vec<String> {
        let mut running: Vec<String> = self
            .hooks
            .read()
            .iter()
            .filter(|(_, entry)| entry.status.state().is_running())
            .map(|(name, _)| name.clone())
            .collect();
        running.sort();
        running
    }

    /// Remove a hook. Holders of its `Arc` keep a working hook.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.hooks.write().remove(name).is_some();
        if removed {
            log::debug!("Unregistered hook '{}'", name);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }

    pub fn clear(&self) {
        self.hooks.write().clear();
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let registry = HookRegistry::new();
        let hook = registry
            .register("Player::Jump", ModEventHook::<f32, ()>::new())
            .unwrap();
        let fetched = registry.get::<f32, ()>("Player::Jump").unwrap();
        assert!(Arc::ptr_eq(&hook, &fetched));
        assert_eq!(registry.names(), vec!["Player::Jump".to_string()]);
    }

    #[test]
    fn test_duplicate_registration() {
        let registry = HookRegistry::new();
        registry
            .register("Player::Jump", ModEventHook::<f32, ()>::new())
            .unwrap();
        let err = registry
            .register("Player::Jump", ModEventHook::<f32, ()>::new())
            .unwrap_err();
        assert_eq!(err, HookError::AlreadyRegistered("Player::Jump".to_string()));
    }

    #[test]
    fn test_signature_mismatch() {
        let registry = HookRegistry::new();
        registry
            .register("Player::Jump", ModEventHook::<f32, ()>::new())
            .unwrap();
        match registry.get::<i32, ()>("Player::Jump") {
            Err(HookError::SignatureMismatch { name, .. }) => assert_eq!(name, "Player::Jump"),
            other => panic!("unexpected lookup result: {:?}", other.map(|_| ())),
        }
        assert_eq!(
            registry.get::<f32, ()>("Player::Fly").unwrap_err(),
            HookError::NotRegistered("Player::Fly".to_string())
        );
    }

    #[test]
    fn test_get_or_create_reuses() {
        let registry = HookRegistry::new();
        let first = registry
            .get_or_create("Enemy::Spawn", ModEventHook::<u32, u32>::new)
            .unwrap();
        let second = registry
            .get_or_create("Enemy::Spawn", || panic!("must not be rebuilt"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_running_hooks() {
        let registry = HookRegistry::new();
        let hook = registry
            .register("Audio::Play", ModEventHook::<u32, ()>::new())
            .unwrap();
        registry
            .register("Audio::Stop", ModEventHook::<u32, ()>::new())
            .unwrap();
        assert!(registry.running_hooks().is_empty());

        hook.fire_before(&mut 3);
        assert_eq!(registry.running_hooks(), vec!["Audio::Play".to_string()]);
        assert_eq!(registry.state("Audio::Play"), Some(HookState::Calling));
        hook.fire_after(&mut ());
        assert!(registry.running_hooks().is_empty());
    }

    #[test]
    fn test_unregister() {
        let registry = HookRegistry::new();
        let hook = registry
            .register("Audio::Play", ModEventHook::<u32, ()>::new())
            .unwrap();
        assert!(registry.unregister("Audio::Play"));
        assert!(!registry.unregister("Audio::Play"));
        assert!(registry.is_empty());
        // The detached hook still works.
        hook.fire_before(&mut 1);
        assert!(hook.is_running());
    }
}
