//! Hook Integration for Host Call Sites
//!
//! This module provides the sequencing a host runs around a hooked function:
//! fire `Before` with the argument carrier, read the (possibly rewritten)
//! arguments back, call the original function, then fire `After` with the
//! arguments and the result.
//!
//! # Usage
//!
//! A dispatcher must be installed before hooked call sites run:
//!
//! ```rust,no_run
//! use modhook_core::{EventParam, EventParams};
//! use modhook_runtime::integration::{self, HookDispatcher};
//! use modhook_runtime::DispatchConfig;
//! use std::sync::Arc;
//!
//! let dispatcher = Arc::new(HookDispatcher::new(DispatchConfig::default()));
//! integration::set_dispatcher(dispatcher);
//!
//! let params = EventParams::new((EventParam::numeric(3.0f32),));
//! let height = integration::call_with_hooks("Player::Jump", params, |(height,)| height * 2.0);
//! assert_eq!(height, Ok(6.0));
//! ```
//!
//! Call sites then route through [`call_with_hooks`], which falls back to a
//! plain call when no dispatcher or no hook is present.

use std::sync::Arc;

use modhook_core::{EventParams, ModEventHook, ParamSlots};
use parking_lot::Mutex;

use crate::config::DispatchConfig;
use crate::error::HookError;
use crate::registry::HookRegistry;

/// What `After` listeners receive: the arguments the original function was
/// called with, and its result.
///
/// By-reference `After` listeners may overwrite `result`; the host returns
/// whatever is left there.
#[derive(Debug, Clone, PartialEq)]
pub struct HookedCall<V, O> {
    pub args: V,
    pub result: O,
}

/// Hook type for a function taking the arguments in `P` and returning `O`.
pub type CallHook<P, O> = ModEventHook<EventParams<P>, HookedCall<<P as ParamSlots>::Values, O>>;

/// Returns the hook to idle if the original function unwinds.
struct IdleOnUnwind<'a, B, R>(&'a ModEventHook<B, R>);

impl<B, R> Drop for IdleOnUnwind<'_, B, R> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.set_running(false);
        }
    }
}

/// Run `func` between the hook's `Before` and `After` events.
///
/// # Arguments
/// * `hook` - Hook for this function
/// * `params` - Carrier built from the call's arguments
/// * `func` - The original function
///
/// # Returns
/// The result as left by the `After` listeners.
pub fn call_hooked<P, O, F>(hook: &CallHook<P, O>, mut params: EventParams<P>, func: F) -> O
where
    P: ParamSlots,
    O: Clone,
    F: FnOnce(P::Values) -> O,
{
    hook.fire_before(&mut params);
    let args = params.values();

    let result = {
        let _unwind = IdleOnUnwind(hook);
        func(args.clone())
    };

    let mut call = HookedCall { args, result };
    hook.fire_after(&mut call);
    call.result
}

/// Hook table plus the settings that govern dispatch through it.
pub struct HookDispatcher {
    registry: HookRegistry,
    config: DispatchConfig,
}

impl HookDispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            registry: HookRegistry::new(),
            config,
        }
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Call `func` through the hook registered under `name`.
    ///
    /// Without a registered hook, or when the hook is disabled in the
    /// configuration, `func` runs directly. A hook registered with another
    /// signature is an error and `func` is not called.
    pub fn call<P, O, F>(&self, name: &str, params: EventParams<P>, func: F) -> Result<O, HookError>
    where
        P: ParamSlots,
        O: Clone + 'static,
        F: FnOnce(P::Values) -> O,
    {
        if self.config.is_disabled(name) {
            if self.config.log_dispatch {
                log::trace!("Hook '{}' disabled, calling original", name);
            }
            return Ok(func(params.values()));
        }

        let hook = match self
            .registry
            .get::<EventParams<P>, HookedCall<P::Values, O>>(name)
        {
            Ok(hook) => hook,
            Err(HookError::NotRegistered(_)) => return Ok(func(params.values())),
            Err(err) => return Err(err),
        };

        if self.config.log_dispatch {
            log::trace!(
                "Dispatching hook '{}' ({} before, {} after)",
                name,
                hook.before().listener_count(),
                hook.after().listener_count()
            );
        }
        Ok(call_hooked(&hook, params, func))
    }
}

/// Global dispatcher (thread-safe)
static DISPATCHER: Mutex<Option<Arc<HookDispatcher>>> = Mutex::new(None);

/// Install the global dispatcher.
///
/// This should be called once during host initialization.
pub fn set_dispatcher(dispatcher: Arc<HookDispatcher>) {
    *DISPATCHER.lock() = Some(dispatcher);
}

/// Get the global dispatcher.
pub fn dispatcher() -> Option<Arc<HookDispatcher>> {
    DISPATCHER.lock().clone()
}

/// Remove the global dispatcher; later calls go straight to the original.
pub fn clear_dispatcher() -> Option<Arc<HookDispatcher>> {
    DISPATCHER.lock().take()
}

/// Call a function with hook support through the global dispatcher.
///
/// Falls back to calling `func` directly when no dispatcher is installed.
pub fn call_with_hooks<P, O, F>(name: &str, params: EventParams<P>, func: F) -> Result<O, HookError>
where
    P: ParamSlots,
    O: Clone + 'static,
    F: FnOnce(P::Values) -> O,
{
    match dispatcher() {
        Some(dispatcher) => dispatcher.call(name, params, func),
        None => Ok(func(params.values())),
    }
}
