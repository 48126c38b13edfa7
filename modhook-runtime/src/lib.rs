//! Host-side runtime for mod hooks
//!
//! Connects the event types from `modhook-core` to a running host:
//!
//! - [`scope`]: which mod is executing on this thread, and the
//!   [`ScopedOwnerResolver`] that feeds it to shared events.
//! - [`registry`]: hooks looked up by function name.
//! - [`integration`]: the `Before`/call/`After` sequence for hooked call
//!   sites, and the process-wide dispatcher.
//! - [`config`]: dispatch settings loaded from JSON or TOML.

pub mod config;
pub mod error;
pub mod integration;
pub mod registry;
pub mod scope;

pub use config::DispatchConfig;
pub use error::HookError;
pub use integration::{
    call_hooked, call_with_hooks, clear_dispatcher, dispatcher, set_dispatcher, CallHook,
    HookDispatcher, HookedCall,
};
pub use registry::HookRegistry;
pub use scope::{with_owner, OwnerScope, OwnerScopeGuard, ScopedOwnerResolver};
