//! Event dispatch for mod runtimes
//!
//! This crate provides the listener plumbing mods use to observe and rewrite
//! hooked function calls.
//!
//! # Overview
//!
//! - [`ModEvent`]: ordered multi-listener broadcast over one argument pack.
//! - [`SharedModEvent`]: one `ModEvent` per calling mod, so mods cannot
//!   remove or trigger each other's listeners by accident.
//! - [`ModEventHook`]: the `Before`/`After` event pair around one hooked
//!   function, plus its in-flight state.
//! - [`EventParam`] / [`EventParams`]: shared boxes around hook arguments
//!   that `Before` listeners write through.
//!
//! # Example
//!
//! ```rust,no_run
//! use modhook_core::{EventParam, EventParams, Listener, ModEventHook};
//!
//! type DamageParams = EventParams<(EventParam<u32>, EventParam<i32>)>;
//!
//! fn take_damage(_entity: u32, amount: i32) -> i32 {
//!     100 - amount
//! }
//!
//! let hook: ModEventHook<DamageParams, i32> = ModEventHook::new();
//!
//! // A mod halves all incoming damage.
//! hook.before().add_listener(Listener::by_value(|params: DamageParams| {
//!     params.arg2().with_mut(|amount| *amount /= 2);
//! }));
//!
//! // The host fires the hook around the real call.
//! let mut params = EventParams::new((EventParam::numeric(7), EventParam::numeric(40)));
//! hook.fire_before(&mut params);
//! let (entity, amount) = params.values();
//! let mut remaining = take_damage(entity, amount);
//! hook.fire_after(&mut remaining);
//! assert_eq!(remaining, 80);
//! ```
//!
//! # Threading
//!
//! Listeners run synchronously on the thread that fires the event. Events
//! are `Send + Sync` and never hold their internal lock while a listener
//! runs, but they do not order concurrent dispatches against each other:
//! a host that fires the same hook from several threads is responsible for
//! serialising whatever state its listeners share.
//!
//! # Failure policy
//!
//! A panicking listener is never caught. It aborts the rest of that round and
//! unwinds into whoever fired the event.

pub mod error;
pub mod event;
pub mod hook;
pub mod listener;
pub mod owner;
pub mod params;
pub mod shared;

pub use error::EventError;
pub use event::{HookEvent, ModEvent};
pub use hook::{HookState, ModEventHook};
pub use listener::{Listener, ListenerRegistry, Snapshot};
pub use owner::{OwnerId, OwnerResolver};
pub use params::{ArithOp, EventParam, EventParams, Numeric, ParamSlots};
pub use shared::SharedModEvent;
