//! Error types for listener registration and removal.
//!
//! The boolean-returning methods on the events never surface these; they are
//! produced by the `try_*` forms so callers that care can tell the failure
//! modes apart.

use thiserror::Error;

/// Why a registration or removal did not take effect.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventError {
    /// The owner resolver could not attribute the call to a mod.
    #[error("calling owner could not be resolved")]
    OwnerUnresolved,

    /// The listener handle is not registered on the targeted event.
    #[error("listener is not registered on this event")]
    ListenerNotFound,

    /// A positional removal pointed past the end of the listener list.
    #[error("listener index {index} is out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}
