//! Owner identity and the resolver capability.

use std::fmt;
use std::sync::Arc;

/// Identity of a mod that registers listeners.
///
/// Cheap to clone, hashable and ordered. Two ids are equal when they were
/// built from the same name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(Arc<str>);

impl OwnerId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerId({:?})", &*self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for OwnerId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

/// Answers "which mod is calling right now?".
///
/// Queried on every registration, removal and owner-scoped dispatch, so the
/// answer may differ from call to call. `None` means the caller cannot be
/// attributed to any mod.
pub trait OwnerResolver: Send + Sync {
    fn resolve(&self) -> Option<OwnerId>;
}

impl<F> OwnerResolver for F
where
    F: Fn() -> Option<OwnerId> + Send + Sync,
{
    fn resolve(&self) -> Option<OwnerId> {
        self()
    }
}
