use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("No hook registered under '{0}'")]
    NotRegistered(String),

    #[error("A hook is already registered under '{0}'")]
    AlreadyRegistered(String),

    #[error("Hook '{name}' has signature {found}, requested {expected}")]
    SignatureMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}
