use thiserror::Error;

use crate::resource::Capability;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("stage '{stage}' was pulled before its upstream was set")]
    EmptyUpstream { stage: &'static str },

    #[error("a source cannot have an upstream")]
    SourceHasUpstream,

    #[error("'{type_name}' object is not iterable")]
    NotIterable { type_name: &'static str },

    #[error("no stage in the chain provides '{capability}'")]
    AttributeNotFound { capability: Capability },

    #[error("open slot expects a stage yielding {expected}, got one yielding {found}")]
    UpstreamType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("resource '{name}' is closed")]
    Closed { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DSV error: {0}")]
    Dsv(String),

    #[error("invalid selector: {0}")]
    Selector(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("hook failed: {0}")]
    Hook(String),

    #[error("internal invariant failed: {0}")]
    Invariant(String),
}

impl Error {
    /// Shorthand for a capability lookup that ran off the end of the chain.
    pub fn missing(capability: Capability) -> Self {
        Error::AttributeNotFound { capability }
    }

    pub fn hook<S: Into<String>>(message: S) -> Self {
        Error::Hook(message.into())
    }
}
