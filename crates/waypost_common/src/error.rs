use thiserror::Error;

/// Errors raised while building a [`RouteTable`](crate::RouteTable).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTableError {
    /// Two descriptors were registered under the same path.
    #[error("route path '{0}' is registered more than once")]
    DuplicatePath(String),
}

/// Errors produced by a [`ModuleLoader`](crate::ModuleLoader) or while
/// driving a preload.
///
/// This is `Clone` because every caller waiting on the same
/// [`PreloadHandle`](crate::PreloadHandle) receives its own copy of the
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreloadError {
    /// The loader rejected the module.
    #[error("failed to load module '{key}': {message}")]
    Failed {
        /// Module key that was requested
        key: String,
        /// Error message from the loader
        message: String,
    },

    /// The load driver could not be handed to the executor.
    #[error("failed to spawn preload driver: {0}")]
    Spawn(String),
}

impl PreloadError {
    pub fn failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        PreloadError::Failed {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Errors reported by a [`LocationPort`](crate::LocationPort).
///
/// Navigation swallows these; they only surface through logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// No location is available (non-browser execution).
    #[error("no location is available")]
    Unavailable,

    /// The history API refused the call (e.g. a security policy).
    #[error("history API error: {0}")]
    History(String),
}

/// Errors raised while loading a [`RouterConfig`](crate::RouterConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid router config: {0}")]
    Parse(#[from] serde_json::Error),
}
