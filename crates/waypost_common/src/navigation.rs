use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::location::{HistoryMode, Location, LocationPort, Query, build, parse};

/// What the router currently shows.
///
/// Replaced wholesale on every hash change, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteState {
    pub path: String,
    /// Path parameters. Matching is exact-string only, so this is always
    /// empty; it is kept so parameterized routes can be added without
    /// changing the state shape.
    pub params: BTreeMap<String, String>,
    pub query: Query,
}

impl RouteState {
    /// State for a fragment text.
    pub fn from_hash(hash: &str) -> Self {
        Location::parse(hash).into()
    }

    /// Initial state read synchronously from a port. Empty when the port has
    /// no location.
    pub fn initial(port: &dyn LocationPort) -> Self {
        port.read()
            .map(|hash| Self::from_hash(&hash))
            .unwrap_or_default()
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.get(key).and_then(|value| value.first())
    }
}

impl From<Location> for RouteState {
    fn from(location: Location) -> Self {
        Self {
            path: location.path,
            params: BTreeMap::new(),
            query: location.query,
        }
    }
}

/// Options for [`navigate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigateOptions {
    /// Overwrite the current history entry instead of recording one.
    pub replace: bool,
    /// Metadata attached to the history entry. Navigation does not depend on
    /// it being stored.
    pub state: Option<serde_json::Value>,
}

impl NavigateOptions {
    pub fn replace() -> Self {
        Self {
            replace: true,
            state: None,
        }
    }

    pub fn with_state(mut self, state: serde_json::Value) -> Self {
        self.state = Some(state);
        self
    }

    fn history_mode(&self) -> HistoryMode {
        if self.replace {
            HistoryMode::Replace
        } else {
            HistoryMode::Push
        }
    }
}

/// Write a new fragment through `port`.
///
/// This does not touch any [`RouteState`]: the state follows once the port
/// announces the hash change. Callers must not assume that happens before
/// this returns.
pub fn navigate(port: &dyn LocationPort, path: &str, query: &Query, options: &NavigateOptions) {
    let hash = build(path, query);

    if let Err(e) = port.write(&hash, options.history_mode()) {
        log::warn!("[navigate] Failed to write '#{}': {}", hash, e);
        return;
    }

    if let Some(state) = &options.state {
        if let Err(e) = port.attach_state(state) {
            log::debug!("[navigate] Ignoring history state for '#{}': {}", hash, e);
        }
    }
}

/// Re-derive the state after a hash-change notification.
pub fn on_hash_change(hash: &str) -> RouteState {
    parse(hash).into()
}
