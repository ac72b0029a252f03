//! Location adapter: the only mapping between fragment text and router state.
//!
//! The fragment (everything after `#`) has the shape `path?query`. The query
//! part follows `application/x-www-form-urlencoded` rules, and repeated keys
//! collect into a [`QueryValue::Multi`].

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::LocationError;

/// Value of a query key: a scalar on first occurrence, an array once the key
/// repeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Multi(Vec<String>),
}

impl QueryValue {
    /// Add another occurrence of the key, promoting a scalar to an array.
    pub fn push(&mut self, value: String) {
        match self {
            QueryValue::Single(first) => {
                let first = std::mem::take(first);
                *self = QueryValue::Multi(vec![first, value]);
            }
            QueryValue::Multi(values) => values.push(value),
        }
    }

    /// All values in occurrence order.
    pub fn values(&self) -> &[String] {
        match self {
            QueryValue::Single(value) => std::slice::from_ref(value),
            QueryValue::Multi(values) => values,
        }
    }

    /// First value, which is what most pages want.
    pub fn first(&self) -> Option<&str> {
        self.values().first().map(String::as_str)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        QueryValue::Multi(values)
    }
}

/// Decoded query of a fragment.
pub type Query = BTreeMap<String, QueryValue>;

/// A parsed fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
    pub query: Query,
}

impl Location {
    pub fn parse(hash: &str) -> Self {
        parse(hash)
    }

    /// Fragment text for this location, without the leading `#`.
    pub fn to_hash(&self) -> String {
        build(&self.path, &self.query)
    }
}

/// Parse fragment text (with or without the leading `#`).
///
/// ```rust
/// use waypost_common::{parse, QueryValue};
///
/// let location = parse("#/sub?x=1&x=2&y=a");
/// assert_eq!(location.path, "/sub");
/// assert_eq!(location.query["x"], QueryValue::Multi(vec!["1".into(), "2".into()]));
/// assert_eq!(location.query["y"], QueryValue::Single("a".into()));
/// ```
pub fn parse(hash: &str) -> Location {
    let hash = hash.strip_prefix('#').unwrap_or(hash);
    let (path, raw_query) = match hash.split_once('?') {
        Some((path, query)) => (path, query),
        None => (hash, ""),
    };

    let mut query = Query::new();
    for (key, value) in form_urlencoded::parse(raw_query.as_bytes()) {
        match query.get_mut(key.as_ref()) {
            Some(existing) => existing.push(value.into_owned()),
            None => {
                query.insert(key.into_owned(), QueryValue::Single(value.into_owned()));
            }
        }
    }

    Location {
        path: path.to_string(),
        query,
    }
}

/// Build fragment text (without `#`) from a path and query.
///
/// The `?` is omitted entirely when the query is empty.
pub fn build(path: &str, query: &Query) -> String {
    if query.is_empty() {
        return path.to_string();
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        for item in value.values() {
            serializer.append_pair(key, item);
        }
    }
    format!("{path}?{}", serializer.finish())
}

/// Whether a navigation records a new history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryMode {
    /// Record a new entry (a regular link click).
    #[default]
    Push,
    /// Overwrite the current entry (redirects).
    Replace,
}

/// Handle returned by [`LocationPort::subscribe`]. Dropping it removes the
/// listener.
#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel.
    pub fn empty() -> Self {
        Self { cancel: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Listener invoked with the new fragment text on every hash change.
pub type HashListener = Box<dyn Fn(&str)>;

/// Port between the router and whatever hosts the URL.
///
/// The router reads the fragment, listens for changes and writes new
/// fragments only through this trait.
pub trait LocationPort {
    /// Current fragment text, `None` when no location is available.
    fn read(&self) -> Option<String>;

    /// Register a hash-change listener.
    fn subscribe(&self, listener: HashListener) -> Subscription;

    /// Set the fragment. The change is announced later through the
    /// subscribed listeners, never synchronously from this call.
    fn write(&self, hash: &str, mode: HistoryMode) -> Result<(), LocationError>;

    /// Attach a state payload to the current history entry.
    fn attach_state(&self, state: &serde_json::Value) -> Result<(), LocationError>;
}

/// One history entry of a [`MemoryLocation`].
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub hash: String,
    pub state: Option<serde_json::Value>,
}

#[derive(Default)]
struct MemoryInner {
    available: bool,
    entries: Vec<HistoryEntry>,
    cursor: usize,
    listeners: Vec<(u64, Rc<dyn Fn(&str)>)>,
    next_listener_id: u64,
    pending: VecDeque<String>,
    reject_history: bool,
}

impl MemoryInner {
    fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }
}

/// In-memory [`LocationPort`] with explicit event delivery.
///
/// Writes queue a hash-change notification the way a browser queues the
/// `hashchange` event; nothing reaches the listeners until
/// [`dispatch`](MemoryLocation::dispatch) runs.
#[derive(Clone, Default)]
pub struct MemoryLocation {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryLocation {
    /// A location currently showing `hash`.
    pub fn new(hash: &str) -> Self {
        let location = Self::default();
        {
            let mut inner = location.inner.borrow_mut();
            inner.available = true;
            inner.entries.push(HistoryEntry {
                hash: hash.strip_prefix('#').unwrap_or(hash).to_string(),
                state: None,
            });
        }
        location
    }

    /// A port with no location at all, like running outside a browser.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Make [`LocationPort::attach_state`] fail, like a restrictive security
    /// policy on the history API.
    pub fn reject_history(&self, reject: bool) {
        self.inner.borrow_mut().reject_history = reject;
    }

    /// Current fragment text without `#`.
    pub fn hash(&self) -> Option<String> {
        self.inner.borrow().current().map(|entry| entry.hash.clone())
    }

    /// Snapshot of the history stack, including forward entries.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.inner.borrow().entries.clone()
    }

    /// Number of notifications waiting for [`dispatch`](Self::dispatch).
    pub fn pending_events(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// The user edited the address bar.
    pub fn set_external(&self, hash: &str) {
        let hash = hash.strip_prefix('#').unwrap_or(hash);
        self.apply(hash, HistoryMode::Push);
    }

    /// The user pressed the back button.
    pub fn back(&self) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.cursor == 0 || inner.entries.is_empty() {
            return false;
        }
        let previous = inner.entries[inner.cursor].hash.clone();
        inner.cursor -= 1;
        let hash = inner.entries[inner.cursor].hash.clone();
        if hash != previous {
            inner.pending.push_back(hash);
        }
        true
    }

    /// Deliver queued notifications to the listeners, in order.
    ///
    /// Listeners may write again; those notifications are delivered in the
    /// same call. Returns the number of notifications delivered.
    pub fn dispatch(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                inner.pending.pop_front().map(|hash| {
                    let listeners: Vec<_> = inner
                        .listeners
                        .iter()
                        .map(|(_, listener)| Rc::clone(listener))
                        .collect();
                    (hash, listeners)
                })
            };
            let Some((hash, listeners)) = next else {
                return delivered;
            };
            for listener in listeners {
                listener(&hash);
            }
            delivered += 1;
        }
    }

    fn apply(&self, hash: &str, mode: HistoryMode) {
        let mut inner = self.inner.borrow_mut();
        inner.available = true;
        let changed = inner.current().map(|entry| entry.hash.as_str()) != Some(hash);
        let entry = HistoryEntry {
            hash: hash.to_string(),
            state: None,
        };

        if inner.entries.is_empty() {
            inner.entries.push(entry);
            inner.cursor = 0;
        } else {
            match mode {
                // A same-fragment assignment does not create an entry.
                HistoryMode::Push if changed => {
                    let keep = inner.cursor + 1;
                    inner.entries.truncate(keep);
                    inner.entries.push(entry);
                    inner.cursor = keep;
                }
                HistoryMode::Push => {}
                HistoryMode::Replace => {
                    let cursor = inner.cursor;
                    inner.entries[cursor] = entry;
                }
            }
        }

        if changed {
            inner.pending.push_back(hash.to_string());
        }
    }
}

impl LocationPort for MemoryLocation {
    fn read(&self) -> Option<String> {
        let inner = self.inner.borrow();
        if !inner.available {
            return None;
        }
        inner.current().map(|entry| entry.hash.clone())
    }

    fn subscribe(&self, listener: HashListener) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_listener_id;
            inner.next_listener_id += 1;
            inner.listeners.push((id, Rc::from(listener)));
            id
        };

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().listeners.retain(|(other, _)| *other != id);
            }
        })
    }

    fn write(&self, hash: &str, mode: HistoryMode) -> Result<(), LocationError> {
        self.apply(hash.strip_prefix('#').unwrap_or(hash), mode);
        Ok(())
    }

    fn attach_state(&self, state: &serde_json::Value) -> Result<(), LocationError> {
        let mut inner = self.inner.borrow_mut();
        if inner.reject_history {
            return Err(LocationError::History("history access denied".to_string()));
        }
        let cursor = inner.cursor;
        match inner.entries.get_mut(cursor) {
            Some(entry) => {
                entry.state = Some(state.clone());
                Ok(())
            }
            None => Err(LocationError::Unavailable),
        }
    }
}
