use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RouteTableError;

/// When a route is proactively warmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Warmed once per provider during idle time.
    Critical,
    Normal,
    Low,
}

/// Key handed to a [`ModuleLoader`](crate::ModuleLoader).
pub type ModuleKey = String;

/// Static description of one route.
///
/// `V` is whatever the UI layer renders for the route; the core never looks
/// inside it. A descriptor has a preload action exactly when `module` is set.
#[derive(Clone)]
pub struct RouteDescriptor<V> {
    pub path: String,
    pub view: V,
    pub title: String,
    pub protected: bool,
    pub module: Option<ModuleKey>,
    pub priority: Option<Priority>,
}

impl<V> RouteDescriptor<V> {
    /// A public route with no preload action and no priority.
    pub fn new(path: impl Into<String>, title: impl Into<String>, view: V) -> Self {
        Self {
            path: path.into(),
            view,
            title: title.into(),
            protected: false,
            module: None,
            priority: None,
        }
    }

    /// Require authentication for this route.
    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    /// Preload this route by loading `module`.
    pub fn preload(mut self, module: impl Into<ModuleKey>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn has_preload(&self) -> bool {
        self.module.is_some()
    }
}

impl<V> fmt::Debug for RouteDescriptor<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("path", &self.path)
            .field("title", &self.title)
            .field("protected", &self.protected)
            .field("module", &self.module)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Immutable, ordered set of routes with unique paths.
///
/// # Example
///
/// ```rust
/// use waypost_common::{Priority, RouteDescriptor, RouteTable};
///
/// let table = RouteTable::builder()
///     .route(RouteDescriptor::new("/login", "Sign in", ()))
///     .route(
///         RouteDescriptor::new("/dashboard", "Dashboard", ())
///             .protected()
///             .preload("dashboard")
///             .priority(Priority::Critical),
///     )
///     .build()
///     .unwrap();
///
/// assert!(table.find("/dashboard").unwrap().protected);
/// assert!(table.find("/dashboard/").is_none());
/// ```
#[derive(Clone)]
pub struct RouteTable<V> {
    routes: Vec<RouteDescriptor<V>>,
    by_path: HashMap<String, usize>,
}

impl<V> RouteTable<V> {
    /// Build a table, rejecting duplicate paths.
    pub fn new(routes: Vec<RouteDescriptor<V>>) -> Result<Self, RouteTableError> {
        let mut by_path = HashMap::with_capacity(routes.len());
        for (index, route) in routes.iter().enumerate() {
            if by_path.insert(route.path.clone(), index).is_some() {
                return Err(RouteTableError::DuplicatePath(route.path.clone()));
            }
        }
        Ok(Self { routes, by_path })
    }

    pub fn builder() -> RouteTableBuilder<V> {
        RouteTableBuilder::new()
    }

    /// Exact-match lookup. No prefix or wildcard matching.
    pub fn find(&self, path: &str) -> Option<&RouteDescriptor<V>> {
        self.by_path.get(path).map(|&index| &self.routes[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDescriptor<V>> {
        self.routes.iter()
    }

    /// Routes tagged with `priority`, in table order.
    pub fn with_priority(&self, priority: Priority) -> impl Iterator<Item = &RouteDescriptor<V>> {
        self.routes
            .iter()
            .filter(move |route| route.priority == Some(priority))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<V> Default for RouteTable<V> {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            by_path: HashMap::new(),
        }
    }
}

impl<V> fmt::Debug for RouteTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.routes.iter()).finish()
    }
}

/// Builder for [`RouteTable`].
pub struct RouteTableBuilder<V> {
    routes: Vec<RouteDescriptor<V>>,
}

impl<V> RouteTableBuilder<V> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    pub fn route(mut self, route: RouteDescriptor<V>) -> Self {
        self.routes.push(route);
        self
    }

    pub fn build(self) -> Result<RouteTable<V>, RouteTableError> {
        RouteTable::new(self.routes)
    }
}

impl<V> Default for RouteTableBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}
