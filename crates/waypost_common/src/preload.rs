//! Route code warming.
//!
//! [`PreloadCache`] guarantees at most one [`ModuleLoader::load`] per path
//! for its lifetime and keeps every outcome, including failures.
//! [`PreloadScheduler`] decides *when* to warm: critical routes once during
//! idle time, whole tiers on demand.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture, Shared};
use futures::task::{LocalSpawn, LocalSpawnExt};

use crate::config::RouterConfig;
use crate::error::PreloadError;
use crate::route::{Priority, RouteDescriptor, RouteTable};
use crate::schedule::{IdleOptions, Scheduler};

pub type PreloadResult = Result<(), PreloadError>;

/// Outcome of a preload, shareable between any number of waiters.
///
/// Awaiting it is optional: the load runs to completion either way.
pub type PreloadHandle = Shared<LocalBoxFuture<'static, PreloadResult>>;

/// Capability that fetches the code behind a route.
pub trait ModuleLoader {
    fn load(&self, key: &str) -> LocalBoxFuture<'static, PreloadResult>;
}

/// Loader for hosts without code splitting. Always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLoader;

impl ModuleLoader for NoopLoader {
    fn load(&self, _key: &str) -> LocalBoxFuture<'static, PreloadResult> {
        future::ready(Ok(())).boxed_local()
    }
}

/// Adapts a closure into a [`ModuleLoader`].
///
/// ```rust
/// use futures::future;
/// use waypost_common::{FnLoader, ModuleLoader};
///
/// let loader = FnLoader::new(|_key: &str| future::ready(Ok::<_, waypost_common::PreloadError>(())));
/// let _pending = loader.load("dashboard");
/// ```
pub struct FnLoader<F> {
    load: F,
}

impl<F> FnLoader<F> {
    pub fn new(load: F) -> Self {
        Self { load }
    }
}

impl<F, Fut> ModuleLoader for FnLoader<F>
where
    F: Fn(&str) -> Fut,
    Fut: Future<Output = PreloadResult> + 'static,
{
    fn load(&self, key: &str) -> LocalBoxFuture<'static, PreloadResult> {
        (self.load)(key).boxed_local()
    }
}

fn resolved() -> PreloadHandle {
    future::ready(Ok(())).boxed_local().shared()
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, PreloadHandle>,
    loading: HashSet<String>,
}

/// Path-keyed cache of preload handles.
///
/// Entries are never evicted and never retried; the cache is bounded by the
/// number of routes. Cloning shares the same cache.
#[derive(Clone)]
pub struct PreloadCache {
    inner: Rc<RefCell<CacheInner>>,
    loader: Rc<dyn ModuleLoader>,
    spawner: Rc<dyn LocalSpawn>,
}

impl PreloadCache {
    /// Create a cache. Loads are driven to completion on `spawner`.
    pub fn new(loader: Rc<dyn ModuleLoader>, spawner: Rc<dyn LocalSpawn>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(CacheInner::default())),
            loader,
            spawner,
        }
    }

    /// Warm the route registered at `path`.
    ///
    /// Unknown paths and routes without a module resolve immediately and are
    /// not cached.
    pub fn preload_route<V>(&self, routes: &RouteTable<V>, path: &str) -> PreloadHandle {
        match routes.find(path) {
            Some(route) => self.preload(route),
            None => resolved(),
        }
    }

    /// Warm one route.
    pub fn preload<V>(&self, route: &RouteDescriptor<V>) -> PreloadHandle {
        let Some(module) = route.module.as_deref() else {
            return resolved();
        };

        if let Some(existing) = self.inner.borrow().entries.get(&route.path) {
            return existing.clone();
        }

        let path = route.path.clone();
        let (settle, settled) = oneshot::channel::<PreloadResult>();
        let key = path.clone();
        let handle = async move {
            settled.await.unwrap_or_else(|_| {
                Err(PreloadError::Spawn(format!("driver for '{}' was dropped", key)))
            })
        }
        .boxed_local()
        .shared();

        // Registered before `load` runs, so a loader that warms routes
        // re-entrantly gets this entry instead of starting a second load.
        {
            let mut inner = self.inner.borrow_mut();
            inner.loading.insert(path.clone());
            inner.entries.insert(path.clone(), handle.clone());
        }
        log::debug!("[PreloadCache] Loading module '{}' for '{}'", module, path);

        let load = self.loader.load(module);
        let weak = Rc::downgrade(&self.inner);
        let waiters = handle.clone();
        let key = path.clone();
        let driver = async move {
            let result = load.await;
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().loading.remove(&key);
            }
            match &result {
                Ok(()) => log::debug!("[PreloadCache] Preloaded '{}'", key),
                Err(e) => log::warn!("[PreloadCache] Preload of '{}' failed: {}", key, e),
            }
            let _ = settle.send(result);
            // Settle the shared handle so its outcome is cached without waiters.
            let _ = waiters.await;
        };

        if let Err(e) = self.spawner.spawn_local(driver) {
            log::warn!("[PreloadCache] Could not start preload of '{}': {}", path, e);
            self.inner.borrow_mut().loading.remove(&path);
        }

        handle
    }

    /// A load for `path` has started and not settled yet.
    pub fn is_loading(&self, path: &str) -> bool {
        self.inner.borrow().loading.contains(path)
    }

    /// `path` has an entry, pending or settled.
    pub fn contains(&self, path: &str) -> bool {
        self.inner.borrow().entries.contains_key(path)
    }

    /// The settled outcome for `path`, if its load has finished.
    pub fn outcome(&self, path: &str) -> Option<PreloadResult> {
        self.inner
            .borrow()
            .entries
            .get(path)
            .and_then(|handle| handle.peek().cloned())
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decides when routes are warmed.
///
/// One instance per router provider; [`preload_critical_routes`] is a one-shot
/// for that lifetime.
///
/// [`preload_critical_routes`]: PreloadScheduler::preload_critical_routes
#[derive(Clone)]
pub struct PreloadScheduler {
    cache: PreloadCache,
    scheduler: Rc<dyn Scheduler>,
    idle: IdleOptions,
    critical_requested: Rc<Cell<bool>>,
}

impl PreloadScheduler {
    pub fn new(cache: PreloadCache, scheduler: Rc<dyn Scheduler>, config: &RouterConfig) -> Self {
        Self {
            cache,
            scheduler,
            idle: IdleOptions {
                timeout: config.idle_timeout(),
                fallback: config.idle_fallback(),
            },
            critical_requested: Rc::new(Cell::new(false)),
        }
    }

    pub fn cache(&self) -> &PreloadCache {
        &self.cache
    }

    pub fn scheduler(&self) -> Rc<dyn Scheduler> {
        Rc::clone(&self.scheduler)
    }

    pub fn preload_route<V>(&self, routes: &RouteTable<V>, path: &str) -> PreloadHandle {
        self.cache.preload_route(routes, path)
    }

    /// Warm every critical route once the host is idle.
    ///
    /// Returns `false` if this instance already scheduled it.
    pub fn preload_critical_routes<V: 'static>(&self, routes: Arc<RouteTable<V>>) -> bool {
        if self.critical_requested.replace(true) {
            return false;
        }

        let cache = self.cache.clone();
        self.scheduler.request_idle(
            self.idle,
            Box::new(move || {
                let count = routes
                    .with_priority(Priority::Critical)
                    .map(|route| cache.preload(route))
                    .count();
                log::debug!("[PreloadScheduler] Warming {} critical route(s)", count);
            }),
        );
        true
    }

    /// Warm every route of `tier` right away.
    pub fn preload_by_priority<V>(&self, routes: &RouteTable<V>, tier: Priority) -> Vec<PreloadHandle> {
        routes
            .with_priority(tier)
            .map(|route| self.cache.preload(route))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use futures::executor::LocalPool;

    use super::*;
    use crate::schedule::ManualScheduler;

    /// Loader whose loads complete only when the test says so.
    #[derive(Default)]
    struct GatedLoader {
        calls: RefCell<Vec<String>>,
        gates: RefCell<HashMap<String, oneshot::Sender<PreloadResult>>>,
    }

    impl GatedLoader {
        fn finish(&self, key: &str, result: PreloadResult) {
            let gate = self.gates.borrow_mut().remove(key).unwrap();
            gate.send(result).unwrap();
        }
    }

    impl ModuleLoader for GatedLoader {
        fn load(&self, key: &str) -> LocalBoxFuture<'static, PreloadResult> {
            self.calls.borrow_mut().push(key.to_string());
            let (tx, rx) = oneshot::channel();
            self.gates.borrow_mut().insert(key.to_string(), tx);
            let key = key.to_string();
            async move {
                rx.await
                    .unwrap_or_else(|_| Err(PreloadError::failed(key, "cancelled")))
            }
            .boxed_local()
        }
    }

    fn table() -> RouteTable<()> {
        RouteTable::builder()
            .route(RouteDescriptor::new("/login", "Sign in", ()))
            .route(
                RouteDescriptor::new("/dashboard", "Dashboard", ())
                    .protected()
                    .preload("dashboard")
                    .priority(Priority::Critical),
            )
            .route(
                RouteDescriptor::new("/checks", "Checks", ())
                    .protected()
                    .preload("checks")
                    .priority(Priority::Normal),
            )
            .build()
            .unwrap()
    }

    fn setup() -> (LocalPool, Rc<GatedLoader>, PreloadCache) {
        let pool = LocalPool::new();
        let loader = Rc::new(GatedLoader::default());
        let cache = PreloadCache::new(loader.clone(), Rc::new(pool.spawner()));
        (pool, loader, cache)
    }

    #[test]
    fn test_route_without_module_resolves_immediately() {
        let (_pool, loader, cache) = setup();
        let handle = cache.preload_route(&table(), "/login");
        assert_eq!(handle.now_or_never(), Some(Ok(())));
        assert!(loader.calls.borrow().is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unknown_path_resolves_immediately() {
        let (_pool, loader, cache) = setup();
        assert_eq!(cache.preload_route(&table(), "/nope").now_or_never(), Some(Ok(())));
        assert!(loader.calls.borrow().is_empty());
    }

    #[test]
    fn test_entry_visible_before_settling() {
        let (_pool, _loader, cache) = setup();
        let _handle = cache.preload_route(&table(), "/dashboard");
        assert!(cache.contains("/dashboard"));
        assert!(cache.is_loading("/dashboard"));
        assert_eq!(cache.outcome("/dashboard"), None);
    }

    #[test]
    fn test_loading_marker_cleared_without_awaiting() {
        let (mut pool, loader, cache) = setup();
        drop(cache.preload_route(&table(), "/checks"));

        loader.finish("checks", Ok(()));
        pool.run_until_stalled();

        assert!(!cache.is_loading("/checks"));
        assert_eq!(cache.outcome("/checks"), Some(Ok(())));
    }

    #[test]
    fn test_preload_by_priority_only_touches_tier() {
        let (_pool, loader, cache) = setup();
        let scheduler = PreloadScheduler::new(cache, Rc::new(ManualScheduler::new()), &RouterConfig::default());

        let handles = scheduler.preload_by_priority(&table(), Priority::Normal);
        assert_eq!(handles.len(), 1);
        assert_eq!(*loader.calls.borrow(), vec!["checks".to_string()]);
    }

    #[test]
    fn test_reentrant_preload_starts_one_load_per_path() {
        let mut pool = LocalPool::new();
        let routes = Rc::new(table());
        let slot: Rc<RefCell<Option<PreloadCache>>> = Rc::default();
        let calls: Rc<RefCell<HashMap<String, usize>>> = Rc::default();

        // Each module warms its sibling while loading, forming a cycle.
        let loader = FnLoader::new({
            let routes = Rc::clone(&routes);
            let slot = Rc::clone(&slot);
            let calls = Rc::clone(&calls);
            move |key: &str| {
                *calls.borrow_mut().entry(key.to_string()).or_default() += 1;
                let sibling = if key == "dashboard" { "/checks" } else { "/dashboard" };
                if let Some(cache) = slot.borrow().as_ref() {
                    drop(cache.preload_route(&routes, sibling));
                }
                future::ready(Ok::<_, PreloadError>(()))
            }
        });
        let cache = PreloadCache::new(Rc::new(loader), Rc::new(pool.spawner()));
        *slot.borrow_mut() = Some(cache.clone());

        let handle = cache.preload_route(&routes, "/dashboard");
        assert_eq!(calls.borrow().get("dashboard"), Some(&1));
        assert_eq!(calls.borrow().get("checks"), Some(&1));

        assert_eq!(pool.run_until(handle), Ok(()));
        pool.run_until_stalled();
        assert_eq!(cache.outcome("/checks"), Some(Ok(())));
        assert!(!cache.is_loading("/dashboard"));

        slot.borrow_mut().take();
    }

    #[test]
    fn test_noop_loader_always_succeeds() {
        assert_eq!(NoopLoader.load("anything").now_or_never(), Some(Ok(())));
    }
}
