use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use waypost_common::{
    LocationPort, NavigateOptions, PreloadHandle, PreloadScheduler, Priority, Query, RouteState,
    RouteTable, RouterConfig, navigate,
};

/// Route table as supplied by the composition root. `None` until loaded.
pub type RoutesSignal = Signal<Option<Arc<RouteTable<ViewFn>>>>;

/// Context providing access to the router.
///
/// This context is provided by `RouterProvider` and consumed by the hooks and
/// by `RouterOutlet`/`PreloadLink`. It is `Copy`; the non-`Send` ports live
/// in local stored values owned by the provider.
#[derive(Clone, Copy)]
pub struct RouterContext {
    /// Current route state. Written only by the hash-change listener.
    pub state: ReadSignal<RouteState>,
    /// Route table, `None` while the composition root is still loading it.
    pub routes: RoutesSignal,
    config: StoredValue<RouterConfig>,
    location: StoredValue<Rc<dyn LocationPort>, LocalStorage>,
    preloader: StoredValue<PreloadScheduler, LocalStorage>,
}

impl RouterContext {
    pub(crate) fn new(
        state: ReadSignal<RouteState>,
        routes: RoutesSignal,
        config: RouterConfig,
        location: Rc<dyn LocationPort>,
        preloader: PreloadScheduler,
    ) -> Self {
        Self {
            state,
            routes,
            config: StoredValue::new(config),
            location: StoredValue::new_local(location),
            preloader: StoredValue::new_local(preloader),
        }
    }

    pub fn config(&self) -> RouterConfig {
        self.config.get_value()
    }

    /// Navigate to `path` with `query`.
    ///
    /// The state signal follows once the browser reports the hash change, so
    /// reading `state` right after this call still yields the old route.
    pub fn navigate(&self, path: &str, query: &Query, options: &NavigateOptions) {
        self.location
            .with_value(|location| navigate(location.as_ref(), path, query, options));
    }

    /// Warm the route at `path`. Resolves immediately if the route table is
    /// not loaded yet.
    pub fn preload_route(&self, path: &str) -> PreloadHandle {
        let routes = self.routes.get_untracked();
        self.preloader.with_value(|preloader| match routes {
            Some(routes) => preloader.preload_route(&routes, path),
            None => preloader.preload_route(&RouteTable::<ViewFn>::default(), path),
        })
    }

    /// Warm every route of `tier` now.
    pub fn preload_by_priority(&self, tier: Priority) -> Vec<PreloadHandle> {
        let Some(routes) = self.routes.get_untracked() else {
            return Vec::new();
        };
        self.preloader
            .with_value(|preloader| preloader.preload_by_priority(&routes, tier))
    }

    /// Schedule the one-shot idle preload of critical routes. Returns `false`
    /// if there is no route table yet or it was already scheduled.
    pub fn preload_critical_routes(&self) -> bool {
        let Some(routes) = self.routes.get_untracked() else {
            return false;
        };
        self.preloader
            .with_value(|preloader| preloader.preload_critical_routes(routes))
    }

    pub(crate) fn preloader(&self) -> PreloadScheduler {
        self.preloader.get_value()
    }
}
