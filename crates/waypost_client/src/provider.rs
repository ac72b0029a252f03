use std::rc::Rc;

use leptos::prelude::*;
use waypost_common::{
    LocationPort, ModuleLoader, NoopLoader, PreloadCache, PreloadScheduler, RouteState,
    RouterConfig, Scheduler, on_hash_change,
};

use crate::browser::{BrowserLocation, BrowserScheduler, BrowserSpawner};
use crate::context::{RouterContext, RoutesSignal};

/// Provider component that owns the router state and provides
/// [`RouterContext`].
///
/// Wrap the part of the application that navigates. Every port defaults to
/// its browser implementation; tests and embedders can inject their own.
///
/// # Example
///
/// ```rust,ignore
/// use std::rc::Rc;
/// use waypost_client::{ModulePreloadLoader, RouterOutlet, RouterProvider};
///
/// #[component]
/// pub fn App() -> impl IntoView {
///     let routes = Signal::stored(Some(console_routes()));
///     let auth = use_auth_state();
///
///     view! {
///         <RouterProvider routes=routes loader=Rc::new(ModulePreloadLoader::new("/pkg/"))>
///             <Nav/>
///             <RouterOutlet auth=auth/>
///         </RouterProvider>
///     }
/// }
/// ```
#[component]
pub fn RouterProvider(
    /// Route table, `None` until the composition root has it
    #[prop(into)]
    routes: RoutesSignal,
    /// Router configuration (default: `RouterConfig::default()`)
    #[prop(optional)]
    config: Option<RouterConfig>,
    /// Location port (default: `BrowserLocation`)
    #[prop(optional)]
    location: Option<Rc<dyn LocationPort>>,
    /// Module loader used for preloading (default: `NoopLoader`)
    #[prop(optional)]
    loader: Option<Rc<dyn ModuleLoader>>,
    /// Timer and idle scheduler (default: `BrowserScheduler`)
    #[prop(optional)]
    scheduler: Option<Rc<dyn Scheduler>>,
    /// Child components
    children: Children,
) -> impl IntoView {
    let config = config.unwrap_or_default();
    let location = location.unwrap_or_else(|| Rc::new(BrowserLocation));
    let loader = loader.unwrap_or_else(|| Rc::new(NoopLoader));
    let scheduler = scheduler.unwrap_or_else(|| Rc::new(BrowserScheduler));

    let initial = RouteState::initial(location.as_ref());
    log::debug!("[RouterProvider] Initial route '{}'", initial.path);
    let (state, set_state) = signal(initial);

    let subscription = location.subscribe(Box::new(move |hash: &str| {
        let next = on_hash_change(hash);
        log::debug!("[RouterProvider] Hash changed, route '{}'", next.path);
        set_state.set(next);
    }));
    // Dropped, and so unsubscribed, together with this component's owner.
    let _subscription = StoredValue::new_local(subscription);

    let cache = PreloadCache::new(loader, Rc::new(BrowserSpawner));
    let preloader = PreloadScheduler::new(cache, scheduler, &config);

    let ctx = RouterContext::new(state, routes, config, location, preloader);
    provide_context(ctx);

    // Critical routes are warmed once the table is available.
    Effect::new(move |_| {
        if routes.with(Option::is_some) && ctx.preload_critical_routes() {
            log::debug!("[RouterProvider] Scheduled critical route preload");
        }
    });

    children()
}
