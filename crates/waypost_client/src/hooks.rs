use leptos::prelude::*;
use waypost_common::{HoverIntent, NavigateOptions, Query, RouteState};

use crate::context::RouterContext;

/// Hook to access the router context.
///
/// # Panics
///
/// Panics if called outside of a `RouterProvider`.
pub fn use_router() -> RouterContext {
    expect_context::<RouterContext>()
}

/// Hook to read the current route state.
///
/// # Example
///
/// ```rust,ignore
/// use waypost_client::use_route_state;
///
/// #[component]
/// fn Breadcrumb() -> impl IntoView {
///     let route = use_route_state();
///     view! { <span>{move || route.with(|r| r.path.clone())}</span> }
/// }
/// ```
pub fn use_route_state() -> ReadSignal<RouteState> {
    use_router().state
}

/// Hook returning a navigation function.
///
/// The function is `Copy`, so it can be moved into any number of event
/// handlers.
///
/// ```rust,ignore
/// let navigate = use_navigate();
/// view! {
///     <button on:click=move |_| navigate("/checks", &Query::new(), &NavigateOptions::default())>
///         "Checks"
///     </button>
/// }
/// ```
pub fn use_navigate() -> impl Fn(&str, &Query, &NavigateOptions) + Copy + 'static {
    let ctx = use_router();
    move |path, query, options| ctx.navigate(path, query, options)
}

/// Hook to read the current query. Only notifies when the query changes.
pub fn use_query() -> Memo<Query> {
    let state = use_route_state();
    Memo::new(move |_| state.with(|state| state.query.clone()))
}

/// Hook to read the first value of one query key.
pub fn use_query_value(key: impl Into<String>) -> Memo<Option<String>> {
    let key = key.into();
    let state = use_route_state();
    Memo::new(move |_| state.with(|state| state.query_value(&key).map(str::to_string)))
}

/// Hover-intent preloader bound to the router.
///
/// `Copy` handle around one [`HoverIntent`]; the pending timer is cancelled
/// when the owning component unmounts.
#[derive(Clone, Copy)]
pub struct HoverPreload {
    intent: StoredValue<HoverIntent, LocalStorage>,
}

impl HoverPreload {
    /// Pointer entered a link to `path`.
    pub fn enter(&self, path: &str) {
        let _ = self.intent.try_with_value(|intent| intent.enter(path));
    }

    /// Pointer left before the delay expired.
    pub fn leave(&self) {
        let _ = self.intent.try_with_value(|intent| intent.leave());
    }
}

/// Hook creating a hover-intent preloader that warms routes through the
/// provider's preload cache after the configured hover delay.
pub fn use_hover_preload() -> HoverPreload {
    let ctx = use_router();
    let preloader = ctx.preloader();
    let intent = HoverIntent::new(
        preloader.scheduler(),
        ctx.config().hover_delay(),
        move |path| {
            log::debug!("[HoverPreload] Warming '{}'", path);
            // The load runs to completion on its own; nothing awaits it here.
            drop(ctx.preload_route(path));
        },
    );
    HoverPreload {
        intent: StoredValue::new_local(intent),
    }
}
