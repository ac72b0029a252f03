//! # Waypost Client
//!
//! Leptos integration for the waypost hash router.
//!
//! Provides a provider that owns the route state, an outlet that guards
//! protected views behind an auth signal, links that warm route code on hover,
//! and browser implementations of the `waypost_common` ports.
//!
//! ## Features
//!
//! - **Hash routing**: the fragment after `#` is the only routing input
//! - **Auth guard**: protected views are never mounted for anonymous users;
//!   redirects replace the history entry
//! - **Preloading**: critical routes warm during idle time, hovered links
//!   warm after a short delay, each route loads at most once
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use leptos::prelude::*;
//! use waypost_client::{PreloadLink, Priority, Route, RouterOutlet, RouterProvider, Routes};
//!
//! fn routes() -> Arc<Routes> {
//!     let table = Routes::builder()
//!         .route(Route::new("/login", "Sign in", ViewFn::from(|| view! { <LoginPage/> })))
//!         .route(
//!             Route::new("/dashboard", "Dashboard", ViewFn::from(|| view! { <Dashboard/> }))
//!                 .protected()
//!                 .preload("dashboard")
//!                 .priority(Priority::Critical),
//!         )
//!         .build()
//!         .expect("route paths are unique");
//!     Arc::new(table)
//! }
//!
//! #[component]
//! fn App() -> impl IntoView {
//!     let auth = use_auth_state();
//!
//!     view! {
//!         <RouterProvider routes=Signal::stored(Some(routes()))>
//!             <nav>
//!                 <PreloadLink to="/dashboard">"Dashboard"</PreloadLink>
//!             </nav>
//!             <RouterOutlet auth=auth/>
//!         </RouterProvider>
//!     }
//! }
//! ```

mod browser;
mod components;
mod context;
mod hooks;
mod provider;

pub use browser::{BrowserLocation, BrowserScheduler, BrowserSpawner, ModulePreloadLoader};
pub use components::{PreloadLink, RouterOutlet};
pub use context::{RouterContext, RoutesSignal};
pub use hooks::{
    HoverPreload, use_hover_preload, use_navigate, use_query, use_query_value, use_route_state,
    use_router,
};
pub use provider::RouterProvider;

pub use waypost_common::{
    AuthState, FnLoader, LocationPort, ModuleLoader, NavigateOptions, NoopLoader, PreloadError,
    PreloadHandle, Priority, Query, QueryValue, RouteState, RouterConfig, Scheduler,
};

/// A route whose view is a Leptos view function.
pub type Route = waypost_common::RouteDescriptor<leptos::prelude::ViewFn>;

/// A route table of [`Route`]s.
pub type Routes = waypost_common::RouteTable<leptos::prelude::ViewFn>;
