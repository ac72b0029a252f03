//! Admin console demo for waypost_client
//!
//! This example demonstrates:
//! - Wiring a route table with protected and critical routes
//! - Guarding views behind an asynchronously resolved auth state
//! - Hover preloading through `PreloadLink`
//!
//! Run it with:
//!   cd demos/console
//!   trunk serve --open

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::FutureExt;
use leptos::prelude::*;
use waypost_client::{
    AuthState, FnLoader, ModuleLoader, NavigateOptions, PreloadError, PreloadLink, Priority,
    Query, Route, RouterConfig, RouterOutlet, RouterProvider, Routes, use_navigate,
    use_query_value, use_route_state, use_router,
};

fn main() {
    console_error_panic_hook::set_once();
    _ = console_log::init_with_level(log::Level::Debug);

    leptos::mount::mount_to_body(App);
}

fn console_routes() -> Arc<Routes> {
    let table = Routes::builder()
        .route(Route::new("/login", "Sign in", ViewFn::from(LoginPage)))
        .route(
            Route::new("/dashboard", "Dashboard", ViewFn::from(DashboardPage))
                .protected()
                .preload("dashboard")
                .priority(Priority::Critical),
        )
        .route(
            Route::new("/subscriptions", "Subscriptions", ViewFn::from(SubscriptionsPage))
                .protected()
                .preload("subscriptions")
                .priority(Priority::Critical),
        )
        .route(
            Route::new("/checks", "Checks", ViewFn::from(ChecksPage))
                .protected()
                .preload("checks")
                .priority(Priority::Normal),
        )
        .route(
            Route::new("/shares", "Shared links", ViewFn::from(SharesPage))
                .protected()
                .preload("shares")
                .priority(Priority::Low),
        )
        .route(
            Route::new("/notifications", "Notifications", ViewFn::from(NotificationsPage))
                .protected()
                .preload("notifications")
                .priority(Priority::Low),
        );

    match table.build() {
        Ok(table) => Arc::new(table),
        Err(e) => {
            log::error!("[console] Invalid route table: {}", e);
            Arc::new(Routes::default())
        }
    }
}

/// Pretends to fetch a code-split chunk.
fn simulated_loader() -> Rc<dyn ModuleLoader> {
    Rc::new(FnLoader::new(|key: &str| {
        let key = key.to_string();
        let (tx, rx) = oneshot::channel::<()>();
        set_timeout(
            move || {
                let _ = tx.send(());
            },
            Duration::from_millis(150),
        );
        async move {
            rx.await
                .map_err(|_| PreloadError::failed(key, "chunk request dropped"))
        }
        .boxed_local()
    }))
}

#[component]
fn App() -> impl IntoView {
    // Stand-in for the auth provider: resolves to "signed out" after a moment.
    let (auth, set_auth) = signal(AuthState::LOADING);
    set_timeout(
        move || set_auth.set(AuthState::ANONYMOUS),
        Duration::from_millis(400),
    );
    provide_context(set_auth);

    let routes = Signal::stored(Some(console_routes()));
    let config = RouterConfig::default().with_title_suffix(" | Console");

    view! {
        <RouterProvider routes=routes config=config loader=simulated_loader()>
            <div class="console">
                <Nav auth=auth/>
                <main>
                    <RouterOutlet auth=auth/>
                </main>
            </div>
        </RouterProvider>
    }
}

#[component]
fn Nav(auth: ReadSignal<AuthState>) -> impl IntoView {
    let set_auth = expect_context::<WriteSignal<AuthState>>();
    let route = use_route_state();
    let router = use_router();

    view! {
        <nav class="console-nav">
            <PreloadLink to="/dashboard">"Dashboard"</PreloadLink>
            <PreloadLink to="/subscriptions">"Subscriptions"</PreloadLink>
            <PreloadLink to="/checks">"Checks"</PreloadLink>
            <PreloadLink to="/shares">"Shared links"</PreloadLink>
            <PreloadLink to="/notifications">"Notifications"</PreloadLink>
            <button on:click=move |_| { router.preload_by_priority(Priority::Low); }>
                "Warm rarely used pages"
            </button>
            <Show when=move || auth.get().is_authenticated>
                <button on:click=move |_| set_auth.set(AuthState::ANONYMOUS)>"Sign out"</button>
            </Show>
            <span class="console-path">{move || route.with(|r| r.path.clone())}</span>
        </nav>
    }
}

#[component]
fn LoginPage() -> impl IntoView {
    let set_auth = expect_context::<WriteSignal<AuthState>>();

    view! {
        <section>
            <h1>"Sign in"</h1>
            <button on:click=move |_| set_auth.set(AuthState::AUTHENTICATED)>"Sign in as demo user"</button>
        </section>
    }
}

#[component]
fn DashboardPage() -> impl IntoView {
    view! {
        <section>
            <h1>"Dashboard"</h1>
            <p>"3 subscriptions, 12 checks, 1 failing."</p>
        </section>
    }
}

#[component]
fn SubscriptionsPage() -> impl IntoView {
    view! {
        <section>
            <h1>"Subscriptions"</h1>
            <PreloadLink to="/checks" query=filter("subscription", "billing")>
                "Checks for billing"
            </PreloadLink>
        </section>
    }
}

#[component]
fn ChecksPage() -> impl IntoView {
    let subscription = use_query_value("subscription");
    let navigate = use_navigate();

    view! {
        <section>
            <h1>"Checks"</h1>
            <p>
                {move || match subscription.get() {
                    Some(name) => format!("Showing checks for '{}'.", name),
                    None => "Showing all checks.".to_string(),
                }}
            </p>
            <button on:click=move |_| navigate("/checks", &Query::new(), &NavigateOptions::replace())>
                "Clear filter"
            </button>
        </section>
    }
}

#[component]
fn SharesPage() -> impl IntoView {
    view! {
        <section>
            <h1>"Shared links"</h1>
        </section>
    }
}

#[component]
fn NotificationsPage() -> impl IntoView {
    view! {
        <section>
            <h1>"Notifications"</h1>
        </section>
    }
}

fn filter(key: &str, value: &str) -> Query {
    let mut query = Query::new();
    query.insert(key.to_string(), value.into());
    query
}
