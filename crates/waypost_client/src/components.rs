//! Ready-to-use router components.

use leptos::prelude::*;
use waypost_common::{
    AuthState, NavigateOptions, OutletView, Query, build, decide_redirect, decide_view,
};

use crate::hooks::{use_hover_preload, use_router};

/// Owned form of [`OutletView`], compared to avoid remounting the page when
/// unrelated inputs change.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Shown {
    Bootstrapping,
    VerifyingIdentity,
    Blank,
    Route(String),
    NotFound(String),
}

impl From<OutletView<'_, ViewFn>> for Shown {
    fn from(view: OutletView<'_, ViewFn>) -> Self {
        match view {
            OutletView::Bootstrapping => Shown::Bootstrapping,
            OutletView::VerifyingIdentity => Shown::VerifyingIdentity,
            OutletView::Redirecting | OutletView::Transitional => Shown::Blank,
            OutletView::Route(route) => Shown::Route(route.path.clone()),
            OutletView::NotFound(path) => Shown::NotFound(path),
        }
    }
}

/// Renders the view of the current route, guarded by `auth`.
///
/// Redirects are performed from an effect and always replace the current
/// history entry. A protected view is never mounted for an unauthenticated
/// user, not even for the frame before the redirect lands.
///
/// # Example
///
/// ```rust,ignore
/// view! {
///     <RouterOutlet
///         auth=auth
///         loading=|| view! { <Spinner/> }
///         not_found=|| view! { <NotFoundPage/> }
///     />
/// }
/// ```
#[component]
pub fn RouterOutlet(
    /// Auth state from the auth provider; only read
    #[prop(into)]
    auth: Signal<AuthState>,
    /// Shown while the route table or the auth state is loading
    #[prop(optional, into)]
    loading: Option<ViewFn>,
    /// Shown for paths with no route
    #[prop(optional, into)]
    not_found: Option<ViewFn>,
) -> impl IntoView {
    let ctx = use_router();
    let config = ctx.config();

    Effect::new(move |_| {
        let auth = auth.get();
        let path = ctx.state.with(|state| state.path.clone());
        let redirect = ctx.routes.with(|routes| {
            let routes = routes.as_deref()?;
            decide_redirect(routes.find(&path), auth, &path, &config)
        });

        if let Some(redirect) = redirect {
            log::debug!("[RouterOutlet] Redirecting '{}' to '{}'", path, redirect.to);
            ctx.navigate(&redirect.to, &Query::new(), &NavigateOptions::replace());
        }
    });

    let shown = Memo::new(move |_| {
        let auth = auth.get();
        ctx.state.with(|state| {
            ctx.routes
                .with(|routes| Shown::from(decide_view(routes.as_deref(), auth, &state.path)))
        })
    });

    let title_config = ctx.config();
    Effect::new(move |_| {
        let Shown::Route(path) = shown.get() else {
            return;
        };
        let title = ctx.routes.with_untracked(|routes| {
            routes
                .as_deref()
                .and_then(|routes| routes.find(&path))
                .map(|route| title_config.document_title(&route.title))
        });
        if let Some(title) = title {
            document().set_title(&title);
        }
    });

    move || match shown.get() {
        Shown::Bootstrapping => match &loading {
            Some(loading) => loading.run(),
            None => view! { <div class="waypost-loading">"Loading…"</div> }.into_any(),
        },
        Shown::VerifyingIdentity => match &loading {
            Some(loading) => loading.run(),
            None => view! { <div class="waypost-loading">"Verifying identity…"</div> }.into_any(),
        },
        Shown::Blank => ().into_any(),
        Shown::Route(path) => {
            let view = ctx.routes.with_untracked(|routes| {
                routes
                    .as_deref()
                    .and_then(|routes| routes.find(&path))
                    .map(|route| route.view.clone())
            });
            match view {
                Some(view) => view.run(),
                None => ().into_any(),
            }
        }
        Shown::NotFound(path) => match &not_found {
            Some(not_found) => not_found.run(),
            None => view! {
                <div class="waypost-not-found">
                    <h2>"Page not found"</h2>
                    <p>{format!("Nothing lives at '{}'.", path)}</p>
                </div>
            }
            .into_any(),
        },
    }
}

/// Anchor to a route that warms the route's code while hovered.
///
/// Navigation itself is the browser following `href="#..."`, so the usual
/// modifier-click behaviour keeps working.
///
/// # Example
///
/// ```rust,ignore
/// view! {
///     <nav>
///         <PreloadLink to="/subscriptions" class="nav-item">"Subscriptions"</PreloadLink>
///         <PreloadLink to="/checks">"Checks"</PreloadLink>
///     </nav>
/// }
/// ```
#[component]
pub fn PreloadLink(
    /// Target route path
    #[prop(into)]
    to: String,
    /// Query for the target
    #[prop(optional)]
    query: Option<Query>,
    /// CSS class for the anchor
    #[prop(optional, into)]
    class: Option<String>,
    /// Link content
    children: Children,
) -> impl IntoView {
    let hover = use_hover_preload();
    let href = format!("#{}", build(&to, &query.unwrap_or_default()));

    view! {
        <a
            href=href
            class=class.unwrap_or_default()
            on:mouseenter=move |_| hover.enter(&to)
            on:mouseleave=move |_| hover.leave()
        >
            {children()}
        </a>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Route, Routes};

    fn table() -> Routes {
        Routes::builder()
            .route(Route::new("/login", "Sign in", ViewFn::default()))
            .route(Route::new("/dashboard", "Dashboard", ViewFn::default()).protected())
            .build()
            .unwrap()
    }

    fn shown(routes: Option<&Routes>, auth: AuthState, path: &str) -> Shown {
        Shown::from(decide_view(routes, auth, path))
    }

    #[test]
    fn test_shown_before_routes_and_auth_resolve() {
        let routes = table();
        assert_eq!(shown(None, AuthState::ANONYMOUS, "/login"), Shown::Bootstrapping);
        assert_eq!(
            shown(Some(&routes), AuthState::LOADING, "/dashboard"),
            Shown::VerifyingIdentity
        );
    }

    #[test]
    fn test_shown_blank_while_redirect_pending() {
        let routes = table();
        assert_eq!(shown(Some(&routes), AuthState::ANONYMOUS, "/dashboard"), Shown::Blank);
        assert_eq!(shown(Some(&routes), AuthState::ANONYMOUS, ""), Shown::Blank);
    }

    #[test]
    fn test_shown_route_and_not_found() {
        let routes = table();
        assert_eq!(
            shown(Some(&routes), AuthState::AUTHENTICATED, "/dashboard"),
            Shown::Route("/dashboard".to_string())
        );
        assert_eq!(
            shown(Some(&routes), AuthState::ANONYMOUS, "/login"),
            Shown::Route("/login".to_string())
        );
        assert_eq!(
            shown(Some(&routes), AuthState::AUTHENTICATED, "/nowhere"),
            Shown::NotFound("/nowhere".to_string())
        );
    }
}
