//! Auth guard and outlet view selection.
//!
//! Both functions are pure so the redirect decision and the rendered view are
//! always derived from the same inputs. The UI layer calls
//! [`decide_redirect`] from an effect and performs the navigation; it renders
//! whatever [`decide_view`] returns.

use serde::{Deserialize, Serialize};

use crate::config::RouterConfig;
use crate::route::{RouteDescriptor, RouteTable};

/// Read-only view of the auth collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl AuthState {
    pub const LOADING: Self = Self {
        is_authenticated: false,
        is_loading: true,
    };

    pub const ANONYMOUS: Self = Self {
        is_authenticated: false,
        is_loading: false,
    };

    pub const AUTHENTICATED: Self = Self {
        is_authenticated: true,
        is_loading: false,
    };
}

/// A redirect the guard wants performed. Always non-recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: String,
}

impl Redirect {
    fn to(path: &str) -> Option<Self> {
        Some(Self {
            to: path.to_string(),
        })
    }
}

/// Decide whether the current location must be redirected.
///
/// Rules, first match wins:
/// 1. protected route, unauthenticated, not already on login: go to login
/// 2. authenticated and on login: go to the landing path
/// 3. empty path: landing if authenticated, login otherwise
///
/// Nothing is decided while the auth state is still loading.
pub fn decide_redirect<V>(
    route: Option<&RouteDescriptor<V>>,
    auth: AuthState,
    path: &str,
    config: &RouterConfig,
) -> Option<Redirect> {
    if auth.is_loading {
        return None;
    }

    let protected = route.is_some_and(|route| route.protected);

    if protected && !auth.is_authenticated && path != config.login_path {
        return Redirect::to(&config.login_path);
    }

    if auth.is_authenticated && path == config.login_path {
        return Redirect::to(&config.landing_path);
    }

    if path.is_empty() {
        return if auth.is_authenticated {
            Redirect::to(&config.landing_path)
        } else {
            Redirect::to(&config.login_path)
        };
    }

    None
}

/// What the outlet renders.
#[derive(Debug)]
pub enum OutletView<'a, V> {
    /// The route table has not been supplied yet.
    Bootstrapping,
    /// Auth status is still resolving.
    VerifyingIdentity,
    /// Protected route, unauthenticated user; the guard is redirecting.
    Redirecting,
    /// Render this route's view.
    Route(&'a RouteDescriptor<V>),
    /// Empty path; the guard is redirecting.
    Transitional,
    /// Nothing matches this non-empty path.
    NotFound(String),
}

// Manual impls so `V` need not be Clone/Copy.
impl<V> Clone for OutletView<'_, V> {
    fn clone(&self) -> Self {
        match self {
            OutletView::Bootstrapping => OutletView::Bootstrapping,
            OutletView::VerifyingIdentity => OutletView::VerifyingIdentity,
            OutletView::Redirecting => OutletView::Redirecting,
            OutletView::Route(route) => OutletView::Route(*route),
            OutletView::Transitional => OutletView::Transitional,
            OutletView::NotFound(path) => OutletView::NotFound(path.clone()),
        }
    }
}

// Routes compare by path, which is unique within a table.
impl<V> PartialEq for OutletView<'_, V> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (OutletView::Route(a), OutletView::Route(b)) => a.path == b.path,
            (OutletView::NotFound(a), OutletView::NotFound(b)) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl<V> Eq for OutletView<'_, V> {}

/// Select the outlet view for the current inputs.
pub fn decide_view<'a, V>(
    routes: Option<&'a RouteTable<V>>,
    auth: AuthState,
    path: &str,
) -> OutletView<'a, V> {
    let Some(routes) = routes else {
        return OutletView::Bootstrapping;
    };

    if auth.is_loading {
        return OutletView::VerifyingIdentity;
    }

    match routes.find(path) {
        Some(route) if route.protected && !auth.is_authenticated => OutletView::Redirecting,
        Some(route) => OutletView::Route(route),
        None if path.is_empty() => OutletView::Transitional,
        None => OutletView::NotFound(path.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable<&'static str> {
        RouteTable::builder()
            .route(RouteDescriptor::new("/login", "Sign in", "login"))
            .route(RouteDescriptor::new("/dashboard", "Dashboard", "dashboard").protected())
            .route(RouteDescriptor::new("/share", "Shared link", "share"))
            .build()
            .unwrap()
    }

    fn redirect(path: &str, auth: AuthState) -> Option<String> {
        let table = table();
        decide_redirect(table.find(path), auth, path, &RouterConfig::default()).map(|r| r.to)
    }

    #[test]
    fn test_protected_route_redirects_to_login() {
        assert_eq!(redirect("/dashboard", AuthState::ANONYMOUS).as_deref(), Some("/login"));
        assert_eq!(redirect("/dashboard", AuthState::AUTHENTICATED), None);
    }

    #[test]
    fn test_authenticated_user_leaves_login() {
        assert_eq!(redirect("/login", AuthState::AUTHENTICATED).as_deref(), Some("/dashboard"));
        assert_eq!(redirect("/login", AuthState::ANONYMOUS), None);
    }

    #[test]
    fn test_empty_path_redirects_by_auth() {
        assert_eq!(redirect("", AuthState::AUTHENTICATED).as_deref(), Some("/dashboard"));
        assert_eq!(redirect("", AuthState::ANONYMOUS).as_deref(), Some("/login"));
    }

    #[test]
    fn test_no_redirect_while_loading() {
        assert_eq!(redirect("/dashboard", AuthState::LOADING), None);
        assert_eq!(redirect("", AuthState::LOADING), None);
    }

    #[test]
    fn test_unknown_and_public_paths_do_not_redirect() {
        assert_eq!(redirect("/nonexistent", AuthState::ANONYMOUS), None);
        assert_eq!(redirect("/nonexistent", AuthState::AUTHENTICATED), None);
        assert_eq!(redirect("/share", AuthState::ANONYMOUS), None);
    }

    #[test]
    fn test_protected_login_path_does_not_loop() {
        let table = RouteTable::new(vec![RouteDescriptor::new("/login", "Sign in", ()).protected()]).unwrap();
        let config = RouterConfig::default();
        assert_eq!(
            decide_redirect(table.find("/login"), AuthState::ANONYMOUS, "/login", &config),
            None
        );
    }

    #[test]
    fn test_custom_paths() {
        let config = RouterConfig::default()
            .with_login_path("/sign-in")
            .with_landing_path("/subscriptions");
        let to = decide_redirect::<()>(None, AuthState::AUTHENTICATED, "", &config).map(|r| r.to);
        assert_eq!(to.as_deref(), Some("/subscriptions"));
    }

    #[test]
    fn test_view_before_routes_load() {
        assert_eq!(
            decide_view::<()>(None, AuthState::AUTHENTICATED, "/dashboard"),
            OutletView::Bootstrapping
        );
    }

    #[test]
    fn test_view_while_verifying() {
        let table = table();
        assert_eq!(
            decide_view(Some(&table), AuthState::LOADING, "/dashboard"),
            OutletView::VerifyingIdentity
        );
    }

    #[test]
    fn test_protected_view_is_never_selected_for_anonymous() {
        let table = table();
        let view = decide_view(Some(&table), AuthState::ANONYMOUS, "/dashboard");
        assert_eq!(view, OutletView::Redirecting);
    }

    #[test]
    fn test_matched_view() {
        let table = table();
        match decide_view(Some(&table), AuthState::AUTHENTICATED, "/dashboard") {
            OutletView::Route(route) => assert_eq!(route.view, "dashboard"),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_empty_and_unknown_paths() {
        let table = table();
        assert_eq!(
            decide_view(Some(&table), AuthState::ANONYMOUS, ""),
            OutletView::Transitional
        );
        assert_eq!(
            decide_view(Some(&table), AuthState::ANONYMOUS, "/nonexistent"),
            OutletView::NotFound("/nonexistent".to_string())
        );
    }
}
