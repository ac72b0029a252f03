//! Drives the core the way the UI layer does: a location port feeding route
//! state, the guard deciding redirects, and the outlet picking a view.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use waypost_common::{
    AuthState, HistoryMode, LocationPort, MemoryLocation, NavigateOptions, OutletView, Query,
    QueryValue, RouteDescriptor, RouteState, RouteTable, RouterConfig, Subscription,
    decide_redirect, decide_view, navigate, on_hash_change,
};

fn console_routes() -> RouteTable<&'static str> {
    RouteTable::builder()
        .route(RouteDescriptor::new("/login", "Sign in", "login"))
        .route(RouteDescriptor::new("/dashboard", "Dashboard", "dashboard").protected())
        .route(RouteDescriptor::new("/checks", "Checks", "checks").protected())
        .route(RouteDescriptor::new("/status", "Status", "status"))
        .build()
        .unwrap()
}

/// Minimal stand-in for the provider + outlet pair.
struct Router {
    location: MemoryLocation,
    routes: RouteTable<&'static str>,
    config: RouterConfig,
    state: Rc<RefCell<RouteState>>,
    rendered: RefCell<Vec<String>>,
    _subscription: Subscription,
}

impl Router {
    fn start(hash: &str) -> Self {
        let location = MemoryLocation::new(hash);
        let state = Rc::new(RefCell::new(RouteState::initial(&location)));
        let sink = Rc::clone(&state);
        let subscription = location.subscribe(Box::new(move |hash: &str| {
            *sink.borrow_mut() = on_hash_change(hash);
        }));
        Self {
            location,
            routes: console_routes(),
            config: RouterConfig::default(),
            state,
            rendered: RefCell::new(Vec::new()),
            _subscription: subscription,
        }
    }

    fn path(&self) -> String {
        self.state.borrow().path.clone()
    }

    /// One outlet pass: render, then let the guard act, then deliver events.
    /// Repeats until the location settles.
    fn settle(&self, auth: AuthState) {
        for _ in 0..8 {
            let path = self.path();
            let label = match decide_view(Some(&self.routes), auth, &path) {
                OutletView::Route(route) => route.view.to_string(),
                OutletView::NotFound(path) => format!("not-found:{path}"),
                OutletView::Bootstrapping => "bootstrapping".to_string(),
                OutletView::VerifyingIdentity => "verifying".to_string(),
                OutletView::Redirecting => "redirecting".to_string(),
                OutletView::Transitional => "transitional".to_string(),
            };
            self.rendered.borrow_mut().push(label);

            let redirect = decide_redirect(self.routes.find(&path), auth, &path, &self.config);
            if let Some(redirect) = redirect {
                navigate(
                    &self.location,
                    &redirect.to,
                    &Query::new(),
                    &NavigateOptions::replace(),
                );
            }
            if self.location.dispatch() == 0 {
                return;
            }
        }
        panic!("router did not settle");
    }

    fn rendered(&self) -> Vec<String> {
        self.rendered.borrow().clone()
    }
}

#[test]
fn anonymous_user_never_sees_protected_view() {
    let router = Router::start("#/dashboard");
    router.settle(AuthState::ANONYMOUS);

    assert_eq!(router.path(), "/login");
    assert_eq!(router.rendered(), vec!["redirecting", "login"]);
    // The redirect replaced the entry; back does not return to the dashboard.
    assert_eq!(router.location.history().len(), 1);
}

#[test]
fn signed_in_user_is_moved_off_login() {
    let router = Router::start("#/login");
    router.settle(AuthState::AUTHENTICATED);

    assert_eq!(router.path(), "/dashboard");
    assert_eq!(router.rendered(), vec!["login", "dashboard"]);
}

#[test]
fn guard_waits_for_auth_to_resolve() {
    let router = Router::start("#/checks");
    router.settle(AuthState::LOADING);
    assert_eq!(router.path(), "/checks");
    assert_eq!(router.rendered(), vec!["verifying"]);

    router.settle(AuthState::AUTHENTICATED);
    assert_eq!(router.path(), "/checks");
    assert_eq!(router.rendered(), vec!["verifying", "checks"]);
}

#[test]
fn empty_fragment_lands_by_auth() {
    let anonymous = Router::start("");
    anonymous.settle(AuthState::ANONYMOUS);
    assert_eq!(anonymous.path(), "/login");
    assert_eq!(anonymous.rendered(), vec!["transitional", "login"]);

    let signed_in = Router::start("#");
    signed_in.settle(AuthState::AUTHENTICATED);
    assert_eq!(signed_in.path(), "/dashboard");
}

#[test]
fn unknown_path_renders_not_found_without_redirect() {
    let router = Router::start("#/nonexistent");
    router.settle(AuthState::ANONYMOUS);

    assert_eq!(router.path(), "/nonexistent");
    assert_eq!(router.rendered(), vec!["not-found:/nonexistent"]);
    assert_eq!(router.location.pending_events(), 0);
}

#[test]
fn public_route_is_open_to_everyone() {
    let router = Router::start("#/status");
    router.settle(AuthState::ANONYMOUS);
    assert_eq!(router.rendered(), vec!["status"]);
}

#[test]
fn state_follows_navigation_only_after_notification() {
    let router = Router::start("#/dashboard");
    let mut query = Query::new();
    query.insert("tab".to_string(), QueryValue::from("recent"));

    navigate(&router.location, "/checks", &query, &NavigateOptions::default());
    assert_eq!(router.path(), "/dashboard");

    router.location.dispatch();
    assert_eq!(router.path(), "/checks");
    assert_eq!(router.state.borrow().query_value("tab"), Some("recent"));
    assert!(router.state.borrow().params.is_empty());
}

#[test]
fn address_bar_edit_and_back_update_state() {
    let router = Router::start("#/dashboard");

    router.location.set_external("#/checks?filter=failing&filter=paused");
    router.location.dispatch();
    let expected = QueryValue::from(vec!["failing".to_string(), "paused".to_string()]);
    assert_eq!(router.state.borrow().query.get("filter"), Some(&expected));

    assert!(router.location.back());
    router.location.dispatch();
    assert_eq!(router.path(), "/dashboard");
}

#[test]
fn history_state_is_best_effort() {
    let router = Router::start("#/dashboard");
    router.location.reject_history(true);

    let options = NavigateOptions::default().with_state(json!({ "from": "dashboard" }));
    navigate(&router.location, "/checks", &Query::new(), &options);
    router.location.dispatch();

    assert_eq!(router.path(), "/checks");
    let history = router.location.history();
    assert_eq!(history.last().map(|entry| entry.state.clone()), Some(None));
}

#[test]
fn history_state_is_attached_to_new_entry() {
    let router = Router::start("#/dashboard");

    let options = NavigateOptions::default().with_state(json!({ "from": "dashboard" }));
    navigate(&router.location, "/checks", &Query::new(), &options);

    let history = router.location.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].state, None);
    assert_eq!(history[1].state, Some(json!({ "from": "dashboard" })));
}

#[test]
fn missing_location_yields_empty_state() {
    let location = MemoryLocation::unavailable();
    assert_eq!(RouteState::initial(&location), RouteState::default());

    // Writing is still accepted and makes the location available.
    location
        .write("/login", HistoryMode::Push)
        .expect("memory writes never fail");
    assert_eq!(location.read().as_deref(), Some("/login"));
}
