//! # waypost_common
//!
//! Platform-independent core of the waypost hash router.
//!
//! The fragment after `#` is the only source of routing truth. This crate
//! turns it into a [`RouteState`], decides whether the current view must be
//! guarded behind authentication, and warms route code ahead of navigation.
//! Everything that touches the host goes through small ports so it all runs
//! natively in tests:
//!
//! - [`LocationPort`]: read, watch and write the fragment
//!   ([`MemoryLocation`] here, a browser implementation in `waypost_client`)
//! - [`Scheduler`]: timers and idle callbacks ([`ManualScheduler`] here)
//! - [`ModuleLoader`]: fetch the code behind a route ([`NoopLoader`],
//!   [`FnLoader`])
//!
//! ## Quick Start
//!
//! ```rust
//! use waypost_common::*;
//!
//! let table = RouteTable::builder()
//!     .route(RouteDescriptor::new("/login", "Sign in", "login"))
//!     .route(RouteDescriptor::new("/dashboard", "Dashboard", "dashboard").protected())
//!     .build()
//!     .unwrap();
//!
//! let state = RouteState::from_hash("#/dashboard");
//! let redirect = decide_redirect(
//!     table.find(&state.path),
//!     AuthState::ANONYMOUS,
//!     &state.path,
//!     &RouterConfig::default(),
//! );
//! assert_eq!(redirect.map(|r| r.to).as_deref(), Some("/login"));
//! ```

mod config;
mod error;
mod guard;
mod hover;
mod location;
mod navigation;
mod preload;
mod route;
mod schedule;

pub use config::RouterConfig;
pub use error::{ConfigError, LocationError, PreloadError, RouteTableError};
pub use guard::{AuthState, OutletView, Redirect, decide_redirect, decide_view};
pub use hover::HoverIntent;
pub use location::{
    HashListener, HistoryEntry, HistoryMode, Location, LocationPort, MemoryLocation, Query,
    QueryValue, Subscription, build, parse,
};
pub use navigation::{NavigateOptions, RouteState, navigate, on_hash_change};
pub use preload::{
    FnLoader, ModuleLoader, NoopLoader, PreloadCache, PreloadHandle, PreloadResult,
    PreloadScheduler,
};
pub use route::{ModuleKey, Priority, RouteDescriptor, RouteTable, RouteTableBuilder};
pub use schedule::{IdleOptions, ManualScheduler, Scheduler, Task, TimerId};
