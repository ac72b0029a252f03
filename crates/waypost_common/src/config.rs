use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Router configuration shared by the guard, the preload scheduler and the
/// hover-intent preloader.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```rust
/// use waypost_common::RouterConfig;
///
/// let config = RouterConfig::from_json(r#"{ "landing_path": "/subscriptions" }"#).unwrap();
/// assert_eq!(config.landing_path, "/subscriptions");
/// assert_eq!(config.login_path, "/login");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Where unauthenticated users are sent.
    pub login_path: String,
    /// Where authenticated users land after login or on an empty hash.
    pub landing_path: String,
    /// Debounce before a hovered link warms its route.
    pub hover_delay_ms: u64,
    /// Hard ceiling for the idle-time critical preload.
    pub idle_timeout_ms: u64,
    /// Timer used instead of idle scheduling when the host has none.
    pub idle_fallback_ms: u64,
    /// Appended to route titles when the outlet updates the document title.
    pub title_suffix: Option<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            landing_path: "/dashboard".to_string(),
            hover_delay_ms: 100,
            idle_timeout_ms: 2000,
            idle_fallback_ms: 100,
            title_suffix: None,
        }
    }
}

// Saturates instead of wrapping for absurdly long durations.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl RouterConfig {
    /// Parse a config from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_landing_path(mut self, path: impl Into<String>) -> Self {
        self.landing_path = path.into();
        self
    }

    pub fn with_hover_delay(mut self, delay: Duration) -> Self {
        self.hover_delay_ms = millis(delay);
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout_ms = millis(timeout);
        self
    }

    pub fn with_idle_fallback(mut self, fallback: Duration) -> Self {
        self.idle_fallback_ms = millis(fallback);
        self
    }

    pub fn with_title_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.title_suffix = Some(suffix.into());
        self
    }

    pub fn hover_delay(&self) -> Duration {
        Duration::from_millis(self.hover_delay_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn idle_fallback(&self) -> Duration {
        Duration::from_millis(self.idle_fallback_ms)
    }

    /// Document title for a route, with the configured suffix if any.
    pub fn document_title(&self, route_title: &str) -> String {
        match &self.title_suffix {
            Some(suffix) if route_title.is_empty() => suffix.clone(),
            Some(suffix) => format!("{route_title}{suffix}"),
            None => route_title.to_string(),
        }
    }
}
