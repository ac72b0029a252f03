//! Browser implementations of the core ports.
//!
//! These only do something useful on `wasm32` inside a window. Elsewhere
//! [`BrowserLocation`] reports no location and the scheduler and loader log
//! and give up.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};
use leptos_use::{use_event_listener, use_window};
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use waypost_common::{
    HashListener, HistoryMode, IdleOptions, LocationError, LocationPort, ModuleLoader,
    PreloadError, PreloadResult, Scheduler, Subscription, Task, TimerId,
};

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// `window.location` plus the `hashchange` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserLocation;

impl LocationPort for BrowserLocation {
    fn read(&self) -> Option<String> {
        web_sys::window()?.location().hash().ok()
    }

    /// Must be called under a reactive owner; the listener is also removed
    /// when that owner is cleaned up.
    fn subscribe(&self, listener: HashListener) -> Subscription {
        let stop = use_event_listener(use_window(), leptos::ev::hashchange, move |_| {
            if let Some(hash) = BrowserLocation.read() {
                listener(&hash);
            }
        });
        Subscription::new(stop)
    }

    fn write(&self, hash: &str, mode: HistoryMode) -> Result<(), LocationError> {
        let location = web_sys::window()
            .ok_or(LocationError::Unavailable)?
            .location();
        let fragment = format!("#{}", hash.strip_prefix('#').unwrap_or(hash));

        let result = match mode {
            HistoryMode::Push => location.set_hash(&fragment),
            // Same-document fragment navigation, so no reload; still fires hashchange.
            HistoryMode::Replace => location.replace(&fragment),
        };
        result.map_err(|e| LocationError::History(js_message(&e)))
    }

    fn attach_state(&self, state: &serde_json::Value) -> Result<(), LocationError> {
        let history = web_sys::window()
            .ok_or(LocationError::Unavailable)?
            .history()
            .map_err(|e| LocationError::History(js_message(&e)))?;
        let state = js_sys::JSON::parse(&state.to_string())
            .map_err(|e| LocationError::History(js_message(&e)))?;
        history
            .replace_state(&state, "")
            .map_err(|e| LocationError::History(js_message(&e)))
    }
}

/// `setTimeout` and `requestIdleCallback`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserScheduler;

impl BrowserScheduler {
    fn idle_supported(window: &web_sys::Window) -> bool {
        js_sys::Reflect::has(window, &JsValue::from_str("requestIdleCallback")).unwrap_or(false)
    }
}

impl Scheduler for BrowserScheduler {
    fn set_timeout(&self, delay: Duration, task: Task) -> TimerId {
        let Some(window) = web_sys::window() else {
            log::warn!("[BrowserScheduler] setTimeout failed: no window");
            return TimerId(0);
        };
        let callback = Closure::once_into_js(task);
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            millis,
        ) {
            Ok(handle) => TimerId(u64::try_from(handle).unwrap_or_default()),
            Err(e) => {
                log::warn!("[BrowserScheduler] setTimeout failed: {}", js_message(&e));
                TimerId(0)
            }
        }
    }

    fn clear_timeout(&self, id: TimerId) {
        if let Ok(raw) = i32::try_from(id.0) {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(raw);
            }
        }
    }

    fn request_idle(&self, options: IdleOptions, task: Task) {
        let Some(window) = web_sys::window().filter(Self::idle_supported) else {
            self.set_timeout(options.fallback, task);
            return;
        };

        let slot = Rc::new(Cell::new(Some(task)));
        let callback = Closure::once_into_js({
            let slot = Rc::clone(&slot);
            move || {
                if let Some(task) = slot.take() {
                    task();
                }
            }
        });

        let idle_options = web_sys::IdleRequestOptions::new();
        idle_options.set_timeout(u32::try_from(options.timeout.as_millis()).unwrap_or(u32::MAX));

        if let Err(e) =
            window.request_idle_callback_with_options(callback.unchecked_ref(), &idle_options)
        {
            log::debug!(
                "[BrowserScheduler] requestIdleCallback failed, using timer: {}",
                js_message(&e)
            );
            if let Some(task) = slot.take() {
                self.set_timeout(options.fallback, task);
            }
        }
    }
}

/// Drives futures on the Leptos task executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        leptos::task::spawn_local(future);
        Ok(())
    }
}

/// Warms a route by adding `<link rel="modulepreload">` for its module.
///
/// The module key maps to `{base}{key}.js`. The load settles on the link's
/// `load` or `error` event.
#[derive(Debug, Clone)]
pub struct ModulePreloadLoader {
    base: String,
}

impl ModulePreloadLoader {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn href(&self, key: &str) -> String {
        format!("{}{}.js", self.base, key)
    }
}

impl Default for ModulePreloadLoader {
    fn default() -> Self {
        Self::new("./")
    }
}

fn append_preload_link(
    href: &str,
    on_load: &js_sys::Function,
    on_error: &js_sys::Function,
) -> Result<web_sys::HtmlLinkElement, JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("document has no <head>"))?;

    let link: web_sys::HtmlLinkElement = document.create_element("link")?.dyn_into()?;
    link.set_rel("modulepreload");
    link.set_href(href);
    link.set_onload(Some(on_load));
    link.set_onerror(Some(on_error));
    head.append_child(&link)?;
    Ok(link)
}

impl ModuleLoader for ModulePreloadLoader {
    fn load(&self, key: &str) -> LocalBoxFuture<'static, PreloadResult> {
        let key = key.to_string();
        let href = self.href(&key);

        async move {
            let (tx, rx) = oneshot::channel::<PreloadResult>();
            let tx = Rc::new(RefCell::new(Some(tx)));

            let on_load = Closure::once({
                let tx = Rc::clone(&tx);
                move || {
                    if let Some(tx) = tx.borrow_mut().take() {
                        let _ = tx.send(Ok(()));
                    }
                }
            });
            let on_error = Closure::once({
                let tx = Rc::clone(&tx);
                let key = key.clone();
                let href = href.clone();
                move || {
                    if let Some(tx) = tx.borrow_mut().take() {
                        let message = format!("could not fetch {href}");
                        let _ = tx.send(Err(PreloadError::failed(key, message)));
                    }
                }
            });

            let link = append_preload_link(
                &href,
                on_load.as_ref().unchecked_ref(),
                on_error.as_ref().unchecked_ref(),
            )
            .map_err(|e| PreloadError::failed(key.clone(), js_message(&e)))?;

            let result = rx
                .await
                .unwrap_or_else(|_| Err(PreloadError::failed(key, "preload link was abandoned")));

            // Only one of the two events fires; detach both before freeing them.
            link.set_onload(None);
            link.set_onerror(None);
            drop(on_load);
            drop(on_error);

            result
        }
        .boxed_local()
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_location_reads_fragment() {
        BrowserLocation
            .write("/checks?id=5", HistoryMode::Replace)
            .unwrap();
        let hash = BrowserLocation.read().unwrap();
        assert_eq!(waypost_common::parse(&hash).path, "/checks");
    }

    #[wasm_bindgen_test]
    fn test_attach_state_is_accepted() {
        let state = serde_json::json!({ "from": "test" });
        assert!(BrowserLocation.attach_state(&state).is_ok());
    }

    #[wasm_bindgen_test]
    async fn test_missing_module_rejects_and_detaches_handlers() {
        let loader = ModulePreloadLoader::new("/no-such-dir/");
        let result = loader.load("missing").await;
        assert!(matches!(result, Err(PreloadError::Failed { .. })));

        let link = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| {
                document
                    .query_selector("link[href='/no-such-dir/missing.js']")
                    .ok()
                    .flatten()
            })
            .and_then(|element| element.dyn_into::<web_sys::HtmlLinkElement>().ok())
            .unwrap();
        assert!(link.onload().is_none());
        assert!(link.onerror().is_none());
    }

    #[wasm_bindgen_test]
    fn test_module_href() {
        let loader = ModulePreloadLoader::new("/pkg/");
        assert_eq!(loader.href("dashboard"), "/pkg/dashboard.js");
    }
}
