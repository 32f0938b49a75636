//! Browser entrypoint for the chat widget enhancements.
//!
//! Boots on module start, reads `window.__CHAT_ENHANCER_CONFIG__`, and drives
//! one [`chat_enhancer_core::Enhancer`] over a `web-sys` host. Page events,
//! observer callbacks and timers all funnel into one queue so the enhancer
//! never re-enters itself.

#[cfg(any(target_arch = "wasm32", test))]
mod bindings;
#[cfg(any(target_arch = "wasm32", test))]
mod console_log;
#[cfg(any(target_arch = "wasm32", test))]
mod cookies;
#[cfg(any(target_arch = "wasm32", test))]
mod page_config;
#[cfg(target_arch = "wasm32")]
mod wasm_constants;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, VecDeque};
    use std::time::Duration;

    use chat_enhancer_core::{
        DebugCommand, Enhancer, EnhancerConfig, EnhancerError, HostError, HostEvent, TimerSlot,
    };
    use futures_util::future::{AbortHandle, abortable};
    use gloo_timers::future::sleep;
    use serde::Serialize;
    use tracing::{debug, info, warn};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use web_sys::{
        ClipboardEvent, Document, Element, Event, EventInit, EventTarget, HtmlButtonElement,
        HtmlDocument, HtmlElement, HtmlInputElement, HtmlTextAreaElement, KeyboardEvent,
        KeyboardEventInit, MouseEvent, MouseEventInit, MutationObserver, MutationObserverInit,
        NodeList, Storage, Window,
    };

    use crate::wasm_constants::*;

    mod debug;
    mod dom;
    mod host;
    mod lifecycle;

    use debug::*;
    use dom::{js_error, listen};
    use host::WebHost;
    use lifecycle::*;

    thread_local! {
        static ENHANCER: RefCell<Option<Enhancer<WebHost>>> = const { RefCell::new(None) };
        static EVENT_QUEUE: RefCell<VecDeque<HostEvent>> = const { RefCell::new(VecDeque::new()) };
        static DRAINING: Cell<bool> = const { Cell::new(false) };
        static DIAGNOSTICS: RefCell<BootDiagnostics> = RefCell::new(BootDiagnostics::default());
        static MUTATION_OBSERVER: RefCell<Option<MutationObserver>> = const { RefCell::new(None) };
        static MUTATION_HANDLER: RefCell<Option<Closure<dyn FnMut(js_sys::Array, MutationObserver)>>> = const { RefCell::new(None) };
        static READY_HANDLER: RefCell<Option<Closure<dyn FnMut(Event)>>> = const { RefCell::new(None) };
        static DEBUG_HANDLERS: RefCell<Vec<Closure<dyn FnMut() -> JsValue>>> = const { RefCell::new(Vec::new()) };
    }

    #[derive(Debug, Clone, Default, Serialize)]
    struct BootDiagnostics {
        phase: String,
        detail: String,
        config_error: Option<String>,
    }

    /// Queues `event` and drains the queue unless a drain is already running
    /// further up the stack, in which case that drain picks it up.
    pub(super) fn dispatch(event: HostEvent) {
        EVENT_QUEUE.with(|queue| queue.borrow_mut().push_back(event));
        if DRAINING.with(Cell::get) {
            return;
        }
        DRAINING.with(|draining| draining.set(true));
        while let Some(event) = EVENT_QUEUE.with(|queue| queue.borrow_mut().pop_front()) {
            ENHANCER.with(|slot| {
                if let Some(enhancer) = slot.borrow_mut().as_mut() {
                    enhancer.handle(event);
                }
            });
        }
        DRAINING.with(|draining| draining.set(false));
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        let raw = read_page_config();
        let (config, config_error) = crate::page_config::resolve(raw.as_deref());
        crate::console_log::install(&config.log_level);

        set_boot_phase("booting", "starting chat enhancer");
        if let Some(error) = config_error {
            warn!(%error, "page config rejected, using defaults");
            DIAGNOSTICS.with(|state| state.borrow_mut().config_error = Some(error.to_string()));
        }
        if let Err(error) = boot_when_ready(config) {
            report_boot_error(&error);
        }
    }

    #[wasm_bindgen]
    pub fn boot_diagnostics_json() -> String {
        DIAGNOSTICS.with(|state| {
            serde_json::to_string(&*state.borrow()).unwrap_or_else(|_| {
                "{\"phase\":\"error\",\"detail\":\"diagnostics serialization failed\"}".to_string()
            })
        })
    }

    #[wasm_bindgen]
    pub fn enhancer_status_json() -> String {
        status_json()
    }

    #[wasm_bindgen]
    pub fn enhancer_config_json() -> String {
        config_json()
    }

    #[wasm_bindgen]
    pub fn reset_form() {
        run_command(DebugCommand::ResetForm);
    }

    #[wasm_bindgen]
    pub fn show_form() {
        run_command(DebugCommand::ShowForm);
    }

    #[wasm_bindgen]
    pub fn stop_all() {
        run_command(DebugCommand::StopAll);
    }

    #[wasm_bindgen]
    pub fn is_form_active() -> bool {
        form_active()
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::boot_diagnostics_json;

#[cfg(not(target_arch = "wasm32"))]
pub fn boot_diagnostics_json() -> String {
    "{\"phase\":\"native\",\"detail\":\"chat enhancer diagnostics only available on wasm\"}"
        .to_string()
}
