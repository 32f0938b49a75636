use super::*;

    #[derive(Debug, thiserror::Error)]
    pub(super) enum BootError {
        #[error("window is unavailable")]
        NoWindow,
        #[error("document is unavailable")]
        NoDocument,
        #[error("document body is unavailable")]
        NoBody,
        #[error("{0}")]
        Dom(#[from] HostError),
    }

    /// JSON text of the page's config global, if the page set one. A string
    /// global is taken as JSON text as is.
    pub(super) fn read_page_config() -> Option<String> {
        let window = web_sys::window()?;
        let value = js_sys::Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL)).ok()?;
        if value.is_undefined() || value.is_null() {
            return None;
        }
        if let Some(text) = value.as_string() {
            return Some(text);
        }
        js_sys::JSON::stringify(&value)
            .ok()
            .and_then(|text| text.as_string())
    }

    pub(super) fn set_boot_phase(phase: &str, detail: &str) {
        DIAGNOSTICS.with(|state| {
            let mut state = state.borrow_mut();
            state.phase = phase.to_string();
            state.detail = detail.to_string();
        });
    }

    /// Boots now, or once `DOMContentLoaded` fires if the script ran from `<head>`.
    pub(super) fn boot_when_ready(config: EnhancerConfig) -> Result<(), BootError> {
        let window = web_sys::window().ok_or(BootError::NoWindow)?;
        let document = window.document().ok_or(BootError::NoDocument)?;
        if document.ready_state() != "loading" {
            return boot(config);
        }

        set_boot_phase("waiting", "waiting for DOMContentLoaded");
        let mut pending = Some(config);
        let callback = listen(&document, "DOMContentLoaded", move |_event| {
            let Some(config) = pending.take() else {
                return;
            };
            if let Err(error) = boot(config) {
                report_boot_error(&error);
            }
        })?;
        READY_HANDLER.with(|slot| *slot.borrow_mut() = Some(callback));
        Ok(())
    }

    pub(super) fn report_boot_error(error: &BootError) {
        set_boot_phase("error", &error.to_string());
        warn!(%error, "chat enhancer did not start");
    }

    fn boot(config: EnhancerConfig) -> Result<(), BootError> {
        let window = web_sys::window().ok_or(BootError::NoWindow)?;
        let document = window.document().ok_or(BootError::NoDocument)?;
        let body = document.body().ok_or(BootError::NoBody)?;

        install_stylesheet(&document)?;
        let host = WebHost::new(window.clone(), document, &config);
        ENHANCER.with(|slot| *slot.borrow_mut() = Some(Enhancer::new(host, config)));
        observe_mutations(&body)?;
        install_debug_object(&window)?;

        set_boot_phase("ready", "chat enhancer running");
        info!("chat enhancer started");
        dispatch(HostEvent::Started);
        Ok(())
    }

    fn install_stylesheet(document: &Document) -> Result<(), HostError> {
        if document.get_element_by_id(STYLE_ELEMENT_ID).is_some() {
            return Ok(());
        }
        let style = dom::create(document, "style", "install_stylesheet")?;
        style.set_id(STYLE_ELEMENT_ID);
        style.set_text_content(Some(ENHANCER_CSS));
        let parent = document
            .head()
            .map(Element::from)
            .or_else(|| document.document_element())
            .ok_or_else(|| HostError::new("install_stylesheet", "document has no root"))?;
        parent
            .append_child(&style)
            .map_err(js_error("install_stylesheet"))?;
        Ok(())
    }

    fn observe_mutations(body: &HtmlElement) -> Result<(), HostError> {
        let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::wrap(Box::new(
            |_records, _observer| dispatch(HostEvent::DomMutated),
        ));
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())
            .map_err(js_error("observe_mutations"))?;

        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        options.set_attributes(true);
        let filter = MUTATION_ATTRIBUTES
            .iter()
            .map(|name| JsValue::from_str(name))
            .collect::<js_sys::Array>();
        options.set_attribute_filter(&filter);
        observer
            .observe_with_options(body, &options)
            .map_err(js_error("observe_mutations"))?;

        MUTATION_OBSERVER.with(|slot| *slot.borrow_mut() = Some(observer));
        MUTATION_HANDLER.with(|slot| *slot.borrow_mut() = Some(callback));
        Ok(())
    }

    pub(super) fn disconnect_observer() {
        if let Some(observer) = MUTATION_OBSERVER.with(|slot| slot.borrow_mut().take()) {
            observer.disconnect();
            debug!("mutation observer disconnected");
        }
    }
