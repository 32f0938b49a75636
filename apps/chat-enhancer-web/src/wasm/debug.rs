use super::*;

/// Status snapshot JSON, or `null` before boot.
pub(super) fn status_json() -> String {
    with_enhancer(|enhancer| enhancer.status().to_json()).unwrap_or_else(|| "null".to_string())
}

pub(super) fn config_json() -> String {
    with_enhancer(|enhancer| serde_json::to_string_pretty(enhancer.config()).ok())
        .flatten()
        .unwrap_or_else(|| "null".to_string())
}

pub(super) fn form_active() -> bool {
    with_enhancer(Enhancer::is_form_active).unwrap_or(false)
}

pub(super) fn run_command(command: DebugCommand) {
    dispatch(HostEvent::Debug(command));
    if command == DebugCommand::StopAll {
        disconnect_observer();
        info!("all chat enhancements stopped");
    }
}

/// Reads the enhancer without waiting on a drain in progress.
fn with_enhancer<T>(read: impl FnOnce(&Enhancer<WebHost>) -> T) -> Option<T> {
    ENHANCER.with(|slot| {
        let enhancer = slot.try_borrow().ok()?;
        enhancer.as_ref().map(read)
    })
}

fn json_value(text: &str) -> JsValue {
    js_sys::JSON::parse(text).unwrap_or_else(|_| JsValue::from_str(text))
}

/// Publishes the `window` debug object.
pub(super) fn install_debug_object(window: &Window) -> Result<(), HostError> {
    let object = js_sys::Object::new();
    let methods: [(&str, Box<dyn FnMut() -> JsValue>); 6] = [
        ("status", Box::new(|| json_value(&status_json()))),
        ("config", Box::new(|| json_value(&config_json()))),
        (
            "resetForm",
            Box::new(|| {
                run_command(DebugCommand::ResetForm);
                JsValue::UNDEFINED
            }),
        ),
        (
            "showForm",
            Box::new(|| {
                run_command(DebugCommand::ShowForm);
                JsValue::UNDEFINED
            }),
        ),
        (
            "stopAll",
            Box::new(|| {
                run_command(DebugCommand::StopAll);
                JsValue::UNDEFINED
            }),
        ),
        ("isFormActive", Box::new(|| JsValue::from_bool(form_active()))),
    ];

    let mut handlers = Vec::with_capacity(methods.len());
    for (name, method) in methods {
        let handler = Closure::<dyn FnMut() -> JsValue>::wrap(method);
        js_sys::Reflect::set(&object, &JsValue::from_str(name), handler.as_ref())
            .map_err(js_error("install_debug_object"))?;
        handlers.push(handler);
    }
    js_sys::Reflect::set(window, &JsValue::from_str(DEBUG_GLOBAL), &object)
        .map_err(js_error("install_debug_object"))?;

    DEBUG_HANDLERS.with(|slot| *slot.borrow_mut() = handlers);
    Ok(())
}
