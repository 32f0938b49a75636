use super::*;

pub(super) fn describe_js(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    js_sys::JSON::stringify(value)
        .ok()
        .and_then(|text| text.as_string())
        .unwrap_or_else(|| "unknown javascript error".to_string())
}

pub(super) fn js_error(operation: &'static str) -> impl FnOnce(JsValue) -> HostError {
    move |value| HostError::new(operation, describe_js(&value))
}

pub(super) fn create(
    document: &Document,
    tag: &str,
    operation: &'static str,
) -> Result<Element, HostError> {
    document.create_element(tag).map_err(js_error(operation))
}

pub(super) fn create_with_class(
    document: &Document,
    tag: &str,
    class: &str,
    operation: &'static str,
) -> Result<Element, HostError> {
    let element = create(document, tag, operation)?;
    element.set_class_name(class);
    Ok(element)
}

pub(super) fn elements(list: Result<NodeList, JsValue>) -> Vec<Element> {
    let Ok(list) = list else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|index| list.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

pub(super) fn text_of(element: &Element) -> String {
    element.text_content().unwrap_or_default()
}

pub(super) fn field_value(element: &Element) -> String {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        return input.value();
    }
    if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        return area.value();
    }
    String::new()
}

pub(super) fn set_field_value(element: &Element, value: &str) {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        input.set_value(value);
    } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        area.set_value(value);
    }
}

pub(super) fn set_disabled(element: &Element, disabled: bool) {
    if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        area.set_disabled(disabled);
    } else if let Some(button) = element.dyn_ref::<HtmlButtonElement>() {
        button.set_disabled(disabled);
    } else if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        input.set_disabled(disabled);
    }
}

/// Adds a listener and hands back the closure; dropping it detaches the
/// callback, so the caller keeps it for as long as the element lives.
pub(super) fn listen(
    target: &EventTarget,
    kind: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<Closure<dyn FnMut(Event)>, HostError> {
    let callback = Closure::<dyn FnMut(Event)>::wrap(Box::new(handler));
    target
        .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
        .map_err(js_error("add_event_listener"))?;
    Ok(callback)
}

/// The `value` setter from the element's prototype. React tracks the
/// instance property, so only the prototype setter registers as user input.
pub(super) fn native_value_setter(
    window: &Window,
    element: &Element,
) -> Result<js_sys::Function, HostError> {
    let interface = if element.dyn_ref::<HtmlTextAreaElement>().is_some() {
        "HTMLTextAreaElement"
    } else {
        "HTMLInputElement"
    };
    let constructor = js_sys::Reflect::get(window, &JsValue::from_str(interface))
        .map_err(js_error("native_value_setter"))?;
    let prototype = js_sys::Reflect::get(&constructor, &JsValue::from_str("prototype"))
        .map_err(js_error("native_value_setter"))?;
    let descriptor = js_sys::Object::get_own_property_descriptor(
        prototype.unchecked_ref::<js_sys::Object>(),
        &JsValue::from_str("value"),
    );
    js_sys::Reflect::get(&descriptor, &JsValue::from_str("set"))
        .map_err(js_error("native_value_setter"))?
        .dyn_into::<js_sys::Function>()
        .map_err(|_| HostError::new("native_value_setter", "value setter is not a function"))
}

pub(super) fn bubbling_event(kind: &str) -> Result<Event, HostError> {
    let init = EventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    Event::new_with_event_init_dict(kind, &init).map_err(js_error("create_event"))
}

pub(super) fn click_event(window: &Window) -> Result<MouseEvent, HostError> {
    let init = MouseEventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    init.set_view(Some(window));
    MouseEvent::new_with_mouse_event_init_dict("click", &init).map_err(js_error("create_click"))
}

pub(super) fn enter_event(kind: &str) -> Result<KeyboardEvent, HostError> {
    let init = KeyboardEventInit::new();
    init.set_key("Enter");
    init.set_code("Enter");
    init.set_key_code(13);
    init.set_bubbles(true);
    init.set_cancelable(true);
    KeyboardEvent::new_with_keyboard_event_init_dict(kind, &init)
        .map_err(js_error("create_enter"))
}

pub(super) fn dispatch_on(target: &EventTarget, event: &Event) -> Result<(), HostError> {
    target
        .dispatch_event(event)
        .map(|_| ())
        .map_err(js_error("dispatch_event"))
}

/// Event target as an element, for `closest` checks.
pub(super) fn target_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

pub(super) fn clipboard_text(event: &Event) -> Option<String> {
    let event = event.dyn_ref::<ClipboardEvent>()?;
    event.clipboard_data()?.get_data("text").ok()
}
