use super::*;

use chat_enhancer_core::bridges::{CLOSE_BUTTON_CLASS, CLOSE_BUTTON_TITLE, RESET_MARKER};
use chat_enhancer_core::config::WidgetContract;
use chat_enhancer_core::host::{
    BridgeSurface, ButtonScope, IntakePlacement, IntakeSurface, LabeledButton, LayoutProbe,
    MarkedNode, PopupSurface, SessionFlagStore, TimerHost, TimestampNode, TranscriptSurface,
    WidgetLookup,
};
use chat_enhancer_core::intake::{
    ClientContext, FieldSpec, FormField, INTAKE_FORM_ID, IntakeLayout, IntakeValues,
    PROCESSED_CLASS, REQUIRED_NOTE_CLASS, SUBMISSION_MESSAGE_CLASS, SUBMIT_CLASS,
    VISIBLE_MESSAGE_CLASS, format_phone_number,
};
use chat_enhancer_core::popup::{POPUP_CLASS, POPUP_HIDING_CLASS, POPUP_ID, POPUP_VISIBLE_CLASS};
use chat_enhancer_core::session::{SUBMITTED_VALUE, is_submitted_value};

use crate::bindings::NodeBindings;
use crate::cookies::{DAY_MS, cookie_value, marker_cookie};

use super::dom::{
    bubbling_event, click_event, clipboard_text, create, create_with_class, describe_js,
    dispatch_on, elements, enter_event, field_value, js_error, listen, native_value_setter,
    set_disabled, set_field_value, target_element, text_of,
};

/// Listeners the host keeps alive, grouped by the element they belong to.
/// Replacing a group drops the old closures, which detaches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ListenerGroup {
    Launcher,
    OutsideClick,
    CloseButton,
    Intake,
}

/// `web-sys` implementation of the enhancer's host traits.
pub(super) struct WebHost {
    window: Window,
    document: Document,
    contract: WidgetContract,
    session_key: String,
    timers: HashMap<TimerSlot, AbortHandle>,
    listeners: HashMap<ListenerGroup, Vec<Closure<dyn FnMut(Event)>>>,
    reset_listeners: NodeBindings<Element, Closure<dyn FnMut(Event)>>,
}

impl WebHost {
    pub(super) fn new(window: Window, document: Document, config: &EnhancerConfig) -> Self {
        Self {
            window,
            document,
            contract: config.widget.clone(),
            session_key: config.session.form_submitted_key.clone(),
            timers: HashMap::new(),
            listeners: HashMap::new(),
            reset_listeners: NodeBindings::default(),
        }
    }

    fn replace_listeners(
        &mut self,
        group: ListenerGroup,
        closures: Vec<Closure<dyn FnMut(Event)>>,
    ) {
        self.listeners.insert(group, closures);
    }

    fn html_document(&self) -> Option<&HtmlDocument> {
        self.document.dyn_ref::<HtmlDocument>()
    }

    fn storage(&self) -> Result<Storage, EnhancerError> {
        // Access throws a SecurityError when storage is blocked for the page.
        self.window
            .session_storage()
            .map_err(js_error("session_storage"))?
            .ok_or_else(|| EnhancerError::Storage("sessionStorage is unavailable".to_string()))
    }

    fn field_element(&self, spec: &FieldSpec, starts_open: bool) -> Result<Element, HostError> {
        const OP: &str = "inject_intake_form";
        let field = spec.field;
        let element = if field == FormField::Message {
            let area = create(&self.document, "textarea", OP)?;
            area.set_attribute("rows", "3").map_err(js_error(OP))?;
            set_disabled(&area, !starts_open);
            area
        } else {
            let input = create(&self.document, "input", OP)?;
            input
                .set_attribute("type", field.input_type())
                .map_err(js_error(OP))?;
            input
        };
        element.set_id(field.element_id());
        element.set_class_name(&spec.class_name());
        element
            .set_attribute("name", field.name())
            .map_err(js_error(OP))?;
        element
            .set_attribute("placeholder", &spec.placeholder)
            .map_err(js_error(OP))?;
        if spec.required {
            element.set_attribute("required", "").map_err(js_error(OP))?;
        }
        Ok(element)
    }
}

fn intake_listeners(container: &Element) -> Result<Vec<Closure<dyn FnMut(Event)>>, HostError> {
    let mut closures = Vec::new();

    if let Some(phone) = find(container, &format!("#{}", FormField::Phone.element_id())) {
        let target = phone.clone();
        closures.push(listen(&phone, "input", move |_event| {
            let current = field_value(&target);
            let formatted = format_phone_number(&current);
            if formatted != current {
                set_field_value(&target, &formatted);
            }
        })?);
        let target = phone.clone();
        closures.push(listen(&phone, "paste", move |event| {
            if let Some(pasted) = clipboard_text(&event) {
                event.prevent_default();
                set_field_value(&target, &format_phone_number(&pasted));
                dispatch(HostEvent::IntakeFieldEdited);
            }
        })?);
    }

    for field in elements(container.query_selector_all("input, textarea")) {
        for kind in ["input", "blur"] {
            closures.push(listen(&field, kind, |_event| {
                dispatch(HostEvent::IntakeFieldEdited);
            })?);
        }
    }

    if let Some(form) = find(container, &format!("#{INTAKE_FORM_ID}")) {
        closures.push(listen(&form, "submit", |event| {
            event.prevent_default();
            dispatch(HostEvent::IntakeSubmitRequested);
        })?);
    }
    if let Some(button) = find(container, &format!(".{SUBMIT_CLASS}")) {
        closures.push(listen(&button, "click", |event| {
            event.prevent_default();
            event.stop_propagation();
            dispatch(HostEvent::IntakeSubmitRequested);
        })?);
    }
    Ok(closures)
}

fn find(root: &Element, selector: &str) -> Option<Element> {
    root.query_selector(selector).ok().flatten()
}

fn html<'a>(node: &'a Element, operation: &'static str) -> Result<&'a HtmlElement, HostError> {
    node.dyn_ref::<HtmlElement>()
        .ok_or_else(|| HostError::new(operation, "element is not an HTMLElement"))
}

impl WidgetLookup for WebHost {
    type Node = Element;

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn native_form(&self, container: &Element, excluded_form_id: &str) -> Option<Element> {
        elements(container.query_selector_all("form"))
            .into_iter()
            .find(|form| form.id() != excluded_form_id)
    }

    fn is_attached(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn layout_probe(&self, node: &Element) -> LayoutProbe {
        let has_offset_parent = node
            .dyn_ref::<HtmlElement>()
            .and_then(HtmlElement::offset_parent)
            .is_some();
        let computed_display = self
            .window
            .get_computed_style(node)
            .ok()
            .flatten()
            .and_then(|style| style.get_property_value("display").ok())
            .unwrap_or_default();
        LayoutProbe {
            has_offset_parent,
            computed_display,
        }
    }

    fn set_displayed(&mut self, node: &Element, displayed: bool) -> Result<(), HostError> {
        let style = html(node, "set_displayed")?.style();
        let current = style
            .get_property_value("display")
            .map_err(js_error("set_displayed"))?;
        // Unchanged writes would still wake the observer.
        if displayed {
            if current == "none" {
                style
                    .remove_property("display")
                    .map_err(js_error("set_displayed"))?;
            }
        } else if current != "none" {
            style
                .set_property("display", "none")
                .map_err(js_error("set_displayed"))?;
        }
        Ok(())
    }

    fn remove_node(&mut self, node: &Element) {
        node.remove();
    }
}

impl PopupSurface for WebHost {
    fn bind_launcher(&mut self, launcher: &Element) -> Result<(), HostError> {
        let closure = listen(launcher, "click", |_event| {
            dispatch(HostEvent::LauncherClicked);
        })?;
        self.replace_listeners(ListenerGroup::Launcher, vec![closure]);
        Ok(())
    }

    fn mount_bubble(&mut self, launcher_container: &Element) -> Result<Element, HostError> {
        let bubble = create_with_class(&self.document, "div", POPUP_CLASS, "mount_bubble")?;
        bubble.set_id(POPUP_ID);
        let text = create_with_class(&self.document, "div", POPUP_TEXT_CLASS, "mount_bubble")?;
        bubble
            .append_child(&text)
            .map_err(js_error("mount_bubble"))?;
        launcher_container
            .append_child(&bubble)
            .map_err(js_error("mount_bubble"))?;
        Ok(bubble)
    }

    fn reveal_bubble(&mut self, bubble: &Element) -> Result<(), HostError> {
        bubble
            .class_list()
            .add_1(POPUP_VISIBLE_CLASS)
            .map_err(js_error("reveal_bubble"))
    }

    fn type_bubble_text(
        &mut self,
        bubble: &Element,
        text: &str,
        letter_interval: Duration,
    ) -> Result<(), HostError> {
        const OP: &str = "type_bubble_text";
        let target =
            find(bubble, &format!(".{POPUP_TEXT_CLASS}")).unwrap_or_else(|| bubble.clone());
        target.set_text_content(None);
        for (index, letter) in text.chars().enumerate() {
            let class = if letter == ' ' {
                format!("{POPUP_LETTER_CLASS} {POPUP_SPACE_CLASS}")
            } else {
                POPUP_LETTER_CLASS.to_string()
            };
            let span = create_with_class(&self.document, "span", &class, OP)?;
            span.set_text_content(Some(&letter.to_string()));
            let delay = letter_interval * index as u32;
            html(&span, OP)?
                .style()
                .set_property("animation-delay", &format!("{}ms", delay.as_millis()))
                .map_err(js_error(OP))?;
            target.append_child(&span).map_err(js_error(OP))?;
        }
        Ok(())
    }

    fn fade_bubble(&mut self, bubble: &Element) -> Result<(), HostError> {
        let classes = bubble.class_list();
        classes
            .remove_1(POPUP_VISIBLE_CLASS)
            .map_err(js_error("fade_bubble"))?;
        classes
            .add_1(POPUP_HIDING_CLASS)
            .map_err(js_error("fade_bubble"))
    }

    fn arm_outside_click(&mut self) -> Result<(), HostError> {
        self.disarm_outside_click();
        let launcher = format!("#{}", self.contract.launcher_button_id);
        let closure = listen(&self.document, "click", move |event| {
            let inside_launcher = target_element(&event)
                .and_then(|element| element.closest(&launcher).ok().flatten())
                .is_some();
            dispatch(HostEvent::DocumentClicked { inside_launcher });
        })?;
        self.replace_listeners(ListenerGroup::OutsideClick, vec![closure]);
        Ok(())
    }

    fn disarm_outside_click(&mut self) {
        let Some(closures) = self.listeners.remove(&ListenerGroup::OutsideClick) else {
            return;
        };
        for closure in closures {
            let _ = self
                .document
                .remove_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        }
    }

    fn popup_marker_present(&self, cookie_name: &str) -> bool {
        self.html_document()
            .and_then(|document| document.cookie().ok())
            .is_some_and(|header| cookie_value(&header, cookie_name).is_some())
    }

    fn write_popup_marker(&mut self, cookie_name: &str, days: u32) -> Result<(), HostError> {
        let document = self
            .html_document()
            .ok_or_else(|| HostError::new("write_popup_marker", "document has no cookie jar"))?;
        let expires = js_sys::Date::new_0();
        expires.set_time(expires.get_time() + f64::from(days) * DAY_MS);
        let expires_utc = String::from(expires.to_utc_string());
        document
            .set_cookie(&marker_cookie(cookie_name, &expires_utc))
            .map_err(js_error("write_popup_marker"))
    }

    fn random_roll(&mut self) -> f64 {
        js_sys::Math::random()
    }
}

impl TranscriptSurface for WebHost {
    fn timestamp_nodes(&self) -> Vec<TimestampNode<Element>> {
        elements(
            self.document
                .query_selector_all(&self.contract.timestamp_selector),
        )
        .into_iter()
        .map(|node| {
            let assistant_authored = node
                .closest(&self.contract.message_block_selector)
                .ok()
                .flatten()
                .and_then(|block| find(&block, &self.contract.assistant_marker_selector))
                .is_some();
            TimestampNode {
                text: text_of(&node),
                node,
                assistant_authored,
            }
        })
        .collect()
    }

    fn set_text(&mut self, node: &Element, text: &str) -> Result<(), HostError> {
        if text_of(node) != text {
            node.set_text_content(Some(text));
        }
        Ok(())
    }

    fn user_message_nodes(&self) -> Vec<MarkedNode<Element>> {
        elements(
            self.document
                .query_selector_all(&self.contract.user_message_selector),
        )
        .into_iter()
        .map(|node| MarkedNode {
            text: text_of(&node),
            processed: node.class_list().contains(PROCESSED_CLASS),
            node,
        })
        .collect()
    }

    fn show_visible_message(&mut self, node: &Element, message: &str) -> Result<(), HostError> {
        const OP: &str = "show_visible_message";
        let visible = create_with_class(&self.document, "span", VISIBLE_MESSAGE_CLASS, OP)?;
        visible.set_text_content(Some(message));
        node.class_list()
            .add_2(SUBMISSION_MESSAGE_CLASS, PROCESSED_CLASS)
            .map_err(js_error(OP))?;
        node.set_text_content(None);
        node.append_child(&visible).map_err(js_error(OP))?;
        Ok(())
    }

    fn greeting_nodes(&self) -> Vec<MarkedNode<Element>> {
        elements(
            self.document
                .query_selector_all(&self.contract.greeting_selector),
        )
        .into_iter()
        .filter(|node| !text_of(node).trim().is_empty())
        .map(|node| MarkedNode {
            text: text_of(&node),
            processed: node.class_list().contains(GREETING_PROCESSED_CLASS),
            node,
        })
        .collect()
    }

    fn render_greeting(
        &mut self,
        node: &Element,
        title: Option<&str>,
        body: Option<&str>,
    ) -> Result<(), HostError> {
        const OP: &str = "render_greeting";
        node.class_list()
            .add_1(GREETING_PROCESSED_CLASS)
            .map_err(js_error(OP))?;
        node.set_text_content(None);
        for (tag, class, text) in [
            ("h1", GREETING_TITLE_CLASS, title),
            ("p", GREETING_BODY_CLASS, body),
        ] {
            let Some(text) = text.filter(|text| !text.trim().is_empty()) else {
                continue;
            };
            let element = create_with_class(&self.document, tag, class, OP)?;
            element.set_text_content(Some(text));
            node.append_child(&element).map_err(js_error(OP))?;
        }
        Ok(())
    }
}

impl IntakeSurface for WebHost {
    fn greeting_area(&self, container: &Element) -> Option<Element> {
        find(container, &self.contract.greeting_selector)?
            .parent_element()?
            .parent_element()
    }

    fn inject_intake_form(
        &mut self,
        layout: &IntakeLayout,
        placement: IntakePlacement<Element>,
    ) -> Result<Element, HostError> {
        const OP: &str = "inject_intake_form";
        let container = create_with_class(&self.document, "div", "allm-flex", OP)?;
        container.set_id(layout.container_id);
        let form = create_with_class(
            &self.document,
            "form",
            "allm-flex allm-flex-col allm-gap-y-3",
            OP,
        )?;
        form.set_id(layout.form_id);

        for (row, specs) in &layout.rows {
            let row_element = create_with_class(&self.document, "div", row.class_name(), OP)?;
            for spec in specs {
                let field = self.field_element(spec, layout.starts_open)?;
                row_element.append_child(&field).map_err(js_error(OP))?;
            }
            form.append_child(&row_element).map_err(js_error(OP))?;
        }
        if let Some(spec) = &layout.message {
            let message = self.field_element(spec, layout.starts_open)?;
            form.append_child(&message).map_err(js_error(OP))?;
        }

        let submit = create_with_class(&self.document, "button", layout.submit_class, OP)?;
        submit.set_attribute("type", "submit").map_err(js_error(OP))?;
        submit.set_text_content(Some(&layout.submit_label));
        set_disabled(&submit, !layout.starts_open);
        form.append_child(&submit).map_err(js_error(OP))?;

        if let Some(note) = &layout.required_note {
            let paragraph = create_with_class(&self.document, "p", REQUIRED_NOTE_CLASS, OP)?;
            paragraph.set_text_content(Some(note));
            form.append_child(&paragraph).map_err(js_error(OP))?;
        }
        container.append_child(&form).map_err(js_error(OP))?;

        match placement {
            IntakePlacement::AppendTo(area) => area.append_child(&container).map(|_| ()),
            IntakePlacement::Before(history) => {
                let parent = history
                    .parent_node()
                    .ok_or_else(|| HostError::new(OP, "chat history has no parent"))?;
                parent.insert_before(&container, Some(&*history)).map(|_| ())
            }
        }
        .map_err(js_error(OP))?;

        let closures = intake_listeners(&container)?;
        self.replace_listeners(ListenerGroup::Intake, closures);
        Ok(container)
    }

    fn read_intake_values(&self, form: &Element) -> IntakeValues {
        let mut values = IntakeValues::default();
        for field in FormField::ALL {
            if let Some(element) = find(form, &format!("#{}", field.element_id())) {
                values.set(field, field_value(&element));
            }
        }
        values
    }

    fn set_intake_gate(&mut self, form: &Element, open: bool) -> Result<(), HostError> {
        let submit = find(form, &format!(".{SUBMIT_CLASS}"))
            .ok_or_else(|| HostError::new("set_intake_gate", "submit button missing"))?;
        set_disabled(&submit, !open);
        if let Some(message) = find(form, &format!("#{}", FormField::Message.element_id())) {
            set_disabled(&message, !open);
        }
        Ok(())
    }

    fn client_context(&self) -> ClientContext {
        let navigator = self.window.navigator();
        let screen = self.window.screen().ok();
        ClientContext {
            user_agent: navigator.user_agent().unwrap_or_default(),
            platform: navigator.platform().unwrap_or_default(),
            language: navigator.language().unwrap_or_default(),
            languages: navigator
                .languages()
                .iter()
                .filter_map(|language| language.as_string())
                .collect(),
            cookie_enabled: navigator.cookie_enabled(),
            device_memory: js_sys::Reflect::get(&navigator, &JsValue::from_str("deviceMemory"))
                .ok()
                .and_then(|memory| memory.as_f64()),
            hardware_concurrency: Some(navigator.hardware_concurrency() as u32)
                .filter(|cores| *cores > 0),
            screen_width: screen.as_ref().and_then(|screen| screen.width().ok()),
            screen_height: screen.as_ref().and_then(|screen| screen.height().ok()),
        }
    }

    fn force_input_value(&mut self, textbox: &Element, value: &str) -> Result<(), HostError> {
        html(textbox, "force_input_value")?
            .focus()
            .map_err(js_error("force_input_value"))?;
        native_value_setter(&self.window, textbox)?
            .call1(textbox, &JsValue::from_str(value))
            .map_err(js_error("force_input_value"))?;
        dispatch_on(textbox, &bubbling_event("input")?)
    }

    fn input_value(&self, textbox: &Element) -> String {
        field_value(textbox)
    }

    fn dispatch_form_submit(&mut self, textbox: &Element) -> Result<bool, HostError> {
        let Some(form) = textbox
            .closest("form")
            .map_err(js_error("dispatch_form_submit"))?
        else {
            return Ok(false);
        };
        dispatch_on(&form, &bubbling_event("submit")?)?;
        Ok(true)
    }

    fn dispatch_click(&mut self, node: &Element) -> Result<(), HostError> {
        dispatch_on(node, &click_event(&self.window)?)
    }

    fn dispatch_enter(&mut self, textbox: &Element) -> Result<(), HostError> {
        for kind in ["keydown", "keypress"] {
            dispatch_on(textbox, &enter_event(kind)?)?;
        }
        Ok(())
    }
}

impl BridgeSurface for WebHost {
    fn ensure_close_button(&mut self, container: &Element) -> Result<Element, HostError> {
        const OP: &str = "ensure_close_button";
        if let Some(existing) = find(container, &format!(".{CLOSE_BUTTON_CLASS}")) {
            return Ok(existing);
        }
        let button = create_with_class(&self.document, "button", CLOSE_BUTTON_CLASS, OP)?;
        for (name, value) in [
            ("type", "button"),
            ("aria-label", CLOSE_BUTTON_TITLE),
            ("title", CLOSE_BUTTON_TITLE),
        ] {
            button.set_attribute(name, value).map_err(js_error(OP))?;
        }
        let closure = listen(&button, "click", |event| {
            event.prevent_default();
            event.stop_propagation();
            dispatch(HostEvent::CloseButtonClicked);
        })?;
        container.append_child(&button).map_err(js_error(OP))?;
        self.replace_listeners(ListenerGroup::CloseButton, vec![closure]);
        Ok(button)
    }

    fn buttons(&self, scope: ButtonScope) -> Vec<LabeledButton<Element>> {
        let selector = match scope {
            ButtonScope::CloseSignature => self.contract.close_button_selector.as_str(),
            ButtonScope::ResetSignature => self.contract.reset_button_selector.as_str(),
            ButtonScope::Everywhere => "button",
        };
        elements(self.document.query_selector_all(selector))
            .into_iter()
            .map(|node| LabeledButton {
                label: text_of(&node),
                bound: node.has_attribute(RESET_MARKER),
                node,
            })
            .collect()
    }

    fn click(&mut self, node: &Element) -> Result<(), HostError> {
        html(node, "click")?.click();
        Ok(())
    }

    fn bind_reset_button(&mut self, node: &Element, marker: &str) -> Result<(), HostError> {
        node.set_attribute(marker, "true")
            .map_err(js_error("bind_reset_button"))?;
        let closure = listen(node, "click", |_event| {
            dispatch(HostEvent::ResetButtonClicked);
        })?;
        self.reset_listeners
            .bind(node.clone(), closure, |node| node.is_connected());
        Ok(())
    }
}

impl TimerHost for WebHost {
    fn schedule(&mut self, slot: TimerSlot, generation: u64, delay: Duration) {
        self.cancel(slot);
        let (sleeper, handle) = abortable(sleep(delay));
        self.timers.insert(slot, handle);
        spawn_local(async move {
            if sleeper.await.is_ok() {
                dispatch(HostEvent::TimerFired { slot, generation });
            }
        });
    }

    fn cancel(&mut self, slot: TimerSlot) {
        if let Some(handle) = self.timers.remove(&slot) {
            handle.abort();
        }
    }
}

impl SessionFlagStore for WebHost {
    type Error = EnhancerError;

    fn load_form_submitted(&self) -> Result<bool, EnhancerError> {
        let raw = self
            .storage()?
            .get_item(&self.session_key)
            .map_err(|error| EnhancerError::Storage(describe_js(&error)))?;
        Ok(is_submitted_value(raw.as_deref()))
    }

    fn persist_form_submitted(&mut self) -> Result<(), EnhancerError> {
        self.storage()?
            .set_item(&self.session_key, SUBMITTED_VALUE)
            .map_err(|error| EnhancerError::Storage(describe_js(&error)))
    }

    fn clear_form_submitted(&mut self) -> Result<(), EnhancerError> {
        self.storage()?
            .remove_item(&self.session_key)
            .map_err(|error| EnhancerError::Storage(describe_js(&error)))
    }
}
