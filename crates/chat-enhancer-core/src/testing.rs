//! In-memory widget and virtual clock for driving the enhancer without a
//! browser.
//!
//! [`FakeHost`] models just enough of the embed: a launcher, a chat window
//! with the native form, transcript nodes and buttons. DOM writes made by the
//! enhancer mark the page dirty and [`Harness`] turns that into the mutation
//! notification a real observer would deliver.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::time::Duration;

use crate::config::{EnhancerConfig, WidgetContract};
use crate::enhancer::Enhancer;
use crate::error::HostError;
use crate::host::{
    BridgeSurface, ButtonScope, HostEvent, IntakePlacement, IntakeSurface, LabeledButton,
    LayoutProbe, MarkedNode, PopupSurface, SessionFlagStore, TimerHost, TimerSlot,
    TimestampNode, TranscriptSurface, WidgetLookup,
};
use crate::intake::{ClientContext, FormField, INTAKE_CONTAINER_ID, IntakeLayout, IntakeValues};
use crate::session::MemorySessionStore;

pub type NodeId = usize;

/// Which synthetic delivery attempt the fake widget reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    OnFormSubmit,
    OnClick,
    OnEnter,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    FormSubmit,
    Click,
    Enter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeNode {
    pub parent: Option<NodeId>,
    pub dom_id: Option<String>,
    pub text: String,
    pub value: String,
    pub attached: bool,
    pub suppressed: bool,
    pub processed: bool,
    pub bound: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeIntake {
    pub node: NodeId,
    pub placement: IntakePlacement<NodeId>,
    pub layout: IntakeLayout,
    pub values: IntakeValues,
    pub gate_open: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeBubble {
    pub node: NodeId,
    pub revealed: bool,
    pub typed: String,
    pub fading: bool,
}

#[derive(Debug, Clone, Copy)]
struct ChatWindow {
    container: NodeId,
    greeting_area: NodeId,
    greeting: NodeId,
    history: NodeId,
    native_form: NodeId,
    textbox: NodeId,
    send: NodeId,
    native_close: NodeId,
    native_reset: NodeId,
}

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    generation: u64,
    due: Duration,
    seq: u64,
}

#[derive(Debug)]
pub struct FakeHost {
    contract: WidgetContract,
    nodes: Vec<FakeNode>,
    launcher_container: NodeId,
    launcher_button: NodeId,
    window: Option<ChatWindow>,
    timestamps: Vec<(NodeId, bool)>,
    user_messages: Vec<NodeId>,
    close_button: Option<NodeId>,
    session: MemorySessionStore,
    now: Duration,
    timers: BTreeMap<TimerSlot, PendingTimer>,
    seq: u64,
    dirty: bool,
    pub intake: Option<FakeIntake>,
    pub intake_injections: u32,
    pub close_buttons_created: u32,
    pub native_close_clicks: u32,
    pub bubble: Option<FakeBubble>,
    pub bubbles_mounted: u32,
    pub outside_click_armed: bool,
    pub launcher_bound: bool,
    pub cookies: BTreeMap<String, u32>,
    pub roll: f64,
    pub fail_mount: bool,
    pub delivery: Delivery,
    pub sent: Vec<String>,
    pub dispatched: Vec<Dispatched>,
}

impl FakeHost {
    /// A page where the embed has rendered its launcher but not the window.
    pub fn new(contract: &WidgetContract) -> Self {
        let mut host = Self {
            contract: contract.clone(),
            nodes: Vec::new(),
            launcher_container: 0,
            launcher_button: 0,
            window: None,
            timestamps: Vec::new(),
            user_messages: Vec::new(),
            close_button: None,
            session: MemorySessionStore::default(),
            now: Duration::ZERO,
            timers: BTreeMap::new(),
            seq: 0,
            dirty: false,
            intake: None,
            intake_injections: 0,
            close_buttons_created: 0,
            native_close_clicks: 0,
            bubble: None,
            bubbles_mounted: 0,
            outside_click_armed: false,
            launcher_bound: false,
            cookies: BTreeMap::new(),
            roll: 0.0,
            fail_mount: false,
            delivery: Delivery::OnFormSubmit,
            sent: Vec::new(),
            dispatched: Vec::new(),
        };
        let launcher_container =
            host.add_node(None, Some(contract.launcher_container_id.clone()), "");
        host.launcher_container = launcher_container;
        host.launcher_button = host.add_node(
            Some(launcher_container),
            Some(contract.launcher_button_id.clone()),
            "",
        );
        host.dirty = false;
        host
    }

    fn add_node(&mut self, parent: Option<NodeId>, dom_id: Option<String>, text: &str) -> NodeId {
        self.nodes.push(FakeNode {
            parent,
            dom_id,
            text: text.to_string(),
            attached: true,
            ..FakeNode::default()
        });
        self.dirty = true;
        self.nodes.len() - 1
    }

    pub fn node(&self, id: NodeId) -> &FakeNode {
        &self.nodes[id]
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut FakeNode, HostError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| HostError::new("node", format!("unknown node {id}")))
    }

    fn ancestry(&self, id: NodeId) -> impl Iterator<Item = &FakeNode> {
        let mut next = Some(id);
        std::iter::from_fn(move || {
            let node = self.nodes.get(next?)?;
            next = node.parent;
            Some(node)
        })
    }

    /// Attached, with no display-suppressed node on the way to the root.
    pub fn is_displayed(&self, id: NodeId) -> bool {
        self.ancestry(id).all(|node| node.attached && !node.suppressed)
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Removes the earliest timer due by `until` and advances the clock to it.
    pub fn pop_due(&mut self, until: Duration) -> Option<HostEvent> {
        let (slot, timer) = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.due <= until)
            .min_by_key(|(_, timer)| (timer.due, timer.seq))
            .map(|(slot, timer)| (*slot, *timer))?;
        self.timers.remove(&slot);
        self.now = timer.due;
        Some(HostEvent::TimerFired {
            slot,
            generation: timer.generation,
        })
    }

    pub fn set_now(&mut self, now: Duration) {
        self.now = now;
    }

    pub fn has_timer(&self, slot: TimerSlot) -> bool {
        self.timers.contains_key(&slot)
    }

    pub fn timer_generation(&self, slot: TimerSlot) -> Option<u64> {
        self.timers.get(&slot).map(|timer| timer.generation)
    }

    pub fn open_chat(&mut self) {
        let window = match self.window {
            Some(window) => window,
            None => self.build_window(),
        };
        self.nodes[window.container].suppressed = false;
        self.dirty = true;
    }

    fn build_window(&mut self) -> ChatWindow {
        let contract = self.contract.clone();
        let container = self.add_node(None, Some(contract.chat_container_id), "");
        let greeting_area = self.add_node(Some(container), None, "");
        let greeting = self.add_node(Some(greeting_area), None, "How can I help you today?");
        let history = self.add_node(Some(container), Some(contract.history_id), "");
        let native_form = self.add_node(Some(container), None, "");
        let textbox = self.add_node(Some(native_form), Some(contract.message_input_id), "");
        let send = self.add_node(Some(native_form), Some(contract.send_button_id), "");
        let native_close = self.add_node(Some(container), None, &contract.close_label);
        let native_reset = self.add_node(Some(container), None, &contract.reset_label);
        let window = ChatWindow {
            container,
            greeting_area,
            greeting,
            history,
            native_form,
            textbox,
            send,
            native_close,
            native_reset,
        };
        self.window = Some(window);
        window
    }

    /// The widget hides its window (its own close button or ours).
    pub fn close_chat_window(&mut self) {
        if let Some(window) = self.window {
            self.nodes[window.container].suppressed = true;
            self.dirty = true;
        }
    }

    /// The widget re-renders its native form visible.
    pub fn rerender_native_form(&mut self) {
        if let Some(window) = self.window {
            self.nodes[window.native_form].suppressed = false;
            self.dirty = true;
        }
    }

    /// Toggles a display override the way page CSS or the widget would.
    pub fn set_suppressed(&mut self, id: NodeId, suppressed: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.suppressed = suppressed;
            self.dirty = true;
        }
    }

    /// Drops the greeting block, as the widget does once a conversation starts.
    pub fn remove_greeting(&mut self) {
        if let Some(window) = self.window {
            self.nodes[window.greeting].attached = false;
            self.dirty = true;
        }
    }

    pub fn add_timestamp(&mut self, text: &str, assistant_authored: bool) -> NodeId {
        let parent = self.window.map(|window| window.history);
        let node = self.add_node(parent, None, text);
        self.timestamps.push((node, assistant_authored));
        node
    }

    pub fn add_user_message(&mut self, text: &str) -> NodeId {
        let parent = self.window.map(|window| window.history);
        let node = self.add_node(parent, None, text);
        self.user_messages.push(node);
        node
    }

    pub fn user_messages(&self) -> Vec<&FakeNode> {
        self.user_messages.iter().map(|id| &self.nodes[*id]).collect()
    }

    pub fn launcher_container(&self) -> NodeId {
        self.launcher_container
    }

    pub fn launcher_button(&self) -> NodeId {
        self.launcher_button
    }

    pub fn textbox(&self) -> Option<NodeId> {
        self.window.map(|window| window.textbox)
    }

    pub fn send_button(&self) -> Option<NodeId> {
        self.window.map(|window| window.send)
    }

    pub fn native_form_node(&self) -> Option<NodeId> {
        self.window.map(|window| window.native_form)
    }

    pub fn greeting(&self) -> Option<NodeId> {
        self.window.map(|window| window.greeting)
    }

    pub fn native_reset(&self) -> Option<NodeId> {
        self.window.map(|window| window.native_reset)
    }

    pub fn custom_close_button(&self) -> Option<NodeId> {
        self.close_button
            .filter(|button| self.ancestry(*button).all(|node| node.attached))
    }

    pub fn set_field(&mut self, field: FormField, value: &str) {
        if let Some(intake) = &mut self.intake {
            intake.values.set(field, value);
        }
    }

    pub fn session_raw(&self) -> Option<&str> {
        self.session.raw()
    }

    pub fn preload_session(&mut self, raw: &str) {
        self.session = MemorySessionStore::with_raw(raw);
    }

    fn window_buttons(&self) -> Vec<NodeId> {
        self.window
            .map(|window| vec![window.send, window.native_close, window.native_reset])
            .unwrap_or_default()
    }

    fn labeled(&self, ids: &[NodeId]) -> Vec<LabeledButton<NodeId>> {
        ids.iter()
            .filter(|id| self.ancestry(**id).all(|node| node.attached))
            .map(|id| LabeledButton {
                node: *id,
                label: self.nodes[*id].text.clone(),
                bound: self.nodes[*id].bound,
            })
            .collect()
    }

    fn deliver(&mut self) {
        let Some(textbox) = self.textbox() else {
            return;
        };
        let message = std::mem::take(&mut self.nodes[textbox].value);
        if message.is_empty() {
            return;
        }
        self.sent.push(message.clone());
        self.add_user_message(&message);
    }
}

impl WidgetLookup for FakeHost {
    type Node = NodeId;

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        (0..self.nodes.len()).find(|node| {
            self.nodes[*node].dom_id.as_deref() == Some(id)
                && self.ancestry(*node).all(|node| node.attached)
        })
    }

    fn native_form(&self, container: &NodeId, _excluded_form_id: &str) -> Option<NodeId> {
        self.window
            .filter(|window| window.container == *container)
            .map(|window| window.native_form)
    }

    fn is_attached(&self, node: &NodeId) -> bool {
        self.ancestry(*node).all(|node| node.attached)
    }

    fn layout_probe(&self, node: &NodeId) -> LayoutProbe {
        if self.nodes.get(*node).is_none_or(|node| node.suppressed) {
            return LayoutProbe::hidden();
        }
        if self.is_displayed(*node) {
            LayoutProbe::laid_out("block")
        } else {
            LayoutProbe {
                has_offset_parent: false,
                computed_display: "block".to_string(),
            }
        }
    }

    fn set_displayed(&mut self, node: &NodeId, displayed: bool) -> Result<(), HostError> {
        let node = self.node_mut(*node)?;
        if node.suppressed == displayed {
            node.suppressed = !displayed;
            self.dirty = true;
        }
        Ok(())
    }

    fn remove_node(&mut self, node: &NodeId) {
        if let Some(removed) = self.nodes.get_mut(*node) {
            removed.attached = false;
            self.dirty = true;
        }
        if self.intake.as_ref().is_some_and(|intake| intake.node == *node) {
            self.intake = None;
        }
        if self.bubble.as_ref().is_some_and(|bubble| bubble.node == *node) {
            self.bubble = None;
        }
    }
}

impl PopupSurface for FakeHost {
    fn bind_launcher(&mut self, _launcher: &NodeId) -> Result<(), HostError> {
        self.launcher_bound = true;
        Ok(())
    }

    fn mount_bubble(&mut self, launcher_container: &NodeId) -> Result<NodeId, HostError> {
        if self.fail_mount {
            return Err(HostError::new("mount_bubble", "launcher container rejected child"));
        }
        let node = self.add_node(Some(*launcher_container), None, "");
        self.bubble = Some(FakeBubble {
            node,
            ..FakeBubble::default()
        });
        self.bubbles_mounted += 1;
        Ok(node)
    }

    fn reveal_bubble(&mut self, _bubble: &NodeId) -> Result<(), HostError> {
        if let Some(bubble) = &mut self.bubble {
            bubble.revealed = true;
        }
        Ok(())
    }

    fn type_bubble_text(
        &mut self,
        _bubble: &NodeId,
        text: &str,
        _letter_interval: Duration,
    ) -> Result<(), HostError> {
        if let Some(bubble) = &mut self.bubble {
            bubble.typed = text.to_string();
        }
        Ok(())
    }

    fn fade_bubble(&mut self, _bubble: &NodeId) -> Result<(), HostError> {
        if let Some(bubble) = &mut self.bubble {
            bubble.fading = true;
        }
        Ok(())
    }

    fn arm_outside_click(&mut self) -> Result<(), HostError> {
        self.outside_click_armed = true;
        Ok(())
    }

    fn disarm_outside_click(&mut self) {
        self.outside_click_armed = false;
    }

    fn popup_marker_present(&self, cookie_name: &str) -> bool {
        self.cookies.contains_key(cookie_name)
    }

    fn write_popup_marker(&mut self, cookie_name: &str, days: u32) -> Result<(), HostError> {
        self.cookies.insert(cookie_name.to_string(), days);
        Ok(())
    }

    fn random_roll(&mut self) -> f64 {
        self.roll
    }
}

impl TranscriptSurface for FakeHost {
    fn timestamp_nodes(&self) -> Vec<TimestampNode<NodeId>> {
        self.timestamps
            .iter()
            .filter(|(node, _)| self.is_attached(node))
            .map(|(node, assistant_authored)| TimestampNode {
                node: *node,
                text: self.nodes[*node].text.clone(),
                assistant_authored: *assistant_authored,
            })
            .collect()
    }

    fn set_text(&mut self, node: &NodeId, text: &str) -> Result<(), HostError> {
        let node = self.node_mut(*node)?;
        if node.text != text {
            node.text = text.to_string();
            self.dirty = true;
        }
        Ok(())
    }

    fn user_message_nodes(&self) -> Vec<MarkedNode<NodeId>> {
        self.user_messages
            .iter()
            .filter(|node| self.is_attached(node))
            .map(|node| MarkedNode {
                node: *node,
                text: self.nodes[*node].text.clone(),
                processed: self.nodes[*node].processed,
            })
            .collect()
    }

    fn show_visible_message(&mut self, node: &NodeId, message: &str) -> Result<(), HostError> {
        let node = self.node_mut(*node)?;
        node.text = message.to_string();
        node.processed = true;
        self.dirty = true;
        Ok(())
    }

    fn greeting_nodes(&self) -> Vec<MarkedNode<NodeId>> {
        self.greeting()
            .filter(|node| self.is_attached(node))
            .map(|node| MarkedNode {
                node,
                text: self.nodes[node].text.clone(),
                processed: self.nodes[node].processed,
            })
            .into_iter()
            .collect()
    }

    fn render_greeting(
        &mut self,
        node: &NodeId,
        title: Option<&str>,
        body: Option<&str>,
    ) -> Result<(), HostError> {
        let text = [title, body].into_iter().flatten().collect::<Vec<_>>().join("\n");
        let node = self.node_mut(*node)?;
        node.text = text;
        node.processed = true;
        self.dirty = true;
        Ok(())
    }
}

impl IntakeSurface for FakeHost {
    fn greeting_area(&self, container: &NodeId) -> Option<NodeId> {
        let window = self.window.filter(|window| window.container == *container)?;
        self.is_attached(&window.greeting)
            .then_some(window.greeting_area)
    }

    fn inject_intake_form(
        &mut self,
        layout: &IntakeLayout,
        placement: IntakePlacement<NodeId>,
    ) -> Result<NodeId, HostError> {
        let parent = match &placement {
            IntakePlacement::AppendTo(area) => Some(*area),
            IntakePlacement::Before(history) => self.nodes.get(*history).and_then(|node| node.parent),
        };
        let node = self.add_node(parent, Some(INTAKE_CONTAINER_ID.to_string()), "");
        self.intake = Some(FakeIntake {
            node,
            placement,
            layout: layout.clone(),
            values: IntakeValues::default(),
            gate_open: layout.starts_open,
        });
        self.intake_injections += 1;
        Ok(node)
    }

    fn read_intake_values(&self, form: &NodeId) -> IntakeValues {
        self.intake
            .as_ref()
            .filter(|intake| intake.node == *form)
            .map(|intake| intake.values.clone())
            .unwrap_or_default()
    }

    fn set_intake_gate(&mut self, form: &NodeId, open: bool) -> Result<(), HostError> {
        match &mut self.intake {
            Some(intake) if intake.node == *form => {
                intake.gate_open = open;
                Ok(())
            }
            _ => Err(HostError::new("set_intake_gate", "intake form missing")),
        }
    }

    fn client_context(&self) -> ClientContext {
        ClientContext {
            user_agent: "FakeBrowser/1.0".to_string(),
            platform: "Test".to_string(),
            language: "en-US".to_string(),
            languages: vec!["en-US".to_string()],
            cookie_enabled: true,
            device_memory: Some(8.0),
            hardware_concurrency: Some(4),
            screen_width: Some(1280),
            screen_height: Some(800),
        }
    }

    fn force_input_value(&mut self, textbox: &NodeId, value: &str) -> Result<(), HostError> {
        let node = self.node_mut(*textbox)?;
        node.value = value.to_string();
        Ok(())
    }

    fn input_value(&self, textbox: &NodeId) -> String {
        self.nodes
            .get(*textbox)
            .map(|node| node.value.clone())
            .unwrap_or_default()
    }

    fn dispatch_form_submit(&mut self, _textbox: &NodeId) -> Result<bool, HostError> {
        self.dispatched.push(Dispatched::FormSubmit);
        if self.delivery == Delivery::OnFormSubmit {
            self.deliver();
        }
        Ok(true)
    }

    fn dispatch_click(&mut self, node: &NodeId) -> Result<(), HostError> {
        self.dispatched.push(Dispatched::Click);
        let is_send = self.window.is_some_and(|window| window.send == *node);
        if is_send && self.delivery == Delivery::OnClick {
            self.deliver();
        }
        Ok(())
    }

    fn dispatch_enter(&mut self, _textbox: &NodeId) -> Result<(), HostError> {
        self.dispatched.push(Dispatched::Enter);
        if self.delivery == Delivery::OnEnter {
            self.deliver();
        }
        Ok(())
    }
}

impl BridgeSurface for FakeHost {
    fn ensure_close_button(&mut self, container: &NodeId) -> Result<NodeId, HostError> {
        if let Some(existing) = self.custom_close_button() {
            return Ok(existing);
        }
        let button = self.add_node(Some(*container), None, "");
        self.close_button = Some(button);
        self.close_buttons_created += 1;
        Ok(button)
    }

    fn buttons(&self, scope: ButtonScope) -> Vec<LabeledButton<NodeId>> {
        let ids = match (scope, self.window) {
            (_, None) => Vec::new(),
            (ButtonScope::CloseSignature, Some(window)) => vec![window.native_close],
            (ButtonScope::ResetSignature, Some(window)) => {
                vec![window.native_close, window.native_reset]
            }
            (ButtonScope::Everywhere, Some(_)) => {
                let mut ids = self.window_buttons();
                ids.extend(self.close_button);
                ids
            }
        };
        self.labeled(&ids)
    }

    fn click(&mut self, node: &NodeId) -> Result<(), HostError> {
        if self.window.is_some_and(|window| window.native_close == *node) {
            self.native_close_clicks += 1;
            self.close_chat_window();
        }
        Ok(())
    }

    fn bind_reset_button(&mut self, node: &NodeId, _marker: &str) -> Result<(), HostError> {
        self.node_mut(*node)?.bound = true;
        Ok(())
    }
}

impl TimerHost for FakeHost {
    fn schedule(&mut self, slot: TimerSlot, generation: u64, delay: Duration) {
        self.seq += 1;
        self.timers.insert(
            slot,
            PendingTimer {
                generation,
                due: self.now + delay,
                seq: self.seq,
            },
        );
    }

    fn cancel(&mut self, slot: TimerSlot) {
        self.timers.remove(&slot);
    }
}

impl SessionFlagStore for FakeHost {
    type Error = Infallible;

    fn load_form_submitted(&self) -> Result<bool, Infallible> {
        self.session.load_form_submitted()
    }

    fn persist_form_submitted(&mut self) -> Result<(), Infallible> {
        self.session.persist_form_submitted()
    }

    fn clear_form_submitted(&mut self) -> Result<(), Infallible> {
        self.session.clear_form_submitted()
    }
}

/// Couples an enhancer with a [`FakeHost`] and plays visitor actions against
/// both on a virtual clock.
pub struct Harness {
    pub enhancer: Enhancer<FakeHost>,
}

impl Harness {
    pub fn new(config: EnhancerConfig) -> Self {
        let host = FakeHost::new(&config.widget);
        Self {
            enhancer: Enhancer::new(host, config),
        }
    }

    pub fn with_host(host: FakeHost, config: EnhancerConfig) -> Self {
        Self {
            enhancer: Enhancer::new(host, config),
        }
    }

    pub fn host(&self) -> &FakeHost {
        self.enhancer.host()
    }

    pub fn host_mut(&mut self) -> &mut FakeHost {
        self.enhancer.host_mut()
    }

    pub fn send(&mut self, event: HostEvent) {
        self.enhancer.handle(event);
        self.flush_mutations();
    }

    /// Delivers pending page changes to the enhancer as one observer callback.
    pub fn flush_mutations(&mut self) {
        if self.host_mut().take_dirty() {
            self.enhancer.handle(HostEvent::DomMutated);
        }
    }

    pub fn start(&mut self) {
        self.host_mut().take_dirty();
        self.send(HostEvent::Started);
    }

    /// Runs every timer due within `by`, in order.
    pub fn advance(&mut self, by: Duration) {
        let until = self.host().now() + by;
        while let Some(event) = self.host_mut().pop_due(until) {
            self.send(event);
        }
        self.host_mut().set_now(until);
    }

    pub fn advance_ms(&mut self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn open_chat(&mut self) {
        self.host_mut().open_chat();
        self.flush_mutations();
    }

    pub fn widget_closes_chat(&mut self) {
        self.host_mut().close_chat_window();
        self.flush_mutations();
    }

    /// A click on the launcher, followed by the document-level listener.
    pub fn click_launcher(&mut self) {
        if self.host().launcher_bound {
            self.send(HostEvent::LauncherClicked);
        }
        if self.host().outside_click_armed {
            self.send(HostEvent::DocumentClicked {
                inside_launcher: true,
            });
        }
    }

    pub fn click_outside(&mut self) {
        if self.host().outside_click_armed {
            self.send(HostEvent::DocumentClicked {
                inside_launcher: false,
            });
        }
    }

    pub fn click_close_button(&mut self) {
        if self.host().custom_close_button().is_some() {
            self.send(HostEvent::CloseButtonClicked);
        }
    }

    /// Clicks the widget's reset button; only a bound button reaches us.
    pub fn click_reset(&mut self) {
        let bound = self
            .host()
            .native_reset()
            .is_some_and(|reset| self.host().node(reset).bound);
        if bound {
            self.send(HostEvent::ResetButtonClicked);
        }
    }

    pub fn fill(&mut self, field: FormField, value: &str) {
        self.host_mut().set_field(field, value);
        self.send(HostEvent::IntakeFieldEdited);
    }

    pub fn submit(&mut self) {
        self.send(HostEvent::IntakeSubmitRequested);
    }

    pub fn fire_stale(&mut self, slot: TimerSlot, generation: u64) {
        self.send(HostEvent::TimerFired { slot, generation });
    }
}
