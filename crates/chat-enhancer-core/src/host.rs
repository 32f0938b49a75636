//! Adapter seam between the enhancer and the page it runs in.
//!
//! The enhancer never touches a DOM directly. Everything it needs from the
//! third-party widget (lookups, layout, synthetic input) and from the browser
//! (timers, storage, cookies) goes through these traits, so the widget's
//! brittle selectors stay isolated in one implementation.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::HostError;
use crate::intake::{ClientContext, IntakeLayout, IntakeValues};

/// Named, single-occupancy timers. Scheduling a slot replaces whatever was
/// pending in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerSlot {
    WidgetPoll,
    MutationDebounce,
    DisclaimerSweep,
    PopupFirst,
    PopupReveal,
    PopupTyping,
    PopupAutoHide,
    PopupHideDone,
    PopupNext,
    IntakeOpen,
    GateDebounce,
    SubmitDelay,
    DeliveryInject,
    DeliveryFormSubmit,
    DeliveryClick,
    DeliveryEnter,
    DeliveryVerify,
    ResetSettle,
}

impl TimerSlot {
    pub const POPUP: [TimerSlot; 6] = [
        TimerSlot::PopupFirst,
        TimerSlot::PopupReveal,
        TimerSlot::PopupTyping,
        TimerSlot::PopupAutoHide,
        TimerSlot::PopupHideDone,
        TimerSlot::PopupNext,
    ];
}

/// Manual triggers exposed on the page's debug object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand {
    ResetForm,
    ShowForm,
    StopAll,
}

/// Everything the host reports back to the enhancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Started,
    DomMutated,
    TimerFired { slot: TimerSlot, generation: u64 },
    LauncherClicked,
    DocumentClicked { inside_launcher: bool },
    IntakeFieldEdited,
    IntakeSubmitRequested,
    CloseButtonClicked,
    ResetButtonClicked,
    Debug(DebugCommand),
}

/// Layout facts the visibility oracle needs about one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutProbe {
    pub has_offset_parent: bool,
    pub computed_display: String,
}

impl LayoutProbe {
    pub fn hidden() -> Self {
        Self {
            has_offset_parent: false,
            computed_display: "none".to_string(),
        }
    }

    pub fn laid_out(display: &str) -> Self {
        Self {
            has_offset_parent: true,
            computed_display: display.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimestampNode<N> {
    pub node: N,
    pub text: String,
    pub assistant_authored: bool,
}

/// A node the enhancer rewrites at most once, remembered by a marker class.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkedNode<N> {
    pub node: N,
    pub text: String,
    pub processed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledButton<N> {
    pub node: N,
    pub label: String,
    pub bound: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonScope {
    CloseSignature,
    ResetSignature,
    Everywhere,
}

/// Where the intake form goes inside the chat window.
#[derive(Debug, Clone, PartialEq)]
pub enum IntakePlacement<N> {
    AppendTo(N),
    Before(N),
}

pub trait WidgetLookup {
    type Node: Clone + fmt::Debug;

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;
    /// First `<form>` under `container` whose id is not `excluded_form_id`.
    fn native_form(&self, container: &Self::Node, excluded_form_id: &str) -> Option<Self::Node>;
    fn is_attached(&self, node: &Self::Node) -> bool;
    fn layout_probe(&self, node: &Self::Node) -> LayoutProbe;
    /// `false` suppresses display; `true` clears the override.
    fn set_displayed(&mut self, node: &Self::Node, displayed: bool) -> Result<(), HostError>;
    fn remove_node(&mut self, node: &Self::Node);
}

pub trait PopupSurface: WidgetLookup {
    fn bind_launcher(&mut self, launcher: &Self::Node) -> Result<(), HostError>;
    fn mount_bubble(&mut self, launcher_container: &Self::Node) -> Result<Self::Node, HostError>;
    fn reveal_bubble(&mut self, bubble: &Self::Node) -> Result<(), HostError>;
    fn type_bubble_text(
        &mut self,
        bubble: &Self::Node,
        text: &str,
        letter_interval: Duration,
    ) -> Result<(), HostError>;
    fn fade_bubble(&mut self, bubble: &Self::Node) -> Result<(), HostError>;
    /// Registers the per-bubble document click listener.
    fn arm_outside_click(&mut self) -> Result<(), HostError>;
    fn disarm_outside_click(&mut self);
    fn popup_marker_present(&self, cookie_name: &str) -> bool;
    fn write_popup_marker(&mut self, cookie_name: &str, days: u32) -> Result<(), HostError>;
    /// Uniform sample in `[0, 1)`.
    fn random_roll(&mut self) -> f64;
}

pub trait TranscriptSurface: WidgetLookup {
    fn timestamp_nodes(&self) -> Vec<TimestampNode<Self::Node>>;
    fn set_text(&mut self, node: &Self::Node, text: &str) -> Result<(), HostError>;
    fn user_message_nodes(&self) -> Vec<MarkedNode<Self::Node>>;
    /// Replaces the visible content with `message` and marks the node processed.
    fn show_visible_message(&mut self, node: &Self::Node, message: &str)
    -> Result<(), HostError>;
    fn greeting_nodes(&self) -> Vec<MarkedNode<Self::Node>>;
    fn render_greeting(
        &mut self,
        node: &Self::Node,
        title: Option<&str>,
        body: Option<&str>,
    ) -> Result<(), HostError>;
}

pub trait IntakeSurface: WidgetLookup {
    /// The block that hosts the widget greeting, if the widget rendered one.
    fn greeting_area(&self, container: &Self::Node) -> Option<Self::Node>;
    fn inject_intake_form(
        &mut self,
        layout: &IntakeLayout,
        placement: IntakePlacement<Self::Node>,
    ) -> Result<Self::Node, HostError>;
    fn read_intake_values(&self, form: &Self::Node) -> IntakeValues;
    fn set_intake_gate(&mut self, form: &Self::Node, open: bool) -> Result<(), HostError>;
    fn client_context(&self) -> ClientContext;
    /// Focuses `textbox`, writes `value` through the native property setter
    /// and dispatches a bubbling `input` event.
    fn force_input_value(&mut self, textbox: &Self::Node, value: &str) -> Result<(), HostError>;
    fn input_value(&self, textbox: &Self::Node) -> String;
    /// Dispatches a synthetic `submit` on the textbox's form. Returns whether
    /// a form was found.
    fn dispatch_form_submit(&mut self, textbox: &Self::Node) -> Result<bool, HostError>;
    fn dispatch_click(&mut self, node: &Self::Node) -> Result<(), HostError>;
    fn dispatch_enter(&mut self, textbox: &Self::Node) -> Result<(), HostError>;
}

pub trait BridgeSurface: WidgetLookup {
    /// Returns the custom close button inside `container`, creating it if needed.
    fn ensure_close_button(&mut self, container: &Self::Node) -> Result<Self::Node, HostError>;
    fn buttons(&self, scope: ButtonScope) -> Vec<LabeledButton<Self::Node>>;
    fn click(&mut self, node: &Self::Node) -> Result<(), HostError>;
    fn bind_reset_button(&mut self, node: &Self::Node, marker: &str) -> Result<(), HostError>;
}

pub trait TimerHost {
    fn schedule(&mut self, slot: TimerSlot, generation: u64, delay: Duration);
    fn cancel(&mut self, slot: TimerSlot);
}

/// Per-tab persistence of the form-submitted flag.
pub trait SessionFlagStore {
    type Error: fmt::Display;

    fn load_form_submitted(&self) -> Result<bool, Self::Error>;
    fn persist_form_submitted(&mut self) -> Result<(), Self::Error>;
    fn clear_form_submitted(&mut self) -> Result<(), Self::Error>;
}

/// Everything an environment must provide to run the enhancer.
pub trait Host:
    PopupSurface + TranscriptSurface + IntakeSurface + BridgeSurface + TimerHost + SessionFlagStore
{
}

impl<T> Host for T where
    T: PopupSurface
        + TranscriptSurface
        + IntakeSurface
        + BridgeSurface
        + TimerHost
        + SessionFlagStore
{
}
