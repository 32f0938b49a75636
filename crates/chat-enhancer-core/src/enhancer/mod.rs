//! The controller that owns all enhancer state and drives the host.
//!
//! Hosts feed [`HostEvent`]s into [`Enhancer::handle`] one at a time. Each
//! feature step touches the page through the host and contains its own
//! failure, so a broken widget contract in one feature never stops the rest.

mod bridges_flow;
mod intake_flow;
mod popup_flow;
mod watcher;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::{ElementCache, ElementSlot};
use crate::config::EnhancerConfig;
use crate::error::HostError;
use crate::host::{DebugCommand, Host, HostEvent, TimerHost, TimerSlot};
use crate::intake::IntakeSession;
use crate::popup::PopupScheduler;
use crate::status::{PopupStatus, StatusSnapshot};

/// Pending timers and the generation each was scheduled with.
#[derive(Debug, Default)]
struct TimerBook {
    next_generation: u64,
    pending: BTreeMap<TimerSlot, u64>,
}

impl TimerBook {
    fn schedule<T: TimerHost + ?Sized>(&mut self, host: &mut T, slot: TimerSlot, delay: Duration) {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.pending.insert(slot, generation);
        host.schedule(slot, generation, delay);
    }

    fn cancel<T: TimerHost + ?Sized>(&mut self, host: &mut T, slot: TimerSlot) {
        if self.pending.remove(&slot).is_some() {
            host.cancel(slot);
        }
    }

    fn cancel_all<T: TimerHost + ?Sized>(&mut self, host: &mut T) {
        for slot in std::mem::take(&mut self.pending).into_keys() {
            host.cancel(slot);
        }
    }

    /// Consumes a firing. Only the latest scheduling of a slot is honoured.
    fn accept(&mut self, slot: TimerSlot, generation: u64) -> bool {
        if self.pending.get(&slot) == Some(&generation) {
            self.pending.remove(&slot);
            true
        } else {
            false
        }
    }

    fn is_pending(&self, slot: TimerSlot) -> bool {
        self.pending.contains_key(&slot)
    }

    fn pending(&self) -> Vec<TimerSlot> {
        self.pending.keys().copied().collect()
    }
}

#[derive(Debug, Default)]
struct EnhancerState {
    chat_initialized: bool,
    form_submitted: bool,
    chat_open: bool,
    widget_ready: bool,
    launcher_bound: bool,
    stopped: bool,
    intake: IntakeSession,
    open_attempts: u32,
    pending_payload: Option<String>,
    delivery_attempts: u32,
}

/// Logs a contained feature failure and moves on.
fn contain(feature: &'static str, result: Result<(), HostError>) {
    if let Err(error) = result {
        warn!(feature, %error, "enhancement step failed");
    }
}

pub struct Enhancer<H: Host> {
    host: H,
    config: EnhancerConfig,
    cache: ElementCache<H::Node>,
    state: EnhancerState,
    popup: PopupScheduler,
    timers: TimerBook,
    bubble: Option<H::Node>,
    close_button: Option<H::Node>,
}

impl<H: Host> Enhancer<H> {
    pub fn new(host: H, config: EnhancerConfig) -> Self {
        Self {
            host,
            config,
            cache: ElementCache::default(),
            state: EnhancerState::default(),
            popup: PopupScheduler::default(),
            timers: TimerBook::default(),
            bubble: None,
            close_button: None,
        }
    }

    pub fn config(&self) -> &EnhancerConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn is_form_active(&self) -> bool {
        self.config.form.active
    }

    pub fn is_stopped(&self) -> bool {
        self.state.stopped
    }

    pub fn handle(&mut self, event: HostEvent) {
        match event {
            HostEvent::Started => {
                if !self.state.stopped {
                    self.start();
                }
            }
            HostEvent::DomMutated => {
                if !self.state.stopped {
                    self.schedule(TimerSlot::MutationDebounce, self.config.watcher.debounce());
                }
            }
            HostEvent::TimerFired { slot, generation } => {
                if self.timers.accept(slot, generation) {
                    self.on_timer(slot);
                } else {
                    debug!(?slot, generation, "ignoring superseded timer");
                }
            }
            HostEvent::LauncherClicked => self.on_launcher_clicked(),
            HostEvent::DocumentClicked { inside_launcher } => {
                self.on_document_clicked(inside_launcher);
            }
            HostEvent::IntakeFieldEdited => {
                self.schedule(TimerSlot::GateDebounce, self.config.form.gate_debounce());
            }
            HostEvent::IntakeSubmitRequested => self.submit_intake(),
            HostEvent::CloseButtonClicked => self.close_chat(),
            HostEvent::ResetButtonClicked => self.on_reset_clicked(),
            HostEvent::Debug(command) => self.on_debug(command),
        }
    }

    fn on_timer(&mut self, slot: TimerSlot) {
        match slot {
            TimerSlot::WidgetPoll => self.poll_widget(),
            TimerSlot::MutationDebounce => self.process_mutations(),
            TimerSlot::DisclaimerSweep => self.sweep_disclaimers(),
            TimerSlot::PopupFirst => self.on_popup_first(),
            TimerSlot::PopupNext => self.on_popup_next(),
            TimerSlot::PopupReveal => {
                let commands = self.popup.on_reveal_fired();
                self.apply_popup(commands);
            }
            TimerSlot::PopupTyping => {
                let commands = self.popup.on_typing_fired(&self.config.popup);
                self.apply_popup(commands);
            }
            TimerSlot::PopupAutoHide => {
                let commands = self.popup.on_auto_hide_fired(&self.config.popup);
                self.apply_popup(commands);
            }
            TimerSlot::PopupHideDone => {
                let commands = self.popup.on_hide_done(&self.config.popup);
                self.apply_popup(commands);
            }
            TimerSlot::IntakeOpen => self.on_intake_open(),
            TimerSlot::GateDebounce => self.evaluate_gate(),
            TimerSlot::SubmitDelay => self.begin_delivery(),
            TimerSlot::DeliveryInject => self.try_inject(),
            TimerSlot::DeliveryFormSubmit => self.deliver_form_submit(),
            TimerSlot::DeliveryClick => self.deliver_click(),
            TimerSlot::DeliveryEnter => self.deliver_enter(),
            TimerSlot::DeliveryVerify => self.verify_delivery(),
            TimerSlot::ResetSettle => self.on_reset_settled(),
        }
    }

    fn on_debug(&mut self, command: DebugCommand) {
        match command {
            DebugCommand::ResetForm => {
                if !self.config.form.active {
                    info!("intake form is disabled, nothing to reset");
                    return;
                }
                self.reset_intake_state();
                self.refresh_cache();
                if self.chat_is_open() {
                    self.open_intake_form();
                }
                info!("intake form state reset");
            }
            DebugCommand::ShowForm => {
                if !self.config.form.active {
                    info!("intake form is disabled");
                    return;
                }
                self.refresh_cache();
                let result = self.show_intake_form();
                contain("intake", result);
            }
            DebugCommand::StopAll => self.stop_all(),
        }
    }

    fn stop_all(&mut self) {
        let commands = self.popup.stop();
        self.apply_popup(commands);
        self.timers.cancel_all(&mut self.host);
        self.state.stopped = true;
        info!("all enhancer activity stopped");
    }

    fn schedule(&mut self, slot: TimerSlot, delay: Duration) {
        self.timers.schedule(&mut self.host, slot, delay);
    }

    fn cancel(&mut self, slot: TimerSlot) {
        self.timers.cancel(&mut self.host, slot);
    }

    fn refresh_cache(&mut self) {
        self.cache.refresh(&self.host, &self.config.widget);
    }

    /// Reloads the submitted flag from session storage. A read failure keeps
    /// the in-memory value.
    fn reload_submitted_flag(&mut self) {
        match self.host.load_form_submitted() {
            Ok(submitted) => self.state.form_submitted = submitted,
            Err(error) => warn!(%error, "could not read the submitted flag"),
        }
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            form_active: self.config.form.active,
            form_submitted: self.state.form_submitted,
            chat_initialized: self.state.chat_initialized,
            chat_open: self.state.chat_open,
            widget_ready: self.state.widget_ready,
            stopped: self.state.stopped,
            session_flag: self.host.load_form_submitted().ok(),
            intake: self.state.intake.phase(),
            delivery_pending: self.state.pending_payload.is_some(),
            elements: self.cache.presence(),
            popups: PopupStatus {
                phase: self.popup.phase(),
                shown: self.popup.shown_this_session(),
                continuous: self.popup.continuous_mode(),
            },
            pending_timers: self.timers.pending(),
        }
    }

    /// Cached node for `slot`, for hosts that need to map events back to it.
    pub fn element(&self, slot: ElementSlot) -> Option<&H::Node> {
        self.cache.get(slot)
    }
}
