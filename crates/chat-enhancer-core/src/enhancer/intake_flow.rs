use std::time::Duration;

use tracing::{debug, info, warn};

use super::{Enhancer, contain};
use crate::cache::ElementSlot;
use crate::error::HostError;
use crate::host::{Host, IntakePlacement, TimerSlot};
use crate::intake::{
    IntakeLayout, IntakePayload, extract_visible_message, gate_is_open, submission_ready,
};
use crate::visibility::is_rendered;

/// Spacing between the three delivery attempts.
const DELIVERY_STEP: Duration = Duration::from_millis(100);

impl<H: Host> Enhancer<H> {
    /// Starts the intake open-flow if this chat session still needs the form.
    pub(super) fn open_intake_form(&mut self) {
        if !self.config.form.active {
            return;
        }
        self.reload_submitted_flag();
        if self.state.form_submitted || !self.chat_is_open() {
            return;
        }
        self.state.open_attempts = 0;
        self.schedule(TimerSlot::IntakeOpen, self.config.form.open_delay());
    }

    pub(super) fn on_intake_open(&mut self) {
        self.refresh_cache();
        if self.state.form_submitted || !self.chat_is_open() {
            return;
        }
        if !self.cache.contains(ElementSlot::MessageInput) {
            self.state.open_attempts += 1;
            if self.state.open_attempts < self.config.form.open_attempts {
                self.schedule(TimerSlot::IntakeOpen, self.config.form.open_retry());
            } else {
                debug!("message input never appeared, intake form skipped");
            }
            return;
        }
        let result = self.show_intake_form();
        contain("intake", result);
    }

    pub(super) fn show_intake_form(&mut self) -> Result<(), HostError> {
        let Some(container) = self.cache.cloned(ElementSlot::ChatContainer) else {
            return Ok(());
        };
        if self.state.form_submitted {
            return Ok(());
        }

        if let Some(native) = self.cache.cloned(ElementSlot::NativeForm) {
            self.host.set_displayed(&native, false)?;
        }

        if let Some(form) = self.cache.cloned(ElementSlot::IntakeForm) {
            self.host.set_displayed(&form, true)?;
            self.state.intake.show();
            return Ok(());
        }

        let placement = match self.host.greeting_area(&container) {
            Some(area) => IntakePlacement::AppendTo(area),
            None => match self.cache.cloned(ElementSlot::ChatHistory) {
                Some(history) => IntakePlacement::Before(history),
                None => {
                    debug!("no place for the intake form yet");
                    return Ok(());
                }
            },
        };
        let layout = IntakeLayout::from_config(&self.config.form);
        let form = self.host.inject_intake_form(&layout, placement)?;
        self.cache.set(ElementSlot::IntakeForm, form);
        self.state.intake.show();
        info!("intake form shown");
        self.evaluate_gate();
        Ok(())
    }

    /// Keeps the native form hidden while the intake form is up. The widget
    /// re-renders it on its own schedule.
    pub(super) fn enforce_single_form(&mut self) {
        if !self.state.intake.is_shown() {
            return;
        }
        if let Some(native) = self.cache.cloned(ElementSlot::NativeForm) {
            let result = self.host.set_displayed(&native, false);
            contain("intake", result);
        }
    }

    /// Drops an unsubmitted intake form so the next open builds it fresh.
    pub(super) fn discard_intake_form(&mut self) {
        self.cancel(TimerSlot::IntakeOpen);
        self.cancel(TimerSlot::GateDebounce);
        if let Some(form) = self.cache.clear(ElementSlot::IntakeForm) {
            self.host.remove_node(&form);
        }
        self.state.intake.reset();
    }

    pub(super) fn evaluate_gate(&mut self) {
        let Some(form) = self.cache.cloned(ElementSlot::IntakeForm) else {
            return;
        };
        if !self.state.intake.is_shown() {
            return;
        }
        let fields = &self.config.form.fields;
        let values = self.host.read_intake_values(&form);
        let open = gate_is_open(fields, &values);
        self.state
            .intake
            .set_complete(submission_ready(fields, &values));
        let result = self.host.set_intake_gate(&form, open);
        contain("intake", result);
    }

    pub(super) fn submit_intake(&mut self) {
        if !self.state.intake.is_shown() {
            return;
        }
        let Some(form) = self.cache.cloned(ElementSlot::IntakeForm) else {
            return;
        };
        let fields = &self.config.form.fields;
        let values = self.host.read_intake_values(&form);
        let ready = submission_ready(fields, &values);
        self.state.intake.set_complete(ready);
        if !ready {
            debug!("intake submit ignored, required fields incomplete");
            let result = self.host.set_intake_gate(&form, gate_is_open(fields, &values));
            contain("intake", result);
            return;
        }

        let mut payload = IntakePayload::from_values(fields, &values);
        if self.config.form.append_client_context {
            payload = payload.with_client_context(&self.host.client_context());
        }

        if let Some(native) = self.cache.cloned(ElementSlot::NativeForm) {
            contain("intake", self.host.set_displayed(&native, true));
        }
        contain("intake", self.host.set_displayed(&form, false));

        self.state.intake.submit();
        self.cancel(TimerSlot::GateDebounce);
        self.state.pending_payload = Some(payload.render());
        self.schedule(TimerSlot::SubmitDelay, self.config.form.submit_delay());
        info!("intake form submitted");
    }

    pub(super) fn begin_delivery(&mut self) {
        self.state.delivery_attempts = 0;
        self.try_inject();
    }

    /// The textbox once it is laid out. The send button only has to exist:
    /// widgets may pin it with `position: fixed` or hide it until text arrives.
    fn delivery_target(&self) -> Option<(H::Node, H::Node)> {
        let textbox = self.cache.cloned(ElementSlot::MessageInput)?;
        let send = self.cache.cloned(ElementSlot::SendButton)?;
        is_rendered(Some(&self.host.layout_probe(&textbox))).then_some((textbox, send))
    }

    pub(super) fn try_inject(&mut self) {
        let Some(payload) = self.state.pending_payload.clone() else {
            return;
        };
        self.refresh_cache();
        let Some((textbox, _)) = self.delivery_target() else {
            self.state.delivery_attempts += 1;
            if self.state.delivery_attempts < self.config.form.input_wait_attempts {
                self.schedule(TimerSlot::DeliveryInject, self.config.form.input_wait());
            } else {
                warn!(
                    attempts = self.state.delivery_attempts,
                    "message input never became visible, intake payload not delivered"
                );
                self.state.pending_payload = None;
            }
            return;
        };

        if let Err(error) = self.host.force_input_value(&textbox, &payload) {
            contain("delivery", Err(error));
            self.state.pending_payload = None;
            return;
        }
        if let Err(error) = self.host.persist_form_submitted() {
            warn!(%error, "could not persist the submitted flag");
        }
        self.state.form_submitted = true;
        self.schedule(TimerSlot::DeliveryFormSubmit, DELIVERY_STEP);
    }

    fn payload_still_pending(&self, textbox: &H::Node) -> bool {
        self.state
            .pending_payload
            .as_deref()
            .is_some_and(|payload| self.host.input_value(textbox) == payload)
    }

    pub(super) fn deliver_form_submit(&mut self) {
        let Some(textbox) = self.cache.cloned(ElementSlot::MessageInput) else {
            return;
        };
        match self.host.dispatch_form_submit(&textbox) {
            Ok(true) => debug!("dispatched submit on the widget form"),
            Ok(false) => debug!("message input has no form"),
            Err(error) => contain("delivery", Err(error)),
        }
        self.schedule(TimerSlot::DeliveryClick, DELIVERY_STEP);
        self.schedule(TimerSlot::DeliveryEnter, DELIVERY_STEP * 2);
        self.schedule(TimerSlot::DeliveryVerify, DELIVERY_STEP * 4);
    }

    pub(super) fn deliver_click(&mut self) {
        let (Some(textbox), Some(send)) = (
            self.cache.cloned(ElementSlot::MessageInput),
            self.cache.cloned(ElementSlot::SendButton),
        ) else {
            return;
        };
        if self.payload_still_pending(&textbox) {
            contain("delivery", self.host.dispatch_click(&send));
        }
    }

    pub(super) fn deliver_enter(&mut self) {
        let Some(textbox) = self.cache.cloned(ElementSlot::MessageInput) else {
            return;
        };
        if self.payload_still_pending(&textbox) {
            contain("delivery", self.host.dispatch_enter(&textbox));
        }
    }

    pub(super) fn verify_delivery(&mut self) {
        let drained = match self.cache.get(ElementSlot::MessageInput) {
            Some(textbox) => !self.payload_still_pending(textbox),
            None => false,
        };
        if drained {
            info!("intake payload delivered");
        } else {
            info!("intake payload still in the message input, delivery unconfirmed");
        }
        self.state.pending_payload = None;
    }

    /// Shows only the visitor's message for echoed intake payloads.
    pub(super) fn clean_transcript(&mut self) -> Result<(), HostError> {
        for message in self.host.user_message_nodes() {
            if message.processed {
                continue;
            }
            if let Some(visible) = extract_visible_message(&message.text) {
                self.host.show_visible_message(&message.node, &visible)?;
            }
        }
        Ok(())
    }

    pub(super) fn apply_greeting(&mut self) -> Result<(), HostError> {
        let greeting = &self.config.greeting;
        if !greeting.is_configured() {
            return Ok(());
        }
        for block in self.host.greeting_nodes() {
            if block.processed {
                continue;
            }
            self.host.render_greeting(
                &block.node,
                greeting.title.as_deref(),
                greeting.body.as_deref(),
            )?;
        }
        Ok(())
    }
}
