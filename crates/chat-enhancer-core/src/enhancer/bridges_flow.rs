use tracing::{debug, info, warn};

use super::{Enhancer, contain};
use crate::bridges::{RESET_MARKER, close_target, unbound_reset_buttons};
use crate::cache::ElementSlot;
use crate::error::HostError;
use crate::host::{ButtonScope, Host, TimerSlot};

const DELIVERY_SLOTS: [TimerSlot; 6] = [
    TimerSlot::SubmitDelay,
    TimerSlot::DeliveryInject,
    TimerSlot::DeliveryFormSubmit,
    TimerSlot::DeliveryClick,
    TimerSlot::DeliveryEnter,
    TimerSlot::DeliveryVerify,
];

impl<H: Host> Enhancer<H> {
    pub(super) fn install_close_button(&mut self) -> Result<(), HostError> {
        if self.close_button.is_some() {
            return Ok(());
        }
        let Some(container) = self.cache.cloned(ElementSlot::ChatContainer) else {
            return Ok(());
        };
        self.close_button = Some(self.host.ensure_close_button(&container)?);
        Ok(())
    }

    pub(super) fn close_chat(&mut self) {
        if !self.state.form_submitted {
            self.state.chat_initialized = false;
            self.discard_intake_form();
        }

        let label = self.config.widget.close_label.clone();
        let target = close_target(
            &self.host.buttons(ButtonScope::CloseSignature),
            &self.host.buttons(ButtonScope::Everywhere),
            &label,
        );
        match target {
            Some(button) => contain("close", self.host.click(&button)),
            None => debug!("native close button not found"),
        }
    }

    /// Forgets the submission and any intake form in flight.
    pub(super) fn reset_intake_state(&mut self) {
        if let Err(error) = self.host.clear_form_submitted() {
            warn!(%error, "could not clear the submitted flag");
        }
        self.state.form_submitted = false;
        self.state.chat_initialized = false;
        self.state.pending_payload = None;
        for slot in DELIVERY_SLOTS {
            self.cancel(slot);
        }
        self.discard_intake_form();
    }

    pub(super) fn on_reset_clicked(&mut self) {
        info!("widget chat reset");
        self.reset_intake_state();
        self.schedule(TimerSlot::ResetSettle, self.config.reset.settle_delay());
    }

    pub(super) fn on_reset_settled(&mut self) {
        self.refresh_cache();
        if self.chat_is_open() {
            self.state.chat_initialized = true;
            self.open_intake_form();
        }
    }

    pub(super) fn bind_reset_buttons(&mut self) -> Result<(), HostError> {
        let buttons = self.host.buttons(ButtonScope::ResetSignature);
        for button in unbound_reset_buttons(&buttons, &self.config.widget.reset_label) {
            self.host.bind_reset_button(&button, RESET_MARKER)?;
            debug!("reset button bound");
        }
        Ok(())
    }
}
