use std::collections::VecDeque;

use tracing::debug;

use super::{Enhancer, contain};
use crate::cache::ElementSlot;
use crate::error::HostError;
use crate::host::Host;
use crate::popup::PopupCommand;

impl<H: Host> Enhancer<H> {
    fn popup_marker_present(&self) -> bool {
        self.config.popup.use_cookie_limit
            && self.host.popup_marker_present(&self.config.popup.cookie_name)
    }

    pub(super) fn on_popup_first(&mut self) {
        let marker = self.popup_marker_present();
        let roll = self.host.random_roll();
        let commands = self.popup.on_first_fired(&self.config.popup, marker, roll);
        if commands.is_empty() {
            debug!("first popup suppressed");
        }
        self.apply_popup(commands);
    }

    pub(super) fn on_popup_next(&mut self) {
        let marker = self.popup_marker_present();
        let roll = self.host.random_roll();
        let commands = self.popup.on_next_fired(&self.config.popup, marker, roll);
        if commands.is_empty() {
            debug!(
                shown = self.popup.shown_this_session(),
                "popup chain finished"
            );
        }
        self.apply_popup(commands);
    }

    pub(super) fn on_launcher_clicked(&mut self) {
        let commands = self.popup.on_launcher_clicked(&self.config.popup);
        self.apply_popup(commands);
    }

    pub(super) fn on_document_clicked(&mut self, inside_launcher: bool) {
        let commands = self
            .popup
            .on_document_click(&self.config.popup, inside_launcher);
        self.apply_popup(commands);
    }

    pub(super) fn apply_popup(&mut self, commands: Vec<PopupCommand>) {
        let mut queue: VecDeque<PopupCommand> = commands.into();
        while let Some(command) = queue.pop_front() {
            let result = self.run_popup_command(command, &mut queue);
            contain("popup", result);
        }
    }

    fn run_popup_command(
        &mut self,
        command: PopupCommand,
        queue: &mut VecDeque<PopupCommand>,
    ) -> Result<(), HostError> {
        match command {
            PopupCommand::Schedule(slot, delay) => self.schedule(slot, delay),
            PopupCommand::Cancel(slot) => self.cancel(slot),
            PopupCommand::Mount => {
                let Some(container) = self.cache.cloned(ElementSlot::LauncherContainer) else {
                    self.popup.on_mount_failed();
                    return Ok(());
                };
                match self.host.mount_bubble(&container) {
                    Ok(bubble) => {
                        self.bubble = Some(bubble);
                        queue.extend(self.popup.on_mounted(&self.config.popup));
                        debug!(shown = self.popup.shown_this_session(), "popup shown");
                    }
                    Err(error) => {
                        self.popup.on_mount_failed();
                        return Err(error);
                    }
                }
            }
            PopupCommand::Reveal => {
                if let Some(bubble) = &self.bubble {
                    self.host.reveal_bubble(bubble)?;
                }
            }
            PopupCommand::Type {
                text,
                letter_interval,
            } => {
                if let Some(bubble) = &self.bubble {
                    self.host.type_bubble_text(bubble, &text, letter_interval)?;
                }
            }
            PopupCommand::ArmOutsideClick => self.host.arm_outside_click()?,
            PopupCommand::DisarmOutsideClick => self.host.disarm_outside_click(),
            PopupCommand::Fade => {
                if let Some(bubble) = &self.bubble {
                    self.host.fade_bubble(bubble)?;
                }
            }
            PopupCommand::Remove => {
                if let Some(bubble) = self.bubble.take() {
                    self.host.remove_node(&bubble);
                }
            }
            PopupCommand::WriteMarker => {
                let popup = &self.config.popup;
                self.host
                    .write_popup_marker(&popup.cookie_name, popup.cookie_days)?;
            }
        }
        Ok(())
    }
}
