use tracing::{debug, info};

use super::{Enhancer, contain};
use crate::cache::ElementSlot;
use crate::disclaimer::plan_annotations;
use crate::error::HostError;
use crate::host::{Host, TimerSlot};
use crate::visibility::is_chat_open;

impl<H: Host> Enhancer<H> {
    pub(super) fn start(&mut self) {
        info!("chat enhancer starting");
        self.reload_submitted_flag();
        self.poll_widget();
    }

    pub(super) fn chat_is_open(&self) -> bool {
        let probe = self
            .cache
            .get(ElementSlot::ChatContainer)
            .map(|container| self.host.layout_probe(container));
        is_chat_open(probe.as_ref())
    }

    /// Waits for the launcher to exist before arming the per-widget features.
    pub(super) fn poll_widget(&mut self) {
        self.refresh_cache();
        if !self.cache.contains(ElementSlot::LauncherContainer) {
            self.schedule(
                TimerSlot::WidgetPoll,
                self.config.watcher.widget_check_interval(),
            );
            return;
        }

        self.state.widget_ready = true;
        self.ensure_launcher_bound();
        let commands = self.popup.on_launcher_present(&self.config.popup);
        self.apply_popup(commands);
        if self.config.disclaimer.enabled {
            self.sweep_disclaimers();
        }

        if self.chat_is_open() {
            self.state.chat_open = true;
            self.on_chat_opened();
        }
        info!("widget detected, enhancements armed");
    }

    pub(super) fn ensure_launcher_bound(&mut self) {
        if self.state.launcher_bound {
            return;
        }
        let Some(launcher) = self.cache.cloned(ElementSlot::LauncherButton) else {
            return;
        };
        match self.host.bind_launcher(&launcher) {
            Ok(()) => self.state.launcher_bound = true,
            Err(error) => contain("popup", Err(error)),
        }
    }

    /// One debounced mutation batch.
    pub(super) fn process_mutations(&mut self) {
        let was_open = self.state.chat_open;
        self.refresh_cache();
        self.ensure_launcher_bound();
        let open = self.chat_is_open();
        self.state.chat_open = open;

        if open && !was_open {
            debug!("chat window opened");
            self.on_chat_opened();
        } else if !open && was_open {
            debug!("chat window closed");
            self.on_chat_closed();
        }

        if open {
            self.enforce_single_form();
            let result = self.annotate_disclaimers();
            contain("disclaimer", result);
            let result = self.clean_transcript();
            contain("transcript", result);
            let result = self.apply_greeting();
            contain("greeting", result);
        }

        let result = self.bind_reset_buttons();
        contain("reset", result);
    }

    fn on_chat_opened(&mut self) {
        if !self.state.chat_initialized {
            self.state.chat_initialized = true;
            self.open_intake_form();
        }
        let result = self.install_close_button();
        contain("close", result);
    }

    fn on_chat_closed(&mut self) {
        self.close_button = None;
        for slot in ElementSlot::WINDOW_INTERIOR {
            self.cache.clear(slot);
        }
        if !self.state.form_submitted {
            self.state.chat_initialized = false;
            self.discard_intake_form();
        }
    }

    pub(super) fn sweep_disclaimers(&mut self) {
        if !self.config.disclaimer.enabled {
            return;
        }
        let result = self.annotate_disclaimers();
        contain("disclaimer", result);
        self.schedule(
            TimerSlot::DisclaimerSweep,
            self.config.disclaimer.check_interval(),
        );
    }

    fn annotate_disclaimers(&mut self) -> Result<(), HostError> {
        if !self.config.disclaimer.enabled {
            return Ok(());
        }
        let timestamps = self.host.timestamp_nodes();
        for (node, text) in plan_annotations(&timestamps, &self.config.disclaimer.text) {
            self.host.set_text(&node, &text)?;
        }
        Ok(())
    }
}
