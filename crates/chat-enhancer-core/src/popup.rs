//! Promotional bubble lifecycle.
//!
//! The scheduler is pure: each input returns the commands the enhancer must
//! carry out against the host, in order.

use std::time::Duration;

use serde::Serialize;

use crate::config::PopupConfig;
use crate::host::TimerSlot;

pub const POPUP_ID: &str = "watson-chat-popup";
pub const POPUP_CLASS: &str = "watson-chat-popup";
pub const POPUP_VISIBLE_CLASS: &str = "watson-popup-visible";
pub const POPUP_HIDING_CLASS: &str = "watson-popup-hiding";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopupPhase {
    Idle,
    Scheduled,
    Mounting,
    Showing,
    Hiding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupCommand {
    Schedule(TimerSlot, Duration),
    Cancel(TimerSlot),
    /// Create the bubble in the launcher container. The caller reports back
    /// through [`PopupScheduler::on_mounted`] or [`PopupScheduler::on_mount_failed`].
    Mount,
    Reveal,
    Type { text: String, letter_interval: Duration },
    ArmOutsideClick,
    DisarmOutsideClick,
    Fade,
    Remove,
    WriteMarker,
}

/// Picks `messages[floor(roll * len)]`, skipping blank entries.
pub fn pick_message(messages: &[String], roll: f64) -> Option<&str> {
    let candidates: Vec<&str> = messages
        .iter()
        .map(String::as_str)
        .filter(|message| !message.trim().is_empty())
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let roll = if roll.is_finite() { roll.clamp(0.0, 1.0) } else { 0.0 };
    let index = ((roll * candidates.len() as f64).floor() as usize).min(candidates.len() - 1);
    candidates.get(index).copied()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupScheduler {
    phase: PopupPhase,
    shown_this_session: u32,
    continuous_mode: bool,
    first_scheduled: bool,
    message: Option<String>,
}

impl Default for PopupScheduler {
    fn default() -> Self {
        Self {
            phase: PopupPhase::Idle,
            shown_this_session: 0,
            continuous_mode: false,
            first_scheduled: false,
            message: None,
        }
    }
}

impl PopupScheduler {
    pub fn phase(&self) -> PopupPhase {
        self.phase
    }

    pub fn shown_this_session(&self) -> u32 {
        self.shown_this_session
    }

    pub fn continuous_mode(&self) -> bool {
        self.continuous_mode
    }

    pub fn bubble_exists(&self) -> bool {
        matches!(self.phase, PopupPhase::Showing | PopupPhase::Hiding)
    }

    pub fn should_show(&self, config: &PopupConfig, marker_present: bool) -> bool {
        config.enabled
            && self.shown_this_session < config.max_per_session
            && !(config.use_cookie_limit && marker_present)
    }

    /// Arms the first popup the first time the launcher container is seen.
    pub fn on_launcher_present(&mut self, config: &PopupConfig) -> Vec<PopupCommand> {
        if self.first_scheduled || !config.enabled {
            return Vec::new();
        }
        self.first_scheduled = true;
        self.phase = PopupPhase::Scheduled;
        vec![PopupCommand::Schedule(
            TimerSlot::PopupFirst,
            config.initial_delay(),
        )]
    }

    pub fn on_first_fired(
        &mut self,
        config: &PopupConfig,
        marker_present: bool,
        roll: f64,
    ) -> Vec<PopupCommand> {
        if self.phase != PopupPhase::Scheduled {
            return Vec::new();
        }
        if !self.should_show(config, marker_present) {
            self.phase = PopupPhase::Idle;
            return Vec::new();
        }
        self.continuous_mode = true;
        self.begin_show(config, roll)
    }

    pub fn on_next_fired(
        &mut self,
        config: &PopupConfig,
        marker_present: bool,
        roll: f64,
    ) -> Vec<PopupCommand> {
        if self.phase != PopupPhase::Scheduled {
            return Vec::new();
        }
        if !self.continuous_mode || !self.should_show(config, marker_present) {
            self.phase = PopupPhase::Idle;
            return Vec::new();
        }
        self.begin_show(config, roll)
    }

    fn begin_show(&mut self, config: &PopupConfig, roll: f64) -> Vec<PopupCommand> {
        let Some(message) = pick_message(&config.messages, roll) else {
            self.phase = PopupPhase::Idle;
            return Vec::new();
        };
        self.message = Some(message.to_string());
        self.phase = PopupPhase::Mounting;
        vec![PopupCommand::Mount]
    }

    pub fn on_mounted(&mut self, config: &PopupConfig) -> Vec<PopupCommand> {
        if self.phase != PopupPhase::Mounting {
            return Vec::new();
        }
        self.phase = PopupPhase::Showing;
        self.shown_this_session += 1;

        let mut commands = vec![
            PopupCommand::Schedule(TimerSlot::PopupReveal, config.appear_delay()),
            PopupCommand::Schedule(TimerSlot::PopupTyping, config.typing_start_delay()),
            PopupCommand::ArmOutsideClick,
            PopupCommand::Schedule(TimerSlot::PopupAutoHide, config.auto_hide()),
        ];
        if config.use_cookie_limit {
            commands.push(PopupCommand::WriteMarker);
        }
        commands
    }

    pub fn on_mount_failed(&mut self) {
        if self.phase == PopupPhase::Mounting {
            self.phase = PopupPhase::Idle;
            self.message = None;
        }
    }

    pub fn on_reveal_fired(&self) -> Vec<PopupCommand> {
        if self.phase == PopupPhase::Showing {
            vec![PopupCommand::Reveal]
        } else {
            Vec::new()
        }
    }

    pub fn on_typing_fired(&self, config: &PopupConfig) -> Vec<PopupCommand> {
        match (&self.message, self.phase) {
            (Some(text), PopupPhase::Showing) => vec![PopupCommand::Type {
                text: text.clone(),
                letter_interval: config.letter_interval(),
            }],
            _ => Vec::new(),
        }
    }

    pub fn on_auto_hide_fired(&mut self, config: &PopupConfig) -> Vec<PopupCommand> {
        self.hide(config)
    }

    pub fn on_document_click(
        &mut self,
        config: &PopupConfig,
        inside_launcher: bool,
    ) -> Vec<PopupCommand> {
        if inside_launcher {
            return Vec::new();
        }
        self.hide(config)
    }

    fn hide(&mut self, config: &PopupConfig) -> Vec<PopupCommand> {
        if self.phase != PopupPhase::Showing {
            return Vec::new();
        }
        self.phase = PopupPhase::Hiding;
        vec![
            PopupCommand::Cancel(TimerSlot::PopupAutoHide),
            PopupCommand::Cancel(TimerSlot::PopupReveal),
            PopupCommand::Cancel(TimerSlot::PopupTyping),
            PopupCommand::DisarmOutsideClick,
            PopupCommand::Fade,
            PopupCommand::Schedule(TimerSlot::PopupHideDone, config.hide_animation()),
        ]
    }

    pub fn on_hide_done(&mut self, config: &PopupConfig) -> Vec<PopupCommand> {
        if self.phase != PopupPhase::Hiding {
            return Vec::new();
        }
        self.message = None;
        let mut commands = vec![PopupCommand::Remove];
        if self.continuous_mode {
            self.phase = PopupPhase::Scheduled;
            commands.push(PopupCommand::Schedule(
                TimerSlot::PopupNext,
                config.next_popup_delay(),
            ));
        } else {
            self.phase = PopupPhase::Idle;
        }
        commands
    }

    /// The visitor engaged with the widget: no more popups this page view.
    pub fn on_launcher_clicked(&mut self, config: &PopupConfig) -> Vec<PopupCommand> {
        self.continuous_mode = false;
        let mut commands = vec![
            PopupCommand::Cancel(TimerSlot::PopupFirst),
            PopupCommand::Cancel(TimerSlot::PopupNext),
        ];
        if config.use_cookie_limit {
            commands.push(PopupCommand::WriteMarker);
        }
        match self.phase {
            PopupPhase::Showing => commands.extend(self.hide(config)),
            PopupPhase::Scheduled => self.phase = PopupPhase::Idle,
            PopupPhase::Idle | PopupPhase::Mounting | PopupPhase::Hiding => {}
        }
        commands
    }

    pub fn stop(&mut self) -> Vec<PopupCommand> {
        let had_bubble = self.bubble_exists();
        self.continuous_mode = false;
        self.phase = PopupPhase::Idle;
        self.message = None;

        let mut commands: Vec<PopupCommand> = TimerSlot::POPUP
            .iter()
            .map(|slot| PopupCommand::Cancel(*slot))
            .collect();
        commands.push(PopupCommand::DisarmOutsideClick);
        if had_bubble {
            commands.push(PopupCommand::Remove);
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(list: &[&str]) -> Vec<String> {
        list.iter().map(|message| (*message).to_string()).collect()
    }

    fn show(scheduler: &mut PopupScheduler, config: &PopupConfig) {
        assert_eq!(scheduler.on_first_fired(config, false, 0.0), vec![PopupCommand::Mount]);
        scheduler.on_mounted(config);
    }

    #[test]
    fn picks_messages_by_roll() {
        let list = messages(&["a", "b", "c", "d"]);
        assert_eq!(pick_message(&list, 0.0), Some("a"));
        assert_eq!(pick_message(&list, 0.49), Some("b"));
        assert_eq!(pick_message(&list, 0.999), Some("d"));
        assert_eq!(pick_message(&list, 1.0), Some("d"));
        assert_eq!(pick_message(&list, f64::NAN), Some("a"));
        assert_eq!(pick_message(&messages(&[" ", "only"]), 0.0), Some("only"));
        assert_eq!(pick_message(&messages(&[]), 0.5), None);
    }

    #[test]
    fn first_popup_is_armed_once() {
        let config = PopupConfig::default();
        let mut scheduler = PopupScheduler::default();
        assert_eq!(
            scheduler.on_launcher_present(&config),
            vec![PopupCommand::Schedule(
                TimerSlot::PopupFirst,
                Duration::from_secs(2)
            )]
        );
        assert!(scheduler.on_launcher_present(&config).is_empty());
        assert_eq!(scheduler.phase(), PopupPhase::Scheduled);
    }

    #[test]
    fn mounted_bubble_schedules_its_lifecycle() {
        let config = PopupConfig::default();
        let mut scheduler = PopupScheduler::default();
        scheduler.on_launcher_present(&config);
        assert_eq!(
            scheduler.on_first_fired(&config, false, 0.0),
            vec![PopupCommand::Mount]
        );
        assert!(scheduler.continuous_mode());

        let commands = scheduler.on_mounted(&config);
        assert_eq!(
            commands,
            vec![
                PopupCommand::Schedule(TimerSlot::PopupReveal, Duration::from_millis(50)),
                PopupCommand::Schedule(TimerSlot::PopupTyping, Duration::from_millis(300)),
                PopupCommand::ArmOutsideClick,
                PopupCommand::Schedule(TimerSlot::PopupAutoHide, Duration::from_secs(10)),
            ]
        );
        assert_eq!(scheduler.shown_this_session(), 1);
        assert_eq!(
            scheduler.on_typing_fired(&config),
            vec![PopupCommand::Type {
                text: DEFAULT_FIRST.to_string(),
                letter_interval: Duration::from_millis(10),
            }]
        );
    }

    const DEFAULT_FIRST: &str = crate::config::DEFAULT_POPUP_MESSAGES[0];

    #[test]
    fn hide_then_continue_in_continuous_mode() {
        let config = PopupConfig::default();
        let mut scheduler = PopupScheduler::default();
        scheduler.on_launcher_present(&config);
        show(&mut scheduler, &config);

        assert!(scheduler.on_document_click(&config, true).is_empty());
        let hide = scheduler.on_document_click(&config, false);
        assert!(hide.contains(&PopupCommand::Fade));
        assert!(hide.contains(&PopupCommand::DisarmOutsideClick));
        assert!(hide.contains(&PopupCommand::Cancel(TimerSlot::PopupAutoHide)));
        assert!(scheduler.on_auto_hide_fired(&config).is_empty());

        assert_eq!(
            scheduler.on_hide_done(&config),
            vec![
                PopupCommand::Remove,
                PopupCommand::Schedule(TimerSlot::PopupNext, Duration::from_secs(20)),
            ]
        );
        assert_eq!(
            scheduler.on_next_fired(&config, false, 0.0),
            vec![PopupCommand::Mount]
        );
    }

    #[test]
    fn session_cap_stops_the_chain() {
        let config = PopupConfig {
            max_per_session: 2,
            ..PopupConfig::default()
        };
        let mut scheduler = PopupScheduler::default();
        scheduler.on_launcher_present(&config);
        show(&mut scheduler, &config);
        for _ in 0..5 {
            scheduler.on_auto_hide_fired(&config);
            scheduler.on_hide_done(&config);
            if scheduler.on_next_fired(&config, false, 0.3).is_empty() {
                break;
            }
            scheduler.on_mounted(&config);
        }
        assert_eq!(scheduler.shown_this_session(), 2);
        assert_eq!(scheduler.phase(), PopupPhase::Idle);
    }

    #[test]
    fn cookie_marker_blocks_only_when_enabled() {
        let mut config = PopupConfig::default();
        let scheduler = PopupScheduler::default();
        assert!(scheduler.should_show(&config, true));
        config.use_cookie_limit = true;
        assert!(!scheduler.should_show(&config, true));
        assert!(scheduler.should_show(&config, false));
    }

    #[test]
    fn launcher_click_is_a_hard_stop() {
        let config = PopupConfig {
            use_cookie_limit: true,
            ..PopupConfig::default()
        };
        let mut scheduler = PopupScheduler::default();
        scheduler.on_launcher_present(&config);
        show(&mut scheduler, &config);

        let commands = scheduler.on_launcher_clicked(&config);
        assert!(commands.contains(&PopupCommand::Cancel(TimerSlot::PopupNext)));
        assert!(commands.contains(&PopupCommand::WriteMarker));
        assert!(commands.contains(&PopupCommand::Fade));
        assert!(!scheduler.continuous_mode());
        assert_eq!(scheduler.on_hide_done(&config), vec![PopupCommand::Remove]);
        assert_eq!(scheduler.phase(), PopupPhase::Idle);
    }

    #[test]
    fn failed_mount_does_not_count() {
        let config = PopupConfig::default();
        let mut scheduler = PopupScheduler::default();
        scheduler.on_launcher_present(&config);
        scheduler.on_first_fired(&config, false, 0.0);
        scheduler.on_mount_failed();
        assert_eq!(scheduler.shown_this_session(), 0);
        assert_eq!(scheduler.phase(), PopupPhase::Idle);
        assert!(scheduler.on_mounted(&config).is_empty());
    }

    #[test]
    fn stop_removes_an_existing_bubble() {
        let config = PopupConfig::default();
        let mut scheduler = PopupScheduler::default();
        scheduler.on_launcher_present(&config);
        show(&mut scheduler, &config);
        let commands = scheduler.stop();
        assert_eq!(commands.last(), Some(&PopupCommand::Remove));
        assert!(!scheduler.bubble_exists());
        assert!(scheduler.stop().iter().all(|command| *command != PopupCommand::Remove));
    }
}
