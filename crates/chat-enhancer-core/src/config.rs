use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::intake::FormField;

pub const DEFAULT_SESSION_KEY: &str = "watson_form_submitted";
pub const DEFAULT_POPUP_COOKIE: &str = "watson_chat_popup_shown";
pub const DEFAULT_DISCLAIMER: &str = " - This chatbot is powered by AI. It's here to help, but it might not always get things right. For anything important, double-check with our team.";

pub const DEFAULT_POPUP_MESSAGES: [&str; 20] = [
    "Looking for advice? We've got it.",
    "Got a brand challenge? Let's talk.",
    "Ready to break through the noise?",
    "What's your next big move?",
    "Strategy starts with a conversation.",
    "Tell us what's keeping you up at night.",
    "Every breakthrough starts with a question.",
    "What change are you trying to create?",
    "Ready to move beyond ordinary?",
    "Let's figure this out together.",
    "What's your brand's untold story?",
    "Skip the small talk. What's the real challenge?",
    "Ready for a different kind of agency conversation?",
    "What if your brand could do more?",
    "Let's cut through the clutter.",
    "Got 2 minutes to explore what's possible?",
    "Ready to turn curiosity into clarity?",
    "Let's talk about what matters.",
    "What's your vision? Let's make it real.",
    "Every transformation starts here.",
];

/// Complete runtime configuration.
///
/// Every section defaults independently, so a page can override a single
/// value (for example `{"popup": {"max_per_session": 3}}`) and keep the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancerConfig {
    pub widget: WidgetContract,
    pub popup: PopupConfig,
    pub disclaimer: DisclaimerConfig,
    pub form: FormConfig,
    pub reset: ResetConfig,
    pub watcher: WatcherConfig,
    pub session: SessionConfig,
    pub greeting: GreetingConfig,
    pub log_level: String,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            widget: WidgetContract::default(),
            popup: PopupConfig::default(),
            disclaimer: DisclaimerConfig::default(),
            form: FormConfig::default(),
            reset: ResetConfig::default(),
            watcher: WatcherConfig::default(),
            session: SessionConfig::default(),
            greeting: GreetingConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl EnhancerConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|error| ConfigError::Parse(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let identifiers = [
            ("chat_container_id", &self.widget.chat_container_id),
            ("launcher_button_id", &self.widget.launcher_button_id),
            ("launcher_container_id", &self.widget.launcher_container_id),
            ("message_input_id", &self.widget.message_input_id),
            ("send_button_id", &self.widget.send_button_id),
            ("history_id", &self.widget.history_id),
        ];
        for (name, value) in identifiers {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyIdentifier(name));
            }
        }
        if self.popup.messages.iter().all(|message| message.trim().is_empty()) {
            return Err(ConfigError::NoPopupMessages);
        }
        if self.popup.max_per_session == 0 {
            return Err(ConfigError::ZeroPopupCap);
        }
        if self.watcher.debounce_ms == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        if self.session.form_submitted_key.trim().is_empty() {
            return Err(ConfigError::EmptySessionKey);
        }
        match self.log_level.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" | "off" => Ok(()),
            _ => Err(ConfigError::UnknownLogLevel(self.log_level.clone())),
        }
    }
}

/// Identifiers and selectors owned by the third-party widget.
///
/// Any change on the widget side is a breaking dependency; keeping them in
/// config lets a page patch them without a rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetContract {
    pub chat_container_id: String,
    pub launcher_button_id: String,
    pub launcher_container_id: String,
    pub message_input_id: String,
    pub send_button_id: String,
    pub history_id: String,
    pub timestamp_selector: String,
    pub message_block_selector: String,
    pub assistant_marker_selector: String,
    pub user_message_selector: String,
    pub greeting_selector: String,
    pub close_button_selector: String,
    pub reset_button_selector: String,
    pub close_label: String,
    pub reset_label: String,
}

impl Default for WidgetContract {
    fn default() -> Self {
        Self {
            chat_container_id: "anything-llm-chat".to_string(),
            launcher_button_id: "anything-llm-embed-chat-button".to_string(),
            launcher_container_id: "anything-llm-embed-chat-button-container".to_string(),
            message_input_id: "message-input".to_string(),
            send_button_id: "send-message-button".to_string(),
            history_id: "chat-history".to_string(),
            timestamp_selector:
                ".allm-font-sans.allm-text-\\[10px\\].allm-text-gray-400.allm-text-left".to_string(),
            message_block_selector: ".allm-py-\\[5px\\]".to_string(),
            assistant_marker_selector: ".allm-anything-llm-assistant-message".to_string(),
            user_message_selector: ".allm-anything-llm-user-message p".to_string(),
            greeting_selector:
                ".allm-text-slate-400.allm-text-sm.allm-font-sans.allm-py-4.allm-text-center"
                    .to_string(),
            close_button_selector: "button.allm-h-fit.allm-px-0.hover\\:allm-cursor-pointer.allm-border-none.allm-text-sm.allm-bg-transparent.hover\\:allm-opacity-80.hover\\:allm-underline".to_string(),
            reset_button_selector: "button.allm-h-fit.allm-px-0.hover\\:allm-cursor-pointer.allm-border-none.allm-text-sm.allm-bg-transparent".to_string(),
            close_label: "Close Chat".to_string(),
            reset_label: "Reset Chat".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    pub enabled: bool,
    pub initial_delay_ms: u64,
    pub appear_delay_ms: u64,
    pub typing_start_delay_ms: u64,
    pub letter_interval_ms: u64,
    pub auto_hide_ms: u64,
    pub hide_animation_ms: u64,
    pub next_popup_delay_ms: u64,
    pub max_per_session: u32,
    pub use_cookie_limit: bool,
    pub cookie_name: String,
    pub cookie_days: u32,
    pub messages: Vec<String>,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay_ms: 2_000,
            appear_delay_ms: 50,
            typing_start_delay_ms: 300,
            letter_interval_ms: 10,
            auto_hide_ms: 10_000,
            hide_animation_ms: 300,
            next_popup_delay_ms: 20_000,
            max_per_session: 8,
            use_cookie_limit: false,
            cookie_name: DEFAULT_POPUP_COOKIE.to_string(),
            cookie_days: 1,
            messages: DEFAULT_POPUP_MESSAGES
                .iter()
                .map(|message| (*message).to_string())
                .collect(),
        }
    }
}

impl PopupConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn appear_delay(&self) -> Duration {
        Duration::from_millis(self.appear_delay_ms)
    }

    pub fn typing_start_delay(&self) -> Duration {
        Duration::from_millis(self.typing_start_delay_ms)
    }

    pub fn letter_interval(&self) -> Duration {
        Duration::from_millis(self.letter_interval_ms)
    }

    pub fn auto_hide(&self) -> Duration {
        Duration::from_millis(self.auto_hide_ms)
    }

    pub fn hide_animation(&self) -> Duration {
        Duration::from_millis(self.hide_animation_ms)
    }

    pub fn next_popup_delay(&self) -> Duration {
        Duration::from_millis(self.next_popup_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisclaimerConfig {
    pub enabled: bool,
    pub text: String,
    pub check_interval_ms: u64,
}

impl Default for DisclaimerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            text: DEFAULT_DISCLAIMER.to_string(),
            check_interval_ms: 1_000,
        }
    }
}

impl DisclaimerConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }
}

/// Per-field switches for the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSettings {
    pub enabled: bool,
    pub required: bool,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self::optional()
    }
}

impl FieldSettings {
    pub const fn required() -> Self {
        Self {
            enabled: true,
            required: true,
        }
    }

    pub const fn optional() -> Self {
        Self {
            enabled: true,
            required: false,
        }
    }

    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            required: false,
        }
    }

    /// A disabled field can never gate submission.
    pub const fn gates(self) -> bool {
        self.enabled && self.required
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormFields {
    pub first_name: FieldSettings,
    pub last_name: FieldSettings,
    pub title: FieldSettings,
    pub email: FieldSettings,
    pub phone: FieldSettings,
    pub company: FieldSettings,
    pub message: FieldSettings,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            first_name: FieldSettings::required(),
            last_name: FieldSettings::required(),
            title: FieldSettings::optional(),
            email: FieldSettings::required(),
            phone: FieldSettings::optional(),
            company: FieldSettings::optional(),
            message: FieldSettings::optional(),
        }
    }
}

impl FormFields {
    pub fn settings(&self, field: FormField) -> FieldSettings {
        match field {
            FormField::FirstName => self.first_name,
            FormField::LastName => self.last_name,
            FormField::Title => self.title,
            FormField::Email => self.email,
            FormField::Phone => self.phone,
            FormField::Company => self.company,
            FormField::Message => self.message,
        }
    }

    pub fn has_gating_fields(&self) -> bool {
        FormField::ALL
            .iter()
            .any(|field| *field != FormField::Message && self.settings(*field).gates())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub active: bool,
    pub fields: FormFields,
    pub append_client_context: bool,
    pub open_delay_ms: u64,
    pub open_retry_ms: u64,
    pub open_attempts: u32,
    pub gate_debounce_ms: u64,
    pub submit_delay_ms: u64,
    pub input_wait_ms: u64,
    pub input_wait_attempts: u32,
    pub submit_label: String,
    pub message_placeholder: String,
    pub required_note: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            active: true,
            fields: FormFields::default(),
            append_client_context: false,
            open_delay_ms: 100,
            open_retry_ms: 500,
            open_attempts: 20,
            gate_debounce_ms: 100,
            submit_delay_ms: 200,
            input_wait_ms: 100,
            input_wait_attempts: 50,
            submit_label: "Start Conversation".to_string(),
            message_placeholder: "Tell us about your project...".to_string(),
            required_note: "* Required fields must be filled before starting a conversation."
                .to_string(),
        }
    }
}

impl FormConfig {
    pub fn open_delay(&self) -> Duration {
        Duration::from_millis(self.open_delay_ms)
    }

    pub fn open_retry(&self) -> Duration {
        Duration::from_millis(self.open_retry_ms)
    }

    pub fn gate_debounce(&self) -> Duration {
        Duration::from_millis(self.gate_debounce_ms)
    }

    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }

    pub fn input_wait(&self) -> Duration {
        Duration::from_millis(self.input_wait_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetConfig {
    pub settle_delay_ms: u64,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 500,
        }
    }
}

impl ResetConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub debounce_ms: u64,
    pub widget_check_interval_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            widget_check_interval_ms: 500,
        }
    }
}

impl WatcherConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn widget_check_interval(&self) -> Duration {
        Duration::from_millis(self.widget_check_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub form_submitted_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            form_submitted_key: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

/// Optional replacement copy for the widget's greeting block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreetingConfig {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl GreetingConfig {
    pub fn is_configured(&self) -> bool {
        self.title.as_deref().is_some_and(|title| !title.trim().is_empty())
            || self.body.as_deref().is_some_and(|body| !body.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(EnhancerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config = EnhancerConfig::from_json(
            r#"{"popup": {"max_per_session": 3}, "form": {"fields": {"phone": {"required": true}}}}"#,
        )
        .unwrap();
        assert_eq!(config.popup.max_per_session, 3);
        assert_eq!(config.popup.initial_delay_ms, 2_000);
        assert_eq!(config.popup.messages.len(), DEFAULT_POPUP_MESSAGES.len());
        assert_eq!(config.form.fields.phone, FieldSettings::required());
        assert_eq!(config.form.fields.email, FieldSettings::required());
        assert_eq!(config.widget.chat_container_id, "anything-llm-chat");
    }

    #[test]
    fn rejects_unusable_values() {
        assert_eq!(
            EnhancerConfig::from_json(r#"{"popup": {"max_per_session": 0}}"#),
            Err(ConfigError::ZeroPopupCap)
        );
        assert_eq!(
            EnhancerConfig::from_json(r#"{"popup": {"messages": ["  "]}}"#),
            Err(ConfigError::NoPopupMessages)
        );
        assert_eq!(
            EnhancerConfig::from_json(r#"{"widget": {"send_button_id": ""}}"#),
            Err(ConfigError::EmptyIdentifier("send_button_id"))
        );
        assert_eq!(
            EnhancerConfig::from_json(r#"{"log_level": "loud"}"#),
            Err(ConfigError::UnknownLogLevel("loud".to_string()))
        );
        assert!(matches!(
            EnhancerConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn gating_fields_ignore_message_and_disabled_fields() {
        let mut fields = FormFields::default();
        assert!(fields.has_gating_fields());

        fields.first_name = FieldSettings::disabled();
        fields.last_name = FieldSettings::optional();
        fields.email = FieldSettings {
            enabled: false,
            required: true,
        };
        fields.message = FieldSettings::required();
        assert!(!fields.has_gating_fields());
    }

    #[test]
    fn greeting_override_needs_visible_copy() {
        assert!(!GreetingConfig::default().is_configured());
        let greeting = GreetingConfig {
            title: Some("  ".to_string()),
            body: Some("Ask us anything.".to_string()),
        };
        assert!(greeting.is_configured());
    }
}
