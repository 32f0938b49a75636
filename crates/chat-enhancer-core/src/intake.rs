//! Intake form model: layout, required-field gating, the outbound payload and
//! the transcript clean-up applied to the payload once the widget echoes it.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{FormConfig, FormFields};

pub const INTAKE_CONTAINER_ID: &str = "watson-intake-form";
pub const INTAKE_FORM_ID: &str = "watson-contact-form";
pub const INPUT_CLASS: &str = "watson-form-input";
pub const REQUIRED_CLASS: &str = "watson-required";
pub const TEXTAREA_CLASS: &str = "watson-form-textarea";
pub const ROW_CLASS: &str = "watson-form-row";
pub const SUBMIT_CLASS: &str = "allm-start-conversation-button";
pub const REQUIRED_NOTE_CLASS: &str = "watson-required-note";
pub const PROCESSED_CLASS: &str = "watson-processed";
pub const SUBMISSION_MESSAGE_CLASS: &str = "watson-form-submission-message";
pub const VISIBLE_MESSAGE_CLASS: &str = "watson-visible-message";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    FirstName,
    LastName,
    Title,
    Email,
    Phone,
    Company,
    Message,
}

impl FormField {
    /// Wire order of the payload.
    pub const ALL: [FormField; 7] = [
        FormField::FirstName,
        FormField::LastName,
        FormField::Title,
        FormField::Email,
        FormField::Phone,
        FormField::Company,
        FormField::Message,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            FormField::FirstName => "first_name",
            FormField::LastName => "last_name",
            FormField::Title => "title",
            FormField::Email => "email",
            FormField::Phone => "phone",
            FormField::Company => "company",
            FormField::Message => "message",
        }
    }

    pub fn element_id(self) -> &'static str {
        match self {
            FormField::FirstName => "first-name",
            FormField::LastName => "last-name",
            FormField::Title => "title",
            FormField::Email => "email",
            FormField::Phone => "phone",
            FormField::Company => "company",
            FormField::Message => "message",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FormField::FirstName => "firstName",
            FormField::LastName => "lastName",
            FormField::Title => "title",
            FormField::Email => "email",
            FormField::Phone => "phone",
            FormField::Company => "company",
            FormField::Message => "message",
        }
    }

    pub fn input_type(self) -> &'static str {
        match self {
            FormField::Email => "email",
            FormField::Phone => "tel",
            FormField::Message => "textarea",
            _ => "text",
        }
    }

    fn label(self) -> &'static str {
        match self {
            FormField::FirstName => "First Name",
            FormField::LastName => "Last Name",
            FormField::Title => "Title",
            FormField::Email => "Email",
            FormField::Phone => "Phone",
            FormField::Company => "Company",
            FormField::Message => "Message",
        }
    }

    fn row(self) -> Option<FormRow> {
        match self {
            FormField::FirstName | FormField::LastName | FormField::Title => Some(FormRow::Name),
            FormField::Email | FormField::Phone | FormField::Company => Some(FormRow::Contact),
            FormField::Message => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormRow {
    Name,
    Contact,
}

impl FormRow {
    pub fn class_name(self) -> &'static str {
        match self {
            FormRow::Name => "watson-form-row watson-name-row",
            FormRow::Contact => "watson-form-row watson-contact-row",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub field: FormField,
    pub placeholder: String,
    pub required: bool,
}

impl FieldSpec {
    pub fn class_name(&self) -> String {
        let mut class = INPUT_CLASS.to_string();
        if self.field == FormField::Message {
            class.push(' ');
            class.push_str(TEXTAREA_CLASS);
        }
        if self.required {
            class.push(' ');
            class.push_str(REQUIRED_CLASS);
        }
        class
    }
}

/// Everything a host needs to render the intake form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntakeLayout {
    pub container_id: &'static str,
    pub form_id: &'static str,
    pub rows: Vec<(FormRow, Vec<FieldSpec>)>,
    pub message: Option<FieldSpec>,
    pub submit_label: String,
    pub submit_class: &'static str,
    pub required_note: Option<String>,
    /// Message field and submit button start enabled only when nothing gates them.
    pub starts_open: bool,
}

impl IntakeLayout {
    pub fn from_config(config: &FormConfig) -> Self {
        let fields = &config.fields;
        let mut rows: Vec<(FormRow, Vec<FieldSpec>)> = Vec::new();
        for field in FormField::ALL {
            let settings = fields.settings(field);
            let Some(row) = field.row() else {
                continue;
            };
            if !settings.enabled {
                continue;
            }
            let spec = FieldSpec {
                field,
                placeholder: if settings.required {
                    format!("{} *", field.label())
                } else {
                    field.label().to_string()
                },
                required: settings.required,
            };
            match rows.iter_mut().find(|(existing, _)| *existing == row) {
                Some((_, specs)) => specs.push(spec),
                None => rows.push((row, vec![spec])),
            }
        }

        let message = fields.message.enabled.then(|| FieldSpec {
            field: FormField::Message,
            placeholder: config.message_placeholder.clone(),
            required: fields.message.required,
        });
        let gated = fields.has_gating_fields();

        Self {
            container_id: INTAKE_CONTAINER_ID,
            form_id: INTAKE_FORM_ID,
            rows,
            message,
            submit_label: config.submit_label.clone(),
            submit_class: SUBMIT_CLASS,
            required_note: gated.then(|| config.required_note.clone()),
            starts_open: !gated,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.rows
            .iter()
            .flat_map(|(_, specs)| specs.iter())
            .chain(self.message.iter())
    }
}

/// Raw values read back from the rendered form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeValues {
    values: BTreeMap<FormField, String>,
}

impl IntakeValues {
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn with(mut self, field: FormField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: FormField) -> &str {
        self.values.get(&field).map_or("", String::as_str)
    }
}

static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .ok()
});

static MESSAGE_TAG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<message>(.*?)</message>").ok());

/// Same acceptance rule browsers apply to `<input type="email">`.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(value.trim()))
}

pub fn is_valid_phone(value: &str) -> bool {
    value.chars().filter(char::is_ascii_digit).count() >= 7
}

/// Whether a single field passes its format check. Empty optional fields pass.
pub fn field_is_valid(field: FormField, value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return true;
    }
    match field {
        FormField::Email => is_valid_email(value),
        FormField::Phone => is_valid_phone(value),
        _ => true,
    }
}

/// Gate for the message field and submit button: every enabled required
/// field is non-empty and well formed. Optional fields never close it.
pub fn gate_is_open(fields: &FormFields, values: &IntakeValues) -> bool {
    FormField::ALL
        .iter()
        .filter(|field| **field != FormField::Message)
        .all(|field| {
            let settings = fields.settings(*field);
            if !settings.enabled {
                return true;
            }
            if !settings.required {
                return true;
            }
            let value = values.get(*field);
            !value.trim().is_empty() && field_is_valid(*field, value)
        })
}

/// Submission additionally needs a required message to be filled in.
pub fn submission_ready(fields: &FormFields, values: &IntakeValues) -> bool {
    gate_is_open(fields, values)
        && (!fields.message.gates() || !values.get(FormField::Message).trim().is_empty())
}

/// Browser facts optionally appended to the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientContext {
    pub user_agent: String,
    pub platform: String,
    pub language: String,
    pub languages: Vec<String>,
    pub cookie_enabled: bool,
    /// Approximate RAM in GiB; only Chromium reports it.
    pub device_memory: Option<f64>,
    pub hardware_concurrency: Option<u32>,
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
}

impl ClientContext {
    fn tags(&self) -> Vec<(&'static str, String)> {
        fn optional<T: ToString>(value: Option<T>) -> String {
            value.map(|value| value.to_string()).unwrap_or_default()
        }

        vec![
            ("browser_user_agent", self.user_agent.clone()),
            ("browser_platform", self.platform.clone()),
            ("browser_language", self.language.clone()),
            ("browser_languages", self.languages.join(", ")),
            ("browser_cookie_enabled", self.cookie_enabled.to_string()),
            ("browser_device_memory", optional(self.device_memory)),
            (
                "browser_hardware_concurrency",
                optional(self.hardware_concurrency),
            ),
            ("browser_screen_width", optional(self.screen_width)),
            ("browser_screen_height", optional(self.screen_height)),
        ]
    }
}

/// The delimited message that carries the intake answers into the chat.
///
/// Values are not escaped: an embedded `|` or `<` reaches the assistant as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakePayload {
    fields: Vec<(&'static str, String)>,
    context: Vec<(&'static str, String)>,
}

impl IntakePayload {
    pub fn from_values(fields: &FormFields, values: &IntakeValues) -> Self {
        let fields = FormField::ALL
            .iter()
            .map(|field| {
                let value = if fields.settings(*field).enabled {
                    values.get(*field).to_string()
                } else {
                    String::new()
                };
                (field.tag(), value)
            })
            .collect();
        Self {
            fields,
            context: Vec::new(),
        }
    }

    pub fn with_client_context(mut self, context: &ClientContext) -> Self {
        self.context = context.tags();
        self
    }

    pub fn render(&self) -> String {
        self.fields
            .iter()
            .chain(self.context.iter())
            .map(|(tag, value)| format!("<{tag}>{value}</{tag}>"))
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Whether a rendered user message is an echoed intake payload.
pub fn is_intake_echo(text: &str) -> bool {
    text.contains("<first_name>") && text.contains("<message>")
}

/// The visitor's own words from an echoed payload.
pub fn extract_visible_message(text: &str) -> Option<String> {
    if !is_intake_echo(text) {
        return None;
    }
    MESSAGE_TAG
        .as_ref()?
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|message| message.as_str().to_string())
}

/// Formats phone digits as `(xxx) xxx-xxxx`, with a `+cc ` prefix when the
/// input carries one to three digits beyond a ten digit number.
pub fn format_phone_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let extra = digits.len().saturating_sub(10);
    if (1..=3).contains(&extra) {
        let (country, number) = digits.split_at(extra);
        return format!("+{country} {}", format_national(number));
    }
    format_national(&digits)
}

fn format_national(digits: &str) -> String {
    let digits = &digits[..digits.len().min(10)];
    match digits.len() {
        0 => String::new(),
        1..=2 => format!("({digits}"),
        3..=5 => format!("({}) {}", &digits[..3], &digits[3..]),
        6 => format!("({}) {}", &digits[..3], &digits[3..6]),
        _ => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum IntakePhase {
    NotShown,
    Shown { complete: bool },
    Submitted,
}

/// Per chat-open state machine of the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeSession {
    phase: IntakePhase,
}

impl Default for IntakeSession {
    fn default() -> Self {
        Self {
            phase: IntakePhase::NotShown,
        }
    }
}

impl IntakeSession {
    pub fn phase(&self) -> IntakePhase {
        self.phase
    }

    pub fn is_shown(&self) -> bool {
        matches!(self.phase, IntakePhase::Shown { .. })
    }

    pub fn is_submitted(&self) -> bool {
        self.phase == IntakePhase::Submitted
    }

    /// Returns `false` once submitted; that phase only ends with [`Self::reset`].
    pub fn show(&mut self) -> bool {
        match self.phase {
            IntakePhase::Submitted => false,
            IntakePhase::Shown { .. } => true,
            IntakePhase::NotShown => {
                self.phase = IntakePhase::Shown { complete: false };
                true
            }
        }
    }

    pub fn set_complete(&mut self, complete: bool) {
        if let IntakePhase::Shown { .. } = self.phase {
            self.phase = IntakePhase::Shown { complete };
        }
    }

    pub fn submit(&mut self) -> bool {
        if self.phase == (IntakePhase::Shown { complete: true }) {
            self.phase = IntakePhase::Submitted;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.phase = IntakePhase::NotShown;
    }
}
