use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::ElementSlot;
use crate::host::TimerSlot;
use crate::intake::IntakePhase;
use crate::popup::PopupPhase;

/// Point-in-time view of the enhancer, serialized for the debug surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub form_active: bool,
    pub form_submitted: bool,
    pub chat_initialized: bool,
    pub chat_open: bool,
    pub widget_ready: bool,
    pub stopped: bool,
    /// `None` when the store could not be read.
    pub session_flag: Option<bool>,
    pub intake: IntakePhase,
    pub delivery_pending: bool,
    pub elements: BTreeMap<ElementSlot, bool>,
    pub popups: PopupStatus,
    pub pending_timers: Vec<TimerSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopupStatus {
    pub phase: PopupPhase,
    pub shown: u32,
    pub continuous: bool,
}

impl StatusSnapshot {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
