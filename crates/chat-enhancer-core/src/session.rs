use std::convert::Infallible;

use crate::host::SessionFlagStore;

/// Value written under the session key once the intake form went out.
pub const SUBMITTED_VALUE: &str = "true";

/// Absent or any other stored value means "not submitted".
pub fn is_submitted_value(raw: Option<&str>) -> bool {
    raw == Some(SUBMITTED_VALUE)
}

/// Session flag kept in memory, for hosts without storage and for tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySessionStore {
    value: Option<String>,
}

impl MemorySessionStore {
    pub fn with_raw(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl SessionFlagStore for MemorySessionStore {
    type Error = Infallible;

    fn load_form_submitted(&self) -> Result<bool, Self::Error> {
        Ok(is_submitted_value(self.raw()))
    }

    fn persist_form_submitted(&mut self) -> Result<(), Self::Error> {
        self.value = Some(SUBMITTED_VALUE.to_string());
        Ok(())
    }

    fn clear_form_submitted(&mut self) -> Result<(), Self::Error> {
        self.value = None;
        Ok(())
    }
}
