/// Failure reported by a host adapter while touching the page.
///
/// Hosts name the operation that failed so a contained failure can be logged
/// with enough context to find the broken widget contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} failed: {detail}")]
pub struct HostError {
    pub operation: &'static str,
    pub detail: String,
}

impl HostError {
    pub fn new(operation: &'static str, detail: impl Into<String>) -> Self {
        Self {
            operation,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(String),
    #[error("widget identifier `{0}` must not be empty")]
    EmptyIdentifier(&'static str),
    #[error("popup message list must not be empty")]
    NoPopupMessages,
    #[error("popup cap must be at least 1")]
    ZeroPopupCap,
    #[error("mutation debounce must be greater than zero")]
    ZeroDebounce,
    #[error("session key must not be empty")]
    EmptySessionKey,
    #[error("unknown log level `{0}`")]
    UnknownLogLevel(String),
}

/// Failure of the session flag store.
#[derive(Debug, thiserror::Error)]
pub enum EnhancerError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("session storage: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_storage(blocked: bool) -> Result<&'static str, EnhancerError> {
        if blocked {
            Err(HostError::new("session_storage", "SecurityError: access denied"))?;
        }
        Ok("storage")
    }

    #[test]
    fn host_failures_lift_into_enhancer_errors() {
        let error = open_storage(true).unwrap_err();
        assert!(matches!(error, EnhancerError::Host(_)));
        assert_eq!(
            error.to_string(),
            "session_storage failed: SecurityError: access denied"
        );
        assert!(open_storage(false).is_ok());
    }

    #[test]
    fn storage_errors_name_the_store() {
        let error = EnhancerError::Storage("sessionStorage is unavailable".to_string());
        assert_eq!(error.to_string(), "session storage: sessionStorage is unavailable");
    }
}
