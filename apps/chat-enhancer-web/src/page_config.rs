use chat_enhancer_core::{ConfigError, EnhancerConfig};

/// Config from the page global's JSON text. An absent global means defaults;
/// an unusable one means defaults plus the error to report once logging is up.
pub(crate) fn resolve(raw: Option<&str>) -> (EnhancerConfig, Option<ConfigError>) {
    match raw.map(str::trim) {
        None | Some("" | "null" | "undefined") => (EnhancerConfig::default(), None),
        Some(raw) => match EnhancerConfig::from_json(raw) {
            Ok(config) => (config, None),
            Err(error) => (EnhancerConfig::default(), Some(error)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_global_uses_defaults_silently() {
        assert_eq!(resolve(None), (EnhancerConfig::default(), None));
        assert_eq!(resolve(Some("null")), (EnhancerConfig::default(), None));
    }

    #[test]
    fn page_overrides_are_applied() {
        let (config, error) = resolve(Some(r#"{"form": {"active": false}, "log_level": "debug"}"#));
        assert_eq!(error, None);
        assert!(!config.form.active);
        assert_eq!(config.log_level, "debug");
        assert!(config.popup.enabled);
    }

    #[test]
    fn invalid_config_falls_back_with_error() {
        let (config, error) = resolve(Some(r#"{"watcher": {"debounce_ms": 0}}"#));
        assert_eq!(config, EnhancerConfig::default());
        assert_eq!(error, Some(ConfigError::ZeroDebounce));

        let (_, error) = resolve(Some("{not json"));
        assert!(matches!(error, Some(ConfigError::Parse(_))));
    }
}
