/// Milliseconds in one day, for cookie expiry arithmetic on `Date` values.
pub(crate) const DAY_MS: f64 = 86_400_000.0;

/// Value of `name` in a `document.cookie` header, if set.
pub(crate) fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim_start().split_once('=')?;
        (key == name).then_some(value)
    })
}

/// `document.cookie` assignment for the popup marker. `expires_utc` is an
/// HTTP date such as `Date.toUTCString()` produces.
pub(crate) fn marker_cookie(name: &str, expires_utc: &str) -> String {
    format!("{name}=true;expires={expires_utc};path=/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_cookie_among_others() {
        let header = "theme=dark; watson_chat_popup_shown=true; _ga=GA1.2";
        assert_eq!(cookie_value(header, "watson_chat_popup_shown"), Some("true"));
        assert_eq!(cookie_value(header, "theme"), Some("dark"));
        assert_eq!(cookie_value(header, "_ga"), Some("GA1.2"));
    }

    #[test]
    fn prefix_names_do_not_match() {
        let header = "watson_chat_popup_shown_old=true";
        assert_eq!(cookie_value(header, "watson_chat_popup_shown"), None);
        assert_eq!(cookie_value("", "watson_chat_popup_shown"), None);
    }

    #[test]
    fn empty_value_still_counts_as_present() {
        assert_eq!(cookie_value("seen=", "seen"), Some(""));
    }

    #[test]
    fn marker_is_site_wide() {
        assert_eq!(
            marker_cookie("seen", "Sun, 19 Oct 2026 10:00:00 GMT"),
            "seen=true;expires=Sun, 19 Oct 2026 10:00:00 GMT;path=/"
        );
    }
}
