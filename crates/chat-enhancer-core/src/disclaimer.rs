use std::sync::LazyLock;

use regex::Regex;

use crate::host::TimestampNode;

static CLOCK_TIME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}:\d{2}\s*(AM|PM)$").ok());

/// `H:MM AM` / `HH:MM PM`, nothing else.
pub fn is_clock_time(text: &str) -> bool {
    CLOCK_TIME
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(text.trim()))
}

/// New text for a timestamp, or `None` when the suffix is already there.
pub fn annotated_text(current: &str, suffix: &str) -> Option<String> {
    if suffix.is_empty() || current.contains(suffix) {
        return None;
    }
    Some(format!("{current}{suffix}"))
}

/// Timestamps that should carry the disclaimer but do not yet, paired with
/// their new text.
pub fn plan_annotations<N: Clone>(
    timestamps: &[TimestampNode<N>],
    suffix: &str,
) -> Vec<(N, String)> {
    timestamps
        .iter()
        .filter(|timestamp| timestamp.assistant_authored && is_clock_time(&timestamp.text))
        .filter_map(|timestamp| {
            annotated_text(&timestamp.text, suffix).map(|text| (timestamp.node.clone(), text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;

    use super::*;

    const SUFFIX: &str = " - AI generated";

    fn stamp(node: u32, text: &str, assistant_authored: bool) -> TimestampNode<u32> {
        TimestampNode {
            node,
            text: text.to_string(),
            assistant_authored,
        }
    }

    #[test]
    fn recognises_widget_clock_times() {
        assert!(is_clock_time("9:05 AM"));
        assert!(is_clock_time("12:30PM"));
        assert!(is_clock_time(" 3:45 PM "));
        assert!(!is_clock_time("3:45 pm"));
        assert!(!is_clock_time("123:45 PM"));
        assert!(!is_clock_time("3:4 PM"));
        assert!(!is_clock_time("3:45 PM - This chatbot is powered by AI"));
        assert!(!is_clock_time("Yesterday"));
    }

    #[test]
    fn only_assistant_clock_times_are_planned() {
        let timestamps = vec![
            stamp(1, "9:05 AM", true),
            stamp(2, "9:06 AM", false),
            stamp(3, "Sending...", true),
        ];
        assert_eq!(
            plan_annotations(&timestamps, SUFFIX),
            vec![(1, format!("9:05 AM{SUFFIX}"))]
        );
    }

    #[test]
    fn annotating_twice_adds_the_suffix_once() {
        let first = annotated_text("9:05 AM", SUFFIX).unwrap();
        assert_eq!(annotated_text(&first, SUFFIX), None);
        assert_eq!(first.matches(SUFFIX).count(), 1);
    }

    quickcheck! {
        fn suffix_never_repeats(text: String) -> bool {
            let once = annotated_text(&text, SUFFIX).unwrap_or_else(|| text.clone());
            let twice = annotated_text(&once, SUFFIX).unwrap_or_else(|| once.clone());
            once == twice && twice.contains(SUFFIX)
        }
    }
}
