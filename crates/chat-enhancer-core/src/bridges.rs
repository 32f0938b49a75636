use crate::host::LabeledButton;

/// Attribute set on a native reset button once our listener is attached.
pub const RESET_MARKER: &str = "data-watson-reset-listener";
pub const CLOSE_BUTTON_CLASS: &str = "watson-close-button";
pub const CLOSE_BUTTON_TITLE: &str = "Close chat";

fn label_matches<N>(button: &LabeledButton<N>, label: &str) -> bool {
    button.label.trim() == label
}

/// Native close button: the last exact label match among the signature
/// buttons, or the first exact match anywhere on the page.
pub fn close_target<N: Clone>(
    signature: &[LabeledButton<N>],
    everywhere: &[LabeledButton<N>],
    label: &str,
) -> Option<N> {
    signature
        .iter()
        .rev()
        .find(|button| label_matches(button, label))
        .or_else(|| everywhere.iter().find(|button| label_matches(button, label)))
        .map(|button| button.node.clone())
}

/// Reset buttons that still need a listener.
pub fn unbound_reset_buttons<N: Clone>(buttons: &[LabeledButton<N>], label: &str) -> Vec<N> {
    buttons
        .iter()
        .filter(|button| !button.bound && label_matches(button, label))
        .map(|button| button.node.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(node: u32, label: &str, bound: bool) -> LabeledButton<u32> {
        LabeledButton {
            node,
            label: label.to_string(),
            bound,
        }
    }

    #[test]
    fn close_prefers_the_last_signature_match() {
        let signature = vec![
            button(1, " Close Chat ", false),
            button(2, "Reset Chat", false),
            button(3, "Close Chat", false),
        ];
        let everywhere = vec![button(9, "Close Chat", false)];
        assert_eq!(close_target(&signature, &everywhere, "Close Chat"), Some(3));
    }

    #[test]
    fn close_falls_back_to_any_button() {
        let signature = vec![button(1, "Close Chat now", false)];
        let everywhere = vec![
            button(7, "Send", false),
            button(8, "Close Chat", false),
            button(9, "Close Chat", false),
        ];
        assert_eq!(close_target(&signature, &everywhere, "Close Chat"), Some(8));
        assert_eq!(close_target::<u32>(&[], &[], "Close Chat"), None);
    }

    #[test]
    fn bound_reset_buttons_are_skipped() {
        let buttons = vec![
            button(1, "Reset Chat", true),
            button(2, "Reset Chat", false),
            button(3, "reset chat", false),
        ];
        assert_eq!(unbound_reset_buttons(&buttons, "Reset Chat"), vec![2]);
    }
}
