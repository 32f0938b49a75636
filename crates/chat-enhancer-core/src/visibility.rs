use crate::host::LayoutProbe;

/// Whether the chat window is open.
///
/// The widget toggles the window inconsistently between absolutely positioned
/// and in-flow states, so either a laid-out box or a non-`none` computed
/// display counts as open.
pub fn is_chat_open(probe: Option<&LayoutProbe>) -> bool {
    probe.is_some_and(|probe| {
        probe.has_offset_parent || probe.computed_display.trim() != "none"
    })
}

/// Whether an element inside the chat window is laid out. A display-hidden
/// ancestor still leaves the element's own computed display untouched, so
/// only the box counts here.
pub fn is_rendered(probe: Option<&LayoutProbe>) -> bool {
    probe.is_some_and(|probe| probe.has_offset_parent)
}
