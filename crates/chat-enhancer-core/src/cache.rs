use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::WidgetContract;
use crate::host::WidgetLookup;
use crate::intake::{INTAKE_CONTAINER_ID, INTAKE_FORM_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementSlot {
    ChatContainer,
    LauncherButton,
    LauncherContainer,
    MessageInput,
    SendButton,
    ChatHistory,
    IntakeForm,
    NativeForm,
}

impl ElementSlot {
    pub const ALL: [ElementSlot; 8] = [
        ElementSlot::ChatContainer,
        ElementSlot::LauncherButton,
        ElementSlot::LauncherContainer,
        ElementSlot::MessageInput,
        ElementSlot::SendButton,
        ElementSlot::ChatHistory,
        ElementSlot::IntakeForm,
        ElementSlot::NativeForm,
    ];

    /// Slots that live inside the chat window and go stale when it closes.
    pub const WINDOW_INTERIOR: [ElementSlot; 4] = [
        ElementSlot::MessageInput,
        ElementSlot::SendButton,
        ElementSlot::ChatHistory,
        ElementSlot::NativeForm,
    ];

    /// Identifier used for a direct lookup. The native form has none and is
    /// found by a secondary pass over the chat container.
    pub fn lookup_id(self, contract: &WidgetContract) -> Option<&str> {
        match self {
            ElementSlot::ChatContainer => Some(&contract.chat_container_id),
            ElementSlot::LauncherButton => Some(&contract.launcher_button_id),
            ElementSlot::LauncherContainer => Some(&contract.launcher_container_id),
            ElementSlot::MessageInput => Some(&contract.message_input_id),
            ElementSlot::SendButton => Some(&contract.send_button_id),
            ElementSlot::ChatHistory => Some(&contract.history_id),
            ElementSlot::IntakeForm => Some(INTAKE_CONTAINER_ID),
            ElementSlot::NativeForm => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Memoized handles to the widget nodes the enhancer works with.
///
/// A slot is looked up only while it is empty. A filled slot survives every
/// mutation batch until it is cleared explicitly or its node leaves the
/// document.
#[derive(Debug, Clone)]
pub struct ElementCache<N> {
    slots: [Option<N>; 8],
}

impl<N> Default for ElementCache<N> {
    fn default() -> Self {
        Self {
            slots: Default::default(),
        }
    }
}

impl<N: Clone> ElementCache<N> {
    pub fn get(&self, slot: ElementSlot) -> Option<&N> {
        self.slots[slot.index()].as_ref()
    }

    pub fn cloned(&self, slot: ElementSlot) -> Option<N> {
        self.get(slot).cloned()
    }

    pub fn contains(&self, slot: ElementSlot) -> bool {
        self.get(slot).is_some()
    }

    pub fn set(&mut self, slot: ElementSlot, node: N) {
        self.slots[slot.index()] = Some(node);
    }

    pub fn clear(&mut self, slot: ElementSlot) -> Option<N> {
        self.slots[slot.index()].take()
    }

    pub fn refresh<L>(&mut self, lookup: &L, contract: &WidgetContract)
    where
        L: WidgetLookup<Node = N>,
    {
        for slot in ElementSlot::ALL {
            if let Some(node) = self.get(slot) {
                if lookup.is_attached(node) {
                    continue;
                }
                self.clear(slot);
            }
            if let Some(id) = slot.lookup_id(contract) {
                if let Some(node) = lookup.element_by_id(id) {
                    self.set(slot, node);
                }
            }
        }

        if !self.contains(ElementSlot::NativeForm) {
            if let Some(container) = self.get(ElementSlot::ChatContainer) {
                if let Some(form) = lookup.native_form(container, INTAKE_FORM_ID) {
                    self.set(ElementSlot::NativeForm, form);
                }
            }
        }
    }

    pub fn presence(&self) -> BTreeMap<ElementSlot, bool> {
        ElementSlot::ALL
            .iter()
            .map(|slot| (*slot, self.contains(*slot)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashMap;

    use super::*;
    use crate::error::HostError;
    use crate::host::LayoutProbe;

    #[derive(Default)]
    struct CountingLookup {
        ids: HashMap<String, u32>,
        detached: Vec<u32>,
        native_form: Option<u32>,
        lookups: Cell<u32>,
    }

    impl WidgetLookup for CountingLookup {
        type Node = u32;

        fn element_by_id(&self, id: &str) -> Option<u32> {
            self.lookups.set(self.lookups.get() + 1);
            self.ids.get(id).copied()
        }

        fn native_form(&self, _container: &u32, excluded_form_id: &str) -> Option<u32> {
            assert_eq!(excluded_form_id, INTAKE_FORM_ID);
            self.native_form
        }

        fn is_attached(&self, node: &u32) -> bool {
            !self.detached.contains(node)
        }

        fn layout_probe(&self, _node: &u32) -> LayoutProbe {
            LayoutProbe::hidden()
        }

        fn set_displayed(&mut self, _node: &u32, _displayed: bool) -> Result<(), HostError> {
            Ok(())
        }

        fn remove_node(&mut self, _node: &u32) {}
    }

    #[test]
    fn filled_slots_are_not_looked_up_again() {
        let contract = WidgetContract::default();
        let mut lookup = CountingLookup::default();
        lookup.ids.insert(contract.chat_container_id.clone(), 1);
        lookup.ids.insert(contract.launcher_container_id.clone(), 2);

        let mut cache = ElementCache::default();
        cache.refresh(&lookup, &contract);
        assert_eq!(cache.get(ElementSlot::ChatContainer), Some(&1));
        assert_eq!(cache.get(ElementSlot::LauncherContainer), Some(&2));
        let first_pass = lookup.lookups.get();
        assert_eq!(first_pass, 7);

        cache.refresh(&lookup, &contract);
        assert_eq!(lookup.lookups.get() - first_pass, 5);
    }

    #[test]
    fn native_form_needs_a_container() {
        let contract = WidgetContract::default();
        let mut lookup = CountingLookup {
            native_form: Some(9),
            ..CountingLookup::default()
        };

        let mut cache = ElementCache::default();
        cache.refresh(&lookup, &contract);
        assert!(!cache.contains(ElementSlot::NativeForm));

        lookup.ids.insert(contract.chat_container_id.clone(), 1);
        cache.refresh(&lookup, &contract);
        assert_eq!(cache.get(ElementSlot::NativeForm), Some(&9));
    }

    #[test]
    fn detached_nodes_are_resolved_again() {
        let contract = WidgetContract::default();
        let mut lookup = CountingLookup::default();
        lookup.ids.insert(contract.message_input_id.clone(), 4);

        let mut cache = ElementCache::default();
        cache.refresh(&lookup, &contract);
        assert_eq!(cache.get(ElementSlot::MessageInput), Some(&4));

        lookup.detached.push(4);
        lookup.ids.insert(contract.message_input_id.clone(), 5);
        cache.refresh(&lookup, &contract);
        assert_eq!(cache.get(ElementSlot::MessageInput), Some(&5));
    }

    #[test]
    fn cleared_slots_report_absent() {
        let mut cache = ElementCache::default();
        cache.set(ElementSlot::IntakeForm, 3_u32);
        assert_eq!(cache.clear(ElementSlot::IntakeForm), Some(3));
        assert_eq!(cache.presence().get(&ElementSlot::IntakeForm), Some(&false));
    }
}
