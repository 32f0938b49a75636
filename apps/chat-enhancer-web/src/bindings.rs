/// Listeners bound to individual page nodes that the widget may re-render.
///
/// Entries whose node has left the document are dropped on the next bind.
#[derive(Debug)]
pub(crate) struct NodeBindings<N, L> {
    entries: Vec<(N, L)>,
}

impl<N, L> Default for NodeBindings<N, L> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<N, L> NodeBindings<N, L> {
    pub(crate) fn bind(&mut self, node: N, listener: L, is_live: impl Fn(&N) -> bool) {
        self.entries.retain(|(node, _)| is_live(node));
        self.entries.push((node, listener));
    }

    #[cfg_attr(not(test), expect(dead_code))]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
