use std::collections::BTreeSet;

use shared::domain::ClientId;

/// Selected row ids, kept across page loads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<ClientId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, id: ClientId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn select_all(&mut self, visible: impl IntoIterator<Item = ClientId>) {
        self.ids.extend(visible);
    }

    pub fn clear_visible(&mut self, visible: impl IntoIterator<Item = ClientId>) {
        for id in visible {
            self.ids.remove(&id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drops every id that is not in `visible`.
    pub fn retain_visible(&mut self, visible: impl IntoIterator<Item = ClientId>) {
        let visible: BTreeSet<ClientId> = visible.into_iter().collect();
        self.ids.retain(|id| visible.contains(id));
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.ids.iter().copied()
    }

    /// False for an empty page.
    pub fn all_selected(&self, visible: &[ClientId]) -> bool {
        !visible.is_empty() && visible.iter().all(|id| self.ids.contains(id))
    }

    pub fn any_selected(&self, visible: &[ClientId]) -> bool {
        visible.iter().any(|id| self.ids.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[i64]) -> Vec<ClientId> {
        raw.iter().copied().map(ClientId).collect()
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut selection = SelectionSet::new();
        assert!(selection.toggle(ClientId(1)));
        assert!(selection.contains(ClientId(1)));
        assert!(!selection.toggle(ClientId(1)));
        assert!(selection.is_empty());
    }

    #[test]
    fn page_wide_selection_keeps_other_pages() {
        let mut selection = SelectionSet::new();
        selection.toggle(ClientId(99));
        selection.select_all(ids(&[1, 2, 3]));
        assert_eq!(selection.len(), 4);
        assert!(selection.all_selected(&ids(&[1, 2, 3])));

        selection.clear_visible(ids(&[1, 2, 3]));
        assert_eq!(selection.ids().collect::<Vec<_>>(), ids(&[99]));
        assert!(!selection.any_selected(&ids(&[1, 2, 3])));
    }

    #[test]
    fn retain_visible_prunes_to_page() {
        let mut selection = SelectionSet::new();
        selection.select_all(ids(&[1, 2, 5]));
        selection.retain_visible(ids(&[2, 3, 5]));
        assert_eq!(selection.ids().collect::<Vec<_>>(), ids(&[2, 5]));
    }

    #[test]
    fn empty_page_is_never_all_selected() {
        let mut selection = SelectionSet::new();
        selection.toggle(ClientId(1));
        assert!(!selection.all_selected(&[]));
        assert!(!selection.any_selected(&[]));
    }
}
