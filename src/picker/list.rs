use crossterm::event::KeyCode;

use crate::model::Listable;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterState {
    /// No filter; navigation keys go to the selector.
    Off,
    /// The user is typing a query; this list owns every keystroke.
    Editing,
    /// A query is applied; navigation works on the narrowed set.
    Applied,
}

/// A single-select scrolling list over anything `Listable`, with a
/// substring filter entered via `/`.
#[derive(Debug)]
pub struct FilterList<T> {
    title: String,
    items: Vec<T>,
    visible: Vec<usize>,
    cursor: usize,
    state: FilterState,
    query: String,
}

impl<T: Listable> FilterList<T> {
    pub fn new(title: impl Into<String>, items: Vec<T>) -> Self {
        let visible = (0..items.len()).collect();
        Self {
            title: title.into(),
            items,
            visible,
            cursor: 0,
            state: FilterState::Off,
            query: String::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn filter_state(&self) -> FilterState {
        self.state
    }

    /// While editing, the list owns all keystrokes.
    pub fn is_filtering(&self) -> bool {
        self.state == FilterState::Editing
    }

    pub fn selected(&self) -> Option<&T> {
        self.visible.get(self.cursor).map(|&i| &self.items[i])
    }

    pub fn visible_items(&self) -> impl Iterator<Item = &T> {
        self.visible.iter().map(|&i| &self.items[i])
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.visible.len() {
            self.cursor += 1;
        }
    }

    pub fn start_filter(&mut self) {
        self.state = FilterState::Editing;
    }

    pub fn clear_filter(&mut self) {
        self.state = FilterState::Off;
        self.query.clear();
        self.recompute();
    }

    /// Handle one key while in editing state.
    pub fn handle_filter_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.clear_filter(),
            KeyCode::Enter => {
                self.state = if self.query.is_empty() {
                    FilterState::Off
                } else {
                    FilterState::Applied
                };
            }
            KeyCode::Backspace => {
                self.query.pop();
                self.recompute();
            }
            KeyCode::Char(c) => {
                self.query.push(c);
                self.recompute();
            }
            _ => {}
        }
    }

    fn recompute(&mut self) {
        let needle = self.query.to_lowercase();
        self.visible = (0..self.items.len())
            .filter(|&i| {
                needle.is_empty() || self.items[i].filter_value().to_lowercase().contains(&needle)
            })
            .collect();
        self.cursor = self.cursor.min(self.visible.len().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CatalogModel;

    fn entry(name: &str) -> CatalogModel {
        CatalogModel {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn list() -> FilterList<CatalogModel> {
        FilterList::new(
            "models",
            vec![entry("llama3"), entry("mistral"), entry("llava")],
        )
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let mut l = list();
        l.move_up();
        assert_eq!(l.cursor(), 0);
        l.move_down();
        l.move_down();
        l.move_down();
        assert_eq!(l.cursor(), 2);
    }

    #[test]
    fn filter_narrows_and_clear_restores() {
        let mut l = list();
        l.start_filter();
        assert!(l.is_filtering());
        for c in "lla".chars() {
            l.handle_filter_key(KeyCode::Char(c));
        }
        assert_eq!(l.visible_len(), 2);
        assert_eq!(l.selected().map(|m| m.name.as_str()), Some("llama3"));

        l.handle_filter_key(KeyCode::Enter);
        assert_eq!(l.filter_state(), FilterState::Applied);
        assert!(!l.is_filtering());

        l.clear_filter();
        assert_eq!(l.visible_len(), 3);
        assert_eq!(l.filter_state(), FilterState::Off);
    }

    #[test]
    fn esc_while_editing_clears_the_query() {
        let mut l = list();
        l.start_filter();
        l.handle_filter_key(KeyCode::Char('z'));
        assert_eq!(l.visible_len(), 0);
        assert_eq!(l.selected().map(|m| m.name.as_str()), None);

        l.handle_filter_key(KeyCode::Esc);
        assert_eq!(l.filter_state(), FilterState::Off);
        assert_eq!(l.visible_len(), 3);
    }

    #[test]
    fn cursor_stays_in_range_as_filter_shrinks() {
        let mut l = list();
        l.move_down();
        l.move_down();
        l.start_filter();
        l.handle_filter_key(KeyCode::Char('m'));
        assert!(l.cursor() < l.visible_len());
    }

    #[test]
    fn empty_enter_returns_to_off() {
        let mut l = list();
        l.start_filter();
        l.handle_filter_key(KeyCode::Enter);
        assert_eq!(l.filter_state(), FilterState::Off);
    }
}
