use crate::piped::Filter;
use crate::search::{Phase, ResultList, SearchPager};

/// Which pane receives keystrokes on the search screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Results,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub created_at: std::time::Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Success,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Error,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > std::time::Duration::from_secs(3)
    }
}

/// Rows of slack between the selection and the end of the list before the
/// scroll trigger asks for another page.
pub const LOAD_MORE_THRESHOLD: usize = 5;

pub struct AppState {
    pub should_quit: bool,
    pub tick: u64,

    pub focus: Focus,
    pub query_input: String,

    /// The pagination state machine; the event loop is its only mutator.
    pub pager: SearchPager,
    /// Read-only snapshot refreshed after every pager transition; this is
    /// what the renderer sees, never the pager itself.
    pub results: ResultList,

    // Selection within the rendered result list.
    pub selected: usize,
    pub scroll_offset: usize,

    pub recent_searches: Vec<String>,
    pub thumbs_cached: usize,

    pub show_help: bool,
    pub toast: Option<Toast>,
    pub status: String,
}

impl AppState {
    pub fn new(default_filter: Filter) -> Self {
        let pager = SearchPager::new(default_filter);
        let results = pager.snapshot();
        Self {
            should_quit: false,
            tick: 0,
            focus: Focus::Input,
            query_input: String::new(),
            pager,
            results,
            selected: 0,
            scroll_offset: 0,
            recent_searches: Vec::new(),
            thumbs_cached: 0,
            show_help: false,
            toast: None,
            status: String::new(),
        }
    }

    /// Pull a fresh snapshot out of the pager and keep the selection in
    /// bounds. Call after every pager mutation.
    pub fn refresh_results(&mut self) {
        self.results = self.pager.snapshot();
        if self.results.items.is_empty() {
            self.selected = 0;
            self.scroll_offset = 0;
        } else {
            self.selected = self.selected.min(self.results.items.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if !self.results.items.is_empty() {
            self.selected = (self.selected + 1).min(self.results.items.len() - 1);
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.results.items.len().saturating_sub(1);
    }

    pub fn page_up(&mut self) {
        self.selected = self.selected.saturating_sub(10);
    }

    pub fn page_down(&mut self) {
        if !self.results.items.is_empty() {
            self.selected = (self.selected + 10).min(self.results.items.len() - 1);
        }
    }

    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected - visible_height + 1;
        }
    }

    /// The scroll-trigger signal: selection has moved close enough to the
    /// end that another page is worth fetching.
    pub fn near_end(&self) -> bool {
        !self.results.items.is_empty()
            && self.selected + LOAD_MORE_THRESHOLD >= self.results.items.len()
    }

    pub fn selected_item(&self) -> Option<&crate::piped::SearchItem> {
        self.results.items.get(self.selected)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.results.phase, Phase::Loading | Phase::LoadingMore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piped::{SearchItem, SearchPage};
    use crate::search::PageKind;

    fn state_with_items(n: usize) -> AppState {
        let mut state = AppState::new(Filter::All);
        let fetch = state.pager.set_query("q");
        let items = (0..n)
            .map(|i| SearchItem {
                url: format!("/watch?v={i}"),
                ..SearchItem::default()
            })
            .collect();
        state.pager.apply(
            PageKind::First,
            fetch.epoch,
            Ok(SearchPage {
                items,
                nextpage: Some("t".into()),
            }),
        );
        state.refresh_results();
        state
    }

    #[test]
    fn test_near_end_trigger() {
        let mut state = state_with_items(20);
        assert!(!state.near_end());
        state.selected = 15;
        assert!(state.near_end());
        state.selected = 19;
        assert!(state.near_end());
    }

    #[test]
    fn test_selection_clamped_on_refresh() {
        let mut state = state_with_items(5);
        state.selected = 4;

        // A new query empties the list; selection must follow.
        state.pager.set_query("other");
        state.refresh_results();
        assert_eq!(state.selected, 0);
        assert!(!state.near_end(), "empty list never triggers load-more");
    }

    #[test]
    fn test_update_scroll_window() {
        let mut state = state_with_items(50);
        state.selected = 30;
        state.update_scroll(10);
        assert_eq!(state.scroll_offset, 21);

        state.selected = 5;
        state.update_scroll(10);
        assert_eq!(state.scroll_offset, 5);
    }
}
