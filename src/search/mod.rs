//! Search-result pagination state machine.
//!
//! `SearchPager` owns the query text, the active filter, the server's
//! continuation token and the current result list. It is a plain synchronous
//! object: it hands out epoch-stamped `PageFetch` descriptors for the caller
//! to run on the network, and merges completions back in via [`SearchPager::apply`].
//! Responses stamped with an old epoch are discarded, which makes filter
//! switching race-free without cancelling in-flight requests.

use crate::piped::{Filter, SearchError, SearchItem, SearchPage};
use tracing::debug;

/// Generation counter for one logical search session (one query+filter
/// combination). Bumped by every `set_query`/`set_filter`; responses carry
/// the epoch they were issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Epoch(u64);

impl Epoch {
    fn bump(&mut self) -> Epoch {
        self.0 += 1;
        *self
    }
}

/// Where the current epoch's list stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing searched yet.
    #[default]
    Idle,
    /// First page in flight; list is empty.
    Loading,
    /// First page applied, a continuation token is held.
    Ready,
    /// Next page in flight; already-loaded items stay visible.
    LoadingMore,
    /// A fetch for the current epoch failed. Items loaded before a
    /// next-page failure remain visible.
    Error,
    /// A fetch succeeded without returning a token: no more pages.
    Exhausted,
}

/// Snapshot of the result list handed to renderers. Cloned out of the
/// pager on every transition; consumers never see a live reference.
#[derive(Debug, Clone, Default)]
pub struct ResultList {
    pub items: Vec<SearchItem>,
    pub phase: Phase,
    pub epoch: Epoch,
}

/// Which request shape a `PageFetch` describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    First,
    Next,
}

/// Everything a fetch task needs: the request parameters plus the epoch
/// stamp that `apply` later checks against.
#[derive(Debug, Clone)]
pub struct PageFetch {
    pub kind: PageKind,
    pub epoch: Epoch,
    pub query: String,
    pub filter: Filter,
    /// Continuation token; `Some` iff `kind == Next`.
    pub token: Option<String>,
}

#[derive(Debug)]
pub struct SearchPager {
    query: String,
    filter: Filter,
    epoch: Epoch,
    token: Option<String>,
    list: ResultList,
}

impl SearchPager {
    pub fn new(filter: Filter) -> Self {
        Self {
            query: String::new(),
            filter,
            epoch: Epoch::default(),
            token: None,
            list: ResultList::default(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Cloned state for the renderer.
    pub fn snapshot(&self) -> ResultList {
        self.list.clone()
    }

    /// Store new query text, invalidate everything in flight and start a
    /// fresh first-page fetch. The text is passed through unvalidated;
    /// whether an empty query is worth searching is the caller's call.
    pub fn set_query(&mut self, text: impl Into<String>) -> PageFetch {
        self.query = text.into();
        self.restart()
    }

    /// Same epoch-bump-and-restart as `set_query`, reusing the stored text.
    pub fn set_filter(&mut self, filter: Filter) -> PageFetch {
        self.filter = filter;
        self.restart()
    }

    fn restart(&mut self) -> PageFetch {
        let epoch = self.epoch.bump();
        self.token = None;
        self.list = ResultList {
            items: Vec::new(),
            phase: Phase::Loading,
            epoch,
        };
        PageFetch {
            kind: PageKind::First,
            epoch,
            query: self.query.clone(),
            filter: self.filter,
            token: None,
        }
    }

    /// Request the next page, if there is one to request.
    ///
    /// Returns `None` (no state change) unless a token is held for the
    /// current epoch and the list is `Ready`, or `Error` after a failed
    /// next-page fetch — the failure left the token in place precisely so
    /// this call can retry it. While `Loading`/`LoadingMore` this is a
    /// no-op, so duplicate scroll triggers are harmless.
    pub fn load_more(&mut self) -> Option<PageFetch> {
        if !matches!(self.list.phase, Phase::Ready | Phase::Error) {
            return None;
        }
        let token = self.token.clone()?;
        self.list.phase = Phase::LoadingMore;
        Some(PageFetch {
            kind: PageKind::Next,
            epoch: self.epoch,
            query: self.query.clone(),
            filter: self.filter,
            token: Some(token),
        })
    }

    /// Merge a fetch completion. Responses for a superseded epoch are
    /// discarded without touching the list, successes and failures alike.
    pub fn apply(&mut self, kind: PageKind, epoch: Epoch, result: Result<SearchPage, SearchError>) {
        if epoch != self.epoch {
            debug!(?kind, "discarding stale search response");
            return;
        }

        match (kind, result) {
            (PageKind::First, Ok(page)) => {
                self.list.items = page.items;
                self.token = page.nextpage;
                self.list.phase = self.settled_phase();
            }
            (PageKind::Next, Ok(page)) => {
                self.list.items.extend(page.items);
                self.token = page.nextpage;
                self.list.phase = self.settled_phase();
            }
            // Failures keep whatever is already displayed. For a next-page
            // failure the token also survives, so load_more can retry it.
            (_, Err(_)) => {
                self.list.phase = Phase::Error;
            }
        }
    }

    fn settled_phase(&self) -> Phase {
        if self.token.is_some() {
            Phase::Ready
        } else {
            Phase::Exhausted
        }
    }

    pub fn has_more(&self) -> bool {
        self.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(url: &str) -> SearchItem {
        SearchItem {
            kind: "stream".into(),
            url: url.into(),
            title: Some(format!("Video {url}")),
            ..SearchItem::default()
        }
    }

    fn page(urls: &[&str], nextpage: Option<&str>) -> SearchPage {
        SearchPage {
            items: urls.iter().map(|u| item(u)).collect(),
            nextpage: nextpage.map(str::to_string),
        }
    }

    fn urls(list: &ResultList) -> Vec<&str> {
        list.items.iter().map(|i| i.url.as_str()).collect()
    }

    #[test]
    fn test_epoch_monotonicity() {
        let mut pager = SearchPager::new(Filter::All);
        let e1 = pager.set_query("cats").epoch;
        let e2 = pager.set_filter(Filter::Videos).epoch;
        let e3 = pager.set_query("dogs").epoch;
        assert!(e1 < e2 && e2 < e3);
        assert_eq!(pager.epoch(), e3);
    }

    #[test]
    fn test_first_page_applies() {
        let mut pager = SearchPager::new(Filter::All);
        let fetch = pager.set_query("cats");
        assert_eq!(fetch.kind, PageKind::First);
        assert_eq!(pager.snapshot().phase, Phase::Loading);

        pager.apply(PageKind::First, fetch.epoch, Ok(page(&["a", "b"], Some("t1"))));
        let snap = pager.snapshot();
        assert_eq!(urls(&snap), ["a", "b"]);
        assert_eq!(snap.phase, Phase::Ready);
        assert!(pager.has_more());
    }

    #[test]
    fn test_append_order_preserved() {
        let mut pager = SearchPager::new(Filter::All);
        let first = pager.set_query("cats");
        pager.apply(PageKind::First, first.epoch, Ok(page(&["a", "b"], Some("t1"))));

        let more = pager.load_more().expect("token held");
        assert_eq!(more.token.as_deref(), Some("t1"));
        pager.apply(PageKind::Next, more.epoch, Ok(page(&["c", "d"], Some("t2"))));

        assert_eq!(urls(&pager.snapshot()), ["a", "b", "c", "d"]);
        assert_eq!(pager.snapshot().phase, Phase::Ready);
    }

    #[test]
    fn test_token_overwritten_not_merged() {
        let mut pager = SearchPager::new(Filter::All);
        let first = pager.set_query("cats");
        pager.apply(PageKind::First, first.epoch, Ok(page(&["a"], Some("t1"))));

        let more = pager.load_more().unwrap();
        pager.apply(PageKind::Next, more.epoch, Ok(page(&["b"], Some("t2"))));

        // The next load_more must use t2, never t1 again.
        let more2 = pager.load_more().unwrap();
        assert_eq!(more2.token.as_deref(), Some("t2"));
    }

    #[test]
    fn test_no_premature_load_more() {
        let mut pager = SearchPager::new(Filter::All);
        assert!(pager.load_more().is_none(), "idle");

        let first = pager.set_query("cats");
        assert!(pager.load_more().is_none(), "first page in flight");

        pager.apply(PageKind::First, first.epoch, Ok(page(&["a"], Some("t1"))));
        let more = pager.load_more().expect("ready with token");
        assert!(pager.load_more().is_none(), "already loading more");

        // Completing the in-flight fetch unblocks the next one.
        pager.apply(PageKind::Next, more.epoch, Ok(page(&["b"], Some("t2"))));
        assert!(pager.load_more().is_some());
    }

    #[test]
    fn test_first_page_failure_leaves_empty_error() {
        let mut pager = SearchPager::new(Filter::All);
        let fetch = pager.set_query("cats");
        pager.apply(
            PageKind::First,
            fetch.epoch,
            Err(SearchError::Transport("no route".into())),
        );
        let snap = pager.snapshot();
        assert!(snap.items.is_empty());
        assert_eq!(snap.phase, Phase::Error);
        // No token was ever held, so load_more stays a no-op.
        assert!(pager.load_more().is_none());
    }

    #[test]
    fn test_next_page_failure_preserves_items_and_token() {
        let mut pager = SearchPager::new(Filter::All);
        let first = pager.set_query("cats");
        pager.apply(PageKind::First, first.epoch, Ok(page(&["a", "b"], Some("t1"))));

        let more = pager.load_more().unwrap();
        pager.apply(
            PageKind::Next,
            more.epoch,
            Err(SearchError::Protocol("502 Bad Gateway".into())),
        );

        let snap = pager.snapshot();
        assert_eq!(urls(&snap), ["a", "b"]);
        assert_eq!(snap.phase, Phase::Error);

        // The token survived the failure, so a retry reuses it.
        let retry = pager.load_more().expect("retry after next-page failure");
        assert_eq!(retry.token.as_deref(), Some("t1"));
    }

    #[test]
    fn test_filter_switch_discards_stale_response() {
        let mut pager = SearchPager::new(Filter::All);
        let old = pager.set_query("x");

        // Filter changes before the first response lands.
        let new = pager.set_filter(Filter::Videos);

        // Late response for the old epoch is swallowed.
        pager.apply(PageKind::First, old.epoch, Ok(page(&["stale"], Some("t0"))));
        let snap = pager.snapshot();
        assert!(snap.items.is_empty());
        assert_eq!(snap.phase, Phase::Loading);
        assert!(!pager.has_more(), "stale token must not be stored");

        // Only the new epoch's response populates the list.
        pager.apply(PageKind::First, new.epoch, Ok(page(&["fresh"], None)));
        assert_eq!(urls(&pager.snapshot()), ["fresh"]);
    }

    #[test]
    fn test_stale_failure_is_silent() {
        let mut pager = SearchPager::new(Filter::All);
        let old = pager.set_query("x");
        let new = pager.set_query("y");

        pager.apply(
            PageKind::First,
            old.epoch,
            Err(SearchError::Transport("timed out".into())),
        );
        // Still loading the new epoch; no visible error.
        assert_eq!(pager.snapshot().phase, Phase::Loading);

        pager.apply(PageKind::First, new.epoch, Ok(page(&["a"], Some("t"))));
        assert_eq!(pager.snapshot().phase, Phase::Ready);
    }

    #[test]
    fn test_empty_first_page_is_not_an_error() {
        let mut pager = SearchPager::new(Filter::All);
        let fetch = pager.set_query("qqqqzzzz");
        pager.apply(PageKind::First, fetch.epoch, Ok(page(&[], Some("t1"))));
        let snap = pager.snapshot();
        assert!(snap.items.is_empty());
        assert_eq!(snap.phase, Phase::Ready);
    }

    #[test]
    fn test_missing_token_means_exhausted() {
        let mut pager = SearchPager::new(Filter::All);
        let first = pager.set_query("cats");
        pager.apply(PageKind::First, first.epoch, Ok(page(&["a"], Some("t1"))));

        let more = pager.load_more().unwrap();
        pager.apply(PageKind::Next, more.epoch, Ok(page(&["b"], None)));

        let snap = pager.snapshot();
        assert_eq!(snap.phase, Phase::Exhausted);
        assert!(!pager.has_more());
        assert!(pager.load_more().is_none());
        // The items are all still there.
        assert_eq!(urls(&snap), ["a", "b"]);
    }

    #[test]
    fn test_query_change_while_loading_more() {
        let mut pager = SearchPager::new(Filter::All);
        let first = pager.set_query("cats");
        pager.apply(PageKind::First, first.epoch, Ok(page(&["a"], Some("t1"))));
        let more = pager.load_more().unwrap();

        // New query invalidates the outstanding next-page fetch.
        let fresh = pager.set_query("dogs");
        pager.apply(PageKind::Next, more.epoch, Ok(page(&["late"], Some("t2"))));

        let snap = pager.snapshot();
        assert!(snap.items.is_empty());
        assert_eq!(snap.phase, Phase::Loading);

        pager.apply(PageKind::First, fresh.epoch, Ok(page(&["d"], None)));
        assert_eq!(urls(&pager.snapshot()), ["d"]);
    }
}
