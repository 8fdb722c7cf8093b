pub mod actions;
pub mod events;
pub mod state;

use crate::config::Config;
use crate::images::ImageLoader;
use crate::input;
use crate::piped::{SearchClient, SearchError, SearchItem};
use crate::search::{PageFetch, PageKind, Phase};
use crate::storage::Storage;
use crate::tui::{self, TuiTerminal};
use actions::Action;
use events::{Event, NetworkEvent};
use state::{AppState, Focus, Toast};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// How many freshly arrived results get their thumbnail prefetched.
const THUMB_PREFETCH: usize = 12;
/// Rows assumed visible when adjusting the virtual scroll window.
const VISIBLE_ROWS: usize = 20;

pub struct App {
    cfg: Config,
    state: AppState,
    client: SearchClient,
    images: Arc<ImageLoader>,
}

impl App {
    pub fn new(cfg: Config) -> anyhow::Result<Self> {
        let client = SearchClient::new(&cfg.instance.api_url)?;
        let images = Arc::new(ImageLoader::new(&cfg.images, &cfg.paths.data_dir)?);
        let state = AppState::new(cfg.search.default_filter);

        Ok(Self {
            cfg,
            state,
            client,
            images,
        })
    }

    pub async fn run(&mut self, terminal: &mut TuiTerminal) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel::<Event>(256);

        input::spawn_input_task(tx.clone());
        self.spawn_load_recent(&tx);

        // First draw; afterwards we re-render on every event.
        tui::draw(terminal, &mut self.state)?;

        while let Some(ev) = rx.recv().await {
            self.state.tick += 1;
            match ev {
                Event::Input(input_ev) => {
                    if let Some(action) = input::map_input_to_action(&self.state, input_ev) {
                        self.handle_action(action, &tx);
                    }
                }
                Event::Network(ne) => {
                    self.handle_network(ne, &tx);
                }
            }

            if self.state.should_quit {
                break;
            }

            tui::draw(terminal, &mut self.state)?;
        }

        Ok(())
    }

    fn handle_action(&mut self, action: Action, tx: &mpsc::Sender<Event>) {
        match action {
            Action::Quit => self.state.should_quit = true,
            Action::SetFocus(f) => self.state.focus = f,
            Action::ToggleHelp => self.state.show_help = !self.state.show_help,
            Action::Resize => {}

            Action::InputChar(c) => self.state.query_input.push(c),
            Action::Backspace => {
                self.state.query_input.pop();
            }
            Action::ClearInput => self.state.query_input.clear(),

            Action::StartSearch => {
                let query = self.state.query_input.trim().to_string();
                if query.is_empty() {
                    self.state.status = "Type a query first".into();
                    return;
                }
                self.spawn_record_search(&query);
                self.state.status = format!("Searching: {query}");
                let fetch = self.state.pager.set_query(query);
                self.state.refresh_results();
                // Hand the keyboard to the list, like dismissing an
                // on-screen keyboard after submit.
                self.state.focus = Focus::Results;
                self.spawn_page_fetch(fetch, tx);
            }

            // Filter chips restart pagination exactly like a new query:
            // everything in flight is invalidated by the epoch bump.
            Action::NextFilter => {
                let filter = self.state.pager.filter().next();
                let fetch = self.state.pager.set_filter(filter);
                self.state.status = format!("Filter: {}", filter.label());
                self.state.refresh_results();
                self.spawn_page_fetch(fetch, tx);
            }
            Action::PrevFilter => {
                let filter = self.state.pager.filter().prev();
                let fetch = self.state.pager.set_filter(filter);
                self.state.status = format!("Filter: {}", filter.label());
                self.state.refresh_results();
                self.spawn_page_fetch(fetch, tx);
            }

            Action::ListUp => {
                self.state.select_prev();
                self.state.update_scroll(VISIBLE_ROWS);
            }
            Action::ListDown => {
                self.state.select_next();
                self.state.update_scroll(VISIBLE_ROWS);
                self.maybe_load_more(tx);
            }
            Action::GoTop => self.state.select_first(),
            Action::GoBottom => {
                self.state.select_last();
                self.state.update_scroll(VISIBLE_ROWS);
                self.maybe_load_more(tx);
            }
            Action::PageUp => {
                self.state.page_up();
                self.state.update_scroll(VISIBLE_ROWS);
            }
            Action::PageDown => {
                self.state.page_down();
                self.state.update_scroll(VISIBLE_ROWS);
                self.maybe_load_more(tx);
            }

            Action::Activate => {
                if let Some(item) = self.state.selected_item() {
                    self.state.status =
                        format!("{} — {}", item.display_title(), item.url);
                }
            }

            Action::Refresh => {
                if self.state.pager.query().is_empty() {
                    self.state.status = "Nothing to refresh yet".into();
                    return;
                }
                let query = self.state.pager.query().to_string();
                let fetch = self.state.pager.set_query(query);
                self.state.refresh_results();
                self.spawn_page_fetch(fetch, tx);
            }
        }
    }

    fn handle_network(&mut self, ne: NetworkEvent, tx: &mpsc::Sender<Event>) {
        match ne {
            NetworkEvent::Page {
                kind,
                epoch,
                result,
            } => {
                if epoch != self.state.pager.epoch() {
                    // Let the pager trace the discard; nothing visible happens.
                    self.state.pager.apply(kind, epoch, result);
                    return;
                }

                let err_text = result.as_ref().err().map(|e| e.to_string());
                let before = self.state.results.items.len();
                self.state.pager.apply(kind, epoch, result);
                if kind == PageKind::First {
                    self.state.select_first();
                }
                self.state.refresh_results();

                match self.state.results.phase {
                    Phase::Error => {
                        let msg = err_text.unwrap_or_else(|| "search failed".into());
                        self.state.toast = Some(Toast::error(msg.clone()));
                        self.state.status = format!("Error: {msg} (F5 to retry)");
                    }
                    _ => {
                        let after = self.state.results.items.len();
                        self.state.status = match kind {
                            PageKind::First => format!("Results: {after}"),
                            PageKind::Next => {
                                format!("Results: {after} (+{})", after.saturating_sub(before))
                            }
                        };
                        if self.state.results.phase == Phase::Exhausted && after == before {
                            self.state.status = format!("Results: {after} (end)");
                        }
                        let start = if kind == PageKind::First { 0 } else { before };
                        let fresh: Vec<SearchItem> =
                            self.state.results.items[start..].to_vec();
                        self.spawn_thumbnails(&fresh, tx);
                    }
                }
            }
            NetworkEvent::ThumbnailLoaded { url } => {
                debug!(%url, "thumbnail cached");
                self.state.thumbs_cached += 1;
            }
            NetworkEvent::RecentSearches { queries } => {
                self.state.recent_searches = queries;
            }
        }
    }

    fn maybe_load_more(&mut self, tx: &mpsc::Sender<Event>) {
        if !self.state.near_end() {
            return;
        }
        // load_more is a no-op unless Ready (or retrying a failed page),
        // so duplicate triggers from fast scrolling are harmless.
        if let Some(fetch) = self.state.pager.load_more() {
            self.state.status = "Loading more results...".into();
            self.state.refresh_results();
            self.spawn_page_fetch(fetch, tx);
        }
    }

    fn spawn_page_fetch(&self, fetch: PageFetch, tx: &mpsc::Sender<Event>) {
        let client = self.client.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = match fetch.kind {
                PageKind::First => client.search(&fetch.query, fetch.filter).await,
                PageKind::Next => {
                    let token = fetch.token.as_deref().unwrap_or_default();
                    client
                        .search_next_page(&fetch.query, fetch.filter, token)
                        .await
                }
            };

            match &result {
                Err(SearchError::Transport(e)) => warn!(%e, "search transport failure"),
                Err(SearchError::Protocol(e)) => warn!(%e, "search protocol failure"),
                Ok(_) => {}
            }

            let _ = tx
                .send(Event::Network(NetworkEvent::Page {
                    kind: fetch.kind,
                    epoch: fetch.epoch,
                    result,
                }))
                .await;
        });
    }

    /// Warm the image cache for freshly arrived results. Purely advisory:
    /// failures are logged and forgotten, data-saver mode makes every load
    /// a no-op inside the loader.
    fn spawn_thumbnails(&self, items: &[SearchItem], tx: &mpsc::Sender<Event>) {
        for url in items
            .iter()
            .filter_map(|i| i.thumbnail.clone())
            .take(THUMB_PREFETCH)
        {
            let images = self.images.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                match images.load(&url).await {
                    Ok(Some(_)) => {
                        let _ = tx
                            .send(Event::Network(NetworkEvent::ThumbnailLoaded { url }))
                            .await;
                    }
                    Ok(None) => {}
                    Err(e) => debug!(%url, "thumbnail fetch failed: {e:#}"),
                }
            });
        }
    }

    fn spawn_record_search(&self, query: &str) {
        let db = self.cfg.paths.data_dir.join("spyglass.sqlite3");
        let query = query.to_string();
        let filter = self.state.pager.filter().as_str();
        tokio::task::spawn_blocking(move || {
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs() as i64;
            if let Err(e) = Storage::open(&db).and_then(|s| s.record_search(&query, filter, now)) {
                debug!("record search failed: {e:#}");
            }
        });
    }

    fn spawn_load_recent(&self, tx: &mpsc::Sender<Event>) {
        let db = self.cfg.paths.data_dir.join("spyglass.sqlite3");
        let tx = tx.clone();
        tokio::task::spawn_blocking(move || {
            match Storage::open(&db).and_then(|s| s.recent_searches(8)) {
                Ok(queries) => {
                    let _ = tx.blocking_send(Event::Network(NetworkEvent::RecentSearches {
                        queries,
                    }));
                }
                Err(e) => debug!("load recent searches failed: {e:#}"),
            }
        });
    }
}
