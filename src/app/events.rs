use crate::piped::{SearchError, SearchPage};
use crate::search::{Epoch, PageKind};

#[derive(Debug, Clone)]
pub enum Event {
    Input(InputEvent),
    Network(NetworkEvent),
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Key(crossterm::event::KeyEvent),
    Mouse(crossterm::event::MouseEvent),
    Resize,
}

#[derive(Debug, Clone)]
pub enum NetworkEvent {
    /// A search fetch completed. Carries the epoch stamp from issue time;
    /// the pager decides whether the result is still current.
    Page {
        kind: PageKind,
        epoch: Epoch,
        result: Result<SearchPage, SearchError>,
    },
    /// A thumbnail landed in the image cache.
    ThumbnailLoaded { url: String },
    /// Recent queries read from storage at startup.
    RecentSearches { queries: Vec<String> },
}
