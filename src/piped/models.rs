use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Search filter accepted by the Piped search endpoints. The set is closed:
/// the remote API rejects anything outside these eight values, so an invalid
/// filter is unrepresentable here rather than a runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    #[default]
    All,
    Videos,
    Channels,
    Playlists,
    MusicSongs,
    MusicVideos,
    MusicAlbums,
    MusicPlaylists,
}

impl Filter {
    pub const ALL: [Filter; 8] = [
        Filter::All,
        Filter::Videos,
        Filter::Channels,
        Filter::Playlists,
        Filter::MusicSongs,
        Filter::MusicVideos,
        Filter::MusicAlbums,
        Filter::MusicPlaylists,
    ];

    /// Wire value sent as the `filter` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Videos => "videos",
            Filter::Channels => "channels",
            Filter::Playlists => "playlists",
            Filter::MusicSongs => "music_songs",
            Filter::MusicVideos => "music_videos",
            Filter::MusicAlbums => "music_albums",
            Filter::MusicPlaylists => "music_playlists",
        }
    }

    /// Short label for the filter chip row.
    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Videos => "Videos",
            Filter::Channels => "Channels",
            Filter::Playlists => "Playlists",
            Filter::MusicSongs => "Songs",
            Filter::MusicVideos => "Music videos",
            Filter::MusicAlbums => "Albums",
            Filter::MusicPlaylists => "Music playlists",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// One search result as returned by the index. The pager treats these as
/// opaque; only the renderer looks inside. Every field is optional or
/// defaulted so schema drift on the instance cannot break pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchItem {
    /// "stream", "channel" or "playlist".
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    /// Streams carry `title`, channels and playlists carry `name`.
    pub title: Option<String>,
    pub name: Option<String>,
    pub thumbnail: Option<String>,
    pub uploader_name: Option<String>,
    pub uploader_url: Option<String>,
    pub uploaded_date: Option<String>,
    pub duration: Option<i64>,
    pub views: Option<i64>,
    pub uploader_verified: bool,
}

impl Default for SearchItem {
    fn default() -> Self {
        Self {
            kind: String::new(),
            url: String::new(),
            title: None,
            name: None,
            thumbnail: None,
            uploader_name: None,
            uploader_url: None,
            uploaded_date: None,
            duration: None,
            views: None,
            uploader_verified: false,
        }
    }
}

impl SearchItem {
    /// Display title regardless of item kind.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("(untitled)")
    }
}

/// One page of search results. `items` may be absent or null in the wire
/// response ("treat as empty"); `nextpage` absent means no further pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPage {
    #[serde(deserialize_with = "null_as_empty")]
    pub items: Vec<SearchItem>,
    pub nextpage: Option<String>,
}

fn null_as_empty<'de, D>(de: D) -> Result<Vec<SearchItem>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<Vec<SearchItem>>::deserialize(de)?;
    Ok(opt.unwrap_or_default())
}
