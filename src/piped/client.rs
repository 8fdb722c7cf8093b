use crate::piped::models::{Filter, SearchPage};

/// Failure classes of the search endpoints.
///
/// The pager reacts to both the same way (surface `Phase::Error`), but the
/// event loop logs them distinctly. Payloads are plain strings so completion
/// events stay `Clone` and can cross the mpsc channel.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    /// No connectivity, DNS failure, timeout — transport never delivered
    /// a response.
    #[error("network unreachable: {0}")]
    Transport(String),
    /// The instance answered, but with an error status or a body we could
    /// not decode.
    #[error("bad response from instance: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_status() || e.is_decode() {
            SearchError::Protocol(e.to_string())
        } else {
            SearchError::Transport(e.to_string())
        }
    }
}

/// Typed wrapper over a Piped instance's search endpoints.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    base_url: String,
}

impl SearchClient {
    const USER_AGENT: &'static str = "spyglass/0.1.0 (https://github.com/spyglass)";

    pub fn new(api_url: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        let http = reqwest::Client::builder()
            .user_agent(Self::USER_AGENT)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            http,
            base_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// First-page search: `GET {api}/search?q=…&filter=…`.
    pub async fn search(&self, query: &str, filter: Filter) -> Result<SearchPage, SearchError> {
        let url = format!(
            "{}/search?q={}&filter={}",
            self.base_url,
            urlencoding::encode(query),
            filter.as_str()
        );
        self.fetch_page(&url).await
    }

    /// Continuation fetch: `GET {api}/nextpage/search?q=…&filter=…&nextpage=…`.
    ///
    /// The token is opaque server state; we pass it back verbatim
    /// (percent-encoded) and never look inside.
    pub async fn search_next_page(
        &self,
        query: &str,
        filter: Filter,
        token: &str,
    ) -> Result<SearchPage, SearchError> {
        let url = format!(
            "{}/nextpage/search?q={}&filter={}&nextpage={}",
            self.base_url,
            urlencoding::encode(query),
            filter.as_str(),
            urlencoding::encode(token)
        );
        self.fetch_page(&url).await
    }

    async fn fetch_page(&self, url: &str) -> Result<SearchPage, SearchError> {
        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            return Err(SearchError::Protocol(format!(
                "search returned {}",
                response.status()
            )));
        }

        let page: SearchPage = response
            .json()
            .await
            .map_err(|e| SearchError::Protocol(e.to_string()))?;
        Ok(page)
    }

    /// Raw first-page JSON, for the headless `search-json` command.
    pub async fn search_raw(
        &self,
        query: &str,
        filter: Filter,
    ) -> Result<serde_json::Value, SearchError> {
        let url = format!(
            "{}/search?q={}&filter={}",
            self.base_url,
            urlencoding::encode(query),
            filter.as_str()
        );
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(SearchError::Protocol(format!(
                "search returned {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| SearchError::Protocol(e.to_string()))
    }
}
