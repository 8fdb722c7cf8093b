mod app;
mod config;
mod images;
mod input;
mod piped;
mod search;
mod storage;
mod tui;

use anyhow::Context;
use clap::{Parser, Subcommand};
use piped::{Filter, SearchClient};
use search::{PageKind, Phase, SearchPager};

#[derive(Debug, Parser)]
#[command(name = "spyglass", version, about = "Terminal search client for Piped instances")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the interactive TUI (default).
    Tui,
    /// Search and print results to stdout (headless).
    Search {
        query: String,
        /// Search filter.
        #[arg(long, value_enum, default_value_t = Filter::All)]
        filter: Filter,
        /// How many pages to fetch before stopping.
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Dump raw first-page search JSON to stdout (headless).
    SearchJson {
        query: String,
        #[arg(long, value_enum, default_value_t = Filter::All)]
        filter: Filter,
    },
    /// Fetch a thumbnail through the cache and write it to a file.
    Thumb {
        url: String,
        /// Output path; format follows the extension.
        #[arg(short, long, default_value = "thumb.png")]
        out: std::path::PathBuf,
        /// Center-crop to a square before writing.
        #[arg(long)]
        square: bool,
    },
    /// Delete the thumbnail disk cache and recent-search history.
    ClearCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            let mut terminal =
                tui::TerminalGuard::enter(cfg.input.mouse).context("init terminal")?;
            let mut app = app::App::new(cfg)?;
            app.run(terminal.terminal_mut()).await?;
        }
        Command::Search {
            query,
            filter,
            pages,
        } => {
            let client = SearchClient::new(&cfg.instance.api_url)?;
            run_headless_search(&client, &query, filter, pages).await?;
        }
        Command::SearchJson { query, filter } => {
            let client = SearchClient::new(&cfg.instance.api_url)?;
            let v = client.search_raw(&query, filter).await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
        }
        Command::Thumb { url, out, square } => {
            // Headless fetch is explicit user intent, so data-saver does
            // not apply here.
            let mut images_cfg = cfg.images.clone();
            images_cfg.data_saver = false;
            let loader = images::ImageLoader::new(&images_cfg, &cfg.paths.data_dir)?;

            let bytes = loader
                .load(&url)
                .await?
                .context("image loading disabled")?;
            if square {
                let img = images::square_thumbnail(&bytes)?;
                img.save(&out)
                    .with_context(|| format!("write {}", out.display()))?;
            } else {
                std::fs::write(&out, bytes.as_slice())
                    .with_context(|| format!("write {}", out.display()))?;
            }
            println!("Wrote {}", out.display());
        }
        Command::ClearCache => {
            let loader = images::ImageLoader::new(&cfg.images, &cfg.paths.data_dir)?;
            let before = loader.cache_bytes_on_disk();
            loader.clear_disk_cache()?;

            let db = cfg.paths.data_dir.join("spyglass.sqlite3");
            if db.exists() {
                storage::Storage::open(&db)?.clear_recent_searches()?;
            }
            println!("Cleared {} KiB of thumbnails and recent searches.", before / 1024);
        }
    }

    Ok(())
}

/// Drive the pager through up to `pages` pages and print every item. The
/// same state machine the TUI uses, just with the fetches run inline.
async fn run_headless_search(
    client: &SearchClient,
    query: &str,
    filter: Filter,
    pages: u32,
) -> anyhow::Result<()> {
    let pages = pages.max(1);
    let mut pager = SearchPager::new(filter);
    let mut fetch = pager.set_query(query);

    for page_no in 1..=pages {
        let result = match fetch.kind {
            PageKind::First => client.search(&fetch.query, fetch.filter).await,
            PageKind::Next => {
                let token = fetch.token.as_deref().unwrap_or_default();
                client.search_next_page(&fetch.query, fetch.filter, token).await
            }
        };
        pager.apply(fetch.kind, fetch.epoch, result);

        if pager.snapshot().phase == Phase::Error {
            anyhow::bail!("search failed for {query:?}");
        }
        if page_no == pages {
            break;
        }
        match pager.load_more() {
            Some(next) => fetch = next,
            None => break,
        }
    }

    let snap = pager.snapshot();
    for (i, item) in snap.items.iter().enumerate() {
        let uploader = item
            .uploader_name
            .as_deref()
            .map(|u| format!(" — {u}"))
            .unwrap_or_default();
        println!("{:02}. {}{}  ({})", i + 1, item.display_title(), uploader, item.url);
    }
    if snap.items.is_empty() {
        println!("No results.");
    }
    Ok(())
}
