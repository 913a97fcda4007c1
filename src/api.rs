use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::info;

use crate::error::FetchError;
use crate::types::RawRow;

pub const DEFAULT_SOURCE_URL: &str = "https://www.kenousa.com/games/GVR/Green/draws.php";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const ROW_SELECTOR: &str = "div.col-xs-12";
const GAME_NUM_SELECTOR: &str = ".game-num";
const GAME_ID_SELECTOR: &str = ".game-num a";
const GAME_DATE_SELECTOR: &str = ".game-date";
const GAME_DRAW_SELECTOR: &str = ".game-draw";

/// Source of raw listing rows for one ingestion run.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawRow>, FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpFetcher {
    pub fn new(url: &str, user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub async fn fetch_html(&self) -> Result<String, FetchError> {
        info!("Loading {}...", self.url);
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "text/html,application/xhtml+xml")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: self.url.clone(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self) -> Result<Vec<RawRow>, FetchError> {
        let html = self.fetch_html().await?;
        let rows = parse_listing(&html)?;
        info!("Found {} potential draws.", rows.len());
        Ok(rows)
    }
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Selector {
        selector: css.to_string(),
        detail: e.to_string(),
    })
}

fn first_text(row: &ElementRef, selector: &Selector, sep: &str) -> Option<String> {
    row.select(selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(sep))
}

/// Pull one `RawRow` out of every listing entry on the page.
///
/// An entry is a `div.col-xs-12` holding a `.game-num`; wrappers around
/// several entries are skipped. Missing pieces come back as empty text.
pub fn parse_listing(html: &str) -> Result<Vec<RawRow>, FetchError> {
    let row_sel = selector(ROW_SELECTOR)?;
    let num_sel = selector(GAME_NUM_SELECTOR)?;
    let id_sel = selector(GAME_ID_SELECTOR)?;
    let date_sel = selector(GAME_DATE_SELECTOR)?;
    let draw_sel = selector(GAME_DRAW_SELECTOR)?;

    let document = Html::parse_document(html);
    let has_game_num = |el: &ElementRef| el.select(&num_sel).next().is_some();

    let rows = document
        .select(&row_sel)
        .filter(|el| has_game_num(el))
        .filter(|el| {
            !el.select(&row_sel)
                .any(|inner| inner.id() != el.id() && has_game_num(&inner))
        })
        .map(|el| RawRow {
            game_id: first_text(&el, &id_sel, "")
                .or_else(|| first_text(&el, &num_sel, ""))
                .unwrap_or_default(),
            timestamp: first_text(&el, &date_sel, "").unwrap_or_default(),
            numbers: first_text(&el, &draw_sel, " ").unwrap_or_default(),
        })
        .collect();

    Ok(rows)
}
