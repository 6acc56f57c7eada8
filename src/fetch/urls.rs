// src/fetch/urls.rs

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{info, instrument};
use url::Url;

use super::get_with_retry;
use crate::{config::Config, error::IngestError};

/// First link (document order) whose target path ends with `extension` and
/// whose file name contains `keyword`, both compared case-insensitively.
/// Relative hrefs are resolved against `base`.
pub fn find_extract_link(html: &str, base: &Url, extension: &str, keyword: &str) -> Option<Url> {
    let selector = Selector::parse("a[href]").expect("selector should parse");
    let extension = extension.to_lowercase();
    let keyword = keyword.to_lowercase();

    Html::parse_document(html)
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .find(|url| {
            let name = url
                .path_segments()
                .and_then(|mut segs| segs.next_back())
                .unwrap_or("")
                .to_lowercase();
            name.ends_with(&extension) && name.contains(&keyword)
        })
}

/// Scan the publication page for the current extract's download URL.
#[instrument(level = "info", skip(client, cfg), fields(page = %cfg.page_url))]
pub async fn locate_extract_url(client: &Client, cfg: &Config) -> Result<Url, IngestError> {
    let page = Url::parse(&cfg.page_url)
        .map_err(|e| IngestError::Config(format!("page_url {}: {}", cfg.page_url, e)))?;
    let html = get_with_retry(client, &page, cfg.http)
        .await?
        .text()
        .await
        .map_err(|e| IngestError::Http {
            url: page.to_string(),
            source: e,
        })?;

    let url = find_extract_link(&html, &page, &cfg.link_extension, &cfg.link_keyword).ok_or_else(
        || IngestError::Discovery {
            page: page.to_string(),
            extension: cfg.link_extension.clone(),
            keyword: cfg.link_keyword.clone(),
        },
    )?;
    info!(%url, "located extract");
    Ok(url)
}
