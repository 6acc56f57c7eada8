use std::path::{Path, PathBuf};

use reqwest::Client;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

use super::get_with_retry;
use crate::{config::HttpConfig, error::IngestError};

const FALLBACK_NAME: &str = "extract.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub path: PathBuf,
    /// Bytes written by this call; `0` when skipped.
    pub bytes_written: u64,
    pub skipped: bool,
}

/// Local path for `url`: its last path segment under `dest_dir`.
pub fn destination_for(url: &Url, dest_dir: &Path) -> PathBuf {
    let name = url
        .path_segments()
        .and_then(|mut segs| segs.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_NAME);
    dest_dir.join(name)
}

/// Download `url` into `dest_dir` under its original file name.
///
/// If a file with that name already exists, nothing is fetched: presence by
/// name counts as already downloaded, with no checksum or freshness check.
/// The check is not safe against two runs fetching concurrently.
#[instrument(level = "info", skip(client, url, http, dest_dir), fields(url = %url))]
pub async fn download_extract(
    client: &Client,
    url: &Url,
    dest_dir: &Path,
    http: HttpConfig,
) -> Result<Download, IngestError> {
    let dest_path = destination_for(url, dest_dir);
    if fs::try_exists(&dest_path).await.unwrap_or(false) {
        info!(path = %dest_path.display(), "already downloaded, skipping");
        return Ok(Download {
            path: dest_path,
            bytes_written: 0,
            skipped: true,
        });
    }

    fs::create_dir_all(dest_dir)
        .await
        .map_err(|e| IngestError::persistence(dest_dir, e))?;

    let bytes = get_with_retry(client, url, http)
        .await?
        .bytes()
        .await
        .map_err(|e| IngestError::Http {
            url: url.to_string(),
            source: e,
        })?;

    // the final name only appears once the body is complete
    let part_path = dest_path.with_extension("part");
    fs::write(&part_path, &bytes)
        .await
        .map_err(|e| IngestError::persistence(&part_path, e))?;
    fs::rename(&part_path, &dest_path)
        .await
        .map_err(|e| IngestError::persistence(&dest_path, e))?;

    info!(path = %dest_path.display(), bytes = bytes.len(), "downloaded");
    Ok(Download {
        path: dest_path,
        bytes_written: bytes.len() as u64,
        skipped: false,
    })
}
