use std::process::ExitCode;

use anyhow::{Context, Result};
use repdscraper::{
    config::Config,
    fetch,
    history::AccumulatedStore,
    notify::{notify_and_log, Notifier},
    ops_log::OpsLog,
    pipeline,
};
use reqwest::Client;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("update run failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    // ─── 2) configuration ────────────────────────────────────────────
    let cfg = Config::load()?;
    let ops_log = OpsLog::new(&cfg.log_file);
    let client = Client::builder()
        .user_agent(concat!("repdscraper/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")?;
    let notifier = Notifier::from_env(&client, cfg.notify.enabled);

    // ─── 3) locate the current extract ───────────────────────────────
    let url = match fetch::urls::locate_extract_url(&client, &cfg).await {
        Ok(url) => url,
        Err(e) => {
            ops_log.log(&format!("Could not locate latest extract: {}", e));
            return Err(e.into());
        }
    };

    // ─── 4) download unless already cached ───────────────────────────
    let download =
        match fetch::extract::download_extract(&client, &url, &cfg.raw_dir, cfg.http).await {
            Ok(d) => d,
            Err(e) => {
                ops_log.log(&format!("Download of {} failed: {}", url, e));
                return Err(e.into());
            }
        };
    let file_name = download
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if download.skipped {
        ops_log.log(&format!("Skipped download: {} already exists.", file_name));
    } else {
        ops_log.log(&format!(
            "Downloaded and saved: {} ({} bytes)",
            file_name, download.bytes_written
        ));
    }

    // ─── 5) normalize + reconcile + persist ──────────────────────────
    let store = AccumulatedStore::new(&cfg.accumulated_file);
    let outcome = match pipeline::ingest_extract(&download.path, &cfg, &store, &ops_log) {
        Ok(o) => o,
        Err(e) => {
            ops_log.log(&format!("Ingest of {} failed: {}", file_name, e));
            return Err(e.into());
        }
    };
    info!(
        added = outcome.added,
        duplicates = outcome.duplicates,
        rejected = outcome.rejected,
        total = outcome.total,
        "updated {}",
        store.path().display()
    );

    // ─── 6) tell the operator about new data ─────────────────────────
    if outcome.added > 0 {
        let subject = format!("{}: {} new projects", cfg.notify.subject_prefix, outcome.added);
        let body = format!(
            "A new REPD extract ({}) was merged into {}.\n\
             New rows: {}\nAlready present: {}\nRows without Ref ID: {}\nTotal rows: {}\n\
             New Ref IDs: {}\n",
            outcome.source_name,
            store.path().display(),
            outcome.added,
            outcome.duplicates,
            outcome.rejected,
            outcome.total,
            outcome.new_ref_ids.join(", "),
        );
        notify_and_log(&notifier, &ops_log, &subject, &body).await;
    }

    info!("all done");
    Ok(())
}
