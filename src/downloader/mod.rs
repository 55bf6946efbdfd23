use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::models::AggregateTable;
use crate::regulations::RegulationsError;

pub mod attachment;

pub use attachment::{attachment_file_name, download_attachment};

/// Outcome of downloading every attachment of a docket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub failed: usize,
}

/// `{output_dir}/{docket_id}_attachments`
pub fn attachments_dir(output_dir: &Path, docket_id: &str) -> PathBuf {
    output_dir.join(format!("{}_attachments", docket_id))
}

/// Download every attachment link of `table` into `{output_dir}/{docket}_attachments/`.
///
/// Comments without attachments are skipped. A failed file is logged and
/// counted, and the remaining files are still attempted.
pub async fn download_attachments(
    client: &Client,
    table: &AggregateTable,
    output_dir: &Path,
) -> Result<DownloadSummary, RegulationsError> {
    let save_dir = attachments_dir(output_dir, &table.docket_id);
    std::fs::create_dir_all(&save_dir)?;

    let total = table.attachment_count();
    info!(
        "Downloading {} attachments for docket {} into {}",
        total,
        table.docket_id,
        save_dir.display()
    );

    let mut summary = DownloadSummary::default();

    for record in &table.records {
        let Some(links) = record.attach_link.present() else {
            continue;
        };

        for url in links.urls() {
            match download_attachment(client, url, &save_dir).await {
                Ok(path) => {
                    summary.downloaded += 1;
                    println!("✓ download {} complete", url);
                    info!("Saved attachment of {} to {}", record.id, path.display());
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!("✗ Failed to download attachment {} of {}: {}", url, record.id, e);
                }
            }
        }
    }

    info!(
        "Downloaded {} of {} attachments for docket {}",
        summary.downloaded, total, table.docket_id
    );
    Ok(summary)
}
