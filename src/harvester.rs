//! End-to-end extraction of one docket: listing, details, CSV, attachments

use anyhow::{Context, Result};
use chrono::Local;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::config::Config;
use crate::downloader::{self, DownloadSummary};
use crate::models::AggregateTable;
use crate::regulations::{
    ApiKey, CommentDetailFetcher, DocketPaginator, RateLimit, RateLimitedFetcher,
    RegulationsError, UrlBuilder,
};
use crate::table::{Frame, TableError};

/// Which stages of the pipeline to run after the listing
#[derive(Debug, Clone, Copy)]
pub struct HarvestOptions {
    pub fetch_details: bool,
    pub download_attachments: bool,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            fetch_details: true,
            download_attachments: true,
        }
    }
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct HarvestReport {
    pub comments: usize,
    pub reported_total: u64,
    pub csv_path: PathBuf,
    pub attachments: Option<DownloadSummary>,
    pub rate_limit: RateLimit,
}

/// Owns the HTTP clients and the single quota counter for one run
pub struct Harvester {
    config: Config,
    urls: UrlBuilder,
    fetcher: RateLimitedFetcher,
    download_client: Client,
    rate_limit: RateLimit,
}

impl Harvester {
    pub fn new(config: Config, api_key: ApiKey) -> Result<Self, RegulationsError> {
        let client = Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(config.http_timeout())
            .build()?;

        // Attachment bodies may take arbitrarily long; only connecting is bounded
        let download_client = Client::builder()
            .user_agent(&config.http.user_agent)
            .connect_timeout(config.http_timeout())
            .build()?;

        let urls = UrlBuilder::new(&config.api.base_url, api_key);
        let fetcher = RateLimitedFetcher::new(client, &config, urls.quota_probe());
        let rate_limit = RateLimit::new(config.rate_limits.initial_quota);

        Ok(Self {
            config,
            urls,
            fetcher,
            download_client,
            rate_limit,
        })
    }

    pub fn rate_limit(&self) -> RateLimit {
        self.rate_limit
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// All listing pages of `docket_id`, aggregated in page order
    pub async fn collect_all_comments(&mut self, docket_id: &str) -> Result<AggregateTable, RegulationsError> {
        let paginator = DocketPaginator::new(&self.fetcher, &self.urls, self.config.api.page_size);
        let (table, rate_limit) = paginator.collect_all_comments(docket_id, self.rate_limit).await?;
        self.rate_limit = rate_limit;
        Ok(table)
    }

    /// Fill comment text and attachment links for every row
    pub async fn attach_details(&mut self, table: &mut AggregateTable) -> Result<(), RegulationsError> {
        let details = CommentDetailFetcher::new(&self.fetcher, &self.urls);
        self.rate_limit = details.attach_details(table, self.rate_limit).await?;
        Ok(())
    }

    /// Flatten `attributes` and write `{docket}_{timestamp}.csv` to the output directory
    pub fn export_csv(&self, table: &AggregateTable) -> Result<PathBuf, TableError> {
        Frame::from_table(table)
            .flatten_nested("attributes")?
            .export_csv(&self.config.output_dir, &table.docket_id, &Local::now())
    }

    pub async fn download_attachments(&self, table: &AggregateTable) -> Result<DownloadSummary, RegulationsError> {
        downloader::download_attachments(&self.download_client, table, &self.config.output_dir).await
    }

    /// Refresh the quota counter from the API
    pub async fn check_quota(&mut self) -> Result<RateLimit, RegulationsError> {
        self.rate_limit = self.fetcher.check_quota().await?;
        Ok(self.rate_limit)
    }

    /// Run the pipeline for one docket. Any failure before the attachment stage aborts the run.
    pub async fn run(&mut self, docket_id: &str, options: HarvestOptions) -> Result<HarvestReport> {
        let start_time = Instant::now();
        println!("🚀 Collecting comments for docket {}", docket_id);

        let mut table = self
            .collect_all_comments(docket_id)
            .await
            .with_context(|| format!("Failed to list comments of docket {}", docket_id))?;

        if options.fetch_details {
            println!("📝 Fetching text and attachments for {} comments", table.len());
            self.attach_details(&mut table)
                .await
                .with_context(|| format!("Failed to fetch comment details of docket {}", docket_id))?;
        }

        let csv_path = self
            .export_csv(&table)
            .with_context(|| format!("Failed to export comments of docket {}", docket_id))?;
        println!("💾 Saved {} comments to {}", table.len(), csv_path.display());

        let attachments = if options.fetch_details && options.download_attachments {
            let summary = self.download_attachments(&table).await?;
            println!(
                "📎 Downloaded {} attachments ({} failed)",
                summary.downloaded, summary.failed
            );
            Some(summary)
        } else {
            None
        };

        let elapsed = start_time.elapsed();
        info!(
            "Finished docket {} in {} minutes {} seconds, quota remaining {}",
            docket_id,
            elapsed.as_secs() / 60,
            elapsed.as_secs() % 60,
            self.rate_limit
        );

        Ok(HarvestReport {
            comments: table.len(),
            reported_total: table.total_elements,
            csv_path,
            attachments,
            rate_limit: self.rate_limit,
        })
    }
}
