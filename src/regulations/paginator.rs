//! Walks every listing page of a docket and aggregates the comments

use tracing::{debug, info, warn};

use crate::models::AggregateTable;
use crate::regulations::fetcher::{RateLimit, RateLimitedFetcher};
use crate::regulations::urls::UrlBuilder;
use crate::regulations::{CommentPage, RegulationsError};

/// Drives the fetcher across all pages of a docket's comment listing
pub struct DocketPaginator<'a> {
    fetcher: &'a RateLimitedFetcher,
    urls: &'a UrlBuilder,
    page_size: u32,
}

impl<'a> DocketPaginator<'a> {
    pub fn new(fetcher: &'a RateLimitedFetcher, urls: &'a UrlBuilder, page_size: u32) -> Self {
        Self {
            fetcher,
            urls,
            page_size,
        }
    }

    /// Collect every comment of `docket_id`, page 1 first.
    ///
    /// The row count is expected to equal the `totalElements` of page 1. When
    /// comments are posted while the listing is being walked the two can drift
    /// apart; that is logged and accepted.
    pub async fn collect_all_comments(
        &self,
        docket_id: &str,
        rate_limit: RateLimit,
    ) -> Result<(AggregateTable, RateLimit), RegulationsError> {
        let first_url = self.urls.docket_page(docket_id, 1, self.page_size);
        let (first, mut rate_limit): (CommentPage, _) =
            self.fetcher.fetch_json(&first_url, rate_limit).await?;

        let total_pages = first.meta.total_pages;
        let total_elements = first.meta.total_elements;
        info!(
            "Docket {} has {} comments across {} pages",
            docket_id, total_elements, total_pages
        );

        let mut table = AggregateTable::new(docket_id, total_elements);
        table.extend(first.data);

        if first.meta.has_next_page {
            for page_number in 2..=total_pages {
                let url = self.urls.docket_page(docket_id, page_number, self.page_size);
                let (page, updated): (CommentPage, _) = self.fetcher.fetch_json(&url, rate_limit).await?;
                rate_limit = updated;

                debug!(
                    "Page {}/{} of {}: {} comments (quota remaining: {})",
                    page_number,
                    total_pages,
                    docket_id,
                    page.data.len(),
                    rate_limit
                );
                table.extend(page.data);
            }
        }

        if table.len() as u64 != total_elements {
            warn!(
                "Docket {} reported {} comments but {} were collected",
                docket_id,
                total_elements,
                table.len()
            );
        }

        let duplicates = table.duplicate_ids();
        if !duplicates.is_empty() {
            warn!(
                "Docket {} listing returned {} duplicated comment ids (first: {})",
                docket_id,
                duplicates.len(),
                duplicates[0]
            );
        }

        println!("Number of comments in Docket {}: {}", docket_id, table.len());
        Ok((table, rate_limit))
    }
}
