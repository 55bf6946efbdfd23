//! Regulations.gov (v4 API) module
//!
//! This module provides the client side of the public comments API: URL
//! construction, quota-aware fetching, docket pagination and per-comment
//! detail retrieval.

pub mod types;
pub mod errors;
pub mod urls;
pub mod fetcher;
pub mod paginator;
pub mod detail;

pub use types::*;
pub use errors::RegulationsError;

// Re-export commonly used items
pub use urls::{ApiKey, UrlBuilder};
pub use fetcher::{RateLimit, RateLimitedFetcher};
pub use paginator::DocketPaginator;
pub use detail::{CommentDetail, CommentDetailFetcher, extract_attachment_links};
