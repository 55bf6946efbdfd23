//! Harvest public comments for a Regulations.gov docket.
//!
//! The listing is paginated through the v4 comments API, each comment's full
//! text and attachment links are fetched, the nested attributes are flattened
//! into a CSV file, and attachments are downloaded next to it. Every request
//! is issued sequentially against a single tracked quota.

pub mod config;
pub mod models;
pub mod regulations;
pub mod table;
pub mod downloader;
pub mod harvester;

pub use harvester::{HarvestOptions, HarvestReport, Harvester};
