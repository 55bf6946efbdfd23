use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "regcomments")]
#[command(about = "Harvest public comments, comment text and attachments for a Regulations.gov docket")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect every comment of a docket with its text, export CSV and download attachments
    Harvest {
        #[command(flatten)]
        docket: DocketArgs,

        #[command(flatten)]
        key: KeyArgs,

        /// Only export the CSV, do not download attachment files
        #[arg(long)]
        skip_attachments: bool,
    },

    /// Export the docket's comment listing only (no per-comment requests)
    List {
        #[command(flatten)]
        docket: DocketArgs,

        #[command(flatten)]
        key: KeyArgs,
    },

    /// Show the remaining request quota for the API key
    Quota {
        #[command(flatten)]
        key: KeyArgs,
    },
}

#[derive(Args)]
pub struct DocketArgs {
    /// Docket ID, e.g. CMS-2011-0142
    #[arg(short, long)]
    pub docket: String,

    /// Comments per listing page (5-250)
    #[arg(short, long)]
    pub page_size: Option<u32>,

    /// Output directory for the CSV and the attachments directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct KeyArgs {
    /// API key given directly
    #[arg(long, conflicts_with = "api_key_file")]
    pub api_key: Option<String>,

    /// File containing the API key as raw text
    #[arg(long)]
    pub api_key_file: Option<PathBuf>,
}
