use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use regcomments::config::Config;
use regcomments::regulations::ApiKey;
use regcomments::{HarvestOptions, Harvester};

mod cli;

use cli::{Cli, Commands, DocketArgs, KeyArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "regcomments=info");
    }

    // Initialize logging to both console and file
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

    let file_appender = tracing_appender::rolling::never(".", "regcomments.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env())
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env())
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match &cli.command {
        Commands::Harvest { docket, key, skip_attachments } => {
            apply_docket_args(&mut config, docket);
            let options = HarvestOptions {
                fetch_details: true,
                download_attachments: !skip_attachments,
            };
            run_harvest(config, key, &docket.docket, options).await?;
        }

        Commands::List { docket, key } => {
            apply_docket_args(&mut config, docket);
            let options = HarvestOptions {
                fetch_details: false,
                download_attachments: false,
            };
            run_harvest(config, key, &docket.docket, options).await?;
        }

        Commands::Quota { key } => {
            let api_key = resolve_key(&config, key)?;
            let mut harvester = Harvester::new(config, api_key)?;
            let remaining = harvester.check_quota().await.context("Quota check failed")?;
            println!("Requests remaining in current window: {}", remaining);
        }
    }

    Ok(())
}

fn apply_docket_args(config: &mut Config, args: &DocketArgs) {
    if let Some(page_size) = args.page_size {
        config.api.page_size = page_size;
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
}

fn resolve_key(config: &Config, args: &KeyArgs) -> Result<ApiKey> {
    ApiKey::resolve(
        args.api_key.as_deref(),
        args.api_key_file.as_deref(),
        config.api.api_key.as_deref(),
    )
    .context("Could not load the Regulations.gov API key")
}

async fn run_harvest(config: Config, key: &KeyArgs, docket_id: &str, options: HarvestOptions) -> Result<()> {
    config.validate()?;
    let api_key = resolve_key(&config, key)?;
    let mut harvester = Harvester::new(config, api_key)?;

    info!("Starting extraction for docket: {}", docket_id);
    let report = harvester.run(docket_id, options).await?;

    info!(
        "Collected {} of {} reported comments into {}",
        report.comments,
        report.reported_total,
        report.csv_path.display()
    );
    if let Some(summary) = report.attachments {
        info!("Attachments: {} downloaded, {} failed", summary.downloaded, summary.failed);
    }
    Ok(())
}
