use anyhow::{Context, bail};
use clap::Parser;
use std::process::ExitCode;
use tracker_dedup::cli::{Cli, Commands};
use tracker_dedup::config::Config;
use tracker_dedup::format::{percent, render_duplicates, render_matches};
use tracker_dedup::tracker::TrackerClient;
use tracker_dedup::{
    DuplicateFinder, IssueCache, MatchOptions, Query, StemmingNormalizer, Threshold,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(2);
        }
    };

    tracker_dedup::tracing::init(config.log_format, cli.verbose);
    match &config.source {
        Some(path) => tracing::debug!("Loaded config from {}", path.display()),
        None => tracing::debug!("No config file found, using defaults"),
    }

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: Config) -> anyhow::Result<()> {
    let client = tracker_client(&config)?;
    let cache = IssueCache::open(client, config.cache_settings()).await;

    match command {
        Commands::Find {
            title,
            description,
            top_n,
            json,
        } => {
            let query = Query::parse(&format!("{}\n{}", title, description))?;
            let options = MatchOptions {
                top_n: top_n.unwrap_or(config.top_n),
            };
            let finder =
                DuplicateFinder::new(cache, StemmingNormalizer::new(config.language), options);

            let lookup = finder
                .find(&query)
                .await
                .context("Could not search for similar issues")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&lookup.matches)?);
            } else {
                print!("{}", render_matches(&lookup.matches, &lookup.corpus));
                if lookup.matches.is_empty() {
                    println!();
                }
            }
        }
        Commands::Audit {
            threshold,
            field,
            json,
        } => {
            let threshold = match threshold {
                Some(value) => Threshold::new(value)?,
                None => config.threshold()?,
            };
            let finder = DuplicateFinder::new(
                cache,
                StemmingNormalizer::new(config.language),
                MatchOptions::default(),
            );

            let pairs = finder
                .audit(field.into(), threshold)
                .await
                .context("Could not load issues for the audit")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&pairs)?);
            } else {
                print!("{}", render_duplicates(&pairs));
            }
        }
        Commands::Refresh => {
            let corpus = cache
                .force_refresh()
                .await
                .context("Failed to refresh issues")?;
            println!("Snapshot refreshed: {} issues.", corpus.len());
        }
        Commands::Status => {
            let Some(timestamp) = cache.snapshot_timestamp().await else {
                println!("No snapshot yet.");
                return Ok(());
            };
            let updated: chrono::DateTime<chrono::Local> = timestamp.into();
            let age = cache.snapshot_age().await.unwrap_or_default();

            println!("Snapshot:  {}", cache.settings().path.display());
            println!("Updated:   {}", updated.format("%Y-%m-%d %H:%M:%S"));
            println!("Age:       {}s", age.as_secs());
            println!("Issues:    {}", cache.snapshot_size().await);
            println!("State:     {:?}", cache.state().await);
            let ttl = cache.settings().ttl;
            if !ttl.is_zero() {
                println!("TTL used:  {}", percent(age.as_secs_f64() / ttl.as_secs_f64()));
            }
        }
    }

    Ok(())
}

/// Build the HTTP source. Missing credentials only fail once a fetch is
/// attempted, so `status` works without them.
fn tracker_client(config: &Config) -> anyhow::Result<TrackerClient> {
    let tracker = &config.tracker;
    if tracker.api_url.is_empty() {
        bail!("tracker.api_url must not be empty");
    }

    Ok(TrackerClient::new(
        tracker.api_url.clone(),
        tracker.org_id.clone().unwrap_or_default(),
        tracker.token.clone().unwrap_or_default(),
    ))
}
