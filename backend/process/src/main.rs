use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use process::{DEFAULT_ORG, generate_with, github::GitHub, models::ENDPOINT, throttle::Throttle};
use snapshot::{DEFAULT_PATH, SnapshotStore};
use tracing_subscriber::{EnvFilter, fmt};

/// Generate the organization leaderboard once and exit.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = DEFAULT_ORG)]
    org: String,

    #[arg(long, default_value = DEFAULT_PATH)]
    output: PathBuf,

    /// Delay between repositories
    #[arg(long, default_value_t = 3000)]
    throttle_ms: u64,

    #[arg(long, env = "GIT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, env = "GITHUB_API_URL", default_value = ENDPOINT)]
    api_url: String,

    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();

    let github = GitHub::new(
        &args.api_url,
        args.token,
        Duration::from_secs(args.timeout_secs),
    )?;
    let throttle = Throttle::per_window(1, Duration::from_millis(args.throttle_ms));
    let store = SnapshotStore::new(&args.output);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} repos {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let snapshot = generate_with(&github, &args.org, &throttle, &store, |repository| {
        pb.set_message(repository.full_name.clone());
        pb.inc(1);
    })
    .await?;

    pb.finish_with_message("Done");

    println!(
        "Wrote {} contributors to {}",
        snapshot.leaderboard.len(),
        store.path().display()
    );

    Ok(())
}
