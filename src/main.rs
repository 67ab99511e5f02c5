mod config;
mod db;
mod entities;
mod error;
mod models;
mod pipeline;
mod scraper;
mod store;

use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use tracing::{info, warn};

use crate::{
    config::Config,
    models::{MovieInput, MovieRecord},
    store::MovieStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,cinedex=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let records = load_movies(&config.movies_file)?;
    info!(records = records.len(), "loaded input list");

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(config::ACCEPT_LANGUAGE));
    let client = reqwest::Client::builder()
        .user_agent(config::USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    let store = MovieStore::new(db);

    std::fs::create_dir_all(&config.pictures_dir)?;

    let start = Instant::now();
    let total = records.len();
    let report = pipeline::run(&client, &config, &store, records, &|done, total| {
        info!(done, total, "processed record");
    })
    .await?;
    let elapsed = start.elapsed().as_secs();

    println!("Script ended in {} minute(s) {} second(s)", elapsed / 60, elapsed % 60);
    println!("Movies list has: {total} movies.");
    println!("We have stored: {} movies.", store.count().await?);
    println!("We have downloaded: {} movie pictures.", report.images_downloaded);

    if report.failures > 0 {
        warn!(
            failures = report.failures,
            conflicts = report.conflicts,
            "some records were not persisted"
        );
    }

    Ok(())
}

/// Reads the seed list; invalid records are logged and excluded, they never
/// abort the batch.
fn load_movies(path: &str) -> anyhow::Result<Vec<MovieRecord>> {
    let raw = std::fs::read_to_string(path)?;
    let inputs: Vec<MovieInput> = serde_json::from_str(&raw)?;

    let mut records = Vec::with_capacity(inputs.len());
    for input in inputs {
        match MovieRecord::from_input(input) {
            Ok(record) => records.push(record),
            Err(err) => warn!(error = %err, "skipping invalid input record"),
        }
    }
    Ok(records)
}
