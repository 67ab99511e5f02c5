use std::sync::atomic::{AtomicUsize, Ordering};

use futures::{StreamExt, stream};
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::MovieRecord,
    scraper,
    store::MovieStore,
};

#[derive(Clone, Copy, Debug, Default)]
struct RecordOutcome {
    matched: bool,
    persisted: bool,
    image_downloaded: bool,
    conflict: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineReport {
    pub total: usize,
    pub matched: usize,
    pub persisted: usize,
    pub images_downloaded: usize,
    pub conflicts: usize,
    pub failures: usize,
}

/// Runs the enrichment pipeline over the whole record list: one task per
/// record, at most `max_concurrent` in flight between search and persist.
/// Task failures degrade that record and are counted, never re-raised; an
/// unreachable store aborts before any task starts.
pub async fn run(
    client: &reqwest::Client,
    config: &Config,
    store: &MovieStore,
    records: Vec<MovieRecord>,
    on_progress: &(dyn Fn(usize, usize) + Send + Sync),
) -> AppResult<PipelineReport> {
    store.ping().await?;

    let total = records.len();
    let done = AtomicUsize::new(0);

    let outcomes = drive(records, config.max_concurrent, |movie| {
        let done = &done;
        async move {
            let outcome = process_record(client, config, store, movie).await;
            let completed = done.fetch_add(1, Ordering::SeqCst) + 1;
            on_progress(completed, total);
            outcome
        }
    })
    .await;

    let mut report = PipelineReport { total, ..Default::default() };
    for outcome in outcomes {
        if outcome.matched {
            report.matched += 1;
        }
        if outcome.persisted {
            report.persisted += 1;
        } else {
            report.failures += 1;
        }
        if outcome.image_downloaded {
            report.images_downloaded += 1;
        }
        if outcome.conflict {
            report.conflicts += 1;
        }
    }

    debug!(
        total = report.total,
        matched = report.matched,
        persisted = report.persisted,
        failures = report.failures,
        "pipeline finished"
    );

    Ok(report)
}

/// Bounded fan-out over a fixed work list. Completion order is unspecified;
/// the ceiling spans the whole per-item future.
async fn drive<T, F, Fut>(items: Vec<T>, max_concurrent: usize, task: F) -> Vec<Fut::Output>
where
    F: FnMut(T) -> Fut,
    Fut: Future,
{
    stream::iter(items).map(task).buffer_unordered(max_concurrent.max(1)).collect().await
}

/// One attempt per record: search, then on a hit enrich and fetch the
/// poster, then persist whatever state the record reached. Every step
/// failure is absorbed here.
async fn process_record(
    client: &reqwest::Client,
    config: &Config,
    store: &MovieStore,
    mut movie: MovieRecord,
) -> RecordOutcome {
    let mut image_downloaded = false;

    match scraper::search_movie(client, config, &mut movie).await {
        Ok(Some(href)) => match scraper::enrich_movie(client, config, &mut movie, &href).await {
            Ok(downloaded) => image_downloaded = downloaded,
            Err(err) => {
                warn!(title = %movie.title, error = %err, "enrichment failed, keeping partial fields")
            },
        },
        Ok(None) => debug!(title = %movie.title, "no exact match, persisting defaults"),
        Err(err) => warn!(title = %movie.title, error = %err, "search failed, persisting defaults"),
    }

    match store.insert(&movie).await {
        Ok(()) => RecordOutcome {
            matched: movie.matched,
            persisted: true,
            image_downloaded,
            conflict: false,
        },
        Err(AppError::Conflict { title }) => {
            warn!(title = %title, "duplicate title, record not persisted");
            RecordOutcome { matched: movie.matched, persisted: false, image_downloaded, conflict: true }
        },
        Err(err) => {
            warn!(title = %movie.title, error = %err, "failed to persist record");
            RecordOutcome { matched: movie.matched, persisted: false, image_downloaded, conflict: false }
        },
    }
}
