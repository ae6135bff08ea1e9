//! Image-info import run.
//!
//! Collects titles, requests metadata chunk by chunk and writes the results
//! inside one transaction. Per-chunk anomalies are logged and skipped; a
//! storage error aborts the run and nothing is committed.

use std::collections::{HashSet, VecDeque};

use log::{debug, info, warn};

use crate::backends::ImageInfoBackend;
use crate::batch_fetcher::{fetch_chunk, CHUNK_SIZE};
use crate::db_manager::{DbManager, WikiImageSink};
use crate::protocol::{
    AnomalyReport, ChunkOutcome, ImageInfoRecord, ImageTitle, NormalizationMapping,
};
use crate::title_collector::collect_image_titles;
use crate::url_normalizer::UrlNormalizer;

/// Width used when logging a sample thumbnail URL.
const PREVIEW_THUMBNAIL_PX: u32 = 200;

/// Run-scoped work queue and the titles inserted so far.
#[derive(Debug, Default)]
pub struct RunState {
    remaining_titles: VecDeque<ImageTitle>,
    seen: HashSet<String>,
}

impl RunState {
    pub fn new(titles: Vec<ImageTitle>) -> Self {
        Self {
            remaining_titles: titles.into(),
            seen: HashSet::new(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_titles.is_empty()
    }

    /// Takes up to [`CHUNK_SIZE`] titles off the front of the queue.
    pub fn next_chunk(&mut self) -> Vec<ImageTitle> {
        let take = self.remaining_titles.len().min(CHUNK_SIZE);
        self.remaining_titles.drain(..take).collect()
    }

    /// Marks `title` as inserted; false if it was already seen in this run.
    pub fn mark_seen(&mut self, title: &str) -> bool {
        self.seen.insert(title.to_string())
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub titles_found: usize,
    pub chunks_requested: usize,
    pub chunks_skipped: usize,
    pub normalizations_applied: usize,
    /// Rows in the referencing tables rewritten by those normalizations.
    pub references_rewritten: usize,
    pub images_inserted: usize,
    pub duplicates_skipped: usize,
    pub thumbnails_without_template: usize,
}

fn log_anomaly(report: &AnomalyReport) {
    warn!("Wiki API call failed ({}):", report.reason);
    if let Some(payload) = &report.payload {
        warn!("{payload}");
    }
}

fn apply_mappings(
    sink: &WikiImageSink<'_>,
    mappings: &[NormalizationMapping],
    summary: &mut RunSummary,
) -> Result<(), rusqlite::Error> {
    for mapping in mappings {
        summary.references_rewritten += sink.apply_normalization(mapping)?;
        summary.normalizations_applied += 1;
    }
    Ok(())
}

fn insert_records(
    sink: &WikiImageSink<'_>,
    state: &mut RunState,
    records: &[ImageInfoRecord],
    summary: &mut RunSummary,
) -> Result<(), rusqlite::Error> {
    for record in records {
        if !state.mark_seen(&record.title) {
            summary.duplicates_skipped += 1;
            continue;
        }
        sink.insert_image(record)?;
        summary.images_inserted += 1;
        match &record.thumbnail {
            Some(template) => debug!(
                "Inserted {} (thumbnail {})",
                record.title,
                template.url_for_width(PREVIEW_THUMBNAIL_PX)
            ),
            None => summary.thumbnails_without_template += 1,
        }
    }
    Ok(())
}

/// Applies one chunk outcome; mappings always land before inserts.
fn apply_outcome(
    sink: &WikiImageSink<'_>,
    state: &mut RunState,
    outcome: ChunkOutcome,
    summary: &mut RunSummary,
) -> Result<(), rusqlite::Error> {
    match outcome {
        ChunkOutcome::Fetched { mappings, records } => {
            apply_mappings(sink, &mappings, summary)?;
            insert_records(sink, state, &records, summary)
        }
        ChunkOutcome::MissingPages { mappings, report } => {
            apply_mappings(sink, &mappings, summary)?;
            log_anomaly(&report);
            summary.chunks_skipped += 1;
            Ok(())
        }
        ChunkOutcome::Failed(report) => {
            log_anomaly(&report);
            summary.chunks_skipped += 1;
            Ok(())
        }
    }
}

/// Runs a full import against `db`, committing only if every write succeeds.
pub fn run_image_info_import<B: ImageInfoBackend + ?Sized>(
    db: &mut DbManager,
    backend: &B,
    normalizer: &UrlNormalizer,
) -> Result<RunSummary, rusqlite::Error> {
    let titles = collect_image_titles(db.connection())?;
    let mut summary = RunSummary {
        titles_found: titles.len(),
        ..RunSummary::default()
    };
    let mut state = RunState::new(titles);

    let tx = db.begin_import()?;
    info!("Found {} different image titles", summary.titles_found);
    {
        let sink = WikiImageSink::new(&tx);
        while !state.is_exhausted() {
            let chunk = state.next_chunk();
            let joined: Vec<&str> = chunk.iter().map(ImageTitle::as_str).collect();
            info!("Get image info for: {}", joined.join(" "));

            summary.chunks_requested += 1;
            let outcome = fetch_chunk(backend, &chunk, normalizer);
            apply_outcome(&sink, &mut state, outcome, &mut summary)?;
        }
    }
    tx.commit()?;

    info!(
        "Image info import done: titles={} chunks={} skipped_chunks={} normalized={} rewritten_refs={} inserted={} duplicates={} no_thumbnail_template={}",
        summary.titles_found,
        summary.chunks_requested,
        summary.chunks_skipped,
        summary.normalizations_applied,
        summary.references_rewritten,
        summary.images_inserted,
        summary.duplicates_skipped,
        summary.thumbnails_without_template
    );
    Ok(summary)
}
