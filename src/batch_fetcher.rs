//! Chunked image-info requests and response interpretation.
//!
//! Every request is turned into a [`ChunkOutcome`]; transport and payload
//! problems are reported as anomalies so the run can move on to the next
//! chunk. There is exactly one attempt per chunk.

use serde_json::Value;

use crate::backends::ImageInfoBackend;
use crate::protocol::{
    AnomalyReport, ChunkOutcome, ImageInfoRecord, ImageTitle, NormalizationMapping,
};
use crate::url_normalizer::UrlNormalizer;

/// Titles per API request.
pub const CHUNK_SIZE: usize = 10;

fn pretty_payload(parsed: &Value) -> String {
    serde_json::to_string_pretty(parsed).unwrap_or_else(|_| parsed.to_string())
}

fn parse_mappings(query: &Value) -> Vec<NormalizationMapping> {
    let Some(entries) = query["normalized"].as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            Some(NormalizationMapping {
                from: entry["from"].as_str()?.to_string(),
                to: entry["to"].as_str()?.to_string(),
            })
        })
        .collect()
}

fn parse_page(page: &Value, normalizer: &UrlNormalizer) -> Option<ImageInfoRecord> {
    let title = page["title"].as_str()?;
    let info = page["imageinfo"].as_array()?.first()?;
    let urls = normalizer.normalize(info["url"].as_str(), info["thumburl"].as_str());
    Some(ImageInfoRecord {
        title: title.to_string(),
        width: info["width"].as_i64(),
        height: info["height"].as_i64(),
        size: info["size"].as_i64(),
        mime: info["mime"].as_str().map(str::to_string),
        image_url: urls.image_url,
        thumbnail: urls.thumbnail,
    })
}

/// Interprets one `action=query&prop=imageinfo` response body.
pub fn interpret_response(body: &str, normalizer: &UrlNormalizer) -> ChunkOutcome {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(err) => {
            return ChunkOutcome::Failed(AnomalyReport {
                reason: format!("Invalid JSON response: {err}"),
                payload: Some(body.to_string()),
            });
        }
    };

    let query = &parsed["query"];
    if !query.is_object() {
        return ChunkOutcome::Failed(AnomalyReport {
            reason: "no 'query' field".to_string(),
            payload: Some(pretty_payload(&parsed)),
        });
    }

    let mappings = parse_mappings(query);

    let Some(pages) = query["pages"].as_object() else {
        return ChunkOutcome::MissingPages {
            mappings,
            report: AnomalyReport {
                reason: "no 'pages' field".to_string(),
                payload: Some(pretty_payload(&parsed)),
            },
        };
    };

    let records = pages
        .values()
        .filter_map(|page| parse_page(page, normalizer))
        .collect();

    ChunkOutcome::Fetched { mappings, records }
}

/// Issues the request for one chunk and interprets the answer.
pub fn fetch_chunk<B: ImageInfoBackend + ?Sized>(
    backend: &B,
    chunk: &[ImageTitle],
    normalizer: &UrlNormalizer,
) -> ChunkOutcome {
    let titles: Vec<&str> = chunk.iter().map(ImageTitle::as_str).collect();
    match backend.query_image_info(&titles) {
        Ok(body) => interpret_response(&body, normalizer),
        Err(err) => ChunkOutcome::Failed(AnomalyReport {
            reason: err.message,
            payload: err.partial_body,
        }),
    }
}
