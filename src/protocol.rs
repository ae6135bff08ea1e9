//! Value types shared by the image-info import stages.
//!
//! Titles flow from the collector into the fetcher, the fetcher turns each
//! API response into a [`ChunkOutcome`], and the sink consumes the records
//! and normalization mappings carried by that outcome.

use std::fmt;

/// Wiki file page title such as `File:Example.jpg`.
///
/// Only titles prefixed with `file:` or `image:` (any case) can be built.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageTitle(String);

impl ImageTitle {
    pub fn parse(value: &str) -> Option<Self> {
        if has_image_namespace(value) {
            Some(Self(value.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn has_image_namespace(value: &str) -> bool {
    let Some((namespace, _)) = value.split_once(':') else {
        return false;
    };
    namespace.eq_ignore_ascii_case("file") || namespace.eq_ignore_ascii_case("image")
}

/// Static fragments around the pixel width of a thumbnail URL.
///
/// `prefix + width + suffix` is a thumbnail URL for `width`; the suffix keeps
/// its leading `px-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailTemplate {
    pub prefix: String,
    pub suffix: String,
}

impl ThumbnailTemplate {
    pub fn url_for_width(&self, width: u32) -> String {
        format!("{}{}{}", self.prefix, width, self.suffix)
    }
}

/// One row destined for `wiki_images`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfoRecord {
    /// Canonical title as reported by the API.
    pub title: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub size: Option<i64>,
    pub mime: Option<String>,
    pub image_url: Option<String>,
    pub thumbnail: Option<ThumbnailTemplate>,
}

/// Title redirect reported by the API alongside the page data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationMapping {
    pub from: String,
    pub to: String,
}

/// Why a chunk produced no records.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyReport {
    pub reason: String,
    /// Best-effort dump of whatever the API returned.
    pub payload: Option<String>,
}

/// Interpreted result of one metadata request.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkOutcome {
    Fetched {
        mappings: Vec<NormalizationMapping>,
        records: Vec<ImageInfoRecord>,
    },
    /// The envelope was present but carried no page map. Mappings found in
    /// the envelope are still applied.
    MissingPages {
        mappings: Vec<NormalizationMapping>,
        report: AnomalyReport,
    },
    Failed(AnomalyReport),
}
