//! Thumbnail template derivation and URL fix-ups for image-info payloads.

use std::sync::OnceLock;

use log::warn;
use regex::Regex;

use crate::config::WikiConfig;
use crate::protocol::ThumbnailTemplate;

static THUMB_URL_RE: OnceLock<Regex> = OnceLock::new();

fn thumb_url_regex() -> &'static Regex {
    THUMB_URL_RE.get_or_init(|| {
        Regex::new(r"^(.*/)[0-9]{1,4}(px-.*)$").expect("thumbnail pattern is valid")
    })
}

/// URLs derived from one page's `imageinfo` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrls {
    pub image_url: Option<String>,
    pub thumbnail: Option<ThumbnailTemplate>,
}

/// Hosts involved in rewriting thumbnails of files mirrored from Commons.
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    local_image_base: String,
    commons_image_base: String,
}

pub fn upgrade_scheme(url: &str) -> String {
    match url.strip_prefix("http:") {
        Some(rest) => format!("https:{rest}"),
        None => url.to_string(),
    }
}

/// Splits `.../120px-Name.jpg` into (`.../`, `px-Name.jpg`).
pub fn split_thumbnail_url(thumb_url: &str) -> Option<ThumbnailTemplate> {
    let captures = thumb_url_regex().captures(thumb_url)?;
    Some(ThumbnailTemplate {
        prefix: captures.get(1)?.as_str().to_string(),
        suffix: captures.get(2)?.as_str().to_string(),
    })
}

impl UrlNormalizer {
    pub fn new(config: &WikiConfig) -> Self {
        Self {
            local_image_base: config.local_image_base.clone(),
            commons_image_base: config.commons_image_base.clone(),
        }
    }

    fn is_commons_url(&self, url: &str) -> bool {
        url.starts_with(&self.commons_image_base)
    }

    fn rewrite_to_commons(&self, prefix: &str) -> String {
        prefix.replacen(&self.local_image_base, &self.commons_image_base, 1)
    }

    /// Normalizes the full URL and derives the thumbnail template.
    ///
    /// A thumbnail of unexpected shape is logged and yields no template; it
    /// never fails the item.
    pub fn normalize(&self, image_url: Option<&str>, thumb_url: Option<&str>) -> NormalizedUrls {
        let thumbnail = match thumb_url.and_then(split_thumbnail_url) {
            Some(template) => Some(ThumbnailTemplate {
                prefix: upgrade_scheme(&template.prefix),
                suffix: template.suffix,
            }),
            None => {
                warn!("Wrong thumbnail format: '{}'", thumb_url.unwrap_or_default());
                None
            }
        };

        let image_url = image_url.map(upgrade_scheme);

        // The wiki reports its own, non-working thumbnail path for files
        // transcluded from Wikimedia Commons.
        let thumbnail = match (&image_url, thumbnail) {
            (Some(url), Some(template)) if self.is_commons_url(url) => Some(ThumbnailTemplate {
                prefix: self.rewrite_to_commons(&template.prefix),
                suffix: template.suffix,
            }),
            (_, thumbnail) => thumbnail,
        };

        NormalizedUrls {
            image_url,
            thumbnail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{split_thumbnail_url, upgrade_scheme, UrlNormalizer};
    use crate::config::WikiConfig;

    fn normalizer() -> UrlNormalizer {
        UrlNormalizer::new(&WikiConfig::default())
    }

    #[test]
    fn test_split_thumbnail_url_round_trips_to_other_width() {
        let template = split_thumbnail_url(
            "https://wiki.openstreetmap.org/w/images/thumb/4/4a/Bench.jpg/123px-Bench.jpg",
        )
        .expect("thumbnail should match");
        assert_eq!(
            template.prefix,
            "https://wiki.openstreetmap.org/w/images/thumb/4/4a/Bench.jpg/"
        );
        assert_eq!(template.suffix, "px-Bench.jpg");
        assert_eq!(
            template.url_for_width(200),
            "https://wiki.openstreetmap.org/w/images/thumb/4/4a/Bench.jpg/200px-Bench.jpg"
        );
    }

    #[test]
    fn test_split_thumbnail_url_keeps_svg_png_suffix() {
        let template =
            split_thumbnail_url("https://example.org/thumb/a/ab/Sign.svg/10px-Sign.svg.png")
                .expect("thumbnail should match");
        assert_eq!(template.prefix, "https://example.org/thumb/a/ab/Sign.svg/");
        assert_eq!(template.suffix, "px-Sign.svg.png");
    }

    #[test]
    fn test_split_thumbnail_url_rejects_unexpected_shapes() {
        assert!(split_thumbnail_url("https://example.org/images/a/ab/Bench.jpg").is_none());
        assert!(split_thumbnail_url("https://example.org/thumb/Bench.jpg/12345px-Bench.jpg")
            .is_none());
        assert!(split_thumbnail_url("").is_none());
    }

    #[test]
    fn test_upgrade_scheme_only_touches_insecure_scheme() {
        assert_eq!(upgrade_scheme("http://a.org/x"), "https://a.org/x");
        assert_eq!(upgrade_scheme("https://a.org/x"), "https://a.org/x");
        assert_eq!(upgrade_scheme("//a.org/http:x"), "//a.org/http:x");
    }

    #[test]
    fn test_normalize_upgrades_scheme_in_url_and_prefix() {
        let urls = normalizer().normalize(
            Some("http://wiki.openstreetmap.org/w/images/4/4a/Bench.jpg"),
            Some("http://wiki.openstreetmap.org/w/images/thumb/4/4a/Bench.jpg/10px-Bench.jpg"),
        );
        assert_eq!(
            urls.image_url.as_deref(),
            Some("https://wiki.openstreetmap.org/w/images/4/4a/Bench.jpg")
        );
        let template = urls.thumbnail.expect("template should be derived");
        assert_eq!(
            template.prefix,
            "https://wiki.openstreetmap.org/w/images/thumb/4/4a/Bench.jpg/"
        );
        assert_eq!(template.suffix, "px-Bench.jpg");
    }

    #[test]
    fn test_normalize_rewrites_prefix_for_commons_images() {
        let urls = normalizer().normalize(
            Some("https://upload.wikimedia.org/wikipedia/commons/b/b1/Stop.svg"),
            Some("https://wiki.openstreetmap.org/w/images/thumb/b/b1/Stop.svg/10px-Stop.svg.png"),
        );
        let template = urls.thumbnail.expect("template should be derived");
        assert_eq!(
            template.prefix,
            "https://upload.wikimedia.org/wikipedia/commons/thumb/b/b1/Stop.svg/"
        );
        assert_eq!(template.suffix, "px-Stop.svg.png");
    }

    #[test]
    fn test_normalize_leaves_local_images_on_wiki_host() {
        let urls = normalizer().normalize(
            Some("https://wiki.openstreetmap.org/w/images/b/b1/Stop.png"),
            Some("https://wiki.openstreetmap.org/w/images/thumb/b/b1/Stop.png/10px-Stop.png"),
        );
        let template = urls.thumbnail.expect("template should be derived");
        assert_eq!(
            template.prefix,
            "https://wiki.openstreetmap.org/w/images/thumb/b/b1/Stop.png/"
        );
    }

    #[test]
    fn test_normalize_without_matching_thumbnail_keeps_url() {
        let urls = normalizer().normalize(
            Some("http://upload.wikimedia.org/wikipedia/commons/b/b1/Stop.svg"),
            Some("https://example.org/no-thumbnail-here"),
        );
        assert!(urls.thumbnail.is_none());
        assert_eq!(
            urls.image_url.as_deref(),
            Some("https://upload.wikimedia.org/wikipedia/commons/b/b1/Stop.svg")
        );

        let missing = normalizer().normalize(None, None);
        assert!(missing.thumbnail.is_none());
        assert!(missing.image_url.is_none());
    }
}
