//! MediaWiki action API backend implementation.

use std::time::Duration;

use log::debug;

use crate::backends::{BackendError, ImageInfoBackend};
use crate::config::WikiConfig;

/// Thumbnail box requested from the API. Only the URL shape matters.
const THUMBNAIL_PROBE_PX: u32 = 10;

/// MediaWiki adapter backed by `ureq`.
pub struct MediaWikiBackend {
    http_client: ureq::Agent,
    api_url: String,
    user_agent: String,
}

impl MediaWikiBackend {
    /// Creates a new adapter; timeouts are only set when configured.
    pub fn new(config: &WikiConfig) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.timeout_connect(Duration::from_secs(secs));
        }
        if let Some(secs) = config.read_timeout_secs {
            builder = builder.timeout_read(Duration::from_secs(secs));
        }
        Self {
            http_client: builder.build(),
            api_url: config.api_url.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn image_info_params(titles: &[&str]) -> Vec<(&'static str, String)> {
        vec![
            ("action", "query".to_string()),
            ("format", "json".to_string()),
            ("prop", "imageinfo".to_string()),
            ("iiprop", "url|size|mime".to_string()),
            ("iiurlwidth", THUMBNAIL_PROBE_PX.to_string()),
            ("iiurlheight", THUMBNAIL_PROBE_PX.to_string()),
            ("titles", titles.join("|")),
        ]
    }

    fn api_url(&self, params: &[(&'static str, String)]) -> String {
        let query_parts: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect();
        format!("{}?{}", self.api_url, query_parts.join("&"))
    }

    fn request_body(&self, url: &str) -> Result<String, BackendError> {
        debug!("MediaWiki request: {url}");
        let response = match self
            .http_client
            .get(url)
            .set("User-Agent", &self.user_agent)
            .set("Accept", "application/json")
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                return Err(BackendError::with_body(
                    format!("MediaWiki request failed with HTTP status {code}"),
                    response.into_string().ok(),
                ));
            }
            Err(err) => {
                return Err(BackendError::new(format!("MediaWiki request failed: {err}")));
            }
        };
        response
            .into_string()
            .map_err(|err| BackendError::new(format!("Failed to read MediaWiki response: {err}")))
    }
}

impl ImageInfoBackend for MediaWikiBackend {
    fn query_image_info(&self, titles: &[&str]) -> Result<String, BackendError> {
        let url = self.api_url(&Self::image_info_params(titles));
        self.request_body(&url)
    }
}
