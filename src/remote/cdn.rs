//! CDN existence probe.
//!
//! A `HEAD` request against the emoji asset URL; any 2xx means the asset
//! exists. Used to infer the file extension of a bare emoji ID.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ImageExt;
use crate::services::CdnProbe;

/// Probe against the Discord emoji CDN (or a compatible host).
pub struct DiscordCdn {
    http: reqwest::Client,
    host: String,
    size: u32,
}

impl DiscordCdn {
    /// Creates a probe against `host`, requesting assets at `size`.
    pub fn new(http: reqwest::Client, host: impl Into<String>, size: u32) -> Self {
        Self {
            http,
            host: host.into(),
            size,
        }
    }
}

#[async_trait]
impl CdnProbe for DiscordCdn {
    async fn exists(&self, id: u64, ext: ImageExt) -> bool {
        let url = format!("https://{}/emojis/{id}.{ext}?size={}", self.host, self.size);
        match self.http.head(&url).send().await {
            Ok(response) => {
                let hit = response.status().is_success();
                debug!(url, hit, "cdn probe");
                hit
            }
            Err(err) => {
                debug!(url, %err, "cdn probe request failed");
                false
            }
        }
    }
}
