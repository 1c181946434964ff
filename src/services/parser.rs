//! Parsing of the add-emoji input field.
//!
//! One submission is a comma-separated list of tokens. A token is either a
//! literal system emoji (≤ 2 UTF-16 code units) or a hosted-image reference
//! in one of three shapes: a full URL containing `/emojis/<id>.<ext>`, a
//! bare `<id>.<ext>`, or a bare `<id>`. A bare ID has its extension inferred
//! by probing the CDN, `gif` before `webp`. Malformed tokens are dropped
//! with a log line and never abort the rest of the batch.

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::domain::{
    split_hosted, utf16_len, EmojiEntry, EmojiToken, ImageExt, TokenError, PROBE_ORDER,
    SYSTEM_EMOJI_MAX_UTF16,
};

/// Existence check against the emoji CDN, used to infer a missing file
/// extension.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CdnProbe: Send + Sync {
    /// Returns whether `<id>.<ext>` exists on the CDN.
    async fn exists(&self, id: u64, ext: ImageExt) -> bool;
}

/// A hosted-image reference extracted from one input token, possibly still
/// missing its extension.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HostedRef {
    id: u64,
    ext: Option<ImageExt>,
    name: String,
}

/// Extracts a hosted reference from a trimmed, non-literal token.
///
/// URL-shaped input must contain an `/emojis/<id>[.<ext>]` path segment and
/// may carry a `name` query parameter (percent-decoded) that becomes the
/// display name.
fn parse_hosted(raw: &str) -> Result<HostedRef, TokenError> {
    if let Ok(url) = Url::parse(raw) {
        let reference = url
            .path_segments()
            .into_iter()
            .flatten()
            .skip_while(|s| *s != "emojis")
            .nth(1)
            .ok_or_else(|| TokenError::InvalidId(raw.to_string()))?;
        let (id, ext) = split_hosted(reference)?;
        let name = url
            .query_pairs()
            .find(|(key, _)| key == "name")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        return Ok(HostedRef { id, ext, name });
    }

    let (id, ext) = split_hosted(raw)?;
    Ok(HostedRef {
        id,
        ext,
        name: String::new(),
    })
}

/// Probes candidate extensions in the fixed preference order and returns the
/// first that exists.
async fn resolve_extension(probe: &dyn CdnProbe, id: u64) -> Option<ImageExt> {
    for ext in PROBE_ORDER {
        debug!(id, ext = %ext, "probing cdn for extension");
        if probe.exists(id, ext).await {
            return Some(ext);
        }
    }
    None
}

/// Parses one submission into entries, in input order.
///
/// Tokens that fail to parse or whose extension cannot be resolved are
/// dropped with a warning; the rest of the batch is unaffected. The caller
/// clears the input field only when the result is non-empty.
pub async fn parse_submission(input: &str, probe: &dyn CdnProbe) -> Vec<EmojiEntry> {
    let mut entries = Vec::new();

    for raw in input.split(',') {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }

        if utf16_len(token) <= SYSTEM_EMOJI_MAX_UTF16 {
            entries.push(EmojiEntry::unnamed(EmojiToken::System(token.to_string())));
            continue;
        }

        let hosted = match parse_hosted(token) {
            Ok(hosted) => hosted,
            Err(err) => {
                warn!(token, %err, "dropping unparseable emoji token");
                continue;
            }
        };

        let ext = match hosted.ext {
            Some(ext) => ext,
            None => match resolve_extension(probe, hosted.id).await {
                Some(ext) => ext,
                None => {
                    warn!(id = hosted.id, "no cdn asset found for bare emoji id");
                    continue;
                }
            },
        };

        entries.push(EmojiEntry::new(
            EmojiToken::Hosted { id: hosted.id, ext },
            hosted.name,
        ));
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::Sequence;
    use pretty_assertions::assert_eq;

    fn hosted(id: u64, ext: ImageExt, name: &str) -> EmojiEntry {
        EmojiEntry::new(EmojiToken::Hosted { id, ext }, name)
    }

    #[tokio::test]
    async fn short_tokens_become_literal_entries_without_probing() {
        // No expectations set: any probe call panics.
        let probe = MockCdnProbe::new();
        let entries = parse_submission("😀, ❤️ ,x", &probe).await;
        assert_eq!(
            entries,
            vec![
                EmojiEntry::unnamed(EmojiToken::System("😀".into())),
                EmojiEntry::unnamed(EmojiToken::System("❤️".into())),
                EmojiEntry::unnamed(EmojiToken::System("x".into())),
            ]
        );
    }

    #[tokio::test]
    async fn explicit_extension_skips_the_probe() {
        let probe = MockCdnProbe::new();
        let entries = parse_submission("123456789.gif", &probe).await;
        assert_eq!(entries, vec![hosted(123456789, ImageExt::Gif, "")]);
    }

    #[tokio::test]
    async fn bare_id_probes_gif_then_webp() {
        let mut probe = MockCdnProbe::new();
        let mut seq = Sequence::new();
        probe
            .expect_exists()
            .withf(|id, ext| *id == 555 && *ext == ImageExt::Gif)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| false);
        probe
            .expect_exists()
            .withf(|id, ext| *id == 555 && *ext == ImageExt::Webp)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| true);

        let entries = parse_submission("555", &probe).await;
        assert_eq!(entries, vec![hosted(555, ImageExt::Webp, "")]);
    }

    #[tokio::test]
    async fn bare_id_with_no_cdn_asset_is_dropped() {
        let mut probe = MockCdnProbe::new();
        probe.expect_exists().times(2).returning(|_, _| false);

        let entries = parse_submission("555", &probe).await;
        assert_eq!(entries, vec![]);
    }

    #[tokio::test]
    async fn url_shape_extracts_id_extension_and_name() {
        let probe = MockCdnProbe::new();
        let entries = parse_submission(
            "https://cdn.discordapp.com/emojis/42.webp?size=48&name=Thumbs%20Up",
            &probe,
        )
        .await;
        assert_eq!(entries, vec![hosted(42, ImageExt::Webp, "Thumbs Up")]);
    }

    #[tokio::test]
    async fn url_without_extension_probes() {
        let mut probe = MockCdnProbe::new();
        probe
            .expect_exists()
            .withf(|id, ext| *id == 42 && *ext == ImageExt::Gif)
            .times(1)
            .returning(|_, _| true);

        let entries =
            parse_submission("https://cdn.discordapp.com/emojis/42?size=48", &probe).await;
        assert_eq!(entries, vec![hosted(42, ImageExt::Gif, "")]);
    }

    #[tokio::test]
    async fn bad_tokens_do_not_abort_the_batch() {
        let probe = MockCdnProbe::new();
        let entries = parse_submission("😀,not-an-id,99.png,https://example.com/nope", &probe).await;
        assert_eq!(
            entries,
            vec![
                EmojiEntry::unnamed(EmojiToken::System("😀".into())),
                hosted(99, ImageExt::Png, ""),
            ]
        );
    }

    #[tokio::test]
    async fn empty_and_whitespace_tokens_are_skipped() {
        let probe = MockCdnProbe::new();
        let entries = parse_submission(" , ,", &probe).await;
        assert_eq!(entries, vec![]);
    }
}
