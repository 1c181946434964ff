//! Core domain types for the emoji deck.
//!
//! An emoji reference is either a literal system emoji (a short string the
//! platform renders directly) or a pointer to a custom emoji image hosted on
//! the Discord CDN. The persisted form of both is a plain string, which
//! [`EmojiToken`] keeps stable across serialization.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Maximum length, in UTF-16 code units, of a literal system emoji.
///
/// The historical data was written by a JavaScript client that used
/// `String.length` (UTF-16 code units) to distinguish literal emoji from
/// hosted-image references, so `"😀"` counts as 2 and stays literal while any
/// longer string must parse as `<id>.<ext>`.
pub const SYSTEM_EMOJI_MAX_UTF16: usize = 2;

/// Extension probe order for hosted references that omit their extension.
pub const PROBE_ORDER: [ImageExt; 2] = [ImageExt::Gif, ImageExt::Webp];

/// File extension of a hosted emoji image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageExt {
    /// Static PNG.
    Png,
    /// Animated GIF.
    Gif,
    /// WebP (static or animated).
    Webp,
}

impl ImageExt {
    /// Returns the lowercase extension string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageExt::Png => "png",
            ImageExt::Gif => "gif",
            ImageExt::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageExt {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageExt::Png),
            "gif" => Ok(ImageExt::Gif),
            "webp" => Ok(ImageExt::Webp),
            other => Err(TokenError::UnsupportedExtension(other.to_string())),
        }
    }
}

/// Error parsing an emoji token from its string form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The token string was empty.
    #[error("emoji token is empty")]
    Empty,
    /// A hosted reference did not start with a numeric image ID.
    #[error("invalid hosted emoji id in `{0}`")]
    InvalidId(String),
    /// A hosted reference carried an extension outside png/gif/webp.
    #[error("unsupported image extension `{0}`")]
    UnsupportedExtension(String),
    /// A hosted reference omitted its extension where one is required.
    #[error("missing image extension on hosted emoji `{0}`")]
    MissingExtension(u64),
}

/// One emoji reference.
///
/// Serializes to the persisted string form: a `System` token as the literal
/// string, a `Hosted` token as `"<id>.<ext>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EmojiToken {
    /// A literal system emoji, at most [`SYSTEM_EMOJI_MAX_UTF16`] UTF-16
    /// code units and never empty.
    System(String),
    /// A custom emoji image hosted on the CDN.
    Hosted {
        /// Numeric image ID assigned by the host.
        id: u64,
        /// Image file extension.
        ext: ImageExt,
    },
}

impl EmojiToken {
    /// Returns whether this is a literal system emoji.
    pub fn is_system(&self) -> bool {
        matches!(self, EmojiToken::System(_))
    }

    /// Returns the string the clipboard should receive for this token:
    /// the literal emoji itself, or the full CDN URL for a hosted image.
    pub fn copy_payload(&self, cdn_host: &str, size: u32) -> String {
        match self {
            EmojiToken::System(s) => s.clone(),
            EmojiToken::Hosted { id, ext } => {
                format!("https://{cdn_host}/emojis/{id}.{ext}?size={size}")
            }
        }
    }
}

/// Splits a bare hosted reference into its ID and optional extension.
///
/// Accepts `"<id>.<ext>"` and `"<id>"`; anything else is an error. The
/// caller resolves a missing extension by probing the CDN.
pub fn split_hosted(s: &str) -> Result<(u64, Option<ImageExt>), TokenError> {
    let (id_part, ext_part) = match s.split_once('.') {
        Some((id, ext)) => (id, Some(ext)),
        None => (s, None),
    };
    let id: u64 = id_part
        .parse()
        .map_err(|_| TokenError::InvalidId(s.to_string()))?;
    let ext = ext_part.map(ImageExt::from_str).transpose()?;
    Ok((id, ext))
}

/// Counts UTF-16 code units, the unit the length sentinel is defined in.
pub fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

impl fmt::Display for EmojiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmojiToken::System(s) => f.write_str(s),
            EmojiToken::Hosted { id, ext } => write!(f, "{id}.{ext}"),
        }
    }
}

impl FromStr for EmojiToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(TokenError::Empty);
        }
        if utf16_len(s) <= SYSTEM_EMOJI_MAX_UTF16 {
            return Ok(EmojiToken::System(s.to_string()));
        }
        let (id, ext) = split_hosted(s)?;
        let ext = ext.ok_or(TokenError::MissingExtension(id))?;
        Ok(EmojiToken::Hosted { id, ext })
    }
}

impl Serialize for EmojiToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EmojiToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// One entry of an emoji list: the token plus a user-assigned display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiEntry {
    /// The emoji reference.
    pub token: EmojiToken,
    /// Display name used for search; empty means unnamed.
    #[serde(default)]
    pub name: String,
}

impl EmojiEntry {
    /// Creates an entry with the given token and name.
    pub fn new(token: EmojiToken, name: impl Into<String>) -> Self {
        Self {
            token,
            name: name.into(),
        }
    }

    /// Creates an unnamed entry.
    pub fn unnamed(token: EmojiToken) -> Self {
        Self::new(token, "")
    }

    /// Case-insensitive substring match of `query` against the display name.
    /// An empty query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Identity of an authenticated user, as assigned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Returns the raw ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
