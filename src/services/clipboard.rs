//! Clipboard sink seam.
//!
//! The clipboard is an external collaborator: write-only, accepting either
//! a literal system-emoji string or a constructed CDN URL. The UI layer
//! supplies the real implementation.

/// Write-only clipboard.
pub trait ClipboardSink: Send + Sync {
    /// Writes `text` to the clipboard.
    fn write_text(&self, text: &str);
}

/// Sink for the terminal driver: prints the payload so it can be selected.
#[derive(Debug, Default)]
pub struct StdoutClipboard;

impl ClipboardSink for StdoutClipboard {
    fn write_text(&self, text: &str) {
        println!("{text}");
    }
}
