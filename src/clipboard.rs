use anyhow::{Context, Result};

/// Write-only clipboard
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The OS clipboard, opened on first use.
///
/// Opening can fail on headless sessions; that only matters once the user
/// actually copies something.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.inner.is_none() {
            self.inner = Some(arboard::Clipboard::new().context("Failed to open system clipboard")?);
        }
        let Some(clipboard) = self.inner.as_mut() else {
            return Ok(());
        };
        clipboard
            .set_text(text.to_owned())
            .context("Failed to write to system clipboard")
    }
}
