//! Clipboard seam for the share-link copy feature. The real clipboard
//! lives in the host shell; the page only needs something to write text to.

use crate::error::Result;

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// Clipboard backed by a plain string, for tests and headless use.
#[derive(Debug, Default)]
pub struct BufferClipboard {
    pub contents: Option<String>,
}

impl Clipboard for BufferClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}
