//! Clipboard access.

use crate::error::{PowerbaseError, PowerbaseResult};

/// Somewhere a query is read from and written back to.
pub trait Clipboard {
    fn read(&mut self) -> PowerbaseResult<String>;
    fn write(&mut self, text: &str) -> PowerbaseResult<()>;
}

/// The operating system clipboard.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> PowerbaseResult<Self> {
        let inner = arboard::Clipboard::new().map_err(PowerbaseError::clipboard)?;
        Ok(Self { inner })
    }
}

impl Clipboard for SystemClipboard {
    fn read(&mut self) -> PowerbaseResult<String> {
        self.inner.get_text().map_err(PowerbaseError::clipboard)
    }

    fn write(&mut self, text: &str) -> PowerbaseResult<()> {
        self.inner.set_text(text).map_err(PowerbaseError::clipboard)
    }
}

/// An in-process clipboard.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    contents: Option<String>,
}

impl MemoryClipboard {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            contents: Some(text.into()),
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl Clipboard for MemoryClipboard {
    fn read(&mut self) -> PowerbaseResult<String> {
        self.contents
            .clone()
            .ok_or_else(|| PowerbaseError::clipboard("clipboard is empty"))
    }

    fn write(&mut self, text: &str) -> PowerbaseResult<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_memory_clipboard() {
        let mut clipboard = MemoryClipboard::default();
        let err = clipboard.read().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.to_string(), "Clipboard error: clipboard is empty");

        clipboard.write("select 1").unwrap();
        assert_eq!(clipboard.read().unwrap(), "select 1");
        assert_eq!(clipboard.contents(), Some("select 1"));
    }
}
