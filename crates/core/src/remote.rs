//! RemoteDesktop trait — the input/screenshot capability of a sandboxed desktop.
//!
//! Coordinates handed to these methods are always native display pixels.
//! Each call either succeeds completely or fails with a [`RemoteError`].

use async_trait::async_trait;

use crate::action::{MouseButton, Resolution, ScrollDirection};
use crate::error::RemoteError;

#[async_trait]
pub trait RemoteDesktop: Send + Sync {
    /// A human-readable name for this desktop (e.g., "e2b", "dry-run").
    fn name(&self) -> &str;

    /// The real display size.
    async fn native_resolution(&self) -> Result<Resolution, RemoteError>;

    async fn move_to(&self, x: u32, y: u32) -> Result<(), RemoteError>;

    async fn click_at(&self, x: u32, y: u32, button: MouseButton) -> Result<(), RemoteError>;

    async fn double_click_at(&self, x: u32, y: u32) -> Result<(), RemoteError>;

    /// Type text at the current focus.
    async fn write(&self, text: &str) -> Result<(), RemoteError>;

    /// Press keys together, in order, then release them.
    async fn press_keys(&self, keys: &[String]) -> Result<(), RemoteError>;

    /// Scroll by `amount` wheel clicks at the current pointer position.
    async fn scroll(&self, direction: ScrollDirection, amount: u32) -> Result<(), RemoteError>;

    async fn drag(&self, from: (u32, u32), to: (u32, u32)) -> Result<(), RemoteError>;

    /// Capture the full display as encoded image bytes, PNG preferred.
    ///
    /// Frames shown to the model at native size are passed through with their
    /// sniffed media type; frames that need resizing must be PNG.
    async fn capture_screenshot(&self) -> Result<Vec<u8>, RemoteError>;

    /// URL of the focused browser page, for desktops that can tell.
    async fn current_url(&self) -> Result<Option<String>, RemoteError> {
        Ok(None)
    }
}
