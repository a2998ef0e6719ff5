use async_trait::async_trait;

use super::CommandResult;
use crate::types::{CaptureMode, Region, WindowInfo};

/// Commands issued by the region selector window.
#[async_trait]
pub trait SelectorCommands: Send + Sync {
    /// Window under the mouse, with its title bar height.
    async fn detect_window_under_cursor(&self) -> CommandResult<Option<WindowInfo>>;

    async fn get_cursor_position(&self) -> CommandResult<Option<(f64, f64)>>;

    async fn set_capture_region(&self, region: Region) -> CommandResult<()>;

    /// Capture the region set last. Writes the file and the clipboard.
    async fn capture_still(&self) -> CommandResult<()>;

    async fn start_recording(&self) -> CommandResult<()>;

    /// Mode requested by the shortcut or tray item that opened the selector.
    async fn get_pending_mode(&self) -> CommandResult<Option<CaptureMode>>;

    async fn clear_pending_mode(&self) -> CommandResult<()>;
}

/// Stop control used by the recording border overlay.
#[async_trait]
pub trait RecordingControl: Send + Sync {
    async fn stop_recording(&self) -> CommandResult<()>;
}
