use async_trait::async_trait;

use super::CommandResult;
use crate::types::{ExportConfig, RecordingInfo, SizeEstimate};

/// Commands used by the GIF editor. Images come back as opaque data URLs.
#[async_trait]
pub trait ExportCommands: Send + Sync {
    async fn get_recording_info(&self) -> CommandResult<RecordingInfo>;

    /// `count` evenly sampled thumbnails, `thumb_height` pixels tall.
    async fn get_filmstrip(&self, count: usize, thumb_height: u32) -> CommandResult<Vec<String>>;

    async fn get_frame_thumbnail(&self, frame_index: usize, max_height: u32)
        -> CommandResult<String>;

    async fn estimate_export_size(&self, config: &ExportConfig) -> CommandResult<SizeEstimate>;

    /// Start encoding. Progress and the result arrive as `export-progress`
    /// and `export-complete` events.
    async fn export_gif(&self, config: &ExportConfig) -> CommandResult<()>;

    async fn discard_recording(&self) -> CommandResult<()>;

    async fn open_file(&self, path: &str) -> CommandResult<()>;

    async fn reveal_in_folder(&self, path: &str) -> CommandResult<()>;
}

/// Native save-location chooser.
#[async_trait]
pub trait SaveDialog: Send + Sync {
    /// `None` when the user cancels.
    async fn choose_save_path(&self, default_name: &str) -> CommandResult<Option<String>>;
}
