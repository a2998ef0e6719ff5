use async_trait::async_trait;

use super::CommandResult;
use crate::geometry::CropEdges;
use crate::types::ScrollCaptureProgress;

/// Scroll capture lifecycle on the engine side.
///
/// Crop parameters are `None` for "no crop"; callers never pass an all-zero
/// `CropEdges`.
#[async_trait]
pub trait ScrollCommands: Send + Sync {
    /// Capture the first frame of the region set last.
    async fn start_scroll_capture(&self) -> CommandResult<ScrollCaptureProgress>;

    /// Compare a fresh frame with the last one and stitch it if the content
    /// moved. `None` means nothing changed since the previous frame.
    async fn poll_scroll_frame(&self) -> CommandResult<Option<ScrollCaptureProgress>>;

    /// Save the stitched image. Returns the written path when there is one.
    async fn finish_scroll_capture(
        &self,
        path: Option<String>,
        crop: Option<CropEdges>,
    ) -> CommandResult<Option<String>>;

    async fn copy_scroll_to_clipboard(&self, crop: Option<CropEdges>) -> CommandResult<()>;

    async fn cancel_scroll_capture(&self) -> CommandResult<()>;
}
