use serde::{Deserialize, Serialize};

/// Screen-space capture rectangle as it crosses the command boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Window bounds reported by window detection, including the title bar
/// height so the selector can exclude it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub titlebar_height: u32,
}

impl WindowInfo {
    pub fn bounds(&self) -> Region {
        Region {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    /// Bounds with the title bar cut off the top. Falls back to the full
    /// bounds when the title bar would eat the whole window.
    pub fn content_bounds(&self) -> Region {
        if self.titlebar_height == 0 || self.titlebar_height >= self.height {
            return self.bounds();
        }
        Region {
            x: self.x,
            y: self.y + self.titlebar_height as i32,
            width: self.width,
            height: self.height - self.titlebar_height,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    Image,
    Gif,
    /// Reserved. Shown in the toolbar as a disabled option and never wired
    /// to a capture command.
    Video,
    Scroll,
}

impl CaptureMode {
    pub const ALL: [CaptureMode; 4] = [
        CaptureMode::Image,
        CaptureMode::Gif,
        CaptureMode::Video,
        CaptureMode::Scroll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::Image => "image",
            CaptureMode::Gif => "gif",
            CaptureMode::Video => "video",
            CaptureMode::Scroll => "scroll",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        CaptureMode::ALL.into_iter().find(|m| m.as_str() == s)
    }

    pub fn is_implemented(&self) -> bool {
        !matches!(self, CaptureMode::Video)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollCaptureProgress {
    pub frame_count: usize,
    pub total_height: u32,
    pub preview_base64: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingState {
    pub is_recording: bool,
    pub frame_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingInfo {
    pub frame_count: usize,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration_ms: u64,
    pub has_frames: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    Infinite,
    Once,
    PingPong,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    pub start_frame: usize,
    pub end_frame: usize,
    pub output_scale: f32,
    pub target_fps: u32,
    pub loop_mode: LoopMode,
    pub quality: u32,
    pub speed: f32,
    pub output_path: Option<String>,
}

impl ExportConfig {
    pub const DEFAULT_TARGET_FPS: u32 = 10;
    pub const DEFAULT_QUALITY: u32 = 80;

    /// Draft covering every recorded frame at full resolution.
    pub fn full_range(info: &RecordingInfo) -> Self {
        Self {
            start_frame: 0,
            end_frame: info.frame_count,
            output_scale: 1.0,
            target_fps: Self::DEFAULT_TARGET_FPS.min(info.fps.max(1)),
            loop_mode: LoopMode::Infinite,
            quality: Self::DEFAULT_QUALITY,
            speed: 1.0,
            output_path: None,
        }
    }

    pub fn trimmed_frames(&self) -> usize {
        self.end_frame.saturating_sub(self.start_frame)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeEstimate {
    pub frame_count: usize,
    pub output_width: u32,
    pub output_height: u32,
    pub estimated_bytes: u64,
    pub formatted: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportProgress {
    pub current: usize,
    pub total: usize,
    pub stage: String,
}

impl ExportProgress {
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.current.min(self.total) * 100) / self.total) as u32
    }
}

/// Payload of `export-complete`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResult {
    pub success: bool,
    pub path: Option<String>,
    pub error: Option<String>,
}
