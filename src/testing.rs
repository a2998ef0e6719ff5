//! In-memory engine and window host for controller tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::commands::*;
use crate::config::AppConfig;
use crate::geometry::CropEdges;
use crate::startup::StartupParams;
use crate::types::*;
use crate::window::WindowHost;

#[derive(Default)]
pub struct FakeState {
    pub calls: Vec<String>,
    pub failing: HashSet<&'static str>,

    pub window_under_cursor: Option<WindowInfo>,
    pub cursor: Option<(f64, f64)>,
    pub pending_mode: Option<CaptureMode>,
    pub regions: Vec<Region>,

    pub scroll_start: Option<ScrollCaptureProgress>,
    pub poll_results: VecDeque<Option<ScrollCaptureProgress>>,
    pub finish_crops: Vec<Option<CropEdges>>,
    pub copy_crops: Vec<Option<CropEdges>>,

    pub recording_info: Option<RecordingInfo>,
    pub estimates: Vec<ExportConfig>,
    pub exports: Vec<ExportConfig>,
    pub thumbnails: Vec<usize>,
    pub opened: Vec<String>,
    pub revealed: Vec<String>,
    pub save_path: Option<String>,

    pub app_config: AppConfig,
    pub saved_shortcuts: Vec<(String, String)>,
}

#[derive(Default)]
pub struct FakeEngine {
    state: Mutex<FakeState>,
    poll_latency: Mutex<Duration>,
    polls_in_flight: AtomicUsize,
    pub max_polls_in_flight: AtomicUsize,
    pub polls_started: AtomicUsize,
}

pub fn progress(frames: usize, height: u32) -> ScrollCaptureProgress {
    ScrollCaptureProgress {
        frame_count: frames,
        total_height: height,
        preview_base64: format!("data:image/jpeg;base64,{}x{}", frames, height),
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn fail(&self, command: &'static str) {
        self.state().failing.insert(command);
    }

    pub fn heal(&self, command: &'static str) {
        self.state().failing.remove(command);
    }

    pub fn set_poll_latency(&self, latency: Duration) {
        *self.poll_latency.lock().unwrap() = latency;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn called(&self, command: &str) -> bool {
        self.state().calls.iter().any(|c| c == command)
    }

    fn record(&self, command: &'static str) -> CommandResult<()> {
        let mut s = self.state();
        s.calls.push(command.to_string());
        if s.failing.contains(command) {
            return Err(CommandError::failed(command, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl SelectorCommands for FakeEngine {
    async fn detect_window_under_cursor(&self) -> CommandResult<Option<WindowInfo>> {
        self.record("detect_window_under_cursor")?;
        Ok(self.state().window_under_cursor)
    }

    async fn get_cursor_position(&self) -> CommandResult<Option<(f64, f64)>> {
        self.record("get_cursor_position")?;
        Ok(self.state().cursor)
    }

    async fn set_capture_region(&self, region: Region) -> CommandResult<()> {
        self.record("set_capture_region")?;
        self.state().regions.push(region);
        Ok(())
    }

    async fn capture_still(&self) -> CommandResult<()> {
        self.record("capture_still")
    }

    async fn start_recording(&self) -> CommandResult<()> {
        self.record("start_recording")
    }

    async fn get_pending_mode(&self) -> CommandResult<Option<CaptureMode>> {
        self.record("get_pending_mode")?;
        Ok(self.state().pending_mode)
    }

    async fn clear_pending_mode(&self) -> CommandResult<()> {
        self.record("clear_pending_mode")?;
        self.state().pending_mode = None;
        Ok(())
    }
}

#[async_trait]
impl RecordingControl for FakeEngine {
    async fn stop_recording(&self) -> CommandResult<()> {
        self.record("stop_recording")
    }
}

#[async_trait]
impl ScrollCommands for FakeEngine {
    async fn start_scroll_capture(&self) -> CommandResult<ScrollCaptureProgress> {
        self.record("start_scroll_capture")?;
        Ok(self.state().scroll_start.clone().unwrap_or_else(|| progress(1, 600)))
    }

    async fn poll_scroll_frame(&self) -> CommandResult<Option<ScrollCaptureProgress>> {
        self.polls_started.fetch_add(1, Ordering::SeqCst);
        let now = self.polls_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_polls_in_flight.fetch_max(now, Ordering::SeqCst);

        let latency = *self.poll_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let result = self
            .record("poll_scroll_frame")
            .map(|_| self.state().poll_results.pop_front().flatten());
        self.polls_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn finish_scroll_capture(
        &self,
        path: Option<String>,
        crop: Option<CropEdges>,
    ) -> CommandResult<Option<String>> {
        self.record("finish_scroll_capture")?;
        self.state().finish_crops.push(crop);
        Ok(path.or_else(|| Some("/tmp/lovshot/scroll.png".to_string())))
    }

    async fn copy_scroll_to_clipboard(&self, crop: Option<CropEdges>) -> CommandResult<()> {
        self.record("copy_scroll_to_clipboard")?;
        self.state().copy_crops.push(crop);
        Ok(())
    }

    async fn cancel_scroll_capture(&self) -> CommandResult<()> {
        self.record("cancel_scroll_capture")
    }
}

#[async_trait]
impl ExportCommands for FakeEngine {
    async fn get_recording_info(&self) -> CommandResult<RecordingInfo> {
        self.record("get_recording_info")?;
        self.state()
            .recording_info
            .ok_or_else(|| CommandError::failed("get_recording_info", "no recording"))
    }

    async fn get_filmstrip(&self, count: usize, thumb_height: u32) -> CommandResult<Vec<String>> {
        self.record("get_filmstrip")?;
        Ok((0..count)
            .map(|i| format!("thumb-{}-{}", i, thumb_height))
            .collect())
    }

    async fn get_frame_thumbnail(&self, frame_index: usize, max_height: u32) -> CommandResult<String> {
        self.record("get_frame_thumbnail")?;
        self.state().thumbnails.push(frame_index);
        Ok(format!("frame-{}-{}", frame_index, max_height))
    }

    async fn estimate_export_size(&self, config: &ExportConfig) -> CommandResult<SizeEstimate> {
        self.record("estimate_export_size")?;
        self.state().estimates.push(config.clone());
        Ok(SizeEstimate {
            frame_count: config.trimmed_frames(),
            output_width: 100,
            output_height: 100,
            estimated_bytes: config.trimmed_frames() as u64 * 1000,
            formatted: format!("{} KB", config.trimmed_frames()),
        })
    }

    async fn export_gif(&self, config: &ExportConfig) -> CommandResult<()> {
        self.record("export_gif")?;
        self.state().exports.push(config.clone());
        Ok(())
    }

    async fn discard_recording(&self) -> CommandResult<()> {
        self.record("discard_recording")
    }

    async fn open_file(&self, path: &str) -> CommandResult<()> {
        self.record("open_file")?;
        self.state().opened.push(path.to_string());
        Ok(())
    }

    async fn reveal_in_folder(&self, path: &str) -> CommandResult<()> {
        self.record("reveal_in_folder")?;
        self.state().revealed.push(path.to_string());
        Ok(())
    }
}

#[async_trait]
impl SaveDialog for FakeEngine {
    async fn choose_save_path(&self, _default_name: &str) -> CommandResult<Option<String>> {
        self.record("choose_save_path")?;
        Ok(self.state().save_path.clone())
    }
}

#[async_trait]
impl ShortcutCommands for FakeEngine {
    async fn get_shortcuts_config(&self) -> CommandResult<AppConfig> {
        self.record("get_shortcuts_config")?;
        Ok(self.state().app_config.clone())
    }

    async fn save_shortcut(&self, action: &str, shortcut_str: &str) -> CommandResult<AppConfig> {
        self.record("save_shortcut")?;
        let mut s = self.state();
        let cfg = crate::config::ShortcutConfig::from_shortcut_string(shortcut_str)
            .ok_or_else(|| CommandError::failed("save_shortcut", "Invalid shortcut format"))?;
        s.saved_shortcuts
            .push((action.to_string(), shortcut_str.to_string()));
        s.app_config.shortcuts.insert(action.to_string(), cfg);
        Ok(s.app_config.clone())
    }

    async fn reset_shortcuts_to_default(&self) -> CommandResult<AppConfig> {
        self.record("reset_shortcuts_to_default")?;
        let mut s = self.state();
        s.app_config = AppConfig::default();
        Ok(s.app_config.clone())
    }

    async fn set_developer_mode(&self, enabled: bool) -> CommandResult<AppConfig> {
        self.record("set_developer_mode")?;
        let mut s = self.state();
        s.app_config.developer_mode = enabled;
        Ok(s.app_config.clone())
    }

    async fn pause_shortcuts(&self) -> CommandResult<()> {
        self.record("pause_shortcuts")
    }

    async fn resume_shortcuts(&self) -> CommandResult<()> {
        self.record("resume_shortcuts")
    }
}

/// Window host that records every call as `"<op>:<label>"`.
#[derive(Default)]
pub struct FakeWindows {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    pub opened: Mutex<Vec<(String, String, StartupParams)>>,
}

impl FakeWindows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Make one `"<op>:<label>"` call fail.
    pub fn fail(&self, call: &str) {
        self.failing.lock().unwrap().insert(call.to_string());
    }

    fn record(&self, call: String) -> CommandResult<()> {
        let failing = self.failing.lock().unwrap().contains(&call);
        self.calls.lock().unwrap().push(call.clone());
        if failing {
            return Err(CommandError::failed("window", call));
        }
        Ok(())
    }
}

#[async_trait]
impl WindowHost for FakeWindows {
    async fn show(&self, label: &str) -> CommandResult<()> {
        self.record(format!("show:{}", label))
    }

    async fn hide(&self, label: &str) -> CommandResult<()> {
        self.record(format!("hide:{}", label))
    }

    async fn close(&self, label: &str) -> CommandResult<()> {
        self.record(format!("close:{}", label))
    }

    async fn focus(&self, label: &str) -> CommandResult<()> {
        self.record(format!("focus:{}", label))
    }

    async fn set_click_through(&self, label: &str, enabled: bool) -> CommandResult<()> {
        self.record(format!("click_through:{}:{}", label, enabled))
    }

    async fn open(&self, label: &str, page: &str, params: &StartupParams) -> CommandResult<()> {
        self.record(format!("open:{}", label))?;
        self.opened
            .lock()
            .unwrap()
            .push((label.to_string(), page.to_string(), params.clone()));
        Ok(())
    }
}
