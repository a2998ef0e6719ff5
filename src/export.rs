//! GIF editor: trim the recorded frames, tune output settings against a
//! live size estimate, then export.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::commands::{CommandResult, ExportCommands, SaveDialog};
use crate::config::{Capabilities, PostExportAction, PreferenceStore, Preferences};
use crate::events::HostEvent;
use crate::geometry::{frame_percent, Track};
use crate::input::{HitTarget, KeyEvent, KeyOutcome, PointerEvent};
use crate::types::{
    ExportConfig, ExportProgress, LoopMode, RecordingInfo, RecordingState, SaveResult, SizeEstimate,
};
use crate::window::{Flow, WindowController, WindowInput};

pub const FILMSTRIP_COUNT: usize = 10;
pub const FILMSTRIP_THUMB_HEIGHT: u32 = 48;
pub const PREVIEW_THUMB_HEIGHT: u32 = 240;

pub const SCALE_PRESETS: [f32; 4] = [1.0, 0.75, 0.5, 0.25];

/// Seconds the exported GIF plays for. The output frame rate only changes
/// how many frames are sampled, not how long they last.
pub fn output_duration_secs(trimmed_frames: usize, recording_fps: u32, speed: f32) -> f64 {
    if recording_fps == 0 || speed <= 0.0 {
        return 0.0;
    }
    trimmed_frames as f64 / recording_fps as f64 / speed as f64
}

/// `recording_20240131_154500.gif`
pub fn default_file_name(now: DateTime<Local>) -> String {
    format!("recording_{}.gif", now.format("%Y%m%d_%H%M%S"))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionPreset {
    pub scale_percent: u32,
    pub width: u32,
    pub height: u32,
}

impl ResolutionPreset {
    pub fn label(&self) -> String {
        format!("{}% ({}×{})", self.scale_percent, self.width, self.height)
    }
}

pub fn resolution_presets(info: &RecordingInfo) -> Vec<ResolutionPreset> {
    SCALE_PRESETS
        .iter()
        .map(|scale| ResolutionPreset {
            scale_percent: (scale * 100.0).round() as u32,
            width: (info.width as f32 * scale) as u32,
            height: (info.height as f32 * scale) as u32,
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrimHandle {
    Start,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    Trim(TrimHandle),
    Scrub,
}

pub struct GifExportController<C, D> {
    commands: Arc<C>,
    dialog: Arc<D>,
    capabilities: Capabilities,
    prefs_store: PreferenceStore,
    prefs: Preferences,

    info: Option<RecordingInfo>,
    config: Option<ExportConfig>,
    filmstrip: Vec<String>,
    estimate: Option<SizeEstimate>,

    track: Track,
    drag: Option<Drag>,
    preview_frame: Option<usize>,
    preview_thumbnail: Option<String>,

    recording: bool,
    live_frame_count: u32,

    exporting: bool,
    progress: Option<ExportProgress>,
    result: Option<SaveResult>,
}

impl<C, D> GifExportController<C, D>
where
    C: ExportCommands,
    D: SaveDialog,
{
    pub fn new(
        commands: Arc<C>,
        dialog: Arc<D>,
        capabilities: Capabilities,
        prefs_store: PreferenceStore,
    ) -> Self {
        let prefs = prefs_store.load();
        Self {
            commands,
            dialog,
            capabilities,
            prefs_store,
            prefs,
            info: None,
            config: None,
            filmstrip: Vec::new(),
            estimate: None,
            track: Track::default(),
            drag: None,
            preview_frame: None,
            preview_thumbnail: None,
            recording: false,
            live_frame_count: 0,
            exporting: false,
            progress: None,
            result: None,
        }
    }

    pub fn info(&self) -> Option<&RecordingInfo> {
        self.info.as_ref()
    }

    pub fn config(&self) -> Option<&ExportConfig> {
        self.config.as_ref()
    }

    pub fn filmstrip(&self) -> &[String] {
        &self.filmstrip
    }

    pub fn estimate(&self) -> Option<&SizeEstimate> {
        self.estimate.as_ref()
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    pub fn progress(&self) -> Option<&ExportProgress> {
        self.progress.as_ref()
    }

    pub fn result(&self) -> Option<&SaveResult> {
        self.result.as_ref()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn live_frame_count(&self) -> u32 {
        self.live_frame_count
    }

    pub fn preview_frame(&self) -> Option<usize> {
        self.preview_frame
    }

    pub fn preview_thumbnail(&self) -> Option<&str> {
        self.preview_thumbnail.as_deref()
    }

    pub fn post_export_action(&self) -> PostExportAction {
        self.prefs.post_export_action
    }

    pub fn presets(&self) -> Vec<ResolutionPreset> {
        self.info.as_ref().map(resolution_presets).unwrap_or_default()
    }

    pub fn set_track(&mut self, track: Track) {
        self.track = track;
    }

    fn total_frames(&self) -> usize {
        self.info.map(|i| i.frame_count).unwrap_or(0)
    }

    /// Handle positions along the filmstrip, in percent.
    pub fn trim_percents(&self) -> Option<(f64, f64)> {
        let total = self.total_frames();
        self.config.as_ref().map(|c| {
            (
                frame_percent(c.start_frame, total),
                frame_percent(c.end_frame, total),
            )
        })
    }

    pub fn duration_secs(&self) -> f64 {
        match (&self.info, &self.config) {
            (Some(info), Some(cfg)) => output_duration_secs(cfg.trimmed_frames(), info.fps, cfg.speed),
            _ => 0.0,
        }
    }

    /// Load the draft for a recording that just stopped.
    pub async fn on_recording_stopped(&mut self) -> CommandResult<()> {
        self.recording = false;
        let info = self.commands.get_recording_info().await?;
        if !info.has_frames {
            log::warn!("[export] recording has no frames");
            self.clear_draft();
            return Ok(());
        }
        log::info!(
            "[export] recording ready: {} frames, {}x{} @ {}fps",
            info.frame_count,
            info.width,
            info.height,
            info.fps
        );

        self.info = Some(info);
        self.config = Some(ExportConfig::full_range(&info));
        self.result = None;
        self.progress = None;
        self.preview_frame = None;
        self.preview_thumbnail = None;

        self.filmstrip = match self
            .commands
            .get_filmstrip(FILMSTRIP_COUNT, FILMSTRIP_THUMB_HEIGHT)
            .await
        {
            Ok(thumbs) => thumbs,
            Err(e) => {
                log::warn!("[export] filmstrip unavailable: {}", e);
                Vec::new()
            }
        };

        self.refresh_estimate().await;
        Ok(())
    }

    fn clear_draft(&mut self) {
        self.info = None;
        self.config = None;
        self.filmstrip.clear();
        self.estimate = None;
        self.drag = None;
        self.preview_frame = None;
        self.preview_thumbnail = None;
        self.progress = None;
        self.result = None;
    }

    pub async fn refresh_estimate(&mut self) {
        let Some(config) = self.config.clone() else {
            return;
        };
        match self.commands.estimate_export_size(&config).await {
            Ok(estimate) => self.estimate = Some(estimate),
            Err(e) => log::debug!("[export] estimate failed: {}", e),
        }
    }

    /// Apply `f` to the config and re-estimate if anything changed.
    async fn update(&mut self, f: impl FnOnce(&mut ExportConfig)) -> bool {
        let Some(config) = self.config.as_mut() else {
            return false;
        };
        let before = config.clone();
        f(config);
        if *config == before {
            return false;
        }
        self.refresh_estimate().await;
        true
    }

    pub async fn set_quality(&mut self, quality: u32) -> bool {
        self.update(|c| c.quality = quality.clamp(1, 100)).await
    }

    pub async fn set_target_fps(&mut self, fps: u32) -> bool {
        self.update(|c| c.target_fps = fps.clamp(1, 60)).await
    }

    pub async fn set_speed(&mut self, speed: f32) -> bool {
        if speed.is_nan() {
            return false;
        }
        self.update(|c| c.speed = speed.clamp(0.1, 10.0)).await
    }

    pub async fn set_loop_mode(&mut self, mode: LoopMode) -> bool {
        self.update(|c| c.loop_mode = mode).await
    }

    /// Only the preset scales are accepted.
    pub async fn set_scale(&mut self, scale: f32) -> bool {
        if !SCALE_PRESETS.iter().any(|p| (p - scale).abs() < f32::EPSILON) {
            log::debug!("[export] scale {} is not a preset", scale);
            return false;
        }
        self.update(|c| c.output_scale = scale).await
    }

    /// Move the start handle; it stays at least one frame before the end.
    pub async fn set_trim_start(&mut self, frame: usize) -> bool {
        self.update(|c| c.start_frame = frame.min(c.end_frame.saturating_sub(1)))
            .await
    }

    /// Move the end handle; it stays at least one frame after the start.
    pub async fn set_trim_end(&mut self, frame: usize) -> bool {
        let total = self.total_frames();
        self.update(|c| c.end_frame = frame.clamp(c.start_frame + 1, total.max(c.start_frame + 1)))
            .await
    }

    pub async fn scrub_to(&mut self, frame: usize) {
        if !self.capabilities.live_scrub || self.config.is_none() {
            return;
        }
        let frame = frame.min(self.total_frames().saturating_sub(1));
        if self.preview_frame == Some(frame) {
            return;
        }
        self.preview_frame = Some(frame);
        match self
            .commands
            .get_frame_thumbnail(frame, PREVIEW_THUMB_HEIGHT)
            .await
        {
            // Drop the answer if the playhead already moved on.
            Ok(thumb) if self.preview_frame == Some(frame) => self.preview_thumbnail = Some(thumb),
            Ok(_) => {}
            Err(e) => log::debug!("[export] thumbnail for frame {} failed: {}", frame, e),
        }
    }

    pub async fn pointer_down(&mut self, ev: PointerEvent) {
        if self.config.is_none() || self.exporting {
            return;
        }
        match ev.target {
            HitTarget::TrimStart => self.drag = Some(Drag::Trim(TrimHandle::Start)),
            HitTarget::TrimEnd => self.drag = Some(Drag::Trim(TrimHandle::End)),
            HitTarget::Filmstrip if self.capabilities.live_scrub => {
                self.drag = Some(Drag::Scrub);
                self.scrub_to(self.track.frame_at(ev.x, self.total_frames())).await;
            }
            _ => {}
        }
    }

    pub async fn pointer_move(&mut self, ev: PointerEvent) {
        let Some(drag) = self.drag else {
            return;
        };
        let frame = self.track.frame_at(ev.x, self.total_frames());
        match drag {
            Drag::Trim(TrimHandle::Start) => {
                self.set_trim_start(frame).await;
            }
            Drag::Trim(TrimHandle::End) => {
                self.set_trim_end(frame).await;
            }
            Drag::Scrub => self.scrub_to(frame).await,
        }
    }

    /// Release ends any drag, wherever the pointer is.
    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Ask where to save, then start the export. Progress and completion
    /// arrive as events.
    pub async fn export(&mut self) {
        if self.exporting {
            return;
        }
        let Some(mut config) = self.config.clone() else {
            return;
        };

        let path = match self
            .dialog
            .choose_save_path(&default_file_name(Local::now()))
            .await
        {
            Ok(Some(path)) => path,
            Ok(None) => {
                log::info!("[export] save cancelled");
                return;
            }
            Err(e) => {
                log::error!("[export] save dialog failed: {}", e);
                return;
            }
        };

        config.output_path = Some(path.clone());
        if let Some(current) = self.config.as_mut() {
            current.output_path = Some(path.clone());
        }
        self.exporting = true;
        self.progress = None;
        self.result = None;
        log::info!("[export] exporting to {}", path);

        if let Err(e) = self.commands.export_gif(&config).await {
            log::error!("[export] export_gif failed: {}", e);
            self.exporting = false;
            self.result = Some(SaveResult {
                success: false,
                path: None,
                error: Some(e.message()),
            });
        }
    }

    pub fn on_export_progress(&mut self, progress: ExportProgress) {
        if self.exporting {
            self.progress = Some(progress);
        }
    }

    pub fn on_export_complete(&mut self, result: SaveResult) {
        self.exporting = false;
        self.progress = None;
        if result.success {
            log::info!("[export] saved {:?}", result.path);
        } else {
            log::error!("[export] export failed: {:?}", result.error);
        }
        self.result = Some(result);
    }

    /// Open or reveal the exported file and remember the choice.
    pub async fn apply_post_export(&mut self, action: PostExportAction) -> CommandResult<()> {
        let Some(path) = self.result.as_ref().and_then(|r| r.path.clone()) else {
            return Ok(());
        };

        if self.prefs.post_export_action != action {
            self.prefs.post_export_action = action;
            if let Err(e) = self.prefs_store.save(&self.prefs) {
                log::warn!("[export] could not remember post-export action: {}", e);
            }
        }

        match action {
            PostExportAction::OpenFile => self.commands.open_file(&path).await,
            PostExportAction::RevealInFolder => self.commands.reveal_in_folder(&path).await,
        }
    }

    /// Throw the recording away.
    pub async fn discard(&mut self) {
        if let Err(e) = self.commands.discard_recording().await {
            log::warn!("[export] discard_recording failed: {}", e);
        }
        self.clear_draft();
    }

    pub fn on_recording_state(&mut self, state: RecordingState) {
        if state.is_recording && !self.recording && self.info.is_some() {
            log::info!("[export] new recording started, dropping draft");
            self.clear_draft();
        }
        self.recording = state.is_recording;
        self.live_frame_count = state.frame_count;
    }

    pub async fn key(&mut self, ev: &KeyEvent) -> KeyOutcome {
        if ev.in_text_input || self.config.is_none() {
            return KeyOutcome::Ignored;
        }
        if ev.is("Escape") && self.drag.is_some() {
            self.drag = None;
            return KeyOutcome::Handled;
        }
        if ev.is("Enter") && !self.exporting {
            self.export().await;
            return KeyOutcome::Handled;
        }
        KeyOutcome::Ignored
    }
}

#[async_trait]
impl<C, D> WindowController for GifExportController<C, D>
where
    C: ExportCommands + 'static,
    D: SaveDialog + 'static,
{
    async fn on_input(&mut self, input: WindowInput) -> Flow {
        match input {
            WindowInput::PointerDown(ev) => self.pointer_down(ev).await,
            WindowInput::PointerMove(ev) => self.pointer_move(ev).await,
            WindowInput::PointerUp(_) => self.pointer_up(),
            WindowInput::Key(ev) => {
                self.key(&ev).await;
            }
            WindowInput::CloseRequested => return Flow::Closed,
        }
        Flow::Continue
    }

    async fn on_event(&mut self, event: HostEvent) -> Flow {
        match event {
            HostEvent::RecordingState(state) => self.on_recording_state(state),
            HostEvent::RecordingStopped(_) => {
                if let Err(e) = self.on_recording_stopped().await {
                    log::error!("[export] loading recording failed: {}", e);
                }
            }
            HostEvent::ExportProgress(progress) => self.on_export_progress(progress),
            HostEvent::ExportComplete(result) => self.on_export_complete(result),
            _ => {}
        }
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingStopped;
    use crate::testing::FakeEngine;
    use chrono::TimeZone;

    type Editor = GifExportController<FakeEngine, FakeEngine>;

    fn info(frames: usize, fps: u32) -> RecordingInfo {
        RecordingInfo {
            frame_count: frames,
            width: 800,
            height: 600,
            fps,
            duration_ms: frames as u64 * 1000 / fps as u64,
            has_frames: frames > 0,
        }
    }

    async fn editor_with(
        rec: RecordingInfo,
        caps: Capabilities,
    ) -> (Editor, Arc<FakeEngine>, tempfile::TempDir) {
        let engine = Arc::new(FakeEngine::new());
        engine.state().recording_info = Some(rec);
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("preferences.json"));
        let mut editor = GifExportController::new(engine.clone(), engine.clone(), caps, store);
        editor.on_recording_stopped().await.unwrap();
        (editor, engine, dir)
    }

    fn estimate_count(engine: &FakeEngine) -> usize {
        engine.state().estimates.len()
    }

    #[test]
    fn test_duration_formula() {
        assert_eq!(output_duration_secs(120, 30, 1.0), 4.0);
        assert_eq!(output_duration_secs(120, 30, 2.0), 2.0);
        assert_eq!(output_duration_secs(120, 30, 0.5), 8.0);
        assert_eq!(output_duration_secs(120, 0, 1.0), 0.0);
    }

    #[test]
    fn test_default_file_name() {
        let now = Local.with_ymd_and_hms(2024, 1, 31, 15, 45, 0).unwrap();
        assert_eq!(default_file_name(now), "recording_20240131_154500.gif");
    }

    #[test]
    fn test_resolution_presets() {
        let presets = resolution_presets(&info(10, 10));
        assert_eq!(presets.len(), SCALE_PRESETS.len());
        assert_eq!(presets[0].label(), "100% (800×600)");
        assert_eq!(presets[2].width, 400);
        assert_eq!(presets[3].height, 150);
    }

    #[tokio::test]
    async fn test_recording_stopped_loads_draft() {
        let (editor, engine, _dir) = editor_with(info(120, 30), Capabilities::default()).await;
        assert_eq!(
            engine.calls(),
            vec!["get_recording_info", "get_filmstrip", "estimate_export_size"]
        );
        let cfg = editor.config().unwrap();
        assert_eq!((cfg.start_frame, cfg.end_frame), (0, 120));
        assert_eq!(cfg.target_fps, 10);
        assert_eq!(editor.filmstrip().len(), FILMSTRIP_COUNT);
        assert_eq!(editor.filmstrip()[0], "thumb-0-48");
        assert_eq!(editor.estimate().map(|e| e.frame_count), Some(120));
        assert_eq!(editor.trim_percents(), Some((0.0, 100.0)));
    }

    #[tokio::test]
    async fn test_duration_scenario() {
        let (mut editor, _, _dir) = editor_with(info(120, 30), Capabilities::default()).await;
        assert_eq!(editor.duration_secs(), 4.0);

        editor.set_speed(2.0).await;
        assert_eq!(editor.duration_secs(), 2.0);

        editor.set_target_fps(10).await;
        assert_eq!(editor.duration_secs(), 2.0);
        editor.set_target_fps(25).await;
        assert_eq!(editor.duration_secs(), 2.0);
    }

    #[tokio::test]
    async fn test_every_change_reestimates() {
        let (mut editor, engine, _dir) = editor_with(info(120, 30), Capabilities::default()).await;
        assert_eq!(estimate_count(&engine), 1);

        assert!(editor.set_quality(50).await);
        assert!(editor.set_target_fps(15).await);
        assert!(editor.set_speed(1.5).await);
        assert!(editor.set_loop_mode(LoopMode::PingPong).await);
        assert!(editor.set_scale(0.5).await);
        assert!(editor.set_trim_start(30).await);
        assert_eq!(estimate_count(&engine), 7);

        // The newest estimate wins.
        assert_eq!(editor.estimate().map(|e| e.frame_count), Some(90));
        let last = engine.state().estimates.last().cloned().unwrap();
        assert_eq!(last.loop_mode, LoopMode::PingPong);
        assert_eq!(last.output_scale, 0.5);

        // No-op changes and rejected values do not.
        assert!(!editor.set_quality(50).await);
        assert!(!editor.set_scale(0.6).await);
        assert_eq!(estimate_count(&engine), 7);
    }

    #[tokio::test]
    async fn test_settings_are_clamped() {
        let (mut editor, _, _dir) = editor_with(info(120, 30), Capabilities::default()).await;
        editor.set_quality(0).await;
        assert_eq!(editor.config().unwrap().quality, 1);
        editor.set_quality(500).await;
        assert_eq!(editor.config().unwrap().quality, 100);
        editor.set_target_fps(240).await;
        assert_eq!(editor.config().unwrap().target_fps, 60);
        editor.set_speed(0.0).await;
        assert_eq!(editor.config().unwrap().speed, 0.1);
        editor.set_speed(50.0).await;
        assert_eq!(editor.config().unwrap().speed, 10.0);
        assert!(!editor.set_speed(f32::NAN).await);
    }

    #[tokio::test]
    async fn test_trim_handles_keep_order() {
        let (mut editor, _, _dir) = editor_with(info(20, 10), Capabilities::default()).await;

        editor.set_trim_start(50).await;
        assert_eq!(editor.config().unwrap().start_frame, 19);
        editor.set_trim_end(0).await;
        assert_eq!(editor.config().unwrap().end_frame, 20);

        editor.set_trim_start(5).await;
        editor.set_trim_end(3).await;
        let cfg = editor.config().unwrap();
        assert_eq!((cfg.start_frame, cfg.end_frame), (5, 6));

        for (i, frame) in [0usize, 19, 7, 25, 1, 12, 0, 20].iter().enumerate() {
            if i % 2 == 0 {
                editor.set_trim_start(*frame).await;
            } else {
                editor.set_trim_end(*frame).await;
            }
            let cfg = editor.config().unwrap();
            assert!(cfg.start_frame < cfg.end_frame, "{:?}", cfg);
            assert!(cfg.end_frame <= 20);
        }
    }

    #[tokio::test]
    async fn test_trim_drag_ends_on_release_anywhere() {
        let (mut editor, _, _dir) = editor_with(info(100, 10), Capabilities::default()).await;
        editor.set_track(Track::new(0.0, 1000.0));

        editor
            .pointer_down(PointerEvent::new(0.0, 0.0, HitTarget::TrimStart))
            .await;
        editor.pointer_move(PointerEvent::at(250.0, 0.0)).await;
        assert_eq!(editor.config().unwrap().start_frame, 25);

        // Released far outside the track.
        editor.pointer_up();
        assert!(!editor.is_dragging());
        editor.pointer_move(PointerEvent::at(900.0, 400.0)).await;
        assert_eq!(editor.config().unwrap().start_frame, 25);

        editor
            .pointer_down(PointerEvent::new(1000.0, 0.0, HitTarget::TrimEnd))
            .await;
        editor.pointer_move(PointerEvent::at(-500.0, 0.0)).await;
        editor.pointer_up();
        assert_eq!(editor.config().unwrap().end_frame, 26);
    }

    #[tokio::test]
    async fn test_scrub_fetches_preview() {
        let (mut editor, engine, _dir) = editor_with(info(100, 10), Capabilities::default()).await;
        editor.set_track(Track::new(0.0, 100.0));

        editor
            .pointer_down(PointerEvent::new(40.0, 0.0, HitTarget::Filmstrip))
            .await;
        editor.pointer_move(PointerEvent::at(60.0, 0.0)).await;
        editor.pointer_up();

        assert_eq!(editor.preview_frame(), Some(60));
        assert_eq!(editor.preview_thumbnail(), Some("frame-60-240"));
        assert_eq!(engine.state().thumbnails, vec![40, 60]);
        // Scrubbing is not a config change.
        assert_eq!(editor.config().unwrap().start_frame, 0);
    }

    #[tokio::test]
    async fn test_scrub_disabled_without_capability() {
        let caps = Capabilities {
            live_scrub: false,
            ..Capabilities::default()
        };
        let (mut editor, engine, _dir) = editor_with(info(100, 10), caps).await;
        editor.set_track(Track::new(0.0, 100.0));
        editor
            .pointer_down(PointerEvent::new(40.0, 0.0, HitTarget::Filmstrip))
            .await;
        editor.scrub_to(10).await;
        assert_eq!(editor.preview_frame(), None);
        assert!(!engine.called("get_frame_thumbnail"));
    }

    #[tokio::test]
    async fn test_cancelled_save_dialog_does_not_export() {
        let (mut editor, engine, _dir) = editor_with(info(30, 10), Capabilities::default()).await;
        editor.export().await;
        assert!(!editor.is_exporting());
        assert!(engine.called("choose_save_path"));
        assert!(!engine.called("export_gif"));
    }

    #[tokio::test]
    async fn test_export_lifecycle() {
        let (mut editor, engine, _dir) = editor_with(info(30, 10), Capabilities::default()).await;
        engine.state().save_path = Some("/tmp/out.gif".to_string());

        editor.export().await;
        assert!(editor.is_exporting());
        let sent = engine.state().exports[0].clone();
        assert_eq!(sent.output_path.as_deref(), Some("/tmp/out.gif"));
        assert_eq!(sent.end_frame, 30);
        assert_eq!(
            editor.config().and_then(|c| c.output_path.as_deref()),
            Some("/tmp/out.gif")
        );

        editor
            .on_event(HostEvent::ExportProgress(ExportProgress {
                current: 5,
                total: 10,
                stage: "encoding".to_string(),
            }))
            .await;
        assert_eq!(editor.progress().map(|p| p.percent()), Some(50));

        editor
            .on_event(HostEvent::ExportComplete(SaveResult {
                success: true,
                path: Some("/tmp/out.gif".to_string()),
                error: None,
            }))
            .await;
        assert!(!editor.is_exporting());
        assert_eq!(editor.result().map(|r| r.success), Some(true));
    }

    #[tokio::test]
    async fn test_failed_completion_clears_exporting() {
        let (mut editor, engine, _dir) = editor_with(info(30, 10), Capabilities::default()).await;
        engine.state().save_path = Some("/tmp/out.gif".to_string());
        editor.export().await;

        editor.on_export_complete(SaveResult {
            success: false,
            path: None,
            error: Some("disk full".to_string()),
        });
        assert!(!editor.is_exporting());
        assert_eq!(
            editor.result().and_then(|r| r.error.as_deref()),
            Some("disk full")
        );
    }

    #[tokio::test]
    async fn test_export_command_failure_clears_exporting() {
        let (mut editor, engine, _dir) = editor_with(info(30, 10), Capabilities::default()).await;
        engine.state().save_path = Some("/tmp/out.gif".to_string());
        engine.fail("export_gif");

        editor.export().await;
        assert!(!editor.is_exporting());
        assert_eq!(editor.result().map(|r| r.success), Some(false));
    }

    #[tokio::test]
    async fn test_post_export_choice_is_remembered() {
        let (mut editor, engine, dir) = editor_with(info(30, 10), Capabilities::default()).await;
        assert_eq!(editor.post_export_action(), PostExportAction::OpenFile);

        editor.on_export_complete(SaveResult {
            success: true,
            path: Some("/tmp/out.gif".to_string()),
            error: None,
        });
        editor
            .apply_post_export(PostExportAction::RevealInFolder)
            .await
            .unwrap();
        assert_eq!(engine.state().revealed, vec!["/tmp/out.gif"]);

        let store = PreferenceStore::new(dir.path().join("preferences.json"));
        let reopened = GifExportController::new(engine.clone(), engine.clone(), Capabilities::default(), store);
        assert_eq!(reopened.post_export_action(), PostExportAction::RevealInFolder);
    }

    #[tokio::test]
    async fn test_new_recording_drops_draft() {
        let (mut editor, _, _dir) = editor_with(info(30, 10), Capabilities::default()).await;
        editor
            .on_event(HostEvent::RecordingState(RecordingState {
                is_recording: true,
                frame_count: 3,
            }))
            .await;
        assert!(editor.config().is_none());
        assert!(editor.is_recording());
        assert_eq!(editor.live_frame_count(), 3);

        editor
            .on_event(HostEvent::RecordingStopped(RecordingStopped { frame_count: 30 }))
            .await;
        assert!(!editor.is_recording());
        assert!(editor.config().is_some());
    }

    #[tokio::test]
    async fn test_discard_clears_draft() {
        let (mut editor, engine, _dir) = editor_with(info(30, 10), Capabilities::default()).await;
        editor.discard().await;
        assert!(engine.called("discard_recording"));
        assert!(editor.config().is_none());
        assert!(editor.filmstrip().is_empty());
    }
}
