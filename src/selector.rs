//! Region selector: draw a rectangle or click a window, pick a mode, confirm.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::commands::SelectorCommands;
use crate::config::Capabilities;
use crate::events::HostEvent;
use crate::geometry::{resize_rect, Point, Rect, ResizeHandle, MIN_SELECTION_SIZE};
use crate::input::{HitTarget, KeyEvent, KeyOutcome, PointerEvent};
use crate::startup::StartupParams;
use crate::types::{CaptureMode, Region};
use crate::window::{self, Flow, WindowController, WindowHost, WindowInput};

/// Minimum spacing between two hover detection queries.
pub const HOVER_THROTTLE: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectorPhase {
    /// Hint shown, hover highlight active.
    Idle,
    /// Pointer is down and a rectangle is being drawn.
    Selecting,
    /// A rectangle is confirmed and the toolbar is visible.
    Toolbar,
    /// A capture command is in flight.
    Capturing,
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Captured,
    RecordingStarted,
    ScrollHandedOff,
    /// The command failed; the window is back in its toolbar state.
    Failed,
    NothingSelected,
    ModeUnavailable,
}

#[derive(Clone, Copy, Debug)]
struct ResizeDrag {
    handle: ResizeHandle,
    origin: Point,
    start: Rect,
}

pub struct RegionSelector<C, W> {
    commands: Arc<C>,
    windows: Arc<W>,
    capabilities: Capabilities,
    phase: SelectorPhase,
    mode: CaptureMode,
    anchor: Option<Point>,
    rect: Option<Rect>,
    hover: Option<Region>,
    last_hover_query: Option<Instant>,
    hide_titlebar: bool,
    resize: Option<ResizeDrag>,
}

impl<C, W> RegionSelector<C, W>
where
    C: SelectorCommands,
    W: WindowHost,
{
    pub fn new(commands: Arc<C>, windows: Arc<W>, capabilities: Capabilities) -> Self {
        Self {
            commands,
            windows,
            capabilities,
            phase: SelectorPhase::Idle,
            mode: CaptureMode::Image,
            anchor: None,
            rect: None,
            hover: None,
            last_hover_query: None,
            hide_titlebar: false,
            resize: None,
        }
    }

    pub fn phase(&self) -> SelectorPhase {
        self.phase
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// Rectangle being drawn or the confirmed one.
    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    pub fn confirmed_region(&self) -> Option<Region> {
        match self.phase {
            SelectorPhase::Toolbar | SelectorPhase::Capturing => self.rect.map(|r| r.to_region()),
            _ => None,
        }
    }

    pub fn hover_highlight(&self) -> Option<Region> {
        self.hover
    }

    pub fn toolbar_visible(&self) -> bool {
        self.phase == SelectorPhase::Toolbar
    }

    pub fn hint_visible(&self) -> bool {
        self.phase == SelectorPhase::Idle
    }

    pub fn size_label(&self) -> Option<String> {
        self.rect.map(|r| r.size_label())
    }

    pub fn hide_titlebar(&self) -> bool {
        self.hide_titlebar
    }

    /// Pick up the mode requested by whatever opened the selector.
    pub async fn open(&mut self) {
        match self.commands.get_pending_mode().await {
            Ok(Some(mode)) if self.capabilities.allows(mode) => self.mode = mode,
            Ok(Some(mode)) => {
                log::warn!("[selector] pending mode {:?} unavailable, using image", mode);
                self.mode = CaptureMode::Image;
            }
            Ok(None) => {}
            Err(e) => log::debug!("[selector] no pending mode: {}", e),
        }
        log::info!("[selector] opened in {:?} mode", self.mode);

        // Highlight the window already under the pointer before it moves.
        match self.commands.get_cursor_position().await {
            Ok(Some((x, y))) => {
                log::debug!("[selector] cursor at {}, {}", x, y);
                self.refresh_hover().await;
            }
            Ok(None) => {}
            Err(e) => log::debug!("[selector] cursor position unavailable: {}", e),
        }
    }

    /// Switch mode without leaving the current phase. Refuses modes that
    /// are disabled in this variant.
    pub fn set_mode(&mut self, mode: CaptureMode) -> bool {
        if !self.capabilities.allows(mode) {
            log::debug!("[selector] mode {:?} is disabled", mode);
            return false;
        }
        self.mode = mode;
        true
    }

    pub fn toggle_hide_titlebar(&mut self) -> bool {
        if self.capabilities.titlebar_exclusion {
            self.hide_titlebar = !self.hide_titlebar;
        }
        self.hide_titlebar
    }

    pub fn pointer_down(&mut self, ev: PointerEvent) {
        if matches!(self.phase, SelectorPhase::Capturing | SelectorPhase::Closed) {
            return;
        }
        match ev.target {
            HitTarget::Toolbar => {}
            HitTarget::Resize(handle) if self.can_resize() => {
                if let Some(start) = self.rect {
                    self.resize = Some(ResizeDrag {
                        handle,
                        origin: ev.point(),
                        start,
                    });
                }
            }
            _ => {
                self.rect = None;
                self.hover = None;
                self.resize = None;
                self.anchor = Some(ev.point());
                self.phase = SelectorPhase::Selecting;
            }
        }
    }

    fn can_resize(&self) -> bool {
        self.capabilities.resizable && self.phase == SelectorPhase::Toolbar && self.rect.is_some()
    }

    pub async fn pointer_move(&mut self, ev: PointerEvent) {
        if let Some(drag) = self.resize {
            let dx = ev.x - drag.origin.x;
            let dy = ev.y - drag.origin.y;
            self.rect = Some(resize_rect(drag.start, drag.handle, dx, dy, MIN_SELECTION_SIZE));
            return;
        }
        match self.phase {
            SelectorPhase::Selecting => {
                if let Some(anchor) = self.anchor {
                    self.rect = Some(Rect::from_points(anchor, ev.point()));
                }
            }
            SelectorPhase::Idle => self.refresh_hover().await,
            _ => {}
        }
    }

    /// Ask which window is under the cursor, at most once per throttle
    /// window. Failures only cost one highlight refresh.
    pub async fn refresh_hover(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_hover_query {
            if now.duration_since(last) < HOVER_THROTTLE {
                return;
            }
        }
        self.last_hover_query = Some(now);

        match self.commands.detect_window_under_cursor().await {
            Ok(found) => {
                // The pointer may have gone down while the query was out.
                if self.phase == SelectorPhase::Idle {
                    self.hover = found.map(|w| self.adopt_bounds(&w));
                }
            }
            Err(e) => log::debug!("[selector] hover detection failed: {}", e),
        }
    }

    fn adopt_bounds(&self, info: &crate::types::WindowInfo) -> Region {
        if self.hide_titlebar && self.capabilities.titlebar_exclusion {
            info.content_bounds()
        } else {
            info.bounds()
        }
    }

    pub async fn pointer_up(&mut self, ev: PointerEvent) {
        if self.resize.take().is_some() {
            return;
        }
        if self.phase != SelectorPhase::Selecting {
            return;
        }

        let drawn = self
            .anchor
            .take()
            .map(|anchor| Rect::from_points(anchor, ev.point()));

        match drawn {
            Some(rect) if rect.meets_min_size() => {
                self.rect = Some(rect);
                self.phase = SelectorPhase::Toolbar;
            }
            _ => self.click_to_detect().await,
        }
    }

    /// A press that never grew into a drag selects the window under the
    /// cursor, if there is one.
    async fn click_to_detect(&mut self) {
        self.rect = None;
        match self.commands.detect_window_under_cursor().await {
            Ok(Some(info)) => {
                let region = self.adopt_bounds(&info);
                log::info!(
                    "[selector] picked window x={}, y={}, w={}, h={}",
                    region.x,
                    region.y,
                    region.width,
                    region.height
                );
                self.rect = Some(Rect::from(region));
                self.phase = SelectorPhase::Toolbar;
            }
            Ok(None) => self.phase = SelectorPhase::Idle,
            Err(e) => {
                log::debug!("[selector] window detection failed: {}", e);
                self.phase = SelectorPhase::Idle;
            }
        }
    }

    pub async fn key(&mut self, ev: &KeyEvent) -> KeyOutcome {
        if ev.in_text_input || self.phase == SelectorPhase::Closed {
            return KeyOutcome::Ignored;
        }
        match ev.key.as_str() {
            "Enter" => {
                self.confirm().await;
                KeyOutcome::Handled
            }
            "Escape" => {
                self.cancel().await;
                KeyOutcome::Handled
            }
            _ if ev.modifiers.any() => KeyOutcome::Ignored,
            k if k.eq_ignore_ascii_case("i") => self.mode_key(CaptureMode::Image),
            k if k.eq_ignore_ascii_case("g") => self.mode_key(CaptureMode::Gif),
            k if k.eq_ignore_ascii_case("v") => self.mode_key(CaptureMode::Video),
            k if k.eq_ignore_ascii_case("s") => self.mode_key(CaptureMode::Scroll),
            k if k.eq_ignore_ascii_case("t") && self.capabilities.titlebar_exclusion => {
                self.toggle_hide_titlebar();
                KeyOutcome::Handled
            }
            _ => KeyOutcome::Ignored,
        }
    }

    fn mode_key(&mut self, mode: CaptureMode) -> KeyOutcome {
        if self.set_mode(mode) {
            KeyOutcome::Handled
        } else {
            KeyOutcome::Ignored
        }
    }

    /// Hand the confirmed rectangle to the engine in the current mode.
    pub async fn confirm(&mut self) -> ConfirmOutcome {
        if self.phase != SelectorPhase::Toolbar {
            return ConfirmOutcome::NothingSelected;
        }
        let Some(region) = self.rect.map(|r| r.to_region()) else {
            return ConfirmOutcome::NothingSelected;
        };
        if !self.capabilities.allows(self.mode) {
            log::warn!("[selector] {:?} capture is not implemented", self.mode);
            return ConfirmOutcome::ModeUnavailable;
        }

        self.phase = SelectorPhase::Capturing;
        if let Err(e) = self.commands.set_capture_region(region).await {
            log::error!("[selector] set_capture_region failed: {}", e);
            self.phase = SelectorPhase::Toolbar;
            return ConfirmOutcome::Failed;
        }

        match self.mode {
            CaptureMode::Image => self.capture_image().await,
            CaptureMode::Gif => self.start_gif(region).await,
            CaptureMode::Scroll => self.hand_off_scroll(region).await,
            CaptureMode::Video => {
                self.phase = SelectorPhase::Toolbar;
                ConfirmOutcome::ModeUnavailable
            }
        }
    }

    async fn capture_image(&mut self) -> ConfirmOutcome {
        if let Err(e) = self.windows.hide(window::SELECTOR).await {
            log::warn!("[selector] hide before capture failed: {}", e);
        }
        match self.commands.capture_still().await {
            Ok(()) => {
                self.close_window().await;
                ConfirmOutcome::Captured
            }
            Err(e) => {
                log::error!("[selector] capture_still failed: {}", e);
                self.restore_window().await;
                ConfirmOutcome::Failed
            }
        }
    }

    async fn start_gif(&mut self, region: Region) -> ConfirmOutcome {
        match self.commands.start_recording().await {
            Ok(()) => {
                let params = StartupParams::for_region(region, CaptureMode::Gif, self.capabilities);
                if let Err(e) = self
                    .windows
                    .open(window::RECORDING_OVERLAY, window::RECORDING_OVERLAY_PAGE, &params)
                    .await
                {
                    log::warn!("[selector] opening recording border failed: {}", e);
                }
                self.close_window().await;
                ConfirmOutcome::RecordingStarted
            }
            Err(e) => {
                log::error!("[selector] start_recording failed: {}", e);
                self.phase = SelectorPhase::Toolbar;
                ConfirmOutcome::Failed
            }
        }
    }

    async fn hand_off_scroll(&mut self, region: Region) -> ConfirmOutcome {
        if let Err(e) = self.windows.hide(window::SELECTOR).await {
            log::warn!("[selector] hide before scroll capture failed: {}", e);
        }
        let params = StartupParams::for_region(region, CaptureMode::Scroll, self.capabilities);
        match self
            .windows
            .open(window::SCROLL_OVERLAY, window::SCROLL_OVERLAY_PAGE, &params)
            .await
        {
            Ok(()) => {
                self.close_window().await;
                ConfirmOutcome::ScrollHandedOff
            }
            Err(e) => {
                log::error!("[selector] opening scroll overlay failed: {}", e);
                self.restore_window().await;
                ConfirmOutcome::Failed
            }
        }
    }

    /// Undo a hide made before a failed capture command.
    async fn restore_window(&mut self) {
        if let Err(e) = self.windows.show(window::SELECTOR).await {
            log::error!("[selector] restoring selector failed: {}", e);
        }
        self.phase = SelectorPhase::Toolbar;
    }

    async fn close_window(&mut self) {
        if let Err(e) = self.windows.close(window::SELECTOR).await {
            log::error!("[selector] closing selector failed: {}", e);
        }
        self.phase = SelectorPhase::Closed;
    }

    /// Close without capturing.
    pub async fn cancel(&mut self) {
        if let Err(e) = self.commands.clear_pending_mode().await {
            log::debug!("[selector] clear_pending_mode failed: {}", e);
        }
        self.resize = None;
        self.close_window().await;
    }
}

#[async_trait]
impl<C, W> WindowController for RegionSelector<C, W>
where
    C: SelectorCommands + 'static,
    W: WindowHost + 'static,
{
    async fn on_input(&mut self, input: WindowInput) -> Flow {
        match input {
            WindowInput::PointerDown(ev) => self.pointer_down(ev),
            WindowInput::PointerMove(ev) => self.pointer_move(ev).await,
            WindowInput::PointerUp(ev) => self.pointer_up(ev).await,
            WindowInput::Key(ev) => {
                self.key(&ev).await;
            }
            WindowInput::CloseRequested => self.cancel().await,
        }
        if self.phase == SelectorPhase::Closed {
            Flow::Closed
        } else {
            Flow::Continue
        }
    }

    async fn on_event(&mut self, _event: HostEvent) -> Flow {
        Flow::Continue
    }
}
