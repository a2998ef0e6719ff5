//! Scroll capture overlay: live preview while the user scrolls, then a
//! stopped state with crop handles and save/copy/discard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::commands::{CommandError, ScrollCommands, SelectorCommands};
use crate::config::Capabilities;
use crate::events::HostEvent;
use crate::geometry::{drag_crop, CropEdge, CropEdges, Point, Rect};
use crate::input::{HitTarget, KeyEvent, KeyOutcome, PointerEvent};
use crate::startup::StartupParams;
use crate::types::{Region, ScrollCaptureProgress};
use crate::window::{self, Flow, WindowController, WindowHost, WindowInput};

pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollPhase {
    Idle,
    Capturing,
    /// Stopped with the last snapshot kept; save/copy/discard toolbar.
    Paused,
    Finished,
    Discarded,
}

#[derive(Debug, thiserror::Error)]
pub enum ScrollError {
    #[error("cannot {action} while {phase:?}")]
    InvalidPhase {
        phase: ScrollPhase,
        action: &'static str,
    },
    #[error(transparent)]
    Command(#[from] CommandError),
}

#[derive(Default)]
struct PollShared {
    progress: Option<ScrollCaptureProgress>,
    /// Cleared on stop so a poll that lands afterwards is dropped.
    accepting: bool,
}

fn lock(shared: &Mutex<PollShared>) -> MutexGuard<'_, PollShared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ticks every `period` and issues `poll_scroll_frame`, skipping any tick
/// that lands while the previous poll is still out.
fn spawn_poller<C>(commands: Arc<C>, shared: Arc<Mutex<PollShared>>, period: Duration) -> JoinHandle<()>
where
    C: ScrollCommands + 'static,
{
    let in_flight = Arc::new(AtomicBool::new(false));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick fires immediately; the start command already gave us a frame.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if in_flight.swap(true, Ordering::SeqCst) {
                log::trace!("[scroll] poll still in flight, skipping tick");
                continue;
            }

            let commands = commands.clone();
            let shared = shared.clone();
            let in_flight = in_flight.clone();
            tokio::spawn(async move {
                match commands.poll_scroll_frame().await {
                    Ok(Some(progress)) => {
                        let mut s = lock(&shared);
                        if s.accepting {
                            s.progress = Some(progress);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => log::debug!("[scroll] poll failed: {}", e),
                }
                in_flight.store(false, Ordering::SeqCst);
            });
        }
    })
}

#[derive(Clone, Copy, Debug)]
struct CropDrag {
    edge: CropEdge,
    origin: Point,
    start: CropEdges,
}

pub struct ScrollCaptureController<C, W> {
    commands: Arc<C>,
    windows: Arc<W>,
    capabilities: Capabilities,
    phase: ScrollPhase,
    region: Option<Region>,
    shared: Arc<Mutex<PollShared>>,
    poller: Option<JoinHandle<()>>,
    poll_interval: Duration,
    crop: CropEdges,
    crop_drag: Option<CropDrag>,
    /// Anchor of a rectangle being drawn after a discard.
    reselect_anchor: Option<Point>,
    reselect_rect: Option<Rect>,
    preview_size: (f64, f64),
    saved_path: Option<String>,
    closed: bool,
}

impl<C, W> ScrollCaptureController<C, W>
where
    C: ScrollCommands + SelectorCommands + 'static,
    W: WindowHost,
{
    pub fn new(commands: Arc<C>, windows: Arc<W>, params: &StartupParams) -> Self {
        Self {
            commands,
            windows,
            capabilities: params.capabilities,
            phase: ScrollPhase::Idle,
            region: params.region,
            shared: Arc::new(Mutex::new(PollShared::default())),
            poller: None,
            poll_interval: POLL_INTERVAL,
            crop: CropEdges::default(),
            crop_drag: None,
            reselect_anchor: None,
            reselect_rect: None,
            preview_size: (0.0, 0.0),
            saved_path: None,
            closed: false,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn phase(&self) -> ScrollPhase {
        self.phase
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn progress(&self) -> Option<ScrollCaptureProgress> {
        lock(&self.shared).progress.clone()
    }

    pub fn crop(&self) -> CropEdges {
        self.crop
    }

    pub fn saved_path(&self) -> Option<&str> {
        self.saved_path.as_deref()
    }

    pub fn toolbar_visible(&self) -> bool {
        self.phase == ScrollPhase::Paused
    }

    pub fn hint_visible(&self) -> bool {
        self.region.is_none()
            && self.reselect_rect.is_none()
            && matches!(self.phase, ScrollPhase::Idle | ScrollPhase::Discarded)
    }

    /// Rectangle being drawn to pick a new region.
    pub fn reselect_rect(&self) -> Option<Rect> {
        self.reselect_rect
    }

    fn can_start(&self) -> bool {
        self.region.is_some() && matches!(self.phase, ScrollPhase::Idle | ScrollPhase::Discarded)
    }

    fn selecting_region(&self) -> bool {
        self.region.is_none() && matches!(self.phase, ScrollPhase::Idle | ScrollPhase::Discarded)
    }

    pub fn crop_editable(&self) -> bool {
        self.capabilities.crop_editing && self.phase == ScrollPhase::Paused
    }

    /// Rendered size of the stopped preview, used to turn pointer deltas
    /// into crop percentages.
    pub fn set_preview_size(&mut self, width: f64, height: f64) {
        self.preview_size = (width, height);
    }

    /// Visible part of the preview after cropping.
    pub fn visible_preview(&self) -> Rect {
        self.crop.visible_rect(self.preview_size.0, self.preview_size.1)
    }

    /// Begin capturing the current region. Allowed before the first
    /// capture and again once a discarded capture has a new region.
    pub async fn start(&mut self) -> Result<(), ScrollError> {
        if !self.can_start() {
            return Err(ScrollError::InvalidPhase {
                phase: self.phase,
                action: "start",
            });
        }

        self.windows.set_click_through(window::SCROLL_OVERLAY, true).await?;

        let first = match self.commands.start_scroll_capture().await {
            Ok(progress) => progress,
            Err(e) => {
                log::error!("[scroll] start_scroll_capture failed: {}", e);
                self.set_click_through(false).await;
                return Err(e.into());
            }
        };

        {
            let mut s = lock(&self.shared);
            s.progress = Some(first);
            s.accepting = true;
        }
        self.poller = Some(spawn_poller(
            self.commands.clone(),
            self.shared.clone(),
            self.poll_interval,
        ));
        self.phase = ScrollPhase::Capturing;
        log::info!("[scroll] capture started");
        Ok(())
    }

    fn stop_polling(&mut self) {
        lock(&self.shared).accepting = false;
        if let Some(task) = self.poller.take() {
            task.abort();
        }
    }

    async fn set_click_through(&self, enabled: bool) {
        if let Err(e) = self
            .windows
            .set_click_through(window::SCROLL_OVERLAY, enabled)
            .await
        {
            log::error!("[scroll] set_click_through({}) failed: {}", enabled, e);
        }
    }

    /// Stop capturing and keep the last snapshot. Returns false if nothing
    /// was being captured.
    pub async fn stop(&mut self) -> bool {
        if self.phase != ScrollPhase::Capturing {
            return false;
        }
        self.stop_polling();
        self.set_click_through(false).await;
        self.phase = ScrollPhase::Paused;
        log::info!(
            "[scroll] capture paused at {} frames",
            self.progress().map(|p| p.frame_count).unwrap_or(0)
        );
        true
    }

    /// Escape steps back one level: capturing stops, a stopped capture is
    /// thrown away.
    pub async fn escape(&mut self) -> Flow {
        match self.phase {
            ScrollPhase::Capturing => {
                self.stop().await;
                Flow::Continue
            }
            ScrollPhase::Paused => {
                self.discard().await;
                Flow::Continue
            }
            _ if self.reselect_anchor.is_some() => {
                self.reselect_anchor = None;
                self.reselect_rect = None;
                Flow::Continue
            }
            _ => {
                self.close_window().await;
                Flow::Closed
            }
        }
    }

    pub async fn discard(&mut self) {
        self.stop_polling();
        if let Err(e) = self.commands.cancel_scroll_capture().await {
            log::debug!("[scroll] cancel_scroll_capture failed: {}", e);
        }
        lock(&self.shared).progress = None;
        self.crop = CropEdges::default();
        self.crop_drag = None;
        self.region = None;
        self.reselect_anchor = None;
        self.reselect_rect = None;
        self.phase = ScrollPhase::Discarded;
        log::info!("[scroll] capture discarded");
    }

    /// Save the stitched image. Failure leaves the capture stopped so the
    /// user can retry or discard.
    pub async fn finish(&mut self) -> Result<Option<String>, ScrollError> {
        match self.phase {
            ScrollPhase::Capturing => {
                self.stop_polling();
                self.set_click_through(false).await;
                self.phase = ScrollPhase::Paused;
            }
            ScrollPhase::Paused => {}
            phase => {
                return Err(ScrollError::InvalidPhase {
                    phase,
                    action: "finish",
                })
            }
        }

        let crop = self.crop.as_param();
        match self.commands.finish_scroll_capture(None, crop).await {
            Ok(path) => {
                log::info!("[scroll] saved to {:?}", path);
                self.saved_path = path.clone();
                self.phase = ScrollPhase::Finished;
                self.close_window().await;
                Ok(path)
            }
            Err(e) => {
                log::error!("[scroll] finish_scroll_capture failed: {}", e);
                Err(e.into())
            }
        }
    }

    pub async fn copy_to_clipboard(&mut self) -> Result<(), ScrollError> {
        if self.phase != ScrollPhase::Paused {
            return Err(ScrollError::InvalidPhase {
                phase: self.phase,
                action: "copy",
            });
        }
        self.commands
            .copy_scroll_to_clipboard(self.crop.as_param())
            .await
            .map_err(|e| {
                log::error!("[scroll] copy_scroll_to_clipboard failed: {}", e);
                e
            })?;
        self.phase = ScrollPhase::Finished;
        self.close_window().await;
        Ok(())
    }

    async fn close_window(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.windows.close(window::SCROLL_OVERLAY).await {
            log::error!("[scroll] closing overlay failed: {}", e);
        }
        self.closed = true;
    }

    pub async fn pointer_down(&mut self, ev: PointerEvent) {
        match ev.target {
            HitTarget::Crop(edge) if self.crop_editable() => {
                self.crop_drag = Some(CropDrag {
                    edge,
                    origin: ev.point(),
                    start: self.crop,
                });
            }
            // Start button on the pre-capture toolbar.
            HitTarget::Toolbar if self.can_start() => {
                if let Err(e) = self.start().await {
                    log::warn!("[scroll] start from toolbar failed: {}", e);
                }
            }
            HitTarget::Background if self.selecting_region() => {
                self.reselect_anchor = Some(ev.point());
                self.reselect_rect = None;
            }
            _ => {}
        }
    }

    pub fn pointer_move(&mut self, ev: PointerEvent) {
        if let Some(anchor) = self.reselect_anchor {
            self.reselect_rect = Some(Rect::from_points(anchor, ev.point()));
            return;
        }
        let Some(drag) = self.crop_drag else {
            return;
        };
        let (delta, extent) = match drag.edge {
            CropEdge::Top | CropEdge::Bottom => (ev.y - drag.origin.y, self.preview_size.1),
            CropEdge::Left | CropEdge::Right => (ev.x - drag.origin.x, self.preview_size.0),
        };
        self.crop = drag_crop(drag.start, drag.edge, delta, extent);
    }

    pub async fn pointer_up(&mut self, ev: PointerEvent) {
        self.crop_drag = None;
        let Some(anchor) = self.reselect_anchor.take() else {
            return;
        };
        let rect = Rect::from_points(anchor, ev.point());
        self.reselect_rect = None;
        if !rect.meets_min_size() {
            return;
        }

        let region = rect.to_region();
        match self.commands.set_capture_region(region).await {
            Ok(()) => {
                log::info!(
                    "[scroll] new region x={}, y={}, w={}, h={}",
                    region.x,
                    region.y,
                    region.width,
                    region.height
                );
                self.region = Some(region);
            }
            Err(e) => log::error!("[scroll] set_capture_region failed: {}", e),
        }
    }

    pub async fn key(&mut self, ev: &KeyEvent) -> (KeyOutcome, Flow) {
        if ev.in_text_input {
            return (KeyOutcome::Ignored, Flow::Continue);
        }
        if ev.is("Escape") {
            let flow = self.escape().await;
            return (KeyOutcome::Handled, flow);
        }
        if ev.is("Enter") && self.can_start() {
            if let Err(e) = self.start().await {
                log::warn!("[scroll] start failed: {}", e);
            }
            return (KeyOutcome::Handled, self.flow());
        }
        if ev.is("Enter") && matches!(self.phase, ScrollPhase::Capturing | ScrollPhase::Paused) {
            match self.finish().await {
                Ok(_) => {}
                Err(e) => log::warn!("[scroll] finish from Enter failed: {}", e),
            }
            return (KeyOutcome::Handled, self.flow());
        }
        (KeyOutcome::Ignored, Flow::Continue)
    }

    fn flow(&self) -> Flow {
        if self.closed {
            Flow::Closed
        } else {
            Flow::Continue
        }
    }
}

impl<C, W> Drop for ScrollCaptureController<C, W> {
    fn drop(&mut self) {
        if let Some(task) = self.poller.take() {
            task.abort();
        }
    }
}

#[async_trait]
impl<C, W> WindowController for ScrollCaptureController<C, W>
where
    C: ScrollCommands + SelectorCommands + 'static,
    W: WindowHost + 'static,
{
    async fn on_input(&mut self, input: WindowInput) -> Flow {
        match input {
            WindowInput::PointerDown(ev) => self.pointer_down(ev).await,
            WindowInput::PointerMove(ev) => self.pointer_move(ev),
            WindowInput::PointerUp(ev) => self.pointer_up(ev).await,
            WindowInput::Key(ev) => return self.key(&ev).await.1,
            WindowInput::CloseRequested => {
                if matches!(self.phase, ScrollPhase::Capturing | ScrollPhase::Paused) {
                    self.discard().await;
                }
                self.close_window().await;
            }
        }
        self.flow()
    }

    async fn on_event(&mut self, event: HostEvent) -> Flow {
        match event {
            // Same path as a local Escape during capture.
            HostEvent::ScrollCaptureStop if self.phase == ScrollPhase::Capturing => {
                self.escape().await
            }
            HostEvent::ScrollCaptureFinish => {
                if let Err(e) = self.finish().await {
                    log::warn!("[scroll] finish request ignored: {}", e);
                }
                self.flow()
            }
            _ => Flow::Continue,
        }
    }
}
