//! Passive overlays: the border around an active GIF recording and the
//! floating scroll-capture preview.

use std::sync::Arc;

use async_trait::async_trait;

use crate::commands::RecordingControl;
use crate::events::HostEvent;
use crate::input::HitTarget;
use crate::startup::StartupParams;
use crate::types::{Region, ScrollCaptureProgress};
use crate::window::{self, Flow, WindowController, WindowHost, WindowInput};

async fn close(windows: &dyn WindowHost, label: &str) {
    if let Err(e) = windows.close(label).await {
        log::error!("[overlay] closing {} failed: {}", label, e);
    }
}

/// Border drawn around the recorded region, with a stop button.
pub struct RecordingBorderOverlay<C, W> {
    commands: Arc<C>,
    windows: Arc<W>,
    region: Option<Region>,
    frame_count: u32,
    stopping: bool,
}

impl<C, W> RecordingBorderOverlay<C, W>
where
    C: RecordingControl,
    W: WindowHost,
{
    pub fn new(commands: Arc<C>, windows: Arc<W>, params: &StartupParams) -> Self {
        Self {
            commands,
            windows,
            region: params.region,
            frame_count: 0,
            stopping: false,
        }
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    /// Ask the engine to stop. The overlay closes when `recording-stopped`
    /// arrives, not here.
    pub async fn stop(&mut self) {
        if self.stopping {
            return;
        }
        self.stopping = true;
        if let Err(e) = self.commands.stop_recording().await {
            log::error!("[overlay] stop_recording failed: {}", e);
            self.stopping = false;
        }
    }
}

#[async_trait]
impl<C, W> WindowController for RecordingBorderOverlay<C, W>
where
    C: RecordingControl + 'static,
    W: WindowHost + 'static,
{
    async fn on_input(&mut self, input: WindowInput) -> Flow {
        match input {
            WindowInput::PointerDown(ev) if ev.target == HitTarget::Toolbar => self.stop().await,
            WindowInput::Key(ev) if ev.is("Escape") && !ev.in_text_input => self.stop().await,
            _ => {}
        }
        Flow::Continue
    }

    async fn on_event(&mut self, event: HostEvent) -> Flow {
        match event {
            HostEvent::RecordingState(state) => {
                self.frame_count = state.frame_count;
                Flow::Continue
            }
            HostEvent::RecordingStopped(stopped) => {
                log::info!("[overlay] recording stopped at {} frames", stopped.frame_count);
                close(self.windows.as_ref(), window::RECORDING_OVERLAY).await;
                Flow::Closed
            }
            _ => Flow::Continue,
        }
    }
}

/// Floating preview fed by `scroll-preview-update` pushes.
pub struct ScrollPreviewOverlay<W> {
    windows: Arc<W>,
    progress: Option<ScrollCaptureProgress>,
}

impl<W: WindowHost> ScrollPreviewOverlay<W> {
    pub fn new(windows: Arc<W>) -> Self {
        Self {
            windows,
            progress: None,
        }
    }

    pub fn progress(&self) -> Option<&ScrollCaptureProgress> {
        self.progress.as_ref()
    }
}

#[async_trait]
impl<W: WindowHost + 'static> WindowController for ScrollPreviewOverlay<W> {
    async fn on_input(&mut self, input: WindowInput) -> Flow {
        if input == WindowInput::CloseRequested {
            close(self.windows.as_ref(), window::SCROLL_PREVIEW).await;
            return Flow::Closed;
        }
        Flow::Continue
    }

    async fn on_event(&mut self, event: HostEvent) -> Flow {
        match event {
            HostEvent::ScrollPreviewUpdate(progress) => {
                self.progress = Some(progress);
                Flow::Continue
            }
            HostEvent::ScrollCaptureStop | HostEvent::ScrollCaptureFinish => {
                close(self.windows.as_ref(), window::SCROLL_PREVIEW).await;
                Flow::Closed
            }
            _ => Flow::Continue,
        }
    }
}
