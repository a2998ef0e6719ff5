//! Fire-and-forget events shared by every window.
//!
//! Delivery follows the host's broadcast semantics: every subscriber that
//! exists at publish time sees the event, in publish order. A subscriber
//! created later never sees it.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{ExportProgress, RecordingState, SaveResult, ScrollCaptureProgress};

pub const RECORDING_STATE: &str = "recording-state";
pub const RECORDING_STOPPED: &str = "recording-stopped";
pub const EXPORT_PROGRESS: &str = "export-progress";
pub const EXPORT_COMPLETE: &str = "export-complete";
pub const SCROLL_CAPTURE_STOP: &str = "scroll-capture-stop";
pub const SCROLL_CAPTURE_FINISH: &str = "scroll-capture-finish";
pub const SCROLL_PREVIEW_UPDATE: &str = "scroll-preview-update";

/// Every event name the host bridge forwards.
pub const ALL_EVENTS: [&str; 7] = [
    RECORDING_STATE,
    RECORDING_STOPPED,
    EXPORT_PROGRESS,
    EXPORT_COMPLETE,
    SCROLL_CAPTURE_STOP,
    SCROLL_CAPTURE_FINISH,
    SCROLL_PREVIEW_UPDATE,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingStopped {
    pub frame_count: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent {
    RecordingState(RecordingState),
    RecordingStopped(RecordingStopped),
    ExportProgress(ExportProgress),
    ExportComplete(SaveResult),
    ScrollCaptureStop,
    ScrollCaptureFinish,
    ScrollPreviewUpdate(ScrollCaptureProgress),
}

impl HostEvent {
    pub fn name(&self) -> &'static str {
        match self {
            HostEvent::RecordingState(_) => RECORDING_STATE,
            HostEvent::RecordingStopped(_) => RECORDING_STOPPED,
            HostEvent::ExportProgress(_) => EXPORT_PROGRESS,
            HostEvent::ExportComplete(_) => EXPORT_COMPLETE,
            HostEvent::ScrollCaptureStop => SCROLL_CAPTURE_STOP,
            HostEvent::ScrollCaptureFinish => SCROLL_CAPTURE_FINISH,
            HostEvent::ScrollPreviewUpdate(_) => SCROLL_PREVIEW_UPDATE,
        }
    }

    /// Payload as JSON, the shape the host emits for this event name.
    pub fn payload_json(&self) -> serde_json::Result<String> {
        match self {
            HostEvent::RecordingState(p) => serde_json::to_string(p),
            HostEvent::RecordingStopped(p) => serde_json::to_string(p),
            HostEvent::ExportProgress(p) => serde_json::to_string(p),
            HostEvent::ExportComplete(p) => serde_json::to_string(p),
            HostEvent::ScrollCaptureStop | HostEvent::ScrollCaptureFinish => Ok("null".to_string()),
            HostEvent::ScrollPreviewUpdate(p) => serde_json::to_string(p),
        }
    }

    /// Decode an event received from the host by name and JSON payload.
    /// Returns `Ok(None)` for names this layer does not listen to.
    pub fn from_wire(name: &str, payload: &str) -> serde_json::Result<Option<Self>> {
        let event = match name {
            RECORDING_STATE => HostEvent::RecordingState(serde_json::from_str(payload)?),
            RECORDING_STOPPED => HostEvent::RecordingStopped(serde_json::from_str(payload)?),
            EXPORT_PROGRESS => HostEvent::ExportProgress(serde_json::from_str(payload)?),
            EXPORT_COMPLETE => HostEvent::ExportComplete(serde_json::from_str(payload)?),
            SCROLL_CAPTURE_STOP => HostEvent::ScrollCaptureStop,
            SCROLL_CAPTURE_FINISH => HostEvent::ScrollCaptureFinish,
            SCROLL_PREVIEW_UPDATE => HostEvent::ScrollPreviewUpdate(serde_json::from_str(payload)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

/// Process-wide publish/subscribe channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<HostEvent>,
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish to current subscribers. Publishing with nobody listening is
    /// not an error; returns how many subscribers received it.
    pub fn publish(&self, event: HostEvent) -> usize {
        let name = event.name();
        match self.tx.send(event) {
            Ok(n) => {
                log::debug!("[events] {} -> {} listener(s)", name, n);
                n
            }
            Err(_) => {
                log::debug!("[events] {} dropped, no listeners", name);
                0
            }
        }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

pub struct Subscription {
    rx: broadcast::Receiver<HostEvent>,
}

impl Subscription {
    /// Next event, or `None` once the bus is gone. A slow listener that
    /// fell behind skips the overwritten events and keeps going.
    pub async fn recv(&mut self) -> Option<HostEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("[events] listener lagged, skipped {} event(s)", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`Subscription::recv`].
    pub fn try_recv(&mut self) -> Option<HostEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    log::warn!("[events] listener lagged, skipped {} event(s)", skipped);
                }
                Err(_) => return None,
            }
        }
    }
}
