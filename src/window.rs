//! Window-manager primitives and the per-window event loop.
//!
//! Every window is an actor: one controller, one input queue fed by its
//! webview, one subscription to the shared event bus. Nothing else reaches
//! into a controller's state.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::commands::CommandResult;
use crate::events::{HostEvent, Subscription};
use crate::input::{KeyEvent, PointerEvent};
use crate::startup::StartupParams;

pub const SELECTOR: &str = "selector";
pub const SCROLL_OVERLAY: &str = "scroll-overlay";
pub const RECORDING_OVERLAY: &str = "recording-overlay";
pub const SCROLL_PREVIEW: &str = "scroll-preview";

pub const SCROLL_OVERLAY_PAGE: &str = "/scroll-overlay.html";
pub const RECORDING_OVERLAY_PAGE: &str = "/recording-overlay.html";

/// Show/hide/close and friends, performed by the host on a labelled window.
#[async_trait]
pub trait WindowHost: Send + Sync {
    async fn show(&self, label: &str) -> CommandResult<()>;

    async fn hide(&self, label: &str) -> CommandResult<()>;

    async fn close(&self, label: &str) -> CommandResult<()>;

    async fn focus(&self, label: &str) -> CommandResult<()>;

    /// Let pointer input fall through to whatever is underneath.
    async fn set_click_through(&self, label: &str, enabled: bool) -> CommandResult<()>;

    /// Create (or replace) a window showing `page` with startup parameters.
    async fn open(&self, label: &str, page: &str, params: &StartupParams) -> CommandResult<()>;
}

/// Raw input forwarded from a window's view.
#[derive(Clone, Debug, PartialEq)]
pub enum WindowInput {
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    Key(KeyEvent),
    /// The user or the OS asked the window to close.
    CloseRequested,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Closed,
}

#[async_trait]
pub trait WindowController: Send {
    async fn on_input(&mut self, input: WindowInput) -> Flow;

    async fn on_event(&mut self, event: HostEvent) -> Flow;
}

/// Drive one window until it closes or both of its sources dry up. Input
/// and events are handled one at a time, in arrival order.
pub async fn run_window<C: WindowController>(
    controller: &mut C,
    mut inputs: mpsc::UnboundedReceiver<WindowInput>,
    mut events: Subscription,
) {
    let mut inputs_open = true;
    let mut events_open = true;

    while inputs_open || events_open {
        let flow = tokio::select! {
            input = inputs.recv(), if inputs_open => match input {
                Some(input) => controller.on_input(input).await,
                None => {
                    inputs_open = false;
                    Flow::Continue
                }
            },
            event = events.recv(), if events_open => match event {
                Some(event) => controller.on_event(event).await,
                None => {
                    events_open = false;
                    Flow::Continue
                }
            },
        };

        if flow == Flow::Closed {
            return;
        }
    }
}
