//! Window coordination for Lovshot: the region selector, scroll capture
//! overlay, GIF editor, shortcut settings and the passive overlays, each
//! running as its own actor and talking to the capture engine only through
//! commands and events.

pub mod commands;
pub mod config;
pub mod events;
pub mod export;
pub mod geometry;
pub mod input;
pub mod overlay;
pub mod scroll;
pub mod selector;
pub mod shortcuts;
pub mod startup;
pub mod types;
pub mod window;

#[cfg(feature = "tauri-host")]
pub mod host;

#[cfg(test)]
mod testing;

pub use commands::{CommandError, CommandResult};
pub use config::{AppConfig, Capabilities, PreferenceStore};
pub use events::{EventBus, HostEvent, Subscription};
pub use export::GifExportController;
pub use overlay::{RecordingBorderOverlay, ScrollPreviewOverlay};
pub use scroll::{ScrollCaptureController, ScrollError};
pub use selector::RegionSelector;
pub use shortcuts::{PauseGate, ShortcutRebindController};
pub use startup::{StartupError, StartupParams};
pub use window::{run_window, Flow, WindowController, WindowHost, WindowInput};

/// Install the `env_logger` backend. Defaults to `info`, `RUST_LOG`
/// overrides. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
