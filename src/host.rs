//! Tauri bindings for the window host, the save dialog and the event bus.

use async_trait::async_trait;
use tauri::{AppHandle, Listener, Manager, Runtime, WebviewUrl, WebviewWindow, WebviewWindowBuilder};
use tauri_plugin_dialog::DialogExt;
use tokio::sync::oneshot;

use crate::commands::{CommandError, CommandResult, SaveDialog};
use crate::events::{EventBus, HostEvent, ALL_EVENTS};
use crate::startup::StartupParams;
use crate::window::WindowHost;

fn host_err(command: &'static str, e: impl std::fmt::Display) -> CommandError {
    CommandError::failed(command, e.to_string())
}

pub struct TauriHost<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> TauriHost<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }

    fn window(&self, command: &'static str, label: &str) -> CommandResult<WebviewWindow<R>> {
        self.app
            .get_webview_window(label)
            .ok_or_else(|| CommandError::failed(command, format!("no window labelled {}", label)))
    }
}

#[async_trait]
impl<R: Runtime> WindowHost for TauriHost<R> {
    async fn show(&self, label: &str) -> CommandResult<()> {
        self.window("show", label)?
            .show()
            .map_err(|e| host_err("show", e))
    }

    async fn hide(&self, label: &str) -> CommandResult<()> {
        self.window("hide", label)?
            .hide()
            .map_err(|e| host_err("hide", e))
    }

    async fn close(&self, label: &str) -> CommandResult<()> {
        match self.app.get_webview_window(label) {
            Some(win) => win.close().map_err(|e| host_err("close", e)),
            // Already gone.
            None => Ok(()),
        }
    }

    async fn focus(&self, label: &str) -> CommandResult<()> {
        self.window("focus", label)?
            .set_focus()
            .map_err(|e| host_err("focus", e))
    }

    async fn set_click_through(&self, label: &str, enabled: bool) -> CommandResult<()> {
        self.window("set_click_through", label)?
            .set_ignore_cursor_events(enabled)
            .map_err(|e| host_err("set_click_through", e))
    }

    async fn open(&self, label: &str, page: &str, params: &StartupParams) -> CommandResult<()> {
        // Replace a stale window left over from an earlier session.
        if let Some(existing) = self.app.get_webview_window(label) {
            log::debug!("[host] closing stale {} window", label);
            let _ = existing.destroy();
        }

        let url = params.page_url(page);
        log::info!("[host] opening {} at {}", label, url);

        let mut builder = WebviewWindowBuilder::new(&self.app, label, WebviewUrl::App(url.into()))
            .title("")
            .decorations(false)
            .always_on_top(true)
            .skip_taskbar(true)
            .transparent(true)
            .shadow(false)
            .resizable(false);

        if let Some(region) = params.region {
            builder = builder
                .position(region.x as f64, region.y as f64)
                .inner_size(region.width as f64, region.height as f64);
        }

        builder.build().map(|_| ()).map_err(|e| host_err("open", e))
    }
}

#[async_trait]
impl<R: Runtime> SaveDialog for TauriHost<R> {
    async fn choose_save_path(&self, default_name: &str) -> CommandResult<Option<String>> {
        let (tx, rx) = oneshot::channel();
        self.app
            .dialog()
            .file()
            .set_file_name(default_name)
            .add_filter("GIF", &["gif"])
            .save_file(move |path| {
                let _ = tx.send(path);
            });

        let picked = rx
            .await
            .map_err(|e| host_err("choose_save_path", e))?;
        match picked {
            Some(path) => {
                let path = path
                    .into_path()
                    .map_err(|e| host_err("choose_save_path", e))?;
                Ok(Some(path.to_string_lossy().into_owned()))
            }
            None => Ok(None),
        }
    }
}

/// Forward every host event the controllers care about into `bus`.
pub fn bridge_events<R: Runtime>(app: &AppHandle<R>, bus: &EventBus) {
    for name in ALL_EVENTS {
        let bus = bus.clone();
        app.listen_any(name, move |event| {
            match HostEvent::from_wire(name, event.payload()) {
                Ok(Some(host_event)) => {
                    bus.publish(host_event);
                }
                Ok(None) => {}
                Err(e) => log::warn!("[events] bad {} payload: {}", name, e),
            }
        });
    }
    log::info!("[events] bridged {} host events", ALL_EVENTS.len());
}
