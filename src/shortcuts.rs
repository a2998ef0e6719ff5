//! Settings-page shortcut rebinding.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::commands::ShortcutCommands;
use crate::config::{AppConfig, ShortcutAction, ShortcutConfig};
use crate::events::HostEvent;
use crate::input::{KeyEvent, KeyOutcome};
use crate::window::{Flow, WindowController, WindowInput};

/// Keys that never become the bound key on their own.
pub const IGNORED_KEYS: [&str; 7] = [
    "Control", "Alt", "Shift", "Meta", "CapsLock", "Tab", "Escape",
];

/// Format shortcut for display (e.g., "Alt+A" -> "⌥A")
pub fn format_shortcut_display(s: &str) -> String {
    s.replace("Ctrl+", "⌃")
        .replace("Alt+", "⌥")
        .replace("Shift+", "⇧")
        .replace("Cmd+", "⌘")
        .replace("Command+", "⌘")
        .replace("Super+", "⌘")
        .replace("Meta+", "⌘")
}

/// Physical key code to the bound key name: `KeyA` → `A`, `Digit7` → `7`.
fn key_from_code(code: &str) -> Option<String> {
    let rest = code
        .strip_prefix("Key")
        .or_else(|| code.strip_prefix("Digit"))?;
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() => Some(c.to_ascii_uppercase().to_string()),
        _ => None,
    }
}

/// Turn a keydown into a binding, or `None` if it cannot be one.
pub fn capture_key(ev: &KeyEvent) -> Option<ShortcutConfig> {
    if IGNORED_KEYS.contains(&ev.key.as_str()) || !ev.modifiers.any() {
        return None;
    }

    // Prefer the physical key so Alt+A on macOS is not read as "å".
    let key = key_from_code(&ev.code).or_else(|| {
        let mut chars = ev.key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => Some(c.to_ascii_uppercase().to_string()),
            _ => None,
        }
    })?;

    let m = ev.modifiers;
    let modifiers = [
        (m.ctrl, "Ctrl"),
        (m.alt, "Alt"),
        (m.shift, "Shift"),
        (m.meta, "Cmd"),
    ]
    .into_iter()
    .filter(|(on, _)| *on)
    .map(|(_, name)| name.to_string())
    .collect();

    Some(ShortcutConfig {
        modifiers,
        key,
        enabled: true,
    })
}

/// Reference-counted pause of the global shortcuts. Only the first pause and
/// the last resume reach the engine.
#[derive(Debug, Default)]
pub struct PauseGate {
    holders: Mutex<usize>,
}

impl PauseGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when this call should pause the shortcuts.
    pub fn acquire(&self) -> bool {
        let mut n = self.holders.lock().unwrap_or_else(PoisonError::into_inner);
        *n += 1;
        *n == 1
    }

    /// Returns true when this call should resume the shortcuts.
    pub fn release(&self) -> bool {
        let mut n = self.holders.lock().unwrap_or_else(PoisonError::into_inner);
        if *n == 0 {
            return false;
        }
        *n -= 1;
        *n == 0
    }

    pub fn holders(&self) -> usize {
        *self.holders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct ShortcutRebindController<C> {
    commands: Arc<C>,
    gate: Arc<PauseGate>,
    config: AppConfig,
    editing: Option<ShortcutAction>,
    pending: Option<ShortcutConfig>,
    error: Option<String>,
    holds_pause: bool,
}

impl<C: ShortcutCommands> ShortcutRebindController<C> {
    pub fn new(commands: Arc<C>, gate: Arc<PauseGate>) -> Self {
        Self {
            commands,
            gate,
            config: AppConfig::default(),
            editing: None,
            pending: None,
            error: None,
            holds_pause: false,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn editing(&self) -> Option<ShortcutAction> {
        self.editing
    }

    pub fn pending(&self) -> Option<&ShortcutConfig> {
        self.pending.as_ref()
    }

    /// Inline error from the last failed command.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn editable_actions(&self) -> Vec<ShortcutAction> {
        self.config.editable_actions()
    }

    /// Symbol form of the current binding, e.g. `⌥A`.
    pub fn display(&self, action: ShortcutAction) -> Option<String> {
        self.config
            .shortcut(action)
            .map(|s| format_shortcut_display(&s.to_shortcut_string()))
    }

    pub async fn load(&mut self) {
        match self.commands.get_shortcuts_config().await {
            Ok(config) => self.config = config,
            Err(e) => {
                log::error!("[shortcuts] loading config failed: {}", e);
                self.error = Some(e.message());
            }
        }
    }

    /// Start listening for a new binding for `action`. Returns false for an
    /// action the current config does not expose.
    pub async fn begin_edit(&mut self, action: ShortcutAction) -> bool {
        if !self.config.editable_actions().contains(&action) {
            log::warn!("[shortcuts] {} is not editable", action.as_str());
            return false;
        }
        self.editing = Some(action);
        self.pending = None;
        self.error = None;

        if self.holds_pause {
            return true;
        }
        self.holds_pause = true;
        if self.gate.acquire() {
            if let Err(e) = self.commands.pause_shortcuts().await {
                log::warn!("[shortcuts] pause_shortcuts failed: {}", e);
            }
        }
        log::info!("[shortcuts] editing {}", action.as_str());
        true
    }

    async fn end_edit(&mut self) {
        self.editing = None;
        self.pending = None;
        if !self.holds_pause {
            return;
        }
        self.holds_pause = false;
        if self.gate.release() {
            if let Err(e) = self.commands.resume_shortcuts().await {
                log::warn!("[shortcuts] resume_shortcuts failed: {}", e);
            }
        }
    }

    pub async fn key(&mut self, ev: &KeyEvent) -> KeyOutcome {
        if self.editing.is_none() {
            return KeyOutcome::Ignored;
        }
        if ev.is("Escape") && !ev.modifiers.any() {
            self.cancel().await;
            return KeyOutcome::Handled;
        }
        if let Some(captured) = capture_key(ev) {
            log::debug!("[shortcuts] captured {}", captured.to_shortcut_string());
            self.pending = Some(captured);
        }
        KeyOutcome::Handled
    }

    /// Send the pending binding. On failure the old binding stays and the
    /// error is shown inline.
    pub async fn save(&mut self) -> bool {
        let (Some(action), Some(pending)) = (self.editing, self.pending.clone()) else {
            return false;
        };
        let shortcut = pending.to_shortcut_string();
        match self.commands.save_shortcut(action.as_str(), &shortcut).await {
            Ok(config) => {
                log::info!("[shortcuts] {} -> {}", action.as_str(), shortcut);
                self.config = config;
                self.error = None;
                self.end_edit().await;
                true
            }
            Err(e) => {
                log::error!("[shortcuts] save_shortcut failed: {}", e);
                self.error = Some(e.message());
                false
            }
        }
    }

    pub async fn cancel(&mut self) {
        self.error = None;
        self.end_edit().await;
    }

    pub async fn reset_to_defaults(&mut self) -> bool {
        let result = self.commands.reset_shortcuts_to_default().await;
        self.apply(result, "reset_shortcuts_to_default")
    }

    pub async fn set_developer_mode(&mut self, enabled: bool) -> bool {
        let result = self.commands.set_developer_mode(enabled).await;
        self.apply(result, "set_developer_mode")
    }

    fn apply(&mut self, result: crate::commands::CommandResult<AppConfig>, what: &str) -> bool {
        match result {
            Ok(config) => {
                self.config = config;
                self.error = None;
                true
            }
            Err(e) => {
                log::error!("[shortcuts] {} failed: {}", what, e);
                self.error = Some(e.message());
                false
            }
        }
    }
}

#[async_trait]
impl<C: ShortcutCommands + 'static> WindowController for ShortcutRebindController<C> {
    async fn on_input(&mut self, input: WindowInput) -> Flow {
        match input {
            WindowInput::Key(ev) => {
                self.key(&ev).await;
                Flow::Continue
            }
            WindowInput::CloseRequested => {
                self.cancel().await;
                Flow::Closed
            }
            _ => Flow::Continue,
        }
    }

    async fn on_event(&mut self, _event: HostEvent) -> Flow {
        Flow::Continue
    }
}
