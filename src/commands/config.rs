use async_trait::async_trait;

use super::CommandResult;
use crate::config::AppConfig;

/// Round trips to the engine-side shortcut store, which owns `AppConfig`.
#[async_trait]
pub trait ShortcutCommands: Send + Sync {
    async fn get_shortcuts_config(&self) -> CommandResult<AppConfig>;

    /// `shortcut_str` is the canonical `Mod+Mod+KEY` form.
    async fn save_shortcut(&self, action: &str, shortcut_str: &str) -> CommandResult<AppConfig>;

    async fn reset_shortcuts_to_default(&self) -> CommandResult<AppConfig>;

    async fn set_developer_mode(&self, enabled: bool) -> CommandResult<AppConfig>;

    async fn pause_shortcuts(&self) -> CommandResult<()>;

    async fn resume_shortcuts(&self) -> CommandResult<()>;
}
