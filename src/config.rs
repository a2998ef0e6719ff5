use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::CaptureMode;

/// Shortcut configuration for a single action
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutConfig {
    pub modifiers: Vec<String>, // ["Alt"], ["Ctrl", "Shift"], etc.
    pub key: String,            // "A", "G", "V", etc.
    pub enabled: bool,
}

impl ShortcutConfig {
    fn alt(key: &str) -> Self {
        Self {
            modifiers: vec!["Alt".to_string()],
            key: key.to_string(),
            enabled: true,
        }
    }

    /// Convert to shortcut string format: "Alt+A", "Ctrl+Shift+K"
    pub fn to_shortcut_string(&self) -> String {
        if self.modifiers.is_empty() {
            self.key.clone()
        } else {
            format!("{}+{}", self.modifiers.join("+"), self.key)
        }
    }

    /// Parse from shortcut string format
    pub fn from_shortcut_string(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split('+').collect();
        let key = parts.last()?.trim();
        if key.is_empty() {
            return None;
        }
        let modifiers = parts[..parts.len() - 1]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Some(Self {
            modifiers,
            key: key.to_string(),
            enabled: true,
        })
    }
}

/// The closed set of rebindable actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortcutAction {
    Screenshot,
    Gif,
    Video,
    Scroll,
}

impl ShortcutAction {
    pub const ALL: [ShortcutAction; 4] = [
        ShortcutAction::Screenshot,
        ShortcutAction::Gif,
        ShortcutAction::Video,
        ShortcutAction::Scroll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShortcutAction::Screenshot => "screenshot",
            ShortcutAction::Gif => "gif",
            ShortcutAction::Video => "video",
            ShortcutAction::Scroll => "scroll",
        }
    }

    pub fn capture_mode(&self) -> CaptureMode {
        match self {
            ShortcutAction::Screenshot => CaptureMode::Image,
            ShortcutAction::Gif => CaptureMode::Gif,
            ShortcutAction::Video => CaptureMode::Video,
            ShortcutAction::Scroll => CaptureMode::Scroll,
        }
    }
}

/// Application configuration, as owned by the engine-side store. Windows
/// only ever hold a copy returned by the last command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub version: String,
    pub shortcuts: HashMap<String, ShortcutConfig>,
    #[serde(default)]
    pub developer_mode: bool,
}

impl AppConfig {
    pub fn shortcut(&self, action: ShortcutAction) -> Option<&ShortcutConfig> {
        self.shortcuts.get(action.as_str())
    }

    /// Actions shown in the settings list. Scroll capture is a developer
    /// feature and stays hidden until developer mode is on.
    pub fn editable_actions(&self) -> Vec<ShortcutAction> {
        ShortcutAction::ALL
            .into_iter()
            .filter(|a| *a != ShortcutAction::Scroll || self.developer_mode)
            .collect()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut shortcuts = HashMap::new();
        shortcuts.insert("screenshot".to_string(), ShortcutConfig::alt("A"));
        shortcuts.insert("gif".to_string(), ShortcutConfig::alt("G"));
        shortcuts.insert("video".to_string(), ShortcutConfig::alt("V"));
        shortcuts.insert("scroll".to_string(), ShortcutConfig::alt("S"));

        Self {
            version: "1.0.0".to_string(),
            shortcuts,
            developer_mode: false,
        }
    }
}

/// Feature switches that select between the selector/overlay/editor
/// variants. Overlay windows receive them as startup parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Resize handles on a confirmed selection.
    pub resizable: bool,
    /// Edge crop handles on a stopped scroll capture.
    pub crop_editing: bool,
    /// "Hide title bar" toggle when adopting a detected window.
    pub titlebar_exclusion: bool,
    /// Scroll capture mode in the selector toolbar.
    pub scroll_mode: bool,
    /// Playhead scrubbing on the editor filmstrip.
    pub live_scrub: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            resizable: true,
            crop_editing: true,
            titlebar_exclusion: true,
            scroll_mode: true,
            live_scrub: true,
        }
    }
}

impl Capabilities {
    /// The earliest selector: plain drag or click, no extras.
    pub fn minimal() -> Self {
        Self {
            resizable: false,
            crop_editing: false,
            titlebar_exclusion: false,
            scroll_mode: false,
            live_scrub: false,
        }
    }

    pub fn allows(&self, mode: CaptureMode) -> bool {
        match mode {
            CaptureMode::Image | CaptureMode::Gif => true,
            CaptureMode::Scroll => self.scroll_mode,
            CaptureMode::Video => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What the editor does with a freshly exported file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostExportAction {
    #[default]
    OpenFile,
    RevealInFolder,
}

/// Window-local preferences that survive restarts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub post_export_action: PostExportAction,
}

/// JSON file holding [`Preferences`].
#[derive(Clone, Debug)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/lovshot/preferences.json`
    pub fn default_location() -> Self {
        let config_dir = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        Self::new(config_dir.join("lovshot").join("preferences.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load preferences, or defaults if the file is missing or unreadable.
    pub fn load(&self) -> Preferences {
        if !self.path.exists() {
            return Preferences::default();
        }
        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(prefs) => prefs,
                Err(e) => {
                    log::warn!("[config] Failed to parse preferences: {}", e);
                    Preferences::default()
                }
            },
            Err(e) => {
                log::warn!("[config] Failed to read preferences file: {}", e);
                Preferences::default()
            }
        }
    }

    pub fn save(&self, prefs: &Preferences) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = serde_json::to_string_pretty(prefs)?;
        fs::write(&self.path, content).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;

        log::info!("[config] Saved preferences to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcut_string_round_trip() {
        let cfg = ShortcutConfig::from_shortcut_string("Ctrl+Shift+K").unwrap();
        assert_eq!(cfg.modifiers, vec!["Ctrl", "Shift"]);
        assert_eq!(cfg.key, "K");
        assert_eq!(cfg.to_shortcut_string(), "Ctrl+Shift+K");
        assert!(ShortcutConfig::from_shortcut_string("Alt+").is_none());
    }

    #[test]
    fn test_default_config_covers_every_action() {
        let cfg = AppConfig::default();
        for action in ShortcutAction::ALL {
            assert!(cfg.shortcut(action).is_some(), "{:?}", action);
        }
        assert_eq!(
            cfg.shortcut(ShortcutAction::Screenshot)
                .map(|s| s.to_shortcut_string()),
            Some("Alt+A".to_string())
        );
    }

    #[test]
    fn test_scroll_hidden_without_developer_mode() {
        let mut cfg = AppConfig::default();
        assert!(!cfg.editable_actions().contains(&ShortcutAction::Scroll));
        cfg.developer_mode = true;
        assert!(cfg.editable_actions().contains(&ShortcutAction::Scroll));
    }

    #[test]
    fn test_config_without_developer_flag_parses() {
        let json = r#"{"version":"1.0.0","shortcuts":{}}"#;
        let cfg: AppConfig = serde_json::from_str(json).unwrap();
        assert!(!cfg.developer_mode);
    }

    #[test]
    fn test_capabilities_gate_modes() {
        let caps = Capabilities::default();
        assert!(caps.allows(CaptureMode::Scroll));
        assert!(!caps.allows(CaptureMode::Video));
        assert!(!Capabilities::minimal().allows(CaptureMode::Scroll));
    }

    #[test]
    fn test_preferences_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("nested").join("preferences.json"));
        assert_eq!(store.load(), Preferences::default());

        let prefs = Preferences {
            post_export_action: PostExportAction::RevealInFolder,
        };
        store.save(&prefs).unwrap();
        assert_eq!(store.load(), prefs);
    }

    #[test]
    fn test_corrupt_preferences_fall_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(PreferenceStore::new(path).load(), Preferences::default());
    }
}
