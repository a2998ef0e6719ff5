//! Pointer and keyboard input as delivered by a window's webview.

use serde::{Deserialize, Serialize};

use crate::geometry::{CropEdge, Point, ResizeHandle};

/// What the pointer landed on, as hit-tested by the view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitTarget {
    /// Empty overlay area.
    Background,
    Toolbar,
    Resize(ResizeHandle),
    Crop(CropEdge),
    TrimStart,
    TrimEnd,
    Filmstrip,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub target: HitTarget,
}

impl PointerEvent {
    pub fn new(x: f64, y: f64, target: HitTarget) -> Self {
        Self { x, y, target }
    }

    pub fn at(x: f64, y: f64) -> Self {
        Self::new(x, y, HitTarget::Background)
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.shift || self.meta
    }
}

/// A keydown. `key` is the produced value ("a", "Enter", "Shift"), `code`
/// the physical key ("KeyA", "Digit1").
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Focus is inside a text field; window-level bindings must not fire.
    #[serde(default)]
    pub in_text_input: bool,
}

impl KeyEvent {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Default::default()
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = code.to_string();
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn is(&self, key: &str) -> bool {
        self.key.eq_ignore_ascii_case(key)
    }
}

/// Whether a controller consumed a key. The window shell prevents the
/// default action for handled keys in one place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
}

impl KeyOutcome {
    pub fn handled(&self) -> bool {
        matches!(self, KeyOutcome::Handled)
    }
}
