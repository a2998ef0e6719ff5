//! Pointer math for selection, resize handles, crop edges and trim handles.
//!
//! Everything here is pure: pointer positions in, rectangles and
//! percentages out.

use serde::{Deserialize, Serialize};

use crate::types::Region;

/// Minimum edge length of a drawn or resized selection, in pixels.
pub const MIN_SELECTION_SIZE: f64 = 10.0;

/// Upper bound for each crop edge, in percent.
pub const MAX_CROP_PERCENT: f64 = 90.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Selection rectangle while it is being edited.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    /// Axis-aligned box spanned by two corners, in any order.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            w: (a.x - b.x).abs(),
            h: (a.y - b.y).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Large enough to count as a drag rather than a click. Inclusive.
    pub fn meets_min_size(&self) -> bool {
        self.w >= MIN_SELECTION_SIZE && self.h >= MIN_SELECTION_SIZE
    }

    pub fn size_label(&self) -> String {
        format!("{} × {}", self.w.round() as i64, self.h.round() as i64)
    }

    pub fn to_region(&self) -> Region {
        Region {
            x: self.x.round() as i32,
            y: self.y.round() as i32,
            width: self.w.round().max(0.0) as u32,
            height: self.h.round().max(0.0) as u32,
        }
    }
}

impl From<Region> for Rect {
    fn from(r: Region) -> Self {
        Self {
            x: r.x as f64,
            y: r.y as f64,
            w: r.width as f64,
            h: r.height as f64,
        }
    }
}

/// Compass position of a resize handle on a confirmed selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::N,
        ResizeHandle::S,
        ResizeHandle::E,
        ResizeHandle::W,
        ResizeHandle::NE,
        ResizeHandle::NW,
        ResizeHandle::SE,
        ResizeHandle::SW,
    ];

    fn moves_top(self) -> bool {
        matches!(self, ResizeHandle::N | ResizeHandle::NE | ResizeHandle::NW)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, ResizeHandle::S | ResizeHandle::SE | ResizeHandle::SW)
    }

    fn moves_left(self) -> bool {
        matches!(self, ResizeHandle::W | ResizeHandle::NW | ResizeHandle::SW)
    }

    fn moves_right(self) -> bool {
        matches!(self, ResizeHandle::E | ResizeHandle::NE | ResizeHandle::SE)
    }
}

/// Apply a pointer delta (measured from drag start) to the rectangle as it
/// was at drag start. A moving edge never comes closer than `min` to its
/// opposite edge; the opposite edge stays pinned.
pub fn resize_rect(start: Rect, handle: ResizeHandle, dx: f64, dy: f64, min: f64) -> Rect {
    let (mut left, mut top) = (start.x, start.y);
    let (mut right, mut bottom) = (start.right(), start.bottom());

    if handle.moves_left() {
        left = (start.x + dx).min(right - min);
    }
    if handle.moves_right() {
        right = (start.right() + dx).max(left + min);
    }
    if handle.moves_top() {
        top = (start.y + dy).min(bottom - min);
    }
    if handle.moves_bottom() {
        bottom = (start.bottom() + dy).max(top + min);
    }

    Rect {
        x: left,
        y: top,
        w: right - left,
        h: bottom - top,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CropEdge {
    Top,
    Bottom,
    Left,
    Right,
}

/// Per-edge crop of a captured strip, in percent of the strip size.
/// All-zero means "no crop".
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CropEdges {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

fn clamp_percent(v: f64) -> f64 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, MAX_CROP_PERCENT)
}

impl CropEdges {
    pub fn is_none(&self) -> bool {
        self.top == 0.0 && self.bottom == 0.0 && self.left == 0.0 && self.right == 0.0
    }

    pub fn clamped(self) -> Self {
        Self {
            top: clamp_percent(self.top),
            bottom: clamp_percent(self.bottom),
            left: clamp_percent(self.left),
            right: clamp_percent(self.right),
        }
    }

    /// The value handed to crop-accepting commands: `None` for "no crop".
    pub fn as_param(&self) -> Option<CropEdges> {
        let c = self.clamped();
        if c.is_none() {
            None
        } else {
            Some(c)
        }
    }

    pub fn get(&self, edge: CropEdge) -> f64 {
        match edge {
            CropEdge::Top => self.top,
            CropEdge::Bottom => self.bottom,
            CropEdge::Left => self.left,
            CropEdge::Right => self.right,
        }
    }

    pub fn with(mut self, edge: CropEdge, value: f64) -> Self {
        let value = clamp_percent(value);
        match edge {
            CropEdge::Top => self.top = value,
            CropEdge::Bottom => self.bottom = value,
            CropEdge::Left => self.left = value,
            CropEdge::Right => self.right = value,
        }
        self
    }

    /// Part of a `width × height` image left after cropping. Opposing edges
    /// that overlap collapse to zero size instead of going negative.
    pub fn visible_rect(&self, width: f64, height: f64) -> Rect {
        let c = self.clamped();
        let x = width * c.left / 100.0;
        let y = height * c.top / 100.0;
        let w = (width * (1.0 - (c.left + c.right) / 100.0)).max(0.0);
        let h = (height * (1.0 - (c.top + c.bottom) / 100.0)).max(0.0);
        Rect {
            x: x.min(width),
            y: y.min(height),
            w,
            h,
        }
    }
}

/// New crop after dragging `edge` by `delta_px` (x delta for left/right, y
/// delta for top/bottom) over a preview `extent_px` long on that axis.
pub fn drag_crop(start: CropEdges, edge: CropEdge, delta_px: f64, extent_px: f64) -> CropEdges {
    if extent_px <= 0.0 {
        return start;
    }
    let pct = delta_px / extent_px * 100.0;
    let value = match edge {
        CropEdge::Top | CropEdge::Left => start.get(edge) + pct,
        CropEdge::Bottom | CropEdge::Right => start.get(edge) - pct,
    };
    start.with(edge, value)
}

/// Horizontal extent of the filmstrip track on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Track {
    pub left: f64,
    pub width: f64,
}

impl Track {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    /// Frame under pointer X, for a track representing `total` frames.
    pub fn frame_at(&self, pointer_x: f64, total: usize) -> usize {
        if self.width <= 0.0 || total == 0 {
            return 0;
        }
        let ratio = ((pointer_x - self.left) / self.width).clamp(0.0, 1.0);
        ((ratio * total as f64).round() as usize).min(total)
    }
}

/// Position of `frame` along the track, in percent.
pub fn frame_percent(frame: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (frame.min(total) as f64 / total as f64) * 100.0
}
