//! Integer geometry shared by the layout tree and the host boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::layout_engine::Orientation;

/// Axis-aligned rectangle in host cells (columns and lines).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A one-dimensional interval `[start, start + len)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: u32,
    pub len: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn max_x(&self) -> u32 { self.x + self.width }

    pub fn max_y(&self) -> u32 { self.y + self.height }

    pub fn area(&self) -> u64 { u64::from(self.width) * u64::from(self.height) }

    pub fn is_empty(&self) -> bool { self.width == 0 || self.height == 0 }

    /// The interval covered along the axis children of an `orientation`
    /// split are laid out on.
    pub fn span(&self, orientation: Orientation) -> Span {
        match orientation {
            Orientation::Horizontal => Span::new(self.x, self.width),
            Orientation::Vertical => Span::new(self.y, self.height),
        }
    }

    /// The interval covered along the other axis.
    pub fn cross_span(&self, orientation: Orientation) -> Span {
        self.span(orientation.perpendicular())
    }

    pub fn len(&self, orientation: Orientation) -> u32 { self.span(orientation).len }

    pub fn with_span(self, orientation: Orientation, span: Span) -> Rect {
        match orientation {
            Orientation::Horizontal => Rect {
                x: span.start,
                width: span.len,
                ..self
            },
            Orientation::Vertical => Rect {
                y: span.start,
                height: span.len,
                ..self
            },
        }
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let max_x = self.max_x().min(other.max_x());
        let max_y = self.max_y().min(other.max_y());
        (x < max_x && y < max_y).then(|| Rect::new(x, y, max_x - x, max_y - y))
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.max_x() >= other.max_x()
            && self.max_y() >= other.max_y()
    }

    pub fn contains_point(&self, x: u32, y: u32) -> bool {
        (self.x..self.max_x()).contains(&x) && (self.y..self.max_y()).contains(&y)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

impl Span {
    pub const fn new(start: u32, len: u32) -> Self { Span { start, len } }

    pub fn end(&self) -> u32 { self.start + self.len }

    pub fn overlap(&self, other: &Span) -> u32 {
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        end.saturating_sub(start)
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && self.end() >= other.end()
    }
}
