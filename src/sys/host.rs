//! The boundary between the layout engine and whatever draws the windows.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout_engine::LayoutTree;
use crate::sys::geometry::Rect;

/// An identifier representing a window.
///
/// Identifiers are assigned by the host and are only meaningful to it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "w{}", self.0) }
}

/// The outcome of a layout change, handed to the host in one piece.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutUpdate {
    /// Every window that remains, with its new rectangle.
    pub frames: Vec<(WindowId, Rect)>,
    /// Windows that should be closed.
    pub removed: Vec<WindowId>,
    pub focus: WindowId,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("Host has no window {0}")]
    UnknownWindow(WindowId),
}

/// Something that owns real windows.
///
/// The engine reads the current arrangement before acting so it can refuse to
/// work from a stale picture, and writes the result back through `commit`.
pub trait Host {
    fn frame(&self) -> Rect;
    fn windows(&self) -> Vec<(WindowId, Rect)>;
    fn focused(&self) -> Option<WindowId>;
    fn commit(&mut self, update: &LayoutUpdate) -> Result<(), HostError>;
}

/// A host that keeps its windows in memory. Used by the command line tool and
/// in tests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryHost {
    frame: Rect,
    windows: Vec<(WindowId, Rect)>,
    focused: Option<WindowId>,
    #[serde(skip)]
    commits: usize,
}

impl MemoryHost {
    pub fn new(frame: Rect, windows: Vec<(WindowId, Rect)>, focused: Option<WindowId>) -> Self {
        MemoryHost { frame, windows, focused, commits: 0 }
    }

    pub fn from_tree(tree: &LayoutTree) -> Self {
        Self::new(tree.frame(), tree.layout(), Some(tree.focus()))
    }

    /// Number of updates committed so far.
    pub fn commits(&self) -> usize { self.commits }

    pub fn window_rect(&self, window: WindowId) -> Option<Rect> {
        self.windows.iter().find(|(w, _)| *w == window).map(|(_, r)| *r)
    }

    pub fn set_frame(&mut self, frame: Rect) { self.frame = frame; }

    pub fn focus(&mut self, window: WindowId) -> bool {
        let known = self.window_rect(window).is_some();
        if known {
            self.focused = Some(window);
        }
        known
    }

    /// Moves a window behind the engine's back.
    pub fn move_window(&mut self, window: WindowId, rect: Rect) -> bool {
        match self.windows.iter_mut().find(|(w, _)| *w == window) {
            Some((_, r)) => {
                *r = rect;
                true
            }
            None => false,
        }
    }

    pub fn open_window(&mut self, window: WindowId, rect: Rect) {
        self.close_window(window);
        self.windows.push((window, rect));
    }

    pub fn close_window(&mut self, window: WindowId) -> bool {
        let before = self.windows.len();
        self.windows.retain(|(w, _)| *w != window);
        if self.focused == Some(window) {
            self.focused = None;
        }
        self.windows.len() != before
    }
}

impl Host for MemoryHost {
    fn frame(&self) -> Rect { self.frame }

    fn windows(&self) -> Vec<(WindowId, Rect)> { self.windows.clone() }

    fn focused(&self) -> Option<WindowId> { self.focused }

    fn commit(&mut self, update: &LayoutUpdate) -> Result<(), HostError> {
        if let Some(&missing) = update.removed.iter().find(|w| self.window_rect(**w).is_none()) {
            return Err(HostError::UnknownWindow(missing));
        }
        self.windows = update.frames.clone();
        self.focused = Some(update.focus);
        self.commits += 1;
        Ok(())
    }
}
