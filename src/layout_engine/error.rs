use thiserror::Error;

use crate::layout_engine::Direction;
use crate::sys::geometry::Rect;
use crate::sys::host::{HostError, WindowId};

/// Outcomes of a swallow that leave the layout untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwallowError {
    #[error("No other window to swallow")]
    NoOtherWindow,
    #[error("No window {0} from the focused window")]
    NoNeighborInDirection(Direction),
    #[error("Layout is stale: {0}")]
    StaleLayout(String),
    #[error("Layout invariant violated: {0}")]
    InvariantViolation(String),
}

impl SwallowError {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        SwallowError::InvariantViolation(msg.into())
    }
}

/// Failure to reconstruct a tree from a set of window rectangles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("No windows to lay out")]
    Empty,
    #[error("Window {0} has an empty rectangle")]
    EmptyRect(WindowId),
    #[error("Window {window} at {rect} lies outside the frame {frame}")]
    OutsideFrame { window: WindowId, rect: Rect, frame: Rect },
    #[error("Window {0} appears more than once")]
    DuplicateWindow(WindowId),
    #[error("Windows {0} and {1} overlap")]
    Overlap(WindowId, WindowId),
    #[error("Windows cover {covered} cells of a {expected}-cell frame")]
    Gap { covered: u64, expected: u64 },
    #[error("Region {0} cannot be cut by a straight line")]
    NotGuillotine(Rect),
    #[error("Focus window {0} is not part of the layout")]
    UnknownFocus(WindowId),
    #[error(transparent)]
    Invariant(#[from] SwallowError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("Window not found: {0}")]
    UnknownWindow(WindowId),
    #[error("Window {0} is already in the layout")]
    DuplicateWindow(WindowId),
    #[error("Window {window} is too small to split {direction}")]
    TooSmall { window: WindowId, direction: Direction },
    #[error("No window id left above {0}")]
    OutOfWindowIds(WindowId),
    #[error(transparent)]
    Invariant(#[from] SwallowError),
}

/// Errors surfaced by [`LayoutEngine::handle_command`](super::LayoutEngine::handle_command).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error(transparent)]
    Swallow(#[from] SwallowError),
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error("Window not found: {0}")]
    UnknownWindow(WindowId),
    #[error(transparent)]
    Host(#[from] HostError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_direction() {
        assert_eq!(
            SwallowError::NoNeighborInDirection(Direction::Up).to_string(),
            "No window up from the focused window"
        );
        assert_eq!(
            SplitError::OutOfWindowIds(WindowId(7)).to_string(),
            "No window id left above w7"
        );
    }
}
