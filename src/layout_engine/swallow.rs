use serde::Serialize;
use tracing::debug;

use crate::layout_engine::error::SwallowError;
use crate::layout_engine::locator::locate;
use crate::layout_engine::policy::{Policy, Resolution, resolve};
use crate::layout_engine::{Direction, LayoutTree};
use crate::sys::geometry::Rect;
use crate::sys::host::WindowId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SwallowOutcome {
    pub direction: Direction,
    /// Windows that are no longer part of the layout.
    pub removed: Vec<WindowId>,
    /// The rectangle the removed windows used to cover.
    pub freed: Rect,
    /// Whether only part of the neighbor was removed.
    pub trimmed: bool,
    pub layout: Vec<(WindowId, Rect)>,
}

/// Grows the focused window of `tree` into its neighbor in `direction`.
///
/// On error the tree is left exactly as it was.
pub fn swallow(
    tree: &mut LayoutTree,
    direction: Direction,
    policy: Policy,
) -> Result<SwallowOutcome, SwallowError> {
    if tree.window_count() < 2 {
        return Err(SwallowError::NoOtherWindow);
    }
    let focus = tree.focus();
    let adjacent =
        locate(tree, focus, direction).ok_or(SwallowError::NoNeighborInDirection(direction))?;

    let (remove, recipient, trimmed) = match resolve(tree, &adjacent, policy) {
        Resolution::Consume => (adjacent.neighbor, adjacent.focus_child, false),
        Resolution::Trim { remove, recipient } => (remove, recipient, true),
    };
    let removed = tree.windows_under(remove);
    let freed = tree.rectangle_of(remove);
    debug!(?direction, %focus, ?removed, %freed, trimmed, "Swallowing");

    let mut scratch = tree.clone();
    scratch.remove_into(remove, Some(recipient))?;
    scratch.finish()?;
    *tree = scratch;

    Ok(SwallowOutcome {
        direction,
        removed,
        freed,
        trimmed,
        layout: tree.layout(),
    })
}
