use tracing::trace;

use crate::layout_engine::{Direction, LayoutTree};
use crate::model::tree::NodeId;
use crate::sys::host::WindowId;

/// The subtree directly next to the focus in some direction, and where it
/// sits relative to the focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdjacentSubtree {
    pub direction: Direction,
    /// Nearest split along the direction's axis with a child on the
    /// direction side of the focus.
    pub ancestor: NodeId,
    /// Child of `ancestor` that holds the focus.
    pub focus_child: NodeId,
    pub focus_index: usize,
    pub neighbor: NodeId,
    pub neighbor_index: usize,
}

/// Finds the subtree bordering `focus` on its `direction` edge.
///
/// Walks up from the focus and stops at the first split along the
/// direction's axis where the focus's branch is not already the outermost
/// child on that side. Returns `None` when the focus touches the frame edge.
pub fn locate(tree: &LayoutTree, focus: WindowId, direction: Direction) -> Option<AdjacentSubtree> {
    let axis = direction.orientation();
    let mut child = tree.node_for(focus)?;
    for ancestor in tree.parent_chain(focus) {
        if tree.orientation(ancestor) == Some(axis) {
            let len = ancestor.child_count(tree.map());
            let focus_index = child.index_in_parent(tree.map())?;
            if let Some(neighbor_index) = direction.step(focus_index, len) {
                let neighbor = ancestor.child_at(tree.map(), neighbor_index)?;
                debug_assert_ne!(
                    tree.orientation(neighbor),
                    Some(axis),
                    "neighbor split shares its parent's orientation"
                );
                trace!(?direction, ?ancestor, ?neighbor, "Found neighbor");
                return Some(AdjacentSubtree {
                    direction,
                    ancestor,
                    focus_child: child,
                    focus_index,
                    neighbor,
                    neighbor_index,
                });
            }
        }
        child = ancestor;
    }
    trace!(?direction, %focus, "Focus touches the frame edge");
    None
}
