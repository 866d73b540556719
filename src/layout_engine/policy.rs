use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::layout_engine::locator::AdjacentSubtree;
use crate::layout_engine::{LayoutTree, NodeKind};
use crate::model::tree::NodeId;
use crate::sys::geometry::Span;

/// What to do when the windows across the swallow edge only partly line up
/// with the focus.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguousSpan {
    /// Take the whole neighbor, as in aggressive mode.
    #[default]
    Consume,
    /// Remove the window that overlaps the focus the most.
    LargestOverlap,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Policy {
    pub aggressive: bool,
    pub ambiguous: AmbiguousSpan,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Resolution {
    /// Remove the whole neighbor; the focus side of the ancestor grows over it.
    Consume,
    /// Remove one child of the neighbor; its sibling `recipient` takes the
    /// freed space and the focus stays as it is.
    Trim { remove: NodeId, recipient: NodeId },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Touch {
    /// Spans at least the whole focus edge.
    Covering,
    /// Lies within the focus edge.
    Contained,
    Partial,
}

fn touch(focus: Span, span: Span) -> Touch {
    if span.contains(&focus) {
        Touch::Covering
    } else if focus.contains(&span) {
        Touch::Contained
    } else {
        Touch::Partial
    }
}

/// Decides how much of `adjacent` the swallow removes.
pub fn resolve(tree: &LayoutTree, adjacent: &AdjacentSubtree, policy: Policy) -> Resolution {
    let neighbor = adjacent.neighbor;
    let Some(NodeKind::Split { orientation }) = tree.kind(neighbor) else {
        return Resolution::Consume;
    };
    if policy.aggressive {
        return Resolution::Consume;
    }

    let axis = adjacent.direction.orientation();
    debug_assert_eq!(orientation, axis.perpendicular());
    let Some(focus_rect) = tree.window_rect(tree.focus()) else {
        return Resolution::Consume;
    };
    let edge = focus_rect.cross_span(axis);
    let touching: Vec<(NodeId, Span, Touch)> = tree
        .children(neighbor)
        .map(|c| {
            let span = tree.rectangle_of(c).span(orientation);
            (c, span, touch(edge, span))
        })
        .filter(|(_, span, _)| span.overlap(&edge) > 0)
        .collect();

    let remove = if touching.iter().any(|(_, _, t)| *t == Touch::Partial) {
        match policy.ambiguous {
            AmbiguousSpan::Consume => {
                warn!(
                    direction = ?adjacent.direction,
                    ?neighbor,
                    "Neighbor only partly lines up with the focus; consuming all of it"
                );
                return Resolution::Consume;
            }
            AmbiguousSpan::LargestOverlap => {
                // max_by_key keeps the last maximum, so walk backwards to prefer the first.
                touching.iter().rev().max_by_key(|(_, span, _)| span.overlap(&edge)).map(|t| t.0)
            }
        }
    } else {
        touching
            .iter()
            .find(|(_, _, t)| *t == Touch::Covering)
            .or_else(|| touching.first())
            .map(|t| t.0)
    };

    let Some(remove) = remove else {
        return Resolution::Consume;
    };
    let map = tree.map();
    let Some(recipient) = remove.next_sibling(map).or_else(|| remove.prev_sibling(map)) else {
        return Resolution::Consume;
    };
    debug!(?remove, ?recipient, "Trimming neighbor");
    Resolution::Trim { remove, recipient }
}
