mod engine;
mod error;
mod graph;
pub mod layout_tree;
pub mod locator;
pub mod policy;
pub mod swallow;

pub use engine::{EventResponse, LayoutCommand, LayoutEngine};
pub use error::{BuildError, LayoutError, SplitError, SwallowError};
pub use graph::{Direction, Orientation};
pub use layout_tree::{LayoutTree, NodeKind, Subtree};
pub use locator::{AdjacentSubtree, locate};
pub use policy::{AmbiguousSpan, Policy, Resolution};
pub use swallow::{SwallowOutcome, swallow};
