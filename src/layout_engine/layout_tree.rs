//! The split tree that tiles a frame with windows.
//!
//! Every internal node is a [`Orientation`] split with at least two children;
//! every leaf holds exactly one window. A child's extent is its length along
//! its parent's axis, and the extents of a split's children always add up to
//! the split's own length, so the windows partition the frame with no gaps
//! and no overlaps. Rectangles are derived from extents by [`relayout`].
//!
//! [`relayout`]: LayoutTree::relayout

use std::iter;

use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::trace;

use crate::common::collections::{HashMap, HashSet};
use crate::layout_engine::error::{BuildError, SplitError, SwallowError};
use crate::layout_engine::{Direction, Orientation};
use crate::model::tree::{NodeId, NodeMap, Observer, Tree};
use crate::sys::geometry::{Rect, Span};
use crate::sys::host::WindowId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Split { orientation: Orientation },
    Window { window: WindowId },
}

/// An owned description of a subtree, used to splice new structure into a
/// [`LayoutTree`] and to compare shapes in tests.
///
/// The `u32` attached to each child is its extent along the split's axis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subtree {
    Window(WindowId),
    Split {
        orientation: Orientation,
        children: Vec<(u32, Subtree)>,
    },
}

impl Subtree {
    pub fn split(orientation: Orientation, children: impl IntoIterator<Item = (u32, Subtree)>) -> Self {
        Subtree::Split {
            orientation,
            children: children.into_iter().collect(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum TreeEvent {
    AddedToForest(NodeId),
    RemovingFromParent(NodeId),
    RemovedFromForest(NodeId),
}

#[derive(Clone, Default)]
struct Components {
    kind: SecondaryMap<NodeId, NodeKind>,
    layout: Layout,
    windows: WindowRegistry,
}

impl Components {
    fn dispatch_event(&mut self, map: &NodeMap, event: TreeEvent) {
        self.windows.handle_event(&self.kind, event);
        self.layout.handle_event(map, event);
        if let TreeEvent::RemovedFromForest(node) = event {
            self.kind.remove(node);
        }
    }
}

impl Observer for Components {
    fn added_to_forest(&mut self, map: &NodeMap, node: NodeId) {
        self.dispatch_event(map, TreeEvent::AddedToForest(node))
    }

    fn added_to_parent(&mut self, _map: &NodeMap, _node: NodeId) {}

    fn removing_from_parent(&mut self, map: &NodeMap, node: NodeId) {
        self.dispatch_event(map, TreeEvent::RemovingFromParent(node))
    }

    fn removed_from_forest(&mut self, map: &NodeMap, node: NodeId) {
        self.dispatch_event(map, TreeEvent::RemovedFromForest(node))
    }
}

#[derive(Clone, Default)]
struct Layout {
    /// Length along the parent's axis.
    extent: SecondaryMap<NodeId, u32>,
    /// Cached by `relayout`.
    rect: SecondaryMap<NodeId, Rect>,
}

impl Layout {
    fn handle_event(&mut self, _map: &NodeMap, event: TreeEvent) {
        match event {
            TreeEvent::AddedToForest(node) => {
                self.extent.insert(node, 0);
            }
            TreeEvent::RemovingFromParent(node) => {
                self.rect.remove(node);
            }
            TreeEvent::RemovedFromForest(node) => {
                self.extent.remove(node);
                self.rect.remove(node);
            }
        }
    }
}

#[derive(Clone, Default)]
struct WindowRegistry {
    nodes: HashMap<WindowId, NodeId>,
}

impl WindowRegistry {
    fn handle_event(&mut self, kind: &SecondaryMap<NodeId, NodeKind>, event: TreeEvent) {
        if let TreeEvent::RemovedFromForest(node) = event
            && let Some(NodeKind::Window { window }) = kind.get(node)
            && self.nodes.get(window) == Some(&node)
        {
            self.nodes.remove(window);
        }
    }
}

#[derive(Clone)]
pub struct LayoutTree {
    tree: Tree<Components>,
    root: NodeId,
    frame: Rect,
    focus: WindowId,
}

impl LayoutTree {
    /// A tree holding a single window that fills `frame`.
    pub fn new(frame: Rect, window: WindowId) -> Self {
        let mut tree = Tree::with_observer(Components::default());
        let root = tree.mk_node().into_id();
        let mut this = LayoutTree { tree, root, frame, focus: window };
        this.set_window(root, window);
        this.relayout();
        this
    }

    /// Reconstructs the split tree behind a set of window rectangles.
    ///
    /// The rectangles must tile `frame` exactly and be reachable by repeated
    /// straight cuts. Column cuts are preferred over row cuts when both are
    /// possible, and all cuts across a region are taken at once so no split
    /// ends up with a child of its own orientation.
    ///
    /// Without an explicit focus the first window in tree order is focused.
    pub fn from_rects(
        frame: Rect,
        windows: &[(WindowId, Rect)],
        focus: Option<WindowId>,
    ) -> Result<Self, BuildError> {
        check_partition(frame, windows)?;
        if let Some(focus) = focus
            && !windows.iter().any(|(w, _)| *w == focus)
        {
            return Err(BuildError::UnknownFocus(focus));
        }

        let mut tree = Tree::with_observer(Components::default());
        let root = build_node(&mut tree, frame, windows.to_vec())?;
        let mut this = LayoutTree { tree, root, frame, focus: windows[0].0 };
        this.focus = match focus {
            Some(focus) => focus,
            None => this.windows()[0],
        };
        this.relayout();
        this.validate()?;
        Ok(this)
    }

    pub fn frame(&self) -> Rect { self.frame }

    pub fn root(&self) -> NodeId { self.root }

    pub fn map(&self) -> &NodeMap { &self.tree.map }

    pub fn focus(&self) -> WindowId { self.focus }

    /// Moves the focus to `window`. Returns false if it is not in the tree.
    pub fn set_focus(&mut self, window: WindowId) -> bool {
        if !self.contains(window) {
            return false;
        }
        self.focus = window;
        true
    }

    pub fn contains(&self, window: WindowId) -> bool { self.tree.data.windows.nodes.contains_key(&window) }

    pub fn window_count(&self) -> usize { self.tree.data.windows.nodes.len() }

    pub fn node_for(&self, window: WindowId) -> Option<NodeId> {
        self.tree.data.windows.nodes.get(&window).copied()
    }

    pub fn kind(&self, node: NodeId) -> Option<NodeKind> { self.tree.data.kind.get(node).copied() }

    pub fn window_at(&self, node: NodeId) -> Option<WindowId> {
        match self.kind(node)? {
            NodeKind::Window { window } => Some(window),
            NodeKind::Split { .. } => None,
        }
    }

    pub fn orientation(&self, node: NodeId) -> Option<Orientation> {
        match self.kind(node)? {
            NodeKind::Split { orientation } => Some(orientation),
            NodeKind::Window { .. } => None,
        }
    }

    pub fn children(&self, node: NodeId) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        node.children(&self.tree.map)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> { node.parent(&self.tree.map) }

    /// The rectangle `node` occupies. Nodes no longer in the tree have an
    /// empty rectangle.
    pub fn rectangle_of(&self, node: NodeId) -> Rect {
        self.tree.data.layout.rect.get(node).copied().unwrap_or_default()
    }

    pub fn window_rect(&self, window: WindowId) -> Option<Rect> {
        self.node_for(window).map(|node| self.rectangle_of(node))
    }

    pub(crate) fn extent(&self, node: NodeId) -> u32 {
        self.tree.data.layout.extent.get(node).copied().unwrap_or_default()
    }

    /// The splits above `window`, nearest first.
    pub fn parent_chain(&self, window: WindowId) -> Vec<NodeId> {
        match self.node_for(window) {
            Some(node) => node.ancestors(&self.tree.map).skip(1).collect(),
            None => Vec::new(),
        }
    }

    /// Whether the focused window lies somewhere under `node`.
    pub fn contains_focus(&self, node: NodeId) -> bool {
        self.node_for(self.focus)
            .is_some_and(|leaf| leaf.ancestors(&self.tree.map).any(|n| n == node))
    }

    /// Windows in tree order.
    pub fn windows(&self) -> Vec<WindowId> { self.windows_under(self.root) }

    pub fn windows_under(&self, node: NodeId) -> Vec<WindowId> {
        node.traverse_preorder(&self.tree.map).filter_map(|n| self.window_at(n)).collect()
    }

    /// Every window with its rectangle, in tree order.
    pub fn layout(&self) -> Vec<(WindowId, Rect)> {
        self.root
            .traverse_preorder(&self.tree.map)
            .filter_map(|n| Some((self.window_at(n)?, self.rectangle_of(n))))
            .collect()
    }

    pub fn total_area(&self) -> u64 { self.layout().iter().map(|(_, r)| r.area()).sum() }

    pub fn subtree(&self, node: NodeId) -> Option<Subtree> {
        Some(match self.kind(node)? {
            NodeKind::Window { window } => Subtree::Window(window),
            NodeKind::Split { orientation } => Subtree::Split {
                orientation,
                children: self
                    .children(node)
                    .map(|c| Some((self.extent(c), self.subtree(c)?)))
                    .collect::<Option<_>>()?,
            },
        })
    }

    /// Replaces `old` and everything below it with `new`, or removes it
    /// outright when `new` is `None`.
    ///
    /// A replacement takes over `old`'s extent. A removed subtree's extent is
    /// handed to its next sibling, or its previous one when it is last. The
    /// change is applied to a copy and only kept if every layout invariant
    /// still holds; on error the tree is untouched.
    pub fn replace_subtree(&mut self, old: NodeId, new: Option<&Subtree>) -> Result<(), SwallowError> {
        let mut scratch = self.clone();
        match new {
            Some(subtree) => scratch.substitute(old, subtree)?,
            None => scratch.remove_into(old, None)?,
        }
        scratch.finish()?;
        *self = scratch;
        Ok(())
    }

    /// Splits `window` in half along `direction`'s axis and places
    /// `new_window` on the `direction` side. The new window takes the focus.
    pub fn split(
        &mut self,
        window: WindowId,
        direction: Direction,
        new_window: WindowId,
    ) -> Result<(), SplitError> {
        let node = self.node_for(window).ok_or(SplitError::UnknownWindow(window))?;
        if self.contains(new_window) {
            return Err(SplitError::DuplicateWindow(new_window));
        }
        let orientation = direction.orientation();
        let len = self.rectangle_of(node).len(orientation);
        if len < 2 {
            return Err(SplitError::TooSmall { window, direction });
        }
        let new_len = len / 2;

        let mut scratch = self.clone();
        scratch.split_node(node, orientation, direction.is_toward_start(), new_window, new_len);
        scratch.focus = new_window;
        scratch.finish()?;
        *self = scratch;
        Ok(())
    }

    fn split_node(
        &mut self,
        node: NodeId,
        orientation: Orientation,
        before: bool,
        new_window: WindowId,
        new_len: u32,
    ) {
        let old_len = self.rectangle_of(node).len(orientation) - new_len;
        let leaf = self.tree.mk_node().into_id();
        self.set_window(leaf, new_window);
        self.tree.data.layout.extent[leaf] = new_len;

        let parent = node.parent(&self.tree.map);
        let same_axis = parent.is_some_and(|p| self.orientation(p) == Some(orientation));
        if same_axis {
            self.tree.data.layout.extent[node] = old_len;
            if before {
                leaf.detach(&mut self.tree).insert_before(node);
            } else {
                leaf.detach(&mut self.tree).insert_after(node);
            }
            return;
        }

        let split = self.tree.mk_node().into_id();
        self.tree.data.kind.insert(split, NodeKind::Split { orientation });
        self.tree.data.layout.extent[split] = self.extent(node);
        if parent.is_some() {
            split.detach(&mut self.tree).replace(node);
        } else {
            self.root = split;
        }
        self.tree.data.layout.extent[node] = old_len;
        let (first, second) = if before { (leaf, node) } else { (node, leaf) };
        first.detach(&mut self.tree).push_back(split);
        second.detach(&mut self.tree).push_back(split);
    }

    /// Removes `old` and gives its extent to `recipient`, an adjacent sibling.
    /// Defaults to the next sibling, or the previous one when `old` is last.
    ///
    /// Rectangles are stale afterwards until [`finish`](Self::finish) runs.
    pub(crate) fn remove_into(&mut self, old: NodeId, recipient: Option<NodeId>) -> Result<(), SwallowError> {
        let map = &self.tree.map;
        if !map.contains(old) {
            return Err(SwallowError::invariant(format!("{old:?} is not in the tree")));
        }
        let Some(parent) = old.parent(map) else {
            return Err(SwallowError::invariant("cannot remove the root of the layout"));
        };
        if self.contains_focus(old) {
            return Err(SwallowError::invariant(format!(
                "removing {old:?} would drop the focused window {}",
                self.focus
            )));
        }
        let Some(orientation) = self.orientation(parent) else {
            return Err(SwallowError::invariant(format!("parent of {old:?} is not a split")));
        };
        let index = old
            .index_in_parent(map)
            .ok_or_else(|| SwallowError::invariant(format!("{old:?} missing from its parent")))?;
        let recipient = match recipient {
            Some(recipient) => recipient,
            None => old
                .next_sibling(map)
                .or_else(|| old.prev_sibling(map))
                .ok_or_else(|| SwallowError::invariant(format!("{old:?} has no sibling")))?,
        };
        let recipient_index = match recipient.index_in_parent(map) {
            Some(i) if recipient.parent(map) == Some(parent) && i.abs_diff(index) == 1 => i,
            _ => {
                return Err(SwallowError::invariant(format!(
                    "{recipient:?} is not adjacent to {old:?}"
                )));
            }
        };

        let delta = self.extent(old);
        trace!(?old, ?recipient, delta, "Removing subtree");
        self.grow_edge(recipient, orientation, recipient_index > index, delta);
        old.detach(&mut self.tree).remove();
        self.collapse(parent);
        Ok(())
    }

    /// Grows `node` by `delta` along `axis` on its start or end edge.
    ///
    /// Only extents change; the node's own extent grows when `axis` is its
    /// parent's axis, and the growth is passed down so the descendants keep
    /// adding up to the new size.
    fn grow_edge(&mut self, node: NodeId, axis: Orientation, at_start: bool, delta: u32) {
        if delta == 0 {
            return;
        }
        if let Some(parent) = node.parent(&self.tree.map)
            && self.orientation(parent) == Some(axis)
        {
            self.tree.data.layout.extent[node] += delta;
        }
        let Some(orientation) = self.orientation(node) else { return };
        if orientation == axis {
            let edge = if at_start {
                node.first_child(&self.tree.map)
            } else {
                node.last_child(&self.tree.map)
            };
            if let Some(edge) = edge {
                self.grow_edge(edge, axis, at_start, delta);
            }
        } else {
            let children: Vec<_> = node.children(&self.tree.map).collect();
            for child in children {
                self.grow_edge(child, axis, at_start, delta);
            }
        }
    }

    /// Replaces a split that has been left with one child by that child.
    fn collapse(&mut self, split: NodeId) {
        if split.child_count(&self.tree.map) != 1 {
            return;
        }
        let Some(child) = split.first_child(&self.tree.map) else { return };
        let extent = self.extent(split);
        self.tree.data.layout.extent[child] = extent;
        if split.parent(&self.tree.map).is_some() {
            child.detach(&mut self.tree).replace(split);
        } else {
            child.detach(&mut self.tree).into_root();
            self.root = child;
        }
        split.remove_root(&mut self.tree);
        trace!(?split, ?child, "Collapsed single-child split");
        self.flatten(child);
    }

    /// Merges a split into its parent when both share an orientation.
    fn flatten(&mut self, node: NodeId) {
        let Some(parent) = node.parent(&self.tree.map) else { return };
        let (Some(inner), Some(outer)) = (self.orientation(node), self.orientation(parent)) else {
            return;
        };
        if inner != outer {
            return;
        }
        let children: Vec<_> = node.children(&self.tree.map).collect();
        for child in children {
            child.detach(&mut self.tree).insert_before(node);
        }
        node.detach(&mut self.tree).remove();
    }

    fn normalize(&mut self, node: NodeId) {
        if node.child_count(&self.tree.map) == 1 {
            self.collapse(node);
        } else {
            self.flatten(node);
        }
    }

    fn substitute(&mut self, old: NodeId, subtree: &Subtree) -> Result<(), SwallowError> {
        let map = &self.tree.map;
        if !map.contains(old) {
            return Err(SwallowError::invariant(format!("{old:?} is not in the tree")));
        }
        let extent = self.extent(old);
        let position = old.parent(map).zip(old.index_in_parent(map));

        // Drop the old windows first so the replacement may reuse them.
        match position {
            Some(_) => old.detach(&mut self.tree).remove(),
            None => old.remove_root(&mut self.tree),
        }
        let new = self.instantiate(subtree)?;
        self.tree.data.layout.extent[new] = extent;
        match position {
            Some((parent, index)) => {
                new.detach(&mut self.tree).insert_at(parent, index);
            }
            None => self.root = new,
        }
        self.normalize(new);
        Ok(())
    }

    fn instantiate(&mut self, subtree: &Subtree) -> Result<NodeId, SwallowError> {
        match subtree {
            Subtree::Window(window) => {
                if self.contains(*window) {
                    return Err(SwallowError::invariant(format!(
                        "window {window} is already in the layout"
                    )));
                }
                let node = self.tree.mk_node().into_id();
                self.set_window(node, *window);
                Ok(node)
            }
            Subtree::Split { orientation, children } => {
                if children.is_empty() {
                    return Err(SwallowError::invariant("split with no children"));
                }
                let node = self.tree.mk_node().into_id();
                self.tree.data.kind.insert(node, NodeKind::Split { orientation: *orientation });
                for (extent, child) in children {
                    let child = self.instantiate(child)?;
                    self.tree.data.layout.extent[child] = *extent;
                    child.detach(&mut self.tree).push_back(node);
                    self.normalize(child);
                }
                Ok(node)
            }
        }
    }

    fn set_window(&mut self, node: NodeId, window: WindowId) {
        self.tree.data.kind.insert(node, NodeKind::Window { window });
        self.tree.data.windows.nodes.insert(window, node);
    }

    /// Recomputes rectangles and checks every invariant.
    pub(crate) fn finish(&mut self) -> Result<(), SwallowError> {
        self.relayout();
        self.validate()
    }

    /// Recomputes every rectangle from the frame and the stored extents.
    pub fn relayout(&mut self) {
        let map = &self.tree.map;
        let data = &mut self.tree.data;
        data.layout.rect.insert(self.root, self.frame);
        for node in self.root.traverse_preorder(map) {
            let Some(NodeKind::Split { orientation }) = data.kind.get(node).copied() else {
                continue;
            };
            let rect = data.layout.rect[node];
            let mut offset = rect.span(orientation).start;
            for child in node.children(map) {
                let extent = data.layout.extent.get(child).copied().unwrap_or_default();
                data.layout.rect.insert(child, rect.with_span(orientation, Span::new(offset, extent)));
                offset = offset.saturating_add(extent);
            }
        }
    }

    /// Checks the structural and geometric invariants of the tree.
    pub fn validate(&self) -> Result<(), SwallowError> {
        let map = &self.tree.map;
        let data = &self.tree.data;
        if self.root.parent(map).is_some() {
            return Err(SwallowError::invariant("root has a parent"));
        }
        if self.rectangle_of(self.root) != self.frame {
            return Err(SwallowError::invariant(format!(
                "root covers {} instead of the frame {}",
                self.rectangle_of(self.root),
                self.frame
            )));
        }

        let mut windows = 0;
        let mut area = 0;
        for node in self.root.traverse_preorder(map) {
            let rect = data
                .layout
                .rect
                .get(node)
                .copied()
                .ok_or_else(|| SwallowError::invariant(format!("{node:?} has no rectangle")))?;
            if rect.is_empty() {
                return Err(SwallowError::invariant(format!("{node:?} has an empty rectangle {rect}")));
            }
            match data.kind.get(node) {
                None => return Err(SwallowError::invariant(format!("{node:?} has no kind"))),
                Some(NodeKind::Window { window }) => {
                    if !node.is_empty(map) {
                        return Err(SwallowError::invariant(format!("window {window} has children")));
                    }
                    if data.windows.nodes.get(window) != Some(&node) {
                        return Err(SwallowError::invariant(format!("window {window} is not registered")));
                    }
                    windows += 1;
                    area += rect.area();
                }
                Some(&NodeKind::Split { orientation }) => {
                    let count = node.child_count(map);
                    if count < 2 {
                        return Err(SwallowError::invariant(format!(
                            "{orientation} split {node:?} has {count} children"
                        )));
                    }
                    let span = rect.span(orientation);
                    let mut offset = span.start;
                    for child in node.children(map) {
                        if self.orientation(child) == Some(orientation) {
                            return Err(SwallowError::invariant(format!(
                                "{orientation} split {child:?} is nested in a split of the same orientation"
                            )));
                        }
                        let child_rect = self.rectangle_of(child);
                        if child_rect.cross_span(orientation) != rect.cross_span(orientation) {
                            return Err(SwallowError::invariant(format!(
                                "{child:?} at {child_rect} does not span its parent {rect}"
                            )));
                        }
                        let child_span = child_rect.span(orientation);
                        if child_span.start != offset || child_span.len != self.extent(child) {
                            return Err(SwallowError::invariant(format!(
                                "{child:?} at {child_rect} does not abut its sibling at {offset}"
                            )));
                        }
                        offset = child_span.end();
                    }
                    if offset != span.end() {
                        return Err(SwallowError::invariant(format!(
                            "children of {node:?} end at {offset}, the split ends at {}",
                            span.end()
                        )));
                    }
                }
            }
        }

        if windows != data.windows.nodes.len() {
            return Err(SwallowError::invariant(format!(
                "{} windows registered, {windows} in the tree",
                data.windows.nodes.len()
            )));
        }
        if !self.contains(self.focus) {
            return Err(SwallowError::invariant(format!(
                "focused window {} is not in the layout",
                self.focus
            )));
        }
        if area != self.frame.area() {
            return Err(SwallowError::invariant(format!(
                "windows cover {area} of {} cells",
                self.frame.area()
            )));
        }
        Ok(())
    }

    pub fn draw_tree(&self) -> String {
        let tree = self.get_ascii_tree(self.root);
        let mut out = String::new();
        ascii_tree::write_tree(&mut out, &tree).expect("writing to a String cannot fail");
        out
    }

    fn get_ascii_tree(&self, node: NodeId) -> ascii_tree::Tree {
        let rect = self.rectangle_of(node);
        match self.kind(node) {
            Some(NodeKind::Window { window }) => {
                let marker = if window == self.focus { "* " } else { "" };
                ascii_tree::Tree::Leaf(vec![format!("{marker}{window} {rect}")])
            }
            Some(NodeKind::Split { orientation }) => ascii_tree::Tree::Node(
                format!("{orientation} {rect}"),
                self.children(node).map(|c| self.get_ascii_tree(c)).collect(),
            ),
            None => ascii_tree::Tree::Leaf(vec![format!("{node:?} <unknown>")]),
        }
    }
}

impl std::fmt::Debug for LayoutTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LayoutTree(focus {}):\n{}", self.focus, self.draw_tree())
    }
}

fn check_partition(frame: Rect, windows: &[(WindowId, Rect)]) -> Result<(), BuildError> {
    if windows.is_empty() {
        return Err(BuildError::Empty);
    }
    let mut seen = HashSet::default();
    for &(window, rect) in windows {
        if rect.is_empty() {
            return Err(BuildError::EmptyRect(window));
        }
        if !frame.contains_rect(&rect) {
            return Err(BuildError::OutsideFrame { window, rect, frame });
        }
        if !seen.insert(window) {
            return Err(BuildError::DuplicateWindow(window));
        }
    }
    for (i, (a, ra)) in windows.iter().enumerate() {
        for (b, rb) in &windows[i + 1..] {
            if ra.intersection(rb).is_some() {
                return Err(BuildError::Overlap(*a, *b));
            }
        }
    }
    let covered: u64 = windows.iter().map(|(_, r)| r.area()).sum();
    if covered != frame.area() {
        return Err(BuildError::Gap { covered, expected: frame.area() });
    }
    Ok(())
}

fn build_node(
    tree: &mut Tree<Components>,
    region: Rect,
    items: Vec<(WindowId, Rect)>,
) -> Result<NodeId, BuildError> {
    if let [(window, rect)] = items[..] {
        if rect != region {
            return Err(BuildError::NotGuillotine(region));
        }
        let node = tree.mk_node().into_id();
        tree.data.kind.insert(node, NodeKind::Window { window });
        tree.data.windows.nodes.insert(window, node);
        return Ok(node);
    }
    for orientation in [Orientation::Horizontal, Orientation::Vertical] {
        let groups = cut(region, &items, orientation);
        if groups.len() < 2 {
            continue;
        }
        let node = tree.mk_node().into_id();
        tree.data.kind.insert(node, NodeKind::Split { orientation });
        for (span, group) in groups {
            if group.is_empty() {
                return Err(BuildError::NotGuillotine(region));
            }
            let child = build_node(tree, region.with_span(orientation, span), group)?;
            tree.data.layout.extent[child] = span.len;
            child.detach(tree).push_back(node);
        }
        return Ok(node);
    }
    Err(BuildError::NotGuillotine(region))
}

/// Groups `items` by every straight line across `region` that no item
/// crosses. Returns fewer than two groups when no such line exists.
fn cut(
    region: Rect,
    items: &[(WindowId, Rect)],
    orientation: Orientation,
) -> Vec<(Span, Vec<(WindowId, Rect)>)> {
    let whole = region.span(orientation);
    let mut bounds: Vec<u32> = items
        .iter()
        .map(|(_, r)| r.span(orientation).end())
        .filter(|&end| end < whole.end())
        .collect();
    bounds.sort_unstable();
    bounds.dedup();
    bounds.retain(|&b| {
        items.iter().all(|(_, r)| {
            let s = r.span(orientation);
            !(s.start < b && b < s.end())
        })
    });
    if bounds.is_empty() {
        return Vec::new();
    }

    let mut groups = Vec::with_capacity(bounds.len() + 1);
    let mut start = whole.start;
    for end in bounds.into_iter().chain(iter::once(whole.end())) {
        let span = Span::new(start, end - start);
        let group = items
            .iter()
            .filter(|(_, r)| span.contains(&r.span(orientation)))
            .copied()
            .collect();
        groups.push((span, group));
        start = end;
    }
    groups
}
