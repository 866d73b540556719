use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

/// N-ary tree.
///
/// Structure lives in [`NodeMap`]; per-node payloads live in secondary maps
/// owned by the observer `O`, which is told about every structural change.
#[derive(Clone, Serialize, Deserialize)]
pub struct Tree<O> {
    pub map: NodeMap,
    pub data: O,
}

impl Tree<()> {
    pub fn new() -> Self { Self::with_observer(()) }
}

impl Default for Tree<()> {
    fn default() -> Self { Self::new() }
}

impl<O: Observer> Tree<O> {
    pub fn with_observer(data: O) -> Self { Tree { map: NodeMap::new(), data } }

    pub fn mk_node(&mut self) -> UnattachedNode<'_, O> {
        let id = self.map.map.insert(Node::default());
        self.data.added_to_forest(&self.map, id);
        UnattachedNode { id, tree: self }
    }
}

/// Map that holds the structure of the tree.
///
/// Parents are referenced by key, never owned, so subtrees can be moved and
/// dropped without fighting the borrow checker.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NodeMap {
    map: SlotMap<NodeId, Node>,
}

impl NodeMap {
    fn new() -> NodeMap { NodeMap { map: SlotMap::default() } }

    pub fn len(&self) -> usize { self.map.len() }

    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    pub fn contains(&self, id: NodeId) -> bool { self.map.contains_key(id) }
}

slotmap::new_key_type! {
    /// Represents a node somewhere in the tree.
    pub struct NodeId;
}

#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeId {
    #[track_caller]
    pub fn detach<'a, O: Observer>(self, tree: &'a mut Tree<O>) -> DetachedNode<'a, O> {
        DetachedNode { id: self, tree }
    }

    pub fn parent(self, map: &NodeMap) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.parent)
    }

    pub fn children(self, map: &NodeMap) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        map.map.get(self).map(|n| n.children.as_slice()).unwrap_or_default().iter().copied()
    }

    pub fn child_count(self, map: &NodeMap) -> usize {
        map.map.get(self).map_or(0, |n| n.children.len())
    }

    pub fn child_at(self, map: &NodeMap, index: usize) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.children.get(index).copied())
    }

    /// Position of this node in its parent's child list.
    pub fn index_in_parent(self, map: &NodeMap) -> Option<usize> {
        let parent = self.parent(map)?;
        map.map[parent].children.iter().position(|&c| c == self)
    }

    pub fn first_child(self, map: &NodeMap) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.children.first().copied())
    }

    pub fn last_child(self, map: &NodeMap) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.children.last().copied())
    }

    pub fn next_sibling(self, map: &NodeMap) -> Option<NodeId> {
        let index = self.index_in_parent(map)?;
        self.parent(map)?.child_at(map, index + 1)
    }

    pub fn prev_sibling(self, map: &NodeMap) -> Option<NodeId> {
        let index = self.index_in_parent(map)?;
        self.parent(map)?.child_at(map, index.checked_sub(1)?)
    }

    pub fn is_empty(self, map: &NodeMap) -> bool { self.child_count(map) == 0 }

    /// Returns an iterator over all ancestors of the current node, including itself.
    pub fn ancestors(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = Some(self);
        std::iter::from_fn(move || {
            let node = next;
            next = node.and_then(|n| n.parent(map));
            node
        })
    }

    pub fn traverse_preorder(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children(map).rev());
            Some(node)
        })
    }

    pub fn traverse_postorder(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        PostorderTraversal { stack: vec![(self, false)], map }
    }

    #[track_caller]
    pub fn remove_root<O: Observer>(self, tree: &mut Tree<O>) {
        assert!(
            self.parent(&tree.map).is_none(),
            "remove_root called on non-root node"
        );
        delete_recursive(tree, self);
    }
}

pub trait Observer
where Self: Sized {
    fn added_to_forest(&mut self, map: &NodeMap, node: NodeId);
    fn added_to_parent(&mut self, map: &NodeMap, node: NodeId);
    fn removing_from_parent(&mut self, map: &NodeMap, node: NodeId);
    fn removed_from_forest(&mut self, map: &NodeMap, node: NodeId);
}

impl Observer for () {
    fn added_to_forest(&mut self, _map: &NodeMap, _node: NodeId) {}

    fn added_to_parent(&mut self, _map: &NodeMap, _node: NodeId) {}

    fn removing_from_parent(&mut self, _map: &NodeMap, _node: NodeId) {}

    fn removed_from_forest(&mut self, _map: &NodeMap, _node: NodeId) {}
}

#[must_use = "Unattached nodes should be inserted into the tree or kept as a root"]
pub struct UnattachedNode<'a, O> {
    id: NodeId,
    tree: &'a mut Tree<O>,
}

impl<'a, O: Observer> UnattachedNode<'a, O> {
    /// Keeps the node as a detached root and returns its id.
    pub fn into_id(self) -> NodeId { self.id }

    pub fn push_back(self, parent: NodeId) -> NodeId {
        let index = parent.child_count(&self.tree.map);
        self.insert_at(parent, index)
    }

    pub fn insert_at(self, parent: NodeId, index: usize) -> NodeId {
        if self.id.link_under(parent, index, &mut self.tree.map) {
            self.tree.data.added_to_parent(&self.tree.map, self.id);
        }
        self.id
    }
}

#[must_use = "Detached nodes should be reattached to the tree or removed"]
pub struct DetachedNode<'a, O> {
    id: NodeId,
    tree: &'a mut Tree<O>,
}

impl<'a, O: Observer> DetachedNode<'a, O> {
    pub fn push_back(mut self, parent: NodeId) -> NodeId {
        self.unlink();
        let index = parent.child_count(&self.tree.map);
        self.link(parent, index)
    }

    #[track_caller]
    pub fn insert_before(mut self, sibling: NodeId) -> NodeId {
        self.unlink();
        let (parent, index) = self.position_of(sibling);
        self.link(parent, index)
    }

    #[track_caller]
    pub fn insert_after(mut self, sibling: NodeId) -> NodeId {
        self.unlink();
        let (parent, index) = self.position_of(sibling);
        self.link(parent, index + 1)
    }

    pub fn insert_at(mut self, parent: NodeId, index: usize) -> NodeId {
        self.unlink();
        self.link(parent, index)
    }

    /// Takes the place of `old` in its parent. `old` is left detached as a root.
    #[track_caller]
    pub fn replace(mut self, old: NodeId) -> NodeId {
        self.unlink();
        let (parent, index) = self.position_of(old);
        old.detach(&mut *self.tree).unlink();
        self.link(parent, index)
    }

    /// Unlinks the node and drops it along with its whole subtree.
    pub fn remove(mut self) {
        self.unlink();
        delete_recursive(self.tree, self.id);
    }

    /// Unlinks the node and keeps it around as a root.
    pub fn into_root(mut self) -> NodeId {
        self.unlink();
        self.id
    }

    fn unlink(&mut self) -> Option<NodeId> {
        let parent = self.id.parent(&self.tree.map)?;
        self.tree.data.removing_from_parent(&self.tree.map, self.id);
        self.tree.map.unlink(self.id);
        Some(parent)
    }

    #[track_caller]
    fn position_of(&self, sibling: NodeId) -> (NodeId, usize) {
        let parent = sibling
            .parent(&self.tree.map)
            .expect("cannot make a sibling of a root node or invalid sibling");
        let index = sibling
            .index_in_parent(&self.tree.map)
            .expect("sibling missing from its parent's child list");
        (parent, index)
    }

    fn link(self, parent: NodeId, index: usize) -> NodeId {
        if self.id.link_under(parent, index, &mut self.tree.map) {
            self.tree.data.added_to_parent(&self.tree.map, self.id);
        }
        self.id
    }
}

impl NodeId {
    fn link_under(self, parent: NodeId, index: usize, map: &mut NodeMap) -> bool {
        if self == parent || !map.contains(self) || !map.contains(parent) {
            return false;
        }
        debug_assert!(self.parent(map).is_none(), "node linked twice");
        let children = &mut map.map[parent].children;
        let index = index.min(children.len());
        children.insert(index, self);
        map.map[self].parent = Some(parent);
        true
    }
}

impl NodeMap {
    fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.map.get_mut(id).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent_node) = self.map.get_mut(parent) {
            parent_node.children.retain(|&c| c != id);
        }
    }
}

fn delete_recursive(tree: &mut Tree<impl Observer>, id: NodeId) {
    let children: Vec<_> = id.children(&tree.map).collect();
    for child in children {
        delete_recursive(tree, child);
    }
    tree.data.removed_from_forest(&tree.map, id);
    tree.map.map.remove(id);
}

struct PostorderTraversal<'a> {
    stack: Vec<(NodeId, bool)>,
    map: &'a NodeMap,
}

impl<'a> Iterator for PostorderTraversal<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, expanded) = self.stack.pop()?;
            if expanded || node.is_empty(self.map) {
                return Some(node);
            }
            self.stack.push((node, true));
            self.stack.extend(node.children(self.map).rev().map(|c| (c, false)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A tree with the following structure:
    /// ```text
    ///         [tree]              [other_tree]
    ///        __root__              other_root
    ///       /    |   \
    /// child1  child2  child3
    ///            |
    ///           gc1
    /// ```
    struct TestTree {
        tree: Tree<Events>,
        root: NodeId,
        child1: NodeId,
        child2: NodeId,
        child3: NodeId,
        gc1: NodeId,
        other_root: NodeId,
    }

    impl TestTree {
        #[rustfmt::skip]
        fn new() -> Self {
            let mut tree = Tree::with_observer(Events(vec![]));

            let root = tree.mk_node().into_id();
            let child1 = tree.mk_node().push_back(root);
            let child2 = tree.mk_node().push_back(root);
            let child3 = tree.mk_node().push_back(root);

            let gc1 = tree.mk_node().push_back(child2);
            let other_root = tree.mk_node().into_id();

            let mut t = TestTree { tree, root, child1, child2, child3, gc1, other_root };
            t.clear_events();
            t
        }

        fn get_children(&self, node: NodeId) -> Vec<NodeId> {
            node.children(&self.tree.map).collect()
        }

        #[track_caller]
        fn assert_children_are<const N: usize>(&self, children: [NodeId; N], parent: NodeId) {
            assert_eq!(children, *self.get_children(parent), "children did not match");
            for child in self.get_children(parent) {
                assert_eq!(child.parent(&self.tree.map), Some(parent), "child has incorrect parent");
            }
        }

        #[track_caller]
        fn assert_events_are<const N: usize>(&mut self, events: [TreeEvent; N]) {
            let actual: Vec<_> = self.tree.data.0.drain(..).collect();
            pretty_assertions::assert_eq!(events.to_vec(), actual);
        }

        fn clear_events(&mut self) { self.tree.data.0.clear(); }
    }

    #[derive(Clone, PartialEq, Debug)]
    enum TreeEvent {
        AddedToForest(NodeId),
        AddedToParent(NodeId),
        RemovingFromParent(NodeId, NodeId),
        RemovedFromForest(NodeId),
    }
    use TreeEvent::*;

    struct Events(Vec<TreeEvent>);

    impl Observer for Events {
        fn added_to_forest(&mut self, _map: &NodeMap, node: NodeId) {
            self.0.push(AddedToForest(node))
        }

        fn added_to_parent(&mut self, _map: &NodeMap, node: NodeId) {
            self.0.push(AddedToParent(node))
        }

        fn removing_from_parent(&mut self, map: &NodeMap, node: NodeId) {
            let parent =
                node.parent(map).expect("removing_from_parent called on node without parent");
            self.0.push(RemovingFromParent(node, parent))
        }

        fn removed_from_forest(&mut self, _map: &NodeMap, node: NodeId) {
            self.0.push(RemovedFromForest(node))
        }
    }

    #[test]
    fn iterator() {
        let t = TestTree::new();
        assert_eq!([t.child1, t.child2, t.child3], *t.get_children(t.root));
        assert!(t.get_children(t.child1).is_empty());
        assert_eq!([t.gc1], *t.get_children(t.child2));
        assert!(t.get_children(t.other_root).is_empty());
        let rev: Vec<_> = t.root.children(&t.tree.map).rev().collect();
        assert_eq!([t.child3, t.child2, t.child1], *rev);
    }

    #[test]
    fn ancestors() {
        let t = TestTree::new();
        let ancestors = |node: NodeId| node.ancestors(&t.tree.map).collect::<Vec<_>>();
        assert_eq!([t.child1, t.root], *ancestors(t.child1));
        assert_eq!([t.gc1, t.child2, t.root], *ancestors(t.gc1));
        assert_eq!([t.root], *ancestors(t.root));
        assert_eq!([t.other_root], *ancestors(t.other_root));
    }

    #[test]
    fn traverse_postorder() {
        let t = TestTree::new();
        let traverse = |node: NodeId| node.traverse_postorder(&t.tree.map).collect::<Vec<_>>();
        assert_eq!([t.child1, t.gc1, t.child2, t.child3, t.root], *traverse(t.root));
        assert_eq!([t.child1], *traverse(t.child1));
    }

    #[test]
    fn traverse_preorder() {
        let t = TestTree::new();
        let traverse = |node: NodeId| node.traverse_preorder(&t.tree.map).collect::<Vec<_>>();
        assert_eq!([t.root, t.child1, t.child2, t.gc1, t.child3], *traverse(t.root));
        assert_eq!([t.child1], *traverse(t.child1));
    }

    #[test]
    fn siblings_and_positions() {
        let t = TestTree::new();
        let map = &t.tree.map;
        assert_eq!(t.child2.index_in_parent(map), Some(1));
        assert_eq!(t.child2.prev_sibling(map), Some(t.child1));
        assert_eq!(t.child2.next_sibling(map), Some(t.child3));
        assert_eq!(t.child1.prev_sibling(map), None);
        assert_eq!(t.child3.next_sibling(map), None);
        assert_eq!(t.root.index_in_parent(map), None);
        assert_eq!(t.root.first_child(map), Some(t.child1));
        assert_eq!(t.root.last_child(map), Some(t.child3));
    }

    #[test]
    fn push_back() {
        let mut t = TestTree::new();
        let child4 = t.tree.mk_node().push_back(t.root);
        t.assert_events_are([AddedToForest(child4), AddedToParent(child4)]);
        let gc2 = t.tree.mk_node().push_back(t.child2);
        t.assert_children_are([t.child1, t.child2, t.child3, child4], t.root);
        t.assert_children_are([t.gc1, gc2], t.child2);
    }

    #[test]
    fn insert_at_clamps_index() {
        let mut t = TestTree::new();
        let first = t.tree.mk_node().insert_at(t.root, 0);
        let last = t.tree.mk_node().insert_at(t.root, 99);
        t.assert_children_are([first, t.child1, t.child2, t.child3, last], t.root);
    }

    #[test]
    fn remove() {
        let mut t = TestTree::new();

        t.child2.detach(&mut t.tree).remove();
        t.assert_children_are([t.child1, t.child3], t.root);
        assert!(!t.tree.map.contains(t.child2));
        assert!(!t.tree.map.contains(t.gc1));
        t.assert_events_are([
            RemovingFromParent(t.child2, t.root),
            RemovedFromForest(t.gc1),
            RemovedFromForest(t.child2),
        ]);

        t.root.remove_root(&mut t.tree);
        assert!(!t.tree.map.contains(t.root));
        assert!(!t.tree.map.contains(t.child1));
        assert!(t.tree.map.contains(t.other_root));
    }

    #[test]
    fn detach_and_reattach() {
        let mut t = TestTree::new();

        t.child1.detach(&mut t.tree).insert_after(t.child2);
        t.assert_children_are([t.child2, t.child1, t.child3], t.root);

        t.child1.detach(&mut t.tree).insert_before(t.child2);
        t.assert_children_are([t.child1, t.child2, t.child3], t.root);

        t.clear_events();
        t.child3.detach(&mut t.tree).push_back(t.child2);
        t.assert_children_are([t.child1, t.child2], t.root);
        t.assert_children_are([t.gc1, t.child3], t.child2);
        t.assert_events_are([RemovingFromParent(t.child3, t.root), AddedToParent(t.child3)]);
    }

    #[test]
    fn replace_takes_position_and_detaches_old() {
        let mut t = TestTree::new();
        t.gc1.detach(&mut t.tree).replace(t.child2);
        t.assert_children_are([t.child1, t.gc1, t.child3], t.root);
        assert_eq!(t.child2.parent(&t.tree.map), None);
        assert!(t.tree.map.contains(t.child2));
        t.child2.remove_root(&mut t.tree);
    }

    #[test]
    fn into_root_keeps_subtree() {
        let mut t = TestTree::new();
        let id = t.child2.detach(&mut t.tree).into_root();
        assert_eq!(id.parent(&t.tree.map), None);
        t.assert_children_are([t.gc1], t.child2);
        t.assert_children_are([t.child1, t.child3], t.root);
    }

    #[test]
    fn self_link_prevention() {
        let mut t = TestTree::new();
        let root = t.root.detach(&mut t.tree).push_back(t.root);
        assert_eq!(root, t.root);
        t.assert_children_are([t.child1, t.child2, t.child3], t.root);
        assert_eq!(t.root.parent(&t.tree.map), None);
    }

    #[test]
    fn clone_is_independent() {
        let t = TestTree::new();
        let mut copy = t.tree.map.clone();
        copy.unlink(t.child1);
        assert_eq!(t.child1.parent(&t.tree.map), Some(t.root));
        assert_eq!(t.child1.parent(&copy), None);
    }

    #[test]
    fn remove_root_fails_on_non_root() {
        let mut t = TestTree::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            t.child1.remove_root(&mut t.tree);
        }));
        assert!(result.is_err());
    }
}
