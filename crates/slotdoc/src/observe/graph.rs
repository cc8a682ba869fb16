// Copyright 2026 The Matrix.org Foundation C.I.C.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

use serde_json::json;

use super::marker::DetachCallback;
use super::notify::NotificationQueue;
use super::{
    ChangeMarker, DetachOutcome, NodeId, Notification, Notifications, Parent,
    Raw, RawNode, Shape, Value,
};
use crate::GraphError;

#[derive(Debug)]
struct Node {
    shape: Shape,
    marker: ChangeMarker,
}

/// Arena of observed nodes.
///
/// Every node carries a [`ChangeMarker`]. Mutating a node marks it and all
/// of its ancestors dirty, and a node that loses its last parent edge is
/// detached, firing its callbacks once. Detached nodes stay in the arena
/// until [`reclaim`](Self::reclaim) frees them.
#[derive(Debug)]
pub struct ObservedGraph {
    nodes: BTreeMap<NodeId, Node>,
    next_id: u64,
    /// Observed host objects. The `Rc` is kept so that the address cannot be
    /// reused by another object while the entry exists.
    identities: HashMap<*const RawNode, (Rc<RawNode>, NodeId)>,
    roots: BTreeSet<NodeId>,
    queue: NotificationQueue,
}

impl ObservedGraph {
    pub fn new(notification_capacity: usize) -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_id: 0,
            identities: HashMap::new(),
            roots: BTreeSet::new(),
            queue: NotificationQueue::new(notification_capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// The id the next created node will get.
    pub fn next_id(&self) -> NodeId {
        NodeId(self.next_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Shape)> {
        self.nodes.iter().map(|(id, node)| (*id, &node.shape))
    }

    pub fn get(&self, id: NodeId) -> Option<&Shape> {
        self.nodes.get(&id).map(|n| &n.shape)
    }

    pub fn shape(&self, id: NodeId) -> Result<&Shape, GraphError> {
        self.node(id).map(|n| &n.shape)
    }

    pub fn marker(&self, id: NodeId) -> Result<&ChangeMarker, GraphError> {
        self.node(id).map(|n| &n.marker)
    }

    pub fn is_dirty(&self, id: NodeId) -> Result<bool, GraphError> {
        self.marker(id).map(ChangeMarker::is_dirty)
    }

    pub fn is_detached(&self, id: NodeId) -> Result<bool, GraphError> {
        self.marker(id).map(ChangeMarker::is_detached)
    }

    pub fn parent_count(&self, id: NodeId) -> Result<usize, GraphError> {
        self.marker(id).map(ChangeMarker::parent_count)
    }

    // ===================================================================
    // Creation
    // ===================================================================

    /// Create a node with `shape`. Every node referenced by `shape` must
    /// exist.
    pub fn create(&mut self, shape: Shape) -> Result<NodeId, GraphError> {
        self.check_children(&shape)?;
        let id = NodeId(self.next_id);
        self.insert_node(id, shape)?;
        Ok(id)
    }

    /// Create a node with a given id, as a replica replaying another
    /// replica's operations does. Ids at or below one already handed out
    /// are refused, even if that node has since been reclaimed.
    pub fn create_at(
        &mut self,
        id: NodeId,
        shape: Shape,
    ) -> Result<(), GraphError> {
        if id.0 < self.next_id {
            return Err(GraphError::NodeExists(id));
        }
        self.check_children(&shape)?;
        self.insert_node(id, shape)
    }

    /// Observe a host object, returning its node. Observing the same `Rc`
    /// again returns the same node, and objects shared between several
    /// parents become one node with several parent edges.
    ///
    /// A new node has no parent edge until it is linked or attached, and is
    /// reclaimable until then.
    pub fn observe(&mut self, raw: &Rc<RawNode>) -> Result<NodeId, GraphError> {
        self.observe_logged(raw, &mut Vec::new())
    }

    /// Observe a host value: objects become node edges, scalars are copied.
    pub fn observe_value(&mut self, raw: &Raw) -> Result<Value, GraphError> {
        self.observe_value_logged(raw, &mut Vec::new())
    }

    /// [`observe`](Self::observe), recording every node it creates, children
    /// first.
    pub(crate) fn observe_logged(
        &mut self,
        raw: &Rc<RawNode>,
        created: &mut Vec<(NodeId, Shape)>,
    ) -> Result<NodeId, GraphError> {
        let key = Rc::as_ptr(raw);
        if let Some((_, id)) = self.identities.get(&key) {
            return Ok(*id);
        }
        let shape = match raw.as_ref() {
            RawNode::Record(fields) => Shape::Record(
                fields
                    .iter()
                    .map(|(k, v)| -> Result<(String, Value), GraphError> {
                        Ok((k.clone(), self.observe_value_logged(v, created)?))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            RawNode::List(items) => Shape::List(
                items
                    .iter()
                    .map(|v| self.observe_value_logged(v, created))
                    .collect::<Result<_, _>>()?,
            ),
        };
        let id = NodeId(self.next_id);
        self.insert_node(id, shape.clone())?;
        created.push((id, shape));
        self.identities.insert(key, (Rc::clone(raw), id));
        Ok(id)
    }

    pub(crate) fn observe_value_logged(
        &mut self,
        raw: &Raw,
        created: &mut Vec<(NodeId, Shape)>,
    ) -> Result<Value, GraphError> {
        Ok(match raw {
            Raw::Null => Value::Null,
            Raw::Bool(b) => Value::Bool(*b),
            Raw::Number(n) => Value::Number(*n),
            Raw::String(s) => Value::String(s.clone()),
            Raw::Node(node) => Value::Node(self.observe_logged(node, created)?),
        })
    }

    fn insert_node(&mut self, id: NodeId, shape: Shape) -> Result<(), GraphError> {
        let next_id = id.0.checked_add(1).ok_or(GraphError::IdsExhausted(id))?;
        for child in shape.children() {
            self.add_edge(child, Parent::Node(id));
        }
        self.nodes.insert(
            id,
            Node {
                shape,
                marker: ChangeMarker::default(),
            },
        );
        self.next_id = next_id;
        log::trace!("created node {id}");
        Ok(())
    }

    // ===================================================================
    // Mutation
    // ===================================================================

    /// Set `key` of a record node, returning the previous value.
    pub fn set(
        &mut self,
        node: NodeId,
        key: &str,
        value: Value,
    ) -> Result<Option<Value>, GraphError> {
        self.check_value(&value)?;
        let added = value.as_node();
        let previous = self.record_mut(node)?.insert(key.to_owned(), value);
        let removed = previous.as_ref().and_then(Value::as_node);
        self.relink(node, added.into_iter(), removed.into_iter());
        self.mark_changed(node);
        Ok(previous)
    }

    /// Remove `key` from a record node, returning the removed value.
    pub fn remove(
        &mut self,
        node: NodeId,
        key: &str,
    ) -> Result<Option<Value>, GraphError> {
        let previous = self.record_mut(node)?.remove(key);
        if let Some(previous) = &previous {
            self.relink(node, None.into_iter(), previous.as_node().into_iter());
            self.mark_changed(node);
        }
        Ok(previous)
    }

    /// Replace `delete` items of a list node starting at `index` with
    /// `insert`, returning the removed items.
    pub fn splice(
        &mut self,
        node: NodeId,
        index: usize,
        delete: usize,
        insert: Vec<Value>,
    ) -> Result<Vec<Value>, GraphError> {
        for value in &insert {
            self.check_value(value)?;
        }
        let added: Vec<NodeId> =
            insert.iter().filter_map(Value::as_node).collect();
        let items = self.list_mut(node)?;
        let len = items.len();
        if index > len || delete > len - index {
            return Err(GraphError::IndexOutOfBounds {
                node,
                index,
                delete,
                len,
            });
        }
        let removed: Vec<Value> =
            items.splice(index..index + delete, insert).collect();
        let removed_ids: Vec<NodeId> =
            removed.iter().filter_map(Value::as_node).collect();
        self.relink(node, added.into_iter(), removed_ids.into_iter());
        self.mark_changed(node);
        Ok(removed)
    }

    /// Append to a list node, returning the new item's index.
    pub fn push(
        &mut self,
        node: NodeId,
        value: Value,
    ) -> Result<usize, GraphError> {
        let index = match self.shape(node)? {
            Shape::List(items) => items.len(),
            Shape::Record(_) => return Err(GraphError::NotAList(node)),
        };
        self.splice(node, index, 0, vec![value])?;
        Ok(index)
    }

    // ===================================================================
    // Attachment and detachment
    // ===================================================================

    /// Add a host edge to `node`, keeping it attached.
    pub fn attach(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.node(node)?;
        self.add_edge(node, Parent::Host);
        Ok(())
    }

    /// Remove one host edge from `node`.
    ///
    /// Never fails: detaching an unknown or already detached node, or one
    /// the host does not hold, changes nothing.
    pub fn detach(&mut self, node: NodeId) -> DetachOutcome {
        let Some(marker) = self.nodes.get(&node).map(|n| &n.marker) else {
            log::warn!("ignoring detach of unknown node {node}");
            return DetachOutcome::AlreadyDetached;
        };
        if marker.is_detached() {
            log::debug!("node {node} is already detached");
            return DetachOutcome::AlreadyDetached;
        }
        if !marker.has_host_edge() {
            log::warn!("ignoring detach of node {node}: the host holds no edge to it");
            return DetachOutcome::NoHostEdge;
        }
        if self.remove_edge(node, Parent::Host) {
            DetachOutcome::Detached
        } else {
            DetachOutcome::Remaining(
                self.nodes.get(&node).map_or(0, |n| n.marker.parent_count()),
            )
        }
    }

    /// Register a one-shot callback fired when `node` loses its last parent
    /// edge. A callback added to a node that is already detached never
    /// fires.
    pub fn add_detach_callback(
        &mut self,
        node: NodeId,
        callback: impl FnOnce(NodeId) + 'static,
    ) -> Result<(), GraphError> {
        let callback: DetachCallback = Box::new(callback);
        self.node_mut(node)?.marker.add_callback(callback);
        Ok(())
    }

    /// Mark `node` as a root: roots are never reclaimed.
    pub fn set_root(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.node(node)?;
        self.roots.insert(node);
        Ok(())
    }

    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.roots.iter().copied()
    }

    // ===================================================================
    // Dirty tracking and notifications
    // ===================================================================

    pub fn clean(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.node_mut(node)?.marker.clean();
        Ok(())
    }

    pub fn clean_all(&mut self) {
        for node in self.nodes.values_mut() {
            node.marker.clean();
        }
    }

    pub fn drain_notifications(&mut self) -> Notifications {
        self.queue.drain()
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        self.queue.push(notification);
    }

    // ===================================================================
    // Reclamation
    // ===================================================================

    /// Free every node without parent edges that is neither a root nor
    /// `pinned`, cascading into children that lose their last edge as a
    /// result. This covers detached nodes as well as observed nodes that
    /// were never linked. Returns the freed ids, which are never handed out
    /// again.
    pub fn reclaim(&mut self, pinned: &BTreeSet<NodeId>) -> Vec<NodeId> {
        let mut freed = Vec::new();
        loop {
            let doomed: Vec<NodeId> = self
                .nodes
                .iter()
                .filter(|&(id, node)| {
                    node.marker.parent_count() == 0
                        && !self.roots.contains(id)
                        && !pinned.contains(id)
                })
                .map(|(id, _)| *id)
                .collect();
            if doomed.is_empty() {
                break;
            }
            for id in doomed {
                if let Some(node) = self.nodes.remove(&id) {
                    for child in node.shape.children() {
                        self.remove_edge(child, Parent::Node(id));
                    }
                    freed.push(id);
                }
            }
        }
        if !freed.is_empty() {
            let gone: BTreeSet<NodeId> = freed.iter().copied().collect();
            self.identities.retain(|_, (_, id)| !gone.contains(id));
            log::debug!("reclaimed {} detached nodes", freed.len());
        }
        freed
    }

    /// Render `node` and everything below it as JSON.
    pub fn to_json(&self, node: NodeId) -> Result<serde_json::Value, GraphError> {
        self.to_json_within(node, &mut BTreeSet::new())
    }

    fn to_json_within(
        &self,
        node: NodeId,
        path: &mut BTreeSet<NodeId>,
    ) -> Result<serde_json::Value, GraphError> {
        if !path.insert(node) {
            return Ok(json!({ "$ref": node.0 }));
        }
        let rendered = match self.shape(node)? {
            Shape::Record(fields) => {
                let mut map = serde_json::Map::new();
                for (key, value) in fields {
                    map.insert(key.clone(), self.value_to_json(value, path)?);
                }
                serde_json::Value::Object(map)
            }
            Shape::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|v| self.value_to_json(v, path))
                    .collect::<Result<_, _>>()?,
            ),
        };
        path.remove(&node);
        Ok(rendered)
    }

    fn value_to_json(
        &self,
        value: &Value,
        path: &mut BTreeSet<NodeId>,
    ) -> Result<serde_json::Value, GraphError> {
        Ok(match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => json!(b),
            Value::Number(n) => json!(n),
            Value::String(s) => json!(s),
            Value::Node(id) => self.to_json_within(*id, path)?,
        })
    }

    // ===================================================================
    // Internals
    // ===================================================================

    fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes.get_mut(&id).ok_or(GraphError::UnknownNode(id))
    }

    fn record_mut(
        &mut self,
        id: NodeId,
    ) -> Result<&mut BTreeMap<String, Value>, GraphError> {
        match &mut self.node_mut(id)?.shape {
            Shape::Record(fields) => Ok(fields),
            Shape::List(_) => Err(GraphError::NotARecord(id)),
        }
    }

    fn list_mut(&mut self, id: NodeId) -> Result<&mut Vec<Value>, GraphError> {
        match &mut self.node_mut(id)?.shape {
            Shape::List(items) => Ok(items),
            Shape::Record(_) => Err(GraphError::NotAList(id)),
        }
    }

    fn check_value(&self, value: &Value) -> Result<(), GraphError> {
        match value.as_node() {
            Some(child) => self.node(child).map(|_| ()),
            None => Ok(()),
        }
    }

    fn check_children(&self, shape: &Shape) -> Result<(), GraphError> {
        for child in shape.children() {
            self.node(child)?;
        }
        Ok(())
    }

    /// New edges are added before old ones are removed, so a child that
    /// moves within the same parent never detaches.
    fn relink(
        &mut self,
        parent: NodeId,
        added: impl Iterator<Item = NodeId>,
        removed: impl Iterator<Item = NodeId>,
    ) {
        for child in added {
            self.add_edge(child, Parent::Node(parent));
        }
        for child in removed {
            self.remove_edge(child, Parent::Node(parent));
        }
    }

    fn add_edge(&mut self, child: NodeId, parent: Parent) {
        if let Some(node) = self.nodes.get_mut(&child) {
            node.marker.add_parent(parent);
        }
    }

    /// Returns whether this removed the child's last edge.
    fn remove_edge(&mut self, child: NodeId, parent: Parent) -> bool {
        let callbacks = self
            .nodes
            .get_mut(&child)
            .and_then(|node| node.marker.remove_parent(parent));
        let Some(callbacks) = callbacks else {
            return false;
        };
        log::debug!("node {child} detached");
        self.queue.push(Notification::Detached(child));
        for callback in callbacks {
            callback(child);
        }
        true
    }

    /// Mark `node` changed and every ancestor dirty, visiting each node
    /// once.
    fn mark_changed(&mut self, node: NodeId) {
        self.queue.push(Notification::Changed(node));
        let mut visited = BTreeSet::from([node]);
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            let Some(current) = self.nodes.get_mut(&id) else {
                continue;
            };
            current.marker.mark_dirty();
            let parents: Vec<NodeId> = current.marker.parent_nodes().collect();
            if id != node {
                self.queue.push(Notification::Dirty(id));
            }
            for parent in parents {
                if visited.insert(parent) {
                    pending.push(parent);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;

    fn graph() -> ObservedGraph {
        ObservedGraph::new(64)
    }

    fn counter() -> Rc<Cell<u32>> {
        Rc::new(Cell::new(0))
    }

    fn count_into(count: &Rc<Cell<u32>>) -> impl FnOnce(NodeId) + 'static {
        let count = Rc::clone(count);
        move |_| count.set(count.get() + 1)
    }

    /// `root -> {left, right} -> shared`
    fn diamond(graph: &mut ObservedGraph) -> (NodeId, NodeId, NodeId, NodeId) {
        let shared = RawNode::record([("v", Raw::from(1.0))]);
        let left = RawNode::record([("child", Raw::from(Rc::clone(&shared)))]);
        let right = RawNode::record([("child", Raw::from(Rc::clone(&shared)))]);
        let root = RawNode::record([
            ("left", Raw::from(Rc::clone(&left))),
            ("right", Raw::from(Rc::clone(&right))),
        ]);
        let root_id = graph.observe(&root).unwrap();
        let left_id = graph.observe(&left).unwrap();
        let right_id = graph.observe(&right).unwrap();
        let shared_id = graph.observe(&shared).unwrap();
        graph.attach(root_id).unwrap();
        graph.set_root(root_id).unwrap();
        (root_id, left_id, right_id, shared_id)
    }

    // ===================================================================
    // Observation
    // ===================================================================

    #[test]
    fn observing_the_same_object_twice_yields_one_node() {
        let mut graph = graph();
        let raw = RawNode::list([Raw::from("a")]);
        let first = graph.observe(&raw).unwrap();
        let second = graph.observe(&raw).unwrap();
        assert_eq!(first, second);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn shared_children_get_one_edge_per_parent() {
        let mut graph = graph();
        let (_, _, _, shared) = diamond(&mut graph);
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.parent_count(shared).unwrap(), 2);
    }

    #[test]
    fn children_are_created_before_parents() {
        let mut graph = graph();
        let mut created = Vec::new();
        let raw = RawNode::record([("inner", Raw::from(RawNode::list([])))]);
        let outer = graph.observe_logged(&raw, &mut created).unwrap();
        let ids: Vec<NodeId> = created.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![NodeId(0), outer]);
    }

    #[test]
    fn graph_renders_to_json() {
        let mut graph = graph();
        let raw = Raw::from(json!({"title": "x", "tags": ["a", true]}));
        let Value::Node(id) = graph.observe_value(&raw).unwrap() else {
            panic!("expected a node");
        };
        assert_eq!(
            graph.to_json(id).unwrap(),
            json!({"title": "x", "tags": ["a", true]})
        );
    }

    // ===================================================================
    // Mutation and dirty propagation
    // ===================================================================

    #[test]
    fn mutation_dirties_every_ancestor_on_every_path() {
        let mut graph = graph();
        let (root, left, right, shared) = diamond(&mut graph);
        graph.clean_all();
        graph.drain_notifications();

        graph.set(shared, "v", Value::from(2.0)).unwrap();

        for id in [root, left, right, shared] {
            assert!(graph.is_dirty(id).unwrap(), "{id} should be dirty");
        }
        let notifications = graph.drain_notifications().items;
        assert!(notifications.contains(&Notification::Changed(shared)));
        let root_count = notifications
            .iter()
            .filter(|n| **n == Notification::Dirty(root))
            .count();
        assert_eq!(root_count, 1);
    }

    #[test]
    fn setting_a_record_field_returns_the_previous_value() {
        let mut graph = graph();
        let id = graph.create(Shape::empty_record()).unwrap();
        assert_eq!(graph.set(id, "k", Value::from("a")).unwrap(), None);
        assert_eq!(
            graph.set(id, "k", Value::from("b")).unwrap(),
            Some(Value::from("a"))
        );
        assert_eq!(graph.remove(id, "k").unwrap(), Some(Value::from("b")));
        assert_eq!(graph.remove(id, "k").unwrap(), None);
    }

    #[test]
    fn shape_mismatches_are_errors() {
        let mut graph = graph();
        let list = graph.create(Shape::empty_list()).unwrap();
        let record = graph.create(Shape::empty_record()).unwrap();
        assert_eq!(
            graph.set(list, "k", Value::Null),
            Err(GraphError::NotARecord(list))
        );
        assert_eq!(
            graph.push(record, Value::Null),
            Err(GraphError::NotAList(record))
        );
        assert_eq!(
            graph.set(NodeId(99), "k", Value::Null),
            Err(GraphError::UnknownNode(NodeId(99)))
        );
    }

    #[test]
    fn splicing_out_of_bounds_fails() {
        let mut graph = graph();
        let list = graph
            .create(Shape::List(vec![Value::from(1.0), Value::from(2.0)]))
            .unwrap();
        assert!(matches!(
            graph.splice(list, 1, 2, vec![]),
            Err(GraphError::IndexOutOfBounds { len: 2, .. })
        ));
        assert_eq!(
            graph.splice(list, 1, 1, vec![Value::from(3.0)]).unwrap(),
            vec![Value::from(2.0)]
        );
        assert_eq!(graph.push(list, Value::from(4.0)).unwrap(), 2);
    }

    #[test]
    fn edges_to_unknown_nodes_are_refused() {
        let mut graph = graph();
        let list = graph.create(Shape::empty_list()).unwrap();
        assert_eq!(
            graph.push(list, Value::Node(NodeId(42))),
            Err(GraphError::UnknownNode(NodeId(42)))
        );
    }

    // ===================================================================
    // Detachment
    // ===================================================================

    #[test]
    fn node_with_two_parents_detaches_on_the_last_edge_only() {
        let mut graph = graph();
        let (_, left, right, shared) = diamond(&mut graph);
        let count = counter();
        graph
            .add_detach_callback(shared, count_into(&count))
            .unwrap();

        graph.remove(left, "child").unwrap();
        assert_eq!(count.get(), 0);
        assert!(!graph.is_detached(shared).unwrap());

        graph.remove(right, "child").unwrap();
        assert_eq!(count.get(), 1);
        assert!(graph.is_detached(shared).unwrap());
    }

    #[test]
    fn detaching_twice_fires_once() {
        let mut graph = graph();
        let id = graph.create(Shape::empty_record()).unwrap();
        graph.attach(id).unwrap();
        let count = counter();
        graph.add_detach_callback(id, count_into(&count)).unwrap();

        assert_eq!(graph.detach(id), DetachOutcome::Detached);
        assert_eq!(graph.detach(id), DetachOutcome::AlreadyDetached);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn callback_added_after_detach_does_not_fire() {
        let mut graph = graph();
        let id = graph.create(Shape::empty_record()).unwrap();
        graph.attach(id).unwrap();
        graph.detach(id);
        let count = counter();
        graph.add_detach_callback(id, count_into(&count)).unwrap();
        graph.detach(id);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn detach_without_a_host_edge_is_ignored() {
        let mut graph = graph();
        let (_, _, _, shared) = diamond(&mut graph);
        assert_eq!(graph.detach(shared), DetachOutcome::NoHostEdge);
        assert_eq!(graph.detach(NodeId(1000)), DetachOutcome::AlreadyDetached);
    }

    #[test]
    fn moving_a_child_within_a_list_keeps_it_attached() {
        let mut graph = graph();
        let child = graph.create(Shape::empty_record()).unwrap();
        let list = graph
            .create(Shape::List(vec![Value::Node(child)]))
            .unwrap();
        let count = counter();
        graph.add_detach_callback(child, count_into(&count)).unwrap();
        graph
            .splice(list, 0, 1, vec![Value::Null, Value::Node(child)])
            .unwrap();
        assert_eq!(count.get(), 0);
        assert_eq!(graph.parent_count(child).unwrap(), 1);
    }

    // ===================================================================
    // Reclamation
    // ===================================================================

    #[test]
    fn reclaim_frees_detached_subtrees() {
        let mut graph = graph();
        let (root, left, _, shared) = diamond(&mut graph);
        graph.remove(root, "left").unwrap();
        let freed = graph.reclaim(&BTreeSet::new());
        assert_eq!(freed, vec![left]);
        assert!(graph.contains(shared));
        assert_eq!(graph.parent_count(shared).unwrap(), 1);
    }

    #[test]
    fn reclaim_cascades_and_respects_pins() {
        let mut graph = graph();
        let (root, left, right, shared) = diamond(&mut graph);
        graph.remove(root, "left").unwrap();
        graph.remove(root, "right").unwrap();

        let pinned = BTreeSet::from([right]);
        let freed = graph.reclaim(&pinned);
        assert_eq!(freed, vec![left]);
        assert!(graph.contains(shared));

        let freed = graph.reclaim(&BTreeSet::new());
        assert_eq!(freed, vec![right, shared]);
        assert!(graph.contains(root));
    }

    #[test]
    fn reclaimed_ids_are_never_reused() {
        let mut graph = graph();
        let id = graph.create(Shape::empty_record()).unwrap();
        graph.attach(id).unwrap();
        graph.detach(id);
        graph.reclaim(&BTreeSet::new());
        let next = graph.create(Shape::empty_record()).unwrap();
        assert_ne!(next, id);
        assert_eq!(
            graph.create_at(id, Shape::empty_record()),
            Err(GraphError::NodeExists(id))
        );
    }

    #[test]
    fn observed_nodes_never_linked_are_reclaimed() {
        let mut graph = graph();
        let raw = RawNode::record([("inner", Raw::from(RawNode::list([])))]);
        let outer = graph.observe(&raw).unwrap();
        assert!(!graph.is_detached(outer).unwrap());
        assert_eq!(graph.parent_count(outer).unwrap(), 0);

        let freed = graph.reclaim(&BTreeSet::new());
        assert_eq!(freed, vec![outer, NodeId(0)]);
        assert!(graph.is_empty());

        let again = graph.observe(&raw).unwrap();
        assert_ne!(again, outer);
    }

    #[test]
    fn attached_nodes_without_parents_are_kept() {
        let mut graph = graph();
        let id = graph.create(Shape::empty_record()).unwrap();
        graph.attach(id).unwrap();
        assert!(graph.reclaim(&BTreeSet::new()).is_empty());
        assert!(graph.contains(id));
    }

    // ===================================================================
    // Id allocation
    // ===================================================================

    #[test]
    fn the_last_id_cannot_be_taken() {
        let mut graph = graph();
        let last = NodeId(u64::MAX);
        assert_eq!(
            graph.create_at(last, Shape::empty_record()),
            Err(GraphError::IdsExhausted(last))
        );
        assert!(!graph.contains(last));
        assert_eq!(graph.next_id(), NodeId(0));

        graph
            .create_at(NodeId(u64::MAX - 1), Shape::empty_list())
            .unwrap();
        assert_eq!(
            graph.create(Shape::empty_record()),
            Err(GraphError::IdsExhausted(last))
        );
        assert_eq!(
            graph.observe(&RawNode::list([])),
            Err(GraphError::IdsExhausted(last))
        );
        assert_eq!(graph.len(), 1);
    }
}
