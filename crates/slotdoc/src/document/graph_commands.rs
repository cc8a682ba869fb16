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

//! Commands on the observed graph.

use std::rc::Rc;

use super::Document;
use crate::{
    DetachOutcome, GraphError, NodeId, Operation, Raw, RawNode, Result, Shape,
    Value,
};

impl Document {
    /// Observe a host object. Nodes created for it are announced to other
    /// replicas but are not part of history: undo never deletes a node.
    ///
    /// The node stays reclaimable by
    /// [`collect_garbage`](Self::collect_garbage) until it is linked under
    /// another node or attached.
    pub fn observe(&mut self, raw: &Rc<RawNode>) -> Result<NodeId> {
        let mut created = Vec::new();
        let id = self.graph.observe_logged(raw, &mut created);
        self.announce(created);
        Ok(id?)
    }

    pub fn observe_value(&mut self, raw: &Raw) -> Result<Value> {
        let mut created = Vec::new();
        let value = self.graph.observe_value_logged(raw, &mut created);
        self.announce(created);
        Ok(value?)
    }

    fn announce(&mut self, created: Vec<(NodeId, Shape)>) {
        for (node, shape) in created {
            self.emit(Operation::CreateNode { node, shape });
        }
    }

    /// Set `key` of a record node.
    pub fn set(&mut self, node: NodeId, key: &str, value: Value) -> Result<()> {
        self.execute(Operation::Set {
            node,
            key: key.to_owned(),
            value,
        })
    }

    /// Observe `raw` and set it as `key` of a record node.
    pub fn set_raw(&mut self, node: NodeId, key: &str, raw: &Raw) -> Result<()> {
        let value = self.observe_value(raw)?;
        self.set(node, key, value)
    }

    /// Remove `key` from a record node. Removing an absent key changes
    /// nothing and records nothing.
    pub fn remove(&mut self, node: NodeId, key: &str) -> Result<()> {
        match self.graph.shape(node)? {
            Shape::Record(fields) if !fields.contains_key(key) => {
                return Ok(())
            }
            _ => {}
        }
        self.execute(Operation::Remove {
            node,
            key: key.to_owned(),
        })
    }

    pub fn splice(
        &mut self,
        node: NodeId,
        index: usize,
        delete: usize,
        insert: Vec<Value>,
    ) -> Result<()> {
        self.execute(Operation::Splice {
            node,
            index,
            delete,
            insert,
        })
    }

    /// Append to a list node.
    pub fn push(&mut self, node: NodeId, value: Value) -> Result<()> {
        let index = match self.graph.shape(node)? {
            Shape::List(items) => items.len(),
            Shape::Record(_) => {
                return Err(GraphError::NotAList(node).into())
            }
        };
        self.splice(node, index, 0, vec![value])
    }

    /// Hold `node` on behalf of the host. Host edges are local: they are
    /// neither recorded nor sent.
    pub fn attach(&mut self, node: NodeId) -> Result<()> {
        Ok(self.graph.attach(node)?)
    }

    /// Release one host edge of `node`. Never fails.
    pub fn detach(&mut self, node: NodeId) -> DetachOutcome {
        self.graph.detach(node)
    }

    /// Run `callback` once when `node` loses its last parent edge.
    pub fn add_detach_callback(
        &mut self,
        node: NodeId,
        callback: impl FnOnce(NodeId) + 'static,
    ) -> Result<()> {
        Ok(self.graph.add_detach_callback(node, callback)?)
    }

    /// Clear the dirty flag of `node` once the host has processed it.
    pub fn clean(&mut self, node: NodeId) -> Result<()> {
        Ok(self.graph.clean(node)?)
    }
}
