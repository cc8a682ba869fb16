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

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Identifies a node of an [`ObservedGraph`](super::ObservedGraph).
///
/// Ids are allocated monotonically and never reused, so replicas applying
/// the same operations allocate the same ids.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A value stored in an observed node: a scalar or an edge to a child node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Node(NodeId),
}

impl Value {
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

/// The content of an observed node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Record(BTreeMap<String, Value>),
    List(Vec<Value>),
}

impl Shape {
    pub fn empty_record() -> Self {
        Self::Record(BTreeMap::new())
    }

    pub fn empty_list() -> Self {
        Self::List(Vec::new())
    }

    /// Child node ids, once per edge.
    pub fn children(&self) -> Vec<NodeId> {
        let values: Box<dyn Iterator<Item = &Value>> = match self {
            Self::Record(fields) => Box::new(fields.values()),
            Self::List(items) => Box::new(items.iter()),
        };
        values.filter_map(Value::as_node).collect()
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Record(fields) => fields.len(),
            Self::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Host data that has not been observed yet.
///
/// Objects are shared through `Rc`, and the pointer is their identity:
/// observing the same `Rc` twice yields the same node.
#[derive(Clone, Debug, PartialEq)]
pub enum Raw {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Node(Rc<RawNode>),
}

#[derive(Debug, PartialEq)]
pub enum RawNode {
    Record(Vec<(String, Raw)>),
    List(Vec<Raw>),
}

impl RawNode {
    pub fn record<K: Into<String>>(
        fields: impl IntoIterator<Item = (K, Raw)>,
    ) -> Rc<Self> {
        Rc::new(Self::Record(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn list(items: impl IntoIterator<Item = Raw>) -> Rc<Self> {
        Rc::new(Self::List(items.into_iter().collect()))
    }
}

impl From<Rc<RawNode>> for Raw {
    fn from(node: Rc<RawNode>) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for Raw {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<f64> for Raw {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for Raw {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<serde_json::Value> for Raw {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match value {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Self::String(s),
            Json::Array(items) => {
                Self::Node(RawNode::list(items.into_iter().map(Raw::from)))
            }
            Json::Object(fields) => Self::Node(RawNode::record(
                fields.into_iter().map(|(k, v)| (k, Raw::from(v))),
            )),
        }
    }
}
