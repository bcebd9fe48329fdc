// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use super::Value;

/// A node, as carried by the `Node` structure (signature `0x4E`).
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Node {
    pub id: i64,
    pub labels: Vec<String>,
    pub properties: HashMap<String, Value>,
    /// Present when the server sent the 4-field variant; older servers that
    /// only send `(id, labels, properties)` leave this empty.
    pub element_id: String,
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Node(labels={:?}, element_id={}, properties={:?})",
            self.labels, self.element_id, self.properties
        )
    }
}

/// A relationship bound to its endpoints, as carried by the `Relationship`
/// structure (signature `0x52`).
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Relationship {
    pub id: i64,
    pub start_node_id: i64,
    pub end_node_id: i64,
    pub type_: String,
    pub properties: HashMap<String, Value>,
    pub element_id: String,
    pub start_node_element_id: String,
    pub end_node_element_id: String,
}

impl Display for Relationship {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Relationship(type={}, element_id={}, properties={:?})",
            self.type_, self.element_id, self.properties
        )
    }
}

/// A relationship without its endpoints, as it appears embedded in a `Path`
/// structure (signature `0x72`, lower-case `r`).
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct UnboundRelationship {
    pub id: i64,
    pub type_: String,
    pub properties: HashMap<String, Value>,
    pub element_id: String,
}

/// A path through the graph, as carried by the `Path` structure (signature
/// `0x50`).
///
/// It's not recommended to access the fields directly; use [`Path::traverse`]
/// instead, since the `indices` encoding is non-obvious: per the Bolt
/// structure semantics, each pair of entries alternates a 1-based,
/// sign-carrying relationship index (negative means traversed against its
/// natural direction) and a 0-based node index into `nodes`.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub nodes: Vec<Node>,
    pub relationships: Vec<UnboundRelationship>,
    pub indices: Vec<i64>,
}

/// One step of a traversed [`Path`]: a relationship and the node it leads to.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment<'a> {
    pub relationship: &'a UnboundRelationship,
    pub forward: bool,
    pub end_node: &'a Node,
}

#[derive(Debug, thiserror::Error)]
#[error("path structure violates its invariants: {0}")]
pub struct PathInvariantError(String);

impl Path {
    pub(crate) fn new(
        nodes: Vec<Node>,
        relationships: Vec<UnboundRelationship>,
        indices: Vec<i64>,
    ) -> Result<Self, PathInvariantError> {
        let path = Self {
            nodes,
            relationships,
            indices,
        };
        path.verify_invariants()?;
        Ok(path)
    }

    fn verify_invariants(&self) -> Result<(), PathInvariantError> {
        if self.indices.len() % 2 != 0 {
            return Err(PathInvariantError(format!(
                "indices must come in (rel, node) pairs, got {} entries",
                self.indices.len()
            )));
        }
        for pair in self.indices.chunks(2) {
            let rel_idx = pair[0];
            let node_idx = pair[1];
            if rel_idx == 0 {
                return Err(PathInvariantError(
                    "relationship index must never be 0 (it's 1-based and signed)".into(),
                ));
            }
            let rel_pos = rel_idx.unsigned_abs() as usize - 1;
            if rel_pos >= self.relationships.len() {
                return Err(PathInvariantError(format!(
                    "relationship index {rel_idx} out of bounds for {} relationships",
                    self.relationships.len()
                )));
            }
            if node_idx < 0 || node_idx as usize >= self.nodes.len() {
                return Err(PathInvariantError(format!(
                    "node index {node_idx} out of bounds for {} nodes",
                    self.nodes.len()
                )));
            }
        }
        Ok(())
    }

    /// Walks the path from its first node, yielding one [`PathSegment`] per
    /// traversed relationship.
    pub fn traverse(&self) -> impl Iterator<Item = PathSegment<'_>> {
        self.indices.chunks(2).map(move |pair| {
            let rel_idx = pair[0];
            let node_idx = pair[1] as usize;
            let forward = rel_idx > 0;
            let rel_pos = rel_idx.unsigned_abs() as usize - 1;
            PathSegment {
                relationship: &self.relationships[rel_pos],
                forward,
                end_node: &self.nodes[node_idx],
            }
        })
    }

    pub fn start_node(&self) -> Option<&Node> {
        self.nodes.first()
    }
}
