//! Graph queries for EntitySet: ancestors, descendants and relationship chains.

use petgraph::graph::NodeIndex;
use petgraph::visit::{Bfs, EdgeRef, Reversed};
use petgraph::Direction;

use super::{EntitySet, Relationship};
use crate::error::{DfsError, DfsResult};

/// Which way a path walks the parent → child edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathDirection {
    /// From an ancestor down to a descendant.
    Forward,
    /// From a descendant up to an ancestor.
    Backward,
}

/// A chain of relationships between two entities.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipPath {
    pub direction: PathDirection,
    /// Relationships in walk order, starting at the `from` entity.
    pub relationships: Vec<Relationship>,
}

impl RelationshipPath {
    /// A one-hop downward path.
    pub fn single(relationship: Relationship) -> Self {
        Self {
            direction: PathDirection::Forward,
            relationships: vec![relationship],
        }
    }

    /// Entity the walk starts from.
    pub fn start(&self) -> Option<&str> {
        let rel = self.relationships.first()?;
        Some(match self.direction {
            PathDirection::Forward => &rel.parent_entity,
            PathDirection::Backward => &rel.child_entity,
        })
    }

    /// Entity the walk ends at.
    pub fn end(&self) -> Option<&str> {
        let rel = self.relationships.last()?;
        Some(match self.direction {
            PathDirection::Forward => &rel.child_entity,
            PathDirection::Backward => &rel.parent_entity,
        })
    }

    /// Entities visited, including both ends.
    pub fn entities(&self) -> Vec<&str> {
        let mut result: Vec<&str> = Vec::new();
        for rel in &self.relationships {
            let (from, to) = match self.direction {
                PathDirection::Forward => (&rel.parent_entity, &rel.child_entity),
                PathDirection::Backward => (&rel.child_entity, &rel.parent_entity),
            };
            if result.last().copied() != Some(from.as_str()) {
                result.push(from);
            }
            result.push(to);
        }
        result
    }

    /// Number of hops.
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }
}

impl EntitySet {
    /// Entities reachable by walking child → parent edges.
    pub fn ancestors(&self, entity: &str) -> DfsResult<Vec<&str>> {
        let start = self.node_index(entity)?;
        let reversed = Reversed(&self.graph);
        let mut bfs = Bfs::new(reversed, start);
        let mut found = Vec::new();
        while let Some(idx) = bfs.next(reversed) {
            if idx != start {
                found.push(idx);
            }
        }
        Ok(self.names_in_registration_order(found))
    }

    /// Entities reachable by walking parent → child edges.
    pub fn descendants(&self, entity: &str) -> DfsResult<Vec<&str>> {
        let start = self.node_index(entity)?;
        let mut bfs = Bfs::new(&self.graph, start);
        let mut found = Vec::new();
        while let Some(idx) = bfs.next(&self.graph) {
            if idx != start {
                found.push(idx);
            }
        }
        Ok(self.names_in_registration_order(found))
    }

    /// The unique relationship chain between two entities.
    ///
    /// Walks downward from `from` to `to` first, then upward. Fails with
    /// `NoPath` when no chain exists or when several do: multiple chains
    /// between the same pair would make resolution ambiguous.
    pub fn path(&self, from: &str, to: &str) -> DfsResult<RelationshipPath> {
        let from_idx = self.node_index(from)?;
        let to_idx = self.node_index(to)?;

        if from_idx == to_idx {
            return Ok(RelationshipPath {
                direction: PathDirection::Forward,
                relationships: vec![],
            });
        }

        let no_path = || DfsError::NoPath {
            from: from.into(),
            to: to.into(),
        };

        let forward = self.all_chains(from_idx, to_idx);
        let (direction, mut chains) = if !forward.is_empty() {
            (PathDirection::Forward, forward)
        } else {
            let mut backward = self.all_chains(to_idx, from_idx);
            for chain in &mut backward {
                chain.reverse();
            }
            (PathDirection::Backward, backward)
        };

        if chains.len() != 1 {
            return Err(no_path());
        }

        let relationships = chains
            .pop()
            .ok_or_else(no_path)?
            .into_iter()
            .cloned()
            .collect();
        Ok(RelationshipPath {
            direction,
            relationships,
        })
    }

    /// Check if a directed chain exists between two entities (either way).
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        self.path(from, to).is_ok()
    }

    /// Every directed chain from `from` down to `to`.
    ///
    /// The graph is acyclic, so the depth-first walk terminates without a
    /// visited set.
    fn all_chains(&self, from: NodeIndex, to: NodeIndex) -> Vec<Vec<&Relationship>> {
        let mut results = Vec::new();
        let mut stack: Vec<(NodeIndex, Vec<&Relationship>)> = vec![(from, vec![])];

        while let Some((current, chain)) = stack.pop() {
            for edge in self.graph.edges_directed(current, Direction::Outgoing) {
                let mut next = chain.clone();
                next.push(edge.weight());
                if edge.target() == to {
                    results.push(next);
                } else {
                    stack.push((edge.target(), next));
                }
            }
        }

        results
    }

    fn names_in_registration_order(&self, mut nodes: Vec<NodeIndex>) -> Vec<&str> {
        nodes.sort();
        nodes
            .into_iter()
            .map(|idx| self.graph[idx].name.as_str())
            .collect()
    }
}
