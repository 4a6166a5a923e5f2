//! EntitySet - entities plus the parent→child relationship graph.
//!
//! The graph is a directed acyclic multigraph: nodes are entities (in
//! registration order), edges point from a parent to a child and carry the
//! [`Relationship`] that links them.
//!
//! The module is organized into submodules:
//! - `path`: ancestors, descendants and relationship chains

mod path;


use std::collections::HashMap;
use std::fmt;

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DfsError, DfsResult};
use crate::model::{Entity, EntityOptions, Table};

pub use path::{PathDirection, RelationshipPath};

/// A one-to-many link: every child row points at one parent row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    pub parent_entity: String,
    pub parent_key: String,
    pub child_entity: String,
    pub child_key: String,
}

impl Relationship {
    pub fn new(
        parent_entity: impl Into<String>,
        parent_key: impl Into<String>,
        child_entity: impl Into<String>,
        child_key: impl Into<String>,
    ) -> Self {
        Self {
            parent_entity: parent_entity.into(),
            parent_key: parent_key.into(),
            child_entity: child_entity.into(),
            child_key: child_key.into(),
        }
    }

    /// How the child side is written inside aggregate feature names.
    ///
    /// Plain entity name when both keys share a name, otherwise
    /// `child[child_key]` so parallel relationships stay distinct.
    pub fn child_label(&self) -> String {
        if self.child_key == self.parent_key {
            self.child_entity.clone()
        } else {
            format!("{}[{}]", self.child_entity, self.child_key)
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.parent_entity, self.parent_key, self.child_entity, self.child_key
        )
    }
}

/// A node in the entity graph.
#[derive(Debug, Clone)]
pub(crate) struct EntityNode {
    pub name: String,
}

/// A collection of entities and the relationships between them.
#[derive(Debug, Clone)]
pub struct EntitySet {
    id: String,

    /// Entities in registration order
    entities: Vec<Entity>,

    /// Relationships in registration order
    relationships: Vec<Relationship>,

    /// Parent → child graph for reachability queries
    pub(crate) graph: DiGraph<EntityNode, Relationship>,

    /// Mapping from entity name to node index (also the position in `entities`)
    pub(crate) node_indices: HashMap<String, NodeIndex>,
}

impl EntitySet {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entities: Vec::new(),
            relationships: Vec::new(),
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Register a table as an entity.
    ///
    /// Fails with a schema error if the index is missing, null or not unique,
    /// if declared types conflict with the data, or if the name is taken.
    pub fn register_entity(
        &mut self,
        name: impl Into<String>,
        table: Table,
        options: EntityOptions,
    ) -> DfsResult<&Entity> {
        let name = name.into();
        if self.node_indices.contains_key(&name) {
            return Err(DfsError::schema(&name, "entity already registered"));
        }

        let entity = Entity::new(name.clone(), table, options)?;
        debug!(
            entity = %name,
            rows = entity.num_rows(),
            columns = entity.columns().len(),
            "registered entity"
        );

        let idx = self.graph.add_node(EntityNode { name: name.clone() });
        self.node_indices.insert(name, idx);
        self.entities.push(entity);
        Ok(&self.entities[idx.index()])
    }

    /// Builder-style variant of [`EntitySet::register_entity`].
    pub fn with_entity(
        mut self,
        name: impl Into<String>,
        table: Table,
        options: EntityOptions,
    ) -> DfsResult<Self> {
        self.register_entity(name, table, options)?;
        Ok(self)
    }

    /// Link a parent entity to a child entity.
    ///
    /// Fails if the key types differ, the parent key is not unique, the
    /// relationship already exists, or the edge would close a cycle.
    pub fn add_relationship(
        &mut self,
        parent: &str,
        parent_key: &str,
        child: &str,
        child_key: &str,
    ) -> DfsResult<&Relationship> {
        let parent_idx = self.node_index(parent)?;
        let child_idx = self.node_index(child)?;

        if parent_idx == child_idx {
            return Err(DfsError::relationship(
                parent,
                child,
                "an entity cannot be its own parent",
            ));
        }

        let parent_entity = &self.entities[parent_idx.index()];
        let child_entity = &self.entities[child_idx.index()];

        let parent_type = parent_entity.column_type(parent_key).ok_or_else(|| {
            DfsError::relationship(
                parent,
                child,
                format!("parent key '{}' not found", parent_key),
            )
        })?;
        let child_type = child_entity.column_type(child_key).ok_or_else(|| {
            DfsError::relationship(
                parent,
                child,
                format!("child key '{}' not found", child_key),
            )
        })?;

        if parent_type != child_type {
            return Err(DfsError::relationship(
                parent,
                child,
                format!(
                    "key types differ: {}.{} is {}, {}.{} is {}",
                    parent, parent_key, parent_type, child, child_key, child_type
                ),
            ));
        }

        if !parent_entity.is_unique(parent_key)? {
            return Err(DfsError::relationship(
                parent,
                child,
                format!("parent key '{}' is not unique", parent_key),
            ));
        }

        let relationship = Relationship::new(parent, parent_key, child, child_key);
        if self.relationships.contains(&relationship) {
            return Err(DfsError::relationship(
                parent,
                child,
                "relationship already exists",
            ));
        }

        if has_path_connecting(&self.graph, child_idx, parent_idx, None) {
            return Err(DfsError::relationship(
                parent,
                child,
                format!("'{}' is already an ancestor of '{}' (cycle)", child, parent),
            ));
        }

        debug!(relationship = %relationship, "added relationship");
        self.graph
            .add_edge(parent_idx, child_idx, relationship.clone());
        self.relationships.push(relationship);
        Ok(&self.relationships[self.relationships.len() - 1])
    }

    /// Builder-style variant of [`EntitySet::add_relationship`].
    pub fn with_relationship(
        mut self,
        parent: &str,
        parent_key: &str,
        child: &str,
        child_key: &str,
    ) -> DfsResult<Self> {
        self.add_relationship(parent, parent_key, child, child_key)?;
        Ok(self)
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.node_indices
            .get(name)
            .map(|idx| &self.entities[idx.index()])
    }

    /// Like [`EntitySet::entity`], but an error when the entity is unknown.
    pub fn require_entity(&self, name: &str) -> DfsResult<&Entity> {
        self.entity(name)
            .ok_or_else(|| DfsError::UnknownEntity(name.to_string()))
    }

    pub fn has_entity(&self, name: &str) -> bool {
        self.node_indices.contains_key(name)
    }

    /// Entities in registration order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Relationships in registration order.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn has_relationship(&self, relationship: &Relationship) -> bool {
        self.relationships.contains(relationship)
    }

    /// Relationships where `entity` is the parent, in registration order.
    pub fn children_of(&self, entity: &str) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| r.parent_entity == entity)
            .collect()
    }

    /// Relationships where `entity` is the child, in registration order.
    pub fn parents_of(&self, entity: &str) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| r.child_entity == entity)
            .collect()
    }

    /// Relationships directly linking `parent` to `child`.
    pub fn relationships_between(&self, parent: &str, child: &str) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| r.parent_entity == parent && r.child_entity == child)
            .collect()
    }

    /// Columns of `entity` used as an index or a relationship key.
    pub fn key_columns(&self, entity: &str) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        if let Some(e) = self.entity(entity) {
            keys.push(e.index());
        }
        for rel in &self.relationships {
            if rel.parent_entity == entity && !keys.contains(&rel.parent_key.as_str()) {
                keys.push(&rel.parent_key);
            }
            if rel.child_entity == entity && !keys.contains(&rel.child_key.as_str()) {
                keys.push(&rel.child_key);
            }
        }
        keys
    }

    pub(crate) fn node_index(&self, name: &str) -> DfsResult<NodeIndex> {
        self.node_indices
            .get(name)
            .copied()
            .ok_or_else(|| DfsError::UnknownEntity(name.to_string()))
    }
}

impl fmt::Display for EntitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Entityset: {}", self.id)?;
        writeln!(f, "  Entities:")?;
        for entity in &self.entities {
            writeln!(
                f,
                "    {} [Rows: {}, Columns: {}]",
                entity.name(),
                entity.num_rows(),
                entity.columns().len()
            )?;
        }
        writeln!(f, "  Relationships:")?;
        for rel in &self.relationships {
            writeln!(f, "    {}", rel)?;
        }
        Ok(())
    }
}
