//! Feature definitions - composable, typed trees describing one output column.
//!
//! A feature is one of:
//! - **Identity**: a raw column of an entity (depth 0)
//! - **Transform**: a transformation primitive over features of the same entity
//! - **Aggregate**: an aggregation primitive over a feature of a descendant
//!   entity, grouped through a downward relationship path (usually one hop)
//!
//! Features are immutable values. The canonical name is computed once at
//! construction and is a pure function of the structure, so two features
//! built along different traversal orders share a name whenever they share
//! primitives and operands.

mod builder;
mod validate;

use std::fmt;
use std::sync::Arc;

use crate::entityset::{PathDirection, Relationship, RelationshipPath};
use crate::error::{DfsError, DfsResult};
use crate::model::{Entity, SemanticType};
use crate::primitives::{
    aggregation_output, transform_output, AggregationPrimitive, TransformPrimitive,
};

pub use builder::FeatureBuilder;

/// The node type of a feature tree.
#[derive(Debug, Clone)]
pub enum FeatureKind {
    Identity {
        column: String,
    },
    Transform {
        primitive: Arc<dyn TransformPrimitive>,
        inputs: Vec<Feature>,
    },
    Aggregate {
        primitive: Arc<dyn AggregationPrimitive>,
        /// Downward path from the feature's entity to the base's entity.
        path: RelationshipPath,
        /// Feature on the path's last entity; `None` for row-counting primitives.
        base: Option<Box<Feature>>,
    },
}

/// A feature definition rooted at one entity.
#[derive(Debug, Clone)]
pub struct Feature {
    entity: String,
    kind: FeatureKind,
    output_type: SemanticType,
    depth: usize,
    name: String,
}

impl Feature {
    /// A raw column of an entity.
    pub fn identity(entity: &Entity, column: &str) -> DfsResult<Feature> {
        let col = entity.require_column(column)?;
        Ok(Feature {
            entity: entity.name().to_string(),
            kind: FeatureKind::Identity {
                column: column.to_string(),
            },
            output_type: col.semantic_type,
            depth: 0,
            name: column.to_string(),
        })
    }

    /// Apply a transformation primitive to features of one entity.
    pub fn transform(
        primitive: Arc<dyn TransformPrimitive>,
        inputs: Vec<Feature>,
    ) -> DfsResult<Feature> {
        let prim_name = primitive.name().to_uppercase();
        let first = inputs.first().ok_or_else(|| {
            DfsError::invalid_feature(&prim_name, "transformation needs at least one input")
        })?;
        let entity = first.entity.clone();
        if let Some(other) = inputs.iter().find(|f| f.entity != entity) {
            return Err(DfsError::invalid_feature(
                &prim_name,
                format!(
                    "inputs span entities '{}' and '{}'; transformations are same-entity only",
                    entity, other.entity
                ),
            ));
        }

        let types: Vec<SemanticType> = inputs.iter().map(|f| f.output_type).collect();
        let output_type = transform_output(primitive.as_ref(), &types)?;
        let depth = 1 + inputs.iter().map(|f| f.depth).max().unwrap_or(0);
        let name = transform_name(primitive.as_ref(), &inputs);

        Ok(Feature {
            entity,
            kind: FeatureKind::Transform { primitive, inputs },
            output_type,
            depth,
            name,
        })
    }

    /// Aggregate a child feature across a relationship.
    ///
    /// The result lives on the relationship's parent entity.
    pub fn aggregate(
        primitive: Arc<dyn AggregationPrimitive>,
        relationship: Relationship,
        base: Option<Feature>,
    ) -> DfsResult<Feature> {
        Self::aggregate_along(primitive, RelationshipPath::single(relationship), base)
    }

    /// Aggregate a descendant feature along a downward relationship path.
    ///
    /// Rows of the path's last entity are grouped onto the first entity
    /// through every intermediate hop.
    pub fn aggregate_along(
        primitive: Arc<dyn AggregationPrimitive>,
        path: RelationshipPath,
        base: Option<Feature>,
    ) -> DfsResult<Feature> {
        let prim_name = primitive.name().to_uppercase();
        let (Some(start), Some(end)) = (path.start(), path.end()) else {
            return Err(DfsError::invalid_feature(
                &prim_name,
                "aggregation needs at least one relationship",
            ));
        };
        if path.direction != PathDirection::Forward {
            return Err(DfsError::invalid_feature(
                &prim_name,
                format!("'{}' is not a descendant of '{}'", end, start),
            ));
        }
        let entity = start.to_string();

        if let Some(base) = &base {
            if base.entity != end {
                return Err(DfsError::invalid_feature(
                    aggregate_name(primitive.as_ref(), &path, Some(base)),
                    format!(
                        "base feature lives on '{}', path ends at '{}'",
                        base.entity, end
                    ),
                ));
            }
        }

        let output_type =
            aggregation_output(primitive.as_ref(), base.as_ref().map(|b| b.output_type))?;
        let depth = 1 + base.as_ref().map(|b| b.depth).unwrap_or(0);
        let name = aggregate_name(primitive.as_ref(), &path, base.as_ref());

        Ok(Feature {
            entity,
            kind: FeatureKind::Aggregate {
                primitive,
                path,
                base: base.map(Box::new),
            },
            output_type,
            depth,
            name,
        })
    }

    /// Canonical name, also the output column label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entity the feature produces one value per row for.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn kind(&self) -> &FeatureKind {
        &self.kind
    }

    pub fn output_type(&self) -> SemanticType {
        self.output_type
    }

    /// Number of stacked primitives (0 for identity).
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_identity(&self) -> bool {
        matches!(self.kind, FeatureKind::Identity { .. })
    }

    /// Name of the primitive at the root of this feature, if any.
    pub fn primitive_name(&self) -> Option<&str> {
        match &self.kind {
            FeatureKind::Identity { .. } => None,
            FeatureKind::Transform { primitive, .. } => Some(primitive.name()),
            FeatureKind::Aggregate { primitive, .. } => Some(primitive.name()),
        }
    }

    /// Direct child features.
    pub fn dependencies(&self) -> Vec<&Feature> {
        match &self.kind {
            FeatureKind::Identity { .. } => vec![],
            FeatureKind::Transform { inputs, .. } => inputs.iter().collect(),
            FeatureKind::Aggregate { base, .. } => base.iter().map(|b| b.as_ref()).collect(),
        }
    }

    /// Memoization key: canonical names are unique within one entity.
    pub(crate) fn memo_key(&self) -> (String, String) {
        (self.entity.clone(), self.name.clone())
    }
}

impl PartialEq for Feature {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity && self.name == other.name
    }
}

impl Eq for Feature {}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn transform_name(primitive: &dyn TransformPrimitive, inputs: &[Feature]) -> String {
    let mut operands: Vec<&str> = inputs.iter().map(|f| f.name.as_str()).collect();
    if primitive.commutative() {
        operands.sort_unstable();
    }
    format!(
        "{}({})",
        primitive.name().to_uppercase(),
        operands.join(", ")
    )
}

/// The label is the last hop's child, so a multi-hop aggregation reads the
/// same as a direct one: `MEAN(payments.payment_amount)`.
fn aggregate_name(
    primitive: &dyn AggregationPrimitive,
    path: &RelationshipPath,
    base: Option<&Feature>,
) -> String {
    let label = path
        .relationships
        .last()
        .map(Relationship::child_label)
        .unwrap_or_default();
    match base {
        Some(base) => format!(
            "{}({}.{})",
            primitive.name().to_uppercase(),
            label,
            base.name
        ),
        None => format!("{}({})", primitive.name().to_uppercase(), label),
    }
}
