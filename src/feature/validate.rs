//! Structural validation of feature trees against an EntitySet.

use super::{Feature, FeatureKind};
use crate::entityset::{EntitySet, PathDirection};
use crate::error::{DfsError, DfsResult};
use crate::primitives::{aggregation_output, transform_output};

impl Feature {
    /// Check that this feature can be computed on `set`.
    ///
    /// Verifies that every aggregation walks registered relationships
    /// downward from the node's entity to its base's entity, that primitive
    /// arities and input types match, and that no aggregation chain visits
    /// the same entity twice.
    pub fn validate(&self, set: &EntitySet) -> DfsResult<()> {
        let mut chain = vec![self.entity.clone()];
        self.validate_inner(set, &mut chain)
    }

    fn validate_inner(&self, set: &EntitySet, chain: &mut Vec<String>) -> DfsResult<()> {
        let entity = set.require_entity(&self.entity)?;

        match &self.kind {
            FeatureKind::Identity { column } => {
                let col = entity.require_column(column)?;
                if col.semantic_type != self.output_type {
                    return Err(DfsError::invalid_feature(
                        &self.name,
                        format!(
                            "column '{}.{}' is {}, feature expects {}",
                            self.entity, column, col.semantic_type, self.output_type
                        ),
                    ));
                }
            }
            FeatureKind::Transform { primitive, inputs } => {
                let types: Vec<_> = inputs.iter().map(|f| f.output_type).collect();
                transform_output(primitive.as_ref(), &types)?;
                for input in inputs {
                    if input.entity != self.entity {
                        return Err(DfsError::invalid_feature(
                            &self.name,
                            format!("input '{}' lives on '{}'", input.name, input.entity),
                        ));
                    }
                    input.validate_inner(set, chain)?;
                }
            }
            FeatureKind::Aggregate {
                primitive,
                path,
                base,
            } => {
                if path.direction != PathDirection::Forward || path.is_empty() {
                    return Err(DfsError::invalid_feature(
                        &self.name,
                        "aggregation path must walk down at least one relationship",
                    ));
                }

                let mut parent = self.entity.as_str();
                for relationship in &path.relationships {
                    if !set.has_relationship(relationship) {
                        return Err(DfsError::invalid_feature(
                            &self.name,
                            format!("relationship {} is not registered", relationship),
                        ));
                    }
                    if relationship.parent_entity != parent {
                        return Err(DfsError::invalid_feature(
                            &self.name,
                            format!(
                                "relationship parent is '{}', expected '{}'",
                                relationship.parent_entity, parent
                            ),
                        ));
                    }
                    parent = relationship.child_entity.as_str();
                }
                aggregation_output(primitive.as_ref(), base.as_ref().map(|b| b.output_type))?;

                let entities = path.entities();
                let visited = &entities[1..];
                if let Some(again) = visited
                    .iter()
                    .find(|e| chain.iter().any(|c| c.as_str() == **e))
                {
                    return Err(DfsError::invalid_feature(
                        &self.name,
                        format!("aggregation chain visits '{}' twice", again),
                    ));
                }

                if let Some(base) = base {
                    if base.entity != parent {
                        return Err(DfsError::invalid_feature(
                            &self.name,
                            format!(
                                "base '{}' lives on '{}', path ends at '{}'",
                                base.name, base.entity, parent
                            ),
                        ));
                    }
                    let mark = chain.len();
                    chain.extend(visited.iter().map(|e| e.to_string()));
                    let result = base.validate_inner(set, chain);
                    chain.truncate(mark);
                    result?;
                }
            }
        }

        Ok(())
    }
}
