//! Name-based construction of features against an EntitySet and a registry.

use super::Feature;
use crate::entityset::{EntitySet, PathDirection, Relationship, RelationshipPath};
use crate::error::{DfsError, DfsResult};
use crate::primitives::PrimitiveRegistry;

/// Builds validated features by entity, column and primitive name.
///
/// ```ignore
/// let fb = FeatureBuilder::new(&set, &registry);
/// let amount = fb.identity("loans", "loan_amount")?;
/// let mean = fb.aggregate("mean", "clients", "loans", Some(amount))?;
/// assert_eq!(mean.name(), "MEAN(loans.loan_amount)");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FeatureBuilder<'a> {
    set: &'a EntitySet,
    registry: &'a PrimitiveRegistry,
}

impl<'a> FeatureBuilder<'a> {
    pub fn new(set: &'a EntitySet, registry: &'a PrimitiveRegistry) -> Self {
        Self { set, registry }
    }

    pub fn identity(&self, entity: &str, column: &str) -> DfsResult<Feature> {
        Feature::identity(self.set.require_entity(entity)?, column)
    }

    pub fn transform(&self, primitive: &str, inputs: Vec<Feature>) -> DfsResult<Feature> {
        let primitive = self.registry.transform(primitive)?;
        let feature = Feature::transform(primitive, inputs)?;
        feature.validate(self.set)?;
        Ok(feature)
    }

    /// Aggregate `child` rows onto `parent`.
    ///
    /// Uses the first registered relationship between the two when one
    /// exists, otherwise the unique downward chain through intermediate
    /// entities.
    pub fn aggregate(
        &self,
        primitive: &str,
        parent: &str,
        child: &str,
        base: Option<Feature>,
    ) -> DfsResult<Feature> {
        self.set.require_entity(parent)?;
        self.set.require_entity(child)?;
        if let Some(relationship) = self.set.relationships_between(parent, child).first() {
            return self.aggregate_via(primitive, relationship, base);
        }

        let path = self.set.path(parent, child)?;
        if path.direction != PathDirection::Forward {
            return Err(DfsError::NoPath {
                from: parent.to_string(),
                to: child.to_string(),
            });
        }
        self.aggregate_along(primitive, path, base)
    }

    /// Aggregate over an explicit relationship.
    pub fn aggregate_via(
        &self,
        primitive: &str,
        relationship: &Relationship,
        base: Option<Feature>,
    ) -> DfsResult<Feature> {
        let primitive = self.registry.aggregation(primitive)?;
        let feature = Feature::aggregate(primitive, relationship.clone(), base)?;
        feature.validate(self.set)?;
        Ok(feature)
    }

    /// Aggregate along an explicit downward path.
    pub fn aggregate_along(
        &self,
        primitive: &str,
        path: RelationshipPath,
        base: Option<Feature>,
    ) -> DfsResult<Feature> {
        let primitive = self.registry.aggregation(primitive)?;
        let feature = Feature::aggregate_along(primitive, path, base)?;
        feature.validate(self.set)?;
        Ok(feature)
    }

    /// `COUNT(child)` rooted at `parent`.
    pub fn count(&self, parent: &str, child: &str) -> DfsResult<Feature> {
        self.aggregate("count", parent, child, None)
    }
}
