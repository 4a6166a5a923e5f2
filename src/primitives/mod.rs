//! Feature primitives and the registry that catalogs them.
//!
//! Two kinds of primitive exist:
//! - **Aggregation**: many child values → one value per parent row.
//! - **Transformation**: one or more columns of the same entity → a new
//!   column, computed row by row.
//!
//! Every primitive declares which semantic types each input accepts. The
//! registry keeps primitives in registration order, which is also the order
//! synthesis expands them in.

pub mod aggregation;
pub mod transform;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{DfsError, DfsResult};
use crate::model::{SemanticType, Value};

/// Set of semantic types accepted by one primitive input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSet(pub &'static [SemanticType]);

impl TypeSet {
    pub const ANY: TypeSet = TypeSet(&SemanticType::ALL);
    pub const NUMERIC: TypeSet = TypeSet(&[SemanticType::Numeric]);
    pub const DATETIME: TypeSet = TypeSet(&[SemanticType::Datetime]);
    /// Boolean or categorical: anything with a truth value.
    pub const DISCRETE: TypeSet = TypeSet(&[SemanticType::Boolean, SemanticType::Categorical]);

    pub fn accepts(&self, ty: SemanticType) -> bool {
        self.0.contains(&ty)
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|t| t.as_str()).collect();
        write!(f, "{}", names.join(" or "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Aggregation,
    Transformation,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveKind::Aggregation => write!(f, "aggregation"),
            PrimitiveKind::Transformation => write!(f, "transformation"),
        }
    }
}

/// Groups child values per parent row and reduces them to one value.
pub trait AggregationPrimitive: fmt::Debug + Send + Sync {
    /// Lowercase primitive name, e.g. `mean`.
    fn name(&self) -> &str;

    /// Accepted input type, or `None` for primitives that only count rows.
    fn input_type(&self) -> Option<TypeSet>;

    /// Output type given the input type (`None` for row-counting primitives).
    fn output_type(&self, input: Option<SemanticType>) -> SemanticType;

    /// Reduce the values of one non-empty group.
    ///
    /// Values arrive ordered by the child's time index (then row order), or
    /// by row order when the child has no time index.
    fn aggregate(&self, values: &[Value]) -> Value;

    /// Result for a parent with no visible child rows.
    fn default_value(&self) -> Value {
        Value::Null
    }

    /// Whether the primitive takes a base feature.
    fn uses_base(&self) -> bool {
        self.input_type().is_some()
    }
}

/// Computes a new column from columns of the same entity, row by row.
pub trait TransformPrimitive: fmt::Debug + Send + Sync {
    /// Lowercase primitive name, e.g. `month`.
    fn name(&self) -> &str;

    /// Accepted type per input; the length is the arity.
    fn input_types(&self) -> &[TypeSet];

    fn output_type(&self, inputs: &[SemanticType]) -> SemanticType;

    /// Operand order does not matter (`add`, `multiply`).
    fn commutative(&self) -> bool {
        false
    }

    /// Compute one output value per row. All inputs have the same length.
    fn apply(&self, inputs: &[&[Value]]) -> Vec<Value>;

    fn arity(&self) -> usize {
        self.input_types().len()
    }
}

/// Summary of a registered primitive, as returned by [`PrimitiveRegistry::list`].
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveInfo {
    pub name: String,
    pub kind: PrimitiveKind,
    pub input_types: Vec<TypeSet>,
}

impl PrimitiveInfo {
    pub fn arity(&self) -> usize {
        self.input_types.len()
    }
}

/// Catalog of aggregation and transformation primitives.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveRegistry {
    aggregations: Vec<Arc<dyn AggregationPrimitive>>,
    transforms: Vec<Arc<dyn TransformPrimitive>>,
}

impl PrimitiveRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in primitive.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for prim in aggregation::builtins() {
            registry.aggregations.push(prim);
        }
        for prim in transform::builtins() {
            registry.transforms.push(prim);
        }
        registry
    }

    pub fn register_aggregation(
        &mut self,
        primitive: impl AggregationPrimitive + 'static,
    ) -> DfsResult<()> {
        let name = normalize(primitive.name());
        if self.find_aggregation(&name).is_some() {
            return Err(DfsError::DuplicatePrimitive {
                kind: PrimitiveKind::Aggregation.to_string(),
                name,
            });
        }
        self.aggregations.push(Arc::new(primitive));
        Ok(())
    }

    pub fn register_transform(
        &mut self,
        primitive: impl TransformPrimitive + 'static,
    ) -> DfsResult<()> {
        let name = normalize(primitive.name());
        if self.find_transform(&name).is_some() {
            return Err(DfsError::DuplicatePrimitive {
                kind: PrimitiveKind::Transformation.to_string(),
                name,
            });
        }
        self.transforms.push(Arc::new(primitive));
        Ok(())
    }

    /// Look up an aggregation primitive by name (case-insensitive).
    pub fn aggregation(&self, name: &str) -> DfsResult<Arc<dyn AggregationPrimitive>> {
        self.find_aggregation(&normalize(name))
            .ok_or_else(|| DfsError::UnknownPrimitive(name.to_string()))
    }

    /// Look up a transformation primitive by name (case-insensitive).
    pub fn transform(&self, name: &str) -> DfsResult<Arc<dyn TransformPrimitive>> {
        self.find_transform(&normalize(name))
            .ok_or_else(|| DfsError::UnknownPrimitive(name.to_string()))
    }

    pub fn aggregations(&self) -> &[Arc<dyn AggregationPrimitive>] {
        &self.aggregations
    }

    pub fn transforms(&self) -> &[Arc<dyn TransformPrimitive>] {
        &self.transforms
    }

    /// All registered primitives in registration order, optionally filtered.
    pub fn list(&self, kind: Option<PrimitiveKind>) -> Vec<PrimitiveInfo> {
        let mut infos = Vec::new();
        if kind != Some(PrimitiveKind::Transformation) {
            infos.extend(self.aggregations.iter().map(|p| PrimitiveInfo {
                name: normalize(p.name()),
                kind: PrimitiveKind::Aggregation,
                input_types: p.input_type().into_iter().collect(),
            }));
        }
        if kind != Some(PrimitiveKind::Aggregation) {
            infos.extend(self.transforms.iter().map(|p| PrimitiveInfo {
                name: normalize(p.name()),
                kind: PrimitiveKind::Transformation,
                input_types: p.input_types().to_vec(),
            }));
        }
        infos
    }

    /// Resolve a selection of aggregation names; `None` selects all.
    ///
    /// The result is in registration order whatever order the names come in.
    pub fn select_aggregations(
        &self,
        names: Option<&[String]>,
    ) -> DfsResult<Vec<Arc<dyn AggregationPrimitive>>> {
        let Some(names) = names else {
            return Ok(self.aggregations.clone());
        };
        let wanted = resolve_names(names, |n| self.find_aggregation(n).is_some())?;
        Ok(self
            .aggregations
            .iter()
            .filter(|p| wanted.contains(&normalize(p.name())))
            .cloned()
            .collect())
    }

    /// Resolve a selection of transformation names; `None` selects all.
    pub fn select_transforms(
        &self,
        names: Option<&[String]>,
    ) -> DfsResult<Vec<Arc<dyn TransformPrimitive>>> {
        let Some(names) = names else {
            return Ok(self.transforms.clone());
        };
        let wanted = resolve_names(names, |n| self.find_transform(n).is_some())?;
        Ok(self
            .transforms
            .iter()
            .filter(|p| wanted.contains(&normalize(p.name())))
            .cloned()
            .collect())
    }

    fn find_aggregation(&self, normalized: &str) -> Option<Arc<dyn AggregationPrimitive>> {
        self.aggregations
            .iter()
            .find(|p| normalize(p.name()) == normalized)
            .cloned()
    }

    fn find_transform(&self, normalized: &str) -> Option<Arc<dyn TransformPrimitive>> {
        self.transforms
            .iter()
            .find(|p| normalize(p.name()) == normalized)
            .cloned()
    }
}

/// Check an aggregation against its input type and return the output type.
pub fn aggregation_output(
    primitive: &dyn AggregationPrimitive,
    input: Option<SemanticType>,
) -> DfsResult<SemanticType> {
    match (primitive.input_type(), input) {
        (Some(accepted), Some(ty)) if !accepted.accepts(ty) => Err(DfsError::TypeMismatch {
            primitive: normalize(primitive.name()),
            expected: accepted.to_string(),
            found: ty,
        }),
        (Some(_), None) => Err(DfsError::invalid_feature(
            primitive.name().to_uppercase(),
            "aggregation needs a base feature",
        )),
        (None, Some(_)) => Err(DfsError::invalid_feature(
            primitive.name().to_uppercase(),
            "aggregation takes no base feature",
        )),
        _ => Ok(primitive.output_type(input)),
    }
}

/// Check a transformation against its input types and return the output type.
pub fn transform_output(
    primitive: &dyn TransformPrimitive,
    inputs: &[SemanticType],
) -> DfsResult<SemanticType> {
    let accepted = primitive.input_types();
    if accepted.len() != inputs.len() {
        return Err(DfsError::invalid_feature(
            primitive.name().to_uppercase(),
            format!("expects {} inputs, got {}", accepted.len(), inputs.len()),
        ));
    }
    for (set, ty) in accepted.iter().zip(inputs) {
        if !set.accepts(*ty) {
            return Err(DfsError::TypeMismatch {
                primitive: normalize(primitive.name()),
                expected: set.to_string(),
                found: *ty,
            });
        }
    }
    Ok(primitive.output_type(inputs))
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

fn resolve_names(names: &[String], known: impl Fn(&str) -> bool) -> DfsResult<Vec<String>> {
    names
        .iter()
        .map(|name| {
            let normalized = normalize(name);
            if known(&normalized) {
                Ok(normalized)
            } else {
                Err(DfsError::UnknownPrimitive(name.clone()))
            }
        })
        .collect()
}
