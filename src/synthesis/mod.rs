//! Deep Feature Synthesis - depth-bounded enumeration of candidate features.
//!
//! Starting from the raw columns of the target and its descendants, each
//! depth level stacks one more primitive:
//!
//! 1. **Transformation expansion** on the target entity's features
//! 2. **Aggregation expansion** from every in-scope descendant to each
//!    ancestor, one hop or along the unique chain between them
//! 3. **Deduplication** by canonical name per entity
//!
//! Expansion order is entity registration order, then primitive
//! registration order, then feature generation order, so identical inputs
//! always produce identical candidate lists.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, info};

use crate::entityset::{EntitySet, PathDirection, RelationshipPath};
use crate::error::{DfsError, DfsResult};
use crate::feature::{Feature, FeatureKind};
use crate::primitives::{AggregationPrimitive, PrimitiveRegistry, TransformPrimitive};

/// Inputs of one synthesis run.
#[derive(Debug, Clone, Default)]
pub struct SynthesisOptions {
    /// Entity to build features for.
    pub target: String,
    /// Maximum number of stacked primitives.
    pub max_depth: usize,
    /// Aggregation primitive names; `None` selects every registered one.
    pub agg_primitives: Option<Vec<String>>,
    /// Transformation primitive names; `None` selects every registered one.
    pub trans_primitives: Option<Vec<String>>,
    /// Entities left out of the search (with everything only reachable through them).
    pub ignore_entities: Vec<String>,
    /// Columns left out of the search, per entity.
    pub ignore_columns: BTreeMap<String, Vec<String>>,
}

impl SynthesisOptions {
    pub fn new(target: impl Into<String>, max_depth: usize) -> Self {
        Self {
            target: target.into(),
            max_depth,
            ..Default::default()
        }
    }

    pub fn with_agg_primitives<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.agg_primitives = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_trans_primitives<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.trans_primitives = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn ignore_entity(mut self, entity: impl Into<String>) -> Self {
        self.ignore_entities.push(entity.into());
        self
    }

    pub fn ignore_column(mut self, entity: impl Into<String>, column: impl Into<String>) -> Self {
        self.ignore_columns
            .entry(entity.into())
            .or_default()
            .push(column.into());
        self
    }
}

/// Enumerate candidate features for the target entity.
///
/// Returns every target feature of depth `0..=max_depth`, identity features
/// included, in generation order with unique names.
pub fn synthesize(
    set: &EntitySet,
    registry: &PrimitiveRegistry,
    options: &SynthesisOptions,
) -> DfsResult<Vec<Feature>> {
    let target = set.require_entity(&options.target)?.name().to_string();
    if options.ignore_entities.contains(&target) {
        return Err(DfsError::Config(format!(
            "target entity '{}' cannot be ignored",
            target
        )));
    }

    let aggregations = registry.select_aggregations(options.agg_primitives.as_deref())?;
    let transforms = registry.select_transforms(options.trans_primitives.as_deref())?;
    let scope = scope_entities(set, &target, &options.ignore_entities);

    let has_children = set
        .children_of(&target)
        .iter()
        .any(|r| scope.contains(&r.child_entity));
    if !has_children && options.max_depth > 0 && transforms.is_empty() && !aggregations.is_empty()
    {
        return Err(DfsError::EmptyGraph(target));
    }

    info!(
        target = %target,
        max_depth = options.max_depth,
        entities = scope.len(),
        aggregations = aggregations.len(),
        transforms = transforms.len(),
        "starting deep feature synthesis"
    );

    let mut engine = Engine {
        set,
        target: &target,
        scope: &scope,
        aggregations: &aggregations,
        transforms: &transforms,
        store: FeatureStore::default(),
        keys: key_columns(set, &scope),
    };

    engine.seed_identities(&options.ignore_columns)?;
    for depth in 1..=options.max_depth {
        let before = engine.store.len();
        engine.expand_transforms(depth)?;
        engine.expand_aggregations(depth)?;
        debug!(depth, added = engine.store.len() - before, "expanded depth");
    }

    let features = engine.store.take(&target);
    info!(target = %target, features = features.len(), "synthesis finished");
    Ok(features)
}

/// Target plus every descendant reachable without crossing an ignored
/// entity, in registration order.
fn scope_entities(set: &EntitySet, target: &str, ignored: &[String]) -> Vec<String> {
    let mut reached: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    reached.insert(target);
    queue.push_back(target);

    while let Some(current) = queue.pop_front() {
        for rel in set.children_of(current) {
            let child = rel.child_entity.as_str();
            if ignored.iter().any(|i| i == child) {
                continue;
            }
            if reached.insert(child) {
                queue.push_back(child);
            }
        }
    }

    set.entities()
        .iter()
        .map(|e| e.name())
        .filter(|name| reached.contains(name))
        .map(str::to_string)
        .collect()
}

/// Key columns per entity: never fed to primitives.
fn key_columns(set: &EntitySet, scope: &[String]) -> HashMap<String, HashSet<String>> {
    scope
        .iter()
        .map(|e| {
            let cols = set
                .key_columns(e)
                .into_iter()
                .map(str::to_string)
                .collect();
            (e.clone(), cols)
        })
        .collect()
}

/// Features per entity, deduplicated by canonical name.
#[derive(Debug, Default)]
struct FeatureStore {
    by_entity: HashMap<String, Vec<Feature>>,
    names: HashSet<(String, String)>,
}

impl FeatureStore {
    fn insert(&mut self, feature: Feature) -> bool {
        if !self.names.insert(feature.memo_key()) {
            return false;
        }
        self.by_entity
            .entry(feature.entity().to_string())
            .or_default()
            .push(feature);
        true
    }

    fn get(&self, entity: &str) -> &[Feature] {
        self.by_entity.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    fn take(&mut self, entity: &str) -> Vec<Feature> {
        self.by_entity.remove(entity).unwrap_or_default()
    }
}

struct Engine<'a> {
    set: &'a EntitySet,
    target: &'a str,
    scope: &'a [String],
    aggregations: &'a [Arc<dyn AggregationPrimitive>],
    transforms: &'a [Arc<dyn TransformPrimitive>],
    store: FeatureStore,
    keys: HashMap<String, HashSet<String>>,
}

impl Engine<'_> {
    /// Depth 0: raw columns of every entity in scope.
    ///
    /// The target keeps everything but its own index; other entities also
    /// drop their relationship keys.
    fn seed_identities(&mut self, ignore_columns: &BTreeMap<String, Vec<String>>) -> DfsResult<()> {
        for name in self.scope {
            let entity = self.set.require_entity(name)?;
            let ignored = ignore_columns.get(name);
            let is_target = name == self.target;

            for column in entity.columns() {
                if column.name == entity.index() {
                    continue;
                }
                if !is_target && self.is_key_column(name, &column.name) {
                    continue;
                }
                if ignored.is_some_and(|cols| cols.contains(&column.name)) {
                    continue;
                }
                self.store.insert(Feature::identity(entity, &column.name)?);
            }
        }
        Ok(())
    }

    /// Transformations on the target entity's features of depth `< depth`.
    fn expand_transforms(&mut self, depth: usize) -> DfsResult<()> {
        let candidates: Vec<Feature> = self
            .store
            .get(self.target)
            .iter()
            .filter(|f| f.depth() < depth && !self.is_key_feature(f))
            .cloned()
            .collect();

        for primitive in self.transforms {
            for tuple in operand_tuples(primitive.as_ref(), &candidates, depth) {
                let inputs: Vec<Feature> = tuple.iter().map(|&i| candidates[i].clone()).collect();
                self.store
                    .insert(Feature::transform(primitive.clone(), inputs)?);
            }
        }
        Ok(())
    }

    /// Aggregations of descendant features of depth `depth - 1` onto every
    /// parent in scope, along each of its aggregation paths.
    fn expand_aggregations(&mut self, depth: usize) -> DfsResult<()> {
        let mut generated = Vec::new();

        for parent in self.scope {
            for path in self.aggregation_paths(parent) {
                let Some(child) = path.end() else {
                    continue;
                };

                for primitive in self.aggregations {
                    let Some(accepted) = primitive.input_type() else {
                        if depth == 1 {
                            generated.push(Feature::aggregate_along(
                                primitive.clone(),
                                path.clone(),
                                None,
                            )?);
                        }
                        continue;
                    };

                    for base in self.store.get(child) {
                        if base.depth() + 1 != depth
                            || self.is_key_feature(base)
                            || !accepted.accepts(base.output_type())
                        {
                            continue;
                        }
                        generated.push(Feature::aggregate_along(
                            primitive.clone(),
                            path.clone(),
                            Some(base.clone()),
                        )?);
                    }
                }
            }
        }

        for feature in generated {
            self.store.insert(feature);
        }
        Ok(())
    }

    /// Downward paths from `parent`: one per in-scope child relationship,
    /// then the unique chain to every deeper in-scope descendant.
    ///
    /// Descendants joined by several chains are skipped, as is any chain
    /// passing through an ignored entity.
    fn aggregation_paths(&self, parent: &str) -> Vec<RelationshipPath> {
        let mut paths: Vec<RelationshipPath> = self
            .set
            .children_of(parent)
            .into_iter()
            .filter(|r| self.scope.contains(&r.child_entity))
            .map(|r| RelationshipPath::single(r.clone()))
            .collect();

        for descendant in self.scope {
            if descendant == parent {
                continue;
            }
            let Ok(path) = self.set.path(parent, descendant) else {
                continue;
            };
            if path.direction != PathDirection::Forward || path.len() < 2 {
                continue;
            }
            let in_scope = path
                .entities()
                .iter()
                .all(|e| self.scope.iter().any(|s| s == e));
            if in_scope {
                paths.push(path);
            }
        }
        paths
    }

    fn is_key_column(&self, entity: &str, column: &str) -> bool {
        self.keys
            .get(entity)
            .is_some_and(|cols| cols.contains(column))
    }

    fn is_key_feature(&self, feature: &Feature) -> bool {
        match feature.kind() {
            FeatureKind::Identity { column } => self.is_key_column(feature.entity(), column),
            _ => false,
        }
    }
}

/// Index tuples of candidates that fit a transformation's signature.
///
/// At least one operand must have depth `depth - 1` (shallower tuples were
/// expanded at an earlier level), operands are distinct and commutative
/// primitives see each operand set once.
fn operand_tuples(
    primitive: &dyn TransformPrimitive,
    candidates: &[Feature],
    depth: usize,
) -> Vec<Vec<usize>> {
    let signature = primitive.input_types();
    let mut tuples: Vec<Vec<usize>> = vec![vec![]];

    for accepted in signature {
        let mut next = Vec::new();
        for tuple in &tuples {
            for (i, candidate) in candidates.iter().enumerate() {
                if !accepted.accepts(candidate.output_type()) || tuple.contains(&i) {
                    continue;
                }
                if primitive.commutative() && tuple.last().is_some_and(|&last| i < last) {
                    continue;
                }
                let mut extended = tuple.clone();
                extended.push(i);
                next.push(extended);
            }
        }
        tuples = next;
    }

    tuples
        .into_iter()
        .filter(|tuple| {
            !tuple.is_empty() && tuple.iter().any(|&i| candidates[i].depth() + 1 == depth)
        })
        .collect()
}
