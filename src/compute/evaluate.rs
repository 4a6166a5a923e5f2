//! Evaluation of feature trees for one cutoff partition.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entityset::{EntitySet, RelationshipPath};
use crate::error::{DfsError, DfsResult};
use crate::feature::{Feature, FeatureKind};
use crate::model::{Entity, Key, Value};
use crate::primitives::AggregationPrimitive;

use super::cutoff::Window;

type Column = Arc<Vec<Value>>;

/// Evaluates features over full entity columns under one time window.
///
/// Every feature yields one value per row of its own entity. Results are
/// memoized by (entity, canonical name), so shared subtrees are computed
/// once per partition.
pub(crate) struct PartitionEvaluator<'a> {
    set: &'a EntitySet,
    window: Window,
    memo: HashMap<(String, String), Column>,
    /// Visible rows per entity, ordered by time index then row.
    visible: HashMap<String, Arc<Vec<usize>>>,
}

impl<'a> PartitionEvaluator<'a> {
    pub fn new(set: &'a EntitySet, window: Window) -> Self {
        Self {
            set,
            window,
            memo: HashMap::new(),
            visible: HashMap::new(),
        }
    }

    pub fn evaluate(&mut self, feature: &Feature) -> DfsResult<Column> {
        let key = feature.memo_key();
        if let Some(values) = self.memo.get(&key) {
            return Ok(values.clone());
        }

        let set = self.set;
        let entity = set.require_entity(feature.entity())?;
        let values = match feature.kind() {
            FeatureKind::Identity { column } => entity.require_column(column)?.values.clone(),
            FeatureKind::Transform { primitive, inputs } => {
                let columns = inputs
                    .iter()
                    .map(|input| self.evaluate(input))
                    .collect::<DfsResult<Vec<_>>>()?;
                for (input, col) in inputs.iter().zip(&columns) {
                    expect_rows(input.name(), col.len(), entity.num_rows())?;
                }
                let slices: Vec<&[Value]> = columns.iter().map(|c| c.as_slice()).collect();
                primitive.apply(&slices)
            }
            FeatureKind::Aggregate {
                primitive,
                path,
                base,
            } => self.aggregate(entity, primitive.as_ref(), path, base.as_deref())?,
        };

        expect_rows(feature.name(), values.len(), entity.num_rows())?;
        let values = Arc::new(values);
        self.memo.insert(key, values.clone());
        Ok(values)
    }

    fn aggregate(
        &mut self,
        parent: &Entity,
        primitive: &dyn AggregationPrimitive,
        path: &RelationshipPath,
        base: Option<&Feature>,
    ) -> DfsResult<Vec<Value>> {
        let set = self.set;
        let (Some(first), Some(last)) = (path.relationships.first(), path.relationships.last())
        else {
            return Err(DfsError::invalid_feature(
                primitive.name(),
                "aggregation path is empty",
            ));
        };
        let child = set.require_entity(&last.child_entity)?;

        // Row-counting primitives see the child's index values.
        let inputs = match base {
            Some(base) => self.evaluate(base)?,
            None => Arc::new(child.index_values().to_vec()),
        };
        expect_rows(&last.child_entity, inputs.len(), child.num_rows())?;

        let group_keys = self.group_keys(path)?;
        let mut groups: HashMap<Key, Vec<Value>> = HashMap::new();
        for &row in self.visible_rows(child).iter() {
            if let Some(key) = &group_keys[row] {
                groups.entry(key.clone()).or_default().push(inputs[row].clone());
            }
        }

        let parent_keys = &parent.require_column(&first.parent_key)?.values;
        Ok(parent_keys
            .iter()
            .map(|value| {
                Key::from_value(value)
                    .and_then(|key| groups.get(&key))
                    .map(|group| primitive.aggregate(group))
                    .unwrap_or_else(|| primitive.default_value())
            })
            .collect())
    }

    /// For every row of the path's last entity, the first hop's parent key
    /// it rolls up to.
    ///
    /// Intermediate rows outside the window break the chain, so their
    /// descendants reach no group.
    fn group_keys(&mut self, path: &RelationshipPath) -> DfsResult<Vec<Option<Key>>> {
        let set = self.set;
        let hops = &path.relationships;
        let Some(last) = hops.last() else {
            return Ok(Vec::new());
        };
        let child = set.require_entity(&last.child_entity)?;
        let mut keys: Vec<Option<Key>> = child
            .require_column(&last.child_key)?
            .values
            .iter()
            .map(Key::from_value)
            .collect();

        for pair in hops.windows(2).rev() {
            let (upper, lower) = (&pair[0], &pair[1]);
            let middle = set.require_entity(&lower.parent_entity)?;
            let own_keys = &middle.require_column(&lower.parent_key)?.values;
            let up_keys = &middle.require_column(&upper.child_key)?.values;

            let lookup: HashMap<Key, Option<Key>> = self
                .visible_rows(middle)
                .iter()
                .filter_map(|&row| {
                    Key::from_value(&own_keys[row]).map(|k| (k, Key::from_value(&up_keys[row])))
                })
                .collect();
            keys = keys
                .into_iter()
                .map(|key| key.and_then(|k| lookup.get(&k).cloned().flatten()))
                .collect();
        }

        Ok(keys)
    }

    fn visible_rows(&mut self, entity: &Entity) -> Arc<Vec<usize>> {
        if let Some(rows) = self.visible.get(entity.name()) {
            return rows.clone();
        }

        let rows = match entity.times() {
            Some(times) => {
                let mut rows: Vec<usize> = (0..times.len())
                    .filter(|&row| self.window.admits(times[row]))
                    .collect();
                rows.sort_by_key(|&row| (times[row], row));
                rows
            }
            None => (0..entity.num_rows()).collect(),
        };

        let rows = Arc::new(rows);
        self.visible.insert(entity.name().to_string(), rows.clone());
        rows
    }
}

fn expect_rows(name: &str, found: usize, expected: usize) -> DfsResult<()> {
    if found != expected {
        return Err(DfsError::DataShape(format!(
            "'{}' produced {} values, expected {}",
            name, found, expected
        )));
    }
    Ok(())
}
