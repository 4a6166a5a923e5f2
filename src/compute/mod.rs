//! Feature matrix materialization.
//!
//! ```text
//! features ──► validate ──► partition target rows by cutoff
//!                                 │
//!                 ┌───────────────┼───────────────┐
//!                 ▼               ▼               ▼
//!            partition 1     partition 2  ... (rayon)
//!            private memo    private memo
//!                 └───────────────┬───────────────┘
//!                                 ▼
//!                    FeatureMatrix (target row order)
//! ```

mod cutoff;
mod evaluate;
mod matrix;

use std::collections::HashSet;

use chrono::Duration;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::entityset::EntitySet;
use crate::error::{DfsError, DfsResult};
use crate::feature::Feature;
use crate::model::Value;

pub use cutoff::CutoffTime;
pub use matrix::{FeatureColumn, FeatureMatrix};

use cutoff::{partition, Partition, Window};
use evaluate::PartitionEvaluator;

/// Time controls for one materialization.
#[derive(Debug, Clone, Default)]
pub struct ComputeOptions {
    pub cutoff_time: Option<CutoffTime>,
    /// How far back before the cutoff rows stay visible.
    pub training_window: Option<Duration>,
}

impl ComputeOptions {
    pub fn with_cutoff(mut self, cutoff: CutoffTime) -> Self {
        self.cutoff_time = Some(cutoff);
        self
    }

    pub fn with_training_window(mut self, window: Duration) -> Self {
        self.training_window = Some(window);
        self
    }
}

/// Compute one column per feature for every row of the features' entity.
///
/// The target is taken from the features; use [`compute_for`] when the list
/// may be empty.
pub fn compute(
    features: &[Feature],
    set: &EntitySet,
    options: &ComputeOptions,
) -> DfsResult<FeatureMatrix> {
    let first = features
        .first()
        .ok_or_else(|| DfsError::DataShape("no features to compute".to_string()))?;
    compute_for(first.entity(), features, set, options)
}

/// Compute one column per feature for every row of `target`.
///
/// An empty feature list yields a matrix with the target's rows and index
/// and no columns.
pub fn compute_for(
    target: &str,
    features: &[Feature],
    set: &EntitySet,
    options: &ComputeOptions,
) -> DfsResult<FeatureMatrix> {
    let target = set.require_entity(target)?;

    let mut names = HashSet::new();
    for feature in features {
        if feature.entity() != target.name() {
            return Err(DfsError::invalid_feature(
                feature.name(),
                format!(
                    "feature lives on '{}', matrix target is '{}'",
                    feature.entity(),
                    target.name()
                ),
            ));
        }
        if !names.insert(feature.name()) {
            return Err(DfsError::invalid_feature(
                feature.name(),
                "duplicate feature name",
            ));
        }
        feature.validate(set)?;
    }

    let partitions = partition(target, options.cutoff_time.as_ref());
    info!(
        target = %target.name(),
        features = features.len(),
        rows = target.num_rows(),
        partitions = partitions.len(),
        "computing feature matrix"
    );

    let results = partitions
        .par_iter()
        .map(|part| evaluate_partition(features, set, part, options.training_window))
        .collect::<DfsResult<Vec<_>>>()?;

    let mut columns: Vec<Vec<Value>> = vec![vec![Value::Null; target.num_rows()]; features.len()];
    for (part, values) in partitions.iter().zip(results) {
        for (column, feature_values) in columns.iter_mut().zip(values) {
            for (&row, value) in part.rows.iter().zip(feature_values) {
                column[row] = value;
            }
        }
    }

    let columns = features
        .iter()
        .zip(columns)
        .map(|(feature, values)| FeatureColumn {
            name: feature.name().to_string(),
            semantic_type: feature.output_type(),
            values,
        })
        .collect();

    FeatureMatrix::new(
        target.name(),
        target.index(),
        target.index_values().to_vec(),
        columns,
    )
}

/// Values of every feature for the partition's rows, in feature order.
fn evaluate_partition(
    features: &[Feature],
    set: &EntitySet,
    part: &Partition,
    training_window: Option<Duration>,
) -> DfsResult<Vec<Vec<Value>>> {
    debug!(
        cutoff = ?part.cutoff,
        rows = part.rows.len(),
        "evaluating partition"
    );

    let mut evaluator = PartitionEvaluator::new(
        set,
        Window {
            cutoff: part.cutoff,
            training_window,
        },
    );

    features
        .iter()
        .map(|feature| {
            let values = evaluator.evaluate(feature)?;
            Ok(part.rows.iter().map(|&row| values[row].clone()).collect())
        })
        .collect()
}
