//! End-to-end runs: synthesize features, then materialize them.
//!
//! ```text
//! EntitySet + DfsConfig → synthesize → Vec<Feature> → compute → FeatureMatrix
//! ```
//!
//! # Example
//!
//! ```ignore
//! use deepfeat::prelude::*;
//!
//! let config = DfsConfig::new("clients")
//!     .with_max_depth(2)
//!     .with_agg_primitives(["mean", "last"]);
//! let registry = PrimitiveRegistry::with_builtins();
//! let output = dfs(&set, &registry, &config, None)?;
//! println!("{:?}", output.matrix.column_names());
//! ```

use tracing::info;

use crate::compute::{compute_for, CutoffTime, FeatureMatrix};
use crate::config::DfsConfig;
use crate::entityset::EntitySet;
use crate::error::DfsResult;
use crate::feature::Feature;
use crate::fingerprint::feature_fingerprint;
use crate::primitives::PrimitiveRegistry;
use crate::synthesis::synthesize;

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct DfsOutput {
    /// Computed values, one column per feature.
    pub matrix: FeatureMatrix,
    /// The synthesized feature definitions, in column order.
    pub features: Vec<Feature>,
}

/// Synthesize features for `config.target_entity` and compute them.
pub fn dfs(
    set: &EntitySet,
    registry: &PrimitiveRegistry,
    config: &DfsConfig,
    cutoff_time: Option<CutoffTime>,
) -> DfsResult<DfsOutput> {
    config.validate()?;

    let features = synthesize(set, registry, &config.synthesis_options())?;
    info!(
        target = %config.target_entity,
        features = features.len(),
        fingerprint = %feature_fingerprint(&features),
        "synthesized feature definitions"
    );

    let matrix = compute_for(
        &config.target_entity,
        &features,
        set,
        &config.compute_options(cutoff_time),
    )?;
    Ok(DfsOutput { matrix, features })
}

/// Run synthesis only, returning the feature definitions.
pub fn dfs_features_only(
    set: &EntitySet,
    registry: &PrimitiveRegistry,
    config: &DfsConfig,
) -> DfsResult<Vec<Feature>> {
    config.validate()?;
    synthesize(set, registry, &config.synthesis_options())
}
