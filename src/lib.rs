//! # deepfeat
//!
//! Deep feature synthesis over relational entity sets.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Tables (in-memory)                      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [model]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Entities (typed columns, index, time index)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [entityset]
//! ┌─────────────────────────────────────────────────────────┐
//! │     EntitySet (parent → child relationship graph)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [synthesis + primitives]
//! ┌─────────────────────────────────────────────────────────┐
//! │     Feature definitions (typed trees, canonical names)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [compute, cutoff times]
//! ┌─────────────────────────────────────────────────────────┐
//! │                   Feature Matrix                         │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod compute;
pub mod config;
pub mod dfs;
pub mod entityset;
pub mod error;
pub mod feature;
pub mod fingerprint;
pub mod model;
pub mod primitives;
pub mod synthesis;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compute::{
        compute, compute_for, ComputeOptions, CutoffTime, FeatureColumn, FeatureMatrix,
    };
    pub use crate::config::DfsConfig;
    pub use crate::dfs::{dfs, dfs_features_only, DfsOutput};
    pub use crate::entityset::{EntitySet, PathDirection, Relationship, RelationshipPath};
    pub use crate::error::{DfsError, DfsResult};
    pub use crate::feature::{Feature, FeatureBuilder, FeatureKind};
    pub use crate::model::{Entity, EntityOptions, Key, SemanticType, Table, Value};
    pub use crate::primitives::{
        AggregationPrimitive, PrimitiveKind, PrimitiveRegistry, TransformPrimitive, TypeSet,
    };
    pub use crate::synthesis::{synthesize, SynthesisOptions};
}

// Also export at crate root for convenience
pub use compute::{compute, compute_for, ComputeOptions, CutoffTime, FeatureMatrix};
pub use config::DfsConfig;
pub use dfs::{dfs, DfsOutput};
pub use entityset::{EntitySet, Relationship};
pub use error::{DfsError, DfsResult};
pub use feature::Feature;
pub use synthesis::{synthesize, SynthesisOptions};
