//! Error taxonomy for entity registration, synthesis and materialization.
//!
//! Every error is raised synchronously by the call that detects it:
//! registration for schema and relationship problems, synthesis for
//! primitive and graph problems, and compute only for data-shape
//! mismatches that could not be caught earlier.

use std::path::PathBuf;

use crate::model::SemanticType;

/// Result type for deepfeat operations.
pub type DfsResult<T> = Result<T, DfsError>;

/// Unified error type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DfsError {
    /// Bad or missing index, null index values, type declaration conflicts.
    #[error("Schema error on entity '{entity}': {message}")]
    Schema { entity: String, message: String },

    /// Non-unique parent key, key type mismatch, or a cycle.
    #[error("Relationship error ({parent} -> {child}): {message}")]
    Relationship {
        parent: String,
        child: String,
        message: String,
    },

    /// No (or no unambiguous) relationship chain between two entities.
    #[error("No relationship path from '{from}' to '{to}'")]
    NoPath { from: String, to: String },

    /// A primitive was applied to a column of an incompatible type.
    #[error("Primitive '{primitive}' cannot accept {found} input (expected {expected})")]
    TypeMismatch {
        primitive: String,
        expected: String,
        found: SemanticType,
    },

    #[error("Unknown primitive: '{0}'")]
    UnknownPrimitive(String),

    #[error("Duplicate {kind} primitive: '{name}'")]
    DuplicatePrimitive { kind: String, name: String },

    /// Aggregation was requested on a target with nothing to aggregate.
    #[error("Nothing to aggregate for target '{0}': it has no child relationships")]
    EmptyGraph(String),

    #[error("Unknown entity: '{0}'")]
    UnknownEntity(String),

    #[error("Unknown column '{column}' on entity '{entity}'")]
    UnknownColumn { entity: String, column: String },

    /// A hand-built feature definition is structurally invalid.
    #[error("Invalid feature '{feature}': {message}")]
    InvalidFeature { feature: String, message: String },

    /// Data no longer matches what the feature definitions expect.
    #[error("Data shape mismatch: {0}")]
    DataShape(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),
}

impl DfsError {
    pub(crate) fn schema(entity: impl Into<String>, message: impl Into<String>) -> Self {
        DfsError::Schema {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub(crate) fn relationship(
        parent: impl Into<String>,
        child: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DfsError::Relationship {
            parent: parent.into(),
            child: child.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_feature(feature: impl Into<String>, message: impl Into<String>) -> Self {
        DfsError::InvalidFeature {
            feature: feature.into(),
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for DfsError {
    fn from(err: toml::de::Error) -> Self {
        DfsError::Config(err.to_string())
    }
}

impl From<std::io::Error> for DfsError {
    fn from(err: std::io::Error) -> Self {
        DfsError::Config(err.to_string())
    }
}
