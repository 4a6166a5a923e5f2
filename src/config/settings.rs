//! TOML-based run configuration.
//!
//! Example configuration:
//! ```toml
//! target_entity = "clients"
//! max_depth = 2
//! agg_primitives = ["mean", "max", "percent_true", "last"]
//! trans_primitives = ["year", "month", "subtract", "divide"]
//! ignore_entities = []
//! training_window_seconds = 31536000
//!
//! [ignore_columns]
//! loans = ["repaid"]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::compute::{ComputeOptions, CutoffTime};
use crate::error::{DfsError, DfsResult};
use crate::synthesis::SynthesisOptions;

/// Maximum stacking depth when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// One synthesis and materialization run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DfsConfig {
    /// Entity to build the feature matrix for.
    pub target_entity: String,

    pub max_depth: usize,

    /// Aggregation primitives to use; every registered one when absent.
    pub agg_primitives: Option<Vec<String>>,

    /// Transformation primitives to use; every registered one when absent.
    pub trans_primitives: Option<Vec<String>>,

    pub ignore_entities: Vec<String>,

    /// Columns to leave out, keyed by entity.
    pub ignore_columns: BTreeMap<String, Vec<String>>,

    /// Only rows within this many seconds before the cutoff are used.
    pub training_window_seconds: Option<i64>,
}

impl Default for DfsConfig {
    fn default() -> Self {
        Self {
            target_entity: String::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            agg_primitives: None,
            trans_primitives: None,
            ignore_entities: Vec::new(),
            ignore_columns: BTreeMap::new(),
            training_window_seconds: None,
        }
    }
}

impl DfsConfig {
    pub fn new(target_entity: impl Into<String>) -> Self {
        Self {
            target_entity: target_entity.into(),
            ..Default::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
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

    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> DfsResult<Self> {
        let config: DfsConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> DfsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DfsError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> DfsResult<()> {
        if self.target_entity.trim().is_empty() {
            return Err(DfsError::Config("target_entity is required".to_string()));
        }
        if let Some(seconds) = self.training_window_seconds {
            if seconds <= 0 || Duration::try_seconds(seconds).is_none() {
                return Err(DfsError::Config(format!(
                    "training_window_seconds out of range: {}",
                    seconds
                )));
            }
        }
        Ok(())
    }

    pub fn training_window(&self) -> Option<Duration> {
        self.training_window_seconds.and_then(Duration::try_seconds)
    }

    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            target: self.target_entity.clone(),
            max_depth: self.max_depth,
            agg_primitives: self.agg_primitives.clone(),
            trans_primitives: self.trans_primitives.clone(),
            ignore_entities: self.ignore_entities.clone(),
            ignore_columns: self.ignore_columns.clone(),
        }
    }

    pub fn compute_options(&self, cutoff_time: Option<CutoffTime>) -> ComputeOptions {
        ComputeOptions {
            cutoff_time,
            training_window: self.training_window(),
        }
    }
}
