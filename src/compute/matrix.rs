//! The computed feature matrix.

use serde::{Deserialize, Serialize};

use crate::error::{DfsError, DfsResult};
use crate::fingerprint::json_fingerprint;
use crate::model::{Key, SemanticType, Value};

/// One computed feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub semantic_type: SemanticType,
    pub values: Vec<Value>,
}

/// One row per target instance, one column per feature.
///
/// Rows follow the target entity's row order and carry its index values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    entity: String,
    index_name: String,
    index: Vec<Value>,
    columns: Vec<FeatureColumn>,
}

impl FeatureMatrix {
    pub(crate) fn new(
        entity: impl Into<String>,
        index_name: impl Into<String>,
        index: Vec<Value>,
        columns: Vec<FeatureColumn>,
    ) -> DfsResult<Self> {
        if let Some(bad) = columns.iter().find(|c| c.values.len() != index.len()) {
            return Err(DfsError::DataShape(format!(
                "feature '{}' has {} values for {} rows",
                bad.name,
                bad.values.len(),
                index.len()
            )));
        }
        Ok(Self {
            entity: entity.into(),
            index_name: index_name.into(),
            index,
            columns,
        })
    }

    /// Target entity name.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Target index values in row order.
    pub fn index(&self) -> &[Value] {
        &self.index
    }

    pub fn num_rows(&self) -> usize {
        self.index.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&FeatureColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Row position of an index key.
    pub fn row_position(&self, key: &Key) -> Option<usize> {
        self.index
            .iter()
            .position(|v| Key::from_value(v).as_ref() == Some(key))
    }

    /// Every feature value of one instance, in column order.
    pub fn row(&self, key: &Key) -> Option<Vec<&Value>> {
        let pos = self.row_position(key)?;
        Some(self.columns.iter().map(|c| &c.values[pos]).collect())
    }

    /// One cell by instance key and feature name.
    pub fn value(&self, key: &Key, name: &str) -> Option<&Value> {
        let pos = self.row_position(key)?;
        self.column(name).map(|c| &c.values[pos])
    }

    /// SHA-256 over column names, types and values.
    ///
    /// Two runs over the same inputs produce the same fingerprint.
    pub fn fingerprint(&self) -> DfsResult<String> {
        json_fingerprint(&self.columns)
    }
}
