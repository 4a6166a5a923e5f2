//! Registered entities: a validated table with an index and typed columns.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDateTime;

use super::table::Table;
use super::types::{Key, SemanticType, Value};
use crate::error::{DfsError, DfsResult};

/// Name of the index column created by `make_index`.
pub const GENERATED_INDEX: &str = "index";

/// A typed column of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub semantic_type: SemanticType,
    pub values: Vec<Value>,
}

/// Options for registering a table as an entity.
#[derive(Debug, Clone, Default)]
pub struct EntityOptions {
    /// Name of the unique index column.
    pub index: String,
    /// Generate the index instead of reading it from the table.
    pub make_index: bool,
    /// Optional time index column (must be datetime, non-null).
    pub time_index: Option<String>,
    /// Declared semantic types, overriding inference.
    pub column_types: BTreeMap<String, SemanticType>,
}

impl EntityOptions {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ..Default::default()
        }
    }

    /// Ask for a synthetic sequential index named `index`.
    pub fn generated_index() -> Self {
        Self {
            index: GENERATED_INDEX.to_string(),
            make_index: true,
            ..Default::default()
        }
    }

    pub fn with_time_index(mut self, column: impl Into<String>) -> Self {
        self.time_index = Some(column.into());
        self
    }

    pub fn with_type(mut self, column: impl Into<String>, ty: SemanticType) -> Self {
        self.column_types.insert(column.into(), ty);
        self
    }
}

/// A table registered under a name, with a unique index.
///
/// Immutable once built; changing the data means registering again.
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    index: String,
    time_index: Option<String>,
    columns: Vec<Column>,
    positions: HashMap<String, usize>,
    index_lookup: HashMap<Key, usize>,
    num_rows: usize,
}

impl Entity {
    /// Validate a table and build an entity from it.
    pub fn new(name: impl Into<String>, table: Table, options: EntityOptions) -> DfsResult<Self> {
        let name = name.into();
        let num_rows = table.num_rows();

        for col in &table.columns {
            if col.values.len() != num_rows {
                return Err(DfsError::schema(
                    &name,
                    format!(
                        "column '{}' has {} rows, expected {}",
                        col.name,
                        col.values.len(),
                        num_rows
                    ),
                ));
            }
        }

        if let Some(dup) = duplicate_column(&table) {
            return Err(DfsError::schema(
                &name,
                format!("column '{}' appears more than once", dup),
            ));
        }

        for declared in options.column_types.keys() {
            let generated = options.make_index && declared == &options.index;
            if !generated && !table.has_column(declared) {
                return Err(DfsError::schema(
                    &name,
                    format!("type declared for missing column '{}'", declared),
                ));
            }
        }

        let mut columns = Vec::with_capacity(table.columns.len() + 1);

        if options.make_index {
            if table.has_column(&options.index) {
                return Err(DfsError::schema(
                    &name,
                    format!(
                        "cannot generate index '{}': column already exists",
                        options.index
                    ),
                ));
            }
            columns.push(Column {
                name: options.index.clone(),
                semantic_type: SemanticType::Numeric,
                values: (0..num_rows).map(|i| Value::Number(i as f64)).collect(),
            });
        } else if !table.has_column(&options.index) {
            return Err(DfsError::schema(
                &name,
                format!("index column '{}' not found", options.index),
            ));
        }

        for raw in table.columns {
            let declared = options.column_types.get(&raw.name).copied();
            columns.push(type_column(&name, raw.name, raw.values, declared)?);
        }

        let positions: HashMap<String, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();

        let index_col = &columns[positions[&options.index]];
        let mut index_lookup = HashMap::with_capacity(num_rows);
        for (row, value) in index_col.values.iter().enumerate() {
            if value.is_null() {
                return Err(DfsError::schema(
                    &name,
                    format!("index '{}' has a null at row {}", options.index, row),
                ));
            }
            let key = Key::from_value(value).ok_or_else(|| {
                DfsError::schema(
                    &name,
                    format!(
                        "index '{}' value {} is not an integer or string",
                        options.index, value
                    ),
                )
            })?;
            if index_lookup.insert(key, row).is_some() {
                return Err(DfsError::schema(
                    &name,
                    format!("index '{}' has duplicate value {}", options.index, value),
                ));
            }
        }

        if let Some(time_index) = &options.time_index {
            let col = positions
                .get(time_index)
                .map(|&i| &columns[i])
                .ok_or_else(|| {
                    DfsError::schema(&name, format!("time index '{}' not found", time_index))
                })?;
            if col.semantic_type != SemanticType::Datetime {
                return Err(DfsError::schema(
                    &name,
                    format!(
                        "time index '{}' must be datetime, found {}",
                        time_index, col.semantic_type
                    ),
                ));
            }
            if let Some(row) = col.values.iter().position(Value::is_null) {
                return Err(DfsError::schema(
                    &name,
                    format!("time index '{}' has a null at row {}", time_index, row),
                ));
            }
        }

        Ok(Self {
            name,
            index: options.index,
            time_index: options.time_index,
            columns,
            positions,
            index_lookup,
            num_rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn time_index(&self) -> Option<&str> {
        self.time_index.as_deref()
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Columns in registration order (a generated index comes first).
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.positions.get(name).map(|&i| &self.columns[i])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Like [`Entity::column`], but an error when the column is missing.
    pub fn require_column(&self, name: &str) -> DfsResult<&Column> {
        self.column(name).ok_or_else(|| DfsError::UnknownColumn {
            entity: self.name.clone(),
            column: name.to_string(),
        })
    }

    pub fn column_type(&self, name: &str) -> Option<SemanticType> {
        self.column(name).map(|c| c.semantic_type)
    }

    /// Values of the index column in row order.
    pub fn index_values(&self) -> &[Value] {
        &self.columns[self.positions[&self.index]].values
    }

    /// Row position of an index key.
    pub fn row_of(&self, key: &Key) -> Option<usize> {
        self.index_lookup.get(key).copied()
    }

    /// Index key of every row, in row order.
    pub fn index_keys(&self) -> Vec<Key> {
        // Every index value was checked to be key-convertible at registration.
        self.index_values()
            .iter()
            .filter_map(Key::from_value)
            .collect()
    }

    /// Time index value per row, if the entity has a time index.
    pub fn times(&self) -> Option<Vec<NaiveDateTime>> {
        let col = self.column(self.time_index.as_deref()?)?;
        Some(col.values.iter().filter_map(Value::as_datetime).collect())
    }

    /// Whether every non-null value of a column is distinct.
    pub fn is_unique(&self, column: &str) -> DfsResult<bool> {
        let col = self.require_column(column)?;
        let mut seen = std::collections::HashSet::with_capacity(col.values.len());
        for value in &col.values {
            match Key::from_value(value) {
                Some(key) => {
                    if !seen.insert(key) {
                        return Ok(false);
                    }
                }
                None => return Ok(false),
            }
        }
        Ok(true)
    }
}

/// Infer or check the semantic type of one column.
fn type_column(
    entity: &str,
    name: String,
    values: Vec<Value>,
    declared: Option<SemanticType>,
) -> DfsResult<Column> {
    let inferred = values.iter().find_map(SemanticType::of_value);

    let semantic_type = match declared {
        Some(ty) => ty,
        None => inferred.unwrap_or(SemanticType::Categorical),
    };

    let mut typed = Vec::with_capacity(values.len());
    for (row, value) in values.into_iter().enumerate() {
        let coerced = match declared {
            Some(ty) => value.coerce(ty),
            None if value.is_null() || SemanticType::of_value(&value) == inferred => Some(value),
            None => None,
        };
        match coerced {
            Some(v) => typed.push(v),
            None => {
                return Err(DfsError::schema(
                    entity,
                    format!(
                        "column '{}' row {} does not fit type {}",
                        name, row, semantic_type
                    ),
                ))
            }
        }
    }

    Ok(Column {
        name,
        semantic_type,
        values: typed,
    })
}

fn duplicate_column(table: &Table) -> Option<String> {
    let mut seen = HashSet::new();
    table
        .columns
        .iter()
        .find(|c| !seen.insert(c.name.as_str()))
        .map(|c| c.name.clone())
}
