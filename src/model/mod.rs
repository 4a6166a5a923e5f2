//! Data model: semantic types, values, input tables and entities.

pub mod entity;
pub mod table;
pub mod types;

pub use entity::{Column, Entity, EntityOptions, GENERATED_INDEX};
pub use table::{RawColumn, Table};
pub use types::{parse_datetime, Key, SemanticType, Value};
