//! Built-in transformation primitives.

use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime};

use super::{TransformPrimitive, TypeSet};
use crate::model::{SemanticType, Value};

/// Built-ins in registration order.
pub fn builtins() -> Vec<Arc<dyn TransformPrimitive>> {
    vec![
        Arc::new(DatePart::new("year", |dt| dt.year() as f64)),
        Arc::new(DatePart::new("month", |dt| dt.month() as f64)),
        Arc::new(DatePart::new("day", |dt| dt.day() as f64)),
        Arc::new(DatePart::new("weekday", |dt| {
            dt.weekday().num_days_from_monday() as f64
        })),
        Arc::new(BinaryNumeric::new("subtract", |a, b| Some(a - b))),
        Arc::new(BinaryNumeric::new("divide", divide)),
        Arc::new(BinaryNumeric::new("multiply", |a, b| Some(a * b)).commutes()),
        Arc::new(BinaryNumeric::new("add", |a, b| Some(a + b)).commutes()),
        Arc::new(IsNull),
        Arc::new(Absolute),
    ]
}

fn divide(a: f64, b: f64) -> Option<f64> {
    if b == 0.0 {
        None
    } else {
        Some(a / b)
    }
}

/// Extracts a numeric part of a datetime.
#[derive(Debug, Clone)]
pub struct DatePart {
    name: &'static str,
    extract: fn(&NaiveDateTime) -> f64,
}

impl DatePart {
    pub fn new(name: &'static str, extract: fn(&NaiveDateTime) -> f64) -> Self {
        Self { name, extract }
    }
}

impl TransformPrimitive for DatePart {
    fn name(&self) -> &str {
        self.name
    }

    fn input_types(&self) -> &[TypeSet] {
        &[TypeSet::DATETIME]
    }

    fn output_type(&self, _inputs: &[SemanticType]) -> SemanticType {
        SemanticType::Numeric
    }

    fn apply(&self, inputs: &[&[Value]]) -> Vec<Value> {
        inputs[0]
            .iter()
            .map(|v| match v {
                Value::Datetime(dt) => Value::Number((self.extract)(dt)),
                _ => Value::Null,
            })
            .collect()
    }
}

/// Row-wise arithmetic between two numeric columns.
///
/// A null operand, or an undefined result, yields null.
#[derive(Debug, Clone)]
pub struct BinaryNumeric {
    name: &'static str,
    op: fn(f64, f64) -> Option<f64>,
    commutative: bool,
}

impl BinaryNumeric {
    pub fn new(name: &'static str, op: fn(f64, f64) -> Option<f64>) -> Self {
        Self {
            name,
            op,
            commutative: false,
        }
    }

    pub fn commutes(mut self) -> Self {
        self.commutative = true;
        self
    }
}

impl TransformPrimitive for BinaryNumeric {
    fn name(&self) -> &str {
        self.name
    }

    fn input_types(&self) -> &[TypeSet] {
        &[TypeSet::NUMERIC, TypeSet::NUMERIC]
    }

    fn output_type(&self, _inputs: &[SemanticType]) -> SemanticType {
        SemanticType::Numeric
    }

    fn commutative(&self) -> bool {
        self.commutative
    }

    fn apply(&self, inputs: &[&[Value]]) -> Vec<Value> {
        inputs[0]
            .iter()
            .zip(inputs[1].iter())
            .map(|(a, b)| match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => (self.op)(a, b)
                    .filter(|r| r.is_finite())
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            })
            .collect()
    }
}

/// Whether each value is missing.
#[derive(Debug, Clone, Copy)]
pub struct IsNull;

impl TransformPrimitive for IsNull {
    fn name(&self) -> &str {
        "is_null"
    }

    fn input_types(&self) -> &[TypeSet] {
        &[TypeSet::ANY]
    }

    fn output_type(&self, _inputs: &[SemanticType]) -> SemanticType {
        SemanticType::Boolean
    }

    fn apply(&self, inputs: &[&[Value]]) -> Vec<Value> {
        inputs[0]
            .iter()
            .map(|v| Value::Boolean(v.is_null()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Absolute;

impl TransformPrimitive for Absolute {
    fn name(&self) -> &str {
        "absolute"
    }

    fn input_types(&self) -> &[TypeSet] {
        &[TypeSet::NUMERIC]
    }

    fn output_type(&self, _inputs: &[SemanticType]) -> SemanticType {
        SemanticType::Numeric
    }

    fn apply(&self, inputs: &[&[Value]]) -> Vec<Value> {
        inputs[0]
            .iter()
            .map(|v| v.as_f64().map(|n| Value::Number(n.abs())).unwrap_or(Value::Null))
            .collect()
    }
}
