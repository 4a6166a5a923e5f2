//! Built-in aggregation primitives.

use std::sync::Arc;

use super::{AggregationPrimitive, TypeSet};
use crate::model::{SemanticType, Value};

/// Built-ins in registration order.
pub fn builtins() -> Vec<Arc<dyn AggregationPrimitive>> {
    vec![
        Arc::new(NumericAggregation::new("mean", mean)),
        Arc::new(NumericAggregation::new("max", max)),
        Arc::new(NumericAggregation::new("min", min)),
        Arc::new(Count),
        Arc::new(PercentTrue),
        Arc::new(Last),
        Arc::new(NumericAggregation::new("sum", sum).with_default(Value::Number(0.0))),
        Arc::new(NumericAggregation::new("std", std_dev)),
    ]
}

/// Numeric → numeric reduction that skips nulls.
///
/// The reducer only sees the non-null numbers and returns `None` when it
/// has no answer for them.
#[derive(Debug, Clone)]
pub struct NumericAggregation {
    name: &'static str,
    reduce: fn(&[f64]) -> Option<f64>,
    default: Value,
}

impl NumericAggregation {
    pub fn new(name: &'static str, reduce: fn(&[f64]) -> Option<f64>) -> Self {
        Self {
            name,
            reduce,
            default: Value::Null,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }
}

impl AggregationPrimitive for NumericAggregation {
    fn name(&self) -> &str {
        self.name
    }

    fn input_type(&self) -> Option<TypeSet> {
        Some(TypeSet::NUMERIC)
    }

    fn output_type(&self, _input: Option<SemanticType>) -> SemanticType {
        SemanticType::Numeric
    }

    fn aggregate(&self, values: &[Value]) -> Value {
        let numbers: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
        (self.reduce)(&numbers)
            .map(Value::Number)
            .unwrap_or_else(|| self.default.clone())
    }

    fn default_value(&self) -> Value {
        self.default.clone()
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

fn sum(values: &[f64]) -> Option<f64> {
    Some(values.iter().sum())
}

/// Sample standard deviation (n - 1 denominator).
fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Number of child rows per parent. Takes no base feature.
#[derive(Debug, Clone, Copy)]
pub struct Count;

impl AggregationPrimitive for Count {
    fn name(&self) -> &str {
        "count"
    }

    fn input_type(&self) -> Option<TypeSet> {
        None
    }

    fn output_type(&self, _input: Option<SemanticType>) -> SemanticType {
        SemanticType::Numeric
    }

    fn aggregate(&self, values: &[Value]) -> Value {
        Value::Number(values.len() as f64)
    }

    fn default_value(&self) -> Value {
        Value::Number(0.0)
    }
}

/// Fraction of true values among the non-null ones.
#[derive(Debug, Clone, Copy)]
pub struct PercentTrue;

impl AggregationPrimitive for PercentTrue {
    fn name(&self) -> &str {
        "percent_true"
    }

    fn input_type(&self) -> Option<TypeSet> {
        Some(TypeSet::DISCRETE)
    }

    fn output_type(&self, _input: Option<SemanticType>) -> SemanticType {
        SemanticType::Numeric
    }

    fn aggregate(&self, values: &[Value]) -> Value {
        let flags: Vec<bool> = values.iter().filter_map(Value::truthiness).collect();
        if flags.is_empty() {
            return Value::Null;
        }
        let hits = flags.iter().filter(|&&b| b).count();
        Value::Number(hits as f64 / flags.len() as f64)
    }
}

/// Value of the most recent child row; ties keep row order.
#[derive(Debug, Clone, Copy)]
pub struct Last;

impl AggregationPrimitive for Last {
    fn name(&self) -> &str {
        "last"
    }

    fn input_type(&self) -> Option<TypeSet> {
        Some(TypeSet::ANY)
    }

    fn output_type(&self, input: Option<SemanticType>) -> SemanticType {
        input.unwrap_or(SemanticType::Categorical)
    }

    fn aggregate(&self, values: &[Value]) -> Value {
        values.last().cloned().unwrap_or(Value::Null)
    }
}
