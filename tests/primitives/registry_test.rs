#[path = "../common/mod.rs"]
mod common;

#[cfg(test)]
mod tests {
    use super::common::*;
    use deepfeat::prelude::*;

    /// Max minus min of the non-null numbers.
    #[derive(Debug)]
    struct Range;

    impl AggregationPrimitive for Range {
        fn name(&self) -> &str {
            "range"
        }

        fn input_type(&self) -> Option<TypeSet> {
            Some(TypeSet::NUMERIC)
        }

        fn output_type(&self, _input: Option<SemanticType>) -> SemanticType {
            SemanticType::Numeric
        }

        fn aggregate(&self, values: &[Value]) -> Value {
            let nums: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
            let max = nums.iter().copied().reduce(f64::max);
            let min = nums.iter().copied().reduce(f64::min);
            match (max, min) {
                (Some(max), Some(min)) => Value::Number(max - min),
                _ => Value::Null,
            }
        }
    }

    #[derive(Debug)]
    struct Mean;

    impl AggregationPrimitive for Mean {
        fn name(&self) -> &str {
            "MEAN"
        }

        fn input_type(&self) -> Option<TypeSet> {
            Some(TypeSet::NUMERIC)
        }

        fn output_type(&self, _input: Option<SemanticType>) -> SemanticType {
            SemanticType::Numeric
        }

        fn aggregate(&self, _values: &[Value]) -> Value {
            Value::Null
        }
    }

    #[test]
    fn test_builtin_listing() {
        let registry = PrimitiveRegistry::with_builtins();
        let aggs: Vec<String> = registry
            .list(Some(PrimitiveKind::Aggregation))
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(
            aggs,
            vec!["mean", "max", "min", "count", "percent_true", "last", "sum", "std"]
        );

        let trans: Vec<(String, usize)> = registry
            .list(Some(PrimitiveKind::Transformation))
            .into_iter()
            .map(|p| (p.name.clone(), p.arity()))
            .collect();
        assert_eq!(trans[0], ("year".to_string(), 1));
        assert!(trans.contains(&("divide".to_string(), 2)));
        assert_eq!(registry.list(None).len(), aggs.len() + trans.len());
    }

    #[test]
    fn test_duplicate_name_rejected_case_insensitively() {
        let mut registry = PrimitiveRegistry::with_builtins();
        let err = registry.register_aggregation(Mean).unwrap_err();
        assert!(matches!(err, DfsError::DuplicatePrimitive { .. }));
    }

    #[test]
    fn test_unknown_lookup() {
        let registry = PrimitiveRegistry::with_builtins();
        assert!(matches!(
            registry.aggregation("median"),
            Err(DfsError::UnknownPrimitive(name)) if name == "median"
        ));
        assert!(registry.transform("Month").is_ok());
    }

    #[test]
    fn test_selection_keeps_registration_order() {
        let registry = PrimitiveRegistry::with_builtins();
        let names = vec!["last".to_string(), "MEAN".to_string()];
        let selected: Vec<String> = registry
            .select_aggregations(Some(&names))
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(selected, vec!["mean", "last"]);
    }

    #[test]
    fn test_custom_primitive_takes_part_in_synthesis() {
        let mut registry = PrimitiveRegistry::new();
        registry.register_aggregation(Range).unwrap();

        let set = loans_set();
        let options = SynthesisOptions::new("clients", 1).with_trans_primitives(Vec::<String>::new());
        let features = synthesize(&set, &registry, &options).unwrap();
        let names: Vec<&str> = features.iter().map(|f| f.name()).collect();
        assert!(names.contains(&"RANGE(loans.loan_amount)"));

        let matrix = compute(&features, &set, &ComputeOptions::default()).unwrap();
        assert_eq!(
            column(&matrix, "RANGE(loans.loan_amount)"),
            vec![num(2000.0), num(0.0), Value::Null]
        );
    }
}
