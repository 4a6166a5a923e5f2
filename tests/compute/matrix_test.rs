#[path = "../common/mod.rs"]
mod common;

#[cfg(test)]
mod tests {
    use super::common::*;
    use deepfeat::prelude::*;

    fn run(agg: &[&str], trans: &[&str], depth: usize) -> DfsOutput {
        let set = loans_set();
        let registry = PrimitiveRegistry::with_builtins();
        let config = DfsConfig::new("clients")
            .with_max_depth(depth)
            .with_agg_primitives(agg.iter().copied())
            .with_trans_primitives(trans.iter().copied());
        dfs(&set, &registry, &config, None).unwrap()
    }

    #[test]
    fn test_rows_follow_target_index() {
        let output = run(&["mean", "count"], &["month"], 1);
        let matrix = &output.matrix;

        assert_eq!(matrix.entity(), "clients");
        assert_eq!(matrix.index_name(), "client_id");
        assert_eq!(matrix.index(), &[num(1.0), num(2.0), num(3.0)]);
        assert_eq!(matrix.num_rows(), 3);
        assert_eq!(matrix.num_columns(), output.features.len());
        assert!(matrix.columns().iter().all(|c| c.values.len() == 3));

        let names: Vec<&str> = output.features.iter().map(|f| f.name()).collect();
        assert_eq!(matrix.column_names(), names);
    }

    #[test]
    fn test_depth_one_matches_group_by() {
        let output = run(&["mean", "count", "sum", "max"], &["month"], 1);
        let matrix = &output.matrix;

        assert_eq!(
            column(matrix, "MEAN(loans.loan_amount)"),
            vec![num(2000.0), num(2000.0), Value::Null]
        );
        assert_eq!(
            column(matrix, "COUNT(loans)"),
            vec![num(2.0), num(1.0), num(0.0)]
        );
        assert_eq!(
            column(matrix, "SUM(loans.loan_amount)"),
            vec![num(4000.0), num(2000.0), num(0.0)]
        );
        assert_eq!(
            column(matrix, "MAX(loans.loan_amount)"),
            vec![num(3000.0), num(2000.0), Value::Null]
        );
        assert_eq!(
            column(matrix, "MONTH(joined)"),
            vec![num(1.0), num(6.0), num(3.0)]
        );
        assert_eq!(
            column(matrix, "income"),
            vec![num(50000.0), num(80000.0), num(30000.0)]
        );
    }

    #[test]
    fn test_depth_two_spans_both_relationships() {
        let output = run(&["mean", "last", "count", "percent_true"], &[], 2);
        let matrix = &output.matrix;

        // loan 100 pays 200 and 300, loan 101 pays 500, loan 102 pays 400 and 600
        assert_eq!(
            column(matrix, "LAST(loans.MEAN(payments.payment_amount))"),
            vec![num(500.0), num(500.0), Value::Null]
        );
        assert_eq!(
            column(matrix, "MEAN(loans.COUNT(payments))"),
            vec![num(1.5), num(2.0), Value::Null]
        );
        assert_eq!(
            column(matrix, "MEAN(loans.PERCENT_TRUE(payments.missed))"),
            vec![num(0.25), num(0.0), Value::Null]
        );
        assert_eq!(
            column(matrix, "LAST(loans.repaid)"),
            vec![num(0.0), num(1.0), Value::Null]
        );
    }

    #[test]
    fn test_aggregation_across_two_hops() {
        let output = run(&["mean", "count"], &[], 1);
        let matrix = &output.matrix;

        // every payment of every loan of the client
        assert_eq!(
            column(matrix, "MEAN(payments.payment_amount)"),
            vec![
                num((200.0 + 300.0 + 500.0) / 3.0),
                num((400.0 + 600.0) / 2.0),
                Value::Null
            ]
        );
        assert_eq!(
            column(matrix, "COUNT(payments)"),
            vec![num(3.0), num(2.0), num(0.0)]
        );
    }

    #[test]
    fn test_empty_feature_list_with_explicit_target() {
        let set = loans_set();
        let matrix = compute_for("clients", &[], &set, &ComputeOptions::default()).unwrap();
        assert_eq!(matrix.num_rows(), 3);
        assert_eq!(matrix.num_columns(), 0);

        let err = compute(&[], &set, &ComputeOptions::default()).unwrap_err();
        assert!(matches!(err, DfsError::DataShape(_)));
    }

    #[test]
    fn test_lookup_by_key() {
        let output = run(&["count"], &[], 1);
        let matrix = &output.matrix;
        assert_eq!(
            matrix.value(&Key::from(1), "COUNT(loans)"),
            Some(&num(2.0))
        );
        assert_eq!(matrix.value(&Key::from(4), "COUNT(loans)"), None);
        assert_eq!(
            matrix.row(&Key::from(3)),
            Some(vec![
                &num(30000.0),
                &Value::Datetime(ts("2016-03-01")),
                &num(0.0),
                &num(0.0),
            ])
        );
    }

    #[test]
    fn test_repeated_runs_share_fingerprint() {
        let a = run(&["mean", "last", "std"], &["month", "divide"], 2);
        let b = run(&["mean", "last", "std"], &["month", "divide"], 2);
        assert_eq!(
            a.matrix.fingerprint().unwrap(),
            b.matrix.fingerprint().unwrap()
        );
        assert_eq!(a.matrix, b.matrix);
    }

    #[test]
    fn test_matrix_serializes() {
        let output = run(&["count"], &[], 1);
        let json = serde_json::to_value(&output.matrix).unwrap();
        assert_eq!(json["entity"], "clients");
        assert_eq!(json["columns"][2]["name"], "COUNT(loans)");
        assert_eq!(json["columns"][2]["semantic_type"], "numeric");
        assert_eq!(json["columns"][2]["values"][0]["number"], 2.0);
    }

    #[test]
    fn test_matrix_json_round_trip_keeps_text() {
        // a categorical code that reads like a timestamp
        let set = EntitySet::new("codes")
            .with_entity(
                "clients",
                Table::new()
                    .with_column("client_id", [1, 2])
                    .with_column("region", ["north", "south"]),
                EntityOptions::new("client_id"),
            )
            .unwrap()
            .with_entity(
                "orders",
                Table::new()
                    .with_column("order_id", [10, 11])
                    .with_column("client_id", [1, 1])
                    .with_column("code", ["A-1", "2015-01-01T00:00:00"]),
                EntityOptions::new("order_id"),
            )
            .unwrap()
            .with_relationship("clients", "client_id", "orders", "client_id")
            .unwrap();
        let registry = PrimitiveRegistry::with_builtins();
        let fb = FeatureBuilder::new(&set, &registry);
        let code = fb.identity("orders", "code").unwrap();
        let last = fb.aggregate("last", "clients", "orders", Some(code)).unwrap();
        let region = fb.identity("clients", "region").unwrap();

        let matrix = compute(&[region, last], &set, &ComputeOptions::default()).unwrap();
        assert_eq!(
            column(&matrix, "LAST(orders.code)"),
            vec![Value::text("2015-01-01T00:00:00"), Value::Null]
        );

        let json = serde_json::to_string(&matrix).unwrap();
        let back: FeatureMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, matrix);
        assert_eq!(back.fingerprint().unwrap(), matrix.fingerprint().unwrap());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let set = loans_set();
        let registry = PrimitiveRegistry::with_builtins();
        let fb = FeatureBuilder::new(&set, &registry);
        let count = fb.count("clients", "loans").unwrap();

        let err = compute(&[count.clone(), count], &set, &ComputeOptions::default()).unwrap_err();
        assert!(matches!(err, DfsError::InvalidFeature { .. }));
    }

    #[test]
    fn test_mixed_targets_rejected() {
        let set = loans_set();
        let registry = PrimitiveRegistry::with_builtins();
        let fb = FeatureBuilder::new(&set, &registry);
        let income = fb.identity("clients", "income").unwrap();
        let amount = fb.identity("loans", "loan_amount").unwrap();

        let err = compute(&[income, amount], &set, &ComputeOptions::default()).unwrap_err();
        assert!(matches!(err, DfsError::InvalidFeature { .. }));
    }

    #[test]
    fn test_feature_from_another_set_rejected() {
        let set = loans_set();
        let registry = PrimitiveRegistry::with_builtins();
        let fb = FeatureBuilder::new(&set, &registry);
        let count = fb.count("clients", "loans").unwrap();

        let other = EntitySet::new("other")
            .with_entity("clients", clients_table(), EntityOptions::new("client_id"))
            .unwrap()
            .with_entity("loans", loans_table(), EntityOptions::new("loan_id"))
            .unwrap();
        let err = compute(&[count], &other, &ComputeOptions::default()).unwrap_err();
        assert!(matches!(err, DfsError::InvalidFeature { .. }));
    }
}
