#[path = "../common/mod.rs"]
mod common;

#[cfg(test)]
mod tests {
    use super::common::*;
    use chrono::Duration;
    use deepfeat::prelude::*;

    fn features(set: &EntitySet) -> Vec<Feature> {
        let registry = PrimitiveRegistry::with_builtins();
        let options = SynthesisOptions::new("clients", 2)
            .with_agg_primitives(["mean", "count"])
            .with_trans_primitives(Vec::<String>::new());
        synthesize(set, &registry, &options).unwrap()
    }

    #[test]
    fn test_loan_after_cutoff_is_invisible() {
        // client 1 joined 2015-01-01, first loan 2015-06-01, first payment 2015-07-01
        let set = loans_set();
        let options = ComputeOptions::default().with_cutoff(CutoffTime::Global(ts("2015-05-01")));
        let matrix = compute(&features(&set), &set, &options).unwrap();

        assert_eq!(
            column(&matrix, "MEAN(loans.loan_amount)"),
            vec![Value::Null, num(2000.0), Value::Null]
        );
        assert_eq!(
            column(&matrix, "COUNT(loans)"),
            vec![num(0.0), num(1.0), num(0.0)]
        );
        assert_eq!(
            column(&matrix, "MEAN(loans.COUNT(payments))"),
            vec![Value::Null, num(2.0), Value::Null]
        );
    }

    #[test]
    fn test_target_row_visible_before_it_exists() {
        // client 3 joins after the cutoff but still gets a row and its raw values
        let set = loans_set();
        let options = ComputeOptions::default().with_cutoff(CutoffTime::Global(ts("2015-05-01")));
        let matrix = compute(&features(&set), &set, &options).unwrap();

        assert_eq!(matrix.num_rows(), 3);
        assert_eq!(
            matrix.value(&Key::from(3), "income"),
            Some(&num(30000.0))
        );
    }

    #[test]
    fn test_per_row_cutoffs() {
        let set = loans_set();
        let cutoff = CutoffTime::per_row([(1, ts("2015-07-01")), (2, ts("2014-10-15"))]);
        let options = ComputeOptions::default().with_cutoff(cutoff);
        let matrix = compute(&features(&set), &set, &options).unwrap();

        // client 1 sees loan 100 and the payment made on the cutoff day
        assert_eq!(
            column(&matrix, "MEAN(loans.COUNT(payments))"),
            vec![num(1.0), num(1.0), Value::Null]
        );
        assert_eq!(
            column(&matrix, "COUNT(loans)"),
            vec![num(1.0), num(1.0), num(0.0)]
        );
        assert_eq!(
            column(&matrix, "MEAN(loans.loan_amount)"),
            vec![num(1000.0), num(2000.0), Value::Null]
        );
    }

    #[test]
    fn test_unknown_instances_in_cutoff_are_ignored() {
        let set = loans_set();
        let cutoff = CutoffTime::per_row([(42, ts("2015-05-01"))]);
        let with_unknown = compute(
            &features(&set),
            &set,
            &ComputeOptions::default().with_cutoff(cutoff),
        )
        .unwrap();
        let without = compute(&features(&set), &set, &ComputeOptions::default()).unwrap();
        assert_eq!(with_unknown, without);
    }

    #[test]
    fn test_training_window() {
        let set = loans_set();
        let options = ComputeOptions::default()
            .with_cutoff(CutoffTime::Global(ts("2016-03-01")))
            .with_training_window(Duration::days(90));
        let matrix = compute(&features(&set), &set, &options).unwrap();

        // only loan 101 (2016-01-10) falls inside the window
        assert_eq!(
            column(&matrix, "MEAN(loans.loan_amount)"),
            vec![num(3000.0), Value::Null, Value::Null]
        );
        assert_eq!(
            column(&matrix, "COUNT(loans)"),
            vec![num(1.0), num(0.0), num(0.0)]
        );
    }

    #[test]
    fn test_cutoff_applies_at_every_hop() {
        let set = loans_set();
        let registry = PrimitiveRegistry::with_builtins();
        let fb = FeatureBuilder::new(&set, &registry);
        let amount = fb.identity("payments", "payment_amount").unwrap();
        let mean = fb
            .aggregate("mean", "clients", "payments", Some(amount))
            .unwrap();
        let count = fb.count("clients", "payments").unwrap();

        let options =
            ComputeOptions::default().with_cutoff(CutoffTime::Global(ts("2015-07-15")));
        let matrix = compute(&[mean.clone(), count.clone()], &set, &options).unwrap();
        assert_eq!(
            column(&matrix, "MEAN(payments.payment_amount)"),
            vec![num(200.0), num(500.0), Value::Null]
        );

        // payment 300 (2015-08-01) is inside the window but loan 100 is not
        let options = ComputeOptions::default()
            .with_cutoff(CutoffTime::Global(ts("2015-08-15")))
            .with_training_window(Duration::days(30));
        let matrix = compute(&[mean, count], &set, &options).unwrap();
        assert_eq!(
            column(&matrix, "COUNT(payments)"),
            vec![num(0.0), num(0.0), num(0.0)]
        );
        assert_eq!(
            column(&matrix, "MEAN(payments.payment_amount)"),
            vec![Value::Null, Value::Null, Value::Null]
        );
    }

    #[test]
    fn test_entities_without_time_index_always_visible() {
        let set = EntitySet::new("static")
            .with_entity("clients", clients_table(), EntityOptions::new("client_id"))
            .unwrap()
            .with_entity("loans", loans_table(), EntityOptions::new("loan_id"))
            .unwrap()
            .with_relationship("clients", "client_id", "loans", "client_id")
            .unwrap();
        let registry = PrimitiveRegistry::with_builtins();
        let fb = FeatureBuilder::new(&set, &registry);
        let count = fb.count("clients", "loans").unwrap();

        let options = ComputeOptions::default().with_cutoff(CutoffTime::Global(ts("2000-01-01")));
        let matrix = compute(&[count], &set, &options).unwrap();
        assert_eq!(
            column(&matrix, "COUNT(loans)"),
            vec![num(2.0), num(1.0), num(0.0)]
        );
    }

    #[test]
    fn test_dfs_with_config_window() {
        let set = loans_set();
        let registry = PrimitiveRegistry::with_builtins();
        let config = DfsConfig::from_toml_str(
            r#"
target_entity = "clients"
max_depth = 1
agg_primitives = ["count"]
trans_primitives = []
training_window_seconds = 7776000
"#,
        )
        .unwrap();

        let output = dfs(
            &set,
            &registry,
            &config,
            Some(CutoffTime::Global(ts("2016-03-01"))),
        )
        .unwrap();
        assert_eq!(
            column(&output.matrix, "COUNT(loans)"),
            vec![num(1.0), num(0.0), num(0.0)]
        );
    }
}
