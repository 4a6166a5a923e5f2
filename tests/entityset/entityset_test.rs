#[path = "../common/mod.rs"]
mod common;

#[cfg(test)]
mod tests {
    use super::common::*;
    use deepfeat::model::GENERATED_INDEX;
    use deepfeat::prelude::*;

    #[test]
    fn test_fixture_registers() {
        let set = loans_set();
        assert_eq!(set.entity_count(), 3);
        assert_eq!(set.relationship_count(), 2);

        let payments = set.entity("payments").unwrap();
        assert_eq!(payments.index(), GENERATED_INDEX);
        assert_eq!(payments.columns()[0].name, "index");
        assert_eq!(payments.index_values()[4], Value::Number(4.0));

        let loans = set.entity("loans").unwrap();
        assert_eq!(loans.column_type("repaid"), Some(SemanticType::Categorical));
        assert_eq!(loans.column_type("loan_start"), Some(SemanticType::Datetime));
        assert_eq!(loans.column_type("loan_amount"), Some(SemanticType::Numeric));
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let table = Table::new()
            .with_column("id", [1, 1])
            .with_column("x", [1.0, 2.0]);
        let err = Entity::new("dupes", table, EntityOptions::new("id")).unwrap_err();
        assert!(matches!(err, DfsError::Schema { .. }));
    }

    #[test]
    fn test_null_index_rejected() {
        let table = Table::new().with_column("id", [Some(1), None]);
        let err = Entity::new("nulls", table, EntityOptions::new("id")).unwrap_err();
        assert!(matches!(err, DfsError::Schema { .. }));
    }

    #[test]
    fn test_missing_index_rejected() {
        let table = Table::new().with_column("x", [1.0]);
        let err = Entity::new("t", table, EntityOptions::new("id")).unwrap_err();
        assert!(matches!(err, DfsError::Schema { .. }));
    }

    #[test]
    fn test_non_datetime_time_index_rejected() {
        let table = Table::new()
            .with_column("id", [1, 2])
            .with_column("when", [1.0, 2.0]);
        let err = Entity::new("t", table, EntityOptions::new("id").with_time_index("when"))
            .unwrap_err();
        assert!(matches!(err, DfsError::Schema { .. }));
    }

    #[test]
    fn test_key_type_mismatch_rejected() {
        let mut set = EntitySet::new("s")
            .with_entity(
                "parents",
                Table::new().with_column("id", [1, 2]),
                EntityOptions::new("id"),
            )
            .unwrap()
            .with_entity(
                "children",
                Table::new()
                    .with_column("child_id", [1, 2])
                    .with_column("parent", ["a", "b"]),
                EntityOptions::new("child_id"),
            )
            .unwrap();

        let err = set
            .add_relationship("parents", "id", "children", "parent")
            .unwrap_err();
        assert!(matches!(err, DfsError::Relationship { .. }));
        assert_eq!(set.relationship_count(), 0);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut set = loans_set();
        // payments.index and clients.client_id are both numeric and unique
        let err = set
            .add_relationship("payments", "index", "clients", "client_id")
            .unwrap_err();
        assert!(matches!(err, DfsError::Relationship { .. }));
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_non_unique_parent_key_rejected() {
        let mut set = loans_set();
        let err = set
            .add_relationship("loans", "client_id", "payments", "loan_id")
            .unwrap_err();
        assert!(matches!(err, DfsError::Relationship { .. }));
    }

    #[test]
    fn test_paths() {
        let set = loans_set();
        let down = set.path("clients", "payments").unwrap();
        assert_eq!(down.direction, PathDirection::Forward);
        assert_eq!(down.entities(), vec!["clients", "loans", "payments"]);

        let up = set.path("payments", "clients").unwrap();
        assert_eq!(up.direction, PathDirection::Backward);
        assert_eq!(up.len(), 2);

        assert_eq!(
            set.descendants("clients").unwrap(),
            vec!["loans", "payments"]
        );
        assert_eq!(set.ancestors("payments").unwrap(), vec!["clients", "loans"]);
    }

    fn diamond() -> EntitySet {
        EntitySet::new("diamond")
            .with_entity(
                "regions",
                Table::new().with_column("region_id", [1, 2]),
                EntityOptions::new("region_id"),
            )
            .unwrap()
            .with_entity(
                "stores",
                Table::new()
                    .with_column("store_id", [10, 11])
                    .with_column("region_id", [1, 2]),
                EntityOptions::new("store_id"),
            )
            .unwrap()
            .with_entity(
                "vendors",
                Table::new()
                    .with_column("vendor_id", [20, 21])
                    .with_column("region_id", [1, 1]),
                EntityOptions::new("vendor_id"),
            )
            .unwrap()
            .with_entity(
                "sales",
                Table::new()
                    .with_column("sale_id", [100, 101])
                    .with_column("store_id", [10, 11])
                    .with_column("vendor_id", [20, 21]),
                EntityOptions::new("sale_id"),
            )
            .unwrap()
            .with_entity(
                "holidays",
                Table::new().with_column("day", [1, 2]),
                EntityOptions::new("day"),
            )
            .unwrap()
            .with_relationship("regions", "region_id", "stores", "region_id")
            .unwrap()
            .with_relationship("regions", "region_id", "vendors", "region_id")
            .unwrap()
            .with_relationship("stores", "store_id", "sales", "store_id")
            .unwrap()
            .with_relationship("vendors", "vendor_id", "sales", "vendor_id")
            .unwrap()
    }

    #[test]
    fn test_two_chains_are_ambiguous() {
        let set = diamond();
        let expected = DfsError::NoPath {
            from: "regions".to_string(),
            to: "sales".to_string(),
        };
        assert_eq!(set.path("regions", "sales").unwrap_err(), expected);
        assert!(!set.has_path("sales", "regions"));

        // each single-chain pair still resolves
        assert_eq!(set.path("stores", "sales").unwrap().len(), 1);
        assert_eq!(set.path("sales", "regions").unwrap_err(), DfsError::NoPath {
            from: "sales".to_string(),
            to: "regions".to_string(),
        });
    }

    #[test]
    fn test_unconnected_entities_have_no_path() {
        let set = diamond();
        assert!(matches!(
            set.path("regions", "holidays"),
            Err(DfsError::NoPath { .. })
        ));
        // siblings are not on one directed chain
        assert!(matches!(
            set.path("stores", "vendors"),
            Err(DfsError::NoPath { .. })
        ));
    }

    #[test]
    fn test_display() {
        let set = loans_set();
        insta::assert_snapshot!(set.to_string(), @r"
        Entityset: clients
          Entities:
            clients [Rows: 3, Columns: 3]
            loans [Rows: 3, Columns: 5]
            payments [Rows: 5, Columns: 5]
          Relationships:
            clients.client_id -> loans.client_id
            loans.loan_id -> payments.loan_id
        ");
    }
}
