//! End-to-end checks of the public API through the `eels` facade.

use std::sync::Arc;
use std::thread;

use eels::prelude::*;
use eels::{fingerprint, merge_all};

fn people() -> Schema {
    let cfg = SchemaConfig::default();
    let address = build_schema(
        vec![
            build_field("street", FieldType::String, true, None, None, &cfg).unwrap(),
            build_field("zipcode", FieldType::String, false, None, None, &cfg).unwrap(),
        ],
        &cfg,
    )
    .unwrap();
    build_schema(
        vec![
            build_field("id", FieldType::Long, false, None, None, &cfg).unwrap(),
            build_field("address", FieldType::Struct, true, None, Some(address), &cfg).unwrap(),
        ],
        &cfg,
    )
    .unwrap()
}

#[test]
fn test_canonical_rendering() {
    let schema = Schema::new(vec![
        Field::new("id", FieldType::Int, false),
        Field::new("name", FieldType::String, true),
    ]);
    assert_eq!(schema.to_string(), "id:Int, name:String?");
    assert_eq!(
        people().to_string(),
        "id:Long, address:Struct?<street:String?, zipcode:String>"
    );
}

#[test]
fn test_duplicate_names_follow_case_policy() {
    let sensitive = SchemaConfig::default();
    let twice = vec![
        Field::new("id", FieldType::Int, false),
        Field::new("id", FieldType::Int, false),
    ];
    assert!(matches!(
        build_schema(twice, &sensitive),
        Err(Error::DuplicateFieldName { ref name }) if name == "id"
    ));

    let insensitive = SchemaConfig {
        case_sensitive_names: false,
        ..Default::default()
    };
    let mixed = vec![
        Field::new("id", FieldType::Int, false),
        Field::new("ID", FieldType::Int, false),
    ];
    assert!(matches!(
        build_schema(mixed, &insensitive),
        Err(Error::DuplicateFieldName { .. })
    ));
}

#[test]
fn test_merge_examples() {
    let cfg = SchemaConfig::default();
    let ints = Schema::new(vec![Field::new("amount", FieldType::Int, false)]);
    let decimals = Schema::new(vec![Field::new("amount", FieldType::Decimal, false)]);
    let merged = merge_schemas(&ints, &decimals, &cfg).unwrap();
    assert_eq!(merged, decimals);

    let flags = Schema::new(vec![Field::new("flag", FieldType::Boolean, false)]);
    let strings = Schema::new(vec![Field::new("flag", FieldType::String, false)]);
    assert_eq!(
        merge_schemas(&flags, &strings, &cfg).unwrap_err(),
        Error::IncompatibleType {
            field: "flag".into(),
            left: FieldType::Boolean,
            right: FieldType::String,
        }
    );
}

#[test]
fn test_every_type_widens_to_itself() {
    for ty in FieldType::ALL {
        assert_eq!(widen(ty, ty), WidenResult::Equal);
    }
}

#[test]
fn test_built_schemas_validate() {
    let schema = people();
    assert!(validate(&schema, &SchemaConfig::default()).is_ok());
}

#[test]
fn test_partitioned_sources_reconcile() {
    let cfg = SchemaConfig::default();
    let january = people();
    let february = people()
        .update_field_type("id", FieldType::Decimal)
        .unwrap()
        .add_field(Field::new("email", FieldType::String, false), &cfg)
        .unwrap();
    let march = people().drop_field("address").unwrap();

    let merged = merge_all([&january, &february, &march], &cfg).unwrap();
    assert_eq!(
        merged.to_string(),
        "id:Decimal, address:Struct?<street:String?, zipcode:String>, email:String?"
    );
    assert!(validate(&merged, &cfg).is_ok());
    assert_ne!(fingerprint(&merged).unwrap(), fingerprint(&january).unwrap());
}

#[test]
fn test_shared_schema_across_threads() {
    let schema = Arc::new(people());
    let cfg = SchemaConfig::default();

    thread::scope(|scope| {
        for i in 0..4 {
            let schema = Arc::clone(&schema);
            let cfg = &cfg;
            scope.spawn(move || {
                assert!(validate(&schema, cfg).is_ok());
                let extra = Schema::new(vec![Field::new(format!("f{}", i), FieldType::Int, true)]);
                let merged = merge_schemas(&schema, &extra, cfg).unwrap();
                assert_eq!(merged.len(), 3);
            });
        }
    });

    // The shared original was never touched.
    assert_eq!(schema.len(), 2);
}
