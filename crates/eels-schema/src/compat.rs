//! Type compatibility: the widening table and schema merge.
//!
//! Widening is the reflexive-transitive closure of
//! Short→Int→Long→BigInt, Float→Double, Int→Decimal and Long→Decimal.
//! Closing it transitively is what keeps merge associative: Short meets
//! Decimal the same way whether or not an Int source sits in between.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SchemaConfig;
use crate::error::{Error, Result};
use crate::field_type::FieldType;
use crate::schema::{Field, Metadata, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WidenResult {
    Equal,
    /// Both sides widen losslessly into this (the wider) type.
    WidensTo(FieldType),
    Incompatible,
}

impl WidenResult {
    pub fn is_compatible(self) -> bool {
        !matches!(self, WidenResult::Incompatible)
    }
}

/// Types `ty` widens into, excluding itself.
const fn widening_targets(ty: FieldType) -> &'static [FieldType] {
    use crate::field_type::FieldType::*;
    match ty {
        Short => &[Int, Long, BigInt, Decimal],
        Int => &[Long, BigInt, Decimal],
        Long => &[BigInt, Decimal],
        Float => &[Double],
        BigInt | Binary | Boolean | Date | Decimal | Double | String | Struct | Timestamp => &[],
    }
}

pub fn widens_to(from: FieldType, to: FieldType) -> bool {
    from == to || widening_targets(from).contains(&to)
}

/// Compare two types. The answer's compatibility does not depend on argument
/// order, and `WidensTo` always names the wider side.
pub fn widen(a: FieldType, b: FieldType) -> WidenResult {
    if a == b {
        WidenResult::Equal
    } else if widening_targets(a).contains(&b) {
        WidenResult::WidensTo(b)
    } else if widening_targets(b).contains(&a) {
        WidenResult::WidensTo(a)
    } else {
        WidenResult::Incompatible
    }
}

/// Narrowest type both `a` and `b` widen into.
pub fn common_supertype(a: FieldType, b: FieldType) -> Option<FieldType> {
    match widen(a, b) {
        WidenResult::Equal => Some(a),
        WidenResult::WidensTo(t) => Some(t),
        WidenResult::Incompatible => None,
    }
}

/// Reconcile two schemas, e.g. from two partitions of one source.
///
/// Fields present on both sides (matched by name under the case policy) take
/// their common supertype and are nullable if either side is. When the two
/// spellings differ, the lexicographically smallest one is kept. Fields present
/// on one side only are carried through as nullable. Struct pairs merge
/// recursively. Metadata is unioned; a key with two values keeps the
/// lexicographically greatest one.
///
/// The result lists `a`'s fields in order followed by the fields only `b`
/// has. Up to that ordering the operation is commutative and associative.
pub fn merge_schemas(a: &Schema, b: &Schema, config: &SchemaConfig) -> Result<Schema> {
    let merged = merge_level(a, b, config, "")?;

    #[cfg(feature = "tracing")]
    tracing::trace!(
        left = a.len(),
        right = b.len(),
        merged = merged.len(),
        "merged schemas"
    );

    Ok(merged)
}

/// Left fold of [`merge_schemas`]; an empty input yields an empty schema.
pub fn merge_all<'a, I>(schemas: I, config: &SchemaConfig) -> Result<Schema>
where
    I: IntoIterator<Item = &'a Schema>,
{
    let mut iter = schemas.into_iter();
    let first = match iter.next() {
        Some(s) => s.clone(),
        None => return Ok(Schema::empty()),
    };
    iter.try_fold(first, |acc, next| merge_schemas(&acc, next, config))
}

fn merge_level(a: &Schema, b: &Schema, config: &SchemaConfig, prefix: &str) -> Result<Schema> {
    let mut fields = Vec::with_capacity(a.len().max(b.len()));

    for left in &a.fields {
        match b.fields.iter().find(|r| config.names_match(&left.name, &r.name)) {
            Some(right) => fields.push(merge_field(left, right, config, prefix)?),
            None => fields.push(one_sided(left)),
        }
    }
    for right in &b.fields {
        if !a.fields.iter().any(|l| config.names_match(&l.name, &right.name)) {
            fields.push(one_sided(right));
        }
    }

    Ok(Schema::new(fields))
}

fn one_sided(field: &Field) -> Field {
    Field {
        nullable: true,
        ..field.clone()
    }
}

fn merge_field(left: &Field, right: &Field, config: &SchemaConfig, prefix: &str) -> Result<Field> {
    // Names only differ in spelling under the case-insensitive policy.
    let name = left.name.as_str().min(right.name.as_str()).to_string();
    let path = if prefix.is_empty() {
        name.clone()
    } else {
        format!("{}{}{}", prefix, config.name_delimiter, name)
    };

    let field_type =
        common_supertype(left.field_type, right.field_type).ok_or_else(|| {
            Error::IncompatibleType {
                field: path.clone(),
                left: left.field_type,
                right: right.field_type,
            }
        })?;

    let nested = if field_type.is_struct() {
        match (left.nested(), right.nested()) {
            (Some(l), Some(r)) => Some(Arc::new(merge_level(l, r, config, &path)?)),
            _ => {
                return Err(Error::StructuralMismatch {
                    path,
                    field_type,
                    has_nested: false,
                })
            }
        }
    } else {
        None
    };

    Ok(Field {
        name,
        field_type,
        nullable: left.nullable || right.nullable,
        metadata: merge_metadata(&left.metadata, &right.metadata),
        nested,
    })
}

fn merge_metadata(a: &Metadata, b: &Metadata) -> Metadata {
    let mut out = a.clone();
    for (k, v) in b {
        match out.get_mut(k) {
            Some(existing) if existing.as_str() >= v.as_str() => {}
            Some(existing) => *existing = v.clone(),
            None => {
                out.insert(k.clone(), v.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_type::FieldType::*;

    fn single(name: &str, ty: FieldType, nullable: bool) -> Schema {
        Schema::new(vec![Field::new(name, ty, nullable)])
    }

    #[test]
    fn every_type_equals_itself() {
        for ty in FieldType::ALL {
            assert_eq!(widen(ty, ty), WidenResult::Equal);
            assert_eq!(common_supertype(ty, ty), Some(ty));
        }
    }

    #[test]
    fn widening_table() {
        assert_eq!(widen(Short, Int), WidenResult::WidensTo(Int));
        assert_eq!(widen(Int, Long), WidenResult::WidensTo(Long));
        assert_eq!(widen(Long, BigInt), WidenResult::WidensTo(BigInt));
        assert_eq!(widen(Short, BigInt), WidenResult::WidensTo(BigInt));
        assert_eq!(widen(Float, Double), WidenResult::WidensTo(Double));
        assert_eq!(widen(Int, Decimal), WidenResult::WidensTo(Decimal));
        assert_eq!(widen(Long, Decimal), WidenResult::WidensTo(Decimal));
        assert_eq!(widen(Short, Decimal), WidenResult::WidensTo(Decimal));

        assert_eq!(widen(BigInt, Decimal), WidenResult::Incompatible);
        assert_eq!(widen(Int, Double), WidenResult::Incompatible);
        assert_eq!(widen(Float, Decimal), WidenResult::Incompatible);
        assert_eq!(widen(Date, Timestamp), WidenResult::Incompatible);
        assert_eq!(widen(Boolean, String), WidenResult::Incompatible);
    }

    #[test]
    fn non_numeric_types_only_equal_themselves() {
        for ty in [String, Binary, Boolean, Date, Timestamp, Struct] {
            for other in FieldType::ALL {
                let expected = if ty == other {
                    WidenResult::Equal
                } else {
                    WidenResult::Incompatible
                };
                assert_eq!(widen(ty, other), expected, "{} vs {}", ty, other);
            }
        }
    }

    #[test]
    fn widen_agrees_in_both_directions() {
        for a in FieldType::ALL {
            for b in FieldType::ALL {
                assert_eq!(widen(a, b), widen(b, a), "{} vs {}", a, b);
                assert_eq!(
                    widens_to(a, b) || widens_to(b, a),
                    widen(a, b).is_compatible()
                );
            }
        }
    }

    #[test]
    fn merge_widens_shared_fields() {
        let cfg = SchemaConfig::default();
        let merged =
            merge_schemas(&single("amount", Int, false), &single("amount", Decimal, false), &cfg)
                .unwrap();
        assert_eq!(merged.to_string(), "amount:Decimal");
    }

    #[test]
    fn merge_rejects_incompatible_types() {
        let cfg = SchemaConfig::default();
        let err =
            merge_schemas(&single("flag", Boolean, false), &single("flag", String, false), &cfg)
                .unwrap_err();
        assert_eq!(
            err,
            Error::IncompatibleType {
                field: "flag".into(),
                left: Boolean,
                right: String,
            }
        );
    }

    #[test]
    fn one_sided_fields_become_nullable() {
        let cfg = SchemaConfig::default();
        let a = Schema::new(vec![
            Field::new("id", Int, false),
            Field::new("name", String, false),
        ]);
        let b = Schema::new(vec![
            Field::new("id", Long, true),
            Field::new("score", Double, false),
        ]);
        let merged = merge_schemas(&a, &b, &cfg).unwrap();
        assert_eq!(merged.to_string(), "id:Long?, name:String?, score:Double?");
    }

    #[test]
    fn structs_merge_recursively_and_report_nested_paths() {
        let cfg = SchemaConfig::default();
        let a = Schema::new(vec![Field::new_struct(
            "address",
            Schema::new(vec![Field::new("zip", Int, false)]),
            false,
        )]);
        let b = Schema::new(vec![Field::new_struct(
            "address",
            Schema::new(vec![
                Field::new("zip", Long, false),
                Field::new("city", String, false),
            ]),
            false,
        )]);
        let merged = merge_schemas(&a, &b, &cfg).unwrap();
        assert_eq!(merged.to_string(), "address:Struct<zip:Long, city:String?>");

        let c = Schema::new(vec![Field::new_struct(
            "address",
            Schema::new(vec![Field::new("zip", String, false)]),
            false,
        )]);
        let err = merge_schemas(&a, &c, &cfg).unwrap_err();
        assert!(matches!(err, Error::IncompatibleType { ref field, .. } if field == "address.zip"));

        let scalar = single("address", String, false);
        assert!(matches!(
            merge_schemas(&a, &scalar, &cfg),
            Err(Error::IncompatibleType { .. })
        ));
    }

    #[test]
    fn case_insensitive_merge_matches_names() {
        let cfg = SchemaConfig {
            case_sensitive_names: false,
            ..Default::default()
        };
        let ab =
            merge_schemas(&single("Id", Short, false), &single("ID", Int, false), &cfg).unwrap();
        let ba =
            merge_schemas(&single("ID", Int, false), &single("Id", Short, false), &cfg).unwrap();
        assert_eq!(ab.to_string(), "ID:Int");
        assert_eq!(ab, ba);

        let nested = |inner: &str, ty| {
            Schema::new(vec![Field::new_struct(
                "Addr",
                Schema::new(vec![Field::new(inner, ty, false)]),
                false,
            )])
        };
        let err = merge_schemas(&nested("Zip", Int), &nested("zip", Boolean), &cfg).unwrap_err();
        assert!(matches!(err, Error::IncompatibleType { ref field, .. } if field == "Addr.Zip"));

        let merged = merge_schemas(
            &single("Id", Short, false),
            &single("ID", Int, false),
            &SchemaConfig::default(),
        )
        .unwrap();
        assert_eq!(merged.to_string(), "Id:Short?, ID:Int?");
    }

    #[test]
    fn metadata_conflicts_keep_greatest_value() {
        let cfg = SchemaConfig::default();
        let a = Schema::new(vec![Field::new("id", Int, false)
            .with_metadata("source", "csv")
            .with_metadata("owner", "etl")]);
        let b = Schema::new(vec![Field::new("id", Int, false).with_metadata("source", "parquet")]);
        let ab = merge_schemas(&a, &b, &cfg).unwrap();
        let ba = merge_schemas(&b, &a, &cfg).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.fields[0].metadata.get("source").unwrap(), "parquet");
        assert_eq!(ab.fields[0].metadata.get("owner").unwrap(), "etl");
    }

    #[test]
    fn merge_all_folds_left() {
        let cfg = SchemaConfig::default();
        let parts = vec![
            single("n", Short, false),
            single("n", Int, false),
            single("n", Decimal, false),
        ];
        assert_eq!(merge_all(&parts, &cfg).unwrap().to_string(), "n:Decimal");
        assert!(merge_all(std::iter::empty::<&Schema>(), &cfg).unwrap().is_empty());
    }
}
