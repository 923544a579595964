use dynmod_types::{CompositeType, Member, Record, TypeRef, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

fn audit_type() -> Arc<CompositeType> {
    Arc::new(CompositeType::named(
        "Audit",
        vec![
            Member::new("CreatedBy", TypeRef::String),
            Member::new("Revision", TypeRef::Uint32),
        ],
    ))
}

// ── Type inference from examples ─────────────────────────────────

#[test]
fn infers_scalar_types() {
    assert_eq!(Value::from("x").type_ref(), TypeRef::String);
    assert_eq!(Value::from(3_i64).type_ref(), TypeRef::Int);
    assert_eq!(Value::from(3_u64).type_ref(), TypeRef::Uint);
    assert_eq!(Value::from(1.5).type_ref(), TypeRef::Float64);
    assert_eq!(Value::Null.type_ref(), TypeRef::Any);
}

#[test]
fn infers_map_kind_from_values() {
    let mut strings = BTreeMap::new();
    strings.insert("a".to_string(), Value::from("b"));
    assert_eq!(Value::Map(strings).type_ref(), TypeRef::StringMap);

    let mut mixed = BTreeMap::new();
    mixed.insert("a".to_string(), Value::from(1_i64));
    assert_eq!(Value::Map(mixed).type_ref(), TypeRef::AnyMap);
    assert_eq!(Value::Map(BTreeMap::new()).type_ref(), TypeRef::AnyMap);
}

#[test]
fn infers_sequence_from_first_item() {
    let seq = Value::Seq(vec![Value::from(true), Value::from(false)]);
    assert_eq!(seq.type_ref(), TypeRef::sequence(TypeRef::Bool));
    assert_eq!(Value::Seq(vec![]).type_ref(), TypeRef::sequence(TypeRef::Any));
}

#[test]
fn infers_record_type() {
    let record = Record::zero(audit_type());
    assert_eq!(Value::Record(record).type_ref().name(), "Audit");
}

// ── Record access ────────────────────────────────────────────────

#[test]
fn set_converts_into_member_type() {
    let mut record = Record::zero(audit_type());
    record.set("Revision", Value::Int(12)).unwrap();
    assert_eq!(record.get("Revision"), Some(&Value::Uint(12)));
}

#[test]
fn set_unknown_member_fails() {
    let mut record = Record::zero(audit_type());
    let err = record.set("Missing", Value::Int(1)).unwrap_err();
    assert!(err.to_string().contains("Missing"));
}

#[test]
fn promoted_members_are_writable() {
    let outer = Arc::new(CompositeType::new(vec![
        Member::embedded("Audit", TypeRef::Struct(audit_type())),
        Member::new("Title", TypeRef::String),
    ]));
    let mut record = Record::zero(outer);
    record.set("CreatedBy", Value::from("ops")).unwrap();
    let embedded = record.get("Audit").unwrap().as_record().unwrap();
    assert_eq!(embedded.get("CreatedBy"), Some(&Value::from("ops")));
}

// ── JSON rendering ───────────────────────────────────────────────

#[test]
fn record_json_flattens_embedded_members() {
    let outer = Arc::new(CompositeType::new(vec![
        Member::embedded("Audit", TypeRef::Struct(audit_type())),
        Member::new("Title", TypeRef::String),
        Member::new("Labels", TypeRef::sequence(TypeRef::String)),
    ]));
    let record = Record::from_pairs(
        outer,
        [
            ("Title", Value::from("draft")),
            ("CreatedBy", Value::from("ops")),
        ],
    )
    .unwrap();
    assert_eq!(
        record.to_json(),
        serde_json::json!({
            "CreatedBy": "ops",
            "Revision": 0,
            "Title": "draft",
            "Labels": [],
        })
    );
}

#[test]
fn untyped_json_round_trip() {
    let json = serde_json::json!({"a": [1, "two", null], "b": {"c": true}});
    assert_eq!(Value::from_json(&json).to_json(), json);
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    /// Any signed integer survives conversion into a 64-bit slot.
    #[test]
    fn int64_slot_preserves_value(i in any::<i64>()) {
        prop_assert_eq!(TypeRef::Int64.convert(Value::Int(i)), Ok(Value::Int(i)));
    }

    /// Element-wise conversion keeps sequence length and order.
    #[test]
    fn sequence_conversion_keeps_length(items in prop::collection::vec(any::<i32>(), 0..32)) {
        let seq = Value::Seq(items.iter().map(|i| Value::from(*i)).collect());
        let converted = TypeRef::sequence(TypeRef::Float64).convert(seq).unwrap();
        let converted = converted.as_seq().unwrap();
        prop_assert_eq!(converted.len(), items.len());
        for (value, original) in converted.iter().zip(&items) {
            prop_assert_eq!(value.as_f64(), Some(f64::from(*original)));
        }
    }
}
