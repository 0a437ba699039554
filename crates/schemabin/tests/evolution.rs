// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reading streams written by another version of a record type.

use schemabin::{
    CodecConfig, DeriveError, FieldTags, ScalarKind, SchemaDeriver, SchemaId, SchemaReader,
    SchemaRegistryReader, SchemaRegistryWriter, SchemaSet, SchemaWriter, StructBuilder,
    StructDescriptor, TypeRef, Value, MISSING_FIELD_OFFSET,
};
use std::io::Cursor;

fn derive(descriptors: Vec<StructDescriptor>) -> (SchemaSet, SchemaId) {
    let mut deriver = SchemaDeriver::new();
    let top = descriptors[0].name.clone();
    for descriptor in descriptors {
        deriver.declare(descriptor);
    }
    let id = deriver.derive_schema(&top).expect("derive");
    (deriver.into_schemas(), id)
}

/// Write `values` with the writer's schemas, read them back with the
/// reader's.
fn transcode(
    (writer_set, writer_id): (&SchemaSet, SchemaId),
    (reader_set, reader_id): (&SchemaSet, SchemaId),
    values: &[Value],
) -> Vec<Value> {
    let mut registry = SchemaRegistryWriter::new();
    let mut records = Cursor::new(Vec::new());
    {
        let mut writer = SchemaWriter::new(&mut records, writer_set, &mut registry);
        for value in values {
            writer.write_record(writer_id, value, &mut ()).expect("write");
        }
    }
    let mut table = Vec::new();
    registry.finalize(&mut table).expect("finalize");

    let mut registry =
        SchemaRegistryReader::read_from(&mut table.as_slice(), &CodecConfig::default())
            .expect("table");
    records.set_position(0);
    let mut reader = SchemaReader::new(&mut records, reader_set, &mut registry);
    values
        .iter()
        .map(|_| reader.read_record(reader_id, &mut ()).expect("read"))
        .collect()
}

fn user_v1() -> StructDescriptor {
    StructBuilder::new("app.User")
        .field("id", ScalarKind::U32)
        .string_field("name")
        .list_field("tags", TypeRef::String)
        .build()
}

fn user_v2() -> StructDescriptor {
    StructBuilder::new("app.User")
        .field("id", ScalarKind::U32)
        .field_with_tags(
            "level",
            TypeRef::Scalar(ScalarKind::U8),
            FieldTags::new().default_value("3"),
        )
        .string_field("name")
        .optional_field("email", TypeRef::String)
        .list_field("tags", TypeRef::String)
        .build()
}

fn alice_v1() -> Value {
    Value::record([
        ("id", Value::U32(1)),
        ("name", Value::from("alice")),
        (
            "tags",
            Value::List(vec![Value::from("admin"), Value::from("ops")]),
        ),
    ])
}

#[test]
fn test_user_scenario() {
    let (set, id) = derive(vec![user_v1()]);
    let decoded = transcode((&set, id), (&set, id), &[alice_v1()]);
    assert_eq!(decoded[0], alice_v1());
    assert_eq!(decoded[0].field("tags").and_then(Value::as_list).map(<[_]>::len), Some(2));
}

#[test]
fn test_newer_reader_takes_defaults() {
    let (old, old_id) = derive(vec![user_v1()]);
    let (new, new_id) = derive(vec![user_v2()]);

    let decoded = transcode((&old, old_id), (&new, new_id), &[alice_v1()]);
    let user = &decoded[0];
    assert_eq!(user.field("id"), Some(&Value::U32(1)));
    assert_eq!(user.field("name").and_then(Value::as_str), Some("alice"));
    assert_eq!(user.field("level"), Some(&Value::U8(3)));
    assert_eq!(user.field("email"), Some(&Value::none()));
    assert_eq!(user.field("tags").and_then(Value::as_list).map(<[_]>::len), Some(2));
}

#[test]
fn test_older_reader_skips_unknown_fields() {
    let (old, old_id) = derive(vec![user_v1()]);
    let (new, new_id) = derive(vec![user_v2()]);

    let bob = Value::record([
        ("id", Value::U32(2)),
        ("level", Value::U8(9)),
        ("name", Value::from("bob")),
        ("email", Value::some(Value::from("bob@example.com"))),
        ("tags", Value::List(vec![])),
    ]);
    let carol = Value::record([
        ("id", Value::U32(3)),
        ("level", Value::U8(1)),
        ("name", Value::from("carol")),
        ("email", Value::none()),
        ("tags", Value::List(vec![Value::from("x")])),
    ]);

    // Two records back to back: the second must start exactly where the
    // first block ends even though the reader ignored part of it.
    let decoded = transcode((&new, new_id), (&old, old_id), &[bob, carol]);
    assert_eq!(
        decoded[0],
        Value::record([
            ("id", Value::U32(2)),
            ("name", Value::from("bob")),
            ("tags", Value::List(vec![])),
        ])
    );
    assert_eq!(decoded[1].field("name").and_then(Value::as_str), Some("carol"));
}

#[test]
fn test_binding_marks_missing_fields() {
    let (old, _) = derive(vec![user_v1()]);
    let (new, new_id) = derive(vec![user_v2()]);
    let raw: Vec<_> = old
        .lookup("app.User")
        .map(|(_, s)| s.descriptors().cloned().collect())
        .expect("v1");

    let reader_schema = new.get(new_id).cloned().expect("v2");
    let bound = schemabin::MaterializedSchema::bind(0, reader_schema, &raw);
    assert_eq!(bound.offsets[1], MISSING_FIELD_OFFSET);
    assert_eq!(bound.offsets[3], MISSING_FIELD_OFFSET);
    let missing: Vec<&str> = bound.missing_fields().collect();
    assert_eq!(missing, vec!["level", "email"]);
}

#[test]
fn test_changed_field_type_falls_back_to_default() {
    let writer_side = StructBuilder::new("app.Metric")
        .string_field("name")
        .list_field("samples", TypeRef::Scalar(ScalarKind::U32))
        .field("unit", ScalarKind::U8)
        .build();
    let reader_side = StructBuilder::new("app.Metric")
        .string_field("name")
        .list_field("samples", TypeRef::Scalar(ScalarKind::F64))
        .field("unit", ScalarKind::U8)
        .build();
    let (w, w_id) = derive(vec![writer_side]);
    let (r, r_id) = derive(vec![reader_side]);

    let metric = Value::record([
        ("name", Value::from("latency")),
        ("samples", Value::List(vec![Value::U32(5), Value::U32(7)])),
        ("unit", Value::U8(2)),
    ]);
    let decoded = transcode((&w, w_id), (&r, r_id), &[metric]);

    // Same top-level tag, different element tag: the field decodes to its
    // zero value and the rest of the block is unaffected.
    assert_eq!(decoded[0].field("samples"), Some(&Value::List(vec![])));
    assert_eq!(decoded[0].field("name").and_then(Value::as_str), Some("latency"));
    assert_eq!(decoded[0].field("unit"), Some(&Value::U8(2)));
}

#[test]
fn test_nested_record_evolution() {
    let owner_v1 = StructBuilder::new("app.Team")
        .string_field("title")
        .list_field("members", TypeRef::record("app.User"))
        .build();
    let (old, old_id) = derive(vec![owner_v1.clone(), user_v1()]);
    let (new, new_id) = derive(vec![owner_v1, user_v2()]);

    let team = Value::record([
        ("title", Value::from("core")),
        ("members", Value::List(vec![alice_v1(), alice_v1()])),
    ]);
    let decoded = transcode((&old, old_id), (&new, new_id), &[team]);
    let members = decoded[0]
        .field("members")
        .and_then(Value::as_list)
        .expect("members");
    assert_eq!(members.len(), 2);
    for member in members {
        assert_eq!(member.field("level"), Some(&Value::U8(3)));
        assert_eq!(member.field("name").and_then(Value::as_str), Some("alice"));
    }
}

#[test]
fn test_self_reference_and_inline_cycle() {
    // Records may reach themselves: the reference terminates derivation.
    let node = StructBuilder::new("app.Node")
        .field("value", ScalarKind::I64)
        .list_field("children", TypeRef::record("app.Node"))
        .build();
    let (set, id) = derive(vec![node]);
    let tree = Value::record([
        ("value", Value::I64(1)),
        (
            "children",
            Value::List(vec![Value::record([
                ("value", Value::I64(2)),
                ("children", Value::List(vec![])),
            ])]),
        ),
    ]);
    let decoded = transcode((&set, id), (&set, id), std::slice::from_ref(&tree));
    assert_eq!(decoded[0], tree);

    // Inline composites may not.
    let mut deriver = SchemaDeriver::new();
    deriver.declare(
        StructBuilder::new("geo.A")
            .record_field("b", "geo.B")
            .build(),
    );
    deriver.declare(
        StructBuilder::new("geo.B")
            .record_field("a", "geo.A")
            .build(),
    );
    deriver.declare(StructBuilder::new("geo.Holder").record_field("a", "geo.A").build());
    deriver.register_strategy(std::sync::Arc::new(schemabin::InlineStrategy::new("geo.A")));
    deriver.register_strategy(std::sync::Arc::new(schemabin::InlineStrategy::new("geo.B")));

    match deriver.derive_schema("geo.Holder") {
        Err(DeriveError::Recursion { path, .. }) => assert_eq!(path, "geo.A -> geo.B -> geo.A"),
        other => panic!("expected recursion error, got {:?}", other),
    }
    assert!(deriver.schemas().is_empty());
}

#[test]
fn test_inline_composite_reaches_back_through_record_field() {
    // A holds B by value; B points back at A through an optional record
    // field, which ends the layout recursion.
    let mut deriver = SchemaDeriver::new();
    deriver.declare(
        StructBuilder::new("cyc.A")
            .field("n", ScalarKind::U8)
            .record_field("b", "cyc.B")
            .build(),
    );
    deriver.declare(
        StructBuilder::new("cyc.B")
            .field("m", ScalarKind::U8)
            .optional_field("a", TypeRef::record("cyc.A"))
            .string_field("label")
            .build(),
    );
    deriver.register_strategy(std::sync::Arc::new(schemabin::InlineStrategy::new("cyc.B")));
    let id = deriver.derive_schema("cyc.A").expect("derive");
    assert!(deriver.warnings().is_empty(), "{:?}", deriver.warnings());
    let set = deriver.into_schemas();
    assert_eq!(set.len(), 1, "B never gets a schema of its own");

    let leaf = Value::record([
        ("n", Value::U8(3)),
        (
            "b",
            Value::record([
                ("m", Value::U8(4)),
                ("a", Value::none()),
                ("label", Value::from("leaf")),
            ]),
        ),
    ]);
    let root = Value::record([
        ("n", Value::U8(1)),
        (
            "b",
            Value::record([
                ("m", Value::U8(2)),
                ("a", Value::some(leaf.clone())),
                ("label", Value::from("root")),
            ]),
        ),
    ]);

    let decoded = transcode((&set, id), (&set, id), &[root.clone(), leaf]);
    assert_eq!(decoded[0], root);
    let back = decoded[0]
        .field("b")
        .and_then(|b| b.field("a"))
        .expect("back-reference");
    assert_eq!(
        back,
        &Value::some(decoded[1].clone()),
        "the nested A keeps its own inline B"
    );
}
