// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure
#![allow(clippy::too_many_lines)] // Example/test code
#![allow(clippy::similar_names)] // Test variable naming

//! End-to-end predicate round trips.
//!
//! Each test builds a predicate on the sending side, serializes it to bytes,
//! decodes the bytes against a receiving catalog and evaluates the result.

mod common;

use common::{item, reading, sample_catalog, sample_item_type, CLOSURE, INNER, MARKER, OUTER, READING};
use hdds_expr::expr::BinaryOp;
use hdds_expr::types::{names, PrimitiveKind, TypeInfo, Value};
use hdds_expr::{Error, Expr, ExprBuilder, ExpressionSerializer, Packet, Predicate, TypeCatalog};
use std::collections::HashMap;
use std::sync::Arc;

/// Serialize with `sender`, ship as bytes, rebuild with `receiver`.
fn ship(expr: &Expr, sender: &Arc<dyn TypeCatalog>, receiver: &Arc<dyn TypeCatalog>) -> Predicate {
    let bytes = ExpressionSerializer::new(sender.clone())
        .serialize(expr)
        .unwrap()
        .to_bytes()
        .unwrap();
    let packet = Packet::from_bytes(&bytes).unwrap();
    ExpressionSerializer::new(receiver.clone())
        .deserialize(&packet)
        .unwrap()
}

#[test]
fn test_field_equality() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let x = b.parameter("x", sample_item_type(&catalog));

    // x => x.Name == "bbb"
    let body = b
        .equal(b.field(b.param(&x), "Name").unwrap(), b.string("bbb"))
        .unwrap();
    let lambda = b.lambda(body, vec![x]).unwrap();

    let predicate = ship(&lambda, &catalog, &sample_catalog());
    assert_eq!(predicate.input_type().name(), common::SAMPLE_ITEM);
    assert!(predicate.call(&item(2, "bbb")).unwrap());
    assert!(!predicate.call(&item(2, "aaa")).unwrap());
}

#[test]
fn test_or_of_equalities() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let x = b.parameter("x", sample_item_type(&catalog));

    // x => x.Id == 1 || x.Name == "ccc"
    let by_id = b
        .equal(b.field(b.param(&x), "Id").unwrap(), b.int(1))
        .unwrap();
    let by_name = b
        .equal(b.field(b.param(&x), "Name").unwrap(), b.string("ccc"))
        .unwrap();
    let lambda = b.lambda(b.or_else(by_id, by_name).unwrap(), vec![x]).unwrap();

    let predicate = ship(&lambda, &catalog, &catalog);
    let items = [item(1, "aaa"), item(2, "bbb"), item(3, "ccc")];
    let selected: Vec<bool> = items.iter().map(|v| predicate.call(v).unwrap()).collect();
    assert_eq!(selected, vec![true, false, true]);
}

#[test]
fn test_captured_array_contains() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let x = b.parameter("x", sample_item_type(&catalog));

    // x => names.Contains(x.Name)
    let body = b
        .contains(
            b.string_array(&["aaa", "ccc"]),
            b.field(b.param(&x), "Name").unwrap(),
        )
        .unwrap();
    let lambda = b.lambda(body, vec![x]).unwrap();

    let predicate = ship(&lambda, &catalog, &catalog);
    assert!(predicate.call(&item(1, "aaa")).unwrap());
    assert!(!predicate.call(&item(2, "bbb")).unwrap());
    assert!(predicate.call(&item(3, "ccc")).unwrap());
}

#[test]
fn test_captured_struct_is_synthesized_by_builtin_receiver() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let closure_ty = catalog.find_type(CLOSURE).unwrap();
    let captured = Value::structure([("Name", Value::from("bbb"))]);

    // s => s == obj.Name, where obj is a captured sample.Closure
    let s = b.parameter("s", b.primitive(PrimitiveKind::String));
    let obj_name = b
        .field(b.constant(captured, closure_ty), "Name")
        .unwrap();
    let lambda = b
        .lambda(b.equal(b.param(&s), obj_name).unwrap(), vec![s])
        .unwrap();

    let packet = ExpressionSerializer::new(catalog).serialize(&lambda).unwrap();
    let closure = packet
        .types
        .iter()
        .find(|d| d.canonical_name == CLOSURE)
        .unwrap();
    assert!(closure.is_structural());

    // The receiver only knows the built-in library.
    let predicate = hdds_expr::unpack(&packet).unwrap();
    assert!(predicate.call(&Value::from("bbb")).unwrap());
    assert!(!predicate.call(&Value::from("aaa")).unwrap());
}

#[test]
fn test_dictionary_lookup_on_captured_map() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let dict_ty = b
        .dictionary_type(
            b.primitive(PrimitiveKind::String),
            b.primitive(PrimitiveKind::I32),
        )
        .unwrap();
    let scores = Value::Map(vec![
        (Value::from("aaa"), Value::I32(1)),
        (Value::from("bbb"), Value::I32(2)),
    ]);
    let x = b.parameter("x", sample_item_type(&catalog));

    // x => scores[x.Name] == x.Id
    let lookup = b
        .index(b.constant(scores, dict_ty), b.field(b.param(&x), "Name").unwrap())
        .unwrap();
    let body = b
        .equal(lookup, b.field(b.param(&x), "Id").unwrap())
        .unwrap();
    let lambda = b.lambda(body, vec![x]).unwrap();

    let predicate = ship(&lambda, &catalog, &catalog);
    assert!(predicate.call(&item(2, "bbb")).unwrap());
    assert!(!predicate.call(&item(1, "bbb")).unwrap());
    assert!(matches!(
        predicate.call(&item(1, "zzz")),
        Err(Error::Evaluation(_))
    ));
}

#[test]
fn test_array_index_and_string_members() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let s = b.parameter("s", b.primitive(PrimitiveKind::String));

    // s => s.StartsWith(prefixes[1]) && s.Length > 2
    let prefix = b
        .index(b.string_array(&["x", "ab"]), b.int(1))
        .unwrap();
    let starts = b.call(b.param(&s), "StartsWith", vec![prefix]).unwrap();
    let long = b
        .greater_than(b.member(b.param(&s), "Length").unwrap(), b.int(2))
        .unwrap();
    let lambda = b
        .lambda(b.and_also(starts, long).unwrap(), vec![s])
        .unwrap();

    let predicate = hdds_expr::unpack(&hdds_expr::pack(&lambda).unwrap()).unwrap();
    assert!(predicate.call(&Value::from("abc")).unwrap());
    assert!(!predicate.call(&Value::from("ab")).unwrap());
    assert!(!predicate.call(&Value::from("xbc")).unwrap());
}

#[test]
fn test_constructor_and_arithmetic() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let item_ty = sample_item_type(&catalog);
    let x = b.parameter("x", item_ty.clone());

    // x => x.Id + 1 == new SampleItem(3, "tmp").Id
    let made = b
        .new_object(&item_ty, vec![b.int(3), b.string("tmp")])
        .unwrap();
    let body = b
        .equal(
            b.add(b.field(b.param(&x), "Id").unwrap(), b.int(1)).unwrap(),
            b.field(made, "Id").unwrap(),
        )
        .unwrap();
    let lambda = b.lambda(body, vec![x]).unwrap();

    let predicate = ship(&lambda, &catalog, &catalog);
    assert!(predicate.call(&item(2, "a")).unwrap());
    assert!(!predicate.call(&item(3, "a")).unwrap());
}

#[test]
fn test_private_field_is_refused() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let x = b.parameter("x", sample_item_type(&catalog));
    let body = b
        .equal(b.field(b.param(&x), "secret").unwrap(), b.string("hidden"))
        .unwrap();
    let lambda = b.lambda(body, vec![x]).unwrap();

    match ExpressionSerializer::new(catalog).serialize(&lambda) {
        Err(Error::PrivateAccessDenied { type_name, member }) => {
            assert_eq!(type_name, common::SAMPLE_ITEM);
            assert_eq!(member, "secret");
        }
        other => panic!("expected PrivateAccessDenied, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_unary_operator_has_no_wire_form() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let x = b.parameter("x", sample_item_type(&catalog));
    let body = b
        .not(
            b.equal(b.field(b.param(&x), "Id").unwrap(), b.int(1))
                .unwrap(),
        )
        .unwrap();
    let lambda = b.lambda(body, vec![x]).unwrap();

    assert!(matches!(
        hdds_expr::pack(&lambda),
        Err(Error::UnsupportedExpressionShape(_))
    ));
}

#[test]
fn test_parameter_identity_survives_round_trip() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let x = b.parameter("x", sample_item_type(&catalog));
    let body = b
        .and_also(
            b.equal(b.field(b.param(&x), "Id").unwrap(), b.int(1))
                .unwrap(),
            b.equal(b.field(b.param(&x), "Name").unwrap(), b.string("a"))
                .unwrap(),
        )
        .unwrap();
    let lambda = b.lambda(body, vec![x]).unwrap();

    let serializer = ExpressionSerializer::new(catalog);
    let packet = serializer.serialize(&lambda).unwrap();
    let Expr::Lambda(rebuilt) = serializer.deserialize_expr(&packet).unwrap() else {
        panic!("expected a lambda");
    };

    let Expr::Binary(and) = rebuilt.body.as_ref() else {
        panic!("expected a binary body");
    };
    assert_eq!(and.op, BinaryOp::AndAlso);
    let mut referenced = Vec::new();
    for side in [and.left.as_ref(), and.right.as_ref()] {
        let Expr::Binary(eq) = side else {
            panic!("expected an equality");
        };
        let Expr::Member(member) = eq.left.as_ref() else {
            panic!("expected a member access");
        };
        referenced.push(member.target.as_parameter().unwrap().clone());
    }
    assert!(referenced
        .iter()
        .all(|p| p.same_as(&rebuilt.parameters[0])));
}

#[test]
fn test_generic_type_descriptor_names() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let list_ty = b.list_type(b.primitive(PrimitiveKind::I32)).unwrap();
    let ids = Value::Array(vec![Value::I32(1), Value::I32(5)]);
    let x = b.parameter("x", sample_item_type(&catalog));

    // x => ids.Contains(x.Id) with ids a List<int>
    let body = b
        .call(
            b.constant(ids, list_ty),
            "Contains",
            vec![b.field(b.param(&x), "Id").unwrap()],
        )
        .unwrap();
    let lambda = b.lambda(body, vec![x]).unwrap();

    let packet = ExpressionSerializer::new(catalog.clone())
        .serialize(&lambda)
        .unwrap();
    let list_name = format!("{}[[{}]]", names::LIST, names::INT32);
    assert!(packet.types.iter().any(|d| d.canonical_name == list_name));

    let predicate = ExpressionSerializer::new(catalog).deserialize(&packet).unwrap();
    assert!(predicate.call(&item(5, "a")).unwrap());
    assert!(!predicate.call(&item(4, "a")).unwrap());
}

#[test]
fn test_receiver_missing_parameter_type() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let x = b.parameter("x", sample_item_type(&catalog));
    let body = b
        .equal(b.field(b.param(&x), "Name").unwrap(), b.string("bbb"))
        .unwrap();
    let lambda = b.lambda(body, vec![x]).unwrap();
    let packet = ExpressionSerializer::new(catalog).serialize(&lambda).unwrap();

    // The parameter type travels by name only.
    assert!(matches!(
        hdds_expr::unpack(&packet),
        Err(Error::SymbolNotFound(_))
    ));
}

#[test]
fn test_array_initializer_round_trip() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let string = b.primitive(PrimitiveKind::String);
    let s = b.parameter("s", string.clone());

    // s => new[] { "a", s }.Contains("a")
    let array = b
        .new_array(string, vec![b.string("a"), b.param(&s)])
        .unwrap();
    let body = b.contains(array, b.param(&s)).unwrap();
    let lambda = b.lambda(body, vec![s]).unwrap();

    let predicate = ship(&lambda, &catalog, &catalog);
    assert!(predicate.call(&Value::from("anything")).unwrap());
    assert_eq!(
        predicate.as_lambda().return_type().canonical_name(),
        TypeInfo::primitive(PrimitiveKind::Bool).canonical_name()
    );
}

#[test]
fn test_name_alternatives() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let x = b.parameter("x", sample_item_type(&catalog));

    // x => x.Name == "bbb" || x.Name == "aaa"
    let is = |name: &str| {
        b.equal(b.field(b.param(&x), "Name").unwrap(), b.string(name))
            .unwrap()
    };
    let body = b.or_else(is("bbb"), is("aaa")).unwrap();
    let lambda = b.lambda(body, vec![x.clone()]).unwrap();

    let predicate = ship(&lambda, &catalog, &catalog);
    assert!(predicate.call(&item(1, "bbb")).unwrap());
    assert!(predicate.call(&item(1, "aaa")).unwrap());
    assert!(!predicate.call(&item(1, "zzz")).unwrap());
}

#[test]
fn test_string_dictionary_constant_keeps_entries() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let string = b.primitive(PrimitiveKind::String);
    let dict_ty = b.dictionary_type(string.clone(), string.clone()).unwrap();
    let aliases = Value::Map(vec![
        (Value::from("a"), Value::from("aaa")),
        (Value::from("b"), Value::from("bbb")),
    ]);
    let s = b.parameter("s", string);

    // s => aliases["b"] == s
    let lookup = b
        .index(b.constant(aliases.clone(), dict_ty), b.string("b"))
        .unwrap();
    let lambda = b
        .lambda(b.equal(lookup, b.param(&s)).unwrap(), vec![s])
        .unwrap();

    let serializer = ExpressionSerializer::new(catalog);
    let packet = serializer.serialize(&lambda).unwrap();
    let Expr::Lambda(rebuilt) = serializer.deserialize_expr(&packet).unwrap() else {
        panic!("expected a lambda");
    };
    let Expr::Binary(eq) = rebuilt.body.as_ref() else {
        panic!("expected an equality");
    };
    let Expr::Call(call) = eq.left.as_ref() else {
        panic!("expected an indexer call");
    };
    let Some(Expr::Constant(constant)) = call.target.as_deref() else {
        panic!("expected a captured dictionary");
    };
    assert_eq!(constant.value, aliases);

    let predicate = serializer.deserialize(&packet).unwrap();
    assert!(predicate.call(&Value::from("bbb")).unwrap());
    assert!(!predicate.call(&Value::from("aaa")).unwrap());
}

#[test]
fn test_double_equality_is_exact() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let reading_ty = catalog.find_type(READING).unwrap();

    // r => r.Score == 0.0
    let r = b.parameter("r", reading_ty.clone());
    let body = b
        .equal(b.field(b.param(&r), "Score").unwrap(), b.double(0.0))
        .unwrap();
    let is_zero = ship(&b.lambda(body, vec![r]).unwrap(), &catalog, &catalog);
    assert!(is_zero.call(&reading(0.0)).unwrap());
    assert!(is_zero.call(&reading(-0.0)).unwrap());
    assert!(!is_zero.call(&reading(1e-300)).unwrap());
    assert!(!is_zero.call(&reading(f64::MIN_POSITIVE)).unwrap());

    // r => r.Score == r.Score
    let r = b.parameter("r", reading_ty);
    let body = b
        .equal(
            b.field(b.param(&r), "Score").unwrap(),
            b.field(b.param(&r), "Score").unwrap(),
        )
        .unwrap();
    let reflexive = ship(&b.lambda(body, vec![r]).unwrap(), &catalog, &catalog);
    assert!(reflexive.call(&reading(f64::INFINITY)).unwrap());
    assert!(reflexive.call(&reading(f64::NEG_INFINITY)).unwrap());
    assert!(!reflexive.call(&reading(f64::NAN)).unwrap());
}

#[test]
fn test_struct_inside_captured_array_field() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let outer = Value::structure([(
        "Items",
        Value::Array(vec![
            Value::structure([("Name", Value::from("aaa"))]),
            Value::structure([("Name", Value::from("bbb"))]),
        ]),
    )]);

    // s => outer.Items[1].Name == s
    let s = b.parameter("s", b.primitive(PrimitiveKind::String));
    let items = b
        .field(b.constant(outer, catalog.find_type(OUTER).unwrap()), "Items")
        .unwrap();
    let element = b.index(items, b.int(1)).unwrap();
    let body = b
        .equal(b.field(element, "Name").unwrap(), b.param(&s))
        .unwrap();
    let lambda = b.lambda(body, vec![s]).unwrap();

    let packet = ExpressionSerializer::new(catalog).serialize(&lambda).unwrap();
    let inner = packet
        .types
        .iter()
        .find(|d| d.canonical_name == INNER)
        .unwrap();
    assert!(inner.is_structural());
    assert_eq!(inner.fields.len(), 1);

    // Built-ins only: both structs are synthesized from the packet.
    let predicate = hdds_expr::unpack(&packet).unwrap();
    assert!(predicate.call(&Value::from("bbb")).unwrap());
    assert!(!predicate.call(&Value::from("aaa")).unwrap());
}

#[test]
fn test_struct_without_fields_is_synthesized() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let marker = catalog.find_type(MARKER).unwrap();

    // s => s == "a" || marker == null
    let s = b.parameter("s", b.primitive(PrimitiveKind::String));
    let body = b
        .or_else(
            b.equal(b.param(&s), b.string("a")).unwrap(),
            b.equal(
                b.constant(Value::Struct(HashMap::new()), marker.clone()),
                b.null(marker),
            )
            .unwrap(),
        )
        .unwrap();
    let lambda = b.lambda(body, vec![s]).unwrap();

    let packet = ExpressionSerializer::new(catalog).serialize(&lambda).unwrap();
    let desc = packet
        .types
        .iter()
        .find(|d| d.canonical_name == MARKER)
        .unwrap();
    assert!(desc.is_structural());
    assert!(desc.fields.is_empty());

    let predicate = hdds_expr::unpack(&packet).unwrap();
    assert!(predicate.call(&Value::from("a")).unwrap());
    assert!(!predicate.call(&Value::from("b")).unwrap());
}

#[test]
fn test_nested_lambda_predicate() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let string = b.primitive(PrimitiveKind::String);
    let x = b.parameter("x", sample_item_type(&catalog));
    let s = b.parameter("s", string.clone());

    // x => new[] { "aaa", "bbb" }.Any(s => s == x.Name)
    let matches_name = b
        .lambda(
            b.equal(b.param(&s), b.field(b.param(&x), "Name").unwrap())
                .unwrap(),
            vec![s],
        )
        .unwrap();
    let any = b
        .call_generic(
            names::ENUMERABLE,
            "Any",
            vec![string],
            vec![b.string_array(&["aaa", "bbb"]), matches_name],
        )
        .unwrap();
    let lambda = b.lambda(any, vec![x]).unwrap();

    let predicate = ship(&lambda, &catalog, &sample_catalog());
    assert!(predicate.call(&item(1, "aaa")).unwrap());
    assert!(predicate.call(&item(2, "bbb")).unwrap());
    assert!(!predicate.call(&item(3, "ccc")).unwrap());
}

#[test]
fn test_first_and_last_elements() {
    let catalog = sample_catalog();
    let b = ExprBuilder::new(catalog.clone());
    let string = b.primitive(PrimitiveKind::String);
    let names_array = || b.string_array(&["aaa", "bbb", "ccc"]);

    // s => names.First() == s || names.Last() == s
    let s = b.parameter("s", string.clone());
    let first = b
        .call_generic(names::ENUMERABLE, "First", vec![string.clone()], vec![names_array()])
        .unwrap();
    let last = b
        .call_generic(names::ENUMERABLE, "Last", vec![string.clone()], vec![names_array()])
        .unwrap();
    let body = b
        .or_else(
            b.equal(first, b.param(&s)).unwrap(),
            b.equal(last, b.param(&s)).unwrap(),
        )
        .unwrap();
    let predicate = ship(&b.lambda(body, vec![s]).unwrap(), &catalog, &catalog);
    assert!(predicate.call(&Value::from("aaa")).unwrap());
    assert!(predicate.call(&Value::from("ccc")).unwrap());
    assert!(!predicate.call(&Value::from("bbb")).unwrap());

    // s => empty.First() == s
    let s = b.parameter("s", string.clone());
    let first = b
        .call_generic(
            names::ENUMERABLE,
            "First",
            vec![string],
            vec![b.string_array::<&str>(&[])],
        )
        .unwrap();
    let body = b.equal(first, b.param(&s)).unwrap();
    let predicate = ship(&b.lambda(body, vec![s]).unwrap(), &catalog, &catalog);
    assert!(matches!(
        predicate.call(&Value::from("aaa")),
        Err(Error::Evaluation(_))
    ));
}
