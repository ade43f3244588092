// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in library installed by [`Catalog::with_builtins`].
//!
//! [`Catalog::with_builtins`]: crate::types::Catalog::with_builtins

use crate::error::{Error, Result};
use crate::eval::Closure;
use crate::types::{
    names, Catalog, GenericOwner, MemberInfo, MethodInfo, PrimitiveKind, TypeInfo, TypeKind,
    Value,
};
use std::sync::Arc;

const PRIMITIVES: [PrimitiveKind; 7] = [
    PrimitiveKind::Bool,
    PrimitiveKind::I32,
    PrimitiveKind::I64,
    PrimitiveKind::F64,
    PrimitiveKind::Char,
    PrimitiveKind::String,
    PrimitiveKind::Void,
];

pub(crate) fn install(catalog: &mut Catalog) {
    for kind in PRIMITIVES {
        catalog.register_type(TypeInfo::primitive(kind));
    }
    catalog.register_type(TypeInfo::object());

    let mut funcs = Vec::new();
    for (arity, name) in [names::FUNC1, names::FUNC2, names::FUNC3].iter().enumerate() {
        funcs.push(catalog.register_type(TypeInfo::generic_definition(
            *name,
            TypeKind::Function,
            arity + 1,
        )));
    }

    let sequence = catalog.register_type(TypeInfo::generic_definition(
        names::SEQUENCE,
        TypeKind::Sequence,
        1,
    ));
    let list = catalog.register_type(TypeInfo::generic_definition(
        names::LIST,
        TypeKind::Sequence,
        1,
    ));
    let dictionary = catalog.register_type(TypeInfo::generic_definition(
        names::DICTIONARY,
        TypeKind::Map,
        2,
    ));
    let enumerable = catalog.register_type(TypeInfo::static_holder(names::ENUMERABLE));

    install_enumerable(catalog, &enumerable, &sequence, &funcs[1]);
    install_string(catalog);
    install_list(catalog, &list);
    install_dictionary(catalog, &dictionary);

    log::debug!("[catalog] installed {} built-in types", catalog.len());
}

fn bool_type() -> Arc<TypeInfo> {
    TypeInfo::primitive(PrimitiveKind::Bool)
}

fn int_type() -> Arc<TypeInfo> {
    TypeInfo::primitive(PrimitiveKind::I32)
}

fn string_type() -> Arc<TypeInfo> {
    TypeInfo::primitive(PrimitiveKind::String)
}

fn sequence_arg<'a>(args: &'a [Value], method: &str) -> Result<&'a [Value]> {
    match args.first() {
        Some(Value::Array(items)) => Ok(items),
        Some(Value::Null) => Err(Error::Evaluation(format!("{}: source is null", method))),
        Some(other) => Err(Error::TypeMismatch(format!(
            "{}: expected a sequence, got {}",
            method,
            other.kind_name()
        ))),
        None => Err(Error::Evaluation(format!("{}: missing source", method))),
    }
}

fn predicate_arg<'a>(args: &'a [Value], method: &str) -> Result<&'a Closure> {
    match args.get(1) {
        Some(Value::Function(f)) => Ok(f),
        Some(other) => Err(Error::TypeMismatch(format!(
            "{}: expected a predicate, got {}",
            method,
            other.kind_name()
        ))),
        None => Err(Error::Evaluation(format!("{}: missing predicate", method))),
    }
}

fn count(len: usize) -> Result<Value> {
    i32::try_from(len)
        .map(Value::I32)
        .map_err(|_| Error::Evaluation(format!("count {} overflows Int32", len)))
}

// ---------------------------------------------------------------------------
// Enumerable (static, generic over !!0)
// ---------------------------------------------------------------------------

fn install_enumerable(
    catalog: &mut Catalog,
    enumerable: &Arc<TypeInfo>,
    sequence: &Arc<TypeInfo>,
    func2: &Arc<TypeInfo>,
) {
    let t = TypeInfo::generic_parameter(GenericOwner::Method, 0);
    let seq_of_t = sequence.substitute(&[Arc::clone(&t)], &[]);
    let predicate_of_t = func2.substitute(&[Arc::clone(&t), bool_type()], &[]);

    catalog.register_method(
        MethodInfo::new_static(
            Arc::clone(enumerable),
            "Contains",
            vec![Arc::clone(&seq_of_t), Arc::clone(&t)],
            bool_type(),
            Arc::new(|_, args| {
                let items = sequence_arg(args, "Contains")?;
                let needle = args.get(1).unwrap_or(&Value::Null);
                Ok(Value::Bool(items.iter().any(|v| v.loosely_equals(needle))))
            }),
        )
        .with_generic_arity(1),
    );

    catalog.register_method(
        MethodInfo::new_static(
            Arc::clone(enumerable),
            "Any",
            vec![Arc::clone(&seq_of_t)],
            bool_type(),
            Arc::new(|_, args| Ok(Value::Bool(!sequence_arg(args, "Any")?.is_empty()))),
        )
        .with_generic_arity(1),
    );

    catalog.register_method(
        MethodInfo::new_static(
            Arc::clone(enumerable),
            "Any",
            vec![Arc::clone(&seq_of_t), predicate_of_t],
            bool_type(),
            Arc::new(|_, args| {
                let items = sequence_arg(args, "Any")?;
                let predicate = predicate_arg(args, "Any")?;
                for item in items {
                    match predicate.call(std::slice::from_ref(item))? {
                        Value::Bool(true) => return Ok(Value::Bool(true)),
                        Value::Bool(false) => {}
                        other => {
                            return Err(Error::TypeMismatch(format!(
                                "Any: predicate returned {}",
                                other.kind_name()
                            )))
                        }
                    }
                }
                Ok(Value::Bool(false))
            }),
        )
        .with_generic_arity(1),
    );

    let ends: [(&'static str, fn(&[Value]) -> Option<&Value>); 2] =
        [("First", <[Value]>::first), ("Last", <[Value]>::last)];
    for (name, pick) in ends {
        catalog.register_method(
            MethodInfo::new_static(
                Arc::clone(enumerable),
                name,
                vec![Arc::clone(&seq_of_t)],
                Arc::clone(&t),
                Arc::new(move |_, args| {
                    pick(sequence_arg(args, name)?).cloned().ok_or_else(|| {
                        Error::Evaluation(format!("{}: sequence contains no elements", name))
                    })
                }),
            )
            .with_generic_arity(1),
        );
    }

    catalog.register_method(
        MethodInfo::new_static(
            Arc::clone(enumerable),
            "Count",
            vec![seq_of_t],
            int_type(),
            Arc::new(|_, args| count(sequence_arg(args, "Count")?.len())),
        )
        .with_generic_arity(1),
    );
}

// ---------------------------------------------------------------------------
// String
// ---------------------------------------------------------------------------

fn target_str<'a>(target: Option<&'a Value>, method: &str) -> Result<&'a str> {
    target.and_then(Value::as_str).ok_or_else(|| {
        Error::TypeMismatch(format!("{} called on a non-string target", method))
    })
}

fn str_arg<'a>(args: &'a [Value], method: &str) -> Result<&'a str> {
    args.first()
        .and_then(Value::as_str)
        .ok_or_else(|| Error::TypeMismatch(format!("{} expects a string argument", method)))
}

fn install_string(catalog: &mut Catalog) {
    let string = string_type();

    let predicates: [(&str, fn(&str, &str) -> bool); 3] = [
        ("StartsWith", |s, p| s.starts_with(p)),
        ("EndsWith", |s, p| s.ends_with(p)),
        ("Contains", |s, p| s.contains(p)),
    ];
    for (name, test) in predicates {
        catalog.register_method(MethodInfo::new(
            Arc::clone(&string),
            name,
            vec![string_type()],
            bool_type(),
            Arc::new(move |target, args| {
                Ok(Value::Bool(test(target_str(target, name)?, str_arg(args, name)?)))
            }),
        ));
    }

    let transforms: [(&str, fn(&str) -> String); 2] = [
        ("ToUpper", str::to_uppercase),
        ("ToLower", str::to_lowercase),
    ];
    for (name, transform) in transforms {
        catalog.register_method(MethodInfo::new(
            Arc::clone(&string),
            name,
            vec![],
            string_type(),
            Arc::new(move |target, _| Ok(Value::String(transform(target_str(target, name)?)))),
        ));
    }

    catalog.register_property(MemberInfo::property(
        string,
        "Length",
        int_type(),
        Arc::new(|target| count(target_str(Some(target), "Length")?.chars().count())),
    ));
}

// ---------------------------------------------------------------------------
// List`1 and Dictionary`2
// ---------------------------------------------------------------------------

fn install_list(catalog: &mut Catalog, list: &Arc<TypeInfo>) {
    let t = TypeInfo::generic_parameter(GenericOwner::Type, 0);

    catalog.register_method(MethodInfo::new(
        Arc::clone(list),
        "Contains",
        vec![Arc::clone(&t)],
        bool_type(),
        Arc::new(|target, args| {
            let items = sequence_arg(target.map(std::slice::from_ref).unwrap_or(&[]), "Contains")?;
            let needle = args.first().unwrap_or(&Value::Null);
            Ok(Value::Bool(items.iter().any(|v| v.loosely_equals(needle))))
        }),
    ));

    catalog.register_method(MethodInfo::new(
        Arc::clone(list),
        "get_Item",
        vec![int_type()],
        t,
        Arc::new(|target, args| {
            let items = sequence_arg(target.map(std::slice::from_ref).unwrap_or(&[]), "get_Item")?;
            let index = args
                .first()
                .and_then(Value::as_i64)
                .ok_or_else(|| Error::TypeMismatch("get_Item expects an integer index".into()))?;
            usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| Error::Evaluation(format!("index {} out of range", index)))
        }),
    ));

    catalog.register_property(MemberInfo::property(
        Arc::clone(list),
        "Count",
        int_type(),
        Arc::new(|target| count(sequence_arg(std::slice::from_ref(target), "Count")?.len())),
    ));
}

fn map_entries<'a>(target: Option<&'a Value>, method: &str) -> Result<&'a [(Value, Value)]> {
    match target {
        Some(Value::Map(entries)) => Ok(entries),
        _ => Err(Error::TypeMismatch(format!(
            "{} called on a non-dictionary target",
            method
        ))),
    }
}

fn install_dictionary(catalog: &mut Catalog, dictionary: &Arc<TypeInfo>) {
    let key = TypeInfo::generic_parameter(GenericOwner::Type, 0);
    let value = TypeInfo::generic_parameter(GenericOwner::Type, 1);

    catalog.register_method(MethodInfo::new(
        Arc::clone(dictionary),
        "get_Item",
        vec![Arc::clone(&key)],
        value,
        Arc::new(|target, args| {
            map_entries(target, "get_Item")?;
            let needle = args.first().unwrap_or(&Value::Null);
            target
                .and_then(|t| t.map_get(needle))
                .cloned()
                .ok_or_else(|| Error::Evaluation(format!("key {:?} not found", needle)))
        }),
    ));

    catalog.register_method(MethodInfo::new(
        Arc::clone(dictionary),
        "ContainsKey",
        vec![key],
        bool_type(),
        Arc::new(|target, args| {
            let entries = map_entries(target, "ContainsKey")?;
            let needle = args.first().unwrap_or(&Value::Null);
            Ok(Value::Bool(entries.iter().any(|(k, _)| k.loosely_equals(needle))))
        }),
    ));

    catalog.register_property(MemberInfo::property(
        Arc::clone(dictionary),
        "Count",
        int_type(),
        Arc::new(|target| count(map_entries(Some(target), "Count")?.len())),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeCatalog;

    #[test]
    fn test_enumerable_contains() {
        let catalog = Catalog::with_builtins();
        let contains = &catalog.methods(names::ENUMERABLE, "Contains")[0];
        let closed = contains.make_generic(vec![string_type()]).unwrap();
        let items = Value::Array(vec![Value::from("aaa"), Value::from("bbb")]);
        assert_eq!(
            closed.invoke(None, &[items.clone(), Value::from("bbb")]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            closed.invoke(None, &[items, Value::from("zzz")]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_enumerable_first_and_last() {
        let catalog = Catalog::with_builtins();
        let items = Value::Array(vec![Value::from("aaa"), Value::from("bbb")]);
        let empty = Value::Array(Vec::new());

        let first = catalog.methods(names::ENUMERABLE, "First")[0]
            .make_generic(vec![string_type()])
            .unwrap();
        assert_eq!(first.return_type().canonical_name(), names::STRING);
        assert_eq!(first.invoke(None, &[items.clone()]).unwrap(), Value::from("aaa"));
        assert!(matches!(
            first.invoke(None, &[empty.clone()]),
            Err(Error::Evaluation(_))
        ));

        let last = catalog.methods(names::ENUMERABLE, "Last")[0]
            .make_generic(vec![string_type()])
            .unwrap();
        assert_eq!(last.invoke(None, &[items]).unwrap(), Value::from("bbb"));
        assert!(matches!(last.invoke(None, &[empty]), Err(Error::Evaluation(_))));
    }

    #[test]
    fn test_enumerable_any_overloads() {
        let catalog = Catalog::with_builtins();
        let overloads = catalog.methods(names::ENUMERABLE, "Any");
        assert_eq!(overloads.len(), 2);
        let with_predicate = overloads
            .iter()
            .find(|m| m.parameters().len() == 2)
            .unwrap()
            .make_generic(vec![string_type()])
            .unwrap();
        assert_eq!(
            with_predicate.parameters()[1].canonical_name(),
            "sys.Func`2[[sys.String],[sys.Boolean]]"
        );

        // A plain value is not a predicate.
        let items = Value::Array(vec![Value::from("aaa")]);
        assert!(matches!(
            with_predicate.invoke(None, &[items, Value::Bool(true)]),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_string_methods() {
        let catalog = Catalog::with_builtins();
        let starts = &catalog.methods(names::STRING, "StartsWith")[0];
        let target = Value::from("hello");
        assert_eq!(
            starts.invoke(Some(&target), &[Value::from("he")]).unwrap(),
            Value::Bool(true)
        );
        let upper = &catalog.methods(names::STRING, "ToUpper")[0];
        assert_eq!(upper.invoke(Some(&target), &[]).unwrap(), Value::from("HELLO"));

        let len = catalog.property(names::STRING, "Length").unwrap();
        assert_eq!(len.get(&target).unwrap(), Value::I32(5));
    }

    #[test]
    fn test_dictionary_get_item() {
        let catalog = Catalog::with_builtins();
        let get = &catalog.methods(names::DICTIONARY, "get_Item")[0];
        let dict = Value::Map(vec![(Value::from("aaa"), Value::from("x"))]);
        assert_eq!(
            get.invoke(Some(&dict), &[Value::from("aaa")]).unwrap(),
            Value::from("x")
        );
        assert!(get.invoke(Some(&dict), &[Value::from("zzz")]).is_err());
    }

    #[test]
    fn test_list_index_out_of_range() {
        let catalog = Catalog::with_builtins();
        let get = &catalog.methods(names::LIST, "get_Item")[0];
        let list = Value::Array(vec![Value::I32(1)]);
        assert_eq!(get.invoke(Some(&list), &[Value::I32(0)]).unwrap(), Value::I32(1));
        assert!(get.invoke(Some(&list), &[Value::I32(3)]).is_err());
        assert!(get.invoke(Some(&list), &[Value::I32(-1)]).is_err());
    }
}
