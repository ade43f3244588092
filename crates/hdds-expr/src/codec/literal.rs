// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Constant values as JSON literals.
//!
//! Encoding is driven by the value, decoding by the resolved type:
//!
//! | Type          | JSON                                  |
//! |---------------|---------------------------------------|
//! | bool, ints    | boolean / number                      |
//! | double        | number (NaN and infinities rejected)  |
//! | char, string  | string                                |
//! | array, list   | array of elements                     |
//! | dictionary    | array of `[key, value]` pairs         |
//! | struct        | object, decoded field by field        |
//! | null          | `null`                                |

use crate::error::{Error, Result};
use crate::types::{PrimitiveKind, TypeInfo, TypeKind, Value};
use serde_json::{Map, Number, Value as Json};
use std::sync::Arc;

/// Encode a constant value.
pub fn to_json(value: &Value) -> Result<Json> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::I32(v) => Json::from(*v),
        Value::I64(v) => Json::from(*v),
        Value::F64(v) => Number::from_f64(*v)
            .map(Json::Number)
            .ok_or_else(|| Error::Codec(format!("non-finite double {}", v)))?,
        Value::Char(c) => Json::String(c.to_string()),
        Value::String(s) => Json::String(s.clone()),
        Value::Array(items) => Json::Array(items.iter().map(to_json).collect::<Result<_>>()?),
        Value::Map(entries) => Json::Array(
            entries
                .iter()
                .map(|(k, v)| Ok(Json::Array(vec![to_json(k)?, to_json(v)?])))
                .collect::<Result<_>>()?,
        ),
        Value::Struct(fields) => {
            // Sorted for a stable payload.
            let mut names: Vec<&String> = fields.keys().collect();
            names.sort();
            let mut map = Map::new();
            for name in names {
                if let Some(v) = fields.get(name) {
                    map.insert(name.clone(), to_json(v)?);
                }
            }
            Json::Object(map)
        }
        Value::Function(_) => {
            return Err(Error::Codec(
                "function values have no literal form".to_string(),
            ))
        }
    })
}

/// Whether `value` nests no deeper than `levels` containers.
///
/// Arrays and structs take one level, maps take two (the pair list and each
/// pair).
pub fn fits_depth(value: &Value, levels: usize) -> bool {
    match value {
        Value::Array(items) => levels > 0 && items.iter().all(|v| fits_depth(v, levels - 1)),
        Value::Struct(fields) => levels > 0 && fields.values().all(|v| fits_depth(v, levels - 1)),
        Value::Map(entries) => {
            levels > 1
                && entries
                    .iter()
                    .all(|(k, v)| fits_depth(k, levels - 2) && fits_depth(v, levels - 2))
        }
        _ => true,
    }
}

fn mismatch(ty: &TypeInfo, json: &Json) -> Error {
    Error::TypeMismatch(format!(
        "literal {} is not a valid {}",
        json,
        ty.canonical_name()
    ))
}

/// Decode a constant against its resolved type.
pub fn from_json(json: &Json, ty: &Arc<TypeInfo>) -> Result<Value> {
    if json.is_null() {
        return Ok(Value::Null);
    }
    match ty.kind() {
        TypeKind::Primitive(kind) => decode_primitive(json, *kind, ty),
        TypeKind::Object | TypeKind::GenericParameter { .. } => Ok(decode_untyped(json)),
        TypeKind::Struct => {
            let object = json.as_object().ok_or_else(|| mismatch(ty, json))?;
            let mut fields = std::collections::HashMap::with_capacity(ty.fields().len());
            for field in ty.fields() {
                let value = match object.get(&field.name) {
                    Some(v) => from_json(v, &field.ty)?,
                    None => Value::Null,
                };
                fields.insert(field.name.clone(), value);
            }
            if let Some(unknown) = object.keys().find(|k| ty.field(k).is_none()) {
                return Err(Error::TypeMismatch(format!(
                    "field {} is not declared on {}",
                    unknown,
                    ty.canonical_name()
                )));
            }
            Ok(Value::Struct(fields))
        }
        TypeKind::Array | TypeKind::Sequence => {
            let items = json.as_array().ok_or_else(|| mismatch(ty, json))?;
            let element = ty.element_type().cloned().unwrap_or_else(TypeInfo::object);
            Ok(Value::Array(
                items
                    .iter()
                    .map(|item| from_json(item, &element))
                    .collect::<Result<_>>()?,
            ))
        }
        TypeKind::Map => {
            let pairs = json.as_array().ok_or_else(|| mismatch(ty, json))?;
            let args = ty.generic_args();
            let key_ty = args.first().cloned().unwrap_or_else(TypeInfo::object);
            let value_ty = args.get(1).cloned().unwrap_or_else(TypeInfo::object);
            let mut entries = Vec::with_capacity(pairs.len());
            for pair in pairs {
                match pair.as_array().map(Vec::as_slice) {
                    Some([k, v]) => entries.push((from_json(k, &key_ty)?, from_json(v, &value_ty)?)),
                    _ => return Err(mismatch(ty, pair)),
                }
            }
            Ok(Value::Map(entries))
        }
        TypeKind::Function | TypeKind::Static => Err(Error::Codec(format!(
            "constants of type {} cannot be decoded",
            ty.canonical_name()
        ))),
    }
}

fn decode_primitive(json: &Json, kind: PrimitiveKind, ty: &TypeInfo) -> Result<Value> {
    let value = match kind {
        PrimitiveKind::Bool => json.as_bool().map(Value::Bool),
        PrimitiveKind::I32 => json
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::I32),
        PrimitiveKind::I64 => json.as_i64().map(Value::I64),
        PrimitiveKind::F64 => json.as_f64().map(Value::F64),
        PrimitiveKind::Char => json.as_str().and_then(|s| {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(Value::Char(c)),
                _ => None,
            }
        }),
        PrimitiveKind::String => json.as_str().map(Value::from),
        PrimitiveKind::Void => None,
    };
    value.ok_or_else(|| mismatch(ty, json))
}

/// Best-effort decode without a type: integers become `I64`.
fn decode_untyped(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::I64(i),
            None => Value::F64(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::Array(items.iter().map(decode_untyped).collect()),
        Json::Object(map) => Value::Struct(
            map.iter()
                .map(|(k, v)| (k.clone(), decode_untyped(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{names, FieldInfo};
    use serde_json::json;

    fn string() -> Arc<TypeInfo> {
        TypeInfo::primitive(PrimitiveKind::String)
    }

    #[test]
    fn test_struct_decodes_field_by_field() {
        let ty = TypeInfo::synthesized(
            "sample.Closure",
            vec![
                FieldInfo::new("Id", TypeInfo::primitive(PrimitiveKind::I32)),
                FieldInfo::new("Name", string()),
            ],
        );
        let value = from_json(&json!({"Id": 1, "Name": "bbb"}), &ty).unwrap();
        assert_eq!(value.get_field("Id"), Some(&Value::I32(1)));
        assert_eq!(value.get_field("Name"), Some(&Value::from("bbb")));

        let partial = from_json(&json!({"Id": 2}), &ty).unwrap();
        assert_eq!(partial.get_field("Name"), Some(&Value::Null));

        assert!(from_json(&json!({"Other": 1}), &ty).is_err());
    }

    #[test]
    fn test_map_encodes_as_pairs() {
        let value = Value::Map(vec![
            (Value::from("aaa"), Value::from("x")),
            (Value::from("bbb"), Value::from("y")),
        ]);
        let encoded = to_json(&value).unwrap();
        assert_eq!(encoded, json!([["aaa", "x"], ["bbb", "y"]]));

        let dict = TypeInfo::generic_definition(names::DICTIONARY, TypeKind::Map, 2)
            .instantiate(vec![string(), string()])
            .unwrap();
        assert_eq!(from_json(&encoded, &dict).unwrap(), value);
        assert!(from_json(&json!([["aaa"]]), &dict).is_err());
    }

    #[test]
    fn test_primitive_range_and_shape_checks() {
        let int = TypeInfo::primitive(PrimitiveKind::I32);
        assert_eq!(from_json(&json!(7), &int).unwrap(), Value::I32(7));
        assert!(from_json(&json!(1_i64 << 40), &int).is_err());
        assert!(from_json(&json!("7"), &int).is_err());

        let ch = TypeInfo::primitive(PrimitiveKind::Char);
        assert_eq!(from_json(&json!("a"), &ch).unwrap(), Value::Char('a'));
        assert!(from_json(&json!("ab"), &ch).is_err());

        assert!(to_json(&Value::F64(f64::NAN)).is_err());
        assert_eq!(from_json(&Json::Null, &int).unwrap(), Value::Null);
    }

    #[test]
    fn test_nesting_levels() {
        let mut nested = Value::from("leaf");
        for _ in 0..3 {
            nested = Value::Array(vec![nested]);
        }
        assert!(fits_depth(&nested, 3));
        assert!(!fits_depth(&nested, 2));
        assert!(fits_depth(&Value::I32(1), 0));

        let map = Value::Map(vec![(Value::from("k"), Value::Array(vec![]))]);
        assert!(fits_depth(&map, 3));
        assert!(!fits_depth(&map, 2));
    }

    #[test]
    fn test_array_elements_typed() {
        let arr = TypeInfo::array_of(TypeInfo::primitive(PrimitiveKind::I64));
        assert_eq!(
            from_json(&json!([1, 2]), &arr).unwrap(),
            Value::Array(vec![Value::I64(1), Value::I64(2)])
        );
    }
}
