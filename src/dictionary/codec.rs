// Executable model of the generated `to_dictionary` / `from_dictionary`.
//
// Driven by the same `FieldShape` rules as `codegen::message`, so whatever
// the emitted GDScript does to a field, this does to an `Object`.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use super::{Dictionary, Value, key_string};
use crate::codegen::enums::EnumIndex;
use crate::codegen::names::class_name;
use crate::codegen::types::{
    ElementRule, FieldShape, FromDictRule, FromElementRule, Kind, Scalar, ToDictRule, TypeMapper,
};
use crate::model::{Document, Field, Message};

#[derive(Debug, Error)]
pub enum CodecError {
    /// Strict-mode rejection, worded like the generated assert.
    #[error("ERROR: unknown field '{key}'")]
    UnknownField { message: String, key: String },

    #[error("unknown message type {0:?}")]
    UnknownMessage(String),

    #[error("{message} has no field {field:?}")]
    NoSuchField { message: String, field: String },

    #[error("{message}.{field}: expected {expected}, got {found}")]
    TypeMismatch {
        message: String,
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{message}.{field}: invalid base64")]
    InvalidBase64 {
        message: String,
        field: String,
        #[source]
        source: base64::DecodeError,
    },
}

/// A typed member value of a generated class instance.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Enum(i64),
    Message(Option<Box<Object>>),
    List(Vec<FieldValue>),
    Map(Dictionary),
}

impl FieldValue {
    fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "String",
            FieldValue::Bytes(_) => "PackedByteArray",
            FieldValue::Enum(_) => "enum",
            FieldValue::Message(_) => "Object",
            FieldValue::List(_) => "Array",
            FieldValue::Map(_) => "Dictionary",
        }
    }
}

/// An instance of a generated message class.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    full_name: String,
    fields: Vec<(String, FieldValue)>,
}

impl Object {
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn class_name(&self) -> String {
        class_name(&self.full_name)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == field).map(|(_, v)| v)
    }

    pub fn set(&mut self, field: &str, value: FieldValue) -> Result<(), CodecError> {
        match self.fields.iter_mut().find(|(n, _)| n == field) {
            Some(slot) => {
                slot.1 = value;
                Ok(())
            }
            None => Err(CodecError::NoSuchField {
                message: self.full_name.clone(),
                field: field.to_string(),
            }),
        }
    }

    pub fn with(mut self, field: &str, value: FieldValue) -> Result<Self, CodecError> {
        self.set(field, value)?;
        Ok(self)
    }
}

/// Message and enum lookup for one document.
pub struct Schema<'a> {
    messages: HashMap<&'a str, &'a Message>,
    enums: EnumIndex<'a>,
}

impl<'a> Schema<'a> {
    pub fn new(doc: &'a Document) -> Self {
        let messages = doc
            .files
            .iter()
            .flat_map(|f| f.messages.iter())
            .map(|m| (m.full_name.as_str(), m))
            .collect();
        Schema {
            messages,
            enums: EnumIndex::build(doc),
        }
    }

    fn mapper(&self) -> TypeMapper<'_, 'a> {
        TypeMapper::new(&self.enums)
    }

    fn message(&self, full_name: &str) -> Result<&'a Message, CodecError> {
        self.messages
            .get(full_name)
            .copied()
            .ok_or_else(|| CodecError::UnknownMessage(full_name.to_string()))
    }

    /// `Class.new()`: every member at its type's default.
    pub fn instantiate(&self, full_name: &str) -> Result<Object, CodecError> {
        let message = self.message(full_name)?;
        let mapper = self.mapper();
        let fields = message
            .fields
            .iter()
            .map(|f| (f.name.clone(), default_value(mapper.classify(f))))
            .collect();
        Ok(Object {
            full_name: message.full_name.clone(),
            fields,
        })
    }

    pub fn to_dictionary(&self, obj: &Object) -> Result<Dictionary, CodecError> {
        let message = self.message(&obj.full_name)?;
        let mapper = self.mapper();
        let mut dict = Dictionary::new();

        for field in &message.fields {
            let ctx = FieldCtx { message, field };
            let value = obj.get(&field.name).ok_or_else(|| ctx.no_such_field())?;

            let out = match (mapper.classify(field).to_dict_rule(), value) {
                (ToDictRule::PassThrough, FieldValue::Map(d)) => Some(Value::Dictionary(d.clone())),
                (ToDictRule::EachElement(rule), FieldValue::List(items)) => {
                    if items.is_empty() {
                        None
                    } else {
                        let converted = items
                            .iter()
                            .map(|item| self.encode_element(&ctx, rule, item))
                            .collect::<Result<Vec<_>, _>>()?;
                        Some(Value::Array(converted))
                    }
                }
                (ToDictRule::NonEmptyText, FieldValue::Text(s)) => {
                    (!s.is_empty()).then(|| Value::Text(s.clone()))
                }
                (ToDictRule::Nested, FieldValue::Message(None)) => None,
                (ToDictRule::Base64, v) => Some(self.encode_element(&ctx, ElementRule::Base64, v)?),
                (ToDictRule::Always, v) => Some(self.encode_element(&ctx, ElementRule::Always, v)?),
                (ToDictRule::Nested, v) => Some(self.encode_element(&ctx, ElementRule::Nested, v)?),
                (_, v) => return Err(ctx.mismatch(expected_name(mapper.classify(field)), v.type_name())),
            };

            if let Some(out) = out {
                dict.set(&field.name, out);
            }
        }

        Ok(dict)
    }

    fn encode_element(&self, ctx: &FieldCtx, rule: ElementRule, value: &FieldValue) -> Result<Value, CodecError> {
        let out = match (rule, value) {
            (ElementRule::Base64, FieldValue::Bytes(b)) => Value::Text(STANDARD.encode(b)),
            (ElementRule::NonEmptyText, FieldValue::Text(s)) if s.is_empty() => Value::Nil,
            (ElementRule::NonEmptyText, FieldValue::Text(s)) => Value::Text(s.clone()),
            (ElementRule::Nested, FieldValue::Message(None)) => Value::Nil,
            (ElementRule::Nested, FieldValue::Message(Some(o))) => Value::Dictionary(self.to_dictionary(o)?),
            (ElementRule::Always, FieldValue::Bool(b)) => Value::Bool(*b),
            (ElementRule::Always, FieldValue::Int(i) | FieldValue::Enum(i)) => Value::Int(*i),
            (ElementRule::Always, FieldValue::Float(f)) => Value::Float(*f),
            (ElementRule::Always, FieldValue::Text(s)) => Value::Text(s.clone()),
            (ElementRule::Base64, v) => return Err(ctx.mismatch("PackedByteArray", v.type_name())),
            (ElementRule::NonEmptyText, v) => return Err(ctx.mismatch("String", v.type_name())),
            (ElementRule::Nested, v) => return Err(ctx.mismatch("Object", v.type_name())),
            (ElementRule::Always, v) => return Err(ctx.mismatch("scalar", v.type_name())),
        };
        Ok(out)
    }

    /// `Class.from_dictionary(dict, strict)`.
    pub fn from_dictionary(&self, full_name: &str, dict: &Dictionary, strict: bool) -> Result<Object, CodecError> {
        let message = self.message(full_name)?;
        let mapper = self.mapper();
        let mut obj = self.instantiate(full_name)?;

        for field in &message.fields {
            let Some(source) = dict.get_str(&field.name) else {
                continue;
            };
            let ctx = FieldCtx { message, field };
            let shape = mapper.classify(field);

            let value = match shape.from_dict_rule() {
                FromDictRule::PassThrough => match source {
                    Value::Dictionary(d) => FieldValue::Map(d.clone()),
                    other => return Err(ctx.mismatch("Dictionary", other.type_name())),
                },
                FromDictRule::EachElement(rule) => {
                    let Value::Array(items) = source else {
                        return Err(ctx.mismatch("Array", source.type_name()));
                    };
                    let element = shape.element();
                    let decoded = items
                        .iter()
                        .map(|item| self.decode_element(&ctx, element, rule, item))
                        .collect::<Result<Vec<_>, _>>()?;
                    FieldValue::List(decoded)
                }
                FromDictRule::IntCoerce => self.decode_element(&ctx, shape, FromElementRule::IntCoerce, source)?,
                FromDictRule::Base64 => self.decode_element(&ctx, shape, FromElementRule::Base64, source)?,
                FromDictRule::Raw => self.decode_element(&ctx, shape, FromElementRule::Raw, source)?,
                FromDictRule::Nested => self.decode_element(&ctx, shape, FromElementRule::Nested, source)?,
            };
            obj.set(&field.name, value)?;
        }

        if strict {
            for key in dict.keys() {
                let known = matches!(key, Value::Text(k) if message.fields.iter().any(|f| &f.name == k));
                if !known {
                    return Err(CodecError::UnknownField {
                        message: message.full_name.clone(),
                        key: key_string(key),
                    });
                }
            }
        }

        Ok(obj)
    }

    fn decode_element(
        &self,
        ctx: &FieldCtx,
        shape: FieldShape,
        rule: FromElementRule,
        source: &Value,
    ) -> Result<FieldValue, CodecError> {
        let value = match (rule, source) {
            // int() truncates floats and accepts bools.
            (FromElementRule::IntCoerce, Value::Int(i)) => FieldValue::Int(*i),
            (FromElementRule::IntCoerce, Value::Float(f)) => FieldValue::Int(*f as i64),
            (FromElementRule::IntCoerce, Value::Bool(b)) => FieldValue::Int(i64::from(*b)),
            (FromElementRule::Base64, Value::Text(s)) => {
                let bytes = STANDARD.decode(s).map_err(|source| CodecError::InvalidBase64 {
                    message: ctx.message.full_name.clone(),
                    field: ctx.field.name.clone(),
                    source,
                })?;
                FieldValue::Bytes(bytes)
            }
            (FromElementRule::Nested, Value::Dictionary(d)) => {
                // Nested classes are always decoded non-strict.
                let nested = self.from_dictionary(&ctx.field.full_type, d, false)?;
                FieldValue::Message(Some(Box::new(nested)))
            }
            (FromElementRule::Raw, source) => raw_assign(ctx, shape.kind, source)?,
            (FromElementRule::IntCoerce, other) => return Err(ctx.mismatch("int", other.type_name())),
            (FromElementRule::Base64, other) => return Err(ctx.mismatch("String", other.type_name())),
            (FromElementRule::Nested, other) => return Err(ctx.mismatch("Dictionary", other.type_name())),
        };
        Ok(value)
    }
}

// Assignment into a typed member: Godot converts between int and float but
// nothing else.
fn raw_assign(ctx: &FieldCtx, kind: Kind, source: &Value) -> Result<FieldValue, CodecError> {
    let value = match (kind, source) {
        (Kind::Scalar(Scalar::Bool), Value::Bool(b)) => FieldValue::Bool(*b),
        (Kind::Scalar(Scalar::Float), Value::Float(f)) => FieldValue::Float(*f),
        (Kind::Scalar(Scalar::Float), Value::Int(i)) => FieldValue::Float(*i as f64),
        (Kind::Scalar(Scalar::Int), Value::Int(i)) => FieldValue::Int(*i),
        (Kind::Text, Value::Text(s)) => FieldValue::Text(s.clone()),
        (Kind::Enum, Value::Int(i)) => FieldValue::Enum(*i),
        (Kind::Enum, Value::Float(f)) => FieldValue::Enum(*f as i64),
        (kind, other) => {
            return Err(ctx.mismatch(expected_name(FieldShape::singular(kind)), other.type_name()));
        }
    };
    Ok(value)
}

fn default_value(shape: FieldShape) -> FieldValue {
    if shape.kind == Kind::Map {
        return FieldValue::Map(Dictionary::new());
    }
    if shape.is_repeated() {
        return FieldValue::List(Vec::new());
    }
    match shape.kind {
        Kind::Scalar(Scalar::Bool) => FieldValue::Bool(false),
        Kind::Scalar(Scalar::Int) => FieldValue::Int(0),
        Kind::Scalar(Scalar::Float) => FieldValue::Float(0.0),
        Kind::Text => FieldValue::Text(String::new()),
        Kind::Bytes => FieldValue::Bytes(Vec::new()),
        Kind::Enum => FieldValue::Enum(0),
        Kind::Message => FieldValue::Message(None),
        Kind::Map => FieldValue::Map(Dictionary::new()),
    }
}

fn expected_name(shape: FieldShape) -> &'static str {
    if shape.is_repeated() {
        return "Array";
    }
    match shape.kind {
        Kind::Scalar(Scalar::Bool) => "bool",
        Kind::Scalar(Scalar::Int) => "int",
        Kind::Scalar(Scalar::Float) => "float",
        Kind::Text => "String",
        Kind::Bytes => "PackedByteArray",
        Kind::Enum => "enum",
        Kind::Map => "Dictionary",
        Kind::Message => "Object",
    }
}

struct FieldCtx<'m> {
    message: &'m Message,
    field: &'m Field,
}

impl FieldCtx<'_> {
    fn mismatch(&self, expected: &'static str, found: &'static str) -> CodecError {
        CodecError::TypeMismatch {
            message: self.message.full_name.clone(),
            field: self.field.name.clone(),
            expected,
            found,
        }
    }

    fn no_such_field(&self) -> CodecError {
        CodecError::NoSuchField {
            message: self.message.full_name.clone(),
            field: self.field.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Enum, EnumValue, File};
    use serde_json::json;

    fn shop() -> Document {
        Document {
            files: vec![File {
                name: "shop.proto".into(),
                messages: vec![
                    Message {
                        full_name: "shop.Item".into(),
                        fields: vec![
                            Field::singular("id", "int64"),
                            Field::repeated("tags", "string"),
                            Field::map("meta", "string", "string"),
                        ],
                    },
                    Message {
                        full_name: "shop.Order".into(),
                        fields: vec![
                            Field::singular("note", "string"),
                            Field::singular("paid", "bool"),
                            Field::singular("total", "double"),
                            Field::singular("color", "shop.Color"),
                            Field::singular("receipt", "bytes"),
                            Field::singular("main", "shop.Item"),
                            Field::repeated("lines", "shop.Item"),
                            Field::repeated("qty", "int32"),
                            Field::map("by_sku", "string", "shop.Item"),
                        ],
                    },
                ],
                enums: vec![Enum {
                    full_name: "shop.Color".into(),
                    values: vec![
                        EnumValue {
                            name: "RED".into(),
                            number: 0,
                        },
                        EnumValue {
                            name: "BLUE".into(),
                            number: 1,
                        },
                    ],
                }],
                services: vec![],
            }],
        }
    }

    fn dict(json: serde_json::Value) -> Dictionary {
        match Value::from_json(&json) {
            Value::Dictionary(d) => d,
            other => panic!("not a dictionary: {other:?}"),
        }
    }

    #[test]
    fn test_item_scenario() {
        let doc = shop();
        let schema = Schema::new(&doc);
        let item = schema.instantiate("shop.Item").unwrap();

        let out = schema.to_dictionary(&item).unwrap();
        assert_eq!(out.get_str("id"), Some(&Value::Int(0)));
        assert!(!out.has("tags"));
        assert_eq!(out.get_str("meta"), Some(&Value::Dictionary(Dictionary::new())));
        assert_eq!(out.len(), 2);

        let back = schema.from_dictionary("shop.Item", &out, true).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_text_and_repeated_round_trip() {
        let doc = shop();
        let schema = Schema::new(&doc);

        let cases = [
            (FieldValue::Text(String::new()), FieldValue::List(vec![])),
            (
                FieldValue::Text("hello".into()),
                FieldValue::List(vec![FieldValue::Int(1), FieldValue::Int(-2)]),
            ),
        ];
        for (note, qty) in cases {
            let order = schema
                .instantiate("shop.Order")
                .unwrap()
                .with("note", note)
                .unwrap()
                .with("qty", qty)
                .unwrap();
            let out = schema.to_dictionary(&order).unwrap();
            let back = schema.from_dictionary("shop.Order", &out, true).unwrap();
            assert_eq!(back, order);

            // Through JSON too, where every number turns into a float.
            let json = Value::Dictionary(out).to_json();
            let back = schema.from_dictionary("shop.Order", &dict(json), true).unwrap();
            assert_eq!(back, order);
        }
    }

    #[test]
    fn test_empty_text_element_becomes_null() {
        let doc = shop();
        let schema = Schema::new(&doc);
        let tags = FieldValue::List(vec![
            FieldValue::Text("a".into()),
            FieldValue::Text(String::new()),
            FieldValue::Text("b".into()),
        ]);
        let item = schema.instantiate("shop.Item").unwrap().with("tags", tags).unwrap();
        let out = schema.to_dictionary(&item).unwrap();
        assert_eq!(
            out.get_str("tags"),
            Some(&Value::Array(vec![Value::from("a"), Value::Nil, Value::from("b")]))
        );

        // A typed Array[String] refuses the null on the way back in.
        let err = schema.from_dictionary("shop.Item", &out, false).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { found: "Nil", .. }), "{err}");
    }

    #[test]
    fn test_scalar_and_enum_always_written() {
        let doc = shop();
        let schema = Schema::new(&doc);
        let order = schema.instantiate("shop.Order").unwrap();
        let out = schema.to_dictionary(&order).unwrap();

        assert_eq!(out.get_str("paid"), Some(&Value::Bool(false)));
        assert_eq!(out.get_str("total"), Some(&Value::Float(0.0)));
        assert_eq!(out.get_str("color"), Some(&Value::Int(0)));
        // Bytes are always present, as base64 text.
        assert_eq!(out.get_str("receipt"), Some(&Value::from("")));
        assert!(!out.has("note"));
        assert!(!out.has("main"));
        assert!(!out.has("lines"));
        assert!(!out.has("qty"));
        assert!(out.has("by_sku"));
    }

    #[test]
    fn test_nested_and_bytes() {
        let doc = shop();
        let schema = Schema::new(&doc);
        let main = schema
            .instantiate("shop.Item")
            .unwrap()
            .with("id", FieldValue::Int(9))
            .unwrap();
        let order = schema
            .instantiate("shop.Order")
            .unwrap()
            .with("receipt", FieldValue::Bytes(b"\x00\xffok".to_vec()))
            .unwrap()
            .with("color", FieldValue::Enum(1))
            .unwrap()
            .with("main", FieldValue::Message(Some(Box::new(main.clone()))))
            .unwrap()
            .with(
                "lines",
                FieldValue::List(vec![FieldValue::Message(Some(Box::new(main)))]),
            )
            .unwrap();

        let out = schema.to_dictionary(&order).unwrap();
        assert_eq!(
            Value::Dictionary(out.clone()).to_json(),
            json!({
                "paid": false,
                "total": 0.0,
                "color": 1,
                "receipt": "AP9vaw==",
                "main": {"id": 9, "meta": {}},
                "lines": [{"id": 9, "meta": {}}],
                "by_sku": {}
            })
        );
        assert_eq!(schema.from_dictionary("shop.Order", &out, true).unwrap(), order);
    }

    #[test]
    fn test_int_fields_coerced_from_float() {
        let doc = shop();
        let schema = Schema::new(&doc);
        let obj = schema
            .from_dictionary("shop.Item", &dict(json!({"id": 42})), false)
            .unwrap();
        assert_eq!(obj.get("id"), Some(&FieldValue::Int(42)));

        let obj = schema
            .from_dictionary("shop.Order", &dict(json!({"qty": [1, 2.0], "color": 1, "total": 3})), false)
            .unwrap();
        assert_eq!(
            obj.get("qty"),
            Some(&FieldValue::List(vec![FieldValue::Int(1), FieldValue::Int(2)]))
        );
        assert_eq!(obj.get("color"), Some(&FieldValue::Enum(1)));
        assert_eq!(obj.get("total"), Some(&FieldValue::Float(3.0)));
    }

    #[test]
    fn test_strict_rejects_unknown_key() {
        let doc = shop();
        let schema = Schema::new(&doc);
        let input = dict(json!({"id": 1, "colour": "red"}));

        let err = schema.from_dictionary("shop.Item", &input, true).unwrap_err();
        assert!(matches!(&err, CodecError::UnknownField { key, .. } if key == "colour"));
        assert_eq!(err.to_string(), "ERROR: unknown field 'colour'");

        let obj = schema.from_dictionary("shop.Item", &input, false).unwrap();
        assert_eq!(obj.get("id"), Some(&FieldValue::Int(1)));
        assert!(obj.get("colour").is_none());
    }

    #[test]
    fn test_nested_decode_is_not_strict() {
        let doc = shop();
        let schema = Schema::new(&doc);
        let input = dict(json!({"main": {"id": 3, "extra": true}}));
        let obj = schema.from_dictionary("shop.Order", &input, true).unwrap();
        let Some(FieldValue::Message(Some(main))) = obj.get("main") else {
            panic!("main not decoded");
        };
        assert_eq!(main.get("id"), Some(&FieldValue::Int(3)));
    }

    #[test]
    fn test_map_values_pass_through_unconverted() {
        let doc = shop();
        let schema = Schema::new(&doc);
        let item = schema
            .instantiate("shop.Item")
            .unwrap()
            .with("id", FieldValue::Int(5))
            .unwrap();
        let mut by_sku = Dictionary::new();
        by_sku.set("sku-1", Value::Object(Box::new(item)));

        let order = schema
            .instantiate("shop.Order")
            .unwrap()
            .with("by_sku", FieldValue::Map(by_sku.clone()))
            .unwrap();
        let out = schema.to_dictionary(&order).unwrap();

        // Same container, values still objects rather than dictionaries.
        assert_eq!(out.get_str("by_sku"), Some(&Value::Dictionary(by_sku)));
        let Some(Value::Dictionary(d)) = out.get_str("by_sku") else {
            unreachable!()
        };
        assert!(matches!(d.get_str("sku-1"), Some(Value::Object(_))));
    }

    #[test]
    fn test_type_errors() {
        let doc = shop();
        let schema = Schema::new(&doc);

        let err = schema
            .from_dictionary("shop.Order", &dict(json!({"receipt": "***"})), false)
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidBase64 { .. }));

        let err = schema
            .from_dictionary("shop.Order", &dict(json!({"lines": {}})), false)
            .unwrap_err();
        assert_eq!(err.to_string(), "shop.Order.lines: expected Array, got Dictionary");

        let err = schema.instantiate("shop.Nope").unwrap_err();
        assert!(matches!(err, CodecError::UnknownMessage(_)));

        let err = schema
            .instantiate("shop.Item")
            .unwrap()
            .with("nope", FieldValue::Int(1))
            .unwrap_err();
        assert!(matches!(err, CodecError::NoSuchField { .. }));
    }
}
