// Field classification and GDScript type mapping.
//
// `FieldShape` is the single classification both directions of the generated
// dictionary codec are derived from: `to_dict_rule` and `from_dict_rule` are
// matched by the message emitter and by `dictionary::codec` alike.

use super::enums::{EnumIndex, enum_reference};
use super::names::class_name;
use crate::model::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Bool,
    Int,
    Float,
    Text,
    Bytes,
}

impl Primitive {
    pub fn gd_type(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Text => "String",
            Primitive::Bytes => "PackedByteArray",
        }
    }
}

/// Fixed protobuf scalar table. Anything else (uint32, sint64, fixed32, ...)
/// is not a primitive and ends up treated as a message reference.
pub fn map_primitive(name: &str) -> Option<Primitive> {
    match name {
        "bool" => Some(Primitive::Bool),
        "int32" | "int64" => Some(Primitive::Int),
        "float" | "double" => Some(Primitive::Float),
        "string" => Some(Primitive::Text),
        "bytes" => Some(Primitive::Bytes),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Bool,
    Int,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Scalar(Scalar),
    Bytes,
    Text,
    Enum,
    Map,
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Singular,
    Repeated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldShape {
    pub kind: Kind,
    pub cardinality: Cardinality,
}

/// How a field value is written into the dictionary, first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToDictRule {
    /// Container reference assigned as is.
    PassThrough,
    /// Non-empty sequences only, each element converted with the element rule.
    EachElement(ElementRule),
    Base64,
    /// Written only when not the empty string.
    NonEmptyText,
    Always,
    /// Written as the nested `to_dictionary()` when the reference is set.
    Nested,
}

/// Conversion of one sequence element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRule {
    Base64,
    /// Assigned only when not the empty string; the element stays null.
    NonEmptyText,
    Always,
    Nested,
}

/// How a present dictionary key is read back into the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FromDictRule {
    PassThrough,
    IntCoerce,
    EachElement(FromElementRule),
    Base64,
    Raw,
    Nested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FromElementRule {
    IntCoerce,
    Base64,
    Raw,
    Nested,
}

impl FieldShape {
    pub fn singular(kind: Kind) -> Self {
        FieldShape {
            kind,
            cardinality: Cardinality::Singular,
        }
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }

    pub fn element(&self) -> FieldShape {
        FieldShape::singular(self.kind)
    }

    pub fn to_dict_rule(&self) -> ToDictRule {
        match (self.kind, self.cardinality) {
            (Kind::Map, _) => ToDictRule::PassThrough,
            (kind, Cardinality::Repeated) => ToDictRule::EachElement(element_to_dict(kind)),
            (Kind::Bytes, _) => ToDictRule::Base64,
            (Kind::Text, _) => ToDictRule::NonEmptyText,
            (Kind::Scalar(_) | Kind::Enum, _) => ToDictRule::Always,
            (Kind::Message, _) => ToDictRule::Nested,
        }
    }

    pub fn from_dict_rule(&self) -> FromDictRule {
        match (self.kind, self.cardinality) {
            (Kind::Map, _) => FromDictRule::PassThrough,
            (kind, Cardinality::Repeated) => FromDictRule::EachElement(element_from_dict(kind)),
            (Kind::Scalar(Scalar::Int), _) => FromDictRule::IntCoerce,
            (Kind::Bytes, _) => FromDictRule::Base64,
            (Kind::Scalar(_) | Kind::Text | Kind::Enum, _) => FromDictRule::Raw,
            (Kind::Message, _) => FromDictRule::Nested,
        }
    }
}

// Elements follow the singular rules, so an empty string element is
// appended as null.
fn element_to_dict(kind: Kind) -> ElementRule {
    match kind {
        Kind::Bytes => ElementRule::Base64,
        Kind::Message => ElementRule::Nested,
        Kind::Text => ElementRule::NonEmptyText,
        Kind::Scalar(_) | Kind::Enum | Kind::Map => ElementRule::Always,
    }
}

fn element_from_dict(kind: Kind) -> FromElementRule {
    match kind {
        Kind::Scalar(Scalar::Int) => FromElementRule::IntCoerce,
        Kind::Bytes => FromElementRule::Base64,
        Kind::Message => FromElementRule::Nested,
        Kind::Scalar(_) | Kind::Text | Kind::Enum | Kind::Map => FromElementRule::Raw,
    }
}

/// Maps schema type references to GDScript types, consulting the run's
/// enum index.
#[derive(Clone, Copy)]
pub struct TypeMapper<'s, 'a> {
    enums: &'s EnumIndex<'a>,
}

impl<'s, 'a> TypeMapper<'s, 'a> {
    pub fn new(enums: &'s EnumIndex<'a>) -> Self {
        TypeMapper { enums }
    }

    pub fn classify(&self, field: &Field) -> FieldShape {
        if field.is_map {
            return FieldShape::singular(Kind::Map);
        }
        let kind = self.kind_of(&field.full_type);
        let cardinality = if field.is_repeated {
            Cardinality::Repeated
        } else {
            Cardinality::Singular
        };
        FieldShape { kind, cardinality }
    }

    pub fn kind_of(&self, full_type: &str) -> Kind {
        if self.enums.contains(full_type) {
            return Kind::Enum;
        }
        match map_primitive(full_type) {
            Some(Primitive::Bool) => Kind::Scalar(Scalar::Bool),
            Some(Primitive::Int) => Kind::Scalar(Scalar::Int),
            Some(Primitive::Float) => Kind::Scalar(Scalar::Float),
            Some(Primitive::Text) => Kind::Text,
            Some(Primitive::Bytes) => Kind::Bytes,
            None => Kind::Message,
        }
    }

    /// GDScript type for one value of `full_type`.
    pub fn resolve(&self, full_type: &str) -> String {
        if let Some(e) = self.enums.get(full_type) {
            return enum_reference(&e.full_name);
        }
        match map_primitive(full_type) {
            Some(p) => p.gd_type().to_string(),
            None => class_name(full_type),
        }
    }

    /// Declared member type plus the comment line that goes above it, if any.
    pub fn declared_type(&self, field: &Field) -> (String, Option<String>) {
        if field.is_map {
            let comment = format!(
                "# Should be typed dictionary Dictionary[{}, {}]",
                self.resolve(&field.map_key),
                self.resolve(&field.map_value)
            );
            return ("Dictionary".to_string(), Some(comment));
        }
        let element = self.resolve(&field.full_type);
        if field.is_repeated {
            (format!("Array[{element}]"), None)
        } else {
            (element, None)
        }
    }
}
