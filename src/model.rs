// Document model consumed by the code generator.
//
// Built once by `ingest` and read-only afterwards. Names are fully qualified
// without the leading dot that descriptor type references carry.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub files: Vec<File>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct File {
    pub name: String,
    pub messages: Vec<Message>,
    pub enums: Vec<Enum>,
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub full_name: String,
    pub fields: Vec<Field>,
}

/// A message field.
///
/// `full_type` is either a protobuf scalar keyword (`int32`, `string`, ...)
/// or the qualified name of a message or enum. `map_key`/`map_value` are only
/// set when `is_map` is, and a map field is never also repeated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub full_type: String,
    pub is_repeated: bool,
    pub is_map: bool,
    pub map_key: String,
    pub map_value: String,
}

impl Field {
    pub fn singular(name: &str, full_type: &str) -> Self {
        Field {
            name: name.to_string(),
            full_type: full_type.to_string(),
            ..Default::default()
        }
    }

    pub fn repeated(name: &str, full_type: &str) -> Self {
        Field {
            is_repeated: true,
            ..Field::singular(name, full_type)
        }
    }

    pub fn map(name: &str, key: &str, value: &str) -> Self {
        Field {
            name: name.to_string(),
            full_type: String::new(),
            is_repeated: false,
            is_map: true,
            map_key: key.to_string(),
            map_value: value.to_string(),
        }
    }

    /// The same field seen as one element of its sequence.
    pub fn element(&self) -> Field {
        Field {
            is_repeated: false,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enum {
    pub full_name: String,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Service {
    pub full_name: String,
    pub description: String,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub description: String,
    pub request_type: String,
}
