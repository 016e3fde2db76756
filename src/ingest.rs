// Builds the document model from the compiler's file descriptors.

use std::collections::HashMap;

use anyhow::{Context, Result};
use prost_types::compiler::CodeGeneratorRequest;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto};

use crate::comments::extract_comments;
use crate::model::{Document, Enum, EnumValue, Field, File, Message, Method, Service};

/// Strip leading dot from type name (protobuf returns ".package.Type", we
/// store "package.Type").
fn normalize_type_name(type_name: &str) -> &str {
    type_name.strip_prefix('.').unwrap_or(type_name)
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Protobuf keyword for a scalar field type.
fn scalar_keyword(ty: Type) -> &'static str {
    match ty {
        Type::Double => "double",
        Type::Float => "float",
        Type::Int64 => "int64",
        Type::Uint64 => "uint64",
        Type::Int32 => "int32",
        Type::Fixed64 => "fixed64",
        Type::Fixed32 => "fixed32",
        Type::Bool => "bool",
        Type::String => "string",
        Type::Bytes => "bytes",
        Type::Uint32 => "uint32",
        Type::Sfixed32 => "sfixed32",
        Type::Sfixed64 => "sfixed64",
        Type::Sint32 => "sint32",
        Type::Sint64 => "sint64",
        Type::Group => "group",
        Type::Message => "message",
        Type::Enum => "enum",
    }
}

fn field_type(field: &FieldDescriptorProto) -> String {
    match field.r#type() {
        Type::Message | Type::Group | Type::Enum => normalize_type_name(field.type_name()).to_string(),
        scalar => scalar_keyword(scalar).to_string(),
    }
}

/// Every named type across all files of the request, including imports.
#[derive(Default)]
struct TypeIndex {
    /// Map-entry message name -> (key type, value type).
    map_entries: HashMap<String, (String, String)>,
    enums: HashMap<String, Enum>,
}

impl TypeIndex {
    fn build(files: &[FileDescriptorProto]) -> Self {
        let mut index = TypeIndex::default();
        for file in files {
            let package = file.package();
            for e in &file.enum_type {
                index.add_enum(package, e);
            }
            for message in &file.message_type {
                index.add_message(package, message);
            }
        }
        index
    }

    fn add_message(&mut self, prefix: &str, message: &DescriptorProto) {
        let full_name = qualify(prefix, message.name());

        if is_map_entry(message) {
            let find = |name: &str| message.field.iter().find(|f| f.name() == name).map(field_type);
            let key = find("key").unwrap_or_default();
            let value = find("value").unwrap_or_default();
            self.map_entries.insert(full_name.clone(), (key, value));
        }

        for e in &message.enum_type {
            self.add_enum(&full_name, e);
        }
        for nested in &message.nested_type {
            self.add_message(&full_name, nested);
        }
    }

    fn add_enum(&mut self, prefix: &str, e: &EnumDescriptorProto) {
        let full_name = qualify(prefix, e.name());
        let values = e
            .value
            .iter()
            .map(|v| EnumValue {
                name: v.name().to_string(),
                number: v.number(),
            })
            .collect();
        self.enums.insert(full_name.clone(), Enum { full_name, values });
    }
}

fn is_map_entry(message: &DescriptorProto) -> bool {
    message.options.as_ref().is_some_and(|o| o.map_entry())
}

/// Build the document for the files protoc asked us to generate.
pub fn document_from_request(request: &CodeGeneratorRequest) -> Result<Document> {
    let types = TypeIndex::build(&request.proto_file);
    let by_name: HashMap<&str, &FileDescriptorProto> =
        request.proto_file.iter().map(|f| (f.name(), f)).collect();

    let mut doc = Document::default();
    for name in &request.file_to_generate {
        let file = by_name
            .get(name.as_str())
            .with_context(|| format!("file {name:?} to generate is missing from the request"))?;
        doc.files.push(convert_file(file, &types));
    }

    tracing::debug!(
        files = doc.files.len(),
        imports = request.proto_file.len().saturating_sub(doc.files.len()),
        "ingested request"
    );
    Ok(doc)
}

fn convert_file(file: &FileDescriptorProto, types: &TypeIndex) -> File {
    let package = file.package();
    let mut out = File {
        name: file.name().to_string(),
        ..Default::default()
    };

    let mut local_enums = Vec::new();
    for e in &file.enum_type {
        local_enums.push(qualify(package, e.name()));
    }
    for message in &file.message_type {
        convert_message(package, message, types, &mut out.messages, &mut local_enums);
    }

    // Own enums first, then enums this file's fields pull in from elsewhere.
    let mut enum_names = local_enums.clone();
    for message in &out.messages {
        for field in &message.fields {
            for ty in [&field.full_type, &field.map_key, &field.map_value] {
                if types.enums.contains_key(ty.as_str()) && !enum_names.contains(ty) {
                    enum_names.push(ty.clone());
                }
            }
        }
    }
    out.enums = enum_names
        .iter()
        .filter_map(|name| types.enums.get(name).cloned())
        .collect();

    let comments = extract_comments(file);
    let describe = |path: String| comments.get(&path).cloned().unwrap_or_default();
    for service in &file.service {
        let methods = service
            .method
            .iter()
            .map(|m| Method {
                name: m.name().to_string(),
                description: describe(format!("{}.{}", service.name(), m.name())),
                request_type: normalize_type_name(m.input_type()).to_string(),
            })
            .collect();
        out.services.push(Service {
            full_name: qualify(package, service.name()),
            description: describe(service.name().to_string()),
            methods,
        });
    }

    out
}

fn convert_message(
    prefix: &str,
    message: &DescriptorProto,
    types: &TypeIndex,
    messages: &mut Vec<Message>,
    enums: &mut Vec<String>,
) {
    if is_map_entry(message) {
        return;
    }
    let full_name = qualify(prefix, message.name());

    let fields = message.field.iter().map(|f| convert_field(f, types)).collect();
    messages.push(Message {
        full_name: full_name.clone(),
        fields,
    });

    for e in &message.enum_type {
        enums.push(qualify(&full_name, e.name()));
    }
    for nested in &message.nested_type {
        convert_message(&full_name, nested, types, messages, enums);
    }
}

fn convert_field(field: &FieldDescriptorProto, types: &TypeIndex) -> Field {
    let full_type = field_type(field);
    let repeated = field.label() == Label::Repeated;

    if repeated && let Some((key, value)) = types.map_entries.get(&full_type) {
        return Field::map(field.name(), key, value);
    }

    Field {
        name: field.name().to_string(),
        full_type,
        is_repeated: repeated,
        ..Default::default()
    }
}
