// codegen-tests/src/lib.rs
//
// Hand-built descriptor fixtures, shaped the way protoc hands them to a
// plugin: fully qualified type names with a leading dot, synthesized map
// entries nested in their owning message, comments in SourceCodeInfo.

use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::source_code_info::Location;
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MessageOptions, MethodDescriptorProto, ServiceDescriptorProto,
    SourceCodeInfo,
};

pub fn scalar(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.into()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

pub fn repeated(mut field: FieldDescriptorProto) -> FieldDescriptorProto {
    field.label = Some(Label::Repeated as i32);
    field
}

/// A field referencing a message or enum by its qualified name.
pub fn typed(name: &str, number: i32, ty: Type, full_type: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(format!(".{full_type}")),
        ..scalar(name, number, ty)
    }
}

pub fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.into()),
        field: fields,
        ..Default::default()
    }
}

/// Adds `map<key, value> name = number;` to `owner`, the way protoc lowers it.
pub fn add_map_field(
    owner: &mut DescriptorProto,
    owner_full_name: &str,
    name: &str,
    number: i32,
    key: FieldDescriptorProto,
    value: FieldDescriptorProto,
) {
    let entry_name = format!("{}Entry", camel(name));
    let mut entry = message(&entry_name, vec![key, value]);
    entry.options = Some(MessageOptions {
        map_entry: Some(true),
        ..Default::default()
    });
    owner.nested_type.push(entry);
    owner.field.push(repeated(typed(
        name,
        number,
        Type::Message,
        &format!("{owner_full_name}.{entry_name}"),
    )));
}

fn camel(name: &str) -> String {
    name.split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

pub fn enumeration(name: &str, values: &[(&str, i32)]) -> EnumDescriptorProto {
    EnumDescriptorProto {
        name: Some(name.into()),
        value: values
            .iter()
            .map(|(name, number)| EnumValueDescriptorProto {
                name: Some((*name).into()),
                number: Some(*number),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

pub fn service(name: &str, methods: &[(&str, &str, &str)]) -> ServiceDescriptorProto {
    ServiceDescriptorProto {
        name: Some(name.into()),
        method: methods
            .iter()
            .map(|(name, input, output)| MethodDescriptorProto {
                name: Some((*name).into()),
                input_type: Some(format!(".{input}")),
                output_type: Some(format!(".{output}")),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

pub fn leading_comment(path: &[i32], text: &str) -> Location {
    Location {
        path: path.to_vec(),
        leading_comments: Some(text.into()),
        ..Default::default()
    }
}

pub fn request(
    generate: &[&str],
    parameter: Option<&str>,
    files: Vec<FileDescriptorProto>,
) -> CodeGeneratorRequest {
    CodeGeneratorRequest {
        file_to_generate: generate.iter().map(|f| f.to_string()).collect(),
        parameter: parameter.map(str::to_string),
        proto_file: files,
        ..Default::default()
    }
}

/// `common/color.proto`: `package common; enum Color { RED = 0; GREEN = 1; BLUE = 2; }`
pub fn color_proto() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("common/color.proto".into()),
        package: Some("common".into()),
        enum_type: vec![enumeration("Color", &[("RED", 0), ("GREEN", 1), ("BLUE", 2)])],
        syntax: Some("proto3".into()),
        ..Default::default()
    }
}

/// `shop/item.proto`: the `Item` record with every field kind.
pub fn item_proto() -> FileDescriptorProto {
    let mut item = message(
        "Item",
        vec![
            scalar("id", 1, Type::Int64),
            repeated(scalar("tags", 2, Type::String)),
            typed("color", 3, Type::Enum, "common.Color"),
            scalar("name", 5, Type::String),
            scalar("thumbnail", 6, Type::Bytes),
            scalar("price", 7, Type::Double),
            scalar("in_stock", 8, Type::Bool),
            typed("maker", 9, Type::Message, "shop.Maker"),
            repeated(typed("variants", 10, Type::Message, "shop.Item.Variant")),
        ],
    );
    add_map_field(
        &mut item,
        "shop.Item",
        "meta",
        4,
        scalar("key", 1, Type::String),
        scalar("value", 2, Type::String),
    );
    item.nested_type.push(message("Variant", vec![scalar("sku", 1, Type::String)]));

    FileDescriptorProto {
        name: Some("shop/item.proto".into()),
        package: Some("shop".into()),
        dependency: vec!["common/color.proto".into()],
        message_type: vec![item, message("Maker", vec![scalar("name", 1, Type::String)])],
        syntax: Some("proto3".into()),
        ..Default::default()
    }
}

/// `shop/catalog.proto`: request messages and the `Catalog` service.
pub fn catalog_proto() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("shop/catalog.proto".into()),
        package: Some("shop".into()),
        dependency: vec!["common/color.proto".into(), "shop/item.proto".into()],
        message_type: vec![
            message("GetItemRequest", vec![scalar("id", 1, Type::Int64)]),
            message(
                "ListItemsRequest",
                vec![typed("color", 1, Type::Enum, "common.Color")],
            ),
            message(
                "ListItemsResponse",
                vec![repeated(typed("items", 1, Type::Message, "shop.Item"))],
            ),
        ],
        service: vec![service(
            "Catalog",
            &[
                ("GetItem", "shop.GetItemRequest", "shop.Item"),
                ("ListItems", "shop.ListItemsRequest", "shop.ListItemsResponse"),
            ],
        )],
        source_code_info: Some(SourceCodeInfo {
            location: vec![
                leading_comment(&[6, 0], " Read-only view of the shop.\n"),
                leading_comment(&[6, 0, 2, 1], " Lists items.\n\n Filtered by color.\n"),
            ],
        }),
        syntax: Some("proto3".into()),
        ..Default::default()
    }
}

/// Both shop files generated, the color file only imported.
pub fn shop_request(parameter: Option<&str>) -> CodeGeneratorRequest {
    request(
        &["shop/item.proto", "shop/catalog.proto"],
        parameter,
        vec![color_proto(), item_proto(), catalog_proto()],
    )
}

/// The content of the response file called `name`.
pub fn content<'a>(response: &'a CodeGeneratorResponse, name: &str) -> Option<&'a str> {
    response
        .file
        .iter()
        .find(|f| f.name() == name)
        .map(|f| f.content())
}

pub fn file_names(response: &CodeGeneratorResponse) -> Vec<&str> {
    response.file.iter().map(|f| f.name()).collect()
}
