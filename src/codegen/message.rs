// Data-class emission: one `extends Resource` unit per message.

use anyhow::Result;

use super::names::{class_name, field_identifier, is_reserved, quote};
use super::types::{ElementRule, FromDictRule, FromElementRule, ToDictRule, TypeMapper};
use super::writer::{GdWriter, OutputSink, Unit};
use crate::model::{Field, Message};

pub fn emit_message(message: &Message, mapper: TypeMapper, sink: &mut dyn OutputSink) -> Result<()> {
    let class = class_name(&message.full_name);
    let mut unit = Unit::new(format!("{}.gd", message.full_name));

    unit.line("extends Resource");
    unit.line(format!("class_name {class}"));
    unit.blank();

    emit_declarations(&mut unit, message, mapper);
    unit.blank();

    for field in message.fields.iter().filter(|f| f.is_map) {
        emit_map_mutator(&mut unit, field, mapper);
    }

    emit_to_dictionary(&mut unit, message, mapper);
    emit_known_fields(&mut unit, message);
    emit_from_dictionary(&mut unit, message, &class, mapper);

    unit.finish(sink)
}

fn emit_declarations(w: &mut GdWriter, message: &Message, mapper: TypeMapper) {
    for field in &message.fields {
        if is_reserved(&field.name) {
            tracing::debug!(
                message = %message.full_name,
                field = %field.name,
                "field name is a GDScript reserved word"
            );
        }
        let (ty, comment) = mapper.declared_type(field);
        if let Some(comment) = comment {
            w.line(comment);
        }
        w.line(format!("var {} : {ty}", field_identifier(&field.name)));
    }
}

fn emit_map_mutator(w: &mut GdWriter, field: &Field, mapper: TypeMapper) {
    let ident = field_identifier(&field.name);
    w.line(format!(
        "func set_{ident}_value(name : {}, value : {}):",
        mapper.resolve(&field.map_key),
        mapper.resolve(&field.map_value)
    ));
    {
        let _i = w.indent();
        w.line(format!("if {ident} == null:"));
        {
            let _j = w.indent();
            w.line(format!("{ident} = {{}}"));
        }
        w.blank();
        w.line(format!("{ident}[name] = value"));
    }
    w.blank();
}

fn emit_to_dictionary(w: &mut GdWriter, message: &Message, mapper: TypeMapper) {
    w.line("func to_dictionary() -> Dictionary:");
    let _i = w.indent();
    w.line("var dict = {}");
    w.blank();

    for field in &message.fields {
        let ident = field_identifier(&field.name);
        let target = format!("dict[{}]", quote(&field.name));
        match mapper.classify(field).to_dict_rule() {
            ToDictRule::PassThrough | ToDictRule::Always => {
                w.line(format!("{target} = {ident}"));
            }
            ToDictRule::EachElement(rule) => {
                let arr = format!("arr_{ident}");
                w.line(format!("if {ident}.size() > 0:"));
                let _j = w.indent();
                w.line(format!("var {arr} = []"));
                w.line(format!("for v in {ident}:"));
                {
                    let _k = w.indent();
                    w.line("var item");
                    element_to_dict(w, rule, "item", "v");
                    w.line(format!("{arr}.append(item)"));
                }
                w.blank();
                w.line(format!("{target} = {arr}"));
                w.blank();
            }
            ToDictRule::Base64 => {
                w.line(format!("{target} = Marshalls.raw_to_base64({ident})"));
            }
            ToDictRule::NonEmptyText => {
                w.line(format!("if {ident} != \"\":"));
                let _j = w.indent();
                w.line(format!("{target} = {ident}"));
            }
            ToDictRule::Nested => nested_to_dict(w, &target, &ident),
        }
    }

    w.blank();
    w.line("return dict");
    w.blank();
}

fn element_to_dict(w: &mut GdWriter, rule: ElementRule, target: &str, source: &str) {
    match rule {
        ElementRule::Always => w.line(format!("{target} = {source}")),
        ElementRule::Base64 => w.line(format!("{target} = Marshalls.raw_to_base64({source})")),
        ElementRule::NonEmptyText => {
            w.line(format!("if {source} != \"\":"));
            let _i = w.indent();
            w.line(format!("{target} = {source}"));
        }
        ElementRule::Nested => nested_to_dict(w, target, source),
    }
}

fn nested_to_dict(w: &mut GdWriter, target: &str, source: &str) {
    w.line(format!("if {source} != null:"));
    let _i = w.indent();
    w.line(format!("{target} = {source}.to_dictionary()"));
}

// Generated from the same field list as the declarations so the strict check
// always matches what `from_dictionary` reads.
fn emit_known_fields(w: &mut GdWriter, message: &Message) {
    w.line("static var _known_fields : Dictionary = {");
    {
        let _i = w.indent();
        for field in &message.fields {
            w.line(format!("{}: true,", quote(&field.name)));
        }
    }
    w.line("}");
    w.blank();
}

fn emit_from_dictionary(w: &mut GdWriter, message: &Message, class: &str, mapper: TypeMapper) {
    w.line(format!(
        "static func from_dictionary(dict : Dictionary, strict : bool = false) -> {class}:"
    ));
    let _i = w.indent();
    w.line(format!("var obj = {class}.new()"));
    w.blank();

    for field in &message.fields {
        let source = format!("dict[{}]", quote(&field.name));
        let target = format!("obj.{}", field_identifier(&field.name));
        let element_class = mapper.resolve(&field.full_type);

        w.line(format!("if dict.has({}):", quote(&field.name)));
        let _j = w.indent();
        match mapper.classify(field).from_dict_rule() {
            FromDictRule::PassThrough | FromDictRule::Raw => {
                w.line(format!("{target} = {source}"));
            }
            FromDictRule::IntCoerce => w.line(format!("{target} = int({source})")),
            FromDictRule::EachElement(rule) => {
                w.line(format!("for v in {source}:"));
                let _k = w.indent();
                w.line("var item");
                element_from_dict(w, rule, "item", "v", &element_class);
                w.line(format!("{target}.append(item)"));
            }
            FromDictRule::Base64 => {
                w.line(format!("{target} = Marshalls.base64_to_raw({source})"));
            }
            FromDictRule::Nested => {
                w.line(format!("{target} = {element_class}.from_dictionary({source})"));
            }
        }
        w.blank();
    }

    w.line("if strict:");
    {
        let _j = w.indent();
        w.line("for key in dict:");
        let _k = w.indent();
        w.line("assert(_known_fields.has(key), \"ERROR: unknown field '%s'\" % key)");
    }
    w.blank();
    w.line("return obj");
    w.blank();
}

fn element_from_dict(w: &mut GdWriter, rule: FromElementRule, target: &str, source: &str, class: &str) {
    match rule {
        FromElementRule::IntCoerce => w.line(format!("{target} = int({source})")),
        FromElementRule::Base64 => w.line(format!("{target} = Marshalls.base64_to_raw({source})")),
        FromElementRule::Raw => w.line(format!("{target} = {source}")),
        FromElementRule::Nested => w.line(format!("{target} = {class}.from_dictionary({source})")),
    }
}
