// Service stubs: one `extends Node` unit per service, one RPC call per method.

use anyhow::Result;

use super::names::{class_name, quote};
use super::writer::{GdWriter, OutputSink, Unit};
use crate::model::Service;

pub fn emit_service(service: &Service, sink: &mut dyn OutputSink) -> Result<()> {
    let mut unit = Unit::new(format!("{}.gd", service.full_name));

    unit.line("extends Node");
    unit.blank();

    description(&mut unit, &service.description);
    unit.line(format!("class_name {}", class_name(&service.full_name)));
    unit.blank();

    unit.line("@export var token_source : Node");
    unit.line("@export var server_url : String");
    unit.blank();

    for method in &service.methods {
        description(&mut unit, &method.description);
        unit.line(format!(
            "func {}(req : {}) -> TwirpResponse:",
            method.name,
            class_name(&method.request_type)
        ));
        let _i = unit.indent();
        unit.line("var treq = TwirpRequest.new()");
        unit.line("treq.token = await token_source.get_token()");
        unit.line("treq.server = server_url");
        unit.line(format!("treq.service = {}", quote(&service.full_name)));
        unit.line(format!("treq.method = {}", quote(&method.name)));
        unit.line("add_child(treq)");
        unit.line("var resp = await treq.rpcCall(req.to_dictionary())");
        unit.line("treq.queue_free()");
        unit.line("return resp");
        unit.blank();
    }

    unit.finish(sink)
}

fn description(w: &mut GdWriter, text: &str) {
    for line in text.lines() {
        if line.is_empty() {
            w.line("#");
        } else {
            w.line(format!("# {line}"));
        }
    }
}
