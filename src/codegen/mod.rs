// twirp-godot codegen module
//
// Single sequential pass over a `Document`: build the enum index, emit one
// unit per message and per service, then the enum container, then the
// runtime scripts. The first error aborts the pass; units already flushed to
// the sink stay there.

use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::model::Document;

pub mod enums;
pub mod message;
pub mod names;
pub mod runtime;
pub mod service;
pub mod types;
pub mod writer;

use enums::EnumIndex;
use runtime::AssetSource;
use types::TypeMapper;
use writer::OutputSink;

/// State shared by every emission of one run.
pub struct Session<'a> {
    pub enums: EnumIndex<'a>,
}

impl<'a> Session<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Session {
            enums: EnumIndex::build(doc),
        }
    }

    pub fn mapper(&self) -> TypeMapper<'_, 'a> {
        TypeMapper::new(&self.enums)
    }
}

/// What a run produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub messages: usize,
    pub services: usize,
    pub enums: usize,
    pub runtime_scripts: usize,
}

/// Generate GDScript for `doc`. `runtime` is `None` when runtime scripts
/// should not be copied.
pub fn generate_document(
    doc: &Document,
    runtime: Option<&dyn AssetSource>,
    sink: &mut dyn OutputSink,
) -> Result<Summary> {
    let session = Session::new(doc);
    warn_class_name_collisions(doc, &session);

    let mut summary = Summary::default();
    for file in &doc.files {
        tracing::debug!(file = %file.name, "generating file");

        for m in &file.messages {
            message::emit_message(m, session.mapper(), sink)
                .with_context(|| format!("generate message resource {:?}", m.full_name))?;
            summary.messages += 1;
        }

        for s in &file.services {
            service::emit_service(s, sink)
                .with_context(|| format!("generate service node {:?}", s.full_name))?;
            summary.services += 1;
        }
    }

    enums::emit_enums(&session.enums, sink).context("generate enums")?;
    summary.enums = session.enums.len();

    if let Some(source) = runtime {
        summary.runtime_scripts = runtime::copy_runtime(source, sink)?;
    }

    tracing::info!(
        messages = summary.messages,
        services = summary.services,
        enums = summary.enums,
        runtime_scripts = summary.runtime_scripts,
        "generation complete"
    );
    Ok(summary)
}

// Class names are not guaranteed unique ("a.b_c" and "a_b.c" both become
// "a_b_c"). Report clashes, leave the output alone.
fn warn_class_name_collisions(doc: &Document, session: &Session) {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let names = doc
        .files
        .iter()
        .flat_map(|f| {
            let messages = f.messages.iter().map(|m| m.full_name.as_str());
            let services = f.services.iter().map(|s| s.full_name.as_str());
            messages.chain(services)
        })
        .chain(session.enums.iter().map(|e| e.full_name.as_str()));

    for full_name in names {
        let class = names::class_name(full_name);
        match seen.get(class.as_str()) {
            Some(&other) if other != full_name => {
                tracing::warn!(%class, first = other, second = full_name, "class name collision");
            }
            Some(_) => {}
            None => {
                seen.insert(class, full_name);
            }
        }
    }
}
