// protoc plugin envelope: CodeGeneratorRequest in, CodeGeneratorResponse out.

use anyhow::{Context, Result};
use prost_types::compiler::code_generator_response::{self, Feature};
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};

use crate::codegen::runtime::{AssetSource, DirectoryAssets, EmbeddedAssets};
use crate::codegen::writer::OutputSink;
use crate::codegen::{self, Summary};
use crate::config::{Options, RuntimeScripts};
use crate::ingest::document_from_request;

impl OutputSink for Vec<code_generator_response::File> {
    fn write_unit(&mut self, name: &str, content: String) -> Result<()> {
        self.push(code_generator_response::File {
            name: Some(name.to_string()),
            content: Some(content),
            ..Default::default()
        });
        Ok(())
    }
}

/// Run the generator over a request.
///
/// Never fails: generation errors are reported to protoc through the
/// response's `error` field, and in that case no files are returned.
pub fn run(request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
    let mut response = CodeGeneratorResponse {
        supported_features: Some(Feature::Proto3Optional as u64),
        ..Default::default()
    };

    let mut files = Vec::new();
    match generate(request, &mut files) {
        Ok(_) => response.file = files,
        Err(err) => {
            tracing::error!("{err:#}");
            response.error = Some(format!("{err:#}"));
        }
    }
    response
}

/// Generate into `sink`. Units written before a failure stay in the sink.
pub fn generate(request: &CodeGeneratorRequest, sink: &mut dyn OutputSink) -> Result<Summary> {
    let options = Options::parse(request.parameter.as_deref()).context("parse plugin parameters")?;
    let doc = document_from_request(request)?;

    let dir;
    let runtime: Option<&dyn AssetSource> = match &options.runtime {
        RuntimeScripts::Embedded => Some(&EmbeddedAssets),
        RuntimeScripts::Directory(path) => {
            dir = DirectoryAssets::new(path);
            Some(&dir)
        }
        RuntimeScripts::Skip => None,
    };

    codegen::generate_document(&doc, runtime, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto};
    use prost_types::field_descriptor_proto::{Label, Type};

    fn request(parameter: Option<&str>) -> CodeGeneratorRequest {
        let ping = DescriptorProto {
            name: Some("Ping".into()),
            field: vec![FieldDescriptorProto {
                name: Some("seq".into()),
                number: Some(1),
                label: Some(Label::Optional as i32),
                r#type: Some(Type::Int32 as i32),
                ..Default::default()
            }],
            ..Default::default()
        };
        CodeGeneratorRequest {
            file_to_generate: vec!["ping.proto".into()],
            parameter: parameter.map(str::to_string),
            proto_file: vec![FileDescriptorProto {
                name: Some("ping.proto".into()),
                package: Some("net".into()),
                message_type: vec![ping],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn names(response: &CodeGeneratorResponse) -> Vec<&str> {
        response.file.iter().map(|f| f.name()).collect()
    }

    #[test]
    fn test_run_default_options() {
        let response = run(&request(None));
        assert_eq!(response.error, None);
        assert_eq!(response.supported_features, Some(1));
        assert_eq!(
            names(&response),
            ["net.Ping.gd", "enums.gd", "token_source.gd", "twirp_request.gd", "twirp_response.gd"]
        );
        assert!(response.file[0].content().contains("class_name net_Ping"));
    }

    #[test]
    fn test_run_skip_runtime() {
        let response = run(&request(Some("runtime=skip")));
        assert_eq!(names(&response), ["net.Ping.gd", "enums.gd"]);
    }

    #[test]
    fn test_bad_parameter_reported_in_response() {
        let response = run(&request(Some("flavor=mint")));
        assert!(response.file.is_empty());
        let error = response.error.unwrap();
        assert!(error.contains("parse plugin parameters"), "{error}");
        assert!(error.contains("flavor"), "{error}");
    }

    #[test]
    fn test_missing_runtime_dir_reported_in_response() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let param = format!("runtime_dir={}", missing.display());
        let response = run(&request(Some(&param)));
        assert!(response.file.is_empty());
        assert!(response.error.unwrap().contains("nope"));
    }
}
