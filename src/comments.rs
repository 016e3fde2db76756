// Comment extraction from SourceCodeInfo
//
// Builds a map from service and method names to comment strings by walking
// the numeric paths in SourceCodeInfo.Location through the descriptor tree.

use std::collections::HashMap;

use prost_types::{FileDescriptorProto, ServiceDescriptorProto};

// Field numbers from descriptor.proto.
const FILE_SERVICE: i32 = 6;
const SERVICE_METHOD: i32 = 2;

/// Extract comments from a FileDescriptorProto's source_code_info.
/// Returns a map from service name or dotted method path (e.g.,
/// "MyService.MyMethod") to comment string. Names are relative to the file's
/// package.
pub fn extract_comments(file: &FileDescriptorProto) -> HashMap<String, String> {
    let mut comments = HashMap::new();

    let Some(source_code_info) = &file.source_code_info else {
        return comments;
    };

    for location in &source_code_info.location {
        // Prefer leading, fall back to trailing
        let comment = location
            .leading_comments
            .as_deref()
            .or(location.trailing_comments.as_deref());

        let Some(comment) = comment else {
            continue;
        };

        if let Some(name_path) = walk_file(file, &location.path) {
            let trimmed = trim_comment(comment);
            if !trimmed.is_empty() {
                comments.insert(name_path, trimmed);
            }
        }
    }

    comments
}

// Each path is a sequence of (field number, index) pairs. Only services and
// their methods carry descriptions into the generated code.
fn walk_file(file: &FileDescriptorProto, path: &[i32]) -> Option<String> {
    match path {
        [FILE_SERVICE, index, rest @ ..] => {
            walk_service(file.service.get(usize::try_from(*index).ok()?)?, rest)
        }
        _ => None,
    }
}

fn walk_service(service: &ServiceDescriptorProto, path: &[i32]) -> Option<String> {
    let name = service.name();
    match path {
        [] => Some(name.to_string()),
        [SERVICE_METHOD, index] => {
            let method = service.method.get(usize::try_from(*index).ok()?)?;
            Some(format!("{name}.{}", method.name()))
        }
        _ => None,
    }
}

/// Trim and clean up a comment string.
fn trim_comment(comment: &str) -> String {
    // Remove leading/trailing whitespace from each line and rejoin
    comment
        .lines()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
