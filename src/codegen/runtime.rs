// Runtime support scripts copied verbatim next to the generated code.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::writer::OutputSink;

/// Suffix a bundled file must carry to be copied.
pub const SCRIPT_SUFFIX: &str = ".gd";

/// A bundle of runtime files.
pub trait AssetSource {
    /// Names of every file in the bundle, including ones that are not scripts.
    fn list(&self) -> Result<Vec<String>>;

    fn read(&self, name: &str) -> Result<String>;
}

const EMBEDDED: &[(&str, &str)] = &[
    ("README.md", include_str!("../../scripts/README.md")),
    ("token_source.gd", include_str!("../../scripts/token_source.gd")),
    ("twirp_request.gd", include_str!("../../scripts/twirp_request.gd")),
    ("twirp_response.gd", include_str!("../../scripts/twirp_response.gd")),
];

/// The `scripts/` directory compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedAssets;

impl AssetSource for EmbeddedAssets {
    fn list(&self) -> Result<Vec<String>> {
        Ok(EMBEDDED.iter().map(|(name, _)| name.to_string()).collect())
    }

    fn read(&self, name: &str) -> Result<String> {
        EMBEDDED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, content)| content.to_string())
            .with_context(|| format!("embedded runtime script {name:?} not found"))
    }
}

/// Runtime scripts read from a directory at generation time.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryAssets { root: root.into() }
    }
}

impl AssetSource for DirectoryAssets {
    fn list(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("read runtime directory {}", self.root.display()))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry =
                entry.with_context(|| format!("read runtime directory {}", self.root.display()))?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<String> {
        let path = self.root.join(name);
        fs::read_to_string(&path).with_context(|| format!("read runtime script {}", path.display()))
    }
}

/// Copy every `.gd` file of `source` into `sink` under its bundled name.
/// Returns the number of files copied.
pub fn copy_runtime(source: &dyn AssetSource, sink: &mut dyn OutputSink) -> Result<usize> {
    let mut names = source.list().context("enumerate runtime scripts")?;
    names.sort();

    let mut copied = 0;
    for name in names.iter().filter(|n| n.ends_with(SCRIPT_SUFFIX)) {
        let content = source.read(name)?;
        sink.write_unit(name, content)
            .with_context(|| format!("copy runtime script {name:?}"))?;
        copied += 1;
    }

    tracing::debug!(copied, skipped = names.len() - copied, "copied runtime scripts");
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_copy_filters_suffix() {
        let mut sink: Vec<(String, String)> = Vec::new();
        let copied = copy_runtime(&EmbeddedAssets, &mut sink).unwrap();
        assert_eq!(copied, 3);
        let names: Vec<_> = sink.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["token_source.gd", "twirp_request.gd", "twirp_response.gd"]);
        for (name, content) in &sink {
            assert_eq!(content, &EmbeddedAssets.read(name).unwrap());
        }
    }

    #[test]
    fn test_embedded_scripts_declare_runtime_classes() {
        let request = EmbeddedAssets.read("twirp_request.gd").unwrap();
        assert!(request.contains("class_name TwirpRequest"));
        assert!(request.contains("func rpcCall("));
        let response = EmbeddedAssets.read("twirp_response.gd").unwrap();
        assert!(response.contains("class_name TwirpResponse"));
        let token = EmbeddedAssets.read("token_source.gd").unwrap();
        assert!(token.contains("func get_token()"));
    }

    #[test]
    fn test_directory_source_copies_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.gd"), "extends Node\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested.gd")).unwrap();

        let mut sink: Vec<(String, String)> = Vec::new();
        let copied = copy_runtime(&DirectoryAssets::new(dir.path()), &mut sink).unwrap();
        assert_eq!(copied, 1);
        assert_eq!(sink, vec![("a.gd".to_string(), "extends Node\n".to_string())]);
    }

    #[test]
    fn test_missing_directory_aborts_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let mut sink: Vec<(String, String)> = Vec::new();
        let err = copy_runtime(&DirectoryAssets::new(&missing), &mut sink).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("nope"), "{msg}");
        assert!(sink.is_empty());
    }
}
