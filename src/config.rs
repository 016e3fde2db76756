// Plugin parameters, passed by protoc as `--twirp_godot_opt=k=v,k=v`.

use std::path::PathBuf;

use anyhow::{Result, bail};

/// Where the runtime scripts come from, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RuntimeScripts {
    /// The scripts compiled into the plugin binary.
    #[default]
    Embedded,
    /// Every `.gd` file in a directory on disk.
    Directory(PathBuf),
    /// Don't emit runtime scripts at all.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Options {
    pub runtime: RuntimeScripts,
}

impl Options {
    pub fn parse(parameter: Option<&str>) -> Result<Options> {
        let mut opts = Options::default();
        let Some(parameter) = parameter else {
            return Ok(opts);
        };

        let mut dir = None;
        let mut skip = false;
        for part in parameter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = part.split_once('=') else {
                bail!("malformed parameter {part:?}, expected key=value");
            };
            match (key.trim(), value.trim()) {
                ("runtime", "embedded") => skip = false,
                ("runtime", "skip") => skip = true,
                ("runtime", other) => bail!("unknown runtime {other:?}, expected embedded or skip"),
                ("runtime_dir", "") => bail!("runtime_dir needs a path"),
                ("runtime_dir", path) => dir = Some(PathBuf::from(path)),
                (other, _) => bail!("unknown parameter {other:?}"),
            }
        }

        opts.runtime = match (skip, dir) {
            (true, Some(_)) => bail!("runtime=skip conflicts with runtime_dir"),
            (true, None) => RuntimeScripts::Skip,
            (false, Some(dir)) => RuntimeScripts::Directory(dir),
            (false, None) => RuntimeScripts::Embedded,
        };
        Ok(opts)
    }
}
