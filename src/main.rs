// protoc-gen-twirp_godot: reads a CodeGeneratorRequest on stdin and writes
// the CodeGeneratorResponse to stdout.

use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use prost::Message;
use prost_types::compiler::CodeGeneratorRequest;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    // stdout belongs to protoc, so logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let mut input = Vec::new();
    io::stdin().read_to_end(&mut input).context("read request from stdin")?;
    let request =
        CodeGeneratorRequest::decode(input.as_slice()).context("decode CodeGeneratorRequest")?;
    tracing::debug!(
        bytes = input.len(),
        files = request.file_to_generate.len(),
        parameter = request.parameter(),
        "read request"
    );

    let response = twirp_godot::plugin::run(&request);

    let mut output = Vec::new();
    response.encode(&mut output).context("encode CodeGeneratorResponse")?;
    io::stdout().write_all(&output).context("write response to stdout")?;
    Ok(())
}
