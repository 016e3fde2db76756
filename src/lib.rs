//! GDScript code generation for Godot clients of Twirp services.
//!
//! The crate is a protoc plugin (`protoc-gen-twirp_godot`). For every message
//! in the requested `.proto` files it emits a `Resource` class with
//! `to_dictionary`/`from_dictionary`, for every service a `Node` with one
//! awaitable method per RPC, a single `TwirpEnums` container for all enums
//! referenced by the run, and the runtime scripts those classes rely on.
//!
//! [`plugin::run`] is the whole pipeline. The pieces are usable on their own:
//! [`ingest`] builds the [`model::Document`], [`codegen::generate_document`]
//! writes it to any [`codegen::writer::OutputSink`], and [`dictionary`]
//! models the generated serialization so its behavior can be checked from
//! Rust.

pub mod codegen;
pub mod comments;
pub mod config;
pub mod dictionary;
pub mod ingest;
pub mod model;
pub mod plugin;

pub use codegen::{Summary, generate_document};
pub use config::Options;
pub use model::Document;
