//! protoc-adapter-compiler
//!
//! This crate implements:
//!  1) A tokenizer + recursive-descent parser for `.proto` IDL files (`idl`),
//!  2) A tokenizer + recursive-descent parser for C/C++ header structs (`header`),
//!  3) Transformers flattening both ASTs into one entity model,
//!  4) The matcher pairing IDL entities and fields with header ones,
//!  5) The reply-envelope post-processor (`reply_header`),
//!  6) A `Pipeline` driving all of the above, and the `AdapterError` type.

pub mod error;
pub mod utils;
pub mod idl;
pub mod header;
pub mod traits;
pub mod matcher;
pub mod reply_header;
pub mod compiler;

pub use compiler::{compile_header, compile_idl, Pipeline};
pub use error::AdapterError;
pub use matcher::match_entities;
pub use reply_header::ReplyEnvelopeConfig;
pub use traits::{Frontend, HeaderFrontend, IdlFrontend, SchemaLanguage};
