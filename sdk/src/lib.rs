//! protoc-adapter
//!
//! Entry point for consumers of the matched model (code emitters, tooling).
//!
//! - `Pipeline`, `compile_idl`, `compile_header` (re-exported from compiler)
//! - `report`: a name-resolved, serializable view of a `MatchedModel`

pub use protoc_adapter_compiler::{
    compile_header,
    compile_idl,
    match_entities,
    AdapterError,
    Pipeline,
    ReplyEnvelopeConfig,
    SchemaLanguage,
};
pub use protoc_adapter_model::{normalize, Entity, EntityArena, EntityId, EntityMatch, Field, FieldMapping, MatchedModel};

pub mod report;

pub use report::{entities_to_json, matches_to_json, MatchReport};

pub mod error {
    pub use protoc_adapter_compiler::error::AdapterError;
}

pub mod model {
    pub use protoc_adapter_model::*;
}
