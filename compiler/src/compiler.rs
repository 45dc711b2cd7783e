use protoc_adapter_model::{EntityArena, EntityId, MatchedModel};
use tracing::debug;

use crate::error::AdapterError;
use crate::matcher::{match_entities, match_selected};
use crate::reply_header::{
    build_reply_header_match,
    inject_reply_header_mappings,
    resolve_envelope_definition,
    strip_envelope_fields,
    ReplyEnvelopeConfig,
};
use crate::traits::{Frontend, HeaderFrontend, IdlFrontend, SchemaLanguage};

/// Compile one `.proto` text into a fresh arena.
/// Returns `Err(AdapterError::ParseError)` on malformed input.
pub fn compile_idl(text: &str, source_file: &str) -> Result<EntityArena, AdapterError> {
    let mut arena = EntityArena::new();
    IdlFrontend.load(text, source_file, &mut arena)?;
    Ok(arena)
}

/// Compile one header text into a fresh arena.
pub fn compile_header(text: &str, source_file: &str) -> Result<EntityArena, AdapterError> {
    let mut arena = EntityArena::new();
    HeaderFrontend.load(text, source_file, &mut arena)?;
    Ok(arena)
}

/// Collects IDL and header sources, then matches them in one pass.
///
/// ```
/// use protoc_adapter_compiler::Pipeline;
///
/// let mut pipeline = Pipeline::new();
/// pipeline.add_idl("message Point { int32 x = 1; }", "point.proto").unwrap();
/// pipeline.add_header("struct Point { int x; };", "point.h").unwrap();
///
/// let model = pipeline.run().unwrap();
/// assert_eq!(model.matches.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Pipeline {
    idl:            EntityArena,
    structs:        EntityArena,
    reply_envelope: Option<ReplyEnvelopeConfig>,
}

impl Pipeline {
    /// A pipeline with the reply-envelope convention disabled.
    pub fn new() -> Self {
        Pipeline::default()
    }

    pub fn with_reply_envelope(mut self, config: ReplyEnvelopeConfig) -> Self {
        self.reply_envelope = Some(config);
        self
    }

    pub fn add_idl(&mut self, text: &str, source_file: &str) -> Result<Vec<EntityId>, AdapterError> {
        self.add_source(SchemaLanguage::Idl, text, source_file)
    }

    pub fn add_header(&mut self, text: &str, source_file: &str) -> Result<Vec<EntityId>, AdapterError> {
        self.add_source(SchemaLanguage::Header, text, source_file)
    }

    pub fn add_source(
        &mut self,
        language: SchemaLanguage,
        text: &str,
        source_file: &str,
    ) -> Result<Vec<EntityId>, AdapterError> {
        let arena = match language {
            SchemaLanguage::Idl => &mut self.idl,
            SchemaLanguage::Header => &mut self.structs,
        };
        let ids = language.frontend().load(text, source_file, arena)?;
        debug!(file = source_file, ?language, entities = ids.len(), "loaded source");
        Ok(ids)
    }

    pub fn idl(&self) -> &EntityArena {
        &self.idl
    }

    pub fn structs(&self) -> &EntityArena {
        &self.structs
    }

    pub fn run(self) -> Result<MatchedModel, AdapterError> {
        let Pipeline { mut idl, mut structs, reply_envelope } = self;

        let Some(config) = reply_envelope else {
            let matches = match_entities(&idl, &mut structs)?;
            return Ok(MatchedModel { idl, structs, matches });
        };

        let stripped   = strip_envelope_fields(&config, &mut idl);
        let definition = resolve_envelope_definition(&config, &idl);

        let selected: Vec<EntityId> = idl
            .iter()
            .filter(|(_, e)| !config.is_envelope_definition(e))
            .map(|(id, _)| id)
            .collect();
        let mut matches = match_selected(&idl, &selected, &mut structs)?;

        let mut reply_header_entity = None;
        if let Some(definition) = definition {
            let reply_header = build_reply_header_match(&config, &idl, definition, &mut structs);
            reply_header_entity = Some(reply_header.struct_entity);
            matches.push(reply_header);
        }

        inject_reply_header_mappings(&config, &mut matches, &stripped, definition, reply_header_entity);

        debug!(
            matches = matches.len(),
            stripped = stripped.len(),
            "matched with reply-envelope convention"
        );
        Ok(MatchedModel { idl, structs, matches })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDL: &str = r#"
        syntax = "proto3";
        message MsgHeader {
            int32  retCode  = 1;
            string msgOwnId = 2;
            string traceId  = 3;
        }
        message RepOrder {
            MsgHeader msg_header = 1;
            int32     order_id   = 2;
        }
        message Order {
            int32 order_id = 1;
        }
    "#;

    const HEADER: &str = r#"
        struct RepOrder { int orderId; };
        struct Order { int orderId; };
    "#;

    fn pipeline() -> Pipeline {
        let mut pipeline = Pipeline::new();
        pipeline.add_idl(IDL, "order.proto").unwrap();
        pipeline.add_header(HEADER, "order.h").unwrap();
        pipeline
    }

    #[test]
    fn test_compile_helpers() {
        let idl = compile_idl(IDL, "order.proto").unwrap();
        assert_eq!(idl.len(), 3);
        let structs = compile_header(HEADER, "order.h").unwrap();
        assert_eq!(structs.len(), 2);
        assert!(compile_idl("message {", "bad.proto").is_err());
    }

    #[test]
    fn test_without_envelope_convention_unmatched_field_fails() {
        // `msg_header` has no struct counterpart.
        let err = pipeline().run().unwrap_err();
        assert!(matches!(err, AdapterError::UnmatchedField { ref field, .. } if field == "msg_header"));
    }

    #[test]
    fn test_with_envelope_convention() {
        let model = pipeline()
            .with_reply_envelope(ReplyEnvelopeConfig::default())
            .run()
            .unwrap();

        let names: Vec<_> = model
            .matches
            .iter()
            .map(|m| model.idl_entity(m).original_name.as_str())
            .collect();
        assert_eq!(names, vec!["RepOrder", "Order", "MsgHeader"]);

        let rep = model.find_match("RepOrder").unwrap();
        assert_eq!(rep.field_mappings.len(), 2);
        assert!(rep.field_mappings[0].is_reply_header_mapping);
        assert_eq!(rep.field_mappings[0].struct_field.type_name, "WebServiceReplyHeader");
        assert!(!rep.field_mappings[1].is_reply_header_mapping);

        let order = model.find_match("Order").unwrap();
        assert!(order.field_mappings.iter().all(|fm| !fm.is_reply_header_mapping));

        let header = model.find_match("MsgHeader").unwrap();
        assert_eq!(model.struct_entity(header).original_name, "WebServiceReplyHeader");
        assert_eq!(model.struct_entity(header).fields.len(), 2);
    }
}
