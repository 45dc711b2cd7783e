use protoc_adapter_compiler::AdapterError;
use protoc_adapter_model::{EntityArena, EntityMatch, FieldMapping, MatchedModel};
use serde::Serialize;

/// Serializable view of a [`MatchedModel`] in which every arena handle is
/// replaced by the entity's original name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub matches: Vec<EntityMatchReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityMatchReport {
    pub idl_entity:    String,
    pub idl_source:    String,
    pub struct_entity: String,
    pub struct_source: String,
    pub fields:        Vec<FieldMappingReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMappingReport {
    pub idl_field:    String,
    pub idl_type:     String,
    pub struct_field: String,
    pub struct_type:  String,
    pub is_repeated:  bool,
    pub is_nested:    bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idl_nested:    Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub struct_nested: Option<String>,
    pub is_reply_header_mapping: bool,
}

impl MatchReport {
    pub fn new(model: &MatchedModel) -> Self {
        MatchReport {
            matches: model.matches.iter().map(|m| entity_report(model, m)).collect(),
        }
    }
}

fn entity_report(model: &MatchedModel, m: &EntityMatch) -> EntityMatchReport {
    let idl_entity    = model.idl_entity(m);
    let struct_entity = model.struct_entity(m);

    EntityMatchReport {
        idl_entity:    idl_entity.original_name.clone(),
        idl_source:    idl_entity.source_file.clone(),
        struct_entity: struct_entity.original_name.clone(),
        struct_source: struct_entity.source_file.clone(),
        fields:        m.field_mappings.iter().map(|fm| field_report(model, fm)).collect(),
    }
}

fn field_report(model: &MatchedModel, fm: &FieldMapping) -> FieldMappingReport {
    FieldMappingReport {
        idl_field:     fm.idl_field.original_name.clone(),
        idl_type:      fm.idl_field.type_name.clone(),
        struct_field:  fm.struct_field.original_name.clone(),
        struct_type:   fm.struct_field.type_name.clone(),
        is_repeated:   fm.struct_field.is_repeated,
        is_nested:     fm.struct_field.is_nested,
        idl_nested:    model.idl_nested_name(&fm.idl_field).map(str::to_string),
        struct_nested: model.struct_nested_name(&fm.struct_field).map(str::to_string),
        is_reply_header_mapping: fm.is_reply_header_mapping,
    }
}

/// Pretty-printed JSON [`MatchReport`] for `model`.
pub fn matches_to_json(model: &MatchedModel) -> Result<String, AdapterError> {
    Ok(serde_json::to_string_pretty(&MatchReport::new(model))?)
}

/// Pretty-printed JSON of one arena's entities.
pub fn entities_to_json(arena: &EntityArena) -> Result<String, AdapterError> {
    Ok(serde_json::to_string_pretty(arena)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use protoc_adapter_compiler::Pipeline;

    fn model() -> MatchedModel {
        let mut pipeline = Pipeline::new();
        pipeline
            .add_idl(
                "message Order { repeated Item items = 1; message Item { int32 sku = 1; } }",
                "order.proto",
            )
            .unwrap();
        pipeline
            .add_header("struct Order { struct Item { int sku; }; Item items; };", "order.h")
            .unwrap();
        pipeline.run().unwrap()
    }

    #[test]
    fn test_report_resolves_names() {
        let report = MatchReport::new(&model());
        assert_eq!(report.matches.len(), 2);

        let order = &report.matches[0];
        assert_eq!(order.idl_entity, "Order");
        assert_eq!(order.struct_source, "order.h");

        let items = &order.fields[0];
        assert_eq!(items.struct_field, "items");
        assert!(items.is_repeated && items.is_nested);
        assert_eq!(items.idl_nested.as_deref(), Some("Item"));
        assert_eq!(items.struct_nested.as_deref(), Some("Item"));
        assert!(!items.is_reply_header_mapping);
    }

    #[test]
    fn test_json_output() {
        let json = matches_to_json(&model()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["matches"][1]["idl_entity"], "Item");
        assert_eq!(value["matches"][1]["fields"][0]["struct_field"], "sku");
        assert!(value["matches"][1]["fields"][0].get("idl_nested").is_none());

        let arena = protoc_adapter_compiler::compile_idl("message A { int32 x = 1; }", "a.proto").unwrap();
        let json = entities_to_json(&arena).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["original_name"], "A");
        assert_eq!(value[0]["fields"][0]["normalized_name"], "X");
    }
}
