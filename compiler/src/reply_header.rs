//! Reply-envelope convention.
//!
//! IDL entities whose name starts with a fixed prefix carry one nested field
//! of a well-known envelope type. That field never takes part in generic
//! matching: it is stripped beforehand and re-injected afterwards as a
//! mapping onto a synthetic reply-header entity, which only exposes a renamed
//! subset of the envelope's fields.

use std::collections::{BTreeMap, HashMap};

use protoc_adapter_model::{normalize, Entity, EntityArena, EntityId, EntityMatch, Field, FieldMapping};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AdapterError;
use crate::utils::to_camel_case;

/// Source file recorded on entities that no input declared.
pub const SYNTHETIC_SOURCE: &str = "<synthetic>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyEnvelopeConfig {
    /// IDL entity name prefix marking an envelope carrier. Case-sensitive.
    pub entity_prefix:     String,
    /// Type name of the envelope, compared after normalization.
    pub envelope_type:     String,
    /// Name of the synthetic struct-side entity.
    pub reply_header_type: String,
    /// Envelope field original name → reply-header field name. Envelope
    /// fields missing from this table are dropped from the reply header.
    pub field_renames:     BTreeMap<String, String>,
}

impl Default for ReplyEnvelopeConfig {
    fn default() -> Self {
        let mut field_renames = BTreeMap::new();
        field_renames.insert("retCode".to_string(), "returnCode".to_string());
        field_renames.insert("msgOwnId".to_string(), "returnMessage".to_string());

        ReplyEnvelopeConfig {
            entity_prefix: "Rep".to_string(),
            envelope_type: "msgHeader".to_string(),
            reply_header_type: "WebServiceReplyHeader".to_string(),
            field_renames,
        }
    }
}

impl ReplyEnvelopeConfig {
    /// Parses a JSON config. Missing keys take their default value.
    pub fn from_json(text: &str) -> Result<Self, AdapterError> {
        let config: ReplyEnvelopeConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AdapterError> {
        if self.entity_prefix.is_empty() {
            return Err(AdapterError::Config("entity_prefix must not be empty".into()));
        }
        if self.envelope_type.is_empty() {
            return Err(AdapterError::Config("envelope_type must not be empty".into()));
        }
        if self.reply_header_type.is_empty() {
            return Err(AdapterError::Config("reply_header_type must not be empty".into()));
        }
        Ok(())
    }

    pub fn is_envelope_carrier(&self, entity: &Entity) -> bool {
        entity.original_name.starts_with(&self.entity_prefix)
    }

    /// Whether `entity` is the definition of the envelope type itself.
    pub fn is_envelope_definition(&self, entity: &Entity) -> bool {
        entity.normalized_name == normalize(&self.envelope_type)
    }

    /// Index of the first nested field typed as the envelope, if any.
    pub fn find_envelope_field(&self, entity: &Entity) -> Option<usize> {
        let wanted = normalize(&self.envelope_type);
        entity.fields.iter().position(|f| {
            let leaf = f.type_name.rsplit('.').next().unwrap_or(&f.type_name);
            f.is_nested && normalize(leaf) == wanted
        })
    }
}

/// Removes the envelope field from every carrier entity in `idl`, returning
/// the removed fields keyed by their owning entity.
pub fn strip_envelope_fields(config: &ReplyEnvelopeConfig, idl: &mut EntityArena) -> HashMap<EntityId, Field> {
    let mut stripped = HashMap::new();
    let ids: Vec<EntityId> = idl.ids().collect();

    for id in ids {
        let entity = &mut idl[id];
        if !config.is_envelope_carrier(entity) {
            continue;
        }
        if let Some(index) = config.find_envelope_field(entity) {
            let field = entity.fields.remove(index);
            debug!(entity = %entity.original_name, field = %field.original_name, "stripped envelope field");
            stripped.insert(id, field);
        }
    }

    stripped
}

/// First IDL entity defining the envelope type.
pub fn resolve_envelope_definition(config: &ReplyEnvelopeConfig, idl: &EntityArena) -> Option<EntityId> {
    idl.iter()
        .find(|(_, e)| config.is_envelope_definition(e))
        .map(|(id, _)| id)
}

/// Synthesizes the reply-header struct entity, pushes it into `structs`, and
/// returns the match pairing it with the envelope definition.
pub fn build_reply_header_match(
    config: &ReplyEnvelopeConfig,
    idl: &EntityArena,
    definition: EntityId,
    structs: &mut EntityArena,
) -> EntityMatch {
    let mut renamed = Vec::new();
    let mut field_mappings = Vec::new();

    for idl_field in &idl[definition].fields {
        let Some(new_name) = config.field_renames.get(&idl_field.original_name) else {
            continue;
        };

        let struct_field = Field::new(new_name.as_str(), idl_field.type_name.as_str())
            .repeated(idl_field.is_repeated)
            .nested(idl_field.is_nested);

        renamed.push(struct_field.clone());
        field_mappings.push(FieldMapping::new(idl_field.clone(), struct_field));
    }

    let struct_entity = structs.push(Entity::new(
        config.reply_header_type.as_str(),
        renamed,
        SYNTHETIC_SOURCE,
    ));

    EntityMatch {
        idl_entity: definition,
        struct_entity,
        field_mappings,
    }
}

/// Puts each stripped envelope field back at the front of its entity's
/// mappings, paired with a synthetic struct field typed as the reply header.
/// Matches of entities that had nothing stripped are left alone.
pub fn inject_reply_header_mappings(
    config: &ReplyEnvelopeConfig,
    matches: &mut [EntityMatch],
    stripped: &HashMap<EntityId, Field>,
    definition: Option<EntityId>,
    reply_header_entity: Option<EntityId>,
) {
    for m in matches.iter_mut() {
        let Some(removed) = stripped.get(&m.idl_entity) else {
            continue;
        };

        let mut idl_field = removed.clone();
        if idl_field.nested_entity.is_none() {
            idl_field.nested_entity = definition;
        }

        let name = if idl_field.original_name.contains('_') {
            to_camel_case(&idl_field.original_name)
        } else {
            idl_field.original_name.clone()
        };

        let struct_field = Field {
            original_name:   name,
            normalized_name: idl_field.normalized_name.clone(),
            type_name:       config.reply_header_type.clone(),
            is_repeated:     false,
            is_nested:       true,
            nested_entity:   reply_header_entity,
        };

        m.field_mappings.insert(
            0,
            FieldMapping {
                idl_field,
                struct_field,
                is_reply_header_mapping: true,
            },
        );
    }

    let unmatched = stripped
        .keys()
        .filter(|id| !matches.iter().any(|m| m.idl_entity == **id))
        .count();
    if unmatched > 0 {
        debug!(unmatched, "stripped envelope fields whose entity had no struct counterpart");
    }
    if definition.is_none() && !stripped.is_empty() {
        warn!(envelope = %config.envelope_type, "envelope fields stripped but no envelope definition found");
    }
}
