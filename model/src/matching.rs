use serde::Serialize;

use crate::{Entity, EntityArena, EntityId, Field};

/// One IDL field paired with its header-side counterpart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMapping {
    pub idl_field:               Field,
    pub struct_field:            Field,
    pub is_reply_header_mapping: bool,
}

impl FieldMapping {
    pub fn new(idl_field: Field, struct_field: Field) -> Self {
        FieldMapping {
            idl_field,
            struct_field,
            is_reply_header_mapping: false,
        }
    }
}

/// An IDL entity paired with a header entity. `idl_entity` is a handle into
/// the IDL arena and `struct_entity` a handle into the header arena.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityMatch {
    pub idl_entity:     EntityId,
    pub struct_entity:  EntityId,
    pub field_mappings: Vec<FieldMapping>,
}

/// Output of a full matching run: both arenas plus the ordered matches that
/// index into them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchedModel {
    pub idl:     EntityArena,
    pub structs: EntityArena,
    pub matches: Vec<EntityMatch>,
}

impl MatchedModel {
    pub fn idl_entity(&self, m: &EntityMatch) -> &Entity {
        &self.idl[m.idl_entity]
    }

    pub fn struct_entity(&self, m: &EntityMatch) -> &Entity {
        &self.structs[m.struct_entity]
    }

    /// Looks up a match by the IDL entity's original name.
    pub fn find_match(&self, idl_name: &str) -> Option<&EntityMatch> {
        self.matches
            .iter()
            .find(|m| self.idl[m.idl_entity].original_name == idl_name)
    }

    /// Original name of the header entity a struct-side field is linked to.
    pub fn struct_nested_name(&self, field: &Field) -> Option<&str> {
        field
            .nested_entity
            .and_then(|id| self.structs.get(id))
            .map(|e| e.original_name.as_str())
    }

    /// Original name of the IDL entity an IDL-side field is linked to.
    pub fn idl_nested_name(&self, field: &Field) -> Option<&str> {
        field
            .nested_entity
            .and_then(|id| self.idl.get(id))
            .map(|e| e.original_name.as_str())
    }
}
