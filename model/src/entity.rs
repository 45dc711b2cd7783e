use serde::Serialize;

use crate::{normalize, EntityId};

/// A named, typed member of an [`Entity`].
///
/// `nested_entity` is a handle into the arena that owns the entity this field
/// belongs to. It is only set when the referenced record definition could be
/// resolved, either locally by a transformer or later by the matcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub original_name:   String,
    pub normalized_name: String,
    pub type_name:       String,
    pub is_repeated:     bool,
    pub is_nested:       bool,
    pub nested_entity:   Option<EntityId>,
}

impl Field {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let original_name = name.into();
        Field {
            normalized_name: normalize(&original_name),
            original_name,
            type_name:       type_name.into(),
            is_repeated:     false,
            is_nested:       false,
            nested_entity:   None,
        }
    }

    pub fn repeated(mut self, is_repeated: bool) -> Self {
        self.is_repeated = is_repeated;
        self
    }

    pub fn nested(mut self, is_nested: bool) -> Self {
        self.is_nested = is_nested;
        self
    }

    /// Marks the field nested and points it at `entity`.
    pub fn linked_to(mut self, entity: EntityId) -> Self {
        self.is_nested = true;
        self.nested_entity = Some(entity);
        self
    }
}

/// A record definition (an IDL `message` or a header `struct`) after
/// transformation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub original_name:   String,
    pub normalized_name: String,
    pub fields:          Vec<Field>,
    pub source_file:     String,
}

impl Entity {
    pub fn new(name: impl Into<String>, fields: Vec<Field>, source_file: impl Into<String>) -> Self {
        let original_name = name.into();
        Entity {
            normalized_name: normalize(&original_name),
            original_name,
            fields,
            source_file: source_file.into(),
        }
    }

    pub fn field(&self, original_name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.original_name == original_name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.original_name.clone()).collect()
    }
}
