use std::collections::HashMap;

use protoc_adapter_model::{Entity, EntityArena, EntityId, Field};
use tracing::debug;

use crate::idl::types::{IdlFile, IdlMessage};

/// Scalar types. Any other field type names a message.
pub const IDL_PRIMITIVES: [&str; 15] = [
    "int32", "sint32", "sfixed32", "uint32", "fixed32",
    "int64", "sint64", "sfixed64", "uint64", "fixed64",
    "float", "double", "bool", "string", "bytes",
];

pub fn is_primitive(type_name: &str) -> bool {
    IDL_PRIMITIVES.contains(&type_name)
}

/// Flattens every message into `arena`, each parent immediately followed by
/// its nested messages (depth-first). Returns the handles that were added.
pub fn transform_idl(file: &IdlFile, source_file: &str, arena: &mut EntityArena) -> Vec<EntityId> {
    let start = arena.len();
    for message in &file.messages {
        transform_message(message, source_file, arena);
    }
    debug!(source_file, entities = arena.len() - start, "transformed IDL messages");
    arena.ids().skip(start).collect()
}

fn transform_message(node: &IdlMessage, source_file: &str, arena: &mut EntityArena) -> EntityId {
    let id = arena.push(Entity::new(&node.name, Vec::new(), source_file));

    // Direct children only; deeper descendants are linked by their own parent.
    let mut children: HashMap<&str, EntityId> = HashMap::new();
    for nested in &node.nested_messages {
        let nested_id = transform_message(nested, source_file, arena);
        children.insert(nested.name.as_str(), nested_id);
    }

    let fields = node
        .fields
        .iter()
        .map(|f| {
            let mut field = Field::new(&f.field_name, &f.type_name)
                .repeated(f.is_repeated)
                .nested(!is_primitive(&f.type_name));
            field.nested_entity = local_child(&f.type_name, &node.name, &children);
            field
        })
        .collect();

    arena[id].fields = fields;
    id
}

/// `Item` or `Parent.Item` names a direct child; any other qualifier points
/// outside this message.
fn local_child(type_name: &str, parent: &str, children: &HashMap<&str, EntityId>) -> Option<EntityId> {
    let leaf = match type_name.rsplit_once('.') {
        Some((qualifier, leaf)) if qualifier == parent => leaf,
        Some(_) => return None,
        None => type_name,
    };
    children.get(leaf).copied()
}
