use std::collections::{HashMap, HashSet};

use protoc_adapter_model::{Entity, EntityArena, EntityId, Field};
use tracing::{debug, warn};

use crate::{
    header::types::{AnonymousStructField, FieldDecl, Header, Member, StructDef},
    utils::capitalize_first,
};

/// Flattens every struct into `arena`: each struct is followed by its named
/// nested structs and then the entities synthesized for its anonymous inline
/// structs. Returns the handles that were added.
pub fn transform_header(header: &Header, source_file: &str, arena: &mut EntityArena) -> Vec<EntityId> {
    let start = arena.len();
    let aliases = build_alias_map(header);

    for def in &header.structs {
        transform_struct(def, source_file, &aliases, arena);
    }

    debug!(source_file, entities = arena.len() - start, "transformed header structs");
    arena.ids().skip(start).collect()
}

/// `new name → existing name` for every typedef in the file. A struct
/// declared with both a tag and a typedef name maps the tag to the typedef
/// name, which is what the entity is called.
pub fn build_alias_map(header: &Header) -> HashMap<String, String> {
    let mut aliases: HashMap<String, String> = header
        .type_aliases
        .iter()
        .map(|a| (a.new_name.clone(), a.existing_type.clone()))
        .collect();

    for def in &header.structs {
        if let (Some(tag), Some(typedef_name)) = (&def.name, &def.typedef_name) {
            if tag != typedef_name {
                aliases.insert(tag.clone(), typedef_name.clone());
            }
        }
    }
    aliases
}

/// Follows the alias chain until a name with no alias. Stops on a cycle.
pub fn resolve_alias(name: &str, aliases: &HashMap<String, String>) -> String {
    let mut seen    = HashSet::new();
    let mut current = name;
    while let Some(next) = aliases.get(current) {
        if !seen.insert(current) {
            break;
        }
        current = next.as_str();
    }
    current.to_string()
}

fn transform_struct(
    node: &StructDef,
    source_file: &str,
    aliases: &HashMap<String, String>,
    arena: &mut EntityArena,
) -> Option<EntityId> {
    let Some(name) = node.effective_name() else {
        warn!(source_file, "dropping struct without a name");
        return None;
    };

    let id = arena.push(Entity::new(name, Vec::new(), source_file));
    let mut siblings: HashMap<String, EntityId> = HashMap::new();

    for nested in &node.nested_structs {
        if let Some(nested_id) = transform_struct(nested, source_file, aliases, arena) {
            siblings.insert(arena[nested_id].original_name.clone(), nested_id);
        }
    }

    let fields = transform_members(&node.members, source_file, aliases, arena, &mut siblings);
    arena[id].fields = link_siblings(fields, &siblings);
    Some(id)
}

fn transform_members(
    members: &[Member],
    source_file: &str,
    aliases: &HashMap<String, String>,
    arena: &mut EntityArena,
    siblings: &mut HashMap<String, EntityId>,
) -> Vec<Field> {
    members
        .iter()
        .map(|member| match member {
            Member::Field(decl) => transform_field_decl(decl, aliases),
            Member::AnonymousStruct(anon) => {
                let anon_id = transform_anonymous_struct(anon, source_file, aliases, arena);
                let synthetic = arena[anon_id].original_name.clone();
                siblings.insert(synthetic.clone(), anon_id);
                Field::new(&anon.field_name, synthetic)
                    .repeated(anon.is_array)
                    .linked_to(anon_id)
            }
        })
        .collect()
}

/// Synthesizes an entity named after the owning field, first letter
/// capitalized (`traderInfo` → `TraderInfo`).
fn transform_anonymous_struct(
    node: &AnonymousStructField,
    source_file: &str,
    aliases: &HashMap<String, String>,
    arena: &mut EntityArena,
) -> EntityId {
    let synthetic = capitalize_first(&node.field_name);
    let id = arena.push(Entity::new(synthetic, Vec::new(), source_file));
    let mut siblings: HashMap<String, EntityId> = HashMap::new();

    for nested in &node.nested_structs {
        if let Some(nested_id) = transform_struct(nested, source_file, aliases, arena) {
            siblings.insert(arena[nested_id].original_name.clone(), nested_id);
        }
    }

    let fields = transform_members(&node.members, source_file, aliases, arena, &mut siblings);
    arena[id].fields = link_siblings(fields, &siblings);
    id
}

fn link_siblings(fields: Vec<Field>, siblings: &HashMap<String, EntityId>) -> Vec<Field> {
    fields
        .into_iter()
        .map(|f| match (f.nested_entity, siblings.get(&f.type_name)) {
            (None, Some(&sibling)) => f.linked_to(sibling),
            _ => f,
        })
        .collect()
}

fn transform_field_decl(node: &FieldDecl, aliases: &HashMap<String, String>) -> Field {
    if node.is_char_array {
        // Fixed-length text: one string-shaped value unless it has more
        // than one dimension.
        return Field::new(&node.field_name, "char").repeated(node.is_array);
    }

    let type_name = resolve_alias(&node.type_name, aliases);
    Field::new(&node.field_name, type_name).repeated(node.is_vector || node.is_array)
}
