use std::collections::HashMap;

use protoc_adapter_model::{normalize, Entity, EntityArena, EntityId, EntityMatch, Field, FieldMapping};
use tracing::debug;

use crate::error::AdapterError;

/// One resolved IDL-field → struct-field pairing, applied after every entity
/// has been paired successfully.
struct Pairing {
    idl_field:    usize,
    struct_field: usize,
    nested:       Option<EntityId>,
    repeated:     bool,
}

struct PendingMatch {
    idl_entity:    EntityId,
    struct_entity: EntityId,
    pairings:      Vec<Pairing>,
}

/// Pairs every IDL entity, in arena order, with the header entity of the
/// same normalized name. See [`match_selected`].
pub fn match_entities(idl: &EntityArena, structs: &mut EntityArena) -> Result<Vec<EntityMatch>, AdapterError> {
    let ids: Vec<EntityId> = idl.ids().collect();
    match_selected(idl, &ids, structs)
}

/// Pairs the given IDL entities, in the given order, with header entities.
///
/// An IDL entity with no header counterpart is skipped. An IDL field with no
/// header counterpart fails the whole pass, and in that case `structs` is
/// left untouched. On success the paired struct fields are widened in place:
/// nested IDL fields link their struct field to the matching header entity,
/// and repeated IDL fields force the struct field repeated.
pub fn match_selected(
    idl: &EntityArena,
    idl_ids: &[EntityId],
    structs: &mut EntityArena,
) -> Result<Vec<EntityMatch>, AdapterError> {
    let struct_index = index_by_normalized(structs);

    // 1) Resolve every pairing; nothing is mutated until all succeed.
    let mut pending = Vec::new();
    for &idl_id in idl_ids {
        let idl_entity = &idl[idl_id];
        let Some(&struct_id) = struct_index.get(&idl_entity.normalized_name) else {
            debug!(entity = %idl_entity.original_name, "no struct counterpart, skipping");
            continue;
        };

        let pairings = pair_fields(idl, idl_entity, &structs[struct_id], &struct_index)?;
        pending.push(PendingMatch {
            idl_entity:    idl_id,
            struct_entity: struct_id,
            pairings,
        });
    }

    // 2) Widen the struct side.
    for p in &pending {
        for pairing in &p.pairings {
            let field = &mut structs[p.struct_entity].fields[pairing.struct_field];
            if let Some(nested) = pairing.nested {
                field.is_nested = true;
                field.nested_entity = Some(nested);
            }
            if pairing.repeated {
                field.is_repeated = true;
            }
        }
    }

    // 3) Snapshot the widened fields into mappings.
    let matches: Vec<EntityMatch> = pending
        .iter()
        .map(|p| EntityMatch {
            idl_entity:     p.idl_entity,
            struct_entity:  p.struct_entity,
            field_mappings: p
                .pairings
                .iter()
                .map(|pairing| {
                    FieldMapping::new(
                        idl[p.idl_entity].fields[pairing.idl_field].clone(),
                        structs[p.struct_entity].fields[pairing.struct_field].clone(),
                    )
                })
                .collect(),
        })
        .collect();

    debug!(matches = matches.len(), "matched entities");
    Ok(matches)
}

/// Normalized name → entity. A later duplicate replaces an earlier one.
pub fn index_by_normalized(arena: &EntityArena) -> HashMap<String, EntityId> {
    arena
        .iter()
        .map(|(id, e)| (e.normalized_name.clone(), id))
        .collect()
}

fn pair_fields(
    idl: &EntityArena,
    idl_entity: &Entity,
    struct_entity: &Entity,
    struct_index: &HashMap<String, EntityId>,
) -> Result<Vec<Pairing>, AdapterError> {
    let by_name: HashMap<&str, usize> = struct_entity
        .fields
        .iter()
        .enumerate()
        .map(|(i, f)| (f.normalized_name.as_str(), i))
        .collect();

    idl_entity
        .fields
        .iter()
        .enumerate()
        .map(|(idl_field, field)| {
            let &struct_field = by_name.get(field.normalized_name.as_str()).ok_or_else(|| {
                AdapterError::UnmatchedField {
                    field:         field.original_name.clone(),
                    normalized:    field.normalized_name.clone(),
                    idl_entity:    idl_entity.original_name.clone(),
                    struct_entity: struct_entity.original_name.clone(),
                    available:     struct_entity.field_names(),
                }
            })?;

            Ok(Pairing {
                idl_field,
                struct_field,
                nested:   resolve_nested(idl, field, struct_index),
                repeated: field.is_repeated,
            })
        })
        .collect()
}

/// The header entity a nested IDL field refers to: through its linked IDL
/// definition when there is one, otherwise through its declared type name.
fn resolve_nested(
    idl: &EntityArena,
    field: &Field,
    struct_index: &HashMap<String, EntityId>,
) -> Option<EntityId> {
    if !field.is_nested {
        return None;
    }
    let key = match field.nested_entity.and_then(|id| idl.get(id)) {
        Some(definition) => definition.normalized_name.clone(),
        None => normalize(type_leaf(&field.type_name)),
    };
    struct_index.get(&key).copied()
}

// `pkg.Outer.Inner` → `Inner`
fn type_leaf(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str, fields: Vec<Field>) -> Entity {
        Entity::new(name, fields, "test")
    }

    #[test]
    fn test_simple_match_pairs_by_normalized_name() {
        let mut idl = EntityArena::new();
        idl.push(entity("order_info", vec![Field::new("order_id", "int32"), Field::new("customer_name", "string")]));
        let mut structs = EntityArena::new();
        let target = structs.push(entity("OrderInfo", vec![
            Field::new("customerName", "char"),
            Field::new("orderId", "int"),
            Field::new("unused", "int"),
        ]));

        let matches = match_entities(&idl, &mut structs).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].struct_entity, target);
        let pairs: Vec<_> = matches[0]
            .field_mappings
            .iter()
            .map(|m| (m.idl_field.original_name.as_str(), m.struct_field.original_name.as_str()))
            .collect();
        assert_eq!(pairs, vec![("order_id", "orderId"), ("customer_name", "customerName")]);
        assert!(matches[0].field_mappings.iter().all(|m| !m.is_reply_header_mapping));
    }

    #[test]
    fn test_unmatched_entity_is_skipped() {
        let mut idl = EntityArena::new();
        idl.push(entity("Envelope", vec![Field::new("x", "int32")]));
        idl.push(entity("Account", vec![Field::new("id", "int32")]));
        let mut structs = EntityArena::new();
        structs.push(entity("Account", vec![Field::new("id", "int")]));

        let matches = match_entities(&idl, &mut structs).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(idl[matches[0].idl_entity].original_name, "Account");
    }

    #[test]
    fn test_unmatched_field_fails_and_leaves_structs_untouched() {
        let mut idl = EntityArena::new();
        idl.push(entity("A", vec![Field::new("tags", "string").repeated(true)]));
        idl.push(entity("B", vec![Field::new("missing_one", "int32")]));
        let mut structs = EntityArena::new();
        structs.push(entity("A", vec![Field::new("tags", "char")]));
        structs.push(entity("B", vec![Field::new("present", "int")]));
        let before = structs.clone();

        let err = match_entities(&idl, &mut structs).unwrap_err();
        match err {
            AdapterError::UnmatchedField { field, normalized, idl_entity, struct_entity, available } => {
                assert_eq!(field, "missing_one");
                assert_eq!(normalized, "MISSINGONE");
                assert_eq!(idl_entity, "B");
                assert_eq!(struct_entity, "B");
                assert_eq!(available, vec!["present".to_string()]);
            }
            other => panic!("expected UnmatchedField but got {:?}", other),
        }
        assert_eq!(structs, before);
    }

    #[test]
    fn test_repeated_and_nested_are_widened() {
        let mut idl = EntityArena::new();
        let order = idl.push(entity("Order", vec![]));
        let item  = idl.push(entity("Item", vec![Field::new("item_id", "int32")]));
        idl[order].fields = vec![
            Field::new("items", "Item").repeated(true).linked_to(item),
            Field::new("tags", "string").repeated(true),
            Field::new("fee", "pkg.Fee").nested(true),
        ];

        let mut structs = EntityArena::new();
        let s_item  = structs.push(entity("ITEM", vec![Field::new("itemId", "int")]));
        let s_fee   = structs.push(entity("Fee", vec![]));
        let s_order = structs.push(entity("Order", vec![
            Field::new("items", "Item"),
            Field::new("tags", "string"),
            Field::new("fee", "Fee"),
        ]));

        let matches = match_entities(&idl, &mut structs).unwrap();
        assert_eq!(matches.len(), 2);

        let widened = &structs[s_order].fields;
        assert!(widened[0].is_repeated && widened[0].is_nested);
        assert_eq!(widened[0].nested_entity, Some(s_item));
        assert!(widened[1].is_repeated && !widened[1].is_nested);
        assert_eq!(widened[2].nested_entity, Some(s_fee));

        // The mapping snapshot carries the widened struct field.
        let order_match = matches.iter().find(|m| m.idl_entity == order).unwrap();
        assert_eq!(order_match.field_mappings[0].struct_field.nested_entity, Some(s_item));
        assert!(order_match.field_mappings[0].struct_field.is_repeated);
    }

    #[test]
    fn test_nested_without_struct_definition_stays_plain() {
        let mut idl = EntityArena::new();
        idl.push(entity("Order", vec![Field::new("audit", "Audit").nested(true)]));
        let mut structs = EntityArena::new();
        let s_order = structs.push(entity("Order", vec![Field::new("audit", "long")]));

        match_entities(&idl, &mut structs).unwrap();
        assert!(!structs[s_order].fields[0].is_nested);
        assert_eq!(structs[s_order].fields[0].nested_entity, None);
    }

    #[test]
    fn test_duplicate_struct_names_last_wins() {
        let mut idl = EntityArena::new();
        idl.push(entity("Dup", vec![Field::new("b", "int32")]));
        let mut structs = EntityArena::new();
        structs.push(entity("Dup", vec![Field::new("a", "int")]));
        let second = structs.push(entity("D_U_P", vec![Field::new("b", "int")]));

        let matches = match_entities(&idl, &mut structs).unwrap();
        assert_eq!(matches[0].struct_entity, second);
    }

    #[test]
    fn test_field_count_invariant() {
        let mut idl = EntityArena::new();
        idl.push(entity("P", vec![Field::new("a", "int32"), Field::new("b", "int32")]));
        let mut structs = EntityArena::new();
        structs.push(entity("P", vec![Field::new("A", "int"), Field::new("B", "int"), Field::new("c", "int")]));

        let matches = match_entities(&idl, &mut structs).unwrap();
        assert_eq!(matches[0].field_mappings.len(), idl[matches[0].idl_entity].fields.len());
    }

    #[test]
    fn test_selected_order_is_respected() {
        let mut idl = EntityArena::new();
        let a = idl.push(entity("A", vec![]));
        let b = idl.push(entity("B", vec![]));
        let mut structs = EntityArena::new();
        structs.push(entity("A", vec![]));
        structs.push(entity("B", vec![]));

        let matches = match_selected(&idl, &[b, a], &mut structs).unwrap();
        let order: Vec<_> = matches.iter().map(|m| m.idl_entity).collect();
        assert_eq!(order, vec![b, a]);

        let only_a = match_selected(&idl, &[a], &mut structs).unwrap();
        assert_eq!(only_a.len(), 1);
    }
}
