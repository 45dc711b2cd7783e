//! Language-neutral model shared by both schema frontends and the matcher.
//!
//! ```
//! use protoc_adapter_model::*;
//!
//! let mut arena = EntityArena::new();
//! let id = arena.push(Entity::new("order_info", vec![
//!     Field::new("order_id", "int32"),
//! ], "order.proto"));
//!
//! assert_eq!(arena[id].normalized_name, "ORDERINFO");
//! assert_eq!(arena[id].fields[0].normalized_name, "ORDERID");
//! assert_eq!(arena.find_by_normalized("ORDERINFO"), Some(id));
//! ```

pub mod arena;
pub mod entity;
pub mod matching;

pub use arena::*;
pub use entity::*;
pub use matching::*;

/// Strips every underscore and upper-cases ASCII letters.
///
/// This is the only key used to pair names across the two schema languages,
/// so `order_id`, `orderId` and `ORDER_ID` all collapse to `ORDERID`.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
