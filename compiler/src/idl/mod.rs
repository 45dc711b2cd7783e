//! `.proto`-style IDL frontend: tokenizer → parser → entity transform.

pub mod tokenizer;
pub mod types;
pub mod parser;
pub mod transform;

pub use parser::parse_idl;
pub use tokenizer::tokenize_idl;
pub use transform::{transform_idl, IDL_PRIMITIVES};
