//! C/C++ header frontend: tokenizer → parser → entity transform.

pub mod tokenizer;
pub mod types;
pub mod parser;
pub mod transform;

pub use parser::parse_header;
pub use tokenizer::tokenize_header;
pub use transform::transform_header;
