use std::path::Path;

use protoc_adapter_model::{EntityArena, EntityId};

use crate::error::AdapterError;
use crate::header::{parse_header, tokenize_header, transform_header};
use crate::idl::{parse_idl, tokenize_idl, transform_idl};

/// A schema language the pipeline can ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaLanguage {
    Idl,
    Header,
}

impl SchemaLanguage {
    /// Guesses the language from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<SchemaLanguage> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "proto" => Some(SchemaLanguage::Idl),
            "h" | "hpp" | "hh" | "hxx" => Some(SchemaLanguage::Header),
            _ => None,
        }
    }

    pub fn frontend(self) -> Box<dyn Frontend> {
        match self {
            SchemaLanguage::Idl => Box::new(IdlFrontend),
            SchemaLanguage::Header => Box::new(HeaderFrontend),
        }
    }
}

/// Text → entities for one schema language.
///
/// `load` appends the entities of one source file to `arena` and returns the
/// handles of the newly added entities, in declaration order.
pub trait Frontend {
    fn language(&self) -> SchemaLanguage;

    fn load(&self, text: &str, source_file: &str, arena: &mut EntityArena) -> Result<Vec<EntityId>, AdapterError>;
}

pub struct IdlFrontend;

impl Frontend for IdlFrontend {
    fn language(&self) -> SchemaLanguage {
        SchemaLanguage::Idl
    }

    fn load(&self, text: &str, source_file: &str, arena: &mut EntityArena) -> Result<Vec<EntityId>, AdapterError> {
        let tokens = tokenize_idl(text);
        let file = parse_idl(&tokens)?;
        Ok(transform_idl(&file, source_file, arena))
    }
}

pub struct HeaderFrontend;

impl Frontend for HeaderFrontend {
    fn language(&self) -> SchemaLanguage {
        SchemaLanguage::Header
    }

    fn load(&self, text: &str, source_file: &str, arena: &mut EntityArena) -> Result<Vec<EntityId>, AdapterError> {
        let tokens = tokenize_header(text);
        let header = parse_header(&tokens)?;
        Ok(transform_header(&header, source_file, arena))
    }
}
