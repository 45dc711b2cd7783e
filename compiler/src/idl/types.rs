use serde::Serialize;

/// `[repeated] Type name = number;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdlField {
    pub type_name:    String,
    pub field_name:   String,
    pub field_number: u64,
    pub is_repeated:  bool,
    pub line:         usize,
    pub column:       usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdlMessage {
    pub name:            String,
    pub line:            usize,
    pub column:          usize,
    pub fields:          Vec<IdlField>,
    pub nested_messages: Vec<IdlMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IdlFile {
    pub package:  Option<String>,
    pub messages: Vec<IdlMessage>,
}
