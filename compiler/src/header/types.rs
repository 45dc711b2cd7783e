use serde::Serialize;

/// `typedef Existing NewName;` or `typedef struct A B;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeAlias {
    pub new_name:        String,
    pub existing_type:   String,
    pub is_struct_alias: bool,
}

/// A plain member declaration inside a struct body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDecl {
    pub type_name:     String,
    pub field_name:    String,
    /// `vector<T>` / `list<T>`; `type_name` holds the element type.
    pub is_vector:     bool,
    /// `char name[N]`, fixed-length text rather than a list of characters.
    pub is_char_array: bool,
    /// `T name[N]`, or a `char` array with more than one dimension.
    pub is_array:      bool,
    pub line:          usize,
    pub column:        usize,
}

/// `struct { ... } fieldName;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnonymousStructField {
    pub field_name:     String,
    pub is_array:       bool,
    pub members:        Vec<Member>,
    pub nested_structs: Vec<StructDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Member {
    Field(FieldDecl),
    AnonymousStruct(AnonymousStructField),
}

/// A struct definition. `name` is the tag (`struct Name { }`) and
/// `typedef_name` the name given after the closing brace of a typedef.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructDef {
    pub name:           Option<String>,
    pub typedef_name:   Option<String>,
    pub members:        Vec<Member>,
    pub nested_structs: Vec<StructDef>,
}

impl StructDef {
    /// The name the entity is known by: the typedef name when present,
    /// otherwise the tag.
    pub fn effective_name(&self) -> Option<&str> {
        self.typedef_name.as_deref().or(self.name.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Header {
    pub type_aliases: Vec<TypeAlias>,
    pub structs:      Vec<StructDef>,
}
