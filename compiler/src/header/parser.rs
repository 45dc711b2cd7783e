use tracing::{trace, warn};

use crate::{
    error::AdapterError,
    header::{
        tokenizer::{Token, TokenKind},
        types::{AnonymousStructField, FieldDecl, Header, Member, StructDef, TypeAlias},
    },
    utils::quote,
};

const ACCESS_SPECIFIERS:    [&str; 3] = ["public", "private", "protected"];
const VECTOR_TYPES:         [&str; 2] = ["vector", "list"];
const NESTED_TYPE_KEYWORDS: [&str; 3] = ["enum", "union", "class"];
const NON_FIELD_SPECIFIERS: [&str; 4] = ["static", "using", "friend", "static_assert"];

/// Parses a token stream produced by [`tokenize_header`](super::tokenize_header).
///
/// Only `struct` and `typedef` declarations produce AST nodes; everything
/// else at the top level is stepped over token by token. Inside a struct
/// body, members that do not look like a field (methods, constructors,
/// nested typedefs, nested enums, unions and classes, static members,
/// using and friend declarations, access specifiers) are skipped.
pub fn parse_header(tokens: &[Token]) -> Result<Header, AdapterError> {
    if tokens.is_empty() {
        return Ok(Header::default());
    }
    HeaderParser { tokens, index: 0 }.parse_file()
}

enum TypedefItem {
    Alias(TypeAlias),
    Struct(StructDef),
}

struct HeaderParser<'a> {
    tokens: &'a [Token],
    index:  usize,
}

impl<'a> HeaderParser<'a> {
    fn parse_file(mut self) -> Result<Header, AdapterError> {
        let mut header = Header::default();

        while !self.at_end() {
            match self.peek().kind {
                TokenKind::Typedef => match self.parse_typedef()? {
                    Some(TypedefItem::Alias(alias))   => header.type_aliases.push(alias),
                    Some(TypedefItem::Struct(def))    => header.structs.push(def),
                    None => {}
                },
                TokenKind::Struct => {
                    if let Some(def) = self.parse_top_level_struct()? {
                        header.structs.push(def);
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }

        Ok(header)
    }

    // -- typedef --

    /// 1. `typedef struct Name { ... } [Alias];`
    /// 2. `typedef struct { ... } Name;`
    /// 3. `typedef struct A B;`
    /// 4. `typedef Type Name;`
    fn parse_typedef(&mut self) -> Result<Option<TypedefItem>, AdapterError> {
        self.expect(TokenKind::Typedef)?;

        if self.peek().kind != TokenKind::Struct {
            return self.parse_plain_typedef();
        }
        self.advance();

        match self.peek().kind {
            TokenKind::LeftBrace => {
                let (members, nested_structs) = self.parse_braced_body()?;
                let typedef_name = self.expect(TokenKind::Identifier)?.text.clone();
                self.expect(TokenKind::Semicolon)?;
                Ok(Some(TypedefItem::Struct(StructDef {
                    name:         None,
                    typedef_name: Some(typedef_name),
                    members,
                    nested_structs,
                })))
            }
            TokenKind::Identifier => {
                let name = self.advance().text.clone();
                self.skip_base_clause();

                match self.peek().kind {
                    TokenKind::LeftBrace => {
                        let (members, nested_structs) = self.parse_braced_body()?;
                        let typedef_name = if self.peek().kind == TokenKind::Identifier {
                            Some(self.advance().text.clone())
                        } else {
                            None
                        };
                        self.expect(TokenKind::Semicolon)?;
                        Ok(Some(TypedefItem::Struct(StructDef {
                            name: Some(name),
                            typedef_name,
                            members,
                            nested_structs,
                        })))
                    }
                    TokenKind::Identifier => {
                        let new_name = self.advance().text.clone();
                        self.expect(TokenKind::Semicolon)?;
                        Ok(Some(TypedefItem::Alias(TypeAlias {
                            new_name,
                            existing_type:   name,
                            is_struct_alias: true,
                        })))
                    }
                    _ => {
                        self.skip_to_semicolon();
                        Ok(None)
                    }
                }
            }
            _ => {
                self.skip_to_semicolon();
                Ok(None)
            }
        }
    }

    /// `typedef [ns::]Type [words...] Name;`. Multi-word types such as
    /// `unsigned int` are kept as written; anything with other punctuation
    /// (function pointers, templates, enums) is skipped.
    fn parse_plain_typedef(&mut self) -> Result<Option<TypedefItem>, AdapterError> {
        let mut words: Vec<String> = Vec::new();

        while !self.at_end() && self.peek().kind != TokenKind::Semicolon {
            match self.peek().kind {
                TokenKind::Identifier | TokenKind::Char => words.push(self.advance().text.clone()),
                TokenKind::ColonColon => {
                    self.advance();
                    words.pop();
                }
                _ => {
                    trace!(line = self.peek().line, "skipping unsupported typedef");
                    self.skip_to_semicolon();
                    return Ok(None);
                }
            }
        }
        self.expect(TokenKind::Semicolon)?;

        let Some(new_name) = words.pop() else {
            return Ok(None);
        };
        if words.is_empty() {
            return Ok(None);
        }

        Ok(Some(TypedefItem::Alias(TypeAlias {
            new_name,
            existing_type:   words.join(" "),
            is_struct_alias: false,
        })))
    }

    // -- struct --

    fn parse_top_level_struct(&mut self) -> Result<Option<StructDef>, AdapterError> {
        self.expect(TokenKind::Struct)?;

        match self.peek().kind {
            TokenKind::Identifier => {}
            TokenKind::LeftBrace => {
                warn!(line = self.peek().line, "dropping anonymous struct without a typedef name");
                self.skip_braces();
                self.skip_to_semicolon();
                return Ok(None);
            }
            _ => return Ok(None),
        }

        let name = self.advance().text.clone();
        self.skip_base_clause();

        if self.peek().kind != TokenKind::LeftBrace {
            // Forward declaration or `struct Foo var;`
            self.skip_to_semicolon();
            return Ok(None);
        }

        let (members, nested_structs) = self.parse_braced_body()?;
        // `struct Foo { ... } a, b;` declares variables as well.
        self.parse_instance_declarators()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Some(StructDef {
            name: Some(name),
            typedef_name: None,
            members,
            nested_structs,
        }))
    }

    /// `{ body }`, both braces included.
    fn parse_braced_body(&mut self) -> Result<(Vec<Member>, Vec<StructDef>), AdapterError> {
        self.expect(TokenKind::LeftBrace)?;
        let body = self.parse_struct_body()?;
        self.expect(TokenKind::RightBrace)?;
        Ok(body)
    }

    fn parse_struct_body(&mut self) -> Result<(Vec<Member>, Vec<StructDef>), AdapterError> {
        let mut members        = Vec::new();
        let mut nested_structs = Vec::new();

        while !self.at_end() && self.peek().kind != TokenKind::RightBrace {
            let tok = self.peek();
            match tok.kind {
                TokenKind::Struct => match (self.peek_at(1).kind, self.peek_at(2).kind) {
                    (TokenKind::LeftBrace, _) => {
                        let fields = self.parse_anonymous_struct_fields()?;
                        members.extend(fields.into_iter().map(Member::AnonymousStruct));
                    }
                    (TokenKind::Identifier, TokenKind::LeftBrace | TokenKind::Colon) => {
                        let (def, instances) = self.parse_named_nested_struct()?;
                        nested_structs.push(def);
                        members.extend(instances.into_iter().map(Member::Field));
                    }
                    (TokenKind::Identifier, TokenKind::Semicolon) => {
                        // Forward declaration.
                        self.skip_to_semicolon();
                    }
                    _ => {
                        // Elaborated type (`struct Foo foo;`): drop the keyword
                        // and read the rest as a plain field.
                        self.advance();
                    }
                },
                TokenKind::Typedef => self.skip_to_semicolon(),
                TokenKind::Identifier if NON_FIELD_SPECIFIERS.contains(&tok.text.as_str()) => {
                    trace!(line = tok.line, specifier = %tok.text, "skipping non-field member");
                    self.skip_declaration();
                }
                TokenKind::Identifier
                    if NESTED_TYPE_KEYWORDS.contains(&tok.text.as_str()) && self.is_nested_type_declaration() =>
                {
                    trace!(line = tok.line, keyword = %tok.text, "skipping nested type declaration");
                    self.skip_declaration();
                }
                TokenKind::Identifier
                    if ACCESS_SPECIFIERS.contains(&tok.text.as_str())
                        && self.peek_at(1).kind == TokenKind::Colon =>
                {
                    self.advance();
                    self.advance();
                }
                TokenKind::LeftBrace => self.skip_braces(),
                TokenKind::LeftParen => self.skip_parens(),
                _ => match self.try_parse_field_decl()? {
                    Some(decls) => members.extend(decls.into_iter().map(Member::Field)),
                    None => {
                        self.advance();
                    }
                },
            }
        }

        Ok((members, nested_structs))
    }

    // struct { ... } fieldName[N], other;
    fn parse_anonymous_struct_fields(&mut self) -> Result<Vec<AnonymousStructField>, AdapterError> {
        self.expect(TokenKind::Struct)?;
        let (members, nested_structs) = self.parse_braced_body()?;
        let declarators = self.parse_instance_declarators()?;
        if declarators.is_empty() {
            self.expect(TokenKind::Identifier)?;
        }
        self.expect(TokenKind::Semicolon)?;

        Ok(declarators
            .into_iter()
            .map(|(name_tok, dims)| AnonymousStructField {
                field_name:     name_tok.text.clone(),
                is_array:       dims > 0,
                members:        members.clone(),
                nested_structs: nested_structs.clone(),
            })
            .collect())
    }

    // struct Name [: Base] { ... } [instance, ...];
    fn parse_named_nested_struct(&mut self) -> Result<(StructDef, Vec<FieldDecl>), AdapterError> {
        self.expect(TokenKind::Struct)?;
        let name = self.expect(TokenKind::Identifier)?.text.clone();
        self.skip_base_clause();
        let (members, nested_structs) = self.parse_braced_body()?;

        let instances = self
            .parse_instance_declarators()?
            .into_iter()
            .map(|(name_tok, dims)| FieldDecl {
                type_name:     name.clone(),
                field_name:    name_tok.text.clone(),
                is_vector:     false,
                is_char_array: false,
                is_array:      dims > 0,
                line:          name_tok.line,
                column:        name_tok.column,
            })
            .collect();
        self.expect(TokenKind::Semicolon)?;

        let def = StructDef {
            name: Some(name),
            typedef_name: None,
            members,
            nested_structs,
        };
        Ok((def, instances))
    }

    /// `name[dims], name ...` after a closing brace, up to the `;`.
    fn parse_instance_declarators(&mut self) -> Result<Vec<(&'a Token, usize)>, AdapterError> {
        let mut declarators = Vec::new();
        while self.peek().kind == TokenKind::Identifier {
            let name_tok = self.advance();
            declarators.push((name_tok, self.parse_array_dims()?));
            if self.peek().kind != TokenKind::Comma {
                break;
            }
            self.advance();
        }
        Ok(declarators)
    }

    /// `enum|union|class [class|struct] [Tag] [: Base] { ... }` or a
    /// `... Tag;` forward declaration. `enum Side side;` is a field.
    fn is_nested_type_declaration(&self) -> bool {
        let mut offset = 1;
        if self.peek_at(offset).kind == TokenKind::Struct || self.peek_at(offset).text == "class" {
            offset += 1;
        }
        match self.peek_at(offset).kind {
            TokenKind::LeftBrace => true,
            TokenKind::Identifier => matches!(
                self.peek_at(offset + 1).kind,
                TokenKind::LeftBrace | TokenKind::Semicolon | TokenKind::Colon
            ),
            _ => false,
        }
    }

    // -- fields --

    /// Tries to read one field declaration, one `FieldDecl` per declarator
    /// (`int x, y;`). On anything that is not a field the position is
    /// restored and `None` returned; once the declaration is unambiguous (an
    /// array or template was opened) malformed input is an error.
    fn try_parse_field_decl(&mut self) -> Result<Option<Vec<FieldDecl>>, AdapterError> {
        let saved = self.index;

        let (type_name, is_vector, is_char) = if self.peek().kind == TokenKind::Char {
            self.advance();
            ("char".to_string(), false, true)
        } else {
            match self.try_parse_type_spec()? {
                Some((type_name, is_vector)) => (type_name, is_vector, false),
                None => {
                    self.index = saved;
                    return Ok(None);
                }
            }
        };

        let mut decls = Vec::new();
        loop {
            if self.peek().kind != TokenKind::Identifier {
                self.index = saved;
                return Ok(None);
            }
            let name_tok = self.advance();
            let dims = self.parse_array_dims()?;

            decls.push(FieldDecl {
                type_name:     type_name.clone(),
                field_name:    name_tok.text.clone(),
                is_vector,
                is_char_array: is_char && dims > 0,
                is_array:      if is_char { dims > 1 } else { dims > 0 },
                line:          name_tok.line,
                column:        name_tok.column,
            });

            match self.finish_declarator() {
                Some(TokenKind::Comma) => {}
                Some(_) => return Ok(Some(decls)),
                None if is_vector || dims > 0 => {
                    self.expect(TokenKind::Semicolon)?;
                    return Ok(Some(decls));
                }
                None => {
                    self.index = saved;
                    return Ok(None);
                }
            }
        }
    }

    /// Returns `(type_name, is_vector)`; for `vector<T>`/`list<T>` the name is
    /// the element type. Namespace qualifiers are stripped.
    fn try_parse_type_spec(&mut self) -> Result<Option<(String, bool)>, AdapterError> {
        if self.peek().kind != TokenKind::Identifier {
            return Ok(None);
        }
        self.skip_qualifiers();
        if self.peek().kind != TokenKind::Identifier {
            return Ok(None);
        }

        let type_name = self.advance().text.clone();

        if VECTOR_TYPES.contains(&type_name.as_str()) && self.peek().kind == TokenKind::LeftAngle {
            self.advance();
            self.skip_qualifiers();
            let inner = if self.peek().kind == TokenKind::Char {
                self.advance().text.clone()
            } else {
                self.expect(TokenKind::Identifier)?.text.clone()
            };
            self.expect(TokenKind::RightAngle)?;
            return Ok(Some((inner, true)));
        }

        Ok(Some((type_name, false)))
    }

    /// Number of `[...]` suffixes consumed. The size may be any token run
    /// (`N`, `MAX_LEN`, `N + 1`).
    fn parse_array_dims(&mut self) -> Result<usize, AdapterError> {
        let mut dims = 0;
        while self.peek().kind == TokenKind::LeftBracket {
            self.advance();
            while !self.at_end()
                && !matches!(
                    self.peek().kind,
                    TokenKind::RightBracket | TokenKind::Semicolon | TokenKind::LeftBrace | TokenKind::RightBrace
                )
            {
                self.advance();
            }
            self.expect(TokenKind::RightBracket)?;
            dims += 1;
        }
        Ok(dims)
    }

    /// Consumes an optional bit width and initializer, then the `,` or `;`
    /// ending the declarator, which is returned. `None` when neither follows.
    fn finish_declarator(&mut self) -> Option<TokenKind> {
        if self.peek().kind == TokenKind::Colon
            && matches!(self.peek_at(1).kind, TokenKind::Number | TokenKind::Identifier)
        {
            self.advance();
            self.advance();
        }

        match self.peek().kind {
            TokenKind::Equals => {
                self.advance();
                while !self.at_end()
                    && !matches!(
                        self.peek().kind,
                        TokenKind::Semicolon | TokenKind::Comma | TokenKind::RightBrace
                    )
                {
                    match self.peek().kind {
                        TokenKind::LeftBrace => self.skip_braces(),
                        TokenKind::LeftParen => self.skip_parens(),
                        _ => {
                            self.advance();
                        }
                    }
                }
            }
            TokenKind::LeftBrace => self.skip_braces(),
            _ => {}
        }

        match self.peek().kind {
            kind @ (TokenKind::Semicolon | TokenKind::Comma) => {
                self.advance();
                Some(kind)
            }
            _ => None,
        }
    }

    // -- skip / recovery helpers --

    fn skip_qualifiers(&mut self) {
        while self.peek().kind == TokenKind::Identifier && self.peek_at(1).kind == TokenKind::ColonColon {
            self.advance();
            self.advance();
        }
    }

    // `: public Base` up to the opening brace.
    fn skip_base_clause(&mut self) {
        if self.peek().kind != TokenKind::Colon {
            return;
        }
        while !self.at_end() && !matches!(self.peek().kind, TokenKind::LeftBrace | TokenKind::Semicolon) {
            self.advance();
        }
    }

    /// Skips through the next `;`, stepping over balanced braces. Stops
    /// without consuming at a `}` that closes an enclosing block.
    fn skip_to_semicolon(&mut self) {
        while !self.at_end() {
            match self.peek().kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::LeftBrace  => self.skip_braces(),
                TokenKind::RightBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skips one member declaration through its `;`, or through a body
    /// (`enum E { ... }`, `static int f() { ... }`). A brace block after `=`
    /// is an initializer and does not end the declaration.
    fn skip_declaration(&mut self) {
        while !self.at_end() {
            match self.peek().kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RightBrace => return,
                TokenKind::LeftParen  => self.skip_parens(),
                TokenKind::LeftBrace  => {
                    let initializer = self.index > 0 && self.tokens[self.index - 1].kind == TokenKind::Equals;
                    self.skip_braces();
                    if self.peek().kind == TokenKind::Semicolon {
                        self.advance();
                        return;
                    }
                    if !initializer {
                        return;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn skip_braces(&mut self) {
        self.skip_balanced(TokenKind::LeftBrace, TokenKind::RightBrace);
    }

    fn skip_parens(&mut self) {
        self.skip_balanced(TokenKind::LeftParen, TokenKind::RightParen);
    }

    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) {
        if self.peek().kind != open {
            return;
        }
        self.advance();
        let mut depth = 1;
        while !self.at_end() && depth > 0 {
            let kind = self.advance().kind;
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
            }
        }
    }

    // -- token helpers --

    fn peek(&self) -> &'a Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &'a Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.index + offset).min(last)]
    }

    fn advance(&mut self) -> &'a Token {
        let tok = self.peek();
        if tok.kind != TokenKind::Eof && self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        tok
    }

    fn expect(&mut self, expected: TokenKind) -> Result<&'a Token, AdapterError> {
        let tok = self.peek();
        if tok.kind != expected {
            return Err(AdapterError::ParseError {
                expected: expected.describe().to_string(),
                found:    quote(&tok.text),
                line:     tok.line,
                column:   tok.column,
            });
        }
        Ok(self.advance())
    }

    fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }
}
