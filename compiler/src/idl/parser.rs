use tracing::trace;

use crate::{
    error::AdapterError,
    idl::{
        tokenizer::{Token, TokenKind},
        types::{IdlField, IdlFile, IdlMessage},
    },
    utils::{error, quote},
};

/// Parses a token stream produced by [`tokenize_idl`](super::tokenize_idl).
///
/// Constructs the grammar does not model (`enum`, `oneof`, `service`,
/// `extend`, `map<..>` fields, `option`, `import`, ...) are skipped as a
/// statement or as a balanced block. A malformed field or message header
/// aborts the whole file.
pub fn parse_idl(tokens: &[Token]) -> Result<IdlFile, AdapterError> {
    if tokens.is_empty() {
        return Ok(IdlFile::default());
    }
    IdlParser { tokens, index: 0 }.parse_file()
}

struct IdlParser<'a> {
    tokens: &'a [Token],
    index:  usize,
}

impl<'a> IdlParser<'a> {
    fn parse_file(mut self) -> Result<IdlFile, AdapterError> {
        let mut file = IdlFile::default();

        while !self.at_end() {
            match self.peek().kind {
                TokenKind::Message => file.messages.push(self.parse_message()?),
                TokenKind::Package => {
                    self.advance();
                    if self.peek().kind == TokenKind::Identifier {
                        file.package = Some(self.parse_type_name()?);
                    }
                    self.skip_statement();
                }
                TokenKind::Syntax
                | TokenKind::Option
                | TokenKind::Import
                | TokenKind::Reserved => self.skip_statement(),
                TokenKind::Enum
                | TokenKind::Oneof
                | TokenKind::Service
                | TokenKind::Extend => self.skip_block(),
                _ => {
                    self.advance();
                }
            }
        }

        Ok(file)
    }

    // message Name { body }
    fn parse_message(&mut self) -> Result<IdlMessage, AdapterError> {
        self.expect(TokenKind::Message)?;
        let name_tok = self.expect_name()?;
        self.expect(TokenKind::LeftBrace)?;

        let mut fields          = Vec::new();
        let mut nested_messages = Vec::new();

        while !self.at_end() && self.peek().kind != TokenKind::RightBrace {
            match self.peek().kind {
                TokenKind::Message  => nested_messages.push(self.parse_message()?),
                TokenKind::Repeated => {
                    self.advance();
                    fields.push(self.parse_field(true)?);
                }
                TokenKind::Optional | TokenKind::Required => {
                    self.advance();
                    fields.push(self.parse_field(false)?);
                }
                TokenKind::Identifier => {
                    if self.peek().text == "map" && self.peek_at(1).kind == TokenKind::LeftAngle {
                        trace!(line = self.peek().line, "skipping map field");
                        self.skip_statement();
                    } else {
                        fields.push(self.parse_field(false)?);
                    }
                }
                TokenKind::Option | TokenKind::Reserved => self.skip_statement(),
                TokenKind::Enum
                | TokenKind::Oneof
                | TokenKind::Service
                | TokenKind::Extend => self.skip_block(),
                _ => {
                    self.advance();
                }
            }
        }

        self.expect(TokenKind::RightBrace)?;

        Ok(IdlMessage {
            name:   name_tok.text.clone(),
            line:   name_tok.line,
            column: name_tok.column,
            fields,
            nested_messages,
        })
    }

    // Type name = number [options];  (label already consumed)
    fn parse_field(&mut self, is_repeated: bool) -> Result<IdlField, AdapterError> {
        let type_name = self.parse_type_name()?;
        let name_tok  = self.expect_name()?;
        self.expect(TokenKind::Equals)?;
        let num_tok   = self.expect(TokenKind::Number)?;
        let field_number = num_tok.text.parse::<u64>().map_err(|_| {
            error("field number", &num_tok.text, num_tok.line, num_tok.column)
        })?;

        if self.peek().kind == TokenKind::LeftBracket {
            self.skip_field_options()?;
        }
        self.expect(TokenKind::Semicolon)?;

        Ok(IdlField {
            type_name,
            field_name: name_tok.text.clone(),
            field_number,
            is_repeated,
            line:       name_tok.line,
            column:     name_tok.column,
        })
    }

    /// `Name`, `pkg.Name` or `.pkg.Name`; a leading dot is dropped.
    fn parse_type_name(&mut self) -> Result<String, AdapterError> {
        if self.peek().kind == TokenKind::Dot {
            self.advance();
        }
        let mut name = self.expect(TokenKind::Identifier)?.text.clone();
        while self.peek().kind == TokenKind::Dot {
            self.advance();
            name.push('.');
            name.push_str(&self.expect_name()?.text);
        }
        Ok(name)
    }

    // [default = 1, deprecated = true]
    fn skip_field_options(&mut self) -> Result<(), AdapterError> {
        self.expect(TokenKind::LeftBracket)?;
        while !self.at_end()
            && !matches!(self.peek().kind, TokenKind::RightBracket | TokenKind::Semicolon)
        {
            self.advance();
        }
        self.expect(TokenKind::RightBracket)?;
        Ok(())
    }

    /// Skips up to and including the next `;`.
    fn skip_statement(&mut self) {
        while !self.at_end() {
            if self.advance().kind == TokenKind::Semicolon {
                return;
            }
        }
    }

    /// Skips a keyword, whatever precedes its `{`, and the balanced block.
    fn skip_block(&mut self) {
        let keyword = self.advance();
        trace!(line = keyword.line, keyword = %keyword.text, "skipping block");

        while !self.at_end() && self.peek().kind != TokenKind::LeftBrace {
            self.advance();
        }
        if self.at_end() {
            return;
        }
        self.advance();

        let mut depth = 1;
        while !self.at_end() && depth > 0 {
            match self.advance().kind {
                TokenKind::LeftBrace  => depth += 1,
                TokenKind::RightBrace => depth -= 1,
                _ => {}
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

    /// An identifier, or a keyword in name position (`string service = 1;`).
    fn expect_name(&mut self) -> Result<&'a Token, AdapterError> {
        if self.peek().kind.is_keyword() {
            return Ok(self.advance());
        }
        self.expect(TokenKind::Identifier)
    }

    fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }
}
