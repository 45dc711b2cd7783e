use lazy_static::lazy_static;
use regex::Regex;

use crate::utils::advance_position;

lazy_static! {
    // Every alternative consumes at least one character and the trailing `.`
    // catches anything else, so `find_iter` never leaves a gap.
    pub static ref TOKEN_REGEX: Regex = Regex::new(
        r#"(?s)//[^\n]*|/\*.*?(?:\*/|\z)|"(?:\\.|[^"\\])*"?|\s+|\d+|[A-Za-z_][A-Za-z0-9_]*|[{};=<>.\[\]]|."#
    ).unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Message,
    Repeated,
    Optional,
    Required,
    Syntax,
    Package,
    Option,
    Reserved,
    Import,
    Enum,
    Oneof,
    Service,
    Extend,

    // Delimiters
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    LeftAngle,
    RightAngle,
    Semicolon,
    Equals,
    Dot,

    // Literals
    Identifier,
    Number,
    StringLiteral,

    Eof,
}

impl TokenKind {
    fn keyword(word: &str) -> Option<TokenKind> {
        Some(match word {
            "message"  => TokenKind::Message,
            "repeated" => TokenKind::Repeated,
            "optional" => TokenKind::Optional,
            "required" => TokenKind::Required,
            "syntax"   => TokenKind::Syntax,
            "package"  => TokenKind::Package,
            "option"   => TokenKind::Option,
            "reserved" => TokenKind::Reserved,
            "import"   => TokenKind::Import,
            "enum"     => TokenKind::Enum,
            "oneof"    => TokenKind::Oneof,
            "service"  => TokenKind::Service,
            "extend"   => TokenKind::Extend,
            _ => return None,
        })
    }

    /// Keywords are only reserved where a declaration starts; they remain
    /// valid as field, message and package segment names.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Message
                | TokenKind::Repeated
                | TokenKind::Optional
                | TokenKind::Required
                | TokenKind::Syntax
                | TokenKind::Package
                | TokenKind::Option
                | TokenKind::Reserved
                | TokenKind::Import
                | TokenKind::Enum
                | TokenKind::Oneof
                | TokenKind::Service
                | TokenKind::Extend
        )
    }

    /// How the kind reads in an "expected ..." error message.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Message       => "\"message\"",
            TokenKind::Repeated      => "\"repeated\"",
            TokenKind::Optional      => "\"optional\"",
            TokenKind::Required      => "\"required\"",
            TokenKind::Syntax        => "\"syntax\"",
            TokenKind::Package       => "\"package\"",
            TokenKind::Option        => "\"option\"",
            TokenKind::Reserved      => "\"reserved\"",
            TokenKind::Import        => "\"import\"",
            TokenKind::Enum          => "\"enum\"",
            TokenKind::Oneof         => "\"oneof\"",
            TokenKind::Service       => "\"service\"",
            TokenKind::Extend        => "\"extend\"",
            TokenKind::LeftBrace     => "\"{\"",
            TokenKind::RightBrace    => "\"}\"",
            TokenKind::LeftBracket   => "\"[\"",
            TokenKind::RightBracket  => "\"]\"",
            TokenKind::LeftAngle     => "\"<\"",
            TokenKind::RightAngle    => "\">\"",
            TokenKind::Semicolon     => "\";\"",
            TokenKind::Equals        => "\"=\"",
            TokenKind::Dot           => "\".\"",
            TokenKind::Identifier    => "identifier",
            TokenKind::Number        => "integer",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Eof           => "end of input",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind:   TokenKind,
    pub text:   String,
    pub line:   usize,
    pub column: usize,
}

/// Classifies one regex match. `None` means trivia (whitespace, comments) or
/// a character the grammar does not model.
fn classify(part: &str) -> Option<TokenKind> {
    let first = part.chars().next()?;
    match first {
        '{' => Some(TokenKind::LeftBrace),
        '}' => Some(TokenKind::RightBrace),
        '[' => Some(TokenKind::LeftBracket),
        ']' => Some(TokenKind::RightBracket),
        '<' => Some(TokenKind::LeftAngle),
        '>' => Some(TokenKind::RightAngle),
        ';' => Some(TokenKind::Semicolon),
        '=' => Some(TokenKind::Equals),
        '.' => Some(TokenKind::Dot),
        '"' => Some(TokenKind::StringLiteral),
        c if c.is_ascii_digit() => Some(TokenKind::Number),
        c if c.is_ascii_alphabetic() || c == '_' => {
            Some(TokenKind::keyword(part).unwrap_or(TokenKind::Identifier))
        }
        _ => None,
    }
}

/// Splits IDL source into tokens. Never fails; the result always ends with
/// an `Eof` token.
pub fn tokenize_idl(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut line   = 1;
    let mut column = 1;

    for mat in TOKEN_REGEX.find_iter(text) {
        let part = mat.as_str();

        if let Some(kind) = classify(part) {
            let text = if kind == TokenKind::StringLiteral {
                let inner = &part[1..];
                inner.strip_suffix('"').unwrap_or(inner).to_string()
            } else {
                part.to_string()
            };
            tokens.push(Token { kind, text, line, column });
        }

        advance_position(part, &mut line, &mut column);
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        line,
        column,
    });
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_field() {
        let got = tokenize_idl("repeated Item items = 3;");
        let expected = vec![
            Token { kind: TokenKind::Repeated,   text: "repeated".into(), line: 1, column: 1 },
            Token { kind: TokenKind::Identifier, text: "Item".into(),     line: 1, column: 10 },
            Token { kind: TokenKind::Identifier, text: "items".into(),    line: 1, column: 15 },
            Token { kind: TokenKind::Equals,     text: "=".into(),        line: 1, column: 21 },
            Token { kind: TokenKind::Number,     text: "3".into(),        line: 1, column: 23 },
            Token { kind: TokenKind::Semicolon,  text: ";".into(),        line: 1, column: 24 },
            Token { kind: TokenKind::Eof,        text: "".into(),         line: 1, column: 25 },
        ];
        assert_eq!(got, expected);
    }

    #[test]
    fn test_comments_are_dropped_but_tracked() {
        let input = "// header\n/* multi\n line */ message A {}";
        let got = tokenize_idl(input);
        assert_eq!(
            kinds(&got),
            vec![TokenKind::Message, TokenKind::Identifier, TokenKind::LeftBrace, TokenKind::RightBrace, TokenKind::Eof]
        );
        assert_eq!((got[0].line, got[0].column), (3, 10));
        assert_eq!((got[1].line, got[1].column), (3, 18));
    }

    #[test]
    fn test_string_literal_and_keywords() {
        let got = tokenize_idl("syntax = \"proto3\";\npackage a.b;");
        assert_eq!(
            kinds(&got),
            vec![
                TokenKind::Syntax, TokenKind::Equals, TokenKind::StringLiteral, TokenKind::Semicolon,
                TokenKind::Package, TokenKind::Identifier, TokenKind::Dot, TokenKind::Identifier,
                TokenKind::Semicolon, TokenKind::Eof,
            ]
        );
        assert_eq!(got[2].text, "proto3");
        assert_eq!((got[4].line, got[4].column), (2, 1));
    }

    #[test]
    fn test_unknown_characters_are_skipped() {
        let got = tokenize_idl("int32 @x$ = 1;");
        assert_eq!(
            kinds(&got),
            vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Equals, TokenKind::Number, TokenKind::Semicolon, TokenKind::Eof]
        );
        assert_eq!(got[1].column, 8);
    }

    #[test]
    fn test_empty_input_yields_eof() {
        let got = tokenize_idl("");
        assert_eq!(got, vec![Token { kind: TokenKind::Eof, text: "".into(), line: 1, column: 1 }]);
    }

    #[test]
    fn test_unterminated_block_comment_runs_to_end() {
        let got = tokenize_idl("message /* never\nclosed");
        assert_eq!(kinds(&got), vec![TokenKind::Message, TokenKind::Eof]);
        assert_eq!((got[1].line, got[1].column), (2, 7));
    }
}
