use lazy_static::lazy_static;
use regex::Regex;

use crate::utils::advance_position;

lazy_static! {
    pub static ref TOKEN_REGEX: Regex = Regex::new(
        r"(?s)//[^\n]*|/\*.*?(?:\*/|\z)|#[^\n]*|\s+|::|\d+|[A-Za-z_][A-Za-z0-9_]*|[{};<>\[\]:()=,]|."
    ).unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Struct,
    Typedef,
    Char,

    // Delimiters
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    LeftAngle,
    RightAngle,
    LeftParen,
    RightParen,
    Semicolon,
    Equals,
    Comma,
    ColonColon,
    Colon,

    // Literals
    Identifier,
    Number,

    Eof,
}

impl TokenKind {
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Struct       => "\"struct\"",
            TokenKind::Typedef      => "\"typedef\"",
            TokenKind::Char         => "\"char\"",
            TokenKind::LeftBrace    => "\"{\"",
            TokenKind::RightBrace   => "\"}\"",
            TokenKind::LeftBracket  => "\"[\"",
            TokenKind::RightBracket => "\"]\"",
            TokenKind::LeftAngle    => "\"<\"",
            TokenKind::RightAngle   => "\">\"",
            TokenKind::LeftParen    => "\"(\"",
            TokenKind::RightParen   => "\")\"",
            TokenKind::Semicolon    => "\";\"",
            TokenKind::Equals       => "\"=\"",
            TokenKind::Comma        => "\",\"",
            TokenKind::ColonColon   => "\"::\"",
            TokenKind::Colon        => "\":\"",
            TokenKind::Identifier   => "identifier",
            TokenKind::Number       => "integer",
            TokenKind::Eof          => "end of input",
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

fn classify(part: &str) -> Option<TokenKind> {
    if part == "::" {
        return Some(TokenKind::ColonColon);
    }
    let first = part.chars().next()?;
    match first {
        '{' => Some(TokenKind::LeftBrace),
        '}' => Some(TokenKind::RightBrace),
        '[' => Some(TokenKind::LeftBracket),
        ']' => Some(TokenKind::RightBracket),
        '<' => Some(TokenKind::LeftAngle),
        '>' => Some(TokenKind::RightAngle),
        '(' => Some(TokenKind::LeftParen),
        ')' => Some(TokenKind::RightParen),
        ';' => Some(TokenKind::Semicolon),
        '=' => Some(TokenKind::Equals),
        ',' => Some(TokenKind::Comma),
        ':' => Some(TokenKind::Colon),
        c if c.is_ascii_digit() => Some(TokenKind::Number),
        c if c.is_ascii_alphabetic() || c == '_' => Some(match part {
            "struct"  => TokenKind::Struct,
            "typedef" => TokenKind::Typedef,
            "char"    => TokenKind::Char,
            _         => TokenKind::Identifier,
        }),
        _ => None,
    }
}

/// Splits header source into tokens. Comments and preprocessor lines are
/// dropped; unknown characters (`*`, `&`, `~`, ...) are skipped. The
/// result always ends with an `Eof` token.
pub fn tokenize_header(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut line   = 1;
    let mut column = 1;

    for mat in TOKEN_REGEX.find_iter(text) {
        let part = mat.as_str();
        if let Some(kind) = classify(part) {
            tokens.push(Token {
                kind,
                text: part.to_string(),
                line,
                column,
            });
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
