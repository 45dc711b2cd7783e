use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}, column {column}: expected {expected} but found {found}")]
    ParseError {
        expected: String,
        found:    String,
        line:     usize,
        column:   usize,
    },

    #[error(
        "Unmatched IDL field \"{field}\" (normalized: {normalized}) in message \"{idl_entity}\": \
         no matching field in struct \"{struct_entity}\". Available struct fields: [{}]",
        .available.join(", ")
    )]
    UnmatchedField {
        field:         String,
        normalized:    String,
        idl_entity:    String,
        struct_entity: String,
        available:     Vec<String>,
    },

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_field_message_is_diagnosable() {
        let err = AdapterError::UnmatchedField {
            field:         "order_ref".into(),
            normalized:    "ORDERREF".into(),
            idl_entity:    "OrderInfo".into(),
            struct_entity: "OrderInfo".into(),
            available:     vec!["orderId".into(), "customerName".into()],
        };
        let text = err.to_string();
        assert!(text.contains("\"order_ref\""));
        assert!(text.contains("ORDERREF"));
        assert!(text.contains("[orderId, customerName]"));
    }

    #[test]
    fn test_parse_error_carries_position() {
        let err = AdapterError::ParseError {
            expected: "\";\"".into(),
            found:    "\"}\"".into(),
            line:     3,
            column:   14,
        };
        assert_eq!(
            err.to_string(),
            "Parse error at line 3, column 14: expected \";\" but found \"}\""
        );
    }
}
