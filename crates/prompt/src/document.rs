//! Prompt document parsing

use serde_yaml::Value;

use crate::{PromptError, Result};

/// Used when the document carries no `description`
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

const DESCRIPTION_KEY: &str = "description";

/// Extract the system prompt from a YAML prompt document.
///
/// Empty documents and documents without a `description` (or with a null
/// one) yield [`DEFAULT_SYSTEM_PROMPT`]. Text that is not YAML, a top level
/// that is not a mapping, or a `description` that is a list or mapping is an
/// error.
pub fn extract_description(raw: &str) -> Result<String> {
    if is_blank_document(raw) {
        return Ok(DEFAULT_SYSTEM_PROMPT.to_string());
    }

    let doc: Value = serde_yaml::from_str(raw)?;
    let map = match doc {
        Value::Null => return Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
        Value::Mapping(map) => map,
        other => {
            return Err(PromptError::MalformedDocument(format!(
                "expected a mapping at the top level, found {}",
                kind_of(&other)
            )))
        }
    };

    match map.get(DESCRIPTION_KEY) {
        None | Some(Value::Null) => Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(PromptError::MalformedDocument(format!(
            "`{}` must be text, found {}",
            DESCRIPTION_KEY,
            kind_of(other)
        ))),
    }
}

/// Only whitespace, comments and document markers
fn is_blank_document(raw: &str) -> bool {
    raw.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_extracted() {
        let raw = "name: machina\ndescription: You answer in haiku.\n";
        assert_eq!(extract_description(raw).unwrap(), "You answer in haiku.");
    }

    #[test]
    fn test_block_scalar_description() {
        let raw = "description: |\n  Line one.\n  Line two.\n";
        assert_eq!(extract_description(raw).unwrap(), "Line one.\nLine two.\n");
    }

    #[test]
    fn test_missing_description_uses_default() {
        let raw = "name: machina\nversion: 2\n";
        assert_eq!(extract_description(raw).unwrap(), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_null_description_uses_default() {
        assert_eq!(
            extract_description("description: ~\n").unwrap(),
            DEFAULT_SYSTEM_PROMPT
        );
    }

    #[test]
    fn test_empty_document_uses_default() {
        assert_eq!(extract_description("").unwrap(), DEFAULT_SYSTEM_PROMPT);
        assert_eq!(extract_description("  \n\n").unwrap(), DEFAULT_SYSTEM_PROMPT);
        assert_eq!(
            extract_description("# nothing here\n---\n").unwrap(),
            DEFAULT_SYSTEM_PROMPT
        );
    }

    #[test]
    fn test_explicit_null_document_uses_default() {
        assert_eq!(extract_description("~\n").unwrap(), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_scalar_description_rendered() {
        assert_eq!(extract_description("description: 42\n").unwrap(), "42");
        assert_eq!(extract_description("description: true\n").unwrap(), "true");
    }

    #[test]
    fn test_empty_string_description_kept() {
        assert_eq!(extract_description("description: ''\n").unwrap(), "");
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let err = extract_description("description: [unterminated\n").unwrap_err();
        assert!(matches!(err, PromptError::Yaml(_)));
        assert!(err.is_malformed());
        assert!(!err.is_remote());
    }

    #[test]
    fn test_non_mapping_document_is_error() {
        let err = extract_description("- a\n- b\n").unwrap_err();
        match err {
            PromptError::MalformedDocument(msg) => assert!(msg.contains("sequence")),
            other => panic!("Expected MalformedDocument, got {:?}", other),
        }
        assert!(extract_description("just a sentence").is_err());
    }

    #[test]
    fn test_structured_description_is_error() {
        let err = extract_description("description:\n  - one\n  - two\n").unwrap_err();
        assert!(matches!(err, PromptError::MalformedDocument(_)));
    }
}
