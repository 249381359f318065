//! Pattern registry seam and an in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::{PatternKind, SyntaxPattern};
use crate::error::{ParseError, RegistryError};

/// Source of syntax patterns, keyed by function id and target language.
///
/// Implementations are free to do I/O; the generator awaits lookups one at a time.
#[async_trait]
pub trait PatternRegistry: Send + Sync {
    async fn get_syntax_pattern(
        &self,
        function_id: &str,
        language_id: &str,
    ) -> Result<Option<SyntaxPattern>, RegistryError>;
}

/// One entry of a built-in function list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatternEntry {
    function_id: String,
    #[serde(default)]
    language_id: Option<String>,
    pattern: String,
    kind: PatternKind,
    #[serde(default)]
    imports: Vec<String>,
}

/// Patterns held in memory. Entries registered without a language apply to all languages.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    by_language: HashMap<(String, String), SyntaxPattern>,
    any_language: HashMap<String, SyntaxPattern>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON list of `{ functionId, languageId?, pattern, kind, imports? }`.
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        let entries: Vec<PatternEntry> = serde_json::from_str(json).map_err(ParseError::Patterns)?;
        let mut registry = Self::new();
        for entry in entries {
            let pattern = SyntaxPattern {
                pattern: entry.pattern,
                kind: entry.kind,
                imports: entry.imports,
            };
            match entry.language_id {
                Some(language) => registry.insert_for(&entry.function_id, &language, pattern),
                None => registry.insert(&entry.function_id, pattern),
            }
        }
        tracing::debug!(patterns = registry.len(), "loaded pattern list");
        Ok(registry)
    }

    pub fn insert(&mut self, function_id: &str, pattern: SyntaxPattern) {
        self.any_language.insert(function_id.to_string(), pattern);
    }

    pub fn insert_for(&mut self, function_id: &str, language_id: &str, pattern: SyntaxPattern) {
        self.by_language
            .insert((function_id.to_string(), language_id.to_string()), pattern);
    }

    pub fn with_pattern(mut self, function_id: &str, pattern: SyntaxPattern) -> Self {
        self.insert(function_id, pattern);
        self
    }

    pub fn len(&self) -> usize {
        self.by_language.len() + self.any_language.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, function_id: &str, language_id: &str) -> Option<&SyntaxPattern> {
        self.by_language
            .get(&(function_id.to_string(), language_id.to_string()))
            .or_else(|| self.any_language.get(function_id))
    }
}

#[async_trait]
impl PatternRegistry for InMemoryRegistry {
    async fn get_syntax_pattern(
        &self,
        function_id: &str,
        language_id: &str,
    ) -> Result<Option<SyntaxPattern>, RegistryError> {
        Ok(self.lookup(function_id, language_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_with_and_without_language() {
        let json = r#"[
            {"functionId": "print", "pattern": "print({0})", "kind": "statement"},
            {"functionId": "sqrt", "languageId": "python", "pattern": "math.sqrt({0})",
             "kind": "expression", "imports": ["import math"]}
        ]"#;
        let registry = InMemoryRegistry::from_json(json).unwrap();
        assert_eq!(registry.len(), 2);

        let print = registry.lookup("print", "lua").unwrap();
        assert_eq!(print.kind, PatternKind::Statement);

        let sqrt = registry.lookup("sqrt", "python").unwrap();
        assert_eq!(sqrt.imports, vec!["import math".to_string()]);
        assert!(registry.lookup("sqrt", "lua").is_none());
    }

    #[test]
    fn malformed_list_is_a_parse_error() {
        let err = InMemoryRegistry::from_json(r#"[{"functionId": "x"}]"#).unwrap_err();
        assert!(matches!(err, ParseError::Patterns(_)));
    }

    #[tokio::test]
    async fn async_lookup() {
        let registry = InMemoryRegistry::new().with_pattern("add", SyntaxPattern::expression("{0} + {1}"));
        let found = registry.get_syntax_pattern("add", "python").await.unwrap();
        assert_eq!(found, Some(SyntaxPattern::expression("{0} + {1}")));
        assert_eq!(registry.get_syntax_pattern("nope", "python").await.unwrap(), None);
    }
}
