//! Generator configuration, loadable from TOML.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Language id passed to the pattern registry.
    pub language_id: String,
    /// One indentation level.
    pub indent: String,
    /// Name of the function wrapping the generated body.
    pub entry_function: String,
    /// Wrap the body in the entry function and append the program-entry invocation.
    pub emit_entry_point: bool,
    /// Emitted as comment lines at the top of the program.
    pub header_comment: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            language_id: "python".into(),
            indent: "    ".into(),
            entry_function: "main".into(),
            emit_entry_point: true,
            header_comment: None,
        }
    }
}

impl GeneratorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: GeneratorConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.indent.is_empty() || !self.indent.chars().all(|c| c == ' ' || c == '\t') {
            return Err(ConfigError::Invalid(format!(
                "indent must be non-empty whitespace, got {:?}",
                self.indent
            )));
        }
        let mut chars = self.entry_function.chars();
        let valid_ident = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_ident {
            return Err(ConfigError::Invalid(format!(
                "entry_function must be an identifier, got '{}'",
                self.entry_function
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_keys() {
        let config = GeneratorConfig::from_toml_str("entry_function = \"run\"\n").unwrap();
        assert_eq!(config.entry_function, "run");
        assert_eq!(config.language_id, "python");
        assert_eq!(config.indent, "    ");
        assert!(config.emit_entry_point);
    }

    #[test]
    fn rejects_bad_indent() {
        let err = GeneratorConfig::from_toml_str("indent = \"xx\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_bad_entry_function() {
        let err = GeneratorConfig::from_toml_str("entry_function = \"1run\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn reports_toml_syntax_errors() {
        let err = GeneratorConfig::from_toml_str("indent = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
