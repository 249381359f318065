//! Diagnostics and error types shared across all phases.
//!
//! Graph-shape problems are reported as [`Diagnostic`] values and never abort
//! generation. The `thiserror` enums below cover plumbing that genuinely fails:
//! malformed input JSON, pattern registry lookups, config files and internal faults.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    SyntaxPatternMissing,
    UnresolvedPlaceholder,
    DependencyCycle,
    DisconnectedRequiredInput,
    TypeIncompatible,
    TypeConversionApplied,
    InitializationFailure,
    InternalGenerationFailure,
    // Structural lint
    DuplicateConnection,
    SelfLoop,
    MissingBranch,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::TypeIncompatible
            | DiagnosticKind::InitializationFailure
            | DiagnosticKind::InternalGenerationFailure => Severity::Error,
            DiagnosticKind::SyntaxPatternMissing
            | DiagnosticKind::UnresolvedPlaceholder
            | DiagnosticKind::DependencyCycle
            | DiagnosticKind::DisconnectedRequiredInput
            | DiagnosticKind::TypeConversionApplied
            | DiagnosticKind::DuplicateConnection
            | DiagnosticKind::SelfLoop
            | DiagnosticKind::MissingBranch => Severity::Warning,
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Both endpoints of a data connection, with the declared port types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub edge_id: String,
    pub source_node: String,
    pub source_port: String,
    pub source_type: String,
    pub target_node: String,
    pub target_port: String,
    pub target_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub node_id: Option<String>,
    pub node_label: Option<String>,
    pub connection: Option<ConnectionInfo>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            severity: kind.severity(),
            message: message.into(),
            node_id: None,
            node_label: None,
            connection: None,
        }
    }

    pub fn for_node(
        kind: DiagnosticKind,
        message: impl Into<String>,
        node_id: &str,
        node_label: &str,
    ) -> Self {
        Diagnostic {
            node_id: Some(node_id.to_string()),
            node_label: Some(node_label.to_string()),
            ..Diagnostic::new(kind, message)
        }
    }

    pub fn with_connection(mut self, connection: ConnectionInfo) -> Self {
        if self.node_id.is_none() {
            self.node_id = Some(connection.target_node.clone());
        }
        self.connection = Some(connection);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node_id {
            Some(id) => write!(
                f,
                "[{}:{}] {} (node '{}')",
                self.severity, self.kind, self.message, id
            ),
            None => write!(f, "[{}:{}] {}", self.severity, self.kind, self.message),
        }
    }
}

/// Accumulates diagnostics in emission order.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.items.extend(diagnostics);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Split into `(errors, warnings)`.
    pub fn into_split(self) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
        self.items.into_iter().partition(Diagnostic::is_error)
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse graph JSON: {0}")]
    Graph(#[source] serde_json::Error),

    #[error("failed to parse pattern list JSON: {0}")]
    Patterns(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("lookup of pattern '{function_id}' failed: {reason}")]
    Lookup { function_id: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid generator config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid generator config: {0}")]
    Invalid(String),
}

/// Unexpected internal faults. Caught by the generator and turned into comments.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("node index {0} is not part of the graph")]
    UnknownNode(usize),

    #[error("node '{node_id}' has no input at position {index}")]
    MissingInput { node_id: String, index: usize },
}
