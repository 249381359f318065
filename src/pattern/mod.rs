//! Syntax patterns: the code templates bound to a node's function id.

pub mod registry;
pub mod template;

use serde::{Deserialize, Serialize};

pub use registry::{InMemoryRegistry, PatternRegistry};
pub use template::{Substitution, apply_pattern};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// Yields a value; emitted as `<var> = <pattern>`.
    Expression,
    /// A standalone line (or lines), emitted verbatim.
    Statement,
    /// Multi-line, indented relative to the current block.
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxPattern {
    pub pattern: String,
    pub kind: PatternKind,
    #[serde(default)]
    pub imports: Vec<String>,
}

impl SyntaxPattern {
    pub fn new(kind: PatternKind, pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            kind,
            imports: Vec::new(),
        }
    }

    pub fn expression(pattern: impl Into<String>) -> Self {
        Self::new(PatternKind::Expression, pattern)
    }

    pub fn statement(pattern: impl Into<String>) -> Self {
        Self::new(PatternKind::Statement, pattern)
    }

    pub fn block(pattern: impl Into<String>) -> Self {
        Self::new(PatternKind::Block, pattern)
    }

    pub fn with_import(mut self, import: impl Into<String>) -> Self {
        self.imports.push(import.into());
        self
    }

    /// A block whose last line is a header (`with ...:`). Execution
    /// successors of the node are emitted inside it.
    pub fn opens_scope(&self) -> bool {
        self.kind == PatternKind::Block
            && self
                .pattern
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .is_some_and(|l| l.trim_end().ends_with(':'))
    }
}
