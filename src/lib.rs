pub mod codegen;
pub mod config;
pub mod error;
pub mod parse;
pub mod pattern;
pub mod resolve;
pub mod typing;
pub mod validate;
pub mod wasm;

pub use codegen::{ExecutionBasedCodeGenerator, GenerationResult, generate_code};
pub use config::GeneratorConfig;
pub use error::{Diagnostic, DiagnosticKind, Severity};
pub use parse::FlowGraph;
pub use pattern::{InMemoryRegistry, PatternKind, PatternRegistry, SyntaxPattern};
pub use resolve::DependencyResolver;
pub use typing::{Compatibility, TypeConversionService, TypeValidator};
