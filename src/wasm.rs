//! WASM entry points for browser use.

use wasm_bindgen::prelude::*;

use crate::codegen::{ExecutionBasedCodeGenerator, GenerationResult};
use crate::config::GeneratorConfig;
use crate::error::Diagnostic;
use crate::pattern::InMemoryRegistry;
use crate::typing::TypeValidator;

/// Lint a graph JSON: structural rules plus connection type checks.
/// Returns a JSON array of diagnostics, or a single-element error list if the
/// graph does not parse.
#[wasm_bindgen]
pub fn validate_graph(graph_json: &str) -> JsValue {
    let result = validate_graph_inner(graph_json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn validate_graph_inner(graph_json: &str) -> ValidateResult {
    match crate::parse::parse_and_build(graph_json) {
        Ok(graph) => ValidateResult::Success {
            diagnostics: crate::validate::validate_graph(&graph),
        },
        Err(e) => ValidateResult::Errors {
            errors: vec![ErrorDto::new("Parse", e)],
        },
    }
}

/// Compile a graph JSON with a JSON pattern list and the default config.
#[wasm_bindgen]
pub fn compile_graph(graph_json: &str, patterns_json: &str) -> JsValue {
    let result = compile_graph_inner(graph_json, patterns_json, None);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

/// Same as [`compile_graph`], with a TOML generator config.
#[wasm_bindgen]
pub fn compile_graph_with_config(graph_json: &str, patterns_json: &str, config_toml: &str) -> JsValue {
    let result = compile_graph_inner(graph_json, patterns_json, Some(config_toml));
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn compile_graph_inner(graph_json: &str, patterns_json: &str, config_toml: Option<&str>) -> CompileResult {
    // 1. Config
    let config = match config_toml.map(GeneratorConfig::from_toml_str).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => return CompileResult::errors("Config", e),
    };

    // 2. Parse graph + build
    let graph = match crate::parse::parse_and_build(graph_json) {
        Ok(g) => g,
        Err(e) => return CompileResult::errors("Parse", e),
    };

    // 3. Pattern registry
    let registry = match InMemoryRegistry::from_json(patterns_json) {
        Ok(r) => r,
        Err(e) => return CompileResult::errors("Parse", e),
    };

    // 4. Generate
    let mut generator = ExecutionBasedCodeGenerator::with_config(&graph, &registry, config);
    CompileResult::Success(futures::executor::block_on(generator.generate_code()))
}

/// Compatibility of a `source` → `target` port type pair, as a string:
/// `"compatible"`, `"compatibleWithConversion"`, `"incompatible"` or `"unknown"`.
#[wasm_bindgen]
pub fn check_compatibility(source_type: &str, target_type: &str) -> JsValue {
    let compatibility = TypeValidator::default().check_compatibility(source_type, target_type);
    serde_wasm_bindgen::to_value(&compatibility).unwrap_or(JsValue::NULL)
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(serde::Serialize)]
struct ErrorDto {
    phase: String,
    message: String,
}

impl ErrorDto {
    fn new(phase: &str, error: impl std::fmt::Display) -> Self {
        ErrorDto {
            phase: phase.into(),
            message: error.to_string(),
        }
    }
}

#[derive(serde::Serialize)]
#[serde(tag = "status")]
enum CompileResult {
    #[serde(rename = "success")]
    Success(GenerationResult),
    #[serde(rename = "errors")]
    Errors { errors: Vec<ErrorDto> },
}

impl CompileResult {
    fn errors(phase: &str, error: impl std::fmt::Display) -> Self {
        CompileResult::Errors {
            errors: vec![ErrorDto::new(phase, error)],
        }
    }
}

#[derive(serde::Serialize)]
#[serde(tag = "status")]
enum ValidateResult {
    #[serde(rename = "success")]
    Success { diagnostics: Vec<Diagnostic> },
    #[serde(rename = "errors")]
    Errors { errors: Vec<ErrorDto> },
}
