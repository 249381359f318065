//! Conversion expressions for compatible-with-conversion type pairs.

use std::collections::HashMap;

use super::validator::{Compatibility, TypeValidator};
use super::{ARRAY, BOOLEAN, NUMBER, OBJECT, STRING, canonical};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// No conversion needed (or none possible for an incompatible pair).
    Unchanged,
    /// A registered conversion function was wrapped around the expression.
    Registered(String),
    /// No function registered; a built-in fallback expression was used.
    Fallback,
    /// Conversion required, but nothing registered and no fallback exists.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub expression: String,
    pub compatibility: Compatibility,
    pub strategy: Strategy,
}

impl Conversion {
    pub fn applied(&self) -> bool {
        matches!(self.strategy, Strategy::Registered(_) | Strategy::Fallback)
    }
}

#[derive(Debug, Clone)]
pub struct TypeConversionService {
    validator: TypeValidator,
    functions: HashMap<(String, String), String>,
}

impl TypeConversionService {
    /// Service with the default conversion functions for the target language.
    pub fn new(validator: TypeValidator) -> Self {
        let defaults = [
            (NUMBER, STRING, "str"),
            (BOOLEAN, STRING, "str"),
            (ARRAY, STRING, "str"),
            (OBJECT, STRING, "str"),
            (STRING, NUMBER, "float"),
            (BOOLEAN, NUMBER, "int"),
            (NUMBER, BOOLEAN, "bool"),
        ];
        let mut service = Self::without_functions(validator);
        for (s, t, f) in defaults {
            service.functions.insert((s.to_string(), t.to_string()), f.to_string());
        }
        service
    }

    /// Service relying on fallback expressions only.
    pub fn without_functions(validator: TypeValidator) -> Self {
        Self {
            validator,
            functions: HashMap::new(),
        }
    }

    pub fn with_function(mut self, source: &str, target: &str, function: &str) -> Self {
        self.functions
            .insert((canonical(source), canonical(target)), function.to_string());
        self
    }

    pub fn convert(&self, value_expr: &str, source_type: &str, target_type: &str) -> Conversion {
        let compatibility = self.validator.check_compatibility(source_type, target_type);
        let unchanged = |strategy| Conversion {
            expression: value_expr.to_string(),
            compatibility,
            strategy,
        };

        if compatibility != Compatibility::CompatibleWithConversion {
            return unchanged(Strategy::Unchanged);
        }

        let key = (canonical(source_type), canonical(target_type));
        if let Some(function) = self.functions.get(&key) {
            return Conversion {
                expression: format!("{function}({value_expr})"),
                compatibility,
                strategy: Strategy::Registered(function.clone()),
            };
        }

        match fallback_expression(value_expr, &key.0, &key.1) {
            Some(expression) => Conversion {
                expression,
                compatibility,
                strategy: Strategy::Fallback,
            },
            None => {
                tracing::debug!(
                    source = %key.0,
                    target = %key.1,
                    "no conversion available, expression left unchanged"
                );
                unchanged(Strategy::Unavailable)
            }
        }
    }

    pub fn get_conversion_expression(&self, value_expr: &str, source_type: &str, target_type: &str) -> String {
        self.convert(value_expr, source_type, target_type).expression
    }
}

impl Default for TypeConversionService {
    fn default() -> Self {
        Self::new(TypeValidator::new())
    }
}

fn fallback_expression(expr: &str, source: &str, target: &str) -> Option<String> {
    let converted = match (source, target) {
        (NUMBER | BOOLEAN | ARRAY | OBJECT, STRING) => format!("str({expr})"),
        (STRING, NUMBER) => format!("float({expr})"),
        (STRING, BOOLEAN) => format!("(str({expr}).strip().lower() == \"true\")"),
        (BOOLEAN, NUMBER) => format!("int({expr})"),
        (NUMBER, BOOLEAN) => format!("bool({expr})"),
        (OBJECT, ARRAY) => format!("list({expr})"),
        _ => return None,
    };
    Some(converted)
}
