//! Port type compatibility and conversion insertion.

pub mod conversion;
pub mod validator;

pub use conversion::{Conversion, Strategy, TypeConversionService};
pub use validator::{Compatibility, PortRef, TypeValidator};

pub const ANY: &str = "any";
pub const NUMBER: &str = "number";
pub const STRING: &str = "string";
pub const BOOLEAN: &str = "boolean";
pub const ARRAY: &str = "array";
pub const OBJECT: &str = "object";

const KNOWN: [&str; 6] = [ANY, NUMBER, STRING, BOOLEAN, ARRAY, OBJECT];

/// Lower-case a type name and fold aliases onto the canonical names.
/// Unrecognised names come back lower-cased.
pub fn canonical(type_name: &str) -> String {
    let lower = type_name.trim().to_ascii_lowercase();
    let folded = match lower.as_str() {
        "" | "*" => ANY,
        "int" | "integer" | "float" | "double" | "decimal" => NUMBER,
        "str" | "text" => STRING,
        "bool" => BOOLEAN,
        "list" => ARRAY,
        "dict" | "map" | "record" => OBJECT,
        _ => return lower,
    };
    folded.to_string()
}

pub fn is_known(canonical_name: &str) -> bool {
    KNOWN.contains(&canonical_name)
}
