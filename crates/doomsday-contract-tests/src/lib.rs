//! Helpers for validating wire and render fixtures against the JSON schemas
//! frozen under `contracts/`.

use std::path::PathBuf;

use jsonschema::JSONSchema;
use serde_json::Value;

/// Absolute path of `relative` inside the workspace `contracts/` directory.
pub fn contract_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../contracts")
        .join(relative)
}

/// Reads and parses a JSON file under `contracts/`.
///
/// # Panics
/// Panics when the file is missing or not JSON; contract files are fixed
/// test inputs.
pub fn load_json(relative: &str) -> Value {
    let path = contract_path(relative);
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|error| panic!("{} should be readable: {error}", path.display()));
    serde_json::from_str(&raw)
        .unwrap_or_else(|error| panic!("{} should be valid json: {error}", path.display()))
}

/// Compiles `contracts/<name>.schema.json`.
///
/// # Panics
/// Panics when the schema does not compile.
pub fn compile_validator(name: &str) -> JSONSchema {
    let schema = load_json(&format!("{name}.schema.json"));
    JSONSchema::compile(&schema)
        .unwrap_or_else(|error| panic!("{name} schema should compile: {error}"))
}

/// Validation error messages for `instance` against schema `name`.
pub fn violations(name: &str, instance: &Value) -> Vec<String> {
    let validator = compile_validator(name);
    let messages = match validator.validate(instance) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|error| format!("{}: {error}", error.instance_path))
            .collect(),
    };
    messages
}
