use jsonschema::JSONSchema;
use serde_json::Value;

use crate::error::EvalError;

/// Resolve a schema supplied inline or as raw text.
///
/// Raw text may arrive with embedded newline/tab control characters;
/// those are stripped before parsing. A schema that still fails to parse
/// is a configuration error.
pub fn resolve_schema(schema: &Value) -> Result<Value, EvalError> {
	match schema {
		Value::String(raw) => {
			let cleaned = raw.replace('\n', "").replace('\t', "");
			serde_json::from_str(&cleaned).map_err(|e| EvalError::InvalidSchema(e.to_string()))
		}
		other => Ok(other.clone()),
	}
}

/// Compile a schema for repeated validation.
pub fn compile_schema(schema: &Value) -> Result<JSONSchema, EvalError> {
	JSONSchema::compile(schema).map_err(|e| EvalError::InvalidSchema(e.to_string()))
}
