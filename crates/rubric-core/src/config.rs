use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One configured check: an operation name plus its options object.
/// Options are validated against the operation's parameter struct when
/// the suite is built, not when it runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSpec {
	pub op: String,
	#[serde(default = "empty_options")]
	pub options: Value,
}

fn empty_options() -> Value {
	Value::Object(Default::default())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
	#[serde(default = "default_concurrency")]
	pub concurrency: usize,
	pub checks: Vec<CheckSpec>,
}

fn default_concurrency() -> usize {
	8
}

impl SuiteConfig {
	pub fn from_yaml(text: &str) -> Result<Self> {
		serde_yaml::from_str(text).context("Invalid suite config")
	}
}
