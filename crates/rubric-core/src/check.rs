use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use rubric_types::Verdict;

use crate::error::EvalError;

/// A named, stateless check over a single text or JSON subject.
///
/// Checks never mutate the subject and are safe to invoke concurrently.
/// Content-quality outcomes resolve to a [`Verdict`]; an `Err` means a
/// configuration or caller bug.
#[async_trait]
pub trait Check: Send + Sync {
	fn name(&self) -> &'static str;
	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError>;
}

/// Text form of a subject: strings as-is, everything else serialized
/// compactly.
pub fn subject_text(subject: &Value) -> String {
	match subject {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		_ => subject.to_string(),
	}
}

/// Case-sensitivity flag shared by the text matchers. Matching is
/// case-insensitive unless requested otherwise.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CaseSensitivity {
	#[serde(default)]
	pub case_sensitive: bool,
}

impl CaseSensitivity {
	pub fn sensitive() -> Self {
		Self { case_sensitive: true }
	}

	pub fn fold(&self, s: &str) -> String {
		if self.case_sensitive {
			s.to_string()
		} else {
			s.to_lowercase()
		}
	}
}

/// Keyword input for the quantifier matchers: a JSON list or a single
/// comma-separated string, normalized to an ordered list of trimmed
/// tokens.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Keywords {
	List(Vec<String>),
	Csv(String),
}

impl Keywords {
	pub fn tokens(&self) -> Vec<String> {
		match self {
			Keywords::List(items) => items.iter().map(|k| k.trim().to_string()).collect(),
			Keywords::Csv(s) => s.split(',').map(|k| k.trim().to_string()).collect(),
		}
	}
}

impl From<Vec<&str>> for Keywords {
	fn from(items: Vec<&str>) -> Self {
		Keywords::List(items.into_iter().map(|s| s.to_string()).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn keywords_accept_list_or_comma_string() {
		let from_list: Keywords = serde_json::from_value(json!(["a", " b ", "c"])).unwrap();
		assert_eq!(from_list.tokens(), vec!["a", "b", "c"]);

		let from_csv: Keywords = serde_json::from_value(json!("a, b ,c")).unwrap();
		assert_eq!(from_csv.tokens(), vec!["a", "b", "c"]);
	}

	#[test]
	fn case_fold_defaults_to_insensitive() {
		let case = CaseSensitivity::default();
		assert_eq!(case.fold("HeLLo"), "hello");
		assert_eq!(CaseSensitivity::sensitive().fold("HeLLo"), "HeLLo");
	}

	#[test]
	fn subject_text_uses_strings_verbatim() {
		assert_eq!(subject_text(&json!("plain")), "plain");
		assert_eq!(subject_text(&json!({"a": 1})), r#"{"a":1}"#);
		assert_eq!(subject_text(&Value::Null), "");
	}
}
