use async_trait::async_trait;
use serde_json::{json, Value};

use rubric_types::Verdict;

use crate::check::{subject_text, Check};
use crate::error::EvalError;

/// Checks that the entire subject parses as JSON.
///
/// Distinct from [`ContainsJson`]: a JSON fragment embedded in prose
/// fails here and passes there.
pub struct IsJson;

#[async_trait]
impl Check for IsJson {
	fn name(&self) -> &'static str {
		"IsJson"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let text = subject_text(subject);
		let verdict = match serde_json::from_str::<Value>(&text) {
			Ok(_) => Verdict::pass("output is valid JSON"),
			Err(_) => Verdict::fail("output is not valid JSON"),
		};
		Ok(verdict)
	}
}

/// Checks that the subject contains at least one JSON object, possibly
/// embedded in surrounding prose. Candidate fragments are located by a
/// brace scan and each is parsed independently.
pub struct ContainsJson;

#[async_trait]
impl Check for ContainsJson {
	fn name(&self) -> &'static str {
		"ContainsJson"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let text = subject_text(subject);
		let candidates = json_candidates(text.trim());

		if candidates.is_empty() {
			return Ok(Verdict::fail("output does not contain JSON"));
		}

		let mut matches = Vec::new();
		let mut errors = Vec::new();
		for candidate in candidates {
			match serde_json::from_str::<Value>(candidate) {
				Ok(parsed) => matches.push(json!({"json": parsed, "valid": true})),
				Err(e) => errors.push(json!({
					"json": candidate,
					"valid": false,
					"error": e.to_string(),
				})),
			}
		}

		let verdict = if !errors.is_empty() {
			Verdict::fail("output contains a potential JSON object but it is invalid")
				.with_matches(Value::Array(matches))
				.with_errors(Value::Array(errors))
		} else {
			Verdict::pass("output contains JSON").with_matches(Value::Array(matches))
		};
		Ok(verdict)
	}
}

/// Top-level balanced `{...}` spans, skipping braces inside string
/// literals. Candidates are byte slices at ASCII brace boundaries, so
/// slicing is char-safe.
fn json_candidates(text: &str) -> Vec<&str> {
	let bytes = text.as_bytes();
	let mut spans = Vec::new();
	let mut depth = 0usize;
	let mut start = None;
	let mut in_string = false;
	let mut escaped = false;

	for (i, &b) in bytes.iter().enumerate() {
		if in_string {
			if escaped {
				escaped = false;
			} else if b == b'\\' {
				escaped = true;
			} else if b == b'"' {
				in_string = false;
			}
			continue;
		}
		match b {
			b'"' if depth > 0 => in_string = true,
			b'{' => {
				if depth == 0 {
					start = Some(i);
				}
				depth += 1;
			}
			b'}' => {
				if depth > 0 {
					depth -= 1;
					if depth == 0 {
						if let Some(s) = start.take() {
							spans.push(&text[s..=i]);
						}
					}
				}
			}
			_ => {}
		}
	}
	spans
}
