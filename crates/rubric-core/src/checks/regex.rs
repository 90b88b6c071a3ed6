use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use rubric_types::Verdict;

use crate::check::{subject_text, Check};
use crate::error::EvalError;

const EMAIL_PATTERN: &str = r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+";
const ANCHORED_EMAIL_PATTERN: &str = r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$";

#[derive(Debug, Clone, Deserialize)]
pub struct RegexParams {
	pub pattern: String,
}

/// Checks that the subject matches a caller-supplied pattern.
pub struct RegexCheck {
	pattern: Regex,
	pattern_str: String,
}

impl RegexCheck {
	/// Fails on an invalid pattern; a bad pattern is a caller bug, not a
	/// content verdict.
	pub fn new(pattern: &str) -> Result<Self, EvalError> {
		let regex = Regex::new(pattern)?;
		Ok(Self { pattern: regex, pattern_str: pattern.to_string() })
	}
}

#[async_trait]
impl Check for RegexCheck {
	fn name(&self) -> &'static str {
		"Regex"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let text = subject_text(subject);
		let verdict = if self.pattern.is_match(&text) {
			Verdict::pass(format!("regex pattern {} found in output", self.pattern_str))
		} else {
			Verdict::fail(format!("regex pattern {} not found in output", self.pattern_str))
		};
		Ok(verdict)
	}
}

/// Checks that the subject contains an email address somewhere.
pub struct ContainsEmail {
	pattern: Regex,
}

impl ContainsEmail {
	pub fn new() -> Result<Self, EvalError> {
		Ok(Self { pattern: Regex::new(EMAIL_PATTERN)? })
	}
}

#[async_trait]
impl Check for ContainsEmail {
	fn name(&self) -> &'static str {
		"ContainsEmail"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let text = subject_text(subject);
		let verdict = match self.pattern.find(&text) {
			Some(m) => Verdict::pass(format!("email address {} found in output", m.as_str())),
			None => Verdict::fail("no email address found in output"),
		};
		Ok(verdict)
	}
}

/// Checks that the entire subject is one email address.
pub struct IsEmail {
	pattern: Regex,
}

impl IsEmail {
	pub fn new() -> Result<Self, EvalError> {
		Ok(Self { pattern: Regex::new(ANCHORED_EMAIL_PATTERN)? })
	}
}

#[async_trait]
impl Check for IsEmail {
	fn name(&self) -> &'static str {
		"IsEmail"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let text = subject_text(subject);
		let verdict = if self.pattern.is_match(&text) {
			Verdict::pass("output is a valid email address")
		} else {
			Verdict::fail("output is not a valid email address")
		};
		Ok(verdict)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[tokio::test]
	async fn regex_match_and_miss() {
		let check = RegexCheck::new(r"capital.*Paris").unwrap();
		let hit = check.check(&json!("The capital of France is Paris")).await.unwrap();
		assert!(hit.result);

		let miss = check.check(&json!("The capital of France is London")).await.unwrap();
		assert!(!miss.result);
		assert!(miss.reason.contains("not found"));
	}

	#[test]
	fn invalid_pattern_is_a_configuration_error() {
		assert!(matches!(RegexCheck::new(r"(unclosed"), Err(EvalError::InvalidPattern(_))));
	}

	#[tokio::test]
	async fn contains_email_finds_embedded_address() {
		let check = ContainsEmail::new().unwrap();
		let verdict = check
			.check(&json!("write to support@example.com for help"))
			.await
			.unwrap();
		assert!(verdict.result);
		assert!(verdict.reason.contains("support@example.com"));

		let verdict = check.check(&json!("no address here")).await.unwrap();
		assert!(!verdict.result);
	}

	#[tokio::test]
	async fn is_email_requires_the_whole_text() {
		let check = IsEmail::new().unwrap();
		assert!(check.check(&json!("user@example.com")).await.unwrap().result);
		assert!(!check.check(&json!("contact: user@example.com")).await.unwrap().result);
		assert!(!check.check(&json!("not-an-email")).await.unwrap().result);
	}
}
