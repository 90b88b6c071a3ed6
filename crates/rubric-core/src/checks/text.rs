use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use rubric_types::Verdict;

use crate::check::{subject_text, CaseSensitivity, Check};
use crate::error::EvalError;

#[derive(Debug, Clone, Deserialize)]
pub struct ExpectedTextParams {
	pub expected_text: String,
	#[serde(flatten)]
	pub case: CaseSensitivity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubstringParams {
	pub substring: String,
	#[serde(flatten)]
	pub case: CaseSensitivity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaxLengthParams {
	pub max_length: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinLengthParams {
	pub min_length: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LengthRangeParams {
	pub min_length: usize,
	pub max_length: usize,
}

/// Checks that the subject exactly matches the expected text.
pub struct TextEquals {
	expected: String,
	case: CaseSensitivity,
}

impl TextEquals {
	pub fn new(params: ExpectedTextParams) -> Self {
		Self { expected: params.expected_text, case: params.case }
	}
}

#[async_trait]
impl Check for TextEquals {
	fn name(&self) -> &'static str {
		"Equals"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let text = self.case.fold(&subject_text(subject));
		let expected = self.case.fold(&self.expected);
		let verdict = if text == expected {
			Verdict::pass("output exactly matches expected text")
		} else {
			Verdict::fail("output does not exactly match expected text")
		};
		Ok(verdict)
	}
}

pub struct StartsWith {
	substring: String,
	case: CaseSensitivity,
}

impl StartsWith {
	pub fn new(params: SubstringParams) -> Self {
		Self { substring: params.substring, case: params.case }
	}
}

#[async_trait]
impl Check for StartsWith {
	fn name(&self) -> &'static str {
		"StartsWith"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let text = self.case.fold(&subject_text(subject));
		let substring = self.case.fold(&self.substring);
		let verdict = if text.starts_with(&substring) {
			Verdict::pass(format!("output starts with {}", self.substring))
		} else {
			Verdict::fail(format!("output does not start with {}", self.substring))
		};
		Ok(verdict)
	}
}

pub struct EndsWith {
	substring: String,
	case: CaseSensitivity,
}

impl EndsWith {
	pub fn new(params: SubstringParams) -> Self {
		Self { substring: params.substring, case: params.case }
	}
}

#[async_trait]
impl Check for EndsWith {
	fn name(&self) -> &'static str {
		"EndsWith"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let text = self.case.fold(&subject_text(subject));
		let substring = self.case.fold(&self.substring);
		let verdict = if text.ends_with(&substring) {
			Verdict::pass(format!("output ends with {}", self.substring))
		} else {
			Verdict::fail(format!("output does not end with {}", self.substring))
		};
		Ok(verdict)
	}
}

/// Length checks count characters, not bytes.
pub struct LengthLessThan {
	max_length: usize,
}

impl LengthLessThan {
	pub fn new(params: MaxLengthParams) -> Self {
		Self { max_length: params.max_length }
	}
}

#[async_trait]
impl Check for LengthLessThan {
	fn name(&self) -> &'static str {
		"LengthLessThan"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let length = subject_text(subject).chars().count();
		let verdict = if length < self.max_length {
			Verdict::pass(format!("output length is less than {} characters", self.max_length))
		} else {
			Verdict::fail(format!(
				"output length is {} characters, not less than {}",
				length, self.max_length
			))
		};
		Ok(verdict)
	}
}

pub struct LengthGreaterThan {
	min_length: usize,
}

impl LengthGreaterThan {
	pub fn new(params: MinLengthParams) -> Self {
		Self { min_length: params.min_length }
	}
}

#[async_trait]
impl Check for LengthGreaterThan {
	fn name(&self) -> &'static str {
		"LengthGreaterThan"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let length = subject_text(subject).chars().count();
		let verdict = if length > self.min_length {
			Verdict::pass(format!(
				"output length is greater than {} characters",
				self.min_length
			))
		} else {
			Verdict::fail(format!(
				"output length is {} characters, not greater than {}",
				length, self.min_length
			))
		};
		Ok(verdict)
	}
}

pub struct LengthBetween {
	min_length: usize,
	max_length: usize,
}

impl LengthBetween {
	pub fn new(params: LengthRangeParams) -> Self {
		Self { min_length: params.min_length, max_length: params.max_length }
	}
}

#[async_trait]
impl Check for LengthBetween {
	fn name(&self) -> &'static str {
		"LengthBetween"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let length = subject_text(subject).chars().count();
		let verdict = if length >= self.min_length && length <= self.max_length {
			Verdict::pass(format!(
				"output length is between {} and {} characters",
				self.min_length, self.max_length
			))
		} else {
			Verdict::fail(format!(
				"output length is {} characters, not between {} and {}",
				length, self.min_length, self.max_length
			))
		};
		Ok(verdict)
	}
}

/// Checks that the subject is a single line.
pub struct OneLine;

#[async_trait]
impl Check for OneLine {
	fn name(&self) -> &'static str {
		"OneLine"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let text = subject_text(subject);
		let verdict = if text.contains('\n') {
			Verdict::fail("output contains multiple lines")
		} else {
			Verdict::pass("output is a single line")
		};
		Ok(verdict)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn expected(text: &str, case_sensitive: bool) -> ExpectedTextParams {
		ExpectedTextParams {
			expected_text: text.to_string(),
			case: CaseSensitivity { case_sensitive },
		}
	}

	#[tokio::test]
	async fn equals_is_case_insensitive_by_default() {
		let check = TextEquals::new(expected("Hello World", false));
		assert!(check.check(&json!("hello world")).await.unwrap().result);

		let strict = TextEquals::new(expected("Hello World", true));
		assert!(!strict.check(&json!("hello world")).await.unwrap().result);
	}

	#[tokio::test]
	async fn starts_and_ends_with() {
		let starts = StartsWith::new(SubstringParams {
			substring: "Dear".to_string(),
			case: CaseSensitivity::default(),
		});
		assert!(starts.check(&json!("dear customer, hello")).await.unwrap().result);
		assert!(!starts.check(&json!("hello dear customer")).await.unwrap().result);

		let ends = EndsWith::new(SubstringParams {
			substring: "regards".to_string(),
			case: CaseSensitivity::default(),
		});
		assert!(ends.check(&json!("Kind Regards")).await.unwrap().result);
		assert!(!ends.check(&json!("regards, me")).await.unwrap().result);
	}

	#[tokio::test]
	async fn length_bounds_count_characters() {
		let lt = LengthLessThan::new(MaxLengthParams { max_length: 6 });
		assert!(lt.check(&json!("héllo")).await.unwrap().result);
		assert!(!lt.check(&json!("héllo!")).await.unwrap().result);

		let gt = LengthGreaterThan::new(MinLengthParams { min_length: 3 });
		assert!(gt.check(&json!("abcd")).await.unwrap().result);
		assert!(!gt.check(&json!("abc")).await.unwrap().result);
	}

	#[tokio::test]
	async fn length_between_is_inclusive() {
		let between = LengthBetween::new(LengthRangeParams { min_length: 2, max_length: 4 });
		assert!(between.check(&json!("ab")).await.unwrap().result);
		assert!(between.check(&json!("abcd")).await.unwrap().result);
		assert!(!between.check(&json!("a")).await.unwrap().result);
		assert!(!between.check(&json!("abcde")).await.unwrap().result);
	}

	#[tokio::test]
	async fn one_line_rejects_newlines() {
		assert!(OneLine.check(&json!("single line")).await.unwrap().result);
		assert!(!OneLine.check(&json!("two\nlines")).await.unwrap().result);
	}
}
