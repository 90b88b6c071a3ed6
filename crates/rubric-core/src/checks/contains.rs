use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use rubric_types::Verdict;

use crate::check::{subject_text, CaseSensitivity, Check, Keywords};
use crate::error::EvalError;

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordParams {
	pub keywords: Keywords,
	#[serde(flatten)]
	pub case: CaseSensitivity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContainsParams {
	pub keyword: String,
	#[serde(flatten)]
	pub case: CaseSensitivity,
}

/// How many of the supplied keywords must appear for the check to pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantifier {
	Any,
	All,
	None,
}

/// Quantified keyword search backing `ContainsAny`, `ContainsAll`, and
/// `ContainsNone`. Every token is evaluated before deciding so the
/// reason can enumerate each match or miss.
pub struct KeywordSearch {
	keywords: Keywords,
	case: CaseSensitivity,
	quantifier: Quantifier,
}

impl KeywordSearch {
	pub fn any(params: KeywordParams) -> Self {
		Self { keywords: params.keywords, case: params.case, quantifier: Quantifier::Any }
	}

	pub fn all(params: KeywordParams) -> Self {
		Self { keywords: params.keywords, case: params.case, quantifier: Quantifier::All }
	}

	pub fn none(params: KeywordParams) -> Self {
		Self { keywords: params.keywords, case: params.case, quantifier: Quantifier::None }
	}
}

#[async_trait]
impl Check for KeywordSearch {
	fn name(&self) -> &'static str {
		match self.quantifier {
			Quantifier::Any => "ContainsAny",
			Quantifier::All => "ContainsAll",
			Quantifier::None => "ContainsNone",
		}
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let text = self.case.fold(&subject_text(subject));
		let tokens = self.keywords.tokens();

		let mut found = Vec::new();
		let mut missing = Vec::new();
		for token in &tokens {
			if text.contains(&self.case.fold(token)) {
				found.push(token.clone());
			} else {
				missing.push(token.clone());
			}
		}

		let verdict = match self.quantifier {
			Quantifier::Any => {
				if found.is_empty() {
					Verdict::fail("no keywords found in output")
				} else {
					Verdict::pass(format!(
						"one or more keywords found in output: {}",
						found.join(", ")
					))
				}
			}
			Quantifier::All => {
				if missing.is_empty() {
					Verdict::pass(format!(
						"{}/{} keywords found in output",
						tokens.len(),
						tokens.len()
					))
				} else {
					Verdict::fail(format!(
						"keywords not found in output: {}",
						missing.join(", ")
					))
				}
			}
			Quantifier::None => {
				if found.is_empty() {
					Verdict::pass("no keywords found in output")
				} else {
					Verdict::fail(format!(
						"one or more keywords found in output: {}",
						found.join(", ")
					))
				}
			}
		};
		Ok(verdict)
	}
}

/// Checks that a single keyword appears in the subject.
pub struct ContainsKeyword {
	keyword: String,
	case: CaseSensitivity,
}

impl ContainsKeyword {
	pub fn new(params: ContainsParams) -> Self {
		Self { keyword: params.keyword, case: params.case }
	}
}

#[async_trait]
impl Check for ContainsKeyword {
	fn name(&self) -> &'static str {
		"Contains"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let text = self.case.fold(&subject_text(subject));
		let keyword = self.case.fold(self.keyword.trim());
		let verdict = if text.contains(&keyword) {
			Verdict::pass(format!("keyword {} found in output", self.keyword))
		} else {
			Verdict::fail(format!("keyword not found in output: {}", self.keyword))
		};
		Ok(verdict)
	}
}
