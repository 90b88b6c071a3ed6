use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

/// Outcome of a single check: pass/fail plus a human-readable reason.
///
/// Diagnostic fields are additive and omitted from serialized output when
/// absent. `reason` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
	pub result: bool,
	pub reason: String,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub matches: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub errors: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub details: Option<Value>,
}

impl Verdict {
	pub fn pass(reason: impl Into<String>) -> Self {
		Self {
			result: true,
			reason: reason.into(),
			matches: None,
			errors: None,
			details: None,
		}
	}

	pub fn fail(reason: impl Into<String>) -> Self {
		Self {
			result: false,
			reason: reason.into(),
			matches: None,
			errors: None,
			details: None,
		}
	}

	pub fn with_matches(mut self, matches: Value) -> Self {
		self.matches = Some(matches);
		self
	}

	pub fn with_errors(mut self, errors: Value) -> Self {
		self.errors = Some(errors);
		self
	}

	pub fn with_details(mut self, details: Value) -> Self {
		self.details = Some(details);
		self
	}
}

/// Comparison strategy applied to a pair of values extracted from the
/// actual and expected documents at the same JSON path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidatingFunction {
	Equals,
	#[serde(alias = "Cosine Similarity")]
	CosineSimilarity,
	#[serde(alias = "LLM Similarity")]
	LlmSimilarity,
}

impl std::fmt::Display for ValidatingFunction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			ValidatingFunction::Equals => "Equals",
			ValidatingFunction::CosineSimilarity => "CosineSimilarity",
			ValidatingFunction::LlmSimilarity => "LlmSimilarity",
		};
		f.write_str(name)
	}
}

/// One entry of a `JsonEval` validation plan. Constructed per comparison
/// request, applied once, in the order supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSpec {
	pub validating_function: ValidatingFunction,
	pub json_path: String,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub pass_threshold: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub model: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub open_ai_api_key: Option<String>,
}

/// One output to be graded, with an optional stable identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
	pub id: Option<String>,
	pub output: Value,
}

impl Subject {
	pub fn new(output: Value) -> Self {
		Self { id: None, output }
	}

	pub fn with_id(id: impl Into<String>, output: Value) -> Self {
		Self { id: Some(id.into()), output }
	}
}

/// Verdict of one named check applied to one subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckVerdict {
	pub op: String,
	pub verdict: Verdict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectResult {
	pub subject: Subject,
	pub verdicts: Vec<CheckVerdict>,
}

impl SubjectResult {
	/// A subject passes only when every check on it passed.
	pub fn passed(&self) -> bool {
		!self.verdicts.is_empty() && self.verdicts.iter().all(|v| v.verdict.result)
	}

	fn first_failure(&self) -> Option<&CheckVerdict> {
		self.verdicts.iter().find(|v| !v.verdict.result)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteSummary {
	pub total: usize,
	pub passed: usize,
	pub pass_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
	pub cases: Vec<SubjectResult>,
	pub summary: SuiteSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
struct SummaryRow {
	id: String,
	passed: String,
	checks: String,
	output: String,
	reason: String,
}

impl SuiteResult {
	pub fn summarize(cases: &[SubjectResult]) -> SuiteSummary {
		let total = cases.len();
		let passed = cases.iter().filter(|c| c.passed()).count();
		let pass_rate = if total == 0 { 0.0 } else { passed as f64 / total as f64 };
		SuiteSummary { total, passed, pass_rate }
	}

	pub fn summary_table(&self) -> String {
		use tabled::Table;
		let rows: Vec<SummaryRow> = self.cases.iter().map(|cr| {
			let id = cr.subject.id.clone().unwrap_or_else(|| "-".to_string());
			let passed = if cr.passed() { "✓" } else { " " };
			let ok = cr.verdicts.iter().filter(|v| v.verdict.result).count();
			let reason = cr
				.first_failure()
				.map(|v| format!("{}: {}", v.op, v.verdict.reason))
				.unwrap_or_default();

			SummaryRow {
				id,
				passed: passed.to_string(),
				checks: format!("{}/{}", ok, cr.verdicts.len()),
				output: truncate(value_preview(&cr.subject.output), 64),
				reason: truncate(reason, 64),
			}
		}).collect();

		let table = Table::new(rows);
		let table_str = table.to_string();

		let summary_text = format!(
			"Total: {}  Passed: {}  Pass rate: {:.1}%",
			self.summary.total,
			self.summary.passed,
			self.summary.pass_rate * 100.0,
		);

		format!("{}\n\n{}\n", table_str, summary_text)
	}
}

fn value_preview(v: &Value) -> String {
	match v {
		Value::String(s) => s.clone(),
		_ => v.to_string(),
	}
}

fn truncate(s: String, max_len: usize) -> String {
	if s.len() <= max_len {
		return s;
	}
	let mut truncated = s.chars().take(max_len.saturating_sub(1)).collect::<String>();
	truncated.push('…');
	truncated
}
