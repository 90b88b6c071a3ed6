use std::sync::Arc;

use async_trait::async_trait;
use jsonschema::JSONSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use rubric_types::{ValidatingFunction, ValidationSpec, Verdict};

use crate::check::Check;
use crate::credentials;
use crate::error::EvalError;
use crate::json_path::{extract_json_path, Extracted};
use crate::judge::{ChatMessage, JudgeModel, JudgeRequest};
use crate::schema::{compile_schema, resolve_schema};
use crate::similarity::TextSimilarity;

const DEFAULT_PASS_THRESHOLD: f64 = 0.8;
const DEFAULT_JUDGE_MODEL: &str = "gpt-3.5-turbo";

const JUDGE_SYSTEM_PROMPT: &str = "\
You are an expert at evaluating whether two given strings are similar or not. \
Consider semantic similarity also while evaluating. \
You MUST return a JSON object with the following fields: \
- result: Result must be either 'Pass' or 'Fail'. \
- explanation: An explanation of why the result is Pass or Fail. \
- score: Any matching score you have used to come to the result.";

#[derive(Debug, Clone, Deserialize)]
pub struct JsonEvalParams {
	pub expected_json: Value,
	#[serde(default)]
	pub schema: Option<Value>,
	#[serde(default)]
	pub validations: Vec<ValidationSpec>,
}

/// Structured comparison of an actual document against an expected one:
/// schema validation of both, then an ordered validation plan applied
/// per JSON path, short-circuiting on the first failure.
pub struct JsonEval {
	expected: Value,
	schema: Option<JSONSchema>,
	validations: Vec<ValidationSpec>,
	similarity: Option<Arc<dyn TextSimilarity>>,
	judge: Option<Arc<dyn JudgeModel>>,
}

impl JsonEval {
	/// Schema problems surface here, before anything is evaluated. A
	/// missing schema is not an error; it becomes a failed verdict at
	/// check time.
	pub fn new(
		params: JsonEvalParams,
		similarity: Option<Arc<dyn TextSimilarity>>,
		judge: Option<Arc<dyn JudgeModel>>,
	) -> Result<Self, EvalError> {
		let schema = match &params.schema {
			Some(raw) if !raw.is_null() => Some(compile_schema(&resolve_schema(raw)?)?),
			_ => None,
		};
		Ok(Self {
			expected: params.expected_json,
			schema,
			validations: params.validations,
			similarity,
			judge,
		})
	}
}

#[async_trait]
impl Check for JsonEval {
	fn name(&self) -> &'static str {
		"JsonEval"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let actual = parse_document(subject)?;
		let expected = parse_document(&self.expected)?;

		let Some(schema) = &self.schema else {
			return Ok(Verdict::fail("Schema not provided"));
		};
		if !(schema.is_valid(&actual) && schema.is_valid(&expected)) {
			return Ok(Verdict::fail("Schema validation failed"));
		}

		for spec in &self.validations {
			if let Applied::Fail(details) = self.apply(&actual, &expected, spec).await? {
				return Ok(Verdict::fail("Validation failed").with_details(details));
			}
		}

		Ok(Verdict::pass("Json eval passed"))
	}
}

enum Applied {
	Pass,
	Fail(Value),
}

impl JsonEval {
	async fn apply(
		&self,
		actual_doc: &Value,
		expected_doc: &Value,
		spec: &ValidationSpec,
	) -> Result<Applied, EvalError> {
		let actual = extract_json_path(actual_doc, &spec.json_path);
		let expected = extract_json_path(expected_doc, &spec.json_path);

		match spec.validating_function {
			ValidatingFunction::Equals => Ok(apply_equals(actual, expected, spec)),
			ValidatingFunction::CosineSimilarity => {
				self.apply_cosine(actual, expected, spec).await
			}
			ValidatingFunction::LlmSimilarity => self.apply_llm(actual, expected, spec).await,
		}
	}

	async fn apply_cosine(
		&self,
		actual: Extracted,
		expected: Extracted,
		spec: &ValidationSpec,
	) -> Result<Applied, EvalError> {
		let similarity = self
			.similarity
			.as_ref()
			.ok_or(EvalError::MissingCapability("similarity"))?;

		let (Some(actual_text), Some(expected_text)) = (actual.as_text(), expected.as_text())
		else {
			return Ok(absent_failure(spec, &actual, &expected));
		};

		let threshold = spec.pass_threshold.unwrap_or(DEFAULT_PASS_THRESHOLD);
		let score = similarity.similarity(&actual_text, &expected_text).await?;
		if score < threshold {
			tracing::error!(
				json_path = %spec.json_path,
				score,
				threshold,
				"cosine similarity score is below the pass threshold"
			);
			return Ok(Applied::Fail(json!({
				"json_path": spec.json_path,
				"validating_function": spec.validating_function.to_string(),
				"score": score,
				"pass_threshold": threshold,
			})));
		}
		Ok(Applied::Pass)
	}

	async fn apply_llm(
		&self,
		actual: Extracted,
		expected: Extracted,
		spec: &ValidationSpec,
	) -> Result<Applied, EvalError> {
		let judge = self.judge.as_ref().ok_or(EvalError::MissingCapability("judge"))?;
		let api_key = resolve_api_key(spec)?;

		let (Some(actual_text), Some(expected_text)) = (actual.as_text(), expected.as_text())
		else {
			return Ok(absent_failure(spec, &actual, &expected));
		};

		let user_message = format!(
			"Following are two strings:\n1. String 1: {actual_text}.\n2. String 2: {expected_text}.",
		);
		let request = JudgeRequest {
			model: spec.model.clone().unwrap_or_else(|| DEFAULT_JUDGE_MODEL.to_string()),
			api_key,
			messages: vec![
				ChatMessage::system(JUDGE_SYSTEM_PROMPT),
				ChatMessage::user(user_message),
			],
			temperature: 0.0,
		};

		let judgment = judge.json_completion(request).await?;
		let result = judgment.get("result").and_then(Value::as_str);
		let explanation = judgment.get("explanation").and_then(Value::as_str);
		let score = judgment.get("score").cloned();

		match result {
			Some("Pass") => Ok(Applied::Pass),
			Some("Fail") => {
				tracing::error!(
					json_path = %spec.json_path,
					explanation = explanation.unwrap_or(""),
					"LLM similarity validation failed"
				);
				Ok(Applied::Fail(json!({
					"json_path": spec.json_path,
					"validating_function": spec.validating_function.to_string(),
					"explanation": explanation,
					"score": score,
				})))
			}
			_ => {
				// A judgment missing the contract fields never passes silently.
				tracing::error!(
					json_path = %spec.json_path,
					"judge returned a malformed judgment"
				);
				Ok(Applied::Fail(json!({
					"json_path": spec.json_path,
					"validating_function": spec.validating_function.to_string(),
					"error": "malformed judgment from judge model",
				})))
			}
		}
	}
}

fn apply_equals(actual: Extracted, expected: Extracted, spec: &ValidationSpec) -> Applied {
	match (&actual, &expected) {
		// Both sides unresolved compare equal; a single unresolved side
		// is a mismatch.
		(Extracted::Absent, Extracted::Absent) => Applied::Pass,
		(Extracted::Present(a), Extracted::Present(e)) if a == e => Applied::Pass,
		_ => {
			tracing::error!(json_path = %spec.json_path, "JSON path does not match expected value");
			Applied::Fail(json!({
				"json_path": spec.json_path,
				"validating_function": spec.validating_function.to_string(),
			}))
		}
	}
}

fn absent_failure(spec: &ValidationSpec, actual: &Extracted, expected: &Extracted) -> Applied {
	tracing::error!(
		json_path = %spec.json_path,
		actual_absent = actual.is_absent(),
		expected_absent = expected.is_absent(),
		"JSON path did not resolve in one or both documents"
	);
	Applied::Fail(json!({
		"json_path": spec.json_path,
		"validating_function": spec.validating_function.to_string(),
		"actual_absent": actual.is_absent(),
		"expected_absent": expected.is_absent(),
	}))
}

/// Credential precedence: explicit in the validation entry, else the
/// configured store, else the environment. The engine only reads the
/// store; writing keys is out-of-band configuration.
fn resolve_api_key(spec: &ValidationSpec) -> Result<String, EvalError> {
	if let Some(key) = &spec.open_ai_api_key {
		return Ok(key.clone());
	}
	if let Some(key) = credentials::openai_api_key() {
		return Ok(key);
	}
	if let Ok(key) = std::env::var("OPENAI_API_KEY") {
		return Ok(key);
	}
	tracing::error!("no OpenAI API key available for LLM similarity validation");
	Err(EvalError::MissingApiKey)
}

/// Already-structured values are used as-is; strings must parse as JSON.
/// A parse failure is fatal, not a verdict.
fn parse_document(input: &Value) -> Result<Value, EvalError> {
	match input {
		Value::String(raw) => serde_json::from_str(raw).map_err(|e| {
			tracing::error!(error = %e, "document is not valid JSON");
			EvalError::InvalidJson(e)
		}),
		other => Ok(other.clone()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn person_schema() -> Value {
		json!({
			"type": "object",
			"properties": {
				"name": {"type": "string"},
				"answer": {"type": "string"}
			},
			"required": ["name", "answer"]
		})
	}

	fn equals_validation(path: &str) -> ValidationSpec {
		ValidationSpec {
			validating_function: ValidatingFunction::Equals,
			json_path: path.to_string(),
			pass_threshold: None,
			model: None,
			open_ai_api_key: None,
		}
	}

	fn eval_with(
		schema: Option<Value>,
		expected: Value,
		validations: Vec<ValidationSpec>,
	) -> JsonEval {
		JsonEval::new(
			JsonEvalParams { expected_json: expected, schema, validations },
			None,
			None,
		)
		.unwrap()
	}

	struct StaticSimilarity {
		score: f64,
	}

	#[async_trait]
	impl TextSimilarity for StaticSimilarity {
		async fn similarity(&self, _left: &str, _right: &str) -> Result<f64, EvalError> {
			Ok(self.score)
		}
	}

	struct StaticJudge {
		response: Value,
	}

	#[async_trait]
	impl JudgeModel for StaticJudge {
		async fn json_completion(&self, request: JudgeRequest) -> Result<Value, EvalError> {
			assert_eq!(request.temperature, 0.0);
			assert!(!request.api_key.is_empty());
			Ok(self.response.clone())
		}
	}

	#[tokio::test]
	async fn matching_documents_pass_equals_validation() {
		let doc = json!({"name": "a", "answer": "42"});
		let eval = eval_with(Some(person_schema()), doc.clone(), vec![equals_validation("answer")]);
		let verdict = eval.check(&doc).await.unwrap();
		assert!(verdict.result);
		assert_eq!(verdict.reason, "Json eval passed");
	}

	#[tokio::test]
	async fn missing_schema_is_a_verdict_failure() {
		let doc = json!({"name": "a", "answer": "42"});
		let eval = eval_with(None, doc.clone(), vec![]);
		let verdict = eval.check(&doc).await.unwrap();
		assert!(!verdict.result);
		assert_eq!(verdict.reason, "Schema not provided");
	}

	#[tokio::test]
	async fn asymmetric_schema_conformance_fails_fast() {
		let actual = json!({"name": "a", "answer": "42"});
		let expected = json!({"name": "a"});
		let eval = eval_with(Some(person_schema()), expected, vec![equals_validation("answer")]);
		let verdict = eval.check(&actual).await.unwrap();
		assert!(!verdict.result);
		assert_eq!(verdict.reason, "Schema validation failed");
	}

	#[tokio::test]
	async fn first_failing_validation_wins_and_names_the_path() {
		let actual = json!({"name": "a", "answer": "42"});
		let expected = json!({"name": "b", "answer": "42"});
		let eval = eval_with(
			Some(person_schema()),
			expected,
			vec![equals_validation("name"), equals_validation("answer")],
		);
		let verdict = eval.check(&actual).await.unwrap();
		assert!(!verdict.result);
		assert_eq!(verdict.reason, "Validation failed");
		let details = verdict.details.unwrap();
		assert_eq!(details["json_path"], "name");
	}

	#[tokio::test]
	async fn raw_text_documents_and_schema_are_parsed() {
		let actual = json!("{\"name\": \"a\", \"answer\": \"42\"}");
		let expected = json!("{\"name\": \"a\", \"answer\": \"42\"}");
		let schema = json!("{\n\t\"type\": \"object\",\n\t\"required\": [\"name\"]\n}");
		let eval = eval_with(Some(schema), expected, vec![equals_validation("answer")]);
		let verdict = eval.check(&actual).await.unwrap();
		assert!(verdict.result);
	}

	#[tokio::test]
	async fn unparseable_document_is_fatal() {
		let eval = eval_with(Some(person_schema()), json!({"name": "a", "answer": "b"}), vec![]);
		let err = eval.check(&json!("{not json")).await.unwrap_err();
		assert!(matches!(err, EvalError::InvalidJson(_)));
	}

	#[tokio::test]
	async fn both_absent_paths_compare_equal() {
		let doc = json!({"name": "a", "answer": "b"});
		let eval = eval_with(Some(person_schema()), doc.clone(), vec![equals_validation("missing")]);
		let verdict = eval.check(&doc).await.unwrap();
		assert!(verdict.result);
	}

	#[tokio::test]
	async fn one_absent_path_is_a_mismatch() {
		let actual = json!({"name": "a", "answer": "b"});
		let expected = json!({"name": "a", "answer": "b", "extra": 1});
		let eval = eval_with(Some(person_schema()), expected, vec![equals_validation("extra")]);
		let verdict = eval.check(&actual).await.unwrap();
		assert!(!verdict.result);
		assert_eq!(verdict.reason, "Validation failed");
	}

	#[tokio::test]
	async fn cosine_score_at_threshold_passes() {
		let doc = json!({"name": "a", "answer": "the sky is blue"});
		let spec = ValidationSpec {
			validating_function: ValidatingFunction::CosineSimilarity,
			json_path: "answer".to_string(),
			pass_threshold: Some(0.8),
			model: None,
			open_ai_api_key: None,
		};
		let eval = JsonEval::new(
			JsonEvalParams {
				expected_json: doc.clone(),
				schema: Some(person_schema()),
				validations: vec![spec],
			},
			Some(Arc::new(StaticSimilarity { score: 0.8 })),
			None,
		)
		.unwrap();
		let verdict = eval.check(&doc).await.unwrap();
		assert!(verdict.result);
	}

	#[tokio::test]
	async fn cosine_below_threshold_reports_score_and_threshold() {
		let doc = json!({"name": "a", "answer": "the sky is blue"});
		let spec = ValidationSpec {
			validating_function: ValidatingFunction::CosineSimilarity,
			json_path: "answer".to_string(),
			pass_threshold: None,
			model: None,
			open_ai_api_key: None,
		};
		let eval = JsonEval::new(
			JsonEvalParams {
				expected_json: doc.clone(),
				schema: Some(person_schema()),
				validations: vec![spec],
			},
			Some(Arc::new(StaticSimilarity { score: 0.5 })),
			None,
		)
		.unwrap();
		let verdict = eval.check(&doc).await.unwrap();
		assert!(!verdict.result);
		let details = verdict.details.unwrap();
		assert_eq!(details["score"], 0.5);
		assert_eq!(details["pass_threshold"], 0.8);
	}

	#[tokio::test]
	async fn cosine_without_capability_is_fatal() {
		let doc = json!({"name": "a", "answer": "b"});
		let spec = ValidationSpec {
			validating_function: ValidatingFunction::CosineSimilarity,
			json_path: "answer".to_string(),
			pass_threshold: None,
			model: None,
			open_ai_api_key: None,
		};
		let eval = eval_with(Some(person_schema()), doc.clone(), vec![spec]);
		let err = eval.check(&doc).await.unwrap_err();
		assert!(matches!(err, EvalError::MissingCapability("similarity")));
	}

	fn llm_validation() -> ValidationSpec {
		ValidationSpec {
			validating_function: ValidatingFunction::LlmSimilarity,
			json_path: "answer".to_string(),
			pass_threshold: None,
			model: None,
			open_ai_api_key: Some("sk-test".to_string()),
		}
	}

	fn llm_eval(response: Value) -> JsonEval {
		let doc = json!({"name": "a", "answer": "the sky is blue"});
		JsonEval::new(
			JsonEvalParams {
				expected_json: doc,
				schema: Some(person_schema()),
				validations: vec![llm_validation()],
			},
			None,
			Some(Arc::new(StaticJudge { response })),
		)
		.unwrap()
	}

	#[tokio::test]
	async fn llm_judgment_pass_passes() {
		let doc = json!({"name": "a", "answer": "the sky is blue"});
		let eval = llm_eval(json!({"result": "Pass", "explanation": "same meaning", "score": 0.95}));
		let verdict = eval.check(&doc).await.unwrap();
		assert!(verdict.result);
	}

	#[tokio::test]
	async fn llm_judgment_fail_carries_the_explanation() {
		let doc = json!({"name": "a", "answer": "the sky is blue"});
		let eval = llm_eval(json!({"result": "Fail", "explanation": "different topics", "score": 0.1}));
		let verdict = eval.check(&doc).await.unwrap();
		assert!(!verdict.result);
		let details = verdict.details.unwrap();
		assert_eq!(details["explanation"], "different topics");
	}

	#[tokio::test]
	async fn malformed_judgment_never_passes_silently() {
		let doc = json!({"name": "a", "answer": "the sky is blue"});
		let eval = llm_eval(json!({"verdict": "looks fine"}));
		let verdict = eval.check(&doc).await.unwrap();
		assert!(!verdict.result);
	}

	#[tokio::test]
	async fn idempotent_for_identical_inputs() {
		let doc = json!({"name": "a", "answer": "42"});
		let eval = eval_with(Some(person_schema()), doc.clone(), vec![equals_validation("answer")]);
		let first = eval.check(&doc).await.unwrap();
		let second = eval.check(&doc).await.unwrap();
		assert_eq!(first, second);
	}
}
