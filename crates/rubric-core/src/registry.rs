use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use rubric_types::Verdict;

use crate::check::Check;
use crate::checks::contains::{ContainsKeyword, KeywordSearch};
use crate::checks::json::{ContainsJson, IsJson};
use crate::checks::json_eval::JsonEval;
use crate::checks::link::{ContainsLink, ContainsValidLink, HttpProber, NoInvalidLinks, UrlProber};
use crate::checks::regex::{ContainsEmail, IsEmail, RegexCheck, RegexParams};
use crate::checks::text::{
	EndsWith, LengthBetween, LengthGreaterThan, LengthLessThan, OneLine, StartsWith, TextEquals,
};
use crate::error::EvalError;
use crate::judge::JudgeModel;
use crate::similarity::TextSimilarity;

/// Built-in operations, closed at compile time. Adding a variant means
/// adding a constructor arm in [`Registry::build`]; the match there is
/// exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
	Regex,
	ContainsAny,
	ContainsAll,
	Contains,
	ContainsNone,
	ContainsJson,
	ContainsEmail,
	IsJson,
	IsEmail,
	NoInvalidLinks,
	ContainsLink,
	ContainsValidLink,
	Equals,
	StartsWith,
	EndsWith,
	LengthLessThan,
	LengthGreaterThan,
	LengthBetween,
	OneLine,
	JsonEval,
}

impl OpKind {
	pub const ALL: [OpKind; 20] = [
		OpKind::Regex,
		OpKind::ContainsAny,
		OpKind::ContainsAll,
		OpKind::Contains,
		OpKind::ContainsNone,
		OpKind::ContainsJson,
		OpKind::ContainsEmail,
		OpKind::IsJson,
		OpKind::IsEmail,
		OpKind::NoInvalidLinks,
		OpKind::ContainsLink,
		OpKind::ContainsValidLink,
		OpKind::Equals,
		OpKind::StartsWith,
		OpKind::EndsWith,
		OpKind::LengthLessThan,
		OpKind::LengthGreaterThan,
		OpKind::LengthBetween,
		OpKind::OneLine,
		OpKind::JsonEval,
	];

	pub fn name(self) -> &'static str {
		match self {
			OpKind::Regex => "Regex",
			OpKind::ContainsAny => "ContainsAny",
			OpKind::ContainsAll => "ContainsAll",
			OpKind::Contains => "Contains",
			OpKind::ContainsNone => "ContainsNone",
			OpKind::ContainsJson => "ContainsJson",
			OpKind::ContainsEmail => "ContainsEmail",
			OpKind::IsJson => "IsJson",
			OpKind::IsEmail => "IsEmail",
			OpKind::NoInvalidLinks => "NoInvalidLinks",
			OpKind::ContainsLink => "ContainsLink",
			OpKind::ContainsValidLink => "ContainsValidLink",
			OpKind::Equals => "Equals",
			OpKind::StartsWith => "StartsWith",
			OpKind::EndsWith => "EndsWith",
			OpKind::LengthLessThan => "LengthLessThan",
			OpKind::LengthGreaterThan => "LengthGreaterThan",
			OpKind::LengthBetween => "LengthBetween",
			OpKind::OneLine => "OneLine",
			OpKind::JsonEval => "JsonEval",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.iter().copied().find(|op| op.name() == name)
	}
}

pub type CheckFactory = Arc<dyn Fn(&Value) -> Result<Arc<dyn Check>, EvalError> + Send + Sync>;

/// Process-wide catalog of named checks.
///
/// Built-ins resolve through the closed [`OpKind`] set. Custom
/// operations may be registered at startup and never shadow an existing
/// name, so identical names always resolve to the same behavior. Once
/// construction is done the registry is read-only and safe to share
/// across tasks.
pub struct Registry {
	similarity: Option<Arc<dyn TextSimilarity>>,
	judge: Option<Arc<dyn JudgeModel>>,
	prober: Arc<dyn UrlProber>,
	custom: HashMap<String, CheckFactory>,
}

impl Registry {
	pub fn new() -> Self {
		Self {
			similarity: None,
			judge: None,
			prober: Arc::new(HttpProber::default()),
			custom: HashMap::new(),
		}
	}

	pub fn with_similarity(mut self, similarity: Arc<dyn TextSimilarity>) -> Self {
		self.similarity = Some(similarity);
		self
	}

	pub fn with_judge(mut self, judge: Arc<dyn JudgeModel>) -> Self {
		self.judge = Some(judge);
		self
	}

	pub fn with_prober(mut self, prober: Arc<dyn UrlProber>) -> Self {
		self.prober = prober;
		self
	}

	/// Register a custom operation. Rejects names that collide with a
	/// built-in or an earlier registration.
	pub fn register(
		&mut self,
		name: impl Into<String>,
		factory: CheckFactory,
	) -> Result<(), EvalError> {
		let name = name.into();
		if OpKind::from_name(&name).is_some() || self.custom.contains_key(&name) {
			tracing::error!(op = %name, "refusing to shadow an existing operation");
			return Err(EvalError::DuplicateOperation(name));
		}
		self.custom.insert(name, factory);
		Ok(())
	}

	/// Every operation name this registry resolves, built-ins first.
	pub fn operations(&self) -> Vec<String> {
		let mut names: Vec<String> = OpKind::ALL.iter().map(|op| op.name().to_string()).collect();
		let mut custom: Vec<String> = self.custom.keys().cloned().collect();
		custom.sort();
		names.extend(custom);
		names
	}

	/// Resolve an operation name and its options into a runnable check.
	/// Unknown names and malformed options are caller bugs.
	pub fn resolve(&self, op: &str, options: &Value) -> Result<Arc<dyn Check>, EvalError> {
		if let Some(kind) = OpKind::from_name(op) {
			return self.build(kind, options);
		}
		if let Some(factory) = self.custom.get(op) {
			return factory(options);
		}
		tracing::error!(op, "unknown operation");
		Err(EvalError::UnknownOperation(op.to_string()))
	}

	/// `(operation_name, subject, options) -> Verdict`. Unrecognized
	/// option keys are ignored.
	pub async fn invoke(
		&self,
		op: &str,
		subject: &Value,
		options: &Value,
	) -> Result<Verdict, EvalError> {
		self.resolve(op, options)?.check(subject).await
	}

	fn build(&self, kind: OpKind, options: &Value) -> Result<Arc<dyn Check>, EvalError> {
		let check: Arc<dyn Check> = match kind {
			OpKind::Regex => Arc::new(RegexCheck::new(&params::<RegexParams>(kind, options)?.pattern)?),
			OpKind::ContainsAny => Arc::new(KeywordSearch::any(params(kind, options)?)),
			OpKind::ContainsAll => Arc::new(KeywordSearch::all(params(kind, options)?)),
			OpKind::Contains => Arc::new(ContainsKeyword::new(params(kind, options)?)),
			OpKind::ContainsNone => Arc::new(KeywordSearch::none(params(kind, options)?)),
			OpKind::ContainsJson => Arc::new(ContainsJson),
			OpKind::ContainsEmail => Arc::new(ContainsEmail::new()?),
			OpKind::IsJson => Arc::new(IsJson),
			OpKind::IsEmail => Arc::new(IsEmail::new()?),
			OpKind::NoInvalidLinks => Arc::new(NoInvalidLinks::new(self.prober.clone())?),
			OpKind::ContainsLink => Arc::new(ContainsLink::new()?),
			OpKind::ContainsValidLink => Arc::new(ContainsValidLink::new(self.prober.clone())?),
			OpKind::Equals => Arc::new(TextEquals::new(params(kind, options)?)),
			OpKind::StartsWith => Arc::new(StartsWith::new(params(kind, options)?)),
			OpKind::EndsWith => Arc::new(EndsWith::new(params(kind, options)?)),
			OpKind::LengthLessThan => Arc::new(LengthLessThan::new(params(kind, options)?)),
			OpKind::LengthGreaterThan => Arc::new(LengthGreaterThan::new(params(kind, options)?)),
			OpKind::LengthBetween => Arc::new(LengthBetween::new(params(kind, options)?)),
			OpKind::OneLine => Arc::new(OneLine),
			OpKind::JsonEval => Arc::new(JsonEval::new(
				params(kind, options)?,
				self.similarity.clone(),
				self.judge.clone(),
			)?),
		};
		Ok(check)
	}
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}

fn params<T: DeserializeOwned>(kind: OpKind, options: &Value) -> Result<T, EvalError> {
	serde_json::from_value(options.clone()).map_err(|e| {
		tracing::error!(op = kind.name(), error = %e, "invalid operation options");
		EvalError::InvalidOptions { op: kind.name().to_string(), source: e }
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use serde_json::json;

	#[tokio::test]
	async fn invoke_resolves_builtins_by_name() {
		let registry = Registry::new();
		let verdict = registry
			.invoke("ContainsAll", &json!("a b"), &json!({"keywords": ["a", "b"]}))
			.await
			.unwrap();
		assert!(verdict.result);

		let verdict = registry
			.invoke("ContainsAll", &json!("a b"), &json!({"keywords": ["a", "c"]}))
			.await
			.unwrap();
		assert!(!verdict.result);
		assert!(verdict.reason.contains('c'));
	}

	#[tokio::test]
	async fn unknown_operation_is_fatal() {
		let registry = Registry::new();
		let err = registry.invoke("NoSuchOp", &json!("x"), &json!({})).await.unwrap_err();
		assert!(matches!(err, EvalError::UnknownOperation(_)));
	}

	#[tokio::test]
	async fn malformed_options_are_fatal() {
		let registry = Registry::new();
		let err = registry
			.invoke("LengthLessThan", &json!("x"), &json!({"max_length": "ten"}))
			.await
			.unwrap_err();
		assert!(matches!(err, EvalError::InvalidOptions { .. }));
	}

	#[tokio::test]
	async fn unrecognized_option_keys_are_ignored() {
		let registry = Registry::new();
		let verdict = registry
			.invoke(
				"Contains",
				&json!("hello world"),
				&json!({"keyword": "hello", "unrelated": true}),
			)
			.await
			.unwrap();
		assert!(verdict.result);
	}

	#[test]
	fn every_builtin_name_round_trips() {
		for op in OpKind::ALL {
			assert_eq!(OpKind::from_name(op.name()), Some(op));
		}
		assert_eq!(OpKind::from_name("ApiCall"), None);
	}

	struct AlwaysPass;

	#[async_trait]
	impl Check for AlwaysPass {
		fn name(&self) -> &'static str {
			"AlwaysPass"
		}

		async fn check(&self, _subject: &Value) -> Result<Verdict, EvalError> {
			Ok(Verdict::pass("always passes"))
		}
	}

	#[tokio::test]
	async fn custom_operations_register_once() {
		let mut registry = Registry::new();
		let factory: CheckFactory = Arc::new(|_options| Ok(Arc::new(AlwaysPass) as Arc<dyn Check>));
		registry.register("AlwaysPass", factory.clone()).unwrap();

		let verdict = registry.invoke("AlwaysPass", &json!("x"), &json!({})).await.unwrap();
		assert!(verdict.result);

		// No shadowing: neither a re-registration nor a built-in name.
		assert!(matches!(
			registry.register("AlwaysPass", factory.clone()),
			Err(EvalError::DuplicateOperation(_))
		));
		assert!(matches!(
			registry.register("IsJson", factory),
			Err(EvalError::DuplicateOperation(_))
		));
	}

	#[tokio::test]
	async fn identical_invocations_yield_identical_verdicts() {
		let registry = Registry::new();
		let options = json!({"keywords": "a, b"});
		let first = registry.invoke("ContainsAny", &json!("a"), &options).await.unwrap();
		let second = registry.invoke("ContainsAny", &json!("a"), &options).await.unwrap();
		assert_eq!(first, second);
	}
}
