//! rubric-core: rule-evaluation engine for grading text and JSON outputs.
//! Resolve a named check through the registry, run it against a subject,
//! get back a pass/fail verdict with a human-readable reason.
//! See `examples/simple.rs` for a quickstart.

pub mod check;
pub mod config;
pub mod credentials;
pub mod datasource;
pub mod error;
pub mod json_path;
pub mod judge;
pub mod registry;
pub mod report;
pub mod schema;
pub mod similarity;
pub mod suite;
pub mod testing;

pub mod checks {
	pub mod contains;
	pub mod json;
	pub mod json_eval;
	pub mod link;
	pub mod regex;
	pub mod text;
}

pub use check::{subject_text, CaseSensitivity, Check, Keywords};
pub use checks::{
	contains::{ContainsKeyword, KeywordSearch},
	json::{ContainsJson, IsJson},
	json_eval::{JsonEval, JsonEvalParams},
	link::{ContainsLink, ContainsValidLink, HttpProber, NoInvalidLinks, UrlProber},
	regex::{ContainsEmail, IsEmail, RegexCheck},
	text::{
		EndsWith, LengthBetween, LengthGreaterThan, LengthLessThan, OneLine, StartsWith,
		TextEquals,
	},
};
pub use config::{CheckSpec, SuiteConfig};
pub use datasource::{DataSource, JsonlDataSource, VecDataSource};
pub use error::EvalError;
pub use json_path::{extract_json_path, Extracted};
pub use judge::{ChatMessage, JudgeModel, JudgeRequest};
pub use registry::{CheckFactory, OpKind, Registry};
pub use similarity::{cosine_similarity, EmbeddingSimilarity, TextSimilarity};
pub use suite::{Suite, SuiteBuilder};
pub use rubric_types::{
	CheckVerdict, Subject, SubjectResult, SuiteResult, SuiteSummary, ValidatingFunction,
	ValidationSpec, Verdict,
};
