use thiserror::Error;

/// Fatal configuration and caller errors.
///
/// Disagreements about content quality are never raised; they surface as
/// failed [`rubric_types::Verdict`]s. Everything here indicates a bug in
/// the caller or its configuration and propagates after being logged.
#[derive(Debug, Error)]
pub enum EvalError {
	#[error("unknown operation: {0}")]
	UnknownOperation(String),

	#[error("operation {0} is already registered")]
	DuplicateOperation(String),

	#[error("invalid options for {op}: {source}")]
	InvalidOptions {
		op: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid regex pattern: {0}")]
	InvalidPattern(#[from] regex::Error),

	#[error("input is not valid JSON: {0}")]
	InvalidJson(#[source] serde_json::Error),

	#[error("invalid schema: {0}")]
	InvalidSchema(String),

	#[error("no OpenAI API key provided")]
	MissingApiKey,

	#[error("no {0} capability configured")]
	MissingCapability(&'static str),

	#[error("embedding request failed: {0}")]
	Embedding(String),

	#[error("judge request failed: {0}")]
	Judge(String),

	#[error("{url} is unreachable: {message}")]
	Unreachable { url: String, message: String },
}
