use std::sync::Arc;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use serde_json::Value;

use rubric_types::{CheckVerdict, Subject, SubjectResult, SuiteResult, Verdict};

use crate::check::Check;
use crate::config::CheckSpec;
use crate::datasource::DataSource;
use crate::registry::Registry;

pub struct SuiteBuilder {
	registry: Option<Arc<Registry>>,
	data_source: Option<Arc<dyn DataSource>>,
	checks: Vec<CheckSpec>,
	concurrency: usize,
}

impl SuiteBuilder {
	pub fn new() -> Self {
		Self {
			registry: None,
			data_source: None,
			checks: Vec::new(),
			concurrency: 8,
		}
	}

	pub fn registry(mut self, registry: Arc<Registry>) -> Self {
		self.registry = Some(registry);
		self
	}

	pub fn data_source(mut self, data_source: Arc<dyn DataSource>) -> Self {
		self.data_source = Some(data_source);
		self
	}

	pub fn check(mut self, op: impl Into<String>, options: Value) -> Self {
		self.checks.push(CheckSpec { op: op.into(), options });
		self
	}

	pub fn checks<I>(mut self, checks: I) -> Self
	where
		I: IntoIterator<Item = CheckSpec>,
	{
		self.checks.extend(checks);
		self
	}

	pub fn concurrency(mut self, n: usize) -> Self {
		self.concurrency = n.max(1);
		self
	}

	/// Resolves every configured check up front so unknown operations
	/// and malformed options surface before any subject is graded.
	pub fn build(self) -> Result<Suite> {
		let registry = self.registry.unwrap_or_else(|| Arc::new(Registry::new()));
		let data_source = self
			.data_source
			.ok_or_else(|| anyhow::anyhow!("data_source must be set"))?;
		if self.checks.is_empty() {
			anyhow::bail!("at least one check must be configured");
		}

		let mut checks = Vec::with_capacity(self.checks.len());
		for spec in self.checks {
			let handler = registry.resolve(&spec.op, &spec.options)?;
			checks.push((spec.op, handler));
		}

		Ok(Suite {
			data_source,
			checks,
			concurrency: self.concurrency,
		})
	}
}

impl Default for SuiteBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Applies a fixed list of configured checks to every subject from a
/// data source, with bounded concurrency across subjects.
pub struct Suite {
	data_source: Arc<dyn DataSource>,
	checks: Vec<(String, Arc<dyn Check>)>,
	concurrency: usize,
}

impl Suite {
	pub fn builder() -> SuiteBuilder {
		SuiteBuilder::new()
	}

	pub async fn run(&self) -> Result<SuiteResult> {
		let subjects = self.data_source.load().await?;
		let results = self.run_subjects(subjects).await;
		let summary = SuiteResult::summarize(&results);
		Ok(SuiteResult { cases: results, summary })
	}

	async fn run_subjects(&self, subjects: Vec<Subject>) -> Vec<SubjectResult> {
		let checks = self.checks.clone();
		let stream = stream::iter(subjects.into_iter()).map(move |subject| {
			let checks = checks.clone();
			async move {
				let mut verdicts = Vec::with_capacity(checks.len());
				for (op, check) in &checks {
					// A handler error on one subject is downgraded so
					// the rest of the run still completes.
					let verdict = match check.check(&subject.output).await {
						Ok(verdict) => verdict,
						Err(err) => {
							tracing::error!(op = %op, error = %err, "check failed to run");
							Verdict::fail(format!("check failed to run: {err}"))
						}
					};
					verdicts.push(CheckVerdict { op: op.clone(), verdict });
				}
				SubjectResult { subject, verdicts }
			}
		});

		stream.buffer_unordered(self.concurrency).collect().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::datasource::VecDataSource;
	use serde_json::json;

	#[tokio::test]
	async fn suite_grades_every_subject_with_every_check() {
		let subjects = vec![
			Subject::with_id("0", json!("the answer is 42")),
			Subject::with_id("1", json!("no numbers here")),
		];
		let suite = Suite::builder()
			.data_source(Arc::new(VecDataSource::new(subjects)))
			.check("Contains", json!({"keyword": "42"}))
			.check("OneLine", json!({}))
			.build()
			.unwrap();

		let result = suite.run().await.unwrap();
		assert_eq!(result.summary.total, 2);
		assert_eq!(result.summary.passed, 1);
		assert_eq!(result.cases.iter().flat_map(|c| &c.verdicts).count(), 4);
	}

	#[tokio::test]
	async fn build_rejects_unknown_operations_up_front() {
		let suite = Suite::builder()
			.data_source(Arc::new(VecDataSource::new(vec![])))
			.check("NoSuchOp", json!({}))
			.build();
		assert!(suite.is_err());
	}

	#[tokio::test]
	async fn handler_errors_downgrade_to_failed_verdicts() {
		// JsonEval on a subject that is not valid JSON text raises a
		// fatal error; the suite turns it into a failed verdict for
		// that subject instead of aborting the run.
		let subjects = vec![Subject::with_id("0", json!("{broken"))];
		let suite = Suite::builder()
			.data_source(Arc::new(VecDataSource::new(subjects)))
			.check(
				"JsonEval",
				json!({
					"expected_json": {"a": 1},
					"schema": {"type": "object"}
				}),
			)
			.build()
			.unwrap();

		let result = suite.run().await.unwrap();
		assert_eq!(result.summary.total, 1);
		assert_eq!(result.summary.passed, 0);
		assert!(result.cases[0].verdicts[0].verdict.reason.contains("check failed to run"));
	}

	#[tokio::test]
	async fn empty_check_list_is_rejected() {
		let suite = Suite::builder()
			.data_source(Arc::new(VecDataSource::new(vec![])))
			.build();
		assert!(suite.is_err());
	}
}
