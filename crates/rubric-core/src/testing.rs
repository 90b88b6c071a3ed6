use anyhow::Result;
use rubric_types::SuiteResult;

/// Helper to assert a suite's pass rate meets a threshold.
///
/// Use this in your `#[tokio::test]` functions.
///
/// # Example
/// ```ignore
/// #[tokio::test]
/// async fn test_my_outputs() -> Result<()> {
///     let suite = Suite::builder()
///         .data_source(data)
///         .check("ContainsAll", json!({"keywords": ["refund", "apology"]}))
///         .build()?;
///
///     let result = suite.run().await?;
///
///     // Assert 80% pass rate
///     assert_suite_pass_rate(&result, 0.8)?;
///
///     Ok(())
/// }
/// ```
pub fn assert_suite_pass_rate(result: &SuiteResult, min_pass_rate: f64) -> Result<()> {
	if result.summary.pass_rate < min_pass_rate {
		anyhow::bail!(
			"Evaluation failed: pass rate {:.1}% is below threshold {:.1}%\n{}",
			result.summary.pass_rate * 100.0,
			min_pass_rate * 100.0,
			result.summary_table()
		);
	}
	Ok(())
}

/// Helper to assert every subject passed every check.
pub fn assert_suite_all_passed(result: &SuiteResult) -> Result<()> {
	if result.summary.passed != result.summary.total {
		anyhow::bail!(
			"Evaluation failed: {}/{} subjects passed\n{}",
			result.summary.passed,
			result.summary.total,
			result.summary_table()
		);
	}
	Ok(())
}
