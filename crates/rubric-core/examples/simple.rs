use std::sync::Arc;

use rubric_core::{Registry, Subject, Suite, VecDataSource};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Example 1: invoke a single operation by name.
    let registry = Registry::new();
    let verdict = registry
        .invoke(
            "ContainsAll",
            &json!("Thanks for reaching out! A refund is on its way."),
            &json!({"keywords": ["thanks", "refund"]}),
        )
        .await?;
    println!("{}: {}", verdict.result, verdict.reason);

    // Example 2: grade a batch of outputs with a suite of checks.
    let subjects = vec![
        Subject::with_id("0", json!("Hello! Write to support@example.com for help.")),
        Subject::with_id("1", json!("Hello!\nGoodbye!")),
    ];
    let suite = Suite::builder()
        .data_source(Arc::new(VecDataSource::new(subjects)))
        .check("ContainsEmail", json!({}))
        .check("OneLine", json!({}))
        .concurrency(8)
        .build()?;

    let result = suite.run().await?;
    println!("{}", result.summary_table());

    // Example 3: structured comparison of two JSON documents.
    let verdict = registry
        .invoke(
            "JsonEval",
            &json!({"city": "Paris", "country": "France"}),
            &json!({
                "expected_json": {"city": "Paris", "country": "France"},
                "schema": {
                    "type": "object",
                    "required": ["city", "country"]
                },
                "validations": [
                    {"validating_function": "Equals", "json_path": "city"}
                ]
            }),
        )
        .await?;
    println!("{}: {}", verdict.result, verdict.reason);

    Ok(())
}
