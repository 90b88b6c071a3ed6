use rubric_types::SuiteResult;

pub fn generate_html_report(result: &SuiteResult) -> String {
    let mut rows = String::new();

    for cr in &result.cases {
        let id = cr.subject.id.as_deref().unwrap_or("-");
        let all_passed = cr.passed();
        let passed_icon = if all_passed { "✓" } else { "✗" };
        let row_class = if all_passed { "pass" } else { "fail" };

        let output_str = serde_json::to_string_pretty(&cr.subject.output).unwrap_or_default();

        let mut verdicts_html = String::new();
        for cv in &cr.verdicts {
            let badge_class = if cv.verdict.result { "pass" } else { "fail" };
            verdicts_html.push_str(&format!(
                r#"<span class="badge {}" title="{}">{}</span>"#,
                badge_class,
                html_escape(&cv.verdict.reason),
                cv.op
            ));
        }

        let first_failure = cr
            .verdicts
            .iter()
            .find(|v| !v.verdict.result)
            .map(|v| format!("{}: {}", v.op, v.verdict.reason))
            .unwrap_or_default();

        rows.push_str(&format!(
            r#"
            <tr class="{}">
                <td>{}</td>
                <td class="icon">{}</td>
                <td><pre>{}</pre></td>
                <td class="verdicts">{}</td>
                <td>{}</td>
            </tr>
            "#,
            row_class,
            id,
            passed_icon,
            html_escape(&output_str),
            verdicts_html,
            html_escape(&first_failure),
        ));
    }

    let pass_rate_class = if result.summary.pass_rate >= 0.8 {
        "good"
    } else if result.summary.pass_rate >= 0.5 {
        "warn"
    } else {
        "bad"
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Rubric Report</title>
    <style>
        * {{ box-sizing: border-box; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
            margin: 0;
            padding: 20px;
            background: #f5f5f5;
        }}
        .container {{
            max-width: 1400px;
            margin: 0 auto;
            background: white;
            padding: 30px;
            border-radius: 8px;
            box-shadow: 0 2px 8px rgba(0,0,0,0.1);
        }}
        h1 {{
            margin: 0 0 10px 0;
            color: #333;
        }}
        .summary {{
            display: flex;
            gap: 20px;
            margin: 20px 0 30px 0;
            padding: 20px;
            background: #f8f9fa;
            border-radius: 6px;
        }}
        .summary-item {{
            flex: 1;
        }}
        .summary-label {{
            font-size: 12px;
            color: #666;
            text-transform: uppercase;
            letter-spacing: 0.5px;
            margin-bottom: 5px;
        }}
        .summary-value {{
            font-size: 28px;
            font-weight: 600;
            color: #333;
        }}
        .summary-value.good {{ color: #28a745; }}
        .summary-value.warn {{ color: #ffc107; }}
        .summary-value.bad {{ color: #dc3545; }}
        table {{
            width: 100%;
            border-collapse: collapse;
            margin-top: 20px;
        }}
        th {{
            background: #343a40;
            color: white;
            padding: 12px;
            text-align: left;
            font-weight: 600;
            font-size: 13px;
            text-transform: uppercase;
            letter-spacing: 0.5px;
        }}
        td {{
            padding: 12px;
            border-bottom: 1px solid #dee2e6;
            vertical-align: top;
        }}
        tr.pass {{ background: #f0f9f4; }}
        tr.fail {{ background: #fef3f2; }}
        tr:hover {{ background: #e9ecef; }}
        .icon {{
            text-align: center;
            font-size: 18px;
            width: 50px;
        }}
        pre {{
            margin: 0;
            padding: 8px;
            background: #f8f9fa;
            border-radius: 4px;
            font-size: 12px;
            max-height: 150px;
            overflow: auto;
            white-space: pre-wrap;
            word-break: break-word;
        }}
        .verdicts {{
            display: flex;
            flex-wrap: wrap;
            gap: 6px;
        }}
        .badge {{
            padding: 4px 8px;
            border-radius: 4px;
            font-size: 11px;
            font-weight: 600;
            white-space: nowrap;
        }}
        .badge.pass {{
            background: #d4edda;
            color: #155724;
        }}
        .badge.fail {{
            background: #f8d7da;
            color: #721c24;
        }}
        .timestamp {{
            color: #6c757d;
            font-size: 14px;
            margin-bottom: 20px;
        }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Rubric Report</h1>
        <div class="timestamp">Generated: {}</div>

        <div class="summary">
            <div class="summary-item">
                <div class="summary-label">Total Subjects</div>
                <div class="summary-value">{}</div>
            </div>
            <div class="summary-item">
                <div class="summary-label">Passed</div>
                <div class="summary-value good">{}</div>
            </div>
            <div class="summary-item">
                <div class="summary-label">Failed</div>
                <div class="summary-value bad">{}</div>
            </div>
            <div class="summary-item">
                <div class="summary-label">Pass Rate</div>
                <div class="summary-value {}">{:.1}%</div>
            </div>
        </div>

        <table>
            <thead>
                <tr>
                    <th>ID</th>
                    <th>Status</th>
                    <th>Output</th>
                    <th>Checks</th>
                    <th>First Failure</th>
                </tr>
            </thead>
            <tbody>
                {}
            </tbody>
        </table>
    </div>
</body>
</html>"#,
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        result.summary.total,
        result.summary.passed,
        result.summary.total - result.summary.passed,
        pass_rate_class,
        result.summary.pass_rate * 100.0,
        rows
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubric_types::{CheckVerdict, Subject, SubjectResult, Verdict};
    use serde_json::json;

    #[test]
    fn report_renders_verdict_badges() {
        let cases = vec![SubjectResult {
            subject: Subject::with_id("0", json!("<hello>")),
            verdicts: vec![CheckVerdict {
                op: "Contains".into(),
                verdict: Verdict::fail("keyword not found in output: hi"),
            }],
        }];
        let summary = SuiteResult::summarize(&cases);
        let html = generate_html_report(&SuiteResult { cases, summary });
        assert!(html.contains("Rubric Report"));
        assert!(html.contains("&lt;hello&gt;"));
        assert!(html.contains("keyword not found in output: hi"));
    }
}
