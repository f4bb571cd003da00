//! HTML page rendering for the report store
//!
//! Every page (the overview and each suite page) is produced from the same
//! template by substituting `{KEY}` placeholders.

use rustc_hash::FxHashMap as HashMap;

use super::SuiteResult;
use crate::suite::{escape_html, name_to_filename, result_labels};

/// Page title
pub const KEY_TITLE: &str = "TITLE";
/// `<span>` with the overall PASSED/FAILED state
pub const KEY_OVERALL_RESULT: &str = "OVERALL-RESULT";
/// `<tr>` header of the result table
pub const KEY_RESULT_HEADER: &str = "SUITE-RESULT-HEADER";
/// `<tr>` rows of the result table
pub const KEY_RESULT_ROWS: &str = "SUITE-RESULT-ROWS";

/// Title of the top-level overview page
pub const OVERVIEW_TITLE: &str = "Test Suits Overview";

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{TITLE}</title>
<style>
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 20px; background: #f5f5f5; color: #333; }
h1 { color: #1a1a2e; }
table { border-collapse: collapse; width: 100%; background: white; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
th, td { padding: 8px 12px; border: 1px solid #e0e0e0; text-align: left; vertical-align: top; }
th { background: #f0f0f0; }
td img { max-width: 100%; image-rendering: pixelated; }
tr.passed { background: #e8f5e9; }
tr.failed { background: #ffebee; }
span.passed, tr.passed td.result { color: #2e7d32; font-weight: bold; }
span.failed, tr.failed td.result { color: #c62828; font-weight: bold; }
</style>
</head>
<body>
<h1>{TITLE}</h1>
<p>Result: {OVERALL-RESULT}</p>
<table>
{SUITE-RESULT-HEADER}
{SUITE-RESULT-ROWS}
</table>
</body>
</html>
"#;

/// Substitute every `{KEY}` placeholder of `template` with its value.
///
/// Placeholders without a value are left untouched.
pub fn render_template(template: &str, values: &HashMap<&str, String>) -> String {
    let mut html = template.to_string();
    for (key, value) in values {
        html = html.replace(&format!("{{{}}}", key), value);
    }
    html
}

/// Render a full page from its four parts.
pub fn render_page(title: &str, overall_result: &str, header: &str, rows: &str) -> String {
    let mut values = HashMap::default();
    values.insert(KEY_TITLE, escape_html(title));
    values.insert(KEY_OVERALL_RESULT, overall_result.to_string());
    values.insert(KEY_RESULT_HEADER, header.to_string());
    values.insert(KEY_RESULT_ROWS, rows.to_string());
    render_template(PAGE_TEMPLATE, &values)
}

/// `<span class="passed">PASSED</span>` or its failed counterpart
pub fn overall_result_markup(passed: bool) -> String {
    let (class, label) = result_labels(passed);
    format!("<span class=\"{}\">{}</span>", class, label)
}

/// Overview page listing every suite found under the report root.
pub fn render_overview(suites: &[SuiteResult]) -> String {
    let passed = suites.iter().all(|s| s.passed);
    let rows: String = suites.iter().map(overview_row).collect();
    render_page(
        OVERVIEW_TITLE,
        &overall_result_markup(passed),
        "<tr><th>Suit</th><th width=\"100\">Result</th></tr>",
        &rows,
    )
}

fn overview_row(suite: &SuiteResult) -> String {
    let (class, label) = result_labels(suite.passed);
    format!(
        "<tr class=\"{}\"><td><a href=\"{}/report.html\">{}</a></td><td class=\"result\">{}</td></tr>",
        class,
        name_to_filename(&suite.name),
        escape_html(&suite.name),
        label
    )
}

/// Page of a single suite: one row per recorded test, in insertion order.
pub fn render_suite_page(title: &str, header: &str, result: &SuiteResult) -> String {
    let rows: Vec<&str> = result.tests.iter().map(|t| t.report_html.as_str()).collect();
    render_page(
        title,
        &overall_result_markup(result.passed),
        header,
        &rows.join("\n"),
    )
}
