//! Report export formats
//!
//! Renders a terminal job's [`AnalysisReport`] for consumption outside the
//! engine: pretty JSON for API and tooling use, and a standalone HTML page
//! for humans.

use crate::snapshot::AnalysisReport;

/// Render a report as pretty-printed JSON.
pub fn render_json(report: &AnalysisReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Render a report as a self-contained HTML document.
pub fn render_html(report: &AnalysisReport) -> String {
    let mut rows = String::new();
    for issue in &report.issues {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}:{}</td><td class=\"sev-{}\">{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&issue.id),
            escape(&issue.file),
            issue.line,
            issue.severity,
            issue.severity,
            issue.category,
            escape(&issue.rule),
            escape(&issue.message),
        ));
    }

    let mut warnings = String::new();
    if !report.warnings.is_empty() {
        warnings.push_str("<h2>Warnings</h2>\n<ul>\n");
        for warning in &report.warnings {
            warnings.push_str(&format!("<li>{}</li>\n", escape(&warning.message)));
        }
        warnings.push_str("</ul>\n");
    }

    let summary = &report.summary;
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Review report {job_id}</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #ccc; padding: 0.3rem 0.6rem; text-align: left; }}
.sev-critical {{ color: #b00020; font-weight: bold; }}
.sev-high {{ color: #d35400; }}
.sev-medium {{ color: #b8860b; }}
.sev-low {{ color: #555; }}
</style>
</head>
<body>
<h1>Review report</h1>
<p>Job <code>{job_id}</code> — {state} — {total} issues across {affected} files in {elapsed}s</p>
<p>critical: {critical} · high: {high} · medium: {medium} · low: {low}</p>
<table>
<thead><tr><th>Id</th><th>Location</th><th>Severity</th><th>Category</th><th>Rule</th><th>Message</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
{warnings}</body>
</html>
"#,
        job_id = report.job_id,
        state = report.state,
        total = summary.total,
        affected = summary.affected_files,
        elapsed = report.elapsed_secs,
        critical = summary.critical,
        high = summary.high,
        medium = summary.medium,
        low = summary.low,
        rows = rows,
        warnings = warnings,
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
