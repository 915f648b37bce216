use std::sync::Arc;

use crate::model::TestResult;
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::report::summary::TestSummary;

/// Format a single progress line for display. Deterministic, unit-testable.
#[must_use]
pub fn format_progress_line(done: usize, total: usize) -> String {
    format!("Running test {}/{}...", done, total)
}

/// Prints one progress line per finished case. No sink for single-case runs.
pub fn default_progress_sink(total: usize) -> Option<ProgressSink> {
    if total <= 1 {
        return None;
    }
    Some(Arc::new(|ev: ProgressEvent| {
        if ev.total == 0 {
            return;
        }
        eprintln!("{}", format_progress_line(ev.done, ev.total));
    }))
}

/// One line per result, e.g. `✅ select posts: expected 200, got 200`.
#[must_use]
pub fn format_result_line(result: &TestResult) -> String {
    let icon = if result.success { "✅" } else { "❌" };
    let mut line = format!(
        "{} {} {}: expected {}, got {}",
        icon, result.test.method, result.test.path, result.expected, result.actual
    );
    let label = result.test.label();
    if !label.is_empty() {
        line.push_str(&format!(" ({label})"));
    }
    if let Some(err) = &result.error {
        line.push_str(&format!("\n      error: {err}"));
    }
    line
}

/// Summary block printed at the end of `run` and `exec`.
#[must_use]
pub fn format_summary(summary: &TestSummary) -> String {
    let mut out = String::new();
    out.push_str("\n📊 RLS Test Report\n");
    if let Some(table) = &summary.table {
        out.push_str(&format!("Table: {table}\n"));
    }
    out.push_str(&format!(
        "Total: {}  Passed: {}  Failed: {}  Coverage: {:.2}%  Time: {}ms\n",
        summary.total, summary.passed, summary.failed, summary.coverage, summary.time_in_ms
    ));

    if !summary.details.is_empty() {
        out.push('\n');
        for r in &summary.details {
            out.push_str(&format!("  {}\n", format_result_line(r)));
        }
    }

    let hints: Vec<_> = summary
        .failures
        .iter()
        .filter_map(|f| f.suggestion.as_deref().map(|s| (f, s)))
        .collect();
    if !hints.is_empty() {
        out.push_str("\n🔧 Suggested fixes:\n");
        for (f, sql) in hints {
            out.push_str(&format!(
                "  {} {}:\n{}\n",
                f.result.test.method,
                f.result.test.path,
                indent(sql, 4)
            ));
        }
    }
    out
}

pub fn print_summary(summary: &TestSummary) {
    eprint!("{}", format_summary(summary));
}

fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|l| format!("{pad}{l}"))
        .collect::<Vec<_>>()
        .join("\n")
}
