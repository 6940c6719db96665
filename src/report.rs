//! Console rendering of probe results.

use std::fmt::Write;

use crate::config::CheckConfig;
use crate::probe::{CheckOutcome, ProbeReport};
use crate::utils::{format_human_timestamp, max_display_width, pad_display};

const SEPARATOR_WIDTH: usize = 50;

pub fn render_report(report: &ProbeReport) -> String {
    let mut out = String::new();
    let separator = "=".repeat(SEPARATOR_WIDTH);

    let _ = writeln!(
        out,
        "API probe started at {}",
        format_human_timestamp(&report.started_at)
    );
    let _ = writeln!(out, "{separator}");

    for outcome in &report.outcomes {
        out.push_str(&render_outcome(outcome));
        out.push('\n');
    }

    let _ = writeln!(out, "{separator}");
    out.push_str(&render_summary(report));
    out
}

pub fn render_outcome(outcome: &CheckOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "=== {} ({} via {}) ===",
        outcome.name, outcome.view, outcome.endpoint
    );

    let result = &outcome.result;
    if !result.success {
        let reason = result.error_message.as_deref().unwrap_or("unknown failure");
        let _ = writeln!(out, "✗ {} failed: {}", outcome.name, reason);
        return out;
    }

    // The raw dump is printed verbatim below its label rather than aligned.
    if let Some(raw) = result.field("raw") {
        let _ = writeln!(out, "{raw}");
        if result.field("truncated").is_some() {
            let _ = writeln!(out, "... (truncated)");
        }
    } else {
        let width = max_display_width(result.fields.iter().map(|(label, _)| label.as_str()));
        for (label, value) in &result.fields {
            let _ = writeln!(out, "  {} : {}", pad_display(label, width), value);
        }
    }

    let _ = writeln!(out, "✓ {} passed", outcome.name);
    out
}

pub fn render_summary(report: &ProbeReport) -> String {
    let mut out = String::from("\nSummary:\n");
    let width = max_display_width(report.outcomes.iter().map(|o| o.name.as_str()));

    for outcome in &report.outcomes {
        let status = if outcome.passed() { "✓ passed" } else { "✗ failed" };
        let _ = writeln!(out, "{}: {}", pad_display(&outcome.name, width), status);
    }

    let _ = writeln!(
        out,
        "\n{}/{} checks passed",
        report.passed_count(),
        report.outcomes.len()
    );
    if report.all_passed() {
        out.push_str("All API checks passed.\n");
    } else {
        out.push_str("Some API checks failed, please inspect.\n");
    }
    out
}

pub fn render_checks(checks: &[CheckConfig]) -> String {
    let mut out = String::new();
    let width = max_display_width(checks.iter().map(|c| c.name.as_str()));
    for check in checks {
        let query = serde_json::to_string(&check.query).unwrap_or_default();
        let _ = writeln!(
            out,
            "{}  {:<16}  {}  {}",
            pad_display(&check.name, width),
            check.view.as_str(),
            check.endpoint,
            query
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::{InspectionResult, View};
    use chrono::Local;

    fn outcome(name: &str, result: InspectionResult) -> CheckOutcome {
        CheckOutcome {
            name: name.to_string(),
            endpoint: "YahooFinance/get_stock_chart".to_string(),
            view: View::ChartSummary,
            result,
        }
    }

    #[test]
    fn aligns_summary_fields() {
        let rendered = render_outcome(&outcome(
            "chart",
            InspectionResult::success(vec![
                ("symbol".to_string(), "AAPL".to_string()),
                ("regularMarketPrice".to_string(), "229.87".to_string()),
            ]),
        ));

        assert!(rendered.contains("  symbol             : AAPL\n"), "{rendered}");
        assert!(rendered.contains("  regularMarketPrice : 229.87\n"), "{rendered}");
        assert!(rendered.ends_with("✓ chart passed\n"));
    }

    #[test]
    fn failure_shows_reason() {
        let rendered = render_outcome(&outcome("holders", InspectionResult::failure("no data")));
        assert!(rendered.contains("✗ holders failed: no data"));
    }

    #[test]
    fn summary_reflects_aggregate() {
        let report = ProbeReport {
            started_at: Local::now(),
            outcomes: vec![
                outcome("chart", InspectionResult::success(Vec::new())),
                outcome("holders", InspectionResult::failure("no data")),
            ],
        };

        let rendered = render_report(&report);
        assert!(rendered.contains("chart  : ✓ passed"), "{rendered}");
        assert!(rendered.contains("holders: ✗ failed"), "{rendered}");
        assert!(rendered.contains("1/2 checks passed"));
        assert!(rendered.ends_with("Some API checks failed, please inspect.\n"));
    }
}
