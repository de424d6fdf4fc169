//! Text rendering of a report bundle

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use deal_core::{OutcomeStatus, RecordSource, ReportBundle};

fn status_label(status: &OutcomeStatus) -> &'static str {
    match status {
        OutcomeStatus::Complete => "complete",
        OutcomeStatus::Partial { .. } => "partial",
        OutcomeStatus::Fallback { .. } => "fallback",
    }
}

fn source_label(source: &RecordSource) -> String {
    match source {
        RecordSource::Extracted => "extracted from document".to_string(),
        RecordSource::Demo { profile } => format!("demo profile '{profile}'"),
        RecordSource::Defaulted { reason } => format!("default template ({reason})"),
    }
}

/// Human-readable report
pub fn text(bundle: &ReportBundle) -> String {
    let report = &bundle.report;
    let mut out = String::new();

    out.push_str(&format!(
        "{}: {} (score {:.2}/10, confidence {:.0}%)\n",
        report.company, report.tier, report.weighted_score, report.confidence
    ));
    out.push_str(&format!(
        "Run {} | record {}\n\n",
        bundle.run_id,
        source_label(&bundle.source)
    ));
    out.push_str(&report.executive_summary);
    out.push_str("\n\n");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Analysis",
            "Score",
            "Weight",
            "Contribution",
            "Confidence",
            "Status",
            "Headline",
        ]);
    for score in &report.breakdown {
        let outcome = bundle.outcome(score.task);
        table.add_row(vec![
            Cell::new(score.task.label()),
            Cell::new(format!("{:.2}", score.raw_score)),
            Cell::new(format!("{:.0}%", score.weight * 100.0)),
            Cell::new(format!("{:.2}", score.contribution)),
            Cell::new(format!("{:.0}%", score.confidence)),
            Cell::new(outcome.map_or("missing", |o| status_label(&o.status))),
            Cell::new(outcome.map_or("", |o| o.headline.as_str())),
        ]);
    }
    out.push_str(&table.to_string());
    out.push_str("\n\nTop insights:\n");
    for (i, insight) in report.top_insights.iter().enumerate() {
        out.push_str(&format!(
            "  {}. [{:?}, impact {}] {}: {}\n",
            i + 1,
            insight.kind,
            insight.impact_rank,
            insight.insight,
            insight.implication
        ));
    }

    if !report.risks.is_empty() {
        out.push_str("\nRisks:\n");
        for risk in &report.risks {
            out.push_str(&format!("  - {risk}\n"));
        }
    }

    out.push_str("\nNext steps:\n");
    for step in &report.next_steps {
        out.push_str(&format!("  - {step}\n"));
    }
    out
}
