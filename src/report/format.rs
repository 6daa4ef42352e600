//! Formatted terminal output for both entry points.
//!
//! Formatting lives here so the pipeline code stays free of presentation
//! details and output changes stay localized.

use crate::app::pipeline::IngestOutput;
use crate::domain::IncomeCategory;
use crate::report::ModelScoreReport;

/// Format the consolidated model score report.
pub fn format_score_report(report: &ModelScoreReport) -> String {
    let mut out = String::new();

    out.push_str("=== housing - Model Score Report ===\n");
    out.push_str(&format!(
        "\nLinear regression MAE: {} RMSE: {}\n",
        report.linear.mae, report.linear.rmse
    ));
    out.push_str(&format!("\nDecision tree RMSE: {}\n", report.tree.rmse));

    for section in &report.cv_sections {
        out.push_str(&format!("\n{} ({}):\n", section.title, section.key));
        if section.entries.is_empty() {
            out.push_str("  (no candidates)\n");
        }
        for entry in &section.entries {
            let params = serde_json::Value::Object(entry.params.clone());
            out.push_str(&format!("  {:<14.4} {params}\n", entry.rmse));
        }
    }

    out
}

/// Format the ingest run summary (split quality, correlations, feature layout).
pub fn format_ingest_summary(run: &IngestOutput) -> String {
    let mut out = String::new();
    let partition = &run.split.partition;

    out.push_str("=== housing - Ingest Summary ===\n");
    out.push_str(&format!(
        "Rows: {} | train={} | test={}\n",
        run.n_rows,
        partition.train.len(),
        partition.test.len()
    ));

    out.push_str("\nIncome category proportions:\n");
    out.push_str(
        format!(
            "{:<12} {:>9} {:>11} {:>9} {:>13} {:>14}\n",
            "income_cat", "Overall", "Stratified", "Random", "Rand. %error", "Strat. %error"
        )
        .trim_end(),
    );
    out.push('\n');
    for p in &run.split.proportions {
        out.push_str(
            format!(
                "{:<12} {:>9.6} {:>11.6} {:>9.6} {:>13.6} {:>14.6}\n",
                category_label(p.category),
                p.overall,
                p.stratified,
                p.random,
                p.random_error_pct(),
                p.stratified_error_pct()
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out.push_str("\nCorrelation with median_house_value:\n");
    for c in &run.correlations {
        out.push_str(&format!("  {:<20} {:>8.4}\n", c.column, c.r));
    }

    let stats = run.fitted.statistics();
    out.push_str(&format!(
        "\nFeatures: {} columns | reference category: {}\n",
        run.fitted.output_columns().len(),
        stats.vocabulary.reference
    ));
    out.push_str(&format!(
        "Undefined ratio cells: train={} test={}\n",
        run.train_undefined, run.test_undefined
    ));
    out.push_str(&format!("Artifacts: {}\n", run.artifacts.join(", ")));

    out
}

fn category_label(cat: IncomeCategory) -> String {
    let lo = IncomeCategory::EDGES[cat.index()];
    match IncomeCategory::EDGES.get(cat.index() + 1) {
        Some(hi) => format!("{} ({lo},{hi}]", cat.label()),
        None => format!("{} ({lo},inf)", cat.label()),
    }
}
