//! Markdown and JSON report generation.
//!
//! This module renders a [`DashboardReport`] as text. All rounding, unit
//! suffixes and number formatting happen here and nowhere else.

use super::{DashboardReport, ReportMetadata, ViewOutcome};
use crate::analysis::{
    CumulativeImpact, EfficiencyIndex, EnergyDistribution, Equivalences, ModelComparison,
    QueryTypeProfile,
};
use crate::models::Metric;
use crate::usage::{BaseSource, UsageEstimate};
use anyhow::Result;

/// Format a value with a fixed number of decimals and thousands separators,
/// e.g. `7,000.00`.
pub fn format_value(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value);
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = digits.split_at(digits.find('.').unwrap_or(digits.len()));

    format!("{}{}{}", sign, group_thousands(int_part), frac_part)
}

/// Insert a comma every three digits. Non-numeric input (`inf`, `NaN`) is
/// returned unchanged.
fn group_thousands(int_part: &str) -> String {
    if int_part.len() <= 3 || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return int_part.to_string();
    }

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Format a value with its unit, e.g. `1.23 L`.
pub fn format_with_unit(value: f64, decimals: usize, unit: &str) -> String {
    format!("{} {}", format_value(value, decimals), unit)
}

/// Two decimals with trailing zeros dropped: `2.50` becomes `2.5`, `3.00`
/// becomes `3`.
pub fn format_quantity(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        fixed
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &DashboardReport, decimals: usize) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# EcoImpact Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));

    if let Some(ref usage) = report.usage {
        output.push_str(&generate_usage_section(usage, decimals));
    }

    output.push_str(&view_section(
        "Model Comparison",
        &report.model_comparison,
        |v| generate_model_comparison(v, decimals),
    ));
    output.push_str(&view_section(
        "Impact by Query Type",
        &report.query_type_profile,
        |v| generate_query_type_profile(v, decimals),
    ));
    output.push_str(&view_section(
        "Energy Distribution",
        &report.energy_distribution,
        |v| generate_energy_distribution(v, decimals),
    ));
    output.push_str(&view_section(
        "Equivalences",
        &report.equivalences,
        |v| generate_equivalences(v, decimals),
    ));
    output.push_str(&view_section(
        "Cumulative Impact",
        &report.cumulative_impact,
        |v| generate_cumulative_impact(v, decimals),
    ));
    output.push_str(&view_section(
        "Efficiency Index",
        &report.efficiency_index,
        |v| generate_efficiency_index(v, decimals),
    ));

    output.push_str(&generate_footer());

    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

fn anchor(title: &str) -> String {
    title.replace(' ', "-").to_lowercase()
}

/// Render a view, or a notice when it could not be computed.
fn view_section<T>(title: &str, outcome: &ViewOutcome<T>, render: impl Fn(&T) -> String) -> String {
    let mut section = format!("## {}\n\n", title);

    match outcome {
        ViewOutcome::Ready(view) => section.push_str(&render(view)),
        ViewOutcome::Unavailable { reason } => {
            section.push_str(&format!(
                "> ⚠️ Insufficient data to display this view: {}\n\n",
                reason
            ));
        }
    }

    section
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dataset:** {}\n", metadata.dataset));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Models:** {}\n", metadata.models));
    section.push_str(&format!("- **Query Types:** {}\n", metadata.query_types));
    section.push_str(&format!("- **Version:** {}\n", metadata.tool_version));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &DashboardReport) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");

    if report.usage.is_some() {
        toc.push_str("- [Usage Estimate](#usage-estimate)\n");
    }

    for title in [
        "Model Comparison",
        "Impact by Query Type",
        "Energy Distribution",
        "Equivalences",
        "Cumulative Impact",
        "Efficiency Index",
    ] {
        toc.push_str(&format!("- [{}](#{})\n", title, anchor(title)));
    }

    toc.push('\n');

    toc
}

fn generate_usage_section(usage: &UsageEstimate, decimals: usize) -> String {
    let mut section = String::new();

    section.push_str("## Usage Estimate\n\n");
    section.push_str(&format!("- **Model:** {}\n", usage.model));
    section.push_str(&format!(
        "- **Query Type:** {} ({})\n",
        usage.query_type,
        usage.query_type.profile().label
    ));
    section.push_str(&format!("  *{}*\n", usage.query_type.profile().hint));
    section.push_str(&format!(
        "- **Quantity:** {} {}\n",
        format_quantity(usage.quantity),
        usage.unit
    ));

    let source = match usage.base_source {
        BaseSource::Combination => "model and query type statistics",
        BaseSource::ModelAverage => "overall model statistics",
    };
    section.push_str(&format!("- **Based on:** {}\n\n", source));

    section.push_str("| Metric | Per Unit | Total |\n");
    section.push_str("|:---|---:|---:|\n");
    for metric in Metric::ALL {
        section.push_str(&format!(
            "| {} {} | {} | {} |\n",
            metric.emoji(),
            metric,
            format_with_unit(usage.base.get(metric), decimals, metric.unit()),
            format_with_unit(usage.total.get(metric), decimals, metric.unit()),
        ));
    }
    section.push('\n');

    section.push_str(&equivalence_lines(&usage.equivalences, decimals));

    section
}

fn generate_model_comparison(view: &ModelComparison, decimals: usize) -> String {
    let mut section = String::new();

    section.push_str("| Model |");
    for series in &view.series {
        section.push_str(&format!(
            " {} {} ({}) |",
            series.metric.emoji(),
            series.metric,
            series.unit
        ));
    }
    section.push('\n');
    section.push_str("|:---|");
    section.push_str(&"---:|".repeat(view.series.len()));
    section.push('\n');

    for (i, label) in view.labels.iter().enumerate() {
        section.push_str(&format!("| {} |", label));
        for series in &view.series {
            section.push_str(&format!(" {} |", format_value(series.values[i], decimals)));
        }
        section.push('\n');
    }

    section.push_str("| **Total** |");
    for series in &view.series {
        section.push_str(&format!(" **{}** |", format_value(series.total, decimals)));
    }
    section.push_str("\n\n");

    section
}

fn generate_query_type_profile(view: &QueryTypeProfile, decimals: usize) -> String {
    let mut section = String::new();

    section.push_str("| Query Type | Total Impact | Normalized (0-100) |\n");
    section.push_str("|:---|---:|---:|\n");

    for ((query_type, total), normalized) in view
        .labels
        .iter()
        .zip(&view.totals)
        .zip(&view.normalized)
    {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            query_type,
            format_value(*total, decimals),
            format_value(*normalized, decimals)
        ));
    }
    section.push('\n');

    section
}

fn generate_energy_distribution(view: &EnergyDistribution, decimals: usize) -> String {
    let mut section = String::new();

    section.push_str("| Query Type | Energy (kWh) | Share |\n");
    section.push_str("|:---|---:|---:|\n");

    for share in &view.shares {
        section.push_str(&format!(
            "| {} | {} | {}% |\n",
            share.query_type,
            format_value(share.energy, decimals),
            format_value(share.percentage, 1)
        ));
    }
    section.push_str(&format!(
        "| **Total** | **{}** | **100%** |\n\n",
        format_value(view.total_energy, decimals)
    ));

    section
}

fn generate_equivalences(view: &Equivalences, decimals: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!("*Reference: one query to {}*\n\n", view.subject));
    section.push_str(&equivalence_lines(view, decimals));

    section
}

fn equivalence_lines(view: &Equivalences, decimals: usize) -> String {
    let mut lines = String::new();

    lines.push_str(&format!(
        "- {} **{}**: {} glasses / {} bottles of 500ml / {} showers\n",
        Metric::Water.emoji(),
        format_with_unit(view.footprint.water(), decimals, Metric::Water.unit()),
        format_value(view.glasses, 2),
        format_value(view.bottles, 2),
        format_value(view.showers, 4)
    ));
    lines.push_str(&format!(
        "- {} **{}**: {} minutes of an LED bulb\n",
        Metric::Energy.emoji(),
        format_with_unit(view.footprint.energy(), decimals, Metric::Energy.unit()),
        format_value(view.led_minutes, 2)
    ));
    lines.push_str(&format!(
        "- {} **{}**: {} km by car\n\n",
        Metric::Carbon.emoji(),
        format_with_unit(view.footprint.carbon(), decimals, Metric::Carbon.unit()),
        format_value(view.car_km, 5)
    ));

    lines
}

fn generate_cumulative_impact(view: &CumulativeImpact, decimals: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!("*Base: {}*\n\n", view.subject));
    section.push_str("| Volume | 💧 Water (L) | ⚡ Energy (kWh) | 🌍 Carbon (gCO2e) |\n");
    section.push_str("|:---|---:|---:|---:|\n");

    for point in &view.points {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            point.label,
            format_value(point.impact.water(), decimals),
            format_value(point.impact.energy(), decimals),
            format_value(point.impact.carbon(), decimals)
        ));
    }
    section.push('\n');

    section
}

fn generate_efficiency_index(view: &EfficiencyIndex, decimals: usize) -> String {
    let mut section = String::new();

    section.push_str("Score = 100 / (water + energy + carbon). Higher is better.\n\n");
    section.push_str("| Rank | Model | Score | Efficiency |\n");
    section.push_str("|:---:|:---|---:|:---|\n");

    for (i, entry) in view.entries.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} | {} {} |\n",
            i + 1,
            entry.model,
            format_value(entry.score, decimals),
            entry.band.emoji(),
            entry.band
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by EcoImpact*\n");

    footer
}
