use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{AnalysisResult, AnalysisType, CohortResult, GaborGrangerSeries};

fn money(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("${v:.2}"))
}

fn width(range: Option<(f64, f64)>) -> Option<f64> {
    range.map(|(low, high)| high - low)
}

fn range_label(range: Option<(f64, f64)>) -> String {
    match range {
        Some((low, high)) => format!("{} - {}", money(Some(low)), money(Some(high))),
        None => "N/A".to_string(),
    }
}

fn peak(result: &CohortResult, series: GaborGrangerSeries) -> Option<f64> {
    result
        .data
        .peak(series.index())
        .map(|point| point.values[series.index()])
}

fn write_cohort(output: &mut String, analysis_type: AnalysisType, result: &CohortResult) {
    let _ = writeln!(output, "- Respondents: {}", result.respondents);

    match analysis_type {
        AnalysisType::VanWestendorp => {
            let metrics = result.metrics.clone().unwrap_or_default();
            let _ = writeln!(output, "- Optimal price point (OPP): {}", money(metrics.opp));
            let _ = writeln!(output, "- Indifference price point (IDP): {}", money(metrics.idp));
            let _ = writeln!(
                output,
                "- Point of marginal cheapness (PMC): {}",
                money(metrics.pmc_point)
            );
            let _ = writeln!(
                output,
                "- Point of marginal expensiveness (IPD): {}",
                money(metrics.ipd_point)
            );
            let _ = writeln!(
                output,
                "- Acceptable range: {} (width {})",
                range_label(result.range),
                money(width(result.range))
            );
            if !metrics.fallbacks.is_empty() {
                let _ = writeln!(
                    output,
                    "- No crossing found for {}; shown at the price-range midpoint",
                    metrics.fallbacks.join(", ")
                );
            }
        }
        AnalysisType::GaborGranger => {
            let _ = writeln!(output, "- Optimal price: {}", money(result.optimal));
            let _ = writeln!(
                output,
                "- Tested range: {} (width {})",
                range_label(result.range),
                money(width(result.range))
            );
            let _ = writeln!(
                output,
                "- Peak purchase intent: {}",
                peak(result, GaborGrangerSeries::Intent)
                    .map_or_else(|| "N/A".to_string(), |v| format!("{v:.1}%"))
            );
            let _ = writeln!(
                output,
                "- Peak revenue per respondent: {}",
                money(peak(result, GaborGrangerSeries::Revenue))
            );
        }
    }
}

pub fn build_report(
    project: Option<&str>,
    created_at: Option<DateTime<Utc>>,
    result: &AnalysisResult,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Pricing Analysis Report");
    let _ = writeln!(
        output,
        "{} analysis for {}",
        result.analysis_type.label(),
        project.unwrap_or("unnamed project")
    );
    if let Some(created_at) = created_at {
        let _ = writeln!(output, "Run at {}", created_at.format("%Y-%m-%d %H:%M UTC"));
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overall Results");
    write_cohort(&mut output, result.analysis_type, &result.overall_results);

    if result.segment_results.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No segment results for this run.");
    }

    for segment in &result.segment_results {
        for level in &segment.levels {
            let _ = writeln!(output);
            let _ = writeln!(output, "## {}: {}", segment.segment_variable, level.name);
            write_cohort(&mut output, result.analysis_type, &level.result);
        }
    }

    output
}
