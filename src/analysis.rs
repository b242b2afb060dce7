use std::collections::HashMap;

use crate::config::{AnalysisPlan, MappingConfig};
use crate::curve::{build_gabor_granger, build_van_westendorp};
use crate::metrics::{gabor_granger_result, van_westendorp_result};
use crate::models::{AnalysisResult, CohortResult, ResponseRow, SurveyTable};
use crate::segment::run_segment;
use crate::tabulate::{tabulate_gabor_granger, tabulate_van_westendorp};

/// Tabulate, build the curve and derive metrics for one cohort.
pub fn run_cohort(cohort: &[&ResponseRow], mapping: &MappingConfig) -> CohortResult {
    match mapping {
        MappingConfig::VanWestendorp(config) => {
            let table = tabulate_van_westendorp(cohort, config);
            van_westendorp_result(build_van_westendorp(&table), table.respondents)
        }
        MappingConfig::GaborGranger(config) => {
            let table = tabulate_gabor_granger(cohort, config);
            gabor_granger_result(build_gabor_granger(&table), table.respondents)
        }
    }
}

/// Overall results plus one subtree per segment variable. Pure: the table is
/// only read.
pub fn analyze(table: &SurveyTable, plan: &AnalysisPlan) -> AnalysisResult {
    if let Some(column) = plan.respondent_id.as_deref() {
        let duplicates = duplicate_respondents(&table.rows, column);
        if duplicates > 0 {
            tracing::warn!(column, duplicates, "respondent ids appear more than once");
        }
    }

    let everyone: Vec<&ResponseRow> = table.rows.iter().collect();
    let overall_results = run_cohort(&everyone, &plan.mapping);
    tracing::info!(
        analysis_type = %plan.mapping.analysis_type(),
        rows = table.rows.len(),
        respondents = overall_results.respondents,
        optimal = ?overall_results.optimal,
        "overall cohort analysed"
    );

    let segment_results = plan
        .segments
        .iter()
        .filter_map(|variable| run_segment(&table.rows, variable, &plan.mapping))
        .collect();

    AnalysisResult {
        analysis_type: plan.mapping.analysis_type(),
        overall_results,
        segment_results,
    }
}

fn duplicate_respondents(rows: &[ResponseRow], column: &str) -> usize {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for id in rows.iter().filter_map(|row| row.get(column)) {
        *seen.entry(id).or_insert(0) += 1;
    }
    seen.values().map(|count| count - 1).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GaborGrangerConfig, PricePointColumn, VanWestendorpConfig};
    use crate::models::AnalysisType;

    fn vw_plan(segments: &[&str]) -> AnalysisPlan {
        AnalysisPlan {
            mapping: MappingConfig::VanWestendorp(VanWestendorpConfig {
                too_cheap: "tc".into(),
                cheap: "c".into(),
                expensive: "e".into(),
                too_expensive: "te".into(),
            }),
            segments: segments.iter().map(|s| s.to_string()).collect(),
            respondent_id: Some("id".into()),
        }
    }

    fn table(rows: &[[&str; 7]]) -> SurveyTable {
        let headers = ["id", "gender", "region", "tc", "c", "e", "te"];
        SurveyTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|cells| headers.iter().copied().zip(cells.iter().copied()).collect())
                .collect(),
        }
    }

    #[test]
    fn overall_and_segment_trees_are_assembled() {
        let table = table(&[
            ["1", "F", "Asia", "5", "10", "25", "40"],
            ["2", "M", "Asia", "10", "15", "30", "45"],
            ["3", "F", "Europe", "8", "12", "20", "35"],
            ["4", "M", "", "6", "14", "22", "50"],
        ]);

        let result = analyze(&table, &vw_plan(&["gender", "region"]));

        assert_eq!(result.analysis_type, AnalysisType::VanWestendorp);
        assert_eq!(result.overall_results.respondents, 4);
        assert!(result.overall_results.metrics.is_some());

        assert_eq!(result.segment_results.len(), 2);
        let gender = &result.segment_results[0];
        assert_eq!(gender.segment_variable, "gender");
        let names: Vec<&str> = gender.levels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["F", "M"]);

        let region = &result.segment_results[1];
        let names: Vec<&str> = region.levels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Asia", "Europe"]);
        assert_eq!(region.levels[0].result.respondents, 2);
    }

    #[test]
    fn each_curve_has_one_point_per_distinct_price() {
        let table = table(&[
            ["1", "F", "Asia", "5", "10", "20", "30"],
            ["2", "M", "Asia", "10", "10", "20", "oops"],
        ]);

        let result = analyze(&table, &vw_plan(&[]));

        let prices: Vec<f64> = result
            .overall_results
            .data
            .points()
            .iter()
            .map(|p| p.price)
            .collect();
        assert_eq!(prices, vec![5.0, 10.0, 20.0, 30.0]);
        assert!(result.segment_results.is_empty());
    }

    #[test]
    fn empty_overall_cohort_degrades_instead_of_failing() {
        let table = table(&[["1", "F", "Asia", "", "", "", ""]]);

        let result = analyze(&table, &vw_plan(&["gender"]));

        assert_eq!(result.overall_results.respondents, 0);
        assert!(result.overall_results.data.is_empty());
        assert_eq!(result.overall_results.optimal, None);
        assert!(result.segment_results.is_empty());
    }

    #[test]
    fn gabor_granger_sweep_picks_revenue_optimum() {
        let prices = [10.0, 20.0, 30.0, 40.0, 50.0];
        let plan = AnalysisPlan {
            mapping: MappingConfig::GaborGranger(GaborGrangerConfig {
                price_points: prices
                    .iter()
                    .map(|&price| PricePointColumn {
                        price,
                        column: format!("buy_{price}"),
                    })
                    .collect(),
                intent_threshold: 1.0,
            }),
            segments: Vec::new(),
            respondent_id: None,
        };
        // buyers per price out of ten: 9, 8, 6, 3, 1
        let buyers = [9, 8, 6, 3, 1];
        let rows = (0..10)
            .map(|respondent| {
                prices
                    .iter()
                    .zip(buyers)
                    .map(|(price, count)| {
                        let answer = if respondent < count { "1" } else { "0" };
                        (format!("buy_{price}"), answer.to_string())
                    })
                    .collect()
            })
            .collect();
        let table = SurveyTable {
            headers: prices.iter().map(|p| format!("buy_{p}")).collect(),
            rows,
        };

        let result = analyze(&table, &plan);

        assert_eq!(result.analysis_type, AnalysisType::GaborGranger);
        assert_eq!(result.overall_results.optimal, Some(30.0));
        assert_eq!(result.overall_results.range, Some((10.0, 50.0)));
    }

    #[test]
    fn duplicate_ids_are_counted() {
        let rows: Vec<ResponseRow> = ["a", "b", "a", "a", ""]
            .into_iter()
            .map(|id| [("id", id)].into_iter().collect())
            .collect();
        assert_eq!(duplicate_respondents(&rows, "id"), 2);
    }
}
