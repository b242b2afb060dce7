use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::analysis::run_cohort;
use crate::config::MappingConfig;
use crate::models::{LevelResult, ResponseRow, SegmentResult};

/// Buckets rows by their value in `column`, in one pass. Blank cells belong
/// to no level.
pub fn partition<'a>(rows: &'a [ResponseRow], column: &str) -> BTreeMap<&'a str, Vec<&'a ResponseRow>> {
    let mut levels: BTreeMap<&str, Vec<&ResponseRow>> = BTreeMap::new();
    for row in rows {
        if let Some(level) = row.get(column) {
            levels.entry(level).or_default().push(row);
        }
    }
    levels
}

/// Runs the full pipeline once per observed level of `variable`. Levels
/// without a single valid answer are dropped, and so is the variable when
/// nothing survives.
pub fn run_segment(
    rows: &[ResponseRow],
    variable: &str,
    mapping: &MappingConfig,
) -> Option<SegmentResult> {
    let buckets = partition(rows, variable);

    let levels: Vec<LevelResult> = buckets
        .into_par_iter()
        .filter_map(|(name, cohort)| {
            let result = run_cohort(&cohort, mapping);
            if result.respondents == 0 {
                tracing::warn!(
                    segment = variable,
                    level = name,
                    rows = cohort.len(),
                    "dropping level with no valid answers"
                );
                return None;
            }
            tracing::debug!(
                segment = variable,
                level = name,
                respondents = result.respondents,
                optimal = ?result.optimal,
                "level analysed"
            );
            Some(LevelResult {
                name: name.to_string(),
                result,
            })
        })
        .collect();

    if levels.is_empty() {
        tracing::warn!(segment = variable, "dropping segment with no usable levels");
        return None;
    }

    Some(SegmentResult {
        segment_variable: variable.to_string(),
        levels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VanWestendorpConfig;

    fn mapping() -> MappingConfig {
        MappingConfig::VanWestendorp(VanWestendorpConfig {
            too_cheap: "tc".into(),
            cheap: "c".into(),
            expensive: "e".into(),
            too_expensive: "te".into(),
        })
    }

    fn row(region: &str, answers: [&str; 4]) -> ResponseRow {
        [
            ("region", region),
            ("tc", answers[0]),
            ("c", answers[1]),
            ("e", answers[2]),
            ("te", answers[3]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn partition_buckets_by_trimmed_value() {
        let rows = vec![
            row("Europe", ["1", "2", "3", "4"]),
            row(" Europe ", ["1", "2", "3", "4"]),
            row("Asia", ["1", "2", "3", "4"]),
            row("", ["1", "2", "3", "4"]),
        ];

        let levels = partition(&rows, "region");

        assert_eq!(levels.keys().copied().collect::<Vec<_>>(), vec!["Asia", "Europe"]);
        assert_eq!(levels["Europe"].len(), 2);
        assert_eq!(levels["Asia"].len(), 1);
    }

    #[test]
    fn levels_without_valid_answers_are_dropped() {
        let rows = vec![
            row("Europe", ["5", "10", "20", "30"]),
            row("Asia", ["-", "-", "-", "-"]),
        ];

        let segment = run_segment(&rows, "region", &mapping()).unwrap();

        assert_eq!(segment.segment_variable, "region");
        assert_eq!(segment.levels.len(), 1);
        assert_eq!(segment.levels[0].name, "Europe");
        assert_eq!(segment.levels[0].result.respondents, 1);
    }

    #[test]
    fn segment_with_no_usable_levels_is_dropped() {
        let rows = vec![
            row("Europe", ["", "", "", ""]),
            row("Asia", ["x", "y", "z", "w"]),
        ];
        assert!(run_segment(&rows, "region", &mapping()).is_none());
        assert!(run_segment(&rows, "missing_column", &mapping()).is_none());
    }
}
