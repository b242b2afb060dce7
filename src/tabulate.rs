use crate::config::{GaborGrangerConfig, VanWestendorpConfig};
use crate::models::{
    GaborGrangerFrequency, Price, ResponseRow, VanWestendorpFrequency, VanWestendorpSeries,
};

/// Counts, per distinct price, how many respondents named it for each of the
/// four perception questions. Unparsable cells are skipped field by field.
pub fn tabulate_van_westendorp(
    cohort: &[&ResponseRow],
    config: &VanWestendorpConfig,
) -> VanWestendorpFrequency {
    let mut table = VanWestendorpFrequency::default();

    for row in cohort {
        let mut contributed = false;
        for (series, column) in VanWestendorpSeries::ALL.into_iter().zip(config.columns()) {
            if let Some(price) = row.number(column) {
                table.counts.entry(Price::new(price)).or_insert([0; 4])[series.index()] += 1;
                contributed = true;
            }
        }
        if contributed {
            table.respondents += 1;
        }
    }

    table
}

/// Counts "would buy" answers per configured price point. Any parsed answer,
/// positive or not, registers its price point.
pub fn tabulate_gabor_granger(
    cohort: &[&ResponseRow],
    config: &GaborGrangerConfig,
) -> GaborGrangerFrequency {
    let mut table = GaborGrangerFrequency::default();

    for row in cohort {
        let mut contributed = false;
        for point in &config.price_points {
            if let Some(intent) = row.number(&point.column) {
                let count = table.counts.entry(Price::new(point.price)).or_insert(0);
                if intent >= config.intent_threshold {
                    *count += 1;
                }
                contributed = true;
            }
        }
        if contributed {
            table.respondents += 1;
        }
    }

    table
}
