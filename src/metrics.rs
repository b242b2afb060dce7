use crate::curve::Intersection;
use crate::models::{
    CohortResult, Curve, GaborGrangerSeries, VanWestendorpMetrics, VanWestendorpSeries,
};

use crate::models::VanWestendorpSeries::{Cheap, Expensive, TooCheap, TooExpensive};

/// The four Van Westendorp price points, each read off one pair of curves.
pub fn van_westendorp_metrics(curve: &Curve) -> VanWestendorpMetrics {
    let mut fallbacks = Vec::new();
    let mut cross = |name: &str, a: VanWestendorpSeries, b: VanWestendorpSeries| {
        let hit = curve.intersection(a.index(), b.index())?;
        if let Intersection::Fallback(price) = hit {
            tracing::debug!(metric = name, price, "curves never cross, using range midpoint");
            fallbacks.push(name.to_string());
        }
        Some(hit.price())
    };

    let pmc_point = cross("pmcPoint", TooCheap, Expensive);
    let ipd_point = cross("ipdPoint", Cheap, TooExpensive);
    let opp = cross("opp", Cheap, Expensive);
    let idp = cross("idp", TooCheap, TooExpensive);

    VanWestendorpMetrics {
        pmc_point,
        ipd_point,
        opp,
        idp,
        fallbacks,
    }
}

/// Acceptable range runs from the point of marginal cheapness to the point of
/// marginal expensiveness; the optimal price point is the headline price.
pub fn van_westendorp_result(curve: Curve, respondents: usize) -> CohortResult {
    let metrics = van_westendorp_metrics(&curve);
    let range = metrics.pmc_point.zip(metrics.ipd_point);

    CohortResult {
        respondents,
        optimal: metrics.opp,
        range,
        metrics: (!curve.is_empty()).then_some(metrics),
        data: curve,
    }
}

/// Revenue-maximising price over the tested sweep, with the sweep's bounds as
/// the range.
pub fn gabor_granger_result(curve: Curve, respondents: usize) -> CohortResult {
    CohortResult {
        respondents,
        optimal: curve
            .peak(GaborGrangerSeries::Revenue.index())
            .map(|point| point.price),
        range: curve.price_range(),
        metrics: None,
        data: curve,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CurvePoint;

    fn vw_curve(rows: &[(f64, [f64; 4])]) -> Curve {
        Curve::from_points(
            rows.iter()
                .map(|(price, values)| CurvePoint {
                    price: *price,
                    values: values.to_vec(),
                })
                .collect(),
        )
    }

    #[test]
    fn van_westendorp_reads_each_metric_off_its_own_pair() {
        let curve = vw_curve(&[
            (10.0, [80.0, 90.0, 20.0, 10.0]),
            (20.0, [60.0, 70.0, 30.0, 20.0]),
            (30.0, [40.0, 50.0, 50.0, 40.0]),
            (40.0, [20.0, 30.0, 70.0, 60.0]),
            (50.0, [10.0, 20.0, 90.0, 80.0]),
        ]);

        let result = van_westendorp_result(curve, 100);
        let metrics = result.metrics.clone().unwrap();

        // too cheap vs expensive: +30 at 20, -10 at 30
        assert_eq!(metrics.pmc_point, Some(27.5));
        // cheap vs too expensive: +10 at 30, -30 at 40
        assert_eq!(metrics.ipd_point, Some(32.5));
        // cheap vs expensive: equal at 30
        assert_eq!(metrics.opp, Some(30.0));
        // too cheap vs too expensive: equal at 30
        assert_eq!(metrics.idp, Some(30.0));
        assert!(metrics.fallbacks.is_empty());

        assert_eq!(result.range, Some((27.5, 32.5)));
        assert_eq!(result.optimal, Some(30.0));
        assert_eq!(result.data.len(), 5);
    }

    #[test]
    fn uncrossed_curves_record_their_fallbacks() {
        let curve = vw_curve(&[
            (10.0, [90.0, 95.0, 5.0, 0.0]),
            (30.0, [80.0, 85.0, 10.0, 5.0]),
        ]);

        let metrics = van_westendorp_metrics(&curve);

        assert_eq!(metrics.pmc_point, Some(20.0));
        assert_eq!(metrics.fallbacks.len(), 4);
        assert!(metrics.fallbacks.contains(&"opp".to_string()));
    }

    #[test]
    fn empty_curve_leaves_everything_undefined() {
        let vw = van_westendorp_result(Curve::default(), 0);
        assert_eq!(vw.optimal, None);
        assert_eq!(vw.range, None);
        assert_eq!(vw.metrics, None);

        let gg = gabor_granger_result(Curve::default(), 0);
        assert_eq!(gg.optimal, None);
        assert_eq!(gg.range, None);
    }

    #[test]
    fn gabor_granger_optimum_is_revenue_argmax() {
        let curve = Curve::from_points(
            [(10.0, 90.0), (20.0, 80.0), (30.0, 60.0), (40.0, 30.0), (50.0, 10.0)]
                .into_iter()
                .map(|(price, intent)| CurvePoint {
                    price,
                    values: vec![intent, price * intent / 100.0],
                })
                .collect(),
        );

        let result = gabor_granger_result(curve, 10);

        assert_eq!(result.optimal, Some(30.0));
        assert_eq!(result.range, Some((10.0, 50.0)));
        assert!(result.metrics.is_none());
    }
}
