use crate::models::{
    Cumulation, Curve, CurvePoint, GaborGrangerFrequency, VanWestendorpFrequency,
    VanWestendorpSeries,
};

/// Where two series meet on a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intersection {
    /// Interpolated zero of the difference between the two series.
    Crossing(f64),
    /// The series never meet; holds the midpoint of the curve's price range.
    Fallback(f64),
}

impl Intersection {
    pub fn price(self) -> f64 {
        match self {
            Intersection::Crossing(price) | Intersection::Fallback(price) => price,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Intersection::Fallback(_))
    }
}

impl Curve {
    /// Builds a curve from points already sorted by ascending price.
    pub fn from_points(points: Vec<CurvePoint>) -> Self {
        debug_assert!(points.windows(2).all(|pair| pair[0].price < pair[1].price));
        Self { points }
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Lowest and highest observed price.
    pub fn price_range(&self) -> Option<(f64, f64)> {
        Some((self.points.first()?.price, self.points.last()?.price))
    }

    /// First point holding the maximum of a series; ties go to the lower price.
    pub fn peak(&self, series: usize) -> Option<&CurvePoint> {
        self.points.iter().fold(None, |best: Option<&CurvePoint>, point| match best {
            Some(current) if current.values[series] >= point.values[series] => Some(current),
            _ => Some(point),
        })
    }

    /// Finds the lowest price where series `first` and `second` meet.
    ///
    /// Walks adjacent points in price order and stops at the first segment
    /// where the difference between the series touches zero or changes
    /// sign, returning the linearly interpolated zero. Curves that never
    /// cross, or have a single point, fall back to the midpoint of their
    /// price range. Returns `None` only for an empty curve.
    ///
    /// # Panics
    ///
    /// Panics if either index is outside the curve's series.
    pub fn intersection(&self, first: usize, second: usize) -> Option<Intersection> {
        let (low, high) = self.price_range()?;
        let difference = |point: &CurvePoint| point.values[first] - point.values[second];

        let crossing = self.points.windows(2).find_map(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            let (da, db) = (difference(a), difference(b));
            if da == 0.0 {
                Some(a.price)
            } else if db == 0.0 || (da < 0.0) != (db < 0.0) {
                Some(a.price + da / (da - db) * (b.price - a.price))
            } else {
                None
            }
        });

        Some(match crossing {
            Some(price) => Intersection::Crossing(price),
            None => Intersection::Fallback((low + high) / 2.0),
        })
    }
}

/// Turns question counts into cumulative percentages of the cohort: "too
/// cheap" and "cheap" accumulate from the right (share answering at or above
/// the price), "expensive" and "too expensive" from the left (at or below).
pub fn build_van_westendorp(table: &VanWestendorpFrequency) -> Curve {
    if table.is_empty() {
        return Curve::default();
    }
    let cohort = table.respondents as f64;

    let mut totals = [0usize; 4];
    for counts in table.counts.values() {
        for (total, count) in totals.iter_mut().zip(counts) {
            *total += count;
        }
    }

    let mut below = [0usize; 4];
    let points = table
        .counts
        .iter()
        .map(|(price, counts)| {
            let values = VanWestendorpSeries::ALL
                .iter()
                .map(|series| {
                    let i = series.index();
                    let share = match series.cumulation() {
                        Cumulation::FromRight => totals[i] - below[i],
                        Cumulation::FromLeft => below[i] + counts[i],
                    };
                    share as f64 / cohort * 100.0
                })
                .collect();
            for (seen, count) in below.iter_mut().zip(counts) {
                *seen += count;
            }
            CurvePoint {
                price: price.value(),
                values,
            }
        })
        .collect();

    Curve::from_points(points)
}

/// Intent share and revenue per respondent at each price point. No
/// cumulation: every point stands on its own answers.
pub fn build_gabor_granger(table: &GaborGrangerFrequency) -> Curve {
    if table.is_empty() {
        return Curve::default();
    }
    let cohort = table.respondents as f64;

    let points = table
        .counts
        .iter()
        .map(|(price, &count)| {
            let intent = count as f64 / cohort * 100.0;
            let revenue = price.value() * intent / 100.0;
            CurvePoint {
                price: price.value(),
                values: vec![intent, revenue],
            }
        })
        .collect();

    Curve::from_points(points)
}
