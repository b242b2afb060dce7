use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    VanWestendorp,
    GaborGranger,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::VanWestendorp => "van_westendorp",
            AnalysisType::GaborGranger => "gabor_granger",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AnalysisType::VanWestendorp => "Van Westendorp",
            AnalysisType::GaborGranger => "Gabor-Granger",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "van_westendorp" => Ok(AnalysisType::VanWestendorp),
            "gabor_granger" => Ok(AnalysisType::GaborGranger),
            other => anyhow::bail!("unknown analysis type `{other}`"),
        }
    }
}

/// One respondent's raw answers, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseRow {
    cells: HashMap<String, String>,
}

impl ResponseRow {
    pub fn new(cells: HashMap<String, String>) -> Self {
        Self { cells }
    }

    /// Trimmed cell contents; blank cells read as absent.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .get(column)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Parses a cell as a price or intent value. Unparsable and non-finite
    /// cells yield `None` and are only traced.
    pub fn number(&self, column: &str) -> Option<f64> {
        let raw = self.get(column)?;
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                tracing::trace!(column, raw, "skipping non-numeric cell");
                None
            }
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResponseRow {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        )
    }
}

/// The full respondent table as read from the data file.
#[derive(Debug, Clone, Default)]
pub struct SurveyTable {
    pub headers: Vec<String>,
    pub rows: Vec<ResponseRow>,
}

impl SurveyTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|header| header == column)
    }
}

/// A price observed in the data, ordered by value. Matching is exact: two
/// answers share a bucket only when they parse to the same float.
#[derive(Debug, Clone, Copy)]
pub struct Price(f64);

impl Price {
    pub fn new(value: f64) -> Self {
        // folds -0.0 into 0.0 so both land in one bucket
        Self(value + 0.0)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Price {}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// The four Van Westendorp questions, in curve series order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VanWestendorpSeries {
    TooCheap,
    Cheap,
    Expensive,
    TooExpensive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cumulation {
    /// Share of answers at or above the price.
    FromRight,
    /// Share of answers at or below the price.
    FromLeft,
}

impl VanWestendorpSeries {
    pub const ALL: [VanWestendorpSeries; 4] = [
        VanWestendorpSeries::TooCheap,
        VanWestendorpSeries::Cheap,
        VanWestendorpSeries::Expensive,
        VanWestendorpSeries::TooExpensive,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn cumulation(self) -> Cumulation {
        match self {
            VanWestendorpSeries::TooCheap | VanWestendorpSeries::Cheap => Cumulation::FromRight,
            VanWestendorpSeries::Expensive | VanWestendorpSeries::TooExpensive => {
                Cumulation::FromLeft
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaborGrangerSeries {
    Intent,
    Revenue,
}

impl GaborGrangerSeries {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Per-price answer counts for one cohort.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceFrequency<C> {
    /// Rows that contributed at least one parsed value.
    pub respondents: usize,
    pub counts: BTreeMap<Price, C>,
}

impl<C> Default for PriceFrequency<C> {
    fn default() -> Self {
        Self {
            respondents: 0,
            counts: BTreeMap::new(),
        }
    }
}

impl<C> PriceFrequency<C> {
    pub fn is_empty(&self) -> bool {
        self.respondents == 0
    }
}

pub type VanWestendorpFrequency = PriceFrequency<[usize; 4]>;
pub type GaborGrangerFrequency = PriceFrequency<usize>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub price: f64,
    pub values: Vec<f64>,
}

/// Points sorted strictly ascending by price, all with the same number of
/// series values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curve {
    pub(crate) points: Vec<CurvePoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VanWestendorpMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmc_point: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipd_point: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idp: Option<f64>,
    /// Metrics whose curves never crossed and hold the price-range midpoint.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortResult {
    pub respondents: usize,
    pub data: Curve,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<VanWestendorpMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelResult {
    pub name: String,
    #[serde(flatten)]
    pub result: CohortResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentResult {
    pub segment_variable: String,
    pub levels: Vec<LevelResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub analysis_type: AnalysisType,
    pub overall_results: CohortResult,
    pub segment_results: Vec<SegmentResult>,
}

/// A persisted analysis run. Runs are never updated; the newest one for a
/// project is the effective result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResult {
    pub id: Uuid,
    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

#[derive(Debug, Clone)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub analysis_type: AnalysisType,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
