use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::{AnalysisType, SurveyTable};

pub const DEFAULT_INTENT_THRESHOLD: f64 = 1.0;

/// Column mapping as submitted alongside an upload. Which fields are
/// required depends on the analysis type; see [`AnalysisPlan::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respondent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub too_cheap: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cheap: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expensive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub too_expensive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_points: Option<Vec<f64>>,
    /// Intent column per price point, keyed by the price as text ("10", "9.99").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_intents: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub mapping: RawMapping,
    #[serde(default)]
    pub segments: Vec<String>,
}

impl AnalysisSettings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid settings file {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VanWestendorpConfig {
    pub too_cheap: String,
    pub cheap: String,
    pub expensive: String,
    pub too_expensive: String,
}

impl VanWestendorpConfig {
    /// Columns in curve series order.
    pub fn columns(&self) -> [&str; 4] {
        [
            &self.too_cheap,
            &self.cheap,
            &self.expensive,
            &self.too_expensive,
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricePointColumn {
    pub price: f64,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GaborGrangerConfig {
    pub price_points: Vec<PricePointColumn>,
    /// Intent answers at or above this value count as "would buy".
    pub intent_threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MappingConfig {
    VanWestendorp(VanWestendorpConfig),
    GaborGranger(GaborGrangerConfig),
}

impl MappingConfig {
    pub fn analysis_type(&self) -> AnalysisType {
        match self {
            MappingConfig::VanWestendorp(_) => AnalysisType::VanWestendorp,
            MappingConfig::GaborGranger(_) => AnalysisType::GaborGranger,
        }
    }

    /// Every mapped column with the role it plays.
    fn columns(&self) -> Vec<(String, &str)> {
        match self {
            MappingConfig::VanWestendorp(config) => ["too cheap", "cheap", "expensive", "too expensive"]
                .into_iter()
                .zip(config.columns())
                .map(|(role, column)| (role.to_string(), column))
                .collect(),
            MappingConfig::GaborGranger(config) => config
                .price_points
                .iter()
                .map(|point| (format!("price point {}", point.price), point.column.as_str()))
                .collect(),
        }
    }
}

/// A validated mapping, ready to run against the table it was checked with.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisPlan {
    pub mapping: MappingConfig,
    pub segments: Vec<String>,
    pub respondent_id: Option<String>,
}

impl AnalysisPlan {
    pub fn validate(
        analysis_type: AnalysisType,
        settings: &AnalysisSettings,
        table: &SurveyTable,
    ) -> Result<Self, ConfigError> {
        let raw = &settings.mapping;
        let mapping = match analysis_type {
            AnalysisType::VanWestendorp => MappingConfig::VanWestendorp(VanWestendorpConfig {
                too_cheap: required(&raw.too_cheap, "too cheap")?,
                cheap: required(&raw.cheap, "cheap")?,
                expensive: required(&raw.expensive, "expensive")?,
                too_expensive: required(&raw.too_expensive, "too expensive")?,
            }),
            AnalysisType::GaborGranger => MappingConfig::GaborGranger(gabor_granger(raw)?),
        };

        let respondent_id = raw
            .respondent_id
            .as_deref()
            .map(str::trim)
            .filter(|column| !column.is_empty())
            .map(str::to_string);

        let segments: Vec<String> = settings
            .segments
            .iter()
            .map(|segment| segment.trim().to_string())
            .filter(|segment| !segment.is_empty())
            .collect();

        let mut checks = mapping.columns();
        checks.extend(
            respondent_id
                .iter()
                .map(|column| ("respondent id".to_string(), column.as_str())),
        );
        checks.extend(
            segments
                .iter()
                .map(|segment| ("segment".to_string(), segment.as_str())),
        );
        for (role, column) in checks {
            if !table.has_column(column) {
                return Err(ConfigError::UnknownColumn {
                    role,
                    column: column.to_string(),
                });
            }
        }

        Ok(Self {
            mapping,
            segments,
            respondent_id,
        })
    }
}

fn required(column: &Option<String>, role: &'static str) -> Result<String, ConfigError> {
    column
        .as_deref()
        .map(str::trim)
        .filter(|column| !column.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::MissingMapping(role))
}

fn gabor_granger(raw: &RawMapping) -> Result<GaborGrangerConfig, ConfigError> {
    let prices = raw
        .price_points
        .as_deref()
        .filter(|prices| !prices.is_empty())
        .ok_or(ConfigError::NoPricePoints)?;

    let intents: Vec<(f64, &str)> = raw
        .purchase_intents
        .iter()
        .flatten()
        .filter_map(|(key, column)| {
            let price = key.trim().parse::<f64>().ok()?;
            let column = column.trim();
            (!column.is_empty()).then_some((price, column))
        })
        .collect();

    let mut price_points: Vec<PricePointColumn> = Vec::with_capacity(prices.len());
    let mut missing = Vec::new();
    for &price in prices {
        if !price.is_finite() {
            return Err(ConfigError::InvalidPricePoint(price));
        }
        if price_points.iter().any(|point| point.price == price) {
            return Err(ConfigError::DuplicatePricePoint(price));
        }
        match intents.iter().find(|(key, _)| *key == price) {
            Some((_, column)) => price_points.push(PricePointColumn {
                price,
                column: column.to_string(),
            }),
            None => missing.push(price.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(ConfigError::MissingIntentMappings(missing.join(", ")));
    }

    let intent_threshold = raw.intent_threshold.unwrap_or(DEFAULT_INTENT_THRESHOLD);
    if !intent_threshold.is_finite() {
        return Err(ConfigError::InvalidIntentThreshold);
    }

    Ok(GaborGrangerConfig {
        price_points,
        intent_threshold,
    })
}
