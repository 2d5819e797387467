use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A resolved geographic location for a city.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One year of daily observations for a single city, as returned by the
/// archive API's `daily` object: parallel arrays aligned by date.
///
/// Individual readings may be absent (the archive reports `null` for days
/// without data), so every measurement column is a sequence of optionals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailySeries {
    #[serde(default)]
    pub time: Vec<NaiveDate>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
}

/// Four scalar statistics derived from a year of daily observations,
/// each rounded to 2 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualSummary {
    pub min_temp: f64,
    pub max_temp: f64,
    pub mean_temp: f64,
    pub total_precipitation: f64,
}

/// One row of the weather corpus: a city name (normalized, as extracted
/// from its cache filename) and its annual summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitySummary {
    pub name: String,
    #[serde(flatten)]
    pub summary: AnnualSummary,
}

/// One scraped tourist attraction, as produced by the external scraper.
///
/// Serde field names follow the scraper's output columns verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttractionRecord {
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Url")]
    pub url: String,
    #[serde(rename = "Tripadvisor rank")]
    pub ranking: i64,
    #[serde(rename = "Reviewers#")]
    pub num_reviewers: i64,
    #[serde(rename = "Excellent")]
    pub excellent: i64,
    #[serde(rename = "Very good")]
    pub very_good: i64,
    #[serde(rename = "Average")]
    pub average: i64,
    #[serde(rename = "Poor")]
    pub poor: i64,
    #[serde(rename = "Terrible")]
    pub terrible: i64,
    #[serde(rename = "Popular Mentions", default)]
    pub popular_mentions: Vec<String>,
}
