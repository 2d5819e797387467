//! Reduction of daily time series into annual summary statistics, and the
//! corpus builder that applies it to every cached city.

use serde::Deserialize;
use std::fs;
use tracing::warn;

use crate::{
    cache::{self, WeatherCache},
    error::CorpusError,
    model::{AnnualSummary, CitySummary, DailySeries},
};

/// Reduce a daily series to its four annual statistics:
/// min of daily minima, max of daily maxima, mean of daily means, sum of
/// daily precipitation. Absent readings are skipped, not imputed.
///
/// Pure and deterministic. With no usable readings in a temperature column
/// the corresponding statistic is NaN; an empty precipitation column sums
/// to 0.
pub fn annual_summary(daily: &DailySeries) -> AnnualSummary {
    let min_temp = present(&daily.temperature_2m_min).fold(f64::NAN, f64::min);
    let max_temp = present(&daily.temperature_2m_max).fold(f64::NAN, f64::max);

    let (sum, count) = present(&daily.temperature_2m_mean)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    let mean_temp = if count == 0 { f64::NAN } else { sum / count as f64 };

    let total_precipitation: f64 = present(&daily.precipitation_sum).sum();

    AnnualSummary {
        min_temp: round2(min_temp),
        max_temp: round2(max_temp),
        mean_temp: round2(mean_temp),
        total_precipitation: round2(total_precipitation),
    }
}

fn present(column: &[Option<f64>]) -> impl Iterator<Item = f64> + '_ {
    column.iter().flatten().copied().filter(|v| !v.is_nan())
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[derive(Debug, Deserialize)]
struct ArchivePayload {
    daily: DailySeries,
}

/// Parse one cached archive response into its daily series.
pub fn parse_daily(file: &str, body: &str) -> Result<DailySeries, CorpusError> {
    serde_json::from_str::<ArchivePayload>(body)
        .map(|payload| payload.daily)
        .map_err(|source| CorpusError::MalformedPayload { file: file.to_string(), source })
}

/// Build the weather corpus: one summary row per cached city, in the
/// cache directory's listing order.
///
/// Files whose names don't match the `<city>_weather.json` pattern, or
/// whose bodies aren't valid archive payloads, are reported and skipped;
/// a single bad file does not abort the scan.
pub fn build_corpus(cache: &WeatherCache) -> Result<Vec<CitySummary>, CorpusError> {
    let mut rows = Vec::new();

    for path in cache.entries()? {
        let file_name = path.file_name().unwrap_or_default().to_string_lossy().into_owned();

        let city = match cache::city_from_file_name(&file_name) {
            Ok(city) => city.to_string(),
            Err(err) => {
                warn!(%err, "skipping cache file");
                continue;
            }
        };

        let body = fs::read_to_string(&path)?;
        let daily = match parse_daily(&file_name, &body) {
            Ok(daily) => daily,
            Err(err) => {
                warn!(%err, "skipping cache file");
                continue;
            }
        };

        rows.push(CitySummary { name: city, summary: annual_summary(&daily) });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn series(
        min: &[f64],
        max: &[f64],
        mean: &[f64],
        precipitation: &[f64],
    ) -> DailySeries {
        let wrap = |vs: &[f64]| vs.iter().copied().map(Some).collect();
        DailySeries {
            time: Vec::new(),
            temperature_2m_max: wrap(max),
            temperature_2m_min: wrap(min),
            temperature_2m_mean: wrap(mean),
            precipitation_sum: wrap(precipitation),
        }
    }

    #[test]
    fn three_day_series() {
        let daily = series(
            &[10.0, 5.5, 12.1],
            &[20.0, 22.3, 18.0],
            &[15.0, 14.0, 15.5],
            &[0.0, 2.5, 1.0],
        );

        let summary = annual_summary(&daily);

        assert_eq!(summary.min_temp, 5.5);
        assert_eq!(summary.max_temp, 22.3);
        assert_eq!(summary.mean_temp, 14.83);
        assert_eq!(summary.total_precipitation, 3.5);
    }

    #[test]
    fn bounds_hold_for_every_reading() {
        let daily = series(
            &[3.2, -1.7, 0.0, 8.9],
            &[12.0, 15.5, 9.1, 21.4],
            &[7.0, 6.3, 4.5, 14.2],
            &[0.4, 0.0, 12.7, 3.3],
        );

        let summary = annual_summary(&daily);

        for v in daily.temperature_2m_min.iter().flatten() {
            assert!(summary.min_temp <= *v);
        }
        for v in daily.temperature_2m_max.iter().flatten() {
            assert!(summary.max_temp >= *v);
        }

        let exact: f64 = daily.precipitation_sum.iter().flatten().sum();
        assert!((summary.total_precipitation - exact).abs() <= 0.01);
    }

    #[test]
    fn dry_year_sums_to_zero() {
        let daily = series(&[1.0], &[2.0], &[1.5], &[0.0, 0.0, 0.0]);
        assert_eq!(annual_summary(&daily).total_precipitation, 0.0);
    }

    #[test]
    fn absent_readings_are_skipped() {
        let daily = DailySeries {
            time: Vec::new(),
            temperature_2m_max: vec![Some(20.0), None, Some(18.0)],
            temperature_2m_min: vec![None, Some(5.5), Some(12.1)],
            temperature_2m_mean: vec![Some(15.0), Some(14.0), None],
            precipitation_sum: vec![Some(0.5), None, Some(1.0)],
        };

        let summary = annual_summary(&daily);

        assert_eq!(summary.min_temp, 5.5);
        assert_eq!(summary.max_temp, 20.0);
        assert_eq!(summary.mean_temp, 14.5);
        assert_eq!(summary.total_precipitation, 1.5);
    }

    const GOOD_BODY: &str = r#"{
        "latitude": -34.61,
        "longitude": -58.38,
        "daily": {
            "time": ["2022-04-01", "2022-04-02", "2022-04-03"],
            "temperature_2m_max": [20.0, 22.3, 18.0],
            "temperature_2m_min": [10.0, 5.5, 12.1],
            "temperature_2m_mean": [15.0, 14.0, 15.5],
            "precipitation_sum": [0.0, 2.5, 1.0]
        }
    }"#;

    #[test]
    fn corpus_has_one_row_per_city() {
        let dir = TempDir::new().expect("tempdir");
        let cache = WeatherCache::new(dir.path());

        cache.store("Buenos Aires", GOOD_BODY.as_bytes()).expect("store");
        cache.store("Paris", GOOD_BODY.as_bytes()).expect("store");

        let mut corpus = build_corpus(&cache).expect("corpus must build");
        corpus.sort_by(|a, b| a.name.cmp(&b.name));

        let names: Vec<&str> = corpus.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(names, ["buenos_aires", "paris"]);
        assert_eq!(corpus[0].summary.mean_temp, 14.83);
    }

    #[test]
    fn bad_files_are_skipped_not_fatal() {
        let dir = TempDir::new().expect("tempdir");
        let cache = WeatherCache::new(dir.path());

        cache.store("Paris", GOOD_BODY.as_bytes()).expect("store");
        std::fs::write(dir.path().join("notes.txt"), "not weather").expect("write");
        std::fs::write(dir.path().join("lima_weather.json"), "{ broken").expect("write");

        let corpus = build_corpus(&cache).expect("corpus must still build");

        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus[0].name, "paris");
    }
}
