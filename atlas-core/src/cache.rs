//! Filesystem cache of raw archive-API responses, one JSON file per city.
//!
//! File names follow the `<normalized_city>_weather.json` pattern, where a
//! normalized city name is lowercase with spaces replaced by underscores
//! ("Buenos Aires" -> `buenos_aires_weather.json`).

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::CorpusError;

const WEATHER_FILE_SUFFIX: &str = "_weather.json";

/// Normalize a city name for use in cache file names:
/// lowercase, spaces replaced by underscores.
pub fn normalize_city_name(city: &str) -> String {
    city.to_lowercase().replace(' ', "_")
}

/// Cache file name for a city, e.g. `buenos_aires_weather.json`.
pub fn weather_file_name(city: &str) -> String {
    format!("{}{}", normalize_city_name(city), WEATHER_FILE_SUFFIX)
}

/// Extract the normalized city name back out of a cache file name.
///
/// Only letters, digits, whitespace and underscores are accepted in the
/// city part; anything else (or a missing suffix) is a `BadFileName`.
pub fn city_from_file_name(file_name: &str) -> Result<&str, CorpusError> {
    let city = file_name
        .strip_suffix(WEATHER_FILE_SUFFIX)
        .ok_or_else(|| CorpusError::BadFileName(file_name.to_string()))?;

    let valid = !city.is_empty()
        && city
            .chars()
            .all(|c| c.is_alphanumeric() || c.is_whitespace() || c == '_');

    if valid {
        Ok(city)
    } else {
        Err(CorpusError::BadFileName(file_name.to_string()))
    }
}

/// Directory of cached weather files.
#[derive(Debug, Clone)]
pub struct WeatherCache {
    dir: PathBuf,
}

impl WeatherCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether weather data has already been fetched for this city.
    ///
    /// Exact match on the normalized file name: a cached "paris2" entry
    /// does not count as a hit for "paris".
    pub fn contains(&self, city: &str) -> bool {
        self.dir.join(weather_file_name(city)).exists()
    }

    /// Write a raw archive response verbatim, creating the cache
    /// directory first if needed. Returns the written path.
    pub fn store(&self, city: &str, body: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create cache directory: {}", self.dir.display())
        })?;

        let path = self.dir.join(weather_file_name(city));
        fs::write(&path, body)
            .with_context(|| format!("Failed to write cache file: {}", path.display()))?;

        Ok(path)
    }

    /// All files currently in the cache directory, in listing order.
    ///
    /// An absent directory is an empty cache, not an error.
    pub fn entries(&self) -> std::io::Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn city_name_normalization() {
        assert_eq!(normalize_city_name("Buenos Aires"), "buenos_aires");
        assert_eq!(weather_file_name("Buenos Aires"), "buenos_aires_weather.json");
    }

    #[test]
    fn file_name_round_trip() {
        let name = weather_file_name("Buenos Aires");
        let city = city_from_file_name(&name).expect("name must parse");
        assert_eq!(city, "buenos_aires");
    }

    #[test]
    fn rejects_foreign_file_names() {
        assert!(city_from_file_name("notes.txt").is_err());
        assert!(city_from_file_name("_weather.json").is_err());
        assert!(city_from_file_name("pa/ris_weather.json").is_err());
    }

    #[test]
    fn contains_is_an_exact_match() {
        let dir = TempDir::new().expect("tempdir");
        let cache = WeatherCache::new(dir.path());

        cache.store("paris2", b"{}").expect("store must succeed");

        // The old substring scan would have reported a false hit here.
        assert!(cache.contains("paris2"));
        assert!(!cache.contains("paris"));
    }

    #[test]
    fn store_writes_verbatim_and_creates_dir() {
        let dir = TempDir::new().expect("tempdir");
        let cache = WeatherCache::new(dir.path().join("nested").join("weather_files"));

        let body = br#"{"daily":{}}"#;
        let path = cache.store("Buenos Aires", body).expect("store must succeed");

        assert_eq!(path.file_name().unwrap(), "buenos_aires_weather.json");
        assert_eq!(std::fs::read(&path).expect("read back"), body);
        assert!(cache.contains("Buenos Aires"));
    }

    #[test]
    fn entries_on_missing_dir_is_empty() {
        let dir = TempDir::new().expect("tempdir");
        let cache = WeatherCache::new(dir.path().join("does_not_exist"));

        assert!(cache.entries().expect("must not error").is_empty());
    }
}
