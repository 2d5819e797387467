use reqwest::Client;
use tracing::{debug, info};

use crate::{
    cache::WeatherCache,
    error::FetchError,
    geocode::Geocoder,
    model::Coordinates,
};

const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

// The corpus covers one fixed year of daily observations; these are not
// meant to be configurable.
const START_DATE: &str = "2022-04-01";
const END_DATE: &str = "2023-04-01";
const DAILY_FEATURES: &str =
    "temperature_2m_max,temperature_2m_min,temperature_2m_mean,precipitation_sum";
const TIMEZONE: &str = "GMT";

/// What happened for one city during a fetch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Weather data was already cached; no request was made.
    AlreadyCached,
    /// The geocoder does not know this city; nothing was fetched or written.
    Unresolved,
    /// Fresh data was fetched and written to the cache.
    Fetched(std::path::PathBuf),
}

/// Client for the open-meteo historical archive.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    http: Client,
    base_url: String,
}

impl Default for ArchiveClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveClient {
    pub fn new() -> Self {
        Self { http: Client::new(), base_url: ARCHIVE_URL.to_string() }
    }

    /// Point the client at a different endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch the fixed one-year daily series for a location and return the
    /// raw response body. One attempt only; the geocoder is where retries
    /// live, the archive call is best-effort.
    pub async fn fetch_daily(&self, city: &str, coords: Coordinates) -> Result<String, FetchError> {
        let latitude = coords.latitude.to_string();
        let longitude = coords.longitude.to_string();

        // Query parameters are built fresh for every call.
        let query: [(&str, &str); 6] = [
            ("latitude", &latitude),
            ("longitude", &longitude),
            ("start_date", START_DATE),
            ("end_date", END_DATE),
            ("daily", DAILY_FEATURES),
            ("timezone", TIMEZONE),
        ];

        let res = self.http.get(&self.base_url).query(&query).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::ArchiveStatus {
                city: city.to_string(),
                status,
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

/// Fetch and cache one city's weather: skip when already cached, resolve
/// coordinates, request the archive, write the raw body verbatim.
pub async fn fetch_city(
    city: &str,
    country: Option<&str>,
    geocoder: &Geocoder,
    archive: &ArchiveClient,
    cache: &WeatherCache,
) -> Result<FetchOutcome, FetchError> {
    if cache.contains(city) {
        debug!(city, "weather already cached, skipping");
        return Ok(FetchOutcome::AlreadyCached);
    }

    let Some(coords) = geocoder.resolve(city, country).await? else {
        info!(city, "geocoder does not know this city, skipping");
        return Ok(FetchOutcome::Unresolved);
    };

    let body = archive.fetch_daily(city, coords).await?;
    let path = cache
        .store(city, body.as_bytes())
        .map_err(|err| FetchError::Cache(err.into()))?;

    info!(city, path = %path.display(), "weather data cached");
    Ok(FetchOutcome::Fetched(path))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX { format!("{}...", &body[..MAX]) } else { body.to_string() }
}
