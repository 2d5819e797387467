use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::{config::RetryConfig, error::GeocodeError, model::Coordinates};

const GEOCODING_URL: &str = "https://api.api-ninjas.com/v1/geocoding";

/// Client for the api-ninjas geocoding service.
///
/// Transient failures (transport errors and non-404 error statuses) are
/// retried with exponential backoff up to the configured attempt cap; a
/// 404 is the service's way of saying "unknown city" and maps to `Ok(None)`.
#[derive(Debug, Clone)]
pub struct Geocoder {
    api_key: String,
    http: Client,
    retry: RetryConfig,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    latitude: f64,
    longitude: f64,
}

impl Geocoder {
    pub fn new(api_key: String, retry: RetryConfig) -> Self {
        Self {
            api_key,
            http: Client::new(),
            retry,
            base_url: GEOCODING_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolve a city (and optional country) to coordinates.
    ///
    /// Returns `Ok(None)` when the service does not know the city; the
    /// caller must check before requesting weather for it.
    pub async fn resolve(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> Result<Option<Coordinates>, GeocodeError> {
        let mut query: Vec<(&str, &str)> = vec![("city", city)];
        if let Some(country) = country {
            query.push(("country", country));
        }

        let mut backoff = Duration::from_millis(self.retry.initial_backoff_ms);

        for attempt in 1..=self.retry.max_attempts {
            let res = self
                .http
                .get(&self.base_url)
                .query(&query)
                .header("X-Api-Key", &self.api_key)
                .send()
                .await;

            match res {
                Ok(res) if res.status() == StatusCode::NOT_FOUND => return Ok(None),
                Ok(res) if res.status().is_success() => {
                    let body = res.text().await?;

                    let results: Vec<GeocodeResult> = serde_json::from_str(&body)
                        .map_err(|e| GeocodeError::MalformedResponse(e.to_string()))?;

                    let first = results.first().ok_or_else(|| GeocodeError::EmptyResponse {
                        city: city.to_string(),
                    })?;

                    return Ok(Some(Coordinates {
                        latitude: first.latitude,
                        longitude: first.longitude,
                    }));
                }
                Ok(res) => {
                    warn!(
                        city,
                        attempt,
                        status = %res.status(),
                        "geocoding request failed, will retry"
                    );
                }
                Err(err) => {
                    warn!(city, attempt, error = %err, "geocoding request failed, will retry");
                }
            }

            if attempt < self.retry.max_attempts {
                sleep(backoff).await;
                backoff *= 2;
            }
        }

        Err(GeocodeError::RetriesExhausted {
            city: city.to_string(),
            attempts: self.retry.max_attempts,
        })
    }
}
