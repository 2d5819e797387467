use thiserror::Error;

/// Failures of the geocoding client.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The service kept failing after every allowed attempt.
    #[error("geocoding request for '{city}' still failing after {attempts} attempts")]
    RetriesExhausted { city: String, attempts: u32 },

    /// A 200 response whose result list was empty: the upstream answered
    /// but gave us nothing to extract a location from.
    #[error("geocoding response for '{city}' contained no results")]
    EmptyResponse { city: String },

    #[error("failed to send geocoding request")]
    Request(#[from] reqwest::Error),

    #[error("failed to parse geocoding response: {0}")]
    MalformedResponse(String),
}

/// Failures of the weather archive fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error("archive request for '{city}' failed with status {status}: {body}")]
    ArchiveStatus {
        city: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to send archive request")]
    Request(#[from] reqwest::Error),

    #[error("failed to write cache file")]
    Cache(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Failures while building the weather corpus from the cache directory.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("cache filename '{0}' does not match the <city>_weather.json pattern")]
    BadFileName(String),

    #[error("cache file '{file}' is not a valid archive payload: {source}")]
    MalformedPayload {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read cache directory")]
    Io(#[from] std::io::Error),
}
