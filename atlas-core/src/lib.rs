//! Core library for the `atlas` CLI.
//!
//! This crate implements the city attractions & weather pipeline:
//! - Configuration & credentials handling
//! - Geocoding and historical-weather API clients
//! - A filesystem cache of raw archive responses
//! - Annual aggregation of daily weather series
//! - The SQLite loader for the attractions database
//!
//! It is used by `atlas-cli`, but can also be reused by other binaries or services.

pub mod archive;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod geocode;
pub mod model;
pub mod summary;

pub use archive::{ArchiveClient, FetchOutcome, fetch_city};
pub use cache::WeatherCache;
pub use config::{Config, RetryConfig};
pub use error::{CorpusError, FetchError, GeocodeError};
pub use geocode::Geocoder;
pub use model::{AnnualSummary, AttractionRecord, CitySummary, Coordinates, DailySeries};
pub use summary::{annual_summary, build_corpus};
