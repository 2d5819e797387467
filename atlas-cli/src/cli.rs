use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{
    fs,
    path::{Path, PathBuf},
};

use atlas_core::{
    ArchiveClient, AttractionRecord, Config, FetchOutcome, Geocoder, WeatherCache, build_corpus,
    db, fetch_city,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "atlas", version, about = "City attractions & weather pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the geocoding API key in the config file.
    Configure,

    /// Fetch and cache one year of daily weather for each city.
    Fetch {
        /// City names, e.g. "Buenos Aires".
        #[arg(required = true)]
        cities: Vec<String>,

        /// Optional country, applied to every city; some city names
        /// appear in multiple countries.
        #[arg(long)]
        country: Option<String>,
    },

    /// Aggregate the cached weather files and print the corpus table.
    Summarize,

    /// Create the attractions database and all its tables.
    InitDb,

    /// Load the weather corpus into the database.
    LoadWeather,

    /// Load scraped attractions (a JSON array) into the database.
    LoadAttractions {
        /// Path to the scraper's JSON output.
        file: PathBuf,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Fetch { cities, country } => fetch(cities, country.as_deref()).await,
            Command::Summarize => summarize(),
            Command::InitDb => init_db(),
            Command::LoadWeather => load_weather(),
            Command::LoadAttractions { file } => load_attractions(&file),
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("api-ninjas geocoding API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.set_geocoding_api_key(api_key);
    config.save()?;

    println!("Saved config to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn fetch(cities: Vec<String>, country: Option<&str>) -> Result<()> {
    let config = Config::load()?;
    let api_key = config.geocoding_api_key()?.to_owned();

    let geocoder = Geocoder::new(api_key, config.retry);
    let archive = ArchiveClient::new();
    let cache = WeatherCache::new(&config.storage.weather_dir);

    for city in &cities {
        match fetch_city(city, country, &geocoder, &archive, &cache).await? {
            FetchOutcome::Fetched(path) => println!("{city}: fetched -> {}", path.display()),
            FetchOutcome::AlreadyCached => println!("{city}: already cached"),
            FetchOutcome::Unresolved => println!("{city}: not found by the geocoder, skipped"),
        }
    }

    Ok(())
}

fn summarize() -> Result<()> {
    let config = Config::load()?;
    let cache = WeatherCache::new(&config.storage.weather_dir);

    let corpus = build_corpus(&cache).context("Failed to build the weather corpus")?;
    if corpus.is_empty() {
        println!("No cached weather files in {}", cache.dir().display());
        return Ok(());
    }

    println!(
        "{:<20} {:>10} {:>10} {:>10} {:>20}",
        "Name", "min_temp", "max_temp", "mean_temp", "total_precipitation"
    );
    for row in &corpus {
        println!(
            "{:<20} {:>10.2} {:>10.2} {:>10.2} {:>20.2}",
            row.name,
            row.summary.min_temp,
            row.summary.max_temp,
            row.summary.mean_temp,
            row.summary.total_precipitation
        );
    }

    Ok(())
}

fn init_db() -> Result<()> {
    let config = Config::load()?;
    db::create_database(&config.storage.database_path)?;

    println!("Database ready at {}", config.storage.database_path.display());
    Ok(())
}

fn load_weather() -> Result<()> {
    let config = Config::load()?;
    let cache = WeatherCache::new(&config.storage.weather_dir);

    let corpus = build_corpus(&cache).context("Failed to build the weather corpus")?;
    let mut conn = db::create_database(&config.storage.database_path)?;
    let inserted = db::load_weather_summaries(&mut conn, &corpus)?;

    println!("Inserted {inserted} weather summaries ({} total rows)", corpus.len());
    Ok(())
}

fn load_attractions(file: &Path) -> Result<()> {
    let config = Config::load()?;

    let contents = fs::read_to_string(file)
        .with_context(|| format!("Failed to read attractions file: {}", file.display()))?;
    let records: Vec<AttractionRecord> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse attractions file: {}", file.display()))?;

    let mut conn = db::create_database(&config.storage.database_path)?;
    let inserted = db::populate_attractions(&mut conn, &records)?;

    println!("Inserted {inserted} attractions ({} total records)", records.len());
    Ok(())
}
