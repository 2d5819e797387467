//! SQLite loader for the attractions database.
//!
//! Inserts are made idempotent by pre-insert existence checks (the schema
//! carries no uniqueness constraints), always through parameterized queries
//! keyed on the correct column per table. Each attraction's full row set
//! (city, attraction, stats, popular-mention tags and join rows) is written
//! inside one transaction, so a failure mid-attraction rolls the whole
//! attraction back instead of leaving partial rows behind.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::{fs, path::Path};
use tracing::{debug, info};

use crate::model::{AttractionRecord, CitySummary};

const SCHEMA: &str = "
    PRAGMA foreign_keys=ON;

    CREATE TABLE IF NOT EXISTS cities (
        id INTEGER PRIMARY KEY,
        name TEXT,
        top_attractions_url TEXT
    );

    CREATE TABLE IF NOT EXISTS attractions (
        id INTEGER PRIMARY KEY,
        name TEXT,
        city_id INTEGER,
        url TEXT,
        FOREIGN KEY (city_id) REFERENCES cities(id)
    );

    CREATE TABLE IF NOT EXISTS attraction_stats (
        attraction_id INTEGER,
        ranking INTEGER,
        num_reviewers INTEGER,
        excellent_review INTEGER,
        very_good_review INTEGER,
        average_review INTEGER,
        poor_review INTEGER,
        terrible_review INTEGER,
        FOREIGN KEY (attraction_id) REFERENCES attractions(id)
    );

    CREATE TABLE IF NOT EXISTS popular_mentions (
        id INTEGER PRIMARY KEY,
        popular_mention TEXT
    );

    CREATE TABLE IF NOT EXISTS popular_mentions_attractions (
        id INTEGER PRIMARY KEY,
        attraction_id INTEGER,
        popular_mention_id INTEGER,
        FOREIGN KEY (attraction_id) REFERENCES attractions(id),
        FOREIGN KEY (popular_mention_id) REFERENCES popular_mentions(id)
    );

    CREATE TABLE IF NOT EXISTS meteorological_data (
        city_id INTEGER,
        min_temp REAL,
        max_temp REAL,
        mean_temp REAL,
        total_precipitation REAL,
        FOREIGN KEY (city_id) REFERENCES cities(id)
    );
";

/// Open (creating if needed) the attractions database and ensure all
/// tables exist. Safe to call repeatedly.
pub fn create_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database: {}", path.display()))?;
    init_schema(&conn)?;

    Ok(conn)
}

/// Create all tables if they don't exist yet.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA).context("Failed to create database schema")?;
    Ok(())
}

/// Insert scraped attractions, skipping any attraction whose name is
/// already recorded. Returns the number of attractions inserted.
pub fn populate_attractions(
    conn: &mut Connection,
    records: &[AttractionRecord],
) -> Result<usize> {
    let mut inserted = 0;

    for record in records {
        if attraction_id(conn, &record.name)?.is_some() {
            debug!(attraction = %record.name, "already recorded, skipping");
            continue;
        }

        // One transaction per attraction: dropping it on error rolls back
        // the city/stats/mention rows written so far for this record.
        let tx = conn.transaction()?;
        insert_attraction(&tx, record)
            .with_context(|| format!("Failed to insert attraction '{}'", record.name))?;
        tx.commit()?;

        inserted += 1;
    }

    info!(inserted, skipped = records.len() - inserted, "attractions loaded");
    Ok(inserted)
}

fn insert_attraction(tx: &Transaction<'_>, record: &AttractionRecord) -> Result<()> {
    let city_id = match city_id(tx, &record.city)? {
        Some(id) => id,
        None => {
            tx.execute("INSERT INTO cities (name) VALUES (?1)", params![record.city])?;
            tx.last_insert_rowid()
        }
    };

    tx.execute(
        "INSERT INTO attractions (name, city_id, url) VALUES (?1, ?2, ?3)",
        params![record.name, city_id, record.url],
    )?;
    let attraction_id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO attraction_stats
             (attraction_id, ranking, num_reviewers, excellent_review,
              very_good_review, average_review, poor_review, terrible_review)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            attraction_id,
            record.ranking,
            record.num_reviewers,
            record.excellent,
            record.very_good,
            record.average,
            record.poor,
            record.terrible,
        ],
    )?;

    for mention in &record.popular_mentions {
        let mention_id = match popular_mention_id(tx, mention)? {
            Some(id) => id,
            None => {
                tx.execute(
                    "INSERT INTO popular_mentions (popular_mention) VALUES (?1)",
                    params![mention],
                )?;
                tx.last_insert_rowid()
            }
        };

        tx.execute(
            "INSERT INTO popular_mentions_attractions (attraction_id, popular_mention_id)
             VALUES (?1, ?2)",
            params![attraction_id, mention_id],
        )?;
    }

    Ok(())
}

/// Insert city weather summaries, skipping cities already present in
/// `meteorological_data`. Cities unknown to the `cities` table are
/// inserted first so the foreign key resolves. Commits per city row.
/// Returns the number of rows inserted.
pub fn load_weather_summaries(conn: &mut Connection, rows: &[CitySummary]) -> Result<usize> {
    let mut inserted = 0;

    for row in rows {
        if weather_recorded(conn, &row.name)? {
            debug!(city = %row.name, "weather summary already recorded, skipping");
            continue;
        }

        let tx = conn.transaction()?;

        let city_id = match city_id(&tx, &row.name)? {
            Some(id) => id,
            None => {
                tx.execute("INSERT INTO cities (name) VALUES (?1)", params![row.name])?;
                tx.last_insert_rowid()
            }
        };

        tx.execute(
            "INSERT INTO meteorological_data
                 (city_id, min_temp, max_temp, mean_temp, total_precipitation)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                city_id,
                row.summary.min_temp,
                row.summary.max_temp,
                row.summary.mean_temp,
                row.summary.total_precipitation,
            ],
        )?;

        tx.commit()?;
        inserted += 1;
    }

    info!(inserted, skipped = rows.len() - inserted, "weather summaries loaded");
    Ok(inserted)
}

fn city_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row("SELECT id FROM cities WHERE name = ?1", params![name], |row| row.get(0))
        .optional()?;
    Ok(id)
}

fn attraction_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row("SELECT id FROM attractions WHERE name = ?1", params![name], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(id)
}

fn popular_mention_id(conn: &Connection, mention: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM popular_mentions WHERE popular_mention = ?1",
            params![mention],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

fn weather_recorded(conn: &Connection, city_name: &str) -> Result<bool> {
    let hit: Option<i64> = conn
        .query_row(
            "SELECT m.city_id
             FROM meteorological_data m
             JOIN cities c ON c.id = m.city_id
             WHERE c.name = ?1",
            params![city_name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnnualSummary;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory db");
        init_schema(&conn).expect("schema must apply");
        conn
    }

    fn attraction(city: &str, name: &str, mentions: &[&str]) -> AttractionRecord {
        AttractionRecord {
            city: city.to_string(),
            name: name.to_string(),
            url: format!("https://example.com/{}", name.replace(' ', "-")),
            ranking: 1,
            num_reviewers: 1200,
            excellent: 800,
            very_good: 250,
            average: 100,
            poor: 30,
            terrible: 20,
            popular_mentions: mentions.iter().map(|m| m.to_string()).collect(),
        }
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .expect("count query")
    }

    #[test]
    fn schema_creation_is_idempotent() {
        let conn = test_conn();
        init_schema(&conn).expect("second run must succeed");
    }

    #[test]
    fn populating_twice_inserts_nothing_new() {
        let mut conn = test_conn();
        let records = vec![
            attraction("Paris", "Louvre Museum", &["art", "history"]),
            attraction("Paris", "Eiffel Tower", &["views", "history"]),
            attraction("Rome", "Colosseum", &["history"]),
        ];

        let first = populate_attractions(&mut conn, &records).expect("first load");
        assert_eq!(first, 3);

        let second = populate_attractions(&mut conn, &records).expect("second load");
        assert_eq!(second, 0);

        assert_eq!(count(&conn, "cities"), 2);
        assert_eq!(count(&conn, "attractions"), 3);
        assert_eq!(count(&conn, "attraction_stats"), 3);
        // "history" is shared; only three distinct tags exist.
        assert_eq!(count(&conn, "popular_mentions"), 3);
        assert_eq!(count(&conn, "popular_mentions_attractions"), 5);
    }

    #[test]
    fn shared_mentions_reuse_one_tag_row() {
        let mut conn = test_conn();
        let records = vec![
            attraction("Paris", "Louvre Museum", &["history"]),
            attraction("Rome", "Colosseum", &["history"]),
        ];

        populate_attractions(&mut conn, &records).expect("load");

        assert_eq!(count(&conn, "popular_mentions"), 1);
        assert_eq!(count(&conn, "popular_mentions_attractions"), 2);
    }

    #[test]
    fn failure_mid_attraction_rolls_the_whole_record_back() {
        let mut conn = test_conn();

        // Sabotage the stats table so the third insert of the record fails.
        conn.execute_batch("DROP TABLE attraction_stats").expect("drop");

        let records = vec![attraction("Paris", "Louvre Museum", &["art"])];
        let err = populate_attractions(&mut conn, &records);
        assert!(err.is_err());

        // No partial city or attraction row survives the rollback.
        assert_eq!(count(&conn, "cities"), 0);
        assert_eq!(count(&conn, "attractions"), 0);
    }

    fn summary_row(name: &str) -> CitySummary {
        CitySummary {
            name: name.to_string(),
            summary: AnnualSummary {
                min_temp: 5.5,
                max_temp: 22.3,
                mean_temp: 14.83,
                total_precipitation: 3.5,
            },
        }
    }

    #[test]
    fn weather_summaries_are_idempotent() {
        let mut conn = test_conn();
        let rows = vec![summary_row("paris"), summary_row("rome")];

        assert_eq!(load_weather_summaries(&mut conn, &rows).expect("first load"), 2);
        assert_eq!(load_weather_summaries(&mut conn, &rows).expect("second load"), 0);

        assert_eq!(count(&conn, "meteorological_data"), 2);
        assert_eq!(count(&conn, "cities"), 2);
    }

    #[test]
    fn weather_rows_reference_existing_cities() {
        let mut conn = test_conn();

        populate_attractions(&mut conn, &[attraction("paris", "Louvre Museum", &[])])
            .expect("attractions load");
        load_weather_summaries(&mut conn, &[summary_row("paris")]).expect("weather load");

        // The existing city row is reused, not duplicated.
        assert_eq!(count(&conn, "cities"), 1);

        let min_temp: f64 = conn
            .query_row(
                "SELECT m.min_temp
                 FROM meteorological_data m
                 JOIN cities c ON c.id = m.city_id
                 WHERE c.name = ?1",
                params!["paris"],
                |row| row.get(0),
            )
            .expect("joined lookup");
        assert_eq!(min_temp, 5.5);
    }
}
