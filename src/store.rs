use crate::model::CatalogCounts;
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::path::Path;

/// Rows actually created by a brand+model insert step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrandModelInsert {
    pub brand_inserted: bool,
    pub model_inserted: bool,
}

/// Insert-only access to the Brand → Model → Year hierarchy.
///
/// Every insert ignores rows that collide with a natural key. Each method
/// that writes commits before returning.
pub trait CatalogStore {
    fn brand_names(&mut self) -> Result<BTreeSet<String>>;

    fn insert_brand_and_model(&mut self, brand: &str, model: &str) -> Result<BrandModelInsert>;

    fn find_model_id(&mut self, brand: &str, model: &str) -> Result<Option<i64>>;

    /// Returns how many year rows were new.
    fn insert_years(
        &mut self,
        model_id: i64,
        years: RangeInclusive<i32>,
        link_href: &str,
    ) -> Result<usize>;

    fn counts(&mut self) -> Result<CatalogCounts>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open catalog database {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS Brands (
            brand_name  TEXT PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS Models (
            model_id    INTEGER PRIMARY KEY,
            model_name  TEXT NOT NULL,
            brand_name  TEXT NOT NULL REFERENCES Brands(brand_name),
            UNIQUE(model_name, brand_name)
        );
        CREATE INDEX IF NOT EXISTS idx_models_brand ON Models(brand_name);

        CREATE TABLE IF NOT EXISTS Years (
            year_id     INTEGER PRIMARY KEY,
            model_id    INTEGER NOT NULL REFERENCES Models(model_id),
            year_value  INTEGER NOT NULL,
            link_href   TEXT NOT NULL,
            UNIQUE(model_id, year_value)
        );
        ",
    )
    .context("failed to initialise catalog schema")?;
    Ok(())
}

impl CatalogStore for SqliteStore {
    fn brand_names(&mut self) -> Result<BTreeSet<String>> {
        let mut stmt = self.conn.prepare("SELECT brand_name FROM Brands")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<BTreeSet<String>, _>>()?;
        Ok(names)
    }

    fn insert_brand_and_model(&mut self, brand: &str, model: &str) -> Result<BrandModelInsert> {
        let tx = self.conn.transaction()?;
        let brands = tx.execute(
            "INSERT OR IGNORE INTO Brands (brand_name) VALUES (?1)",
            params![brand],
        )?;
        let models = tx.execute(
            "INSERT OR IGNORE INTO Models (model_name, brand_name) VALUES (?1, ?2)",
            params![model, brand],
        )?;
        tx.commit()?;
        Ok(BrandModelInsert {
            brand_inserted: brands > 0,
            model_inserted: models > 0,
        })
    }

    fn find_model_id(&mut self, brand: &str, model: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT model_id FROM Models WHERE model_name = ?1 AND brand_name = ?2",
                params![model, brand],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn insert_years(
        &mut self,
        model_id: i64,
        years: RangeInclusive<i32>,
        link_href: &str,
    ) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO Years (model_id, year_value, link_href) VALUES (?1, ?2, ?3)",
            )?;
            for year in years {
                count += stmt.execute(params![model_id, year, link_href])?;
            }
        }
        tx.commit()?;
        Ok(count)
    }

    fn counts(&mut self) -> Result<CatalogCounts> {
        let brands: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM Brands", [], |r| r.get(0))?;
        let models: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM Models", [], |r| r.get(0))?;
        let years: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM Years", [], |r| r.get(0))?;
        Ok(CatalogCounts {
            brands,
            models,
            years,
        })
    }
}
