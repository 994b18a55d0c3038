use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::{debug, info};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use crate::voting::Polarity;

/// Failure surface of the dish repository.
///
/// Callers match on the variant instead of relying on error propagation
/// through panics; the bot layer converts both variants into a generic
/// user-visible failure message and never retries.
#[derive(Debug)]
pub enum StoreError {
    /// An operation was invoked before `connect` succeeded
    NotConnected,
    /// The underlying store reported an I/O or statement failure
    Failure(sqlx::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotConnected => write!(f, "database not connected"),
            StoreError::Failure(e) => write!(f, "store failure: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::NotConnected => None,
            StoreError::Failure(e) => Some(e),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Failure(err)
    }
}

/// A submitted dish as stored in the `dishes` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Dish {
    pub id: i64,
    pub image_ref: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub like_count: i64,
    pub dislike_count: i64,
    pub approved: bool,
    pub submitter_id: String,
    pub created_at: DateTime<Utc>,
}

impl Dish {
    pub fn total_votes(&self) -> i64 {
        self.like_count + self.dislike_count
    }
}

const DISH_COLUMNS: &str = "id, image_ref, name, description, price, \
     like_count, dislike_count, approved, submitter_id, created_at";

/// Async handle to the PostgreSQL store behind the bot.
pub struct Database {
    pool: Option<PgPool>,
}

impl Database {
    /// Create an unconnected handle; every operation fails with
    /// [`StoreError::NotConnected`] until [`Database::connect`] succeeds.
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Establish the connection pool.
    pub async fn connect(&mut self, database_url: &str) -> Result<(), StoreError> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(10)
            .connect(database_url)
            .await?;
        self.pool = Some(pool);
        debug!("Connected to PostgreSQL database");
        Ok(())
    }

    /// Close the connection pool.
    pub async fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            debug!("Database connection pool closed");
        }
    }

    fn pool(&self) -> Result<&PgPool, StoreError> {
        self.pool.as_ref().ok_or(StoreError::NotConnected)
    }

    /// Initialize the database schema.
    ///
    /// The composite primary key on `dish_votes` is what makes the
    /// duplicate-vote guard atomic; see [`Database::try_insert_vote`].
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        let pool = self.pool()?;
        info!("Initializing database schema...");

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS dishes (
                id BIGSERIAL PRIMARY KEY,
                image_ref TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                price DOUBLE PRECISION NOT NULL,
                like_count BIGINT NOT NULL DEFAULT 0,
                dislike_count BIGINT NOT NULL DEFAULT 0,
                approved BOOLEAN NOT NULL DEFAULT FALSE,
                submitter_id TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS dish_votes (
                voter_id TEXT NOT NULL,
                dish_id BIGINT NOT NULL REFERENCES dishes(id),
                is_like BOOLEAN NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (voter_id, dish_id)
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS dishes_vote_order
             ON dishes (approved, (like_count + dislike_count))",
        )
        .execute(pool)
        .await?;

        info!("Database schema initialized successfully");
        Ok(())
    }

    /// Insert a new dish suggestion and return its id.
    ///
    /// New dishes always start unapproved with zeroed counters.
    pub async fn insert_dish(
        &self,
        image_ref: &str,
        name: &str,
        description: Option<&str>,
        price: f64,
        submitter_id: &str,
    ) -> Result<i64, StoreError> {
        let pool = self.pool()?;

        let row = sqlx::query(
            "INSERT INTO dishes (
                image_ref, name, description, price,
                like_count, dislike_count, approved, submitter_id
            ) VALUES ($1, $2, $3, $4, 0, 0, FALSE, $5)
            RETURNING id",
        )
        .bind(image_ref)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(submitter_id)
        .fetch_one(pool)
        .await?;

        let dish_id: i64 = row.try_get("id")?;
        info!("Inserted dish with ID {}: {}", dish_id, name);
        Ok(dish_id)
    }

    /// Fetch a dish by id.
    pub async fn get_dish(&self, dish_id: i64) -> Result<Option<Dish>, StoreError> {
        let pool = self.pool()?;

        let dish = sqlx::query_as::<_, Dish>(&format!(
            "SELECT {DISH_COLUMNS} FROM dishes WHERE id = $1"
        ))
        .bind(dish_id)
        .fetch_optional(pool)
        .await?;

        Ok(dish)
    }

    /// List the dishes suggested by one submitter, most recent first.
    pub async fn list_by_submitter(
        &self,
        submitter_id: &str,
        limit: i64,
    ) -> Result<Vec<Dish>, StoreError> {
        let pool = self.pool()?;

        let dishes = sqlx::query_as::<_, Dish>(&format!(
            "SELECT {DISH_COLUMNS} FROM dishes
             WHERE submitter_id = $1
             ORDER BY id DESC
             LIMIT $2"
        ))
        .bind(submitter_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(dishes)
    }

    /// Mark a dish as approved. Returns false when no such dish exists.
    ///
    /// Approval itself is an administrative action outside the bot; this is
    /// only the storage hook for it.
    pub async fn set_approved(&self, dish_id: i64) -> Result<bool, StoreError> {
        let pool = self.pool()?;

        let result = sqlx::query("UPDATE dishes SET approved = TRUE WHERE id = $1")
            .bind(dish_id)
            .execute(pool)
            .await?;

        if result.rows_affected() > 0 {
            info!("Approved dish {}", dish_id);
            Ok(true)
        } else {
            info!("No dish found with ID: {}", dish_id);
            Ok(false)
        }
    }

    /// List approved dishes with the fewest votes, random order within ties.
    pub async fn list_least_voted(&self, limit: i64) -> Result<Vec<Dish>, StoreError> {
        let pool = self.pool()?;

        let dishes = sqlx::query_as::<_, Dish>(&format!(
            "SELECT {DISH_COLUMNS} FROM dishes
             WHERE approved = TRUE
             ORDER BY (like_count + dislike_count) ASC, RANDOM()
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(dishes)
    }

    /// Fetch one random approved dish, optionally excluding an id.
    pub async fn get_random_approved(
        &self,
        exclude_id: Option<i64>,
    ) -> Result<Option<Dish>, StoreError> {
        let pool = self.pool()?;

        let dish = sqlx::query_as::<_, Dish>(&format!(
            "SELECT {DISH_COLUMNS} FROM dishes
             WHERE approved = TRUE AND ($1::BIGINT IS NULL OR id <> $1)
             ORDER BY RANDOM()
             LIMIT 1"
        ))
        .bind(exclude_id)
        .fetch_optional(pool)
        .await?;

        Ok(dish)
    }

    /// Set of dish ids a voter has already voted on.
    pub async fn list_voted_dish_ids(&self, voter_id: &str) -> Result<HashSet<i64>, StoreError> {
        let pool = self.pool()?;

        let rows = sqlx::query("SELECT dish_id FROM dish_votes WHERE voter_id = $1")
            .bind(voter_id)
            .fetch_all(pool)
            .await?;

        let mut ids = HashSet::with_capacity(rows.len());
        for row in rows {
            ids.insert(row.try_get::<i64, _>("dish_id")?);
        }
        Ok(ids)
    }

    /// Increment the like or dislike counter of a dish by one.
    ///
    /// Two statically-known statements, dispatched on the closed polarity
    /// enum; the column name is never assembled from input.
    pub async fn increment_vote(&self, dish_id: i64, polarity: Polarity) -> Result<(), StoreError> {
        let pool = self.pool()?;

        let statement = match polarity {
            Polarity::Like => "UPDATE dishes SET like_count = like_count + 1 WHERE id = $1",
            Polarity::Dislike => "UPDATE dishes SET dislike_count = dislike_count + 1 WHERE id = $1",
        };

        sqlx::query(statement).bind(dish_id).execute(pool).await?;

        info!("{} added to dish {}", polarity.as_str(), dish_id);
        Ok(())
    }

    /// Record a vote unless the voter already voted on this dish.
    ///
    /// Returns true when the row was inserted. The conflict target is the
    /// (voter_id, dish_id) primary key, so two simultaneous votes cannot both
    /// win: exactly one insert succeeds and only the winner increments a
    /// counter.
    pub async fn try_insert_vote(
        &self,
        voter_id: &str,
        dish_id: i64,
        polarity: Polarity,
        cast_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let pool = self.pool()?;

        let result = sqlx::query(
            "INSERT INTO dish_votes (voter_id, dish_id, is_like, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (voter_id, dish_id) DO NOTHING",
        )
        .bind(voter_id)
        .bind(dish_id)
        .bind(polarity.is_like())
        .bind(cast_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
