use std::env;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use tokio::sync::Mutex;

use dishbot::db::{Database, StoreError};
use dishbot::selection;
use dishbot::voting::{record_vote, Polarity, VoteOutcome};

/// The tests rebuild the schema, so they must not interleave.
fn db_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Helper macro to skip tests when database is not available
macro_rules! skip_if_no_db {
    ($test_fn:expr) => {{
        let _guard = db_lock().lock().await;
        match setup_test_db().await {
            Ok(db) => $test_fn(&db).await,
            Err(_) => {
                eprintln!("Skipping test: Database not available");
                Ok(())
            }
        }
    }};
}

async fn setup_test_db() -> Result<Database> {
    // Skip tests if no DATABASE_URL is provided
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping database tests: DATABASE_URL not set");
            return Err(anyhow::anyhow!("Test database not configured"));
        }
    };

    // Clean up any existing test data
    let pool = sqlx::PgPool::connect(&database_url)
        .await
        .context("Failed to connect to test database")?;
    sqlx::query("DROP TABLE IF EXISTS dish_votes CASCADE")
        .execute(&pool)
        .await?;
    sqlx::query("DROP TABLE IF EXISTS dishes CASCADE")
        .execute(&pool)
        .await?;
    pool.close().await;

    let mut db = Database::new();
    db.connect(&database_url)
        .await
        .context("Failed to connect to test database")?;
    db.init_schema().await?;

    Ok(db)
}

async fn insert_approved(db: &Database, name: &str, submitter: &str) -> Result<i64> {
    let id = db
        .insert_dish("https://example.com/photo.jpg", name, None, 100.0, submitter)
        .await?;
    assert!(db.set_approved(id).await?);
    Ok(id)
}

#[tokio::test]
async fn test_insert_and_get_round_trip() -> Result<()> {
    skip_if_no_db!(test_insert_and_get_round_trip_impl)
}

async fn test_insert_and_get_round_trip_impl(db: &Database) -> Result<()> {
    let dish_id = db
        .insert_dish(
            "https://example.com/tonkatsu.jpg",
            "Tonkatsu",
            None,
            199.50,
            "1001",
        )
        .await?;
    assert!(dish_id > 0);

    let dish = db.get_dish(dish_id).await?.expect("dish should exist");
    assert_eq!(dish.id, dish_id);
    assert_eq!(dish.name, "Tonkatsu");
    assert_eq!(dish.description, None);
    assert!((dish.price - 199.50).abs() < 1e-9);
    assert!(!dish.approved);
    assert_eq!(dish.like_count, 0);
    assert_eq!(dish.dislike_count, 0);
    assert_eq!(dish.submitter_id, "1001");

    assert_eq!(db.get_dish(99999).await?, None);

    Ok(())
}

#[tokio::test]
async fn test_list_by_submitter_order_and_limit() -> Result<()> {
    skip_if_no_db!(test_list_by_submitter_order_and_limit_impl)
}

async fn test_list_by_submitter_order_and_limit_impl(db: &Database) -> Result<()> {
    let first = db
        .insert_dish("https://example.com/1.jpg", "First", None, 10.0, "1001")
        .await?;
    let second = db
        .insert_dish("https://example.com/2.jpg", "Second", None, 20.0, "1001")
        .await?;
    let third = db
        .insert_dish("https://example.com/3.jpg", "Third", None, 30.0, "1001")
        .await?;
    db.insert_dish("https://example.com/4.jpg", "Other", None, 40.0, "2002")
        .await?;

    let dishes = db.list_by_submitter("1001", 20).await?;
    let ids: Vec<i64> = dishes.iter().map(|dish| dish.id).collect();
    assert_eq!(ids, vec![third, second, first]);

    let limited = db.list_by_submitter("1001", 2).await?;
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].id, third);

    assert!(db.list_by_submitter("3003", 20).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_set_approved() -> Result<()> {
    skip_if_no_db!(test_set_approved_impl)
}

async fn test_set_approved_impl(db: &Database) -> Result<()> {
    let dish_id = db
        .insert_dish("https://example.com/1.jpg", "Katsu Curry", None, 50.0, "1001")
        .await?;

    assert!(db.set_approved(dish_id).await?);
    let dish = db.get_dish(dish_id).await?.unwrap();
    assert!(dish.approved);

    assert!(!db.set_approved(99999).await?);

    Ok(())
}

#[tokio::test]
async fn test_vote_recorder_duplicate_guard() -> Result<()> {
    skip_if_no_db!(test_vote_recorder_duplicate_guard_impl)
}

async fn test_vote_recorder_duplicate_guard_impl(db: &Database) -> Result<()> {
    let dish_id = insert_approved(db, "Ramen", "1001").await?;

    // First vote counts
    let outcome = record_vote(db, "5005", dish_id, Polarity::Like).await?;
    assert_eq!(outcome, VoteOutcome::Recorded);

    let dish = db.get_dish(dish_id).await?.unwrap();
    assert_eq!(dish.like_count, 1);
    assert_eq!(dish.dislike_count, 0);

    // A second vote by the same voter is rejected with either polarity and
    // changes nothing
    let outcome = record_vote(db, "5005", dish_id, Polarity::Dislike).await?;
    assert_eq!(outcome, VoteOutcome::AlreadyVoted);
    let outcome = record_vote(db, "5005", dish_id, Polarity::Like).await?;
    assert_eq!(outcome, VoteOutcome::AlreadyVoted);

    let dish = db.get_dish(dish_id).await?.unwrap();
    assert_eq!(dish.like_count, 1);
    assert_eq!(dish.dislike_count, 0);

    // A different voter still may vote
    let outcome = record_vote(db, "6006", dish_id, Polarity::Dislike).await?;
    assert_eq!(outcome, VoteOutcome::Recorded);

    let dish = db.get_dish(dish_id).await?.unwrap();
    assert_eq!(dish.like_count, 1);
    assert_eq!(dish.dislike_count, 1);

    Ok(())
}

#[tokio::test]
async fn test_voted_dish_ids() -> Result<()> {
    skip_if_no_db!(test_voted_dish_ids_impl)
}

async fn test_voted_dish_ids_impl(db: &Database) -> Result<()> {
    let first = insert_approved(db, "First", "1001").await?;
    let second = insert_approved(db, "Second", "1001").await?;
    insert_approved(db, "Third", "1001").await?;

    record_vote(db, "5005", first, Polarity::Like).await?;
    record_vote(db, "5005", second, Polarity::Dislike).await?;

    let voted = db.list_voted_dish_ids("5005").await?;
    assert_eq!(voted.len(), 2);
    assert!(voted.contains(&first));
    assert!(voted.contains(&second));

    assert!(db.list_voted_dish_ids("7007").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_selection_excludes_voted_and_unapproved() -> Result<()> {
    skip_if_no_db!(test_selection_excludes_voted_and_unapproved_impl)
}

async fn test_selection_excludes_voted_and_unapproved_impl(db: &Database) -> Result<()> {
    let first = insert_approved(db, "First", "1001").await?;
    let second = insert_approved(db, "Second", "1001").await?;
    let third = insert_approved(db, "Third", "1001").await?;
    // Never approved, must never be offered
    db.insert_dish("https://example.com/x.jpg", "Hidden", None, 5.0, "1001")
        .await?;

    record_vote(db, "5005", first, Polarity::Like).await?;
    record_vote(db, "5005", second, Polarity::Like).await?;

    // Only the third dish remains votable for this voter
    for _ in 0..20 {
        let dish = selection::next_dish(db, "5005").await?.expect("one dish left");
        assert_eq!(dish.id, third);
    }

    record_vote(db, "5005", third, Polarity::Dislike).await?;
    assert_eq!(selection::next_dish(db, "5005").await?, None);

    // A fresh voter still gets offers
    assert!(selection::next_dish(db, "8008").await?.is_some());

    Ok(())
}

#[tokio::test]
async fn test_selection_with_no_approved_dishes() -> Result<()> {
    skip_if_no_db!(test_selection_with_no_approved_dishes_impl)
}

async fn test_selection_with_no_approved_dishes_impl(db: &Database) -> Result<()> {
    db.insert_dish("https://example.com/x.jpg", "Pending", None, 5.0, "1001")
        .await?;

    assert_eq!(selection::next_dish(db, "5005").await?, None);

    Ok(())
}

#[tokio::test]
async fn test_least_voted_ordering() -> Result<()> {
    skip_if_no_db!(test_least_voted_ordering_impl)
}

async fn test_least_voted_ordering_impl(db: &Database) -> Result<()> {
    let busy = insert_approved(db, "Busy", "1001").await?;
    let quiet = insert_approved(db, "Quiet", "1001").await?;

    record_vote(db, "5005", busy, Polarity::Like).await?;
    record_vote(db, "6006", busy, Polarity::Dislike).await?;

    let dishes = db.list_least_voted(10).await?;
    assert_eq!(dishes.len(), 2);
    assert_eq!(dishes[0].id, quiet);
    assert_eq!(dishes[1].id, busy);
    assert_eq!(dishes[1].total_votes(), 2);

    Ok(())
}

#[tokio::test]
async fn test_random_approved_with_exclusion() -> Result<()> {
    skip_if_no_db!(test_random_approved_with_exclusion_impl)
}

async fn test_random_approved_with_exclusion_impl(db: &Database) -> Result<()> {
    let only = insert_approved(db, "Only", "1001").await?;

    // Excluding the single approved dish leaves nothing
    assert_eq!(db.get_random_approved(Some(only)).await?, None);
    assert_eq!(db.get_random_approved(None).await?.unwrap().id, only);

    let second = insert_approved(db, "Second", "1001").await?;
    for _ in 0..20 {
        let dish = db
            .get_random_approved(Some(only))
            .await?
            .expect("second dish remains");
        assert_eq!(dish.id, second);
    }

    Ok(())
}

#[tokio::test]
async fn test_close_returns_to_not_connected() -> Result<()> {
    let _guard = db_lock().lock().await;
    let Ok(mut db) = setup_test_db().await else {
        eprintln!("Skipping test: Database not available");
        return Ok(());
    };

    db.close().await;
    assert!(matches!(
        db.get_dish(1).await,
        Err(StoreError::NotConnected)
    ));

    Ok(())
}

#[tokio::test]
async fn test_try_insert_vote_is_conditional() -> Result<()> {
    skip_if_no_db!(test_try_insert_vote_is_conditional_impl)
}

async fn test_try_insert_vote_is_conditional_impl(db: &Database) -> Result<()> {
    let dish_id = insert_approved(db, "Udon", "1001").await?;

    let cast_at = chrono::Utc::now();
    assert!(db.try_insert_vote("5005", dish_id, Polarity::Like, cast_at).await?);
    assert!(!db.try_insert_vote("5005", dish_id, Polarity::Like, cast_at).await?);
    assert!(!db.try_insert_vote("5005", dish_id, Polarity::Dislike, cast_at).await?);

    Ok(())
}
