//! Integration tests for `DbAdapter` against a real Postgres.
//!
//! These tests require the `test-postgres` feature to be enabled.
//! They support two modes:
//! - CI mode: point `TEST_DATABASE_URL` at a running server
//! - Local mode: uses testcontainers to spin up a postgres container (requires docker)
//!
//! Every test works under freshly generated names, so both modes can share one database.

#![cfg(feature = "test-postgres")]

use api_lib::adapters::DbAdapter;
use beer_journal_core::domain::{NewTasting, TastingNotes, TastingPatch};
use beer_journal_core::ports::{DatabaseService, PortError};
use beer_journal_core::scoring::{ScoreSheet, SensoryScores};
use sqlx::postgres::{PgPool, PgPoolOptions};
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

/// Holds the adapter, a raw pool for assertions, and optionally the container.
/// The container must be kept alive for the duration of the test.
struct PostgresHandle {
    db: DbAdapter,
    pool: PgPool,
    _container: Option<testcontainers::ContainerAsync<Postgres>>,
}

async fn setup_postgres() -> PostgresHandle {
    let (url, container) = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => (url, None),
        Err(_) => {
            let container = Postgres::default().start().await.unwrap();
            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();
            let url = format!("postgres://postgres:postgres@{host}:{port}/postgres");
            (url, Some(container))
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to Postgres");
    let db = DbAdapter::new(pool.clone());
    db.run_migrations().await.expect("Failed to run migrations");

    PostgresHandle {
        db,
        pool,
        _container: container,
    }
}

fn unique(prefix: &str) -> String {
    format!("{} {}", prefix, Uuid::new_v4())
}

async fn new_user(db: &DbAdapter) -> Uuid {
    db.create_user_with_email(&format!("{}@example.com", Uuid::new_v4()), "not-a-real-hash")
        .await
        .unwrap()
        .id
}

fn new_tasting(beer: &str, brewery: &str, sensory: f64, perception: f64) -> NewTasting {
    NewTasting {
        beer_name: beer.to_string(),
        brewery_name: brewery.to_string(),
        notes: TastingNotes {
            aroma: "citrus".to_string(),
            ..TastingNotes::default()
        },
        scores: ScoreSheet {
            sensory: SensoryScores::uniform(sensory),
            perception,
        },
        image_url: None,
    }
}

async fn brewery_count(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM breweries WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn beer_count(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM beers WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn tasting_count(pool: &PgPool, user_id: Uuid) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tastings WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_resolver_reuses_existing_rows() {
    let pg = setup_postgres().await;
    let user_id = new_user(&pg.db).await;
    let (beer, brewery) = (unique("Tripel"), unique("Westmalle"));

    let first = pg
        .db
        .create_tasting(user_id, new_tasting(&beer, &brewery, 7.0, 7.0))
        .await
        .unwrap();
    let second = pg
        .db
        .create_tasting(user_id, new_tasting(&beer, &brewery, 5.0, 5.0))
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.beer, second.beer);
    assert_eq!(brewery_count(&pg.pool, &brewery).await, 1);
    assert_eq!(beer_count(&pg.pool, &beer).await, 1);
}

#[tokio::test]
async fn test_same_beer_name_under_two_breweries() {
    let pg = setup_postgres().await;
    let user_id = new_user(&pg.db).await;
    let beer = unique("IPA");
    let (left, right) = (unique("Tree House"), unique("Trillium"));

    let a = pg
        .db
        .create_tasting(user_id, new_tasting(&beer, &left, 8.0, 8.0))
        .await
        .unwrap();
    let b = pg
        .db
        .create_tasting(user_id, new_tasting(&beer, &right, 8.0, 8.0))
        .await
        .unwrap();

    assert_ne!(a.beer.id, b.beer.id);
    assert_ne!(a.beer.brewery.id, b.beer.brewery.id);
    assert_eq!(beer_count(&pg.pool, &beer).await, 2);
}

#[tokio::test]
async fn test_create_stores_computed_final_score() {
    let pg = setup_postgres().await;
    let user_id = new_user(&pg.db).await;

    let created = pg
        .db
        .create_tasting(user_id, new_tasting(&unique("Pils"), &unique("Bierstadt"), 8.0, 6.0))
        .await
        .unwrap();
    assert_eq!(created.final_score, 7.0);

    let stored = pg.db.get_tasting(user_id, created.id).await.unwrap();
    assert_eq!(stored.final_score, 7.0);
    assert_eq!(stored.notes.aroma, "citrus");
    assert_eq!(stored.notes.ideal_occasion, None);
}

#[tokio::test]
async fn test_patch_recomputes_from_merged_scores() {
    let pg = setup_postgres().await;
    let user_id = new_user(&pg.db).await;
    let created = pg
        .db
        .create_tasting(user_id, new_tasting(&unique("Saison"), &unique("Dupont"), 5.0, 5.0))
        .await
        .unwrap();

    let updated = pg
        .db
        .update_tasting(
            user_id,
            created.id,
            TastingPatch {
                flavor_score: Some(10.0),
                ..TastingPatch::default()
            },
        )
        .await
        .unwrap();

    let expected = ((5.0 * 8.0 + 10.0) / 9.0 + 5.0) / 2.0;
    assert!((updated.final_score - expected).abs() < 1e-9);
    assert_eq!(updated.scores.sensory.flavor, 10.0);
    assert_eq!(updated.scores.sensory.foam, 5.0);
    assert_eq!(updated.scores.perception, 5.0);
    assert_eq!(updated.notes.aroma, "citrus");
    assert_eq!(updated.beer, created.beer);
    assert_eq!(updated.created_at, created.created_at);
}

#[tokio::test]
async fn test_patch_repoints_beer() {
    let pg = setup_postgres().await;
    let user_id = new_user(&pg.db).await;
    let brewery = unique("Westmalle");
    let created = pg
        .db
        .create_tasting(user_id, new_tasting(&unique("Tripel"), &brewery, 7.0, 7.0))
        .await
        .unwrap();

    let dubbel = unique("Dubbel");
    let updated = pg
        .db
        .update_tasting(
            user_id,
            created.id,
            TastingPatch {
                beer_name: Some(dubbel.clone()),
                ..TastingPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.beer.name, dubbel);
    assert_eq!(updated.beer.brewery, created.beer.brewery);
    assert_ne!(updated.beer.id, created.beer.id);
    assert_eq!(brewery_count(&pg.pool, &brewery).await, 1);
}

#[tokio::test]
async fn test_delete_keeps_catalogue() {
    let pg = setup_postgres().await;
    let user_id = new_user(&pg.db).await;
    let (beer, brewery) = (unique("Stout"), unique("Guinness"));
    let created = pg
        .db
        .create_tasting(user_id, new_tasting(&beer, &brewery, 6.0, 6.0))
        .await
        .unwrap();

    pg.db.delete_tasting(user_id, created.id).await.unwrap();

    assert!(matches!(
        pg.db.get_tasting(user_id, created.id).await,
        Err(PortError::NotFound(_))
    ));
    assert!(matches!(
        pg.db.delete_tasting(user_id, created.id).await,
        Err(PortError::NotFound(_))
    ));
    assert_eq!(brewery_count(&pg.pool, &brewery).await, 1);
    assert_eq!(beer_count(&pg.pool, &beer).await, 1);
}

#[tokio::test]
async fn test_failed_create_leaves_nothing_behind() {
    let pg = setup_postgres().await;
    let user_id = new_user(&pg.db).await;
    let (beer, brewery) = (unique("Lager"), unique("Nowhere"));

    // The score CHECK rejects the tasting insert after both upserts ran.
    let result = pg
        .db
        .create_tasting(user_id, new_tasting(&beer, &brewery, 5.0, 11.0))
        .await;

    assert!(matches!(result, Err(PortError::Unexpected(_))));
    assert_eq!(tasting_count(&pg.pool, user_id).await, 0);
    assert_eq!(brewery_count(&pg.pool, &brewery).await, 0);
    assert_eq!(beer_count(&pg.pool, &beer).await, 0);
}

#[tokio::test]
async fn test_failed_update_leaves_tasting_unchanged() {
    let pg = setup_postgres().await;
    let user_id = new_user(&pg.db).await;
    let created = pg
        .db
        .create_tasting(user_id, new_tasting(&unique("Tripel"), &unique("Westmalle"), 7.0, 7.0))
        .await
        .unwrap();

    let brewery = unique("Achel");
    let result = pg
        .db
        .update_tasting(
            user_id,
            created.id,
            TastingPatch {
                brewery_name: Some(brewery.clone()),
                perception_score: Some(-1.0),
                ..TastingPatch::default()
            },
        )
        .await;

    assert!(matches!(result, Err(PortError::Unexpected(_))));
    assert_eq!(brewery_count(&pg.pool, &brewery).await, 0);
    let stored = pg.db.get_tasting(user_id, created.id).await.unwrap();
    assert_eq!(stored.beer, created.beer);
    assert_eq!(stored.scores.perception, 7.0);
    assert_eq!(stored.final_score, created.final_score);
}

#[tokio::test]
async fn test_concurrent_creates_share_one_brewery() {
    let pg = setup_postgres().await;
    let user_id = new_user(&pg.db).await;
    let (beer, brewery) = (unique("Helles"), unique("Augustiner"));

    let (a, b) = tokio::join!(
        pg.db.create_tasting(user_id, new_tasting(&beer, &brewery, 6.0, 6.0)),
        pg.db.create_tasting(user_id, new_tasting(&beer, &brewery, 8.0, 8.0)),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.beer, b.beer);
    assert_eq!(brewery_count(&pg.pool, &brewery).await, 1);
    assert_eq!(beer_count(&pg.pool, &beer).await, 1);
    assert_eq!(tasting_count(&pg.pool, user_id).await, 2);
}

#[tokio::test]
async fn test_tastings_are_owner_scoped() {
    let pg = setup_postgres().await;
    let owner = new_user(&pg.db).await;
    let stranger = new_user(&pg.db).await;
    let created = pg
        .db
        .create_tasting(owner, new_tasting(&unique("Porter"), &unique("Fuller's"), 6.0, 6.0))
        .await
        .unwrap();

    assert!(matches!(
        pg.db.get_tasting(stranger, created.id).await,
        Err(PortError::NotFound(_))
    ));
    assert!(matches!(
        pg.db
            .update_tasting(stranger, created.id, TastingPatch::default())
            .await,
        Err(PortError::NotFound(_))
    ));
    assert!(matches!(
        pg.db.delete_tasting(stranger, created.id).await,
        Err(PortError::NotFound(_))
    ));
    assert!(pg.db.list_tastings(stranger).await.unwrap().is_empty());
    assert_eq!(pg.db.list_tastings(owner).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_sessions_expire_and_log_out() {
    let pg = setup_postgres().await;
    let user_id = new_user(&pg.db).await;

    let live = Uuid::new_v4().to_string();
    pg.db
        .create_auth_session(&live, user_id, chrono::Utc::now() + chrono::Duration::days(1))
        .await
        .unwrap();
    assert_eq!(pg.db.validate_auth_session(&live).await.unwrap(), user_id);

    let expired = Uuid::new_v4().to_string();
    pg.db
        .create_auth_session(&expired, user_id, chrono::Utc::now() - chrono::Duration::hours(1))
        .await
        .unwrap();
    assert!(matches!(
        pg.db.validate_auth_session(&expired).await,
        Err(PortError::Unauthorized)
    ));

    pg.db.delete_auth_session(&live).await.unwrap();
    assert!(matches!(
        pg.db.validate_auth_session(&live).await,
        Err(PortError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_duplicate_email_is_a_conflict() {
    let pg = setup_postgres().await;
    let email = format!("{}@example.com", Uuid::new_v4());

    pg.db.create_user_with_email(&email, "hash").await.unwrap();
    assert!(matches!(
        pg.db.create_user_with_email(&email, "hash").await,
        Err(PortError::Conflict(_))
    ));
}
