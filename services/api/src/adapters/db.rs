//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use beer_journal_core::domain::{
    Beer, BeerSelection, Brewery, NewTasting, Tasting, TastingNotes, TastingPatch,
    TastingRevision, TastingSummary, User, UserCredentials,
};
use beer_journal_core::ports::{DatabaseService, PortError, PortResult};
use beer_journal_core::scoring::{ScoreSheet, SensoryScores};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            email: self.email,
            hashed_password: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct BreweryRecord {
    id: Uuid,
    name: String,
}

#[derive(FromRow)]
struct BeerRecord {
    id: Uuid,
    name: String,
}

/// A tasting joined with its beer and brewery.
#[derive(FromRow)]
struct TastingRecord {
    id: Uuid,
    user_id: Uuid,
    beer_id: Uuid,
    beer_name: String,
    brewery_id: Uuid,
    brewery_name: String,
    appearance: String,
    foam: String,
    aroma: String,
    flavor: String,
    creaminess: String,
    aftertaste: String,
    drinkability: String,
    dry_finish: String,
    carbonation: String,
    ideal_occasion: Option<String>,
    image_url: Option<String>,
    appearance_score: f64,
    foam_score: f64,
    aroma_score: f64,
    flavor_score: f64,
    creaminess_score: f64,
    aftertaste_score: f64,
    drinkability_score: f64,
    dry_finish_score: f64,
    carbonation_score: f64,
    perception_score: f64,
    final_score: f64,
    created_at: DateTime<Utc>,
}
impl TastingRecord {
    fn to_domain(self) -> Tasting {
        Tasting {
            id: self.id,
            user_id: self.user_id,
            beer: Beer {
                id: self.beer_id,
                name: self.beer_name,
                brewery: Brewery {
                    id: self.brewery_id,
                    name: self.brewery_name,
                },
            },
            notes: TastingNotes {
                appearance: self.appearance,
                foam: self.foam,
                aroma: self.aroma,
                flavor: self.flavor,
                creaminess: self.creaminess,
                aftertaste: self.aftertaste,
                drinkability: self.drinkability,
                dry_finish: self.dry_finish,
                carbonation: self.carbonation,
                ideal_occasion: self.ideal_occasion,
            },
            scores: ScoreSheet {
                sensory: SensoryScores {
                    appearance: self.appearance_score,
                    foam: self.foam_score,
                    aroma: self.aroma_score,
                    flavor: self.flavor_score,
                    creaminess: self.creaminess_score,
                    aftertaste: self.aftertaste_score,
                    drinkability: self.drinkability_score,
                    dry_finish: self.dry_finish_score,
                    carbonation: self.carbonation_score,
                },
                perception: self.perception_score,
            },
            final_score: self.final_score,
            image_url: self.image_url,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct TastingSummaryRecord {
    id: Uuid,
    beer_name: String,
    brewery_name: String,
    final_score: f64,
    created_at: DateTime<Utc>,
    image_url: Option<String>,
}
impl TastingSummaryRecord {
    fn to_domain(self) -> TastingSummary {
        TastingSummary {
            id: self.id,
            beer_name: self.beer_name,
            brewery_name: self.brewery_name,
            final_score: self.final_score,
            created_at: self.created_at,
            image_url: self.image_url,
        }
    }
}

//=========================================================================================
// Transaction-scoped Helpers
//=========================================================================================

const SELECT_TASTING: &str = "SELECT t.id, t.user_id, t.beer_id, b.name AS beer_name, \
     b.brewery_id, br.name AS brewery_name, \
     t.appearance, t.foam, t.aroma, t.flavor, t.creaminess, t.aftertaste, \
     t.drinkability, t.dry_finish, t.carbonation, t.ideal_occasion, t.image_url, \
     t.appearance_score, t.foam_score, t.aroma_score, t.flavor_score, t.creaminess_score, \
     t.aftertaste_score, t.drinkability_score, t.dry_finish_score, t.carbonation_score, \
     t.perception_score, t.final_score, t.created_at \
     FROM tastings t \
     JOIN beers b ON b.id = t.beer_id \
     JOIN breweries br ON br.id = b.brewery_id";

/// Fetches one tasting filtered by id and owner in a single statement.
/// With `lock` set, the tasting row stays locked until the transaction ends.
async fn fetch_owned_tasting(
    conn: &mut PgConnection,
    user_id: Uuid,
    tasting_id: Uuid,
    lock: bool,
) -> PortResult<Tasting> {
    let sql = format!(
        "{} WHERE t.id = $1 AND t.user_id = $2{}",
        SELECT_TASTING,
        if lock { " FOR UPDATE OF t" } else { "" }
    );
    let record = sqlx::query_as::<_, TastingRecord>(&sql)
        .bind(tasting_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Tasting {} not found", tasting_id)))?;
    Ok(record.to_domain())
}

/// Get-or-create a brewery by its unique name.
///
/// A concurrent insert of the same name makes `ON CONFLICT DO NOTHING` wait for
/// the other transaction, so the follow-up read always finds exactly one row.
async fn upsert_brewery(conn: &mut PgConnection, name: &str) -> PortResult<Brewery> {
    sqlx::query("INSERT INTO breweries (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
        .bind(Uuid::new_v4())
        .bind(name)
        .execute(&mut *conn)
        .await
        .map_err(unexpected)?;

    let record = sqlx::query_as::<_, BreweryRecord>("SELECT id, name FROM breweries WHERE name = $1")
        .bind(name)
        .fetch_one(&mut *conn)
        .await
        .map_err(unexpected)?;
    Ok(Brewery {
        id: record.id,
        name: record.name,
    })
}

/// Get-or-create a beer by its (name, brewery) key.
async fn upsert_beer(conn: &mut PgConnection, brewery: Brewery, name: &str) -> PortResult<Beer> {
    sqlx::query(
        "INSERT INTO beers (id, name, brewery_id) VALUES ($1, $2, $3) \
         ON CONFLICT (name, brewery_id) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(brewery.id)
    .execute(&mut *conn)
    .await
    .map_err(unexpected)?;

    let record = sqlx::query_as::<_, BeerRecord>(
        "SELECT id, name FROM beers WHERE name = $1 AND brewery_id = $2",
    )
    .bind(name)
    .bind(brewery.id)
    .fetch_one(&mut *conn)
    .await
    .map_err(unexpected)?;
    Ok(Beer {
        id: record.id,
        name: record.name,
        brewery,
    })
}

async fn resolve_beer_in(
    conn: &mut PgConnection,
    brewery_name: &str,
    beer_name: &str,
) -> PortResult<Beer> {
    let brewery = upsert_brewery(conn, brewery_name).await?;
    let beer = upsert_beer(conn, brewery, beer_name).await?;
    debug!(beer_id = %beer.id, brewery_id = %beer.brewery.id, "Resolved beer");
    Ok(beer)
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3) RETURNING id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
                PortError::Conflict(format!("Email {} is already registered", email))
            } else {
                unexpected(e)
            }
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_tasting(&self, user_id: Uuid, tasting: NewTasting) -> PortResult<Tasting> {
        // Any early return drops `tx`, which rolls the whole unit back.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let beer = resolve_beer_in(&mut tx, &tasting.brewery_name, &tasting.beer_name).await?;
        let final_score = tasting.final_score();
        let tasting_id = Uuid::new_v4();
        let notes = &tasting.notes;
        let sensory = &tasting.scores.sensory;

        sqlx::query(
            "INSERT INTO tastings (id, user_id, beer_id, \
             appearance, foam, aroma, flavor, creaminess, aftertaste, drinkability, dry_finish, \
             carbonation, ideal_occasion, image_url, \
             appearance_score, foam_score, aroma_score, flavor_score, creaminess_score, \
             aftertaste_score, drinkability_score, dry_finish_score, carbonation_score, \
             perception_score, final_score) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
             $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25)",
        )
        .bind(tasting_id)
        .bind(user_id)
        .bind(beer.id)
        .bind(&notes.appearance)
        .bind(&notes.foam)
        .bind(&notes.aroma)
        .bind(&notes.flavor)
        .bind(&notes.creaminess)
        .bind(&notes.aftertaste)
        .bind(&notes.drinkability)
        .bind(&notes.dry_finish)
        .bind(&notes.carbonation)
        .bind(&notes.ideal_occasion)
        .bind(&tasting.image_url)
        .bind(sensory.appearance)
        .bind(sensory.foam)
        .bind(sensory.aroma)
        .bind(sensory.flavor)
        .bind(sensory.creaminess)
        .bind(sensory.aftertaste)
        .bind(sensory.drinkability)
        .bind(sensory.dry_finish)
        .bind(sensory.carbonation)
        .bind(tasting.scores.perception)
        .bind(final_score)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        let created = fetch_owned_tasting(&mut tx, user_id, tasting_id, false).await?;
        tx.commit().await.map_err(unexpected)?;

        info!(tasting_id = %created.id, user_id = %user_id, "Tasting created");
        Ok(created)
    }

    async fn update_tasting(
        &self,
        user_id: Uuid,
        tasting_id: Uuid,
        patch: TastingPatch,
    ) -> PortResult<Tasting> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let current = fetch_owned_tasting(&mut tx, user_id, tasting_id, true).await?;
        let TastingRevision {
            beer,
            notes,
            scores,
            final_score,
            image_url,
        } = current.revise(patch);

        let beer_id = match beer {
            BeerSelection::Keep(id) => id,
            BeerSelection::Resolve {
                brewery_name,
                beer_name,
            } => resolve_beer_in(&mut tx, &brewery_name, &beer_name).await?.id,
        };
        let sensory = &scores.sensory;

        let result = sqlx::query(
            "UPDATE tastings SET beer_id = $3, \
             appearance = $4, foam = $5, aroma = $6, flavor = $7, creaminess = $8, \
             aftertaste = $9, drinkability = $10, dry_finish = $11, carbonation = $12, \
             ideal_occasion = $13, image_url = $14, \
             appearance_score = $15, foam_score = $16, aroma_score = $17, flavor_score = $18, \
             creaminess_score = $19, aftertaste_score = $20, drinkability_score = $21, \
             dry_finish_score = $22, carbonation_score = $23, perception_score = $24, \
             final_score = $25 \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(tasting_id)
        .bind(user_id)
        .bind(beer_id)
        .bind(&notes.appearance)
        .bind(&notes.foam)
        .bind(&notes.aroma)
        .bind(&notes.flavor)
        .bind(&notes.creaminess)
        .bind(&notes.aftertaste)
        .bind(&notes.drinkability)
        .bind(&notes.dry_finish)
        .bind(&notes.carbonation)
        .bind(&notes.ideal_occasion)
        .bind(&image_url)
        .bind(sensory.appearance)
        .bind(sensory.foam)
        .bind(sensory.aroma)
        .bind(sensory.flavor)
        .bind(sensory.creaminess)
        .bind(sensory.aftertaste)
        .bind(sensory.drinkability)
        .bind(sensory.dry_finish)
        .bind(sensory.carbonation)
        .bind(scores.perception)
        .bind(final_score)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Tasting {} not found", tasting_id)));
        }

        let updated = fetch_owned_tasting(&mut tx, user_id, tasting_id, false).await?;
        tx.commit().await.map_err(unexpected)?;

        info!(tasting_id = %tasting_id, user_id = %user_id, "Tasting updated");
        Ok(updated)
    }

    async fn get_tasting(&self, user_id: Uuid, tasting_id: Uuid) -> PortResult<Tasting> {
        let mut conn = self.pool.acquire().await.map_err(unexpected)?;
        fetch_owned_tasting(&mut conn, user_id, tasting_id, false).await
    }

    async fn list_tastings(&self, user_id: Uuid) -> PortResult<Vec<TastingSummary>> {
        let records = sqlx::query_as::<_, TastingSummaryRecord>(
            "SELECT t.id, b.name AS beer_name, br.name AS brewery_name, \
             t.final_score, t.created_at, t.image_url \
             FROM tastings t \
             JOIN beers b ON b.id = t.beer_id \
             JOIN breweries br ON br.id = b.brewery_id \
             WHERE t.user_id = $1 \
             ORDER BY t.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let tastings = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(tastings)
    }

    async fn delete_tasting(&self, user_id: Uuid, tasting_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM tastings WHERE id = $1 AND user_id = $2")
            .bind(tasting_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Tasting {} not found", tasting_id)));
        }
        info!(tasting_id = %tasting_id, user_id = %user_id, "Tasting deleted");
        Ok(())
    }
}
