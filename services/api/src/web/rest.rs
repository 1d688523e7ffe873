//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the tasting REST endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{ErrorBody, HttpError};
use crate::web::auth::{self, AuthResponse, CredentialsRequest};
use crate::web::forms::{CreateTastingRequest, NoteFields, ScoreFields, UpdateTastingRequest};
use crate::web::state::AppState;
use crate::web::upload::{self, UploadResponse};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
};
use beer_journal_core::domain::{RankingEntry, Tasting, TastingSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        list_tastings_handler,
        create_tasting_handler,
        tasting_ranking_handler,
        get_tasting_handler,
        update_tasting_handler,
        delete_tasting_handler,
        upload::upload_handler,
    ),
    components(
        schemas(
            CredentialsRequest,
            AuthResponse,
            CreateTastingRequest,
            UpdateTastingRequest,
            NoteFields,
            ScoreFields,
            TastingResponse,
            TastingSummaryResponse,
            BeerResponse,
            BreweryResponse,
            BeerNameResponse,
            BreweryNameResponse,
            RankingEntryResponse,
            UploadResponse,
            ErrorBody,
        )
    ),
    tags(
        (name = "Beer Journal API", description = "API endpoints for the personal beer-tasting journal.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct BreweryNameResponse {
    name: String,
}

#[derive(Serialize, ToSchema)]
pub struct BeerNameResponse {
    name: String,
    brewery: BreweryNameResponse,
}

/// One card of the tasting list.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TastingSummaryResponse {
    id: Uuid,
    beer: BeerNameResponse,
    final_score: f64,
    created_at: DateTime<Utc>,
    image_url: Option<String>,
}

impl From<TastingSummary> for TastingSummaryResponse {
    fn from(summary: TastingSummary) -> Self {
        Self {
            id: summary.id,
            beer: BeerNameResponse {
                name: summary.beer_name,
                brewery: BreweryNameResponse {
                    name: summary.brewery_name,
                },
            },
            final_score: summary.final_score,
            created_at: summary.created_at,
            image_url: summary.image_url,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct BreweryResponse {
    id: Uuid,
    name: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BeerResponse {
    id: Uuid,
    name: String,
    brewery_id: Uuid,
    brewery: BreweryResponse,
}

/// A complete tasting with its beer and brewery.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TastingResponse {
    id: Uuid,
    user_id: Uuid,
    beer_id: Uuid,
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
    beer: BeerResponse,
}

impl From<Tasting> for TastingResponse {
    fn from(tasting: Tasting) -> Self {
        let notes = tasting.notes;
        let sensory = tasting.scores.sensory;
        Self {
            id: tasting.id,
            user_id: tasting.user_id,
            beer_id: tasting.beer.id,
            appearance: notes.appearance,
            foam: notes.foam,
            aroma: notes.aroma,
            flavor: notes.flavor,
            creaminess: notes.creaminess,
            aftertaste: notes.aftertaste,
            drinkability: notes.drinkability,
            dry_finish: notes.dry_finish,
            carbonation: notes.carbonation,
            ideal_occasion: notes.ideal_occasion,
            image_url: tasting.image_url,
            appearance_score: sensory.appearance,
            foam_score: sensory.foam,
            aroma_score: sensory.aroma,
            flavor_score: sensory.flavor,
            creaminess_score: sensory.creaminess,
            aftertaste_score: sensory.aftertaste,
            drinkability_score: sensory.drinkability,
            dry_finish_score: sensory.dry_finish,
            carbonation_score: sensory.carbonation,
            perception_score: tasting.scores.perception,
            final_score: tasting.final_score,
            created_at: tasting.created_at,
            beer: BeerResponse {
                id: tasting.beer.id,
                name: tasting.beer.name,
                brewery_id: tasting.beer.brewery.id,
                brewery: BreweryResponse {
                    id: tasting.beer.brewery.id,
                    name: tasting.beer.brewery.name,
                },
            },
        }
    }
}

/// One bar of the ranking chart; `score` is rounded to one decimal.
#[derive(Serialize, ToSchema)]
pub struct RankingEntryResponse {
    id: Uuid,
    label: String,
    score: f64,
}

impl From<RankingEntry> for RankingEntryResponse {
    fn from(entry: RankingEntry) -> Self {
        Self {
            id: entry.id,
            label: entry.label,
            score: entry.score,
        }
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

/// A malformed id can never name an owned tasting, so it is reported as 404.
fn tasting_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, HttpError> {
    path.map(|Path(id)| id)
        .map_err(|_| HttpError::NotFound("Tasting"))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, HttpError> {
    body.map(|Json(value)| value)
        .map_err(|e| HttpError::BadRequest(e.body_text()))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the caller's tastings, newest first.
#[utoipa::path(
    get,
    path = "/api/tastings",
    responses(
        (status = 200, description = "Tastings of the authenticated user", body = [TastingSummaryResponse]),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn list_tastings_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let tastings = state.db.list_tastings(user_id).await?;
    let body: Vec<TastingSummaryResponse> = tastings.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// Record a new tasting.
///
/// The brewery and beer are created on first use, and the final score is
/// computed from the submitted scores.
#[utoipa::path(
    post,
    path = "/api/tastings",
    request_body = CreateTastingRequest,
    responses(
        (status = 201, description = "Tasting created", body = TastingResponse),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn create_tasting_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    body: Result<Json<CreateTastingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let new_tasting = json_body(body)?
        .validate()
        .map_err(HttpError::Validation)?;

    let tasting = state
        .db
        .create_tasting(user_id, new_tasting)
        .await
        .map_err(|e| {
            error!("Failed to create tasting: {:?}", e);
            HttpError::from(e)
        })?;

    Ok((StatusCode::CREATED, Json(TastingResponse::from(tasting))))
}

/// The caller's tastings ranked by final score, best first.
#[utoipa::path(
    get,
    path = "/api/tastings/ranking",
    responses(
        (status = 200, description = "Ranking chart data", body = [RankingEntryResponse]),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn tasting_ranking_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    // Already newest first, and the stable sort keeps that order for ties.
    let mut tastings = state.db.list_tastings(user_id).await?;
    tastings.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
    });

    let body: Vec<RankingEntryResponse> = tastings
        .iter()
        .map(|t| RankingEntryResponse::from(RankingEntry::from(t)))
        .collect();
    Ok(Json(body))
}

/// Fetch one of the caller's tastings.
#[utoipa::path(
    get,
    path = "/api/tastings/{id}",
    params(("id" = Uuid, Path, description = "Tasting id")),
    responses(
        (status = 200, description = "The tasting", body = TastingResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "No such tasting for this user", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn get_tasting_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let id = tasting_id(path)?;
    let tasting = state.db.get_tasting(user_id, id).await?;
    Ok(Json(TastingResponse::from(tasting)))
}

/// Edit one of the caller's tastings. Only the supplied fields change; the
/// final score is recomputed from the merged result.
#[utoipa::path(
    patch,
    path = "/api/tastings/{id}",
    params(("id" = Uuid, Path, description = "Tasting id")),
    request_body = UpdateTastingRequest,
    responses(
        (status = 200, description = "Tasting updated", body = TastingResponse),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "No such tasting for this user", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn update_tasting_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateTastingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let id = tasting_id(path)?;
    let patch = json_body(body)?
        .validate()
        .map_err(HttpError::Validation)?;

    let tasting = state
        .db
        .update_tasting(user_id, id, patch)
        .await
        .map_err(|e| {
            error!("Failed to update tasting {}: {:?}", id, e);
            HttpError::from(e)
        })?;

    Ok(Json(TastingResponse::from(tasting)))
}

/// Delete one of the caller's tastings. The beer and brewery stay.
#[utoipa::path(
    delete,
    path = "/api/tastings/{id}",
    params(("id" = Uuid, Path, description = "Tasting id")),
    responses(
        (status = 204, description = "Tasting deleted"),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "No such tasting for this user", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn delete_tasting_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let id = tasting_id(path)?;
    state.db.delete_tasting(user_id, id).await?;
    info!(tasting_id = %id, "Tasting removed by owner");
    Ok(StatusCode::NO_CONTENT)
}
