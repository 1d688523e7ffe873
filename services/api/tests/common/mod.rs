//! In-memory doubles of the core ports and helpers for driving the router.

#![allow(dead_code)]

use api_lib::adapters::LocalBlobStore;
use api_lib::config::Config;
use api_lib::web::{build_router, state::AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use beer_journal_core::domain::{
    Beer, BeerSelection, Brewery, NewTasting, Tasting, TastingPatch, TastingSummary, User,
    UserCredentials,
};
use beer_journal_core::ports::{DatabaseService, PortError, PortResult};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

//=========================================================================================
// In-memory DatabaseService
//=========================================================================================

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    breweries: Vec<Brewery>,
    /// (beer id, beer name, brewery id)
    beers: Vec<(Uuid, String, Uuid)>,
    tastings: Vec<Tasting>,
}

impl Tables {
    fn resolve(&mut self, brewery_name: &str, beer_name: &str) -> Beer {
        let brewery = match self.breweries.iter().find(|b| b.name == brewery_name) {
            Some(existing) => existing.clone(),
            None => {
                let created = Brewery {
                    id: Uuid::new_v4(),
                    name: brewery_name.to_string(),
                };
                self.breweries.push(created.clone());
                created
            }
        };
        let beer_id = match self
            .beers
            .iter()
            .find(|(_, name, brewery_id)| name == beer_name && *brewery_id == brewery.id)
        {
            Some((id, _, _)) => *id,
            None => {
                let id = Uuid::new_v4();
                self.beers.push((id, beer_name.to_string(), brewery.id));
                id
            }
        };
        Beer {
            id: beer_id,
            name: beer_name.to_string(),
            brewery,
        }
    }

    fn beer_by_id(&self, beer_id: Uuid) -> Option<Beer> {
        let (id, name, brewery_id) = self.beers.iter().find(|(id, _, _)| *id == beer_id)?;
        let brewery = self.breweries.iter().find(|b| b.id == *brewery_id)?;
        Some(Beer {
            id: *id,
            name: name.clone(),
            brewery: brewery.clone(),
        })
    }
}

/// Every operation holds the lock for its whole duration, which gives the
/// same all-or-nothing visibility as a database transaction.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn brewery_count(&self) -> usize {
        self.tables.lock().unwrap().breweries.len()
    }

    pub fn beer_count(&self) -> usize {
        self.tables.lock().unwrap().beers.len()
    }

    pub fn tasting_count(&self) -> usize {
        self.tables.lock().unwrap().tastings.len()
    }

    /// Makes tasting writes fail as if the connection dropped mid-transaction.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Adds an account without a password, as a federated login would.
    pub fn insert_federated_user(&self, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.lock().unwrap().users.push(UserCredentials {
            id,
            email: email.to_string(),
            hashed_password: None,
        });
        id
    }

    fn check_writes(&self) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(PortError::Unexpected(
                "connection reset by peer while writing tastings".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

fn not_found(tasting_id: Uuid) -> PortError {
    PortError::NotFound(format!("Tasting {} not found", tasting_id))
}

#[async_trait]
impl DatabaseService for MemoryStore {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.email == email) {
            return Err(PortError::Conflict(format!("Email {} is already registered", email)));
        }
        let id = Uuid::new_v4();
        tables.users.push(UserCredentials {
            id,
            email: email.to_string(),
            hashed_password: Some(hashed_password.to_string()),
        });
        Ok(User {
            id,
            email: email.to_string(),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        tables
            .sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let tables = self.tables.lock().unwrap();
        match tables.sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.lock().unwrap().sessions.remove(session_id);
        Ok(())
    }

    async fn create_tasting(&self, user_id: Uuid, tasting: NewTasting) -> PortResult<Tasting> {
        self.check_writes()?;
        let mut tables = self.tables.lock().unwrap();
        let beer = tables.resolve(&tasting.brewery_name, &tasting.beer_name);
        let created = Tasting {
            id: Uuid::new_v4(),
            user_id,
            beer,
            final_score: tasting.final_score(),
            notes: tasting.notes,
            scores: tasting.scores,
            image_url: tasting.image_url,
            created_at: Utc::now(),
        };
        tables.tastings.push(created.clone());
        Ok(created)
    }

    async fn update_tasting(
        &self,
        user_id: Uuid,
        tasting_id: Uuid,
        patch: TastingPatch,
    ) -> PortResult<Tasting> {
        self.check_writes()?;
        let mut tables = self.tables.lock().unwrap();
        let index = tables
            .tastings
            .iter()
            .position(|t| t.id == tasting_id && t.user_id == user_id)
            .ok_or_else(|| not_found(tasting_id))?;

        let revision = tables.tastings[index].revise(patch);
        let beer = match revision.beer {
            BeerSelection::Keep(beer_id) => tables
                .beer_by_id(beer_id)
                .ok_or_else(|| PortError::Unexpected("dangling beer id".to_string()))?,
            BeerSelection::Resolve {
                brewery_name,
                beer_name,
            } => tables.resolve(&brewery_name, &beer_name),
        };

        let stored = &mut tables.tastings[index];
        stored.beer = beer;
        stored.notes = revision.notes;
        stored.scores = revision.scores;
        stored.final_score = revision.final_score;
        stored.image_url = revision.image_url;
        Ok(stored.clone())
    }

    async fn get_tasting(&self, user_id: Uuid, tasting_id: Uuid) -> PortResult<Tasting> {
        let tables = self.tables.lock().unwrap();
        tables
            .tastings
            .iter()
            .find(|t| t.id == tasting_id && t.user_id == user_id)
            .cloned()
            .ok_or_else(|| not_found(tasting_id))
    }

    async fn list_tastings(&self, user_id: Uuid) -> PortResult<Vec<TastingSummary>> {
        let tables = self.tables.lock().unwrap();
        // Reverse insertion order first so equal timestamps still list newest first.
        let mut summaries: Vec<TastingSummary> = tables
            .tastings
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .map(|t| TastingSummary {
                id: t.id,
                beer_name: t.beer.name.clone(),
                brewery_name: t.beer.brewery.name.clone(),
                final_score: t.final_score,
                created_at: t.created_at,
                image_url: t.image_url.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn delete_tasting(&self, user_id: Uuid, tasting_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.tastings.len();
        tables
            .tastings
            .retain(|t| !(t.id == tasting_id && t.user_id == user_id));
        if tables.tastings.len() == before {
            return Err(not_found(tasting_id));
        }
        Ok(())
    }
}

//=========================================================================================
// Test App
//=========================================================================================

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub upload_dir: PathBuf,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn test_config(upload_dir: PathBuf) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: String::new(),
        database_max_connections: 1,
        log_level: tracing::Level::INFO,
        upload_dir,
        public_base_url: "http://localhost:3000".to_string(),
        cors_origin: "http://localhost:3000".to_string(),
        session_ttl_days: 30,
        max_upload_bytes: 1024 * 1024,
    }
}

pub fn spawn_app() -> TestApp {
    let upload_dir = std::env::temp_dir().join(format!("beer-journal-test-{}", Uuid::new_v4()));
    let config = Arc::new(test_config(upload_dir.clone()));
    let store = Arc::new(MemoryStore::default());
    let blob = Arc::new(LocalBlobStore::new(
        upload_dir.clone(),
        config.public_base_url.clone(),
    ));
    let state = Arc::new(AppState {
        db: store.clone(),
        blob,
        config,
    });
    TestApp {
        router: build_router(state),
        store,
        upload_dir,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Signs up `email` and returns the `session=<id>` cookie pair.
    pub async fn signup(&self, email: &str) -> String {
        let response = self
            .send(
                Method::POST,
                "/api/auth/signup",
                None,
                Some(serde_json::json!({ "email": email, "password": "hunter22" })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        session_cookie(&response.headers).expect("signup sets a session cookie")
    }
}

/// Extracts `session=<id>` from a `Set-Cookie` header.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(|pair| pair.trim().to_string())
}

pub fn tasting_body(beer: &str, brewery: &str, sensory: f64, perception: f64) -> Value {
    serde_json::json!({
        "beerName": beer,
        "breweryName": brewery,
        "appearance": "clear gold",
        "aroma": "citrus",
        "appearanceScore": sensory,
        "foamScore": sensory,
        "aromaScore": sensory,
        "flavorScore": sensory,
        "creaminessScore": sensory,
        "aftertasteScore": sensory,
        "drinkabilityScore": sensory,
        "dryFinishScore": sensory,
        "carbonationScore": sensory,
        "perceptionScore": perception
    })
}
