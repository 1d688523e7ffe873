//! crates/beer_journal_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use crate::scoring::{ScoreSheet, SensoryScores};
use chrono::{DateTime, Utc};
use uuid::Uuid;

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data.
// `hashed_password` is absent for federated accounts.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brewery {
    pub id: Uuid,
    pub name: String,
}

/// A beer, unique by name within its brewery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beer {
    pub id: Uuid,
    pub name: String,
    pub brewery: Brewery,
}

/// The free-text half of a tasting sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TastingNotes {
    pub appearance: String,
    pub foam: String,
    pub aroma: String,
    pub flavor: String,
    pub creaminess: String,
    pub aftertaste: String,
    pub drinkability: String,
    pub dry_finish: String,
    pub carbonation: String,
    pub ideal_occasion: Option<String>,
}

/// One user's recorded evaluation of one beer.
#[derive(Debug, Clone)]
pub struct Tasting {
    pub id: Uuid,
    pub user_id: Uuid,
    pub beer: Beer,
    pub notes: TastingNotes,
    pub scores: ScoreSheet,
    pub final_score: f64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The list-view projection of a tasting.
#[derive(Debug, Clone)]
pub struct TastingSummary {
    pub id: Uuid,
    pub beer_name: String,
    pub brewery_name: String,
    pub final_score: f64,
    pub created_at: DateTime<Utc>,
    pub image_url: Option<String>,
}

/// One bar of the ranking chart.
#[derive(Debug, Clone)]
pub struct RankingEntry {
    pub id: Uuid,
    pub label: String,
    pub score: f64,
}

impl From<&TastingSummary> for RankingEntry {
    fn from(summary: &TastingSummary) -> Self {
        Self {
            id: summary.id,
            label: format!("{} - {}", summary.beer_name, summary.brewery_name),
            score: crate::scoring::round_for_display(summary.final_score),
        }
    }
}

//=========================================================================================
// Write-side inputs
//=========================================================================================

/// A validated tasting submission. Names are already trimmed and non-empty,
/// scores already inside the accepted range.
#[derive(Debug, Clone)]
pub struct NewTasting {
    pub beer_name: String,
    pub brewery_name: String,
    pub notes: TastingNotes,
    pub scores: ScoreSheet,
    pub image_url: Option<String>,
}

impl NewTasting {
    pub fn final_score(&self) -> f64 {
        self.scores.final_score()
    }
}

/// A validated partial update. `None` means "keep the stored value".
///
/// The nullable columns use a nested option: `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct TastingPatch {
    pub beer_name: Option<String>,
    pub brewery_name: Option<String>,

    pub appearance: Option<String>,
    pub foam: Option<String>,
    pub aroma: Option<String>,
    pub flavor: Option<String>,
    pub creaminess: Option<String>,
    pub aftertaste: Option<String>,
    pub drinkability: Option<String>,
    pub dry_finish: Option<String>,
    pub carbonation: Option<String>,
    pub ideal_occasion: Option<Option<String>>,
    pub image_url: Option<Option<String>>,

    pub appearance_score: Option<f64>,
    pub foam_score: Option<f64>,
    pub aroma_score: Option<f64>,
    pub flavor_score: Option<f64>,
    pub creaminess_score: Option<f64>,
    pub aftertaste_score: Option<f64>,
    pub drinkability_score: Option<f64>,
    pub dry_finish_score: Option<f64>,
    pub carbonation_score: Option<f64>,
    pub perception_score: Option<f64>,
}

/// Which beer a revised tasting points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeerSelection {
    /// Keep the current beer id.
    Keep(Uuid),
    /// Re-run get-or-create on this pair and repoint.
    Resolve {
        brewery_name: String,
        beer_name: String,
    },
}

/// The full replacement state of a tasting after a patch has been overlaid.
#[derive(Debug, Clone)]
pub struct TastingRevision {
    pub beer: BeerSelection,
    pub notes: TastingNotes,
    pub scores: ScoreSheet,
    pub final_score: f64,
    pub image_url: Option<String>,
}

impl Tasting {
    /// Overlays `patch` on the stored tasting and recomputes the final score
    /// from the merged values.
    ///
    /// If only one of the beer/brewery names is supplied, the other is taken
    /// from the current beer and the pair is re-resolved. A lone name is never
    /// dropped, so renaming just the beer keeps its brewery.
    pub fn revise(&self, patch: TastingPatch) -> TastingRevision {
        let beer = if patch.beer_name.is_some() || patch.brewery_name.is_some() {
            BeerSelection::Resolve {
                brewery_name: patch
                    .brewery_name
                    .unwrap_or_else(|| self.beer.brewery.name.clone()),
                beer_name: patch.beer_name.unwrap_or_else(|| self.beer.name.clone()),
            }
        } else {
            BeerSelection::Keep(self.beer.id)
        };

        let current = &self.notes;
        let notes = TastingNotes {
            appearance: patch.appearance.unwrap_or_else(|| current.appearance.clone()),
            foam: patch.foam.unwrap_or_else(|| current.foam.clone()),
            aroma: patch.aroma.unwrap_or_else(|| current.aroma.clone()),
            flavor: patch.flavor.unwrap_or_else(|| current.flavor.clone()),
            creaminess: patch.creaminess.unwrap_or_else(|| current.creaminess.clone()),
            aftertaste: patch.aftertaste.unwrap_or_else(|| current.aftertaste.clone()),
            drinkability: patch
                .drinkability
                .unwrap_or_else(|| current.drinkability.clone()),
            dry_finish: patch.dry_finish.unwrap_or_else(|| current.dry_finish.clone()),
            carbonation: patch
                .carbonation
                .unwrap_or_else(|| current.carbonation.clone()),
            ideal_occasion: patch
                .ideal_occasion
                .unwrap_or_else(|| current.ideal_occasion.clone()),
        };

        let s = &self.scores.sensory;
        let scores = ScoreSheet {
            sensory: SensoryScores {
                appearance: patch.appearance_score.unwrap_or(s.appearance),
                foam: patch.foam_score.unwrap_or(s.foam),
                aroma: patch.aroma_score.unwrap_or(s.aroma),
                flavor: patch.flavor_score.unwrap_or(s.flavor),
                creaminess: patch.creaminess_score.unwrap_or(s.creaminess),
                aftertaste: patch.aftertaste_score.unwrap_or(s.aftertaste),
                drinkability: patch.drinkability_score.unwrap_or(s.drinkability),
                dry_finish: patch.dry_finish_score.unwrap_or(s.dry_finish),
                carbonation: patch.carbonation_score.unwrap_or(s.carbonation),
            },
            perception: patch.perception_score.unwrap_or(self.scores.perception),
        };

        TastingRevision {
            beer,
            notes,
            final_score: scores.final_score(),
            scores,
            image_url: patch.image_url.unwrap_or_else(|| self.image_url.clone()),
        }
    }
}
