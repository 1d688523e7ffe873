pub mod domain;
pub mod ports;
pub mod scoring;

pub use domain::{
    Beer, BeerSelection, Brewery, NewTasting, RankingEntry, Tasting, TastingNotes,
    TastingPatch, TastingRevision, TastingSummary, User, UserCredentials,
};
pub use ports::{BlobStore, DatabaseService, PortError, PortResult};
pub use scoring::{final_score, ScoreSheet, SensoryScores, SCORE_MAX, SCORE_MIN};
