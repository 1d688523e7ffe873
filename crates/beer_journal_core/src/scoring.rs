//! crates/beer_journal_core/src/scoring.rs
//!
//! The score aggregator: turns nine sensory scores and one perception score
//! into the overall score stored on every tasting.

/// Lowest accepted value for any score.
pub const SCORE_MIN: f64 = 0.0;
/// Highest accepted value for any score.
pub const SCORE_MAX: f64 = 10.0;
/// Number of sensory attributes a tasting is scored on.
pub const SENSORY_COUNT: usize = 9;

/// Returns `true` when `value` is a finite number inside `[SCORE_MIN, SCORE_MAX]`.
pub fn is_valid_score(value: f64) -> bool {
    value.is_finite() && (SCORE_MIN..=SCORE_MAX).contains(&value)
}

/// Computes the overall score.
///
/// The sensory average always divides by nine: a missing sensory score counts
/// as zero and drags the average down rather than being left out.
/// No rounding happens here.
pub fn final_score(sensory: [Option<f64>; SENSORY_COUNT], perception: f64) -> f64 {
    let sum: f64 = sensory.iter().map(|s| s.unwrap_or(0.0)).sum();
    let sensory_average = sum / SENSORY_COUNT as f64;
    (sensory_average + perception) / 2.0
}

/// Rounds a score to one decimal place for display.
pub fn round_for_display(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

/// The nine 0-10 sensory ratings of a tasting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensoryScores {
    pub appearance: f64,
    pub foam: f64,
    pub aroma: f64,
    pub flavor: f64,
    pub creaminess: f64,
    pub aftertaste: f64,
    pub drinkability: f64,
    pub dry_finish: f64,
    pub carbonation: f64,
}

impl SensoryScores {
    /// All nine scores set to the same value.
    pub fn uniform(value: f64) -> Self {
        Self {
            appearance: value,
            foam: value,
            aroma: value,
            flavor: value,
            creaminess: value,
            aftertaste: value,
            drinkability: value,
            dry_finish: value,
            carbonation: value,
        }
    }

    pub fn as_array(&self) -> [f64; SENSORY_COUNT] {
        [
            self.appearance,
            self.foam,
            self.aroma,
            self.flavor,
            self.creaminess,
            self.aftertaste,
            self.drinkability,
            self.dry_finish,
            self.carbonation,
        ]
    }
}

/// Every score a user enters for one tasting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSheet {
    pub sensory: SensoryScores,
    pub perception: f64,
}

impl ScoreSheet {
    pub fn final_score(&self) -> f64 {
        final_score(self.sensory.as_array().map(Some), self.perception)
    }
}
