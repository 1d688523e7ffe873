//! services/api/src/web/forms.rs
//!
//! Request bodies for creating and editing tastings, and their validation
//! into the core `NewTasting` / `TastingPatch` types.
//!
//! Validation collects every failing field before rejecting, so the client can
//! highlight all of them at once. Fields are read as raw JSON values so that a
//! wrong type lands in the same per-field report as any other mistake.

use crate::error::FieldErrors;
use axum::http::Uri;
use beer_journal_core::domain::{NewTasting, TastingNotes, TastingPatch};
use beer_journal_core::scoring::{is_valid_score, ScoreSheet, SensoryScores};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use utoipa::ToSchema;

const REQUIRED: &str = "Required";
const EMPTY_NAME: &str = "Must not be empty";
const NOT_A_STRING: &str = "Expected a string";
const NOT_A_NUMBER: &str = "Expected a number";
const OUT_OF_RANGE: &str = "Must be between 0 and 10";
const INVALID_URL: &str = "Invalid url";

/// Lets a nullable field tell "absent" (`None`) apart from "null" (`Some(Value::Null)`).
fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn push_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

/// Reads an optional text field. Anything but a string is reported and dropped.
fn text_field(field: &str, value: Option<Value>, errors: &mut FieldErrors) -> Option<String> {
    match value? {
        Value::String(text) => Some(text),
        _ => {
            push_error(errors, field, NOT_A_STRING);
            None
        }
    }
}

/// Like `text_field`, but keeps an explicit `null` as `Some(None)`.
fn nullable_text_field(
    field: &str,
    value: Option<Value>,
    errors: &mut FieldErrors,
) -> Option<Option<String>> {
    match value? {
        Value::Null => Some(None),
        Value::String(text) => Some(Some(text)),
        _ => {
            push_error(errors, field, NOT_A_STRING);
            None
        }
    }
}

//=========================================================================================
// Shared Field Groups
//=========================================================================================

/// The nine descriptive texts. Absent fields default to an empty string on create.
#[derive(Deserialize, ToSchema, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NoteFields {
    #[schema(value_type = Option<String>)]
    pub appearance: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub foam: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub aroma: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub flavor: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub creaminess: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub aftertaste: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub drinkability: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub dry_finish: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub carbonation: Option<Value>,
}

impl NoteFields {
    /// Every present note, in declaration order.
    fn parse(self, errors: &mut FieldErrors) -> [Option<String>; 9] {
        [
            ("appearance", self.appearance),
            ("foam", self.foam),
            ("aroma", self.aroma),
            ("flavor", self.flavor),
            ("creaminess", self.creaminess),
            ("aftertaste", self.aftertaste),
            ("drinkability", self.drinkability),
            ("dryFinish", self.dry_finish),
            ("carbonation", self.carbonation),
        ]
        .map(|(field, value)| text_field(field, value, errors))
    }
}

/// The ten scores. Each accepts a JSON number or a numeric string.
#[derive(Deserialize, ToSchema, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ScoreFields {
    #[schema(value_type = Option<f64>)]
    pub appearance_score: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub foam_score: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub aroma_score: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub flavor_score: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub creaminess_score: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub aftertaste_score: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub drinkability_score: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub dry_finish_score: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub carbonation_score: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub perception_score: Option<Value>,
}

/// Coerces a JSON value into a score, checking the accepted range.
fn coerce_score(value: &Value) -> Result<f64, &'static str> {
    let number = match value {
        Value::Number(n) => n.as_f64().ok_or(NOT_A_NUMBER)?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| NOT_A_NUMBER)?,
        _ => return Err(NOT_A_NUMBER),
    };
    if is_valid_score(number) {
        Ok(number)
    } else {
        Err(OUT_OF_RANGE)
    }
}

impl ScoreFields {
    fn entries(&self) -> [(&'static str, Option<&Value>); 10] {
        [
            ("appearanceScore", self.appearance_score.as_ref()),
            ("foamScore", self.foam_score.as_ref()),
            ("aromaScore", self.aroma_score.as_ref()),
            ("flavorScore", self.flavor_score.as_ref()),
            ("creaminessScore", self.creaminess_score.as_ref()),
            ("aftertasteScore", self.aftertaste_score.as_ref()),
            ("drinkabilityScore", self.drinkability_score.as_ref()),
            ("dryFinishScore", self.dry_finish_score.as_ref()),
            ("carbonationScore", self.carbonation_score.as_ref()),
            ("perceptionScore", self.perception_score.as_ref()),
        ]
    }

    /// Parses every present score, in `entries` order. Absent scores are
    /// reported as errors only when `required` is set.
    fn parse(&self, required: bool, errors: &mut FieldErrors) -> [Option<f64>; 10] {
        self.entries().map(|(field, value)| match value {
            Some(value) => match coerce_score(value) {
                Ok(score) => Some(score),
                Err(message) => {
                    push_error(errors, field, message);
                    None
                }
            },
            None => {
                if required {
                    push_error(errors, field, REQUIRED);
                }
                None
            }
        })
    }
}

/// Trims a name and checks it is non-empty.
fn parse_name(field: &str, value: Option<&str>, errors: &mut FieldErrors) -> Option<String> {
    match value.map(str::trim) {
        Some(name) if !name.is_empty() => Some(name.to_string()),
        Some(_) => {
            push_error(errors, field, EMPTY_NAME);
            None
        }
        None => None,
    }
}

/// An absolute http(s) URL, or `None` for an empty string.
fn parse_image_url(value: &str, errors: &mut FieldErrors) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let valid = value.parse::<Uri>().is_ok_and(|uri| {
        matches!(uri.scheme_str(), Some("http") | Some("https")) && uri.authority().is_some()
    });
    if valid {
        Some(value.to_string())
    } else {
        push_error(errors, "imageUrl", INVALID_URL);
        None
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

//=========================================================================================
// Create
//=========================================================================================

/// The body of `POST /api/tastings`.
#[derive(Deserialize, ToSchema, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateTastingRequest {
    #[schema(value_type = String)]
    pub beer_name: Option<Value>,
    #[schema(value_type = String)]
    pub brewery_name: Option<Value>,
    #[serde(flatten)]
    pub notes: NoteFields,
    #[schema(value_type = Option<String>)]
    pub ideal_occasion: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Value>,
    #[serde(flatten)]
    pub scores: ScoreFields,
}

/// A name that must be present, a string, and non-empty after trimming.
fn required_name(field: &str, value: Option<Value>, errors: &mut FieldErrors) -> Option<String> {
    if value.is_none() {
        push_error(errors, field, REQUIRED);
        return None;
    }
    let text = text_field(field, value, errors)?;
    parse_name(field, Some(&text), errors)
}

impl CreateTastingRequest {
    pub fn validate(self) -> Result<NewTasting, FieldErrors> {
        let mut errors = FieldErrors::new();

        let beer_name = required_name("beerName", self.beer_name, &mut errors);
        let brewery_name = required_name("breweryName", self.brewery_name, &mut errors);
        let [appearance_note, foam_note, aroma_note, flavor_note, creaminess_note, aftertaste_note, drinkability_note, dry_finish_note, carbonation_note] =
            self.notes.parse(&mut errors);
        let ideal_occasion = text_field("idealOccasion", self.ideal_occasion, &mut errors);
        let image_url = text_field("imageUrl", self.image_url, &mut errors)
            .and_then(|url| parse_image_url(&url, &mut errors));
        let [appearance, foam, aroma, flavor, creaminess, aftertaste, drinkability, dry_finish, carbonation, perception] =
            self.scores.parse(true, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        // Every `None` above pushed an error, so the early return covers them.
        let (
            Some(beer_name),
            Some(brewery_name),
            Some(appearance),
            Some(foam),
            Some(aroma),
            Some(flavor),
            Some(creaminess),
            Some(aftertaste),
            Some(drinkability),
            Some(dry_finish),
            Some(carbonation),
            Some(perception),
        ) = (
            beer_name,
            brewery_name,
            appearance,
            foam,
            aroma,
            flavor,
            creaminess,
            aftertaste,
            drinkability,
            dry_finish,
            carbonation,
            perception,
        )
        else {
            return Err(errors);
        };

        Ok(NewTasting {
            beer_name,
            brewery_name,
            notes: TastingNotes {
                appearance: appearance_note.unwrap_or_default(),
                foam: foam_note.unwrap_or_default(),
                aroma: aroma_note.unwrap_or_default(),
                flavor: flavor_note.unwrap_or_default(),
                creaminess: creaminess_note.unwrap_or_default(),
                aftertaste: aftertaste_note.unwrap_or_default(),
                drinkability: drinkability_note.unwrap_or_default(),
                dry_finish: dry_finish_note.unwrap_or_default(),
                carbonation: carbonation_note.unwrap_or_default(),
                ideal_occasion: ideal_occasion.and_then(non_empty),
            },
            scores: ScoreSheet {
                sensory: SensoryScores {
                    appearance,
                    foam,
                    aroma,
                    flavor,
                    creaminess,
                    aftertaste,
                    drinkability,
                    dry_finish,
                    carbonation,
                },
                perception,
            },
            image_url,
        })
    }
}

//=========================================================================================
// Update
//=========================================================================================

/// The body of `PATCH /api/tastings/{id}`. Every field is optional.
#[derive(Deserialize, ToSchema, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTastingRequest {
    #[schema(value_type = Option<String>)]
    pub beer_name: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub brewery_name: Option<Value>,
    #[serde(flatten)]
    pub notes: NoteFields,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub ideal_occasion: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Value>,
    #[serde(flatten)]
    pub scores: ScoreFields,
}

impl UpdateTastingRequest {
    pub fn validate(self) -> Result<TastingPatch, FieldErrors> {
        let mut errors = FieldErrors::new();

        let beer_name = text_field("beerName", self.beer_name, &mut errors);
        let beer_name = parse_name("beerName", beer_name.as_deref(), &mut errors);
        let brewery_name = text_field("breweryName", self.brewery_name, &mut errors);
        let brewery_name = parse_name("breweryName", brewery_name.as_deref(), &mut errors);
        let [appearance, foam, aroma, flavor, creaminess, aftertaste, drinkability, dry_finish, carbonation] =
            self.notes.parse(&mut errors);
        let ideal_occasion = nullable_text_field("idealOccasion", self.ideal_occasion, &mut errors);
        let image_url = nullable_text_field("imageUrl", self.image_url, &mut errors)
            .map(|url| url.and_then(|url| parse_image_url(&url, &mut errors)));
        let [appearance_score, foam_score, aroma_score, flavor_score, creaminess_score, aftertaste_score, drinkability_score, dry_finish_score, carbonation_score, perception_score] =
            self.scores.parse(false, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TastingPatch {
            beer_name,
            brewery_name,
            appearance,
            foam,
            aroma,
            flavor,
            creaminess,
            aftertaste,
            drinkability,
            dry_finish,
            carbonation,
            ideal_occasion: ideal_occasion.map(|o| o.and_then(non_empty)),
            image_url,
            appearance_score,
            foam_score,
            aroma_score,
            flavor_score,
            creaminess_score,
            aftertaste_score,
            drinkability_score,
            dry_finish_score,
            carbonation_score,
            perception_score,
        })
    }
}
