//! AI Coach
//!
//! The generative-AI collaborator behind meal scanning, chat, recipes,
//! pantry ideas and recovery protocols.
//!
//! ## Contract
//!
//! - `describe_meal` is the only call that can fail; it returns a typed
//!   `CoachError` so the caller decides what to show.
//! - Every text call always returns text. Failures come back as an inline
//!   message in place of the content.
//! - Nothing here touches the ledger. Callers hold no ledger lock while a
//!   coach call is in flight.

mod client;

pub use client::{GeminiCoach, GeminiConfig};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Nutrition estimate for a photographed meal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEstimate {
    pub name: String,
    #[serde(deserialize_with = "whole_amount")]
    pub calories: u32,
    #[serde(deserialize_with = "whole_amount")]
    pub protein: u32,
    #[serde(deserialize_with = "whole_amount")]
    pub carbs: u32,
    #[serde(deserialize_with = "whole_amount")]
    pub fats: u32,
    /// One sentence of advice about the meal
    #[serde(default)]
    pub advice: String,
}

/// The AI coach collaborator
#[async_trait]
pub trait Coach: Send + Sync {
    /// Whether calls can reach the model at all
    fn is_online(&self) -> bool {
        true
    }

    /// Estimate name, calories and macros from a meal photo
    async fn describe_meal(&self, image: &[u8], mime_type: &str) -> Result<MealEstimate, CoachError>;

    /// Short motivational answer given the user's context line
    async fn chat(&self, message: &str, context: &str) -> String;

    /// Local recipe for `food` supporting `goal`, as Markdown
    async fn recipe(&self, food: &str, location: &str, goal: &str) -> String;

    /// Two recipes from the ingredients in a pantry photo, as Markdown
    async fn pantry(&self, image: &[u8], mime_type: &str, location: &str, goal: &str) -> String;

    /// Rehab and diet protocol for a strain, as Markdown
    async fn recovery_protocol(&self, strain: &str, location: &str) -> String;
}

/// Errors that can occur when calling the coach
#[derive(Error, Debug)]
pub enum CoachError {
    #[error("API key is missing. Set GEMINI_API_KEY to enable the coach.")]
    MissingCredentials,

    #[error("Failed to parse AI output: {0}")]
    MalformedResponse(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("The AI returned an empty response")]
    EmptyResponse,
}

impl CoachError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            CoachError::MissingCredentials => "MISSING_CREDENTIALS",
            CoachError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            CoachError::Transport(_) => "TRANSPORT_ERROR",
            CoachError::Api { .. } => "COACH_API_ERROR",
            CoachError::EmptyResponse => "EMPTY_RESPONSE",
        }
    }
}

/// Accept `420`, `420.7` or `"420"` and keep the whole part
fn whole_amount<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    let value = match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n,
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("not a number: {:?}", s)))?,
    };

    if !value.is_finite() || value < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative amount, got {}",
            value
        )));
    }
    Ok(value.trunc() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_meal_estimate_lenient_numbers() {
        let estimate: MealEstimate = serde_json::from_value(json!({
            "name": "Chicken Shawarma",
            "calories": 640.8,
            "protein": "38",
            "carbs": 52,
            "fats": 27
        }))
        .unwrap();

        assert_eq!(estimate.calories, 640);
        assert_eq!(estimate.protein, 38);
        assert_eq!(estimate.advice, "");
    }

    #[test]
    fn test_meal_estimate_rejects_negative() {
        let result = serde_json::from_value::<MealEstimate>(json!({
            "name": "Air",
            "calories": -5,
            "protein": 0,
            "carbs": 0,
            "fats": 0
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CoachError::MissingCredentials.code(), "MISSING_CREDENTIALS");
        assert_eq!(
            CoachError::Api {
                status: 429,
                message: "quota".to_string()
            }
            .to_string(),
            "API error 429: quota"
        );
    }
}
