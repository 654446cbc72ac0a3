//! Core data types for the health ledger
//!
//! This module defines the fundamental types used throughout the ledger:
//! - `DailyRecord`: One calendar day's accumulated intake and activity
//! - `LedgerState`: The persisted aggregate root
//! - `ProgressEntry`: A progress photo with its logged weight
//! - `Goal`: The user's primary health objective
//! - `DailyStats`, `ActivityDelta`, `WeeklyHistory`: Read models

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Default daily calorie budget in kcal
pub const DEFAULT_CALORIE_TARGET: u32 = 2200;

/// Default target body weight in kg
pub const DEFAULT_TARGET_WEIGHT: f64 = 70.0;

/// `last_sync` value before the first wearable sync
pub const NEVER_SYNCED: &str = "Never";

/// Display format for progress entry dates ("Jan 08, 2026")
pub const PROGRESS_DATE_FORMAT: &str = "%b %d, %Y";

/// Short chart label format ("Jan 08")
pub const SHORT_DATE_FORMAT: &str = "%b %d";

/// One calendar day's accumulated intake and activity
///
/// Archived records carry `burned = 0`; only the live day tracks calories burned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyRecord {
    /// Calories consumed (kcal)
    pub consumed: u32,
    /// Protein eaten (g)
    pub protein: u32,
    /// Carbohydrates eaten (g)
    pub carbs: u32,
    /// Fats eaten (g)
    pub fats: u32,
    /// Steps walked
    pub steps: u32,
    /// Calories burned by activity (kcal)
    pub burned: u32,
}

impl DailyRecord {
    /// A day counts as active when anything was eaten or walked
    pub fn is_active(&self) -> bool {
        self.consumed > 0 || self.steps > 0
    }

    /// Copy of this record as it is written into history
    pub fn archived(&self) -> Self {
        Self { burned: 0, ..*self }
    }
}

/// The user's primary health objective
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    #[serde(alias = "\u{1F525} Lose Fat", alias = "Lose Fat")]
    LoseFat,
    #[serde(alias = "\u{1F957} Eat Healthy", alias = "Eat Healthy")]
    EatHealthy,
    #[serde(alias = "\u{1F6AB} Cut Sugar", alias = "Cut Sugar")]
    CutSugar,
    #[default]
    #[serde(
        alias = "\u{1F3CB}\u{FE0F} Strength & Recovery",
        alias = "Strength & Recovery"
    )]
    StrengthRecovery,
}

impl Goal {
    /// Get all goals for iteration
    pub fn all() -> &'static [Goal] {
        &[
            Goal::LoseFat,
            Goal::EatHealthy,
            Goal::CutSugar,
            Goal::StrengthRecovery,
        ]
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Goal::LoseFat => "Lose Fat",
            Goal::EatHealthy => "Eat Healthy",
            Goal::CutSugar => "Cut Sugar",
            Goal::StrengthRecovery => "Strength & Recovery",
        }
    }

    /// Recommended foods for this goal
    pub fn suggestions(&self) -> [&'static str; 3] {
        match self {
            Goal::LoseFat => [
                "High-Protein Salad Bowl",
                "Metabolism-Boosting Tea",
                "Light Lentil Soup",
            ],
            Goal::EatHealthy => [
                "Mixed Veggie Stir-fry",
                "Fresh Local Fruit Bowl",
                "Wholesome Grain Wrap",
            ],
            Goal::CutSugar => ["Spiced Yogurt", "Roasted Nuts & Seeds", "Herbal Infusion"],
            Goal::StrengthRecovery => [
                "Post-Workout Protein Shake",
                "Lean Meat & Sweet Potato",
                "Protein-Rich Legume Dish",
            ],
        }
    }
}

impl std::fmt::Display for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A progress photo with the body weight logged alongside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    /// Upload date in `PROGRESS_DATE_FORMAT`
    pub date: String,
    /// Photo reference (unique, derived from the stored file name)
    #[serde(rename = "image")]
    pub reference: String,
    /// Weight in kg as a decimal string
    pub weight: String,
}

/// Profile fields editable by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub location: String,
    pub goal: Goal,
    pub target_weight: f64,
}

/// The persisted aggregate root
///
/// Invariant: `history` never holds an entry for `current_date`; the live
/// day is kept in `today` until rollover archives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    pub name: String,
    pub location: String,
    /// Daily calorie budget (kcal)
    pub target: u32,
    #[serde(flatten)]
    pub today: DailyRecord,
    /// Time of day of the last wearable sync, or `NEVER_SYNCED`
    pub last_sync: String,
    #[serde(deserialize_with = "optional_date")]
    pub current_date: Option<NaiveDate>,
    pub goal: Goal,
    #[serde(deserialize_with = "number_or_string")]
    pub target_weight: f64,
    /// Free-text description of the current strain or injury
    pub active_strain: String,
    pub recovery_mode: bool,
    pub history: BTreeMap<NaiveDate, DailyRecord>,
    pub progress_log: Vec<ProgressEntry>,
}

impl LedgerState {
    /// Default state for a ledger first opened on `today`
    pub fn with_defaults(today: NaiveDate) -> Self {
        Self {
            name: String::new(),
            location: String::new(),
            target: DEFAULT_CALORIE_TARGET,
            today: DailyRecord::default(),
            last_sync: NEVER_SYNCED.to_string(),
            current_date: Some(today),
            goal: Goal::default(),
            target_weight: DEFAULT_TARGET_WEIGHT,
            active_strain: String::new(),
            recovery_mode: false,
            history: BTreeMap::new(),
            progress_log: Vec::new(),
        }
    }

    /// Record for a calendar date: the live day, an archived day, or zeros
    pub fn record_for(&self, date: NaiveDate) -> DailyRecord {
        if self.current_date == Some(date) {
            self.today
        } else {
            self.history.get(&date).copied().unwrap_or_default()
        }
    }

    /// Profile view of the state
    pub fn profile(&self) -> Profile {
        Profile {
            name: self.name.clone(),
            location: self.location.clone(),
            goal: self.goal,
            target_weight: self.target_weight,
        }
    }
}

/// Today's numbers plus the derived calorie allowance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub target: u32,
    #[serde(flatten)]
    pub today: DailyRecord,
    /// `max(0, target + burned - consumed)`
    pub remaining: u32,
    pub last_sync: String,
    pub recovery_mode: bool,
    pub active_strain: String,
}

/// Steps and calories added by a single wearable sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDelta {
    pub steps: u32,
    pub burned: u32,
}

/// Seven-day intake series, oldest first, ending today
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyHistory {
    pub days: Vec<NaiveDate>,
    /// Chart labels in `SHORT_DATE_FORMAT`
    pub dates: Vec<String>,
    pub consumed: Vec<u32>,
    pub protein: Vec<u32>,
    pub carbs: Vec<u32>,
    pub fats: Vec<u32>,
}

impl WeeklyHistory {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Accept `70.5` or `"70.5"` for numeric profile fields
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("not a number: {:?}", s))),
    }
}

/// Accept `null`, `""` or an ISO date for `current_date`
fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
