//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use crate::analytics::{FoodProfile, MacroTargets, PortionPlan};
use crate::coach::MealEstimate;
use crate::ledger::{ActivityDelta, DailyStats, Goal, ProgressEntry};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================
// MEAL DTOs
// ============================================

/// Manual meal log request
#[derive(Debug, Deserialize)]
pub struct LogMealRequest {
    pub name: String,
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fats: f64,
}

/// Meal log response with the updated day
#[derive(Debug, Serialize, Deserialize)]
pub struct LogMealResponse {
    pub logged: String,
    pub stats: DailyStats,
}

/// Meal photo scan request
#[derive(Debug, Deserialize)]
pub struct ScanMealRequest {
    /// Base64 image, optionally as a `data:<mime>;base64,` URL
    pub image: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Log the estimate as a meal straight away
    #[serde(default)]
    pub log: bool,
}

/// Meal photo scan response
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanMealResponse {
    pub estimate: MealEstimate,
    pub logged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<DailyStats>,
}

// ============================================
// ACTIVITY DTOs
// ============================================

/// Wearable sync response
#[derive(Debug, Serialize, Deserialize)]
pub struct SyncActivityResponse {
    /// Steps and calories added by this sync
    pub added: ActivityDelta,
    pub stats: DailyStats,
}

// ============================================
// PROFILE DTOs
// ============================================

/// Profile update request
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub location: String,
    pub goal: Goal,
    /// kg, as a number or numeric string
    #[serde(deserialize_with = "number_as_text")]
    pub target_weight: String,
}

/// Goal suggestions response
#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub goal: Goal,
    pub label: String,
    pub suggestions: Vec<String>,
}

// ============================================
// RECOVERY DTOs
// ============================================

/// Enter recovery mode
#[derive(Debug, Deserialize)]
pub struct RecoveryRequest {
    pub description: String,
}

/// Recovery protocol response
#[derive(Debug, Serialize, Deserialize)]
pub struct RecoveryProtocolResponse {
    pub strain: String,
    pub protocol: String,
}

// ============================================
// PROGRESS DTOs
// ============================================

/// Progress photo log request
#[derive(Debug, Deserialize)]
pub struct LogProgressRequest {
    /// Reference of the stored photo
    pub reference: String,
    #[serde(deserialize_with = "number_as_text")]
    pub weight: String,
}

/// Progress log listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressListResponse {
    pub entries: Vec<ProgressEntry>,
    pub count: usize,
}

/// Progress delete response
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteProgressResponse {
    pub reference: String,
    pub deleted: bool,
}

// ============================================
// OPTIMIZER DTOs
// ============================================

/// Portion planner request; omitted fields use the default trio and targets
#[derive(Debug, Deserialize)]
pub struct OptimizerRequest {
    #[serde(default)]
    pub targets: MacroTargets,
    #[serde(default = "FoodProfile::default_trio")]
    pub foods: [FoodProfile; 3],
}

/// Portion planner response
#[derive(Debug, Serialize)]
pub struct OptimizerResponse {
    #[serde(flatten)]
    pub plan: PortionPlan,
    pub summary: String,
}

// ============================================
// COACH DTOs
// ============================================

/// Chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Recipe request; location and goal come from the profile
#[derive(Debug, Deserialize)]
pub struct RecipeRequest {
    pub food: String,
}

/// Pantry photo request
#[derive(Debug, Deserialize)]
pub struct PantryRequest {
    /// Base64 image, optionally as a `data:<mime>;base64,` URL
    pub image: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Text reply from the coach
#[derive(Debug, Serialize, Deserialize)]
pub struct CoachReply {
    pub reply: String,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded"
    pub status: String,
    /// Ledger status: "ok" or "error"
    pub ledger: String,
    /// Coach status: "online" or "offline"
    pub coach: String,
    pub uptime_seconds: u64,
    pub version: String,
}

/// Accept `72.5` or `"72.5"` and keep it as text for the ledger to validate
fn number_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}
