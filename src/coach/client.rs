//! Gemini REST client
//!
//! Talks to the `generateContent` endpoint of the Gemini API. Without an API
//! key every call short-circuits to its offline answer and no request is made.

use crate::coach::{Coach, CoachError, MealEstimate};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const VISION_TEMPERATURE: f32 = 0.2;
const RECIPE_TEMPERATURE: f32 = 0.6;
const PANTRY_TEMPERATURE: f32 = 0.7;
const RECOVERY_TEMPERATURE: f32 = 0.4;

const EMPTY_PANTRY_REPLY: &str = "The AI returned an empty response. The image might be too blurry or triggered a safety filter. Try a clearer photo!";

/// Connection settings for the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// `None` puts the coach in offline mode
    pub api_key: Option<String>,
    pub model: String,
    /// API root, e.g. "https://generativelanguage.googleapis.com/v1beta"
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Coach backed by the Gemini API
pub struct GeminiCoach {
    client: Client,
    config: GeminiConfig,
}

impl GeminiCoach {
    pub fn new(config: GeminiConfig) -> Result<Self, CoachError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        if config.api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY is not set, coach runs offline");
        }

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// One `generateContent` round trip, returning the reply text
    async fn generate(&self, request: GenerateRequest) -> Result<String, CoachError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(CoachError::MissingCredentials)?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CoachError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CoachError::MalformedResponse(e.to_string()))?;

        let text = body.text();
        if text.trim().is_empty() {
            return Err(CoachError::EmptyResponse);
        }
        Ok(text)
    }

    /// Run `request`, turning any failure into `prefix: <reason>`
    async fn generate_text(&self, request: GenerateRequest, prefix: &str) -> String {
        match self.generate(request).await {
            Ok(text) => text,
            Err(CoachError::MissingCredentials) => "System Offline: API key missing.".to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Coach call failed");
                format!("{}: {}", prefix, e)
            }
        }
    }
}

#[async_trait]
impl Coach for GeminiCoach {
    fn is_online(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn describe_meal(&self, image: &[u8], mime_type: &str) -> Result<MealEstimate, CoachError> {
        let prompt = "Analyze this food image and estimate its nutrition. \
            Respond ONLY with a JSON object with these keys: \
            \"name\" (string, the dish), \"calories\" (integer, total kcal), \
            \"protein\", \"carbs\", \"fats\" (integers, grams), \
            \"advice\" (string, one short sentence of healthy advice about this food).";

        let request = GenerateRequest::new(vec![Part::text(prompt), Part::image(image, mime_type)])
            .temperature(VISION_TEMPERATURE)
            .json_response();

        let reply = self.generate(request).await?;
        let estimate = parse_meal_estimate(&reply)?;
        tracing::info!(meal = %estimate.name, calories = estimate.calories, "Scanned meal");
        Ok(estimate)
    }

    async fn chat(&self, message: &str, context: &str) -> String {
        let system = format!(
            "You are Nutrino, a friendly and uplifting health coach. \
             Current user stats and context: {}. \
             Keep answers concise, helpful and under 3 sentences. \
             Use a positive, motivating tone and include local insights where they fit.",
            context
        );

        let request = GenerateRequest::new(vec![Part::text(message)]).system(&system);
        match self.generate(request).await {
            Ok(text) => text,
            Err(CoachError::MissingCredentials) => {
                "System Offline: GEMINI_API_KEY environment variable is missing.".to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Coach chat failed");
                format!("API Connection Failed: {}", e)
            }
        }
    }

    async fn recipe(&self, food: &str, location: &str, goal: &str) -> String {
        let prompt = format!(
            "Act as a local nutritionist and chef. Give a quick, simple, healthy home-cooked \
             recipe or preparation for '{}'. The user lives in '{}' and their main health goal \
             is '{}'. Use ingredients that are fresh, cultural and available there while \
             supporting the goal. Format in Markdown with bold headers and bullet points, \
             under 150 words.",
            food, location, goal
        );

        let request = GenerateRequest::new(vec![Part::text(&prompt)]).temperature(RECIPE_TEMPERATURE);
        self.generate_text(request, "Could not generate recipe").await
    }

    async fn pantry(&self, image: &[u8], mime_type: &str, location: &str, goal: &str) -> String {
        let prompt = format!(
            "You are the Pantry Alchemist. Look at the ingredients visible in this fridge, \
             pantry or counter photo. The user lives in '{}' and their health goal is '{}'. \
             Invent 2 simple recipes they can cook right now using only what you see plus basic \
             staples (salt, pepper, oil, water). If no food is clearly visible, say what you see \
             instead. Format in Markdown; for each recipe give a catchy local title, estimated \
             calories and brief instructions.",
            location, goal
        );

        let request = GenerateRequest::new(vec![Part::text(&prompt), Part::image(image, mime_type)])
            .temperature(PANTRY_TEMPERATURE);
        match self.generate(request).await {
            Ok(text) => text,
            Err(CoachError::EmptyResponse) => EMPTY_PANTRY_REPLY.to_string(),
            Err(CoachError::MissingCredentials) => "System Offline: API key missing.".to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Pantry analysis failed");
                format!("Failed to analyze pantry: {}", e)
            }
        }
    }

    async fn recovery_protocol(&self, strain: &str, location: &str) -> String {
        let prompt = format!(
            "Act as a sports medicine dietitian and physiotherapist. The user has this strain \
             or injury: '{}'. They live in '{}'. Give an actionable recovery protocol in \
             Markdown with: 1. **Immediate Mobility/Rehab Advice**: 2 safe stretches or actions. \
             2. **Anti-Inflammatory Diet Shift**: the macros and micronutrients needed to repair \
             this tissue. 3. **Healing Recipe**: one local recipe that reduces inflammation and \
             supports repair of this strain.",
            strain, location
        );

        let request = GenerateRequest::new(vec![Part::text(&prompt)]).temperature(RECOVERY_TEMPERATURE);
        self.generate_text(request, "Failed to generate recovery protocol").await
    }
}

/// Pull the outermost `{...}` block out of a model reply and parse it
pub(crate) fn parse_meal_estimate(reply: &str) -> Result<MealEstimate, CoachError> {
    let json_block = Regex::new(r"(?s)\{.*\}")
        .map_err(|e| CoachError::MalformedResponse(e.to_string()))?;

    let raw = reply.trim();
    let candidate = json_block.find(raw).map(|m| m.as_str()).unwrap_or(raw);

    serde_json::from_str(candidate).map_err(|e| CoachError::MalformedResponse(e.to_string()))
}

// ============================================
// Request/Response types
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

impl GenerateRequest {
    fn new(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content { parts }],
            system_instruction: None,
            generation_config: GenerationConfig::default(),
        }
    }

    fn system(mut self, instruction: &str) -> Self {
        self.system_instruction = Some(Content {
            parts: vec![Part::text(instruction)],
        });
        self
    }

    fn temperature(mut self, temperature: f32) -> Self {
        self.generation_config.temperature = Some(temperature);
        self
    }

    fn json_response(mut self) -> Self {
        self.generation_config.response_mime_type = Some("application/json".to_string());
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn image(bytes: &[u8], mime_type: &str) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: BASE64.encode(bytes),
            }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, routing::post, Json, Router};
    use serde_json::{json, Value};

    /// Serve a fake `generateContent` endpoint that replies with `reply`
    async fn spawn_fake_gemini(reply: Value) -> String {
        let app = Router::new().route(
            "/models/:call",
            post(move |Path(call): Path<String>, Json(request): Json<Value>| {
                let reply = reply.clone();
                async move {
                    assert!(call.ends_with(":generateContent"));
                    assert!(request["contents"][0]["parts"].is_array());
                    Json(reply)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn online_coach(base_url: String) -> GeminiCoach {
        GeminiCoach::new(GeminiConfig {
            api_key: Some("test-key".to_string()),
            base_url,
            request_timeout_secs: 5,
            ..Default::default()
        })
        .unwrap()
    }

    fn reply_with(text: &str) -> Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
    }

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert!(config.api_key.is_none());
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn test_parse_meal_estimate_with_chatter() {
        let reply = "Sure! Here you go:\n```json\n{\n  \"name\": \"Pancakes\",\n  \"calories\": 520,\n  \"protein\": 12,\n  \"carbs\": 80,\n  \"fats\": 16,\n  \"advice\": \"Add berries.\"\n}\n```";
        let estimate = parse_meal_estimate(reply).unwrap();
        assert_eq!(estimate.name, "Pancakes");
        assert_eq!(estimate.carbs, 80);
        assert_eq!(estimate.advice, "Add berries.");
    }

    #[test]
    fn test_parse_meal_estimate_garbage() {
        let err = parse_meal_estimate("I can't see any food here.").unwrap_err();
        assert!(matches!(err, CoachError::MalformedResponse(_)));
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateRequest::new(vec![Part::text("hi"), Part::image(b"abc", "image/png")])
            .temperature(0.2)
            .json_response();
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(value["contents"][0]["parts"][1]["inline_data"]["data"], "YWJj");
        assert_eq!(value["contents"][0]["parts"][1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert!(value.get("systemInstruction").is_none());
    }

    #[tokio::test]
    async fn test_offline_coach_makes_no_calls() {
        let coach = GeminiCoach::new(GeminiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert!(!coach.is_online());
        assert!(matches!(
            coach.describe_meal(b"img", "image/jpeg").await,
            Err(CoachError::MissingCredentials)
        ));
        assert!(coach.chat("hello", "ctx").await.starts_with("System Offline"));
        assert!(coach.recipe("Ugali", "Nairobi", "Lose Fat").await.starts_with("System Offline"));
    }

    #[tokio::test]
    async fn test_describe_meal_round_trip() {
        let base_url = spawn_fake_gemini(reply_with(
            "{\"name\": \"Egusi Soup\", \"calories\": 610, \"protein\": 32, \"carbs\": 18, \"fats\": 45, \"advice\": \"Go easy on the oil.\"}",
        ))
        .await;

        let estimate = online_coach(base_url)
            .describe_meal(b"jpeg-bytes", "image/jpeg")
            .await
            .unwrap();
        assert_eq!(estimate.name, "Egusi Soup");
        assert_eq!(estimate.calories, 610);
    }

    #[tokio::test]
    async fn test_pantry_empty_reply() {
        let base_url = spawn_fake_gemini(json!({"candidates": []})).await;
        let text = online_coach(base_url)
            .pantry(b"img", "image/png", "Accra", "Eat Healthy")
            .await;
        assert_eq!(text, EMPTY_PANTRY_REPLY);
    }

    #[tokio::test]
    async fn test_recipe_text() {
        let base_url = spawn_fake_gemini(reply_with("**Steamed Fish**\n- Ginger")).await;
        let text = online_coach(base_url).recipe("Fish", "Lagos", "Lose Fat").await;
        assert_eq!(text, "**Steamed Fish**\n- Ginger");
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_text() {
        // Nothing listens on the discard port
        let coach = online_coach("http://127.0.0.1:9".to_string());
        let text = coach.chat("hello", "ctx").await;
        assert!(text.starts_with("API Connection Failed: "), "got {}", text);

        let text = coach.recovery_protocol("Sore knee", "Oslo").await;
        assert!(text.starts_with("Failed to generate recovery protocol: "));
    }
}
