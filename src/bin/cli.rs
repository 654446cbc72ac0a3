//! Nutrino CLI
//!
//! Command-line interface for the Nutrino API:
//! - Log meals and sync activity
//! - Show today's stats, weekly history and insights
//! - Manage the profile, recovery mode and progress photos
//! - Plan macro portions locally, no server needed

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use nutrino::analytics::{plan_portions, FoodProfile, MacroTargets, PortionPlan};
use nutrino::ledger::Goal;
use reqwest::Method;
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nutrino")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Personal nutrition dashboard")]
#[command(long_about = "Nutrino tracks calories, macros and activity day by day.\nIt finds patterns in your history and forecasts your weight.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8085", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show today's totals
    Stats,

    /// Log a meal
    Meal {
        /// Meal name
        name: String,
        /// Calories (kcal)
        calories: f64,
        /// Protein (g)
        #[arg(short, long, default_value = "0")]
        protein: f64,
        /// Carbohydrates (g)
        #[arg(short, long, default_value = "0")]
        carbs: f64,
        /// Fats (g)
        #[arg(short = 'F', long, default_value = "0")]
        fats: f64,
    },

    /// Estimate a meal from a photo with the AI coach
    Scan {
        /// Path to the photo
        path: PathBuf,
        /// Log the estimate as a meal
        #[arg(long)]
        log: bool,
    },

    /// Sync steps from the wearable
    Sync,

    /// Zero today's totals
    Reset,

    /// Seven-day intake history
    Weekly,

    /// Lifestyle correlations
    Insights,

    /// Weight trend and 30-day projection
    Forecast,

    /// Progress photos
    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },

    /// Injury recovery mode
    Recovery {
        #[command(subcommand)]
        action: RecoveryAction,
    },

    /// Show or update the profile
    Profile {
        /// Display name
        #[arg(long, requires_all = ["location", "goal", "target_weight"])]
        name: Option<String>,
        /// City or country used for local food suggestions
        #[arg(long)]
        location: Option<String>,
        /// lose_fat, eat_healthy, cut_sugar or strength_recovery
        #[arg(long, value_parser = parse_goal)]
        goal: Option<Goal>,
        /// Target weight (kg)
        #[arg(long)]
        target_weight: Option<String>,
    },

    /// Ask the AI coach
    Chat {
        /// Message
        message: Vec<String>,
    },

    /// Local recipe for a food
    Recipe {
        /// Food name
        food: String,
    },

    /// Plan exact portions of three foods (runs locally)
    Optimize {
        /// Protein target (g)
        #[arg(long, default_value = "50")]
        protein: f64,
        /// Carbohydrate target (g)
        #[arg(long, default_value = "60")]
        carbs: f64,
        /// Fat target (g)
        #[arg(long, default_value = "20")]
        fats: f64,
        /// Foods as name:protein:carbs:fats per 100 g (exactly three)
        #[arg(long = "food", value_parser = parse_food)]
        foods: Vec<FoodProfile>,
    },

    /// Show server status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ProgressAction {
    /// List progress entries
    List,
    /// Log a progress photo with today's weight
    Add {
        /// Photo reference (file name)
        reference: String,
        /// Weight (kg)
        weight: String,
    },
    /// Remove a progress entry
    Remove {
        /// Photo reference
        reference: String,
    },
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Enter recovery mode
    Set {
        /// Strain or injury description
        description: Vec<String>,
    },
    /// Leave recovery mode
    Clear,
    /// Ask the coach for a rehab protocol
    Protocol,
}

/// Thin JSON client for the Nutrino API
struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get(&self, path: &str) -> Result<Value> {
        self.send(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Option<Value>) -> Result<Value> {
        self.send(Method::POST, path, body).await
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.with_context(|| {
            format!(
                "Cannot connect to Nutrino API at {}. Start it with: cargo run --bin nutrino-api",
                self.base_url
            )
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(text);
            bail!("Request failed ({}): {}", status, message);
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).context("API returned invalid JSON")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let api = ApiClient::new(&cli.api_url);
    let json_output = cli.format == "json";

    match cli.command {
        Commands::Stats => {
            let stats = api.get("/api/v1/stats").await?;
            if json_output {
                print_json(&stats)?;
            } else {
                print_stats(&stats);
            }
        }

        Commands::Meal {
            name,
            calories,
            protein,
            carbs,
            fats,
        } => {
            let body = json!({
                "name": name,
                "calories": calories,
                "protein": protein,
                "carbs": carbs,
                "fats": fats,
            });
            let result = api.post("/api/v1/meals", Some(body)).await?;
            if json_output {
                print_json(&result)?;
            } else {
                println!("Logged {}", result["logged"].as_str().unwrap_or("meal"));
                println!();
                print_stats(&result["stats"]);
            }
        }

        Commands::Scan { path, log } => {
            let bytes = std::fs::read(&path).with_context(|| format!("Cannot read {:?}", path))?;
            let body = json!({
                "image": STANDARD.encode(bytes),
                "mime_type": mime_for(&path),
                "log": log,
            });
            let result = api.post("/api/v1/meals/scan", Some(body)).await?;
            if json_output {
                print_json(&result)?;
            } else {
                let estimate = &result["estimate"];
                println!("{}", estimate["name"].as_str().unwrap_or("Unknown meal"));
                println!(
                    "  {} kcal | P {}g | C {}g | F {}g",
                    estimate["calories"], estimate["protein"], estimate["carbs"], estimate["fats"]
                );
                if let Some(advice) = estimate["advice"].as_str().filter(|a| !a.is_empty()) {
                    println!("  {}", advice);
                }
                if result["logged"].as_bool().unwrap_or(false) {
                    println!();
                    println!("Logged to today.");
                }
            }
        }

        Commands::Sync => {
            let result = api.post("/api/v1/activity/sync", None).await?;
            if json_output {
                print_json(&result)?;
            } else {
                println!(
                    "Synced {} steps ({} kcal burned)",
                    result["added"]["steps"], result["added"]["burned"]
                );
            }
        }

        Commands::Reset => {
            let stats = api.post("/api/v1/stats/reset", None).await?;
            if json_output {
                print_json(&stats)?;
            } else {
                println!("Today's totals reset.");
            }
        }

        Commands::Weekly => {
            let history = api.get("/api/v1/history/weekly").await?;
            if json_output {
                print_json(&history)?;
            } else {
                print_weekly(&history);
            }
        }

        Commands::Insights => {
            let report = api.get("/api/v1/insights/correlations").await?;
            if json_output {
                print_json(&report)?;
            } else {
                print_insights(&report);
            }
        }

        Commands::Forecast => {
            let forecast = api.get("/api/v1/insights/forecast").await?;
            if json_output {
                print_json(&forecast)?;
            } else {
                print_forecast(&forecast);
            }
        }

        Commands::Progress { action } => {
            let result = match action {
                ProgressAction::List => api.get("/api/v1/progress").await?,
                ProgressAction::Add { reference, weight } => {
                    let body = json!({ "reference": reference, "weight": weight });
                    api.post("/api/v1/progress", Some(body)).await?
                }
                ProgressAction::Remove { reference } => {
                    let path = format!("/api/v1/progress/{}", reference);
                    api.send(Method::DELETE, &path, None).await?
                }
            };

            if json_output {
                print_json(&result)?;
            } else if let Some(entries) = result["entries"].as_array() {
                print_progress(entries);
            } else if let Some(deleted) = result["deleted"].as_bool() {
                if deleted {
                    println!("Removed {}", result["reference"].as_str().unwrap_or("-"));
                } else {
                    println!("No entry named {}", result["reference"].as_str().unwrap_or("-"));
                }
            } else {
                println!(
                    "Logged {} kg on {}",
                    result["weight"].as_str().unwrap_or("-"),
                    result["date"].as_str().unwrap_or("-")
                );
            }
        }

        Commands::Recovery { action } => match action {
            RecoveryAction::Set { description } => {
                let body = json!({ "description": description.join(" ") });
                let stats = api.send(Method::PUT, "/api/v1/recovery", Some(body)).await?;
                if json_output {
                    print_json(&stats)?;
                } else if stats["recovery_mode"].as_bool().unwrap_or(false) {
                    println!(
                        "Recovery mode on: {}",
                        stats["active_strain"].as_str().unwrap_or("-")
                    );
                } else {
                    println!("Recovery mode off.");
                }
            }
            RecoveryAction::Clear => {
                let stats = api.send(Method::DELETE, "/api/v1/recovery", None).await?;
                if json_output {
                    print_json(&stats)?;
                } else {
                    println!("Recovery mode off.");
                }
            }
            RecoveryAction::Protocol => {
                let result = api.post("/api/v1/recovery/protocol", None).await?;
                if json_output {
                    print_json(&result)?;
                } else {
                    println!("{}", result["protocol"].as_str().unwrap_or_default());
                }
            }
        },

        Commands::Profile {
            name,
            location,
            goal,
            target_weight,
        } => {
            let profile = match (name, location, goal, target_weight) {
                (Some(name), Some(location), Some(goal), Some(target_weight)) => {
                    let body = json!({
                        "name": name,
                        "location": location,
                        "goal": goal,
                        "target_weight": target_weight,
                    });
                    api.send(Method::PUT, "/api/v1/profile", Some(body)).await?
                }
                _ => api.get("/api/v1/profile").await?,
            };

            if json_output {
                print_json(&profile)?;
            } else {
                let goal: Option<Goal> = serde_json::from_value(profile["goal"].clone()).ok();
                println!("Name:          {}", profile["name"].as_str().unwrap_or("-"));
                println!("Location:      {}", profile["location"].as_str().unwrap_or("-"));
                println!(
                    "Goal:          {}",
                    goal.map(|g| g.label()).unwrap_or("-")
                );
                println!("Target weight: {} kg", profile["target_weight"]);
            }
        }

        Commands::Chat { message } => {
            let body = json!({ "message": message.join(" ") });
            let reply = api.post("/api/v1/coach/chat", Some(body)).await?;
            print_reply(&reply, json_output)?;
        }

        Commands::Recipe { food } => {
            let body = json!({ "food": food });
            let reply = api.post("/api/v1/coach/recipe", Some(body)).await?;
            print_reply(&reply, json_output)?;
        }

        Commands::Optimize {
            protein,
            carbs,
            fats,
            foods,
        } => {
            let foods: [FoodProfile; 3] = if foods.is_empty() {
                FoodProfile::default_trio()
            } else {
                foods
                    .try_into()
                    .map_err(|f: Vec<FoodProfile>| anyhow::anyhow!("expected 3 foods, got {}", f.len()))?
            };
            let targets = MacroTargets {
                protein,
                carbs,
                fats,
            };

            let plan = plan_portions(&targets, &foods)?;
            if json_output {
                print_json(&serde_json::to_value(&plan)?)?;
            } else {
                print_plan(&plan);
            }
        }

        Commands::Status => {
            let health = api.get("/health").await?;
            if json_output {
                print_json(&health)?;
            } else {
                println!("Nutrino v{}", env!("CARGO_PKG_VERSION"));
                println!();
                println!("API Status: {}", health["status"].as_str().unwrap_or("unknown"));
                println!("Ledger:     {}", health["ledger"].as_str().unwrap_or("unknown"));
                println!("AI coach:   {}", health["coach"].as_str().unwrap_or("unknown"));
                if let Some(uptime) = health["uptime_seconds"].as_u64() {
                    println!();
                    println!("Uptime: {}", format_duration(uptime));
                }
            }
        }

        Commands::Config { output } => {
            let config = nutrino::config::generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn parse_goal(s: &str) -> Result<Goal, String> {
    serde_json::from_value(Value::String(s.to_string())).map_err(|_| {
        format!(
            "unknown goal {:?}. Use: lose_fat, eat_healthy, cut_sugar, strength_recovery",
            s
        )
    })
}

fn parse_food(s: &str) -> Result<FoodProfile, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let [name, protein, carbs, fats] = parts.as_slice() else {
        return Err(format!("expected name:protein:carbs:fats, got {:?}", s));
    };

    let number = |field: &str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("{} {} must be a number", name, field))
    };

    Ok(FoodProfile::new(
        name.trim(),
        number("protein", *protein)?,
        number("carbs", *carbs)?,
        number("fats", *fats)?,
    ))
}

fn mime_for(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_reply(reply: &Value, json_output: bool) -> Result<()> {
    if json_output {
        print_json(reply)
    } else {
        println!("{}", reply["reply"].as_str().unwrap_or_default());
        Ok(())
    }
}

fn print_stats(stats: &Value) {
    println!("{:<12} {}", "Date", stats["date"].as_str().unwrap_or("-"));
    println!("{}", "-".repeat(30));
    println!("{:<12} {} / {} kcal", "Eaten", stats["consumed"], stats["target"]);
    println!("{:<12} {} kcal", "Burned", stats["burned"]);
    println!("{:<12} {} kcal", "Remaining", stats["remaining"]);
    println!("{:<12} {} steps", "Activity", stats["steps"]);
    println!(
        "{:<12} P {}g | C {}g | F {}g",
        "Macros", stats["protein"], stats["carbs"], stats["fats"]
    );
    println!(
        "{:<12} {}",
        "Last sync",
        stats["last_sync"].as_str().unwrap_or("-")
    );
    if stats["recovery_mode"].as_bool().unwrap_or(false) {
        println!(
            "{:<12} {}",
            "Recovery",
            stats["active_strain"].as_str().unwrap_or("-")
        );
    }
}

fn print_weekly(history: &Value) {
    let labels = history["dates"].as_array().cloned().unwrap_or_default();
    let consumed = history["consumed"].as_array().cloned().unwrap_or_default();
    let protein = history["protein"].as_array().cloned().unwrap_or_default();
    let carbs = history["carbs"].as_array().cloned().unwrap_or_default();
    let fats = history["fats"].as_array().cloned().unwrap_or_default();

    println!(
        "{:<8} | {:>6} | {:>5} | {:>5} | {:>5}",
        "Date", "kcal", "P", "C", "F"
    );
    println!("{}", "-".repeat(42));

    for (i, label) in labels.iter().enumerate() {
        let cell = |series: &[Value]| {
            series
                .get(i)
                .and_then(Value::as_u64)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        println!(
            "{:<8} | {:>6} | {:>5} | {:>5} | {:>5}",
            label.as_str().unwrap_or("-"),
            cell(&consumed),
            cell(&protein),
            cell(&carbs),
            cell(&fats)
        );
    }
}

fn print_insights(report: &Value) {
    match report["status"].as_str() {
        Some("gathering") => {
            println!(
                "Gathering data: {} of {} days logged.",
                report["logged_days"], report["required"]
            );
            println!("Keep logging meals and steps to unlock insights.");
        }
        Some("ready") => {
            let insights = report["insights"].as_array().cloned().unwrap_or_default();
            if insights.is_empty() {
                println!("No strong patterns detected yet.");
                return;
            }
            for insight in insights {
                println!(
                    "{} (r = {:.2})",
                    insight["title"].as_str().unwrap_or("-"),
                    insight["coefficient"].as_f64().unwrap_or(0.0)
                );
                println!("  {}", insight["message"].as_str().unwrap_or("-"));
            }
        }
        _ => println!("No insight data"),
    }
}

fn print_forecast(forecast: &Value) {
    if forecast["status"].as_str() != Some("ready") {
        println!(
            "Need at least 2 progress entries with a weight ({} so far).",
            forecast["valid_samples"]
        );
        return;
    }

    println!("{}", forecast["summary"].as_str().unwrap_or("-"));
    println!();
    println!("{:<8} | {:>8}", "Date", "kg");
    println!("{}", "-".repeat(20));
    for point in forecast["projected"].as_array().cloned().unwrap_or_default() {
        println!(
            "{:<8} | {:>8.1}",
            point["label"].as_str().unwrap_or("-"),
            point["weight"].as_f64().unwrap_or(0.0)
        );
    }
}

fn print_progress(entries: &[Value]) {
    if entries.is_empty() {
        println!("No progress photos yet.");
        println!();
        println!("Log your first one with:");
        println!("  nutrino progress add photo.jpg 80.5");
        return;
    }

    println!("{:<14} {:<10} {}", "Date", "Weight", "Photo");
    println!("{}", "-".repeat(50));
    for entry in entries {
        println!(
            "{:<14} {:<10} {}",
            entry["date"].as_str().unwrap_or("-"),
            entry["weight"].as_str().unwrap_or("-"),
            entry["image"].as_str().unwrap_or("-")
        );
    }
}

fn print_plan(plan: &PortionPlan) {
    match plan {
        PortionPlan::Solved { portions } => {
            println!("{:<20} {:>10}", "Food", "Grams");
            println!("{}", "-".repeat(32));
            for portion in portions {
                println!("{:<20} {:>10.1}", portion.food, portion.grams);
            }
        }
        _ => println!("{}", plan.summary()),
    }
}
