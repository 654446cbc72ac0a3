//! Weight trend forecaster
//!
//! Fits an ordinary-least-squares line through logged weights and projects it
//! 30 days past the last sample.

use crate::ledger::{ProgressEntry, PROGRESS_DATE_FORMAT, SHORT_DATE_FORMAT};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Per-day slope magnitude below which weight counts as stable (kg/day)
pub const STABLE_SLOPE: f64 = 0.01;

/// Days between projected points
pub const PROJECTION_STEP_DAYS: i64 = 5;

/// How far past the last sample the projection reaches (exclusive)
pub const PROJECTION_HORIZON_DAYS: i64 = 30;

/// Fewest valid samples needed to fit a line
pub const MIN_SAMPLES: usize = 2;

/// A fitted `weight = slope · day + intercept` line
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendLine {
    /// kg per day
    pub slope: f64,
    /// kg at day 0 (the earliest sample)
    pub intercept: f64,
}

impl TrendLine {
    /// Least-squares fit over `(day, weight)` points
    ///
    /// All points on the same day give a flat line through their mean.
    pub fn fit(points: &[(f64, f64)]) -> Self {
        let n = points.len() as f64;
        if points.is_empty() {
            return Self {
                slope: 0.0,
                intercept: 0.0,
            };
        }

        let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
        let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
        let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
        let sum_xx: f64 = points.iter().map(|(x, _)| x * x).sum();

        let denominator = n * sum_xx - sum_x.powi(2);
        let slope = if denominator == 0.0 {
            0.0
        } else {
            (n * sum_xy - sum_x * sum_y) / denominator
        };
        let intercept = (sum_y - slope * sum_x) / n;

        Self { slope, intercept }
    }

    pub fn at(&self, day: f64) -> f64 {
        self.slope * day + self.intercept
    }
}

/// Direction of the weight trend
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum TrendDirection {
    Losing { kg_per_week: f64 },
    Gaining { kg_per_week: f64 },
    Stable,
}

impl TrendDirection {
    pub fn from_slope(slope: f64) -> Self {
        if slope < -STABLE_SLOPE {
            TrendDirection::Losing {
                kg_per_week: slope.abs() * 7.0,
            }
        } else if slope > STABLE_SLOPE {
            TrendDirection::Gaining {
                kg_per_week: slope * 7.0,
            }
        } else {
            TrendDirection::Stable
        }
    }

    pub fn summary(&self) -> String {
        match self {
            TrendDirection::Losing { kg_per_week } => {
                format!("Trending Down: Losing approx {:.1} kg per week.", kg_per_week)
            }
            TrendDirection::Gaining { kg_per_week } => {
                format!("Trending Up: Gaining approx {:.1} kg per week.", kg_per_week)
            }
            TrendDirection::Stable => "Weight is currently stable.".to_string(),
        }
    }
}

/// A dated weight on the fitted or projected line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// Chart label in `SHORT_DATE_FORMAT`
    pub label: String,
    /// kg, rounded to one decimal
    pub weight: f64,
}

/// Fitted history plus a 30-day projection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightForecast {
    pub line: TrendLine,
    pub trend: TrendDirection,
    pub summary: String,
    /// One point per valid sample, oldest first
    pub historical: Vec<TrendPoint>,
    /// Points from the last sample day onward in `PROJECTION_STEP_DAYS` steps
    pub projected: Vec<TrendPoint>,
}

/// Forecast result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastOutcome {
    InsufficientData { valid_samples: usize },
    Ready(WeightForecast),
}

/// Parse progress entries into `(date, kg)` samples, dropping unparsable ones
pub fn weight_samples(entries: &[ProgressEntry]) -> Vec<(NaiveDate, f64)> {
    entries
        .iter()
        .filter_map(|entry| {
            let date = NaiveDate::parse_from_str(entry.date.trim(), PROGRESS_DATE_FORMAT).ok()?;
            let weight = entry.weight.trim().parse::<f64>().ok()?;
            weight.is_finite().then_some((date, weight))
        })
        .collect()
}

/// Fit and project a weight trend over `samples`
pub fn forecast_weight(samples: &[(NaiveDate, f64)]) -> ForecastOutcome {
    if samples.len() < MIN_SAMPLES {
        return ForecastOutcome::InsufficientData {
            valid_samples: samples.len(),
        };
    }

    let mut samples = samples.to_vec();
    samples.sort_by_key(|(date, _)| *date);
    let start = samples[0].0;

    let points: Vec<(f64, f64)> = samples
        .iter()
        .map(|(date, weight)| ((*date - start).num_days() as f64, *weight))
        .collect();
    let line = TrendLine::fit(&points);

    let point_at = |offset: i64| {
        let date = start + Duration::days(offset);
        TrendPoint {
            date,
            label: date.format(SHORT_DATE_FORMAT).to_string(),
            weight: round_one(line.at(offset as f64)),
        }
    };

    let offsets: Vec<i64> = samples
        .iter()
        .map(|(date, _)| (*date - start).num_days())
        .collect();
    let historical = offsets.iter().map(|&offset| point_at(offset)).collect();

    let last = offsets.last().copied().unwrap_or_default();
    let projected = (0..PROJECTION_HORIZON_DAYS)
        .step_by(PROJECTION_STEP_DAYS as usize)
        .map(|ahead| point_at(last + ahead))
        .collect();

    let trend = TrendDirection::from_slope(line.slope);
    tracing::debug!(
        slope = line.slope,
        samples = samples.len(),
        "Fitted weight trend"
    );

    ForecastOutcome::Ready(WeightForecast {
        line,
        summary: trend.summary(),
        trend,
        historical,
        projected,
    })
}

/// Round to one decimal place, ties to even on the exact binary value.
///
/// `0.15` is stored just below the tie and rounds down, while `79.25` is an
/// exact tie and rounds to the even `79.2`.
fn round_one(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let lower = (value * 10.0).floor();
    // Sign of `value * 10 - (lower + 0.5)` with a single rounding step
    let diff = value.mul_add(10.0, -(lower + 0.5));
    let tenths = if diff > 0.0 {
        lower + 1.0
    } else if diff < 0.0 || lower.rem_euclid(2.0) == 0.0 {
        lower
    } else {
        lower + 1.0
    };

    tenths / 10.0
}
