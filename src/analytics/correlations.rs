//! Correlation Engine
//!
//! Calculates Pearson correlation coefficients between lifestyle series and
//! turns strong ones into insight labels using fixed thresholds.

use crate::ledger::DailyRecord;
use serde::Serialize;

/// Fewest active days before any correlation is attempted
pub const MIN_ACTIVE_DAYS: usize = 4;

/// Carbs vs steps above this → high-energy pattern
pub const HIGH_ENERGY_THRESHOLD: f64 = 0.6;

/// Carbs vs steps below this → carb coma
pub const CARB_COMA_THRESHOLD: f64 = -0.6;

/// Protein vs calories below this → satiety effect
pub const SATIETY_THRESHOLD: f64 = -0.5;

/// Steps vs calories above this → active appetite
pub const ACTIVE_APPETITE_THRESHOLD: f64 = 0.7;

/// Calculate Pearson correlation coefficient
///
/// Returns a value between -1 and 1:
/// - 1: perfect positive correlation
/// - 0: no correlation, fewer than 3 samples, or a constant series
/// - -1: perfect negative correlation
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 3 {
        return 0.0;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    if x.iter().all(|&v| v == mean_x) || y.iter().all(|&v| v == mean_y) {
        return 0.0;
    }

    let numerator: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(a, b)| (a - mean_x) * (b - mean_y))
        .sum();
    let sum_sq_x: f64 = x.iter().map(|a| (a - mean_x).powi(2)).sum();
    let sum_sq_y: f64 = y.iter().map(|b| (b - mean_y).powi(2)).sum();

    let denominator = (sum_sq_x * sum_sq_y).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// A lifestyle pattern the correlation rules can detect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    HighEnergyPattern,
    CarbComa,
    SatietyEffect,
    ActiveAppetite,
}

impl InsightKind {
    pub fn title(&self) -> &'static str {
        match self {
            InsightKind::HighEnergyPattern => "High Energy Pattern",
            InsightKind::CarbComa => "Carb Coma Detected",
            InsightKind::SatietyEffect => "Satiety Effect",
            InsightKind::ActiveAppetite => "Active Appetite",
        }
    }

    fn describe(&self, r: f64) -> String {
        match self {
            InsightKind::HighEnergyPattern => format!(
                "Strong positive correlation ({:.2}). On days you eat more carbs, you tend to take significantly more steps!",
                r
            ),
            InsightKind::CarbComa => format!(
                "Negative correlation ({:.2}). High carb days are strongly linked to lower step counts. Consider adjusting meal timing.",
                r
            ),
            InsightKind::SatietyEffect => format!(
                "Negative correlation ({:.2}). Eating more protein is helping you naturally consume fewer total calories.",
                r
            ),
            InsightKind::ActiveAppetite => format!(
                "Positive correlation ({:.2}). High step days strongly trigger hunger, leading to higher calorie intake. Monitor post-workout snacking.",
                r
            ),
        }
    }
}

/// A detected lifestyle correlation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    /// Pearson coefficient behind the insight
    pub coefficient: f64,
    pub message: String,
}

impl Insight {
    fn new(kind: InsightKind, coefficient: f64) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            coefficient,
            message: kind.describe(coefficient),
        }
    }
}

/// Result of running the correlation rules over logged days
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CorrelationReport {
    /// Not enough active days yet
    Gathering { logged_days: usize, required: usize },
    /// Rules evaluated; an empty list means no strong pattern
    Ready {
        insights: Vec<Insight>,
        sample_size: usize,
    },
}

/// Evaluate the lifestyle rules over `days`
///
/// Days with neither intake nor steps are ignored. Rules run in a fixed
/// order: carbs/steps, protein/calories, steps/calories.
pub fn lifestyle_insights<'a>(days: impl IntoIterator<Item = &'a DailyRecord>) -> CorrelationReport {
    let active: Vec<&DailyRecord> = days.into_iter().filter(|d| d.is_active()).collect();

    if active.len() < MIN_ACTIVE_DAYS {
        return CorrelationReport::Gathering {
            logged_days: active.len(),
            required: MIN_ACTIVE_DAYS,
        };
    }

    let series = |f: fn(&DailyRecord) -> u32| -> Vec<f64> {
        active.iter().map(|d| f64::from(f(d))).collect()
    };
    let calories = series(|d| d.consumed);
    let steps = series(|d| d.steps);
    let carbs = series(|d| d.carbs);
    let protein = series(|d| d.protein);

    let mut insights = Vec::new();

    let r_carbs_steps = pearson_correlation(&carbs, &steps);
    if r_carbs_steps > HIGH_ENERGY_THRESHOLD {
        insights.push(Insight::new(InsightKind::HighEnergyPattern, r_carbs_steps));
    } else if r_carbs_steps < CARB_COMA_THRESHOLD {
        insights.push(Insight::new(InsightKind::CarbComa, r_carbs_steps));
    }

    let r_protein_calories = pearson_correlation(&protein, &calories);
    if r_protein_calories < SATIETY_THRESHOLD {
        insights.push(Insight::new(InsightKind::SatietyEffect, r_protein_calories));
    }

    let r_steps_calories = pearson_correlation(&steps, &calories);
    if r_steps_calories > ACTIVE_APPETITE_THRESHOLD {
        insights.push(Insight::new(InsightKind::ActiveAppetite, r_steps_calories));
    }

    tracing::debug!(
        sample_size = active.len(),
        insights = insights.len(),
        "Evaluated lifestyle correlations"
    );

    CorrelationReport::Ready {
        insights,
        sample_size: active.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(consumed: u32, protein: u32, carbs: u32, steps: u32) -> DailyRecord {
        DailyRecord {
            consumed,
            protein,
            carbs,
            fats: 0,
            steps,
            burned: 0,
        }
    }

    #[test]
    fn test_pearson_correlation_perfect_positive() {
        let r = pearson_correlation(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_correlation_perfect_negative() {
        let r = pearson_correlation(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]);
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_correlation_constant_series() {
        assert_eq!(pearson_correlation(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(pearson_correlation(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn test_pearson_correlation_too_short() {
        assert_eq!(pearson_correlation(&[1.0, 2.0], &[2.0, 4.0]), 0.0);
        assert_eq!(pearson_correlation(&[], &[]), 0.0);
    }

    #[test]
    fn test_pearson_correlation_no_correlation() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let r = pearson_correlation(&x, &y);
        assert!(r.abs() < 0.5, "Expected low correlation, got {}", r);
    }

    #[test]
    fn test_gathering_below_minimum() {
        let days = vec![
            day(1800, 90, 200, 4000),
            day(0, 0, 0, 0),
            day(2000, 100, 220, 6000),
            day(1500, 80, 150, 3000),
        ];
        assert_eq!(
            lifestyle_insights(&days),
            CorrelationReport::Gathering {
                logged_days: 3,
                required: MIN_ACTIVE_DAYS
            }
        );
    }

    #[test]
    fn test_high_energy_and_active_appetite() {
        // Carbs, steps and calories all rise together; protein stays flat
        let days = vec![
            day(1500, 80, 100, 3000),
            day(1800, 80, 150, 5000),
            day(2100, 80, 200, 7000),
            day(2400, 80, 250, 9000),
        ];

        let CorrelationReport::Ready { insights, sample_size } = lifestyle_insights(&days) else {
            panic!("expected a ready report");
        };
        assert_eq!(sample_size, 4);
        let kinds: Vec<InsightKind> = insights.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![InsightKind::HighEnergyPattern, InsightKind::ActiveAppetite]
        );
        assert!(insights[0].message.contains("(1.00)"));
    }

    #[test]
    fn test_carb_coma_and_satiety() {
        let days = vec![
            day(2400, 60, 300, 2000),
            day(2100, 90, 250, 4000),
            day(1800, 120, 200, 6000),
            day(1500, 150, 150, 8000),
        ];

        let CorrelationReport::Ready { insights, .. } = lifestyle_insights(&days) else {
            panic!("expected a ready report");
        };
        let kinds: Vec<InsightKind> = insights.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![InsightKind::CarbComa, InsightKind::SatietyEffect]);
    }

    #[test]
    fn test_neutral_data_has_no_insights() {
        let days = vec![day(2000, 100, 200, 5000); 5];
        assert_eq!(
            lifestyle_insights(&days),
            CorrelationReport::Ready {
                insights: vec![],
                sample_size: 5
            }
        );
    }

    #[test]
    fn test_report_serializes_with_status_tag() {
        let report = CorrelationReport::Gathering {
            logged_days: 2,
            required: 4,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "gathering");
        assert_eq!(json["logged_days"], 2);
    }
}
