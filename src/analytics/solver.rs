//! Macro portion solver
//!
//! Solves a 3×3 linear system with Gauss-Jordan elimination to find the
//! grams of three foods that hit protein/carb/fat targets exactly.

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use serde::{Deserialize, Serialize};

/// Solve `a · x = b` by Gauss-Jordan elimination
///
/// Returns `None` when the system is singular. A pivot counts as zero only on
/// exact equality with `0.0`; near-zero pivots are divided through as-is.
pub fn solve_gauss_jordan(a: [[f64; 3]; 3], b: [f64; 3]) -> Option<[f64; 3]> {
    let mut aug = [[0.0_f64; 4]; 3];
    for (row, (coefficients, target)) in aug.iter_mut().zip(a.iter().zip(b.iter())) {
        row[..3].copy_from_slice(coefficients);
        row[3] = *target;
    }

    for i in 0..3 {
        if aug[i][i] == 0.0 {
            let swap = (i + 1..3).find(|&j| aug[j][i] != 0.0)?;
            aug.swap(i, swap);
        }

        let pivot = aug[i][i];
        for value in aug[i].iter_mut() {
            *value /= pivot;
        }

        let pivot_row = aug[i];
        for (k, row) in aug.iter_mut().enumerate() {
            if k == i {
                continue;
            }
            let factor = row[i];
            for (value, p) in row.iter_mut().zip(pivot_row.iter()) {
                *value -= factor * p;
            }
        }
    }

    Some([aug[0][3], aug[1][3], aug[2][3]])
}

/// Macro targets in grams
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroTargets {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl Default for MacroTargets {
    fn default() -> Self {
        Self {
            protein: 50.0,
            carbs: 60.0,
            fats: 20.0,
        }
    }
}

/// A food's macros per 100 g
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodProfile {
    pub name: String,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl FoodProfile {
    pub fn new(name: impl Into<String>, protein: f64, carbs: f64, fats: f64) -> Self {
        Self {
            name: name.into(),
            protein,
            carbs,
            fats,
        }
    }

    /// Chicken breast, white rice and almonds
    pub fn default_trio() -> [FoodProfile; 3] {
        [
            FoodProfile::new("Chicken Breast", 31.0, 0.0, 3.6),
            FoodProfile::new("White Rice", 2.7, 28.0, 0.3),
            FoodProfile::new("Almonds", 21.0, 22.0, 50.0),
        ]
    }

    fn per_gram(&self) -> [f64; 3] {
        [self.protein / 100.0, self.carbs / 100.0, self.fats / 100.0]
    }
}

/// Grams of one food in a solved plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portion {
    pub food: String,
    pub grams: f64,
}

/// Outcome of portion planning
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PortionPlan {
    /// Non-negative grams for each food, in input order
    Solved { portions: Vec<Portion> },
    /// Foods are too nutritionally similar to tell apart
    Singular,
    /// The exact solution needs a negative amount of some food
    Infeasible { grams: [f64; 3] },
}

impl PortionPlan {
    /// Short human-readable verdict
    pub fn summary(&self) -> String {
        match self {
            PortionPlan::Solved { portions } => portions
                .iter()
                .map(|p| format!("{:.1}g of {}", p.grams, p.food))
                .collect::<Vec<_>>()
                .join(", "),
            PortionPlan::Singular => {
                "Foods are too nutritionally similar to solve.".to_string()
            }
            PortionPlan::Infeasible { .. } => {
                "Impossible to hit these exact targets without negative food. Try swapping an ingredient!"
                    .to_string()
            }
        }
    }
}

/// Grams of each food that hit `targets` exactly
///
/// Each food contributes one unknown; each macro contributes one equation.
pub fn plan_portions(targets: &MacroTargets, foods: &[FoodProfile; 3]) -> AnalyticsResult<PortionPlan> {
    ensure_finite("target protein", targets.protein)?;
    ensure_finite("target carbs", targets.carbs)?;
    ensure_finite("target fats", targets.fats)?;
    for food in foods {
        ensure_finite(&format!("{} protein", food.name), food.protein)?;
        ensure_finite(&format!("{} carbs", food.name), food.carbs)?;
        ensure_finite(&format!("{} fats", food.name), food.fats)?;
    }

    let per_food = [foods[0].per_gram(), foods[1].per_gram(), foods[2].per_gram()];
    let mut per_macro = [[0.0; 3]; 3];
    for (macro_idx, row) in per_macro.iter_mut().enumerate() {
        for (food_idx, value) in row.iter_mut().enumerate() {
            *value = per_food[food_idx][macro_idx];
        }
    }
    let b = [targets.protein, targets.carbs, targets.fats];

    let plan = match solve_gauss_jordan(per_macro, b) {
        None => PortionPlan::Singular,
        Some(grams) if grams.iter().any(|&g| g < 0.0) => PortionPlan::Infeasible { grams },
        Some(grams) => PortionPlan::Solved {
            portions: foods
                .iter()
                .zip(grams)
                .map(|(food, grams)| Portion {
                    food: food.name.clone(),
                    grams,
                })
                .collect(),
        },
    };

    tracing::debug!(outcome = ?plan, "Planned portions");
    Ok(plan)
}

fn ensure_finite(field: &str, value: f64) -> AnalyticsResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AnalyticsError::InvalidInput(format!(
            "{} must be a valid number",
            field
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_solves(a: [[f64; 3]; 3], b: [f64; 3]) {
        let x = solve_gauss_jordan(a, b).expect("system should be solvable");
        for (row, target) in a.iter().zip(b.iter()) {
            let lhs: f64 = row.iter().zip(x.iter()).map(|(c, v)| c * v).sum();
            assert!((lhs - target).abs() < 1e-9, "row {:?}: {} != {}", row, lhs, target);
        }
    }

    #[test]
    fn test_solve_identity() {
        let a = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert_eq!(solve_gauss_jordan(a, [4.0, 5.0, 6.0]), Some([4.0, 5.0, 6.0]));
    }

    #[test]
    fn test_solve_needs_row_swap() {
        let a = [[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let x = solve_gauss_jordan(a, [2.0, 3.0, 4.0]).unwrap();
        assert_eq!(x, [3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_solution_satisfies_system() {
        assert_solves(
            [[2.0, 1.0, -1.0], [-3.0, -1.0, 2.0], [-2.0, 1.0, 2.0]],
            [8.0, -11.0, -3.0],
        );
        assert_solves(
            [[0.31, 0.027, 0.21], [0.0, 0.28, 0.22], [0.036, 0.003, 0.5]],
            [50.0, 60.0, 20.0],
        );
    }

    #[test]
    fn test_singular_system() {
        let a = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [1.0, 0.0, 1.0]];
        assert_eq!(solve_gauss_jordan(a, [1.0, 2.0, 3.0]), None);
        assert_eq!(solve_gauss_jordan([[0.0; 3]; 3], [0.0; 3]), None);
    }

    #[test]
    fn test_plan_default_trio() {
        let plan = plan_portions(&MacroTargets::default(), &FoodProfile::default_trio()).unwrap();
        let PortionPlan::Solved { portions } = plan else {
            panic!("expected a solved plan, got {:?}", plan);
        };

        assert_eq!(portions.len(), 3);
        assert_eq!(portions[0].food, "Chicken Breast");
        let foods = FoodProfile::default_trio();
        let protein: f64 = foods
            .iter()
            .zip(&portions)
            .map(|(f, p)| f.protein / 100.0 * p.grams)
            .sum();
        let fats: f64 = foods.iter().zip(&portions).map(|(f, p)| f.fats / 100.0 * p.grams).sum();
        assert!((protein - 50.0).abs() < 1e-6);
        assert!((fats - 20.0).abs() < 1e-6);
        assert!(portions.iter().all(|p| p.grams >= 0.0));
    }

    #[test]
    fn test_plan_identical_foods_is_singular() {
        let foods = [
            FoodProfile::new("A", 10.0, 10.0, 10.0),
            FoodProfile::new("B", 10.0, 10.0, 10.0),
            FoodProfile::new("C", 10.0, 10.0, 10.0),
        ];
        let plan = plan_portions(&MacroTargets::default(), &foods).unwrap();
        assert_eq!(plan, PortionPlan::Singular);
    }

    #[test]
    fn test_plan_negative_grams_is_infeasible() {
        let foods = [
            FoodProfile::new("Whey", 10.0, 0.0, 0.0),
            FoodProfile::new("Oats", 0.0, 10.0, 0.0),
            FoodProfile::new("Mix", 10.0, 10.0, 10.0),
        ];
        let targets = MacroTargets {
            protein: 10.0,
            carbs: 10.0,
            fats: 50.0,
        };

        match plan_portions(&targets, &foods).unwrap() {
            PortionPlan::Infeasible { grams } => {
                assert!((grams[0] + 400.0).abs() < 1e-9);
                assert!((grams[1] + 400.0).abs() < 1e-9);
                assert!((grams[2] - 500.0).abs() < 1e-9);
            }
            other => panic!("expected infeasible, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_rejects_non_finite_input() {
        let mut foods = FoodProfile::default_trio();
        foods[1].carbs = f64::NAN;
        let err = plan_portions(&MacroTargets::default(), &foods).unwrap_err();
        assert!(err.to_string().contains("White Rice carbs"));

        let targets = MacroTargets {
            protein: f64::INFINITY,
            ..MacroTargets::default()
        };
        assert!(plan_portions(&targets, &FoodProfile::default_trio()).is_err());
    }

    #[test]
    fn test_plan_serializes_with_outcome_tag() {
        let json = serde_json::to_value(PortionPlan::Singular).unwrap();
        assert_eq!(json["outcome"], "singular");
    }
}
