//! Pure derivations over a scan and the user's profile for display.

use serde::Serialize;

use super::model::ScanResult;
use crate::profile::{HealthGoal, Profile};

pub const CALORIE_TARGET_KCAL: f64 = 2000.0;
pub const PROTEIN_TARGET_MUSCLE_GAIN_G: f64 = 150.0;
pub const PROTEIN_TARGET_DEFAULT_G: f64 = 80.0;
pub const CARBS_TARGET_G: f64 = 50.0;
pub const FAT_TARGET_G: f64 = 30.0;
pub const FIBER_TARGET_G: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroBreakdown {
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// Fraction of the three-macro sum held by each macro.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroShares {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroBreakdown {
    /// All shares are zero when the three macros sum to zero.
    pub fn shares(&self) -> MacroShares {
        let total = self.protein_g + self.carbs_g + self.fat_g;
        if !(total.is_finite() && total > 0.0) {
            return MacroShares {
                protein: 0.0,
                carbs: 0.0,
                fat: 0.0,
            };
        }
        MacroShares {
            protein: self.protein_g / total,
            carbs: self.carbs_g / total,
            fat: self.fat_g / total,
        }
    }
}

pub fn macro_breakdown(result: &ScanResult) -> MacroBreakdown {
    let total = result.total_nutrition();
    MacroBreakdown {
        protein_g: total.protein_g,
        carbs_g: total.carbs_g,
        fat_g: total.fat_g,
    }
}

/// `value / target` clamped to `[0, 1]`. A target that is not a positive
/// finite number yields 0.
pub fn goal_progress(value: f64, target: f64) -> f64 {
    if !(target.is_finite() && target > 0.0) || value.is_nan() {
        return 0.0;
    }
    (value / target).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NutrientTargets {
    pub calories_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
}

impl NutrientTargets {
    /// Only the protein target depends on the goal.
    pub fn for_goal(goal: Option<HealthGoal>) -> Self {
        let protein_g = match goal {
            Some(HealthGoal::MuscleGain) => PROTEIN_TARGET_MUSCLE_GAIN_G,
            Some(HealthGoal::WeightLoss)
            | Some(HealthGoal::Maintenance)
            | Some(HealthGoal::DiabetesControl)
            | None => PROTEIN_TARGET_DEFAULT_G,
        };
        Self {
            calories_kcal: CALORIE_TARGET_KCAL,
            protein_g,
            carbs_g: CARBS_TARGET_G,
            fat_g: FAT_TARGET_G,
            fiber_g: FIBER_TARGET_G,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalProgress {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodLine {
    pub food_name: String,
    pub confidence_percent: u8,
    pub estimated_grams: f64,
    pub calories: f64,
    pub protein_g: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub calories: f64,
    pub macros: MacroBreakdown,
    pub macro_shares: MacroShares,
    pub targets: NutrientTargets,
    pub progress: GoalProgress,
    pub foods: Vec<FoodLine>,
    pub health_alerts: Vec<String>,
    pub explanation: Option<String>,
    pub image_quality_score: Option<f64>,
    pub processed_at: Option<String>,
    pub totals_match: bool,
}

impl DashboardSummary {
    pub fn build(result: &ScanResult, profile: Option<&Profile>) -> Self {
        let total = result.total_nutrition();
        let macros = macro_breakdown(result);
        let targets = NutrientTargets::for_goal(profile.map(Profile::health_goal));
        let progress = GoalProgress {
            calories: goal_progress(total.calories, targets.calories_kcal),
            protein: goal_progress(total.protein_g, targets.protein_g),
            carbs: goal_progress(total.carbs_g, targets.carbs_g),
            fat: goal_progress(total.fat_g, targets.fat_g),
            fiber: goal_progress(total.fiber_g, targets.fiber_g),
        };
        let foods = result
            .detected_foods()
            .iter()
            .map(|f| FoodLine {
                food_name: f.food_name.clone(),
                confidence_percent: f.confidence_percent(),
                estimated_grams: f.estimated_grams,
                calories: f.nutrition.calories,
                protein_g: f.nutrition.protein_g,
            })
            .collect();

        Self {
            calories: total.calories,
            macros,
            macro_shares: macros.shares(),
            targets,
            progress,
            foods,
            health_alerts: result.health_alerts().to_vec(),
            explanation: result.explanation().map(str::to_string),
            image_quality_score: result.image_quality_score(),
            processed_at: result.processed_at().map(str::to_string),
            totals_match: result.totals_match(0.5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{ActivityLevel, DietaryPreference, Gender, ProfileDraft};
    use crate::scan::model::fixtures::food;

    fn profile(goal: HealthGoal) -> Profile {
        Profile::try_from(ProfileDraft {
            age: Some(40),
            gender: Some(Gender::Male),
            height_cm: Some(180.0),
            weight_kg: Some(82.0),
            health_goal: Some(goal),
            dietary_preference: Some(DietaryPreference::NonVegetarian),
            activity_level: Some(ActivityLevel::Active),
        })
        .unwrap()
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(goal_progress(90.0, 80.0), 1.0);
        assert_eq!(goal_progress(40.0, 80.0), 0.5);
        assert_eq!(goal_progress(-5.0, 80.0), 0.0);
        assert_eq!(goal_progress(10.0, 0.0), 0.0);
        assert_eq!(goal_progress(10.0, f64::NAN), 0.0);
    }

    #[test]
    fn zero_macros_give_zero_shares() {
        let shares = MacroBreakdown {
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
        }
        .shares();
        assert_eq!(shares, MacroShares { protein: 0.0, carbs: 0.0, fat: 0.0 });
    }

    #[test]
    fn shares_sum_to_one() {
        let shares = MacroBreakdown {
            protein_g: 20.0,
            carbs_g: 60.0,
            fat_g: 20.0,
        }
        .shares();
        assert_eq!(shares.protein, 0.2);
        assert_eq!(shares.carbs, 0.6);
        assert_eq!(shares.fat, 0.2);
    }

    #[test]
    fn protein_target_follows_goal() {
        assert_eq!(NutrientTargets::for_goal(Some(HealthGoal::MuscleGain)).protein_g, 150.0);
        assert_eq!(NutrientTargets::for_goal(Some(HealthGoal::WeightLoss)).protein_g, 80.0);
        assert_eq!(NutrientTargets::for_goal(None).protein_g, 80.0);
    }

    #[test]
    fn summary_for_muscle_gain() {
        let result = ScanResult::from_detections(
            vec![
                food("Paneer Tikka", 300.0, 45.0, 10.0, 20.0),
                food("Naan", 260.0, 30.0, 45.0, 6.0),
            ],
            vec!["High fat".into()],
            Some("two items".into()),
        );
        let summary = DashboardSummary::build(&result, Some(&profile(HealthGoal::MuscleGain)));
        assert_eq!(summary.calories, 560.0);
        assert_eq!(summary.macros.protein_g, 75.0);
        assert_eq!(summary.targets.protein_g, 150.0);
        assert_eq!(summary.progress.protein, 0.5);
        assert_eq!(summary.progress.carbs, 1.0);
        assert_eq!(summary.progress.calories, 0.28);
        assert_eq!(summary.foods.len(), 2);
        assert_eq!(summary.foods[0].food_name, "Paneer Tikka");
        assert_eq!(summary.foods[0].confidence_percent, 90);
        assert!(summary.totals_match);

        let maintenance = DashboardSummary::build(&result, Some(&profile(HealthGoal::Maintenance)));
        assert_eq!(maintenance.progress.protein, 0.9375);
    }

    #[test]
    fn summary_carries_image_metadata() {
        let result: ScanResult = serde_json::from_value(serde_json::json!({
            "detected_foods": [],
            "total_nutrition": {"calories": 0},
            "image_quality_score": 0.75,
            "processed_at": "2025-03-02T08:15:00"
        }))
        .unwrap();
        let summary = DashboardSummary::build(&result, None);
        assert_eq!(summary.image_quality_score, Some(0.75));
        assert_eq!(summary.processed_at.as_deref(), Some("2025-03-02T08:15:00"));

        let bare = ScanResult::from_detections(vec![food("Upma", 250.0, 6.0, 40.0, 8.0)], vec![], None);
        let summary = DashboardSummary::build(&bare, None);
        assert_eq!(summary.image_quality_score, None);
        assert_eq!(summary.processed_at, None);
    }

    #[test]
    fn derivations_are_repeatable() {
        let result = ScanResult::from_detections(vec![food("Upma", 250.0, 6.0, 40.0, 8.0)], vec![], None);
        let a = DashboardSummary::build(&result, None);
        let b = DashboardSummary::build(&result, None);
        assert_eq!(a, b);
    }
}
