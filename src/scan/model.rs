use serde::{Deserialize, Serialize};

/// Nutrient amounts for one food portion or a whole scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default)]
    pub calories: f64,
    #[serde(default, rename = "protein")]
    pub protein_g: f64,
    #[serde(default, rename = "carbs")]
    pub carbs_g: f64,
    #[serde(default, rename = "fat")]
    pub fat_g: f64,
    #[serde(default, rename = "fiber")]
    pub fiber_g: f64,
    #[serde(default, rename = "sugar", skip_serializing_if = "Option::is_none")]
    pub sugar_g: Option<f64>,
    #[serde(default, rename = "sodium", skip_serializing_if = "Option::is_none")]
    pub sodium_mg: Option<f64>,
}

impl Nutrition {
    fn values(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("calories", self.calories),
            ("protein", self.protein_g),
            ("carbs", self.carbs_g),
            ("fat", self.fat_g),
            ("fiber", self.fiber_g),
        ]
        .into_iter()
        .chain(self.sugar_g.map(|v| ("sugar", v)))
        .chain(self.sodium_mg.map(|v| ("sodium", v)))
    }

    /// Name of the first negative or non-finite amount, if any.
    pub fn first_invalid(&self) -> Option<&'static str> {
        self.values()
            .find(|(_, v)| !v.is_finite() || *v < 0.0)
            .map(|(name, _)| name)
    }

    pub fn add(&self, other: &Nutrition) -> Nutrition {
        let opt = |a: Option<f64>, b: Option<f64>| match (a, b) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
        };
        Nutrition {
            calories: self.calories + other.calories,
            protein_g: self.protein_g + other.protein_g,
            carbs_g: self.carbs_g + other.carbs_g,
            fat_g: self.fat_g + other.fat_g,
            fiber_g: self.fiber_g + other.fiber_g,
            sugar_g: opt(self.sugar_g, other.sugar_g),
            sodium_mg: opt(self.sodium_mg, other.sodium_mg),
        }
    }

    /// Largest absolute difference across the shared amounts.
    fn max_difference(&self, other: &Nutrition) -> f64 {
        [
            self.calories - other.calories,
            self.protein_g - other.protein_g,
            self.carbs_g - other.carbs_g,
            self.fat_g - other.fat_g,
            self.fiber_g - other.fiber_g,
        ]
        .into_iter()
        .map(f64::abs)
        .fold(0.0, f64::max)
    }
}

/// One recognized food item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodDetection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_id: Option<String>,
    pub food_name: String,
    pub confidence: f64,
    #[serde(alias = "portion_grams", alias = "estimated_portion_g")]
    pub estimated_grams: f64,
    #[serde(default)]
    pub nutrition: Nutrition,
    #[serde(
        default,
        alias = "explanation",
        skip_serializing_if = "Option::is_none"
    )]
    pub portion_explanation: Option<String>,
}

impl FoodDetection {
    /// Confidence as a whole percentage for display.
    pub fn confidence_percent(&self) -> u8 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u8
    }

    fn check(&self, idx: usize) -> Result<(), String> {
        if self.food_name.trim().is_empty() {
            return Err(format!("detected_foods[{idx}].food_name is empty"));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "detected_foods[{idx}].confidence {} outside [0, 1]",
                self.confidence
            ));
        }
        if !(self.estimated_grams.is_finite() && self.estimated_grams > 0.0) {
            return Err(format!(
                "detected_foods[{idx}].estimated_grams {} is not positive",
                self.estimated_grams
            ));
        }
        if let Some(name) = self.nutrition.first_invalid() {
            return Err(format!("detected_foods[{idx}].nutrition.{name} is negative"));
        }
        Ok(())
    }
}

/// Snapshot of one recognition call. Fields are read-only after creation;
/// the stored total is kept exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    detected_foods: Vec<FoodDetection>,
    total_nutrition: Nutrition,
    #[serde(default)]
    health_alerts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_quality_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    processed_at: Option<String>,
}

impl ScanResult {
    /// Builds a result whose total is the sum of its detections.
    pub fn from_detections(
        detected_foods: Vec<FoodDetection>,
        health_alerts: Vec<String>,
        explanation: Option<String>,
    ) -> Self {
        let total_nutrition = sum(&detected_foods);
        Self {
            detected_foods,
            total_nutrition,
            health_alerts,
            explanation,
            image_quality_score: None,
            image_path: None,
            processed_at: None,
        }
    }

    pub fn detected_foods(&self) -> &[FoodDetection] {
        &self.detected_foods
    }

    pub fn total_nutrition(&self) -> &Nutrition {
        &self.total_nutrition
    }

    pub fn health_alerts(&self) -> &[String] {
        &self.health_alerts
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn image_quality_score(&self) -> Option<f64> {
        self.image_quality_score
    }

    pub fn processed_at(&self) -> Option<&str> {
        self.processed_at.as_deref()
    }

    /// Sum of the per-food amounts. Does not touch the stored total.
    pub fn recomputed_total(&self) -> Nutrition {
        sum(&self.detected_foods)
    }

    /// Whether the stored total agrees with the detections within `tolerance`
    /// for every shared amount.
    pub fn totals_match(&self, tolerance: f64) -> bool {
        self.total_nutrition
            .max_difference(&self.recomputed_total())
            <= tolerance
    }

    /// Checks the invariants a decoded payload must satisfy.
    pub fn validate(&self) -> Result<(), String> {
        for (idx, food) in self.detected_foods.iter().enumerate() {
            food.check(idx)?;
        }
        if let Some(name) = self.total_nutrition.first_invalid() {
            return Err(format!("total_nutrition.{name} is negative"));
        }
        if let Some(q) = self.image_quality_score {
            if !(0.0..=1.0).contains(&q) {
                return Err(format!("image_quality_score {q} outside [0, 1]"));
            }
        }
        Ok(())
    }
}

fn sum(foods: &[FoodDetection]) -> Nutrition {
    foods
        .iter()
        .fold(Nutrition::default(), |acc, f| acc.add(&f.nutrition))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn food(name: &str, calories: f64, protein: f64, carbs: f64, fat: f64) -> FoodDetection {
        FoodDetection {
            food_id: Some(name.to_lowercase().replace(' ', "_")),
            food_name: name.to_string(),
            confidence: 0.9,
            estimated_grams: 150.0,
            nutrition: Nutrition {
                calories,
                protein_g: protein,
                carbs_g: carbs,
                fat_g: fat,
                ..Default::default()
            },
            portion_explanation: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::food;
    use super::*;
    use serde_json::json;

    fn recognizer_payload() -> serde_json::Value {
        json!({
            "success": true,
            "detected_foods": [
                {
                    "food_id": "dal",
                    "food_name": "Dal",
                    "confidence": 0.87,
                    "estimated_grams": 200,
                    "portion_explanation": "One bowl",
                    "nutrition": {"calories": 200, "protein": 12, "carbs": 30, "fat": 4,
                                  "fiber": 6, "sugar": 1, "sodium": 300}
                },
                {
                    "food_id": "roti",
                    "food_name": "Roti",
                    "confidence": 0.92,
                    "estimated_grams": 60,
                    "nutrition": {"calories": 150, "protein": 5, "carbs": 28, "fat": 2,
                                  "fiber": 3, "sugar": 0, "sodium": 150}
                }
            ],
            "total_nutrition": {"calories": 350, "protein": 17, "carbs": 58, "fat": 6,
                                "fiber": 9, "sugar": 1, "sodium": 450},
            "health_alerts": ["High sodium"],
            "explanation": "Dal 200g + Roti 60g",
            "image_quality_score": 0.8,
            "image_path": "abc.jpg",
            "processed_at": "2025-01-01T12:00:00.000001"
        })
    }

    #[test]
    fn decodes_recognizer_payload_in_order() {
        let result: ScanResult = serde_json::from_value(recognizer_payload()).unwrap();
        let names: Vec<&str> = result
            .detected_foods()
            .iter()
            .map(|f| f.food_name.as_str())
            .collect();
        assert_eq!(names, vec!["Dal", "Roti"]);
        assert_eq!(result.total_nutrition().calories, 350.0);
        assert_eq!(result.total_nutrition().protein_g, 17.0);
        assert_eq!(result.detected_foods()[0].portion_explanation.as_deref(), Some("One bowl"));
        assert_eq!(result.health_alerts(), ["High sodium".to_string()]);
        assert!(result.validate().is_ok());
    }

    #[test]
    fn recomputed_total_sums_parts() {
        let result: ScanResult = serde_json::from_value(recognizer_payload()).unwrap();
        assert_eq!(result.recomputed_total().calories, 350.0);
        assert!(result.totals_match(0.05));
    }

    #[test]
    fn mismatched_stored_total_is_kept() {
        let mut payload = recognizer_payload();
        payload["total_nutrition"]["calories"] = json!(400);
        let result: ScanResult = serde_json::from_value(payload).unwrap();
        assert_eq!(result.total_nutrition().calories, 400.0);
        assert_eq!(result.recomputed_total().calories, 350.0);
        assert!(!result.totals_match(0.05));
    }

    #[test]
    fn from_detections_totals_its_parts() {
        let result = ScanResult::from_detections(
            vec![food("Rice", 200.0, 4.0, 44.0, 0.5), food("Curd", 150.0, 8.0, 6.0, 8.0)],
            vec![],
            None,
        );
        assert_eq!(result.total_nutrition().calories, 350.0);
        assert_eq!(result.total_nutrition().protein_g, 12.0);
        assert!(result.totals_match(0.0));
    }

    #[test]
    fn foods_and_total_are_required() {
        for raw in [json!([]), json!({}), json!({"foo": 1}), json!({"detected_foods": []})] {
            assert!(serde_json::from_value::<ScanResult>(raw.clone()).is_err(), "{raw}");
        }
        let empty: ScanResult =
            serde_json::from_value(json!({"detected_foods": [], "total_nutrition": {}})).unwrap();
        assert!(empty.detected_foods().is_empty());
    }

    #[test]
    fn portion_grams_alias() {
        let f: FoodDetection = serde_json::from_value(json!({
            "food_name": "Idli",
            "confidence": 1,
            "portion_grams": 80,
            "nutrition": {"calories": 100, "protein": 3, "carbs": 20, "fat": 0.5}
        }))
        .unwrap();
        assert_eq!(f.estimated_grams, 80.0);
        assert_eq!(f.confidence_percent(), 100);
        assert_eq!(f.nutrition.fiber_g, 0.0);
    }

    #[test]
    fn validate_rejects_broken_invariants() {
        let mut bad = food("Poha", 180.0, 3.0, 30.0, 5.0);
        bad.confidence = 1.2;
        let result = ScanResult::from_detections(vec![bad], vec![], None);
        assert!(result.validate().unwrap_err().contains("confidence"));

        let mut bad = food(" ", 180.0, 3.0, 30.0, 5.0);
        bad.confidence = 0.5;
        let result = ScanResult::from_detections(vec![bad], vec![], None);
        assert!(result.validate().unwrap_err().contains("food_name"));

        let mut bad = food("Poha", 180.0, 3.0, 30.0, 5.0);
        bad.estimated_grams = 0.0;
        let result = ScanResult::from_detections(vec![bad], vec![], None);
        assert!(result.validate().unwrap_err().contains("estimated_grams"));

        let mut bad = food("Poha", 180.0, 3.0, 30.0, 5.0);
        bad.nutrition.fat_g = -1.0;
        let result = ScanResult::from_detections(vec![bad], vec![], None);
        assert!(result.validate().unwrap_err().contains("fat"));
    }
}
