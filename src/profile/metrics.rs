use serde::Serialize;

/// Body-mass index rounded to one decimal, or `None` when either input is
/// missing, zero, negative or not finite.
pub fn bmi(height_cm: f64, weight_kg: f64) -> Option<f64> {
    if !(height_cm.is_finite() && weight_kg.is_finite()) || height_cm <= 0.0 || weight_kg <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(round1(weight_kg / (height_m * height_m)))
}

pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
    Unknown,
}

impl BmiCategory {
    pub fn from_bmi(bmi: Option<f64>) -> Self {
        match bmi {
            Some(v) if v.is_nan() => BmiCategory::Unknown,
            Some(v) if v < 18.5 => BmiCategory::Underweight,
            Some(v) if v < 25.0 => BmiCategory::Normal,
            Some(v) if v < 30.0 => BmiCategory::Overweight,
            Some(_) => BmiCategory::Obese,
            None => BmiCategory::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
            BmiCategory::Unknown => "N/A",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmi_of_reference_adult() {
        let v = bmi(170.0, 70.0);
        assert_eq!(v, Some(24.2));
        assert_eq!(BmiCategory::from_bmi(v), BmiCategory::Normal);
    }

    #[test]
    fn bmi_sentinel_on_unusable_input() {
        assert_eq!(bmi(0.0, 70.0), None);
        assert_eq!(bmi(170.0, 0.0), None);
        assert_eq!(bmi(-170.0, 70.0), None);
        assert_eq!(bmi(f64::NAN, 70.0), None);
        assert_eq!(bmi(170.0, f64::INFINITY), None);
        assert_eq!(BmiCategory::from_bmi(None), BmiCategory::Unknown);
    }

    #[test]
    fn category_boundaries() {
        assert_eq!(BmiCategory::from_bmi(Some(18.4)), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(Some(18.5)), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(Some(24.9)), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(Some(25.0)), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(Some(29.9)), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(Some(30.0)), BmiCategory::Obese);
        assert_eq!(BmiCategory::Unknown.label(), "N/A");
    }

    #[test]
    fn category_uses_rounded_value() {
        // 24.96 rounds up to 25.0
        let v = bmi(200.0, 99.85);
        assert_eq!(v, Some(25.0));
        assert_eq!(BmiCategory::from_bmi(v), BmiCategory::Overweight);
    }
}
