use serde::{de::DeserializeOwned, de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::metrics::{bmi, BmiCategory};
use crate::{error::ValidationError, onboarding::Step};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthGoal {
    WeightLoss,
    MuscleGain,
    Maintenance,
    DiabetesControl,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DietaryPreference {
    Vegetarian,
    NonVegetarian,
    Vegan,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

/// A profile field, as named by validation errors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Age,
    Gender,
    HeightCm,
    WeightKg,
    HealthGoal,
    DietaryPreference,
    ActivityLevel,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Age,
        Field::Gender,
        Field::HeightCm,
        Field::WeightKg,
        Field::HealthGoal,
        Field::DietaryPreference,
        Field::ActivityLevel,
    ];
}

/// In-memory profile under construction. Every field is optional until the
/// owning wizard step validates it.
///
/// Deserialization is lenient: blank strings read as absent, numbers may be
/// encoded as text, and the camelCase names written by the old web client
/// are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDraft {
    #[serde(default, deserialize_with = "lenient_age")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub gender: Option<Gender>,
    #[serde(default, alias = "height", deserialize_with = "lenient_number")]
    pub height_cm: Option<f64>,
    #[serde(default, alias = "weight", deserialize_with = "lenient_number")]
    pub weight_kg: Option<f64>,
    #[serde(default, alias = "healthGoal", deserialize_with = "blank_as_none")]
    pub health_goal: Option<HealthGoal>,
    #[serde(
        default,
        alias = "dietaryPreference",
        deserialize_with = "blank_as_none"
    )]
    pub dietary_preference: Option<DietaryPreference>,
    #[serde(default, alias = "activityLevel", deserialize_with = "blank_as_none")]
    pub activity_level: Option<ActivityLevel>,
}

impl ProfileDraft {
    /// Whether the field holds a usable value. Zero, negative and non-finite
    /// numbers count as absent.
    pub fn is_present(&self, field: Field) -> bool {
        match field {
            Field::Age => self.age.is_some_and(|a| a > 0),
            Field::Gender => self.gender.is_some(),
            Field::HeightCm => positive(self.height_cm).is_some(),
            Field::WeightKg => positive(self.weight_kg).is_some(),
            Field::HealthGoal => self.health_goal.is_some(),
            Field::DietaryPreference => self.dietary_preference.is_some(),
            Field::ActivityLevel => self.activity_level.is_some(),
        }
    }

    pub fn missing(&self, fields: &[Field]) -> Vec<Field> {
        fields
            .iter()
            .copied()
            .filter(|f| !self.is_present(*f))
            .collect()
    }

    /// Overwrites every field the patch sets; unset patch fields are kept.
    pub fn merge(&mut self, patch: ProfileDraft) {
        if patch.age.is_some() {
            self.age = patch.age;
        }
        if patch.gender.is_some() {
            self.gender = patch.gender;
        }
        if patch.height_cm.is_some() {
            self.height_cm = patch.height_cm;
        }
        if patch.weight_kg.is_some() {
            self.weight_kg = patch.weight_kg;
        }
        if patch.health_goal.is_some() {
            self.health_goal = patch.health_goal;
        }
        if patch.dietary_preference.is_some() {
            self.dietary_preference = patch.dietary_preference;
        }
        if patch.activity_level.is_some() {
            self.activity_level = patch.activity_level;
        }
    }

    /// Live BMI for the body-metrics step; `None` until both inputs are usable.
    pub fn bmi(&self) -> Option<f64> {
        bmi(self.height_cm?, self.weight_kg?)
    }
}

/// A complete, validated user profile. Only obtainable from a draft whose
/// fields are all present, so every accessor is infallible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProfileDraft")]
pub struct Profile {
    age: u32,
    gender: Gender,
    height_cm: f64,
    weight_kg: f64,
    health_goal: HealthGoal,
    dietary_preference: DietaryPreference,
    activity_level: ActivityLevel,
}

impl Profile {
    pub fn age(&self) -> u32 {
        self.age
    }
    pub fn gender(&self) -> Gender {
        self.gender
    }
    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }
    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }
    pub fn health_goal(&self) -> HealthGoal {
        self.health_goal
    }
    pub fn dietary_preference(&self) -> DietaryPreference {
        self.dietary_preference
    }
    pub fn activity_level(&self) -> ActivityLevel {
        self.activity_level
    }

    pub fn bmi(&self) -> Option<f64> {
        bmi(self.height_cm, self.weight_kg)
    }

    pub fn bmi_category(&self) -> BmiCategory {
        BmiCategory::from_bmi(self.bmi())
    }
}

impl TryFrom<ProfileDraft> for Profile {
    type Error = ValidationError;

    fn try_from(d: ProfileDraft) -> Result<Self, Self::Error> {
        let (
            Some(age),
            Some(gender),
            Some(height_cm),
            Some(weight_kg),
            Some(health_goal),
            Some(dietary_preference),
            Some(activity_level),
        ) = (
            d.age.filter(|a| *a > 0),
            d.gender,
            positive(d.height_cm),
            positive(d.weight_kg),
            d.health_goal,
            d.dietary_preference,
            d.activity_level,
        )
        else {
            let missing = d.missing(&Field::ALL);
            let step = missing
                .first()
                .map_or(Step::Demographics, |f| Step::owning(*f));
            return Err(ValidationError { step, missing });
        };
        Ok(Profile {
            age,
            gender,
            height_cm,
            weight_kg,
            health_goal,
            dietary_preference,
            activity_level,
        })
    }
}

impl From<&Profile> for ProfileDraft {
    fn from(p: &Profile) -> Self {
        Self {
            age: Some(p.age),
            gender: Some(p.gender),
            height_cm: Some(p.height_cm),
            weight_kg: Some(p.weight_kg),
            health_goal: Some(p.health_goal),
            dietary_preference: Some(p.dietary_preference),
            activity_level: Some(p.activity_level),
        }
    }
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite() && *x > 0.0)
}

fn blank_as_none<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(v) => serde_json::from_value(v).map(Some).map_err(D::Error::custom),
    }
}

fn lenient_number<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("not a number: {s:?}")))
        }
        Some(other) => Err(D::Error::custom(format!("expected a number, got {other}"))),
    }
}

fn lenient_age<'de, D>(d: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match lenient_number(d)? {
        None => Ok(None),
        Some(n) if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => {
            Ok(Some(n as u32))
        }
        Some(n) => Err(D::Error::custom(format!("not a whole age: {n}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_draft() -> ProfileDraft {
        ProfileDraft {
            age: Some(29),
            gender: Some(Gender::Female),
            height_cm: Some(170.0),
            weight_kg: Some(70.0),
            health_goal: Some(HealthGoal::MuscleGain),
            dietary_preference: Some(DietaryPreference::Vegetarian),
            activity_level: Some(ActivityLevel::Moderate),
        }
    }

    #[test]
    fn legacy_camel_case_record_with_text_numbers() {
        let raw = json!({
            "age": "29",
            "gender": "female",
            "height": "170",
            "weight": "70",
            "healthGoal": "muscle_gain",
            "dietaryPreference": "vegetarian",
            "activityLevel": "moderate"
        });
        let draft: ProfileDraft = serde_json::from_value(raw).unwrap();
        assert_eq!(draft, full_draft());
    }

    #[test]
    fn blank_form_values_are_absent() {
        let raw = json!({
            "age": "",
            "gender": "",
            "height": "",
            "weight": "",
            "healthGoal": "",
            "dietaryPreference": "",
            "activityLevel": ""
        });
        let draft: ProfileDraft = serde_json::from_value(raw).unwrap();
        assert_eq!(draft, ProfileDraft::default());
        assert_eq!(draft.missing(&Field::ALL), Field::ALL.to_vec());
    }

    #[test]
    fn zero_and_negative_numbers_are_not_present() {
        let draft = ProfileDraft {
            age: Some(0),
            height_cm: Some(-3.0),
            weight_kg: Some(f64::NAN),
            ..Default::default()
        };
        assert!(!draft.is_present(Field::Age));
        assert!(!draft.is_present(Field::HeightCm));
        assert!(!draft.is_present(Field::WeightKg));
    }

    #[test]
    fn fractional_age_is_rejected() {
        let res = serde_json::from_value::<ProfileDraft>(json!({ "age": 29.5 }));
        assert!(res.is_err());
    }

    #[test]
    fn profile_requires_every_field() {
        let mut draft = full_draft();
        draft.activity_level = None;
        draft.age = None;
        let err = Profile::try_from(draft).unwrap_err();
        assert_eq!(err.step, Step::Demographics);
        assert_eq!(err.missing, vec![Field::Age, Field::ActivityLevel]);
    }

    #[test]
    fn profile_serializes_snake_case_and_reads_back() {
        let profile = Profile::try_from(full_draft()).unwrap();
        let text = serde_json::to_string(&profile).unwrap();
        assert!(text.contains("\"height_cm\":170.0"));
        assert!(text.contains("\"health_goal\":\"muscle_gain\""));
        let back: Profile = serde_json::from_str(&text).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn incomplete_record_does_not_deserialize_as_profile() {
        let res = serde_json::from_value::<Profile>(json!({ "age": 30 }));
        assert!(res.is_err());
    }

    #[test]
    fn merge_keeps_unset_fields() {
        let mut draft = full_draft();
        draft.merge(ProfileDraft {
            weight_kg: Some(72.5),
            ..Default::default()
        });
        assert_eq!(draft.weight_kg, Some(72.5));
        assert_eq!(draft.age, Some(29));
        assert_eq!(draft.gender, Some(Gender::Female));
    }

    #[test]
    fn profile_bmi_helpers() {
        let profile = Profile::try_from(full_draft()).unwrap();
        assert_eq!(profile.bmi(), Some(24.2));
        assert_eq!(profile.bmi_category(), BmiCategory::Normal);
    }
}
