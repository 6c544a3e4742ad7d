pub mod metrics;
pub mod model;

pub use metrics::{bmi, BmiCategory};
pub use model::{ActivityLevel, DietaryPreference, Field, Gender, HealthGoal, Profile, ProfileDraft};
