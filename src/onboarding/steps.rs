use serde::Serialize;

use crate::{error::ValidationError, profile::Field, profile::ProfileDraft};

/// Number of question steps between the welcome screen and completion.
pub const QUESTION_STEPS: u8 = 4;

/// One page of the onboarding wizard. Each variant owns the profile fields it
/// collects and validates exactly those.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Welcome,
    Demographics,
    BodyMetrics,
    HealthGoal,
    Lifestyle,
    Complete,
}

impl Step {
    pub fn index(self) -> u8 {
        match self {
            Step::Welcome => 0,
            Step::Demographics => 1,
            Step::BodyMetrics => 2,
            Step::HealthGoal => 3,
            Step::Lifestyle => 4,
            Step::Complete => 5,
        }
    }

    pub fn required_fields(self) -> &'static [Field] {
        match self {
            Step::Welcome | Step::Complete => &[],
            Step::Demographics => &[Field::Age, Field::Gender],
            Step::BodyMetrics => &[Field::HeightCm, Field::WeightKg],
            Step::HealthGoal => &[Field::HealthGoal],
            Step::Lifestyle => &[Field::DietaryPreference, Field::ActivityLevel],
        }
    }

    /// The step that collects `field`.
    pub fn owning(field: Field) -> Step {
        match field {
            Field::Age | Field::Gender => Step::Demographics,
            Field::HeightCm | Field::WeightKg => Step::BodyMetrics,
            Field::HealthGoal => Step::HealthGoal,
            Field::DietaryPreference | Field::ActivityLevel => Step::Lifestyle,
        }
    }

    pub fn validate(self, draft: &ProfileDraft) -> Result<(), ValidationError> {
        let missing = draft.missing(self.required_fields());
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                step: self,
                missing,
            })
        }
    }

    pub fn is_satisfied(self, draft: &ProfileDraft) -> bool {
        self.validate(draft).is_ok()
    }

    pub fn next(self) -> Option<Step> {
        match self {
            Step::Welcome => Some(Step::Demographics),
            Step::Demographics => Some(Step::BodyMetrics),
            Step::BodyMetrics => Some(Step::HealthGoal),
            Step::HealthGoal => Some(Step::Lifestyle),
            Step::Lifestyle => Some(Step::Complete),
            Step::Complete => None,
        }
    }

    /// Going back is only possible between question steps; the welcome screen
    /// is never revisited and completion is terminal.
    pub fn previous(self) -> Option<Step> {
        match self {
            Step::BodyMetrics => Some(Step::Demographics),
            Step::HealthGoal => Some(Step::BodyMetrics),
            Step::Lifestyle => Some(Step::HealthGoal),
            Step::Welcome | Step::Demographics | Step::Complete => None,
        }
    }

    pub fn progress_percent(self) -> u8 {
        let done = self.index().min(QUESTION_STEPS) as f64;
        (done / QUESTION_STEPS as f64 * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Step; 6] = [
        Step::Welcome,
        Step::Demographics,
        Step::BodyMetrics,
        Step::HealthGoal,
        Step::Lifestyle,
        Step::Complete,
    ];

    #[test]
    fn every_field_has_one_owner() {
        for field in Field::ALL {
            let owner = Step::owning(field);
            assert!(owner.required_fields().contains(&field));
            let owners = ALL
                .iter()
                .filter(|s| s.required_fields().contains(&field))
                .count();
            assert_eq!(owners, 1, "{field:?}");
        }
    }

    #[test]
    fn next_and_previous_are_linear() {
        for pair in ALL.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
            assert_eq!(pair[1].index(), pair[0].index() + 1);
        }
        assert_eq!(Step::Complete.next(), None);
        assert_eq!(Step::Demographics.previous(), None);
        assert_eq!(Step::Welcome.previous(), None);
        assert_eq!(Step::Complete.previous(), None);
        assert_eq!(Step::Lifestyle.previous(), Some(Step::HealthGoal));
    }

    #[test]
    fn welcome_is_always_valid() {
        assert!(Step::Welcome.is_satisfied(&ProfileDraft::default()));
    }

    #[test]
    fn demographics_needs_age_and_gender() {
        let mut draft = ProfileDraft {
            age: Some(31),
            ..Default::default()
        };
        let err = Step::Demographics.validate(&draft).unwrap_err();
        assert_eq!(err.missing, vec![Field::Gender]);

        draft.gender = Some(crate::profile::Gender::Other);
        assert!(Step::Demographics.is_satisfied(&draft));
    }

    #[test]
    fn progress_percentages() {
        let got: Vec<u8> = ALL.iter().map(|s| s.progress_percent()).collect();
        assert_eq!(got, vec![0, 25, 50, 75, 100, 100]);
    }
}
