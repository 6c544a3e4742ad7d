use serde::Serialize;
use tracing::{debug, instrument};

use super::steps::Step;
use crate::{
    error::OnboardingError,
    profile::{Field, Profile, ProfileDraft},
    session::Session,
};

/// The onboarding flow. Edits only touch the in-memory draft; the single
/// side effect is persisting the profile when leaving the last question.
#[derive(Debug, Clone, PartialEq)]
pub struct Wizard {
    step: Step,
    draft: ProfileDraft,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            step: Step::Welcome,
            draft: ProfileDraft::default(),
        }
    }

    /// A wizard that has already finished; every transition is refused.
    pub fn finished() -> Self {
        Self {
            step: Step::Complete,
            draft: ProfileDraft::default(),
        }
    }

    /// `None` once the session's completion flag is set.
    pub async fn start(session: &Session) -> Option<Self> {
        if session.is_onboarded().await {
            None
        } else {
            Some(Self::new())
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &ProfileDraft {
        &self.draft
    }

    pub fn is_complete(&self) -> bool {
        self.step == Step::Complete
    }

    /// Applies field edits. Ignored after completion.
    pub fn update(&mut self, patch: ProfileDraft) -> bool {
        if self.is_complete() {
            return false;
        }
        self.draft.merge(patch);
        true
    }

    pub fn missing_fields(&self) -> Vec<Field> {
        self.draft.missing(self.step.required_fields())
    }

    pub fn can_go_back(&self) -> bool {
        self.step.previous().is_some()
    }

    pub fn can_advance(&self) -> bool {
        self.step.next().is_some() && self.step.is_satisfied(&self.draft)
    }

    /// Moves one step back; a no-op returning `false` where back is disabled.
    pub fn back(&mut self) -> bool {
        match self.step.previous() {
            Some(prev) => {
                debug!(from = ?self.step, to = ?prev, "onboarding back");
                self.step = prev;
                true
            }
            None => false,
        }
    }

    /// Validates the current step and moves forward. Leaving `Lifestyle`
    /// persists the profile and sets the completion flag; the wizard only
    /// enters `Complete` once both writes succeeded.
    #[instrument(skip(self, session), fields(step = ?self.step))]
    pub async fn advance(&mut self, session: &Session) -> Result<Step, OnboardingError> {
        let next = self.step.next().ok_or(OnboardingError::AlreadyComplete)?;
        self.step.validate(&self.draft)?;

        if next == Step::Complete {
            let profile = Profile::try_from(self.draft.clone())?;
            session
                .complete_onboarding(profile)
                .await
                .map_err(OnboardingError::Persist)?;
        }

        debug!(to = ?next, "onboarding next");
        self.step = next;
        Ok(next)
    }

    pub fn view(&self) -> WizardView {
        WizardView {
            step: self.step,
            index: self.step.index(),
            progress_percent: self.step.progress_percent(),
            can_go_back: self.can_go_back(),
            can_advance: self.can_advance(),
            missing_fields: self.missing_fields(),
            draft: self.draft.clone(),
            draft_bmi: self.draft.bmi(),
        }
    }
}

/// Everything a front end needs to draw the current page.
#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub step: Step,
    pub index: u8,
    pub progress_percent: u8,
    pub can_go_back: bool,
    pub can_advance: bool,
    pub missing_fields: Vec<Field>,
    pub draft: ProfileDraft,
    pub draft_bmi: Option<f64>,
}
