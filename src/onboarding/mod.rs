pub mod steps;
pub mod wizard;

pub use crate::profile::Field;
pub use steps::{Step, QUESTION_STEPS};
pub use wizard::{Wizard, WizardView};
