//! State - Editor State Modules
//!
//! In-memory state of the configuration page and the onboarding form. Nothing
//! here performs I/O; the service layer drives persistence.

pub mod change_tracker;
pub mod onboarding;
pub mod reset;
pub mod validation;
pub mod value_store;

pub use onboarding::{OnboardingStep, OnboardingTracker, StepStatus};
pub use reset::ResetController;
pub use validation::{ValidationContext, validate};
pub use value_store::{SectionState, ValueStore};
