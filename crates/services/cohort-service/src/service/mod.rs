//! Service layer - cohort business rules over the repositories.

mod class_service;
mod engagement_service;
mod roster_service;
mod survey_service;

pub use class_service::{ClassManager, ClassService};
pub use engagement_service::{EngagementManager, EngagementService};
pub use roster_service::{RosterManager, RosterService};
pub use survey_service::{SurveyManager, SurveyService};
