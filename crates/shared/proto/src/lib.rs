//! gRPC protocol buffer definitions.
//!
//! This crate contains the generated gRPC service definitions for:
//! - IdentityService: session verification, invitations, role metadata
//! - Cohort services: classes, roster, surveys, engagement (comments,
//!   feedback, announcements)

/// Identity provider front definitions.
pub mod identity {
    tonic::include_proto!("identity");
}

/// Cohort data service definitions.
pub mod cohort {
    tonic::include_proto!("cohort");
}

// Re-export commonly used items
pub use cohort::class_service_client::ClassServiceClient;
pub use cohort::class_service_server::{ClassService, ClassServiceServer};
pub use cohort::engagement_service_client::EngagementServiceClient;
pub use cohort::engagement_service_server::{EngagementService, EngagementServiceServer};
pub use cohort::roster_service_client::RosterServiceClient;
pub use cohort::roster_service_server::{RosterService, RosterServiceServer};
pub use cohort::survey_service_client::SurveyServiceClient;
pub use cohort::survey_service_server::{SurveyService, SurveyServiceServer};
pub use identity::identity_service_client::IdentityServiceClient;
pub use identity::identity_service_server::{IdentityService, IdentityServiceServer};
