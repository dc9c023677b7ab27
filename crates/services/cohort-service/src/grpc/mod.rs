//! gRPC layer - tonic servers over the cohort services.

mod class_grpc;
mod convert;
mod engagement_grpc;
mod roster_grpc;
mod survey_grpc;

pub use class_grpc::ClassGrpcService;
pub use engagement_grpc::EngagementGrpcService;
pub use roster_grpc::RosterGrpcService;
pub use survey_grpc::SurveyGrpcService;

use chrono::{DateTime, NaiveDate, Utc};
use tonic::Status;
use uuid::Uuid;

use common::{wire, AppError};
use domain::DomainError;

/// Parse a required UUID field into a gRPC status on failure.
fn parse_uuid(field: &str, value: &str) -> Result<Uuid, Status> {
    wire::parse_uuid(field, value).map_err(Status::from)
}

fn parse_opt_uuid(field: &str, value: Option<&str>) -> Result<Option<Uuid>, Status> {
    wire::parse_opt_uuid(field, value).map_err(Status::from)
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, Status> {
    wire::parse_date(field, value).map_err(Status::from)
}

fn parse_opt_timestamp(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, Status> {
    wire::parse_opt_timestamp(field, value).map_err(Status::from)
}

/// Domain rule violations carry their own status mapping.
fn domain_status(err: DomainError) -> Status {
    Status::from(AppError::from(err))
}
