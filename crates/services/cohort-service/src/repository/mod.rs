//! Repository layer for data access.

pub mod entities;
mod class_repository;
mod engagement_repository;
mod roster_repository;
mod survey_repository;

pub use class_repository::{ClassRepository, ClassStore};
pub use engagement_repository::{EngagementRepository, EngagementStore};
pub use roster_repository::{RosterRepository, RosterStore};
pub use survey_repository::{SurveyRepository, SurveyStore};

#[cfg(any(test, feature = "test-utils"))]
pub use class_repository::MockClassRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use engagement_repository::MockEngagementRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use roster_repository::MockRosterRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use survey_repository::MockSurveyRepository;

use common::AppError;
use sea_orm::{DbErr, TransactionError};

/// Updates addressed by primary key report a missing row as `RecordNotUpdated`.
pub(crate) fn update_error(err: DbErr) -> AppError {
    match err {
        DbErr::RecordNotUpdated => AppError::NotFound,
        other => AppError::from(other),
    }
}

pub(crate) fn transaction_error(err: TransactionError<DbErr>) -> AppError {
    match err {
        TransactionError::Connection(e) | TransactionError::Transaction(e) => AppError::from(e),
    }
}
