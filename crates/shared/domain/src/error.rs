//! Rule violations raised by the cohort domain.
//!
//! Independent of transport: `common` maps them onto HTTP and gRPC codes.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input failed a field or shape rule
    #[error("Validation error: {0}")]
    Validation(String),

    /// Survey no longer takes responses (closed, or past its due date)
    #[error("This survey is closed")]
    SurveyClosed,

    /// An admin tried to drop their own admin role
    #[error("Admins cannot demote themselves")]
    SelfDemotion,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
