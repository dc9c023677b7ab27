//! gRPC clients for calling microservices.
//!
//! Handlers reach the services through the `*Api` traits, so routes can be
//! exercised against mocks.

mod cohort_client;
mod convert;
mod identity_client;

pub use cohort_client::{CohortApi, CohortClient};
pub use identity_client::{IdentityApi, IdentityClient};

#[cfg(test)]
pub use cohort_client::MockCohortApi;
#[cfg(test)]
pub use identity_client::MockIdentityApi;
