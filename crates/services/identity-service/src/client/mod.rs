//! Outbound clients.

mod idp_client;

pub use idp_client::{IdentityProvider, IdpClient};

#[cfg(any(test, feature = "test-utils"))]
pub use idp_client::MockIdentityProvider;
