//! Service layer.

mod identity_service;
mod token_verifier;

pub use identity_service::{IdentityManager, IdentityService};
pub use token_verifier::{SessionClaims, SessionMetadata, TokenVerifier};
