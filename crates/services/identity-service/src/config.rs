//! Identity service configuration.

use common::{env_opt, env_or, env_parse, AppError, AppResult};

/// How session tokens are signed by the identity provider.
#[derive(Debug, Clone)]
pub enum TokenKey {
    /// HS256 shared secret
    Secret(String),
    /// RS256 public key in PEM form
    PublicKeyPem(String),
}

/// Session token verification settings.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub key: TokenKey,
    /// Expected `iss` claim; not checked when unset
    pub issuer: Option<String>,
}

/// Identity provider management API settings.
#[derive(Debug, Clone)]
pub struct IdpConfig {
    /// Base URL of the management API, e.g. `https://api.clerk.com/v1`
    pub api_url: String,
    /// Secret key sent as a Bearer token
    pub secret_key: String,
    /// Where invitation emails send the invitee
    pub redirect_url: Option<String>,
    pub timeout_seconds: u64,
}

/// Identity service configuration.
#[derive(Debug, Clone)]
pub struct IdentityServiceConfig {
    pub token: TokenConfig,
    pub idp: IdpConfig,
}

impl IdentityServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Fails when neither a token secret nor a public key is configured, or
    /// when the identity provider secret key is missing.
    pub fn from_env() -> AppResult<Self> {
        let key = match (
            env_opt(&["IDENTITY_JWT_PUBLIC_KEY"]),
            env_opt(&["IDENTITY_JWT_SECRET", "JWT_SECRET"]),
        ) {
            (Some(pem), _) => TokenKey::PublicKeyPem(pem.replace("\\n", "\n")),
            (None, Some(secret)) => TokenKey::Secret(secret),
            (None, None) => {
                return Err(AppError::internal(
                    "IDENTITY_JWT_PUBLIC_KEY or IDENTITY_JWT_SECRET must be set",
                ))
            }
        };

        let secret_key = env_opt(&["IDENTITY_IDP_SECRET_KEY", "CLERK_SECRET_KEY"])
            .ok_or_else(|| AppError::internal("IDENTITY_IDP_SECRET_KEY must be set"))?;

        Ok(Self {
            token: TokenConfig {
                key,
                issuer: env_opt(&["IDENTITY_JWT_ISSUER"]),
            },
            idp: IdpConfig {
                api_url: env_or(&["IDENTITY_IDP_API_URL"], "https://api.clerk.com/v1"),
                secret_key,
                redirect_url: env_opt(&["IDENTITY_INVITE_REDIRECT_URL"]),
                timeout_seconds: env_parse(&["IDENTITY_IDP_TIMEOUT_SECONDS"], 10),
            },
        })
    }
}
