//! Session token verification.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::{TokenConfig, TokenKey};
use common::AppResult;
use domain::{Role, SessionIdentity};

/// Session token claims issued by the identity provider.
///
/// The role lives in the custom `metadata` claim (the provider's public
/// metadata copied into the session token).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, alias = "public_metadata")]
    pub metadata: SessionMetadata,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Verifies session JWTs against the configured key and issuer.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &TokenConfig) -> AppResult<Self> {
        let (key, algorithm) = match &config.key {
            TokenKey::Secret(secret) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
            TokenKey::PublicKeyPem(pem) => (DecodingKey::from_rsa_pem(pem.as_bytes())?, Algorithm::RS256),
        };

        let mut validation = Validation::new(algorithm);
        // Session tokens carry no audience.
        validation.validate_aud = false;
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self { key, validation })
    }

    /// Decode and validate a token, returning who it belongs to.
    pub fn verify(&self, token: &str) -> AppResult<SessionIdentity> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation)?;
        let claims = data.claims;

        Ok(SessionIdentity {
            user_id: claims.sub,
            email: claims
                .email
                .map(|e| e.trim().to_lowercase())
                .unwrap_or_default(),
            role: Role::from(claims.metadata.role.as_deref().unwrap_or_default()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use common::AppError;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn verifier(issuer: Option<&str>) -> TokenVerifier {
        TokenVerifier::new(&TokenConfig {
            key: TokenKey::Secret(SECRET.to_string()),
            issuer: issuer.map(str::to_string),
        })
        .unwrap()
    }

    fn mint(secret: &str, role: Option<&str>, iss: Option<&str>, exp_offset: Duration) -> String {
        let claims = SessionClaims {
            sub: "user_1".to_string(),
            email: Some("Ada@Example.com".to_string()),
            metadata: SessionMetadata {
                role: role.map(str::to_string),
            },
            exp: (Utc::now() + exp_offset).timestamp(),
            iss: iss.map(str::to_string),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_valid_token() {
        let token = mint(SECRET, Some("instructor"), None, Duration::hours(1));
        let identity = verifier(None).verify(&token).unwrap();

        assert_eq!(identity.user_id, "user_1");
        assert_eq!(identity.email, "ada@example.com");
        assert_eq!(identity.role, Role::Instructor);
    }

    #[test]
    fn test_missing_role_is_student() {
        let token = mint(SECRET, None, None, Duration::hours(1));
        assert_eq!(verifier(None).verify(&token).unwrap().role, Role::Student);
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let token = mint("some-other-secret-of-sufficient-size", Some("admin"), None, Duration::hours(1));
        assert!(matches!(verifier(None).verify(&token), Err(AppError::Jwt(_))));
    }

    #[test]
    fn test_rejects_expired_token() {
        let token = mint(SECRET, Some("admin"), None, -Duration::hours(2));
        assert!(verifier(None).verify(&token).is_err());
    }

    #[test]
    fn test_checks_issuer_when_configured() {
        let good = mint(SECRET, None, Some("https://idp.example.com"), Duration::hours(1));
        let bad = mint(SECRET, None, Some("https://evil.example.com"), Duration::hours(1));
        let v = verifier(Some("https://idp.example.com"));

        assert!(v.verify(&good).is_ok());
        assert!(v.verify(&bad).is_err());
    }

    #[test]
    fn test_public_metadata_alias() {
        let claims = serde_json::json!({
            "sub": "user_9",
            "public_metadata": { "role": "admin" },
            "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        });
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let identity = verifier(None).verify(&token).unwrap();
        assert_eq!(identity.role, Role::Admin);
        assert_eq!(identity.email, "");
    }
}
