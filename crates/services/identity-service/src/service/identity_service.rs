//! Identity service - session verification and program membership in the IdP.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use super::TokenVerifier;
use crate::client::IdentityProvider;
use common::{AppError, AppResult, OptionExt};
use domain::validation::normalize_email;
use domain::{Invitation, Role, SessionIdentity, User};

/// Page size used when the caller does not ask for one.
const DEFAULT_PAGE_SIZE: u32 = 50;
/// Largest page the provider is asked for.
const MAX_PAGE_SIZE: u32 = 100;

/// Identity service trait for dependency injection.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Verify a session token and extract the caller's identity
    fn verify_token(&self, token: &str) -> AppResult<SessionIdentity>;

    /// Invite someone by email with a program role
    async fn invite_user(
        &self,
        email: String,
        role: Role,
        class_id: Option<Uuid>,
    ) -> AppResult<Invitation>;

    async fn list_invitations(&self) -> AppResult<Vec<Invitation>>;

    async fn revoke_invitation(&self, id: String) -> AppResult<Invitation>;

    async fn list_users(&self, limit: Option<i32>, offset: Option<i32>)
        -> AppResult<(Vec<User>, i64)>;

    async fn get_user(&self, id: String) -> AppResult<User>;

    /// Promote or demote a user
    async fn set_role(&self, id: String, role: Role) -> AppResult<User>;
}

/// Concrete implementation of IdentityService over the IdP client.
pub struct IdentityManager {
    idp: Arc<dyn IdentityProvider>,
    verifier: TokenVerifier,
}

impl IdentityManager {
    pub fn new(idp: Arc<dyn IdentityProvider>, verifier: TokenVerifier) -> Self {
        Self { idp, verifier }
    }
}

fn require_id(id: &str) -> AppResult<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::validation("id is required"));
    }
    Ok(id)
}

#[async_trait]
impl IdentityService for IdentityManager {
    fn verify_token(&self, token: &str) -> AppResult<SessionIdentity> {
        self.verifier.verify(token)
    }

    async fn invite_user(
        &self,
        email: String,
        role: Role,
        class_id: Option<Uuid>,
    ) -> AppResult<Invitation> {
        let email = normalize_email(&email)?;
        let invitation = self.idp.create_invitation(&email, role, class_id).await?;
        info!("Invited {} as {}", email, role);
        Ok(invitation)
    }

    async fn list_invitations(&self) -> AppResult<Vec<Invitation>> {
        self.idp.list_invitations().await
    }

    async fn revoke_invitation(&self, id: String) -> AppResult<Invitation> {
        self.idp.revoke_invitation(require_id(&id)?).await
    }

    async fn list_users(
        &self,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> AppResult<(Vec<User>, i64)> {
        let limit = limit
            .and_then(|l| u32::try_from(l).ok())
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        let offset = offset.and_then(|o| u32::try_from(o).ok()).unwrap_or(0);

        self.idp.list_users(limit, offset).await
    }

    async fn get_user(&self, id: String) -> AppResult<User> {
        self.idp.get_user(require_id(&id)?).await?.ok_or_not_found()
    }

    async fn set_role(&self, id: String, role: Role) -> AppResult<User> {
        let id = require_id(&id)?;
        self.idp.get_user(id).await?.ok_or_not_found()?;

        let user = self.idp.update_role(id, role).await?;
        info!("Set role of {} to {}", user.id, role);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockIdentityProvider;
    use crate::config::{TokenConfig, TokenKey};
    use chrono::Utc;
    use domain::InvitationStatus;
    use mockall::predicate::*;

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(&TokenConfig {
            key: TokenKey::Secret("unit-test-secret-unit-test-secret".to_string()),
            issuer: None,
        })
        .unwrap()
    }

    fn user(id: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            name: "Test User".to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_invite_normalizes_email() {
        let mut idp = MockIdentityProvider::new();
        idp.expect_create_invitation()
            .with(eq("new@example.com"), eq(Role::Student), eq(None))
            .returning(|email, role, class_id| {
                Ok(Invitation {
                    id: "inv_1".to_string(),
                    email: email.to_string(),
                    role,
                    status: InvitationStatus::Pending,
                    class_id,
                    created_at: Utc::now(),
                })
            });

        let service = IdentityManager::new(Arc::new(idp), verifier());
        let invitation = service
            .invite_user("  New@Example.com ".to_string(), Role::Student, None)
            .await
            .unwrap();

        assert_eq!(invitation.email, "new@example.com");
    }

    #[tokio::test]
    async fn test_invite_rejects_bad_email() {
        let mut idp = MockIdentityProvider::new();
        idp.expect_create_invitation().never();

        let service = IdentityManager::new(Arc::new(idp), verifier());
        let result = service
            .invite_user("not-an-email".to_string(), Role::Student, None)
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_users_clamps_page() {
        let mut idp = MockIdentityProvider::new();
        idp.expect_list_users()
            .with(eq(MAX_PAGE_SIZE), eq(0))
            .returning(|_, _| Ok((vec![], 0)));
        idp.expect_list_users()
            .with(eq(DEFAULT_PAGE_SIZE), eq(10))
            .returning(|_, _| Ok((vec![], 0)));

        let service = IdentityManager::new(Arc::new(idp), verifier());
        service.list_users(Some(1000), Some(-5)).await.unwrap();
        service.list_users(None, Some(10)).await.unwrap();
    }

    #[tokio::test]
    async fn test_set_role_unknown_user() {
        let mut idp = MockIdentityProvider::new();
        idp.expect_get_user().returning(|_| Ok(None));
        idp.expect_update_role().never();

        let service = IdentityManager::new(Arc::new(idp), verifier());
        let result = service.set_role("user_x".to_string(), Role::Admin).await;

        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_set_role_updates_metadata() {
        let mut idp = MockIdentityProvider::new();
        idp.expect_get_user()
            .with(eq("user_2"))
            .returning(|id| Ok(Some(user(id, Role::Student))));
        idp.expect_update_role()
            .with(eq("user_2"), eq(Role::Instructor))
            .returning(|id, role| Ok(user(id, role)));

        let service = IdentityManager::new(Arc::new(idp), verifier());
        let updated = service
            .set_role("user_2".to_string(), Role::Instructor)
            .await
            .unwrap();

        assert_eq!(updated.role, Role::Instructor);
    }

    #[tokio::test]
    async fn test_revoke_requires_id() {
        let idp = MockIdentityProvider::new();
        let service = IdentityManager::new(Arc::new(idp), verifier());

        let result = service.revoke_invitation("  ".to_string()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
