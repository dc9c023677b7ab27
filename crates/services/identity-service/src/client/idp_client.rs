//! HTTP client for the identity provider's management API.
//!
//! Speaks the Clerk-style backend API: `/invitations`, `/users` and
//! `/users/{id}/metadata`. Program roles and the inviting class are kept in
//! each record's public metadata.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::IdpConfig;
use common::{AppError, AppResult};
use domain::{Invitation, InvitationStatus, Role, User};

/// Identity provider operations used by the identity service.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Send an invitation email carrying the role and class in its metadata.
    async fn create_invitation(
        &self,
        email: &str,
        role: Role,
        class_id: Option<Uuid>,
    ) -> AppResult<Invitation>;

    /// Invitations that have not been accepted or revoked yet.
    async fn list_invitations(&self) -> AppResult<Vec<Invitation>>;

    async fn revoke_invitation(&self, id: &str) -> AppResult<Invitation>;

    /// One page of users plus the total user count.
    async fn list_users(&self, limit: u32, offset: u32) -> AppResult<(Vec<User>, i64)>;

    async fn get_user(&self, id: &str) -> AppResult<Option<User>>;

    /// Replace the role stored in the user's public metadata.
    async fn update_role(&self, id: &str, role: Role) -> AppResult<User>;
}

/// reqwest-backed identity provider client.
pub struct IdpClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
    redirect_url: Option<String>,
}

impl IdpClient {
    pub fn new(config: &IdpConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            redirect_url: config.redirect_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of `/{collection}/{id}{suffix}` for a provider-issued id.
    fn resource_url(&self, collection: &str, id: &str, suffix: &str) -> AppResult<String> {
        Ok(self.url(&format!("/{}/{}{}", collection, resource_id(id)?, suffix)))
    }

    /// Authenticate, send and decode a request.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let response = request.bearer_auth(&self.secret_key).send().await?;
        let status = response.status();

        match status {
            s if s.is_success() => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(AppError::NotFound),
            StatusCode::CONFLICT => Err(AppError::conflict("Invitation")),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(AppError::identity_provider(format!(
                    "HTTP {}: {}",
                    status, body
                )))
            }
        }
    }
}

/// Provider ids (`user_2ab…`, `inv_9…`) are one path segment of word characters.
fn resource_id(id: &str) -> AppResult<&str> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(id)
    } else {
        Err(AppError::validation(format!("Invalid identity provider id: {:?}", id)))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PublicMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    class_id: Option<String>,
}

impl PublicMetadata {
    fn role(&self) -> Role {
        Role::from(self.role.as_deref().unwrap_or_default())
    }

    fn class_id(&self) -> Option<Uuid> {
        self.class_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
    }
}

#[derive(Debug, Deserialize)]
struct IdpInvitation {
    id: String,
    email_address: String,
    #[serde(default)]
    public_metadata: PublicMetadata,
    status: String,
    created_at: i64,
}

#[derive(Debug, Deserialize)]
struct IdpEmail {
    id: String,
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct IdpUser {
    id: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    email_addresses: Vec<IdpEmail>,
    #[serde(default)]
    primary_email_address_id: Option<String>,
    #[serde(default)]
    public_metadata: PublicMetadata,
    created_at: i64,
}

#[derive(Debug, Deserialize)]
struct IdpCount {
    total_count: i64,
}

/// Millisecond epoch timestamps as used by the management API.
fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

impl From<IdpInvitation> for Invitation {
    fn from(inv: IdpInvitation) -> Self {
        Invitation {
            role: inv.public_metadata.role(),
            class_id: inv.public_metadata.class_id(),
            id: inv.id,
            email: inv.email_address.to_lowercase(),
            // Unrecognised states are treated as still outstanding.
            status: InvitationStatus::parse(&inv.status).unwrap_or(InvitationStatus::Pending),
            created_at: from_millis(inv.created_at),
        }
    }
}

impl From<IdpUser> for User {
    fn from(user: IdpUser) -> Self {
        let email = user
            .email_addresses
            .iter()
            .find(|e| Some(&e.id) == user.primary_email_address_id.as_ref())
            .or_else(|| user.email_addresses.first())
            .map(|e| e.email_address.to_lowercase())
            .unwrap_or_default();

        let name = [user.first_name.as_deref(), user.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        User {
            role: user.public_metadata.role(),
            id: user.id,
            email,
            name,
            created_at: from_millis(user.created_at),
        }
    }
}

#[async_trait]
impl IdentityProvider for IdpClient {
    async fn create_invitation(
        &self,
        email: &str,
        role: Role,
        class_id: Option<Uuid>,
    ) -> AppResult<Invitation> {
        debug!("Creating invitation for {} as {}", email, role);

        let mut body = serde_json::json!({
            "email_address": email,
            "public_metadata": PublicMetadata {
                role: Some(role.to_string()),
                class_id: class_id.map(|id| id.to_string()),
            },
            "notify": true,
            "ignore_existing": true,
        });
        if let Some(redirect_url) = &self.redirect_url {
            body["redirect_url"] = serde_json::Value::String(redirect_url.clone());
        }

        let invitation: IdpInvitation = self
            .send(self.http.post(self.url("/invitations")).json(&body))
            .await?;
        Ok(invitation.into())
    }

    async fn list_invitations(&self) -> AppResult<Vec<Invitation>> {
        let invitations: Vec<IdpInvitation> = self
            .send(
                self.http
                    .get(self.url("/invitations"))
                    .query(&[("status", "pending")]),
            )
            .await?;
        Ok(invitations.into_iter().map(Invitation::from).collect())
    }

    async fn revoke_invitation(&self, id: &str) -> AppResult<Invitation> {
        let invitation: IdpInvitation = self
            .send(
                self.http
                    .post(self.resource_url("invitations", id, "/revoke")?),
            )
            .await?;
        Ok(invitation.into())
    }

    async fn list_users(&self, limit: u32, offset: u32) -> AppResult<(Vec<User>, i64)> {
        let page = self.send::<Vec<IdpUser>>(
            self.http.get(self.url("/users")).query(&[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("order_by", "-created_at".to_string()),
            ]),
        );
        let count = self.send::<IdpCount>(self.http.get(self.url("/users/count")));

        let (users, count) = tokio::try_join!(page, count)?;
        Ok((
            users.into_iter().map(User::from).collect(),
            count.total_count,
        ))
    }

    async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        let url = self.resource_url("users", id, "")?;
        match self.send::<IdpUser>(self.http.get(url)).await
        {
            Ok(user) => Ok(Some(user.into())),
            Err(AppError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update_role(&self, id: &str, role: Role) -> AppResult<User> {
        let body = serde_json::json!({
            "public_metadata": { "role": role.as_str() },
        });

        let user: IdpUser = self
            .send(
                self.http
                    .patch(self.resource_url("users", id, "/metadata")?)
                    .json(&body),
            )
            .await?;
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> IdpClient {
        IdpClient::new(&IdpConfig {
            api_url: server.uri(),
            secret_key: "sk_test_123".to_string(),
            redirect_url: Some("https://cohort.example.com/welcome".to_string()),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    fn user_json(id: &str, role: &str) -> serde_json::Value {
        json!({
            "id": id,
            "first_name": "Ada",
            "last_name": "Lovelace",
            "primary_email_address_id": "idn_2",
            "email_addresses": [
                { "id": "idn_1", "email_address": "old@example.com" },
                { "id": "idn_2", "email_address": "Ada@Example.com" }
            ],
            "public_metadata": { "role": role },
            "created_at": 1_725_000_000_000i64
        })
    }

    #[tokio::test]
    async fn test_create_invitation_sends_metadata() {
        let server = MockServer::start().await;
        let class_id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/invitations"))
            .and(header("authorization", "Bearer sk_test_123"))
            .and(body_partial_json(json!({
                "email_address": "new@example.com",
                "public_metadata": { "role": "student", "class_id": class_id.to_string() },
                "redirect_url": "https://cohort.example.com/welcome"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "inv_1",
                "email_address": "new@example.com",
                "public_metadata": { "role": "student", "class_id": class_id.to_string() },
                "status": "pending",
                "created_at": 1_725_000_000_000i64
            })))
            .expect(1)
            .mount(&server)
            .await;

        let invitation = client(&server)
            .create_invitation("new@example.com", Role::Student, Some(class_id))
            .await
            .unwrap();

        assert_eq!(invitation.id, "inv_1");
        assert_eq!(invitation.role, Role::Student);
        assert_eq!(invitation.status, InvitationStatus::Pending);
        assert_eq!(invitation.class_id, Some(class_id));
    }

    #[tokio::test]
    async fn test_list_invitations_filters_pending() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/invitations"))
            .and(query_param("status", "pending"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "inv_2",
                "email_address": "teach@example.com",
                "public_metadata": { "role": "instructor" },
                "status": "pending",
                "created_at": 1_725_000_000_000i64
            }])))
            .mount(&server)
            .await;

        let invitations = client(&server).list_invitations().await.unwrap();
        assert_eq!(invitations.len(), 1);
        assert_eq!(invitations[0].role, Role::Instructor);
        assert_eq!(invitations[0].class_id, None);
    }

    #[tokio::test]
    async fn test_get_user_uses_primary_email() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/user_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("user_1", "admin")))
            .mount(&server)
            .await;

        let user = client(&server).get_user("user_1").await.unwrap().unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_get_user_not_found_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert!(client(&server).get_user("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_users_with_total() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users"))
            .and(query_param("limit", "2"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                user_json("user_1", "admin"),
                user_json("user_2", "")
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/count"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total_count": 7 })))
            .mount(&server)
            .await;

        let (users, total) = client(&server).list_users(2, 0).await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].role, Role::Student);
        assert_eq!(total, 7);
    }

    #[tokio::test]
    async fn test_update_role_patches_metadata() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/users/user_2/metadata"))
            .and(body_partial_json(json!({ "public_metadata": { "role": "instructor" } })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(user_json("user_2", "instructor")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let user = client(&server)
            .update_role("user_2", Role::Instructor)
            .await
            .unwrap();
        assert_eq!(user.role, Role::Instructor);
    }

    #[tokio::test]
    async fn test_provider_error_surfaces() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/invitations/inv_9/revoke"))
            .respond_with(ResponseTemplate::new(422).set_body_string("already accepted"))
            .mount(&server)
            .await;

        let result = client(&server).revoke_invitation("inv_9").await;
        assert!(matches!(result, Err(AppError::IdentityProvider(ref m)) if m.contains("already accepted")));
    }

    #[tokio::test]
    async fn test_ids_cannot_escape_their_path_segment() {
        let server = MockServer::start().await;
        let idp = client(&server);

        for id in ["../users/count", "user_1/metadata", "inv_1?x=1", ""] {
            assert!(matches!(idp.get_user(id).await, Err(AppError::Validation(_))));
            assert!(matches!(
                idp.revoke_invitation(id).await,
                Err(AppError::Validation(_))
            ));
            assert!(matches!(
                idp.update_role(id, Role::Admin).await,
                Err(AppError::Validation(_))
            ));
        }

        let requests = server.received_requests().await.unwrap_or_default();
        assert!(requests.is_empty());
    }
}
