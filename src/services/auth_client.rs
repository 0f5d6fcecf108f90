//! User lookup against the remote auth service.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::AuthServiceSettings;

/// Identity returned by the auth service for a token subject.
#[derive(Debug, Clone, Deserialize)]
pub struct UserDetails {
    pub id: Option<Uuid>,
    pub username: String,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

impl UserDetails {
    /// Normalized role set: trimmed, uppercased, empty entries dropped.
    /// Normalization happens once here at the lookup boundary; the access
    /// gate compares plain uppercase names. A missing roles list means zero
    /// roles, not an error.
    pub fn normalized_roles(&self) -> Vec<String> {
        self.roles
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(|role| role.trim().to_uppercase())
            .filter(|role| !role.is_empty())
            .collect()
    }
}

/// Outcome of a lookup that did not produce an identity.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("user not found")]
    NotFound,
    /// Infrastructure trouble talking to the auth service. Never folded into
    /// `NotFound`: the caller must be able to tell a missing user apart from
    /// an unreachable upstream.
    #[error("auth service unavailable: {0}")]
    Transient(String),
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn lookup(&self, username: &str) -> Result<UserDetails, LookupError>;
}

/// HTTP client for the auth service's user endpoint.
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(settings: AuthServiceSettings) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.url,
        }
    }
}

#[async_trait]
impl UserDirectory for AuthClient {
    async fn lookup(&self, username: &str) -> Result<UserDetails, LookupError> {
        let url = format!("{}/api/users/username/{}", self.base_url, username);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!(%username, error = %e, "Failed to reach auth service");
            LookupError::Transient(format!("request failed: {}", e))
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::warn!(%username, "User not found at auth service");
                Err(LookupError::NotFound)
            }
            status if status.is_success() => {
                response.json::<UserDetails>().await.map_err(|e| {
                    tracing::error!(%username, error = %e, "Malformed user details from auth service");
                    LookupError::Transient(format!("malformed response: {}", e))
                })
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::error!(%username, %status, %body, "Auth service returned an error");
                Err(LookupError::Transient(format!("upstream status {}", status)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_normalized_once_at_the_boundary() {
        let user = UserDetails {
            id: None,
            username: "maria".to_string(),
            roles: Some(vec![
                " admin ".to_string(),
                "Accountant".to_string(),
                "".to_string(),
            ]),
        };
        assert_eq!(user.normalized_roles(), vec!["ADMIN", "ACCOUNTANT"]);
    }

    #[test]
    fn missing_roles_list_means_zero_roles() {
        let user = UserDetails {
            id: None,
            username: "maria".to_string(),
            roles: None,
        };
        assert!(user.normalized_roles().is_empty());
    }
}
