use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::Secret;
use serde_json::{json, Value};
use uuid::Uuid;

use receivable_service::config::{
    AppConfig, AuthServiceSettings, DatabaseSettings, JwtSettings, ServerSettings,
};
use receivable_service::services::auth_client::{LookupError, UserDetails, UserDirectory};
use receivable_service::services::documents::StubDocumentStorage;
use receivable_service::services::jwt::Claims;
use receivable_service::services::store::MemoryStore;
use receivable_service::startup::Application;

pub const TEST_SECRET: &str = "test-signing-secret";

/// Fixed user directory standing in for the auth service. Usernames map to
/// single-role accounts; `nobody` authenticates but carries no roles, and
/// `outage` simulates the auth service being unreachable.
struct StaticDirectory;

#[async_trait]
impl UserDirectory for StaticDirectory {
    async fn lookup(&self, username: &str) -> Result<UserDetails, LookupError> {
        if username == "outage" {
            return Err(LookupError::Transient("connection refused".to_string()));
        }

        let roles: Vec<&str> = match username {
            "admin" => vec!["ADMIN"],
            "accountant" => vec!["ACCOUNTANT"],
            "sales" => vec!["SALES"],
            "manager" => vec!["MANAGER"],
            "viewer" => vec!["FINANCIAL_VIEWER"],
            "nobody" => vec![],
            _ => return Err(LookupError::NotFound),
        };

        Ok(UserDetails {
            id: Some(Uuid::new_v4()),
            username: username.to_string(),
            roles: Some(roles.into_iter().map(String::from).collect()),
        })
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let config = AppConfig {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseSettings {
                url: "postgres://unused/unused".to_string(),
                max_connections: 1,
                min_connections: 1,
            },
            auth_service: AuthServiceSettings {
                url: "http://127.0.0.1:0".to_string(),
            },
            jwt: JwtSettings {
                secret: Secret::new(TEST_SECRET.to_string()),
            },
        };

        let app = Application::build(
            &config,
            Arc::new(MemoryStore::new()),
            Arc::new(StubDocumentStorage),
            Arc::new(StaticDirectory),
        )
        .await
        .expect("Failed to build test application");

        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        TestApp {
            address,
            client: reqwest::Client::new(),
        }
    }

    /// Mint a token for a username known to the static directory.
    pub fn token_for(&self, username: &str) -> String {
        sign(username, Utc::now().timestamp() + 3600, TEST_SECRET)
    }

    pub fn expired_token_for(&self, username: &str) -> String {
        sign(username, Utc::now().timestamp() - 60, TEST_SECRET)
    }

    pub fn token_with_wrong_key(&self, username: &str) -> String {
        sign(username, Utc::now().timestamp() + 3600, "some-other-secret")
    }

    pub async fn create_receivable(&self, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}/receivables", self.address))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

fn sign(username: &str, exp: i64, secret: &str) -> String {
    let claims = Claims {
        sub: username.to_string(),
        exp,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// Minimal valid creation body with a far-future due date.
pub fn receivable_body() -> Value {
    json!({
        "clientId": Uuid::new_v4(),
        "projectId": Uuid::new_v4(),
        "description": "Invoice #INV-001 - Phase 1 Payment",
        "issueDate": "2024-01-10",
        "dueDate": "2099-02-10",
        "amountExpected": "5000.00"
    })
}
