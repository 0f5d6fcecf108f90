//! Bearer-token authentication and the role gate in front of the API.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::services::auth_client::LookupError;
use crate::services::policy;
use crate::startup::AppState;

/// Identity resolved for the current request, stored in request extensions
/// after the middleware has run.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Option<uuid::Uuid>,
    pub username: String,
    pub roles: Vec<String>,
}

/// Extractor for handlers that need the authenticated identity.
pub struct AuthUser(pub CurrentUser);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!("Could not authenticate"))
            })
    }
}

/// Validate the bearer token, resolve the subject against the auth service,
/// and apply the route's role requirement. Every authentication failure is
/// reported to the caller as the same opaque 401; the underlying reason is
/// only logged.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();
    if policy::is_public(&path) {
        return Ok(next.run(request).await);
    }

    let token = bearer_token(&request).ok_or_else(|| {
        tracing::warn!(%path, "Missing or malformed Authorization header");
        unauthorized()
    })?;

    let claims = state.jwt.validate(&token).map_err(|_| unauthorized())?;

    let user = state.users.lookup(&claims.sub).await.map_err(|e| {
        match e {
            LookupError::NotFound => {
                tracing::warn!(username = %claims.sub, "Token subject unknown to auth service")
            }
            LookupError::Transient(reason) => {
                tracing::error!(username = %claims.sub, %reason, "User lookup failed")
            }
        }
        unauthorized()
    })?;

    let current = CurrentUser {
        id: user.id,
        roles: user.normalized_roles(),
        username: user.username,
    };

    let method = request.method().clone();
    if !policy::is_allowed(&method, &path, &current.roles) {
        tracing::warn!(
            username = %current.username,
            %method,
            %path,
            roles = ?current.roles,
            "Access denied by role gate"
        );
        return Err(AppError::Forbidden(anyhow::anyhow!("Access denied")));
    }

    request.extensions_mut().insert(current);
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

fn unauthorized() -> AppError {
    AppError::Unauthorized(anyhow::anyhow!("Could not authenticate"))
}
