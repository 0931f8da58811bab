use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    db::DbPool,
    error::{AppError, AppResult},
};

pub const SESSION_COOKIE: &str = "session";
const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// The authenticated caller. Extraction fails with a redirect to the login
/// page when the request carries no valid session cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

/// Like [`AuthUser`] but anonymous callers are allowed: a missing cookie, a
/// bad signature or an expired token all resolve to `None`.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<String>);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        match session_username(&parts.headers) {
            Some(username) => Ok(AuthUser { username }),
            None => Err(AppError::LoginRequired {
                return_to: parts.uri.path().to_string(),
            }),
        }
    }
}

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(session_username(&parts.headers)))
    }
}

/// Resolve the session cookie to a username. Anything invalid is anonymous.
pub fn session_username(headers: &HeaderMap) -> Option<String> {
    let token = cookie_value(headers, SESSION_COOKIE)?;
    let secret = std::env::var("SESSION_SECRET").ok()?;
    verify_token(&token, &secret)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    let prefix = format!("{name}=");
    raw.split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix(prefix.as_str()))
        .map(str::to_string)
}

pub fn issue_token(username: &str, secret: &str) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(SESSION_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;
    let claims = Claims {
        sub: username.to_string(),
        exp: expiration.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_token(token: &str, secret: &str) -> Option<String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims.sub)
}

/// `Set-Cookie` value establishing the session for `username`.
pub fn session_cookie(username: &str) -> AppResult<String> {
    let secret = std::env::var("SESSION_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("SESSION_SECRET is not set")))?;
    let token = issue_token(username, &secret)?;
    Ok(format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax"
    ))
}

/// `Set-Cookie` value that expires the session immediately.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Role names held by `username`. A username with no user row has no roles.
pub async fn user_roles(pool: &DbPool, username: &str) -> AppResult<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT r.name
        FROM roles r
        JOIN user_roles ur ON ur.role_id = r.id
        JOIN users u ON u.id = ur.user_id
        WHERE u.username = $1
        ORDER BY r.name
        "#,
    )
    .bind(username)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

pub async fn is_in_role(pool: &DbPool, username: &str, role: &str) -> AppResult<bool> {
    let roles = user_roles(pool, username).await?;
    Ok(roles_allow(&[role], &roles))
}

/// An empty required set admits anyone; otherwise the held set must
/// intersect it.
pub fn roles_allow(required: &[&str], held: &[String]) -> bool {
    required.is_empty() || held.iter().any(|h| required.contains(&h.as_str()))
}

pub async fn require_any_role(
    pool: &DbPool,
    username: &str,
    required: &[&str],
) -> AppResult<()> {
    if required.is_empty() {
        return Ok(());
    }
    let held = user_roles(pool, username).await?;
    if roles_allow(required, &held) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub async fn ensure_admin(pool: &DbPool, username: &str) -> AppResult<()> {
    require_any_role(pool, username, &["admin"]).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn empty_required_set_admits_anyone() {
        assert!(roles_allow(&[], &[]));
        assert!(roles_allow(&[], &["user".into()]));
    }

    #[test]
    fn non_empty_required_set_needs_intersection() {
        let held = vec!["user".to_string()];
        assert!(roles_allow(&["user", "admin"], &held));
        assert!(!roles_allow(&["admin"], &held));
        assert!(!roles_allow(&["admin"], &[]));
    }

    #[test]
    fn token_round_trip() {
        let token = issue_token("bobby1", "test-secret").expect("token");
        assert_eq!(verify_token(&token, "test-secret"), Some("bobby1".into()));
    }

    #[test]
    fn tampered_token_is_anonymous() {
        let token = issue_token("bobby1", "test-secret").expect("token");
        assert_eq!(verify_token(&token, "other-secret"), None);
        assert_eq!(verify_token("not-a-token", "test-secret"), None);
    }

    #[test]
    fn cookie_parsing_picks_the_session_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=abc123; lang=en"),
        );
        assert_eq!(cookie_value(&headers, SESSION_COOKIE), Some("abc123".into()));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
