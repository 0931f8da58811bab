use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::auth::{LoginForm, SignupForm},
    error::{AppError, AppResult},
    models::User,
};

const MIN_FIELD_LEN: usize = 6;

/// All signup violations at once, so the form can show the complete list.
pub fn signup_violations(
    username: Option<&str>,
    email: Option<&str>,
    password: Option<&str>,
    confirm_password: Option<&str>,
    username_taken: bool,
) -> Vec<String> {
    let mut messages = Vec::new();
    if username.map_or(true, |u| u.len() < MIN_FIELD_LEN) {
        messages.push("Username should be longer than 5 characters".to_string());
    }
    if email.map_or(true, |e| e.len() < MIN_FIELD_LEN) {
        messages.push("An invalid email was provided".to_string());
    }
    if password.map_or(true, |p| p.len() < MIN_FIELD_LEN) {
        messages.push("Password should be longer than 5 characters".to_string());
    }
    if password != confirm_password {
        messages.push("The passwords given are different".to_string());
    }
    if username_taken {
        messages.push("Username is already taken, please choose a different one".to_string());
    }
    messages
}

/// Create the account and grant the base role atomically, then return the
/// username the session cookie should carry.
pub async fn signup(pool: &DbPool, form: SignupForm) -> AppResult<String> {
    let username_taken = match form.username.as_deref() {
        Some(username) if !username.is_empty() => {
            let exist: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM users WHERE username = $1")
                    .bind(username)
                    .fetch_optional(pool)
                    .await?;
            exist.is_some()
        }
        _ => false,
    };

    let violations = signup_violations(
        form.username.as_deref(),
        form.email.as_deref(),
        form.password.as_deref(),
        form.confirm_password.as_deref(),
        username_taken,
    );
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }

    let username = form.username.unwrap_or_default();
    let email = form.email.unwrap_or_default();
    let password = form.password.unwrap_or_default();

    let password_hash = hash_password(&password)?;
    let id = Uuid::new_v4();

    let mut txn = pool.begin().await?;
    sqlx::query("INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(&username)
        .bind(&email)
        .bind(&password_hash)
        .execute(&mut *txn)
        .await?;

    let granted = sqlx::query(
        "INSERT INTO user_roles (user_id, role_id) SELECT $1, id FROM roles WHERE name = 'user'",
    )
    .bind(id)
    .execute(&mut *txn)
    .await?;
    if granted.rows_affected() == 0 {
        return Err(AppError::Internal(anyhow::anyhow!(
            "base role 'user' is missing"
        )));
    }
    txn.commit().await?;

    log_audit(
        pool,
        Some(id),
        "signup",
        Some("users"),
        Some(serde_json::json!({ "username": username.clone() })),
    )
    .await;

    Ok(username)
}

/// Verify credentials and return the username to put in the session cookie.
pub async fn login(pool: &DbPool, form: LoginForm) -> AppResult<String> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(form.username.as_str())
        .fetch_optional(pool)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Wrong username or password".into())),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(form.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Wrong username or password".into()));
    }

    log_audit(
        pool,
        Some(user.id),
        "login",
        Some("users"),
        Some(serde_json::json!({ "username": user.username.clone() })),
    )
    .await;

    Ok(user.username)
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_signup_has_no_violations() {
        let violations = signup_violations(
            Some("bob123"),
            Some("a@b.co"),
            Some("secret1"),
            Some("secret1"),
            false,
        );
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn all_violations_are_reported_together() {
        let violations =
            signup_violations(Some("bob"), Some("a@b"), Some("pw"), Some("other"), true);
        assert_eq!(violations.len(), 5);
    }

    #[test]
    fn five_character_fields_are_rejected() {
        let violations = signup_violations(
            Some("bob12"),
            Some("a@b.c"),
            Some("pass5"),
            Some("pass5"),
            false,
        );
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn missing_fields_count_as_violations() {
        let violations = signup_violations(None, None, None, None, false);
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn mismatched_confirmation_is_reported() {
        let violations = signup_violations(
            Some("bobby1"),
            Some("a@b.co"),
            Some("secret1"),
            Some("secret2"),
            false,
        );
        assert_eq!(violations, vec!["The passwords given are different"]);
    }
}
