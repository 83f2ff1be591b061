use axum::extract::{FromRef, State};
use axum::Json;
use tracing::{info, instrument, warn};

use crate::auth::claims::Role;
use crate::auth::dto::{LoginRequest, LoginResponse, MeResponse};
use crate::auth::extractors::AuthUser;
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::User;
use crate::config::SeedManager;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Role granted to a freshly auto-registered account.
fn role_for_new_user(seed: Option<&SeedManager>, email: &str, password: &str) -> Role {
    match seed {
        Some(s) if s.email == email && s.password == password => Role::Manager,
        _ => Role::User,
    }
}

/// Whether an existing account should be promoted to manager on this login.
fn should_promote(current: Role, seed: Option<&SeedManager>, email: &str, password: &str) -> bool {
    current == Role::User && role_for_new_user(seed, email, password) == Role::Manager
}

/// Login with auto-registration: an unmatched email creates the account
/// (name required), a matched one verifies the password.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::InvalidInput(
            "Email and password are required".into(),
        ));
    }

    let seed = state.config.seed_manager.as_ref();

    let user = match User::find_by_email(&state.db, &payload.email).await? {
        None => {
            let name = payload
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| {
                    warn!(email = %payload.email, "registration without name");
                    ApiError::InvalidInput("Name is required for new registration".into())
                })?;

            let role = role_for_new_user(seed, &payload.email, &payload.password);
            let hash = hash_password(&payload.password)?;
            let user = User::create(&state.db, name, &payload.email, &hash, role).await?;
            info!(user_id = %user.id, email = %user.email, role = ?user.role, "user registered");
            user
        }
        Some(user) => {
            if !verify_password(&payload.password, &user.password_hash)? {
                warn!(email = %payload.email, user_id = %user.id, "login invalid password");
                return Err(ApiError::Unauthenticated("Invalid password".into()));
            }
            if should_promote(user.role, seed, &payload.email, &payload.password) {
                let user = User::set_role(&state.db, user.id, Role::Manager).await?;
                info!(user_id = %user.id, "user promoted to manager");
                user
            } else {
                user
            }
        }
    };

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email, user.role)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> ApiResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(MeResponse { user: user.into() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> SeedManager {
        SeedManager {
            email: "seed@example.com".into(),
            password: "seed-password".into(),
        }
    }

    #[test]
    fn seed_credentials_create_manager() {
        let s = seed();
        assert_eq!(
            role_for_new_user(Some(&s), "seed@example.com", "seed-password"),
            Role::Manager
        );
    }

    #[test]
    fn ordinary_credentials_create_plain_user() {
        let s = seed();
        assert_eq!(
            role_for_new_user(Some(&s), "bob@example.com", "hunter2"),
            Role::User
        );
        assert_eq!(
            role_for_new_user(Some(&s), "seed@example.com", "wrong"),
            Role::User
        );
    }

    #[test]
    fn no_seed_config_means_no_managers() {
        assert_eq!(
            role_for_new_user(None, "seed@example.com", "seed-password"),
            Role::User
        );
    }

    #[test]
    fn promotion_requires_user_role_and_seed_match() {
        let s = seed();
        assert!(should_promote(
            Role::User,
            Some(&s),
            "seed@example.com",
            "seed-password"
        ));
        assert!(!should_promote(
            Role::Manager,
            Some(&s),
            "seed@example.com",
            "seed-password"
        ));
        assert!(!should_promote(
            Role::User,
            Some(&s),
            "seed@example.com",
            "wrong"
        ));
        assert!(!should_promote(
            Role::User,
            None,
            "seed@example.com",
            "seed-password"
        ));
    }
}
