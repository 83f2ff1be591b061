use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::claims::Claims;
use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;

/// Extracts and validates the bearer token, returning the decoded claims.
#[derive(Debug)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthenticated("Missing Authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthenticated("Invalid Authorization header".into()))?;

        match keys.verify(token) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(_) => {
                warn!("invalid or expired token");
                Err(ApiError::Unauthenticated("Invalid or expired token".into()))
            }
        }
    }
}

/// Like [`AuthUser`], but additionally requires the manager role.
#[derive(Debug)]
pub struct ManagerUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for ManagerUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if !claims.role.can_moderate() {
            warn!(user_id = %claims.sub, "manager-only route rejected");
            return Err(ApiError::Forbidden("Manager role required".into()));
        }
        Ok(ManagerUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Role;
    use crate::state::AppState;
    use axum::http::{header::AUTHORIZATION, Request, StatusCode};
    use uuid::Uuid;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let builder = Request::builder().uri("/");
        let builder = match value {
            Some(v) => builder.header(AUTHORIZATION, v),
            None => builder,
        };
        builder.body(()).expect("request").into_parts().0
    }

    fn signed_token(state: &AppState, role: Role) -> String {
        let keys = JwtKeys::from_ref(state);
        keys.sign(Uuid::new_v4(), "who@example.com", role)
            .expect("sign")
    }

    #[tokio::test]
    async fn missing_header_is_unauthenticated() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(None);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_unauthenticated() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(Some("Basic abc"));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_is_unauthenticated() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(Some("Bearer not-a-jwt"));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_yields_claims() {
        let state = AppState::fake();
        let token = signed_token(&state, Role::User);
        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let AuthUser(claims) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("valid token");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.email, "who@example.com");
    }

    #[tokio::test]
    async fn manager_extractor_rejects_plain_user() {
        let state = AppState::fake();
        let token = signed_token(&state, Role::User);
        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let err = ManagerUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn manager_extractor_accepts_manager() {
        let state = AppState::fake();
        let token = signed_token(&state, Role::Manager);
        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let ManagerUser(claims) = ManagerUser::from_request_parts(&mut parts, &state)
            .await
            .expect("manager token");
        assert_eq!(claims.role, Role::Manager);
    }
}
