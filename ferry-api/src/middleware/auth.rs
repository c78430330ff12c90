use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use ferry_core::{Actor, Role};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

/// Issued by the account service; verified here with the shared secret.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("token subject is not a user id")]
    BadSubject,
    #[error("unknown role `{0}`")]
    UnknownRole(String),
}

/// Verifies `token` and resolves the caller it was issued to.
pub fn resolve_actor(token: &str, secret: &str) -> Result<Actor, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    let claims = token_data.claims;

    let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::BadSubject)?;
    let role = Role::parse(&claims.role).ok_or(AuthError::UnknownRole(claims.role))?;
    Ok(Actor::new(id, role))
}

// ============================================================================
// Authentication Middleware
// ============================================================================

/// Rejects requests without a valid bearer token and hands the resolved
/// [`Actor`] to handlers through request extensions.
pub async fn require_actor(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::MissingToken)?;
    let actor = resolve_actor(bearer.token(), &state.auth.secret)?;

    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token(sub: &str, role: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            exp: (Utc::now() + Duration::seconds(600)).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    #[test]
    fn test_legacy_user_role_is_passenger() {
        let id = Uuid::new_v4();
        let actor = resolve_actor(&token(&id.to_string(), "user"), SECRET).unwrap();
        assert_eq!(actor, Actor::passenger(id));
    }

    #[test]
    fn test_rejects_bad_tokens() {
        let id = Uuid::new_v4().to_string();
        assert!(matches!(
            resolve_actor(&token(&id, "captain"), SECRET),
            Err(AuthError::UnknownRole(_))
        ));
        assert!(matches!(
            resolve_actor(&token("not-a-uuid", "staff"), SECRET),
            Err(AuthError::BadSubject)
        ));
        assert!(matches!(
            resolve_actor(&token(&id, "staff"), "other-secret"),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
