//! Bearer token handling. A request without an `Authorization` header acts as
//! an anonymous guest; a header that is present but does not verify is rejected.

use std::str::FromStr;

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use chrono::{TimeDelta, Utc};
use hotel_core::{Actor, Role};
use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    exp: usize,
    iat: usize,
    sub: String,
    role: String,
}

pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    pub access_token_expires: TimeDelta,
}

impl TokenKeys {
    pub fn new(secret_key: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret_key.as_ref()),
            decoding_key: DecodingKey::from_secret(secret_key.as_ref()),
            access_token_expires: TimeDelta::hours(8),
        }
    }

    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            exp: (now + self.access_token_expires).timestamp() as usize,
            iat: now.timestamp() as usize,
            sub: user_id.to_string(),
            role: role.to_string(),
        };
        jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::InternalError(format!("Cannot issue token: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Actor, ApiError> {
        let token = jsonwebtoken::decode::<Claims>(
            token,
            &self.decoding_key,
            &jsonwebtoken::Validation::default(),
        )
        .map_err(|_| ApiError::InvalidToken)?;
        let id = Uuid::parse_str(&token.claims.sub).map_err(|_| ApiError::InvalidToken)?;
        let role = Role::from_str(&token.claims.role).map_err(|_| ApiError::InvalidToken)?;
        Ok(Actor::user(id, role))
    }
}

/// The actor behind the current request.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Actor);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Caller(Actor::Anonymous));
        };
        let token = header
            .to_str()
            .map_err(|_| ApiError::InvalidToken)?
            .strip_prefix("Bearer ")
            .ok_or(ApiError::InvalidToken)?;
        Ok(Caller(state.tokens.verify(token)?))
    }
}
