use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorMessage, HttpError};

/// Session claims. `sub` is the user id.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

/// Signs an HS256 session token for `user_id` valid for `expires_in_seconds`.
pub fn create_token(
    user_id: i64,
    secret: &[u8],
    expires_in_seconds: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let iat = now.timestamp() as usize;
    let exp = (now + Duration::seconds(expires_in_seconds)).timestamp() as usize;
    let claims = TokenClaims {
        sub: user_id.to_string(),
        iat,
        exp,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
}

/// Verifies signature and expiry, returning the user id from `sub`.
pub fn decode_token<T: Into<String>>(token: T, secret: &[u8]) -> Result<i64, HttpError> {
    let invalid = || HttpError::unauthorized(ErrorMessage::InvalidToken.to_string());

    let decoded = decode::<TokenClaims>(
        &token.into(),
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|_| invalid())?;

    decoded.claims.sub.parse::<i64>().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn round_trips_user_id() {
        let token = create_token(42, b"secret", 60).unwrap();
        assert_eq!(decode_token(token, b"secret").unwrap(), 42);
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = create_token(42, b"secret", 60).unwrap();
        let err = decode_token(token, b"other").unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn expired_token_is_rejected() {
        // Past the default 60s leeway.
        let token = create_token(42, b"secret", -600).unwrap();
        assert!(decode_token(token, b"secret").is_err());
    }
}
