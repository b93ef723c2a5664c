// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Short-lived HS256 tokens that establish a websocket connection's
//! subscriber identity.

use crate::error::TokenError;
use baselayer_types::core::UserId;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const TOKEN_TTL_MINUTES: i64 = 15;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    exp: usize,
    user_id: String,
}

/// Issues a token authorizing websocket subscription as `user_id`, valid
/// for 15 minutes from now, signed HS256 with `secret`.
pub fn issue(secret: &[u8], user_id: UserId) -> String {
    let exp = (Utc::now() + Duration::minutes(TOKEN_TTL_MINUTES)).timestamp() as usize;
    let claims = Claims {
        exp,
        user_id: user_id.inner().to_string(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .expect("HS256 encoding of a well-formed claims struct never fails")
}

/// Verifies `token`'s signature and expiry against `secret`, returning the
/// user id it carries.
pub fn verify(secret: &[u8], token: &str) -> Result<UserId, TokenError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::new(jsonwebtoken::Algorithm::HS256),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    data.claims
        .user_id
        .parse::<i64>()
        .map(UserId::from)
        .map_err(|_| TokenError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_within_the_window() {
        let secret = b"shared-secret";
        let token = issue(secret, UserId::from(42));
        assert_eq!(verify(secret, &token).unwrap(), UserId::from(42));
    }

    #[test]
    fn rejects_a_token_signed_with_a_different_secret() {
        let token = issue(b"correct-secret", UserId::from(1));
        assert_eq!(verify(b"wrong-secret", &token), Err(TokenError::Invalid));
    }

    #[test]
    fn rejects_an_expired_token() {
        let claims = Claims {
            exp: (Utc::now() - Duration::minutes(1)).timestamp() as usize,
            user_id: "1".to_string(),
        };
        let secret = b"shared-secret";
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).unwrap();
        assert_eq!(verify(secret, &token), Err(TokenError::Expired));
    }
}
