//! Issues and verifies the signed bearer tokens that identify a user to the API.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::UserID};

/// How long a token is valid for after it is issued.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::hours(1);

/// The contents of a JSON Web Token.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Claims {
    /// The user the token was issued to.
    pub user_id: UserID,
    /// The time the token was issued as a unix timestamp.
    pub iat: i64,
    /// The expiry time of the token as a unix timestamp.
    pub exp: i64,
}

/// The keys for signing and verifying tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenKeys {
    /// Create a signing key for tokens from a `secret` string.
    pub fn from_secret(secret: &str) -> Self {
        let hash = Sha512::digest(secret);

        Self {
            encoding_key: EncodingKey::from_secret(&hash),
            decoding_key: DecodingKey::from_secret(&hash),
        }
    }
}

/// Issue a token for `user_id` that expires `duration` after `issued_at`.
///
/// # Errors
///
/// Returns an [Error::TokenCreation] if the token could not be signed.
pub fn issue_token(
    user_id: UserID,
    keys: &TokenKeys,
    issued_at: OffsetDateTime,
    duration: Duration,
) -> Result<String, Error> {
    let claims = Claims {
        user_id,
        iat: issued_at.unix_timestamp(),
        exp: (issued_at + duration).unix_timestamp(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify `token` and return its claims.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the token is malformed, was signed with a
/// different key, or has expired. The reason is only logged.
pub fn verify_token(token: &str, keys: &TokenKeys) -> Result<Claims, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(token, &keys.decoding_key, &validation)
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected token: {error}");
            Error::InvalidToken
        })
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error,
        auth::{
            UserID,
            token::{DEFAULT_TOKEN_DURATION, TokenKeys, issue_token, verify_token},
        },
    };

    #[test]
    fn verify_gives_correct_user_id() {
        let keys = TokenKeys::from_secret("foobar");
        let user_id = UserID::new(42);

        let token =
            issue_token(user_id, &keys, OffsetDateTime::now_utc(), DEFAULT_TOKEN_DURATION).unwrap();
        let claims = verify_token(&token, &keys).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn verify_fails_on_expired_token() {
        let keys = TokenKeys::from_secret("foobar");
        let issued_at = OffsetDateTime::now_utc() - Duration::hours(2);

        let token = issue_token(UserID::new(1), &keys, issued_at, DEFAULT_TOKEN_DURATION).unwrap();

        assert_eq!(verify_token(&token, &keys), Err(Error::InvalidToken));
    }

    #[test]
    fn verify_fails_on_wrong_key() {
        let keys = TokenKeys::from_secret("foobar");
        let other_keys = TokenKeys::from_secret("bazqux");

        let token = issue_token(
            UserID::new(1),
            &keys,
            OffsetDateTime::now_utc(),
            DEFAULT_TOKEN_DURATION,
        )
        .unwrap();

        assert_eq!(verify_token(&token, &other_keys), Err(Error::InvalidToken));
    }

    #[test]
    fn verify_fails_on_tampered_payload() {
        let keys = TokenKeys::from_secret("foobar");
        let token = issue_token(
            UserID::new(1),
            &keys,
            OffsetDateTime::now_utc(),
            DEFAULT_TOKEN_DURATION,
        )
        .unwrap();
        let forged_token = issue_token(
            UserID::new(2),
            &TokenKeys::from_secret("attacker"),
            OffsetDateTime::now_utc(),
            DEFAULT_TOKEN_DURATION,
        )
        .unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged_token.split('.').collect();
        parts[1] = forged_parts[1];
        let tampered = parts.join(".");

        assert_eq!(verify_token(&tampered, &keys), Err(Error::InvalidToken));
    }

    #[test]
    fn verify_fails_on_garbage() {
        let keys = TokenKeys::from_secret("foobar");

        assert_eq!(verify_token("FOOBAR", &keys), Err(Error::InvalidToken));
        assert_eq!(verify_token("", &keys), Err(Error::InvalidToken));
    }
}
